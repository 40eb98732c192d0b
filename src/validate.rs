//! Field validation for import records
//!
//! `check` turns one wire [`MovieRecord`] into a validated [`Movie`], or
//! reports *every* violated constraint with its dotted field path. Callers
//! that validate a batch collect the violations of all records before
//! aborting, so a client sees the full picture in one round trip.

use serde::Serialize;

use crate::models::{
    Coordinates, CoordinatesRecord, Location, LocationRecord, Movie, MovieRecord, Person,
    PersonRecord,
};

/// Maximum tagline length (characters)
const TAGLINE_MAX: usize = 168;
/// Maximum location name length (characters)
const LOCATION_NAME_MAX: usize = 475;

/// One violated constraint, addressed by its JSON field path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

impl Violation {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validate one record and map it to the persistent entity.
///
/// Returns all violations found, not just the first.
pub fn check(record: &MovieRecord) -> Result<Movie, Vec<Violation>> {
    let mut violations = Vec::new();

    let name = match &record.name {
        Some(n) if !n.trim().is_empty() => Some(n.clone()),
        _ => {
            violations.push(Violation::new("name", "Movie name cannot be empty"));
            None
        }
    };

    let coordinates = match &record.coordinates {
        Some(c) => check_coordinates(c, &mut violations),
        None => {
            violations.push(Violation::new("coordinates", "Coordinates cannot be null"));
            None
        }
    };

    if let Some(n) = record.oscars_count {
        if n <= 0 {
            violations.push(Violation::new(
                "oscarsCount",
                "Oscars count must be a positive value",
            ));
        }
    }

    let budget = match record.budget {
        Some(b) if b > 0.0 => Some(b),
        _ => {
            violations.push(Violation::new("budget", "Budget must be a positive value"));
            None
        }
    };

    let total_box_office = match record.total_box_office {
        None => {
            violations.push(Violation::new(
                "totalBoxOffice",
                "Total box office cannot be null",
            ));
            None
        }
        Some(n) if n <= 0 => {
            violations.push(Violation::new(
                "totalBoxOffice",
                "Total box office must be a positive value",
            ));
            None
        }
        Some(n) => Some(n),
    };

    let mpaa_rating = match record.mpaa_rating {
        Some(r) => Some(r),
        None => {
            violations.push(Violation::new("mpaaRating", "MPAA rating cannot be null"));
            None
        }
    };

    let director = match &record.director {
        Some(p) => check_person("director", p, &mut violations),
        None => {
            violations.push(Violation::new("director", "Director cannot be null"));
            None
        }
    };

    let screenwriter = match &record.screenwriter {
        Some(p) => check_person("screenwriter", p, &mut violations),
        None => None,
    };

    let operator = match &record.operator {
        Some(p) => check_person("operator", p, &mut violations),
        None => {
            violations.push(Violation::new("operator", "Operator cannot be null"));
            None
        }
    };

    if let Some(n) = record.length {
        if n <= 0 {
            violations.push(Violation::new("length", "Length must be a positive value"));
        }
    }

    let golden_palm_count = match record.golden_palm_count {
        None => {
            violations.push(Violation::new(
                "goldenPalmCount",
                "Golden Palm count cannot be null",
            ));
            None
        }
        Some(n) if n <= 0 => {
            violations.push(Violation::new(
                "goldenPalmCount",
                "Golden Palm count must be a positive value",
            ));
            None
        }
        Some(n) => Some(n),
    };

    if let Some(n) = record.usa_box_office {
        if n <= 0 {
            violations.push(Violation::new(
                "usaBoxOffice",
                "USA box office must be a positive value",
            ));
        }
    }

    let tagline = match &record.tagline {
        Some(t) if t.trim().is_empty() => {
            violations.push(Violation::new("tagline", "Tagline cannot be empty"));
            None
        }
        Some(t) if t.chars().count() > TAGLINE_MAX => {
            violations.push(Violation::new(
                "tagline",
                format!("Tagline length must not exceed {TAGLINE_MAX} characters"),
            ));
            None
        }
        Some(t) => Some(t.clone()),
        None => {
            violations.push(Violation::new("tagline", "Tagline cannot be null"));
            None
        }
    };

    match (
        name,
        coordinates,
        budget,
        total_box_office,
        mpaa_rating,
        director,
        operator,
        golden_palm_count,
        tagline,
    ) {
        (
            Some(name),
            Some(coordinates),
            Some(budget),
            Some(total_box_office),
            Some(mpaa_rating),
            Some(director),
            Some(operator),
            Some(golden_palm_count),
            Some(tagline),
        ) if violations.is_empty() => Ok(Movie {
            name,
            coordinates,
            oscars_count: record.oscars_count,
            budget,
            total_box_office,
            mpaa_rating,
            director,
            screenwriter,
            operator,
            length: record.length,
            golden_palm_count,
            usa_box_office: record.usa_box_office,
            tagline,
            genre: record.genre,
        }),
        _ => Err(violations),
    }
}

fn check_coordinates(
    record: &CoordinatesRecord,
    violations: &mut Vec<Violation>,
) -> Option<Coordinates> {
    let x = record.x;
    let y = record.y;
    if x.is_none() {
        violations.push(Violation::new("coordinates.x", "Coordinate x cannot be null"));
    }
    if y.is_none() {
        violations.push(Violation::new("coordinates.y", "Coordinate y cannot be null"));
    }
    Some(Coordinates { x: x?, y: y? })
}

fn check_person(
    prefix: &str,
    record: &PersonRecord,
    violations: &mut Vec<Violation>,
) -> Option<Person> {
    let name = match &record.name {
        Some(n) if !n.trim().is_empty() => Some(n.clone()),
        _ => {
            violations.push(Violation::new(
                format!("{prefix}.name"),
                "Person name cannot be empty",
            ));
            None
        }
    };

    let eye_color = match record.eye_color {
        Some(c) => Some(c),
        None => {
            violations.push(Violation::new(
                format!("{prefix}.eyeColor"),
                "Eye color cannot be null",
            ));
            None
        }
    };

    let location = match &record.location {
        Some(l) => match check_location(prefix, l, violations) {
            Some(l) => Some(l),
            // nested violations already recorded; the person cannot be built
            None => return None,
        },
        None => None,
    };

    Some(Person {
        name: name?,
        eye_color: eye_color?,
        hair_color: record.hair_color,
        birthday: record.birthday,
        weight: record.weight,
        location,
    })
}

fn check_location(
    prefix: &str,
    record: &LocationRecord,
    violations: &mut Vec<Violation>,
) -> Option<Location> {
    let mut missing = |field: &str| {
        violations.push(Violation::new(
            format!("{prefix}.location.{field}"),
            format!("Location {field} cannot be null"),
        ));
    };

    if record.x.is_none() {
        missing("x");
    }
    if record.y.is_none() {
        missing("y");
    }
    if record.z.is_none() {
        missing("z");
    }

    let name = match &record.name {
        Some(n) if n.chars().count() > LOCATION_NAME_MAX => {
            violations.push(Violation::new(
                format!("{prefix}.location.name"),
                format!("Location name length must not exceed {LOCATION_NAME_MAX} characters"),
            ));
            None
        }
        Some(n) => Some(n.clone()),
        None => {
            violations.push(Violation::new(
                format!("{prefix}.location.name"),
                "Location name cannot be null",
            ));
            None
        }
    };

    Some(Location {
        x: record.x?,
        y: record.y?,
        z: record.z?,
        name: name?,
    })
}
