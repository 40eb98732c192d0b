//! Domain model for the movie catalog
//!
//! Two layers, mirroring the wire/storage split:
//!
//! - `*Record` types are the deserialized import payload. Every field that
//!   validation has an opinion about is an `Option`, so a missing value shows
//!   up as a violation with a field path instead of a deserialization error.
//! - `Movie` / `Person` / `Location` / `Coordinates` are the validated
//!   entities produced by [`crate::validate::check`]; persistence only ever
//!   sees these.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// MPAA certification ratings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MpaaRating {
    G,
    PG,
    #[serde(rename = "PG_13")]
    Pg13,
    R,
    #[serde(rename = "NC_17")]
    Nc17,
}

impl MpaaRating {
    pub fn as_str(&self) -> &'static str {
        match self {
            MpaaRating::G => "G",
            MpaaRating::PG => "PG",
            MpaaRating::Pg13 => "PG_13",
            MpaaRating::R => "R",
            MpaaRating::Nc17 => "NC_17",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovieGenre {
    Western,
    Drama,
    Comedy,
    ScienceFiction,
    Tragedy,
}

impl MovieGenre {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovieGenre::Western => "WESTERN",
            MovieGenre::Drama => "DRAMA",
            MovieGenre::Comedy => "COMEDY",
            MovieGenre::ScienceFiction => "SCIENCE_FICTION",
            MovieGenre::Tragedy => "TRAGEDY",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Color {
    Green,
    Red,
    Black,
    Blue,
    Yellow,
    Orange,
    White,
    Brown,
}

impl Color {
    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Green => "GREEN",
            Color::Red => "RED",
            Color::Black => "BLACK",
            Color::Blue => "BLUE",
            Color::Yellow => "YELLOW",
            Color::Orange => "ORANGE",
            Color::White => "WHITE",
            Color::Brown => "BROWN",
        }
    }
}

// ---------------------------------------------------------------------------
// Wire records (import payload)
// ---------------------------------------------------------------------------

/// One movie entry of the import payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieRecord {
    pub name: Option<String>,
    pub coordinates: Option<CoordinatesRecord>,
    pub oscars_count: Option<i64>,
    pub budget: Option<f64>,
    pub total_box_office: Option<i64>,
    pub mpaa_rating: Option<MpaaRating>,
    pub director: Option<PersonRecord>,
    pub screenwriter: Option<PersonRecord>,
    pub operator: Option<PersonRecord>,
    pub length: Option<i64>,
    pub golden_palm_count: Option<i64>,
    pub usa_box_office: Option<i64>,
    pub tagline: Option<String>,
    pub genre: Option<MovieGenre>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinatesRecord {
    pub x: Option<f64>,
    pub y: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonRecord {
    pub name: Option<String>,
    pub eye_color: Option<Color>,
    pub hair_color: Option<Color>,
    pub birthday: Option<DateTime<Utc>>,
    pub weight: Option<f64>,
    pub location: Option<LocationRecord>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRecord {
    pub x: Option<f64>,
    pub y: Option<i64>,
    pub z: Option<f64>,
    pub name: Option<String>,
}

// ---------------------------------------------------------------------------
// Validated entities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Movie {
    pub name: String,
    pub coordinates: Coordinates,
    pub oscars_count: Option<i64>,
    pub budget: f64,
    pub total_box_office: i64,
    pub mpaa_rating: MpaaRating,
    pub director: Person,
    pub screenwriter: Option<Person>,
    pub operator: Person,
    pub length: Option<i64>,
    pub golden_palm_count: i64,
    pub usa_box_office: Option<i64>,
    pub tagline: String,
    pub genre: Option<MovieGenre>,
}

#[derive(Debug, Clone, Copy)]
pub struct Coordinates {
    pub x: f64,
    pub y: i64,
}

#[derive(Debug, Clone)]
pub struct Person {
    pub name: String,
    pub eye_color: Color,
    pub hair_color: Option<Color>,
    pub birthday: Option<DateTime<Utc>>,
    pub weight: Option<f64>,
    pub location: Option<Location>,
}

#[derive(Debug, Clone)]
pub struct Location {
    pub x: f64,
    pub y: i64,
    pub z: f64,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Import audit trail
// ---------------------------------------------------------------------------

/// Terminal outcome of one import attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportStatus {
    Success,
    Failure,
}

impl ImportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportStatus::Success => "SUCCESS",
            ImportStatus::Failure => "FAILURE",
        }
    }
}

/// One row of the append-only `import_history` table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportAttempt {
    pub id: i64,
    pub import_date: DateTime<Utc>,
    pub status: ImportStatus,
    pub imported_count: Option<i64>,
    pub details: String,
    pub object_key: Option<String>,
}

/// An import attempt about to be appended to the audit trail
#[derive(Debug, Clone)]
pub struct NewImportAttempt {
    pub status: ImportStatus,
    pub imported_count: Option<i64>,
    pub details: String,
    pub object_key: Option<String>,
}

impl NewImportAttempt {
    pub fn success(imported_count: usize, object_key: &str) -> Self {
        Self {
            status: ImportStatus::Success,
            imported_count: Some(imported_count as i64),
            details: "Import successful".to_string(),
            object_key: Some(object_key.to_string()),
        }
    }

    /// Failed attempt. `object_key` is `Some` only when a blob was created
    /// before the failing step.
    pub fn failure(details: &str, object_key: Option<&str>) -> Self {
        Self {
            status: ImportStatus::Failure,
            imported_count: None,
            details: details.to_string(),
            object_key: object_key.map(str::to_string),
        }
    }
}
