//! Movie persistence
//!
//! Batch insert of validated movies. All writes take the caller's
//! transaction so a batch commits or rolls back as one unit.

use chrono::Utc;
use sqlx::{Sqlite, Transaction};

use crate::models::{Coordinates, Location, Movie, Person};

/// Insert a batch of validated movies inside one open transaction.
///
/// Returns the number of movies written. The caller owns commit/rollback.
pub async fn insert_batch(
    tx: &mut Transaction<'_, Sqlite>,
    movies: &[Movie],
) -> sqlx::Result<usize> {
    for movie in movies {
        insert_movie(tx, movie).await?;
    }
    Ok(movies.len())
}

async fn insert_movie(tx: &mut Transaction<'_, Sqlite>, movie: &Movie) -> sqlx::Result<()> {
    let coordinates_id = insert_coordinates(tx, &movie.coordinates).await?;
    let director_id = insert_person(tx, &movie.director).await?;
    let screenwriter_id = match &movie.screenwriter {
        Some(person) => Some(insert_person(tx, person).await?),
        None => None,
    };
    let operator_id = insert_person(tx, &movie.operator).await?;

    sqlx::query(
        r#"
        INSERT INTO movies (
            name, coordinates_id, creation_date, oscars_count, budget,
            total_box_office, mpaa_rating, director_id, screenwriter_id,
            operator_id, length, golden_palm_count, usa_box_office, tagline, genre
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&movie.name)
    .bind(coordinates_id)
    .bind(Utc::now().date_naive().to_string())
    .bind(movie.oscars_count)
    .bind(movie.budget)
    .bind(movie.total_box_office)
    .bind(movie.mpaa_rating.as_str())
    .bind(director_id)
    .bind(screenwriter_id)
    .bind(operator_id)
    .bind(movie.length)
    .bind(movie.golden_palm_count)
    .bind(movie.usa_box_office)
    .bind(&movie.tagline)
    .bind(movie.genre.map(|g| g.as_str()))
    .execute(&mut **tx)
    .await?;

    Ok(())
}

async fn insert_coordinates(
    tx: &mut Transaction<'_, Sqlite>,
    coordinates: &Coordinates,
) -> sqlx::Result<i64> {
    let result = sqlx::query("INSERT INTO coordinates (x, y) VALUES (?, ?)")
        .bind(coordinates.x)
        .bind(coordinates.y)
        .execute(&mut **tx)
        .await?;
    Ok(result.last_insert_rowid())
}

async fn insert_person(tx: &mut Transaction<'_, Sqlite>, person: &Person) -> sqlx::Result<i64> {
    let location_id = match &person.location {
        Some(location) => Some(insert_location(tx, location).await?),
        None => None,
    };

    let result = sqlx::query(
        r#"
        INSERT INTO persons (name, eye_color, hair_color, birthday, weight, location_id)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&person.name)
    .bind(person.eye_color.as_str())
    .bind(person.hair_color.map(|c| c.as_str()))
    .bind(person.birthday.map(|b| b.to_rfc3339()))
    .bind(person.weight)
    .bind(location_id)
    .execute(&mut **tx)
    .await?;

    Ok(result.last_insert_rowid())
}

async fn insert_location(
    tx: &mut Transaction<'_, Sqlite>,
    location: &Location,
) -> sqlx::Result<i64> {
    let result = sqlx::query("INSERT INTO locations (x, y, z, name) VALUES (?, ?, ?, ?)")
        .bind(location.x)
        .bind(location.y)
        .bind(location.z)
        .bind(&location.name)
        .execute(&mut **tx)
        .await?;
    Ok(result.last_insert_rowid())
}

/// Count movies, used by tests and diagnostics.
pub async fn count(pool: &sqlx::SqlitePool) -> sqlx::Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM movies")
        .fetch_one(pool)
        .await
}
