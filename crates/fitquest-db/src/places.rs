//! Place repository.

use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use fitquest_core::{new_v7, Error, Place, Result};

const PLACE_COLUMNS: &str = "id, name, address, facilities_raw, contact, latitude, longitude";

fn place_from_row(row: &PgRow) -> Place {
    Place {
        id: row.get("id"),
        name: row.get("name"),
        address: row.get("address"),
        facilities_raw: row.get("facilities_raw"),
        contact: row.get("contact"),
        latitude: row.get("latitude"),
        longitude: row.get("longitude"),
    }
}

pub struct PgPlaceRepository {
    pool: Pool<Postgres>,
}

impl PgPlaceRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Insert a place, assigning a fresh id. Returns the id.
    pub async fn insert(&self, place: &Place) -> Result<Uuid> {
        let id = new_v7();
        sqlx::query(
            "INSERT INTO place (id, name, address, facilities_raw, contact, latitude, longitude)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(id)
        .bind(&place.name)
        .bind(&place.address)
        .bind(&place.facilities_raw)
        .bind(&place.contact)
        .bind(place.latitude)
        .bind(place.longitude)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(id)
    }

    /// Places with both coordinates set, ordered by id.
    pub async fn list_geocoded(&self, limit: Option<i64>) -> Result<Vec<Place>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM place
             WHERE latitude IS NOT NULL AND longitude IS NOT NULL
             ORDER BY id
             LIMIT $1",
            PLACE_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(rows.iter().map(place_from_row).collect())
    }

    /// Places with neither coordinate set and a non-blank address.
    pub async fn list_missing_coordinates(&self, limit: Option<i64>) -> Result<Vec<Place>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM place
             WHERE latitude IS NULL AND longitude IS NULL AND btrim(address) <> ''
             ORDER BY id
             LIMIT $1",
            PLACE_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(rows.iter().map(place_from_row).collect())
    }
}
