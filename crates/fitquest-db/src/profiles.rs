//! Profile repository.

use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use fitquest_core::{Error, PointLedgerEntry, Profile, Result, UpdateProfileRequest};

pub(crate) const PROFILE_COLUMNS: &str = "user_id, level, experience, total_points, name, phone, \
     age, gender, weight_kg, height_cm, created_at, updated_at";

pub(crate) fn profile_from_row(row: &PgRow) -> Profile {
    Profile {
        user_id: row.get("user_id"),
        level: row.get("level"),
        experience: row.get("experience"),
        total_points: row.get("total_points"),
        name: row.get("name"),
        phone: row.get("phone"),
        age: row.get("age"),
        gender: row.get("gender"),
        weight_kg: row.get("weight_kg"),
        height_cm: row.get("height_cm"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

pub(crate) fn ledger_entry_from_row(row: &PgRow) -> PointLedgerEntry {
    PointLedgerEntry {
        id: row.get("id"),
        user_id: row.get("user_id"),
        user_mission_id: row.get("user_mission_id"),
        points: row.get("points"),
        experience: row.get("experience"),
        level_after: row.get("level_after"),
        created_at: row.get("created_at"),
    }
}

pub struct PgProfileRepository {
    pool: Pool<Postgres>,
}

impl PgProfileRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn get(&self, user_id: Uuid) -> Result<Option<Profile>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM profile WHERE user_id = $1",
            PROFILE_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(row.as_ref().map(profile_from_row))
    }

    /// Update personal details. Level, experience and points are never touched here.
    pub async fn update_details(
        &self,
        user_id: Uuid,
        req: &UpdateProfileRequest,
    ) -> Result<Profile> {
        req.validate().map_err(Error::InvalidInput)?;

        let row = sqlx::query(&format!(
            "UPDATE profile SET
                name = COALESCE($2, name),
                phone = COALESCE($3, phone),
                age = COALESCE($4, age),
                gender = COALESCE($5, gender),
                weight_kg = COALESCE($6, weight_kg),
                height_cm = COALESCE($7, height_cm),
                updated_at = $8
             WHERE user_id = $1
             RETURNING {}",
            PROFILE_COLUMNS
        ))
        .bind(user_id)
        .bind(&req.name)
        .bind(&req.phone)
        .bind(req.age)
        .bind(&req.gender)
        .bind(req.weight_kg)
        .bind(req.height_cm)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.as_ref()
            .map(profile_from_row)
            .ok_or_else(|| Error::NotFound(format!("profile for user {}", user_id)))
    }

    /// Most recent point-earning events first.
    pub async fn ledger(&self, user_id: Uuid, limit: i64) -> Result<Vec<PointLedgerEntry>> {
        let rows = sqlx::query(
            "SELECT id, user_id, user_mission_id, points, experience, level_after, created_at
             FROM point_ledger
             WHERE user_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(rows.iter().map(ledger_entry_from_row).collect())
    }
}
