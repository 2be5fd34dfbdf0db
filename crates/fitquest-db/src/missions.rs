//! Mission generation and the user mission lifecycle.
//!
//! Transitions lock the user mission row, apply the state machine from
//! `fitquest_core::lifecycle`, and write back with a status-guarded update.
//! Completion additionally credits the profile and appends a ledger row in
//! the same transaction.

use std::time::Instant;

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Pool, Postgres, Row};
use tracing::{debug, info};
use uuid::Uuid;

use fitquest_core::defaults::PLACE_DISTANCE_DECIMALS;
use fitquest_core::{
    calculate_points, difficulty_for_distance, new_v7, round_to, CompletionOutcome, Coordinates,
    Difficulty, Error, GenerationOutcome, Mission, MissionAction, MissionStats, MissionStatus,
    Place, PlaceInfo, Result, UserMission, UserMissionDetail,
};

use crate::profiles::{ledger_entry_from_row, profile_from_row, PROFILE_COLUMNS};

const DETAIL_SELECT: &str = "SELECT
        um.id AS um_id, um.user_id, um.mission_id, um.status, um.distance_from_user,
        um.started_at, um.completed_at, um.points_earned, um.created_at AS um_created_at,
        m.place_id, m.title, m.description, m.difficulty, m.base_points, m.distance_bonus,
        m.difficulty_bonus, m.is_active, m.created_at AS m_created_at,
        p.name AS place_name, p.address AS place_address,
        p.latitude AS place_latitude, p.longitude AS place_longitude
    FROM user_mission um
    JOIN mission m ON m.id = um.mission_id
    JOIN place p ON p.id = m.place_id";

fn detail_from_row(row: &PgRow) -> Result<UserMissionDetail> {
    let status: String = row.get("status");
    let difficulty: String = row.get("difficulty");
    let status = status.parse::<MissionStatus>().map_err(Error::Internal)?;
    let difficulty = difficulty.parse::<Difficulty>().map_err(Error::Internal)?;
    let mission_id: Uuid = row.get("mission_id");
    let place_id: Uuid = row.get("place_id");

    Ok(UserMissionDetail {
        user_mission: UserMission {
            id: row.get("um_id"),
            user_id: row.get("user_id"),
            mission_id,
            status,
            distance_from_user: row.get("distance_from_user"),
            started_at: row.get("started_at"),
            completed_at: row.get("completed_at"),
            points_earned: row.get("points_earned"),
            created_at: row.get("um_created_at"),
        },
        mission: Mission {
            id: mission_id,
            place_id,
            title: row.get("title"),
            description: row.get("description"),
            difficulty,
            base_points: row.get("base_points"),
            distance_bonus: row.get("distance_bonus"),
            difficulty_bonus: row.get("difficulty_bonus"),
            is_active: row.get("is_active"),
            created_at: row.get("m_created_at"),
        },
        place: PlaceInfo {
            id: place_id,
            name: row.get("place_name"),
            address: row.get("place_address"),
            latitude: row.get("place_latitude"),
            longitude: row.get("place_longitude"),
        },
    })
}

/// Monday 00:00 UTC of the week containing `now`.
pub fn week_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let days_back = i64::from(now.weekday().num_days_from_monday());
    let monday = now.date_naive() - Duration::days(days_back);
    monday.and_time(NaiveTime::MIN).and_utc()
}

/// Title shown for the mission generated from `place`.
pub fn mission_title(place: &Place) -> String {
    format!("{} 방문하기", place.name)
}

pub fn mission_description(place: &Place) -> String {
    format!("{}에 위치한 {}을 방문하세요!", place.address, place.name)
}

pub struct PgMissionRepository {
    pool: Pool<Postgres>,
}

impl PgMissionRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    // =========================================================================
    // GENERATION
    // =========================================================================

    /// Ensure a mission exists for each geocoded place and assign it to `user_id`.
    ///
    /// Missions and user missions are first-writer-wins: an existing row keeps
    /// its distance and points. Places without coordinates are skipped.
    pub async fn generate(
        &self,
        user_id: Uuid,
        origin: Coordinates,
        places: &[Place],
    ) -> Result<GenerationOutcome> {
        let start = Instant::now();
        let now = Utc::now();
        let mut outcome = GenerationOutcome::default();

        for place in places {
            let Some(target) = Coordinates::from_columns(place.latitude, place.longitude) else {
                continue;
            };
            let distance = round_to(origin.distance_km(&target), PLACE_DISTANCE_DECIMALS);
            let difficulty = difficulty_for_distance(distance);
            let points = calculate_points(distance, difficulty.as_str());

            let created = sqlx::query(
                "INSERT INTO mission (id, place_id, title, description, difficulty, base_points,
                                      distance_bonus, difficulty_bonus, is_active, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, true, $9)
                 ON CONFLICT (place_id) DO NOTHING
                 RETURNING id",
            )
            .bind(new_v7())
            .bind(place.id)
            .bind(mission_title(place))
            .bind(mission_description(place))
            .bind(difficulty.as_str())
            .bind(points.base_points)
            .bind(points.distance_bonus)
            .bind(points.difficulty_bonus)
            .bind(now)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

            let mission_id: Uuid = match created {
                Some(row) => {
                    outcome.created_missions += 1;
                    row.get("id")
                }
                None => sqlx::query("SELECT id FROM mission WHERE place_id = $1")
                    .bind(place.id)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(Error::Database)?
                    .get("id"),
            };

            let assigned = sqlx::query(
                "INSERT INTO user_mission (id, user_id, mission_id, status, distance_from_user,
                                           points_earned, created_at)
                 VALUES ($1, $2, $3, 'available', $4, 0, $5)
                 ON CONFLICT (user_id, mission_id) DO NOTHING",
            )
            .bind(new_v7())
            .bind(user_id)
            .bind(mission_id)
            .bind(distance)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?
            .rows_affected();
            outcome.assigned_missions += assigned as i64;
        }

        outcome.total_missions = sqlx::query("SELECT COUNT(*) AS n FROM mission WHERE is_active")
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?
            .get("n");

        info!(
            subsystem = "db",
            component = "missions",
            op = "generate",
            user_id = %user_id,
            result_count = places.len(),
            created = outcome.created_missions,
            assigned = outcome.assigned_missions,
            duration_ms = start.elapsed().as_millis() as u64,
            "Missions generated"
        );
        Ok(outcome)
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// The user's missions in `status`. Available missions are limited to active ones.
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        status: MissionStatus,
    ) -> Result<Vec<UserMissionDetail>> {
        let active_filter = if status == MissionStatus::Available {
            " AND m.is_active"
        } else {
            ""
        };
        let rows = sqlx::query(&format!(
            "{} WHERE um.user_id = $1 AND um.status = $2{}
             ORDER BY um.started_at DESC NULLS LAST, um.completed_at DESC NULLS LAST, um.id",
            DETAIL_SELECT, active_filter
        ))
        .bind(user_id)
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter().map(detail_from_row).collect()
    }

    pub async fn get_for_user(
        &self,
        user_id: Uuid,
        mission_id: Uuid,
    ) -> Result<Option<UserMissionDetail>> {
        let row = sqlx::query(&format!(
            "{} WHERE um.user_id = $1 AND um.mission_id = $2",
            DETAIL_SELECT
        ))
        .bind(user_id)
        .bind(mission_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.as_ref().map(detail_from_row).transpose()
    }

    /// Ongoing, completed this week (since Monday 00:00 UTC), and completed overall.
    pub async fn stats(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<MissionStats> {
        let row = sqlx::query(
            "SELECT
                COUNT(*) FILTER (WHERE status = 'ongoing') AS ongoing,
                COUNT(*) FILTER (WHERE status = 'completed' AND completed_at >= $2) AS weekly,
                COUNT(*) FILTER (WHERE status = 'completed') AS total
             FROM user_mission
             WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(week_start(now))
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(MissionStats {
            ongoing: row.get("ongoing"),
            weekly_completed: row.get("weekly"),
            total_completed: row.get("total"),
        })
    }

    // =========================================================================
    // TRANSITIONS
    // =========================================================================

    async fn lock_for_update(
        conn: &mut PgConnection,
        user_id: Uuid,
        mission_id: Uuid,
    ) -> Result<UserMissionDetail> {
        let row = sqlx::query(&format!(
            "{} WHERE um.user_id = $1 AND um.mission_id = $2 FOR UPDATE OF um",
            DETAIL_SELECT
        ))
        .bind(user_id)
        .bind(mission_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(Error::Database)?;

        match row {
            Some(row) => detail_from_row(&row),
            None => Err(Error::NotFound(format!(
                "mission {} is not assigned to this user",
                mission_id
            ))),
        }
    }

    /// Persist `um` only if the stored row is still in the status `action` requires.
    async fn write_transition(
        conn: &mut PgConnection,
        um: &UserMission,
        action: MissionAction,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE user_mission SET
                status = $1,
                distance_from_user = $2,
                started_at = $3,
                completed_at = $4,
                points_earned = $5
             WHERE id = $6 AND status = $7",
        )
        .bind(um.status.as_str())
        .bind(um.distance_from_user)
        .bind(um.started_at)
        .bind(um.completed_at)
        .bind(um.points_earned)
        .bind(um.id)
        .bind(action.required_status().as_str())
        .execute(&mut *conn)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::Conflict(format!(
                "user mission {} changed before it could {}",
                um.id, action
            )));
        }
        Ok(())
    }

    /// available → ongoing.
    pub async fn start(
        &self,
        user_id: Uuid,
        mission_id: Uuid,
        distance_km: f64,
    ) -> Result<UserMissionDetail> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let mut detail = Self::lock_for_update(&mut *tx, user_id, mission_id).await?;

        detail.user_mission.start(distance_km, Utc::now())?;
        Self::write_transition(&mut *tx, &detail.user_mission, MissionAction::Start).await?;
        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "missions",
            op = "start",
            user_id = %user_id,
            mission_id = %mission_id,
            distance_km,
            "Mission started"
        );
        Ok(detail)
    }

    /// ongoing → available, clearing progress.
    pub async fn cancel(&self, user_id: Uuid, mission_id: Uuid) -> Result<UserMissionDetail> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let mut detail = Self::lock_for_update(&mut *tx, user_id, mission_id).await?;

        detail.user_mission.cancel()?;
        Self::write_transition(&mut *tx, &detail.user_mission, MissionAction::Cancel).await?;
        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "missions",
            op = "cancel",
            user_id = %user_id,
            mission_id = %mission_id,
            "Mission cancelled"
        );
        Ok(detail)
    }

    /// ongoing → completed, crediting the mission's points to the profile.
    ///
    /// The status write, profile credit and ledger row commit together or not
    /// at all.
    pub async fn complete(&self, user_id: Uuid, mission_id: Uuid) -> Result<CompletionOutcome> {
        let start = Instant::now();
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let mut detail = Self::lock_for_update(&mut *tx, user_id, mission_id).await?;
        let earned = detail
            .user_mission
            .complete(detail.mission.total_points(), now)?;
        Self::write_transition(&mut *tx, &detail.user_mission, MissionAction::Complete).await?;

        let row = sqlx::query(&format!(
            "SELECT {} FROM profile WHERE user_id = $1 FOR UPDATE",
            PROFILE_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| Error::NotFound(format!("profile for user {}", user_id)))?;

        let mut profile = profile_from_row(&row);
        let experience = profile.add_points(i64::from(earned));
        profile.updated_at = now;

        sqlx::query(
            "UPDATE profile SET level = $2, experience = $3, total_points = $4, updated_at = $5
             WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(profile.level)
        .bind(profile.experience)
        .bind(profile.total_points)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        let ledger_row = sqlx::query(
            "INSERT INTO point_ledger (id, user_id, user_mission_id, points, experience,
                                       level_after, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING id, user_id, user_mission_id, points, experience, level_after, created_at",
        )
        .bind(new_v7())
        .bind(user_id)
        .bind(detail.user_mission.id)
        .bind(i64::from(earned))
        .bind(experience)
        .bind(profile.level)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "db",
            component = "missions",
            op = "complete",
            user_id = %user_id,
            mission_id = %mission_id,
            points = earned,
            level = profile.level,
            duration_ms = start.elapsed().as_millis() as u64,
            "Mission completed"
        );

        Ok(CompletionOutcome {
            user_mission: detail.user_mission,
            profile,
            ledger_entry: ledger_entry_from_row(&ledger_row),
        })
    }

    /// Activate or deactivate a mission. Inactive missions drop out of the available list.
    pub async fn set_active(&self, mission_id: Uuid, active: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE mission SET is_active = $2 WHERE id = $1")
            .bind(mission_id)
            .bind(active)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(result.rows_affected() > 0)
    }
}
