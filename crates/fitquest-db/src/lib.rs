//! # fitquest-db
//!
//! PostgreSQL database layer for fitquest.
//!
//! This crate provides:
//! - Connection pool management
//! - Account, profile, place and facility repositories
//! - Mission generation and the transactional user mission lifecycle
//!
//! ## Example
//!
//! ```rust,ignore
//! use fitquest_db::Database;
//!
//! let db = Database::connect_with_config(&url, PoolConfig::from_env()).await?;
//! let places = db.places.list_geocoded(Some(20)).await?;
//! let outcome = db.missions.generate(user_id, origin, &places).await?;
//! ```

pub mod facilities;
pub mod missions;
pub mod places;
pub mod pool;
pub mod profiles;
pub mod users;

// Always compiled so integration tests (in tests/) can use the fixtures.
pub mod test_fixtures;

pub use fitquest_core::*;

pub use facilities::{GeocodedTable, PgFacilityRepository, Upsert};
pub use missions::{week_start, PgMissionRepository};
pub use places::PgPlaceRepository;
pub use pool::{create_pool_with_config, PoolConfig};
pub use profiles::PgProfileRepository;
pub use users::{PgUserRepository, ACCESS_TOKEN_PREFIX, REFRESH_TOKEN_PREFIX};

/// Combined database context with all repositories.
pub struct Database {
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Accounts and bearer tokens.
    pub users: PgUserRepository,
    pub profiles: PgProfileRepository,
    pub places: PgPlaceRepository,
    /// Bike racks, corporations, outdoor equipment, sports facilities.
    pub facilities: PgFacilityRepository,
    pub missions: PgMissionRepository,
}

impl Database {
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            users: PgUserRepository::new(pool.clone()),
            profiles: PgProfileRepository::new(pool.clone()),
            places: PgPlaceRepository::new(pool.clone()),
            facilities: PgFacilityRepository::new(pool.clone()),
            missions: PgMissionRepository::new(pool.clone()),
            pool,
        }
    }

    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}
