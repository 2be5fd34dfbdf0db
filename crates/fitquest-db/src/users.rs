//! User accounts and bearer tokens.
//!
//! Passwords are stored as argon2 PHC strings. Tokens are random opaque
//! strings handed to the client once; only their SHA-256 hex digest is kept.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use tracing::{debug, info};
use uuid::Uuid;

use fitquest_core::{new_v7, Error, RegisterRequest, Result, TokenPair, User};

/// Prefix of issued access tokens.
pub const ACCESS_TOKEN_PREFIX: &str = "fq_at_";

/// Prefix of issued refresh tokens.
pub const REFRESH_TOKEN_PREFIX: &str = "fq_rt_";

const TOKEN_SECRET_LEN: usize = 48;

/// PostgreSQL implementation of the account repository.
pub struct PgUserRepository {
    pool: Pool<Postgres>,
}

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        created_at: row.get("created_at"),
    }
}

impl PgUserRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn generate_secret(length: usize) -> String {
        const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
        let mut rng = rand::thread_rng();
        (0..length)
            .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
            .collect()
    }

    /// SHA-256 hex digest of a raw token.
    pub fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn hash_password(password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| Error::Internal(format!("password hashing failed: {}", e)))
    }

    fn verify_password(password: &str, stored: &str) -> bool {
        match PasswordHash::new(stored) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }

    /// Create a user and its level-1 profile in one transaction.
    ///
    /// Fails with [`Error::Conflict`] when the username is taken.
    pub async fn register(&self, req: &RegisterRequest) -> Result<User> {
        req.validate().map_err(Error::InvalidInput)?;

        let now = Utc::now();
        let id = new_v7();
        let username = req.username.trim().to_string();
        let password_hash = Self::hash_password(&req.password)?;
        let details = req.personal_details();

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        sqlx::query(
            "INSERT INTO app_user (id, username, email, password_hash, created_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id)
        .bind(&username)
        .bind(req.email.trim())
        .bind(&password_hash)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Error::Conflict(format!("username '{}' is already taken", username))
            }
            _ => Error::Database(e),
        })?;

        sqlx::query(
            "INSERT INTO profile (user_id, level, experience, total_points, name, phone,
                                  age, gender, weight_kg, height_cm, created_at, updated_at)
             VALUES ($1, 1, 0, 0, $2, $3, $4, $5, $6, $7, $8, $8)",
        )
        .bind(id)
        .bind(details.name.unwrap_or_default())
        .bind(details.phone.unwrap_or_default())
        .bind(details.age)
        .bind(details.gender.unwrap_or_default())
        .bind(details.weight_kg)
        .bind(details.height_cm)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "db",
            component = "users",
            op = "register",
            user_id = %id,
            "User registered"
        );

        Ok(User {
            id,
            username,
            email: req.email.trim().to_string(),
            created_at: now,
        })
    }

    /// Return the user when `password` matches, `None` otherwise.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, email, password_hash, created_at
             FROM app_user WHERE username = $1",
        )
        .bind(username.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.and_then(|row| {
            let stored: String = row.get("password_hash");
            Self::verify_password(password, &stored).then(|| user_from_row(&row))
        }))
    }

    async fn insert_token(
        &self,
        user_id: Uuid,
        kind: &str,
        prefix: &str,
        ttl: Duration,
    ) -> Result<(String, DateTime<Utc>)> {
        let now = Utc::now();
        let expires_at = now + ttl;
        let token = format!("{}{}", prefix, Self::generate_secret(TOKEN_SECRET_LEN));

        sqlx::query(
            "INSERT INTO auth_token (id, user_id, kind, token_hash, expires_at, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(new_v7())
        .bind(user_id)
        .bind(kind)
        .bind(Self::hash_token(&token))
        .bind(expires_at)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok((token, expires_at))
    }

    /// Issue a fresh access/refresh pair for `user_id`.
    pub async fn issue_tokens(
        &self,
        user_id: Uuid,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Result<TokenPair> {
        let (access, access_expires_at) = self
            .insert_token(user_id, "access", ACCESS_TOKEN_PREFIX, access_ttl)
            .await?;
        let (refresh, refresh_expires_at) = self
            .insert_token(user_id, "refresh", REFRESH_TOKEN_PREFIX, refresh_ttl)
            .await?;

        debug!(
            subsystem = "db",
            component = "users",
            op = "issue_tokens",
            user_id = %user_id,
            "Tokens issued"
        );

        Ok(TokenPair {
            access,
            refresh,
            access_expires_at,
            refresh_expires_at,
        })
    }

    async fn find_token_owner(&self, token: &str, kind: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT u.id, u.username, u.email, u.created_at
             FROM auth_token t
             JOIN app_user u ON u.id = t.user_id
             WHERE t.token_hash = $1
               AND t.kind = $2
               AND t.revoked_at IS NULL
               AND t.expires_at > $3",
        )
        .bind(Self::hash_token(token))
        .bind(kind)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(row.as_ref().map(user_from_row))
    }

    /// Resolve a live, unrevoked access token to its user.
    pub async fn validate_access_token(&self, token: &str) -> Result<Option<User>> {
        if !token.starts_with(ACCESS_TOKEN_PREFIX) {
            return Ok(None);
        }
        self.find_token_owner(token, "access").await
    }

    /// Exchange a live refresh token for a new access token.
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
        access_ttl: Duration,
    ) -> Result<Option<(String, DateTime<Utc>)>> {
        if !refresh_token.starts_with(REFRESH_TOKEN_PREFIX) {
            return Ok(None);
        }
        let Some(user) = self.find_token_owner(refresh_token, "refresh").await? else {
            return Ok(None);
        };
        let issued = self
            .insert_token(user.id, "access", ACCESS_TOKEN_PREFIX, access_ttl)
            .await?;
        Ok(Some(issued))
    }

    /// Revoke a token. Returns false when it was unknown or already revoked.
    pub async fn revoke_token(&self, token: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE auth_token SET revoked_at = $1 WHERE token_hash = $2 AND revoked_at IS NULL",
        )
        .bind(Utc::now())
        .bind(Self::hash_token(token))
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(result.rows_affected() > 0)
    }
}
