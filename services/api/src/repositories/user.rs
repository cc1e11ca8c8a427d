//! User repository for canonical-store operations
//!
//! Passwords are hashed here, at the last moment before they touch the
//! store. Store-level failures are normalized into the API taxonomy by
//! the `From` conversions in `error`, so a unique-violation on email
//! surfaces as a conflict even when a pre-check raced.

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{Avatar, NewUser, Role, User};

const USER_COLUMNS: &str =
    "id, name, email, password_hash, avatar, role, is_verified, created_at, updated_at";

fn map_user(row: PgRow) -> ApiResult<User> {
    let avatar: Option<serde_json::Value> = row.try_get("avatar").map_err(anyhow::Error::from)?;
    let avatar = match avatar {
        Some(value) if !value.is_null() => {
            Some(serde_json::from_value::<Avatar>(value).map_err(anyhow::Error::from)?)
        }
        _ => None,
    };

    let role: String = row.get("role");

    Ok(User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        avatar,
        role: Role::from_str_or_default(&role),
        is_verified: row.get("is_verified"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

fn avatar_value(avatar: &Option<Avatar>) -> ApiResult<serde_json::Value> {
    serde_json::to_value(avatar).map_err(|e| ApiError::Internal(e.into()))
}

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new user, hashing the supplied password
    ///
    /// Social accounts arrive without a password and are stored with an
    /// empty hash, which `User::has_usable_password` reports as unusable.
    pub async fn create(&self, new_user: &NewUser) -> ApiResult<User> {
        info!("Creating new user: {}", new_user.email);

        let password_hash = match &new_user.password {
            Some(password) => hash_password(password)?,
            None => String::new(),
        };

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (name, email, password_hash, avatar, is_verified)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&password_hash)
        .bind(avatar_value(&new_user.avatar)?)
        .bind(new_user.is_verified)
        .fetch_one(&self.pool)
        .await?;

        map_user(row)
    }

    /// Find a user by email
    pub async fn find_by_email(&self, email: &str) -> ApiResult<Option<User>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE email = $1
            "#
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(map_user).transpose()
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: Uuid) -> ApiResult<Option<User>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(map_user).transpose()
    }

    /// Check whether an email is already registered
    pub async fn email_exists(&self, email: &str) -> ApiResult<bool> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1) AS present")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get("present"))
    }

    /// Verify a plaintext password against the stored hash
    pub fn verify_password(&self, user: &User, password: &str) -> ApiResult<bool> {
        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to parse password hash: {}", e)))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Update name and/or email
    pub async fn update_info(
        &self,
        id: Uuid,
        name: Option<&str>,
        email: Option<&str>,
    ) -> ApiResult<User> {
        info!("Updating profile for user: {}", id);

        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(name)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        map_user(row)
    }

    /// Replace the stored password hash
    pub async fn update_password(&self, id: Uuid, new_password: &str) -> ApiResult<User> {
        info!("Updating password for user: {}", id);

        let password_hash = hash_password(new_password)?;

        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET password_hash = $2, updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&password_hash)
        .fetch_one(&self.pool)
        .await?;

        map_user(row)
    }

    /// Replace the avatar reference
    pub async fn update_avatar(&self, id: Uuid, avatar: &Option<Avatar>) -> ApiResult<User> {
        info!("Updating avatar for user: {}", id);

        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET avatar = $2, updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(avatar_value(avatar)?)
        .fetch_one(&self.pool)
        .await?;

        map_user(row)
    }
}
