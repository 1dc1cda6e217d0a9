/// User model and database operations
///
/// This module provides the User model and the handful of writes the system
/// allows on an account: registration, login bookkeeping, email verification
/// and password reset. Users are never deleted or renamed.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     username VARCHAR(100) NOT NULL UNIQUE,
///     email CITEXT NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     email_verified BOOLEAN NOT NULL DEFAULT FALSE,
///     email_verification_token_hash VARCHAR(64),
///     email_verification_expires_at TIMESTAMPTZ,
///     password_reset_token_hash VARCHAR(64),
///     password_reset_expires_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     last_login_at TIMESTAMPTZ
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskchain_shared::models::user::{User, CreateUser};
/// use taskchain_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, CreateUser {
///     username: "alice".to_string(),
///     email: "alice@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// }).await?;
///
/// // Log in with either username or email
/// let found = User::find_by_login(&pool, "alice@example.com").await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// User model representing a user account
///
/// Passwords are stored as Argon2id hashes, never in plaintext. One-time
/// tokens (email verification, password reset) are stored as SHA-256 hashes.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Unique login name; task ownership refers to this value
    pub username: String,

    /// Email address (case-insensitive via CITEXT)
    pub email: String,

    /// Argon2id password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Whether the email address has been verified
    pub email_verified: bool,

    /// SHA-256 of the pending email verification token
    #[serde(skip_serializing)]
    pub email_verification_token_hash: Option<String>,

    /// Expiry of the pending email verification token
    #[serde(skip_serializing)]
    pub email_verification_expires_at: Option<DateTime<Utc>>,

    /// SHA-256 of the pending password reset token
    #[serde(skip_serializing)]
    pub password_reset_token_hash: Option<String>,

    /// Expiry of the pending password reset token
    #[serde(skip_serializing)]
    pub password_reset_expires_at: Option<DateTime<Utc>>,

    /// When the user account was created
    pub created_at: DateTime<Utc>,

    /// When the user account was last updated
    pub updated_at: DateTime<Utc>,

    /// When the user last logged in (None if never logged in)
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Unique login name
    pub username: String,

    /// Email address (compared case-insensitively via CITEXT)
    pub email: String,

    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: String,
}

const USER_COLUMNS: &str = "id, username, email, password_hash, email_verified, \
    email_verification_token_hash, email_verification_expires_at, \
    password_reset_token_hash, password_reset_expires_at, \
    created_at, updated_at, last_login_at";

impl User {
    /// Creates a new user in the database
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Username or email already exists (unique constraint violation)
    /// - Database connection fails
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(data.username)
        .bind(data.email)
        .bind(data.password_hash)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Creates a user together with a pending email verification token
    ///
    /// The account and its token are written by one statement, so an account
    /// never exists without its token and a failed registration can simply
    /// be retried.
    ///
    /// # Errors
    ///
    /// Same as [`User::create`]; on any error nothing is stored
    pub async fn create_with_verification(
        pool: &PgPool,
        data: CreateUser,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash,
                               email_verification_token_hash, email_verification_expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(data.username)
        .bind(data.email)
        .bind(data.password_hash)
        .bind(token_hash)
        .bind(expires_at)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by username (exact match)
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email address
    ///
    /// Email lookup is case-insensitive. The bind is cast to CITEXT; a plain
    /// TEXT parameter would turn the comparison into `text = text`.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1::citext"
        ))
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by username or email, whichever the login string names
    ///
    /// A login containing `@` is treated as an email address.
    pub async fn find_by_login(pool: &PgPool, login: &str) -> Result<Option<Self>, sqlx::Error> {
        if login.contains('@') {
            Self::find_by_email(pool, login).await
        } else {
            Self::find_by_username(pool, login).await
        }
    }

    /// Updates the last login timestamp for a user
    ///
    /// Returns true if the user was found and updated
    pub async fn update_last_login(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Marks the email as verified if the token hash matches and has not expired
    ///
    /// The token is consumed on success. Returns the updated user, or None if
    /// no unexpired token matched.
    pub async fn verify_email(pool: &PgPool, token_hash: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET email_verified = TRUE,
                email_verification_token_hash = NULL,
                email_verification_expires_at = NULL,
                updated_at = NOW()
            WHERE email_verification_token_hash = $1
              AND email_verification_expires_at > NOW()
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(token_hash)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Stores a pending password reset token (hashed) and its expiry
    ///
    /// Replaces any earlier pending token.
    pub async fn set_password_reset_token(
        pool: &PgPool,
        id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_reset_token_hash = $2,
                password_reset_expires_at = $3,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Replaces the password hash if the reset token matches and has not expired
    ///
    /// The token is consumed on success. Returns None if no unexpired token
    /// matched.
    pub async fn reset_password(
        pool: &PgPool,
        token_hash: &str,
        new_password_hash: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET password_hash = $2,
                password_reset_token_hash = NULL,
                password_reset_expires_at = NULL,
                updated_at = NOW()
            WHERE password_reset_token_hash = $1
              AND password_reset_expires_at > NOW()
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(token_hash)
        .bind(new_password_hash)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            email_verified: false,
            email_verification_token_hash: Some("abc".to_string()),
            email_verification_expires_at: Some(now),
            password_reset_token_hash: Some("def".to_string()),
            password_reset_expires_at: Some(now),
            created_at: now,
            updated_at: now,
            last_login_at: None,
        }
    }

    #[test]
    fn test_create_user_struct() {
        let create_user = CreateUser {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "hash".to_string(),
        };

        assert_eq!(create_user.username, "alice");
        assert_eq!(create_user.password_hash, "hash");
    }

    #[test]
    fn test_secrets_are_not_serialized() {
        let json = serde_json::to_value(sample_user()).unwrap();

        assert_eq!(json["username"], "alice");
        assert!(json.get("password_hash").is_none());
        assert!(json.get("email_verification_token_hash").is_none());
        assert!(json.get("password_reset_token_hash").is_none());
    }

    #[test]
    fn test_user_columns_cover_struct() {
        for column in ["username", "password_reset_expires_at", "last_login_at"] {
            assert!(USER_COLUMNS.contains(column));
        }
    }

    // Integration tests for database operations are in tests/pg_store_tests.rs
}
