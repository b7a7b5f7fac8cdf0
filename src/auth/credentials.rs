//! Credential store — resolves operator identities to their password hash
//! and assigned brand.
//!
//! Backed by SQLite through sqlx. Passwords are bcrypt hashes (cost 12).
//! Brand assignment is immutable once provisioned.

use std::sync::OnceLock;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use crate::auth::guard::canonicalize;
use crate::errors::AppError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub email: String,
    pub password_hash: String,
    pub brand: String,
}

#[derive(Clone)]
pub struct CredentialStore {
    pool: SqlitePool,
}

/// Hash verified against when the identity is unknown, so that a lookup miss
/// costs the same as a wrong password. Computed once per process.
fn dummy_hash() -> &'static str {
    static DUMMY: OnceLock<String> = OnceLock::new();
    DUMMY.get_or_init(|| {
        bcrypt::hash("fleetgate-dummy-password", bcrypt::DEFAULT_COST)
            .unwrap_or_else(|_| String::new())
    })
}

impl CredentialStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        // SQLite in-memory databases are per-connection, so the pool is
        // capped at one connection. The users table is tiny and read-mostly.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS users (
                email         TEXT PRIMARY KEY,
                password_hash TEXT NOT NULL,
                brand         TEXT NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn lookup(&self, email: &str) -> Result<Option<UserRow>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT email, password_hash, brand FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Verify a plaintext password for an identity.
    ///
    /// Unknown identity and wrong password are indistinguishable to the
    /// caller: both return `InvalidCredentials`, and the unknown-identity
    /// path still performs a bcrypt comparison against a dummy hash.
    pub async fn verify(&self, email: &str, password: &str) -> Result<UserRow, AppError> {
        let user = self.lookup(email).await?;

        let (hash, user) = match user {
            Some(u) => (u.password_hash.clone(), Some(u)),
            None => (dummy_hash().to_string(), None),
        };

        // bcrypt comparison is CPU-bound (~hundreds of ms at cost 12);
        // keep it off the async dispatch path.
        let password = password.to_string();
        let ok = tokio::task::spawn_blocking(move || {
            bcrypt::verify(&password, &hash).unwrap_or(false)
        })
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

        match (ok, user) {
            (true, Some(user)) => Ok(user),
            _ => Err(AppError::InvalidCredentials),
        }
    }

    /// Provision an operator. Returns false if the email is already taken.
    pub async fn insert_user(
        &self,
        email: &str,
        password: &str,
        brand: &str,
    ) -> anyhow::Result<bool> {
        let password = password.to_string();
        let hash =
            tokio::task::spawn_blocking(move || bcrypt::hash(&password, bcrypt::DEFAULT_COST))
                .await??;

        let result = sqlx::query(
            "INSERT OR IGNORE INTO users (email, password_hash, brand) VALUES ($1, $2, $3)",
        )
        .bind(email)
        .bind(hash)
        .bind(canonicalize(brand))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_users(&self) -> anyhow::Result<Vec<UserRow>> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT email, password_hash, brand FROM users ORDER BY email ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Idempotent demo operator used by the dashboard walkthrough.
    pub async fn seed_demo_user(&self) -> anyhow::Result<()> {
        let created = self
            .insert_user("user1@example.com", "password123", "audi")
            .await?;
        if created {
            tracing::info!("demo operator created (user1@example.com / audi)");
        } else {
            tracing::debug!("demo operator already exists");
        }
        Ok(())
    }
}
