use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use ecoinsight_core::user::{User, DEFAULT_ROLE};

use crate::DocStore;

const COLUMNS: &str = "id, username, email, password_hash, role, created_at";

/// True when an error chain bottoms out in a unique-constraint violation.
///
/// Registration checks for duplicates before inserting, but two
/// concurrent registrations can both pass that check; the loser hits the
/// unique index and the caller needs to tell that apart from a real
/// driver failure.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .is_some_and(|db| db.is_unique_violation())
}

fn row_to_user(row: &PgRow) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        role: row.try_get("role")?,
        created_at: row.try_get("created_at")?,
    })
}

impl DocStore {
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_user).transpose()
    }

    /// Duplicate check for registration: either unique field counts.
    pub async fn user_exists(&self, username: &str, email: &str) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = $1 OR email = $2")
                .bind(username)
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(count > 0)
    }

    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User> {
        let id = Uuid::new_v4();
        let row = sqlx::query(&format!(
            "INSERT INTO users (id, username, email, password_hash, role) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(DEFAULT_ROLE)
        .fetch_one(&self.pool)
        .await?;
        row_to_user(&row)
    }
}
