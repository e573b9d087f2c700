use crate::domain::{HashedPassword, Role, User, UserDomainError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use thiserror::Error;

#[async_trait]
pub trait UserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
    async fn find_by_id(&self, user_id: i64) -> Result<Option<User>, RepositoryError>;
}

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("domain error: {0}")]
    Domain(#[from] UserDomainError),
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let maybe_row = sqlx::query(
            r#"
            SELECT id, email, username, password, role, created_at
            FROM users
            WHERE lower(email) = lower($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        maybe_row.map(map_row_to_user).transpose()
    }

    async fn find_by_id(&self, user_id: i64) -> Result<Option<User>, RepositoryError> {
        let maybe_row = sqlx::query(
            r#"
            SELECT id, email, username, password, role, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        maybe_row.map(map_row_to_user).transpose()
    }
}

fn map_row_to_user(row: sqlx::postgres::PgRow) -> Result<User, RepositoryError> {
    let id: i64 = row.try_get("id")?;
    let email: String = row.try_get("email")?;
    let username: String = row.try_get("username")?;
    let password: String = row.try_get("password")?;
    let role: String = row.try_get("role")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;

    let role = role.parse::<Role>()?;
    let hashed_password = HashedPassword::new(password)?;

    Ok(User::new(id, email, username, hashed_password, role, created_at)?)
}
