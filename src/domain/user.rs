use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub static USERNAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.]{3,32}$").expect("username regex must compile"));

/// Access level of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Clergy,
    Elder,
    Staff,
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Clergy => "CLERGY",
            Role::Elder => "ELDER",
            Role::Staff => "STAFF",
            Role::Member => "MEMBER",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UserDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "CLERGY" => Ok(Role::Clergy),
            "ELDER" => Ok(Role::Elder),
            "STAFF" => Ok(Role::Staff),
            "MEMBER" => Ok(Role::Member),
            _ => Err(UserDomainError::UnknownRole(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub password_hash: HashedPassword,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct HashedPassword(String);

#[derive(Debug, Error)]
pub enum UserDomainError {
    #[error("username contains invalid characters or has invalid length")]
    InvalidUsername,
    #[error("password hash cannot be empty")]
    EmptyPasswordHash,
    #[error("unknown role: {0}")]
    UnknownRole(String),
}

impl User {
    pub fn new(
        id: i64,
        email: String,
        username: String,
        password_hash: HashedPassword,
        role: Role,
        created_at: DateTime<Utc>,
    ) -> Result<Self, UserDomainError> {
        if !USERNAME_REGEX.is_match(&username) {
            return Err(UserDomainError::InvalidUsername);
        }
        Ok(Self {
            id,
            email,
            username,
            password_hash,
            role,
            created_at,
        })
    }
}

impl HashedPassword {
    pub fn new(hash: String) -> Result<Self, UserDomainError> {
        if hash.trim().is_empty() {
            return Err(UserDomainError::EmptyPasswordHash);
        }
        Ok(Self(hash))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
