use chrono::{DateTime, Utc};
use serde::Serialize;

/// A congregation member record. `nama` is the member's display name.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Member {
    pub id: i64,
    pub nama: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub household_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Columns a member listing may sort or search on.
pub const MEMBER_COLUMNS: &[&str] = &["id", "nama", "email", "created_at"];

pub fn member_column(name: &str) -> Option<&'static str> {
    MEMBER_COLUMNS.iter().copied().find(|column| *column == name)
}
