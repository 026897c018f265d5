//! User model for gator.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::parse_id;
use crate::datetime::from_db_timestamp;
use crate::{GatorError, Result};

/// A registered user.
///
/// The name doubles as the login handle and is unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Surrogate key.
    pub id: Uuid,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
    /// Display name and login handle.
    pub name: String,
}

/// Data for creating a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Surrogate key, generated by the caller.
    pub id: Uuid,
    /// Creation time; also used as the initial update time.
    pub created_at: DateTime<Utc>,
    /// Display name and login handle.
    pub name: String,
}

impl NewUser {
    /// Create a new user with a fresh id, stamped now.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            name: name.into(),
        }
    }
}

/// Row type for users from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct UserRow {
    pub id: String,
    pub created_at: String,
    pub updated_at: String,
    pub name: String,
}

impl TryFrom<UserRow> for User {
    type Error = GatorError;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(User {
            id: parse_id(&row.id)?,
            created_at: from_db_timestamp(&row.created_at).unwrap_or_else(Utc::now),
            updated_at: from_db_timestamp(&row.updated_at).unwrap_or_else(Utc::now),
            name: row.name,
        })
    }
}
