//! User repository for gator.
//!
//! This module provides CRUD operations for users in the database.

use super::user::{NewUser, User, UserRow};
use super::DbPool;
use crate::datetime::to_db_timestamp;
use crate::Result;

/// Repository for user CRUD operations.
pub struct UserRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new user in the database.
    ///
    /// Fails with [`GatorError::Conflict`](crate::GatorError::Conflict) when the name is taken.
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        let now = to_db_timestamp(&new_user.created_at);
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (id, created_at, updated_at, name)
             VALUES ($1, $2, $3, $4)
             RETURNING id, created_at, updated_at, name",
        )
        .bind(new_user.id.to_string())
        .bind(&now)
        .bind(&now)
        .bind(&new_user.name)
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Get a user by name.
    pub async fn get_by_name(&self, name: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, created_at, updated_at, name FROM users WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// List all users ordered by name.
    pub async fn list_all(&self) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT id, created_at, updated_at, name FROM users ORDER BY name",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }
}

#[cfg(test)]
impl UserRepository<'_> {
    /// Count total users.
    pub(crate) async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool)
            .await?;

        Ok(count.0)
    }
}
