//! Row types as stored in SQLite, and their conversion into domain types.
//! Distinct from devlink-types API models to keep the DB layer independent.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use devlink_types::models::{User, UserSummary};
use uuid::Uuid;

pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub avatar: String,
    pub created_at: String,
}

impl UserRow {
    pub fn user_id(&self) -> Result<Uuid> {
        self.id
            .parse()
            .with_context(|| format!("Corrupt user id '{}'", self.id))
    }

    /// Drop the password hash and parse the stored columns.
    pub fn into_user(self) -> Result<User> {
        Ok(User {
            id: self.user_id()?,
            date: parse_timestamp(&self.created_at)?,
            name: self.name,
            email: self.email,
            avatar: self.avatar,
        })
    }
}

/// Parameters for inserting a user.
pub struct NewUser<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub avatar: &'a str,
}

pub(crate) fn summary(id: &str, name: String, avatar: String) -> Result<UserSummary> {
    Ok(UserSummary {
        id: id.parse().with_context(|| format!("Corrupt user id '{}'", id))?,
        name,
        avatar,
    })
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // Rows written by hand with datetime('now') have no timezone.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .with_context(|| format!("Corrupt timestamp '{}'", raw))
}
