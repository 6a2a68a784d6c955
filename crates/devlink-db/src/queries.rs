use crate::Database;
use crate::models::{NewUser, UserRow, summary};
use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use devlink_types::models::{Post, Profile, UserSummary};
use rusqlite::Connection;
use uuid::Uuid;

// None of these wrap a read-then-write in a transaction. Handlers load a
// document, mutate it and save it back, so two requests racing on the same
// post can lose one of the updates.

impl Database {
    // -- Users --

    /// Insert a user. Returns `false` if the email is already taken.
    pub fn create_user(&self, user: &NewUser<'_>) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (id, name, email, password, avatar, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(email) DO NOTHING",
                (
                    user.id.to_string(),
                    user.name,
                    user.email,
                    user.password_hash,
                    user.avatar,
                    now(),
                ),
            )?;
            Ok(inserted == 1)
        })
    }

    /// Emails compare without regard to case (the column is `COLLATE NOCASE`).
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: Uuid) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", &id.to_string()))
    }

    /// Delete a user together with their profile and posts.
    /// Returns `false` if the user did not exist.
    pub fn delete_account(&self, user_id: Uuid) -> Result<bool> {
        let uid = user_id.to_string();
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM profiles WHERE user_id = ?1", [&uid])?;
            tx.execute("DELETE FROM posts WHERE user_id = ?1", [&uid])?;
            let removed = tx.execute("DELETE FROM users WHERE id = ?1", [&uid])?;
            tx.commit()?;
            Ok(removed == 1)
        })
    }

    // -- Profiles --

    pub fn get_profile_by_user(&self, user_id: Uuid) -> Result<Option<Profile>> {
        self.with_conn(|conn| {
            let doc: Option<String> = conn
                .query_row(
                    "SELECT doc FROM profiles WHERE user_id = ?1",
                    [user_id.to_string()],
                    |row| row.get(0),
                )
                .optional()?;

            Ok(doc.map(|d| serde_json::from_str(&d)).transpose()?)
        })
    }

    /// Profile with its owner's name and avatar joined in.
    pub fn get_populated_profile(&self, user_id: Uuid) -> Result<Option<Profile<UserSummary>>> {
        self.with_conn(|conn| {
            let mut profiles = query_populated_profiles(conn, Some(user_id))?;
            Ok(profiles.pop())
        })
    }

    pub fn list_profiles(&self) -> Result<Vec<Profile<UserSummary>>> {
        self.with_conn(|conn| query_populated_profiles(conn, None))
    }

    pub fn insert_profile(&self, profile: &Profile) -> Result<()> {
        let doc = serde_json::to_string(profile)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO profiles (id, user_id, doc) VALUES (?1, ?2, ?3)",
                (profile.id.to_string(), profile.user.to_string(), doc),
            )?;
            Ok(())
        })
    }

    /// Overwrite a stored profile. Returns `false` if it no longer exists.
    pub fn save_profile(&self, profile: &Profile) -> Result<bool> {
        let doc = serde_json::to_string(profile)?;
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE profiles SET doc = ?2 WHERE user_id = ?1",
                (profile.user.to_string(), doc),
            )?;
            Ok(updated == 1)
        })
    }

    // -- Posts --

    pub fn insert_post(&self, post: &Post) -> Result<()> {
        let doc = serde_json::to_string(post)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO posts (id, user_id, doc, created_at) VALUES (?1, ?2, ?3, ?4)",
                (
                    post.id.to_string(),
                    post.user.to_string(),
                    doc,
                    post.date.to_rfc3339_opts(SecondsFormat::Micros, true),
                ),
            )?;
            Ok(())
        })
    }

    pub fn get_post(&self, id: Uuid) -> Result<Option<Post>> {
        self.with_conn(|conn| {
            let doc: Option<String> = conn
                .query_row("SELECT doc FROM posts WHERE id = ?1", [id.to_string()], |row| {
                    row.get(0)
                })
                .optional()?;

            Ok(doc.map(|d| serde_json::from_str(&d)).transpose()?)
        })
    }

    /// All posts, newest first.
    pub fn list_posts(&self) -> Result<Vec<Post>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT doc FROM posts ORDER BY created_at DESC")?;
            let docs = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let posts = docs
                .iter()
                .map(|d| serde_json::from_str(d))
                .collect::<std::result::Result<Vec<Post>, _>>()?;
            Ok(posts)
        })
    }

    /// Overwrite a stored post. Returns `false` if it no longer exists.
    pub fn save_post(&self, post: &Post) -> Result<bool> {
        let doc = serde_json::to_string(post)?;
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE posts SET doc = ?2 WHERE id = ?1",
                (post.id.to_string(), doc),
            )?;
            Ok(updated == 1)
        })
    }

    pub fn delete_post(&self, id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM posts WHERE id = ?1", [id.to_string()])?;
            Ok(removed == 1)
        })
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!(
        "SELECT id, name, email, password, avatar, created_at FROM users WHERE {} = ?1",
        column
    );
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
                password: row.get(3)?,
                avatar: row.get(4)?,
                created_at: row.get(5)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_populated_profiles(
    conn: &Connection,
    user_id: Option<Uuid>,
) -> Result<Vec<Profile<UserSummary>>> {
    // JOIN users so the owner summary comes back with the document
    let base = "SELECT p.doc, u.id, u.name, u.avatar
                FROM profiles p
                JOIN users u ON u.id = p.user_id";

    let rows = match user_id {
        Some(id) => {
            let mut stmt = conn.prepare(&format!("{} WHERE p.user_id = ?1", base))?;
            stmt.query_map([id.to_string()], profile_columns)?
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
        None => {
            let mut stmt = conn.prepare(&format!("{} ORDER BY u.name", base))?;
            stmt.query_map([], profile_columns)?
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    rows.into_iter()
        .map(|(doc, id, name, avatar)| -> Result<Profile<UserSummary>> {
            let profile: Profile = serde_json::from_str(&doc)?;
            Ok(profile.populate(summary(&id, name, avatar)?))
        })
        .collect()
}

type ProfileColumns = (String, String, String, String);

fn profile_columns(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProfileColumns> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
