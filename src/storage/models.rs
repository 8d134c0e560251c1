use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored text document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Text {
    /// Assigned by the store on creation, never changes
    pub id: i64,

    pub title: Option<String>,

    pub content: String,

    /// Creating user. Decides who may edit, delete and see statistics.
    pub owner_id: i64,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Text {
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.owner_id == user_id
    }
}

#[derive(Debug, Clone)]
pub struct NewText {
    pub title: Option<String>,
    pub content: String,
    pub owner_id: i64,
}

/// Mutable fields of a text. A `None` title keeps the current one.
#[derive(Debug, Clone)]
pub struct TextChanges {
    pub title: Option<String>,
    pub content: String,
}

/// A registered account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,

    pub email: String,

    /// Argon2 PHC string. Absent for federated accounts.
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub google_id: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: Option<String>,
    pub google_id: Option<String>,
}
