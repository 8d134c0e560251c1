use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use super::models::{NewText, NewUser, Text, TextChanges, User};
use super::{TextRepository, UserRepository};
use crate::error::{AppError, AppResult};

/// In-memory store for texts and users. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    texts: Arc<RwLock<BTreeMap<i64, Text>>>,
    users: Arc<RwLock<BTreeMap<i64, User>>>,
    next_text_id: Arc<AtomicI64>,
    next_user_id: Arc<AtomicI64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text_count(&self) -> usize {
        self.texts.read().len()
    }

    pub fn user_count(&self) -> usize {
        self.users.read().len()
    }
}

// ids start at 1
fn next_id(counter: &AtomicI64) -> i64 {
    counter.fetch_add(1, Ordering::SeqCst) + 1
}

#[async_trait]
impl TextRepository for MemoryStore {
    async fn create(&self, text: NewText) -> AppResult<Text> {
        let now = Utc::now();
        let text = Text {
            id: next_id(&self.next_text_id),
            title: text.title,
            content: text.content,
            owner_id: text.owner_id,
            created_at: now,
            updated_at: now,
        };
        self.texts.write().insert(text.id, text.clone());
        Ok(text)
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Text>> {
        Ok(self.texts.read().get(&id).cloned())
    }

    async fn find_all(&self) -> AppResult<Vec<Text>> {
        Ok(self.texts.read().values().cloned().collect())
    }

    async fn update(&self, id: i64, changes: TextChanges) -> AppResult<Option<Text>> {
        let mut texts = self.texts.write();
        let Some(text) = texts.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(title) = changes.title {
            text.title = Some(title);
        }
        text.content = changes.content;
        text.updated_at = Utc::now();

        Ok(Some(text.clone()))
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        Ok(self.texts.write().remove(&id).is_some())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: NewUser) -> AppResult<User> {
        // hold the write lock across the uniqueness check
        let mut users = self.users.write();
        if users.values().any(|u| u.email == user.email) {
            return Err(AppError::BadRequest("Email already in use".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: next_id(&self.next_user_id),
            email: user.email,
            password_hash: user.password_hash,
            google_id: user.google_id,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .users
            .read()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        Ok(self.users.read().get(&id).cloned())
    }
}
