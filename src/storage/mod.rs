//! Persistence boundary.
//!
//! The service layer only talks to these traits; `MemoryStore` is the
//! in-process implementation the server runs with.

pub mod memory;
pub mod models;

use async_trait::async_trait;

use crate::error::AppResult;

pub use memory::MemoryStore;
pub use models::{NewText, NewUser, Text, TextChanges, User};

#[async_trait]
pub trait TextRepository: Send + Sync {
    async fn create(&self, text: NewText) -> AppResult<Text>;

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Text>>;

    /// All texts in ascending id order
    async fn find_all(&self) -> AppResult<Vec<Text>>;

    /// Apply changes and bump `updated_at`. `None` when the text does not exist.
    async fn update(&self, id: i64, changes: TextChanges) -> AppResult<Option<Text>>;

    /// Returns whether a text was removed
    async fn delete(&self, id: i64) -> AppResult<bool>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `BadRequest` when the e-mail is already registered
    async fn create(&self, user: NewUser) -> AppResult<User>;

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>>;
}
