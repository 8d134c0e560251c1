pub mod analysis;
pub mod cache;
pub mod config;
pub mod error;
pub mod server;
pub mod service;
pub mod storage;

pub use analysis::{analyze, StatName, StatValue, StatisticsRecord};
pub use cache::{CacheKey, CacheStore, MemoryCache};
pub use config::ServerConfig;
pub use error::{AppError, AppResult};
pub use server::{create_router, AppState};
pub use service::{AuthService, TextService, TextServiceConfig};
pub use storage::{MemoryStore, Text, TextRepository, User, UserRepository};
