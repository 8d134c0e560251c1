pub mod auth;
pub mod texts;

pub use auth::{AuthService, Claims, DEFAULT_TOKEN_TTL};
pub use texts::{Cached, TextInput, TextService, TextServiceConfig, TextView};
