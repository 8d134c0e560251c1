pub mod auth;
pub mod system;
pub mod texts;

pub use auth::*;
pub use system::*;
pub use texts::*;
