pub mod auth;
pub mod handlers;
pub mod rate_limit;
pub mod response;
pub mod routes;

pub use handlers::AppState;
pub use routes::create_router;
