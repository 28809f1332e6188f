//! Authentication Module
//! Mission: Signed identity tokens, bearer-token gate and role gate

pub mod api;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod user_store;

pub use api::AuthState;
pub use jwt::{InvalidToken, JwtHandler};
pub use middleware::{admin_middleware, auth_middleware, AuthError};
pub use models::{Claims, UserRecord, UserRole};
pub use user_store::UserStore;
