//! User authentication
//!
//! Register/login against `users_tb` (argon2 hashes) and HS256 JWTs. The
//! token service works without a database so the JWT middleware can guard the
//! ledger routes in memory-only mode too.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod service;
pub mod token;

pub use error::UserAuthError;
pub use middleware::{AuthUser, jwt_auth_middleware};
pub use service::{LoginRequest, LoginResponse, RegisterRequest, UserAuthService, UserView};
pub use token::{Claims, TokenService};
