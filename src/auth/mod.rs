//! Bearer-token authentication: signing and verifying access tokens, the
//! guard middleware for protected routes, and the login and password-reset
//! endpoints.

mod forgot_password_endpoint;
mod log_in_endpoint;
mod middleware;
mod reset_password_endpoint;
mod token;

pub use forgot_password_endpoint::forgot_password_endpoint;
pub use log_in_endpoint::log_in_endpoint;
pub use middleware::{AuthState, AuthenticatedUser, auth_guard};
pub use reset_password_endpoint::reset_password_endpoint;
pub use token::{Claims, DEFAULT_TOKEN_DURATION, decode_jwt, encode_jwt};
