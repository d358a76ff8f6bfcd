//! Bearer token authentication: log-in, token signing and the route guard.

mod log_in;
mod middleware;
mod token;

pub use log_in::{authenticate, post_log_in};
pub use middleware::{AuthenticatedUser, auth_guard};
pub use token::{Claims, DEFAULT_TOKEN_DURATION, TokenKeys};
