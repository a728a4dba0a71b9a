pub mod auth;
pub mod rate_limit;

pub use auth::{authenticate, ActivatedUser, AuthenticatedUser, Principal};
pub use rate_limit::{rate_limit, spawn_sweeper, RateLimiter};
