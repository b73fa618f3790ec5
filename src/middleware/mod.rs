//! Middleware applied to every request, outside the authentication layer.

pub mod rate_limit;
pub mod recover;

pub use rate_limit::RateLimit;
pub use recover::RecoverPanic;
