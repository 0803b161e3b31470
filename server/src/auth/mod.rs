//! Producer authentication.

mod middleware;

pub use middleware::*;
