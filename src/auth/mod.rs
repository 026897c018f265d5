//! Authentication for gator: the current-user session and the middleware
//! that gates commands on it.

pub mod middleware;
mod session;

pub use middleware::{current_user, logged_in};
pub use session::Session;
