// Session store: identity provider calls, role resolution and login sessions.

pub mod context;
pub mod extract;
pub mod handlers;
pub mod identity;
pub mod registry;
pub mod users;
