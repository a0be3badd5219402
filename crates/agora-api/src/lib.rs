pub mod attachments;
pub mod auth;
pub mod comments;
pub mod content;
pub mod error;
pub mod identity;
pub mod middleware;
pub mod passwords;
pub mod posts;
pub mod router;
mod rows;
pub mod tokens;

#[cfg(test)]
mod testing;

pub use auth::{AppState, AppStateInner};
pub use router::router;
