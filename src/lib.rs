//! Client-side synchronization layer for a social feed.
//!
//! Posts, comments and notifications are held per screen and kept in step
//! with a REST backend through optimistic mutations that reconcile with the
//! server's answer or roll back. Follow state is the one store shared by
//! every screen. Search input goes through a debounced coordinator that only
//! ever shows the latest query's results.
//!
//! [`AppState`] wires everything together and hands out screens:
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use feedsync::{AppState, Config};
//!
//! let app = AppState::new(Config::load())?;
//! app.login("me@example.com", "secret").await?;
//!
//! let feed = app.home();
//! feed.load().await?;
//! for card in feed.snapshot().posts {
//!     println!("{} ({} likes)", card.post.content, card.likes_count);
//! }
//! # Ok(())
//! # }
//! ```

mod auth;
pub mod cache;
pub mod config;
pub mod dto;
pub mod errors;
pub mod models;
pub mod mutation;
pub mod remote;
pub mod search;
pub mod session;
mod states;
pub mod store;
pub mod views;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use errors::{ClientError, ClientResult, MutationError, MutationResult};
pub use states::AppState;
