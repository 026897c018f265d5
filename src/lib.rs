//! Gator - a multi-user RSS feed aggregator.
//!
//! Users register, follow feeds and browse the posts that the aggregation
//! loop pulls in. Everything is driven from the command line through the
//! command registry in [`commands`].

pub mod auth;
pub mod commands;
pub mod config;
pub mod datetime;
pub mod db;
pub mod error;
pub mod logging;
pub mod rss;
pub mod shutdown;

pub use auth::Session;
pub use commands::{Command, Context, Handler, Registry};
pub use config::Config;
pub use db::{Database, NewUser, SqlStore, Store, User, UserRepository};
pub use error::{GatorError, Result};
pub use crate::rss::{Aggregator, FeedFetcher, IngestionScheduler, TickReport};
pub use shutdown::Shutdown;
