#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod client;
mod error;

pub mod model;
pub mod query;
pub mod schema;
pub mod types;

pub use client::{ConnectionPool, PgClient, PgConfig, PgPoolStatus, PooledConnection};
pub use error::{BoxError, PgError, PgResult};

/// Type alias for the async connection all repositories are implemented on.
pub type PgConnection = diesel_async::AsyncPgConnection;

/// Tracing target for database operations.
pub const TRACING_TARGET: &str = "plinth_postgres";
