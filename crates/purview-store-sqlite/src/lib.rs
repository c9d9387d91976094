//! SQLite backend for the Purview user directory.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! pool without blocking the async runtime. Audience preview is answered by
//! compiling the visibility rule into a SQL predicate (see [`filter`]) and
//! running it inside the database.

mod encode;
mod schema;
mod store;

pub mod error;
pub mod filter;

pub use error::{Error, Result};
pub use store::SqliteDirectory;

#[cfg(test)]
mod tests;
