//! Core types and trait definitions for the Purview targeting engine: the
//! rule model and its wire codec, the pure evaluator, and the
//! [`directory::UserDirectory`] abstraction over attribute storage.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod codec;
pub mod directory;
pub mod error;
pub mod eval;
pub mod rule;
pub mod user;

pub use error::{Error, Result};
