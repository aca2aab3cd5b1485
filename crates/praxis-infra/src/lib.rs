//! Infrastructure layer for Praxis.
//!
//! Contains implementations of the traits defined in `praxis-core`: SQLite
//! checkpoint and record stores, HTTP generation backends, SHA-256 content
//! hashing, and the `config.toml` loader.

pub mod config;
pub mod crypto;
pub mod generation;
pub mod sqlite;
