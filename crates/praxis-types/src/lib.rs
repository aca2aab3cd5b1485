//! Shared domain types for Praxis.
//!
//! This crate contains the typed payloads passed between pipeline steps,
//! the run state and checkpoint model the engine persists, persisted record
//! shapes, configuration, and the error enums shared across crates.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror, schemars.

pub mod checkpoint;
pub mod config;
pub mod error;
pub mod generation;
pub mod practice;
pub mod record;
pub mod run;
