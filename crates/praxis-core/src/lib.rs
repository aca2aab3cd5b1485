//! Step engine, generation contract and repository trait definitions for Praxis.
//!
//! This crate defines the "ports" (checkpoint store, record repository,
//! generation backend) that the infrastructure layer implements. It depends
//! only on `praxis-types` -- never on `praxis-infra` or any database/IO crate.

pub mod generation;
pub mod pipeline;
pub mod prompts;
pub mod repository;
pub mod service;

#[cfg(test)]
pub(crate) mod test_support;
