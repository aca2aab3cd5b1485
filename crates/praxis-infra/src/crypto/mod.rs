//! Content hashing.

pub mod hash;
