//! ContentHasher trait for duplicate detection of submitted inputs.
//!
//! Defined in praxis-core so services can hash content without coupling to
//! a specific hashing algorithm. The `Sha256ContentHasher` adapter lives in
//! praxis-infra.

/// Abstraction over content hashing.
pub trait ContentHasher: Send + Sync {
    /// Compute a hex-encoded hash of the given content.
    fn compute_hash(&self, content: &str) -> String;
}
