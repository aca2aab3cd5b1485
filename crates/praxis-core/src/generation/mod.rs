//! Generation adapter: one uniform `generate` operation over heterogeneous
//! text-generation backends.

pub mod adapter;
pub mod backend;
pub mod box_backend;
pub mod schema;

pub use adapter::GenerationAdapter;
pub use backend::{GenerationBackend, GenerationRequest};
pub use box_backend::BoxGenerationBackend;
pub use schema::SchemaDescriptor;
