//! # Relationship Loader
//!
//! Bulk-loads a delimited edge list into a remote relationship-graph
//! authorization store using concurrent batched writes. Provides the
//! ingestion pipeline as a library plus a CLI binary for manual runs.
//!
//! The pipeline streams records from the input, groups them into fixed-size
//! batches, and dispatches each batch as an independent write task against
//! a shared store client, bounding the number of in-flight requests when
//! configured to.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod records;
pub mod store;

// Re-export commonly used types for convenience
pub use config::LoaderConfig;
pub use error::{LoaderError, LoaderResult};
pub use pipeline::{IngestPipeline, IngestReport};
pub use records::EdgeRecord;
pub use store::{GrpcRelationshipStore, RelationshipStore};
