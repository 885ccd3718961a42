//! # Relationship Store Boundary
//!
//! The remote store is an external collaborator consumed only through its
//! write interface. [`RelationshipStore`] is the seam shared by the gRPC
//! implementation and test doubles; a single client handle is safe for
//! concurrent use by any number of batch writers.

pub mod grpc;
pub mod proto;

use async_trait::async_trait;

use crate::error::LoaderResult;
use crate::records::EdgeRecord;

pub use grpc::GrpcRelationshipStore;

/// Write interface of the relationship store.
#[async_trait]
pub trait RelationshipStore: Send + Sync {
    /// Persist one batch of edges in a single write call.
    ///
    /// Exactly one remote call per invocation; the batch is applied as a
    /// unit or rejected as a unit.
    async fn write_edges(&self, edges: &[EdgeRecord]) -> LoaderResult<()>;
}
