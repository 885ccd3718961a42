//! # gRPC Relationship Store Client
//!
//! Channel management, bearer authentication, and the record-to-update
//! mapping for the store's v1 write API. The channel is established once at
//! startup and shared by every concurrent batch writer.

use std::time::Duration;

use async_trait::async_trait;
use tonic::{
    metadata::MetadataValue,
    service::{interceptor::InterceptedService, Interceptor},
    transport::{Channel, ClientTlsConfig, Endpoint},
    Code, Request, Status,
};
use tracing::{debug, info};

use super::proto::{
    self, permissions_service_client::PermissionsServiceClient,
    relationship_update::Operation,
};
use super::RelationshipStore;
use crate::config::{SchemaConfig, StoreConfig, TransportSecurity};
use crate::error::{LoaderError, LoaderResult};
use crate::records::EdgeRecord;

/// gRPC interceptor that adds the bearer credential to every request.
#[derive(Debug, Clone)]
pub struct AuthInterceptor {
    token: Option<String>,
}

impl AuthInterceptor {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }
}

impl Interceptor for AuthInterceptor {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        if let Some(ref token) = self.token {
            let value = format!("Bearer {}", token)
                .parse::<MetadataValue<_>>()
                .map_err(|e| Status::internal(format!("Invalid bearer token: {}", e)))?;
            request.metadata_mut().insert("authorization", value);
        }
        Ok(request)
    }
}

/// Map one edge record to the store's update representation.
fn edge_to_update(edge: &EdgeRecord, object_type: &str, relation: &str) -> proto::RelationshipUpdate {
    proto::RelationshipUpdate {
        operation: Operation::Create as i32,
        relationship: Some(proto::Relationship {
            resource: Some(proto::ObjectReference {
                object_type: object_type.to_string(),
                object_id: edge.source_id.clone(),
            }),
            relation: relation.to_string(),
            subject: Some(proto::SubjectReference {
                object: Some(proto::ObjectReference {
                    object_type: object_type.to_string(),
                    object_id: edge.target_id.clone(),
                }),
                optional_relation: String::new(),
            }),
        }),
    }
}

/// Relationship store client backed by a tonic channel.
#[derive(Debug, Clone)]
pub struct GrpcRelationshipStore {
    client: PermissionsServiceClient<InterceptedService<Channel, AuthInterceptor>>,
    endpoint: String,
    object_type: String,
    relation: String,
}

impl GrpcRelationshipStore {
    /// Establish the store channel from configuration.
    pub async fn connect(store: &StoreConfig, schema: &SchemaConfig) -> LoaderResult<Self> {
        let mut endpoint = Endpoint::from_shared(store.endpoint.clone()).map_err(|e| {
            LoaderError::config_error(format!(
                "Invalid store endpoint '{}': {}",
                store.endpoint, e
            ))
        })?;

        endpoint = endpoint
            .timeout(Duration::from_millis(store.timeout_ms))
            .connect_timeout(Duration::from_millis(store.connect_timeout_ms));

        if store.security == TransportSecurity::Tls {
            endpoint = endpoint
                .tls_config(ClientTlsConfig::new().with_native_roots())
                .map_err(|e| {
                    LoaderError::config_error(format!("Invalid TLS configuration: {}", e))
                })?;
        }

        debug!(endpoint = %store.endpoint, "Connecting to relationship store");

        let channel = endpoint
            .connect()
            .await
            .map_err(|e| LoaderError::StoreUnavailable {
                endpoint: store.endpoint.clone(),
                reason: format!("Failed to connect: {}", e),
            })?;

        let interceptor = AuthInterceptor::new(store.token.clone());

        info!(endpoint = %store.endpoint, "Connected to relationship store");

        Ok(Self {
            client: PermissionsServiceClient::with_interceptor(channel, interceptor),
            endpoint: store.endpoint.clone(),
            object_type: schema.object_type.clone(),
            relation: schema.relation.clone(),
        })
    }

    /// The configured endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RelationshipStore for GrpcRelationshipStore {
    async fn write_edges(&self, edges: &[EdgeRecord]) -> LoaderResult<()> {
        let updates = edges
            .iter()
            .map(|edge| edge_to_update(edge, &self.object_type, &self.relation))
            .collect();
        let request = proto::WriteRelationshipsRequest { updates };

        // Cloning a tonic client is cheap; each call needs `&mut`.
        let mut client = self.client.clone();
        let response = client.write_relationships(request).await?;

        debug!(
            records = edges.len(),
            written_at = response
                .into_inner()
                .written_at
                .map(|t| t.token)
                .as_deref()
                .unwrap_or(""),
            "Write accepted by store"
        );
        Ok(())
    }
}

/// Convert tonic Status to LoaderError
impl From<Status> for LoaderError {
    fn from(status: Status) -> Self {
        match status.code() {
            Code::Unauthenticated => LoaderError::Auth(status.message().to_string()),
            Code::PermissionDenied => {
                LoaderError::Auth(format!("Permission denied: {}", status.message()))
            }
            Code::Unavailable => LoaderError::store_unavailable("store", status.message()),
            code => LoaderError::WriteRejected {
                code: format!("{code:?}"),
                message: status.message().to_string(),
            },
        }
    }
}
