//! The seams between a hosted plugin and the platform.
//!
//! Three traits cover everything a plugin can reach:
//! - [`TracingService`] - The host's line-oriented trace sink
//! - [`OrganizationService`] - The host's CRUD/associate/execute service
//! - [`ServiceProvider`] - The locator handed to the plugin entry point
//!
//! Implementations are supplied by the host (or by test stubs); this crate
//! defines only the contracts.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::context::ExecutionContext;
use crate::error::ServiceResult;
use crate::query::QueryExpression;
use crate::types::{
    ColumnSet, Entity, EntityCollection, EntityId, EntityReference, ParameterCollection,
    Relationship,
};

/// The host's line-oriented trace sink. Every line written here is the
/// only externally observable output of the diagnostic tracer.
pub trait TracingService {
    fn trace(&self, message: &str);
}

/// A request executed through [`OrganizationService::execute`].
///
/// The host defines an open-ended message catalog; the SDK models the one
/// message it invokes itself plus an escape hatch for everything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OrganizationRequest {
    /// Translate a structured query into the host's XML query dialect.
    ConvertQueryToFetchXml { query: QueryExpression },
    Custom {
        name: String,
        parameters: ParameterCollection,
    },
}

impl fmt::Display for OrganizationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConvertQueryToFetchXml { .. } => f.write_str("ConvertQueryToFetchXml"),
            Self::Custom { name, .. } => f.write_str(name),
        }
    }
}

/// The response paired with an [`OrganizationRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OrganizationResponse {
    FetchXml(String),
    Custom {
        name: String,
        results: ParameterCollection,
    },
}

/// The host's record service. All operations are synchronous and run in
/// the security context the service was created for.
pub trait OrganizationService {
    /// Persist a new record and return its host-assigned identifier.
    fn create(&self, entity: &Entity) -> ServiceResult<EntityId>;

    fn retrieve(
        &self,
        entity_name: &str,
        id: EntityId,
        column_set: &ColumnSet,
    ) -> ServiceResult<Entity>;

    fn update(&self, entity: &Entity) -> ServiceResult<()>;

    fn delete(&self, entity_name: &str, id: EntityId) -> ServiceResult<()>;

    fn associate(
        &self,
        entity_name: &str,
        id: EntityId,
        relationship: &Relationship,
        related: &[EntityReference],
    ) -> ServiceResult<()>;

    fn disassociate(
        &self,
        entity_name: &str,
        id: EntityId,
        relationship: &Relationship,
        related: &[EntityReference],
    ) -> ServiceResult<()>;

    fn retrieve_multiple(&self, query: &QueryExpression) -> ServiceResult<EntityCollection>;

    fn execute(&self, request: OrganizationRequest) -> ServiceResult<OrganizationResponse>;
}

/// The service locator handed to the plugin entry point by the host.
pub trait ServiceProvider {
    /// The trace sink for this invocation.
    fn tracing_service(&self) -> Box<dyn TracingService + '_>;

    /// The execution context describing the triggering operation.
    fn execution_context(&self) -> ExecutionContext;

    /// Create a service running as the given user, or as the system user
    /// when `user_id` is `None`.
    fn create_service(&self, user_id: Option<EntityId>) -> Box<dyn OrganizationService + '_>;
}
