//! Host data model and service traits for Plugkit sandbox plugins.
//!
//! This crate defines the shapes a hosted plugin exchanges with the
//! sandbox platform:
//!
//! - [`types`] - Records, references, collections, and the closed
//!   [`AttributeValue`] variant over every renderable value kind
//! - [`context`] - The [`ExecutionContext`] describing the operation that
//!   triggered the plugin, including parameter collections and entity images
//! - [`query`] - Structured queries and their pre-serialized XML form
//! - [`traits`] - The seams to the host: [`OrganizationService`],
//!   [`TracingService`], and [`ServiceProvider`]
//! - [`error`] - [`ServiceError`] raised by host service operations
//!
//! The platform owns the semantics of all of these; this crate only gives
//! them typed Rust shapes so plugins and the diagnostic tracer can work
//! with them.

pub mod context;
pub mod error;
pub mod query;
pub mod traits;
pub mod types;

pub use context::{
    ExecutionContext, STAGE_INTERNAL_MAIN_OPERATION, STAGE_POST_OPERATION, STAGE_PRE_OPERATION,
    STAGE_PRE_VALIDATION, TARGET_PARAMETER,
};
pub use error::{ServiceError, ServiceResult};
pub use query::{
    ConditionExpression, ConditionOperator, FetchExpression, FilterExpression, LogicalOperator,
    QueryExpression,
};
pub use traits::{
    OrganizationRequest, OrganizationResponse, OrganizationService, ServiceProvider,
    TracingService,
};
pub use types::{
    AttributeValue, ColumnSet, Entity, EntityCollection, EntityId, EntityReference, Money,
    OptionSetValue, ParameterCollection, Relationship,
};
