//! The execution context handed to a plugin by the host.
//!
//! Describes what operation triggered the plugin: message, pipeline stage
//! and mode, primary record, the five named parameter collections, and an
//! optional parent context for nested pipelines.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{AttributeValue, Entity, EntityId, ParameterCollection};

/// Name of the input parameter carrying the operation's target record.
pub const TARGET_PARAMETER: &str = "Target";

/// Pipeline stage before security checks run.
pub const STAGE_PRE_VALIDATION: i32 = 10;
/// Pipeline stage before the platform applies the operation.
pub const STAGE_PRE_OPERATION: i32 = 20;
/// Internal, system-reserved stage. Contexts in this stage are noise for
/// most diagnostics and are skipped by the tracer unless asked for.
pub const STAGE_INTERNAL_MAIN_OPERATION: i32 = 30;
/// Pipeline stage after the platform applied the operation.
pub const STAGE_POST_OPERATION: i32 = 40;

/// Host-supplied record of the operation that triggered the plugin.
///
/// All fields are owned snapshots; the context is valid only for the
/// duration of a single plugin invocation and must never be mutated by
/// the plugin or the tracer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub message_name: String,
    /// Pipeline stage; absent for contexts outside the plugin pipeline
    /// (e.g. workflow activities).
    pub stage: Option<i32>,
    /// 0 = synchronous, 1 = asynchronous.
    pub mode: i32,
    /// How deep in the host's own call chain this operation sits.
    pub depth: i32,
    /// The user the operation runs as.
    pub user_id: EntityId,
    pub primary_entity_name: String,
    /// Identifier of the primary record; nil when the operation has none.
    pub primary_entity_id: EntityId,
    pub input_parameters: ParameterCollection,
    pub output_parameters: ParameterCollection,
    pub shared_variables: ParameterCollection,
    /// Snapshots of records taken before the triggering operation,
    /// keyed by image name. Values are entity-valued.
    pub pre_entity_images: ParameterCollection,
    /// Snapshots taken after the triggering operation.
    pub post_entity_images: ParameterCollection,
    pub parent: Option<Box<ExecutionContext>>,
}

impl ExecutionContext {
    /// A minimal context for the given message and primary record type.
    #[must_use]
    pub fn new(message_name: impl Into<String>, primary_entity_name: impl Into<String>) -> Self {
        Self {
            message_name: message_name.into(),
            stage: None,
            mode: 0,
            depth: 1,
            user_id: Uuid::nil(),
            primary_entity_name: primary_entity_name.into(),
            primary_entity_id: Uuid::nil(),
            input_parameters: ParameterCollection::new(),
            output_parameters: ParameterCollection::new(),
            shared_variables: ParameterCollection::new(),
            pre_entity_images: ParameterCollection::new(),
            post_entity_images: ParameterCollection::new(),
            parent: None,
        }
    }

    /// The record carried as the operation's target, when there is one.
    #[must_use]
    pub fn target(&self) -> Option<&Entity> {
        match self.input_parameters.get(TARGET_PARAMETER) {
            Some(AttributeValue::Entity(entity)) => Some(entity),
            _ => None,
        }
    }

    /// The first before-image snapshot, when one was registered.
    #[must_use]
    pub fn pre_image(&self) -> Option<&Entity> {
        first_entity(&self.pre_entity_images)
    }

    /// The first after-image snapshot, when one was registered.
    #[must_use]
    pub fn post_image(&self) -> Option<&Entity> {
        first_entity(&self.post_entity_images)
    }
}

fn first_entity(images: &ParameterCollection) -> Option<&Entity> {
    images.values().find_map(|value| match value {
        AttributeValue::Entity(entity) => Some(entity),
        _ => None,
    })
}
