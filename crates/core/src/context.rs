//! The facade a plugin works through: one object wrapping the host's
//! record service and trace sink, plus convenience accessors for the
//! records carried by the execution context.
//!
//! Every pass-through operation traces a "starting" line, delegates to
//! the host unchanged, and traces a "finished" line. Host faults are
//! never caught here; a failed operation leaves a started-but-not-finished
//! signature in the trace log, which is diagnostic information in itself.

use chrono::Utc;
use once_cell::unsync::OnceCell;
use plugkit_protocol::{
    ColumnSet, Entity, EntityCollection, EntityId, EntityReference, ExecutionContext,
    OrganizationRequest, OrganizationResponse, OrganizationService, QueryExpression, Relationship,
    ServiceProvider, ServiceResult, TracingService,
};

use crate::tracer;

type ServiceFactory<'a> = Box<dyn Fn() -> Box<dyn OrganizationService + 'a> + 'a>;

/// The host service handle, resolved at most once per context instance.
enum ServiceHandle<'a> {
    Ready(Box<dyn OrganizationService + 'a>),
    Deferred {
        factory: ServiceFactory<'a>,
        cache: OnceCell<Box<dyn OrganizationService + 'a>>,
    },
}

impl<'a> ServiceHandle<'a> {
    fn get(&self) -> &(dyn OrganizationService + 'a) {
        match self {
            Self::Ready(service) => service.as_ref(),
            Self::Deferred { factory, cache } => cache.get_or_init(|| factory()).as_ref(),
        }
    }
}

/// One object wrapping everything a plugin touches during an invocation.
pub struct Context<'a> {
    tracing: Box<dyn TracingService + 'a>,
    execution_context: ExecutionContext,
    service: ServiceHandle<'a>,
}

impl<'a> Context<'a> {
    /// Build a context from the host's service locator. The organization
    /// service is created lazily, on first use, running as the calling
    /// user or as the system user when `run_as_system` is set.
    pub fn from_provider(provider: &'a dyn ServiceProvider, run_as_system: bool) -> Self {
        let tracing = provider.tracing_service();
        let execution_context = provider.execution_context();
        let user_id = if run_as_system {
            None
        } else {
            Some(execution_context.user_id)
        };

        Self {
            tracing,
            execution_context,
            service: ServiceHandle::Deferred {
                factory: Box::new(move || provider.create_service(user_id)),
                cache: OnceCell::new(),
            },
        }
    }

    /// Build a context around an already-resolved service and sink. Used
    /// by tests and by hosts that do not hand out a service locator.
    pub fn new(
        service: Box<dyn OrganizationService + 'a>,
        tracing: Box<dyn TracingService + 'a>,
        execution_context: ExecutionContext,
    ) -> Self {
        Self {
            tracing,
            execution_context,
            service: ServiceHandle::Ready(service),
        }
    }

    pub fn execution_context(&self) -> &ExecutionContext {
        &self.execution_context
    }

    /// The resolved host service.
    pub fn service(&self) -> &(dyn OrganizationService + 'a) {
        self.service.get()
    }

    /// Write a timestamped line to the host's trace sink.
    pub fn trace(&self, message: impl AsRef<str>) {
        TracingService::trace(self, message.as_ref());
    }

    /// Dump the execution context to this facade's sink with default
    /// tracer settings.
    pub fn trace_execution_context(&self) {
        tracer::trace_context_default(self, &self.execution_context);
    }

    /// Create the record when its identifier is nil, update it otherwise.
    /// Returns the resulting identifier either way.
    pub fn save(&self, entity: &Entity) -> ServiceResult<EntityId> {
        if entity.id.is_nil() {
            self.trace(format!(
                "Creating {} with {} attributes",
                entity.logical_name,
                entity.attributes.len()
            ));
            let id = self.service().create(entity)?;
            self.trace("Created!");
            Ok(id)
        } else {
            self.trace(format!(
                "Updating {} with {} attributes",
                entity.logical_name,
                entity.attributes.len()
            ));
            self.service().update(entity)?;
            self.trace("Updated!");
            Ok(entity.id)
        }
    }

    pub fn retrieve(
        &self,
        entity_name: &str,
        id: EntityId,
        column_set: &ColumnSet,
    ) -> ServiceResult<Entity> {
        self.trace(format!(
            "Retrieving {entity_name} {id} with {} attributes",
            column_set.columns.len()
        ));
        let result = self.service().retrieve(entity_name, id, column_set)?;
        self.trace("Retrieved!");
        Ok(result)
    }

    pub fn retrieve_reference(
        &self,
        reference: &EntityReference,
        column_set: &ColumnSet,
    ) -> ServiceResult<Entity> {
        self.retrieve(&reference.logical_name, reference.id, column_set)
    }

    pub fn delete(&self, entity_name: &str, id: EntityId) -> ServiceResult<()> {
        self.trace(format!("Deleting {entity_name} {id}"));
        self.service().delete(entity_name, id)?;
        self.trace("Deleted!");
        Ok(())
    }

    pub fn delete_reference(&self, reference: &EntityReference) -> ServiceResult<()> {
        self.delete(&reference.logical_name, reference.id)
    }

    pub fn associate(
        &self,
        entity_name: &str,
        id: EntityId,
        relationship: &Relationship,
        related: &[EntityReference],
    ) -> ServiceResult<()> {
        self.trace(format!(
            "Associating {entity_name} {id} over {} with {} {}",
            relationship.schema_name,
            related.len(),
            related
                .iter()
                .map(|r| r.logical_name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ));
        self.service().associate(entity_name, id, relationship, related)?;
        self.trace("Associated!");
        Ok(())
    }

    pub fn associate_reference(
        &self,
        reference: &EntityReference,
        relationship: &Relationship,
        related: &[EntityReference],
    ) -> ServiceResult<()> {
        self.associate(&reference.logical_name, reference.id, relationship, related)
    }

    pub fn disassociate(
        &self,
        entity_name: &str,
        id: EntityId,
        relationship: &Relationship,
        related: &[EntityReference],
    ) -> ServiceResult<()> {
        self.trace(format!(
            "Disassociating {entity_name} {id} over {} with {} {}",
            relationship.schema_name,
            related.len(),
            related
                .iter()
                .map(|r| r.logical_name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ));
        self.service().disassociate(entity_name, id, relationship, related)?;
        self.trace("Disassociated!");
        Ok(())
    }

    pub fn disassociate_reference(
        &self,
        reference: &EntityReference,
        relationship: &Relationship,
        related: &[EntityReference],
    ) -> ServiceResult<()> {
        self.disassociate(&reference.logical_name, reference.id, relationship, related)
    }

    pub fn retrieve_multiple(&self, query: &QueryExpression) -> ServiceResult<EntityCollection> {
        self.trace(format!("Retrieving with {query}"));
        let result = self.service().retrieve_multiple(query)?;
        self.trace(format!(
            "Retrieved {} {}",
            result.entities.len(),
            result.entity_name
        ));
        Ok(result)
    }

    pub fn execute(&self, request: OrganizationRequest) -> ServiceResult<OrganizationResponse> {
        self.trace(format!("Executing {request}"));
        let result = self.service().execute(request)?;
        self.trace("Executed!");
        Ok(result)
    }

    /// The record carried as the operation's target, when there is one.
    pub fn target(&self) -> Option<&Entity> {
        self.execution_context.target()
    }

    /// The record as it looked before the triggering operation.
    pub fn pre_image(&self) -> Option<&Entity> {
        self.execution_context.pre_image()
    }

    /// The record as it looks after the triggering operation.
    pub fn post_image(&self) -> Option<&Entity> {
        self.execution_context.post_image()
    }

    /// The target merged with both images. Target attributes win, the
    /// pre-image fills the gaps, and the post-image fills whatever is
    /// still missing. The precedence is deliberate: the target reflects
    /// what this operation is changing.
    pub fn full_entity(&self) -> Option<Entity> {
        let mut result = self.target()?.clone();
        for image in [self.pre_image(), self.post_image()].into_iter().flatten() {
            for (name, value) in &image.attributes {
                result
                    .attributes
                    .entry(name.clone())
                    .or_insert_with(|| value.clone());
            }
        }
        Some(result)
    }
}

impl TracingService for Context<'_> {
    fn trace(&self, message: &str) {
        let stamp = Utc::now().format("%H:%M:%S%.3f  ");
        self.tracing.trace(&format!("{stamp}{message}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingService, RecordingTracer, StubProvider, StubService};
    use plugkit_protocol::{AttributeValue, TARGET_PARAMETER};
    use uuid::Uuid;

    fn stub_context<'a>(
        service: &StubService,
        tracer: &RecordingTracer,
        execution_context: ExecutionContext,
    ) -> Context<'a> {
        Context::new(
            Box::new(service.clone()),
            Box::new(tracer.clone()),
            execution_context,
        )
    }

    #[test]
    fn test_save_creates_when_id_is_nil() {
        let service = StubService::default();
        let tracer = RecordingTracer::default();
        let context = stub_context(&service, &tracer, ExecutionContext::new("Create", "task"));

        let mut task = Entity::new("task");
        task.set("subject", "call back");

        let id = context.save(&task).unwrap();
        assert!(!id.is_nil());
        assert_eq!(service.created.borrow().len(), 1);
        assert!(service.updated.borrow().is_empty());
    }

    #[test]
    fn test_save_updates_when_id_is_set() {
        let service = StubService::default();
        let tracer = RecordingTracer::default();
        let context = stub_context(&service, &tracer, ExecutionContext::new("Update", "task"));

        let existing = Uuid::new_v4();
        let task = Entity::with_id("task", existing);

        let id = context.save(&task).unwrap();
        assert_eq!(id, existing);
        assert!(service.created.borrow().is_empty());
        assert_eq!(service.updated.borrow().len(), 1);
    }

    #[test]
    fn test_failed_operation_leaves_started_signature() {
        let tracer = RecordingTracer::default();
        let context = Context::new(
            Box::new(FailingService),
            Box::new(tracer.clone()),
            ExecutionContext::new("Retrieve", "contact"),
        );

        let result = context.retrieve("contact", Uuid::new_v4(), &ColumnSet::all());
        assert!(result.is_err());

        let lines = tracer.lines();
        assert!(lines.iter().any(|l| l.contains("Retrieving contact")));
        assert!(!lines.iter().any(|l| l.contains("Retrieved!")));
    }

    #[test]
    fn test_trace_prepends_timestamp() {
        let tracer = RecordingTracer::default();
        let context = Context::new(
            Box::new(StubService::default()),
            Box::new(tracer.clone()),
            ExecutionContext::new("Create", "task"),
        );

        context.trace("hello");

        let lines = tracer.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("  hello"));
        assert!(lines[0].len() > "hello".len());
    }

    #[test]
    fn test_full_entity_merge_precedence() {
        let mut execution_context = ExecutionContext::new("Update", "contact");
        let mut target = Entity::with_id("contact", Uuid::new_v4());
        target.set("a", "target");
        let mut pre = Entity::with_id("contact", target.id);
        pre.set("a", "pre");
        pre.set("b", "pre");
        let mut post = Entity::with_id("contact", target.id);
        post.set("b", "post");
        post.set("c", "post");

        execution_context
            .input_parameters
            .insert(TARGET_PARAMETER.to_string(), AttributeValue::Entity(target));
        execution_context
            .pre_entity_images
            .insert("PreImage".to_string(), AttributeValue::Entity(pre));
        execution_context
            .post_entity_images
            .insert("PostImage".to_string(), AttributeValue::Entity(post));

        let service = StubService::default();
        let tracer = RecordingTracer::default();
        let context = stub_context(&service, &tracer, execution_context);

        let full = context.full_entity().unwrap();
        assert_eq!(full.get("a"), Some(&AttributeValue::from("target")));
        assert_eq!(full.get("b"), Some(&AttributeValue::from("pre")));
        assert_eq!(full.get("c"), Some(&AttributeValue::from("post")));
    }

    #[test]
    fn test_full_entity_requires_target() {
        let service = StubService::default();
        let tracer = RecordingTracer::default();
        let context = stub_context(&service, &tracer, ExecutionContext::new("Delete", "contact"));
        assert!(context.full_entity().is_none());
    }

    #[test]
    fn test_service_is_resolved_lazily_and_once() {
        let provider = StubProvider::new(ExecutionContext::new("Create", "task"));
        let context = Context::from_provider(&provider, false);
        assert_eq!(*provider.services_created.borrow(), 0);

        let task = Entity::new("task");
        context.save(&task).unwrap();
        context.save(&task).unwrap();
        assert_eq!(*provider.services_created.borrow(), 1);
    }

    #[test]
    fn test_associate_and_delete_trace_both_sides() {
        let service = StubService::default();
        let tracer = RecordingTracer::default();
        let context = stub_context(&service, &tracer, ExecutionContext::new("Associate", "account"));

        let account = Uuid::new_v4();
        let relationship = Relationship::new("account_contacts");
        let related = [EntityReference::new("contact", Uuid::new_v4())];
        context
            .associate("account", account, &relationship, &related)
            .unwrap();
        context.delete("account", account).unwrap();

        assert_eq!(
            service.associated.borrow().as_slice(),
            ["account_contacts".to_string()]
        );
        assert_eq!(service.deleted.borrow().len(), 1);

        let lines = tracer.lines();
        assert!(lines.iter().any(|l| l.contains("over account_contacts with 1 contact")));
        assert!(lines.iter().any(|l| l.ends_with("Associated!")));
        assert!(lines.iter().any(|l| l.ends_with("Deleted!")));
    }

    #[test]
    fn test_reference_forms_delegate_to_name_and_id() {
        let service = StubService::default();
        let tracer = RecordingTracer::default();
        let context = stub_context(&service, &tracer, ExecutionContext::new("Associate", "account"));

        let account = EntityReference::new("account", Uuid::new_v4());
        let relationship = Relationship::new("account_contacts");
        let related = [EntityReference::new("contact", Uuid::new_v4())];

        context
            .associate_reference(&account, &relationship, &related)
            .unwrap();
        context
            .disassociate_reference(&account, &relationship, &related)
            .unwrap();

        assert_eq!(service.associated.borrow().len(), 2);

        let lines = tracer.lines();
        assert!(lines
            .iter()
            .any(|l| l.contains(&format!("Associating account {}", account.id))));
        assert!(lines
            .iter()
            .any(|l| l.contains(&format!("Disassociating account {}", account.id))));
    }

    #[test]
    fn test_execute_passes_request_through() {
        let service = StubService::default();
        let tracer = RecordingTracer::default();
        let context = stub_context(&service, &tracer, ExecutionContext::new("Custom", "none"));

        let response = context
            .execute(OrganizationRequest::Custom {
                name: "WhoAmI".to_string(),
                parameters: Default::default(),
            })
            .unwrap();
        assert!(matches!(
            response,
            OrganizationResponse::Custom { name, .. } if name == "WhoAmI"
        ));

        let lines = tracer.lines();
        assert!(lines.iter().any(|l| l.contains("Executing WhoAmI")));
        assert!(lines.iter().any(|l| l.ends_with("Executed!")));
    }

    #[test]
    fn test_retrieve_multiple_traces_result_count() {
        let service = StubService::default();
        let tracer = RecordingTracer::default();
        let context = stub_context(&service, &tracer, ExecutionContext::new("Retrieve", "task"));

        let query = QueryExpression::new("task");
        let collection = context.retrieve_multiple(&query).unwrap();
        assert_eq!(collection.entity_name, "task");

        let lines = tracer.lines();
        assert!(lines.iter().any(|l| l.contains("Retrieving with QueryExpression(task")));
        assert!(lines.iter().any(|l| l.contains("Retrieved 0 task")));
    }
}
