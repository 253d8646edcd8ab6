//! Shared stub implementations of the host traits for this crate's tests.

use std::cell::RefCell;
use std::rc::Rc;

use plugkit_protocol::{
    ColumnSet, Entity, EntityCollection, EntityId, EntityReference, ExecutionContext,
    OrganizationRequest, OrganizationResponse, OrganizationService, QueryExpression, Relationship,
    ServiceError, ServiceProvider, ServiceResult, TracingService,
};
use uuid::Uuid;

/// A trace sink that records every line it is handed.
#[derive(Clone, Default)]
pub struct RecordingTracer {
    lines: Rc<RefCell<Vec<String>>>,
}

impl RecordingTracer {
    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }
}

impl TracingService for RecordingTracer {
    fn trace(&self, message: &str) {
        self.lines.borrow_mut().push(message.to_string());
    }
}

/// An in-memory organization service that records calls and answers with
/// canned results.
#[derive(Clone, Default)]
pub struct StubService {
    pub created: Rc<RefCell<Vec<Entity>>>,
    pub updated: Rc<RefCell<Vec<Entity>>>,
    pub deleted: Rc<RefCell<Vec<(String, EntityId)>>>,
    pub associated: Rc<RefCell<Vec<String>>>,
    pub queries: Rc<RefCell<Vec<QueryExpression>>>,
    pub retrieve_result: Rc<RefCell<Option<Entity>>>,
    pub query_result: Rc<RefCell<Option<EntityCollection>>>,
    pub fetch_xml: Option<String>,
}

impl OrganizationService for StubService {
    fn create(&self, entity: &Entity) -> ServiceResult<EntityId> {
        self.created.borrow_mut().push(entity.clone());
        Ok(Uuid::new_v4())
    }

    fn retrieve(
        &self,
        entity_name: &str,
        id: EntityId,
        _column_set: &ColumnSet,
    ) -> ServiceResult<Entity> {
        self.retrieve_result
            .borrow()
            .clone()
            .ok_or_else(|| ServiceError::NotFound {
                entity_name: entity_name.to_string(),
                id,
            })
    }

    fn update(&self, entity: &Entity) -> ServiceResult<()> {
        self.updated.borrow_mut().push(entity.clone());
        Ok(())
    }

    fn delete(&self, entity_name: &str, id: EntityId) -> ServiceResult<()> {
        self.deleted.borrow_mut().push((entity_name.to_string(), id));
        Ok(())
    }

    fn associate(
        &self,
        _entity_name: &str,
        _id: EntityId,
        relationship: &Relationship,
        _related: &[EntityReference],
    ) -> ServiceResult<()> {
        self.associated.borrow_mut().push(relationship.schema_name.clone());
        Ok(())
    }

    fn disassociate(
        &self,
        _entity_name: &str,
        _id: EntityId,
        relationship: &Relationship,
        _related: &[EntityReference],
    ) -> ServiceResult<()> {
        self.associated.borrow_mut().push(relationship.schema_name.clone());
        Ok(())
    }

    fn retrieve_multiple(&self, query: &QueryExpression) -> ServiceResult<EntityCollection> {
        self.queries.borrow_mut().push(query.clone());
        Ok(self
            .query_result
            .borrow()
            .clone()
            .unwrap_or_else(|| EntityCollection::new(query.entity_name.clone(), Vec::new())))
    }

    fn execute(&self, request: OrganizationRequest) -> ServiceResult<OrganizationResponse> {
        match request {
            OrganizationRequest::ConvertQueryToFetchXml { .. } => Ok(
                OrganizationResponse::FetchXml(
                    self.fetch_xml.clone().unwrap_or_else(|| "<fetch/>".to_string()),
                ),
            ),
            OrganizationRequest::Custom { name, .. } => Ok(OrganizationResponse::Custom {
                name,
                results: Default::default(),
            }),
        }
    }
}

/// A service whose every operation fails with a host fault.
pub struct FailingService;

impl OrganizationService for FailingService {
    fn create(&self, _entity: &Entity) -> ServiceResult<EntityId> {
        Err(ServiceError::Fault("boom".to_string()))
    }

    fn retrieve(
        &self,
        _entity_name: &str,
        _id: EntityId,
        _column_set: &ColumnSet,
    ) -> ServiceResult<Entity> {
        Err(ServiceError::Fault("boom".to_string()))
    }

    fn update(&self, _entity: &Entity) -> ServiceResult<()> {
        Err(ServiceError::Fault("boom".to_string()))
    }

    fn delete(&self, _entity_name: &str, _id: EntityId) -> ServiceResult<()> {
        Err(ServiceError::Fault("boom".to_string()))
    }

    fn associate(
        &self,
        _entity_name: &str,
        _id: EntityId,
        _relationship: &Relationship,
        _related: &[EntityReference],
    ) -> ServiceResult<()> {
        Err(ServiceError::Fault("boom".to_string()))
    }

    fn disassociate(
        &self,
        _entity_name: &str,
        _id: EntityId,
        _relationship: &Relationship,
        _related: &[EntityReference],
    ) -> ServiceResult<()> {
        Err(ServiceError::Fault("boom".to_string()))
    }

    fn retrieve_multiple(&self, _query: &QueryExpression) -> ServiceResult<EntityCollection> {
        Err(ServiceError::Fault("boom".to_string()))
    }

    fn execute(&self, _request: OrganizationRequest) -> ServiceResult<OrganizationResponse> {
        Err(ServiceError::Fault("boom".to_string()))
    }
}

/// A service locator backed by the stubs above. Counts how many times a
/// service was created so lazy resolution can be asserted.
pub struct StubProvider {
    pub context: ExecutionContext,
    pub tracer: RecordingTracer,
    pub service: StubService,
    pub services_created: Rc<RefCell<usize>>,
}

impl StubProvider {
    pub fn new(context: ExecutionContext) -> Self {
        Self {
            context,
            tracer: RecordingTracer::default(),
            service: StubService::default(),
            services_created: Rc::new(RefCell::new(0)),
        }
    }
}

impl ServiceProvider for StubProvider {
    fn tracing_service(&self) -> Box<dyn TracingService + '_> {
        Box::new(self.tracer.clone())
    }

    fn execution_context(&self) -> ExecutionContext {
        self.context.clone()
    }

    fn create_service(&self, _user_id: Option<EntityId>) -> Box<dyn OrganizationService + '_> {
        *self.services_created.borrow_mut() += 1;
        Box::new(self.service.clone())
    }
}
