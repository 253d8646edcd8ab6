//! Helpers for walking lookups between records.

use plugkit_protocol::{
    AttributeValue, ColumnSet, ConditionOperator, Entity, FilterExpression, QueryExpression,
    ServiceResult,
};

use crate::context::Context;

/// Navigation over a record's lookup attributes, going through the
/// context facade for the actual retrieves.
pub trait RelationshipExt {
    /// Follow a reference-valued attribute to the record it points at.
    /// `Ok(None)` when the attribute is absent or not a reference.
    fn parent_entity(
        &self,
        context: &Context<'_>,
        lookup_name: &str,
        columns: &[&str],
    ) -> ServiceResult<Option<Entity>>;

    /// All records of `child_entity_name` whose `lookup_name` attribute
    /// points back at this record.
    fn child_entities(
        &self,
        context: &Context<'_>,
        child_entity_name: &str,
        lookup_name: &str,
        columns: &[&str],
    ) -> ServiceResult<Vec<Entity>>;

    /// Like [`RelationshipExt::child_entities`] with an additional
    /// caller-supplied filter.
    fn child_entities_filtered(
        &self,
        context: &Context<'_>,
        child_entity_name: &str,
        lookup_name: &str,
        filter: FilterExpression,
        columns: &[&str],
    ) -> ServiceResult<Vec<Entity>>;
}

impl RelationshipExt for Entity {
    fn parent_entity(
        &self,
        context: &Context<'_>,
        lookup_name: &str,
        columns: &[&str],
    ) -> ServiceResult<Option<Entity>> {
        let Some(reference) = self.get_reference(lookup_name) else {
            return Ok(None);
        };
        context
            .retrieve_reference(reference, &ColumnSet::new(columns))
            .map(Some)
    }

    fn child_entities(
        &self,
        context: &Context<'_>,
        child_entity_name: &str,
        lookup_name: &str,
        columns: &[&str],
    ) -> ServiceResult<Vec<Entity>> {
        let query = child_query(self, child_entity_name, lookup_name, columns);
        Ok(context.retrieve_multiple(&query)?.entities)
    }

    fn child_entities_filtered(
        &self,
        context: &Context<'_>,
        child_entity_name: &str,
        lookup_name: &str,
        filter: FilterExpression,
        columns: &[&str],
    ) -> ServiceResult<Vec<Entity>> {
        let mut query = child_query(self, child_entity_name, lookup_name, columns);
        query.criteria.add_filter(filter);
        Ok(context.retrieve_multiple(&query)?.entities)
    }
}

fn child_query(
    entity: &Entity,
    child_entity_name: &str,
    lookup_name: &str,
    columns: &[&str],
) -> QueryExpression {
    let mut query = QueryExpression::new(child_entity_name);
    query.column_set.add_columns(columns);
    query.criteria.add_condition(
        lookup_name,
        ConditionOperator::Equal,
        AttributeValue::String(entity.id.to_string()),
    );
    query
}
