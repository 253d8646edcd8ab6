//! Structured queries and their pre-serialized XML form.
//!
//! The host accepts queries either as a [`QueryExpression`] object graph or
//! as an already-rendered XML document wrapped in a [`FetchExpression`].
//! Translating between the two is a host operation
//! (`OrganizationRequest::ConvertQueryToFetchXml`); this crate never
//! interprets query semantics itself.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{AttributeValue, ColumnSet};

/// Comparison operator of a single query condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionOperator {
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    Like,
    In,
    Null,
    NotNull,
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Equal => "eq",
            Self::NotEqual => "ne",
            Self::GreaterThan => "gt",
            Self::LessThan => "lt",
            Self::Like => "like",
            Self::In => "in",
            Self::Null => "null",
            Self::NotNull => "not-null",
        };
        f.write_str(name)
    }
}

/// One attribute comparison inside a filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionExpression {
    pub attribute_name: String,
    pub operator: ConditionOperator,
    pub values: Vec<AttributeValue>,
}

impl ConditionExpression {
    #[must_use]
    pub fn new(
        attribute_name: impl Into<String>,
        operator: ConditionOperator,
        value: impl Into<AttributeValue>,
    ) -> Self {
        Self {
            attribute_name: attribute_name.into(),
            operator,
            values: vec![value.into()],
        }
    }
}

/// How the conditions of a filter combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOperator {
    And,
    Or,
}

/// A group of conditions and nested filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterExpression {
    pub filter_operator: LogicalOperator,
    pub conditions: Vec<ConditionExpression>,
    pub filters: Vec<FilterExpression>,
}

impl FilterExpression {
    #[must_use]
    pub fn and() -> Self {
        Self {
            filter_operator: LogicalOperator::And,
            conditions: Vec::new(),
            filters: Vec::new(),
        }
    }

    #[must_use]
    pub fn or() -> Self {
        Self {
            filter_operator: LogicalOperator::Or,
            conditions: Vec::new(),
            filters: Vec::new(),
        }
    }

    pub fn add_condition(
        &mut self,
        attribute_name: impl Into<String>,
        operator: ConditionOperator,
        value: impl Into<AttributeValue>,
    ) {
        self.conditions
            .push(ConditionExpression::new(attribute_name, operator, value));
    }

    pub fn add_filter(&mut self, filter: FilterExpression) {
        self.filters.push(filter);
    }

    /// True when the filter restricts nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty() && self.filters.is_empty()
    }
}

impl Default for FilterExpression {
    fn default() -> Self {
        Self::and()
    }
}

/// A structured query against one record type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryExpression {
    pub entity_name: String,
    pub column_set: ColumnSet,
    pub criteria: FilterExpression,
    pub top_count: Option<u32>,
}

impl QueryExpression {
    #[must_use]
    pub fn new(entity_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            column_set: ColumnSet::default(),
            criteria: FilterExpression::and(),
            top_count: None,
        }
    }
}

impl fmt::Display for QueryExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "QueryExpression({}, {} conditions)",
            self.entity_name,
            self.criteria.conditions.len()
        )
    }
}

/// A query already serialized to the host's XML dialect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchExpression {
    /// The raw XML text, passed to the host verbatim.
    pub query: String,
}

impl FetchExpression {
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }
}

impl fmt::Display for FetchExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FetchExpression")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_query_display_counts_conditions() {
        let mut query = QueryExpression::new("task");
        query
            .criteria
            .add_condition("regardingobjectid", ConditionOperator::Equal, 1);
        assert_eq!(query.to_string(), "QueryExpression(task, 1 conditions)");
    }

    #[test]
    fn test_new_query_has_empty_criteria() {
        let query = QueryExpression::new("contact");
        assert!(query.criteria.is_empty());
        assert!(query.top_count.is_none());
    }

    #[test]
    fn test_condition_holds_reference_values() {
        let id = Uuid::new_v4();
        let mut filter = FilterExpression::and();
        filter.add_condition(
            "accountid",
            ConditionOperator::Equal,
            AttributeValue::String(id.to_string()),
        );
        assert_eq!(filter.conditions.len(), 1);
        assert!(!filter.is_empty());
    }
}
