//! Core value types of the host record model.
//!
//! Everything here mirrors a shape owned by the host platform:
//! - [`Entity`] - A named record with an identifier and attribute map
//! - [`EntityCollection`] - A page of records plus paging metadata
//! - [`EntityReference`] - A typed foreign-key reference
//! - [`ColumnSet`] - The attribute names requested by a retrieve
//! - [`AttributeValue`] - The closed set of value kinds an attribute can hold

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::query::{FetchExpression, QueryExpression};

/// Identifier assigned to a record by the host. The nil UUID means
/// "not yet persisted".
pub type EntityId = Uuid;

/// A mapping from parameter name to value, as carried by the execution
/// context's input/output/shared/image collections.
///
/// A `BTreeMap` keeps iteration order deterministic, which in turn keeps
/// trace output deterministic.
pub type ParameterCollection = BTreeMap<String, AttributeValue>;

/// A named record: a logical type name, an identifier, and an attribute map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// The logical type name of the record, e.g. `contact`.
    pub logical_name: String,

    /// The record identifier; nil for records not yet persisted.
    pub id: EntityId,

    /// Attribute name to value. Sorted iteration comes for free.
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl Entity {
    /// Create an unsaved record of the given type.
    #[must_use]
    pub fn new(logical_name: impl Into<String>) -> Self {
        Self::with_id(logical_name, Uuid::nil())
    }

    /// Create a record with a known identifier.
    #[must_use]
    pub fn with_id(logical_name: impl Into<String>, id: EntityId) -> Self {
        Self {
            logical_name: logical_name.into(),
            id,
            attributes: BTreeMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// The attribute as a typed reference, if it is one.
    pub fn get_reference(&self, name: &str) -> Option<&EntityReference> {
        match self.attributes.get(name) {
            Some(AttributeValue::Reference(reference)) => Some(reference),
            _ => None,
        }
    }

    /// A reference pointing at this record.
    #[must_use]
    pub fn to_reference(&self) -> EntityReference {
        EntityReference {
            logical_name: self.logical_name.clone(),
            id: self.id,
            name: None,
        }
    }
}

/// A typed foreign-key reference: type name, identifier, and an optional
/// display name resolved by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityReference {
    pub logical_name: String,
    pub id: EntityId,
    pub name: Option<String>,
}

impl EntityReference {
    #[must_use]
    pub fn new(logical_name: impl Into<String>, id: EntityId) -> Self {
        Self {
            logical_name: logical_name.into(),
            id,
            name: None,
        }
    }

    #[must_use]
    pub fn named(logical_name: impl Into<String>, id: EntityId, name: impl Into<String>) -> Self {
        Self {
            logical_name: logical_name.into(),
            id,
            name: Some(name.into()),
        }
    }
}

impl fmt::Display for EntityReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.logical_name,
            self.id,
            self.name.as_deref().unwrap_or_default()
        )
    }
}

/// An ordered page of records plus the paging metadata reported by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityCollection {
    pub entity_name: String,
    pub entities: Vec<Entity>,
    /// Total matching records as reported by the host, which may exceed
    /// the number of records in this page.
    pub total_record_count: i64,
    pub more_records: bool,
    pub paging_cookie: Option<String>,
}

impl EntityCollection {
    #[must_use]
    pub fn new(entity_name: impl Into<String>, entities: Vec<Entity>) -> Self {
        let total = entities.len() as i64;
        Self {
            entity_name: entity_name.into(),
            entities,
            total_record_count: total,
            more_records: false,
            paging_cookie: None,
        }
    }
}

/// The set of attribute names requested by a retrieve operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnSet {
    pub columns: Vec<String>,
    /// Request every attribute; `columns` is ignored by the host when set.
    pub all_columns: bool,
}

impl ColumnSet {
    #[must_use]
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
            all_columns: false,
        }
    }

    #[must_use]
    pub fn all() -> Self {
        Self {
            columns: Vec::new(),
            all_columns: true,
        }
    }

    pub fn add_columns(&mut self, columns: &[&str]) {
        self.columns.extend(columns.iter().map(|c| (*c).to_string()));
    }
}

/// An enumerated option value; only the integer code crosses the seam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSetValue(pub i32);

impl fmt::Display for OptionSetValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A monetary amount. The host models this as a decimal; no decimal type
/// exists in this stack, so the amount is carried as `f64` and rendered
/// through `Display`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Money(pub f64);

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A many-to-many or one-to-many relationship, identified by schema name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub schema_name: String,
}

impl Relationship {
    #[must_use]
    pub fn new(schema_name: impl Into<String>) -> Self {
        Self {
            schema_name: schema_name.into(),
        }
    }
}

/// The closed set of value kinds an attribute or context parameter can
/// hold. The set is fixed by the host platform, so consumers dispatch by
/// pattern match rather than downcasting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    String(String),
    DateTime(DateTime<Utc>),
    Money(Money),
    OptionSet(OptionSetValue),
    Reference(EntityReference),
    Entity(Entity),
    Collection(EntityCollection),
    /// A bare record sequence not wrapped in a collection.
    Entities(Vec<Entity>),
    Columns(ColumnSet),
    Query(QueryExpression),
    Fetch(FetchExpression),
}

impl AttributeValue {
    /// The runtime-type label used by the tracer's type annotations.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Boolean(_) => "Boolean",
            Self::Integer(_) => "Integer",
            Self::Double(_) => "Double",
            Self::String(_) => "String",
            Self::DateTime(_) => "DateTime",
            Self::Money(_) => "Money",
            Self::OptionSet(_) => "OptionSetValue",
            Self::Reference(_) => "EntityReference",
            Self::Entity(_) => "Entity",
            Self::Collection(_) => "EntityCollection",
            Self::Entities(_) => "Entities",
            Self::Columns(_) => "ColumnSet",
            Self::Query(_) => "QueryExpression",
            Self::Fetch(_) => "FetchExpression",
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<DateTime<Utc>> for AttributeValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::DateTime(value)
    }
}

impl From<Money> for AttributeValue {
    fn from(value: Money) -> Self {
        Self::Money(value)
    }
}

impl From<OptionSetValue> for AttributeValue {
    fn from(value: OptionSetValue) -> Self {
        Self::OptionSet(value)
    }
}

impl From<EntityReference> for AttributeValue {
    fn from(value: EntityReference) -> Self {
        Self::Reference(value)
    }
}

impl From<Entity> for AttributeValue {
    fn from(value: Entity) -> Self {
        Self::Entity(value)
    }
}

impl From<EntityCollection> for AttributeValue {
    fn from(value: EntityCollection) -> Self {
        Self::Collection(value)
    }
}

impl From<ColumnSet> for AttributeValue {
    fn from(value: ColumnSet) -> Self {
        Self::Columns(value)
    }
}

impl From<QueryExpression> for AttributeValue {
    fn from(value: QueryExpression) -> Self {
        Self::Query(value)
    }
}

impl From<FetchExpression> for AttributeValue {
    fn from(value: FetchExpression) -> Self {
        Self::Fetch(value)
    }
}
