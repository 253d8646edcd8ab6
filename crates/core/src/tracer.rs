//! Diagnostic dumping of execution contexts.
//!
//! The tracer walks an [`ExecutionContext`] and writes an indented,
//! human-readable rendering of everything in it (parameters, shared
//! variables, entity images, and optionally the parent chain) to the
//! host's trace sink. Tracing is best-effort: any fault is reduced to a
//! two-line notice on the sink and never reaches the caller.

use anyhow::Result;
use plugkit_protocol::{
    AttributeValue, Entity, ExecutionContext, OrganizationRequest, OrganizationResponse,
    OrganizationService, ParameterCollection, ServiceError, TracingService,
    STAGE_INTERNAL_MAIN_OPERATION,
};

/// Padding width used for a record with no attributes, where there is no
/// longest attribute name to align to.
const EMPTY_ENTITY_PAD: usize = 50;

/// What the tracer includes in a context dump.
#[derive(Debug, Clone)]
pub struct TraceSettings {
    /// Also trace ancestor contexts, one numbered block per context.
    pub parent_contexts: bool,
    /// Append a `(kind)` annotation to scalar values.
    pub attribute_types: bool,
    /// Translate structured queries to FetchXML through the service.
    /// Requires a service to be passed to [`trace_context`].
    pub convert_queries: bool,
    /// List the records inside entity collections.
    pub expand_collections: bool,
    /// Also trace contexts running in the internal pipeline stage.
    pub include_internal_stage: bool,
}

impl Default for TraceSettings {
    fn default() -> Self {
        Self {
            parent_contexts: false,
            attribute_types: true,
            convert_queries: false,
            expand_collections: false,
            include_internal_stage: false,
        }
    }
}

/// Dump `context` to `sink` with default settings: no parent chain, type
/// annotations on, no query conversion, collections unexpanded, internal
/// stage excluded.
pub fn trace_context_default(sink: &dyn TracingService, context: &ExecutionContext) {
    trace_context(sink, context, &TraceSettings::default(), None);
}

/// Dump everything interesting from `context` to `sink`.
///
/// `service` is only used when [`TraceSettings::convert_queries`] is set
/// and may be `None` otherwise. Faults anywhere in the dump are caught
/// here and reduced to a two-line notice; this function never fails the
/// caller's operation.
pub fn trace_context(
    sink: &dyn TracingService,
    context: &ExecutionContext,
    settings: &TraceSettings,
    service: Option<&dyn OrganizationService>,
) {
    if let Err(error) = trace_context_at(sink, context, settings, service, 1) {
        sink.trace("--- Exception while trying to trace context ---");
        sink.trace(&format!("Message : {error}"));
    }
}

fn trace_context_at(
    sink: &dyn TracingService,
    context: &ExecutionContext,
    settings: &TraceSettings,
    service: Option<&dyn OrganizationService>,
    block: i32,
) -> Result<()> {
    let internal = context.stage == Some(STAGE_INTERNAL_MAIN_OPERATION);
    if settings.include_internal_stage || !internal {
        sink.trace(&format!("--- Context {block} Trace Start ---"));
        sink.trace(&format!("Message : {}", context.message_name));
        if let Some(stage) = context.stage {
            sink.trace(&format!("Stage   : {stage}"));
        }
        sink.trace(&format!("Mode    : {}", context.mode));
        sink.trace(&format!("Depth   : {}", context.depth));
        sink.trace(&format!("Entity  : {}", context.primary_entity_name));
        if !context.primary_entity_id.is_nil() {
            sink.trace(&format!("Id      : {}", context.primary_entity_id));
        }
        sink.trace("");

        trace_aligned(sink, "InputParameters", &context.input_parameters, settings, service)?;
        trace_aligned(sink, "OutputParameters", &context.output_parameters, settings, service)?;
        trace_aligned(sink, "SharedVariables", &context.shared_variables, settings, service)?;
        trace_aligned(sink, "PreEntityImages", &context.pre_entity_images, settings, service)?;
        trace_aligned(sink, "PostEntityImages", &context.post_entity_images, settings, service)?;
        sink.trace(&format!("--- Context {block} Trace End ---"));
    }

    if settings.parent_contexts {
        if let Some(parent) = context.parent.as_deref() {
            trace_context_at(sink, parent, settings, service, block + 1)?;
        }
    }

    sink.trace("");
    Ok(())
}

/// Emit a labeled section with the `=` separators aligned to the longest
/// key of this collection. An empty collection emits nothing.
fn trace_aligned(
    sink: &dyn TracingService,
    topic: &str,
    parameters: &ParameterCollection,
    settings: &TraceSettings,
    service: Option<&dyn OrganizationService>,
) -> Result<()> {
    if parameters.is_empty() {
        return Ok(());
    }

    sink.trace(topic);
    let key_len = parameters.keys().map(String::len).max().unwrap_or(0);
    for (key, value) in parameters {
        let pad = " ".repeat(key_len - key.len());
        let rendered = value_to_string(value, settings, service, 2)?;
        sink.trace(&format!("  {key}{pad} = {rendered}"));
    }
    Ok(())
}

/// Render one value as indented text, recursing into records and
/// collections. `indent` is the nesting level; each level is two spaces.
pub fn value_to_string(
    value: &AttributeValue,
    settings: &TraceSettings,
    service: Option<&dyn OrganizationService>,
    indent: usize,
) -> Result<String> {
    let indent_string = "  ".repeat(indent);
    let annotate = |text: String| {
        if settings.attribute_types {
            format!("{text} \t({})", value.kind_name())
        } else {
            text
        }
    };

    match value {
        AttributeValue::Null => Ok(format!("{indent_string}<null>")),
        AttributeValue::Collection(collection) => {
            let mut result = format!(
                "{} collection\n  Records: {}\n  TotalRecordCount: {}\n  MoreRecords: {}\n  PagingCookie: {}",
                collection.entity_name,
                collection.entities.len(),
                collection.total_record_count,
                collection.more_records,
                collection.paging_cookie.as_deref().unwrap_or_default(),
            );
            if settings.expand_collections && !collection.entities.is_empty() {
                result.push('\n');
                result.push_str(&entities_to_string(
                    &collection.entities,
                    settings,
                    service,
                    indent + 1,
                )?);
            }
            Ok(result)
        }
        AttributeValue::Entities(entities) => {
            if settings.expand_collections {
                entities_to_string(entities, settings, service, indent)
            } else {
                Ok(String::new())
            }
        }
        AttributeValue::Entity(entity) => entity_to_string(entity, settings, service, indent),
        AttributeValue::Columns(column_set) => {
            let mut columns = column_set.columns.clone();
            columns.sort();
            Ok(format!(
                "\n{indent_string}{}",
                columns.join(&format!("\n{indent_string}"))
            ))
        }
        AttributeValue::Fetch(fetch) => Ok(format!("{fetch}\n{indent_string}{}", fetch.query)),
        AttributeValue::Query(query) => match service {
            Some(service) if settings.convert_queries => {
                let request = OrganizationRequest::ConvertQueryToFetchXml {
                    query: query.clone(),
                };
                let OrganizationResponse::FetchXml(fetch_xml) = service.execute(request)? else {
                    return Err(ServiceError::UnexpectedResponse(
                        "ConvertQueryToFetchXml".to_string(),
                    )
                    .into());
                };
                Ok(format!("{query}\n{indent_string}{fetch_xml}"))
            }
            _ => Ok(annotate(query.to_string())),
        },
        AttributeValue::Reference(reference) => Ok(annotate(reference.to_string())),
        AttributeValue::OptionSet(option) => Ok(annotate(option.to_string())),
        AttributeValue::Money(money) => Ok(annotate(money.to_string())),
        AttributeValue::Boolean(boolean) => Ok(annotate(boolean.to_string())),
        AttributeValue::Integer(integer) => Ok(annotate(integer.to_string())),
        AttributeValue::Double(double) => Ok(annotate(double.to_string())),
        AttributeValue::DateTime(timestamp) => Ok(annotate(timestamp.to_string())),
        AttributeValue::String(text) => {
            Ok(annotate(text.replace('\n', &format!("\n  {indent_string}"))))
        }
    }
}

/// Render a bare record sequence, one record per line at the given level.
fn entities_to_string(
    entities: &[Entity],
    settings: &TraceSettings,
    service: Option<&dyn OrganizationService>,
    indent: usize,
) -> Result<String> {
    let indent_string = "  ".repeat(indent);
    let rendered = entities
        .iter()
        .map(|entity| entity_to_string(entity, settings, service, indent + 1))
        .collect::<Result<Vec<_>>>()?;
    Ok(format!(
        "{indent_string}{}",
        rendered.join(&format!("\n{indent_string}"))
    ))
}

fn entity_to_string(
    entity: &Entity,
    settings: &TraceSettings,
    service: Option<&dyn OrganizationService>,
    indent: usize,
) -> Result<String> {
    let indent_string = "  ".repeat(indent);
    let key_len = entity
        .attributes
        .keys()
        .map(String::len)
        .max()
        .unwrap_or(EMPTY_ENTITY_PAD);

    // BTreeMap iteration is already lexicographic by attribute name.
    let mut lines = Vec::with_capacity(entity.attributes.len());
    for (name, value) in &entity.attributes {
        let pad = " ".repeat(key_len - name.len());
        let rendered = value_to_string(value, settings, service, indent + 1)?;
        lines.push(format!("{name}{pad} = {rendered}"));
    }

    Ok(format!(
        "{} {}\n{indent_string}{}",
        entity.logical_name,
        entity.id,
        lines.join(&format!("\n{indent_string}"))
    ))
}
