//! The plugin contract and the guarded entry point the host invokes.

use plugkit_protocol::ServiceProvider;

use crate::context::Context;

/// A hosted plugin. Implementations declare what they expect to be
/// invoked for; the entry point enforces those expectations before the
/// handler runs.
pub trait Plugin {
    /// The primary record type this plugin handles, or `None` to accept
    /// any.
    fn expected_entity(&self) -> Option<&str> {
        None
    }

    /// The messages this plugin handles. An empty slice accepts any.
    fn expected_messages(&self) -> &[&str] {
        &[]
    }

    /// Run the organization service as the system user instead of the
    /// calling user.
    fn run_as_system(&self) -> bool {
        false
    }

    /// The plugin's actual behavior. Errors propagate to the host.
    fn execute(&self, context: &Context<'_>) -> anyhow::Result<()>;
}

/// Host-facing entry point: build the facade, dump the execution context,
/// enforce the plugin's declared expectations, then delegate.
///
/// A mismatch on entity or message is not an error; the reason is traced
/// and the invocation returns without side effects.
pub fn execute_plugin(plugin: &dyn Plugin, provider: &dyn ServiceProvider) -> anyhow::Result<()> {
    let context = Context::from_provider(provider, plugin.run_as_system());
    context.trace_execution_context();

    let execution_context = context.execution_context();
    if let Some(expected) = plugin.expected_entity() {
        if expected != execution_context.primary_entity_name {
            context.trace(format!(
                "Wrong entity: {}",
                execution_context.primary_entity_name
            ));
            return Ok(());
        }
    }

    let messages = plugin.expected_messages();
    if !messages.is_empty() && !messages.contains(&execution_context.message_name.as_str()) {
        context.trace(format!("Wrong message: {}", execution_context.message_name));
        return Ok(());
    }

    plugin.execute(&context)
}
