//! Plugkit Core Library
//!
//! Everything a hosted plugin needs beyond the raw protocol types:
//!
//! - [`context`] - The [`Context`] facade wrapping the host's record
//!   service and trace sink behind one object
//! - [`tracer`] - Diagnostic dumping of execution contexts as indented,
//!   human-readable trace text
//! - [`plugin`] - The [`Plugin`] trait and the guarded entry point the
//!   host invokes
//! - [`relationships`] - Lookup helpers for walking parent and child
//!   records
//!
//! The usual shape of a plugin:
//!
//! ```rust,no_run
//! use plugkit_core::{execute_plugin, Context, Plugin};
//!
//! struct MyPlugin;
//!
//! impl Plugin for MyPlugin {
//!     fn expected_entity(&self) -> Option<&str> {
//!         Some("contact")
//!     }
//!
//!     fn execute(&self, context: &Context<'_>) -> anyhow::Result<()> {
//!         context.trace("hello from the sandbox");
//!         Ok(())
//!     }
//! }
//! ```

pub mod context;
pub mod plugin;
pub mod relationships;
pub mod tracer;

#[cfg(test)]
pub(crate) mod testing;

pub use context::Context;
pub use plugin::{execute_plugin, Plugin};
pub use relationships::RelationshipExt;
pub use tracer::{trace_context, trace_context_default, value_to_string, TraceSettings};
