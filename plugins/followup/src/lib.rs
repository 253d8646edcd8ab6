//! Demonstration plugin: schedule a follow-up task whenever a contact is
//! created.
//!
//! Shows the usual shape of a Plugkit plugin: declare the expected entity
//! and messages, let the entry guard filter everything else out, and work
//! through the [`Context`] facade inside the handler.

use plugkit_core::{Context, Plugin};
use plugkit_protocol::Entity;

pub struct FollowupPlugin;

impl Plugin for FollowupPlugin {
    fn expected_entity(&self) -> Option<&str> {
        Some("contact")
    }

    fn expected_messages(&self) -> &[&str] {
        &["Create"]
    }

    fn execute(&self, context: &Context<'_>) -> anyhow::Result<()> {
        let Some(target) = context.target() else {
            context.trace("No target record, nothing to follow up on");
            return Ok(());
        };

        let mut task = Entity::new("task");
        task.set("subject", "Send welcome letter");
        task.set("regardingobjectid", target.to_reference());
        let id = context.save(&task)?;
        context.trace(format!("Created follow-up task {id}"));
        Ok(())
    }
}
