//! Shared default handlers and the open-policy checkpoints.
use crate::component::descriptor::{Checkpoint, PolicyAction};
use crate::component::lifecycle::{self, LifecycleState};
use crate::component::{ComponentView, invariant_violation};
use crate::dispatch::status::Status;

/// Resource assignment is legal before the first open, after a close and
/// while an open is in progress.
pub fn validate_resources_assign(component: &ComponentView<'_>) -> Status {
    match component.state() {
        LifecycleState::Created | LifecycleState::Opening | LifecycleState::Closed => Ok(()),
        state => invariant_violation(
            component,
            &format!("resources assigned while component is {}", state),
        ),
    }
}

/// Body of handlers a component type has to provide: open and close for
/// anything that gets opened, notification register/unregister for
/// notify policies.
pub fn must_override(component: &ComponentView<'_>, handler: &str) -> ! {
    invariant_violation(
        component,
        &format!(
            "descriptor '{}' ({:?}) does not override {}",
            component.descriptor().name(),
            component.descriptor().open_policy(),
            handler
        ),
    )
}

/// Entry side of a checkpoint; runs after the node's own handler succeeded.
pub(crate) fn enter_checkpoint(component: &ComponentView<'_>, checkpoint: Checkpoint) -> Status {
    let policy = component.descriptor().open_policy();
    if policy.checkpoint() != Some(checkpoint) {
        return Ok(());
    }
    match policy.action() {
        Some(PolicyAction::Open) => lifecycle::open(component)?,
        Some(PolicyAction::NotifyRegister) => component.handlers().notification_register(component)?,
        None => return Ok(()),
    }
    log::debug!(
        "Component '{}' acted on {:?} at {:?} checkpoint",
        component.name(),
        policy,
        checkpoint
    );
    component.component().record_checkpoint(checkpoint);
    Ok(())
}

/// Exit side of a checkpoint; reverses whatever the entry side did.
///
/// Runs before the node's own handler. Unregister failures are logged and
/// dropped since there is no one left to report them to.
pub(crate) fn leave_checkpoint(component: &ComponentView<'_>, checkpoint: Checkpoint) {
    if !component.component().take_checkpoint(checkpoint) {
        return;
    }
    match component.descriptor().open_policy().action() {
        Some(PolicyAction::Open) => lifecycle::close(component),
        Some(PolicyAction::NotifyRegister) => {
            if let Err(status) = component.handlers().notification_unregister(component) {
                log::warn!(
                    "Notification unregister of '{}' failed with {}; ignoring",
                    component.name(),
                    status
                );
            }
        }
        None => {}
    }
}
