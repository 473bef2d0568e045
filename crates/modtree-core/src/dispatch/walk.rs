//! Depth-first tree walks, one per aggregation policy.
//!
//! Walks are synchronous and never suspend. The root collection is walked
//! in the event's direction and each member recursively with the event's
//! order and direction.
use crate::component::ComponentView;
use crate::dispatch::error::DispatchError;
use crate::dispatch::event::{Aggregation, EventKind, Order, Traversal};
use crate::dispatch::status::Status;
use crate::tree::{ComponentId, ComponentTree, children};

fn log_visit(tree: &ComponentTree, label: &str, component: &ComponentView<'_>) {
    if tree.config().trace_visits {
        log::debug!("{}: visiting '{}' ({})", label, component.name(), component.id());
    } else {
        log::trace!("{}: visiting '{}' ({})", label, component.name(), component.id());
    }
}

/// Stop at the first failing node and report it
pub(crate) fn fail_fast<F>(tree: &ComponentTree, event: EventKind, mut visit: F) -> Result<(), DispatchError>
where
    F: FnMut(&ComponentView<'_>) -> Status,
{
    let traversal = event.traversal();
    debug_assert_eq!(traversal.aggregation, Aggregation::FailFast);

    let result = children(tree, None, traversal.direction)
        .try_for_each(|root| fail_fast_node(tree, root, event, traversal, &mut visit));
    if let Err(err) = &result {
        log::error!("Dispatch of {} aborted: {}", event, err);
    }
    result
}

fn fail_fast_node<F>(
    tree: &ComponentTree,
    id: ComponentId,
    event: EventKind,
    traversal: Traversal,
    visit: &mut F,
) -> Result<(), DispatchError>
where
    F: FnMut(&ComponentView<'_>) -> Status,
{
    let component = tree.view(id);
    let visit_self = |visit: &mut F| {
        log_visit(tree, event.name(), &component);
        visit(&component).map_err(|status| DispatchError::HandlerFailed {
            event,
            component: component.name().to_string(),
            component_id: id,
            status,
        })
    };

    if traversal.order == Order::ParentFirst {
        visit_self(visit)?;
    }
    for child in children(tree, Some(id), traversal.direction) {
        fail_fast_node(tree, child, event, traversal, visit)?;
    }
    if traversal.order == Order::ChildrenFirst {
        visit_self(visit)?;
    }
    Ok(())
}

/// Stop at the first node that handles the event.
///
/// A parent is offered the event before its children; when it handles
/// it, the children are never visited.
pub(crate) fn until_handled<F>(tree: &ComponentTree, event: EventKind, mut visit: F) -> bool
where
    F: FnMut(&ComponentView<'_>) -> bool,
{
    let traversal = event.traversal();
    debug_assert_eq!(traversal.aggregation, Aggregation::OrUntilHandled);
    debug_assert_eq!(traversal.order, Order::ParentFirst);

    let handled = children(tree, None, traversal.direction)
        .any(|root| until_handled_node(tree, root, event, traversal, &mut visit));
    log::debug!("Dispatch of {}: {}", event, if handled { "handled" } else { "unhandled" });
    handled
}

fn until_handled_node<F>(
    tree: &ComponentTree,
    id: ComponentId,
    event: EventKind,
    traversal: Traversal,
    visit: &mut F,
) -> bool
where
    F: FnMut(&ComponentView<'_>) -> bool,
{
    let component = tree.view(id);
    log_visit(tree, event.name(), &component);
    if visit(&component) {
        log::trace!("{} handled by '{}'", event, component.name());
        return true;
    }
    children(tree, Some(id), traversal.direction)
        .any(|child| until_handled_node(tree, child, event, traversal, visit))
}

/// Visit every node; failures are logged and dropped.
///
/// Returns how many nodes failed.
pub(crate) fn fan_out<F>(tree: &ComponentTree, traversal: Traversal, label: &str, mut visit: F) -> usize
where
    F: FnMut(&ComponentView<'_>) -> Status,
{
    let mut failures = 0;
    for root in children(tree, None, traversal.direction) {
        fan_out_node(tree, root, traversal, label, &mut visit, &mut failures);
    }
    if failures > 0 {
        log::debug!("{}: {} node failures discarded", label, failures);
    }
    failures
}

fn fan_out_node<F>(
    tree: &ComponentTree,
    id: ComponentId,
    traversal: Traversal,
    label: &str,
    visit: &mut F,
    failures: &mut usize,
) where
    F: FnMut(&ComponentView<'_>) -> Status,
{
    let component = tree.view(id);
    let visit_self = |visit: &mut F, failures: &mut usize| {
        log_visit(tree, label, &component);
        if let Err(status) = visit(&component) {
            log::warn!(
                "{}: component '{}' ({}) failed with {}; continuing",
                label,
                component.name(),
                id,
                status
            );
            *failures += 1;
        }
    };

    if traversal.order == Order::ParentFirst {
        visit_self(visit, failures);
    }
    for child in children(tree, Some(id), traversal.direction) {
        fan_out_node(tree, child, traversal, label, visit, failures);
    }
    if traversal.order == Order::ChildrenFirst {
        visit_self(visit, failures);
    }
}
