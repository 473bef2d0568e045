//! Bidirectional iteration over one parent's ordered children.
//!
//! A parent of `None` denotes the root collection, which is walked exactly
//! like any other child list. Strategies are plain values so a dispatch
//! routine picks a direction without duplicating its loop.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tree::{ComponentId, ComponentTree};

/// Direction of a child walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    /// The iteration strategy implementing this direction
    pub fn strategy(self) -> &'static dyn IterationStrategy {
        match self {
            Direction::Forward => &FORWARD,
            Direction::Backward => &BACKWARD,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => write!(f, "forward"),
            Direction::Backward => write!(f, "backward"),
        }
    }
}

/// Cursor over one parent's children, valid for a single walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildIterationContext {
    pub parent: Option<ComponentId>,
    pub current: ComponentId,
}

/// A fixed way of stepping through a child list
pub trait IterationStrategy: Send + Sync {
    /// First child in this direction, with a cursor positioned on it
    fn first(
        &self,
        tree: &ComponentTree,
        parent: Option<ComponentId>,
    ) -> Option<(ComponentId, ChildIterationContext)>;

    /// Advance the cursor; `None` once the list is exhausted
    fn next(&self, tree: &ComponentTree, context: &mut ChildIterationContext) -> Option<ComponentId>;
}

/// First child to last child, following `next_sibling`
#[derive(Debug, Clone, Copy, Default)]
pub struct ForwardIteration;

/// Last child to first child, following `previous_sibling`
#[derive(Debug, Clone, Copy, Default)]
pub struct BackwardIteration;

pub static FORWARD: ForwardIteration = ForwardIteration;
pub static BACKWARD: BackwardIteration = BackwardIteration;

impl IterationStrategy for ForwardIteration {
    fn first(
        &self,
        tree: &ComponentTree,
        parent: Option<ComponentId>,
    ) -> Option<(ComponentId, ChildIterationContext)> {
        tree.first_child(parent)
            .map(|current| (current, ChildIterationContext { parent, current }))
    }

    fn next(&self, tree: &ComponentTree, context: &mut ChildIterationContext) -> Option<ComponentId> {
        let next = tree.links(context.current)?.next_sibling?;
        context.current = next;
        Some(next)
    }
}

impl IterationStrategy for BackwardIteration {
    fn first(
        &self,
        tree: &ComponentTree,
        parent: Option<ComponentId>,
    ) -> Option<(ComponentId, ChildIterationContext)> {
        tree.last_child(parent)
            .map(|current| (current, ChildIterationContext { parent, current }))
    }

    fn next(&self, tree: &ComponentTree, context: &mut ChildIterationContext) -> Option<ComponentId> {
        let previous = tree.links(context.current)?.previous_sibling?;
        context.current = previous;
        Some(previous)
    }
}

enum WalkState {
    Start,
    Running(ChildIterationContext),
    Done,
}

/// Iterator adapter over an [`IterationStrategy`]
pub struct ChildWalk<'a> {
    tree: &'a ComponentTree,
    parent: Option<ComponentId>,
    strategy: &'static dyn IterationStrategy,
    state: WalkState,
}

impl Iterator for ChildWalk<'_> {
    type Item = ComponentId;

    fn next(&mut self) -> Option<ComponentId> {
        let step = match &mut self.state {
            WalkState::Start => self
                .strategy
                .first(self.tree, self.parent)
                .map(|(id, context)| (id, Some(context))),
            WalkState::Running(context) => {
                self.strategy.next(self.tree, context).map(|id| (id, None))
            }
            WalkState::Done => return None,
        };
        match step {
            Some((id, Some(context))) => {
                self.state = WalkState::Running(context);
                Some(id)
            }
            Some((id, None)) => Some(id),
            None => {
                self.state = WalkState::Done;
                None
            }
        }
    }
}

/// Walk the children of `parent` (or the root collection) in `direction`
pub fn children(tree: &ComponentTree, parent: Option<ComponentId>, direction: Direction) -> ChildWalk<'_> {
    ChildWalk {
        tree,
        parent,
        strategy: direction.strategy(),
        state: WalkState::Start,
    }
}
