//! # Modtree Component Tree
//!
//! The tree is an arena of [`Component`]s addressed by [`ComponentId`].
//! Parents are referenced by index, never owned by their children, and
//! the sibling links used by forward and backward iteration are computed
//! once by the [`TreeBuilder`]. A built tree is immutable in shape; only
//! each component's lifecycle and rundown state changes afterwards.
//!
//! ## Key Components
//!
//! - **`ComponentTree`**: The arena plus the ordered root collection.
//! - **`TreeBuilder`** / **`ComponentSpec`**: Construction of a tree,
//!   including children declared by a descriptor's handlers.
//! - **`navigation`**: `ForwardIteration` / `BackwardIteration` strategies
//!   over one parent's children (or over the root collection).
pub mod builder;
pub mod error;
pub mod navigation;

use std::fmt;
use std::fmt::Write as _;

use crate::component::{Component, ComponentView};
use crate::config::EngineConfig;
use crate::tree::error::TreeError;

pub use builder::{ComponentSpec, TreeBuilder};
pub use navigation::{
    BACKWARD, BackwardIteration, ChildIterationContext, ChildWalk, Direction, FORWARD,
    ForwardIteration, IterationStrategy, children,
};

/// Index of a component inside its [`ComponentTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub(crate) usize);

impl ComponentId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Navigation links fixed at construction time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeLinks {
    pub parent: Option<ComponentId>,
    pub first_child: Option<ComponentId>,
    pub last_child: Option<ComponentId>,
    pub next_sibling: Option<ComponentId>,
    pub previous_sibling: Option<ComponentId>,
}

/// An immutable tree of components and its shared engine configuration
pub struct ComponentTree {
    pub(crate) components: Vec<Component>,
    pub(crate) roots: Vec<ComponentId>,
    pub(crate) first_root: Option<ComponentId>,
    pub(crate) last_root: Option<ComponentId>,
    pub(crate) config: EngineConfig,
}

impl ComponentTree {
    /// Start building a tree with the given engine configuration
    pub fn builder(config: EngineConfig) -> TreeBuilder {
        TreeBuilder::new(config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Members of the root collection, in declaration order
    pub fn roots(&self) -> &[ComponentId] {
        &self.roots
    }

    /// Every component id, in construction (pre-order) order
    pub fn ids(&self) -> impl Iterator<Item = ComponentId> + use<> {
        (0..self.components.len()).map(ComponentId)
    }

    pub fn get(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(id.0)
    }

    /// View a component of this tree.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this tree.
    pub fn view(&self, id: ComponentId) -> ComponentView<'_> {
        match self.try_view(id) {
            Ok(view) => view,
            Err(err) => panic!("{}", err),
        }
    }

    pub fn try_view(&self, id: ComponentId) -> Result<ComponentView<'_>, TreeError> {
        self.components
            .get(id.0)
            .map(|component| ComponentView::new(self, component))
            .ok_or(TreeError::UnknownComponent(id))
    }

    /// First component with the given name, in pre-order
    pub fn find(&self, name: &str) -> Option<ComponentId> {
        self.components
            .iter()
            .find(|component| component.name() == name)
            .map(Component::id)
    }

    pub fn links(&self, id: ComponentId) -> Option<TreeLinks> {
        self.components.get(id.0).map(|component| component.links)
    }

    /// First child of `parent`, or first root when `parent` is `None`
    pub(crate) fn first_child(&self, parent: Option<ComponentId>) -> Option<ComponentId> {
        match parent {
            Some(id) => self.components.get(id.0).and_then(|c| c.links.first_child),
            None => self.first_root,
        }
    }

    /// Last child of `parent`, or last root when `parent` is `None`
    pub(crate) fn last_child(&self, parent: Option<ComponentId>) -> Option<ComponentId> {
        match parent {
            Some(id) => self.components.get(id.0).and_then(|c| c.links.last_child),
            None => self.last_root,
        }
    }

    /// Render the tree as indented lines of `name #id [state]`
    pub fn describe(&self) -> String {
        let mut out = String::new();
        for root in &self.roots {
            self.describe_into(&mut out, *root, 0);
        }
        out
    }

    fn describe_into(&self, out: &mut String, id: ComponentId, depth: usize) {
        let component = &self.components[id.0];
        let _ = writeln!(
            out,
            "{:indent$}{} {} [{}] ({})",
            "",
            component.name(),
            id,
            component.state(),
            component.descriptor().name(),
            indent = depth * 2
        );
        for child in component.children() {
            self.describe_into(out, *child, depth + 1);
        }
    }
}

impl fmt::Debug for ComponentTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentTree")
            .field("components", &self.components.len())
            .field("roots", &self.roots)
            .field("config", &self.config)
            .finish()
    }
}
