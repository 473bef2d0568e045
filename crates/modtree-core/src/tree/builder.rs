use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::component::descriptor::Descriptor;
use crate::component::{ClientNotifications, Component};
use crate::config::EngineConfig;
use crate::kernel::constants::MAX_TREE_DEPTH;
use crate::tree::error::TreeError;
use crate::tree::{ComponentId, ComponentTree, TreeLinks};

type Context = Box<dyn Any + Send + Sync>;

/// Everything needed to instantiate one component
pub struct ComponentSpec {
    name: String,
    descriptor: Arc<Descriptor>,
    context: Option<Context>,
    notifications: ClientNotifications,
}

impl ComponentSpec {
    pub fn new(name: impl Into<String>, descriptor: Arc<Descriptor>) -> Self {
        Self {
            name: name.into(),
            descriptor,
            context: None,
            notifications: ClientNotifications::default(),
        }
    }

    /// Attach the component's private context
    pub fn with_context<T: Any + Send + Sync>(mut self, context: T) -> Self {
        self.context = Some(Box::new(context));
        self
    }

    /// Attach client post-open / pre-close callbacks
    pub fn with_notifications(mut self, notifications: ClientNotifications) -> Self {
        self.notifications = notifications;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> &Arc<Descriptor> {
        &self.descriptor
    }

    /// Typed access to the attached context, if any
    pub fn context<T: Any>(&self) -> Option<&T> {
        self.context.as_ref().and_then(|ctx| ctx.downcast_ref::<T>())
    }
}

impl fmt::Debug for ComponentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentSpec")
            .field("name", &self.name)
            .field("descriptor", &self.descriptor.name())
            .field("has_context", &self.context.is_some())
            .finish()
    }
}

struct PendingComponent {
    spec: ComponentSpec,
    parent: Option<ComponentId>,
    depth: usize,
    children: Vec<ComponentId>,
}

/// Incremental construction of a [`ComponentTree`]
///
/// Children are appended in call order. Any children a descriptor's
/// handlers declare through `child_components` are added right after their
/// parent, before `add_child` returns. If one of them is rejected, the
/// whole subtree is left out.
pub struct TreeBuilder {
    config: EngineConfig,
    pending: Vec<PendingComponent>,
    roots: Vec<ComponentId>,
}

impl TreeBuilder {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            pending: Vec::new(),
            roots: Vec::new(),
        }
    }

    /// Append a member to the root collection
    pub fn add_root(&mut self, spec: ComponentSpec) -> Result<ComponentId, TreeError> {
        self.insert(None, spec)
    }

    /// Append a child to an already-added component
    pub fn add_child(&mut self, parent: ComponentId, spec: ComponentSpec) -> Result<ComponentId, TreeError> {
        if parent.0 >= self.pending.len() {
            return Err(TreeError::UnknownParent {
                parent,
                child: spec.name,
            });
        }
        self.insert(Some(parent), spec)
    }

    /// Number of components added so far, declared children included
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    fn insert(&mut self, parent: Option<ComponentId>, spec: ComponentSpec) -> Result<ComponentId, TreeError> {
        if spec.name.trim().is_empty() {
            return Err(TreeError::EmptyName);
        }
        let depth = parent.map_or(0, |p| self.pending[p.0].depth + 1);
        if depth >= MAX_TREE_DEPTH {
            return Err(TreeError::DepthExceeded {
                component: spec.name,
                max_depth: MAX_TREE_DEPTH,
            });
        }

        let declared = spec.descriptor.handlers().child_components(&spec);
        let id = ComponentId(self.pending.len());
        log::trace!("Adding component '{}' as {} (parent: {:?})", spec.name, id, parent);
        self.pending.push(PendingComponent {
            spec,
            parent,
            depth,
            children: Vec::new(),
        });
        match parent {
            Some(p) => self.pending[p.0].children.push(id),
            None => self.roots.push(id),
        }

        for child in declared {
            if let Err(err) = self.insert(Some(id), child) {
                self.discard(id);
                return Err(err);
            }
        }
        Ok(id)
    }

    /// Drop `id` and everything added after it, unlinking it from its parent
    fn discard(&mut self, id: ComponentId) {
        let parent = self.pending[id.0].parent;
        self.pending.truncate(id.0);
        let siblings = match parent {
            Some(p) => &mut self.pending[p.0].children,
            None => &mut self.roots,
        };
        siblings.retain(|sibling| *sibling != id);
        log::debug!("Discarded component {} after a declared child was rejected", id);
    }

    /// Freeze the tree, computing every sibling link
    pub fn build(self) -> Arc<ComponentTree> {
        let mut links: Vec<TreeLinks> = self
            .pending
            .iter()
            .map(|p| TreeLinks {
                parent: p.parent,
                first_child: p.children.first().copied(),
                last_child: p.children.last().copied(),
                ..TreeLinks::default()
            })
            .collect();

        let sibling_lists = std::iter::once(&self.roots).chain(self.pending.iter().map(|p| &p.children));
        for siblings in sibling_lists {
            for pair in siblings.windows(2) {
                links[pair[0].0].next_sibling = Some(pair[1]);
                links[pair[1].0].previous_sibling = Some(pair[0]);
            }
        }

        let wait = self.config.rundown_wait();
        let components = self
            .pending
            .into_iter()
            .zip(links)
            .enumerate()
            .map(|(index, (pending, links))| {
                let (name, descriptor, context, notifications) = pending.spec.into_parts();
                Component::new(
                    ComponentId(index),
                    name,
                    descriptor,
                    links,
                    pending.children,
                    wait,
                    context,
                    notifications,
                )
            })
            .collect::<Vec<_>>();

        log::debug!(
            "Built component tree with {} components ({} roots)",
            components.len(),
            self.roots.len()
        );

        Arc::new(ComponentTree {
            components,
            first_root: self.roots.first().copied(),
            last_root: self.roots.last().copied(),
            roots: self.roots,
            config: self.config,
        })
    }
}

impl ComponentSpec {
    fn into_parts(self) -> (String, Arc<Descriptor>, Option<Context>, ClientNotifications) {
        (self.name, self.descriptor, self.context, self.notifications)
    }
}

impl fmt::Debug for TreeBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeBuilder")
            .field("pending", &self.pending.len())
            .field("roots", &self.roots)
            .finish()
    }
}
