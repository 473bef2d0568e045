//! Host scripts: a component tree plus the steps a simulated host runs
//! against it. Scripts are JSON, TOML or YAML, picked by file extension.
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use modtree_core::config::error::ConfigError;
use modtree_core::kernel::Result;
use modtree_core::{
    ComponentId, ComponentSpec, ComponentTree, ConfigFormat, Descriptor, EngineConfig, EventKind,
    ExecutionCeiling, HostEvent, OpenPolicy, StatusCode, TreeBuilder,
};

use crate::probe::{ProbeHandlers, ProbeRules, Trace};

#[derive(Debug, Clone, Deserialize)]
pub struct HostScript {
    #[serde(default)]
    pub tree: Vec<NodeSpec>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// One probe component and its children
#[derive(Debug, Clone, Deserialize)]
pub struct NodeSpec {
    pub name: String,
    #[serde(default)]
    pub policy: OpenPolicy,
    #[serde(default)]
    pub ceiling: ExecutionCeiling,
    #[serde(default)]
    pub auxiliary_locks: usize,
    /// Status-returning events this probe fails
    #[serde(default)]
    pub fail_on: Vec<EventKind>,
    #[serde(default)]
    pub fail_with: StatusCode,
    /// Boolean events this probe claims
    #[serde(default)]
    pub handles: Vec<EventKind>,
    #[serde(default)]
    pub fail_open: bool,
    #[serde(default)]
    pub children: Vec<NodeSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Step {
    Lifecycle(LifecycleStep),
    Event(HostEvent),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum LifecycleStep {
    Create,
    Destroy,
    Open { component: String },
    Close { component: String },
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Lifecycle(LifecycleStep::Create) => write!(f, "create"),
            Step::Lifecycle(LifecycleStep::Destroy) => write!(f, "destroy"),
            Step::Lifecycle(LifecycleStep::Open { component }) => write!(f, "open {}", component),
            Step::Lifecycle(LifecycleStep::Close { component }) => write!(f, "close {}", component),
            Step::Event(event) => write!(f, "{}", event.kind()),
        }
    }
}

impl HostScript {
    pub fn load(path: &Path) -> std::result::Result<Self, ConfigError> {
        let format = ConfigFormat::from_path(path).ok_or_else(|| ConfigError::UnsupportedFormat {
            path: path.to_path_buf(),
        })?;
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        format.parse(&data)
    }

    /// Build a tree of probe components recording into `trace`
    pub fn build_tree(&self, config: EngineConfig, trace: &Trace) -> Result<Arc<ComponentTree>> {
        let mut builder = ComponentTree::builder(config);
        for node in &self.tree {
            add_node(&mut builder, None, node, trace)?;
        }
        Ok(builder.build())
    }
}

fn add_node(builder: &mut TreeBuilder, parent: Option<ComponentId>, node: &NodeSpec, trace: &Trace) -> Result<()> {
    let rules = ProbeRules {
        fail_on: node.fail_on.iter().copied().collect(),
        fail_with: node.fail_with,
        handles: node.handles.iter().copied().collect(),
        fail_open: node.fail_open,
    };
    let descriptor = Descriptor::builder(format!("probe:{}", node.name), ProbeHandlers::new(trace.clone(), rules))
        .open_policy(node.policy)
        .ceiling(node.ceiling)
        .auxiliary_locks(node.auxiliary_locks)
        .build()?;
    let spec = ComponentSpec::new(node.name.clone(), descriptor);
    let id = match parent {
        Some(parent) => builder.add_child(parent, spec)?,
        None => builder.add_root(spec)?,
    };
    for child in &node.children {
        add_node(builder, Some(id), child, trace)?;
    }
    Ok(())
}
