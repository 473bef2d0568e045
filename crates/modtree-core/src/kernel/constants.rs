/// Engine name
pub const ENGINE_NAME: &str = "modtree";

/// Engine version
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Reference held by every open component for as long as it stays open.
/// Rundown completes once the count falls back to this value.
pub const OPEN_REFERENCE_BASELINE: u32 = 1;

/// Default interval between reference-count checks when rundown polls
pub const DEFAULT_RUNDOWN_POLL_INTERVAL_MS: u64 = 50;

/// Maximum number of auxiliary locks a component type may request
pub const MAX_AUXILIARY_LOCKS: usize = 8;

/// Maximum nesting depth accepted while expanding declared child components
pub const MAX_TREE_DEPTH: usize = 64;

/// Environment variable naming an engine configuration file
pub const CONFIG_ENV_VAR: &str = "MODTREE_CONFIG";
