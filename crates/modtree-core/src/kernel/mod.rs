//! # Modtree Kernel
//!
//! The `kernel` module ties the engine together for a host runtime.
//!
//! ## Key Responsibilities & Components:
//!
//! - **Device Host**: [`DeviceHost`](host::DeviceHost) owns a built component
//!   tree and exposes the create / deliver / destroy entry points a host runtime
//!   calls, in the `host` submodule.
//! - **Core Constants**: engine-wide limits and defaults in `constants`.
//! - **Error Handling**: the aggregated [`Error`](error::Error) type and the
//!   `Result` alias in `error`.
pub mod constants;
pub mod error;
pub mod host;

pub use error::{Error, HostPhase, Result};
pub use host::{DeviceHost, HostState};
