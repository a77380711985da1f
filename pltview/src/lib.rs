//! Locates the installed pltview viewer and replaces the current process
//! with it.
//!
//! [`resolve`](resolve::resolve) probes a fixed priority list of install
//! layouts; [`launch`](launch::launch) execs the winner with the caller's
//! arguments. The [`wrapper`] module holds the variant that falls back to a
//! secondary implementation when no graphical session is available.

pub mod config;
pub mod context;
pub mod error;
pub mod launch;
pub mod logging;
pub mod package;
pub mod report;
pub mod resolve;
pub mod wrapper;

pub use config::LauncherConfig;
pub use context::InvocationContext;
pub use error::LauncherError;
pub use resolve::{resolve, EnvironmentOverlay, Probe, Resolution, ResolvedBinary};
