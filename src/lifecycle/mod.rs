//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     config → connect → seed → index sync → mount → bind
//!     fatal: missing URI, connect, bind      (exit code 1)
//!     best effort: seed, index sync          (logged, degraded)
//!
//! Shutdown (shutdown.rs):
//!     SIGTERM/SIGINT or Shutdown::trigger → stop accepting → drain → exit
//! ```
//!
//! # Design Decisions
//! - Stages run strictly in order, each awaited before the next
//! - No per-stage timeout and no retry
//! - Listener binds last, so traffic arrives only when routes are mounted

pub mod shutdown;
pub mod startup;

pub use shutdown::{shutdown_signal, Shutdown};
pub use startup::{run, Collaborators, Launched, Startup, StartupError};
