//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → Prometheus scrape endpoint (when METRICS_ADDR is set)
//! ```
//!
//! # Design Decisions
//! - Stage outcomes are logged and counted, so degraded starts are visible
//! - Request ID (`x-request-id`) is attached to every HTTP span

pub mod logging;
pub mod metrics;
