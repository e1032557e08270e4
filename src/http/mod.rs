//! HTTP surface.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (request id, trace, CORS, body limit, timeout, metrics)
//!     → mount order: / redirect → docs → /health → /api/* collections
//!     → extract.rs (bearer auth, JSON or form bodies)
//!     → handler → error.rs (uniform JSON errors)
//! ```

pub mod docs;
pub mod error;
pub mod extract;
pub mod server;

pub use error::ApiError;
pub use server::{mount, AppState};
