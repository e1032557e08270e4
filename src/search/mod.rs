//! Product search subsystem.
//!
//! # Data Flow
//! ```text
//! Startup stage 4 (ENABLE_PINECONE=true):
//!     sync.rs → read catalog from Store → pinecone.rs upsert
//!     → success: SearchBackend::Vector(index)
//!     → failure: warn, SearchBackend::Text (fallback)
//!
//! GET /api/search:
//!     Vector → index query → ids → Store lookup (index order kept)
//!            → on query error, fall through to Text
//!     Text   → Store::search_products (substring match)
//! ```

pub mod pinecone;
pub mod sync;

use std::sync::Arc;

use async_trait::async_trait;

pub use pinecone::{PineconeClient, PineconeError};
pub use sync::{IndexSync, NoopSync, PineconeSync, SyncError};

/// Query side of an external vector index.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Product ids most similar to `text`, best first.
    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<String>, PineconeError>;
}

/// How `/api/search` answers queries for the life of the process.
#[derive(Clone, Default)]
pub enum SearchBackend {
    #[default]
    Text,
    Vector(Arc<dyn VectorIndex>),
}

impl SearchBackend {
    pub fn is_vector(&self) -> bool {
        matches!(self, SearchBackend::Vector(_))
    }
}

impl std::fmt::Debug for SearchBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchBackend::Text => f.write_str("Text"),
            SearchBackend::Vector(_) => f.write_str("Vector"),
        }
    }
}
