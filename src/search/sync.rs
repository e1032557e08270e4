//! Catalog → vector index sync (startup stage 4).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use super::pinecone::{IndexRecord, PineconeClient, PineconeError, MAX_UPSERT_BATCH};
use super::VectorIndex;
use crate::config::SearchConfig;
use crate::db::{DbError, ProductQuery, Store};

const PAGE_SIZE: usize = 500;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("vector index is misconfigured: {0}")]
    Misconfigured(&'static str),

    #[error("vector index sync is disabled")]
    Disabled,

    #[error(transparent)]
    Pinecone(#[from] PineconeError),

    #[error(transparent)]
    Db(#[from] DbError),
}

/// Pushes the catalog to an external index.
#[async_trait]
pub trait IndexSync: Send + Sync {
    /// On success, returns the handle request handlers query for vector search.
    async fn sync(&self, store: &dyn Store) -> Result<Arc<dyn VectorIndex>, SyncError>;
}

/// Syncs products into a Pinecone integrated-embedding index.
#[derive(Debug, Clone)]
pub struct PineconeSync {
    config: SearchConfig,
}

impl PineconeSync {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    fn client(&self) -> Result<PineconeClient, SyncError> {
        let api_key = non_empty(self.config.api_key.as_deref())
            .ok_or(SyncError::Misconfigured("PINECONE_API_KEY is not set"))?;
        let host = non_empty(self.config.index_host.as_deref())
            .ok_or(SyncError::Misconfigured("PINECONE_INDEX_HOST is not set"))?;

        Ok(PineconeClient::new(
            host,
            api_key,
            &self.config.namespace,
            Duration::from_secs(self.config.timeout_secs),
        )?)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[async_trait]
impl IndexSync for PineconeSync {
    async fn sync(&self, store: &dyn Store) -> Result<Arc<dyn VectorIndex>, SyncError> {
        let client = self.client()?;

        let mut skip = 0;
        let mut upserted = 0;
        loop {
            let page = store
                .list_products(&ProductQuery {
                    category: None,
                    limit: PAGE_SIZE,
                    skip,
                })
                .await?;
            if page.is_empty() {
                break;
            }

            let records: Vec<IndexRecord> = page.iter().map(IndexRecord::from).collect();
            for batch in records.chunks(MAX_UPSERT_BATCH) {
                client.upsert_records(batch).await?;
                upserted += batch.len();
            }

            if page.len() < PAGE_SIZE {
                break;
            }
            skip += page.len();
        }

        tracing::info!(
            upserted,
            namespace = %self.config.namespace,
            "Pinecone records upserted"
        );
        Ok(Arc::new(client))
    }
}

/// Stand-in used when vector search is turned off.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSync;

#[async_trait]
impl IndexSync for NoopSync {
    async fn sync(&self, _store: &dyn Store) -> Result<Arc<dyn VectorIndex>, SyncError> {
        Err(SyncError::Disabled)
    }
}
