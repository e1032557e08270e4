//! Catalog seeding.
//!
//! # Responsibilities
//! - Load the bundled product catalog (`data/products.json`)
//! - Leave a populated store alone unless asked to force
//! - Replace the catalog wholesale on a forced run
//!
//! # Design Decisions
//! - Runs once at startup (stage 3) or from `storefront-admin seed`
//! - The orchestrator treats every error here as recoverable
//! - Product ids are stable slugs, so reseeding never orphans order lines

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::db::{DbError, Product, Store};

const BUNDLED_CATALOG: &str = include_str!("../../data/products.json");

/// Seeder inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedOptions {
    /// Write the catalog even if products already exist.
    pub force: bool,
    /// Report `skipped` instead of writing when products exist.
    pub skip_if_exists: bool,
}

impl SeedOptions {
    /// The options startup derives from `FORCE_SEED_ON_START`.
    pub fn for_startup(force: bool) -> Self {
        Self {
            force,
            skip_if_exists: !force,
        }
    }
}

/// What a seeding run did. Both flags false means nothing was written and
/// nothing was deliberately skipped (e.g. an empty catalog).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedOutcome {
    pub seeded: bool,
    pub skipped: bool,
}

impl SeedOutcome {
    pub const SEEDED: Self = Self { seeded: true, skipped: false };
    pub const SKIPPED: Self = Self { seeded: false, skipped: true };
}

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("seed catalog is invalid: {0}")]
    Catalog(#[from] serde_json::Error),

    #[error(transparent)]
    Db(#[from] DbError),
}

#[async_trait]
pub trait Seeder: Send + Sync {
    async fn seed(&self, store: &dyn Store, options: SeedOptions) -> Result<SeedOutcome, SeedError>;
}

/// Seeds the product collection from a JSON array of products.
#[derive(Debug, Clone)]
pub struct ProductSeeder {
    catalog: String,
}

impl Default for ProductSeeder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductSeeder {
    /// Seeder for the catalog compiled into the binary.
    pub fn new() -> Self {
        Self::from_json(BUNDLED_CATALOG)
    }

    /// Seeder for an arbitrary JSON catalog. Parsed lazily on each run.
    pub fn from_json(catalog: impl Into<String>) -> Self {
        Self {
            catalog: catalog.into(),
        }
    }

    pub fn products(&self) -> Result<Vec<Product>, SeedError> {
        Ok(serde_json::from_str(&self.catalog)?)
    }
}

#[async_trait]
impl Seeder for ProductSeeder {
    async fn seed(&self, store: &dyn Store, options: SeedOptions) -> Result<SeedOutcome, SeedError> {
        let existing = store.count_products().await?;

        if existing > 0 && options.skip_if_exists && !options.force {
            tracing::debug!(existing, "Products present, not seeding");
            return Ok(SeedOutcome::SKIPPED);
        }

        let products = self.products()?;
        if products.is_empty() {
            tracing::warn!("Seed catalog is empty");
            return Ok(SeedOutcome::default());
        }

        if existing > 0 {
            let removed = store.clear_products().await?;
            tracing::info!(removed, "Cleared existing products before reseed");
        }

        let inserted = store.insert_products(products).await?;
        tracing::info!(inserted, "Inserted seed products");
        Ok(SeedOutcome::SEEDED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    #[test]
    fn bundled_catalog_parses() {
        let products = ProductSeeder::new().products().unwrap();
        assert!(!products.is_empty());
        assert!(products.iter().all(|p| p.price_cents > 0 && p.stock >= 0));
    }

    #[test]
    fn startup_options_mirror_force() {
        assert_eq!(
            SeedOptions::for_startup(false),
            SeedOptions { force: false, skip_if_exists: true }
        );
        assert_eq!(
            SeedOptions::for_startup(true),
            SeedOptions { force: true, skip_if_exists: false }
        );
    }

    #[tokio::test]
    async fn seeds_empty_store() {
        let store = MemoryStore::new();
        let seeder = ProductSeeder::new();

        let outcome = seeder.seed(&store, SeedOptions::for_startup(false)).await.unwrap();
        assert_eq!(outcome, SeedOutcome::SEEDED);
        assert_eq!(
            store.count_products().await.unwrap() as usize,
            seeder.products().unwrap().len()
        );
    }

    #[tokio::test]
    async fn skips_populated_store() {
        let store = MemoryStore::new();
        let seeder = ProductSeeder::new();
        seeder.seed(&store, SeedOptions::for_startup(false)).await.unwrap();

        let outcome = seeder.seed(&store, SeedOptions::for_startup(false)).await.unwrap();
        assert_eq!(outcome, SeedOutcome::SKIPPED);
    }

    #[tokio::test]
    async fn force_replaces_existing_catalog() {
        let store = MemoryStore::new();
        ProductSeeder::new()
            .seed(&store, SeedOptions::for_startup(false))
            .await
            .unwrap();

        let replacement = ProductSeeder::from_json(
            r#"[{"_id":"only","name":"Only","description":"d","category":"c","price_cents":100,"stock":1}]"#,
        );
        let outcome = replacement.seed(&store, SeedOptions::for_startup(true)).await.unwrap();
        assert_eq!(outcome, SeedOutcome::SEEDED);
        assert_eq!(store.count_products().await.unwrap(), 1);
        assert!(store.get_product("only").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn empty_catalog_is_neither() {
        let store = MemoryStore::new();
        let outcome = ProductSeeder::from_json("[]")
            .seed(&store, SeedOptions::for_startup(false))
            .await
            .unwrap();
        assert_eq!(outcome, SeedOutcome::default());
    }

    #[tokio::test]
    async fn malformed_catalog_is_an_error() {
        let store = MemoryStore::new();
        let err = ProductSeeder::from_json("{not json")
            .seed(&store, SeedOptions::for_startup(true))
            .await
            .unwrap_err();
        assert!(matches!(err, SeedError::Catalog(_)));
    }
}
