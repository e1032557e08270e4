//! MongoDB-backed `Store`.
//!
//! # Collections
//! - `products`: catalog, `_id` is the product slug
//! - `orders`: placed orders, queried by `user_id`
//! - `users`: accounts, unique index on `email`
//! - `sessions`: bearer tokens, `_id` is the token

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Collection, Database, IndexModel};

use super::{Connector, DbError, Order, Product, ProductQuery, Session, Store, User};

const DEFAULT_DATABASE: &str = "storefront";
const DUPLICATE_KEY: i32 = 11000;

pub(crate) fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::InsertMany(e) => e
            .write_errors
            .as_ref()
            .is_some_and(|errors| errors.iter().any(|w| w.code == DUPLICATE_KEY)),
        _ => false,
    }
}

pub struct MongoStore {
    db: Database,
    products: Collection<Product>,
    orders: Collection<Order>,
    users: Collection<User>,
    sessions: Collection<Session>,
}

impl MongoStore {
    pub fn new(db: &Database) -> Self {
        Self {
            db: db.clone(),
            products: db.collection("products"),
            orders: db.collection("orders"),
            users: db.collection("users"),
            sessions: db.collection("sessions"),
        }
    }

    async fn ensure_indexes(&self) -> Result<(), DbError> {
        let unique_email = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.users.create_index(unique_email).await?;

        let by_user = IndexModel::builder().keys(doc! { "user_id": 1 }).build();
        self.orders.create_index(by_user).await?;
        Ok(())
    }
}

fn text_filter(text: &str) -> Document {
    let pattern = regex::escape(text);
    doc! {
        "$or": [
            { "name": { "$regex": pattern.as_str(), "$options": "i" } },
            { "description": { "$regex": pattern.as_str(), "$options": "i" } },
            { "category": { "$regex": pattern.as_str(), "$options": "i" } },
        ]
    }
}

#[async_trait]
impl Store for MongoStore {
    async fn ping(&self) -> Result<(), DbError> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    async fn count_products(&self) -> Result<u64, DbError> {
        Ok(self.products.count_documents(doc! {}).await?)
    }

    async fn clear_products(&self) -> Result<u64, DbError> {
        Ok(self.products.delete_many(doc! {}).await?.deleted_count)
    }

    async fn insert_products(&self, products: Vec<Product>) -> Result<usize, DbError> {
        if products.is_empty() {
            return Ok(0);
        }
        let result = self.products.insert_many(products).await?;
        Ok(result.inserted_ids.len())
    }

    async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, DbError> {
        let filter = match &query.category {
            Some(category) => doc! { "category": category.as_str() },
            None => doc! {},
        };
        let cursor = self
            .products
            .find(filter)
            .sort(doc! { "_id": 1 })
            .skip(query.skip as u64)
            .limit(query.limit as i64)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn get_product(&self, id: &str) -> Result<Option<Product>, DbError> {
        Ok(self.products.find_one(doc! { "_id": id }).await?)
    }

    async fn get_products(&self, ids: &[String]) -> Result<Vec<Product>, DbError> {
        let cursor = self.products.find(doc! { "_id": { "$in": ids.to_vec() } }).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn search_products(&self, text: &str, limit: usize) -> Result<Vec<Product>, DbError> {
        let cursor = self
            .products
            .find(text_filter(text))
            .sort(doc! { "_id": 1 })
            .limit(limit as i64)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn reserve_stock(&self, id: &str, quantity: i64) -> Result<bool, DbError> {
        let result = self
            .products
            .update_one(
                doc! { "_id": id, "stock": { "$gte": quantity } },
                doc! { "$inc": { "stock": -quantity } },
            )
            .await?;
        Ok(result.modified_count == 1)
    }

    async fn release_stock(&self, id: &str, quantity: i64) -> Result<(), DbError> {
        self.products
            .update_one(doc! { "_id": id }, doc! { "$inc": { "stock": quantity } })
            .await?;
        Ok(())
    }

    async fn insert_order(&self, order: &Order) -> Result<(), DbError> {
        self.orders.insert_one(order).await?;
        Ok(())
    }

    async fn get_order(&self, id: &str) -> Result<Option<Order>, DbError> {
        Ok(self.orders.find_one(doc! { "_id": id }).await?)
    }

    async fn list_orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, DbError> {
        let cursor = self.orders.find(doc! { "user_id": user_id }).await?;
        let mut orders: Vec<Order> = cursor.try_collect().await?;
        // created_at is stored as an RFC 3339 string, which does not sort lexically.
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn insert_user(&self, user: &User) -> Result<(), DbError> {
        self.users.insert_one(user).await?;
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        Ok(self
            .users
            .find_one(doc! { "email": email.to_lowercase() })
            .await?)
    }

    async fn find_user(&self, id: &str) -> Result<Option<User>, DbError> {
        Ok(self.users.find_one(doc! { "_id": id }).await?)
    }

    async fn insert_session(&self, session: &Session) -> Result<(), DbError> {
        self.sessions.insert_one(session).await?;
        Ok(())
    }

    async fn find_session(&self, token: &str) -> Result<Option<Session>, DbError> {
        Ok(self.sessions.find_one(doc! { "_id": token }).await?)
    }
}

/// Connects with the official driver.
#[derive(Debug, Default, Clone)]
pub struct MongoConnector {
    database: Option<String>,
}

impl MongoConnector {
    /// `database` overrides the default database named in the URI.
    pub fn new(database: Option<String>) -> Self {
        Self { database }
    }
}

#[async_trait]
impl Connector for MongoConnector {
    async fn connect(&self, uri: &str) -> Result<Arc<dyn Store>, DbError> {
        let options = ClientOptions::parse(uri)
            .await
            .map_err(|e| DbError::Connect(e.to_string()))?;
        let client = Client::with_options(options).map_err(|e| DbError::Connect(e.to_string()))?;

        let db = match &self.database {
            Some(name) => client.database(name),
            None => client
                .default_database()
                .unwrap_or_else(|| client.database(DEFAULT_DATABASE)),
        };

        let store = MongoStore::new(&db);
        // The driver connects lazily; ping forces the single attempt now.
        store
            .ping()
            .await
            .map_err(|e| DbError::Connect(e.to_string()))?;
        store.ensure_indexes().await?;

        tracing::debug!(database = %db.name(), "MongoDB handle ready");
        Ok(Arc::new(store))
    }
}
