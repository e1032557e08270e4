//! In-process `Store` backed by concurrent maps.
//!
//! Used by the test suite and for running the API without a MongoDB server.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{Connector, DbError, Order, Product, ProductQuery, Session, Store, User};

#[derive(Default)]
pub struct MemoryStore {
    products: DashMap<String, Product>,
    orders: DashMap<String, Order>,
    users: DashMap<String, User>,
    // lowercased email -> user id
    emails: DashMap<String, String>,
    sessions: DashMap<String, Session>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted_products(&self) -> Vec<Product> {
        let mut products: Vec<Product> = self.products.iter().map(|p| p.value().clone()).collect();
        products.sort_by(|a, b| a.id.cmp(&b.id));
        products
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), DbError> {
        Ok(())
    }

    async fn count_products(&self) -> Result<u64, DbError> {
        Ok(self.products.len() as u64)
    }

    async fn clear_products(&self) -> Result<u64, DbError> {
        let removed = self.products.len() as u64;
        self.products.clear();
        Ok(removed)
    }

    async fn insert_products(&self, products: Vec<Product>) -> Result<usize, DbError> {
        if let Some(dup) = products.iter().find(|p| self.products.contains_key(&p.id)) {
            return Err(DbError::Duplicate(dup.id.clone()));
        }
        let count = products.len();
        for product in products {
            self.products.insert(product.id.clone(), product);
        }
        Ok(count)
    }

    async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, DbError> {
        Ok(self
            .sorted_products()
            .into_iter()
            .filter(|p| query.category.as_ref().is_none_or(|c| &p.category == c))
            .skip(query.skip)
            .take(query.limit)
            .collect())
    }

    async fn get_product(&self, id: &str) -> Result<Option<Product>, DbError> {
        Ok(self.products.get(id).map(|p| p.value().clone()))
    }

    async fn get_products(&self, ids: &[String]) -> Result<Vec<Product>, DbError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.products.get(id).map(|p| p.value().clone()))
            .collect())
    }

    async fn search_products(&self, text: &str, limit: usize) -> Result<Vec<Product>, DbError> {
        let needle = text.to_lowercase();
        Ok(self
            .sorted_products()
            .into_iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&needle)
                    || p.description.to_lowercase().contains(&needle)
                    || p.category.to_lowercase().contains(&needle)
            })
            .take(limit)
            .collect())
    }

    async fn reserve_stock(&self, id: &str, quantity: i64) -> Result<bool, DbError> {
        // get_mut holds the shard lock, so the check and decrement are atomic.
        match self.products.get_mut(id) {
            Some(mut product) if product.stock >= quantity => {
                product.stock -= quantity;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release_stock(&self, id: &str, quantity: i64) -> Result<(), DbError> {
        if let Some(mut product) = self.products.get_mut(id) {
            product.stock += quantity;
        }
        Ok(())
    }

    async fn insert_order(&self, order: &Order) -> Result<(), DbError> {
        match self.orders.entry(order.id.clone()) {
            Entry::Occupied(_) => Err(DbError::Duplicate(order.id.clone())),
            Entry::Vacant(slot) => {
                slot.insert(order.clone());
                Ok(())
            }
        }
    }

    async fn get_order(&self, id: &str) -> Result<Option<Order>, DbError> {
        Ok(self.orders.get(id).map(|o| o.value().clone()))
    }

    async fn list_orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, DbError> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|o| o.user_id.as_deref() == Some(user_id))
            .map(|o| o.value().clone())
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn insert_user(&self, user: &User) -> Result<(), DbError> {
        match self.emails.entry(user.email.to_lowercase()) {
            Entry::Occupied(_) => Err(DbError::Duplicate(user.email.clone())),
            Entry::Vacant(slot) => {
                slot.insert(user.id.clone());
                self.users.insert(user.id.clone(), user.clone());
                Ok(())
            }
        }
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        let Some(id) = self.emails.get(&email.to_lowercase()).map(|id| id.value().clone()) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn find_user(&self, id: &str) -> Result<Option<User>, DbError> {
        Ok(self.users.get(id).map(|u| u.value().clone()))
    }

    async fn insert_session(&self, session: &Session) -> Result<(), DbError> {
        self.sessions.insert(session.token.clone(), session.clone());
        Ok(())
    }

    async fn find_session(&self, token: &str) -> Result<Option<Session>, DbError> {
        Ok(self.sessions.get(token).map(|s| s.value().clone()))
    }
}

/// Hands out one shared `MemoryStore`, ignoring the URI.
#[derive(Default, Clone)]
pub struct MemoryConnector {
    store: Arc<MemoryStore>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuse an existing store, e.g. one pre-populated by a test.
    pub fn with_store(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> Arc<MemoryStore> {
        self.store.clone()
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, _uri: &str) -> Result<Arc<dyn Store>, DbError> {
        Ok(self.store.clone())
    }
}
