use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use storefront_core::{CategoryId, Money, OrderId, ProductId, UserId};
use storefront_orders::Order;
use storefront_products::{Product, ProductCategory};
use storefront_users::User;

/// Storage failure, passed through the core unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl PersistenceError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Catalog query parameters. Every `None` criterion matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCriteria {
    /// Case-insensitive substring of the product name.
    pub name_contains: Option<String>,
    pub available_only: bool,
    pub max_price: Option<Money>,
    /// Only products listed directly under this category.
    pub category: Option<CategoryId>,
}

impl ProductCriteria {
    pub fn available() -> Self {
        Self {
            available_only: true,
            ..Self::default()
        }
    }

    pub fn in_category(category: CategoryId) -> Self {
        Self {
            category: Some(category),
            ..Self::available()
        }
    }

    pub fn matches(&self, product: &Product) -> bool {
        if self.available_only && !product.is_available() {
            return false;
        }
        if self.category.is_some() && product.category() != self.category {
            return false;
        }
        if let Some(needle) = &self.name_contains {
            if !product
                .name()
                .to_lowercase()
                .contains(&needle.to_lowercase())
            {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            let price = product.price();
            if price.currency() != max.currency() || price.minor_units() > max.minor_units() {
                return false;
            }
        }
        true
    }
}

/// A placed order as it sits in storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredOrder {
    pub order_id: OrderId,
    pub user_id: Option<UserId>,
    pub stored_at: DateTime<Utc>,
    pub payload: JsonValue,
}

impl StoredOrder {
    pub fn from_order(order: &Order, user_id: Option<UserId>) -> Result<Self, PersistenceError> {
        let payload = serde_json::to_value(order)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;
        Ok(Self {
            order_id: order.id_typed(),
            user_id,
            stored_at: Utc::now(),
            payload,
        })
    }

    pub fn to_order(&self) -> Result<Order, PersistenceError> {
        serde_json::from_value(self.payload.clone())
            .map_err(|e| PersistenceError::Serialization(e.to_string()))
    }
}

/// Synchronous load/store/query access used by the storefront.
///
/// Implementations must be safe to share across threads; every call either
/// completes or fails within the call.
pub trait Facade: Send + Sync {
    fn load_product(&self, id: ProductId) -> Result<Product, PersistenceError>;

    fn query_products(&self, criteria: &ProductCriteria) -> Result<Vec<Product>, PersistenceError>;

    /// Top-level categories of the catalog, by name.
    fn query_root_categories(&self) -> Result<Vec<ProductCategory>, PersistenceError>;

    /// Direct children of `parent`, by name.
    fn query_subcategories(&self, parent: CategoryId) -> Result<Vec<ProductCategory>, PersistenceError>;

    /// Store a placed order. Orders are written once.
    fn store_order(&self, order: &Order, user_id: Option<UserId>) -> Result<StoredOrder, PersistenceError>;

    fn load_order(&self, id: OrderId) -> Result<Order, PersistenceError>;

    /// Insert or replace a user profile.
    fn store_user(&self, user: &User) -> Result<(), PersistenceError>;

    fn load_user(&self, id: UserId) -> Result<User, PersistenceError>;
}

impl<F> Facade for Arc<F>
where
    F: Facade + ?Sized,
{
    fn load_product(&self, id: ProductId) -> Result<Product, PersistenceError> {
        (**self).load_product(id)
    }

    fn query_products(&self, criteria: &ProductCriteria) -> Result<Vec<Product>, PersistenceError> {
        (**self).query_products(criteria)
    }

    fn query_root_categories(&self) -> Result<Vec<ProductCategory>, PersistenceError> {
        (**self).query_root_categories()
    }

    fn query_subcategories(&self, parent: CategoryId) -> Result<Vec<ProductCategory>, PersistenceError> {
        (**self).query_subcategories(parent)
    }

    fn store_order(&self, order: &Order, user_id: Option<UserId>) -> Result<StoredOrder, PersistenceError> {
        (**self).store_order(order, user_id)
    }

    fn load_order(&self, id: OrderId) -> Result<Order, PersistenceError> {
        (**self).load_order(id)
    }

    fn store_user(&self, user: &User) -> Result<(), PersistenceError> {
        (**self).store_user(user)
    }

    fn load_user(&self, id: UserId) -> Result<User, PersistenceError> {
        (**self).load_user(id)
    }
}
