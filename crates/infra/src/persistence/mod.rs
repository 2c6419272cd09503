//! Persistence facade boundary.
//!
//! The storefront core loads products, stores placed orders and user profiles
//! through [`Facade`]. Query execution and schema live behind the trait; the
//! core never interprets storage failures, it only propagates them.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryFacade;
pub use r#trait::{Facade, PersistenceError, ProductCriteria, StoredOrder};
