//! Infrastructure layer: storage adapters behind the persistence facade.

pub mod persistence;

pub use persistence::{Facade, InMemoryFacade, PersistenceError, ProductCriteria, StoredOrder};
