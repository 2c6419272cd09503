//! `storefront-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by the storefront
//! crates (no infrastructure concerns).

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod value_object;

pub use aggregate::AggregateRoot;
pub use entity::Entity;
pub use error::DomainError;
pub use id::{CategoryId, OrderId, ProductId, SessionId, UserId};
pub use money::{Currency, Money};
pub use value_object::ValueObject;
