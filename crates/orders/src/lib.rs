//! Shopping-cart order model.
//!
//! This crate contains the cart's business rules, implemented purely as
//! deterministic domain logic (no IO, no locking, no notification).

pub mod order;

pub use order::{Order, OrderError, OrderedProduct};
