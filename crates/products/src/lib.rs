//! Products catalog module.
//!
//! The catalog owns products and the category tree they are listed under; the
//! cart only keeps copies of the products it needs for line-item computation.

pub mod category;
pub mod product;

pub use category::ProductCategory;
pub use product::Product;
