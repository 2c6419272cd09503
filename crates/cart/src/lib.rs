//! `storefront-cart` — the session's shopping cart and its façade.
//!
//! - [`ShoppingCart`] owns the session's order, applies mutations and notifies
//!   cart listeners after each one.
//! - [`CartController`] turns UI actions into cart calls and formats money.
//! - [`StorefrontSession`] ties a cart, the logged-in user and the session's
//!   listener registrations together.
//! - [`checkout`] places the order through the persistence facade.

pub mod cart;
pub mod checkout;
pub mod controller;
pub mod format;
pub mod session;

pub use cart::{CartError, ShoppingCart};
pub use checkout::{CheckoutError, Receipt, checkout};
pub use controller::{CartController, CartSummary, ControllerError, LineSummary};
pub use format::{Locale, LocaleFormatter, MoneyFormatter};
pub use session::{ProfileUpdateError, StorefrontSession};
