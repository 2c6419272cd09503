//! Checkout: place the session's order and start a fresh cart.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use storefront_core::{Money, OrderId, UserId};
use storefront_infra::{Facade, PersistenceError};

use crate::cart::CartError;
use crate::session::StorefrontSession;

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cannot check out an empty cart")]
    EmptyCart,

    #[error("checkout requires a logged-in user")]
    NotLoggedIn,

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Cart(#[from] CartError),
}

/// Confirmation of a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub item_count: u64,
    pub total: Money,
    pub placed_at: DateTime<Utc>,
}

/// Store the session's order for the logged-in user, then empty the cart.
///
/// Storing and emptying happen under the cart's lock, so the stored order is
/// exactly what gets removed from the cart. If storage fails the cart is left
/// as it was.
pub fn checkout<F: Facade + ?Sized>(
    session: &StorefrontSession,
    facade: &F,
) -> Result<Receipt, CheckoutError> {
    let user = session.current_user().ok_or(CheckoutError::NotLoggedIn)?;

    let receipt = session.cart().complete_with(|order| {
        if order.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let stored = facade.store_order(order, Some(user.id))?;
        Ok(Receipt {
            order_id: stored.order_id,
            user_id: user.id,
            item_count: order.item_count(),
            total: order.total_price(),
            placed_at: stored.stored_at,
        })
    });

    match &receipt {
        Ok(receipt) => tracing::info!(
            session_id = %session.id(),
            order_id = %receipt.order_id,
            user_id = %receipt.user_id,
            items = receipt.item_count,
            total = %receipt.total,
            "order placed"
        ),
        Err(err) => tracing::warn!(session_id = %session.id(), error = %err, "checkout failed"),
    }
    receipt
}

#[cfg(test)]
mod tests {
    use super::*;

    use storefront_core::{Currency, ProductId};
    use storefront_infra::InMemoryFacade;
    use storefront_products::Product;
    use storefront_users::User;

    fn widget() -> Product {
        Product::new(ProductId::new(), "Widget", Money::new(1000, Currency::Eur))
    }

    #[test]
    fn requires_a_logged_in_user() {
        let facade = InMemoryFacade::new();
        let session = StorefrontSession::new(Currency::Eur);
        session.cart().add_to_cart(&widget(), 1).unwrap();

        assert!(matches!(checkout(&session, &facade), Err(CheckoutError::NotLoggedIn)));
        assert_eq!(session.cart().order().item_count(), 1);
    }

    #[test]
    fn rejects_an_empty_cart() {
        let facade = InMemoryFacade::new();
        let session = StorefrontSession::new(Currency::Eur);
        session.login(User::new(UserId::new(), "Alice"));

        assert!(matches!(checkout(&session, &facade), Err(CheckoutError::EmptyCart)));
        assert_eq!(facade.stored_order_count().unwrap(), 0);
    }

    #[test]
    fn stores_the_order_and_starts_a_fresh_cart() {
        let facade = InMemoryFacade::new();
        let session = StorefrontSession::new(Currency::Eur);
        let user = User::new(UserId::new(), "Alice");
        session.login(user.clone());
        session.cart().add_to_cart(&widget(), 3).unwrap();
        let placed = session.cart().order();

        let receipt = checkout(&session, &facade).unwrap();

        assert_eq!(receipt.order_id, placed.id_typed());
        assert_eq!(receipt.user_id, user.id);
        assert_eq!(receipt.item_count, 3);
        assert_eq!(receipt.total, Money::new(3000, Currency::Eur));
        assert_eq!(facade.load_order(receipt.order_id).unwrap(), *placed);
        assert!(session.cart().order().is_empty());

        session.cart().add_to_cart(&widget(), 1).unwrap();
        assert!(checkout(&session, &facade).is_ok());
        assert_eq!(facade.stored_order_count().unwrap(), 2);
    }
}
