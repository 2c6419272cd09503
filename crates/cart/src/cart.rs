//! Shopping cart service.
//!
//! ## Consistency
//!
//! Every mutation and the dispatch that follows it form one critical section,
//! guarded by the cart's `working` lock. The order visible to readers is a
//! published `Arc<Order>` snapshot, swapped in before listeners run, so a
//! listener that re-reads [`ShoppingCart::order`] during dispatch sees exactly
//! the state the event describes and never a half-applied mutation.
//!
//! A listener must not mutate the cart that is notifying it: such calls are
//! refused with [`CartError::ReentrantMutation`] instead of deadlocking.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::thread::{self, ThreadId};

use thiserror::Error;

use storefront_core::{AggregateRoot, Currency, OrderId, ProductId};
use storefront_events::{CartUpdatedEvent, EventDispatcher};
use storefront_orders::{Order, OrderError, OrderedProduct};
use storefront_products::Product;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CartError {
    #[error(transparent)]
    Order(#[from] OrderError),

    /// A cart listener tried to mutate the cart it is being notified by.
    #[error("cart mutated from inside its own update notification")]
    ReentrantMutation,

    /// A previous mutation panicked while holding the cart lock.
    #[error("cart lock poisoned")]
    Poisoned,
}

/// The shopping cart of one session.
pub struct ShoppingCart {
    dispatcher: Arc<EventDispatcher>,
    currency: Currency,
    working: Mutex<Arc<Order>>,
    published: RwLock<Arc<Order>>,
    dispatching_thread: Mutex<Option<ThreadId>>,
}

impl ShoppingCart {
    /// Start an empty cart priced in `currency`.
    pub fn new(dispatcher: Arc<EventDispatcher>, currency: Currency) -> Self {
        Self::with_order(dispatcher, Order::new(OrderId::new(), currency))
    }

    /// Resume a cart from an existing order.
    pub fn with_order(dispatcher: Arc<EventDispatcher>, order: Order) -> Self {
        let currency = order.currency();
        let order = Arc::new(order);
        Self {
            dispatcher,
            currency,
            working: Mutex::new(Arc::clone(&order)),
            published: RwLock::new(order),
            dispatching_thread: Mutex::new(None),
        }
    }

    pub fn dispatcher(&self) -> &Arc<EventDispatcher> {
        &self.dispatcher
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// The current order. Never blocks on a running mutation.
    pub fn order(&self) -> Arc<Order> {
        let published = self.published.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&published)
    }

    /// Add `quantity` of `product`, merging into its existing line.
    pub fn add_to_cart(&self, product: &Product, quantity: i64) -> Result<OrderedProduct, CartError> {
        self.mutate("add_to_cart", |order| {
            order.add_product(product, quantity).cloned()
        })
    }

    /// Remove the line for `product_id`. Removing an absent product succeeds
    /// (and still notifies); the return value says whether a line was removed.
    pub fn remove_from_cart(&self, product_id: ProductId) -> Result<bool, CartError> {
        self.mutate("remove_from_cart", |order| Ok(order.remove_product(product_id)))
    }

    /// Set the quantity of `product`; `quantity <= 0` removes its line.
    pub fn update_quantity(
        &self,
        product: &Product,
        quantity: i64,
    ) -> Result<Option<OrderedProduct>, CartError> {
        self.mutate("update_quantity", |order| {
            order
                .set_quantity(product, quantity)
                .map(|line| line.cloned())
        })
    }

    /// Empty the cart.
    pub fn clear(&self) -> Result<(), CartError> {
        self.mutate("clear", |order| {
            order.clear();
            Ok(())
        })
    }

    /// Run `complete` on the current order and, if it succeeds, replace the
    /// order with a fresh empty one (new id), all in one critical section.
    ///
    /// Used by checkout: nothing can be added between placing the order and
    /// emptying the cart.
    pub fn complete_with<T, E>(&self, complete: impl FnOnce(&Order) -> Result<T, E>) -> Result<T, E>
    where
        E: From<CartError>,
    {
        let mut working = self.begin()?;
        let value = complete(&working)?;

        *working = Arc::new(Order::new(OrderId::new(), self.currency));
        self.publish_and_notify("complete", &*working);
        Ok(value)
    }

    fn mutate<T>(
        &self,
        op: &'static str,
        apply: impl FnOnce(&mut Order) -> Result<T, OrderError>,
    ) -> Result<T, CartError> {
        let mut working = self.begin()?;
        let value = apply(Arc::make_mut(&mut *working)).inspect_err(|err| {
            tracing::debug!(op, error = %err, "cart mutation rejected");
        })?;

        self.publish_and_notify(op, &*working);
        Ok(value)
    }

    fn begin(&self) -> Result<MutexGuard<'_, Arc<Order>>, CartError> {
        let current = thread::current().id();
        if *lock_slot(&self.dispatching_thread) == Some(current) {
            return Err(CartError::ReentrantMutation);
        }
        self.working.lock().map_err(|_| CartError::Poisoned)
    }

    /// Publish `order` as the current snapshot and notify cart listeners.
    /// Must be called with the working lock held.
    fn publish_and_notify(&self, op: &'static str, order: &Arc<Order>) {
        {
            let mut published = self.published.write().unwrap_or_else(PoisonError::into_inner);
            *published = Arc::clone(order);
        }

        tracing::debug!(
            op,
            order_id = %order.id_typed(),
            version = order.version(),
            items = order.item_count(),
            total = %order.total_price(),
            "cart updated"
        );

        let _scope = DispatchScope::enter(&self.dispatching_thread);
        self.dispatcher
            .dispatch_cart_updated(CartUpdatedEvent::new(Arc::clone(order)));
    }
}

impl core::fmt::Debug for ShoppingCart {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ShoppingCart")
            .field("order", &self.order())
            .finish_non_exhaustive()
    }
}

fn lock_slot(slot: &Mutex<Option<ThreadId>>) -> MutexGuard<'_, Option<ThreadId>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Marks the current thread as dispatching for this cart until dropped.
struct DispatchScope<'a> {
    slot: &'a Mutex<Option<ThreadId>>,
}

impl<'a> DispatchScope<'a> {
    fn enter(slot: &'a Mutex<Option<ThreadId>>) -> Self {
        *lock_slot(slot) = Some(thread::current().id());
        Self { slot }
    }
}

impl Drop for DispatchScope<'_> {
    fn drop(&mut self) {
        *lock_slot(self.slot) = None;
    }
}
