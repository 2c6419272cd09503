//! Scoped listener registration.

use std::sync::Weak;

use crate::dispatcher::EventDispatcher;
use crate::event::EventFamily;
use crate::listener::ListenerKey;

/// Guard for one registration on an [`EventDispatcher`].
///
/// Dropping the guard unsubscribes the listener. Components acquire a guard
/// when they are built and keep it for as long as they want notifications.
///
/// Registration is set-like, so two guards for the same listener share one
/// registration; whichever is released first ends delivery.
#[must_use = "dropping a Subscription immediately unsubscribes the listener"]
#[derive(Debug)]
pub struct Subscription {
    dispatcher: Weak<EventDispatcher>,
    family: EventFamily,
    key: ListenerKey,
}

impl Subscription {
    pub(crate) fn new(dispatcher: Weak<EventDispatcher>, family: EventFamily, key: ListenerKey) -> Self {
        Self {
            dispatcher,
            family,
            key,
        }
    }

    pub fn key(&self) -> ListenerKey {
        self.key
    }

    pub fn family(&self) -> EventFamily {
        self.family
    }

    /// Unsubscribe now. Returns whether the registration still existed.
    pub fn cancel(self) -> bool {
        self.release()
    }

    fn release(&self) -> bool {
        match self.dispatcher.upgrade() {
            Some(dispatcher) => dispatcher.unsubscribe(self.family, self.key),
            None => false,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use storefront_core::{Currency, OrderId};
    use storefront_orders::Order;

    use crate::event::CartUpdatedEvent;
    use crate::listener::{Listener, ListenerError};

    fn counting_listener(hits: &Arc<AtomicUsize>) -> Listener {
        let hits = Arc::clone(hits);
        Listener::cart(Arc::new(move |_: &CartUpdatedEvent| -> Result<(), ListenerError> {
            hits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }))
    }

    fn cart_event() -> CartUpdatedEvent {
        CartUpdatedEvent::new(Arc::new(Order::new(OrderId::new(), Currency::Eur)))
    }

    #[test]
    fn dropping_the_guard_unsubscribes() {
        let dispatcher = Arc::new(EventDispatcher::new());
        let hits = Arc::new(AtomicUsize::new(0));
        let listener = counting_listener(&hits);

        let guard = dispatcher.subscribe_scoped(&listener);
        dispatcher.dispatch_cart_updated(cart_event());
        drop(guard);
        dispatcher.dispatch_cart_updated(cart_event());

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.listener_count(EventFamily::CartUpdated), 0);
    }

    #[test]
    fn cancel_reports_whether_registration_existed() {
        let dispatcher = Arc::new(EventDispatcher::new());
        let hits = Arc::new(AtomicUsize::new(0));
        let listener = counting_listener(&hits);

        let guard = dispatcher.subscribe_scoped(&listener);
        dispatcher.unsubscribe(guard.family(), guard.key());
        assert!(!guard.cancel());
    }

    #[test]
    fn guard_outliving_dispatcher_is_harmless() {
        let dispatcher = Arc::new(EventDispatcher::new());
        let hits = Arc::new(AtomicUsize::new(0));
        let listener = counting_listener(&hits);

        let guard = dispatcher.subscribe_scoped(&listener);
        drop(dispatcher);
        assert!(!guard.cancel());
    }
}
