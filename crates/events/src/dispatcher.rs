//! Synchronous fan-out of storefront events to registered listeners.
//!
//! ## Delivery
//!
//! - **Synchronous**: `dispatch` runs every listener on the caller's thread and
//!   returns only after the last one finished.
//! - **Ordered**: listeners of a family are notified in subscription order.
//! - **Snapshot**: the registered set is copied when a dispatch starts. A
//!   listener added while a dispatch is running is not part of that dispatch,
//!   but is part of every later one.
//! - **Isolated**: a listener that returns an error or panics is reported in the
//!   [`DispatchReport`] and logged; the remaining listeners are still notified
//!   and the failure never reaches the code that triggered the dispatch.
//!
//! ## Registration
//!
//! Registration is set-like: subscribing a listener that is already registered
//! returns the existing key and does not cause duplicate delivery.
//!
//! The dispatcher holds listeners weakly. It never keeps a UI component alive;
//! registrations whose listener was dropped are pruned on the next subscribe or
//! dispatch. Explicit teardown goes through [`EventDispatcher::unsubscribe`] or
//! a [`Subscription`] guard.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use thiserror::Error;

use crate::event::{CartUpdatedEvent, Event, EventFamily, StorefrontEvent, UserSessionEvent};
use crate::listener::{CartUpdateListener, Listener, ListenerError, ListenerKey, UserSessionListener};
use crate::subscription::Subscription;

/// Why a listener did not handle an event.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FailureReason {
    #[error("listener returned an error: {0}")]
    Failed(ListenerError),

    #[error("listener panicked: {0}")]
    Panicked(String),
}

/// One listener that failed during a dispatch.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{listener} failed handling {event_type}: {reason}")]
pub struct ListenerDispatchFailure {
    pub event_type: &'static str,
    pub listener: ListenerKey,
    pub reason: FailureReason,
}

/// Outcome of one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub event_type: &'static str,
    /// Listeners that handled the event successfully.
    pub delivered: usize,
    pub failures: Vec<ListenerDispatchFailure>,
}

impl DispatchReport {
    fn new(event_type: &'static str) -> Self {
        Self {
            event_type,
            delivered: 0,
            failures: Vec::new(),
        }
    }

    /// Number of listeners the event was handed to.
    pub fn attempted(&self) -> usize {
        self.delivered + self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

struct Registered<L: ?Sized> {
    key: ListenerKey,
    listener: Weak<L>,
}

/// Registry of listeners per event family.
pub struct EventDispatcher {
    next_key: AtomicU64,
    cart_listeners: Mutex<Vec<Registered<dyn CartUpdateListener>>>,
    session_listeners: Mutex<Vec<Registered<dyn UserSessionListener>>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for its family.
    ///
    /// Returns the registration key; registering the same listener again
    /// returns the key of the existing registration.
    pub fn subscribe(&self, listener: &Listener) -> ListenerKey {
        let key = match listener {
            Listener::Cart(l) => self.register(&self.cart_listeners, Arc::downgrade(l)),
            Listener::Session(l) => self.register(&self.session_listeners, Arc::downgrade(l)),
        };
        tracing::debug!(family = %listener.family(), listener = %key, "listener subscribed");
        key
    }

    /// Register `listener` and tie the registration to the returned guard.
    pub fn subscribe_scoped(self: &Arc<Self>, listener: &Listener) -> Subscription {
        let key = self.subscribe(listener);
        Subscription::new(Arc::downgrade(self), listener.family(), key)
    }

    /// Remove the registration `key` from `family`. Returns whether it existed.
    pub fn unsubscribe(&self, family: EventFamily, key: ListenerKey) -> bool {
        let removed = match family {
            EventFamily::CartUpdated => remove_key(&self.cart_listeners, key),
            EventFamily::UserSession => remove_key(&self.session_listeners, key),
        };
        if removed {
            tracing::debug!(family = %family, listener = %key, "listener unsubscribed");
        }
        removed
    }

    /// Key of the current registration of `listener`, if it is registered.
    pub fn key_of(&self, listener: &Listener) -> Option<ListenerKey> {
        match listener {
            Listener::Cart(l) => find_key(&self.cart_listeners, &Arc::downgrade(l)),
            Listener::Session(l) => find_key(&self.session_listeners, &Arc::downgrade(l)),
        }
    }

    /// Remove the registration of `listener`, if any.
    pub fn unsubscribe_listener(&self, listener: &Listener) -> bool {
        match self.key_of(listener) {
            Some(key) => self.unsubscribe(listener.family(), key),
            None => false,
        }
    }

    /// Number of live registrations for `family`.
    pub fn listener_count(&self, family: EventFamily) -> usize {
        match family {
            EventFamily::CartUpdated => count_live(&self.cart_listeners),
            EventFamily::UserSession => count_live(&self.session_listeners),
        }
    }

    /// Deliver `event` to every listener of its family.
    pub fn dispatch(&self, event: &StorefrontEvent) -> DispatchReport {
        let event_type = event.event_type();
        let report = match event {
            StorefrontEvent::CartUpdated(e) => {
                deliver(&self.cart_listeners, event_type, |l| l.on_cart_updated(e))
            }
            StorefrontEvent::Login(e) => {
                deliver(&self.session_listeners, event_type, |l| l.on_login(e))
            }
            StorefrontEvent::Logout(e) => {
                deliver(&self.session_listeners, event_type, |l| l.on_logout(e))
            }
        };
        tracing::debug!(
            event_type,
            delivered = report.delivered,
            failed = report.failures.len(),
            "event dispatched"
        );
        report
    }

    pub fn dispatch_cart_updated(&self, event: CartUpdatedEvent) -> DispatchReport {
        self.dispatch(&StorefrontEvent::CartUpdated(event))
    }

    pub fn dispatch_login(&self, event: UserSessionEvent) -> DispatchReport {
        self.dispatch(&StorefrontEvent::Login(event))
    }

    pub fn dispatch_logout(&self, event: UserSessionEvent) -> DispatchReport {
        self.dispatch(&StorefrontEvent::Logout(event))
    }

    fn register<L: ?Sized>(&self, list: &Mutex<Vec<Registered<L>>>, listener: Weak<L>) -> ListenerKey {
        let mut entries = lock(list);
        entries.retain(|r| r.listener.strong_count() > 0);

        if let Some(existing) = entries.iter().find(|r| Weak::ptr_eq(&r.listener, &listener)) {
            return existing.key;
        }

        let key = ListenerKey(self.next_key.fetch_add(1, Ordering::Relaxed));
        entries.push(Registered { key, listener });
        key
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self {
            next_key: AtomicU64::new(1),
            cart_listeners: Mutex::new(Vec::new()),
            session_listeners: Mutex::new(Vec::new()),
        }
    }
}

impl core::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("cart_listeners", &self.listener_count(EventFamily::CartUpdated))
            .field("session_listeners", &self.listener_count(EventFamily::UserSession))
            .finish()
    }
}

// Listeners never run while a registry lock is held, so a poisoned lock only
// means a panic inside the registry bookkeeping itself; the Vec is still sound.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn remove_key<L: ?Sized>(list: &Mutex<Vec<Registered<L>>>, key: ListenerKey) -> bool {
    let mut entries = lock(list);
    let before = entries.len();
    entries.retain(|r| r.key != key);
    entries.len() != before
}

fn find_key<L: ?Sized>(list: &Mutex<Vec<Registered<L>>>, listener: &Weak<L>) -> Option<ListenerKey> {
    lock(list)
        .iter()
        .find(|r| Weak::ptr_eq(&r.listener, listener))
        .map(|r| r.key)
}

fn count_live<L: ?Sized>(list: &Mutex<Vec<Registered<L>>>) -> usize {
    lock(list)
        .iter()
        .filter(|r| r.listener.strong_count() > 0)
        .count()
}

/// Take the delivery snapshot: live listeners in subscription order.
fn snapshot<L: ?Sized>(list: &Mutex<Vec<Registered<L>>>) -> Vec<(ListenerKey, Arc<L>)> {
    let mut entries = lock(list);
    entries.retain(|r| r.listener.strong_count() > 0);
    entries
        .iter()
        .filter_map(|r| r.listener.upgrade().map(|l| (r.key, l)))
        .collect()
}

fn deliver<L: ?Sized>(
    list: &Mutex<Vec<Registered<L>>>,
    event_type: &'static str,
    mut notify: impl FnMut(&L) -> Result<(), ListenerError>,
) -> DispatchReport {
    let mut report = DispatchReport::new(event_type);

    for (key, listener) in snapshot(list) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| notify(&*listener)));
        let reason = match outcome {
            Ok(Ok(())) => {
                report.delivered += 1;
                continue;
            }
            Ok(Err(err)) => FailureReason::Failed(err),
            Err(payload) => FailureReason::Panicked(panic_message(payload.as_ref())),
        };

        tracing::warn!(event_type, listener = %key, error = %reason, "listener failed");
        report.failures.push(ListenerDispatchFailure {
            event_type,
            listener: key,
            reason,
        });
    }

    report
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
