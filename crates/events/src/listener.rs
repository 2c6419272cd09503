//! Listener contracts, one typed callback shape per event family.

use std::sync::Arc;

use thiserror::Error;

use crate::event::{CartUpdatedEvent, EventFamily, UserSessionEvent};

/// Failure raised by a listener while handling an event.
///
/// The dispatcher reports it and keeps delivering; it never reaches the code
/// that triggered the dispatch.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ListenerError(String);

impl ListenerError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Observer of cart changes (cart summary, item list, header badge, ...).
pub trait CartUpdateListener: Send + Sync {
    fn on_cart_updated(&self, event: &CartUpdatedEvent) -> Result<(), ListenerError>;
}

impl<F> CartUpdateListener for F
where
    F: Fn(&CartUpdatedEvent) -> Result<(), ListenerError> + Send + Sync,
{
    fn on_cart_updated(&self, event: &CartUpdatedEvent) -> Result<(), ListenerError> {
        self(event)
    }
}

/// Observer of login/logout.
pub trait UserSessionListener: Send + Sync {
    fn on_login(&self, event: &UserSessionEvent) -> Result<(), ListenerError>;

    fn on_logout(&self, event: &UserSessionEvent) -> Result<(), ListenerError>;
}

/// A listener tagged with the family it listens to.
#[derive(Clone)]
pub enum Listener {
    Cart(Arc<dyn CartUpdateListener>),
    Session(Arc<dyn UserSessionListener>),
}

impl Listener {
    pub fn cart<L: CartUpdateListener + 'static>(listener: Arc<L>) -> Self {
        Listener::Cart(listener)
    }

    pub fn session<L: UserSessionListener + 'static>(listener: Arc<L>) -> Self {
        Listener::Session(listener)
    }

    pub fn family(&self) -> EventFamily {
        match self {
            Listener::Cart(_) => EventFamily::CartUpdated,
            Listener::Session(_) => EventFamily::UserSession,
        }
    }
}

impl core::fmt::Debug for Listener {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("Listener").field(&self.family()).finish()
    }
}

/// Handle identifying one registration on a dispatcher.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ListenerKey(pub(crate) u64);

impl core::fmt::Display for ListenerKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}
