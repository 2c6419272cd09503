use std::sync::Arc;

use chrono::{DateTime, Utc};

use storefront_orders::Order;
use storefront_users::User;

/// A storefront notification.
///
/// Events are **immutable** facts: they describe a state that already exists
/// when the event is delivered.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name/type identifier (e.g. "cart.updated").
    fn event_type(&self) -> &'static str;

    /// When the event occurred.
    fn occurred_at(&self) -> DateTime<Utc>;
}

/// The closed set of event families a listener can register for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EventFamily {
    CartUpdated,
    UserSession,
}

impl core::fmt::Display for EventFamily {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            EventFamily::CartUpdated => f.write_str("cart-updated"),
            EventFamily::UserSession => f.write_str("user-session"),
        }
    }
}

/// The cart changed. Carries the order as it is after the change.
///
/// The snapshot is shared, not copied per listener. It carries no history:
/// listeners re-derive everything from the order itself.
#[derive(Debug, Clone)]
pub struct CartUpdatedEvent {
    order: Arc<Order>,
    occurred_at: DateTime<Utc>,
}

impl CartUpdatedEvent {
    pub fn new(order: Arc<Order>) -> Self {
        Self {
            order,
            occurred_at: Utc::now(),
        }
    }

    pub fn order(&self) -> &Order {
        &self.order
    }
}

impl Event for CartUpdatedEvent {
    fn event_type(&self) -> &'static str {
        "cart.updated"
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}

/// A user logged in to or out of a session.
#[derive(Debug, Clone)]
pub struct UserSessionEvent {
    user: User,
    occurred_at: DateTime<Utc>,
}

impl UserSessionEvent {
    pub fn new(user: User) -> Self {
        Self {
            user,
            occurred_at: Utc::now(),
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }
}

/// Every event the dispatcher can deliver.
#[derive(Debug, Clone)]
pub enum StorefrontEvent {
    CartUpdated(CartUpdatedEvent),
    Login(UserSessionEvent),
    Logout(UserSessionEvent),
}

impl StorefrontEvent {
    pub fn family(&self) -> EventFamily {
        match self {
            StorefrontEvent::CartUpdated(_) => EventFamily::CartUpdated,
            StorefrontEvent::Login(_) | StorefrontEvent::Logout(_) => EventFamily::UserSession,
        }
    }
}

impl Event for StorefrontEvent {
    fn event_type(&self) -> &'static str {
        match self {
            StorefrontEvent::CartUpdated(e) => e.event_type(),
            StorefrontEvent::Login(_) => "session.login",
            StorefrontEvent::Logout(_) => "session.logout",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            StorefrontEvent::CartUpdated(e) => e.occurred_at,
            StorefrontEvent::Login(e) => e.occurred_at,
            StorefrontEvent::Logout(e) => e.occurred_at,
        }
    }
}
