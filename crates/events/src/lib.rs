//! Storefront change notifications.
//!
//! Two event families exist: cart updates and user session changes. An
//! [`EventDispatcher`] is constructed explicitly and shared by `Arc` with every
//! component that publishes or subscribes; there is no process-wide instance.

pub mod dispatcher;
pub mod event;
pub mod listener;
pub mod subscription;

pub use dispatcher::{DispatchReport, EventDispatcher, FailureReason, ListenerDispatchFailure};
pub use event::{CartUpdatedEvent, Event, EventFamily, StorefrontEvent, UserSessionEvent};
pub use listener::{CartUpdateListener, Listener, ListenerError, ListenerKey, UserSessionListener};
pub use subscription::Subscription;
