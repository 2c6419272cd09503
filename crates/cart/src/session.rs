//! One shopper's storefront session.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use storefront_core::{Currency, SessionId};
use storefront_events::{
    DispatchReport, EventDispatcher, Listener, ListenerKey, Subscription, UserSessionEvent,
};
use storefront_infra::{Facade, PersistenceError};
use storefront_users::{ContactUpdate, ProfileError, User};

use crate::cart::ShoppingCart;

/// Failure to update the logged-in user's profile.
#[derive(Debug, thiserror::Error)]
pub enum ProfileUpdateError {
    #[error("no user is logged in")]
    NotLoggedIn,

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Cart, current user and UI registrations of one session.
///
/// The session's dispatcher only carries this session's events. Components
/// attach their listeners through [`StorefrontSession::attach`]; the guards
/// are released when the session ends or is dropped.
pub struct StorefrontSession {
    id: SessionId,
    dispatcher: Arc<EventDispatcher>,
    cart: ShoppingCart,
    user: RwLock<Option<User>>,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl StorefrontSession {
    pub fn new(currency: Currency) -> Self {
        Self::with_dispatcher(Arc::new(EventDispatcher::new()), currency)
    }

    pub fn with_dispatcher(dispatcher: Arc<EventDispatcher>, currency: Currency) -> Self {
        let id = SessionId::new();
        tracing::debug!(session_id = %id, %currency, "session started");
        Self {
            id,
            cart: ShoppingCart::new(Arc::clone(&dispatcher), currency),
            dispatcher,
            user: RwLock::new(None),
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn cart(&self) -> &ShoppingCart {
        &self.cart
    }

    pub fn dispatcher(&self) -> &Arc<EventDispatcher> {
        &self.dispatcher
    }

    pub fn current_user(&self) -> Option<User> {
        self.user.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.user.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Make `user` the current user. A previously logged-in user is logged
    /// out first.
    pub fn login(&self, user: User) -> DispatchReport {
        let previous = self
            .user
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(user.clone());

        if let Some(previous) = previous {
            self.notify_logout(previous);
        }
        tracing::info!(session_id = %self.id, user_id = %user.id, "user logged in");
        self.dispatcher.dispatch_login(UserSessionEvent::new(user))
    }

    /// Clear the current user. Returns the user that was logged in, if any;
    /// nothing is dispatched when nobody was.
    pub fn logout(&self) -> Option<User> {
        let previous = self
            .user
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()?;

        self.notify_logout(previous.clone());
        Some(previous)
    }

    fn notify_logout(&self, user: User) {
        tracing::info!(session_id = %self.id, user_id = %user.id, "user logged out");
        self.dispatcher.dispatch_logout(UserSessionEvent::new(user));
    }

    /// Validate and apply a contact update to the logged-in user, then store
    /// the profile. Nothing changes if validation or storage fails.
    pub fn update_profile<F: Facade + ?Sized>(
        &self,
        update: ContactUpdate,
        facade: &F,
    ) -> Result<User, ProfileUpdateError> {
        let mut current = self.user.write().unwrap_or_else(PoisonError::into_inner);
        let user = current.as_ref().ok_or(ProfileUpdateError::NotLoggedIn)?;

        let mut updated = user.clone();
        updated.apply_contact_update(update)?;
        facade.store_user(&updated)?;

        tracing::info!(session_id = %self.id, user_id = %updated.id, "profile updated");
        *current = Some(updated.clone());
        Ok(updated)
    }

    /// Register `listener` for the lifetime of this session. Attaching an
    /// already attached listener returns its existing key.
    pub fn attach(&self, listener: &Listener) -> ListenerKey {
        let mut subscriptions = self.subscriptions();
        let held = self
            .dispatcher
            .key_of(listener)
            .filter(|key| subscriptions.iter().any(|s| s.key() == *key));
        if let Some(key) = held {
            return key;
        }
        let subscription = self.dispatcher.subscribe_scoped(listener);
        let key = subscription.key();
        subscriptions.push(subscription);
        key
    }

    /// Release one attached listener. Returns whether it was attached.
    pub fn detach(&self, key: ListenerKey) -> bool {
        let mut subscriptions = self.subscriptions();
        match subscriptions.iter().position(|s| s.key() == key) {
            Some(index) => subscriptions.remove(index).cancel(),
            None => false,
        }
    }

    pub fn attached_count(&self) -> usize {
        self.subscriptions().len()
    }

    /// End the session, releasing every attached listener.
    pub fn end(self) {
        tracing::debug!(
            session_id = %self.id,
            released = self.attached_count(),
            "session ended"
        );
    }

    fn subscriptions(&self) -> MutexGuard<'_, Vec<Subscription>> {
        self.subscriptions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl core::fmt::Debug for StorefrontSession {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StorefrontSession")
            .field("id", &self.id)
            .field("user", &self.current_user())
            .field("cart", &self.cart)
            .finish_non_exhaustive()
    }
}
