//! Update subscriptions for views.
//!
//! A view keeps a `SubscriptionManager`; every callback registered with
//! `on_update` is invoked after each batch that changed the view.

use crate::update::ViewUpdate;
use hashbrown::HashMap;

/// Unique identifier for a subscription.
pub type SubscriptionId = u64;

/// Callback type for view update notifications. Callbacks run on the table
/// worker, so they must be `Send`.
pub type UpdateCallback = Box<dyn Fn(&ViewUpdate) + Send>;

/// A subscription to view updates.
pub struct Subscription {
    id: SubscriptionId,
    callback: UpdateCallback,
    active: bool,
}

impl Subscription {
    pub fn new<F>(id: SubscriptionId, callback: F) -> Self
    where
        F: Fn(&ViewUpdate) + Send + 'static,
    {
        Self {
            id,
            callback: Box::new(callback),
            active: true,
        }
    }

    #[inline]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[inline]
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Invokes the callback unless the subscription was deactivated.
    pub fn notify(&self, update: &ViewUpdate) {
        if self.active {
            (self.callback)(update);
        }
    }
}

/// Subscriptions of one view.
pub struct SubscriptionManager {
    subscriptions: HashMap<SubscriptionId, Subscription>,
    next_id: SubscriptionId,
}

impl Default for SubscriptionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriptionManager {
    pub fn new() -> Self {
        Self {
            subscriptions: HashMap::new(),
            next_id: 1,
        }
    }

    /// Subscribes to updates and returns the subscription id.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: Fn(&ViewUpdate) + Send + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.subscriptions.insert(id, Subscription::new(id, callback));
        id
    }

    /// Returns true if the subscription was found and removed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscriptions.remove(&id).is_some()
    }

    /// Notifies every active subscription, in subscription order.
    pub fn notify_all(&self, update: &ViewUpdate) {
        let mut ids: Vec<SubscriptionId> = self.subscriptions.keys().copied().collect();
        ids.sort_unstable();
        for id in ids {
            if let Some(sub) = self.subscriptions.get(&id) {
                sub.notify(update);
            }
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }
}
