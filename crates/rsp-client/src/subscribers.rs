//! Transition subscriptions.

use crate::DeployableEvent;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Handler = Arc<dyn Fn(&DeployableEvent) + Send + Sync>;

/// Identifies one registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: Vec<(SubscriptionId, Handler)>,
}

/// Shared list of transition handlers, called in registration order.
///
/// The registry lock is never held while a handler runs, so handlers may
/// subscribe or unsubscribe from inside a callback.
#[derive(Clone, Default)]
pub struct Subscribers {
    inner: Arc<Mutex<Registry>>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for every future event.
    pub fn on_transition<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&DeployableEvent) + Send + Sync + 'static,
    {
        let mut registry = self.lock();
        let id = SubscriptionId(registry.next_id);
        registry.next_id += 1;
        registry.handlers.push((id, Arc::new(handler)));
        id
    }

    /// Unregister a handler. Returns `false` if it was not registered.
    pub fn off(&self, id: SubscriptionId) -> bool {
        let mut registry = self.lock();
        let before = registry.handlers.len();
        registry.handlers.retain(|(existing, _)| *existing != id);
        registry.handlers.len() != before
    }

    pub fn len(&self) -> usize {
        self.lock().handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().handlers.is_empty()
    }

    /// Call every handler with `event`.
    ///
    /// A handler removed before its turn in this dispatch is skipped.
    pub(crate) fn dispatch(&self, event: &DeployableEvent) {
        let handlers: Vec<(SubscriptionId, Handler)> = self.lock().handlers.clone();
        for (id, handler) in handlers {
            if !self.is_registered(id) {
                continue;
            }
            handler(event);
        }
    }

    fn is_registered(&self, id: SubscriptionId) -> bool {
        self.lock().handlers.iter().any(|(existing, _)| *existing == id)
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("handlers", &self.len())
            .finish()
    }
}
