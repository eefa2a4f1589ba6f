//! Applies notifications to the store and fans transitions out to subscribers.

use crate::store::SharedStore;
use crate::{DeployableEvent, StoreView, SubscriptionId, Subscribers};
use rsp_core::{DeployableKey, DeployableState, InvalidIdentity, Notification, ServerState};
use std::collections::HashSet;
use tracing::{debug, trace};

/// Single writer of a [`StateStore`].
///
/// Every mutating call takes `&mut self`, so one notification is fully
/// applied (store write plus dispatch) before the next can start. Feed
/// concurrent sources through [`crate::spawn`] to serialize them.
///
/// Reports for a key are applied in call order; a stale report arriving late
/// overwrites a newer one.
#[derive(Debug, Default)]
pub struct Reconciler {
    store: SharedStore,
    subscribers: Subscribers,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read handle onto the store this reconciler writes.
    pub fn view(&self) -> StoreView {
        self.store.view()
    }

    /// Handle for registering handlers from elsewhere.
    pub fn subscribers(&self) -> Subscribers {
        self.subscribers.clone()
    }

    pub fn on_transition<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&DeployableEvent) + Send + Sync + 'static,
    {
        self.subscribers.on_transition(handler)
    }

    pub fn off(&self, id: SubscriptionId) -> bool {
        self.subscribers.off(id)
    }

    /// Apply one notification and return the events it dispatched.
    pub fn apply(
        &mut self,
        notification: Notification,
    ) -> Result<Vec<DeployableEvent>, InvalidIdentity> {
        match notification {
            Notification::DeployableStateChanged(state) => {
                Ok(self.report(state)?.into_iter().collect())
            }
            Notification::DeployableRemoved { server_id, path } => {
                Ok(self.remove(&server_id, &path).into_iter().collect())
            }
            Notification::ServerStateChanged(server_state) => self.apply_server_state(server_state),
            Notification::ServerRemoved { id } => Ok(self.remove_server(&id)),
        }
    }

    /// Record a deployable report, dispatching the resulting event if any.
    pub fn report(
        &mut self,
        state: DeployableState,
    ) -> Result<Option<DeployableEvent>, InvalidIdentity> {
        let key = state.key();
        let Some(transition) = self.store.update(|store| store.upsert(state))? else {
            trace!(%key, "duplicate report ignored");
            return Ok(None);
        };
        let Some(event) = transition.into_event() else {
            trace!(%key, "report changed no status code");
            return Ok(None);
        };
        self.emit(&event);
        Ok(Some(event))
    }

    /// Stop tracking a deployable; absent keys yield `None`.
    pub fn remove(&mut self, server_id: &str, path: &str) -> Option<DeployableEvent> {
        let last_known = self.store.update(|store| store.remove(server_id, path))?;
        let event = DeployableEvent::Removed { last_known };
        self.emit(&event);
        Some(event)
    }

    /// Stop tracking every deployable of a dropped server.
    pub fn remove_server(&mut self, server_id: &str) -> Vec<DeployableEvent> {
        let removed = self.store.update(|store| store.remove_server(server_id));
        debug!(server = server_id, count = removed.len(), "server dropped");
        removed
            .into_iter()
            .map(|last_known| {
                let event = DeployableEvent::Removed { last_known };
                self.emit(&event);
                event
            })
            .collect()
    }

    /// Bring a server's tracked deployables in line with a full snapshot.
    ///
    /// Listed deployables are reported in order; tracked ones missing from
    /// the list are removed afterwards. The snapshot is checked up front and
    /// nothing is applied if any entry has a bad identity.
    pub fn apply_server_state(
        &mut self,
        server_state: ServerState,
    ) -> Result<Vec<DeployableEvent>, InvalidIdentity> {
        let server_id = server_state.server.id.clone();
        if server_id.is_empty() {
            return Err(InvalidIdentity::EmptyServerId);
        }
        let mut listed: HashSet<DeployableKey> = HashSet::new();
        for state in &server_state.deployable_states {
            let key = state.validated_key()?;
            if key.server_id != server_id {
                return Err(InvalidIdentity::ServerMismatch {
                    expected: server_id,
                    found: key.server_id,
                    path: key.path,
                });
            }
            listed.insert(key);
        }

        let mut events = Vec::new();
        for state in server_state.deployable_states {
            events.extend(self.report(state)?);
        }

        let stale: Vec<String> = self
            .view()
            .list_by_server(&server_id)
            .into_iter()
            .filter(|state| !listed.contains(&state.key()))
            .map(|state| state.reference.path)
            .collect();
        for path in stale {
            events.extend(self.remove(&server_id, &path));
        }

        debug!(
            server = %server_id,
            state = %server_state.state,
            publish_state = %server_state.publish_state,
            events = events.len(),
            "server snapshot applied"
        );
        Ok(events)
    }

    fn emit(&self, event: &DeployableEvent) {
        debug!(key = %event.key(), event = ?event.change_kind(), "deployable transition");
        self.subscribers.dispatch(event);
    }
}
