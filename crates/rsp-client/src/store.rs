//! Latest known state per deployable.

use crate::Transition;
use rsp_core::{DeployableKey, DeployableState, InvalidIdentity};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Clone)]
struct Entry {
    /// Position of the key's first insertion.
    seq: u64,
    state: DeployableState,
}

/// Map from `(server id, path)` to the latest [`DeployableState`].
///
/// Reads return copies. Listing order is the order in which keys were first
/// inserted; replacing an entry keeps its position.
#[derive(Debug, Clone, Default)]
pub struct StateStore {
    entries: HashMap<DeployableKey, Entry>,
    next_seq: u64,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for the snapshot's key.
    ///
    /// Returns `Ok(None)` when the stored snapshot is already identical.
    /// Malformed identities are rejected and leave the store unchanged.
    pub fn upsert(
        &mut self,
        state: DeployableState,
    ) -> Result<Option<Transition>, InvalidIdentity> {
        let key = state.validated_key()?;
        match self.entries.get_mut(&key) {
            Some(entry) if entry.state == state => Ok(None),
            Some(entry) => {
                let previous = std::mem::replace(&mut entry.state, state.clone());
                Ok(Some(Transition {
                    previous: Some(previous),
                    current: state,
                }))
            }
            None => {
                let seq = self.next_seq;
                self.next_seq += 1;
                self.entries.insert(
                    key,
                    Entry {
                        seq,
                        state: state.clone(),
                    },
                );
                Ok(Some(Transition {
                    previous: None,
                    current: state,
                }))
            }
        }
    }

    pub fn get(&self, server_id: &str, path: &str) -> Option<DeployableState> {
        self.entries
            .get(&DeployableKey::new(server_id, path))
            .map(|entry| entry.state.clone())
    }

    /// Delete an entry and hand back its last snapshot.
    pub fn remove(&mut self, server_id: &str, path: &str) -> Option<DeployableState> {
        self.entries
            .remove(&DeployableKey::new(server_id, path))
            .map(|entry| entry.state)
    }

    /// Snapshot of one server's deployables in insertion order.
    pub fn list_by_server(&self, server_id: &str) -> Vec<DeployableState> {
        self.ordered(|key| key.server_id == server_id)
            .into_iter()
            .map(|(_, entry)| entry.state.clone())
            .collect()
    }

    /// Delete every entry of a server, returning them in insertion order.
    pub fn remove_server(&mut self, server_id: &str) -> Vec<DeployableState> {
        let keys: Vec<DeployableKey> = self
            .ordered(|key| key.server_id == server_id)
            .into_iter()
            .map(|(key, _)| key.clone())
            .collect();
        keys.iter()
            .filter_map(|key| self.entries.remove(key))
            .map(|entry| entry.state)
            .collect()
    }

    /// Distinct server ids, ordered by their first tracked deployable.
    pub fn servers(&self) -> Vec<String> {
        let mut servers: Vec<String> = Vec::new();
        for (key, _) in self.ordered(|_| true) {
            if !servers.contains(&key.server_id) {
                servers.push(key.server_id.clone());
            }
        }
        servers
    }

    /// Every tracked snapshot in insertion order.
    pub fn snapshot(&self) -> Vec<DeployableState> {
        self.ordered(|_| true)
            .into_iter()
            .map(|(_, entry)| entry.state.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn ordered(&self, filter: impl Fn(&DeployableKey) -> bool) -> Vec<(&DeployableKey, &Entry)> {
        let mut matches: Vec<_> = self.entries.iter().filter(|(key, _)| filter(*key)).collect();
        matches.sort_by_key(|(_, entry)| entry.seq);
        matches
    }
}

/// Store published as immutable snapshots.
///
/// Readers clone the current `Arc` and work on it without the lock. The
/// writer copies the map only while some reader still holds an older snapshot.
#[derive(Debug, Clone, Default)]
pub(crate) struct SharedStore {
    inner: Arc<RwLock<Arc<StateStore>>>,
}

impl SharedStore {
    pub(crate) fn view(&self) -> StoreView {
        StoreView {
            shared: self.clone(),
        }
    }

    pub(crate) fn update<T>(&self, f: impl FnOnce(&mut StateStore) -> T) -> T {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(Arc::make_mut(&mut guard))
    }

    fn current(&self) -> Arc<StateStore> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }
}

/// Cloneable read-only handle onto a shared store.
///
/// Each call works on the snapshot current at call time and returns copies.
#[derive(Debug, Clone, Default)]
pub struct StoreView {
    shared: SharedStore,
}

impl StoreView {
    pub fn get(&self, server_id: &str, path: &str) -> Option<DeployableState> {
        self.read(|store| store.get(server_id, path))
    }

    pub fn list_by_server(&self, server_id: &str) -> Vec<DeployableState> {
        self.read(|store| store.list_by_server(server_id))
    }

    pub fn servers(&self) -> Vec<String> {
        self.read(StateStore::servers)
    }

    pub fn snapshot(&self) -> Vec<DeployableState> {
        self.read(StateStore::snapshot)
    }

    pub fn len(&self) -> usize {
        self.read(StateStore::len)
    }

    pub fn is_empty(&self) -> bool {
        self.read(StateStore::is_empty)
    }

    fn read<T>(&self, f: impl FnOnce(&StateStore) -> T) -> T {
        f(&self.shared.current())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsp_core::{DeployableReference, PublishState, RunState, ServerHandle, ServerType};

    fn state(server: &str, path: &str, run: RunState) -> DeployableState {
        DeployableState::new(
            ServerHandle::new(server, ServerType::new("wildfly", "WildFly", "")),
            DeployableReference::new(path.trim_start_matches('/'), path),
            run,
            PublishState::None,
        )
    }

    #[test]
    fn upsert_then_get() {
        let mut store = StateStore::new();
        let s = state("srv1", "/app1", RunState::Started);
        let transition = store.upsert(s.clone()).unwrap().unwrap();
        assert_eq!(transition.previous, None);
        assert_eq!(store.get("srv1", "/app1"), Some(s));
        assert_eq!(store.get("srv1", "/other"), None);
    }

    #[test]
    fn identical_upsert_is_noop() {
        let mut store = StateStore::new();
        let s = state("srv1", "/app1", RunState::Started);
        store.upsert(s.clone()).unwrap();
        assert_eq!(store.upsert(s.clone()).unwrap(), None);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("srv1", "/app1"), Some(s));
    }

    #[test]
    fn replacement_reports_previous() {
        let mut store = StateStore::new();
        let first = state("srv1", "/app1", RunState::Starting);
        let second = state("srv1", "/app1", RunState::Started);
        store.upsert(first.clone()).unwrap();
        let transition = store.upsert(second.clone()).unwrap().unwrap();
        assert_eq!(transition.previous, Some(first));
        assert_eq!(transition.current, second);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn invalid_identity_leaves_store_unchanged() {
        let mut store = StateStore::new();
        store.upsert(state("srv1", "/app1", RunState::Started)).unwrap();

        let err = store.upsert(state("", "/app2", RunState::Started)).unwrap_err();
        assert_eq!(err, InvalidIdentity::EmptyServerId);
        let err = store.upsert(state("srv1", "", RunState::Started)).unwrap_err();
        assert_eq!(err, InvalidIdentity::EmptyPath("srv1".into()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn same_path_on_different_servers_are_distinct() {
        let mut store = StateStore::new();
        store.upsert(state("srv1", "/app", RunState::Started)).unwrap();
        store.upsert(state("srv2", "/app", RunState::Stopped)).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("srv2", "/app").unwrap().state, RunState::Stopped);
    }

    #[test]
    fn list_keeps_first_insertion_order() {
        let mut store = StateStore::new();
        store.upsert(state("srv1", "/b", RunState::Started)).unwrap();
        store.upsert(state("srv2", "/x", RunState::Started)).unwrap();
        store.upsert(state("srv1", "/a", RunState::Started)).unwrap();
        store.upsert(state("srv1", "/b", RunState::Stopped)).unwrap();

        let paths: Vec<String> = store
            .list_by_server("srv1")
            .into_iter()
            .map(|s| s.reference.path)
            .collect();
        assert_eq!(paths, ["/b", "/a"]);
        assert_eq!(store.servers(), ["srv1", "srv2"]);
        assert!(store.list_by_server("srv3").is_empty());
    }

    #[test]
    fn listing_is_a_detached_snapshot() {
        let mut store = StateStore::new();
        store.upsert(state("srv1", "/a", RunState::Started)).unwrap();
        let listing = store.list_by_server("srv1");
        store.upsert(state("srv1", "/b", RunState::Started)).unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(store.list_by_server("srv1").len(), 2);
    }

    #[test]
    fn remove_returns_last_known() {
        let mut store = StateStore::new();
        let s = state("srv1", "/app1", RunState::Stopped);
        store.upsert(s.clone()).unwrap();
        assert_eq!(store.remove("srv1", "/app1"), Some(s));
        assert_eq!(store.remove("srv1", "/app1"), None);
        assert_eq!(store.get("srv1", "/app1"), None);
        assert!(store.is_empty());
    }

    #[test]
    fn remove_server_drops_only_that_server() {
        let mut store = StateStore::new();
        store.upsert(state("srv1", "/a", RunState::Started)).unwrap();
        store.upsert(state("srv2", "/a", RunState::Started)).unwrap();
        store.upsert(state("srv1", "/b", RunState::Started)).unwrap();

        let removed: Vec<String> = store
            .remove_server("srv1")
            .into_iter()
            .map(|s| s.reference.path)
            .collect();
        assert_eq!(removed, ["/a", "/b"]);
        assert_eq!(store.servers(), ["srv2"]);
    }

    #[test]
    fn reinserted_key_moves_to_the_end() {
        let mut store = StateStore::new();
        store.upsert(state("srv1", "/a", RunState::Started)).unwrap();
        store.upsert(state("srv1", "/b", RunState::Started)).unwrap();
        store.remove("srv1", "/a");
        store.upsert(state("srv1", "/a", RunState::Started)).unwrap();
        let paths: Vec<String> = store
            .snapshot()
            .into_iter()
            .map(|s| s.reference.path)
            .collect();
        assert_eq!(paths, ["/b", "/a"]);
    }

    #[test]
    fn held_snapshot_does_not_block_or_see_writes() {
        let shared = SharedStore::default();
        let view = shared.view();
        shared
            .update(|store| store.upsert(state("srv1", "/a", RunState::Started)))
            .unwrap();

        let held = shared.current();
        shared
            .update(|store| store.upsert(state("srv1", "/b", RunState::Started)))
            .unwrap();
        shared.update(|store| store.remove("srv1", "/a"));

        assert_eq!(held.len(), 1);
        assert!(held.get("srv1", "/a").is_some());
        assert_eq!(view.len(), 1);
        assert!(view.get("srv1", "/b").is_some());
    }
}
