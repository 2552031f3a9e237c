//! Membership registry for live delivery endpoints.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Identity of a registered endpoint. Every registration gets a fresh id,
/// so a reconnecting client never reuses the identity of a closed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a connection on either transport.
///
/// Transitions only move forward: `Connecting -> Active -> Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Connecting,
    Active,
    Closed,
}

impl ConnectionState {
    /// Whether the connection can still receive events.
    pub fn is_live(self) -> bool {
        matches!(self, ConnectionState::Active)
    }

    /// Apply a transition, ignoring any attempt to move backwards.
    pub fn advance(&mut self, next: ConnectionState) {
        let rank = |s: ConnectionState| match s {
            ConnectionState::Connecting => 0,
            ConnectionState::Active => 1,
            ConnectionState::Closed => 2,
        };
        if rank(next) > rank(*self) {
            *self = next;
        }
    }
}

/// Set of live endpoints for one transport.
///
/// Iteration always works on a point-in-time copy of the membership, so
/// endpoints registered or removed while a broadcast is running never
/// disturb it.
#[derive(Debug)]
pub struct Registry<T> {
    members: RwLock<HashMap<SubscriberId, T>>,
}

impl<T> Registry<T> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            members: RwLock::new(HashMap::new()),
        }
    }

    /// Add an endpoint and return its handle.
    pub fn register(&self, endpoint: T) -> SubscriberId {
        let id = SubscriberId::new();
        self.members.write().insert(id, endpoint);
        id
    }

    /// Add an endpoint unless the registry already holds `limit` members.
    pub fn register_bounded(&self, endpoint: T, limit: usize) -> Option<SubscriberId> {
        let mut members = self.members.write();
        if members.len() >= limit {
            return None;
        }
        let id = SubscriberId::new();
        members.insert(id, endpoint);
        Some(id)
    }

    /// Remove an endpoint. Removing an absent handle is a no-op.
    pub fn unregister(&self, id: SubscriberId) -> Option<T> {
        self.members.write().remove(&id)
    }

    /// Check whether a handle is still registered.
    pub fn contains(&self, id: SubscriberId) -> bool {
        self.members.read().contains_key(&id)
    }

    /// Number of registered endpoints.
    pub fn len(&self) -> usize {
        self.members.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.read().is_empty()
    }

    /// Remove and return every endpoint.
    pub fn drain(&self) -> Vec<(SubscriberId, T)> {
        self.members.write().drain().collect()
    }
}

impl<T: Clone> Registry<T> {
    /// Copy of the current membership.
    pub fn snapshot(&self) -> Vec<(SubscriberId, T)> {
        self.members
            .read()
            .iter()
            .map(|(id, endpoint)| (*id, endpoint.clone()))
            .collect()
    }

    /// Visit every member of a snapshot taken at call time.
    ///
    /// The lock is released before `f` runs, so `f` may register or
    /// unregister endpoints freely.
    pub fn for_each_live<F>(&self, mut f: F)
    where
        F: FnMut(SubscriberId, &T),
    {
        for (id, endpoint) in self.snapshot() {
            f(id, &endpoint);
        }
    }
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_register_unregister() {
        let registry = Registry::new();
        let id = registry.register("a");

        assert!(registry.contains(id));
        assert_eq!(registry.len(), 1);

        assert_eq!(registry.unregister(id), Some("a"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unregister_absent_is_noop() {
        let registry: Registry<u32> = Registry::new();
        let id = registry.register(1);
        registry.unregister(id);

        assert_eq!(registry.unregister(id), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_ids_are_fresh() {
        let registry = Registry::new();
        let first = registry.register(1);
        registry.unregister(first);
        let second = registry.register(1);

        assert_ne!(first, second);
    }

    #[test]
    fn test_register_bounded() {
        let registry = Registry::new();
        assert!(registry.register_bounded(1, 2).is_some());
        assert!(registry.register_bounded(2, 2).is_some());
        assert!(registry.register_bounded(3, 2).is_none());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_mutation_during_iteration() {
        let registry = Registry::new();
        let ids: Vec<_> = (0..5).map(|i| registry.register(i)).collect();

        let mut visited = Vec::new();
        registry.for_each_live(|_, value| {
            visited.push(*value);
            // Remove everything and add a newcomer mid-iteration.
            for other in &ids {
                registry.unregister(*other);
            }
            registry.register(100);
        });

        visited.sort();
        assert_eq!(visited, vec![0, 1, 2, 3, 4]);
        assert_eq!(registry.len(), 5);
    }

    #[test]
    fn test_drain() {
        let registry = Registry::new();
        registry.register(1);
        registry.register(2);

        let drained = registry.drain();
        assert_eq!(drained.len(), 2);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_connection_state_is_monotonic() {
        let mut state = ConnectionState::Connecting;
        assert!(!state.is_live());

        state.advance(ConnectionState::Active);
        assert!(state.is_live());

        state.advance(ConnectionState::Closed);
        state.advance(ConnectionState::Active);
        assert_eq!(state, ConnectionState::Closed);
    }

    #[test]
    fn test_concurrent_membership() {
        let registry = Arc::new(Registry::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    let mut kept = Vec::new();
                    for i in 0..200 {
                        let id = registry.register(t * 1000 + i);
                        if i % 2 == 0 {
                            registry.unregister(id);
                        } else {
                            kept.push(id);
                        }
                        registry.for_each_live(|_, _| {});
                    }
                    kept
                })
            })
            .collect();

        let expected: HashSet<_> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        let actual: HashSet<_> = registry.snapshot().into_iter().map(|(id, _)| id).collect();

        assert_eq!(actual, expected);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Register,
        Unregister(usize),
        Broadcast,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Register),
            (0usize..64).prop_map(Op::Unregister),
            Just(Op::Broadcast),
        ]
    }

    proptest! {
        /// Property: final membership is exactly the registered-and-not-removed set.
        #[test]
        fn prop_membership_matches_model(ops in prop::collection::vec(op_strategy(), 0..200)) {
            let registry = Registry::new();
            let mut issued = Vec::new();
            let mut live = HashSet::new();

            for op in ops {
                match op {
                    Op::Register => {
                        let id = registry.register(issued.len());
                        issued.push(id);
                        live.insert(id);
                    }
                    Op::Unregister(i) => {
                        if let Some(id) = issued.get(i % issued.len().max(1)) {
                            registry.unregister(*id);
                            live.remove(id);
                        }
                    }
                    Op::Broadcast => {
                        let mut seen = 0;
                        registry.for_each_live(|_, _| seen += 1);
                        prop_assert_eq!(seen, live.len());
                    }
                }
            }

            let actual: HashSet<_> = registry.snapshot().into_iter().map(|(id, _)| id).collect();
            prop_assert_eq!(actual, live);
        }
    }
}
