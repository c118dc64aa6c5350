//! Relationships between recognizers.
//!
//! Two kinds of edges exist. Simultaneous execution is symmetric and may name
//! every gesture at once through [`Peer::All`]. Fail dependencies are directed:
//! `require_failure(a, b)` means `a` may not end until `b` has failed. The
//! inverse of that edge (`b`'s dependents) is indexed so a failing recognizer
//! can notify everything waiting on it.

use crate::arena::GestureId;
use std::collections::{BTreeMap, BTreeSet};

/// Target of a simultaneous-execution edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Peer {
    /// Every other recognizer.
    All,
    /// One recognizer.
    Gesture(GestureId),
}

/// Relationship graph owned by the arena.
///
/// Ordered collections keep cascades deterministic.
#[derive(Debug, Clone, Default)]
pub struct RelationGraph {
    simultaneous: BTreeMap<GestureId, BTreeSet<Peer>>,
    requires_failure_of: BTreeMap<GestureId, BTreeSet<GestureId>>,
    dependents: BTreeMap<GestureId, BTreeSet<GestureId>>,
    failed: BTreeMap<GestureId, BTreeSet<GestureId>>,
}

impl RelationGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow `a` to execute alongside `peer`. Symmetric for concrete peers.
    pub fn allow_simultaneous(&mut self, a: GestureId, peer: Peer) {
        self.simultaneous.entry(a).or_default().insert(peer);
        if let Peer::Gesture(b) = peer {
            self.simultaneous
                .entry(b)
                .or_default()
                .insert(Peer::Gesture(a));
        }
    }

    /// Remove a simultaneous-execution edge in both directions.
    pub fn disallow_simultaneous(&mut self, a: GestureId, peer: Peer) {
        remove_from(&mut self.simultaneous, a, &peer);
        if let Peer::Gesture(b) = peer {
            remove_from(&mut self.simultaneous, b, &Peer::Gesture(a));
        }
    }

    /// Whether `a` and `b` may be active at the same time.
    #[must_use]
    pub fn allows_together(&self, a: GestureId, b: GestureId) -> bool {
        let allows = |x: GestureId, y: GestureId| {
            self.simultaneous
                .get(&x)
                .is_some_and(|peers| peers.contains(&Peer::All) || peers.contains(&Peer::Gesture(y)))
        };
        allows(a, b) || allows(b, a)
    }

    /// Make `a` wait for `b` to fail before it may end.
    pub fn require_failure(&mut self, a: GestureId, b: GestureId) {
        self.requires_failure_of.entry(a).or_default().insert(b);
        self.dependents.entry(b).or_default().insert(a);
    }

    /// Drop the requirement that `b` fails before `a` ends.
    pub fn remove_required_failure(&mut self, a: GestureId, b: GestureId) {
        remove_from(&mut self.requires_failure_of, a, &b);
        remove_from(&mut self.dependents, b, &a);
    }

    /// Drop every fail requirement of `a`.
    pub fn clear_required_failures(&mut self, a: GestureId) {
        if let Some(required) = self.requires_failure_of.remove(&a) {
            for b in required {
                remove_from(&mut self.dependents, b, &a);
            }
        }
    }

    /// Recognizers `a` waits on.
    pub fn required_failures(&self, a: GestureId) -> impl Iterator<Item = GestureId> + '_ {
        self.requires_failure_of
            .get(&a)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Recognizers waiting on `b` to fail, in handle order.
    #[must_use]
    pub fn dependents(&self, b: GestureId) -> Vec<GestureId> {
        self.dependents
            .get(&b)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Note that `failed` failed during `a`'s current attempt.
    pub fn record_failure(&mut self, a: GestureId, failed: GestureId) {
        self.failed.entry(a).or_default().insert(failed);
    }

    /// Whether every recognizer `a` waits on has failed this attempt.
    #[must_use]
    pub fn all_required_failed(&self, a: GestureId) -> bool {
        let failed = self.failed.get(&a);
        self.required_failures(a)
            .all(|b| failed.is_some_and(|set| set.contains(&b)))
    }

    /// Forget the failures recorded for `a`'s attempt.
    pub fn clear_failures(&mut self, a: GestureId) {
        self.failed.remove(&a);
    }

    /// Remove every edge that touches `id`.
    pub fn remove(&mut self, id: GestureId) {
        if let Some(peers) = self.simultaneous.remove(&id) {
            for peer in peers {
                if let Peer::Gesture(other) = peer {
                    remove_from(&mut self.simultaneous, other, &Peer::Gesture(id));
                }
            }
        }
        self.clear_required_failures(id);
        if let Some(dependents) = self.dependents.remove(&id) {
            for a in dependents {
                remove_from(&mut self.requires_failure_of, a, &id);
            }
        }
        self.failed.remove(&id);
        for set in self.failed.values_mut() {
            set.remove(&id);
        }
    }
}

fn remove_from<K: Ord, V: Ord>(map: &mut BTreeMap<K, BTreeSet<V>>, key: K, value: &V) {
    if let Some(set) = map.get_mut(&key) {
        set.remove(value);
        if set.is_empty() {
            map.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(index: u32) -> GestureId {
        GestureId::from_raw_parts(index, 0)
    }

    #[test]
    fn test_simultaneous_is_symmetric() {
        let mut graph = RelationGraph::new();
        graph.allow_simultaneous(id(0), Peer::Gesture(id(1)));
        assert!(graph.allows_together(id(0), id(1)));
        assert!(graph.allows_together(id(1), id(0)));
        assert!(!graph.allows_together(id(0), id(2)));

        graph.disallow_simultaneous(id(1), Peer::Gesture(id(0)));
        assert!(!graph.allows_together(id(0), id(1)));
    }

    #[test]
    fn test_simultaneous_wildcard() {
        let mut graph = RelationGraph::new();
        graph.allow_simultaneous(id(3), Peer::All);
        assert!(graph.allows_together(id(3), id(9)));
        assert!(graph.allows_together(id(9), id(3)));
        assert!(!graph.allows_together(id(8), id(9)));

        graph.disallow_simultaneous(id(3), Peer::All);
        assert!(!graph.allows_together(id(3), id(9)));
    }

    #[test]
    fn test_fail_dependency_bookkeeping() {
        let mut graph = RelationGraph::new();
        graph.require_failure(id(0), id(1));
        graph.require_failure(id(0), id(2));
        assert_eq!(graph.dependents(id(1)), vec![id(0)]);
        assert!(!graph.all_required_failed(id(0)));

        graph.record_failure(id(0), id(1));
        assert!(!graph.all_required_failed(id(0)));
        graph.record_failure(id(0), id(2));
        assert!(graph.all_required_failed(id(0)));

        graph.clear_failures(id(0));
        assert!(!graph.all_required_failed(id(0)));
    }

    #[test]
    fn test_no_requirements_means_all_failed() {
        let graph = RelationGraph::new();
        assert!(graph.all_required_failed(id(5)));
        assert!(graph.dependents(id(5)).is_empty());
    }

    #[test]
    fn test_remove_required_failure() {
        let mut graph = RelationGraph::new();
        graph.require_failure(id(0), id(1));
        graph.remove_required_failure(id(0), id(1));
        assert!(graph.dependents(id(1)).is_empty());
        assert_eq!(graph.required_failures(id(0)).count(), 0);

        graph.require_failure(id(0), id(1));
        graph.require_failure(id(0), id(2));
        graph.clear_required_failures(id(0));
        assert!(graph.dependents(id(1)).is_empty());
        assert!(graph.dependents(id(2)).is_empty());
    }

    #[test]
    fn test_remove_clears_every_edge() {
        let mut graph = RelationGraph::new();
        graph.allow_simultaneous(id(0), Peer::Gesture(id(1)));
        graph.require_failure(id(2), id(0));
        graph.require_failure(id(0), id(3));
        graph.record_failure(id(2), id(0));

        graph.remove(id(0));
        assert!(!graph.allows_together(id(1), id(0)));
        assert_eq!(graph.required_failures(id(2)).count(), 0);
        assert!(graph.dependents(id(3)).is_empty());
        assert!(graph.all_required_failed(id(2)));
    }
}
