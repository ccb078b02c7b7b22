//! Registry of live connections.
//!
//! The registry holds bookkeeping only: each entry keeps the peer address
//! and the connection's shutdown token, never the connection itself. Every
//! mutation and every traversal holds the single registry mutex.

use std::{collections::HashMap, net::SocketAddr, sync::Arc};

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::connection::ConnectionId;

/// Bookkeeping kept for one live connection.
#[derive(Clone, Debug)]
pub(crate) struct RegistryEntry {
    pub(crate) peer: Option<SocketAddr>,
    pub(crate) shutdown: CancellationToken,
}

/// Shared, mutex-guarded map of live connections.
#[derive(Clone, Debug, Default)]
pub struct Registry(Arc<Mutex<HashMap<ConnectionId, RegistryEntry>>>);

impl Registry {
    /// Insert an entry, returning the new size, or `None` if `id` is
    /// already registered.
    pub(crate) fn insert(&self, id: ConnectionId, entry: RegistryEntry) -> Option<usize> {
        let mut map = self.0.lock();
        if map.contains_key(&id) {
            return None;
        }
        map.insert(id, entry);
        Some(map.len())
    }

    /// Remove an entry, returning the new size and the removed entry, or
    /// `None` if `id` was not registered.
    pub(crate) fn remove(&self, id: ConnectionId) -> Option<(usize, RegistryEntry)> {
        let mut map = self.0.lock();
        map.remove(&id).map(|entry| (map.len(), entry))
    }

    /// Request shutdown of every live connection, returning how many were
    /// signalled.
    pub(crate) fn cancel_all(&self) -> usize {
        let map = self.0.lock();
        for entry in map.values() {
            entry.shutdown.cancel();
        }
        map.len()
    }

    /// Number of live connections.
    #[must_use]
    pub fn len(&self) -> usize { self.0.lock().len() }

    /// Returns `true` when no connection is live.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.0.lock().is_empty() }

    /// Returns `true` while `id` is registered.
    #[must_use]
    pub fn contains(&self, id: ConnectionId) -> bool { self.0.lock().contains_key(&id) }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use proptest::{
        collection::vec,
        prelude::{Just, Strategy, any},
        prop_assert,
        prop_assert_eq,
        test_runner::{Config, TestRunner},
    };

    use super::*;

    fn size_after_remove(registry: &Registry, id: ConnectionId) -> Option<usize> {
        registry.remove(id).map(|(size, _)| size)
    }

    fn entry() -> RegistryEntry {
        RegistryEntry {
            peer: None,
            shutdown: CancellationToken::new(),
        }
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let registry = Registry::default();
        let id = ConnectionId::new(7);
        assert_eq!(registry.insert(id, entry()), Some(1));
        assert_eq!(registry.insert(id, entry()), None);
        assert_eq!(size_after_remove(&registry, id), Some(0));
        assert_eq!(size_after_remove(&registry, id), None);
    }

    #[test]
    fn removal_returns_the_recorded_peer() {
        let registry = Registry::default();
        let id = ConnectionId::new(1);
        let peer: SocketAddr = "127.0.0.1:7000".parse().expect("valid address");
        registry.insert(
            id,
            RegistryEntry {
                peer: Some(peer),
                shutdown: CancellationToken::new(),
            },
        );

        let (size, removed) = registry.remove(id).expect("registered");
        assert_eq!(size, 0);
        assert_eq!(removed.peer, Some(peer));
    }

    #[test]
    fn cancel_all_signals_every_entry() {
        let registry = Registry::default();
        let tokens: Vec<_> = (0..3)
            .map(|n| {
                let e = entry();
                let token = e.shutdown.clone();
                registry.insert(ConnectionId::new(n), e);
                token
            })
            .collect();

        assert_eq!(registry.cancel_all(), 3);
        assert!(tokens.iter().all(CancellationToken::is_cancelled));
    }

    /// Random start/finish interleavings where every id starts before it
    /// finishes.
    fn interleaving(count: u64) -> impl Strategy<Value = Vec<(u64, bool)>> {
        let ids: Vec<u64> = (0..count).collect();
        (Just(ids.clone()).prop_shuffle(), vec(any::<bool>(), 0..(2 * count as usize)))
            .prop_map(|(order, coin)| {
                let mut ops = Vec::new();
                let mut started = std::collections::VecDeque::new();
                let mut next = order.into_iter();
                let mut coin = coin.into_iter();
                loop {
                    let finish_first = coin.next().unwrap_or(true);
                    match (finish_first, started.is_empty()) {
                        (true, false) => ops.push((started.pop_front().unwrap_or_default(), false)),
                        _ => match next.next() {
                            Some(id) => {
                                ops.push((id, true));
                                started.push_back(id);
                            }
                            None if started.is_empty() => break,
                            None => ops.push((started.pop_front().unwrap_or_default(), false)),
                        },
                    }
                }
                ops
            })
    }

    #[test]
    fn size_tracks_started_minus_finished() {
        let mut runner = TestRunner::new(Config {
            cases: 64,
            ..Config::default()
        });
        runner
            .run(&interleaving(48), |ops| {
                let registry = Registry::default();
                let (mut started, mut finished) = (0_usize, 0_usize);
                for (id, start) in ops {
                    let id = ConnectionId::new(id);
                    if start {
                        started += 1;
                        prop_assert_eq!(registry.insert(id, entry()), Some(started - finished));
                    } else {
                        finished += 1;
                        prop_assert_eq!(size_after_remove(&registry, id), Some(started - finished));
                        prop_assert!(!registry.contains(id));
                    }
                    prop_assert_eq!(registry.len(), started - finished);
                }
                prop_assert!(registry.is_empty());
                Ok(())
            })
            .expect("registry size should track lifecycle");
    }

    #[test]
    fn concurrent_start_and_finish_leave_no_entries() {
        const THREADS: u64 = 4;
        const PER_THREAD: u64 = 256;

        let registry = Registry::default();
        thread::scope(|scope| {
            for t in 0..THREADS {
                let registry = registry.clone();
                scope.spawn(move || {
                    for n in 0..PER_THREAD {
                        let id = ConnectionId::new(t * PER_THREAD + n);
                        assert!(registry.insert(id, entry()).is_some(), "duplicate {id}");
                        let size = registry.len();
                        assert!(size >= 1 && size <= usize::try_from(THREADS).unwrap_or(usize::MAX));
                        assert!(registry.remove(id).is_some(), "missing {id}");
                        assert!(!registry.contains(id), "entry survived finish");
                    }
                });
            }
        });
        assert!(registry.is_empty());
    }
}
