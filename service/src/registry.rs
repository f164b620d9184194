//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Lock-free registry of live sessions.
//!
//! Backed by a [`DashMap`] so the accept loop's capacity check and the
//! monitor bus's periodic snapshot never contend with each other or with a
//! session task updating its own entry.

use crate::types::{now_unix_millis, SessionId, SessionInfo};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// One registry entry: the session's cancel signal plus its latest snapshot.
#[derive(Clone)]
pub struct RegistryEntry {
    pub cancel: Arc<Notify>,
    pub info: SessionInfo,
}

/// Shared session table for one [`crate::server::Server`].
#[derive(Default)]
pub struct Registry {
    sessions: DashMap<SessionId, RegistryEntry>,
    next_id: AtomicU64,
    total_started: AtomicU64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the next monotonically increasing session id.
    pub fn next_id(&self) -> SessionId {
        SessionId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn total_started(&self) -> u64 {
        self.total_started.load(Ordering::Relaxed)
    }

    /// Inserts a freshly-accepted session, marking every previously-registered
    /// entry as no longer the newest. The registry, not the caller, owns
    /// `is_newest`, so it is forced to `true` here regardless of what `info`
    /// carried in.
    pub fn insert(&self, id: SessionId, cancel: Arc<Notify>, mut info: SessionInfo) {
        for mut entry in self.sessions.iter_mut() {
            entry.info.is_newest = false;
        }
        info.is_newest = true;
        self.total_started.fetch_add(1, Ordering::Relaxed);
        self.sessions.insert(id, RegistryEntry { cancel, info });
    }

    /// Refreshes an entry's snapshot. `is_newest` is the registry's own
    /// bookkeeping, set by `insert`/`remove`, not the session's: the caller's
    /// `info.is_newest` is ignored and the registry's current value kept, so a
    /// session that never recomputes the flag itself can't stomp on it.
    pub fn update(&self, id: SessionId, mut info: SessionInfo) {
        if let Some(mut entry) = self.sessions.get_mut(&id) {
            info.is_newest = entry.info.is_newest;
            entry.info = info;
        }
    }

    /// Removes an entry. If it was the newest session, re-derives the flag
    /// for whichever remaining session now has the greatest `created_at`.
    pub fn remove(&self, id: SessionId) {
        let Some((_, removed)) = self.sessions.remove(&id) else {
            return;
        };
        if removed.info.is_newest {
            if let Some(mut newest) = self.sessions.iter_mut().max_by_key(|entry| entry.info.created_at) {
                newest.info.is_newest = true;
            }
        }
    }

    pub fn cancel_all(&self) {
        for entry in self.sessions.iter() {
            entry.cancel.notify_one();
        }
    }

    pub fn cancel(&self, id: SessionId) -> bool {
        match self.sessions.get(&id) {
            Some(entry) => {
                entry.cancel.notify_one();
                true
            }
            None => false,
        }
    }

    /// Non-blocking snapshot of every live session, for the monitor bus.
    pub fn snapshot(&self) -> Vec<SessionInfo> {
        self.sessions.iter().map(|entry| entry.info.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SessionState, TransportKind};
    use std::time::Instant;

    fn sample_info(id: SessionId) -> SessionInfo {
        let now = Instant::now();
        SessionInfo {
            id,
            transport: TransportKind::Tcp,
            state: SessionState::Running,
            peer_addr: "127.0.0.1:1".parse().unwrap(),
            created_at: now,
            created_at_unix_ms: now_unix_millis(),
            last_activity: now,
            is_newest: true,
            bytes_sent: 0,
            bytes_received: 0,
        }
    }

    #[test]
    fn ids_are_unique_and_increasing() {
        let registry = Registry::new();
        let a = registry.next_id();
        let b = registry.next_id();
        assert!(a.as_u64() < b.as_u64());
    }

    #[test]
    fn insert_marks_previous_entries_not_newest() {
        let registry = Registry::new();
        let first = registry.next_id();
        registry.insert(first, Arc::new(Notify::new()), sample_info(first));
        let second = registry.next_id();
        registry.insert(second, Arc::new(Notify::new()), sample_info(second));

        let snapshot = registry.snapshot();
        let first_entry = snapshot.iter().find(|s| s.id == first).unwrap();
        let second_entry = snapshot.iter().find(|s| s.id == second).unwrap();
        assert!(!first_entry.is_newest);
        assert!(second_entry.is_newest);
    }

    #[test]
    fn update_cannot_make_an_older_session_newest_again() {
        let registry = Registry::new();
        let first = registry.next_id();
        registry.insert(first, Arc::new(Notify::new()), sample_info(first));
        let second = registry.next_id();
        registry.insert(second, Arc::new(Notify::new()), sample_info(second));

        // The session pipeline always builds its own `SessionInfo` with
        // `is_newest: true`; the registry must not take that at face value.
        let mut stale_update = sample_info(first);
        stale_update.is_newest = true;
        registry.update(first, stale_update);

        let snapshot = registry.snapshot();
        let first_entry = snapshot.iter().find(|s| s.id == first).unwrap();
        let second_entry = snapshot.iter().find(|s| s.id == second).unwrap();
        assert!(!first_entry.is_newest);
        assert!(second_entry.is_newest);
    }

    #[test]
    fn removing_the_newest_session_promotes_the_next_newest() {
        let registry = Registry::new();
        let first = registry.next_id();
        registry.insert(first, Arc::new(Notify::new()), sample_info(first));
        let second = registry.next_id();
        registry.insert(second, Arc::new(Notify::new()), sample_info(second));

        registry.remove(second);

        let snapshot = registry.snapshot();
        let first_entry = snapshot.iter().find(|s| s.id == first).unwrap();
        assert!(first_entry.is_newest);
    }

    #[test]
    fn remove_drops_the_entry() {
        let registry = Registry::new();
        let id = registry.next_id();
        registry.insert(id, Arc::new(Notify::new()), sample_info(id));
        assert_eq!(registry.len(), 1);
        registry.remove(id);
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn cancel_notifies_the_session() {
        let registry = Registry::new();
        let id = registry.next_id();
        let cancel = Arc::new(Notify::new());
        registry.insert(id, cancel.clone(), sample_info(id));
        assert!(registry.cancel(id));
        assert!(!registry.cancel(SessionId::new(9999)));
    }
}
