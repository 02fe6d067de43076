//! Per-entity-type cache merged by id and version
//!
//! Every fetch takes a [`FetchTicket`] before it goes out. A snapshot is only
//! applied when its ticket is newer than the last applied one, so an
//! overlapping slow response can never roll the cache back. Ids with a write
//! in flight are left alone until the write confirms or aborts.

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::sync::Arc;

use shared::Versioned;
use tokio::sync::Mutex;

use crate::error::ClientResult;

/// Cache shared between a screen's poller and its mutation calls
pub type SharedCache<T> = Arc<Mutex<EntityCache<T>>>;

/// Sequence number handed out when a fetch starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeReport {
    pub inserted: usize,
    pub updated: usize,
    pub removed: usize,
    /// Entities left untouched because a local write is pending
    pub skipped_pending: usize,
    /// Entities whose cached copy was newer than the snapshot's
    pub kept_newer: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Applied(MergeReport),
    /// The snapshot was older than one already applied
    Stale,
}

#[derive(Debug)]
pub struct EntityCache<T: Versioned> {
    entries: BTreeMap<T::Key, T>,
    pending: BTreeSet<T::Key>,
    issued: u64,
    applied: Option<u64>,
}

impl<T: Versioned> Default for EntityCache<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            pending: BTreeSet::new(),
            issued: 0,
            applied: None,
        }
    }
}

impl<T: Versioned> EntityCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedCache<T> {
        Arc::new(Mutex::new(Self::new()))
    }

    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.issued += 1;
        FetchTicket(self.issued)
    }

    /// Merge a full dataset fetched under `ticket`.
    ///
    /// Entities missing from the snapshot are dropped unless a write to them
    /// is pending.
    pub fn apply_snapshot(&mut self, ticket: FetchTicket, snapshot: Vec<T>) -> MergeOutcome {
        if self.applied.is_some_and(|applied| ticket.0 <= applied) {
            tracing::debug!(ticket = ticket.0, "Discarding stale snapshot");
            return MergeOutcome::Stale;
        }
        self.applied = Some(ticket.0);

        let mut report = MergeReport::default();
        let mut seen = BTreeSet::new();

        for incoming in snapshot {
            let key = incoming.key();
            seen.insert(key.clone());

            if self.pending.contains(&key) {
                report.skipped_pending += 1;
                continue;
            }

            match self.entries.get(&key) {
                Some(current) if current.version() > incoming.version() => {
                    report.kept_newer += 1;
                }
                Some(_) => {
                    self.entries.insert(key, incoming);
                    report.updated += 1;
                }
                None => {
                    self.entries.insert(key, incoming);
                    report.inserted += 1;
                }
            }
        }

        let before = self.entries.len();
        let pending = &self.pending;
        self.entries
            .retain(|key, _| seen.contains(key) || pending.contains(key));
        report.removed = before - self.entries.len();

        MergeOutcome::Applied(report)
    }

    /// Mark `key` as being written; polls will not overwrite it
    pub fn begin_write(&mut self, key: T::Key) {
        self.pending.insert(key);
    }

    /// Store the server's answer to a write and release the key
    pub fn confirm_write(&mut self, entity: T) {
        let key = entity.key();
        self.pending.remove(&key);
        match self.entries.get(&key) {
            Some(current) if current.version() > entity.version() => {}
            _ => {
                self.entries.insert(key, entity);
            }
        }
    }

    /// Release the key after a failed write; the next poll repairs the entry
    pub fn abort_write(&mut self, key: &T::Key) {
        self.pending.remove(key);
    }

    pub fn is_pending(&self, key: &T::Key) -> bool {
        self.pending.contains(key)
    }

    pub fn get(&self, key: &T::Key) -> Option<&T> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &T::Key) -> Option<&mut T> {
        self.entries.get_mut(key)
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether any snapshot has been applied yet
    pub fn is_loaded(&self) -> bool {
        self.applied.is_some()
    }
}

/// Write-then-confirm: hold `key` against polls while `call` runs, then store
/// the server's answer
pub async fn write_through<T, Fut>(cache: &SharedCache<T>, key: T::Key, call: Fut) -> ClientResult<T>
where
    T: Versioned + Clone,
    Fut: Future<Output = ClientResult<T>>,
{
    cache.lock().await.begin_write(key.clone());
    match call.await {
        Ok(entity) => {
            cache.lock().await.confirm_write(entity.clone());
            Ok(entity)
        }
        Err(err) => {
            cache.lock().await.abort_write(&key);
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: u32,
        version: i64,
        label: &'static str,
    }

    impl Versioned for Row {
        type Key = u32;

        fn key(&self) -> u32 {
            self.id
        }

        fn version(&self) -> i64 {
            self.version
        }
    }

    fn row(id: u32, version: i64, label: &'static str) -> Row {
        Row { id, version, label }
    }

    #[test]
    fn test_older_ticket_is_discarded() {
        let mut cache = EntityCache::new();
        let slow = cache.begin_fetch();
        let fast = cache.begin_fetch();

        assert!(matches!(
            cache.apply_snapshot(fast, vec![row(1, 2, "new")]),
            MergeOutcome::Applied(_)
        ));
        assert_eq!(cache.apply_snapshot(slow, vec![row(1, 1, "old")]), MergeOutcome::Stale);
        assert_eq!(cache.get(&1).map(|r| r.label), Some("new"));
    }

    #[test]
    fn test_pending_write_survives_poll() {
        let mut cache = EntityCache::new();
        let ticket = cache.begin_fetch();
        cache.apply_snapshot(ticket, vec![row(1, 1, "loaded")]);

        cache.begin_write(1);
        let ticket = cache.begin_fetch();
        match cache.apply_snapshot(ticket, vec![]) {
            MergeOutcome::Applied(report) => assert_eq!(report.removed, 0),
            MergeOutcome::Stale => panic!("fresh snapshot reported stale"),
        }
        assert_eq!(cache.get(&1).map(|r| r.label), Some("loaded"));

        cache.confirm_write(row(1, 2, "written"));
        assert!(!cache.is_pending(&1));
        assert_eq!(cache.get(&1).map(|r| r.version), Some(2));
    }

    #[test]
    fn test_snapshot_never_downgrades_version() {
        let mut cache = EntityCache::new();
        cache.confirm_write(row(7, 5, "confirmed"));

        let ticket = cache.begin_fetch();
        match cache.apply_snapshot(ticket, vec![row(7, 4, "lagging replica")]) {
            MergeOutcome::Applied(report) => assert_eq!(report.kept_newer, 1),
            MergeOutcome::Stale => panic!("fresh snapshot reported stale"),
        }
        assert_eq!(cache.get(&7).map(|r| r.label), Some("confirmed"));
    }

    #[test]
    fn test_missing_entities_are_removed() {
        let mut cache = EntityCache::new();
        let ticket = cache.begin_fetch();
        cache.apply_snapshot(ticket, vec![row(1, 1, "a"), row(2, 1, "b")]);

        let ticket = cache.begin_fetch();
        cache.apply_snapshot(ticket, vec![row(2, 1, "b")]);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&1).is_none());
    }

    mod ticket_ordering {
        use super::*;
        use proptest::prelude::*;

        fn arrival_order() -> impl Strategy<Value = Vec<usize>> {
            (1usize..12).prop_flat_map(|n| Just((0..n).collect::<Vec<_>>()).prop_shuffle())
        }

        proptest! {
            /// However responses interleave, only newer tickets apply and the
            /// newest snapshot wins
            #[test]
            fn prop_newest_snapshot_wins(order in arrival_order()) {
                let mut cache = EntityCache::new();
                let tickets: Vec<FetchTicket> = order.iter().map(|_| cache.begin_fetch()).collect();
                let newest = order.len() - 1;
                let mut highest_applied: Option<usize> = None;

                for &fetch in &order {
                    let snapshot = vec![row(1, fetch as i64 + 1, "polled")];
                    let outcome = cache.apply_snapshot(tickets[fetch], snapshot);

                    if highest_applied.map_or(true, |h| fetch > h) {
                        prop_assert!(matches!(outcome, MergeOutcome::Applied(_)));
                        highest_applied = Some(fetch);
                    } else {
                        prop_assert_eq!(outcome, MergeOutcome::Stale);
                    }
                }

                let applied = highest_applied.unwrap_or_default();
                prop_assert_eq!(applied, newest);
                prop_assert_eq!(cache.get(&1).map(|r| r.version), Some(newest as i64 + 1));
            }
        }
    }
}
