//! Multi-day cache of diary state
//!
//! Keys are `userId:date`. Any successful write to a day invalidates that
//! day's entry; the next read reloads it from the database.
//!
//! Optimistic updates mutate a cached day in place before the write reaches
//! the database. The caller keeps the returned [`Snapshot`] and hands it back
//! to [`DayCache::rollback`] if the write fails. A rollback is ignored when
//! the entry has been replaced or invalidated in the meantime, so a stale
//! snapshot can never overwrite fresher data.
//!
//! Every invalidation bumps a generation counter, even when nothing was
//! cached. A reader that loads a day from the database notes the
//! generation first and stores the result with
//! [`DayCache::insert_if_unchanged`], so rows read before a concurrent write
//! committed are never put back after that write invalidated them.

use chrono::{Duration, NaiveDate};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use uuid::Uuid;

/// Cache key: one user's diary for one date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DayKey {
    pub user_id: Uuid,
    pub date: NaiveDate,
}

impl DayKey {
    pub fn new(user_id: Uuid, date: NaiveDate) -> Self {
        Self { user_id, date }
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.user_id, self.date.format("%Y-%m-%d"))
    }
}

#[derive(Debug, Clone)]
struct Slot<V> {
    value: V,
    version: u64,
}

/// Previous value of a day, taken before an optimistic change
#[derive(Debug, Clone)]
pub struct Snapshot<V> {
    key: DayKey,
    previous: V,
    version: u64,
}

impl<V> Snapshot<V> {
    pub fn key(&self) -> DayKey {
        self.key
    }
}

/// Bounded map from [`DayKey`] to a day's value
///
/// When full, inserting a new key evicts the key inserted longest ago.
#[derive(Debug)]
pub struct DayCache<V> {
    entries: HashMap<DayKey, Slot<V>>,
    order: VecDeque<DayKey>,
    capacity: usize,
    next_version: u64,
    generation: u64,
}

impl<V: Clone> DayCache<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
            next_version: 0,
            generation: 0,
        }
    }

    fn bump(&mut self) -> u64 {
        self.next_version += 1;
        self.next_version
    }

    pub fn get(&self, key: &DayKey) -> Option<&V> {
        self.entries.get(key).map(|slot| &slot.value)
    }

    pub fn contains(&self, key: &DayKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of invalidations so far
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Store a day loaded after `seen` was read from [`DayCache::generation`].
    /// Returns false, storing nothing, if anything was invalidated since.
    pub fn insert_if_unchanged(&mut self, key: DayKey, value: V, seen: u64) -> bool {
        if self.generation != seen {
            return false;
        }
        self.insert(key, value);
        true
    }

    /// Store a freshly loaded day
    pub fn insert(&mut self, key: DayKey, value: V) {
        let version = self.bump();
        if self.entries.insert(key, Slot { value, version }).is_none() {
            self.order.push_back(key);
            while self.entries.len() > self.capacity {
                match self.order.pop_front() {
                    Some(oldest) => {
                        self.entries.remove(&oldest);
                    }
                    None => break,
                }
            }
        }
    }

    /// Drop one day after a successful write
    pub fn invalidate(&mut self, key: &DayKey) -> bool {
        self.generation += 1;
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.order.retain(|k| k != key);
        }
        removed
    }

    /// Drop every cached day of a user
    pub fn invalidate_user(&mut self, user_id: Uuid) -> usize {
        self.generation += 1;
        let before = self.entries.len();
        self.entries.retain(|k, _| k.user_id != user_id);
        self.order.retain(|k| k.user_id != user_id);
        before - self.entries.len()
    }

    /// Drop everything, e.g. after a shared food changed
    pub fn clear(&mut self) -> usize {
        self.generation += 1;
        let dropped = self.entries.len();
        self.entries.clear();
        self.order.clear();
        dropped
    }

    /// Apply `change` to a cached day and return what it looked like before.
    /// Returns `None` when the day is not cached.
    pub fn apply_optimistic<F>(&mut self, key: &DayKey, change: F) -> Option<Snapshot<V>>
    where
        F: FnOnce(&mut V),
    {
        let version = self.bump();
        let slot = self.entries.get_mut(key)?;
        let previous = slot.value.clone();
        change(&mut slot.value);
        slot.version = version;
        Some(Snapshot {
            key: *key,
            previous,
            version,
        })
    }

    /// Undo an optimistic change. Returns false when the entry changed since
    /// the snapshot was taken, in which case nothing is restored.
    pub fn rollback(&mut self, snapshot: Snapshot<V>) -> bool {
        match self.entries.get_mut(&snapshot.key) {
            Some(slot) if slot.version == snapshot.version => {
                slot.value = snapshot.previous;
                true
            }
            _ => false,
        }
    }
}

/// Dates around `center` that the dashboard keeps warm. Days past the ends
/// of the calendar are left out.
pub fn window(center: NaiveDate, radius_days: u32) -> Vec<NaiveDate> {
    let radius = i64::from(radius_days);
    (-radius..=radius)
        .filter_map(|offset| center.checked_add_signed(Duration::days(offset)))
        .collect()
}
