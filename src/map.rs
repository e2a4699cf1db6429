use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, trace};

use crate::clock::{Clock, SystemClock};
use crate::config::EvictionConfig;
use crate::error::EvictionError;
use crate::ops::{BulkAccess, ExpiringMap};
use crate::token::{Deadline, ExpirationToken, Stamp};

/// A value together with the stamp of the token that will evict it.
struct Slot<V> {
    value: V,
    stamp: Stamp,
}

impl<V> Slot<V> {
    #[inline]
    fn is_live(&self, now: Instant) -> bool {
        !self.stamp.deadline.is_due(now)
    }

    fn into_live(self, now: Instant) -> Option<V> {
        if self.is_live(now) {
            Some(self.value)
        } else {
            None
        }
    }
}

/// A thread-safe key-value map whose entries expire a fixed TTL after they
/// were last written.
///
/// There is no background task. Every operation first sweeps the schedule of
/// expiration tokens, evicting whatever has fallen due, then does its own work.
/// The primary map is a `DashMap`, so reads and writes to different keys only
/// contend on the schedule lock, which is held briefly and never while waiting
/// on the map.
///
/// Each entry has exactly one token in the schedule. The entry remembers the
/// stamp of its token, which makes discarding the token on overwrite or
/// removal an `O(log n)` lookup. A sweep only evicts an entry whose current
/// stamp matches the due token, so a value written concurrently with its
/// predecessor's expiry is never evicted early.
///
/// # Consistency
///
/// The map and the schedule are updated under the key's shard lock, but a
/// sweep reads the schedule without it. A sweep can therefore observe a token
/// whose entry is gone (a no-op) or miss an entry written a moment ago (it is
/// not due anyway). Operations that read a value also check the entry's own
/// deadline, so an expired value is never returned even if no sweep has
/// caught it yet.
///
/// # Example
///
/// ```rust
/// use evicting_map::EvictionMap;
/// use std::time::Duration;
///
/// let map = EvictionMap::with_ttl(Duration::from_secs(60)).unwrap();
/// map.put("user:123", "John Doe");
/// assert_eq!(map.get("user:123"), Some("John Doe"));
/// ```
pub struct EvictionMap<K, V, C = SystemClock> {
    map: DashMap<K, Slot<V>>,
    schedule: Mutex<BTreeSet<ExpirationToken<K>>>,
    ttl: Option<Duration>,
    generation: AtomicU64,
    clock: C,
}

impl<K: Eq + Hash, V> EvictionMap<K, V> {
    /// Creates a map whose entries never expire.
    pub fn new() -> Self {
        Self::build(None, SystemClock)
    }

    /// Creates a map whose entries expire `ttl` after their last write.
    ///
    /// # Errors
    ///
    /// Returns [`EvictionError::ZeroTtl`] if `ttl` is zero.
    pub fn with_ttl(ttl: Duration) -> Result<Self, EvictionError> {
        Self::with_config(EvictionConfig::new().with_ttl(ttl))
    }

    /// Creates a map whose entries expire `millis` milliseconds after their
    /// last write.
    ///
    /// # Errors
    ///
    /// Returns [`EvictionError::InvalidTtl`] for negative values and
    /// [`EvictionError::ZeroTtl`] for zero.
    pub fn with_ttl_millis(millis: i64) -> Result<Self, EvictionError> {
        Self::with_config(EvictionConfig::new().with_ttl_millis(millis))
    }

    pub fn with_config(config: EvictionConfig) -> Result<Self, EvictionError> {
        Self::with_clock(config, SystemClock)
    }
}

impl<K: Eq + Hash, V, C: Clock> EvictionMap<K, V, C> {
    /// Creates a map that reads time from `clock`.
    ///
    /// ```rust
    /// use evicting_map::{EvictionConfig, EvictionMap, ManualClock};
    /// use std::time::Duration;
    ///
    /// let clock = ManualClock::new();
    /// let config = EvictionConfig::new().with_ttl_millis(100);
    /// let map = EvictionMap::with_clock(config, clock.clone()).unwrap();
    ///
    /// map.put("key", "value");
    /// clock.advance(Duration::from_millis(100));
    /// assert_eq!(map.get("key"), None);
    /// ```
    pub fn with_clock(config: EvictionConfig, clock: C) -> Result<Self, EvictionError> {
        let ttl = config.ttl()?;
        Ok(Self::build(ttl, clock))
    }

    fn build(ttl: Option<Duration>, clock: C) -> Self {
        debug!(ttl = ?ttl, "creating eviction map");
        Self {
            map: DashMap::new(),
            schedule: Mutex::new(BTreeSet::new()),
            ttl,
            generation: AtomicU64::new(0),
            clock,
        }
    }

    /// The TTL entries live for, `None` if they never expire.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }
}

impl<K, V, C> EvictionMap<K, V, C>
where
    K: Eq + Hash + Clone,
    C: Clock,
{
    fn schedule(&self) -> MutexGuard<'_, BTreeSet<ExpirationToken<K>>> {
        self.schedule.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Schedules a fresh token for `key`, discarding `previous` if given, and
    /// returns the stamp the entry must carry.
    ///
    /// Callers hold the key's shard lock, so the lock order is always shard
    /// then schedule.
    fn reschedule(&self, key: K, now: Instant, previous: Option<Stamp>) -> Stamp {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let token = ExpirationToken::new(key, self.ttl.unwrap_or(Duration::MAX), now, generation);
        let stamp = token.stamp();

        let mut schedule = self.schedule();
        if let Some(previous) = previous {
            schedule.remove(&previous);
        }
        schedule.insert(token);
        stamp
    }

    fn discard(&self, stamp: &Stamp) {
        self.schedule().remove(stamp);
    }

    /// Evicts every entry whose token has fallen due and returns how many
    /// entries were removed.
    ///
    /// All other operations except `remove` and `clear` call this first;
    /// calling it directly is only useful to release memory held by expired
    /// entries of an otherwise idle map.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();

        let due = {
            let mut schedule = self.schedule();
            let mut due = Vec::new();
            while schedule.first().map_or(false, |token| token.is_due(now)) {
                if let Some(token) = schedule.pop_first() {
                    due.push(token);
                }
            }
            due
        };

        if due.is_empty() {
            return 0;
        }

        let mut evicted = 0;
        for token in due {
            let stamp = token.stamp();
            let key = token.into_key();
            // The key may have been removed, or rewritten with a newer token.
            if self
                .map
                .remove_if(&key, |_, slot| slot.stamp == stamp)
                .is_some()
            {
                evicted += 1;
            }
        }

        trace!(evicted, "swept expired entries");
        evicted
    }

    /// Time until the next entry falls due, `None` if nothing will.
    pub fn time_to_next_expiry(&self) -> Option<Duration> {
        self.sweep();
        let now = self.clock.now();
        self.schedule()
            .first()
            .filter(|token| token.stamp().deadline != Deadline::Never)
            .map(|token| token.remaining_delay(now))
    }

    /// Inserts or overwrites `key` and restarts its TTL.
    ///
    /// Returns the value previously associated with the key, if it was live.
    pub fn put(&self, key: K, value: V) -> Option<V> {
        self.sweep();
        let now = self.clock.now();

        match self.map.entry(key) {
            Entry::Occupied(mut occupied) => {
                let previous = occupied.get().stamp;
                let stamp = self.reschedule(occupied.key().clone(), now, Some(previous));
                occupied.insert(Slot { value, stamp }).into_live(now)
            }
            Entry::Vacant(vacant) => {
                let stamp = self.reschedule(vacant.key().clone(), now, None);
                vacant.insert(Slot { value, stamp });
                None
            }
        }
    }

    /// Removes `key`, returning its value if it was live.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let (_, slot) = self.map.remove(key)?;
        self.discard(&slot.stamp);
        slot.into_live(self.clock.now())
    }

    /// Overwrites `key` only if it is present, restarting its TTL.
    pub fn replace<Q>(&self, key: &Q, value: V) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.sweep();
        let now = self.clock.now();

        let mut entry = self.map.get_mut(key)?;
        if !entry.is_live(now) {
            return None;
        }
        let previous = entry.stamp;
        let stamp = self.reschedule(entry.key().clone(), now, Some(previous));
        entry.stamp = stamp;
        Some(std::mem::replace(&mut entry.value, value))
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.sweep();
        let now = self.clock.now();
        self.map.get(key).map_or(false, |slot| slot.is_live(now))
    }

    pub fn len(&self) -> usize {
        self.sweep();
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sweep();
        self.map.is_empty()
    }

    /// Removes every entry and its token.
    ///
    /// Entries written concurrently with the clear may survive it, together
    /// with their tokens.
    pub fn clear(&self) {
        let mut stamps = Vec::with_capacity(self.map.len());
        self.map.retain(|_, slot| {
            stamps.push(slot.stamp);
            false
        });

        let mut schedule = self.schedule();
        for stamp in &stamps {
            schedule.remove(stamp);
        }
        debug!(removed = stamps.len(), "cleared eviction map");
    }

    /// Snapshot of the live keys.
    pub fn keys(&self) -> Vec<K> {
        self.sweep();
        let now = self.clock.now();
        self.map
            .iter()
            .filter(|entry| entry.value().is_live(now))
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Calls [`put`](Self::put) for each pair in order.
    pub fn put_all<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in entries {
            self.put(key, value);
        }
    }
}

impl<K, V, C> EvictionMap<K, V, C>
where
    K: Eq + Hash + Clone,
    V: Clone,
    C: Clock,
{
    /// Returns a clone of the live value for `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.sweep();
        let now = self.clock.now();
        self.map
            .get(key)
            .filter(|slot| slot.is_live(now))
            .map(|slot| slot.value.clone())
    }

    /// Inserts `key` only if it has no live value.
    ///
    /// Returns the existing value, leaving its TTL untouched, if there was one.
    pub fn put_if_absent(&self, key: K, value: V) -> Option<V> {
        self.sweep();
        let now = self.clock.now();

        match self.map.entry(key) {
            Entry::Occupied(occupied) if occupied.get().is_live(now) => {
                Some(occupied.get().value.clone())
            }
            // expired but not yet swept
            Entry::Occupied(mut occupied) => {
                let previous = occupied.get().stamp;
                let stamp = self.reschedule(occupied.key().clone(), now, Some(previous));
                occupied.insert(Slot { value, stamp });
                None
            }
            Entry::Vacant(vacant) => {
                let stamp = self.reschedule(vacant.key().clone(), now, None);
                vacant.insert(Slot { value, stamp });
                None
            }
        }
    }

    /// Snapshot of the live values.
    pub fn values(&self) -> Vec<V> {
        self.sweep();
        let now = self.clock.now();
        self.map
            .iter()
            .filter(|entry| entry.value().is_live(now))
            .map(|entry| entry.value().value.clone())
            .collect()
    }

    /// Snapshot of the live key-value pairs.
    pub fn entries(&self) -> Vec<(K, V)> {
        self.sweep();
        let now = self.clock.now();
        self.map
            .iter()
            .filter(|entry| entry.value().is_live(now))
            .map(|entry| (entry.key().clone(), entry.value().value.clone()))
            .collect()
    }
}

impl<K, V, C> EvictionMap<K, V, C>
where
    K: Eq + Hash + Clone,
    V: PartialEq,
    C: Clock,
{
    /// Removes `key` only while it maps to `expected`.
    pub fn remove_if_eq<Q>(&self, key: &Q, expected: &V) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = self.clock.now();
        match self
            .map
            .remove_if(key, |_, slot| slot.is_live(now) && slot.value == *expected)
        {
            Some((_, slot)) => {
                self.discard(&slot.stamp);
                true
            }
            None => false,
        }
    }

    /// Overwrites `key` only while it maps to `expected`. The TTL restarts
    /// only when the value is replaced.
    pub fn replace_if_eq<Q>(&self, key: &Q, expected: &V, value: V) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.sweep();
        let now = self.clock.now();

        let Some(mut entry) = self.map.get_mut(key) else {
            return false;
        };
        if !entry.is_live(now) || entry.value != *expected {
            return false;
        }
        let previous = entry.stamp;
        let stamp = self.reschedule(entry.key().clone(), now, Some(previous));
        entry.stamp = stamp;
        entry.value = value;
        true
    }

    pub fn contains_value(&self, value: &V) -> bool {
        self.sweep();
        let now = self.clock.now();
        self.map
            .iter()
            .any(|entry| entry.value().is_live(now) && entry.value().value == *value)
    }
}

impl<K, V, C> ExpiringMap<K, V> for EvictionMap<K, V, C>
where
    K: Eq + Hash + Clone,
    V: Clone + PartialEq,
    C: Clock,
{
    fn get(&self, key: &K) -> Option<V> {
        EvictionMap::get(self, key)
    }

    fn put(&self, key: K, value: V) -> Option<V> {
        EvictionMap::put(self, key, value)
    }

    fn put_if_absent(&self, key: K, value: V) -> Option<V> {
        EvictionMap::put_if_absent(self, key, value)
    }

    fn remove(&self, key: &K) -> Option<V> {
        EvictionMap::remove(self, key)
    }

    fn remove_if_eq(&self, key: &K, expected: &V) -> bool {
        EvictionMap::remove_if_eq(self, key, expected)
    }

    fn replace(&self, key: &K, value: V) -> Option<V> {
        EvictionMap::replace(self, key, value)
    }

    fn replace_if_eq(&self, key: &K, expected: &V, value: V) -> bool {
        EvictionMap::replace_if_eq(self, key, expected, value)
    }

    fn contains_key(&self, key: &K) -> bool {
        EvictionMap::contains_key(self, key)
    }

    fn contains_value(&self, value: &V) -> bool {
        EvictionMap::contains_value(self, value)
    }

    fn len(&self) -> usize {
        EvictionMap::len(self)
    }

    fn is_empty(&self) -> bool {
        EvictionMap::is_empty(self)
    }

    fn clear(&self) {
        EvictionMap::clear(self)
    }
}

impl<K, V, C> BulkAccess<K, V> for EvictionMap<K, V, C>
where
    K: Eq + Hash + Clone,
    V: Clone,
    C: Clock,
{
    fn put_all<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        EvictionMap::put_all(self, entries)
    }

    fn keys(&self) -> Vec<K> {
        EvictionMap::keys(self)
    }

    fn values(&self) -> Vec<V> {
        EvictionMap::values(self)
    }

    fn entries(&self) -> Vec<(K, V)> {
        EvictionMap::entries(self)
    }
}

impl<K: Eq + Hash, V> Default for EvictionMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash, V, C> fmt::Debug for EvictionMap<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvictionMap")
            .field("ttl", &self.ttl)
            .field("entries", &self.map.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::Arc;
    use std::thread;

    const TTL: Duration = Duration::from_millis(100);

    fn create_test_map() -> (EvictionMap<String, String, ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let config = EvictionConfig::new().with_ttl(TTL);
        let map = EvictionMap::with_clock(config, clock.clone()).unwrap();
        (map, clock)
    }

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn scheduled(map: &EvictionMap<String, String, ManualClock>) -> usize {
        map.schedule().len()
    }

    #[test]
    fn test_put_and_get() {
        let (map, _clock) = create_test_map();
        assert_eq!(map.put("key".into(), "value".into()), None);
        assert_eq!(map.get("key"), Some("value".to_string()));
    }

    #[test]
    fn test_get_nonexistent_key() {
        let (map, _clock) = create_test_map();
        assert_eq!(map.get("missing"), None);
    }

    #[test]
    fn test_overwrite_returns_previous() {
        let (map, _clock) = create_test_map();
        map.put("key".into(), "v1".into());
        assert_eq!(map.put("key".into(), "v2".into()), Some("v1".to_string()));
        assert_eq!(map.get("key"), Some("v2".to_string()));
        assert_eq!(scheduled(&map), 1);
    }

    #[test]
    fn test_entry_expires_at_ttl() {
        let (map, clock) = create_test_map();
        map.put("key".into(), "value".into());

        clock.advance(ms(99));
        assert_eq!(map.get("key"), Some("value".to_string()));

        clock.advance(ms(1));
        assert_eq!(map.get("key"), None);
        assert_eq!(scheduled(&map), 0);
    }

    #[test]
    fn test_sweep_reports_evictions() {
        let (map, clock) = create_test_map();
        for i in 0..5 {
            map.put(format!("key{i}"), format!("value{i}"));
        }
        clock.advance(ms(50));
        map.put("late".into(), "value".into());

        clock.advance(ms(50));
        assert_eq!(map.sweep(), 5);
        assert_eq!(map.sweep(), 0);
        assert_eq!(map.keys(), vec!["late".to_string()]);
    }

    #[test]
    fn test_put_restarts_ttl() {
        let (map, clock) = create_test_map();
        map.put("key".into(), "v1".into());
        clock.advance(ms(70));
        map.put("key".into(), "v2".into());

        clock.advance(ms(70));
        assert_eq!(map.get("key"), Some("v2".to_string()));

        clock.advance(ms(30));
        assert_eq!(map.get("key"), None);
    }

    #[test]
    fn test_put_if_absent_keeps_existing_ttl() {
        let (map, clock) = create_test_map();
        assert_eq!(map.put_if_absent("key".into(), "v1".into()), None);

        clock.advance(ms(60));
        assert_eq!(
            map.put_if_absent("key".into(), "v2".into()),
            Some("v1".to_string())
        );
        assert_eq!(scheduled(&map), 1);

        clock.advance(ms(40));
        assert_eq!(map.get("key"), None);
    }

    #[test]
    fn test_remove_discards_token() {
        let (map, _clock) = create_test_map();
        map.put("key".into(), "value".into());
        assert_eq!(map.remove("key"), Some("value".to_string()));
        assert_eq!(map.remove("key"), None);
        assert_eq!(map.get("key"), None);
        assert_eq!(scheduled(&map), 0);
    }

    #[test]
    fn test_remove_if_eq() {
        let (map, _clock) = create_test_map();
        map.put("key".into(), "value".into());

        assert!(!map.remove_if_eq("key", &"other".to_string()));
        assert_eq!(map.get("key"), Some("value".to_string()));
        assert_eq!(scheduled(&map), 1);

        assert!(map.remove_if_eq("key", &"value".to_string()));
        assert_eq!(map.get("key"), None);
        assert_eq!(scheduled(&map), 0);
    }

    #[test]
    fn test_replace_only_if_present() {
        let (map, _clock) = create_test_map();
        assert_eq!(map.replace("key", "value".into()), None);
        assert!(!map.contains_key("key"));
        assert_eq!(scheduled(&map), 0);
    }

    #[test]
    fn test_replace_restarts_ttl() {
        let (map, clock) = create_test_map();
        map.put("key".into(), "v1".into());
        clock.advance(ms(70));
        assert_eq!(map.replace("key", "v2".into()), Some("v1".to_string()));
        assert_eq!(scheduled(&map), 1);

        clock.advance(ms(99));
        assert_eq!(map.get("key"), Some("v2".to_string()));
        clock.advance(ms(1));
        assert_eq!(map.get("key"), None);
    }

    #[test]
    fn test_replace_if_eq_wrong_expected_keeps_ttl() {
        let (map, clock) = create_test_map();
        map.put("key".into(), "v1".into());
        clock.advance(ms(70));

        assert!(!map.replace_if_eq("key", &"nope".to_string(), "v2".into()));
        assert_eq!(map.get("key"), Some("v1".to_string()));

        clock.advance(ms(30));
        assert_eq!(map.get("key"), None);
    }

    #[test]
    fn test_replace_if_eq_restarts_ttl() {
        let (map, clock) = create_test_map();
        map.put("key".into(), "v1".into());
        clock.advance(ms(70));

        assert!(map.replace_if_eq("key", &"v1".to_string(), "v2".into()));
        clock.advance(ms(70));
        assert_eq!(map.get("key"), Some("v2".to_string()));
    }

    #[test]
    fn test_contains_and_len() {
        let (map, clock) = create_test_map();
        assert!(map.is_empty());
        map.put("a".into(), "1".into());
        map.put("b".into(), "2".into());

        assert_eq!(map.len(), 2);
        assert!(map.contains_key("a"));
        assert!(map.contains_value(&"2".to_string()));
        assert!(!map.contains_value(&"3".to_string()));

        clock.advance(TTL);
        assert!(!map.contains_key("a"));
        assert!(!map.contains_value(&"2".to_string()));
        assert_eq!(map.len(), 0);
        assert!(map.is_empty());
    }

    #[test]
    fn test_clear_empties_map_and_schedule() {
        let (map, _clock) = create_test_map();
        map.put_all((0..10).map(|i| (format!("key{i}"), format!("value{i}"))));
        assert_eq!(map.len(), 10);

        map.clear();
        assert_eq!(map.len(), 0);
        assert_eq!(scheduled(&map), 0);
        assert_eq!(map.get("key3"), None);

        map.clear();
        assert!(map.is_empty());
    }

    #[test]
    fn test_views_exclude_expired() {
        let (map, clock) = create_test_map();
        map.put("old".into(), "1".into());
        clock.advance(ms(50));
        map.put("new".into(), "2".into());
        clock.advance(ms(50));

        assert_eq!(map.keys(), vec!["new".to_string()]);
        assert_eq!(map.values(), vec!["2".to_string()]);
        assert_eq!(map.entries(), vec![("new".to_string(), "2".to_string())]);
    }

    #[test]
    fn test_stale_token_does_not_evict_newer_write() {
        let (map, clock) = create_test_map();
        map.put("key".into(), "fresh".into());

        // a token left behind by an earlier write that raced with this one
        let stale = ExpirationToken::new("key".to_string(), TTL, clock.now() - TTL, u64::MAX);
        map.schedule().insert(stale);

        assert_eq!(map.sweep(), 0);
        assert_eq!(map.get("key"), Some("fresh".to_string()));
        assert_eq!(scheduled(&map), 1);
    }

    #[test]
    fn test_expired_unswept_entry_is_invisible() {
        let (map, clock) = create_test_map();
        map.put("key".into(), "value".into());
        // drop the token so no sweep can catch the entry
        map.schedule().clear();

        clock.advance(TTL);
        assert_eq!(map.get("key"), None);
        assert!(!map.contains_key("key"));
        assert_eq!(map.replace("key", "other".into()), None);
        assert_eq!(map.put_if_absent("key".into(), "again".into()), None);
        assert_eq!(map.get("key"), Some("again".to_string()));
    }

    #[test]
    fn test_time_to_next_expiry() {
        let (map, clock) = create_test_map();
        assert_eq!(map.time_to_next_expiry(), None);

        map.put("key".into(), "value".into());
        clock.advance(ms(30));
        assert_eq!(map.time_to_next_expiry(), Some(ms(70)));

        clock.advance(ms(70));
        assert_eq!(map.time_to_next_expiry(), None);
    }

    #[test]
    fn test_never_expire() {
        let clock = ManualClock::new();
        let map: EvictionMap<&str, u32, _> =
            EvictionMap::with_clock(EvictionConfig::new(), clock.clone()).unwrap();
        map.put("key", 1);

        clock.advance(Duration::from_secs(100 * 365 * 24 * 3600));
        assert_eq!(map.get("key"), Some(1));
        assert_eq!(map.ttl(), None);
        assert_eq!(map.time_to_next_expiry(), None);
    }

    #[test]
    fn test_invalid_ttl_rejected() {
        assert_eq!(
            EvictionMap::<String, String>::with_ttl_millis(-1).unwrap_err(),
            EvictionError::InvalidTtl { millis: -1 }
        );
        assert_eq!(
            EvictionMap::<String, String>::with_ttl(Duration::ZERO).unwrap_err(),
            EvictionError::ZeroTtl
        );
    }

    #[test]
    fn test_concurrent_writes() {
        let map = Arc::new(EvictionMap::with_ttl(Duration::from_secs(60)).unwrap());
        let mut handles = vec![];

        for t in 0..8 {
            let map = Arc::clone(&map);
            handles.push(thread::spawn(move || {
                for i in 0..100 {
                    map.put(format!("key_{t}_{i}"), i);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(map.len(), 800);
        assert_eq!(map.schedule().len(), 800);
    }

    #[test]
    fn test_concurrent_writes_to_same_key_leave_one_token() {
        let map = Arc::new(EvictionMap::with_ttl(Duration::from_secs(60)).unwrap());
        let mut handles = vec![];

        for t in 0..8 {
            let map = Arc::clone(&map);
            handles.push(thread::spawn(move || {
                for i in 0..200 {
                    match i % 3 {
                        0 => {
                            map.put("shared", t * 1000 + i);
                        }
                        1 => {
                            map.replace("shared", t * 1000 + i);
                        }
                        _ => {
                            map.put_if_absent("shared", t * 1000 + i);
                        }
                    }
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(map.len(), 1);
        assert_eq!(map.schedule().len(), 1);
    }

    #[test]
    fn test_debug_output() {
        let map: EvictionMap<&str, u32> = EvictionMap::with_ttl(ms(100)).unwrap();
        map.put("a", 1);
        let debug = format!("{map:?}");
        assert!(debug.contains("EvictionMap"));
        assert!(debug.contains("entries: 1"));
    }
}
