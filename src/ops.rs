//! Capability traits.
//!
//! [`ExpiringMap`] is the minimal surface every time-evicting container offers.
//! Bulk insertion and view snapshots are a separate capability,
//! [`BulkAccess`]: a container that cannot offer them consistently simply does
//! not implement it, so callers find out at compile time rather than through a
//! runtime failure.

/// Map operations that observe and honour expiration.
///
/// Every operation except the removals and [`clear`](Self::clear) evicts due
/// entries before doing its own work. Writes restart the written key's TTL.
pub trait ExpiringMap<K, V> {
    /// The live value for `key`.
    fn get(&self, key: &K) -> Option<V>;

    /// Inserts or overwrites `key`, returning the previous live value.
    fn put(&self, key: K, value: V) -> Option<V>;

    /// Inserts only if `key` is absent; returns the existing value otherwise.
    fn put_if_absent(&self, key: K, value: V) -> Option<V>;

    fn remove(&self, key: &K) -> Option<V>;

    /// Removes `key` only while it maps to `expected`.
    fn remove_if_eq(&self, key: &K, expected: &V) -> bool;

    /// Overwrites `key` only if present, returning the previous value.
    fn replace(&self, key: &K, value: V) -> Option<V>;

    /// Overwrites `key` only while it maps to `expected`.
    fn replace_if_eq(&self, key: &K, expected: &V, value: V) -> bool;

    fn contains_key(&self, key: &K) -> bool;

    fn contains_value(&self, value: &V) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&self);
}

/// Bulk insertion and snapshot views.
///
/// Views are point-in-time copies taken after a sweep; they do not track later
/// writes or expirations.
pub trait BulkAccess<K, V> {
    /// Equivalent to calling `put` for each pair in order.
    fn put_all<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>;

    fn keys(&self) -> Vec<K>;

    fn values(&self) -> Vec<V>;

    fn entries(&self) -> Vec<(K, V)>;
}
