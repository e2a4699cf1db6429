//! Schedule records.
//!
//! An [`ExpirationToken`] pairs a key with the instant it was written and the
//! container's TTL. Tokens are immutable: refreshing a key means discarding its
//! token and scheduling a new one.
//!
//! Tokens order by remaining delay, soonest-due first. Since every token in a
//! schedule is measured against the same `now`, that is the same as ordering by
//! deadline, which does not drift while the token sits in the schedule. Equal
//! deadlines break by generation, so the order is total and two tokens compare
//! equal only when they are the same write.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::time::{Duration, Instant};

/// When a token falls due. `Never` sorts after every finite deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum Deadline {
    At(Instant),
    Never,
}

impl Deadline {
    /// `created_at + ttl`, or `Never` if that is not representable.
    pub(crate) fn after(created_at: Instant, ttl: Duration) -> Self {
        created_at
            .checked_add(ttl)
            .map_or(Deadline::Never, Deadline::At)
    }

    #[inline]
    pub(crate) fn is_due(&self, now: Instant) -> bool {
        match self {
            Deadline::At(at) => *at <= now,
            Deadline::Never => false,
        }
    }
}

/// Identity and position of a token in the schedule.
///
/// The primary map keeps a copy of its entry's stamp, which is enough to find
/// and remove the token from the schedule without scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct Stamp {
    pub(crate) deadline: Deadline,
    pub(crate) generation: u64,
}

#[derive(Debug, Clone)]
pub(crate) struct ExpirationToken<K> {
    key: K,
    created_at: Instant,
    ttl: Duration,
    stamp: Stamp,
}

impl<K> ExpirationToken<K> {
    pub(crate) fn new(key: K, ttl: Duration, created_at: Instant, generation: u64) -> Self {
        Self {
            key,
            created_at,
            ttl,
            stamp: Stamp {
                deadline: Deadline::after(created_at, ttl),
                generation,
            },
        }
    }

    #[inline]
    pub(crate) fn into_key(self) -> K {
        self.key
    }

    #[inline]
    pub(crate) fn stamp(&self) -> Stamp {
        self.stamp
    }

    /// Time left before the token is due, zero once it is.
    ///
    /// A token that can never fall due reports `Duration::MAX`.
    pub(crate) fn remaining_delay(&self, now: Instant) -> Duration {
        match self.created_at.checked_add(self.ttl) {
            Some(at) => at.saturating_duration_since(now),
            None => Duration::MAX,
        }
    }

    #[inline]
    pub(crate) fn is_due(&self, now: Instant) -> bool {
        self.stamp.deadline.is_due(now)
    }
}

impl<K> PartialEq for ExpirationToken<K> {
    fn eq(&self, other: &Self) -> bool {
        self.stamp == other.stamp
    }
}

impl<K> Eq for ExpirationToken<K> {}

impl<K> PartialOrd for ExpirationToken<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K> Ord for ExpirationToken<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.stamp.cmp(&other.stamp)
    }
}

// Lets the schedule remove a token given only the stamp the primary map holds.
impl<K> Borrow<Stamp> for ExpirationToken<K> {
    fn borrow(&self) -> &Stamp {
        &self.stamp
    }
}
