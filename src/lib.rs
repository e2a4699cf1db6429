//! # Evicting Map
//!
//! A thread-safe key-value map whose entries expire a fixed time after they
//! were last written.
//!
//! - Concurrent storage using `DashMap`
//! - Lazy eviction: every operation first sweeps entries that have fallen due,
//!   there is no background thread or task
//! - An expiration schedule ordered soonest-due first, so a sweep stops at the
//!   first token that is not yet due
//! - Writes (`put`, `replace`) restart the key's TTL
//!
//! ## Example
//!
//! ```rust
//! use evicting_map::EvictionMap;
//! use std::time::Duration;
//!
//! let map = EvictionMap::with_ttl(Duration::from_millis(100)).unwrap();
//!
//! map.put("session:42", "alice");
//! assert_eq!(map.get("session:42"), Some("alice"));
//!
//! std::thread::sleep(Duration::from_millis(100));
//! assert_eq!(map.get("session:42"), None);
//!
//! // A map without a TTL keeps entries until they are removed.
//! let forever: EvictionMap<&str, u32> = EvictionMap::new();
//! forever.put("answer", 42);
//! assert_eq!(forever.remove("answer"), Some(42));
//! ```

mod clock;
mod config;
mod error;
mod map;
mod ops;
mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{EvictionConfig, TTL_ENV_VAR};
pub use error::EvictionError;
pub use map::EvictionMap;
pub use ops::{BulkAccess, ExpiringMap};
