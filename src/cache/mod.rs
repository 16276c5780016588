//! Time-boxed persistent cache for raw sheet payloads.
//!
//! Entries carry no expiry of their own: a single epoch, owned by the
//! [`FreshnessGate`], decides whether anything in the store may be trusted. When
//! the epoch is older than the TTL the whole store is wiped at once.

mod freshness;
mod storage;
mod traits;

pub use freshness::FreshnessGate;
pub use storage::{CacheStorage, MemoryStorage, NoopStorage, SqliteStorage};
pub use traits::{Clock, LoadSource, SystemClock};

#[cfg(test)]
pub use traits::ManualClock;
