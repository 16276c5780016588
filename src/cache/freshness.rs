//! Single-epoch freshness policy for the whole cache.

use chrono::{DateTime, Duration, Utc};
use color_eyre::{eyre::eyre, Result};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::storage::CacheStorage;
use super::traits::{Clock, SystemClock};

/// Decides whether the cache as a whole may be trusted.
///
/// The gate owns one epoch timestamp for the entire store. Checking freshness is
/// not a pure predicate: a missing epoch is recorded, and an epoch older than the
/// TTL wipes every entry and starts a new one.
pub struct FreshnessGate<S: CacheStorage> {
  storage: Arc<S>,
  ttl: Duration,
  clock: Arc<dyn Clock>,
  epoch: Mutex<Option<DateTime<Utc>>>,
}

impl<S: CacheStorage> FreshnessGate<S> {
  /// Create a gate over `storage`, picking up any epoch it already persisted.
  pub fn new(storage: Arc<S>, ttl: Duration) -> Result<Self> {
    Self::with_clock(storage, ttl, Arc::new(SystemClock))
  }

  pub fn with_clock(storage: Arc<S>, ttl: Duration, clock: Arc<dyn Clock>) -> Result<Self> {
    let epoch = storage.epoch()?;
    Ok(Self {
      storage,
      ttl,
      clock,
      epoch: Mutex::new(epoch),
    })
  }

  pub fn storage(&self) -> &Arc<S> {
    &self.storage
  }

  /// The current epoch, if any.
  pub fn epoch(&self) -> Option<DateTime<Utc>> {
    self.epoch.lock().ok().and_then(|e| *e)
  }

  /// Returns `true` if cached entries may be trusted.
  ///
  /// May record a new epoch and may clear the whole store.
  pub fn check_freshness(&self) -> Result<bool> {
    let mut epoch = self
      .epoch
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    self.check_locked(&mut epoch)
  }

  /// Read `key` only if the cache is fresh, as one step.
  ///
  /// No other freshness check can slip between the decision and the read.
  pub fn read_if_fresh(&self, key: &str) -> Result<Option<String>> {
    let mut epoch = self
      .epoch
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    if !self.check_locked(&mut epoch)? {
      return Ok(None);
    }
    self.storage.get(key)
  }

  fn check_locked(&self, epoch: &mut Option<DateTime<Utc>>) -> Result<bool> {
    let now = self.clock.now();

    match *epoch {
      None => {
        debug!(%now, "no cache epoch, starting one");
        self.record_epoch(epoch, now)?;
        Ok(false)
      }
      Some(started) if now - started > self.ttl => {
        self.storage.clear_all()?;
        self.record_epoch(epoch, now)?;
        info!(%started, ttl_ms = self.ttl.num_milliseconds(), "cache reset");
        Ok(false)
      }
      Some(_) => Ok(true),
    }
  }

  fn record_epoch(&self, epoch: &mut Option<DateTime<Utc>>, now: DateTime<Utc>) -> Result<()> {
    self.storage.set_epoch(now)?;
    *epoch = Some(now);
    Ok(())
  }
}
