//! Cache-or-fetch load of a single sheet.

use tracing::{debug, info, warn};

use crate::cache::{CacheStorage, FreshnessGate, LoadSource};
use crate::error::SyncError;
use crate::sheets::{RawFeedDocument, RemoteFetcher, SheetLocator};

use super::documents::DocumentSet;

/// Loads one sheet into the document set.
///
/// 1. If the cache is fresh and holds a payload for the sheet, parse it and stop.
/// 2. Otherwise fetch, parse, store the document, then write the raw payload
///    back to the cache.
pub struct SheetSync<'a, S: CacheStorage> {
  workbook_id: &'a str,
  gate: &'a FreshnessGate<S>,
  fetcher: &'a dyn RemoteFetcher,
  documents: &'a DocumentSet,
}

impl<'a, S: CacheStorage> SheetSync<'a, S> {
  pub fn new(
    workbook_id: &'a str,
    gate: &'a FreshnessGate<S>,
    fetcher: &'a dyn RemoteFetcher,
    documents: &'a DocumentSet,
  ) -> Self {
    Self {
      workbook_id,
      gate,
      fetcher,
      documents,
    }
  }

  pub async fn run(&self, locator: &SheetLocator) -> Result<LoadSource, SyncError> {
    if self.load_from_cache(locator) {
      return Ok(LoadSource::Cache);
    }

    self.load_from_network(locator).await?;
    Ok(LoadSource::Network)
  }

  /// Returns `true` if the sheet was served from a fresh cache entry.
  fn load_from_cache(&self, locator: &SheetLocator) -> bool {
    let payload = match self.gate.read_if_fresh(&locator.cache_key()) {
      Ok(Some(payload)) => payload,
      Ok(None) => return false,
      Err(e) => {
        warn!(%locator, error = %e, "cache read failed, fetching instead");
        return false;
      }
    };

    match RawFeedDocument::parse(locator, &payload) {
      Ok(document) => {
        self.documents.insert(locator.clone(), document);
        info!(%locator, "data loaded from cache");
        true
      }
      Err(e) => {
        warn!(%locator, error = %e, "cached payload unreadable, fetching instead");
        false
      }
    }
  }

  async fn load_from_network(&self, locator: &SheetLocator) -> Result<(), SyncError> {
    debug!(workbook = self.workbook_id, %locator, "fetching sheet");
    let payload = self.fetcher.fetch(self.workbook_id, locator).await?;

    let document = RawFeedDocument::parse(locator, &payload)?;
    self.documents.insert(locator.clone(), document);
    info!(%locator, bytes = payload.len(), "data loaded from network");

    self
      .gate
      .storage()
      .set(&locator.cache_key(), &payload)
      .map_err(|e| SyncError::Storage(e.to_string()))?;
    debug!(%locator, "data cached");

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{ManualClock, MemoryStorage};
  use crate::sheets::MockRemoteFetcher;
  use chrono::{DateTime, Duration, TimeZone, Utc};
  use color_eyre::{eyre::eyre, Result};
  use std::sync::Arc;

  const PAYLOAD: &str =
    r#"{"feed":{"entry":[{"gsx$source":{"$t":"http://x"},"gsx$item":{"$t":"X"}}]}}"#;

  /// Memory storage whose entry reads or writes can be made to fail.
  #[derive(Default)]
  struct FlakyStorage {
    inner: MemoryStorage,
    fail_get: bool,
    fail_set: bool,
  }

  impl CacheStorage for FlakyStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
      if self.fail_get {
        return Err(eyre!("disk I/O error"));
      }
      self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
      if self.fail_set {
        return Err(eyre!("disk full"));
      }
      self.inner.set(key, value)
    }

    fn clear_all(&self) -> Result<()> {
      self.inner.clear_all()
    }

    fn epoch(&self) -> Result<Option<DateTime<Utc>>> {
      self.inner.epoch()
    }

    fn set_epoch(&self, epoch: DateTime<Utc>) -> Result<()> {
      self.inner.set_epoch(epoch)
    }
  }

  struct Fixture<S: CacheStorage> {
    gate: FreshnessGate<S>,
    clock: Arc<ManualClock>,
    documents: DocumentSet,
  }

  impl Fixture<MemoryStorage> {
    fn new() -> Self {
      Self::with_storage(MemoryStorage::new())
    }
  }

  impl<S: CacheStorage> Fixture<S> {
    fn with_storage(storage: S) -> Self {
      let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
      ));
      let gate =
        FreshnessGate::with_clock(Arc::new(storage), Duration::seconds(5), clock.clone()).unwrap();
      Self {
        gate,
        clock,
        documents: DocumentSet::new(),
      }
    }

    /// Seed a cache entry under a fresh epoch.
    fn seed(&self, key: &str, payload: &str) {
      self.gate.check_freshness().unwrap();
      self.gate.storage().set(key, payload).unwrap();
    }

    async fn run(
      &self,
      fetcher: &MockRemoteFetcher,
      locator: &SheetLocator,
    ) -> Result<LoadSource, SyncError> {
      SheetSync::new("wb", &self.gate, fetcher, &self.documents)
        .run(locator)
        .await
    }
  }

  #[tokio::test]
  async fn test_fresh_cache_hit_skips_fetch() {
    let fixture = Fixture::new();
    fixture.seed("od6", PAYLOAD);

    let mut fetcher = MockRemoteFetcher::new();
    fetcher.expect_fetch().times(0);

    let od6 = SheetLocator::from("od6");
    let source = fixture.run(&fetcher, &od6).await.unwrap();

    assert_eq!(source, LoadSource::Cache);
    let expected = RawFeedDocument::parse(&od6, PAYLOAD).unwrap();
    assert_eq!(*fixture.documents.get(&od6).unwrap(), expected);
  }

  #[tokio::test]
  async fn test_miss_fetches_and_writes_through() {
    let fixture = Fixture::new();

    let mut fetcher = MockRemoteFetcher::new();
    fetcher
      .expect_fetch()
      .withf(|workbook, locator| workbook == "wb" && *locator == SheetLocator::Position(2))
      .times(1)
      .returning(|_, _| Ok(PAYLOAD.to_string()));

    let locator = SheetLocator::Position(2);
    let source = fixture.run(&fetcher, &locator).await.unwrap();

    assert_eq!(source, LoadSource::Network);
    assert_eq!(
      fixture.gate.storage().get("2").unwrap().as_deref(),
      Some(PAYLOAD)
    );
    let doc = fixture.documents.get(&locator).unwrap();
    assert_eq!(doc.rows[0].cell("item"), Some("X"));
  }

  #[tokio::test]
  async fn test_expired_cache_is_refetched() {
    let fixture = Fixture::new();
    fixture.seed("od6", "stale payload");
    fixture.clock.advance(Duration::seconds(10));

    let mut fetcher = MockRemoteFetcher::new();
    fetcher
      .expect_fetch()
      .times(1)
      .returning(|_, _| Ok(PAYLOAD.to_string()));

    let source = fixture.run(&fetcher, &"od6".into()).await.unwrap();

    assert_eq!(source, LoadSource::Network);
    assert_eq!(
      fixture.gate.storage().get("od6").unwrap().as_deref(),
      Some(PAYLOAD)
    );
  }

  #[tokio::test]
  async fn test_unreadable_cache_entry_falls_back_to_fetch() {
    let fixture = Fixture::new();
    fixture.seed("od6", "not json");

    let mut fetcher = MockRemoteFetcher::new();
    fetcher
      .expect_fetch()
      .times(1)
      .returning(|_, _| Ok(PAYLOAD.to_string()));

    let source = fixture.run(&fetcher, &"od6".into()).await.unwrap();
    assert_eq!(source, LoadSource::Network);
  }

  #[tokio::test]
  async fn test_transport_failure_leaves_sheet_absent() {
    let fixture = Fixture::new();

    let mut fetcher = MockRemoteFetcher::new();
    fetcher
      .expect_fetch()
      .returning(|_, locator| Err(SyncError::transport(locator, "connection reset")));

    let od6 = SheetLocator::from("od6");
    let err = fixture.run(&fetcher, &od6).await.unwrap_err();

    assert!(err.is_transport());
    assert!(!fixture.documents.contains(&od6));
    assert_eq!(fixture.gate.storage().get("od6").unwrap(), None);
  }

  #[tokio::test]
  async fn test_malformed_payload_is_not_cached() {
    let fixture = Fixture::new();

    let mut fetcher = MockRemoteFetcher::new();
    fetcher
      .expect_fetch()
      .returning(|_, _| Ok("<html>quota exceeded</html>".to_string()));

    let od6 = SheetLocator::from("od6");
    let err = fixture.run(&fetcher, &od6).await.unwrap_err();

    assert!(err.is_malformed());
    assert!(!fixture.documents.contains(&od6));
    assert_eq!(fixture.gate.storage().get("od6").unwrap(), None);
  }

  #[tokio::test]
  async fn test_cache_read_failure_is_a_miss() {
    let fixture = Fixture::with_storage(FlakyStorage {
      fail_get: true,
      ..Default::default()
    });
    // Fresh epoch, so the entry read is actually attempted
    fixture.gate.check_freshness().unwrap();

    let mut fetcher = MockRemoteFetcher::new();
    fetcher
      .expect_fetch()
      .times(1)
      .returning(|_, _| Ok(PAYLOAD.to_string()));

    let od6 = SheetLocator::from("od6");
    let source = fixture.run(&fetcher, &od6).await.unwrap();

    assert_eq!(source, LoadSource::Network);
    assert!(fixture.documents.contains(&od6));
    assert_eq!(
      fixture.gate.storage().inner.get("od6").unwrap().as_deref(),
      Some(PAYLOAD)
    );
  }

  #[tokio::test]
  async fn test_cache_write_failure_keeps_document() {
    let fixture = Fixture::with_storage(FlakyStorage {
      fail_set: true,
      ..Default::default()
    });

    let mut fetcher = MockRemoteFetcher::new();
    fetcher
      .expect_fetch()
      .times(1)
      .returning(|_, _| Ok(r#"{"feed":{}}"#.to_string()));

    let od6 = SheetLocator::from("od6");
    let err = fixture.run(&fetcher, &od6).await.unwrap_err();

    assert!(matches!(err, SyncError::Storage(_)));
    assert!(fixture.documents.contains(&od6));
    assert!(fixture.gate.storage().inner.is_empty());
  }
}
