//! Workbook-wide synchronisation pass.

use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, info_span, warn, Instrument};

use crate::cache::{CacheStorage, FreshnessGate, LoadSource};
use crate::error::SyncError;
use crate::projection;
use crate::sheets::{RawRowRecord, RemoteFetcher, WorkbookSource};

use super::documents::DocumentSet;
use super::sheet::SheetSync;

/// Outcome of one pass, per logical sheet name.
#[derive(Debug, Default)]
pub struct SyncReport {
  pub sheets: BTreeMap<String, Result<LoadSource, SyncError>>,
}

impl SyncReport {
  /// Sheets that loaded, with where they came from.
  pub fn loaded(&self) -> impl Iterator<Item = (&str, LoadSource)> {
    self
      .sheets
      .iter()
      .filter_map(|(name, outcome)| outcome.as_ref().ok().map(|s| (name.as_str(), *s)))
  }

  pub fn failed(&self) -> impl Iterator<Item = (&str, &SyncError)> {
    self
      .sheets
      .iter()
      .filter_map(|(name, outcome)| outcome.as_ref().err().map(|e| (name.as_str(), e)))
  }

  pub fn is_complete(&self) -> bool {
    self.sheets.values().all(Result::is_ok)
  }
}

/// Keeps the documents of every configured sheet in sync.
///
/// Owns the document set; the gate and store are injected so one cache can
/// outlive several syncs within a session.
pub struct WorkbookSync<S: CacheStorage> {
  workbook: WorkbookSource,
  gate: Arc<FreshnessGate<S>>,
  fetcher: Arc<dyn RemoteFetcher>,
  documents: DocumentSet,
}

impl<S: CacheStorage> WorkbookSync<S> {
  pub fn new(
    workbook: WorkbookSource,
    gate: Arc<FreshnessGate<S>>,
    fetcher: Arc<dyn RemoteFetcher>,
  ) -> Self {
    Self {
      workbook,
      gate,
      fetcher,
      documents: DocumentSet::new(),
    }
  }

  pub fn workbook(&self) -> &WorkbookSource {
    &self.workbook
  }

  pub fn documents(&self) -> &DocumentSet {
    &self.documents
  }

  /// Notified after every document load.
  pub fn subscribe(&self) -> watch::Receiver<u64> {
    self.documents.subscribe()
  }

  /// Load every configured sheet, concurrently and independently.
  ///
  /// Freshness is re-checked for each sheet, so a TTL boundary crossed during
  /// the pass applies to the sheets checked after it.
  pub async fn sync_all(&self) -> SyncReport {
    info!(
      workbook = %self.workbook.id,
      sheets = self.workbook.sheets.len(),
      "synchronising workbook"
    );

    let tasks = self.workbook.sheets.keys().map(|name| async move {
      let outcome = self.sync_sheet(name).await;
      (name.clone(), outcome)
    });

    let sheets = join_all(tasks)
      .await
      .into_iter()
      .filter_map(|(name, outcome)| outcome.map(|o| (name, o)))
      .collect();

    SyncReport { sheets }
  }

  /// Load one sheet by logical name. `None` if the name is not configured.
  pub async fn sync_sheet(&self, name: &str) -> Option<Result<LoadSource, SyncError>> {
    let locator = self.workbook.locator(name)?;
    let span = info_span!("sheet", sheet = name, %locator);

    let outcome = SheetSync::new(
      &self.workbook.id,
      &self.gate,
      self.fetcher.as_ref(),
      &self.documents,
    )
    .run(locator)
    .instrument(span.clone())
    .await;

    if let Err(e) = &outcome {
      span.in_scope(|| warn!(error = %e, "sheet synchronisation failed"));
    }

    Some(outcome)
  }

  /// Project the rows of a sheet by logical name.
  ///
  /// `None` if the name is unknown or the sheet has not been loaded yet.
  pub fn project<T, F>(&self, sheet_name: &str, projection: F) -> Option<Vec<T>>
  where
    F: FnMut(&RawRowRecord) -> Option<T>,
  {
    let locator = self.workbook.locator(sheet_name)?;
    projection::project(&self.documents, locator, projection)
  }
}
