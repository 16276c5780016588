use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::watch;

use crate::sheets::{RawFeedDocument, SheetLocator};

/// In-memory set of loaded sheet documents, keyed by locator.
///
/// Loading a sheet replaces its whole document. Every replacement bumps a
/// revision counter that observers can wait on through [`DocumentSet::subscribe`].
#[derive(Debug)]
pub struct DocumentSet {
  documents: RwLock<HashMap<SheetLocator, Arc<RawFeedDocument>>>,
  revision: watch::Sender<u64>,
}

impl Default for DocumentSet {
  fn default() -> Self {
    Self::new()
  }
}

impl DocumentSet {
  pub fn new() -> Self {
    let (revision, _) = watch::channel(0);
    Self {
      documents: RwLock::new(HashMap::new()),
      revision,
    }
  }

  pub(crate) fn insert(&self, locator: SheetLocator, document: RawFeedDocument) {
    self
      .documents
      .write()
      .unwrap_or_else(PoisonError::into_inner)
      .insert(locator, Arc::new(document));
    self.revision.send_modify(|r| *r += 1);
  }

  pub fn get(&self, locator: &SheetLocator) -> Option<Arc<RawFeedDocument>> {
    self
      .documents
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .get(locator)
      .cloned()
  }

  pub fn contains(&self, locator: &SheetLocator) -> bool {
    self
      .documents
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .contains_key(locator)
  }

  pub fn len(&self) -> usize {
    self
      .documents
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Copy of the current locator -> document mapping.
  pub fn snapshot(&self) -> HashMap<SheetLocator, Arc<RawFeedDocument>> {
    self
      .documents
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }

  /// Number of document loads so far.
  pub fn revision(&self) -> u64 {
    *self.revision.borrow()
  }

  /// Receiver that is notified after every document load.
  pub fn subscribe(&self) -> watch::Receiver<u64> {
    self.revision.subscribe()
  }
}
