use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::SyncError;

use super::api_types::{ApiFeedPayload, CELL_TEXT_KEY, COLUMN_PREFIX};

/// Pointer to one tab of a workbook.
///
/// Either the feed's opaque worksheet id (`od6`) or the 1-based position of the
/// tab. Both forms are only ever used as cache keys and fetch parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SheetLocator {
  Position(u32),
  Id(String),
}

impl SheetLocator {
  /// Key under which this sheet's payload is cached.
  pub fn cache_key(&self) -> String {
    self.to_string()
  }
}

impl fmt::Display for SheetLocator {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Position(p) => write!(f, "{}", p),
      Self::Id(id) => f.write_str(id),
    }
  }
}

impl From<&str> for SheetLocator {
  fn from(id: &str) -> Self {
    Self::Id(id.to_string())
  }
}

impl From<u32> for SheetLocator {
  fn from(position: u32) -> Self {
    Self::Position(position)
  }
}

/// A remote workbook and the sheets of it we care about.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorkbookSource {
  pub id: String,
  /// Logical sheet name -> locator
  #[serde(default)]
  pub sheets: BTreeMap<String, SheetLocator>,
}

impl WorkbookSource {
  pub fn new(id: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      sheets: BTreeMap::new(),
    }
  }

  pub fn with_sheet(mut self, name: impl Into<String>, locator: impl Into<SheetLocator>) -> Self {
    self.sheets.insert(name.into(), locator.into());
    self
  }

  /// Locator configured for a logical sheet name.
  pub fn locator(&self, name: &str) -> Option<&SheetLocator> {
    self.sheets.get(name)
  }

  /// Link to the workbook's editor.
  pub fn edit_url(&self) -> String {
    format!("https://docs.google.com/spreadsheets/d/{}/edit", self.id)
  }
}

/// One row of a sheet as delivered by the feed.
///
/// Column cells are indexed by their logical column name (lower case, no spaces,
/// as the feed derives it from the header row). Any other entry keys are kept
/// untouched in `extra`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRowRecord {
  cells: BTreeMap<String, String>,
  extra: BTreeMap<String, Value>,
}

impl RawRowRecord {
  pub(crate) fn from_entry(entry: Map<String, Value>) -> Self {
    let mut row = Self::default();
    for (key, value) in entry {
      let column = key.strip_prefix(COLUMN_PREFIX).map(str::to_string);
      let text = value
        .get(CELL_TEXT_KEY)
        .and_then(Value::as_str)
        .map(str::to_string);
      match (column, text) {
        (Some(column), Some(text)) => {
          row.cells.insert(column, text);
        }
        _ => {
          row.extra.insert(key, value);
        }
      }
    }
    row
  }

  /// Raw text of a column cell, including empty text.
  pub fn cell(&self, column: &str) -> Option<&str> {
    self.cells.get(column).map(String::as_str)
  }

  /// Non-column entry data (ids, links, timestamps).
  pub fn extra(&self, key: &str) -> Option<&Value> {
    self.extra.get(key)
  }
}

impl<const N: usize> From<[(&str, &str); N]> for RawRowRecord {
  fn from(cells: [(&str, &str); N]) -> Self {
    Self {
      cells: cells
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect(),
      extra: BTreeMap::new(),
    }
  }
}

/// A parsed sheet payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFeedDocument {
  pub title: Option<String>,
  pub rows: Vec<RawRowRecord>,
}

impl RawFeedDocument {
  /// Parse a raw feed payload.
  ///
  /// Only the presence of the `feed` object is checked; a feed without entries
  /// is an empty sheet.
  pub fn parse(locator: &SheetLocator, payload: &str) -> Result<Self, SyncError> {
    let payload: ApiFeedPayload =
      serde_json::from_str(payload).map_err(|e| SyncError::malformed(locator, e))?;

    let feed = payload.feed;
    Ok(Self {
      title: feed.title.map(|t| t.text),
      rows: feed.entry.into_iter().map(RawRowRecord::from_entry).collect(),
    })
  }

  pub fn from_rows(rows: Vec<RawRowRecord>) -> Self {
    Self { title: None, rows }
  }

  pub fn is_empty(&self) -> bool {
    self.rows.is_empty()
  }
}
