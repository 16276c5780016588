//! Projection of raw sheet rows into typed records.
//!
//! A projection function is a combined map and filter: it receives one row and
//! returns `Some(record)` to keep it or `None` to drop it. Output order always
//! follows document order.
//!
//! # Example
//!
//! ```
//! use sheetfeed::projection::{get_field, project_document};
//! use sheetfeed::sheets::{RawFeedDocument, RawRowRecord};
//!
//! let doc = RawFeedDocument::from_rows(vec![
//!   RawRowRecord::from([("name", "Ada")]),
//!   RawRowRecord::from([("name", "")]),
//! ]);
//! let names = project_document(&doc, |row| get_field(row, "name").map(String::from));
//! assert_eq!(names, vec!["Ada".to_string()]);
//! ```

use serde::Serialize;

use crate::sheets::{RawFeedDocument, RawRowRecord, SheetLocator};
use crate::sync::DocumentSet;

/// Text of a column cell, or `None` if the column is missing or empty.
///
/// Absence is an ordinary outcome every projection has to handle.
pub fn get_field<'r>(row: &'r RawRowRecord, column: &str) -> Option<&'r str> {
  row.cell(column).filter(|text| !text.is_empty())
}

/// Apply `projection` to every row of `document`, keeping the `Some` results.
pub fn project_document<T, F>(document: &RawFeedDocument, projection: F) -> Vec<T>
where
  F: FnMut(&RawRowRecord) -> Option<T>,
{
  document.rows.iter().filter_map(projection).collect()
}

/// Project the document loaded for `locator`.
///
/// Returns `None` if that sheet has not been loaded yet, which is distinct from
/// a loaded sheet with no matching rows (`Some` of an empty vec).
pub fn project<T, F>(
  documents: &DocumentSet,
  locator: &SheetLocator,
  projection: F,
) -> Option<Vec<T>>
where
  F: FnMut(&RawRowRecord) -> Option<T>,
{
  let document = documents.get(locator)?;
  Some(project_document(&document, projection))
}

/// Entry of the pictures sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Picture {
  pub link: String,
  pub name: Option<String>,
}

/// Highest `status` value a picture row may carry and still be shown.
pub const MAX_PICTURE_STATUS: f64 = 400.0;

/// Keep rows with a usable `source` link whose `status` is not an error.
///
/// A row is dropped when `source` is missing, empty or the literal `FALSE`, or
/// when `status` is a number above 400. A status that is missing or not a number
/// does not drop the row.
pub fn picture(row: &RawRowRecord) -> Option<Picture> {
  let link = get_field(row, "source")?;
  if link == "FALSE" {
    return None;
  }

  let status = get_field(row, "status").and_then(|s| s.trim().parse::<f64>().ok());
  if status.is_some_and(|s| s > MAX_PICTURE_STATUS) {
    return None;
  }

  Some(Picture {
    link: link.to_string(),
    name: get_field(row, "item").map(String::from),
  })
}
