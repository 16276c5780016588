//! Serde types matching the published list-feed JSON.
//!
//! Only the envelope is typed; entries stay as raw maps and are turned into
//! [`RawRowRecord`](super::types::RawRowRecord)s so that unknown keys survive.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Prefix the feed puts in front of every column key (`gsx$source`).
pub const COLUMN_PREFIX: &str = "gsx$";

/// Key holding a cell's text content (`{"$t": "..."}`).
pub const CELL_TEXT_KEY: &str = "$t";

#[derive(Debug, Deserialize)]
pub struct ApiFeedPayload {
  pub feed: ApiFeed,
}

#[derive(Debug, Deserialize)]
pub struct ApiFeed {
  pub title: Option<ApiText>,
  // The feed omits `entry` entirely for a sheet with no data rows
  #[serde(default)]
  pub entry: Vec<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
pub struct ApiText {
  #[serde(rename = "$t", default)]
  pub text: String,
}
