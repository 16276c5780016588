use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use tracing::debug;
use url::Url;

use crate::config::FeedConfig;
use crate::error::SyncError;

use super::types::SheetLocator;

/// Source of raw sheet payloads.
///
/// Implementations resolve exactly once per call: with the payload text, or with
/// a [`SyncError::Transport`]. Callers never retry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
  async fn fetch(&self, workbook_id: &str, locator: &SheetLocator) -> Result<String, SyncError>;
}

/// HTTP client for the public list feed of a published workbook.
#[derive(Clone)]
pub struct FeedClient {
  http: reqwest::Client,
  base_url: Url,
}

impl FeedClient {
  pub fn new(config: &FeedConfig) -> Result<Self> {
    let base_url = Url::parse(&config.base_url)
      .map_err(|e| eyre!("Invalid feed base URL {}: {}", config.base_url, e))?;

    if base_url.cannot_be_a_base() {
      return Err(eyre!("Feed base URL cannot be a base: {}", config.base_url));
    }

    let http = reqwest::Client::builder()
      .user_agent(concat!("sheetfeed/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { http, base_url })
  }

  /// `<base>/feeds/list/<workbook>/<locator>/public/values?alt=json`
  pub fn feed_url(&self, workbook_id: &str, locator: &SheetLocator) -> Url {
    let locator = locator.to_string();
    let mut url = self.base_url.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
      segments.pop_if_empty().extend([
        "feeds",
        "list",
        workbook_id,
        locator.as_str(),
        "public",
        "values",
      ]);
    }
    url.query_pairs_mut().clear().append_pair("alt", "json");
    url
  }
}

#[async_trait]
impl RemoteFetcher for FeedClient {
  async fn fetch(&self, workbook_id: &str, locator: &SheetLocator) -> Result<String, SyncError> {
    let url = self.feed_url(workbook_id, locator);
    debug!(%url, %locator, "requesting sheet feed");

    let response = self
      .http
      .get(url)
      .send()
      .await
      .map_err(|e| SyncError::transport(locator, e))?;

    let status = response.status();
    if !status.is_success() {
      return Err(SyncError::transport(
        locator,
        format!("server answered {}", status),
      ));
    }

    response
      .text()
      .await
      .map_err(|e| SyncError::transport(locator, e))
  }
}
