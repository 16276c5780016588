//! Remote workbook access and the feed document model.

mod api_types;
pub mod client;
pub mod types;

pub use client::{FeedClient, RemoteFetcher};
pub use types::{RawFeedDocument, RawRowRecord, SheetLocator, WorkbookSource};

#[cfg(test)]
pub use client::MockRemoteFetcher;
