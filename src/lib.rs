//! Cache-or-fetch synchronisation for published spreadsheet feeds.
//!
//! A [`sync::WorkbookSync`] drives one load per configured sheet: fresh cached
//! payloads are served from a [`cache::CacheStorage`], everything else is fetched
//! through a [`sheets::RemoteFetcher`] and written back. Loaded documents are read
//! through the [`projection`] pipeline.

pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod projection;
pub mod sheets;
pub mod sync;

pub use error::SyncError;
