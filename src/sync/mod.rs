//! Cache-or-fetch synchronisation of workbook sheets into memory.

mod documents;
mod sheet;
mod workbook;

pub use documents::DocumentSet;
pub use sheet::SheetSync;
pub use workbook::{SyncReport, WorkbookSync};
