use thiserror::Error;

/// Failures local to a single sheet's synchronisation.
///
/// None of these abort a workbook pass; each is reported against the sheet it
/// happened on.
#[derive(Debug, Error)]
pub enum SyncError {
  /// The fetch failed or the server answered with a non-success status.
  #[error("transport error for sheet {locator}: {message}")]
  Transport { locator: String, message: String },

  /// The payload could not be parsed into a feed document.
  #[error("malformed payload for sheet {locator}: {message}")]
  MalformedPayload { locator: String, message: String },

  /// The backing cache store failed.
  #[error("cache storage error: {0}")]
  Storage(String),
}

impl SyncError {
  pub fn transport(locator: impl ToString, message: impl ToString) -> Self {
    Self::Transport {
      locator: locator.to_string(),
      message: message.to_string(),
    }
  }

  pub fn malformed(locator: impl ToString, message: impl ToString) -> Self {
    Self::MalformedPayload {
      locator: locator.to_string(),
      message: message.to_string(),
    }
  }

  pub fn is_transport(&self) -> bool {
    matches!(self, Self::Transport { .. })
  }

  pub fn is_malformed(&self) -> bool {
    matches!(self, Self::MalformedPayload { .. })
  }

  /// Storage failures happen after the document was loaded; it stays usable.
  pub fn is_storage(&self) -> bool {
    matches!(self, Self::Storage(_))
  }
}

