use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::sheets::{SheetLocator, WorkbookSource};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub workbook: WorkbookSource,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub feed: FeedConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// How long a cache epoch stays valid, in milliseconds
  #[serde(default = "default_ttl_ms")]
  pub ttl_ms: u64,
  /// Set to false to always fetch
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Database location (defaults to the platform data directory)
  pub path: Option<PathBuf>,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      ttl_ms: default_ttl_ms(),
      enabled: true,
      path: None,
    }
  }
}

impl CacheConfig {
  pub fn ttl(&self) -> chrono::Duration {
    chrono::Duration::milliseconds(i64::try_from(self.ttl_ms).unwrap_or(i64::MAX))
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
  #[serde(default = "default_base_url")]
  pub base_url: String,
}

impl Default for FeedConfig {
  fn default() -> Self {
    Self {
      base_url: default_base_url(),
    }
  }
}

fn default_ttl_ms() -> u64 {
  5000
}

fn default_true() -> bool {
  true
}

fn default_base_url() -> String {
  "https://spreadsheets.google.com".to_string()
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./sheetfeed.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/sheetfeed/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/sheetfeed/config.yaml"
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("sheetfeed.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("sheetfeed").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::from_yaml(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  pub fn from_yaml(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;
    config.validate()?;
    Ok(config)
  }

  fn validate(&self) -> Result<()> {
    if self.workbook.id.trim().is_empty() {
      return Err(eyre!("workbook.id must not be empty"));
    }

    for (name, locator) in &self.workbook.sheets {
      match locator {
        SheetLocator::Position(0) => {
          return Err(eyre!("sheet {}: positions start at 1", name));
        }
        SheetLocator::Id(id) if id.trim().is_empty() => {
          return Err(eyre!("sheet {}: empty sheet id", name));
        }
        _ => {}
      }
    }

    Ok(())
  }
}
