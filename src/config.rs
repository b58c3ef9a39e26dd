use crate::catalog::SortKey;
use crate::error::ExplorerError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_CATALOG_URL: &str = "https://cdn.jsdelivr.net/gh/NikeGtag/data@main/games.json";
pub const DEFAULT_COVER_URL: &str = "https://cdn.jsdelivr.net/gh/gn-math/covers@main";
pub const DEFAULT_HTML_URL: &str = "https://cdn.jsdelivr.net/gh/gn-math/html@main";
pub const DEFAULT_POPULARITY_URL: &str =
    "https://data.jsdelivr.com/v1/stats/packages/gh/gn-math/html@main/files?period=year";

/// Endpoints and local paths used by the explorer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    pub catalog_url: String,
    /// Substituted for `{COVER_URL}`.
    pub cover_url: String,
    /// Substituted for `{HTML_URL}`.
    pub html_url: String,
    pub popularity_url: String,
    pub download_dir: PathBuf,
    pub default_sort: SortKey,
    pub request_timeout_secs: u64,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        let download_dir = directories::UserDirs::new()
            .and_then(|dirs| dirs.download_dir().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            cover_url: DEFAULT_COVER_URL.to_string(),
            html_url: DEFAULT_HTML_URL.to_string(),
            popularity_url: DEFAULT_POPULARITY_URL.to_string(),
            download_dir,
            default_sort: SortKey::Name,
            request_timeout_secs: 30,
        }
    }
}

impl ExplorerConfig {
    /// Location of the config file when none is given on the command line.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "zone-explorer", "zone-explorer")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load the config file, falling back to defaults when it does not exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ExplorerError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) => p,
                None => {
                    debug!("No config directory available, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        if !path.exists() {
            debug!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&path)?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| {
            ExplorerError::ConfigurationError(format!("{}: {}", path.display(), e))
        })?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}
