use thiserror::Error;

/// Every failure the explorer can surface to the user.
#[derive(Error, Debug)]
pub enum ExplorerError {
    #[error("Catalog load failed: {0}")]
    CatalogLoad(String),

    #[error("Zone content failed: {0}")]
    ZoneContent(String),

    #[error("Popup blocked")]
    PopupBlocked,

    #[error("No game open")]
    NoZoneOpen,

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl ExplorerError {
    /// Text shown in the alert overlay (or in place of the grid).
    pub fn user_message(&self) -> String {
        match self {
            ExplorerError::CatalogLoad(msg) => format!("Error loading games: {}", msg),
            ExplorerError::ZoneContent(msg) => format!("Failed to load game: {}", msg),
            ExplorerError::PopupBlocked => {
                "Popup blocked! Allow popups or use Fullscreen.".to_string()
            }
            ExplorerError::NoZoneOpen => "No game open".to_string(),
            ExplorerError::ConfigurationError(msg) => format!("Configuration error: {}", msg),
            ExplorerError::IoError(e) => format!("File system error: {}", e),
            ExplorerError::SerializationError(e) => format!("Data format error: {}", e),
            ExplorerError::HttpError(e) => format!("Network error: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_for_blocked_popup() {
        let msg = ExplorerError::PopupBlocked.user_message();
        assert!(msg.starts_with("Popup blocked!"));
    }

    #[test]
    fn test_zone_content_message_wraps_reason() {
        let err = ExplorerError::ZoneContent("Game not found".to_string());
        assert_eq!(err.user_message(), "Failed to load game: Game not found");
    }

    #[test]
    fn test_no_zone_open_message() {
        assert_eq!(ExplorerError::NoZoneOpen.user_message(), "No game open");
    }
}
