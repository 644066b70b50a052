use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://us-central1-whispi-e61fa.cloudfunctions.net";
pub const DEFAULT_CHARACTER_PAGE_SIZE: u32 = 20;
pub const DEFAULT_HISTORY_LIMIT: u32 = 50;
pub const DEFAULT_ERROR_BANNER_SECS: u64 = 5;

/// Environment override for the API base URL, below `--api-base-url`.
pub const API_BASE_URL_ENV: &str = "WHISPI_API_BASE_URL";

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Root of the callable-function endpoints
    pub api_base_url: Option<String>,
    /// How many characters the picker requests from the catalog
    pub character_page_size: Option<u32>,
    /// How many past messages are fetched when a chat is opened
    pub history_limit: Option<u32>,
    /// Seconds an error banner stays on screen
    pub error_banner_secs: Option<u64>,
}

impl Config {
    /// Flag beats environment beats file beats built-in default.
    pub fn resolve_api_base_url(&self, flag: Option<&str>, env: Option<String>) -> String {
        flag.map(str::to_string)
            .filter(|url| !url.trim().is_empty())
            .or_else(|| env.filter(|url| !url.trim().is_empty()))
            .or_else(|| self.api_base_url.clone())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
    }

    pub fn character_page_size(&self) -> u32 {
        self.character_page_size
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_CHARACTER_PAGE_SIZE)
    }

    pub fn history_limit(&self) -> u32 {
        self.history_limit
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
    }

    pub fn error_banner_duration(&self) -> Duration {
        Duration::from_secs(
            self.error_banner_secs
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_ERROR_BANNER_SECS),
        )
    }
}

/// Get a user-friendly display string for a path, using `~` for the home
/// directory on Unix-like systems.
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
