use std::fmt;
use std::str::FromStr;

use crate::core::config::data::Config;
use crate::utils::url::validate_base_url;

/// Keys accepted by `whispi set` / `whispi unset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    ApiBaseUrl,
    CharacterPageSize,
    HistoryLimit,
    ErrorBannerSecs,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 4] = [
        ConfigKey::ApiBaseUrl,
        ConfigKey::CharacterPageSize,
        ConfigKey::HistoryLimit,
        ConfigKey::ErrorBannerSecs,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConfigKey::ApiBaseUrl => "api-base-url",
            ConfigKey::CharacterPageSize => "character-page-size",
            ConfigKey::HistoryLimit => "history-limit",
            ConfigKey::ErrorBannerSecs => "error-banner-secs",
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<_> = ConfigKey::ALL.iter().map(|k| k.as_str()).collect();
                format!("Unknown config key: {s} (known keys: {})", known.join(", "))
            })
    }
}

fn parse_positive<T>(key: ConfigKey, value: &str) -> Result<T, String>
where
    T: FromStr + PartialOrd + Default,
{
    match value.trim().parse::<T>() {
        Ok(n) if n > T::default() => Ok(n),
        _ => Err(format!("{key} expects a positive whole number, got '{value}'")),
    }
}

impl Config {
    pub fn set_value(&mut self, key: ConfigKey, value: &str) -> Result<(), String> {
        match key {
            ConfigKey::ApiBaseUrl => self.api_base_url = Some(validate_base_url(value)?),
            ConfigKey::CharacterPageSize => {
                self.character_page_size = Some(parse_positive(key, value)?)
            }
            ConfigKey::HistoryLimit => self.history_limit = Some(parse_positive(key, value)?),
            ConfigKey::ErrorBannerSecs => {
                self.error_banner_secs = Some(parse_positive(key, value)?)
            }
        }
        Ok(())
    }

    pub fn unset_value(&mut self, key: ConfigKey) {
        match key {
            ConfigKey::ApiBaseUrl => self.api_base_url = None,
            ConfigKey::CharacterPageSize => self.character_page_size = None,
            ConfigKey::HistoryLimit => self.history_limit = None,
            ConfigKey::ErrorBannerSecs => self.error_banner_secs = None,
        }
    }
}
