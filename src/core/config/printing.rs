use crate::core::config::data::{Config, API_BASE_URL_ENV};

impl Config {
    pub fn print_all(&self) {
        println!("Current configuration:");
        match &self.api_base_url {
            Some(url) => println!("  api-base-url: {url}"),
            None => println!(
                "  api-base-url: (unset, using {})",
                self.resolve_api_base_url(None, None)
            ),
        }
        if let Ok(env_url) = std::env::var(API_BASE_URL_ENV) {
            println!("    overridden by {API_BASE_URL_ENV}={env_url}");
        }
        println!("  character-page-size: {}", self.character_page_size());
        println!("  history-limit: {}", self.history_limit());
        println!(
            "  error-banner-secs: {}",
            self.error_banner_duration().as_secs()
        );
    }
}
