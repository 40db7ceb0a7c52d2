use crate::error::{env_error, SyncResult};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;
use toml;

/// Default size of the recency view
pub const DEFAULT_RECENT_LIMIT: usize = 5;

/// Default seconds between background refreshes (0 disables them)
pub const DEFAULT_REFRESH_INTERVAL: u64 = 300;

/// Main configuration structure for the sync monitor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the remote booking service
    pub api_base_url: String,
    /// User id the service books and cancels on behalf of
    pub owner_id: Option<String>,
    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,
    /// Number of appointments in the recency view
    pub recent_limit: usize,
    /// Seconds between background refreshes, 0 to disable
    pub refresh_interval_secs: u64,
    /// Map of component names to their enabled status
    pub components: HashMap<String, bool>,
}

impl Config {
    /// Load configuration from environment and config file
    pub fn load() -> SyncResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        // Required environment variables
        let api_base_url =
            env::var("APPOINTMENTS_API_URL").map_err(|_| env_error("APPOINTMENTS_API_URL"))?;

        // Optional owner identity; create and cancel refuse to run without it
        let owner_id = env::var("APPOINTMENTS_OWNER_ID").ok().filter(|v| !v.is_empty());

        // Parse numeric values
        let request_timeout_secs = match env::var("REQUEST_TIMEOUT_SECS") {
            Ok(value) => value
                .parse::<u64>()
                .map_err(|_| env_error("Invalid REQUEST_TIMEOUT_SECS format"))?,
            Err(_) => 30,
        };

        let recent_limit = match env::var("RECENT_LIMIT") {
            Ok(value) => value
                .parse::<usize>()
                .map_err(|_| env_error("Invalid RECENT_LIMIT format"))?,
            Err(_) => DEFAULT_RECENT_LIMIT,
        };

        let refresh_interval_secs = match env::var("REFRESH_INTERVAL_SECS") {
            Ok(value) => value
                .parse::<u64>()
                .map_err(|_| env_error("Invalid REFRESH_INTERVAL_SECS format"))?,
            Err(_) => DEFAULT_REFRESH_INTERVAL,
        };

        // Initialize default components
        let mut components = HashMap::new();
        components.insert("appointments".to_string(), true);

        // Load components configuration from file if it exists
        if let Ok(content) = fs::read_to_string("config/components.toml") {
            if let Ok(file_components) = toml::from_str::<HashMap<String, bool>>(&content) {
                // Merge with defaults
                for (key, value) in file_components {
                    components.insert(key, value);
                }
            }
        }

        Ok(Config {
            api_base_url,
            owner_id,
            request_timeout_secs,
            recent_limit,
            refresh_interval_secs,
            components,
        })
    }

    /// Check if a component is enabled
    pub fn is_component_enabled(&self, name: &str) -> bool {
        *self.components.get(name).unwrap_or(&false)
    }

    /// Update component enabled status
    #[allow(dead_code)]
    pub fn set_component_enabled(&mut self, name: &str, enabled: bool) -> SyncResult<()> {
        self.components.insert(name.to_string(), enabled);
        self.save_components()
    }

    /// Save component configuration to file
    #[allow(dead_code)]
    fn save_components(&self) -> SyncResult<()> {
        // Create config directory if it doesn't exist
        if !Path::new("config").exists() {
            fs::create_dir("config")?;
        }

        let toml_str = toml::to_string(&self.components)?;
        fs::write("config/components.toml", toml_str)?;

        Ok(())
    }
}
