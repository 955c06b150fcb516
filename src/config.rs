use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Result, anyhow};

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000";
pub const DEFAULT_REPLY_DELAY_MS: u64 = 500;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Which root view to mount. Only one is shown per run.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ScreenChoice {
    #[default]
    Chat,
    Login,
}

/// On-disk settings. Every field is optional so a partial file still loads.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub endpoint: Option<String>,
    pub reply_delay_ms: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub screen: Option<ScreenChoice>,
}

/// Values supplied on the command line; these win over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub endpoint: Option<String>,
    pub reply_delay_ms: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub screen: Option<ScreenChoice>,
}

/// Fully resolved settings used by the running app.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub endpoint: String,
    pub reply_delay: Duration,
    pub timeout: Duration,
    pub screen: ScreenChoice,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            reply_delay: Duration::from_millis(DEFAULT_REPLY_DELAY_MS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            screen: ScreenChoice::Chat,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)
            .map_err(|e| anyhow!("Invalid config file {}: {}", path.display(), e))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// Copy every value given on the command line into this config.
    pub fn remember(&mut self, overrides: &Overrides) {
        if let Some(endpoint) = &overrides.endpoint {
            self.endpoint = Some(endpoint.clone());
        }
        if let Some(ms) = overrides.reply_delay_ms {
            self.reply_delay_ms = Some(ms);
        }
        if let Some(secs) = overrides.timeout_secs {
            self.timeout_secs = Some(secs);
        }
        if let Some(screen) = overrides.screen {
            self.screen = Some(screen);
        }
    }

    /// Merge command line, file and defaults, in that order of precedence.
    pub fn resolve(&self, overrides: &Overrides) -> Settings {
        let defaults = Settings::default();

        let endpoint = overrides
            .endpoint
            .clone()
            .or_else(|| self.endpoint.clone())
            .unwrap_or(defaults.endpoint);

        let reply_delay = overrides
            .reply_delay_ms
            .or(self.reply_delay_ms)
            .map(Duration::from_millis)
            .unwrap_or(defaults.reply_delay);

        let timeout = overrides
            .timeout_secs
            .or(self.timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        let screen = overrides.screen.or(self.screen).unwrap_or(defaults.screen);

        Settings {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            reply_delay,
            timeout,
            screen,
        }
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("finsage").join("config.json"))
    }
}

pub fn default_log_path() -> Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .or_else(dirs::config_dir)
        .ok_or_else(|| anyhow!("Could not determine data directory"))?;

    Ok(data_dir.join("finsage").join("finsage.log"))
}
