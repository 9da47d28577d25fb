use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration as StdDuration,
};

use oasis_client::api::DEFAULT_BASE_URL;

const CONFIG_ENV: &str = "SNAPSHOT_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "snapshot-config.toml";
/// One week; OASIS serves interval data for short ranges only.
const MAX_LOOKBACK_MINUTES: i64 = 7 * 24 * 60;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 60,
        }
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> StdDuration {
        StdDuration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub lookback_minutes: i64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self { lookback_minutes: 70 }
    }
}

impl WindowConfig {
    pub fn lookback(&self) -> time::Duration {
        time::Duration::minutes(self.lookback_minutes)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { dir: PathBuf::from(".") }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub window: WindowConfig,
    pub output: OutputConfig,
}

impl AppConfig {
    /// Reads `$SNAPSHOT_CONFIG` if set, else `snapshot-config.toml` if it
    /// exists, else the built-in defaults.
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        match env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(path),
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::from_file(DEFAULT_CONFIG_PATH),
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config {}: {e}", path.display()))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.window.lookback_minutes <= 0 {
            anyhow::bail!("window.lookback_minutes must be positive");
        }
        if self.window.lookback_minutes > MAX_LOOKBACK_MINUTES {
            anyhow::bail!("window.lookback_minutes must be at most {MAX_LOOKBACK_MINUTES}");
        }
        if self.api.request_timeout_secs == 0 {
            anyhow::bail!("api.request_timeout_secs must be positive");
        }
        Ok(())
    }
}
