//! Configuration loading and management

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Default suggestion service location
const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";

/// Which implementation backs a platform speech capability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformBackend {
    /// Delegate to the connected UI shell
    Bridge,
    /// Capability absent
    None,
}

impl FromStr for PlatformBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bridge" => Ok(PlatformBackend::Bridge),
            "none" | "off" => Ok(PlatformBackend::None),
            other => bail!("unknown platform backend: {}", other),
        }
    }
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the Unix domain socket for IPC
    pub socket_path: PathBuf,

    /// Directory for runtime data
    pub data_dir: PathBuf,

    /// Base URL of the suggestion service
    pub api_base: String,

    /// How long a finalized transcript line stays on screen
    pub line_lifetime: Duration,

    /// How long a status message stays visible
    pub status_lifetime: Duration,

    /// Timeout for suggestion service requests
    pub request_timeout: Duration,

    pub recognizer: PlatformBackend,
    pub synthesizer: PlatformBackend,
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let home = lookup("HOME").context("HOME is not set")?;
        let data_dir = PathBuf::from(&home)
            .join(".local")
            .join("share")
            .join("aac-companion");

        let socket_path = lookup("AAC_SOCKET_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("daemon.sock"));

        let api_base = lookup("AAC_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        Ok(Self {
            socket_path,
            data_dir,
            api_base,
            line_lifetime: millis(&lookup, "AAC_LINE_LIFETIME_MS", 5000)?,
            status_lifetime: millis(&lookup, "AAC_STATUS_LIFETIME_MS", 3000)?,
            request_timeout: millis(&lookup, "AAC_REQUEST_TIMEOUT_MS", 10_000)?,
            recognizer: backend(&lookup, "AAC_RECOGNIZER")?,
            synthesizer: backend(&lookup, "AAC_SYNTHESIZER")?,
        })
    }

    /// Ensure data directory exists
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }
}

fn millis(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> Result<Duration> {
    match lookup(key) {
        Some(raw) => {
            let ms: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{} must be a number of milliseconds", key))?;
            Ok(Duration::from_millis(ms))
        }
        None => Ok(Duration::from_millis(default)),
    }
}

fn backend(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<PlatformBackend> {
    match lookup(key) {
        Some(raw) => raw.parse::<PlatformBackend>().with_context(|| format!("invalid {}", key)),
        None => Ok(PlatformBackend::Bridge),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load_with(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_config_defaults() {
        let config = load_with(&[("HOME", "/home/test")]).unwrap();
        assert!(config.socket_path.to_string_lossy().contains("aac-companion"));
        assert_eq!(config.api_base, "http://127.0.0.1:8000");
        assert_eq!(config.line_lifetime, Duration::from_secs(5));
        assert_eq!(config.status_lifetime, Duration::from_secs(3));
        assert_eq!(config.recognizer, PlatformBackend::Bridge);
    }

    #[test]
    fn test_config_overrides() {
        let config = load_with(&[
            ("HOME", "/home/test"),
            ("AAC_API_BASE", "http://10.0.0.2:9000"),
            ("AAC_LINE_LIFETIME_MS", "8000"),
            ("AAC_SYNTHESIZER", "none"),
        ])
        .unwrap();
        assert_eq!(config.api_base, "http://10.0.0.2:9000");
        assert_eq!(config.line_lifetime, Duration::from_secs(8));
        assert_eq!(config.synthesizer, PlatformBackend::None);
    }

    #[test]
    fn test_config_rejects_bad_values() {
        assert!(load_with(&[("HOME", "/h"), ("AAC_LINE_LIFETIME_MS", "soon")]).is_err());
        assert!(load_with(&[("HOME", "/h"), ("AAC_RECOGNIZER", "whisper")]).is_err());
        assert!(load_with(&[]).is_err());
    }
}
