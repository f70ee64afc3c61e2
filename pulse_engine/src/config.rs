use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct PulseConfig {
    pub page_size: usize,
    pub debounce_ms: u64,
    pub load_more_latency_ms: u64,
    /// Base URL of the remote suggestion/analytics provider. When unset the
    /// engine answers suggestions from local heuristics only.
    pub suggest_api_url: Option<String>,
    pub paths: PulsePaths,
}

impl PulseConfig {
    pub fn from_env() -> Result<Self> {
        let paths = PulsePaths::discover()?;
        Ok(Self::with_paths(paths))
    }

    pub fn with_paths(paths: PulsePaths) -> Self {
        let page_size = env::var("PULSE_PAGE_SIZE")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .filter(|size| *size > 0)
            .unwrap_or(10);
        let debounce_ms = env::var("PULSE_DEBOUNCE_MS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(300);
        let load_more_latency_ms = env::var("PULSE_LOAD_LATENCY_MS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(500);
        let suggest_api_url = env::var("PULSE_SUGGEST_API_URL")
            .ok()
            .and_then(|raw| {
                if raw.trim().is_empty() {
                    None
                } else {
                    Some(raw.trim().trim_end_matches('/').to_string())
                }
            });
        Self {
            page_size,
            debounce_ms,
            load_more_latency_ms,
            suggest_api_url,
            paths,
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn load_more_latency(&self) -> Duration {
        Duration::from_millis(self.load_more_latency_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct PulsePaths {
    pub base: PathBuf,
    pub data_dir: PathBuf,
    pub history_path: PathBuf,
    pub analytics_path: PathBuf,
}

impl PulsePaths {
    pub fn discover() -> Result<Self> {
        if let Ok(base) = env::var("PULSE_BASE_DIR") {
            return Self::from_base_dir(base);
        }
        let exe_path = std::env::current_exe()
            .map_err(|err| anyhow!("failed to resolve current executable: {err}"))?;
        let base = exe_path
            .parent()
            .ok_or_else(|| anyhow!("executable path missing parent"))?
            .to_path_buf();
        Self::from_base_dir(base)
    }

    pub fn from_base_dir<P: AsRef<Path>>(base: P) -> Result<Self> {
        let base = base.as_ref().to_path_buf();
        let data_dir = base.join("data");
        let history_path = data_dir.join("search_history.json");
        let analytics_path = data_dir.join("share_analytics.json");
        Ok(Self {
            base,
            data_dir,
            history_path,
            analytics_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_hang_off_the_base_dir() {
        let paths = PulsePaths::from_base_dir("/tmp/pulse").expect("paths");
        assert_eq!(paths.data_dir, PathBuf::from("/tmp/pulse/data"));
        assert_eq!(
            paths.history_path,
            PathBuf::from("/tmp/pulse/data/search_history.json")
        );
        assert_eq!(
            paths.analytics_path,
            PathBuf::from("/tmp/pulse/data/share_analytics.json")
        );
    }
}
