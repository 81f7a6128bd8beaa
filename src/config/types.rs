//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration loaded from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangesConfig {
    /// Live feed settings.
    pub live: LiveConfig,
    /// Heuristic detector settings.
    pub heuristic: HeuristicConfig,
    /// Session log locations.
    pub sessions: SessionsConfig,
}

/// Live feed configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    /// Delay between seeing a change and delivering it.
    pub delivery_delay_ms: u64,
    /// Fallback poll interval when no log activity is reported.
    pub poll_interval_ms: u64,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            delivery_delay_ms: 500,
            poll_interval_ms: 1000,
        }
    }
}

impl LiveConfig {
    #[must_use]
    pub fn delivery_delay(&self) -> Duration {
        Duration::from_millis(self.delivery_delay_ms)
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

/// Heuristic detector configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicConfig {
    /// Run the detector alongside the live feed.
    pub enabled: bool,
    /// Wait after a file event before reading the file.
    pub settle_delay_ms: u64,
    /// Files with more characters than this are skipped.
    pub max_content_chars: usize,
    /// Glob patterns of paths never reported.
    pub exclude: Vec<String>,
    /// File extensions watched in the workspace.
    pub extensions: Vec<String>,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            settle_delay_ms: 300,
            max_content_chars: 10_000,
            exclude: [
                "**/node_modules/**",
                "**/.git/**",
                "**/target/**",
                "**/dist/**",
                "**/build/**",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            extensions: [
                "rs", "toml", "md", "txt", "json", "yaml", "yml", "js", "jsx", "ts", "tsx",
                "py", "go", "java", "kt", "c", "h", "cpp", "hpp", "cs", "rb", "php", "swift",
                "sh", "css", "scss", "html", "vue", "svelte", "sql",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl HeuristicConfig {
    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// Where to look for session logs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionsConfig {
    /// Instance roots. Empty means the default roots.
    pub roots: Vec<PathBuf>,
}

impl SessionsConfig {
    /// Configured roots, or the default instance roots when none are set.
    #[must_use]
    pub fn resolved_roots(&self) -> Vec<PathBuf> {
        if self.roots.is_empty() {
            crate::session::default_instance_roots()
        } else {
            self.roots.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ChangesConfig::default();
        assert_eq!(config.live.delivery_delay(), Duration::from_millis(500));
        assert_eq!(config.live.poll_interval(), Duration::from_secs(1));
        assert!(!config.heuristic.enabled);
        assert_eq!(config.heuristic.settle_delay(), Duration::from_millis(300));
        assert_eq!(config.heuristic.max_content_chars, 10_000);
        assert!(config
            .heuristic
            .exclude
            .contains(&"**/node_modules/**".to_string()));
        assert!(config.heuristic.extensions.contains(&"rs".to_string()));
        assert!(config.sessions.roots.is_empty());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let toml_str = r"
            [live]
            delivery_delay_ms = 250

            [heuristic]
            enabled = true
        ";

        let config: ChangesConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.live.delivery_delay_ms, 250);
        assert_eq!(config.live.poll_interval_ms, 1000);
        assert!(config.heuristic.enabled);
        assert_eq!(config.heuristic.settle_delay_ms, 300);
        assert_eq!(config.heuristic.exclude.len(), 5);
    }

    #[test]
    fn test_zero_poll_interval_is_clamped() {
        let config = LiveConfig {
            poll_interval_ms: 0,
            ..LiveConfig::default()
        };
        assert_eq!(config.poll_interval(), Duration::from_millis(1));
    }

    #[test]
    fn test_explicit_roots_win() {
        let config = SessionsConfig {
            roots: vec![PathBuf::from("/custom/.claude")],
        };
        assert_eq!(config.resolved_roots(), vec![PathBuf::from("/custom/.claude")]);
    }
}
