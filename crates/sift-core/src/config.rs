//! Executor configuration
//!
//! Config is loaded with a three-layer resolution:
//! 1. Explicit path, or the override in the data dir
//!    (~/.local/share/sift/config/executor.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//! 3. Environment overrides (`SIFT_PAGE_SIZE`) applied last

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/executor.toml");

/// Environment variable overriding the default page size
pub const PAGE_SIZE_ENV: &str = "SIFT_PAGE_SIZE";

/// Page size used when neither the request nor the config sets one
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Hard upper bound for a page, whatever the config says
pub const MAX_PAGE_SIZE: usize = 1000;

/// Runtime settings for [`RuleExecutor`](crate::executor::RuleExecutor)
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutorConfig {
    /// Page size for full scans when the request does not set one
    pub default_page_size: usize,
    /// Upper bound applied to requested page sizes
    pub max_page_size: usize,
    /// Whether staged transfers are written to the store
    pub link_transfers: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            link_transfers: true,
        }
    }
}

impl ExecutorConfig {
    /// Load from the default override location, falling back to embedded defaults
    pub fn load() -> Result<Self> {
        let mut config = load_config(None)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from an explicit path (embedded defaults if it does not exist)
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = load_config(Some(path))?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Resolve the page size for a run, clamped to `[1, max_page_size]`
    pub fn page_size(&self, requested: Option<i64>) -> usize {
        let max = self.max_page_size.clamp(1, MAX_PAGE_SIZE);
        match requested {
            Some(size) if size < 1 => 1,
            Some(size) => (size as u64).min(max as u64) as usize,
            None => self.default_page_size.clamp(1, max),
        }
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(PAGE_SIZE_ENV) {
            match raw.trim().parse::<usize>() {
                Ok(size) => self.default_page_size = size,
                Err(_) => warn!("Ignoring invalid {}: {:?}", PAGE_SIZE_ENV, raw),
            }
        }
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("sift").join("config").join("executor.toml"))
}

/// Load configuration (override first, then default)
fn load_config(override_path: Option<&Path>) -> Result<ExecutorConfig> {
    let path = match override_path {
        Some(path) => Some(path.to_path_buf()),
        None => default_config_path(),
    };

    let content = match path {
        Some(path) if path.exists() => fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?,
        _ => DEFAULT_CONFIG.to_string(),
    };

    parse_config(&content)
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    paging: Option<RawPaging>,
    apply: Option<RawApply>,
}

#[derive(Debug, Deserialize)]
struct RawPaging {
    default_page_size: Option<usize>,
    max_page_size: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawApply {
    link_transfers: Option<bool>,
}

/// Parse config from TOML content
fn parse_config(content: &str) -> Result<ExecutorConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = ExecutorConfig::default();

    if let Some(paging) = raw.paging {
        if let Some(size) = paging.default_page_size {
            config.default_page_size = size;
        }
        if let Some(max) = paging.max_page_size {
            if max > MAX_PAGE_SIZE {
                warn!(
                    "max_page_size {} exceeds hard limit, using {}",
                    max, MAX_PAGE_SIZE
                );
            }
            config.max_page_size = max.min(MAX_PAGE_SIZE);
        }
    }

    if let Some(apply) = raw.apply {
        if let Some(link) = apply.link_transfers {
            config.link_transfers = link;
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_default_config() {
        let config = parse_config(DEFAULT_CONFIG).unwrap();
        assert_eq!(config, ExecutorConfig::default());
    }

    #[test]
    fn test_parse_partial_config() {
        let config = parse_config("[paging]\ndefault_page_size = 25\n").unwrap();
        assert_eq!(config.default_page_size, 25);
        assert_eq!(config.max_page_size, MAX_PAGE_SIZE);
        assert!(config.link_transfers);
    }

    #[test]
    fn test_max_page_size_is_capped() {
        let config = parse_config("[paging]\nmax_page_size = 5000\n").unwrap();
        assert_eq!(config.max_page_size, MAX_PAGE_SIZE);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = parse_config("[paging\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_page_size_clamping() {
        let config = ExecutorConfig::default();
        assert_eq!(config.page_size(None), 100);
        assert_eq!(config.page_size(Some(0)), 1);
        assert_eq!(config.page_size(Some(-5)), 1);
        assert_eq!(config.page_size(Some(250)), 250);
        assert_eq!(config.page_size(Some(5000)), 1000);

        let narrow = ExecutorConfig {
            default_page_size: 500,
            max_page_size: 200,
            ..Default::default()
        };
        assert_eq!(narrow.page_size(None), 200);
        assert_eq!(narrow.page_size(Some(300)), 200);
    }

    #[test]
    fn test_env_override() {
        let mut config = ExecutorConfig::default();
        config.apply_overrides(|key| (key == PAGE_SIZE_ENV).then(|| "42".to_string()));
        assert_eq!(config.default_page_size, 42);

        let mut config = ExecutorConfig::default();
        config.apply_overrides(|_| Some("lots".to_string()));
        assert_eq!(config.default_page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[apply]\nlink_transfers = false").unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert!(!config.link_transfers);
        assert_eq!(config.default_page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        let config = load_config(Some(Path::new("/nonexistent/sift/executor.toml"))).unwrap();
        assert_eq!(config, ExecutorConfig::default());
    }
}
