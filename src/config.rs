use std::{env, path::PathBuf, time::Duration};

pub const DEFAULT_DATA_PATH: &str = "data/journal.json";
pub const DEFAULT_API_BASE_URL: &str = "http://api.alquran.cloud/v1";
pub const DEFAULT_LOG_PATH: &str = "quran-journal.log";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    /// JSON file on disk.
    File,
    /// Volatile key-value store; nothing survives the process.
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub data_path: PathBuf,
    pub storage: StorageKind,
    pub api_base_url: String,
    pub api_timeout: Duration,
    pub log_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            storage: StorageKind::File,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Config::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Config {
            data_path: non_empty("QURAN_JOURNAL_DATA")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_path),
            storage: match non_empty("QURAN_JOURNAL_STORAGE").as_deref() {
                Some("memory") => StorageKind::Memory,
                _ => StorageKind::File,
            },
            api_base_url: non_empty("QURAN_API_BASE_URL").unwrap_or(defaults.api_base_url),
            api_timeout: non_empty("QURAN_API_TIMEOUT_SECS")
                .and_then(|v| v.trim().parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.api_timeout),
            log_path: non_empty("QURAN_JOURNAL_LOG")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = config_from(&[]);
        assert_eq!(config.data_path, PathBuf::from("data/journal.json"));
        assert_eq!(config.storage, StorageKind::File);
        assert_eq!(config.api_base_url, "http://api.alquran.cloud/v1");
        assert_eq!(config.api_timeout, Duration::from_secs(10));
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("QURAN_JOURNAL_DATA", "/tmp/j.json"),
            ("QURAN_JOURNAL_STORAGE", "memory"),
            ("QURAN_API_BASE_URL", "http://localhost:9000"),
            ("QURAN_API_TIMEOUT_SECS", " 3 "),
        ]);
        assert_eq!(config.data_path, PathBuf::from("/tmp/j.json"));
        assert_eq!(config.storage, StorageKind::Memory);
        assert_eq!(config.api_base_url, "http://localhost:9000");
        assert_eq!(config.api_timeout, Duration::from_secs(3));
    }

    #[test]
    fn bad_timeout_falls_back() {
        let config = config_from(&[("QURAN_API_TIMEOUT_SECS", "soon"), ("QURAN_JOURNAL_DATA", "")]);
        assert_eq!(config.api_timeout, Duration::from_secs(10));
        assert_eq!(config.data_path, PathBuf::from(DEFAULT_DATA_PATH));
    }
}
