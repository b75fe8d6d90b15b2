use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::prelude::*;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Deserialize)]
struct FileTarget {
    url: String,
    method: Option<String>,
    payload: Option<String>,
    headers: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct FileConfig {
    timeout: u64,
    requests: u64,
    concurrency: u64,
    targets: BTreeMap<String, FileTarget>,
}

/// Run parameters and target definitions, immutable for the duration of a run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Per-request timeout in seconds.
    pub timeout: u64,
    /// Total request budget per target, spent across waves.
    pub requests: u64,
    /// Requests in flight simultaneously per target, per wave.
    pub concurrency: u64,
    pub targets: BTreeMap<String, TargetSpec>,
}

/// A single named endpoint under test. Read-only once built; cloned into
/// each executor task.
#[derive(Debug, Clone)]
pub struct TargetSpec {
    pub url: String,
    pub method: String,
    pub payload: String,
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("timeout must be greater than zero")]
    InvalidTimeout,
    #[error("concurrency must be greater than zero")]
    InvalidConcurrency,
}

impl Config {
    fn fill_defaults(unresolved: FileConfig) -> Result<Config, ConfigError> {
        if unresolved.timeout == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        if unresolved.concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency);
        }
        let targets = unresolved
            .targets
            .into_iter()
            .map(|(name, t)| {
                let spec = TargetSpec {
                    url: t.url,
                    method: t.method.unwrap_or_else(|| "GET".into()),
                    payload: t.payload.unwrap_or_default(),
                    headers: t.headers.unwrap_or_default(),
                };
                (name, spec)
            })
            .collect();
        Ok(Config {
            timeout: unresolved.timeout,
            requests: unresolved.requests,
            concurrency: unresolved.concurrency,
            targets,
        })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let mut f = File::open(path.as_ref())?;
        let mut contents = String::new();
        f.read_to_string(&mut contents)?;
        let config: FileConfig = toml::from_str(&contents)?;
        Config::fill_defaults(config)
    }
}
