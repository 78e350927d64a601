//! Configuration loading and types

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crane_api::{Host, HostHealth, HostState};
use crane_core::{ReconcilerConfig, WorkerConfig};
use crane_exec::CommandExecutorConfig;

/// Environment variable pointing at the config file
pub const CONFIG_ENV: &str = "CRANE_CONFIG";

/// Top-level configuration for the crane daemon
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Daemon server settings
    #[serde(default)]
    pub daemon: DaemonConfig,
    /// Store locations
    #[serde(default)]
    pub storage: StorageConfig,
    /// Reconciler loop
    #[serde(default)]
    pub reconciler: ReconcilerConfig,
    /// Worker pool
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Commands that carry out drain/replace
    #[serde(default)]
    pub executor: CommandExecutorConfig,
    /// Hosts seeded into the catalog at start-up
    #[serde(default)]
    pub host: Vec<HostSeed>,
}

/// Daemon server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Address and port to bind to
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Log level (trace, debug, info, warn, error), overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log output format
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:43060".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Database file locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Host catalog database
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,
    /// Action queue database
    #[serde(default = "default_queue_path")]
    pub queue_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
            queue_path: default_queue_path(),
        }
    }
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("crane-catalog.redb")
}

fn default_queue_path() -> PathBuf {
    PathBuf::from("crane-queue.redb")
}

/// A host to register at start-up if the catalog does not know it yet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostSeed {
    pub id: String,
    pub role: String,
    pub zone: String,
    pub image_id: String,
    /// Initial state (defaults to `PROVISIONING`)
    pub state: Option<String>,
    /// Initial health (defaults to `unknown`)
    pub health: Option<String>,
}

impl HostSeed {
    /// Build the catalog entry
    ///
    /// # Errors
    /// Returns error if `state` or `health` is not a known value
    pub fn to_host(&self) -> eyre::Result<Host> {
        let mut host = Host::new(&self.id, &self.role, &self.zone, &self.image_id);
        if let Some(state) = &self.state {
            host = host.with_state(state.parse::<HostState>()?);
        }
        if let Some(health) = &self.health {
            host = host.with_health(health.parse::<HostHealth>()?);
        }
        Ok(host)
    }
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| eyre::eyre!("failed to read {}: {e}", path.display()))?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load from default paths or use defaults
    ///
    /// Returns the file that was loaded, or `None` when falling back to
    /// defaults. Nothing is logged here since tracing is not set up yet.
    ///
    /// # Errors
    /// Returns error if a config file exists but cannot be loaded
    pub fn load_default() -> eyre::Result<(Self, Option<PathBuf>)> {
        // Check environment variable
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            return Ok((Self::load(&path)?, Some(path)));
        }

        // Try common paths
        let mut paths = vec![
            PathBuf::from("crane.toml"),
            PathBuf::from("/etc/crane/crane.toml"),
        ];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("crane/crane.toml"));
        }

        Self::load_first(paths)
    }

    /// Load the first candidate that exists, or defaults if none does
    fn load_first(paths: Vec<PathBuf>) -> eyre::Result<(Self, Option<PathBuf>)> {
        for path in paths {
            if path.exists() {
                return Ok((Self::load(&path)?, Some(path)));
            }
        }
        Ok((Config::default(), None))
    }
}
