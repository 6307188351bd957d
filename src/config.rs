//! Runtime configuration for viewsync.
//!
//! Configuration can be loaded from a JSON file or constructed
//! programmatically. Mock-data shape, simulated latency, and view defaults
//! all live here.

use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};

/// Command-line arguments.
#[derive(Parser, Debug, Clone)]
#[command(name = "viewsync", about = "Mock user-directory service for the viewsync core")]
pub struct Cli {
    /// Path to configuration file (JSON).
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// HTTP listen address.
    #[arg(long, default_value = "0.0.0.0:8080")]
    pub listen: String,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,

    /// Mock directory data.
    pub data: DataConfig,

    /// View session defaults.
    pub view: ViewConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            data: DataConfig::default(),
            view: ViewConfig::default(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address (e.g. "0.0.0.0:8080").
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Mock directory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Number of seeded users.
    pub user_count: usize,

    /// Simulated latency for page reads, in milliseconds.
    pub read_delay_ms: u64,

    /// Simulated latency for status mutations, in milliseconds.
    pub write_delay_ms: u64,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            user_count: 100,
            read_delay_ms: 500,
            write_delay_ms: 300,
        }
    }
}

/// View session defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Rows per page when the URL does not say otherwise.
    pub default_page_size: u32,

    /// Quiet period for search input, in milliseconds.
    pub debounce_ms: u64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            debounce_ms: 300,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file, falling back to defaults when the
    /// file is absent.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if path.exists() {
            let data = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&data)?;
            Ok(config)
        } else {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            Ok(Config::default())
        }
    }
}
