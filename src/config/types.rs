use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Settings of the state writer and its worker pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Messages that may wait in the mailbox before new ones are rejected
    /// (default: 20).
    #[serde(default = "default_mailbox_capacity")]
    pub mailbox_capacity: usize,
    /// Upper bound on threads running blocking jobs (default: 8).
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
    /// Name of the writer thread; worker threads get a `-worker` suffix.
    #[serde(default = "default_thread_name")]
    pub thread_name: String,
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is not set
    /// (default: "info").
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Append logs to this file instead of stderr.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Target directories of the storage demo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Private cache directory (default: `<cache dir>/mechanicum`).
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    /// Directory shared with other programs
    /// (default: `<documents dir>/mechanicum`).
    #[serde(default)]
    pub external_dir: Option<PathBuf>,
}

fn default_mailbox_capacity() -> usize {
    20
}

fn default_worker_threads() -> usize {
    8
}

fn default_thread_name() -> String {
    "state-writer".to_string()
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: default_mailbox_capacity(),
            worker_threads: default_worker_threads(),
            thread_name: default_thread_name(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            file: None,
        }
    }
}

impl StorageConfig {
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("mechanicum")
        })
    }

    pub fn external_dir(&self) -> PathBuf {
        self.external_dir.clone().unwrap_or_else(|| {
            dirs::document_dir()
                .or_else(dirs::home_dir)
                .unwrap_or_else(|| PathBuf::from("."))
                .join("mechanicum")
        })
    }
}
