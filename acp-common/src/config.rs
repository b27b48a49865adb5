//! Configuration loading and root folder resolution
//!
//! Services resolve their root folder in priority order:
//! 1. Command-line argument (highest priority)
//! 2. `ACP_ROOT_FOLDER` environment variable
//! 3. TOML config file (`~/.config/acp/config.toml`, then `/etc/acp/config.toml`)
//! 4. OS-dependent compiled default (fallback)
//!
//! The same TOML file optionally carries the [`RecoveryPolicy`] thresholds
//! and the [`JobRegistry`] job-family table. Both are plain data injected
//! into the recovery engine at startup; nothing in this crate reads them
//! from globals after that.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "acp.db";

/// Resolve the service root folder following the priority order above
pub fn resolve_root_folder(cli_arg: Option<&str>) -> PathBuf {
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    if let Ok(path) = std::env::var("ACP_ROOT_FOLDER") {
        return PathBuf::from(path);
    }

    if let Ok(config_path) = locate_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(root_folder) = config.get("root_folder").and_then(|v| v.as_str()) {
                    return PathBuf::from(root_folder);
                }
            }
        }
    }

    default_root_folder()
}

/// Locate the config file for the platform
fn locate_config_file() -> Result<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("acp").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Ok(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/acp/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
    }

    Err(Error::Config("No config file found".to_string()))
}

/// OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("acp"))
        .unwrap_or_else(|| PathBuf::from("./acp_data"))
}

/// Recovery thresholds and bounds
///
/// The windows and limits keep recovery bounded: the sweep is a safety net,
/// not a backfill job, and must never compete with live production for
/// generation capacity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryPolicy {
    /// Loop-guard window: no item is auto-recovered twice within it (hours)
    pub recovery_window_hours: i64,
    /// How far back the targeted sweep looks for rejected items (hours)
    pub sweep_window_hours: i64,
    /// Maximum rejected items considered per sweep invocation
    pub sweep_item_limit: u32,
    /// Pending-topic count below which a failed topic job escalates
    pub topic_backlog_low_water: i64,
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self {
            recovery_window_hours: 2,
            sweep_window_hours: 6,
            sweep_item_limit: 5,
            topic_backlog_low_water: 10,
        }
    }
}

/// Job-family routing table for the cron failure hook
///
/// Job names are matched case-insensitively by substring against each
/// family list. The table is read-only after load; the cron hook receives
/// it by reference rather than consulting module state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JobRegistry {
    /// Jobs that advance items through production phases
    pub content_production: Vec<String>,
    /// Non-critical optimization and audit jobs (run several times a day)
    pub optimization_audit: Vec<String>,
    /// Jobs that refill the topic backlog
    pub topic_generation: Vec<String>,
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self {
            content_production: vec![
                "content-pipeline".to_string(),
                "article-production".to_string(),
                "phase-runner".to_string(),
            ],
            optimization_audit: vec![
                "seo-audit".to_string(),
                "link-optimizer".to_string(),
                "content-audit".to_string(),
            ],
            topic_generation: vec!["topic-generator".to_string()],
        }
    }
}

/// Which family a job name belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobFamily {
    ContentProduction,
    OptimizationAudit,
    TopicGeneration,
    Unknown,
}

impl JobRegistry {
    /// Classify a job name into its family (substring match, first hit wins)
    pub fn family_of(&self, job_name: &str) -> JobFamily {
        let lower = job_name.to_lowercase();
        let matches = |names: &[String]| names.iter().any(|n| lower.contains(&n.to_lowercase()));

        if matches(&self.content_production) {
            JobFamily::ContentProduction
        } else if matches(&self.optimization_audit) {
            JobFamily::OptimizationAudit
        } else if matches(&self.topic_generation) {
            JobFamily::TopicGeneration
        } else {
            JobFamily::Unknown
        }
    }
}

/// Full service configuration as loaded from the TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Root folder from the TOML file. Read by [`resolve_root_folder`]'s
    /// TOML step, not by callers; declared here so the key is part of the
    /// documented schema.
    pub root_folder: Option<String>,
    /// HTTP bind address, e.g. "127.0.0.1:5741"
    pub bind_address: Option<String>,
    pub recovery: RecoveryPolicy,
    pub jobs: JobRegistry,
}

impl ServiceConfig {
    /// Load the config file if one exists, otherwise defaults
    pub fn load() -> Self {
        match locate_config_file() {
            Ok(path) => match std::fs::read_to_string(&path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {}", path.display());
                        config
                    }
                    Err(e) => {
                        tracing::warn!("Invalid config file {}: {}", path.display(), e);
                        Self::default()
                    }
                },
                Err(e) => {
                    tracing::warn!("Could not read config file {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }
}
