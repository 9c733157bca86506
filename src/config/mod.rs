use crate::logging::LogFormat;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
pub const DEFAULT_DATABASE: &str = "leopold.sqlite";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: String,
    pub database_path: PathBuf,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub log_level: String,
    pub log_format: LogFormat,
    pub llm: LlmConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            database_path: PathBuf::from(DEFAULT_DATABASE),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_format: LogFormat::Text,
            llm: LlmConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub max_retries: usize,
    pub retry_base_ms: u64,
    pub retry_jitter_ms: u64,
    pub respect_retry_after: bool,
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 5_000,
            // A full project analysis routinely takes close to a minute.
            request_timeout_ms: 120_000,
            max_retries: 0,
            retry_base_ms: 1000,
            retry_jitter_ms: 2000,
            respect_retry_after: true,
            temperature: 0.7,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct FileConfig {
    pub bind: Option<String>,
    pub database: Option<PathBuf>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub llm: Option<PartialLlmConfig>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct PartialLlmConfig {
    pub connect_timeout_ms: Option<u64>,
    pub request_timeout_ms: Option<u64>,
    pub max_retries: Option<usize>,
    pub retry_base_ms: Option<u64>,
    pub retry_jitter_ms: Option<u64>,
    pub respect_retry_after: Option<bool>,
    pub temperature: Option<f32>,
}

impl PartialLlmConfig {
    /// Field-wise merge; values in `self` win.
    fn or(self, other: PartialLlmConfig) -> PartialLlmConfig {
        PartialLlmConfig {
            connect_timeout_ms: self.connect_timeout_ms.or(other.connect_timeout_ms),
            request_timeout_ms: self.request_timeout_ms.or(other.request_timeout_ms),
            max_retries: self.max_retries.or(other.max_retries),
            retry_base_ms: self.retry_base_ms.or(other.retry_base_ms),
            retry_jitter_ms: self.retry_jitter_ms.or(other.retry_jitter_ms),
            respect_retry_after: self.respect_retry_after.or(other.respect_retry_after),
            temperature: self.temperature.or(other.temperature),
        }
    }

    fn resolve(self) -> LlmConfig {
        let d = LlmConfig::default();
        LlmConfig {
            connect_timeout_ms: self.connect_timeout_ms.unwrap_or(d.connect_timeout_ms),
            request_timeout_ms: self.request_timeout_ms.unwrap_or(d.request_timeout_ms),
            max_retries: self.max_retries.unwrap_or(d.max_retries),
            retry_base_ms: self.retry_base_ms.unwrap_or(d.retry_base_ms),
            retry_jitter_ms: self.retry_jitter_ms.unwrap_or(d.retry_jitter_ms),
            respect_retry_after: self.respect_retry_after.unwrap_or(d.respect_retry_after),
            temperature: self.temperature.unwrap_or(d.temperature),
        }
    }
}

/// A config file that exists but could not be used.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedConfig {
    pub path: PathBuf,
    pub error: String,
}

/// What config loading touched. Loading runs before the subscriber exists, so
/// the outcome is kept here and logged once logging is up.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigReport {
    pub loaded: Vec<PathBuf>,
    pub skipped: Vec<SkippedConfig>,
}

impl ConfigReport {
    pub fn log(&self) {
        for path in &self.loaded {
            info!(path=%path.display(), "loaded config file");
        }
        for s in &self.skipped {
            warn!(path=%s.path.display(), error=%s.error, "config file skipped");
        }
    }

    fn skip(&mut self, path: &Path, error: impl ToString) {
        self.skipped.push(SkippedConfig {
            path: path.to_path_buf(),
            error: error.to_string(),
        });
    }
}

impl AppConfig {
    pub fn from_cli(cli: crate::Cli) -> Result<(Self, ConfigReport)> {
        let project_root = std::env::current_dir().context("resolve current dir")?;
        let mut report = ConfigReport::default();
        let project_cfg = load_project_config(&project_root, &mut report);
        let file_cfg = load_file_config(&mut report);
        let cfg = Self::resolve(cli, project_cfg, file_cfg, |k| {
            std::env::var(k).ok().filter(|v| !v.is_empty())
        });
        Ok((cfg, report))
    }

    /// Precedence: CLI flag, environment, project config, global config, default.
    pub fn resolve(
        cli: crate::Cli,
        project_cfg: FileConfig,
        file_cfg: FileConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let bind = cli
            .bind
            .or_else(|| env("LEOPOLD_BIND"))
            .or(project_cfg.bind)
            .or(file_cfg.bind)
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        let database_path = cli
            .database
            .or_else(|| env("LEOPOLD_DATABASE").map(PathBuf::from))
            .or(project_cfg.database)
            .or(file_cfg.database)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE));
        let base_url = cli
            .base_url
            .or_else(|| env("OPENAI_BASE_URL"))
            .or(project_cfg.base_url)
            .or(file_cfg.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = cli
            .model
            .or_else(|| env("OPENAI_MODEL"))
            .or(project_cfg.model)
            .or(file_cfg.model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let api_key = cli
            .api_key
            .or_else(|| env("OPENAI_API_KEY"))
            .or(project_cfg.api_key)
            .or(file_cfg.api_key);
        let log_level = cli
            .log_level
            .or_else(|| env("LEOPOLD_LOG"))
            .or(project_cfg.log_level)
            .or(file_cfg.log_level)
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
        let log_format = cli
            .log_format
            .or_else(|| env("LEOPOLD_LOG_FORMAT").and_then(|v| v.parse().ok()))
            .or(project_cfg.log_format)
            .or(file_cfg.log_format)
            .unwrap_or_default();
        let llm = project_cfg
            .llm
            .unwrap_or_default()
            .or(file_cfg.llm.unwrap_or_default())
            .resolve();

        Self {
            bind,
            database_path,
            base_url,
            model,
            api_key,
            log_level,
            log_format,
            llm,
        }
    }
}

fn candidate_paths() -> Vec<PathBuf> {
    use std::env;

    let mut v = Vec::new();
    if let Ok(p) = env::var("LEOPOLD_CONFIG") {
        v.push(PathBuf::from(p));
    }
    if let Ok(xdg_home) = env::var("XDG_CONFIG_HOME") {
        v.push(Path::new(&xdg_home).join("leopold/config.toml"));
    } else if let Some(dir) = dirs::config_dir() {
        v.push(dir.join("leopold/config.toml"));
    }
    if let Ok(dirs) = env::var("XDG_CONFIG_DIRS") {
        for d in dirs.split(':') {
            if !d.is_empty() {
                v.push(Path::new(d).join("leopold/config.toml"));
            }
        }
    }
    v
}

/// First global config file that parses. Unusable candidates are recorded
/// in `report` and skipped.
pub fn load_file_config(report: &mut ConfigReport) -> FileConfig {
    for p in candidate_paths() {
        if p.exists()
            && let Some(cfg) = read_config(&p, report)
        {
            return cfg;
        }
    }
    FileConfig::default()
}

/// Load project-specific configuration from .leopold/config.toml
pub fn load_project_config(project_root: &Path, report: &mut ConfigReport) -> FileConfig {
    let project_config_path = project_root.join(".leopold").join("config.toml");
    if !project_config_path.exists() {
        return FileConfig::default();
    }
    read_config(&project_config_path, report).unwrap_or_default()
}

fn read_config(path: &Path, report: &mut ConfigReport) -> Option<FileConfig> {
    let s = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            report.skip(path, e);
            return None;
        }
    };
    match toml::from_str::<FileConfig>(&s) {
        Ok(cfg) => {
            report.loaded.push(path.to_path_buf());
            Some(cfg)
        }
        Err(e) => {
            report.skip(path, e);
            None
        }
    }
}

#[cfg(test)]
mod tests;
