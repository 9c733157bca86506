use crate::Cli;
use crate::config::{
    AppConfig, ConfigReport, FileConfig, PartialLlmConfig, load_project_config,
};
use crate::logging::LogFormat;
use clap::Parser;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn test_load_project_config() {
    let temp_dir = TempDir::new().unwrap();
    let project_root = temp_dir.path();

    let dir = project_root.join(".leopold");
    fs::create_dir_all(&dir).unwrap();

    let config_content = r#"
model = "gpt-4o"
database = "data/matrix.sqlite"
log_format = "json"

[llm]
max_retries = 2
temperature = 0.2
"#;

    fs::write(dir.join("config.toml"), config_content).unwrap();

    let mut report = ConfigReport::default();
    let project_cfg = load_project_config(project_root, &mut report);

    assert_eq!(report.loaded, vec![dir.join("config.toml")]);
    assert!(report.skipped.is_empty());
    assert_eq!(project_cfg.model, Some("gpt-4o".to_string()));
    assert_eq!(
        project_cfg.database,
        Some(PathBuf::from("data/matrix.sqlite"))
    );
    assert_eq!(project_cfg.log_format, Some(LogFormat::Json));
    let llm_cfg = project_cfg.llm.unwrap();
    assert_eq!(llm_cfg.max_retries, Some(2));
    assert_eq!(llm_cfg.temperature, Some(0.2));
}

#[test]
fn test_load_project_config_not_exists() {
    let temp_dir = TempDir::new().unwrap();
    let mut report = ConfigReport::default();
    let project_cfg = load_project_config(temp_dir.path(), &mut report);
    assert_eq!(project_cfg, FileConfig::default());
    assert_eq!(report, ConfigReport::default());
}

#[test]
fn test_unparsable_project_config_falls_back_to_default() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join(".leopold");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("config.toml"), "model = [").unwrap();

    let mut report = ConfigReport::default();
    let project_cfg = load_project_config(temp_dir.path(), &mut report);
    assert_eq!(project_cfg, FileConfig::default());

    // The failure is kept for logging once the subscriber is installed.
    assert!(report.loaded.is_empty());
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].path, dir.join("config.toml"));
    assert!(!report.skipped[0].error.is_empty());
}

#[test]
fn test_defaults_without_any_source() {
    let cli = Cli::parse_from(["leopold"]);
    let cfg = AppConfig::resolve(cli, FileConfig::default(), FileConfig::default(), no_env);
    assert_eq!(cfg.bind, "127.0.0.1:3000");
    assert_eq!(cfg.database_path, PathBuf::from("leopold.sqlite"));
    assert_eq!(cfg.model, "gpt-4");
    assert_eq!(cfg.api_key, None);
    assert_eq!(cfg.log_format, LogFormat::Text);
    assert_eq!(cfg.llm.max_retries, 0);
    assert_eq!(cfg.llm.temperature, 0.7);
}

#[test]
fn test_precedence_cli_env_project_global() {
    let env: HashMap<&str, &str> = HashMap::from([
        ("OPENAI_MODEL", "env-model"),
        ("OPENAI_API_KEY", "env-key"),
        ("LEOPOLD_BIND", "0.0.0.0:9000"),
    ]);
    let project_cfg = FileConfig {
        model: Some("project-model".into()),
        bind: Some("127.0.0.1:1".into()),
        base_url: Some("http://project".into()),
        llm: Some(PartialLlmConfig {
            max_retries: Some(1),
            ..Default::default()
        }),
        ..Default::default()
    };
    let file_cfg = FileConfig {
        base_url: Some("http://global".into()),
        log_level: Some("debug".into()),
        llm: Some(PartialLlmConfig {
            max_retries: Some(9),
            retry_base_ms: Some(10),
            ..Default::default()
        }),
        ..Default::default()
    };
    let cli = Cli::parse_from(["leopold", "--model", "cli-model"]);
    let cfg = AppConfig::resolve(cli, project_cfg, file_cfg, |k| {
        env.get(k).map(|v| v.to_string())
    });

    assert_eq!(cfg.model, "cli-model");
    assert_eq!(cfg.api_key.as_deref(), Some("env-key"));
    assert_eq!(cfg.bind, "0.0.0.0:9000");
    assert_eq!(cfg.base_url, "http://project");
    assert_eq!(cfg.log_level, "debug");
    assert_eq!(cfg.llm.max_retries, 1);
    assert_eq!(cfg.llm.retry_base_ms, 10);
}
