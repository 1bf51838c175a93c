use super::schema::{Config, PlannerKind};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "./.config/uispec/config.yaml";

/// Load configuration from file or return default
pub fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    let config_path = match custom_path {
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(DEFAULT_CONFIG_PATH),
    };

    if config_path.exists() {
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        // an empty file is a valid, all-defaults config
        if content.trim().is_empty() {
            return Ok(Config::default());
        }

        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

        Ok(config)
    } else if custom_path.is_some() {
        anyhow::bail!("Config file not found: {:?}", config_path);
    } else {
        Ok(Config::default())
    }
}

/// Command-line values that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub spec: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub session_token: Option<String>,
    pub planner: Option<PlannerKind>,
    pub fixture: Option<PathBuf>,
}

/// Merge config with CLI arguments (CLI takes precedence)
pub fn merge_with_cli_args(mut config: Config, cli: CliOverrides) -> Config {
    if let Some(spec_path) = cli.spec {
        config.spec = Some(spec_path);
    }

    if let Some(output_path) = cli.output {
        config.output = output_path;
    }

    if let Some(token) = cli.session_token {
        config.session_token = Some(token);
    }

    // a fixture on the command line implies the fixture planner
    if let Some(fixture) = cli.fixture {
        config.planner.fixture = Some(fixture);
        config.planner.kind = PlannerKind::Fixture;
    }

    if let Some(kind) = cli.planner {
        config.planner.kind = kind;
    }

    config
}
