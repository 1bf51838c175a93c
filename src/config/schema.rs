use crate::ir::grouping::DEFAULT_PATH_PREFIXES;
use crate::planner::llm_client::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,

    pub grouping: GroupingConfig,

    pub planner: PlannerConfig,

    pub metrics: MetricsConfig,

    pub output: PathBuf,

    /// Set from `--spec`; not read from the file
    #[serde(skip)]
    pub spec: Option<PathBuf>,

    #[serde(skip)]
    pub session_token: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub base_url: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub max_tokens: u32,
    /// One try plus retries on structurally invalid output
    pub max_attempts: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 120,
            max_tokens: 4096,
            max_attempts: 3,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GroupingConfig {
    pub path_prefixes: Vec<String>,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            path_prefixes: DEFAULT_PATH_PREFIXES.iter().map(|p| p.to_string()).collect(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PlannerKind {
    #[default]
    Llm,
    Fixture,
    Derived,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct PlannerConfig {
    pub kind: PlannerKind,

    /// UiPlanIR JSON file answered by the `fixture` planner
    pub fixture: Option<PathBuf>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct MetricsConfig {
    /// Append call metrics here as JSON lines instead of logging them
    pub jsonl: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            grouping: GroupingConfig::default(),
            planner: PlannerConfig::default(),
            metrics: MetricsConfig::default(),
            output: PathBuf::from("generated"),
            spec: None,
            session_token: None,
        }
    }
}
