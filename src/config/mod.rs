pub mod schema;
pub mod loader;

pub use schema::{Config, GroupingConfig, LlmConfig, MetricsConfig, PlannerConfig, PlannerKind};
pub use loader::{load_config, merge_with_cli_args, CliOverrides, DEFAULT_CONFIG_PATH};

use crate::metrics::{JsonlMetricsSink, MetricsSink, TracingMetricsSink};
use crate::pipeline::Compiler;
use crate::planner::{ChatClient, LlmPlanner, OpenAiChatClient, Planner, StubPlanner};
use anyhow::{Context, Result};
use std::fs;
use std::sync::Arc;
use std::time::Duration;

impl Config {
    /// API key from the configured environment variable; empty means unset
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.llm.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    /// Sink for planner call metrics. The JSONL sink starts its writer on the
    /// current runtime; call `shutdown` on it before exiting.
    pub fn metrics_sink(&self) -> Arc<dyn MetricsSink> {
        match &self.metrics.jsonl {
            Some(path) => Arc::new(JsonlMetricsSink::spawn(path)),
            None => Arc::new(TracingMetricsSink),
        }
    }

    /// Chat client for the live planner, if credentials are present
    pub fn chat_client(&self) -> Result<Option<Arc<dyn ChatClient>>> {
        let Some(key) = self.api_key() else {
            return Ok(None);
        };
        let client = OpenAiChatClient::new(
            key,
            &self.llm.base_url,
            &self.llm.model,
            Duration::from_secs(self.llm.timeout_secs),
        )
        .context("Failed to construct LLM client")?;
        Ok(Some(Arc::new(client)))
    }

    pub fn build_planner(&self, metrics: Arc<dyn MetricsSink>) -> Result<Arc<dyn Planner>> {
        let planner: Arc<dyn Planner> = match self.planner.kind {
            PlannerKind::Llm => Arc::new(
                LlmPlanner::new(self.chat_client()?)
                    .with_metrics(metrics)
                    .with_max_attempts(self.llm.max_attempts)
                    .with_max_tokens(self.llm.max_tokens),
            ),
            PlannerKind::Derived => Arc::new(StubPlanner::derived()),
            PlannerKind::Fixture => {
                let path = self
                    .planner
                    .fixture
                    .as_ref()
                    .ok_or_else(|| anyhow::anyhow!("planner kind 'fixture' needs planner.fixture or --fixture"))?;
                let content = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read plan fixture: {:?}", path))?;
                let payload = serde_json::from_str(&content)
                    .with_context(|| format!("Failed to parse plan fixture: {:?}", path))?;
                Arc::new(StubPlanner::fixed(payload))
            }
        };
        Ok(planner)
    }

    pub fn build_compiler(&self, metrics: Arc<dyn MetricsSink>) -> Result<Compiler> {
        Ok(Compiler::new(self.build_planner(metrics)?).with_path_prefixes(self.grouping.path_prefixes.clone()))
    }
}
