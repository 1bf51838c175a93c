//! UiPlan planning: turn an ApiIR into a structurally valid UiPlanIR.
//!
//! Two implementations of [`Planner`] exist: [`LlmPlanner`] asks a chat
//! model and retries invalid output, [`StubPlanner`] is deterministic and
//! backs tests, fixtures and offline runs.

pub mod attempts;
pub mod llm_client;
pub mod llm_planner;
pub mod prompt;
pub mod stub;

use crate::errors::CompilerError;
use crate::ir::ApiIr;
use crate::uiplan::UiPlanIr;
use async_trait::async_trait;

pub use attempts::{AttemptBudget, AttemptOutcome, AttemptState};
pub use llm_client::{ChatClient, ChatCompletion, ChatMessage, ChatRequest, LlmError, OpenAiChatClient};
pub use llm_planner::{extract_json, LlmPlanner};
pub use stub::StubPlanner;

#[async_trait]
pub trait Planner: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &str;

    /// Produce a schema-valid (not yet normalized) plan
    async fn plan(&self, ir: &ApiIr) -> Result<UiPlanIr, CompilerError>;
}
