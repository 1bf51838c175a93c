use super::attempts::{AttemptBudget, AttemptOutcome};
use super::llm_client::{ChatClient, ChatCompletion, ChatRequest, LlmError};
use super::prompt::build_request;
use super::Planner;
use crate::errors::CompilerError;
use crate::ir::ApiIr;
use crate::metrics::{
    elapsed_ms, format_timestamp, CallMetrics, CallStatus, Clock, MetricsSink, NoopMetricsSink,
    SystemClock, UIPLAN_SOURCE,
};
use crate::uiplan::{validate_plan, PlanIssue, UiPlanIr};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info_span, warn, Instrument};

pub const DEFAULT_MAX_TOKENS: u32 = 4096;

enum AttemptError {
    Invalid(PlanIssue),
    Unavailable(LlmError),
}

/// Planner backed by a chat-completion model
pub struct LlmPlanner {
    client: Option<Arc<dyn ChatClient>>,
    metrics: Arc<dyn MetricsSink>,
    clock: Arc<dyn Clock>,
    max_attempts: u32,
    max_tokens: u32,
}

impl LlmPlanner {
    /// `client` is `None` when no credentials are configured; planning then
    /// fails with `UIPLAN_LLM_UNAVAILABLE` without touching the network.
    pub fn new(client: Option<Arc<dyn ChatClient>>) -> Self {
        Self {
            client,
            metrics: Arc::new(NoopMetricsSink),
            clock: Arc::new(SystemClock),
            max_attempts: AttemptBudget::DEFAULT_MAX_ATTEMPTS,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    async fn attempt(
        &self,
        client: &dyn ChatClient,
        request: &ChatRequest,
    ) -> Result<UiPlanIr, AttemptError> {
        let started = self.clock.now();
        let result = client.complete(request).await;
        let finished = self.clock.now();

        let (status, outcome, completion) = match result {
            Err(e) => (CallStatus::Error, Err(AttemptError::Unavailable(e)), None),
            Ok(completion) => {
                let outcome = parse_plan(&completion.content).map_err(AttemptError::Invalid);
                let status = if outcome.is_ok() { CallStatus::Success } else { CallStatus::Invalid };
                (status, outcome, Some(completion))
            }
        };

        let ChatCompletion { model, prompt_tokens, completion_tokens, .. } =
            completion.unwrap_or_default();
        self.metrics.record(CallMetrics {
            timestamp: format_timestamp(started),
            model: if model.is_empty() { client.model().to_string() } else { model },
            duration_ms: elapsed_ms(started, finished),
            prompt_tokens,
            completion_tokens,
            source: UIPLAN_SOURCE.to_string(),
            status,
        });

        outcome
    }
}

#[async_trait]
impl Planner for LlmPlanner {
    fn name(&self) -> &str {
        "llm"
    }

    async fn plan(&self, ir: &ApiIr) -> Result<UiPlanIr, CompilerError> {
        let Some(client) = self.client.as_deref() else {
            return Err(CompilerError::llm_unavailable("no LLM credentials configured"));
        };

        let request = build_request(ir, self.max_tokens)?;
        let mut budget = AttemptBudget::new(self.max_attempts);
        let mut last_issue: Option<PlanIssue> = None;

        while let Some(attempt) = budget.next_attempt() {
            let span = info_span!("uiplan_attempt", attempt);
            match self.attempt(client, &request).instrument(span).await {
                Ok(plan) => {
                    budget.record(AttemptOutcome::Valid);
                    debug!(attempt, resources = plan.resources.len(), "plan accepted");
                    return Ok(plan);
                }
                Err(AttemptError::Invalid(issue)) => {
                    warn!(attempt, max = budget.max_attempts(), issue = %issue, "invalid plan");
                    budget.record(AttemptOutcome::Invalid);
                    last_issue = Some(issue);
                }
                Err(AttemptError::Unavailable(e)) => {
                    return Err(CompilerError::llm_unavailable(e.to_string()));
                }
            }
        }

        let message = last_issue
            .map(|issue| issue.to_string())
            .unwrap_or_else(|| "planner produced no plan".to_string());
        Err(CompilerError::uiplan_invalid(message))
    }
}

fn parse_plan(content: &str) -> Result<UiPlanIr, PlanIssue> {
    let payload = extract_json(content).ok_or_else(|| PlanIssue {
        location: String::new(),
        message: "model output is not a JSON object".to_string(),
    })?;
    validate_plan(&payload)
}

/// Parse model output as JSON, tolerating a fenced code block around it
pub fn extract_json(content: &str) -> Option<Value> {
    let trimmed = content.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }

    let start = trimmed.find("```")?;
    let after_fence = &trimmed[start + 3..];
    let end = after_fence.find("```")?;
    let inner = &after_fence[..end];

    // optional language tag before the payload, on the fence line or inline
    let body = match inner.find('\n') {
        Some(newline) if !inner[..newline].trim_start().starts_with('{') => &inner[newline + 1..],
        _ => inner.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
    };
    serde_json::from_str(body.trim()).ok()
}
