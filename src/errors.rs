use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of error codes a compile can fail with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    OasParseError,
    OasUnsupportedSchemaKeyword,
    OasMultipleSuccessResponses,
    OasMultipleTags,
    OasMissingRequestBody,
    OasMultiplePathParams,
    OasExternalRef,
    OasCircularRef,
    /// Also used when a document has no CRUD operations at all.
    OasAmbiguousResourceGrouping,
    IrInvalid,
    UiplanInvalid,
    UiplanLlmUnavailable,
    UispecInvalid,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::OasParseError => "OAS_PARSE_ERROR",
            ErrorCode::OasUnsupportedSchemaKeyword => "OAS_UNSUPPORTED_SCHEMA_KEYWORD",
            ErrorCode::OasMultipleSuccessResponses => "OAS_MULTIPLE_SUCCESS_RESPONSES",
            ErrorCode::OasMultipleTags => "OAS_MULTIPLE_TAGS",
            ErrorCode::OasMissingRequestBody => "OAS_MISSING_REQUEST_BODY",
            ErrorCode::OasMultiplePathParams => "OAS_MULTIPLE_PATH_PARAMS",
            ErrorCode::OasExternalRef => "OAS_EXTERNAL_REF",
            ErrorCode::OasCircularRef => "OAS_CIRCULAR_REF",
            ErrorCode::OasAmbiguousResourceGrouping => "OAS_AMBIGUOUS_RESOURCE_GROUPING",
            ErrorCode::IrInvalid => "IR_INVALID",
            ErrorCode::UiplanInvalid => "UIPLAN_INVALID",
            ErrorCode::UiplanLlmUnavailable => "UIPLAN_LLM_UNAVAILABLE",
            ErrorCode::UispecInvalid => "UISPEC_INVALID",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline stage an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Parse,
    Validate,
    Resolve,
    Canonicalize,
    ApiIr,
    UiPlan,
    Lowering,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Parse => "Parse",
            Stage::Validate => "Validate",
            Stage::Resolve => "Resolve",
            Stage::Canonicalize => "Canonicalize",
            Stage::ApiIr => "ApiIr",
            Stage::UiPlan => "UiPlan",
            Stage::Lowering => "Lowering",
        };
        f.write_str(name)
    }
}

/// A single actionable compile error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("{code} [{stage}] {message}")]
pub struct CompilerError {
    pub code: ErrorCode,
    pub stage: Stage,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_pointer: Option<String>,
}

impl CompilerError {
    pub fn new(code: ErrorCode, stage: Stage, message: impl Into<String>) -> Self {
        Self {
            code,
            stage,
            message: message.into(),
            json_pointer: None,
        }
    }

    pub fn at(mut self, pointer: impl Into<String>) -> Self {
        self.json_pointer = Some(pointer.into());
        self
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::OasParseError, Stage::Parse, message)
    }

    pub fn ir_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::IrInvalid, Stage::ApiIr, message)
    }

    pub fn uiplan_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UiplanInvalid, Stage::UiPlan, message)
    }

    pub fn llm_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UiplanLlmUnavailable, Stage::UiPlan, message)
    }

    pub fn uispec_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UispecInvalid, Stage::Lowering, message)
    }
}
