//! OpenAPI → UISpec compiler.
//!
//! A document goes through parsing, subset validation, `$ref` resolution,
//! canonical hashing, ApiIR construction, UI planning, normalization and
//! lowering. Everything except the planner's model call is deterministic.

pub mod canonical;
pub mod config;
pub mod errors;
pub mod ir;
pub mod lowering;
pub mod metrics;
pub mod operation_processor;
pub mod parsers;
pub mod pipeline;
pub mod planner;
pub mod ref_resolver;
pub mod schema_processor;
pub mod subset_validator;
pub mod telemetry;
pub mod uiplan;
pub mod uispec;

pub use errors::{CompilerError, ErrorCode, Stage};
pub use ir::ApiIr;
pub use pipeline::{check, hash_document, CompileArtifact, CompileFailure, Compiler, DocumentHash};
pub use planner::{LlmPlanner, Planner, StubPlanner};
pub use uiplan::UiPlanIr;
pub use uispec::UiSpec;
