//! Sequences the stages: Parse → Validate → Resolve → Canonicalize+Hash →
//! ApiIR → Plan → Normalize → Lower. The first failing stage ends the run.

use crate::canonical::{compile_id, content_hash};
use crate::errors::CompilerError;
use crate::ir::grouping::DEFAULT_PATH_PREFIXES;
use crate::ir::{build_api_ir, ApiIr};
use crate::lowering::lower;
use crate::parsers::{parse_document, OpenApiVersion};
use crate::planner::Planner;
use crate::ref_resolver::resolve_refs;
use crate::subset_validator::validate_subset;
use crate::uiplan::normalize_plan;
use crate::uispec::UiSpec;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, info_span, Instrument};

/// Successful compile, handed to the compilation store under `id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileArtifact {
    pub id: String,
    pub specs: BTreeMap<String, UiSpec>,
    pub resource_names: Vec<String>,
    pub resource_slugs: Vec<String>,
    pub api_ir: ApiIr,
    pub openapi_canonical_hash: String,
}

/// Every error of the failing stage (several only for subset validation)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("compile failed with {} error(s)", .errors.len())]
pub struct CompileFailure {
    pub errors: Vec<CompilerError>,
}

impl From<CompilerError> for CompileFailure {
    fn from(error: CompilerError) -> Self {
        Self { errors: vec![error] }
    }
}

impl From<Vec<CompilerError>> for CompileFailure {
    fn from(errors: Vec<CompilerError>) -> Self {
        Self { errors }
    }
}

/// Canonical hash of a document and the id it compiles to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentHash {
    pub hash: String,
    pub id: String,
}

/// Parsed, subset-checked, `$ref`-free document
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDocument {
    pub version: OpenApiVersion,
    pub root: Value,
}

/// Parse → Validate → Resolve
pub fn check(text: &str) -> Result<ResolvedDocument, CompileFailure> {
    let parsed = parse_document(text)?;
    debug!(version = parsed.version.as_str(), format = ?parsed.format, "parsed");

    validate_subset(&parsed.root)?;
    debug!("subset ok");

    let root = resolve_refs(&parsed.root)?;
    debug!("refs resolved");

    Ok(ResolvedDocument { version: parsed.version, root })
}

/// Parse → Validate → Resolve → Canonicalize+Hash
pub fn hash_document(text: &str, session_token: Option<&str>) -> Result<DocumentHash, CompileFailure> {
    let resolved = check(text)?;
    Ok(document_hash(&resolved.root, session_token))
}

fn document_hash(root: &Value, session_token: Option<&str>) -> DocumentHash {
    let hash = content_hash(root);
    let token = session_token.filter(|t| !t.is_empty());
    let id = compile_id(&hash, token);
    DocumentHash { hash, id }
}

/// Runs the full pipeline with an injected planner
pub struct Compiler {
    planner: Arc<dyn Planner>,
    path_prefixes: Vec<String>,
}

impl Compiler {
    pub fn new(planner: Arc<dyn Planner>) -> Self {
        Self {
            planner,
            path_prefixes: DEFAULT_PATH_PREFIXES.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn with_path_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.path_prefixes = prefixes;
        self
    }

    pub async fn compile(
        &self,
        text: &str,
        session_token: Option<&str>,
    ) -> Result<CompileArtifact, CompileFailure> {
        let span = info_span!("compile", planner = self.planner.name());
        self.run(text, session_token).instrument(span).await
    }

    async fn run(&self, text: &str, session_token: Option<&str>) -> Result<CompileArtifact, CompileFailure> {
        let resolved = check(text)?;

        let DocumentHash { hash, id } = document_hash(&resolved.root, session_token);
        debug!(hash = %hash, id = %id, "canonical hash");

        let build = build_api_ir(&resolved.root, &self.path_prefixes)?;
        debug!(
            resources = build.ir.resources.len(),
            strategy = ?build.strategy,
            ir_hash = %build.hash,
            "api ir built"
        );

        let plan = self.planner.plan(&build.ir).await?;
        let plan = normalize_plan(&plan);
        debug!(resources = plan.resources.len(), "plan normalized");

        let specs = lower(&build.ir, &plan)?;

        let resource_slugs: Vec<String> = specs.keys().cloned().collect();
        let resource_names: Vec<String> = specs.values().map(|s| s.entity.clone()).collect();
        info!(id = %id, resources = specs.len(), "compiled");

        Ok(CompileArtifact {
            id,
            specs,
            resource_names,
            resource_slugs,
            api_ir: build.ir,
            openapi_canonical_hash: hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ErrorCode, Stage};
    use crate::planner::StubPlanner;
    use assert_matches::assert_matches;

    const ITEMS: &str = r##"
openapi: 3.0.3
info: {title: Shop, version: "1.0"}
paths:
  /items:
    get:
      tags: [Items]
      responses:
        "200":
          content:
            application/json:
              schema: {type: array, items: {$ref: "#/components/schemas/Item"}}
"##;

    fn items_doc() -> String {
        format!(
            "{}{}",
            ITEMS,
            r#"
components:
  schemas:
    Item:
      type: object
      properties:
        id: {type: string}
        name: {type: string}
"#
        )
    }

    #[tokio::test]
    async fn compiles_with_derived_planner() {
        let compiler = Compiler::new(Arc::new(StubPlanner::derived()));
        let artifact = compiler.compile(&items_doc(), None).await.unwrap();
        assert_eq!(artifact.resource_slugs, vec!["items"]);
        assert_eq!(artifact.resource_names, vec!["Items"]);
        assert_eq!(artifact.id, artifact.openapi_canonical_hash[..12]);
        assert_eq!(artifact.specs["items"].table.columns, vec!["id", "name"]);
    }

    #[tokio::test]
    async fn session_token_changes_id_not_hash() {
        let compiler = Compiler::new(Arc::new(StubPlanner::derived()));
        let shared = compiler.compile(&items_doc(), None).await.unwrap();
        let private = compiler.compile(&items_doc(), Some("alice")).await.unwrap();
        assert_eq!(shared.openapi_canonical_hash, private.openapi_canonical_hash);
        assert_ne!(shared.id, private.id);
        assert_eq!(private.id.len(), 12);
        let empty = compiler.compile(&items_doc(), Some("")).await.unwrap();
        assert_eq!(empty.id, shared.id);
    }

    #[tokio::test]
    async fn stops_at_first_failing_stage() {
        let compiler = Compiler::new(Arc::new(StubPlanner::derived()));
        let failure = compiler.compile("   ", None).await.unwrap_err();
        assert_matches!(
            failure.errors.as_slice(),
            [CompilerError { code: ErrorCode::OasParseError, stage: Stage::Parse, .. }]
        );

        let failure = compiler.compile(ITEMS, None).await.unwrap_err();
        assert_eq!(failure.errors[0].code, ErrorCode::OasExternalRef);
    }

    #[test]
    fn failure_envelope_shape() {
        let failure = CompileFailure::from(CompilerError::parse("bad"));
        let v = serde_json::to_value(&failure).unwrap();
        assert_eq!(v["errors"][0]["code"], "OAS_PARSE_ERROR");
        assert_eq!(v["errors"][0]["stage"], "Parse");
    }

    #[test]
    fn hash_ignores_descriptions() {
        let a = hash_document(&items_doc(), None).unwrap();
        let b = hash_document(&items_doc().replace("name: {type: string}", "name: {type: string, description: x}"), None).unwrap();
        assert_eq!(a, b);
    }
}
