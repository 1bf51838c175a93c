use crate::canonical::to_canonical_string;
use crate::errors::CompilerError;
use crate::ir::{ApiIr, OperationKind, ResourceIr};
use crate::planner::llm_client::{ChatMessage, ChatRequest};
use crate::uiplan::ViewKind;
use serde_json::json;
use tera::{Context, Tera};

const SYSTEM_TEMPLATE: &str = include_str!("../../templates/uiplan/system.tera");
const USER_TEMPLATE: &str = include_str!("../../templates/uiplan/user.tera");

/// Views a resource's plan must carry, in fixed view order
pub fn expected_views(resource: &ResourceIr) -> Vec<ViewKind> {
    [
        (OperationKind::List, ViewKind::List),
        (OperationKind::Detail, ViewKind::Detail),
        (OperationKind::Create, ViewKind::Create),
        (OperationKind::Update, ViewKind::Edit),
    ]
    .into_iter()
    .filter(|(op, _)| resource.has_kind(*op))
    .map(|(_, view)| view)
    .collect()
}

/// Render the system and user messages for one ApiIR.
///
/// The ApiIR is embedded in its key-sorted form so identical IRs produce
/// byte-identical requests.
pub fn build_request(ir: &ApiIr, max_tokens: u32) -> Result<ChatRequest, CompilerError> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![("system", SYSTEM_TEMPLATE), ("user", USER_TEMPLATE)])
        .map_err(render_error)?;

    let tree = serde_json::to_value(ir)
        .map_err(|e| CompilerError::llm_unavailable(format!("cannot serialize ApiIR: {}", e)))?;

    let resources: Vec<_> = ir
        .resources
        .iter()
        .map(|r| {
            json!({
                "name": r.name,
                "views": expected_views(r).iter().map(ViewKind::as_str).collect::<Vec<_>>(),
            })
        })
        .collect();

    let mut context = Context::new();
    context.insert("title", &ir.api.title);
    context.insert("version", &ir.api.version);
    context.insert("resources", &resources);
    context.insert("api_ir", &to_canonical_string(&tree));

    let system = tera.render("system", &context).map_err(render_error)?;
    let user = tera.render("user", &context).map_err(render_error)?;

    Ok(ChatRequest {
        messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
        max_tokens,
    })
}

fn render_error(e: tera::Error) -> CompilerError {
    CompilerError::llm_unavailable(format!("cannot render planner prompt: {}", e))
}
