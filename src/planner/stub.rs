use super::prompt::expected_views;
use super::Planner;
use crate::errors::CompilerError;
use crate::ir::{ApiIr, OperationKind, ResourceIr};
use crate::schema_processor::object_schema;
use crate::uiplan::{validate_plan, UiPlanIr, ViewKind};
use async_trait::async_trait;
use serde_json::{json, Map, Value};

#[derive(Debug, Clone)]
enum PlanSource {
    Fixed(Value),
    Derived,
}

/// Deterministic planner: a fixed payload, or a plan derived from the ApiIR
#[derive(Debug, Clone)]
pub struct StubPlanner {
    source: PlanSource,
}

impl StubPlanner {
    /// Always answers with `payload` (still structurally validated)
    pub fn fixed(payload: Value) -> Self {
        Self { source: PlanSource::Fixed(payload) }
    }

    /// Every top-level response property in list/detail, every request
    /// property in create/edit, sorted by property name
    pub fn derived() -> Self {
        Self { source: PlanSource::Derived }
    }

    fn payload(&self, ir: &ApiIr) -> Value {
        match &self.source {
            PlanSource::Fixed(payload) => payload.clone(),
            PlanSource::Derived => derive_plan(ir),
        }
    }
}

#[async_trait]
impl Planner for StubPlanner {
    fn name(&self) -> &str {
        match self.source {
            PlanSource::Fixed(_) => "fixture",
            PlanSource::Derived => "derived",
        }
    }

    async fn plan(&self, ir: &ApiIr) -> Result<UiPlanIr, CompilerError> {
        validate_plan(&self.payload(ir)).map_err(|issue| CompilerError::uiplan_invalid(issue.to_string()))
    }
}

fn derive_plan(ir: &ApiIr) -> Value {
    let resources: Vec<Value> = ir
        .resources
        .iter()
        .map(|resource| {
            let mut views = Map::new();
            for view in expected_views(resource) {
                views.insert(view.as_str().to_string(), json!({"fields": view_fields(resource, view)}));
            }
            json!({"name": resource.name, "views": views})
        })
        .collect();
    json!({"resources": resources})
}

fn view_fields(resource: &ResourceIr, view: ViewKind) -> Vec<Value> {
    let schema = match view {
        ViewKind::List => resource.operation(OperationKind::List).map(|op| &op.response_schema),
        ViewKind::Detail => resource.operation(OperationKind::Detail).map(|op| &op.response_schema),
        ViewKind::Create => resource
            .operation(OperationKind::Create)
            .and_then(|op| op.request_schema.as_ref()),
        ViewKind::Edit => resource
            .operation(OperationKind::Update)
            .and_then(|op| op.request_schema.as_ref()),
    };

    schema
        .and_then(object_schema)
        .and_then(|s| s.get("properties"))
        .and_then(Value::as_object)
        .map(|props| {
            props
                .keys()
                .enumerate()
                .map(|(i, key)| json!({"path": key, "order": i}))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;
    use crate::ir::{ApiInfo, HttpMethod, OperationIr};

    fn items() -> ApiIr {
        let item = json!({"type": "object", "properties": {"id": {"type": "string"}, "name": {"type": "string"}}});
        ApiIr {
            api: ApiInfo { title: "T".into(), version: "1".into() },
            resources: vec![ResourceIr {
                name: "Items".into(),
                key: "items".into(),
                operations: vec![
                    OperationIr {
                        id: "list".into(),
                        method: HttpMethod::Get,
                        kind: OperationKind::List,
                        path: "/items".into(),
                        identifier_param: None,
                        request_schema: None,
                        response_schema: json!({"type": "array", "items": item}),
                    },
                    OperationIr {
                        id: "create".into(),
                        method: HttpMethod::Post,
                        kind: OperationKind::Create,
                        path: "/items".into(),
                        identifier_param: None,
                        request_schema: Some(json!({"type": "object", "properties": {"name": {"type": "string"}}})),
                        response_schema: item,
                    },
                ],
            }],
        }
    }

    #[tokio::test]
    async fn derived_plan_sorts_properties_by_name() {
        let mut ir = items();
        ir.resources[0].operations[1].request_schema = Some(json!({"type": "object", "properties": {
            "zeta": {"type": "string"}, "alpha": {"type": "string"}, "mid": {"type": "string"}
        }}));
        let plan = StubPlanner::derived().plan(&ir).await.unwrap();
        let create = plan.resources[0].views.create.as_ref().unwrap();
        assert_eq!(create.paths().collect::<Vec<_>>(), vec!["alpha", "mid", "zeta"]);
        assert_eq!(create.fields.iter().map(|f| f.order).collect::<Vec<_>>(), vec![Some(0.0), Some(1.0), Some(2.0)]);
    }

    #[tokio::test]
    async fn derived_plan_follows_operations() {
        let plan = StubPlanner::derived().plan(&items()).await.unwrap();
        let views = &plan.resources[0].views;
        assert_eq!(views.list.as_ref().unwrap().paths().collect::<Vec<_>>(), vec!["id", "name"]);
        assert_eq!(views.create.as_ref().unwrap().paths().collect::<Vec<_>>(), vec!["name"]);
        assert!(views.detail.is_none());
        assert!(views.edit.is_none());
    }

    #[tokio::test]
    async fn fixed_payload_is_validated() {
        let err = StubPlanner::fixed(json!({"resources": [{"name": "Items", "views": {}, "x": 1}]}))
            .plan(&items())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::UiplanInvalid);
    }
}
