pub mod normalize;
pub mod validate;

use serde::{Deserialize, Serialize, Serializer};

pub use normalize::normalize_plan;
pub use validate::{validate_plan, PlanIssue};

/// Planner output: which fields appear in which view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UiPlanIr {
    pub resources: Vec<ResourcePlan>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourcePlan {
    pub name: String,
    pub views: Views,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Views {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<ViewPlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<ViewPlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create: Option<ViewPlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit: Option<ViewPlan>,
}

impl Views {
    /// Present views in fixed order list, detail, create, edit
    pub fn iter(&self) -> impl Iterator<Item = (ViewKind, &ViewPlan)> {
        [
            (ViewKind::List, self.list.as_ref()),
            (ViewKind::Detail, self.detail.as_ref()),
            (ViewKind::Create, self.create.as_ref()),
            (ViewKind::Edit, self.edit.as_ref()),
        ]
        .into_iter()
        .filter_map(|(kind, view)| view.map(|v| (kind, v)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ViewPlan> {
        [
            self.list.as_mut(),
            self.detail.as_mut(),
            self.create.as_mut(),
            self.edit.as_mut(),
        ]
        .into_iter()
        .flatten()
    }

    pub fn get(&self, kind: ViewKind) -> Option<&ViewPlan> {
        match kind {
            ViewKind::List => self.list.as_ref(),
            ViewKind::Detail => self.detail.as_ref(),
            ViewKind::Create => self.create.as_ref(),
            ViewKind::Edit => self.edit.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    List,
    Detail,
    Create,
    Edit,
}

impl ViewKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewKind::List => "list",
            ViewKind::Detail => "detail",
            ViewKind::Create => "create",
            ViewKind::Edit => "edit",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewPlan {
    pub fields: Vec<FieldPlan>,
}

impl ViewPlan {
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.path.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct FieldPlan {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none", serialize_with = "serialize_order")]
    pub order: Option<f64>,
}

/// Whole orders are written as integers so `0` stays `0`, not `0.0`
fn serialize_order<S: Serializer>(order: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match order {
        Some(o) if o.fract() == 0.0 && o.abs() < (1u64 << 53) as f64 => serializer.serialize_i64(*o as i64),
        Some(o) => serializer.serialize_f64(*o),
        None => serializer.serialize_none(),
    }
}

impl FieldPlan {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            label: None,
            read_only: None,
            order: None,
        }
    }

    pub fn with_order(mut self, order: f64) -> Self {
        self.order = Some(order);
        self
    }
}
