use serde::{Deserialize, Serialize};

use super::Operator;
use crate::planning::domain::CourseId;

/// JSON shape of a prerequisite node.
///
/// A leaf carries only `courseId`; a group carries `type` (alias `operator`) and `items`.
/// Every field is optional on the wire so shape errors surface as
/// [`PrerequisiteError`](super::PrerequisiteError) rather than opaque decode failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrerequisiteSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_id: Option<CourseId>,
    #[serde(
        default,
        rename = "type",
        alias = "operator",
        skip_serializing_if = "Option::is_none"
    )]
    pub operator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<PrerequisiteSpec>>,
}

impl PrerequisiteSpec {
    pub fn leaf(course_id: CourseId) -> Self {
        Self {
            course_id: Some(course_id),
            ..Self::default()
        }
    }

    pub fn group(operator: Operator, items: Vec<PrerequisiteSpec>) -> Self {
        Self {
            course_id: None,
            operator: Some(operator.label().to_string()),
            items: Some(items),
        }
    }
}

/// Legacy single-level form: one operator applied to a flat list of course ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatPrerequisiteSpec {
    #[serde(rename = "type", alias = "operator")]
    pub operator: String,
    #[serde(default)]
    pub course_ids: Vec<CourseId>,
}
