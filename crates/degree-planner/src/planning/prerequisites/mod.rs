//! Prerequisite expressions: the recursive AND/OR tree that gates a course.
//!
//! Trees only enter the planner through [`PrerequisiteTree`]'s constructors, which check the
//! node shape and the nesting depth once. Traversal code downstream can therefore match
//! exhaustively on [`PrerequisiteNode`] and never fails.

mod wire;

pub use wire::{FlatPrerequisiteSpec, PrerequisiteSpec};

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::domain::CourseId;

/// Hard ceiling on tree depth; configuration may only lower it.
pub const MAX_PREREQUISITE_DEPTH: usize = 64;

/// Boolean combinator applied to the children of a group node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operator {
    And,
    Or,
}

impl Operator {
    pub const fn label(self) -> &'static str {
        match self {
            Operator::And => "AND",
            Operator::Or => "OR",
        }
    }
}

impl FromStr for Operator {
    type Err = PrerequisiteError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "AND" => Ok(Operator::And),
            "OR" => Ok(Operator::Or),
            _ => Err(PrerequisiteError::UnknownOperator(value.to_string())),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single node of a prerequisite expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrerequisiteNode {
    Leaf(CourseId),
    Group {
        operator: Operator,
        children: Vec<PrerequisiteNode>,
    },
}

impl PrerequisiteNode {
    pub fn leaf(course_id: CourseId) -> Self {
        PrerequisiteNode::Leaf(course_id)
    }

    pub fn all(children: Vec<PrerequisiteNode>) -> Self {
        PrerequisiteNode::Group {
            operator: Operator::And,
            children,
        }
    }

    pub fn any(children: Vec<PrerequisiteNode>) -> Self {
        PrerequisiteNode::Group {
            operator: Operator::Or,
            children,
        }
    }

    /// Number of nodes on the longest root-to-leaf path. Walks iteratively so an
    /// unvalidated, arbitrarily deep node cannot exhaust the stack.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut pending = vec![(self, 1usize)];
        while let Some((node, depth)) = pending.pop() {
            deepest = deepest.max(depth);
            if let PrerequisiteNode::Group { children, .. } = node {
                pending.extend(children.iter().map(|child| (child, depth + 1)));
            }
        }
        deepest
    }
}

/// Errors raised while turning external input into a [`PrerequisiteTree`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrerequisiteError {
    #[error("malformed prerequisite node at {path}: expected either a courseId or a type with items")]
    MalformedNode { path: String },
    #[error("unknown prerequisite operator '{0}'")]
    UnknownOperator(String),
    #[error("prerequisite tree exceeds the maximum depth of {limit}")]
    TooDeep { limit: usize },
}

/// Validated, immutable prerequisite expression rooted at one course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrerequisiteTree {
    root: PrerequisiteNode,
    depth: usize,
}

impl PrerequisiteTree {
    /// Wraps an already-built node after checking its depth against `max_depth`
    /// (clamped to [`MAX_PREREQUISITE_DEPTH`]).
    pub fn new(root: PrerequisiteNode, max_depth: usize) -> Result<Self, PrerequisiteError> {
        let limit = effective_limit(max_depth);
        let depth = root.depth();
        if depth > limit {
            return Err(PrerequisiteError::TooDeep { limit });
        }
        Ok(Self { root, depth })
    }

    /// Builds a tree from its wire shape.
    pub fn from_spec(spec: &PrerequisiteSpec, max_depth: usize) -> Result<Self, PrerequisiteError> {
        let limit = effective_limit(max_depth);
        let root = build_node(spec, "root", 1, limit)?;
        let depth = root.depth();
        Ok(Self { root, depth })
    }

    /// Legacy form: a single group whose children are all leaves.
    pub fn flat(
        operator: Operator,
        course_ids: impl IntoIterator<Item = CourseId>,
        max_depth: usize,
    ) -> Result<Self, PrerequisiteError> {
        let children = course_ids.into_iter().map(PrerequisiteNode::Leaf).collect();
        Self::new(PrerequisiteNode::Group { operator, children }, max_depth)
    }

    pub fn root(&self) -> &PrerequisiteNode {
        &self.root
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Every course referenced by a leaf, in pre-order, without duplicates.
    pub fn course_ids(&self) -> Vec<CourseId> {
        let mut seen = BTreeSet::new();
        let mut ordered = Vec::new();
        let mut pending = vec![&self.root];
        while let Some(node) = pending.pop() {
            match node {
                PrerequisiteNode::Leaf(id) => {
                    if seen.insert(*id) {
                        ordered.push(*id);
                    }
                }
                PrerequisiteNode::Group { children, .. } => {
                    pending.extend(children.iter().rev());
                }
            }
        }
        ordered
    }

    /// Converts the tree back into its wire shape.
    pub fn to_spec(&self) -> PrerequisiteSpec {
        spec_from_node(&self.root)
    }
}

impl fmt::Display for PrerequisiteTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_node(f, &self.root, true)
    }
}

fn effective_limit(max_depth: usize) -> usize {
    max_depth.clamp(1, MAX_PREREQUISITE_DEPTH)
}

fn build_node(
    spec: &PrerequisiteSpec,
    path: &str,
    depth: usize,
    limit: usize,
) -> Result<PrerequisiteNode, PrerequisiteError> {
    if depth > limit {
        return Err(PrerequisiteError::TooDeep { limit });
    }

    match (&spec.course_id, &spec.operator, &spec.items) {
        (Some(course_id), None, None) => Ok(PrerequisiteNode::Leaf(*course_id)),
        (None, Some(operator), Some(items)) => {
            let operator = operator.parse::<Operator>()?;
            let children = items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    build_node(item, &format!("{path}.items[{index}]"), depth + 1, limit)
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(PrerequisiteNode::Group { operator, children })
        }
        _ => Err(PrerequisiteError::MalformedNode {
            path: path.to_string(),
        }),
    }
}

fn spec_from_node(node: &PrerequisiteNode) -> PrerequisiteSpec {
    match node {
        PrerequisiteNode::Leaf(course_id) => PrerequisiteSpec::leaf(*course_id),
        PrerequisiteNode::Group { operator, children } => {
            PrerequisiteSpec::group(*operator, children.iter().map(spec_from_node).collect())
        }
    }
}

fn write_node(f: &mut fmt::Formatter<'_>, node: &PrerequisiteNode, top: bool) -> fmt::Result {
    match node {
        PrerequisiteNode::Leaf(course_id) => write!(f, "{course_id}"),
        PrerequisiteNode::Group { operator, children } => {
            if children.is_empty() {
                return write!(f, "{operator}()");
            }
            if !top {
                f.write_str("(")?;
            }
            for (index, child) in children.iter().enumerate() {
                if index > 0 {
                    write!(f, " {operator} ")?;
                }
                write_node(f, child, false)?;
            }
            if !top {
                f.write_str(")")?;
            }
            Ok(())
        }
    }
}
