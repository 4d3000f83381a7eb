//! Evaluation of prerequisite trees against a student's completed courses.

use std::collections::BTreeSet;

use serde::Serialize;

use super::domain::{CourseId, CourseRef};
use super::prerequisites::{Operator, PrerequisiteNode, PrerequisiteTree};

/// Whether `completed` satisfies `tree`. A course without a tree is always satisfied.
pub fn is_satisfied(tree: Option<&PrerequisiteTree>, completed: &BTreeSet<CourseId>) -> bool {
    tree.map_or(true, |tree| node_satisfied(tree.root(), completed))
}

/// Unmet leaves of `tree`, deduplicated and in pre-order discovery order.
///
/// AND groups surface every unmet branch. An OR group reports all of its alternatives
/// while none of them is satisfied, and nothing once any one of them is.
pub fn collect_missing(
    tree: Option<&PrerequisiteTree>,
    completed: &BTreeSet<CourseId>,
) -> Vec<CourseId> {
    let mut missing = MissingCourses::default();
    if let Some(tree) = tree {
        collect_node(tree.root(), completed, &mut missing);
    }
    missing.ordered
}

fn node_satisfied(node: &PrerequisiteNode, completed: &BTreeSet<CourseId>) -> bool {
    match node {
        PrerequisiteNode::Leaf(course_id) => completed.contains(course_id),
        PrerequisiteNode::Group {
            operator: Operator::And,
            children,
        } => children.iter().all(|child| node_satisfied(child, completed)),
        PrerequisiteNode::Group {
            operator: Operator::Or,
            children,
        } => children.iter().any(|child| node_satisfied(child, completed)),
    }
}

#[derive(Default)]
struct MissingCourses {
    seen: BTreeSet<CourseId>,
    ordered: Vec<CourseId>,
}

impl MissingCourses {
    fn push(&mut self, course_id: CourseId) {
        if self.seen.insert(course_id) {
            self.ordered.push(course_id);
        }
    }
}

fn collect_node(
    node: &PrerequisiteNode,
    completed: &BTreeSet<CourseId>,
    missing: &mut MissingCourses,
) {
    match node {
        PrerequisiteNode::Leaf(course_id) => {
            if !completed.contains(course_id) {
                missing.push(*course_id);
            }
        }
        PrerequisiteNode::Group {
            operator: Operator::And,
            children,
        } => {
            for child in children {
                collect_node(child, completed, missing);
            }
        }
        PrerequisiteNode::Group {
            operator: Operator::Or,
            children,
        } => {
            if !children.iter().any(|child| node_satisfied(child, completed)) {
                for child in children {
                    collect_node(child, completed, missing);
                }
            }
        }
    }
}

/// Eligibility answer for one student and one course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EligibilityReport {
    pub course: CourseRef,
    pub eligible: bool,
    pub missing_prerequisites: Vec<CourseRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: CourseId = CourseId(1);
    const B: CourseId = CourseId(2);
    const C: CourseId = CourseId(3);
    const D: CourseId = CourseId(4);

    fn leaf(id: CourseId) -> PrerequisiteNode {
        PrerequisiteNode::leaf(id)
    }

    fn tree(root: PrerequisiteNode) -> PrerequisiteTree {
        PrerequisiteTree::new(root, 32).expect("tree builds")
    }

    fn completed(ids: &[CourseId]) -> BTreeSet<CourseId> {
        ids.iter().copied().collect()
    }

    fn subsets(universe: &[CourseId]) -> Vec<BTreeSet<CourseId>> {
        (0..1u32 << universe.len())
            .map(|mask| {
                universe
                    .iter()
                    .enumerate()
                    .filter(|(bit, _)| mask & (1 << bit) != 0)
                    .map(|(_, id)| *id)
                    .collect()
            })
            .collect()
    }

    #[test]
    fn absent_tree_is_satisfied_with_nothing_missing() {
        assert!(is_satisfied(None, &completed(&[])));
        assert!(collect_missing(None, &completed(&[])).is_empty());
    }

    #[test]
    fn or_of_leaves() {
        let tree = tree(PrerequisiteNode::any(vec![leaf(A), leaf(B)]));
        assert!(is_satisfied(Some(&tree), &completed(&[A])));
        assert!(!is_satisfied(Some(&tree), &completed(&[])));
        assert_eq!(collect_missing(Some(&tree), &completed(&[])), vec![A, B]);
        assert!(collect_missing(Some(&tree), &completed(&[B])).is_empty());
    }

    #[test]
    fn or_nested_in_and() {
        let tree = tree(PrerequisiteNode::all(vec![
            PrerequisiteNode::any(vec![leaf(A), leaf(B)]),
            leaf(C),
        ]));

        assert!(is_satisfied(Some(&tree), &completed(&[A, C])));
        assert!(!is_satisfied(Some(&tree), &completed(&[A])));
        assert_eq!(collect_missing(Some(&tree), &completed(&[])), vec![A, B, C]);
        assert_eq!(collect_missing(Some(&tree), &completed(&[A])), vec![C]);
    }

    #[test]
    fn and_groups_nested_in_or() {
        let tree = tree(PrerequisiteNode::any(vec![
            PrerequisiteNode::all(vec![leaf(A), leaf(B)]),
            PrerequisiteNode::all(vec![leaf(C), leaf(D)]),
        ]));

        assert!(is_satisfied(Some(&tree), &completed(&[C, D])));
        assert!(!is_satisfied(Some(&tree), &completed(&[A, D])));
        assert_eq!(
            collect_missing(Some(&tree), &completed(&[A, D])),
            vec![B, C],
            "unsatisfied OR reports the missing part of every alternative"
        );
        assert!(collect_missing(Some(&tree), &completed(&[C, D])).is_empty());
    }

    #[test]
    fn and_reports_every_unmet_branch() {
        let tree = tree(PrerequisiteNode::all(vec![
            PrerequisiteNode::any(vec![leaf(A), leaf(B)]),
            PrerequisiteNode::any(vec![leaf(C), leaf(D)]),
        ]));
        assert_eq!(collect_missing(Some(&tree), &completed(&[A])), vec![C, D]);
    }

    #[test]
    fn shared_leaves_are_reported_once() {
        let tree = tree(PrerequisiteNode::all(vec![
            PrerequisiteNode::any(vec![leaf(A), leaf(B)]),
            PrerequisiteNode::any(vec![leaf(B), leaf(C)]),
            leaf(A),
        ]));
        assert_eq!(collect_missing(Some(&tree), &completed(&[])), vec![A, B, C]);
    }

    #[test]
    fn empty_groups_follow_vacuous_truth() {
        let empty_and = tree(PrerequisiteNode::all(Vec::new()));
        let empty_or = tree(PrerequisiteNode::any(Vec::new()));

        assert!(is_satisfied(Some(&empty_and), &completed(&[])));
        assert!(!is_satisfied(Some(&empty_or), &completed(&[A])));
        assert!(collect_missing(Some(&empty_or), &completed(&[])).is_empty());
    }

    #[test]
    fn deeply_nested_tree_evaluates() {
        let root = (0..20).fold(leaf(A), |inner, level| {
            if level % 2 == 0 {
                PrerequisiteNode::all(vec![inner])
            } else {
                PrerequisiteNode::any(vec![inner, leaf(B)])
            }
        });
        let tree = PrerequisiteTree::new(root, 32).expect("depth within limit");
        assert!(is_satisfied(Some(&tree), &completed(&[B])));
        assert!(is_satisfied(Some(&tree), &completed(&[A])));
        assert!(!is_satisfied(Some(&tree), &completed(&[C])));
    }

    #[test]
    fn eligibility_is_monotonic_in_completed_courses() {
        let trees = [
            tree(PrerequisiteNode::all(vec![leaf(A), leaf(B), leaf(C)])),
            tree(PrerequisiteNode::all(vec![
                PrerequisiteNode::any(vec![leaf(A), leaf(B)]),
                leaf(C),
            ])),
            tree(PrerequisiteNode::any(vec![
                PrerequisiteNode::all(vec![leaf(A), leaf(B)]),
                PrerequisiteNode::all(vec![leaf(C), leaf(D)]),
            ])),
        ];
        let universe = [A, B, C, D];

        for tree in &trees {
            for smaller in subsets(&universe) {
                if !is_satisfied(Some(tree), &smaller) {
                    continue;
                }
                for larger in subsets(&universe) {
                    if smaller.is_subset(&larger) {
                        assert!(
                            is_satisfied(Some(tree), &larger),
                            "{tree} satisfied by {smaller:?} but not by {larger:?}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn nothing_missing_exactly_when_satisfied() {
        let tree = tree(PrerequisiteNode::all(vec![
            PrerequisiteNode::any(vec![leaf(A), PrerequisiteNode::all(vec![leaf(B), leaf(C)])]),
            leaf(D),
        ]));

        for done in subsets(&[A, B, C, D]) {
            assert_eq!(
                is_satisfied(Some(&tree), &done),
                collect_missing(Some(&tree), &done).is_empty(),
                "completed {done:?}"
            );
        }
    }
}
