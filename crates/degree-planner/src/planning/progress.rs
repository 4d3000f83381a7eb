//! Requirement and major progress over a completed-course snapshot.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::domain::{
    CourseId, CourseRef, Major, MajorKey, Requirement, RequirementId, RequirementMode,
    RequirementStatus,
};

/// Progress of a student toward one requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequirementProgress {
    pub requirement_id: RequirementId,
    pub name: String,
    pub mode: RequirementMode,
    pub status: RequirementStatus,
    pub completed_courses: Vec<CourseRef>,
    pub remaining_courses: Vec<CourseRef>,
    pub credits_completed: u32,
    pub credits_remaining: u32,
}

impl RequirementProgress {
    /// Splits the requirement's courses into completed and remaining and derives the status.
    ///
    /// In credit-threshold mode the remaining list is informational; only the credit total
    /// decides completion. In enumeration mode every listed course must be completed.
    pub fn evaluate(requirement: &Requirement, completed: &BTreeSet<CourseId>) -> Self {
        let mut seen = BTreeSet::new();
        let (completed_courses, remaining_courses): (Vec<CourseRef>, Vec<CourseRef>) = requirement
            .courses
            .iter()
            .filter(|course| seen.insert(course.id))
            .cloned()
            .partition(|course| completed.contains(&course.id));

        let credits_completed = sum_credits(&completed_courses);

        let (status, credits_remaining) = match requirement.mode() {
            RequirementMode::CreditThreshold { min_credits } => {
                let status = if credits_completed >= min_credits {
                    RequirementStatus::Complete
                } else if credits_completed > 0 {
                    RequirementStatus::InProgress
                } else {
                    RequirementStatus::NotStarted
                };
                (status, min_credits.saturating_sub(credits_completed))
            }
            RequirementMode::Enumeration => {
                let status = if remaining_courses.is_empty() {
                    RequirementStatus::Complete
                } else if !completed_courses.is_empty() {
                    RequirementStatus::InProgress
                } else {
                    RequirementStatus::NotStarted
                };
                (status, sum_credits(&remaining_courses))
            }
        };

        Self {
            requirement_id: requirement.id,
            name: requirement.name.clone(),
            mode: requirement.mode(),
            status,
            completed_courses,
            remaining_courses,
            credits_completed,
            credits_remaining,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == RequirementStatus::Complete
    }
}

/// Progress of a student across every requirement of one major.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MajorProgress {
    pub major: MajorKey,
    pub name: String,
    pub total_credits_required: u32,
    pub credits_completed: u32,
    pub credits_remaining: u32,
    pub percent_complete: f64,
    pub requirements: Vec<RequirementProgress>,
}

impl MajorProgress {
    pub fn aggregate(
        major: &Major,
        requirements: &[Requirement],
        completed: &BTreeSet<CourseId>,
    ) -> Self {
        let progress = requirements
            .iter()
            .map(|requirement| RequirementProgress::evaluate(requirement, completed))
            .collect();

        let credits_completed = major_credits_completed(requirements, completed);
        let total = major.total_credits_required;
        let percent_complete = if total > 0 {
            f64::from(credits_completed) / f64::from(total) * 100.0
        } else {
            0.0
        };

        Self {
            major: major.key.clone(),
            name: major.name.clone(),
            total_credits_required: total,
            credits_completed,
            credits_remaining: total.saturating_sub(credits_completed),
            percent_complete,
            requirements: progress,
        }
    }

    pub fn completed_requirements(&self) -> impl Iterator<Item = &RequirementProgress> {
        self.requirements.iter().filter(|progress| progress.is_complete())
    }

    pub fn remaining_requirements(&self) -> impl Iterator<Item = &RequirementProgress> {
        self.requirements
            .iter()
            .filter(|progress| !progress.is_complete())
    }
}

/// Credits of the distinct completed courses that count toward any requirement.
/// A course listed by several requirements contributes once.
pub fn major_credits_completed(requirements: &[Requirement], completed: &BTreeSet<CourseId>) -> u32 {
    let counted: BTreeMap<CourseId, u32> = requirements
        .iter()
        .flat_map(|requirement| requirement.courses.iter())
        .filter(|course| completed.contains(&course.id))
        .map(|course| (course.id, course.credits))
        .collect();

    counted
        .values()
        .fold(0u32, |total, credits| total.saturating_add(*credits))
}

fn sum_credits(courses: &[CourseRef]) -> u32 {
    courses
        .iter()
        .fold(0u32, |total, course| total.saturating_add(course.credits))
}
