use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::domain::{CourseId, CourseRef, Major, MajorKey, Requirement, RequirementId, StudentId};
use super::eligibility::{self, EligibilityReport};
use super::prerequisites::{
    FlatPrerequisiteSpec, Operator, PrerequisiteError, PrerequisiteSpec, PrerequisiteTree,
};
use super::progress::{self, MajorProgress, RequirementProgress};
use super::repository::{AcademicRecords, PrerequisiteStore, RepositoryError};
use crate::config::PlannerConfig;

/// Service composing the academic-record collaborators, the prerequisite store and the
/// eligibility and progress calculators.
pub struct DegreePlannerService<R, P> {
    records: Arc<R>,
    prerequisites: Arc<P>,
    max_depth: usize,
}

impl<R, P> DegreePlannerService<R, P>
where
    R: AcademicRecords + 'static,
    P: PrerequisiteStore + 'static,
{
    pub fn new(records: Arc<R>, prerequisites: Arc<P>, config: &PlannerConfig) -> Self {
        Self::with_max_depth(records, prerequisites, config.max_prerequisite_depth)
    }

    pub fn with_max_depth(records: Arc<R>, prerequisites: Arc<P>, max_depth: usize) -> Self {
        Self {
            records,
            prerequisites,
            max_depth,
        }
    }

    pub fn max_prerequisite_depth(&self) -> usize {
        self.max_depth
    }

    /// Whether the student's completed courses satisfy the course's prerequisite tree.
    pub fn is_eligible(
        &self,
        student: StudentId,
        course: CourseId,
    ) -> Result<bool, PlannerServiceError> {
        self.require_student(student)?;
        self.require_course(course)?;
        let completed = self.records.completed_course_ids(student)?;
        let tree = self.prerequisites.root_for_course(course)?;
        Ok(eligibility::is_satisfied(tree.as_deref(), &completed))
    }

    /// Courses the student still has to complete before taking `course`.
    pub fn missing_prerequisites(
        &self,
        student: StudentId,
        course: CourseId,
    ) -> Result<Vec<CourseRef>, PlannerServiceError> {
        self.require_student(student)?;
        self.require_course(course)?;
        let completed = self.records.completed_course_ids(student)?;
        let tree = self.prerequisites.root_for_course(course)?;
        let missing = eligibility::collect_missing(tree.as_deref(), &completed);
        self.resolve_courses(course, missing)
    }

    /// Eligibility flag, missing courses and the rendered expression in one answer.
    pub fn eligibility(
        &self,
        student: StudentId,
        course: CourseId,
    ) -> Result<EligibilityReport, PlannerServiceError> {
        self.require_student(student)?;
        let course_ref = self.require_course(course)?;
        let completed = self.records.completed_course_ids(student)?;
        let tree = self.prerequisites.root_for_course(course)?;

        let eligible = eligibility::is_satisfied(tree.as_deref(), &completed);
        let missing = eligibility::collect_missing(tree.as_deref(), &completed);
        let missing_prerequisites = self.resolve_courses(course, missing)?;

        debug!(%student, %course, eligible, "evaluated course eligibility");
        Ok(EligibilityReport {
            course: course_ref,
            eligible,
            missing_prerequisites,
            expression: tree.map(|tree| tree.to_string()),
        })
    }

    /// Catalog courses the student could enroll in next: not completed, not in progress,
    /// prerequisites satisfied.
    pub fn eligible_courses(
        &self,
        student: StudentId,
    ) -> Result<Vec<CourseRef>, PlannerServiceError> {
        self.require_student(student)?;
        let completed = self.records.completed_course_ids(student)?;
        let in_progress = self.records.in_progress_course_ids(student)?;

        let mut eligible = Vec::new();
        for course in self.records.courses()? {
            if completed.contains(&course.id) || in_progress.contains(&course.id) {
                continue;
            }
            let tree = self.prerequisites.root_for_course(course.id)?;
            if eligibility::is_satisfied(tree.as_deref(), &completed) {
                eligible.push(course);
            }
        }
        Ok(eligible)
    }

    /// Progress toward a major the student has declared.
    pub fn major_progress(
        &self,
        student: StudentId,
        key: &MajorKey,
    ) -> Result<MajorProgress, PlannerServiceError> {
        let (major, requirements, completed) = self.declared_major_inputs(student, key)?;
        Ok(MajorProgress::aggregate(&major, &requirements, &completed))
    }

    /// Progress toward every declared major, in declaration order.
    pub fn overall_progress(
        &self,
        student: StudentId,
    ) -> Result<Vec<MajorProgress>, PlannerServiceError> {
        self.require_student(student)?;
        let completed = self.records.completed_course_ids(student)?;

        let mut progress = Vec::new();
        for declared in self.records.declared_majors(student)? {
            let major = self.require_major(&declared.major)?;
            let requirements = self.records.requirements_for_major(&declared.major)?;
            progress.push(MajorProgress::aggregate(&major, &requirements, &completed));
        }
        Ok(progress)
    }

    pub fn requirement_progress(
        &self,
        student: StudentId,
        requirement: RequirementId,
    ) -> Result<RequirementProgress, PlannerServiceError> {
        self.require_student(student)?;
        let requirement = self
            .records
            .requirement(requirement)?
            .ok_or(NotFound::Requirement(requirement))?;
        let completed = self.records.completed_course_ids(student)?;
        Ok(RequirementProgress::evaluate(&requirement, &completed))
    }

    /// Credits of distinct completed courses counting toward the major.
    pub fn credits_completed(
        &self,
        student: StudentId,
        key: &MajorKey,
    ) -> Result<u32, PlannerServiceError> {
        let (_, requirements, completed) = self.major_inputs(student, key)?;
        Ok(progress::major_credits_completed(&requirements, &completed))
    }

    pub fn completed_requirements(
        &self,
        student: StudentId,
        key: &MajorKey,
    ) -> Result<Vec<RequirementProgress>, PlannerServiceError> {
        let (_, requirements, completed) = self.major_inputs(student, key)?;
        Ok(requirements
            .iter()
            .map(|requirement| RequirementProgress::evaluate(requirement, &completed))
            .filter(RequirementProgress::is_complete)
            .collect())
    }

    pub fn remaining_requirements(
        &self,
        student: StudentId,
        key: &MajorKey,
    ) -> Result<Vec<RequirementProgress>, PlannerServiceError> {
        let (_, requirements, completed) = self.major_inputs(student, key)?;
        Ok(requirements
            .iter()
            .map(|requirement| RequirementProgress::evaluate(requirement, &completed))
            .filter(|progress| !progress.is_complete())
            .collect())
    }

    /// Validates `spec`, checks every leaf against the catalog and replaces the course's
    /// tree in one step.
    pub fn set_prerequisites(
        &self,
        course: CourseId,
        spec: &PrerequisiteSpec,
    ) -> Result<Arc<PrerequisiteTree>, PlannerServiceError> {
        let tree = PrerequisiteTree::from_spec(spec, self.max_depth)?;
        self.install(course, tree)
    }

    /// Legacy single-level form: one operator over a list of course ids.
    pub fn set_flat_prerequisites(
        &self,
        course: CourseId,
        spec: &FlatPrerequisiteSpec,
    ) -> Result<Arc<PrerequisiteTree>, PlannerServiceError> {
        let operator = Operator::from_str(&spec.operator)?;
        let tree =
            PrerequisiteTree::flat(operator, spec.course_ids.iter().copied(), self.max_depth)?;
        self.install(course, tree)
    }

    pub fn prerequisites(
        &self,
        course: CourseId,
    ) -> Result<Arc<PrerequisiteTree>, PlannerServiceError> {
        self.require_course(course)?;
        let tree = self
            .prerequisites
            .root_for_course(course)?
            .ok_or(NotFound::Prerequisites(course))?;
        Ok(tree)
    }

    /// Removes the course's tree; returns whether one was stored.
    pub fn remove_prerequisites(&self, course: CourseId) -> Result<bool, PlannerServiceError> {
        self.require_course(course)?;
        let removed = self.prerequisites.remove_root_for_course(course)?;
        if removed.is_some() {
            info!(%course, "removed course prerequisites");
        }
        Ok(removed.is_some())
    }

    fn install(
        &self,
        course: CourseId,
        tree: PrerequisiteTree,
    ) -> Result<Arc<PrerequisiteTree>, PlannerServiceError> {
        self.require_course(course)?;
        for leaf in tree.course_ids() {
            self.require_course(leaf)?;
        }

        let tree = Arc::new(tree);
        let replaced = self
            .prerequisites
            .replace_root_for_course(course, tree.clone())?
            .is_some();
        info!(%course, expression = %tree, replaced, "stored course prerequisites");
        Ok(tree)
    }

    fn require_student(&self, student: StudentId) -> Result<(), PlannerServiceError> {
        if self.records.student_exists(student)? {
            Ok(())
        } else {
            Err(NotFound::Student(student).into())
        }
    }

    fn require_course(&self, course: CourseId) -> Result<CourseRef, PlannerServiceError> {
        let found = self.records.course(course)?.ok_or(NotFound::Course(course))?;
        Ok(found)
    }

    fn require_major(&self, key: &MajorKey) -> Result<Major, PlannerServiceError> {
        let major = self
            .records
            .major(key)?
            .ok_or_else(|| NotFound::Major(key.clone()))?;
        Ok(major)
    }

    fn major_inputs(
        &self,
        student: StudentId,
        key: &MajorKey,
    ) -> Result<(Major, Vec<Requirement>, BTreeSet<CourseId>), PlannerServiceError> {
        self.require_student(student)?;
        let major = self.require_major(key)?;
        let requirements = self.records.requirements_for_major(key)?;
        let completed = self.records.completed_course_ids(student)?;
        Ok((major, requirements, completed))
    }

    fn declared_major_inputs(
        &self,
        student: StudentId,
        key: &MajorKey,
    ) -> Result<(Major, Vec<Requirement>, BTreeSet<CourseId>), PlannerServiceError> {
        let inputs = self.major_inputs(student, key)?;
        let declared = self
            .records
            .declared_majors(student)?
            .iter()
            .any(|declared| &declared.major == key);
        if !declared {
            return Err(NotFound::UndeclaredMajor {
                student,
                major: key.clone(),
            }
            .into());
        }
        Ok(inputs)
    }

    fn resolve_courses(
        &self,
        gated: CourseId,
        ids: Vec<CourseId>,
    ) -> Result<Vec<CourseRef>, PlannerServiceError> {
        let mut courses = Vec::with_capacity(ids.len());
        for id in ids {
            match self.records.course(id)? {
                Some(course) => courses.push(course),
                None => warn!(course = %gated, leaf = %id, "prerequisite references a course missing from the catalog"),
            }
        }
        Ok(courses)
    }
}

/// Lookup failures surfaced by the planner.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotFound {
    #[error("student {0} not found")]
    Student(StudentId),
    #[error("course {0} not found")]
    Course(CourseId),
    #[error("major {0} not found")]
    Major(MajorKey),
    #[error("requirement {0} not found")]
    Requirement(RequirementId),
    #[error("student {student} has not declared major {major}")]
    UndeclaredMajor { student: StudentId, major: MajorKey },
    #[error("course {0} has no prerequisites")]
    Prerequisites(CourseId),
}

/// Error raised by the planner service.
#[derive(Debug, thiserror::Error)]
pub enum PlannerServiceError {
    #[error(transparent)]
    NotFound(#[from] NotFound),
    #[error(transparent)]
    InvalidInput(#[from] PrerequisiteError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
