use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use super::domain::{
    CourseId, CourseRef, DeclaredMajor, Major, MajorKey, Requirement, RequirementId, StudentId,
};
use super::prerequisites::PrerequisiteTree;

/// Resolves course identifiers to catalog entries.
pub trait CourseLookup: Send + Sync {
    fn course(&self, id: CourseId) -> Result<Option<CourseRef>, RepositoryError>;
    fn courses(&self) -> Result<Vec<CourseRef>, RepositoryError>;
}

/// Source of a student's enrollment history.
pub trait EnrollmentProvider: Send + Sync {
    fn completed_course_ids(&self, student: StudentId) -> Result<BTreeSet<CourseId>, RepositoryError>;
    fn in_progress_course_ids(
        &self,
        student: StudentId,
    ) -> Result<BTreeSet<CourseId>, RepositoryError>;
}

/// Majors and the requirements attached to them.
pub trait MajorRequirementProvider: Send + Sync {
    fn major(&self, key: &MajorKey) -> Result<Option<Major>, RepositoryError>;
    fn requirements_for_major(&self, key: &MajorKey) -> Result<Vec<Requirement>, RepositoryError>;
    fn requirement(&self, id: RequirementId) -> Result<Option<Requirement>, RepositoryError>;
}

/// Student identity and declared majors.
pub trait StudentDirectory: Send + Sync {
    fn student_exists(&self, id: StudentId) -> Result<bool, RepositoryError>;
    fn declared_majors(&self, id: StudentId) -> Result<Vec<DeclaredMajor>, RepositoryError>;
}

/// Every read-side collaborator the planner consults.
pub trait AcademicRecords:
    CourseLookup + EnrollmentProvider + MajorRequirementProvider + StudentDirectory
{
}

impl<T> AcademicRecords for T where
    T: CourseLookup + EnrollmentProvider + MajorRequirementProvider + StudentDirectory
{
}

/// Storage for the prerequisite root of each course.
pub trait PrerequisiteStore: Send + Sync {
    fn root_for_course(
        &self,
        course: CourseId,
    ) -> Result<Option<Arc<PrerequisiteTree>>, RepositoryError>;

    /// Installs `tree` as the course's root and discards the previous one in a single step.
    /// Concurrent readers observe either the old tree or the new one, never a mix.
    /// Returns the replaced tree, if any.
    fn replace_root_for_course(
        &self,
        course: CourseId,
        tree: Arc<PrerequisiteTree>,
    ) -> Result<Option<Arc<PrerequisiteTree>>, RepositoryError>;

    fn remove_root_for_course(
        &self,
        course: CourseId,
    ) -> Result<Option<Arc<PrerequisiteTree>>, RepositoryError>;
}

/// Error enumeration for collaborator failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Prerequisite store keeping immutable roots behind a mutex; replacing a root swaps
/// one `Arc` for another.
#[derive(Debug, Default, Clone)]
pub struct InMemoryPrerequisiteStore {
    roots: Arc<Mutex<HashMap<CourseId, Arc<PrerequisiteTree>>>>,
}

impl InMemoryPrerequisiteStore {
    fn with_roots<T>(
        &self,
        f: impl FnOnce(&mut HashMap<CourseId, Arc<PrerequisiteTree>>) -> T,
    ) -> Result<T, RepositoryError> {
        let mut guard = self
            .roots
            .lock()
            .map_err(|_| RepositoryError::Unavailable("prerequisite store poisoned".to_string()))?;
        Ok(f(&mut guard))
    }

    pub fn len(&self) -> Result<usize, RepositoryError> {
        self.with_roots(|roots| roots.len())
    }

    pub fn is_empty(&self) -> Result<bool, RepositoryError> {
        self.with_roots(|roots| roots.is_empty())
    }
}

impl PrerequisiteStore for InMemoryPrerequisiteStore {
    fn root_for_course(
        &self,
        course: CourseId,
    ) -> Result<Option<Arc<PrerequisiteTree>>, RepositoryError> {
        self.with_roots(|roots| roots.get(&course).cloned())
    }

    fn replace_root_for_course(
        &self,
        course: CourseId,
        tree: Arc<PrerequisiteTree>,
    ) -> Result<Option<Arc<PrerequisiteTree>>, RepositoryError> {
        self.with_roots(|roots| roots.insert(course, tree))
    }

    fn remove_root_for_course(
        &self,
        course: CourseId,
    ) -> Result<Option<Arc<PrerequisiteTree>>, RepositoryError> {
        self.with_roots(|roots| roots.remove(&course))
    }
}
