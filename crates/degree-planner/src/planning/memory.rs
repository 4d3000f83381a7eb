use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use serde::Serialize;

use super::domain::{
    CourseId, CourseRef, DeclaredMajor, EnrollmentStatus, Major, MajorKey, Requirement,
    RequirementId, StudentId,
};
use super::repository::{
    CourseLookup, EnrollmentProvider, MajorRequirementProvider, RepositoryError, StudentDirectory,
};

/// Student identity as held by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentRecord {
    pub id: StudentId,
    pub name: String,
    pub declared_majors: Vec<DeclaredMajor>,
}

/// One attempt at a course in a given semester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrollmentRecord {
    pub student: StudentId,
    pub course: CourseId,
    pub semester: String,
    pub status: EnrollmentStatus,
}

/// Row counts of an in-memory catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatalogSummary {
    pub courses: usize,
    pub majors: usize,
    pub requirements: usize,
    pub students: usize,
    pub enrollments: usize,
}

#[derive(Debug, Default)]
struct CatalogState {
    courses: BTreeMap<CourseId, CourseRef>,
    majors: BTreeMap<MajorKey, Major>,
    requirements: BTreeMap<RequirementId, Requirement>,
    students: BTreeMap<StudentId, StudentRecord>,
    enrollments: Vec<EnrollmentRecord>,
}

impl CatalogState {
    fn course_ids_with_status(
        &self,
        student: StudentId,
        status: EnrollmentStatus,
    ) -> BTreeSet<CourseId> {
        self.enrollments
            .iter()
            .filter(|record| record.student == student && record.status == status)
            .map(|record| record.course)
            .collect()
    }
}

/// Courses, majors, students and enrollments held in process memory.
///
/// Stands in for the CRUD persistence layer: inserts reject duplicates with
/// [`RepositoryError::Conflict`] and references to unknown rows with
/// [`RepositoryError::NotFound`].
#[derive(Debug, Default, Clone)]
pub struct InMemoryCatalog {
    state: Arc<Mutex<CatalogState>>,
}

impl InMemoryCatalog {
    fn with_state<T>(
        &self,
        f: impl FnOnce(&mut CatalogState) -> Result<T, RepositoryError>,
    ) -> Result<T, RepositoryError> {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("catalog poisoned".to_string()))?;
        f(&mut guard)
    }

    pub fn insert_course(&self, course: CourseRef) -> Result<(), RepositoryError> {
        self.with_state(|state| {
            if state.courses.contains_key(&course.id) {
                return Err(RepositoryError::Conflict);
            }
            state.courses.insert(course.id, course);
            Ok(())
        })
    }

    pub fn insert_major(&self, major: Major) -> Result<(), RepositoryError> {
        self.with_state(|state| {
            if state.majors.contains_key(&major.key) {
                return Err(RepositoryError::Conflict);
            }
            state.majors.insert(major.key.clone(), major);
            Ok(())
        })
    }

    pub fn insert_requirement(&self, requirement: Requirement) -> Result<(), RepositoryError> {
        self.with_state(|state| {
            if state.requirements.contains_key(&requirement.id) {
                return Err(RepositoryError::Conflict);
            }
            if !state.majors.contains_key(&requirement.major) {
                return Err(RepositoryError::NotFound);
            }
            state.requirements.insert(requirement.id, requirement);
            Ok(())
        })
    }

    pub fn insert_student(&self, student: StudentRecord) -> Result<(), RepositoryError> {
        self.with_state(|state| {
            if state.students.contains_key(&student.id) {
                return Err(RepositoryError::Conflict);
            }
            state.students.insert(student.id, student);
            Ok(())
        })
    }

    pub fn declare_major(
        &self,
        student: StudentId,
        declared: DeclaredMajor,
    ) -> Result<(), RepositoryError> {
        self.with_state(|state| {
            if !state.majors.contains_key(&declared.major) {
                return Err(RepositoryError::NotFound);
            }
            let record = state
                .students
                .get_mut(&student)
                .ok_or(RepositoryError::NotFound)?;
            if record
                .declared_majors
                .iter()
                .any(|existing| existing.major == declared.major)
            {
                return Err(RepositoryError::Conflict);
            }
            record.declared_majors.push(declared);
            Ok(())
        })
    }

    /// Records an enrollment; the same student, course and semester may appear once.
    pub fn record_enrollment(&self, enrollment: EnrollmentRecord) -> Result<(), RepositoryError> {
        self.with_state(|state| {
            if !state.students.contains_key(&enrollment.student)
                || !state.courses.contains_key(&enrollment.course)
            {
                return Err(RepositoryError::NotFound);
            }
            if state.enrollments.iter().any(|existing| {
                existing.student == enrollment.student
                    && existing.course == enrollment.course
                    && existing.semester == enrollment.semester
            }) {
                return Err(RepositoryError::Conflict);
            }
            state.enrollments.push(enrollment);
            Ok(())
        })
    }

    /// Applies a batch of enrollments under a single lock. Every row must name a known
    /// student and course before anything is written. A row matching an enrollment on
    /// record (same student, course and semester) updates its status; any other row is
    /// appended. Returns the number of appended rows.
    pub fn apply_enrollments(
        &self,
        batch: Vec<EnrollmentRecord>,
    ) -> Result<usize, RepositoryError> {
        self.with_state(|state| {
            let unknown = batch.iter().any(|enrollment| {
                !state.students.contains_key(&enrollment.student)
                    || !state.courses.contains_key(&enrollment.course)
            });
            if unknown {
                return Err(RepositoryError::NotFound);
            }

            let mut appended = 0;
            for enrollment in batch {
                let existing = state.enrollments.iter_mut().find(|record| {
                    record.student == enrollment.student
                        && record.course == enrollment.course
                        && record.semester == enrollment.semester
                });
                match existing {
                    Some(record) => record.status = enrollment.status,
                    None => {
                        state.enrollments.push(enrollment);
                        appended += 1;
                    }
                }
            }
            Ok(appended)
        })
    }

    pub fn summary(&self) -> Result<CatalogSummary, RepositoryError> {
        self.with_state(|state| {
            Ok(CatalogSummary {
                courses: state.courses.len(),
                majors: state.majors.len(),
                requirements: state.requirements.len(),
                students: state.students.len(),
                enrollments: state.enrollments.len(),
            })
        })
    }
}

impl CourseLookup for InMemoryCatalog {
    fn course(&self, id: CourseId) -> Result<Option<CourseRef>, RepositoryError> {
        self.with_state(|state| Ok(state.courses.get(&id).cloned()))
    }

    fn courses(&self) -> Result<Vec<CourseRef>, RepositoryError> {
        self.with_state(|state| Ok(state.courses.values().cloned().collect()))
    }
}

impl EnrollmentProvider for InMemoryCatalog {
    fn completed_course_ids(&self, student: StudentId) -> Result<BTreeSet<CourseId>, RepositoryError> {
        self.with_state(|state| Ok(state.course_ids_with_status(student, EnrollmentStatus::Completed)))
    }

    fn in_progress_course_ids(
        &self,
        student: StudentId,
    ) -> Result<BTreeSet<CourseId>, RepositoryError> {
        self.with_state(|state| {
            Ok(state.course_ids_with_status(student, EnrollmentStatus::InProgress))
        })
    }
}

impl MajorRequirementProvider for InMemoryCatalog {
    fn major(&self, key: &MajorKey) -> Result<Option<Major>, RepositoryError> {
        self.with_state(|state| Ok(state.majors.get(key).cloned()))
    }

    fn requirements_for_major(&self, key: &MajorKey) -> Result<Vec<Requirement>, RepositoryError> {
        self.with_state(|state| {
            Ok(state
                .requirements
                .values()
                .filter(|requirement| &requirement.major == key)
                .cloned()
                .collect())
        })
    }

    fn requirement(&self, id: RequirementId) -> Result<Option<Requirement>, RepositoryError> {
        self.with_state(|state| Ok(state.requirements.get(&id).cloned()))
    }
}

impl StudentDirectory for InMemoryCatalog {
    fn student_exists(&self, id: StudentId) -> Result<bool, RepositoryError> {
        self.with_state(|state| Ok(state.students.contains_key(&id)))
    }

    fn declared_majors(&self, id: StudentId) -> Result<Vec<DeclaredMajor>, RepositoryError> {
        self.with_state(|state| {
            Ok(state
                .students
                .get(&id)
                .map(|student| student.declared_majors.clone())
                .unwrap_or_default())
        })
    }
}
