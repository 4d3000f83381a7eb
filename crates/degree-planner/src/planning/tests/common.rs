use std::collections::BTreeSet;
use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::planning::domain::{
    CourseId, CourseRef, DeclaredMajor, EnrollmentStatus, Major, MajorKey, Requirement,
    RequirementId, StudentId,
};
use crate::planning::memory::{EnrollmentRecord, InMemoryCatalog, StudentRecord};
use crate::planning::prerequisites::PrerequisiteTree;
use crate::planning::repository::{
    CourseLookup, EnrollmentProvider, InMemoryPrerequisiteStore, MajorRequirementProvider,
    PrerequisiteStore, RepositoryError, StudentDirectory,
};
use crate::planning::{planner_router, DegreePlannerService};

pub(super) const STUDENT: StudentId = StudentId(1);
pub(super) const UNKNOWN_STUDENT: StudentId = StudentId(404);

pub(super) const CS_101: CourseId = CourseId(1);
pub(super) const CS_102: CourseId = CourseId(2);
pub(super) const MATH_101: CourseId = CourseId(3);
pub(super) const MATH_102: CourseId = CourseId(4);
pub(super) const PHYS_101: CourseId = CourseId(5);
pub(super) const CS_201: CourseId = CourseId(6);

pub(super) const CORE: RequirementId = RequirementId(10);
pub(super) const MATH_ELECTIVES: RequirementId = RequirementId(11);

pub(super) type TestService = DegreePlannerService<InMemoryCatalog, InMemoryPrerequisiteStore>;

pub(super) fn cs_bs() -> MajorKey {
    MajorKey::new("CS", "BS")
}

pub(super) fn math_ba() -> MajorKey {
    MajorKey::new("MATH", "BA")
}

pub(super) fn courses() -> Vec<CourseRef> {
    vec![
        CourseRef::new(CS_101, "CS", "101", 3).with_title("Intro to CS"),
        CourseRef::new(CS_102, "CS", "102", 3).with_title("Programming I"),
        CourseRef::new(MATH_101, "MATH", "101", 4).with_title("Calculus I"),
        CourseRef::new(MATH_102, "MATH", "102", 4).with_title("Calculus II"),
        CourseRef::new(PHYS_101, "PHYS", "101", 4).with_title("Physics I"),
        CourseRef::new(CS_201, "CS", "201", 3).with_title("Data Structures"),
    ]
}

pub(super) fn course(id: CourseId) -> CourseRef {
    courses()
        .into_iter()
        .find(|course| course.id == id)
        .expect("fixture course")
}

/// Catalog with one student who declared CS_BS but not MATH_BA.
///
/// CS_BS requires 20 credits: `Core` lists CS 101 and CS 102; `Math Electives` needs
/// 8 credits from MATH 101, MATH 102 and PHYS 101.
pub(super) fn catalog() -> InMemoryCatalog {
    let catalog = InMemoryCatalog::default();
    for course in courses() {
        catalog.insert_course(course).expect("course inserts");
    }

    catalog
        .insert_major(Major {
            key: cs_bs(),
            name: "Computer Science".to_string(),
            total_credits_required: 20,
        })
        .expect("major inserts");
    catalog
        .insert_major(Major {
            key: math_ba(),
            name: "Mathematics".to_string(),
            total_credits_required: 8,
        })
        .expect("major inserts");

    catalog
        .insert_requirement(
            Requirement::new(CORE, cs_bs(), "Core").with_courses([course(CS_101), course(CS_102)]),
        )
        .expect("requirement inserts");
    catalog
        .insert_requirement(
            Requirement::new(MATH_ELECTIVES, cs_bs(), "Math Electives")
                .with_min_credits(8)
                .with_courses([course(MATH_101), course(MATH_102), course(PHYS_101)]),
        )
        .expect("requirement inserts");
    catalog
        .insert_requirement(
            Requirement::new(RequirementId(20), math_ba(), "Calculus")
                .with_courses([course(MATH_101), course(MATH_102)]),
        )
        .expect("requirement inserts");

    catalog
        .insert_student(StudentRecord {
            id: STUDENT,
            name: "Arad Ganir".to_string(),
            declared_majors: Vec::new(),
        })
        .expect("student inserts");
    catalog
        .declare_major(STUDENT, DeclaredMajor::new(cs_bs()))
        .expect("major declared");

    catalog
}

pub(super) fn complete(catalog: &InMemoryCatalog, ids: &[CourseId]) {
    for (index, id) in ids.iter().enumerate() {
        catalog
            .record_enrollment(EnrollmentRecord {
                student: STUDENT,
                course: *id,
                semester: format!("term-{index}"),
                status: EnrollmentStatus::Completed,
            })
            .expect("enrollment recorded");
    }
}

pub(super) fn enroll(catalog: &InMemoryCatalog, id: CourseId) {
    catalog
        .record_enrollment(EnrollmentRecord {
            student: STUDENT,
            course: id,
            semester: "current".to_string(),
            status: EnrollmentStatus::InProgress,
        })
        .expect("enrollment recorded");
}

pub(super) fn build_service() -> (
    TestService,
    Arc<InMemoryCatalog>,
    Arc<InMemoryPrerequisiteStore>,
) {
    let records = Arc::new(catalog());
    let prerequisites = Arc::new(InMemoryPrerequisiteStore::default());
    let service = DegreePlannerService::with_max_depth(records.clone(), prerequisites.clone(), 8);
    (service, records, prerequisites)
}

pub(super) fn router_with_service(service: TestService) -> axum::Router {
    planner_router(Arc::new(service))
}

pub(super) fn ids(courses: &[CourseRef]) -> Vec<CourseId> {
    courses.iter().map(|course| course.id).collect()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) struct UnavailableRecords;

impl CourseLookup for UnavailableRecords {
    fn course(&self, _id: CourseId) -> Result<Option<CourseRef>, RepositoryError> {
        Err(RepositoryError::Unavailable("registrar offline".to_string()))
    }

    fn courses(&self) -> Result<Vec<CourseRef>, RepositoryError> {
        Err(RepositoryError::Unavailable("registrar offline".to_string()))
    }
}

impl EnrollmentProvider for UnavailableRecords {
    fn completed_course_ids(&self, _student: StudentId) -> Result<BTreeSet<CourseId>, RepositoryError> {
        Err(RepositoryError::Unavailable("registrar offline".to_string()))
    }

    fn in_progress_course_ids(
        &self,
        _student: StudentId,
    ) -> Result<BTreeSet<CourseId>, RepositoryError> {
        Err(RepositoryError::Unavailable("registrar offline".to_string()))
    }
}

impl MajorRequirementProvider for UnavailableRecords {
    fn major(&self, _key: &MajorKey) -> Result<Option<Major>, RepositoryError> {
        Err(RepositoryError::Unavailable("registrar offline".to_string()))
    }

    fn requirements_for_major(&self, _key: &MajorKey) -> Result<Vec<Requirement>, RepositoryError> {
        Err(RepositoryError::Unavailable("registrar offline".to_string()))
    }

    fn requirement(&self, _id: RequirementId) -> Result<Option<Requirement>, RepositoryError> {
        Err(RepositoryError::Unavailable("registrar offline".to_string()))
    }
}

impl StudentDirectory for UnavailableRecords {
    fn student_exists(&self, _id: StudentId) -> Result<bool, RepositoryError> {
        Err(RepositoryError::Unavailable("registrar offline".to_string()))
    }

    fn declared_majors(&self, _id: StudentId) -> Result<Vec<DeclaredMajor>, RepositoryError> {
        Err(RepositoryError::Unavailable("registrar offline".to_string()))
    }
}

/// Store whose roots are cleared by another writer as soon as they land.
#[derive(Default)]
pub(super) struct ContendedPrerequisites {
    pub(super) writes: std::sync::Mutex<Vec<Arc<PrerequisiteTree>>>,
}

impl PrerequisiteStore for ContendedPrerequisites {
    fn root_for_course(
        &self,
        _course: CourseId,
    ) -> Result<Option<Arc<PrerequisiteTree>>, RepositoryError> {
        Ok(None)
    }

    fn replace_root_for_course(
        &self,
        _course: CourseId,
        tree: Arc<PrerequisiteTree>,
    ) -> Result<Option<Arc<PrerequisiteTree>>, RepositoryError> {
        self.writes.lock().expect("writes lock").push(tree);
        Ok(None)
    }

    fn remove_root_for_course(
        &self,
        _course: CourseId,
    ) -> Result<Option<Arc<PrerequisiteTree>>, RepositoryError> {
        Ok(None)
    }
}
