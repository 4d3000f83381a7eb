use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Router,
};
use serde::Serialize;
use serde_json::json;

use super::domain::{CourseId, CourseRef, MajorKey, RequirementId, StudentId};
use super::prerequisites::{FlatPrerequisiteSpec, PrerequisiteSpec, PrerequisiteTree};
use super::progress::{MajorProgress, RequirementProgress};
use super::repository::{AcademicRecords, PrerequisiteStore, RepositoryError};
use super::service::{DegreePlannerService, PlannerServiceError};

type SharedService<R, P> = State<Arc<DegreePlannerService<R, P>>>;

/// Router builder exposing eligibility, progress and prerequisite endpoints.
pub fn planner_router<R, P>(service: Arc<DegreePlannerService<R, P>>) -> Router
where
    R: AcademicRecords + 'static,
    P: PrerequisiteStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/students/:student_id/eligibility/:course_id",
            get(eligibility_handler::<R, P>),
        )
        .route(
            "/api/v1/students/:student_id/eligible-courses",
            get(eligible_courses_handler::<R, P>),
        )
        .route(
            "/api/v1/students/:student_id/progress",
            get(overall_progress_handler::<R, P>),
        )
        .route(
            "/api/v1/students/:student_id/progress/:code/:designation",
            get(major_progress_handler::<R, P>),
        )
        .route(
            "/api/v1/students/:student_id/progress/:code/:designation/completed-requirements",
            get(completed_requirements_handler::<R, P>),
        )
        .route(
            "/api/v1/students/:student_id/progress/:code/:designation/remaining-requirements",
            get(remaining_requirements_handler::<R, P>),
        )
        .route(
            "/api/v1/students/:student_id/requirements/:requirement_id/progress",
            get(requirement_progress_handler::<R, P>),
        )
        .route(
            "/api/v1/courses/:course_id/prerequisites",
            get(get_prerequisites_handler::<R, P>)
                .put(put_prerequisites_handler::<R, P>)
                .delete(delete_prerequisites_handler::<R, P>),
        )
        .route(
            "/api/v1/courses/:course_id/prerequisites/flat",
            put(put_flat_prerequisites_handler::<R, P>),
        )
        .with_state(service)
}

/// JSON view of a stored prerequisite tree.
#[derive(Debug, Serialize)]
pub struct PrerequisiteView {
    pub course_id: CourseId,
    pub expression: String,
    pub depth: usize,
    pub tree: PrerequisiteSpec,
}

impl PrerequisiteView {
    fn new(course_id: CourseId, tree: &PrerequisiteTree) -> Self {
        Self {
            course_id,
            expression: tree.to_string(),
            depth: tree.depth(),
            tree: tree.to_spec(),
        }
    }
}

#[derive(Debug, Serialize)]
struct EligibleCoursesView {
    student_id: StudentId,
    courses: Vec<CourseRef>,
}

#[derive(Debug, Serialize)]
struct OverallProgressView {
    student_id: StudentId,
    majors: Vec<MajorProgress>,
}

#[derive(Debug, Serialize)]
struct RequirementListView {
    student_id: StudentId,
    major: MajorKey,
    requirements: Vec<RequirementProgress>,
}

pub(crate) async fn eligibility_handler<R, P>(
    State(service): SharedService<R, P>,
    Path((student_id, course_id)): Path<(u64, u64)>,
) -> Response
where
    R: AcademicRecords + 'static,
    P: PrerequisiteStore + 'static,
{
    match service.eligibility(StudentId(student_id), CourseId(course_id)) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn eligible_courses_handler<R, P>(
    State(service): SharedService<R, P>,
    Path(student_id): Path<u64>,
) -> Response
where
    R: AcademicRecords + 'static,
    P: PrerequisiteStore + 'static,
{
    let student_id = StudentId(student_id);
    match service.eligible_courses(student_id) {
        Ok(courses) => (
            StatusCode::OK,
            axum::Json(EligibleCoursesView {
                student_id,
                courses,
            }),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn overall_progress_handler<R, P>(
    State(service): SharedService<R, P>,
    Path(student_id): Path<u64>,
) -> Response
where
    R: AcademicRecords + 'static,
    P: PrerequisiteStore + 'static,
{
    let student_id = StudentId(student_id);
    match service.overall_progress(student_id) {
        Ok(majors) => (
            StatusCode::OK,
            axum::Json(OverallProgressView { student_id, majors }),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn major_progress_handler<R, P>(
    State(service): SharedService<R, P>,
    Path((student_id, code, designation)): Path<(u64, String, String)>,
) -> Response
where
    R: AcademicRecords + 'static,
    P: PrerequisiteStore + 'static,
{
    let key = MajorKey::new(code, designation);
    match service.major_progress(StudentId(student_id), &key) {
        Ok(progress) => (StatusCode::OK, axum::Json(progress)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn completed_requirements_handler<R, P>(
    State(service): SharedService<R, P>,
    Path((student_id, code, designation)): Path<(u64, String, String)>,
) -> Response
where
    R: AcademicRecords + 'static,
    P: PrerequisiteStore + 'static,
{
    let student_id = StudentId(student_id);
    let major = MajorKey::new(code, designation);
    match service.completed_requirements(student_id, &major) {
        Ok(requirements) => requirement_list(student_id, major, requirements),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn remaining_requirements_handler<R, P>(
    State(service): SharedService<R, P>,
    Path((student_id, code, designation)): Path<(u64, String, String)>,
) -> Response
where
    R: AcademicRecords + 'static,
    P: PrerequisiteStore + 'static,
{
    let student_id = StudentId(student_id);
    let major = MajorKey::new(code, designation);
    match service.remaining_requirements(student_id, &major) {
        Ok(requirements) => requirement_list(student_id, major, requirements),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn requirement_progress_handler<R, P>(
    State(service): SharedService<R, P>,
    Path((student_id, requirement_id)): Path<(u64, u64)>,
) -> Response
where
    R: AcademicRecords + 'static,
    P: PrerequisiteStore + 'static,
{
    match service.requirement_progress(StudentId(student_id), RequirementId(requirement_id)) {
        Ok(progress) => (StatusCode::OK, axum::Json(progress)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn get_prerequisites_handler<R, P>(
    State(service): SharedService<R, P>,
    Path(course_id): Path<u64>,
) -> Response
where
    R: AcademicRecords + 'static,
    P: PrerequisiteStore + 'static,
{
    let course_id = CourseId(course_id);
    match service.prerequisites(course_id) {
        Ok(tree) => (
            StatusCode::OK,
            axum::Json(PrerequisiteView::new(course_id, &tree)),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn put_prerequisites_handler<R, P>(
    State(service): SharedService<R, P>,
    Path(course_id): Path<u64>,
    axum::Json(spec): axum::Json<PrerequisiteSpec>,
) -> Response
where
    R: AcademicRecords + 'static,
    P: PrerequisiteStore + 'static,
{
    let course_id = CourseId(course_id);
    match service.set_prerequisites(course_id, &spec) {
        Ok(tree) => (
            StatusCode::OK,
            axum::Json(PrerequisiteView::new(course_id, &tree)),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn put_flat_prerequisites_handler<R, P>(
    State(service): SharedService<R, P>,
    Path(course_id): Path<u64>,
    axum::Json(spec): axum::Json<FlatPrerequisiteSpec>,
) -> Response
where
    R: AcademicRecords + 'static,
    P: PrerequisiteStore + 'static,
{
    let course_id = CourseId(course_id);
    match service.set_flat_prerequisites(course_id, &spec) {
        Ok(tree) => (
            StatusCode::OK,
            axum::Json(PrerequisiteView::new(course_id, &tree)),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn delete_prerequisites_handler<R, P>(
    State(service): SharedService<R, P>,
    Path(course_id): Path<u64>,
) -> Response
where
    R: AcademicRecords + 'static,
    P: PrerequisiteStore + 'static,
{
    match service.remove_prerequisites(CourseId(course_id)) {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

fn requirement_list(
    student_id: StudentId,
    major: MajorKey,
    requirements: Vec<RequirementProgress>,
) -> Response {
    let view = RequirementListView {
        student_id,
        major,
        requirements,
    };
    (StatusCode::OK, axum::Json(view)).into_response()
}

fn error_response(err: PlannerServiceError) -> Response {
    let status = match &err {
        PlannerServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        PlannerServiceError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PlannerServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        PlannerServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        PlannerServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    };
    let payload = json!({
        "error": err.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
