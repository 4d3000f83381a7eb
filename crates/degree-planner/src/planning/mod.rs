//! Degree planning: prerequisite eligibility and major progress.
//!
//! The calculators in [`eligibility`] and [`progress`] are pure functions over a student's
//! completed-course set. [`DegreePlannerService`] fetches those inputs from the collaborator
//! traits in [`repository`] and [`planner_router`] serves the results over HTTP.

pub mod catalog;
pub mod domain;
pub mod eligibility;
pub mod memory;
pub mod prerequisites;
pub mod progress;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use catalog::{CatalogImportError, CatalogImporter, LoadedCatalog};
pub use domain::{
    CourseId, CourseRef, DeclaredMajor, EnrollmentStatus, Major, MajorKey, Requirement,
    RequirementId, RequirementMode, RequirementStatus, StudentId,
};
pub use eligibility::EligibilityReport;
pub use memory::{CatalogSummary, EnrollmentRecord, InMemoryCatalog, StudentRecord};
pub use prerequisites::{
    FlatPrerequisiteSpec, Operator, PrerequisiteError, PrerequisiteNode, PrerequisiteSpec,
    PrerequisiteTree, MAX_PREREQUISITE_DEPTH,
};
pub use progress::{MajorProgress, RequirementProgress};
pub use repository::{
    AcademicRecords, CourseLookup, EnrollmentProvider, InMemoryPrerequisiteStore,
    MajorRequirementProvider, PrerequisiteStore, RepositoryError, StudentDirectory,
};
pub use router::{planner_router, PrerequisiteView};
pub use service::{DegreePlannerService, NotFound, PlannerServiceError};
