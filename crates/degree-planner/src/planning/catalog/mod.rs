//! JSON catalog files and CSV transcript exports that seed the in-memory collaborators.

mod transcript;

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;

use super::domain::{
    CourseId, CourseRef, DeclaredMajor, EnrollmentStatus, Major, MajorKey, Requirement,
    RequirementId, StudentId,
};
use super::memory::{EnrollmentRecord, InMemoryCatalog, StudentRecord};
use super::prerequisites::{PrerequisiteError, PrerequisiteSpec, PrerequisiteTree};
use super::repository::{InMemoryPrerequisiteStore, PrerequisiteStore, RepositoryError};

#[derive(Debug)]
pub enum CatalogImportError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Csv(csv::Error),
    Repository(RepositoryError),
    UnknownCourse {
        course: CourseId,
        referenced_by: String,
    },
    Prerequisites {
        course: CourseId,
        source: PrerequisiteError,
    },
    EnrollmentStatus {
        line: u64,
        value: String,
    },
}

impl std::fmt::Display for CatalogImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogImportError::Io(err) => write!(f, "failed to read catalog: {}", err),
            CatalogImportError::Json(err) => write!(f, "invalid catalog JSON: {}", err),
            CatalogImportError::Csv(err) => write!(f, "invalid transcript CSV data: {}", err),
            CatalogImportError::Repository(err) => {
                write!(f, "could not store catalog data: {}", err)
            }
            CatalogImportError::UnknownCourse {
                course,
                referenced_by,
            } => write!(f, "{} references unknown course {}", referenced_by, course),
            CatalogImportError::Prerequisites { course, source } => {
                write!(f, "invalid prerequisites for course {}: {}", course, source)
            }
            CatalogImportError::EnrollmentStatus { line, value } => write!(
                f,
                "unknown enrollment status '{}' on transcript line {}",
                value, line
            ),
        }
    }
}

impl std::error::Error for CatalogImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogImportError::Io(err) => Some(err),
            CatalogImportError::Json(err) => Some(err),
            CatalogImportError::Csv(err) => Some(err),
            CatalogImportError::Repository(err) => Some(err),
            CatalogImportError::Prerequisites { source, .. } => Some(source),
            CatalogImportError::UnknownCourse { .. }
            | CatalogImportError::EnrollmentStatus { .. } => None,
        }
    }
}

impl From<std::io::Error> for CatalogImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for CatalogImportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<csv::Error> for CatalogImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<RepositoryError> for CatalogImportError {
    fn from(err: RepositoryError) -> Self {
        Self::Repository(err)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogFile {
    #[serde(default)]
    courses: Vec<CourseEntry>,
    #[serde(default)]
    majors: Vec<MajorEntry>,
    #[serde(default)]
    students: Vec<StudentEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CourseEntry {
    id: CourseId,
    subject: String,
    number: String,
    #[serde(default)]
    title: String,
    credits: u32,
    #[serde(default)]
    prerequisites: Option<PrerequisiteSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MajorEntry {
    code: String,
    designation: String,
    name: String,
    total_credits_required: u32,
    #[serde(default)]
    requirements: Vec<RequirementEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequirementEntry {
    id: RequirementId,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    min_credits: Option<u32>,
    #[serde(default)]
    courses: Vec<CourseId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StudentEntry {
    id: StudentId,
    name: String,
    #[serde(default)]
    declared_majors: Vec<DeclaredMajorEntry>,
    #[serde(default)]
    enrollments: Vec<EnrollmentEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeclaredMajorEntry {
    code: String,
    designation: String,
    #[serde(default)]
    declared_on: Option<NaiveDate>,
    #[serde(default)]
    primary: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnrollmentEntry {
    course_id: CourseId,
    semester: String,
    status: EnrollmentStatus,
}

/// Collaborators populated from a catalog file.
#[derive(Debug, Default, Clone)]
pub struct LoadedCatalog {
    pub records: InMemoryCatalog,
    pub prerequisites: InMemoryPrerequisiteStore,
}

pub struct CatalogImporter;

impl CatalogImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        max_depth: usize,
    ) -> Result<LoadedCatalog, CatalogImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, max_depth)
    }

    /// Loads courses first so prerequisite leaves, requirement course lists and
    /// enrollments can be checked against them.
    pub fn from_reader<R: Read>(
        reader: R,
        max_depth: usize,
    ) -> Result<LoadedCatalog, CatalogImportError> {
        let file: CatalogFile = serde_json::from_reader(reader)?;
        let loaded = LoadedCatalog::default();

        let mut courses = BTreeMap::new();
        for entry in &file.courses {
            let course = CourseRef::new(entry.id, &entry.subject, &entry.number, entry.credits)
                .with_title(&entry.title);
            loaded.records.insert_course(course.clone())?;
            courses.insert(course.id, course);
        }

        for entry in &file.courses {
            if let Some(spec) = &entry.prerequisites {
                let tree = PrerequisiteTree::from_spec(spec, max_depth).map_err(|source| {
                    CatalogImportError::Prerequisites {
                        course: entry.id,
                        source,
                    }
                })?;
                if let Some(unknown) = tree
                    .course_ids()
                    .into_iter()
                    .find(|id| !courses.contains_key(id))
                {
                    return Err(CatalogImportError::UnknownCourse {
                        course: unknown,
                        referenced_by: format!("prerequisites of course {}", entry.id),
                    });
                }
                loaded
                    .prerequisites
                    .replace_root_for_course(entry.id, Arc::new(tree))?;
            }
        }

        for entry in file.majors {
            let key = MajorKey::new(entry.code, entry.designation);
            loaded.records.insert_major(Major {
                key: key.clone(),
                name: entry.name,
                total_credits_required: entry.total_credits_required,
            })?;

            for requirement in entry.requirements {
                let mut built = Requirement::new(requirement.id, key.clone(), requirement.name);
                if let Some(description) = requirement.description {
                    built = built.with_description(description);
                }
                if let Some(min_credits) = requirement.min_credits {
                    built = built.with_min_credits(min_credits);
                }
                for course_id in requirement.courses {
                    let course = courses.get(&course_id).cloned().ok_or_else(|| {
                        CatalogImportError::UnknownCourse {
                            course: course_id,
                            referenced_by: format!("requirement {}", requirement.id),
                        }
                    })?;
                    built = built.with_course(course);
                }
                loaded.records.insert_requirement(built)?;
            }
        }

        for entry in file.students {
            loaded.records.insert_student(StudentRecord {
                id: entry.id,
                name: entry.name,
                declared_majors: Vec::new(),
            })?;
            for declared in entry.declared_majors {
                loaded.records.declare_major(
                    entry.id,
                    DeclaredMajor {
                        major: MajorKey::new(declared.code, declared.designation),
                        declared_on: declared.declared_on,
                        primary: declared.primary,
                    },
                )?;
            }
            for enrollment in entry.enrollments {
                if !courses.contains_key(&enrollment.course_id) {
                    return Err(CatalogImportError::UnknownCourse {
                        course: enrollment.course_id,
                        referenced_by: format!("enrollments of student {}", entry.id),
                    });
                }
                loaded.records.record_enrollment(EnrollmentRecord {
                    student: entry.id,
                    course: enrollment.course_id,
                    semester: enrollment.semester,
                    status: enrollment.status,
                })?;
            }
        }

        Ok(loaded)
    }
}

impl LoadedCatalog {
    pub fn import_transcript_path<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<usize, CatalogImportError> {
        let file = std::fs::File::open(path)?;
        self.import_transcript(file)
    }

    /// Applies a transcript export. A row for an enrollment already on record updates
    /// its status; any other row is recorded as a new enrollment. Every row is checked
    /// before any is written, so a failed import leaves the catalog untouched. Returns
    /// the row count.
    pub fn import_transcript<R: Read>(&self, reader: R) -> Result<usize, CatalogImportError> {
        let records = transcript::parse_records(reader)?;

        let batch = records
            .into_iter()
            .map(|record| {
                let status = EnrollmentStatus::parse(&record.status).ok_or_else(|| {
                    CatalogImportError::EnrollmentStatus {
                        line: record.line,
                        value: record.status.clone(),
                    }
                })?;
                Ok(EnrollmentRecord {
                    student: record.student,
                    course: record.course,
                    semester: record.semester,
                    status,
                })
            })
            .collect::<Result<Vec<_>, CatalogImportError>>()?;

        let count = batch.len();
        self.records.apply_enrollments(batch)?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planning::repository::{
        CourseLookup, EnrollmentProvider, MajorRequirementProvider, StudentDirectory,
    };
    use serde_json::json;
    use std::io::Cursor;

    fn catalog_json() -> String {
        json!({
            "courses": [
                { "id": 1, "subject": "CS", "number": "170", "title": "Intro", "credits": 4 },
                { "id": 2, "subject": "CS", "number": "171", "credits": 4,
                  "prerequisites": { "courseId": 1 } },
                { "id": 3, "subject": "CS", "number": "224", "credits": 3,
                  "prerequisites": { "type": "AND", "items": [
                      { "courseId": 2 },
                      { "type": "OR", "items": [{ "courseId": 1 }, { "courseId": 2 }] }
                  ] } }
            ],
            "majors": [
                { "code": "CS", "designation": "BS", "name": "Computer Science",
                  "totalCreditsRequired": 11,
                  "requirements": [
                      { "id": 10, "name": "Core", "description": "Introductory sequence",
                        "courses": [1, 2] },
                      { "id": 11, "name": "Electives", "minCredits": 3, "courses": [3] }
                  ] }
            ],
            "students": [
                { "id": 7, "name": "Ada",
                  "declaredMajors": [{ "code": "CS", "designation": "BS", "primary": true }],
                  "enrollments": [
                      { "courseId": 1, "semester": "Fall 2024", "status": "completed" },
                      { "courseId": 2, "semester": "Spring 2025", "status": "in_progress" }
                  ] }
            ]
        })
        .to_string()
    }

    fn load(json: &str) -> Result<LoadedCatalog, CatalogImportError> {
        CatalogImporter::from_reader(Cursor::new(json.to_string()), 32)
    }

    #[test]
    fn loads_every_section() {
        let loaded = load(&catalog_json()).expect("catalog loads");

        let summary = loaded.records.summary().expect("available");
        assert_eq!(summary.courses, 3);
        assert_eq!(summary.majors, 1);
        assert_eq!(summary.requirements, 2);
        assert_eq!(summary.students, 1);
        assert_eq!(summary.enrollments, 2);
        assert_eq!(loaded.prerequisites.len().expect("available"), 2);

        let course = loaded
            .records
            .course(CourseId(1))
            .expect("available")
            .expect("course present");
        assert_eq!(course.title, "Intro");

        let key = MajorKey::new("CS", "BS");
        let requirements = loaded
            .records
            .requirements_for_major(&key)
            .expect("available");
        assert_eq!(requirements[0].courses.len(), 2);
        assert_eq!(
            requirements[0].description.as_deref(),
            Some("Introductory sequence")
        );
        assert_eq!(requirements[1].min_credits, Some(3));

        let declared = loaded.records.declared_majors(StudentId(7)).expect("available");
        assert!(declared[0].primary);
        assert!(loaded
            .records
            .completed_course_ids(StudentId(7))
            .expect("available")
            .contains(&CourseId(1)));
    }

    #[test]
    fn prerequisite_leaf_must_reference_known_course() {
        let json = json!({
            "courses": [
                { "id": 1, "subject": "CS", "number": "170", "credits": 4,
                  "prerequisites": { "courseId": 99 } }
            ]
        })
        .to_string();
        let err = load(&json).expect_err("unknown leaf rejected");
        assert!(matches!(
            err,
            CatalogImportError::UnknownCourse {
                course: CourseId(99),
                ..
            }
        ));
    }

    #[test]
    fn malformed_prerequisites_name_the_course() {
        let json = json!({
            "courses": [
                { "id": 1, "subject": "CS", "number": "170", "credits": 4,
                  "prerequisites": { "type": "NAND", "items": [] } }
            ]
        })
        .to_string();
        let err = load(&json).expect_err("unknown operator rejected");
        assert!(matches!(
            err,
            CatalogImportError::Prerequisites {
                course: CourseId(1),
                source: PrerequisiteError::UnknownOperator(_)
            }
        ));
    }

    #[test]
    fn duplicate_course_ids_conflict() {
        let json = json!({
            "courses": [
                { "id": 1, "subject": "CS", "number": "170", "credits": 4 },
                { "id": 1, "subject": "CS", "number": "171", "credits": 4 }
            ]
        })
        .to_string();
        assert!(matches!(
            load(&json),
            Err(CatalogImportError::Repository(RepositoryError::Conflict))
        ));
    }

    #[test]
    fn transcript_updates_existing_and_records_new_enrollments() {
        let loaded = load(&catalog_json()).expect("catalog loads");
        let csv = "student_id,course_id,semester,status\n\
                   7,2,Spring 2025,completed\n\
                   7,3,Fall 2025,enrolled\n";

        let rows = loaded
            .import_transcript(Cursor::new(csv))
            .expect("transcript imports");
        assert_eq!(rows, 2);

        let completed = loaded
            .records
            .completed_course_ids(StudentId(7))
            .expect("available");
        assert!(completed.contains(&CourseId(2)));
        let in_progress = loaded
            .records
            .in_progress_course_ids(StudentId(7))
            .expect("available");
        assert_eq!(in_progress.into_iter().collect::<Vec<_>>(), vec![CourseId(3)]);
        assert_eq!(loaded.records.summary().expect("available").enrollments, 3);
    }

    #[test]
    fn transcript_rejects_unknown_status() {
        let loaded = load(&catalog_json()).expect("catalog loads");
        let csv = "student_id,course_id,semester,status\n7,3,Fall 2025,audit\n";
        let err = loaded
            .import_transcript(Cursor::new(csv))
            .expect_err("status rejected");
        assert!(matches!(
            err,
            CatalogImportError::EnrollmentStatus { line: 2, .. }
        ));
    }

    #[test]
    fn rejected_transcript_leaves_enrollments_untouched() {
        let loaded = load(&catalog_json()).expect("catalog loads");
        let before = loaded
            .records
            .completed_course_ids(StudentId(7))
            .expect("available");

        let csv = "student_id,course_id,semester,status\n\
                   7,2,Spring 2025,completed\n\
                   7,3,Fall 2025,bogus\n";
        let err = loaded
            .import_transcript(Cursor::new(csv))
            .expect_err("status rejected");
        assert!(matches!(
            err,
            CatalogImportError::EnrollmentStatus { line: 3, .. }
        ));

        let after = loaded
            .records
            .completed_course_ids(StudentId(7))
            .expect("available");
        assert_eq!(after, before);
        assert_eq!(loaded.records.summary().expect("available").enrollments, 2);

        let unknown_student = "student_id,course_id,semester,status\n\
                               7,3,Fall 2025,completed\n\
                               99,3,Fall 2025,completed\n";
        assert!(loaded.import_transcript(Cursor::new(unknown_student)).is_err());
        assert!(!loaded
            .records
            .completed_course_ids(StudentId(7))
            .expect("available")
            .contains(&CourseId(3)));
    }

    #[test]
    fn transcript_rejects_unknown_student() {
        let loaded = load(&catalog_json()).expect("catalog loads");
        let csv = "student_id,course_id,semester,status\n99,3,Fall 2025,completed\n";
        assert!(matches!(
            loaded.import_transcript(Cursor::new(csv)),
            Err(CatalogImportError::Repository(RepositoryError::NotFound))
        ));
    }
}
