use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for catalog courses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseId(pub u64);

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier wrapper for enrolled students.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(pub u64);

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier wrapper for major requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequirementId(pub u64);

impl fmt::Display for RequirementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Natural key of a major: program code plus degree designation (`MATH` / `BS`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MajorKey {
    pub code: String,
    pub designation: String,
}

impl MajorKey {
    pub fn new(code: impl Into<String>, designation: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            designation: designation.into(),
        }
    }
}

impl fmt::Display for MajorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.code, self.designation)
    }
}

/// Catalog entry referenced by prerequisite leaves and requirement course sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRef {
    pub id: CourseId,
    pub subject: String,
    pub number: String,
    #[serde(default)]
    pub title: String,
    pub credits: u32,
}

impl CourseRef {
    pub fn new(
        id: CourseId,
        subject: impl Into<String>,
        number: impl Into<String>,
        credits: u32,
    ) -> Self {
        Self {
            id,
            subject: subject.into(),
            number: number.into(),
            title: String::new(),
            credits,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Human readable course code, e.g. `MATH 221`.
    pub fn code(&self) -> String {
        format!("{} {}", self.subject, self.number)
    }
}

/// Degree program a student can declare.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Major {
    pub key: MajorKey,
    pub name: String,
    pub total_credits_required: u32,
}

/// How a requirement decides that it has been fulfilled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RequirementMode {
    /// Enough credits drawn from the listed courses.
    CreditThreshold { min_credits: u32 },
    /// Every listed course.
    Enumeration,
}

/// Named rule within a major, fulfilled by a set of qualifying courses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub id: RequirementId,
    pub major: MajorKey,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_credits: Option<u32>,
    #[serde(default)]
    pub courses: Vec<CourseRef>,
}

impl Requirement {
    pub fn new(id: RequirementId, major: MajorKey, name: impl Into<String>) -> Self {
        Self {
            id,
            major,
            name: name.into(),
            description: None,
            min_credits: None,
            courses: Vec::new(),
        }
    }

    pub fn with_min_credits(mut self, min_credits: u32) -> Self {
        self.min_credits = Some(min_credits);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a qualifying course; a course already listed is ignored.
    pub fn with_course(mut self, course: CourseRef) -> Self {
        if !self.courses.iter().any(|existing| existing.id == course.id) {
            self.courses.push(course);
        }
        self
    }

    pub fn with_courses(self, courses: impl IntoIterator<Item = CourseRef>) -> Self {
        courses
            .into_iter()
            .fold(self, |requirement, course| requirement.with_course(course))
    }

    pub fn mode(&self) -> RequirementMode {
        match self.min_credits {
            Some(min_credits) => RequirementMode::CreditThreshold { min_credits },
            None => RequirementMode::Enumeration,
        }
    }
}

/// A major declared by a student, as recorded by the student directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredMajor {
    pub major: MajorKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_on: Option<NaiveDate>,
    #[serde(default)]
    pub primary: bool,
}

impl DeclaredMajor {
    pub fn new(major: MajorKey) -> Self {
        Self {
            major,
            declared_on: None,
            primary: false,
        }
    }
}

/// Completion state of a single requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequirementStatus {
    NotStarted,
    InProgress,
    Complete,
}

impl RequirementStatus {
    pub const fn label(self) -> &'static str {
        match self {
            RequirementStatus::NotStarted => "not_started",
            RequirementStatus::InProgress => "in_progress",
            RequirementStatus::Complete => "complete",
        }
    }
}

/// Lifecycle of a single enrollment as tracked by the enrollment collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    InProgress,
    Completed,
    Dropped,
}

impl EnrollmentStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "in_progress" | "enrolled" => Some(Self::InProgress),
            "completed" | "complete" | "passed" => Some(Self::Completed),
            "dropped" | "withdrawn" => Some(Self::Dropped),
            _ => None,
        }
    }
}
