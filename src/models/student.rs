use crate::errors::{AppError, AppResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static STUDENT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{5}$").expect("student id pattern is valid"));

/// Five-digit student number (grade, class, seat).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StudentId(String);

impl StudentId {
    pub fn parse(raw: &str) -> AppResult<Self> {
        let trimmed = raw.trim();
        if STUDENT_ID_RE.is_match(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(AppError::InvalidStudentId(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for StudentId {
    type Error = AppError;

    fn try_from(value: String) -> AppResult<Self> {
        Self::parse(&value)
    }
}

impl From<StudentId> for String {
    fn from(id: StudentId) -> Self {
        id.0
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub student_id: StudentId,
    pub student_name: String,
}

/// Where a roster answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RosterSource {
    Remote,
    /// Remote skipped or returned nothing usable; cached copy served.
    Cache,
    /// Remote failed with an error; cached copy served.
    CacheFallback,
}

#[derive(Debug, Clone, Serialize)]
pub struct Roster {
    pub students: Vec<Student>,
    pub source: RosterSource,
}

impl Roster {
    pub fn find(&self, id: &StudentId) -> Option<&Student> {
        self.students.iter().find(|s| &s.student_id == id)
    }
}
