//! Dashboard menu sections and the content they load.

use std::fmt;

use serde_json::Value;

use crate::api::ApiReply;
use crate::models::User;

pub const PROFILE_UNAVAILABLE_MESSAGE: &str = "Unable to load profile";

/// Dashboard menu entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Section {
    #[default]
    Semesters,
    Classes,
    Subjects,
    Assignments,
    Submissions,
    Grades,
    Profile,
}

impl Section {
    pub const ALL: [Section; 7] = [
        Section::Semesters,
        Section::Classes,
        Section::Subjects,
        Section::Assignments,
        Section::Submissions,
        Section::Grades,
        Section::Profile,
    ];

    /// Backend path listing this section's records. The profile is served
    /// from the cached user and has none.
    pub fn endpoint(&self) -> Option<&'static str> {
        match self {
            Section::Semesters => Some("/api/semesters"),
            Section::Classes => Some("/api/classes"),
            Section::Subjects => Some("/api/subjects"),
            Section::Assignments => Some("/api/assignments"),
            Section::Submissions => Some("/api/submissions?status=pending"),
            Section::Grades => Some("/api/grades"),
            Section::Profile => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Section::Semesters => "semesters",
            Section::Classes => "classes",
            Section::Subjects => "subjects",
            Section::Assignments => "assignments",
            Section::Submissions => "submissions",
            Section::Grades => "grades",
            Section::Profile => "profile",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Section::Semesters => "Semesters",
            Section::Classes => "Classes",
            Section::Subjects => "Subjects",
            Section::Assignments => "Assignments",
            Section::Submissions => "Pending Submissions",
            Section::Grades => "Grades",
            Section::Profile => "Profile",
        }
    }

    /// Parse a section name, also accepting menu ids like `nav-grades`
    pub fn from_name(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        let s = s.strip_prefix("nav-").unwrap_or(&s);
        Section::ALL.into_iter().find(|section| section.name() == s)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// What a section shows once loaded.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionContent {
    Rows(Vec<Value>),
    Profile(User),
    Error(String),
}

impl SectionContent {
    /// Read a list reply. An `error` field wins; a single object becomes a
    /// one-row table.
    pub fn from_reply(reply: ApiReply) -> Self {
        if let Some(message) = reply.error() {
            return SectionContent::Error(message);
        }
        match reply.into_body() {
            Value::Array(rows) => SectionContent::Rows(rows),
            Value::Null => SectionContent::Rows(Vec::new()),
            other => SectionContent::Rows(vec![other]),
        }
    }

    pub fn from_user(user: Option<User>) -> Self {
        match user {
            Some(user) => SectionContent::Profile(user),
            None => SectionContent::Error(PROFILE_UNAVAILABLE_MESSAGE.to_string()),
        }
    }
}
