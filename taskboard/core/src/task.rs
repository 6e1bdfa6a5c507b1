//! Task domain model shared by the board, the engine and the HTTP client.
//!
//! A [`TaskRecord`] is what the backend stores and what the board renders. A
//! [`TaskPatch`] is a field-level change applied to an existing record, and a
//! [`TaskDraft`] is the payload used to create a new one.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Stable identifier of a task.
///
/// The backend may hand out either numeric or textual ids. Whatever shape it
/// used is kept so the id is sent back exactly as it was received.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskId {
    Number(u64),
    Text(String),
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskId::Number(id) => write!(f, "{}", id),
            TaskId::Text(id) => write!(f, "{}", id),
        }
    }
}

impl From<u64> for TaskId {
    fn from(id: u64) -> Self {
        TaskId::Number(id)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        TaskId::Text(id.to_string())
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        TaskId::Text(id)
    }
}

/// The kanban column a task belongs to.
///
/// Values the board does not know about are kept verbatim in
/// [`Status::Unrecognized`] so they can be surfaced instead of disappearing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    #[default]
    ToDo,
    InProgress,
    NeedReview,
    Done,
    Unrecognized(String),
}

impl Status {
    /// The board's columns, in display order.
    pub fn columns() -> Vec<Status> {
        vec![
            Status::ToDo,
            Status::InProgress,
            Status::NeedReview,
            Status::Done,
        ]
    }

    /// Parses a wire value. Both the canonical values (`to-do`) and the labels
    /// the task form uses (`To Do`) are accepted.
    pub fn parse(raw: &str) -> Status {
        match raw.trim() {
            "to-do" | "To Do" => Status::ToDo,
            "in-progress" | "In Progress" => Status::InProgress,
            "need-review" | "Need Review" => Status::NeedReview,
            "done" | "Done" => Status::Done,
            _ => Status::Unrecognized(raw.to_string()),
        }
    }

    /// Canonical wire value.
    pub fn as_str(&self) -> &str {
        match self {
            Status::ToDo => "to-do",
            Status::InProgress => "in-progress",
            Status::NeedReview => "need-review",
            Status::Done => "done",
            Status::Unrecognized(raw) => raw,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Status::Unrecognized(_))
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Status {
    fn from(raw: String) -> Self {
        Status::parse(&raw)
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        status.as_str().to_string()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

/// User details the backend expands from `assignedTo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignedUser {
    pub id: u64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// A task as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub assigned_to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_user: Option<AssignedUser>,
    #[serde(default, with = "due_date")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: Priority,
    pub status: Status,
    #[serde(default)]
    pub comments: String,
}

impl TaskRecord {
    /// Creates a record with the given id, title and status and defaults for everything else.
    pub fn new(id: impl Into<TaskId>, title: impl Into<String>, status: Status) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            assigned_to: String::new(),
            assigned_user: None,
            due_date: None,
            priority: Priority::default(),
            status,
            comments: String::new(),
        }
    }
}

/// A field-level change to an existing task. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "due_date::serialize"
    )]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

impl TaskPatch {
    /// A patch that only moves the task to another column.
    pub fn status(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_assigned_to(mut self, assigned_to: impl Into<String>) -> Self {
        self.assigned_to = Some(assigned_to.into());
        self
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_comments(mut self, comments: impl Into<String>) -> Self {
        self.comments = Some(comments.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == TaskPatch::default()
    }

    /// Writes every present field onto `record`.
    pub fn apply_to(&self, record: &mut TaskRecord) {
        if let Some(title) = &self.title {
            record.title = title.clone();
        }
        if let Some(description) = &self.description {
            record.description = description.clone();
        }
        if let Some(assigned_to) = &self.assigned_to {
            record.assigned_to = assigned_to.clone();
        }
        if let Some(due_date) = self.due_date {
            record.due_date = Some(due_date);
        }
        if let Some(priority) = self.priority {
            record.priority = priority;
        }
        if let Some(status) = &self.status {
            record.status = status.clone();
        }
        if let Some(comments) = &self.comments {
            record.comments = comments.clone();
        }
    }

    /// Returns true when applying the patch would not change `record`.
    pub fn is_noop_for(&self, record: &TaskRecord) -> bool {
        let mut patched = record.clone();
        self.apply_to(&mut patched);
        patched == *record
    }
}

/// Errors raised when a draft is missing a field the task form requires.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    #[error("Task title is required")]
    MissingTitle,
    #[error("Task must be assigned to someone")]
    MissingAssignee,
    #[error("Task due date is required")]
    MissingDueDate,
}

/// Payload for creating a task. The backend assigns the id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub assigned_to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
    #[serde(serialize_with = "due_date::serialize")]
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub status: Status,
    pub comments: String,
}

impl TaskDraft {
    pub fn validate(&self) -> Result<(), DraftError> {
        if self.title.trim().is_empty() {
            return Err(DraftError::MissingTitle);
        }
        if self.assigned_to.trim().is_empty() {
            return Err(DraftError::MissingAssignee);
        }
        if self.due_date.is_none() {
            return Err(DraftError::MissingDueDate);
        }
        Ok(())
    }
}

/// `YYYY-MM-DD` dates. Empty strings and nulls mean "no date"; a trailing time
/// component from the backend is ignored.
mod due_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(date) => serializer.serialize_str(&date.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        let date_part = raw.trim().split('T').next().unwrap_or_default();
        if date_part.is_empty() {
            return Ok(None);
        }
        NaiveDate::parse_from_str(date_part, FORMAT)
            .map(Some)
            .map_err(serde::de::Error::custom)
    }
}
