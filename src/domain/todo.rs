use std::fmt;

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Opaque record identifier. Issued by the storage adapter on insert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct TodoId(pub String);

impl TodoId {
    pub fn generate() -> Self { Self(Uuid::new_v4().to_string()) }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<String> for TodoId {
    fn from(value: String) -> Self { Self(value) }
}

impl From<&str> for TodoId {
    fn from(value: &str) -> Self { Self(value.to_owned()) }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoId,
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    /// Conventionally `LOW`, `MEDIUM` or `HIGH`; not validated.
    pub priority: Option<String>,
}

impl Todo {
    /// Refreshes `updated_at` without ever moving it backwards.
    pub fn touch(&mut self, now: NaiveDateTime) {
        self.updated_at = now.max(self.updated_at);
    }
}

/// A record that has not been persisted yet and therefore has no id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: bool,
    pub priority: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl NewTodo {
    pub fn with_id(self, id: TodoId) -> Todo {
        Todo {
            id,
            title: self.title,
            description: self.description,
            completed: self.completed,
            created_at: self.created_at,
            updated_at: self.updated_at,
            priority: self.priority,
        }
    }
}

/// Create payload. `completed` is accepted on the wire but ignored on creation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoInput {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_false")]
    pub completed: bool,
    pub priority: Option<String>,
}

/// Update payload. Absent text fields keep the stored value; `completed` is
/// always applied and defaults to `false` when missing or null.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_false")]
    pub completed: bool,
    pub priority: Option<String>,
}

impl TodoPatch {
    pub fn apply(self, todo: &mut Todo) {
        if let Some(t) = self.title { todo.title = Some(t); }
        if let Some(d) = self.description { todo.description = Some(d); }
        if let Some(p) = self.priority { todo.priority = Some(p); }
        todo.completed = self.completed;
    }
}

fn null_as_false<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// Current local wall-clock time, the timezone-less form the API exposes.
pub fn now() -> NaiveDateTime { Local::now().naive_local() }
