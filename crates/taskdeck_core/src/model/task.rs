//! Task domain model.
//!
//! # Invariants
//! - `uuid` is stable and never reused for another task.
//! - `position` defines total order within one project and is owned by the
//!   ordering engine.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a task.
pub type TaskId = Uuid;

/// Persisted task row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Stable global ID.
    pub uuid: TaskId,
    /// Owning project (ordering scope). Immutable after creation.
    pub project_uuid: Uuid,
    /// Task text.
    pub content: String,
    /// Completion flag; does not affect ordering.
    pub is_completed: bool,
    /// Optional free-text explanation attached to the task.
    pub detail: Option<String>,
    /// Order key within the project; unique per project.
    pub position: i64,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

/// Creation input for a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub uuid: TaskId,
    pub content: String,
    pub detail: Option<String>,
}

impl TaskDraft {
    /// Creates a task draft with a generated stable ID.
    pub fn new(content: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), content)
    }

    /// Creates a task draft with a caller-provided stable ID.
    pub fn with_id(uuid: TaskId, content: impl Into<String>) -> Self {
        Self {
            uuid,
            content: content.into(),
            detail: None,
        }
    }
}

/// Partial update for task payload fields.
///
/// `None` fields are left untouched. Position is deliberately absent; order
/// changes go through the ordering engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub content: Option<String>,
    pub is_completed: Option<bool>,
    pub detail: Option<String>,
}

impl TaskPatch {
    /// Returns whether the patch carries no field changes.
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.is_completed.is_none() && self.detail.is_none()
    }
}
