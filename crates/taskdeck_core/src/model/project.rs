//! Project domain model.
//!
//! # Invariants
//! - `uuid` is stable and never reused for another project.
//! - `position` defines total order among one user's projects and is owned
//!   by the ordering engine.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a project.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type ProjectId = Uuid;

/// Stable identifier for the user owning a set of projects.
///
/// The core has no user table; the id is an opaque scope key supplied by the
/// auth layer.
pub type UserId = Uuid;

/// Project flavor.
///
/// A `Goal` carries a free-text description that downstream tooling can
/// decompose into steps; a plain `Project` does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectKind {
    /// Plain ordered task container.
    Project,
    /// Outcome-oriented container with a description.
    Goal,
}

/// Persisted project row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Stable global ID used for linking and auditing.
    pub uuid: ProjectId,
    /// Owning user (ordering scope). Immutable after creation.
    pub user_uuid: UserId,
    /// User-facing label.
    pub name: String,
    /// Serialized as `type` to match external schema naming.
    #[serde(rename = "type")]
    pub kind: ProjectKind,
    /// Meaningful only when `kind == ProjectKind::Goal`.
    pub goal_description: Option<String>,
    /// Order key among this user's projects; unique per user.
    pub position: i64,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

/// Creation input for a project.
///
/// Scope, position, and timestamps are assigned at persistence time; the
/// draft carries only identity and payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDraft {
    pub uuid: ProjectId,
    pub name: String,
    pub kind: ProjectKind,
    pub goal_description: Option<String>,
}

impl ProjectDraft {
    /// Creates a plain project draft with a generated stable ID.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), name)
    }

    /// Creates a project draft with a caller-provided stable ID.
    ///
    /// Used by import paths where identity already exists externally.
    pub fn with_id(uuid: ProjectId, name: impl Into<String>) -> Self {
        Self {
            uuid,
            name: name.into(),
            kind: ProjectKind::Project,
            goal_description: None,
        }
    }

    /// Creates a goal draft with a generated stable ID.
    pub fn goal(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            kind: ProjectKind::Goal,
            goal_description: Some(description.into()),
        }
    }
}
