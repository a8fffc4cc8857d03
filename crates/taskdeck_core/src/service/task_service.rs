//! Task use-case service.
//!
//! # Responsibility
//! - Validate task input above the repository layer.
//! - Resolve placement requests through the ordering engine.
//!
//! # Invariants
//! - Blank content is rejected before any persistence call.
//! - Empty patches are rejected instead of producing no-op SQL.

use crate::model::project::UserId;
use crate::model::task::{Task, TaskDraft, TaskId, TaskPatch};
use crate::repo::ordered::{InsertionPoint, OrderError};
use crate::repo::task_repo::TaskRepository;
use crate::service::Placement;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Errors from task service operations.
#[derive(Debug)]
pub enum TaskServiceError {
    /// Content is blank after trim.
    InvalidContent,
    /// Patch carries no field changes.
    EmptyPatch,
    /// Target task does not exist.
    TaskNotFound(TaskId),
    /// Reorder id list does not match the project's tasks.
    ReorderMismatch { project_uuid: Uuid },
    /// Repository-level failure.
    Repo(OrderError),
}

impl Display for TaskServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidContent => write!(f, "task content must not be blank"),
            Self::EmptyPatch => write!(f, "task patch must change at least one field"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::ReorderMismatch { project_uuid } => {
                write!(
                    f,
                    "reorder id list does not match tasks of project {project_uuid}"
                )
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TaskServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<OrderError> for TaskServiceError {
    fn from(value: OrderError) -> Self {
        match value {
            OrderError::NotFound(id) => Self::TaskNotFound(id),
            OrderError::ReorderMismatch { scope } => Self::ReorderMismatch {
                project_uuid: scope,
            },
            other => Self::Repo(other),
        }
    }
}

/// Task use-case facade.
pub struct TaskService<R: TaskRepository> {
    repo: R,
}

impl<R: TaskRepository> TaskService<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a task in one project at the requested placement.
    pub fn create_task(
        &self,
        project_uuid: Uuid,
        content: impl Into<String>,
        placement: Placement,
    ) -> Result<Task, TaskServiceError> {
        let content = normalize_content(content.into())?;
        let draft = TaskDraft::new(content);

        let point = match placement {
            Placement::End => InsertionPoint::End,
            Placement::At(position) => InsertionPoint::At(position.max(0)),
            Placement::After(after) => self.repo.insertion_position(project_uuid, Some(after))?,
        };
        let created = match point {
            InsertionPoint::End => self.repo.create_at_end(project_uuid, &draft)?,
            InsertionPoint::At(position) => {
                self.repo.create_at_position(project_uuid, &draft, position)?
            }
        };
        Ok(created)
    }

    /// Lists one project's tasks in display order.
    pub fn list_tasks(&self, project_uuid: Uuid) -> Result<Vec<Task>, TaskServiceError> {
        self.repo.list_for_project(project_uuid).map_err(Into::into)
    }

    /// Lists all tasks of one user across projects, in display order.
    pub fn list_user_tasks(&self, user_uuid: UserId) -> Result<Vec<Task>, TaskServiceError> {
        self.repo.list_for_user(user_uuid).map_err(Into::into)
    }

    /// Loads one task by id.
    pub fn get_task(&self, task_uuid: TaskId) -> Result<Option<Task>, TaskServiceError> {
        self.repo.get_task(task_uuid).map_err(Into::into)
    }

    /// Applies a partial payload update to one task.
    pub fn update_task(
        &self,
        task_uuid: TaskId,
        patch: &TaskPatch,
    ) -> Result<Task, TaskServiceError> {
        if patch.is_empty() {
            return Err(TaskServiceError::EmptyPatch);
        }
        if let Some(content) = &patch.content {
            if content.trim().is_empty() {
                return Err(TaskServiceError::InvalidContent);
            }
        }
        self.repo.update_task(task_uuid, patch).map_err(Into::into)
    }

    /// Sets the completion flag of one task.
    pub fn set_completion(
        &self,
        task_uuid: TaskId,
        is_completed: bool,
    ) -> Result<Task, TaskServiceError> {
        self.repo
            .set_completion(task_uuid, is_completed)
            .map_err(Into::into)
    }

    /// Flips the completion flag of one task.
    pub fn toggle_completion(&self, task_uuid: TaskId) -> Result<Task, TaskServiceError> {
        self.repo.toggle_completion(task_uuid).map_err(Into::into)
    }

    /// Applies a complete explicit ordering of the project's tasks.
    pub fn reorder_tasks(
        &self,
        project_uuid: Uuid,
        ordered_ids: &[TaskId],
    ) -> Result<(), TaskServiceError> {
        self.repo
            .reorder(project_uuid, ordered_ids)
            .map_err(Into::into)
    }

    /// Deletes one task; survivors keep their positions.
    pub fn delete_task(&self, task_uuid: TaskId) -> Result<(), TaskServiceError> {
        self.repo.delete(task_uuid).map_err(Into::into)
    }

    /// Counts one project's tasks.
    pub fn count_tasks(&self, project_uuid: Uuid) -> Result<i64, TaskServiceError> {
        self.repo.count_for_project(project_uuid).map_err(Into::into)
    }

    /// Returns task content in display order, capped by `limit`.
    ///
    /// Used to assemble history context for goal-decomposition callers.
    pub fn recent_content(
        &self,
        project_uuid: Uuid,
        limit: u32,
    ) -> Result<Vec<String>, TaskServiceError> {
        self.repo
            .recent_content(project_uuid, limit)
            .map_err(Into::into)
    }
}

fn normalize_content(value: String) -> Result<String, TaskServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TaskServiceError::InvalidContent);
    }
    Ok(trimmed.to_string())
}
