//! Project use-case service.
//!
//! # Responsibility
//! - Validate project input above the repository layer.
//! - Resolve placement requests through the ordering engine.
//!
//! # Invariants
//! - Service APIs never write `position` outside repository operations.
//! - Blank names are rejected before any persistence call.

use crate::model::project::{Project, ProjectDraft, ProjectId, UserId};
use crate::repo::ordered::{InsertionPoint, OrderError};
use crate::repo::project_repo::ProjectRepository;
use crate::service::Placement;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from project service operations.
#[derive(Debug)]
pub enum ProjectServiceError {
    /// Name is blank after trim.
    InvalidName,
    /// Target project does not exist.
    ProjectNotFound(ProjectId),
    /// Reorder id list does not match the user's projects.
    ReorderMismatch { user_uuid: UserId },
    /// Repository-level failure.
    Repo(OrderError),
}

impl Display for ProjectServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName => write!(f, "project name must not be blank"),
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
            Self::ReorderMismatch { user_uuid } => {
                write!(f, "reorder id list does not match projects of user {user_uuid}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ProjectServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<OrderError> for ProjectServiceError {
    fn from(value: OrderError) -> Self {
        match value {
            OrderError::NotFound(id) => Self::ProjectNotFound(id),
            OrderError::ReorderMismatch { scope } => Self::ReorderMismatch { user_uuid: scope },
            other => Self::Repo(other),
        }
    }
}

/// Project use-case facade.
pub struct ProjectService<R: ProjectRepository> {
    repo: R,
}

impl<R: ProjectRepository> ProjectService<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a plain project for one user.
    pub fn create_project(
        &self,
        user_uuid: UserId,
        name: impl Into<String>,
        placement: Placement,
    ) -> Result<Project, ProjectServiceError> {
        let name = normalize_name(name.into())?;
        let draft = ProjectDraft::new(name);
        self.place(user_uuid, &draft, placement)
    }

    /// Creates a goal project with a description.
    pub fn create_goal(
        &self,
        user_uuid: UserId,
        name: impl Into<String>,
        description: impl Into<String>,
        placement: Placement,
    ) -> Result<Project, ProjectServiceError> {
        let name = normalize_name(name.into())?;
        let draft = ProjectDraft::goal(name, description.into());
        self.place(user_uuid, &draft, placement)
    }

    /// Lists one user's projects in display order.
    pub fn list_projects(&self, user_uuid: UserId) -> Result<Vec<Project>, ProjectServiceError> {
        self.repo.list_for_user(user_uuid).map_err(Into::into)
    }

    /// Loads one project by id.
    pub fn get_project(
        &self,
        project_uuid: ProjectId,
    ) -> Result<Option<Project>, ProjectServiceError> {
        self.repo.get_project(project_uuid).map_err(Into::into)
    }

    /// Renames one project.
    pub fn rename_project(
        &self,
        project_uuid: ProjectId,
        name: impl Into<String>,
    ) -> Result<Project, ProjectServiceError> {
        let name = normalize_name(name.into())?;
        self.repo
            .rename(project_uuid, name.as_str())
            .map_err(Into::into)
    }

    /// Replaces or clears the goal description of one project.
    pub fn update_goal_description(
        &self,
        project_uuid: ProjectId,
        description: Option<String>,
    ) -> Result<Project, ProjectServiceError> {
        self.repo
            .update_goal_description(project_uuid, description.as_deref())
            .map_err(Into::into)
    }

    /// Applies a complete explicit ordering of the user's projects.
    pub fn reorder_projects(
        &self,
        user_uuid: UserId,
        ordered_ids: &[ProjectId],
    ) -> Result<(), ProjectServiceError> {
        self.repo
            .reorder(user_uuid, ordered_ids)
            .map_err(Into::into)
    }

    /// Deletes one project and, via schema cascade, its tasks.
    pub fn delete_project(&self, project_uuid: ProjectId) -> Result<(), ProjectServiceError> {
        self.repo.delete(project_uuid).map_err(Into::into)
    }

    /// Counts one user's projects.
    pub fn count_projects(&self, user_uuid: UserId) -> Result<i64, ProjectServiceError> {
        self.repo.count_for_user(user_uuid).map_err(Into::into)
    }

    fn place(
        &self,
        user_uuid: UserId,
        draft: &ProjectDraft,
        placement: Placement,
    ) -> Result<Project, ProjectServiceError> {
        let point = resolve_placement(&self.repo, user_uuid, placement)?;
        let created = match point {
            InsertionPoint::End => self.repo.create_at_end(user_uuid, draft)?,
            InsertionPoint::At(position) => {
                self.repo.create_at_position(user_uuid, draft, position)?
            }
        };
        Ok(created)
    }
}

fn resolve_placement<R: ProjectRepository>(
    repo: &R,
    user_uuid: UserId,
    placement: Placement,
) -> Result<InsertionPoint, ProjectServiceError> {
    match placement {
        Placement::End => Ok(InsertionPoint::End),
        Placement::At(position) => Ok(InsertionPoint::At(position.max(0))),
        Placement::After(after) => repo
            .insertion_position(user_uuid, Some(after))
            .map_err(Into::into),
    }
}

fn normalize_name(value: String) -> Result<String, ProjectServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ProjectServiceError::InvalidName);
    }
    Ok(trimmed.to_string())
}
