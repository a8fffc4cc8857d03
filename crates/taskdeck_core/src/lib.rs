//! Core domain logic for taskdeck.
//! This crate is the single source of truth for ordering invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::project::{Project, ProjectDraft, ProjectId, ProjectKind, UserId};
pub use model::task::{Task, TaskDraft, TaskId, TaskPatch};
pub use repo::ordered::{
    InsertionPoint, OrderError, OrderResult, OrderedCollection, OrderedRecord,
};
pub use repo::project_repo::{ProjectRepository, SqliteProjectRepository};
pub use repo::task_repo::{SqliteTaskRepository, TaskRepository};
pub use service::project_service::{ProjectService, ProjectServiceError};
pub use service::task_service::{TaskService, TaskServiceError};
pub use service::Placement;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
