//! Project repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Instantiate the ordered-collection engine over `projects`.
//! - Provide payload CRUD (name, goal description) outside the engine.
//!
//! # Invariants
//! - `position` is only written through the ordering engine.
//! - Deleting a project cascades to its tasks via schema foreign key.

use crate::model::project::{Project, ProjectDraft, ProjectId, ProjectKind, UserId};
use crate::repo::ordered::{
    parse_uuid, InsertionPoint, OrderError, OrderResult, OrderedCollection, OrderedRecord,
};
use rusqlite::types::Value;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

impl OrderedRecord for Project {
    type Draft = ProjectDraft;

    const TABLE: &'static str = "projects";
    const SCOPE_COLUMN: &'static str = "user_uuid";
    const PAYLOAD_COLUMNS: &'static [&'static str] = &["name", "kind", "goal_description"];
    const SELECT_COLUMNS: &'static str =
        "uuid, user_uuid, name, kind, goal_description, position, created_at, updated_at";

    fn draft_id(draft: &ProjectDraft) -> Uuid {
        draft.uuid
    }

    fn draft_values(draft: &ProjectDraft) -> Vec<Value> {
        vec![
            Value::Text(draft.name.clone()),
            Value::Text(project_kind_to_db(draft.kind).to_string()),
            draft
                .goal_description
                .clone()
                .map_or(Value::Null, Value::Text),
        ]
    }

    fn parse_row(row: &Row<'_>) -> OrderResult<Project> {
        let uuid_text: String = row.get("uuid")?;
        let user_text: String = row.get("user_uuid")?;
        let kind_text: String = row.get("kind")?;
        let kind = parse_project_kind(&kind_text).ok_or_else(|| {
            OrderError::InvalidData(format!(
                "invalid project kind `{kind_text}` in projects.kind"
            ))
        })?;

        Ok(Project {
            uuid: parse_uuid(&uuid_text, "projects.uuid")?,
            user_uuid: parse_uuid(&user_text, "projects.user_uuid")?,
            name: row.get("name")?,
            kind,
            goal_description: row.get("goal_description")?,
            position: row.get("position")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Repository interface for project operations.
pub trait ProjectRepository {
    /// Lists one user's projects by ascending position.
    fn list_for_user(&self, user_uuid: UserId) -> OrderResult<Vec<Project>>;
    /// Loads one project by id.
    fn get_project(&self, project_uuid: ProjectId) -> OrderResult<Option<Project>>;
    /// Creates a project after the user's current last one.
    fn create_at_end(&self, user_uuid: UserId, draft: &ProjectDraft) -> OrderResult<Project>;
    /// Creates a project at an explicit position, shifting later siblings.
    fn create_at_position(
        &self,
        user_uuid: UserId,
        draft: &ProjectDraft,
        target_position: i64,
    ) -> OrderResult<Project>;
    /// Applies a complete explicit ordering of the user's projects.
    fn reorder(&self, user_uuid: UserId, ordered_ids: &[ProjectId]) -> OrderResult<()>;
    /// Resolves an insert-after request to an insertion point.
    fn insertion_position(
        &self,
        user_uuid: UserId,
        after: Option<ProjectId>,
    ) -> OrderResult<InsertionPoint>;
    /// Renames one project.
    fn rename(&self, project_uuid: ProjectId, name: &str) -> OrderResult<Project>;
    /// Replaces the goal description of one project.
    fn update_goal_description(
        &self,
        project_uuid: ProjectId,
        goal_description: Option<&str>,
    ) -> OrderResult<Project>;
    /// Deletes one project; tasks go with it via cascade.
    fn delete(&self, project_uuid: ProjectId) -> OrderResult<()>;
    /// Counts one user's projects.
    fn count_for_user(&self, user_uuid: UserId) -> OrderResult<i64>;
}

/// SQLite-backed project repository.
pub struct SqliteProjectRepository<'conn> {
    conn: &'conn Connection,
    ordering: OrderedCollection<'conn, Project>,
}

impl<'conn> SqliteProjectRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            ordering: OrderedCollection::new(conn),
        }
    }

    fn load_required(&self, project_uuid: ProjectId) -> OrderResult<Project> {
        self.ordering
            .get(project_uuid)?
            .ok_or(OrderError::NotFound(project_uuid))
    }
}

impl ProjectRepository for SqliteProjectRepository<'_> {
    fn list_for_user(&self, user_uuid: UserId) -> OrderResult<Vec<Project>> {
        self.ordering.list(user_uuid)
    }

    fn get_project(&self, project_uuid: ProjectId) -> OrderResult<Option<Project>> {
        self.ordering.get(project_uuid)
    }

    fn create_at_end(&self, user_uuid: UserId, draft: &ProjectDraft) -> OrderResult<Project> {
        self.ordering.append(user_uuid, draft)
    }

    fn create_at_position(
        &self,
        user_uuid: UserId,
        draft: &ProjectDraft,
        target_position: i64,
    ) -> OrderResult<Project> {
        self.ordering.insert_at(user_uuid, draft, target_position)
    }

    fn reorder(&self, user_uuid: UserId, ordered_ids: &[ProjectId]) -> OrderResult<()> {
        self.ordering.reorder(user_uuid, ordered_ids)
    }

    fn insertion_position(
        &self,
        user_uuid: UserId,
        after: Option<ProjectId>,
    ) -> OrderResult<InsertionPoint> {
        self.ordering.insertion_position(user_uuid, after)
    }

    fn rename(&self, project_uuid: ProjectId, name: &str) -> OrderResult<Project> {
        let changed = self.conn.execute(
            "UPDATE projects
             SET name = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![project_uuid.to_string(), name],
        )?;
        if changed == 0 {
            return Err(OrderError::NotFound(project_uuid));
        }
        self.load_required(project_uuid)
    }

    fn update_goal_description(
        &self,
        project_uuid: ProjectId,
        goal_description: Option<&str>,
    ) -> OrderResult<Project> {
        let changed = self.conn.execute(
            "UPDATE projects
             SET goal_description = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![project_uuid.to_string(), goal_description],
        )?;
        if changed == 0 {
            return Err(OrderError::NotFound(project_uuid));
        }
        self.load_required(project_uuid)
    }

    fn delete(&self, project_uuid: ProjectId) -> OrderResult<()> {
        self.ordering.delete(project_uuid)
    }

    fn count_for_user(&self, user_uuid: UserId) -> OrderResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM projects WHERE user_uuid = ?1;",
            [user_uuid.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

fn project_kind_to_db(kind: ProjectKind) -> &'static str {
    match kind {
        ProjectKind::Project => "project",
        ProjectKind::Goal => "goal",
    }
}

fn parse_project_kind(value: &str) -> Option<ProjectKind> {
    match value {
        "project" => Some(ProjectKind::Project),
        "goal" => Some(ProjectKind::Goal),
        _ => None,
    }
}
