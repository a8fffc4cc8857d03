//! Task repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Instantiate the ordered-collection engine over `tasks`.
//! - Provide payload CRUD (content, completion, detail) outside the engine.
//!
//! # Invariants
//! - `position` is only written through the ordering engine.
//! - Cross-project listing orders by project position first, task position
//!   second.

use crate::model::project::UserId;
use crate::model::task::{Task, TaskDraft, TaskId, TaskPatch};
use crate::repo::ordered::{
    parse_bool, parse_uuid, InsertionPoint, OrderError, OrderResult, OrderedCollection,
    OrderedRecord,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use uuid::Uuid;

impl OrderedRecord for Task {
    type Draft = TaskDraft;

    const TABLE: &'static str = "tasks";
    const SCOPE_COLUMN: &'static str = "project_uuid";
    const PAYLOAD_COLUMNS: &'static [&'static str] = &["content", "detail"];
    const SELECT_COLUMNS: &'static str =
        "uuid, project_uuid, content, is_completed, detail, position, created_at, updated_at";

    fn draft_id(draft: &TaskDraft) -> Uuid {
        draft.uuid
    }

    fn draft_values(draft: &TaskDraft) -> Vec<Value> {
        vec![
            Value::Text(draft.content.clone()),
            draft.detail.clone().map_or(Value::Null, Value::Text),
        ]
    }

    fn parse_row(row: &Row<'_>) -> OrderResult<Task> {
        let uuid_text: String = row.get("uuid")?;
        let project_text: String = row.get("project_uuid")?;

        Ok(Task {
            uuid: parse_uuid(&uuid_text, "tasks.uuid")?,
            project_uuid: parse_uuid(&project_text, "tasks.project_uuid")?,
            content: row.get("content")?,
            is_completed: parse_bool(row.get("is_completed")?, "tasks.is_completed")?,
            detail: row.get("detail")?,
            position: row.get("position")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Repository interface for task operations.
pub trait TaskRepository {
    /// Lists one project's tasks by ascending position.
    fn list_for_project(&self, project_uuid: Uuid) -> OrderResult<Vec<Task>>;
    /// Lists all tasks of one user across projects, in display order.
    fn list_for_user(&self, user_uuid: UserId) -> OrderResult<Vec<Task>>;
    /// Loads one task by id.
    fn get_task(&self, task_uuid: TaskId) -> OrderResult<Option<Task>>;
    /// Creates a task after the project's current last one.
    fn create_at_end(&self, project_uuid: Uuid, draft: &TaskDraft) -> OrderResult<Task>;
    /// Creates a task at an explicit position, shifting later siblings.
    fn create_at_position(
        &self,
        project_uuid: Uuid,
        draft: &TaskDraft,
        target_position: i64,
    ) -> OrderResult<Task>;
    /// Applies a complete explicit ordering of the project's tasks.
    fn reorder(&self, project_uuid: Uuid, ordered_ids: &[TaskId]) -> OrderResult<()>;
    /// Resolves an insert-after request to an insertion point.
    fn insertion_position(
        &self,
        project_uuid: Uuid,
        after: Option<TaskId>,
    ) -> OrderResult<InsertionPoint>;
    /// Applies a partial payload update. An empty patch is a no-op read.
    fn update_task(&self, task_uuid: TaskId, patch: &TaskPatch) -> OrderResult<Task>;
    /// Sets the completion flag.
    fn set_completion(&self, task_uuid: TaskId, is_completed: bool) -> OrderResult<Task>;
    /// Flips the completion flag.
    fn toggle_completion(&self, task_uuid: TaskId) -> OrderResult<Task>;
    /// Deletes one task without renumbering survivors.
    fn delete(&self, task_uuid: TaskId) -> OrderResult<()>;
    /// Counts one project's tasks.
    fn count_for_project(&self, project_uuid: Uuid) -> OrderResult<i64>;
    /// Returns task content in display order, capped by `limit`.
    fn recent_content(&self, project_uuid: Uuid, limit: u32) -> OrderResult<Vec<String>>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
    ordering: OrderedCollection<'conn, Task>,
}

impl<'conn> SqliteTaskRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            ordering: OrderedCollection::new(conn),
        }
    }

    fn load_required(&self, task_uuid: TaskId) -> OrderResult<Task> {
        self.ordering
            .get(task_uuid)?
            .ok_or(OrderError::NotFound(task_uuid))
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn list_for_project(&self, project_uuid: Uuid) -> OrderResult<Vec<Task>> {
        self.ordering.list(project_uuid)
    }

    fn list_for_user(&self, user_uuid: UserId) -> OrderResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                t.uuid AS uuid,
                t.project_uuid AS project_uuid,
                t.content AS content,
                t.is_completed AS is_completed,
                t.detail AS detail,
                t.position AS position,
                t.created_at AS created_at,
                t.updated_at AS updated_at
             FROM tasks t
             INNER JOIN projects p ON p.uuid = t.project_uuid
             WHERE p.user_uuid = ?1
             ORDER BY p.position ASC, t.position ASC, t.uuid ASC;",
        )?;
        let mut rows = stmt.query([user_uuid.to_string()])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(Task::parse_row(row)?);
        }
        Ok(tasks)
    }

    fn get_task(&self, task_uuid: TaskId) -> OrderResult<Option<Task>> {
        self.ordering.get(task_uuid)
    }

    fn create_at_end(&self, project_uuid: Uuid, draft: &TaskDraft) -> OrderResult<Task> {
        self.ordering.append(project_uuid, draft)
    }

    fn create_at_position(
        &self,
        project_uuid: Uuid,
        draft: &TaskDraft,
        target_position: i64,
    ) -> OrderResult<Task> {
        self.ordering.insert_at(project_uuid, draft, target_position)
    }

    fn reorder(&self, project_uuid: Uuid, ordered_ids: &[TaskId]) -> OrderResult<()> {
        self.ordering.reorder(project_uuid, ordered_ids)
    }

    fn insertion_position(
        &self,
        project_uuid: Uuid,
        after: Option<TaskId>,
    ) -> OrderResult<InsertionPoint> {
        self.ordering.insertion_position(project_uuid, after)
    }

    fn update_task(&self, task_uuid: TaskId, patch: &TaskPatch) -> OrderResult<Task> {
        if patch.is_empty() {
            return self.load_required(task_uuid);
        }

        let mut assignments = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(content) = &patch.content {
            assignments.push(format!("content = ?{}", bind_values.len() + 2));
            bind_values.push(Value::Text(content.clone()));
        }
        if let Some(is_completed) = patch.is_completed {
            assignments.push(format!("is_completed = ?{}", bind_values.len() + 2));
            bind_values.push(Value::Integer(i64::from(is_completed)));
        }
        if let Some(detail) = &patch.detail {
            assignments.push(format!("detail = ?{}", bind_values.len() + 2));
            bind_values.push(Value::Text(detail.clone()));
        }
        assignments.push("updated_at = (strftime('%s', 'now') * 1000)".to_string());

        let sql = format!(
            "UPDATE tasks SET {assignments} WHERE uuid = ?1;",
            assignments = assignments.join(", "),
        );
        let mut values = vec![Value::Text(task_uuid.to_string())];
        values.extend(bind_values);

        let changed = self.conn.execute(&sql, params_from_iter(values))?;
        if changed == 0 {
            return Err(OrderError::NotFound(task_uuid));
        }
        self.load_required(task_uuid)
    }

    fn set_completion(&self, task_uuid: TaskId, is_completed: bool) -> OrderResult<Task> {
        let changed = self.conn.execute(
            "UPDATE tasks
             SET is_completed = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![task_uuid.to_string(), i64::from(is_completed)],
        )?;
        if changed == 0 {
            return Err(OrderError::NotFound(task_uuid));
        }
        self.load_required(task_uuid)
    }

    fn toggle_completion(&self, task_uuid: TaskId) -> OrderResult<Task> {
        let changed = self.conn.execute(
            "UPDATE tasks
             SET is_completed = 1 - is_completed,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            [task_uuid.to_string()],
        )?;
        if changed == 0 {
            return Err(OrderError::NotFound(task_uuid));
        }
        self.load_required(task_uuid)
    }

    fn delete(&self, task_uuid: TaskId) -> OrderResult<()> {
        self.ordering.delete(task_uuid)
    }

    fn count_for_project(&self, project_uuid: Uuid) -> OrderResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM tasks WHERE project_uuid = ?1;",
            [project_uuid.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn recent_content(&self, project_uuid: Uuid, limit: u32) -> OrderResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT content FROM tasks
             WHERE project_uuid = ?1
             ORDER BY position ASC
             LIMIT ?2;",
        )?;
        let mut rows = stmt.query(params![project_uuid.to_string(), i64::from(limit)])?;
        let mut contents = Vec::new();
        while let Some(row) = rows.next()? {
            contents.push(row.get(0)?);
        }
        Ok(contents)
    }
}
