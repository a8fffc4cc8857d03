use rusqlite::Connection;
use taskdeck_core::db::open_db_in_memory;
use taskdeck_core::{
    OrderError, Placement, ProjectService, SqliteProjectRepository, SqliteTaskRepository, Task,
    TaskDraft, TaskRepository, TaskService,
};
use uuid::Uuid;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn setup_project_with_tasks(conn: &Connection, count: usize) -> (Uuid, Vec<Task>) {
    let user = Uuid::new_v4();
    let project_service = ProjectService::new(SqliteProjectRepository::new(conn));
    let project = project_service
        .create_project(user, "Inbox", Placement::End)
        .unwrap();

    let task_service = TaskService::new(SqliteTaskRepository::new(conn));
    let tasks = (0..count)
        .map(|index| {
            task_service
                .create_task(project.uuid, format!("task {index}"), Placement::End)
                .unwrap()
        })
        .collect();
    (project.uuid, tasks)
}

fn snapshot(conn: &Connection, project_uuid: Uuid) -> Vec<(Uuid, i64)> {
    let repo = SqliteTaskRepository::new(conn);
    repo.list_for_project(project_uuid)
        .unwrap()
        .iter()
        .map(|task| (task.uuid, task.position))
        .collect()
}

#[test]
fn failed_insert_rolls_back_both_shift_phases() {
    let conn = setup();
    let (project_uuid, tasks) = setup_project_with_tasks(&conn, 4);
    let before = snapshot(&conn, project_uuid);

    // Reusing an existing task id makes the final insert fail on the primary
    // key, after both staging updates have already run.
    let repo = SqliteTaskRepository::new(&conn);
    let colliding = TaskDraft::with_id(tasks[3].uuid, "duplicate id");
    let err = repo
        .create_at_position(project_uuid, &colliding, 1)
        .unwrap_err();
    assert!(matches!(err, OrderError::Db(_)));

    let after = snapshot(&conn, project_uuid);
    assert_eq!(before, after);
}

#[test]
fn failed_insert_mid_scope_leaves_no_staged_negatives() {
    let conn = setup();
    let (project_uuid, tasks) = setup_project_with_tasks(&conn, 3);

    let repo = SqliteTaskRepository::new(&conn);
    let colliding = TaskDraft::with_id(tasks[0].uuid, "duplicate id");
    repo.create_at_position(project_uuid, &colliding, 0)
        .unwrap_err();

    let staged: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM tasks WHERE project_uuid = ?1 AND position < 0;",
            [project_uuid.to_string()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(staged, 0);
}

#[test]
fn duplicate_position_maps_to_invariant_violation() {
    let conn = setup();
    let (project_uuid, tasks) = setup_project_with_tasks(&conn, 2);

    // Bypass the engine to provoke the eager unique index directly.
    let raw_err = conn
        .execute(
            "UPDATE tasks SET position = 0 WHERE uuid = ?1;",
            [tasks[1].uuid.to_string()],
        )
        .unwrap_err();
    let mapped = OrderError::from(raw_err);
    assert!(matches!(mapped, OrderError::InvariantViolation(_)));

    // The rejected statement left the scope untouched.
    let positions = snapshot(&conn, project_uuid)
        .iter()
        .map(|(_, position)| *position)
        .collect::<Vec<_>>();
    assert_eq!(positions, vec![0, 1]);
}
