use rusqlite::Connection;
use taskdeck_core::db::open_db_in_memory;
use taskdeck_core::{
    Placement, Project, ProjectService, SqliteProjectRepository, SqliteTaskRepository,
    TaskService, TaskServiceError,
};
use uuid::Uuid;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn make_project(conn: &Connection, user: Uuid, name: &str) -> Project {
    let service = ProjectService::new(SqliteProjectRepository::new(conn));
    service.create_project(user, name, Placement::End).unwrap()
}

#[test]
fn append_assigns_sequential_positions() {
    let conn = setup();
    let user = Uuid::new_v4();
    let project = make_project(&conn, user, "Inbox");
    let service = TaskService::new(SqliteTaskRepository::new(&conn));

    for index in 0..4i64 {
        let task = service
            .create_task(project.uuid, format!("task {index}"), Placement::End)
            .unwrap();
        assert_eq!(task.position, index);
    }

    let listed = service.list_tasks(project.uuid).unwrap();
    assert_eq!(
        listed.iter().map(|t| t.position).collect::<Vec<_>>(),
        vec![0, 1, 2, 3]
    );
}

#[test]
fn insert_at_shifts_later_tasks_preserving_order() {
    let conn = setup();
    let user = Uuid::new_v4();
    let project = make_project(&conn, user, "Inbox");
    let service = TaskService::new(SqliteTaskRepository::new(&conn));

    let mut existing = Vec::new();
    for index in 0..4 {
        existing.push(
            service
                .create_task(project.uuid, format!("task {index}"), Placement::End)
                .unwrap(),
        );
    }

    let inserted = service
        .create_task(project.uuid, "wedge", Placement::At(2))
        .unwrap();
    assert_eq!(inserted.position, 2);

    let listed = service.list_tasks(project.uuid).unwrap();
    assert_eq!(
        listed.iter().map(|t| t.uuid).collect::<Vec<_>>(),
        vec![
            existing[0].uuid,
            existing[1].uuid,
            inserted.uuid,
            existing[2].uuid,
            existing[3].uuid,
        ]
    );
    assert_eq!(
        listed.iter().map(|t| t.position).collect::<Vec<_>>(),
        vec![0, 1, 2, 3, 4]
    );
}

#[test]
fn insert_after_resolves_between_neighbors() {
    let conn = setup();
    let user = Uuid::new_v4();
    let project = make_project(&conn, user, "Inbox");
    let service = TaskService::new(SqliteTaskRepository::new(&conn));

    let first = service
        .create_task(project.uuid, "first", Placement::End)
        .unwrap();
    let second = service
        .create_task(project.uuid, "second", Placement::End)
        .unwrap();

    let between = service
        .create_task(project.uuid, "between", Placement::After(first.uuid))
        .unwrap();

    let listed = service.list_tasks(project.uuid).unwrap();
    assert_eq!(
        listed.iter().map(|t| t.uuid).collect::<Vec<_>>(),
        vec![first.uuid, between.uuid, second.uuid]
    );

    let tail = service
        .create_task(project.uuid, "tail", Placement::After(second.uuid))
        .unwrap();
    assert_eq!(tail.position, 3);
}

#[test]
fn reorder_applies_permutation_and_rejects_mismatch() {
    let conn = setup();
    let user = Uuid::new_v4();
    let project = make_project(&conn, user, "Inbox");
    let other_project = make_project(&conn, user, "Elsewhere");
    let service = TaskService::new(SqliteTaskRepository::new(&conn));

    let a = service
        .create_task(project.uuid, "a", Placement::End)
        .unwrap();
    let b = service
        .create_task(project.uuid, "b", Placement::End)
        .unwrap();
    let foreign = service
        .create_task(other_project.uuid, "foreign", Placement::End)
        .unwrap();

    service.reorder_tasks(project.uuid, &[b.uuid, a.uuid]).unwrap();
    let listed = service.list_tasks(project.uuid).unwrap();
    assert_eq!(
        listed.iter().map(|t| t.uuid).collect::<Vec<_>>(),
        vec![b.uuid, a.uuid]
    );

    // Task from another project cannot smuggle into this ordering.
    let err = service
        .reorder_tasks(project.uuid, &[a.uuid, foreign.uuid])
        .unwrap_err();
    assert!(matches!(
        err,
        TaskServiceError::ReorderMismatch { project_uuid } if project_uuid == project.uuid
    ));

    let unchanged = service.list_tasks(project.uuid).unwrap();
    assert_eq!(
        unchanged.iter().map(|t| t.uuid).collect::<Vec<_>>(),
        vec![b.uuid, a.uuid]
    );
}

#[test]
fn delete_keeps_gap_and_relative_order() {
    let conn = setup();
    let user = Uuid::new_v4();
    let project = make_project(&conn, user, "Inbox");
    let service = TaskService::new(SqliteTaskRepository::new(&conn));

    let a = service
        .create_task(project.uuid, "a", Placement::End)
        .unwrap();
    let b = service
        .create_task(project.uuid, "b", Placement::End)
        .unwrap();
    let c = service
        .create_task(project.uuid, "c", Placement::End)
        .unwrap();

    service.delete_task(b.uuid).unwrap();

    let listed = service.list_tasks(project.uuid).unwrap();
    assert_eq!(
        listed.iter().map(|t| t.uuid).collect::<Vec<_>>(),
        vec![a.uuid, c.uuid]
    );
    assert_eq!(
        listed.iter().map(|t| t.position).collect::<Vec<_>>(),
        vec![0, 2]
    );
}

#[test]
fn projects_have_independent_task_scopes() {
    let conn = setup();
    let user = Uuid::new_v4();
    let project_a = make_project(&conn, user, "A");
    let project_b = make_project(&conn, user, "B");
    let service = TaskService::new(SqliteTaskRepository::new(&conn));

    let a0 = service
        .create_task(project_a.uuid, "a0", Placement::End)
        .unwrap();
    let b0 = service
        .create_task(project_b.uuid, "b0", Placement::End)
        .unwrap();
    assert_eq!(a0.position, 0);
    assert_eq!(b0.position, 0);

    service
        .create_task(project_a.uuid, "a-head", Placement::At(0))
        .unwrap();

    let b_listed = service.list_tasks(project_b.uuid).unwrap();
    assert_eq!(b_listed.len(), 1);
    assert_eq!(b_listed[0].position, 0);
}

#[test]
fn user_wide_listing_orders_by_project_then_task_position() {
    let conn = setup();
    let user = Uuid::new_v4();
    let project_service = ProjectService::new(SqliteProjectRepository::new(&conn));
    let first_project = make_project(&conn, user, "First");
    let second_project = make_project(&conn, user, "Second");
    let service = TaskService::new(SqliteTaskRepository::new(&conn));

    let f0 = service
        .create_task(first_project.uuid, "f0", Placement::End)
        .unwrap();
    let f1 = service
        .create_task(first_project.uuid, "f1", Placement::End)
        .unwrap();
    let s0 = service
        .create_task(second_project.uuid, "s0", Placement::End)
        .unwrap();

    let all = service.list_user_tasks(user).unwrap();
    assert_eq!(
        all.iter().map(|t| t.uuid).collect::<Vec<_>>(),
        vec![f0.uuid, f1.uuid, s0.uuid]
    );

    // Swapping project order swaps the task groups.
    project_service
        .reorder_projects(user, &[second_project.uuid, first_project.uuid])
        .unwrap();
    let swapped = service.list_user_tasks(user).unwrap();
    assert_eq!(
        swapped.iter().map(|t| t.uuid).collect::<Vec<_>>(),
        vec![s0.uuid, f0.uuid, f1.uuid]
    );
}
