use super::*;
use substrate_core::{ids::AdapterId, FakeClock, Session, Task, TaskDependency};

fn new_session(store: &Store) -> SessionId {
    let session = Session::new(SessionId::new("s1"), "graph.yaml", "main", None, 0);
    store.insert_session(&session).unwrap();
    session.id
}

fn new_failed_task(store: &Store, session_id: &SessionId, id: &str, max_retries: u32) -> TaskId {
    let mut task = Task::new(
        TaskId::new(id),
        session_id.clone(),
        "do it",
        "prompt",
        Some(AdapterId::new("claude-code")),
        max_retries,
    );
    task.status = TaskStatus::Failed;
    task.error = Some("boom".to_string());
    store.insert_task(&task).unwrap();
    task.id
}

#[test]
fn pause_rejects_a_non_active_session() {
    let store = Arc::new(Store::open_in_memory().unwrap());
    let bus = EventBus::new();
    let controller = SessionController::new(store.clone(), bus);
    let id = new_session(&store);
    let clock = FakeClock::new(0);
    controller.pause(&id, &clock).unwrap();

    let err = controller.pause(&id, &clock).unwrap_err();

    assert!(matches!(err, EngineError::Core(CoreError::StateConflict(_))));
}

#[test]
fn pause_then_resume_round_trips_through_active() {
    let store = Arc::new(Store::open_in_memory().unwrap());
    let bus = EventBus::new();
    let controller = SessionController::new(store.clone(), bus);
    let id = new_session(&store);
    let clock = FakeClock::new(0);

    controller.pause(&id, &clock).unwrap();
    assert_eq!(store.get_session(&id).unwrap().status, SessionStatus::Paused);

    clock.advance(10);
    controller.resume(&id, &clock).unwrap();
    assert_eq!(store.get_session(&id).unwrap().status, SessionStatus::Active);
}

#[test]
fn resume_rejects_a_non_paused_session() {
    let store = Arc::new(Store::open_in_memory().unwrap());
    let bus = EventBus::new();
    let controller = SessionController::new(store.clone(), bus);
    let id = new_session(&store);
    let clock = FakeClock::new(0);

    let err = controller.resume(&id, &clock).unwrap_err();

    assert!(matches!(err, EngineError::Core(CoreError::StateConflict(_))));
}

#[test]
fn cancel_rejects_an_already_terminal_session() {
    let store = Arc::new(Store::open_in_memory().unwrap());
    let bus = EventBus::new();
    let controller = SessionController::new(store.clone(), bus);
    let id = new_session(&store);
    let clock = FakeClock::new(0);
    controller.cancel(&id, &clock).unwrap();

    let err = controller.cancel(&id, &clock).unwrap_err();

    assert!(matches!(err, EngineError::Core(CoreError::StateConflict(_))));
}

#[test]
fn retry_without_task_id_retries_every_eligible_failed_task() {
    let store = Arc::new(Store::open_in_memory().unwrap());
    let bus = EventBus::new();
    let controller = SessionController::new(store.clone(), bus);
    let id = new_session(&store);
    let a = new_failed_task(&store, &id, "a", 2);
    let b = new_failed_task(&store, &id, "b", 0); // already exhausted
    let clock = FakeClock::new(0);

    let report = controller.retry(&id, None, false, &clock).unwrap();

    assert_eq!(report.retried, vec![a.clone()]);
    assert_eq!(report.skipped_retry_limit, vec![b]);
    assert_eq!(store.get_task(&id, &a).unwrap().status, TaskStatus::Pending);
}

#[test]
fn retry_with_task_id_blocks_on_incomplete_predecessors() {
    let store = Arc::new(Store::open_in_memory().unwrap());
    let bus = EventBus::new();
    let controller = SessionController::new(store.clone(), bus);
    let id = new_session(&store);
    let pred = new_failed_task(&store, &id, "pred", 2);
    // make pred not-yet-satisfying (still failed, not completed/cancelled)
    let target = new_failed_task(&store, &id, "target", 2);
    store
        .insert_dependency(&TaskDependency {
            session_id: id.clone(),
            task_id: target.clone(),
            depends_on: pred,
        })
        .unwrap();
    let clock = FakeClock::new(0);

    let report = controller
        .retry(&id, Some(&target), false, &clock)
        .unwrap();

    assert!(report.retried.is_empty());
    assert_eq!(report.skipped_predecessors_incomplete, vec![target]);
}

#[test]
fn retry_with_task_id_rejects_a_cancelled_predecessor() {
    // A cancelled predecessor satisfies the ready-set rule, but the
    // explicit `--task` retry form requires predecessors to have actually
    // completed, not merely reached a dependency-satisfying status.
    let store = Arc::new(Store::open_in_memory().unwrap());
    let bus = EventBus::new();
    let controller = SessionController::new(store.clone(), bus);
    let id = new_session(&store);
    // cancel_non_terminal_tasks only touches pending/ready/running rows, so
    // put the predecessor in `ready` first to land it on `cancelled`.
    let pred = new_failed_task(&store, &id, "pred", 2);
    store.mark_task_ready(&id, &pred).unwrap();
    store.cancel_non_terminal_tasks(&id).unwrap();
    assert_eq!(store.get_task(&id, &pred).unwrap().status, TaskStatus::Cancelled);

    let target = new_failed_task(&store, &id, "target", 2);
    store
        .insert_dependency(&TaskDependency {
            session_id: id.clone(),
            task_id: target.clone(),
            depends_on: pred,
        })
        .unwrap();
    let clock = FakeClock::new(0);

    let report = controller
        .retry(&id, Some(&target), false, &clock)
        .unwrap();

    assert!(report.retried.is_empty());
    assert_eq!(report.skipped_predecessors_incomplete, vec![target]);
}

#[test]
fn retry_dry_run_reports_without_mutating() {
    let store = Arc::new(Store::open_in_memory().unwrap());
    let bus = EventBus::new();
    let controller = SessionController::new(store.clone(), bus);
    let id = new_session(&store);
    let a = new_failed_task(&store, &id, "a", 2);
    let clock = FakeClock::new(0);

    let report = controller.retry(&id, None, true, &clock).unwrap();

    assert_eq!(report.retried, vec![a.clone()]);
    assert!(report.dry_run);
    assert_eq!(store.get_task(&id, &a).unwrap().status, TaskStatus::Failed);
    assert!(store.list_signals(&id).unwrap().is_empty());
}
