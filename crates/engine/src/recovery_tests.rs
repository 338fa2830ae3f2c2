use super::*;
use substrate_core::{ids::AdapterId, EventBus, FakeClock, Session, Task, TaskStatus};

fn new_session_with_running_task(
    store: &Store,
    session_id: &str,
    task_id: &str,
    max_retries: u32,
) -> (SessionId, TaskId) {
    let session = Session::new(SessionId::new(session_id), "graph.yaml", "main", None, 0);
    store.insert_session(&session).unwrap();
    let mut task = Task::new(
        TaskId::new(task_id),
        session.id.clone(),
        "do it",
        "prompt",
        Some(AdapterId::new("claude-code")),
        max_retries,
    );
    task.status = TaskStatus::Running;
    store.insert_task(&task).unwrap();
    (session.id, task.id)
}

#[test]
fn running_task_under_budget_is_reset_to_pending_and_rescheduled() {
    let store = Arc::new(Store::open_in_memory().unwrap());
    let bus = EventBus::new();
    let engine = Engine::new(store.clone(), bus);
    let (session_id, task_id) = new_session_with_running_task(&store, "s1", "a", 2);
    let clock = FakeClock::new(100);

    let summary = recover(&engine, &clock).unwrap();

    assert_eq!(summary.sessions_scanned, 1);
    assert_eq!(summary.recovered, vec![task_id.clone()]);
    assert!(summary.failed.is_empty());
    assert_eq!(summary.newly_ready, vec![task_id.clone()]);
    let task = store.get_task(&session_id, &task_id).unwrap();
    assert_eq!(task.status, TaskStatus::Ready);
    assert_eq!(task.retry_count, 1);
}

#[test]
fn running_task_over_budget_is_failed_and_session_archived() {
    let store = Arc::new(Store::open_in_memory().unwrap());
    let bus = EventBus::new();
    let engine = Engine::new(store.clone(), bus);
    let (session_id, task_id) = new_session_with_running_task(&store, "s1", "a", 0);
    let clock = FakeClock::new(100);

    let summary = recover(&engine, &clock).unwrap();

    assert!(summary.recovered.is_empty());
    assert_eq!(summary.failed, vec![task_id.clone()]);
    let task = store.get_task(&session_id, &task_id).unwrap();
    assert_eq!(task.status, TaskStatus::Failed);
    assert_eq!(
        store.get_session(&session_id).unwrap().status,
        substrate_core::status::SessionStatus::Abandoned
    );
}

#[test]
fn recovery_is_idempotent_on_a_second_pass() {
    let store = Arc::new(Store::open_in_memory().unwrap());
    let bus = EventBus::new();
    let engine = Engine::new(store.clone(), bus);
    new_session_with_running_task(&store, "s1", "a", 2);
    let clock = FakeClock::new(100);
    recover(&engine, &clock).unwrap();

    let second = recover(&engine, &clock).unwrap();

    assert!(second.recovered.is_empty());
    assert!(second.failed.is_empty());
}

#[test]
fn sessions_with_no_running_tasks_are_left_untouched() {
    let store = Arc::new(Store::open_in_memory().unwrap());
    let bus = EventBus::new();
    let engine = Engine::new(store.clone(), bus);
    let session = Session::new(SessionId::new("s1"), "graph.yaml", "main", None, 0);
    store.insert_session(&session).unwrap();
    let clock = FakeClock::new(100);

    let summary = recover(&engine, &clock).unwrap();

    assert_eq!(summary.sessions_scanned, 1);
    assert!(summary.recovered.is_empty());
    assert!(summary.failed.is_empty());
    assert_eq!(
        store.get_session(&session.id).unwrap().status,
        substrate_core::status::SessionStatus::Active
    );
}
