use super::*;
use crate::store::Store;
use substrate_core::ids::SessionId;
use substrate_core::signal::SignalKind;
use substrate_core::Session;

fn setup_session(store: &Store, id: &str) -> SessionId {
    let session = Session::new(SessionId::new(id), "graph.yaml", "main", None, 0);
    store.insert_session(&session).unwrap();
    session.id
}

#[test]
fn insert_and_fetch_next_unprocessed() {
    let store = Store::open_in_memory().unwrap();
    let session_id = setup_session(&store, "s1");

    let id = store
        .insert_signal(&session_id, SignalKind::Pause, 1_000)
        .unwrap();

    let next = store.next_unprocessed_signal(&session_id).unwrap().unwrap();
    assert_eq!(next.id, id);
    assert_eq!(next.signal, SignalKind::Pause);
    assert_eq!(next.processed_at_ms, None);
}

#[test]
fn signals_are_consumed_fifo() {
    let store = Store::open_in_memory().unwrap();
    let session_id = setup_session(&store, "s1");

    store
        .insert_signal(&session_id, SignalKind::Pause, 1_000)
        .unwrap();
    store
        .insert_signal(&session_id, SignalKind::Resume, 2_000)
        .unwrap();

    let first = store.next_unprocessed_signal(&session_id).unwrap().unwrap();
    assert_eq!(first.signal, SignalKind::Pause);
    store.mark_signal_processed(first.id, 1_500).unwrap();

    let second = store.next_unprocessed_signal(&session_id).unwrap().unwrap();
    assert_eq!(second.signal, SignalKind::Resume);
}

#[test]
fn signals_are_never_deleted() {
    let store = Store::open_in_memory().unwrap();
    let session_id = setup_session(&store, "s1");
    store
        .insert_signal(&session_id, SignalKind::Cancel, 1_000)
        .unwrap();
    let id = store.next_unprocessed_signal(&session_id).unwrap().unwrap().id;
    store.mark_signal_processed(id, 2_000).unwrap();

    let all = store.list_signals(&session_id).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].processed_at_ms, Some(2_000));
    assert!(store.next_unprocessed_signal(&session_id).unwrap().is_none());
}
