use super::*;
use crate::agent::fake::{FakeAdapter, FakeAdapterConfig};
use substrate_core::ids::AdapterId;

#[test]
fn from_adapters_registers_every_entry() {
    let registry = AdapterRegistry::from_adapters(vec![
        Box::new(FakeAdapter::new(FakeAdapterConfig {
            id: AdapterId::new("one"),
            ..Default::default()
        })),
        Box::new(FakeAdapter::new(FakeAdapterConfig {
            id: AdapterId::new("two"),
            ..Default::default()
        })),
    ]);
    assert!(registry.is_registered(&AdapterId::new("one")));
    assert!(registry.is_registered(&AdapterId::new("two")));
    assert_eq!(registry.ids().len(), 2);
}

#[test]
fn lookup_by_id_returns_none_for_unregistered() {
    let registry = AdapterRegistry::from_adapters(Vec::new());
    assert!(registry.get(&AdapterId::new("missing")).is_none());
}

#[test]
fn planning_capable_filters_to_supporting_adapters() {
    let registry = AdapterRegistry::from_adapters(vec![Box::new(FakeAdapter::new(
        FakeAdapterConfig {
            id: AdapterId::new("fake"),
            ..Default::default()
        },
    ))]);
    assert_eq!(registry.planning_capable(), vec![AdapterId::new("fake")]);
}

#[tokio::test]
async fn discover_never_blocks_on_unhealthy_adapters() {
    // The real `claude`/`codex`/`gemini` binaries are unlikely to be on the
    // test host's PATH; discover() must still return promptly rather than
    // erroring out.
    let (registry, report) = AdapterRegistry::discover().await;
    assert_eq!(report.registered_count() + report.failed_count(), 3);
    assert_eq!(registry.ids().len(), report.registered_count());
}
