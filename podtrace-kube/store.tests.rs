use super::*;
use k8s_openapi::api::core::v1::PodStatus;

fn pod(namespace: &str, name: &str, phase: &str) -> Pod {
    let mut pod = Pod::default();
    pod.metadata.namespace = Some(namespace.to_owned());
    pod.metadata.name = Some(name.to_owned());
    pod.status = Some(PodStatus {
        phase: Some(phase.to_owned()),
        ..Default::default()
    });
    pod
}

fn names(transitions: &[PodTransition]) -> Vec<String> {
    transitions
        .iter()
        .map(|t| match t {
            PodTransition::Added(p) => format!("add:{}", p.name_any()),
            PodTransition::Updated(_, p) => format!("update:{}", p.name_any()),
            PodTransition::Deleted(p) => format!("delete:{}", p.name_any()),
        })
        .collect()
}

#[test]
fn add_update_delete_test() {
    let mut store = PodStore::new();

    let transitions = store.apply(Event::Apply(pod("default", "web", "Pending")));
    assert_eq!(vec!["add:web"], names(&transitions));
    assert_eq!(1, store.len());

    let transitions = store.apply(Event::Apply(pod("default", "web", "Running")));
    assert_eq!(vec!["update:web"], names(&transitions));
    if let PodTransition::Updated(old, new) = &transitions[0] {
        assert_eq!(Some("Pending"), old.status.as_ref().and_then(|s| s.phase.as_deref()));
        assert_eq!(Some("Running"), new.status.as_ref().and_then(|s| s.phase.as_deref()));
    } else {
        panic!("expected update transition");
    }

    let transitions = store.apply(Event::Delete(pod("default", "web", "Running")));
    assert_eq!(vec!["delete:web"], names(&transitions));
    assert!(store.is_empty());
}

#[test]
fn same_name_different_namespace_test() {
    let mut store = PodStore::new();

    let transitions = store.apply(Event::Apply(pod("team-a", "web", "Running")));
    assert_eq!(vec!["add:web"], names(&transitions));
    let transitions = store.apply(Event::Apply(pod("team-b", "web", "Running")));
    assert_eq!(vec!["add:web"], names(&transitions));
    assert_eq!(2, store.len());
}

#[test]
fn relist_test() {
    let mut store = PodStore::new();
    store.apply(Event::Apply(pod("default", "kept", "Running")));
    store.apply(Event::Apply(pod("default", "gone", "Running")));

    // the re-list re-delivers "kept" (as an update) and synthesizes a deletion
    // for "gone" once the listing completes
    assert!(store.apply(Event::Init).is_empty());
    let transitions = store.apply(Event::InitApply(pod("default", "kept", "Running")));
    assert_eq!(vec!["update:kept"], names(&transitions));
    let transitions = store.apply(Event::InitApply(pod("default", "fresh", "Pending")));
    assert_eq!(vec!["add:fresh"], names(&transitions));

    let transitions = store.apply(Event::InitDone);
    assert_eq!(vec!["delete:gone"], names(&transitions));
    assert_eq!(2, store.len());
}

#[test]
fn init_done_without_init_test() {
    let mut store = PodStore::new();
    store.apply(Event::Apply(pod("default", "web", "Running")));

    assert!(store.apply(Event::InitDone).is_empty());
    assert_eq!(1, store.len());
}
