use super::*;
use k8s_openapi::api::core::v1::PodStatus;
use std::collections::{HashMap, HashSet};
use tempfile::TempDir;
use tokio::sync::mpsc;

/// Runtime fake that serves a fixed container set. The pod filter argument is
/// deliberately ignored so the client-side identity checks get exercised.
#[derive(Default)]
struct FakeRuntime {
    containers: Vec<ContainerSummary>,
    pids: HashMap<String, u32>,
    broken: HashSet<String>,
}

impl FakeRuntime {
    fn with_container(mut self, summary: ContainerSummary, pid: Option<u32>) -> Self {
        if let Some(pid) = pid {
            self.pids.insert(summary.id.clone(), pid);
        }
        self.containers.push(summary);
        self
    }

    fn with_broken_status(mut self, id: &str) -> Self {
        self.broken.insert(id.to_owned());
        self
    }
}

impl RuntimeProbe for FakeRuntime {
    async fn running_containers(&mut self, _pod: Option<&PodRef>) -> Result<Vec<ContainerSummary>, RuntimeError> {
        Ok(self.containers.clone())
    }

    async fn container_pid(&mut self, id: &str) -> Result<u32, RuntimeError> {
        if self.broken.contains(id) {
            return Err(RuntimeError::Rpc(tonic::Status::unavailable("injected failure")));
        }

        self.pids.get(id).copied().ok_or_else(|| RuntimeError::NoPid(id.to_owned()))
    }
}

fn summary(id: &str, namespace: &str, pod: &str, name: &str) -> ContainerSummary {
    ContainerSummary {
        id: id.to_owned(),
        image: format!("registry.local/{name}:latest"),
        labels: HashMap::from([
            (POD_NAME_LABEL.to_owned(), pod.to_owned()),
            (POD_NAMESPACE_LABEL.to_owned(), namespace.to_owned()),
            (CONTAINER_NAME_LABEL.to_owned(), name.to_owned()),
        ]),
    }
}

fn fake_proc(entries: &[(u32, u64)]) -> TempDir {
    let root = TempDir::new().unwrap();
    for (pid, inode) in entries {
        let ns_dir = root.path().join(pid.to_string()).join("ns");
        std::fs::create_dir_all(&ns_dir).unwrap();
        std::os::unix::fs::symlink(format!("pid:[{inode}]"), ns_dir.join("pid")).unwrap();
    }
    root
}

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

fn reconciler(runtime: FakeRuntime, proc_root: &TempDir) -> (Reconciler<FakeRuntime>, mpsc::Receiver<TopologyEvent>) {
    let (tx, rx) = mpsc::channel(16);
    (Reconciler::new(runtime, proc_root.path().to_path_buf(), tx), rx)
}

fn drain(rx: &mut mpsc::Receiver<TopologyEvent>) -> Vec<TopologyEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn added_pod_emits_start_test() {
    let runtime = FakeRuntime::default().with_container(summary("c1", "ns", "p", "main"), Some(4242));
    let proc_root = fake_proc(&[(4242, 4026532281)]);
    let (mut reconciler, mut rx) = reconciler(runtime, &proc_root);

    reconciler.pod_added(&pod("ns", "p", "Running")).await;

    let events = drain(&mut rx);
    assert_eq!(1, events.len());
    assert_eq!(EventKind::Start, events[0].kind);
    assert_eq!(
        Container {
            id: "c1".to_owned(),
            pod: "p".to_owned(),
            namespace: "ns".to_owned(),
            name: "main".to_owned(),
            image: "registry.local/main:latest".to_owned(),
            labels: summary("c1", "ns", "p", "main").labels,
            pid: 4242,
            pid_namespace: 4026532281,
        },
        events[0].container
    );
}

#[tokio::test]
async fn added_then_deleted_pod_test() {
    let runtime = FakeRuntime::default().with_container(summary("c1", "ns", "p", "main"), Some(4242));
    let proc_root = fake_proc(&[(4242, 4026532281)]);
    let (mut reconciler, mut rx) = reconciler(runtime, &proc_root);

    reconciler.pod_added(&pod("ns", "p", "Running")).await;
    reconciler.pod_deleted(&pod("ns", "p", "Running")).await;

    let events = drain(&mut rx);
    assert_eq!(2, events.len());
    assert_eq!(EventKind::Start, events[0].kind);
    assert_eq!(EventKind::Stop, events[1].kind);
    assert_eq!(events[0].container, events[1].container);
}

#[tokio::test]
async fn added_pod_skips_container_without_pid_test() {
    let runtime = FakeRuntime::default()
        .with_container(summary("c1", "ns", "p", "main"), Some(4242))
        .with_container(summary("c2", "ns", "p", "sidecar"), None);
    let proc_root = fake_proc(&[(4242, 4026532281)]);
    let (mut reconciler, mut rx) = reconciler(runtime, &proc_root);

    reconciler.pod_added(&pod("ns", "p", "Running")).await;

    let events = drain(&mut rx);
    assert_eq!(1, events.len());
    assert_eq!("c1", events[0].container.id);
}

#[tokio::test]
async fn update_to_running_restarts_containers_test() {
    let runtime = FakeRuntime::default().with_container(summary("c1", "ns", "p", "main"), Some(4242));
    let proc_root = fake_proc(&[(4242, 4026532281)]);
    let (mut reconciler, mut rx) = reconciler(runtime, &proc_root);

    reconciler.pod_updated(&pod("ns", "p", "Pending"), &pod("ns", "p", "Running")).await;

    let events = drain(&mut rx);
    assert_eq!(2, events.len());
    assert_eq!(EventKind::Stop, events[0].kind);
    assert_eq!(EventKind::Start, events[1].kind);
    assert_eq!("c1", events[0].container.id);
    assert_eq!("c1", events[1].container.id);
}

#[tokio::test]
async fn update_away_from_running_stops_containers_test() {
    let runtime = FakeRuntime::default().with_container(summary("c1", "ns", "p", "main"), Some(4242));
    let proc_root = fake_proc(&[(4242, 4026532281)]);
    let (mut reconciler, mut rx) = reconciler(runtime, &proc_root);

    reconciler.pod_updated(&pod("ns", "p", "Running"), &pod("ns", "p", "Failed")).await;

    let events = drain(&mut rx);
    assert_eq!(1, events.len());
    assert_eq!(EventKind::Stop, events[0].kind);
    assert_eq!("c1", events[0].container.id);
}

#[tokio::test]
async fn update_with_stable_runtime_is_convergent_test() {
    let runtime = FakeRuntime::default()
        .with_container(summary("c1", "ns", "p", "main"), Some(4242))
        .with_container(summary("c2", "ns", "p", "sidecar"), Some(4243));
    let proc_root = fake_proc(&[(4242, 4026532281), (4243, 4026532282)]);
    let (mut reconciler, mut rx) = reconciler(runtime, &proc_root);

    let running = pod("ns", "p", "Running");
    reconciler.pod_updated(&running, &running).await;

    let events = drain(&mut rx);
    assert_eq!(4, events.len());

    let stops: HashSet<_> = events
        .iter()
        .filter(|e| e.kind == EventKind::Stop)
        .map(|e| e.container.id.clone())
        .collect();
    let starts: HashSet<_> = events
        .iter()
        .filter(|e| e.kind == EventKind::Start)
        .map(|e| e.container.id.clone())
        .collect();
    assert_eq!(stops, starts);
    assert_eq!(HashSet::from(["c1".to_owned(), "c2".to_owned()]), starts);

    // all stops precede all starts
    assert!(events.iter().take(2).all(|e| e.kind == EventKind::Stop));
    assert!(events.iter().skip(2).all(|e| e.kind == EventKind::Start));
}

#[tokio::test]
async fn foreign_pod_containers_filtered_test() {
    let runtime = FakeRuntime::default()
        .with_container(summary("c1", "ns", "p", "main"), Some(4242))
        .with_container(summary("c2", "ns", "q", "main"), Some(4243));
    let proc_root = fake_proc(&[(4242, 4026532281), (4243, 4026532282)]);
    let (mut reconciler, mut rx) = reconciler(runtime, &proc_root);

    reconciler.pod_added(&pod("ns", "p", "Running")).await;

    let events = drain(&mut rx);
    assert_eq!(1, events.len());
    assert_eq!("c1", events[0].container.id);
    assert_eq!("p", events[0].container.pod);
    assert_eq!("ns", events[0].container.namespace);
}

#[tokio::test]
async fn status_failure_is_isolated_test() {
    let runtime = FakeRuntime::default()
        .with_container(summary("c1", "ns", "p", "one"), Some(101))
        .with_container(summary("c2", "ns", "p", "two"), Some(102))
        .with_container(summary("c3", "ns", "p", "three"), Some(103))
        .with_broken_status("c2");
    let proc_root = fake_proc(&[(101, 1001), (102, 1002), (103, 1003)]);
    let (mut reconciler, mut rx) = reconciler(runtime, &proc_root);

    reconciler.pod_added(&pod("ns", "p", "Running")).await;

    let events = drain(&mut rx);
    assert_eq!(
        vec!["c1", "c3"],
        events.iter().map(|e| e.container.id.as_str()).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn unlabeled_container_ignored_test() {
    let mut plain = summary("c9", "ns", "p", "main");
    plain.labels.clear();

    let runtime = FakeRuntime::default()
        .with_container(plain, Some(100))
        .with_container(summary("c1", "ns", "p", "main"), Some(4242));
    let proc_root = fake_proc(&[(100, 1000), (4242, 4026532281)]);
    let (mut reconciler, mut rx) = reconciler(runtime, &proc_root);

    reconciler.pod_added(&pod("ns", "p", "Running")).await;

    let events = drain(&mut rx);
    assert_eq!(1, events.len());
    assert_eq!("c1", events[0].container.id);
}

#[tokio::test]
async fn racing_exit_skipped_test() {
    let runtime = FakeRuntime::default()
        .with_container(summary("c1", "ns", "p", "main"), Some(4242))
        .with_container(summary("c2", "ns", "p", "gone"), Some(9999));
    let proc_root = fake_proc(&[(4242, 4026532281)]);
    let (mut reconciler, mut rx) = reconciler(runtime, &proc_root);

    reconciler.pod_added(&pod("ns", "p", "Running")).await;

    let events = drain(&mut rx);
    assert_eq!(1, events.len());
    assert_eq!("c1", events[0].container.id);
}

#[tokio::test]
async fn pod_without_identity_ignored_test() {
    let runtime = FakeRuntime::default().with_container(summary("c1", "ns", "p", "main"), Some(4242));
    let proc_root = fake_proc(&[(4242, 4026532281)]);
    let (mut reconciler, mut rx) = reconciler(runtime, &proc_root);

    reconciler.pod_added(&Pod::default()).await;

    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn collect_containers_unfiltered_test() {
    let mut runtime = FakeRuntime::default()
        .with_container(summary("c1", "ns", "p", "main"), Some(4242))
        .with_container(summary("c2", "other", "q", "web"), Some(4243));
    let proc_root = fake_proc(&[(4242, 4026532281), (4243, 4026532282)]);

    let containers = collect_containers(&mut runtime, proc_root.path(), None).await.unwrap();

    assert_eq!(2, containers.len());
    assert_eq!(("p", "ns"), (containers[0].pod.as_str(), containers[0].namespace.as_str()));
    assert_eq!(("q", "other"), (containers[1].pod.as_str(), containers[1].namespace.as_str()));
}
