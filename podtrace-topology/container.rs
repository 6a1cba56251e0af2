use std::collections::HashMap;

/// Kind of a container lifecycle event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    Start,
    Stop,
}

/// A fully resolved container: its orchestrator identity plus the kernel-level
/// identifiers the tracer filters on.\
/// **Note** that a record is only constructed once the container id, the host
/// PID and the PID namespace are all known.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Container {
    /// Runtime-assigned container id, unique per node per lifetime.
    pub id: String,

    /// Name of the pod the container belongs to.
    pub pod: String,

    /// Orchestrator namespace of the pod.
    pub namespace: String,

    /// Container name within the pod.
    pub name: String,

    /// Image reference string.
    pub image: String,

    /// Runtime labels, including the standard `io.kubernetes.*` set.
    pub labels: HashMap<String, String>,

    /// Host-visible PID of the container's init process.
    pub pid: u32,

    /// Inode number of the kernel PID namespace.
    pub pid_namespace: u64,
}

/// Lifecycle event published to the event sink. The consumer owns the record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopologyEvent {
    pub kind: EventKind,
    pub container: Container,
}

impl TopologyEvent {
    /// Creates new [`TopologyEvent`] of the given kind.
    pub fn new(kind: EventKind, container: Container) -> Self {
        Self { kind, container }
    }
}
