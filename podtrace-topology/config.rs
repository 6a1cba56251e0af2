use std::path::PathBuf;

use crate::proc::DEFAULT_PROC_ROOT;

/// Topology observer configuration. Only the runtime socket is mandatory.
#[derive(Clone, Debug)]
pub struct ObserverConfig {
    /// Path to the container runtime's local CRI socket.
    pub runtime_socket: PathBuf,

    /// Path to a kubeconfig file. `None` uses the in-cluster service account
    /// (or the local default chain when running outside a cluster).
    pub kubeconfig: Option<PathBuf>,

    /// Restrict the pod watch to a single namespace. `None` watches all.
    pub namespace: Option<String>,

    /// Server-side label selector applied to the pod watch.
    pub label_selector: Option<String>,

    /// Server-side field selector applied to the pod watch.
    pub field_selector: Option<String>,

    /// Filesystem root under which `<pid>/ns/pid` links are readable.
    pub proc_root: PathBuf,
}

impl ObserverConfig {
    /// Creates new [`ObserverConfig`] with defaults for everything but the
    /// runtime socket.
    pub fn new(runtime_socket: impl Into<PathBuf>) -> Self {
        Self {
            runtime_socket: runtime_socket.into(),
            kubeconfig: None,
            namespace: None,
            label_selector: None,
            field_selector: None,
            proc_root: PathBuf::from(DEFAULT_PROC_ROOT),
        }
    }

    /// Sets the kubeconfig path.
    pub fn with_kubeconfig(mut self, kubeconfig: Option<PathBuf>) -> Self {
        self.kubeconfig = kubeconfig;
        self
    }

    /// Sets the watched namespace.
    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace;
        self
    }

    /// Sets the label selector for the pod watch.
    pub fn with_label_selector(mut self, label_selector: Option<String>) -> Self {
        self.label_selector = label_selector;
        self
    }

    /// Sets the field selector for the pod watch.
    pub fn with_field_selector(mut self, field_selector: Option<String>) -> Self {
        self.field_selector = field_selector;
        self
    }

    /// Sets the procfs root.
    pub fn with_proc_root(mut self, proc_root: impl Into<PathBuf>) -> Self {
        self.proc_root = proc_root.into();
        self
    }
}
