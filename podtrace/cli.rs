use clap::Parser;
use podtrace_topology::{DEFAULT_PROC_ROOT, ObserverConfig};
use std::path::PathBuf;

/// podtrace observes the pod topology of a Kubernetes node and publishes
/// container start/stop events for the kernel-side syscall tracer.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the container runtime's CRI socket.
    #[arg(long, env = "PODTRACE_RUNTIME_SOCKET")]
    pub runtime_socket: PathBuf,

    /// Path to the kubeconfig file (in-cluster configuration when omitted).
    #[arg(long, env = "KUBECONFIG")]
    pub kubeconfig: Option<PathBuf>,

    /// Watch a single namespace instead of the whole cluster.
    #[arg(long, short)]
    pub namespace: Option<String>,

    /// Label selector applied server-side to the pod watch.
    #[arg(long, short = 'l')]
    pub label_selector: Option<String>,

    /// Field selector applied server-side to the pod watch.
    #[arg(long)]
    pub field_selector: Option<String>,

    /// Filesystem root under which the host's procfs is visible.
    #[arg(long, env = "PODTRACE_PROC_ROOT", default_value = DEFAULT_PROC_ROOT)]
    pub proc_root: PathBuf,

    /// Capacity of the event channel between the observer and the consumer.
    #[arg(long, default_value_t = 256)]
    pub sink_capacity: usize,

    /// Default log filter directives (overridden by RUST_LOG).
    #[arg(long, default_value = "info")]
    pub log_filter: String,
}

impl Args {
    /// Builds the observer configuration from the parsed arguments.
    pub fn observer_config(&self) -> ObserverConfig {
        ObserverConfig::new(&self.runtime_socket)
            .with_kubeconfig(self.kubeconfig.clone())
            .with_namespace(self.namespace.clone())
            .with_label_selector(self.label_selector.clone())
            .with_field_selector(self.field_selector.clone())
            .with_proc_root(&self.proc_root)
    }
}
