use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use podtrace_cri::{
    CONTAINER_NAME_LABEL, ContainerSummary, POD_NAME_LABEL, POD_NAMESPACE_LABEL, PodRef, RuntimeError, RuntimeProbe,
};
use podtrace_kube::PodEventHandler;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::Sender;
use tracing::{debug, warn};

use crate::container::{Container, EventKind, TopologyEvent};
use crate::proc::{self, ProcError};

/// Reconciles pod callbacks against the runtime's current container view and
/// emits start/stop events onto the sink.\
/// **Note** that it holds no state of its own: the informer cache and the
/// runtime's answer to the next query are the only sources of truth.
pub(crate) struct Reconciler<P> {
    probe: P,
    proc_root: PathBuf,
    sink: Sender<TopologyEvent>,
}

impl<P: RuntimeProbe> Reconciler<P> {
    /// Creates new [`Reconciler`] instance.
    pub fn new(probe: P, proc_root: PathBuf, sink: Sender<TopologyEvent>) -> Self {
        Self { probe, proc_root, sink }
    }

    /// Emits one event of `kind` for every complete container record the
    /// runtime currently reports for `pod`.\
    /// Emission blocks when the sink is full; that backpressure is the intended
    /// flow control for the informer.
    async fn emit_for_pod(&mut self, pod: &PodRef, kind: EventKind) {
        let containers = match collect_containers(&mut self.probe, &self.proc_root, Some(pod)).await {
            Ok(containers) => containers,
            Err(error) => {
                warn!("cannot list containers for pod {}/{}: {error}", pod.namespace, pod.name);
                return;
            },
        };

        for container in containers {
            if self.sink.send(TopologyEvent::new(kind, container)).await.is_err() {
                // the consumer dropped the receiver, there is nobody left to tell
                return;
            }
        }
    }
}

impl<P: RuntimeProbe> PodEventHandler for Reconciler<P> {
    async fn pod_added(&mut self, pod: &Pod) {
        let Some(pod) = pod_ref(pod) else {
            return;
        };

        self.emit_for_pod(&pod, EventKind::Start).await;
    }

    async fn pod_updated(&mut self, old: &Pod, new: &Pod) {
        // The runtime is the source of truth for container identity and pod
        // updates frequently coincide with container restarts: drop everything
        // reported for the old identity, then re-admit the new one if the pod
        // still runs. Consumers treat redundant stops and starts as no-ops.
        if let Some(old) = pod_ref(old) {
            self.emit_for_pod(&old, EventKind::Stop).await;
        }

        if is_running(new)
            && let Some(new) = pod_ref(new)
        {
            self.emit_for_pod(&new, EventKind::Start).await;
        }
    }

    async fn pod_deleted(&mut self, pod: &Pod) {
        let Some(pod) = pod_ref(pod) else {
            return;
        };

        self.emit_for_pod(&pod, EventKind::Stop).await;
    }
}

/// Resolves the complete container records the runtime currently reports,
/// narrowed to one pod identity when `pod` is given.\
/// Per-container failures are logged and the container skipped; only the
/// listing call itself can fail.
pub(crate) async fn collect_containers<P: RuntimeProbe>(
    probe: &mut P,
    proc_root: &Path,
    pod: Option<&PodRef>,
) -> Result<Vec<Container>, RuntimeError> {
    let summaries = probe.running_containers(pod).await?;

    let mut containers = Vec::with_capacity(summaries.len());
    for summary in summaries {
        if let Some(container) = resolve_container(probe, proc_root, pod, summary).await {
            containers.push(container);
        }
    }

    Ok(containers)
}

/// Assembles one complete [`Container`] record, or `None` if the descriptor
/// must be skipped.
async fn resolve_container<P: RuntimeProbe>(
    probe: &mut P,
    proc_root: &Path,
    pod: Option<&PodRef>,
    summary: ContainerSummary,
) -> Option<Container> {
    let (Some(pod_name), Some(pod_namespace)) = (
        summary.labels.get(POD_NAME_LABEL).cloned(),
        summary.labels.get(POD_NAMESPACE_LABEL).cloned(),
    ) else {
        // not an orchestrator-managed container (e.g. started manually on the node)
        warn!("container {} has no kubernetes pod labels, ignoring", summary.id);
        return None;
    };

    if pod.is_some_and(|pod| pod.name != pod_name || pod.namespace != pod_namespace) {
        return None;
    }

    let pid = match probe.container_pid(&summary.id).await {
        Ok(pid) => pid,
        Err(error) => {
            warn!("cannot resolve host pid for container {}: {error}", summary.id);
            return None;
        },
    };

    let pid_namespace = match proc::pid_namespace(proc_root, pid) {
        Ok(inode) => inode,
        Err(error @ ProcError::NotFound(_)) => {
            // the init process exited between the status call and the readlink
            debug!("container {} already gone: {error}", summary.id);
            return None;
        },
        Err(error) => {
            warn!("cannot resolve pid namespace for container {}: {error}", summary.id);
            return None;
        },
    };

    let name = summary.labels.get(CONTAINER_NAME_LABEL).cloned().unwrap_or_default();

    Some(Container {
        id: summary.id,
        pod: pod_name,
        namespace: pod_namespace,
        name,
        image: summary.image,
        labels: summary.labels,
        pid,
        pid_namespace,
    })
}

fn pod_ref(pod: &Pod) -> Option<PodRef> {
    let name = pod.metadata.name.as_deref()?;
    let namespace = pod.namespace()?;
    Some(PodRef::new(namespace, name))
}

fn is_running(pod: &Pod) -> bool {
    pod.status.as_ref().and_then(|status| status.phase.as_deref()) == Some("Running")
}

#[cfg(test)]
#[path = "./reconciler.tests.rs"]
mod tests;
