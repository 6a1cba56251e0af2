use kube::Client;
use podtrace_cri::{PodRef, RuntimeClient};
use podtrace_kube::{new_client, pods_api, watch_config, watch_pods};
use std::os::unix::fs::FileTypeExt;
use std::path::Path;
use tokio::runtime::Handle;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::ObserverConfig;
use crate::container::{Container, TopologyEvent};
use crate::reconciler::{Reconciler, collect_containers};

/// Possible errors from the topology observer.
#[derive(thiserror::Error, Debug)]
pub enum ObserverError {
    /// Configuration cannot be used to open the data sources.
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    /// Kubernetes client could not be built.
    #[error(transparent)]
    Client(#[from] podtrace_kube::ClientError),

    /// The runtime probe failed.
    #[error(transparent)]
    Runtime(#[from] podtrace_cri::RuntimeError),

    /// Operation requires a connected observer.
    #[error("observer is not connected")]
    NotConnected,

    /// Observer is already running.
    #[error("observer is already running")]
    AlreadyStarted,
}

/// Capability set of a topology source: something that can enumerate complete
/// container records and stream their start/stop events.\
/// [`KubeObserver`] is the CRI + Kubernetes realization; tests and
/// non-orchestrated sources substitute their own.
#[allow(async_fn_in_trait)]
pub trait Observer {
    /// Opens the channels to the underlying data sources.
    async fn connect(&mut self) -> Result<(), ObserverError>;

    /// Returns the complete container records currently known to the source,
    /// optionally narrowed to one pod identity.
    async fn containers(&mut self, pod: Option<&PodRef>) -> Result<Vec<Container>, ObserverError>;

    /// Starts publishing lifecycle events onto `sink` until the cancellation
    /// token fires. The sink stays owned by the caller and is never closed by
    /// the observer.
    fn run(&mut self, sink: Sender<TopologyEvent>, cancellation_token: CancellationToken) -> Result<(), ObserverError>;

    /// Stops the event stream and releases both channels. Idempotent.
    fn close(&mut self);
}

/// Topology observer correlating the Kubernetes pod watch with the node's
/// container runtime.
pub struct KubeObserver {
    config: ObserverConfig,
    runtime: Handle,
    client: Option<Client>,
    probe: Option<RuntimeClient>,
    task: Option<JoinHandle<()>>,
    cancellation_token: Option<CancellationToken>,
}

impl KubeObserver {
    /// Creates new [`KubeObserver`] instance.
    pub fn new(runtime: Handle, config: ObserverConfig) -> Self {
        Self {
            config,
            runtime,
            client: None,
            probe: None,
            task: None,
            cancellation_token: None,
        }
    }

    /// Returns `true` if the observer task is running.
    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }
}

impl Observer for KubeObserver {
    async fn connect(&mut self) -> Result<(), ObserverError> {
        validate_socket(&self.config.runtime_socket)?;

        self.client = Some(new_client(self.config.kubeconfig.as_deref()).await?);
        // the probe dials lazily, a runtime that is down right now only fails
        // the callbacks that need it
        self.probe = Some(RuntimeClient::new(&self.config.runtime_socket));

        Ok(())
    }

    async fn containers(&mut self, pod: Option<&PodRef>) -> Result<Vec<Container>, ObserverError> {
        let probe = self.probe.as_mut().ok_or(ObserverError::NotConnected)?;
        Ok(collect_containers(probe, &self.config.proc_root, pod).await?)
    }

    fn run(&mut self, sink: Sender<TopologyEvent>, cancellation_token: CancellationToken) -> Result<(), ObserverError> {
        if self.task.is_some() {
            return Err(ObserverError::AlreadyStarted);
        }

        let client = self.client.clone().ok_or(ObserverError::NotConnected)?;
        let probe = self.probe.clone().ok_or(ObserverError::NotConnected)?;

        let api = pods_api(client, self.config.namespace.as_deref());
        let config = watch_config(self.config.label_selector.as_deref(), self.config.field_selector.as_deref());
        let handler = Reconciler::new(probe, self.config.proc_root.clone(), sink);

        self.task = Some(self.runtime.spawn(watch_pods(api, config, handler, cancellation_token.clone())));
        self.cancellation_token = Some(cancellation_token);

        Ok(())
    }

    fn close(&mut self) {
        if let Some(cancellation_token) = self.cancellation_token.take() {
            cancellation_token.cancel();
        }

        podtrace_common::tasks::wait_for_task(self.task.take(), "topology observer");

        if let Some(probe) = self.probe.as_mut() {
            probe.close();
        }
        self.probe = None;
        self.client = None;
    }
}

impl Drop for KubeObserver {
    fn drop(&mut self) {
        // cancel only, the blocking join stays in the explicit close()
        if let Some(cancellation_token) = self.cancellation_token.take() {
            cancellation_token.cancel();
        }
    }
}

fn validate_socket(path: &Path) -> Result<(), ObserverError> {
    let metadata = std::fs::metadata(path)
        .map_err(|error| ObserverError::ConfigInvalid(format!("runtime socket '{}': {error}", path.display())))?;

    if !metadata.file_type().is_socket() {
        return Err(ObserverError::ConfigInvalid(format!(
            "runtime socket '{}' is not a socket",
            path.display()
        )));
    }

    Ok(())
}
