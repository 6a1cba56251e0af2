use http::uri::PathAndQuery;
use hyper_util::rt::TokioIo;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::UnixStream;
use tokio::sync::Mutex;
use tonic::client::Grpc;
use tonic::codec::ProstCodec;
use tonic::transport::{Channel, Endpoint};
use tower::service_fn;

use crate::proto;

pub const POD_NAME_LABEL: &str = "io.kubernetes.pod.name";
pub const POD_NAMESPACE_LABEL: &str = "io.kubernetes.pod.namespace";
pub const CONTAINER_NAME_LABEL: &str = "io.kubernetes.container.name";

const LIST_CONTAINERS_PATH: &str = "/runtime.v1.RuntimeService/ListContainers";
const CONTAINER_STATUS_PATH: &str = "/runtime.v1.RuntimeService/ContainerStatus";

/// Possible errors from the runtime probe.
#[derive(thiserror::Error, Debug)]
pub enum RuntimeError {
    /// The runtime socket cannot be dialed or the transport broke down.
    #[error("container runtime unavailable: {0}")]
    Unavailable(#[from] tonic::transport::Error),

    /// The runtime failed or rejected an RPC.
    #[error("runtime rpc failed: {0}")]
    Rpc(#[from] tonic::Status),

    /// Verbose container status carries no usable host PID.
    #[error("container status for '{0}' has no pid")]
    NoPid(String),
}

/// Pod identity as the orchestrator names it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PodRef {
    pub namespace: String,
    pub name: String,
}

impl PodRef {
    /// Creates new [`PodRef`] instance.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

/// Raw descriptor of a running container as reported by `ListContainers`.
#[derive(Clone, Debug)]
pub struct ContainerSummary {
    pub id: String,
    pub image: String,
    pub labels: HashMap<String, String>,
}

impl From<proto::Container> for ContainerSummary {
    fn from(container: proto::Container) -> Self {
        let image = match container.image {
            Some(spec) if !spec.image.is_empty() => spec.image,
            _ => container.image_ref,
        };

        Self {
            id: container.id,
            image,
            labels: container.labels,
        }
    }
}

/// Minimum runtime surface needed to map pods to kernel-level identifiers.\
/// Implemented by [`RuntimeClient`] for CRI runtimes and by fakes in tests.
#[allow(async_fn_in_trait)]
pub trait RuntimeProbe {
    /// Returns all containers currently in state `Running`, optionally narrowed
    /// to a single pod identity.
    async fn running_containers(&mut self, pod: Option<&PodRef>) -> Result<Vec<ContainerSummary>, RuntimeError>;

    /// Returns the host PID of the container's init process.
    async fn container_pid(&mut self, id: &str) -> Result<u32, RuntimeError>;
}

/// Thin client for the node's container runtime, speaking CRI over its local
/// stream socket. The connection is dialed lazily on first use and re-dialed
/// after transport failures.\
/// **Note** that clones share one channel: concurrent RPCs multiplex on the
/// same connection and only the dial itself is serialized.
#[derive(Clone)]
pub struct RuntimeClient {
    socket: PathBuf,
    channel: Arc<Mutex<Option<Channel>>>,
}

impl RuntimeClient {
    /// Creates new [`RuntimeClient`] instance for the given CRI socket path.
    pub fn new(socket: impl Into<PathBuf>) -> Self {
        Self {
            socket: socket.into(),
            channel: Arc::new(Mutex::new(None)),
        }
    }

    /// Releases the runtime channel. The next RPC dials again.
    pub fn close(&mut self) {
        if let Ok(mut channel) = self.channel.try_lock() {
            channel.take();
        }
    }

    async fn channel(&mut self) -> Result<Channel, RuntimeError> {
        let mut guard = self.channel.lock().await;
        if let Some(channel) = guard.as_ref() {
            return Ok(channel.clone());
        }

        // The endpoint URI is mandatory for the builder but never resolved,
        // the connector below dials the Unix socket instead.
        let socket = Arc::new(self.socket.clone());
        let channel = Endpoint::from_static("http://cri")
            .connect_with_connector(service_fn(move |_| {
                let socket = Arc::clone(&socket);
                async move { Ok::<_, std::io::Error>(TokioIo::new(UnixStream::connect(socket.as_path()).await?)) }
            }))
            .await?;

        tracing::debug!("connected to container runtime at '{}'", self.socket.display());
        *guard = Some(channel.clone());
        Ok(channel)
    }

    async fn unary<M1, M2>(&mut self, path: &'static str, request: M1) -> Result<M2, RuntimeError>
    where
        M1: prost::Message + 'static,
        M2: prost::Message + Default + 'static,
    {
        let mut grpc = Grpc::new(self.channel().await?);
        if let Err(error) = grpc.ready().await {
            self.channel.lock().await.take();
            return Err(RuntimeError::Unavailable(error));
        }

        let codec: ProstCodec<M1, M2> = ProstCodec::default();
        let response = grpc
            .unary(tonic::Request::new(request), PathAndQuery::from_static(path), codec)
            .await?;

        Ok(response.into_inner())
    }
}

impl RuntimeProbe for RuntimeClient {
    async fn running_containers(&mut self, pod: Option<&PodRef>) -> Result<Vec<ContainerSummary>, RuntimeError> {
        let request = proto::ListContainersRequest {
            filter: Some(running_filter(pod)),
        };

        let response: proto::ListContainersResponse = self.unary(LIST_CONTAINERS_PATH, request).await?;
        Ok(response.containers.into_iter().map(ContainerSummary::from).collect())
    }

    async fn container_pid(&mut self, id: &str) -> Result<u32, RuntimeError> {
        let request = proto::ContainerStatusRequest {
            container_id: id.to_owned(),
            verbose: true,
        };

        let response: proto::ContainerStatusResponse = self.unary(CONTAINER_STATUS_PATH, request).await?;
        pid_from_info(&response.info).ok_or_else(|| RuntimeError::NoPid(id.to_owned()))
    }
}

/// Builds a `ListContainers` filter for running containers, narrowed to the
/// standard kubernetes pod labels when a pod identity is given.
fn running_filter(pod: Option<&PodRef>) -> proto::ContainerFilter {
    let mut label_selector = HashMap::new();
    if let Some(pod) = pod {
        label_selector.insert(POD_NAME_LABEL.to_owned(), pod.name.clone());
        label_selector.insert(POD_NAMESPACE_LABEL.to_owned(), pod.namespace.clone());
    }

    proto::ContainerFilter {
        state: Some(proto::ContainerStateValue {
            state: proto::ContainerState::Running as i32,
        }),
        label_selector,
        ..Default::default()
    }
}

/// Verbose status document runtimes place under the `"info"` key.
#[derive(Deserialize)]
struct VerboseInfo {
    pid: Option<i64>,
}

/// Extracts the host PID from the verbose status `info` map.\
/// Returns `None` if the document is absent, unparsable or the PID is not a
/// positive number.
fn pid_from_info(info: &HashMap<String, String>) -> Option<u32> {
    let document = info.get("info")?;
    let parsed: VerboseInfo = serde_json::from_str(document).ok()?;
    u32::try_from(parsed.pid?).ok().filter(|pid| *pid > 0)
}

#[cfg(test)]
#[path = "./client.tests.rs"]
mod tests;
