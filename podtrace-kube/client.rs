use k8s_openapi::api::core::v1::Pod;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client, Config};
use std::path::Path;

/// Possible errors from building the kubernetes client.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    /// Failed to read or process the kubeconfig file.
    #[error("cannot read kube config: {0}")]
    KubeconfigError(#[from] kube::config::KubeconfigError),

    /// Failed to infer the in-cluster or local default configuration.
    #[error("cannot infer kube config: {0}")]
    InferError(#[from] kube::config::InferConfigError),

    /// Failed to build kubernetes client.
    #[error("cannot create client: {0}")]
    KubeError(#[from] kube::Error),
}

/// Creates a kubernetes client from the provided kubeconfig file.\
/// With no path, configuration is inferred: the in-cluster service account when
/// running inside a pod, the local default chain otherwise.
pub async fn new_client(kubeconfig: Option<&Path>) -> Result<Client, ClientError> {
    let config = match kubeconfig {
        Some(path) => {
            let kubeconfig = Kubeconfig::read_from(path)?;
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?
        },
        None => Config::infer().await?,
    };

    Ok(Client::try_from(config)?)
}

/// Gets pods api client scoped to `namespace` (or to the whole cluster).
pub fn pods_api(client: Client, namespace: Option<&str>) -> Api<Pod> {
    match namespace {
        Some(namespace) => Api::namespaced(client, namespace),
        None => Api::all(client),
    }
}
