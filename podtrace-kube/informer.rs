use futures::TryStreamExt;
use k8s_openapi::api::core::v1::Pod;
use kube::Api;
use kube::runtime::{
    WatchStreamExt,
    watcher::{self, watcher},
};
use std::pin::pin;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::store::{PodStore, PodTransition};

/// Callbacks delivered by the pod informer.\
/// Invocations are serialized by the watch loop, one at a time, in stream order.
#[allow(async_fn_in_trait)]
pub trait PodEventHandler {
    async fn pod_added(&mut self, pod: &Pod);
    async fn pod_updated(&mut self, old: &Pod, new: &Pod);
    async fn pod_deleted(&mut self, pod: &Pod);
}

/// Builds the watcher configuration from optional server-side selectors.
pub fn watch_config(labels: Option<&str>, fields: Option<&str>) -> watcher::Config {
    let mut config = watcher::Config::default();
    if let Some(labels) = labels {
        config = config.labels(labels);
    }
    if let Some(fields) = fields {
        config = config.fields(fields);
    }

    config
}

/// Watches pods and feeds the derived informer callbacks to `handler` until the
/// cancellation token fires.\
/// Watch failures are logged and retried with backoff; the re-list that follows
/// a reconnect re-delivers every live pod through the [`PodStore`].
pub async fn watch_pods<H: PodEventHandler>(
    api: Api<Pod>,
    config: watcher::Config,
    mut handler: H,
    cancellation_token: CancellationToken,
) {
    let mut store = PodStore::new();
    let watch = watcher(api, config).default_backoff();
    let mut watch = pin!(watch);

    loop {
        tokio::select! {
            () = cancellation_token.cancelled() => return,
            result = watch.try_next() => {
                let event = match result {
                    Ok(Some(event)) => event,
                    Ok(None) => return,
                    Err(error) => {
                        warn!("pod watch: {error}");
                        continue;
                    },
                };

                let transitions = store.apply(event);
                tokio::select! {
                    () = cancellation_token.cancelled() => return,
                    () = dispatch(&mut handler, transitions) => (),
                }
            },
        }
    }
}

async fn dispatch<H: PodEventHandler>(handler: &mut H, transitions: Vec<PodTransition>) {
    for transition in transitions {
        match transition {
            PodTransition::Added(pod) => handler.pod_added(&pod).await,
            PodTransition::Updated(old, new) => handler.pod_updated(&old, &new).await,
            PodTransition::Deleted(pod) => handler.pod_deleted(&pod).await,
        }
    }
}
