use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use kube::runtime::watcher::Event;
use std::collections::{HashMap, HashSet};

/// Informer-style transition derived from the raw watch stream.
pub enum PodTransition {
    Added(Pod),
    /// Old and new revision of the same pod.
    Updated(Pod, Pod),
    Deleted(Pod),
}

/// Local cache of watched pods, keyed by `(namespace, name)`.\
/// Turns raw watcher events into add/update/delete transitions and synthesizes
/// deletions for pods that disappeared across a re-list.
#[derive(Default)]
pub struct PodStore {
    pods: HashMap<(String, String), Pod>,
    relisted: Option<HashSet<(String, String)>>,
}

impl PodStore {
    /// Creates new empty [`PodStore`] instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of currently cached pods.
    pub fn len(&self) -> usize {
        self.pods.len()
    }

    /// Returns `true` if no pods are cached.
    pub fn is_empty(&self) -> bool {
        self.pods.is_empty()
    }

    /// Applies a raw watcher event and returns the transitions it implies,
    /// in the order they must be delivered.
    pub fn apply(&mut self, event: Event<Pod>) -> Vec<PodTransition> {
        match event {
            Event::Init => {
                self.relisted = Some(HashSet::new());
                Vec::new()
            },
            Event::InitApply(pod) => {
                if let Some(relisted) = self.relisted.as_mut() {
                    relisted.insert(pod_key(&pod));
                }
                self.upsert(pod)
            },
            Event::InitDone => self.flush_missing(),
            Event::Apply(pod) => self.upsert(pod),
            Event::Delete(pod) => {
                self.pods.remove(&pod_key(&pod));
                vec![PodTransition::Deleted(pod)]
            },
        }
    }

    fn upsert(&mut self, pod: Pod) -> Vec<PodTransition> {
        match self.pods.insert(pod_key(&pod), pod.clone()) {
            Some(old) => vec![PodTransition::Updated(old, pod)],
            None => vec![PodTransition::Added(pod)],
        }
    }

    /// Pods cached before a re-list but absent from it were deleted while the
    /// watch was down.
    fn flush_missing(&mut self) -> Vec<PodTransition> {
        let Some(relisted) = self.relisted.take() else {
            return Vec::new();
        };

        let missing = self
            .pods
            .keys()
            .filter(|key| !relisted.contains(*key))
            .cloned()
            .collect::<Vec<_>>();

        missing
            .into_iter()
            .filter_map(|key| self.pods.remove(&key))
            .map(PodTransition::Deleted)
            .collect()
    }
}

fn pod_key(pod: &Pod) -> (String, String) {
    (pod.namespace().unwrap_or_default(), pod.name_any())
}

#[cfg(test)]
#[path = "./store.tests.rs"]
mod tests;
