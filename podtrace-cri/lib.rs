pub use self::client::{
    CONTAINER_NAME_LABEL, POD_NAME_LABEL, POD_NAMESPACE_LABEL, ContainerSummary, PodRef, RuntimeClient, RuntimeError,
    RuntimeProbe,
};

pub mod proto;

mod client;
