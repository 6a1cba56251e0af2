//! Hand-maintained subset of the `runtime.v1` CRI wire schema.
//!
//! Only the messages and fields exchanged by [`crate::RuntimeClient`] are kept;
//! prost skips everything else a runtime puts on the wire. Field tags follow
//! `k8s.io/cri-api/pkg/apis/runtime/v1/api.proto`, so any conformant runtime
//! (containerd, CRI-O, ...) can answer these calls unchanged.

use std::collections::HashMap;

/// State of a container at a point in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ContainerState {
    Created = 0,
    Running = 1,
    Exited = 2,
    Unknown = 3,
}

/// Wrapper message that makes the state filter optional on the wire.
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct ContainerStateValue {
    #[prost(enumeration = "ContainerState", tag = "1")]
    pub state: i32,
}

/// Server-side filter for `ListContainers`. All present fields must match.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ContainerFilter {
    #[prost(string, tag = "1")]
    pub id: String,

    #[prost(message, optional, tag = "2")]
    pub state: Option<ContainerStateValue>,

    #[prost(string, tag = "3")]
    pub pod_sandbox_id: String,

    #[prost(map = "string, string", tag = "4")]
    pub label_selector: HashMap<String, String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListContainersRequest {
    #[prost(message, optional, tag = "1")]
    pub filter: Option<ContainerFilter>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListContainersResponse {
    #[prost(message, repeated, tag = "1")]
    pub containers: Vec<Container>,
}

/// Name and restart attempt of a container within its pod sandbox.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ContainerMetadata {
    #[prost(string, tag = "1")]
    pub name: String,

    #[prost(uint32, tag = "2")]
    pub attempt: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ImageSpec {
    #[prost(string, tag = "1")]
    pub image: String,

    #[prost(map = "string, string", tag = "2")]
    pub annotations: HashMap<String, String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Container {
    #[prost(string, tag = "1")]
    pub id: String,

    #[prost(string, tag = "2")]
    pub pod_sandbox_id: String,

    #[prost(message, optional, tag = "3")]
    pub metadata: Option<ContainerMetadata>,

    #[prost(message, optional, tag = "4")]
    pub image: Option<ImageSpec>,

    #[prost(string, tag = "5")]
    pub image_ref: String,

    #[prost(enumeration = "ContainerState", tag = "6")]
    pub state: i32,

    #[prost(int64, tag = "7")]
    pub created_at: i64,

    #[prost(map = "string, string", tag = "8")]
    pub labels: HashMap<String, String>,

    #[prost(map = "string, string", tag = "9")]
    pub annotations: HashMap<String, String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ContainerStatusRequest {
    #[prost(string, tag = "1")]
    pub container_id: String,

    /// Asks the runtime to fill the response `info` map with verbose,
    /// runtime-specific details.
    #[prost(bool, tag = "2")]
    pub verbose: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ContainerStatus {
    #[prost(string, tag = "1")]
    pub id: String,

    #[prost(message, optional, tag = "2")]
    pub metadata: Option<ContainerMetadata>,

    #[prost(enumeration = "ContainerState", tag = "3")]
    pub state: i32,

    #[prost(int64, tag = "4")]
    pub created_at: i64,

    #[prost(int64, tag = "5")]
    pub started_at: i64,

    #[prost(int64, tag = "6")]
    pub finished_at: i64,

    #[prost(int32, tag = "7")]
    pub exit_code: i32,

    #[prost(message, optional, tag = "8")]
    pub image: Option<ImageSpec>,

    #[prost(string, tag = "9")]
    pub image_ref: String,

    #[prost(string, tag = "10")]
    pub reason: String,

    #[prost(string, tag = "11")]
    pub message: String,

    #[prost(map = "string, string", tag = "12")]
    pub labels: HashMap<String, String>,

    #[prost(map = "string, string", tag = "13")]
    pub annotations: HashMap<String, String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ContainerStatusResponse {
    #[prost(message, optional, tag = "1")]
    pub status: Option<ContainerStatus>,

    /// Verbose runtime details. Runtimes put a JSON document under the `"info"`
    /// key whose top-level `pid` field is the host PID of the container's init
    /// process.
    #[prost(map = "string, string", tag = "2")]
    pub info: HashMap<String, String>,
}
