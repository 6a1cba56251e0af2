pub use self::config::ObserverConfig;
pub use podtrace_cri::PodRef;
pub use self::container::{Container, EventKind, TopologyEvent};
pub use self::observer::{KubeObserver, Observer, ObserverError};
pub use self::proc::{DEFAULT_PROC_ROOT, ProcError, pid_namespace};

mod config;
mod container;
mod observer;
mod proc;
mod reconciler;
