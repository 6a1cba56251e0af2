pub use self::client::{ClientError, new_client, pods_api};
pub use self::informer::{PodEventHandler, watch_config, watch_pods};
pub use self::store::{PodStore, PodTransition};

mod client;
mod informer;
mod store;
