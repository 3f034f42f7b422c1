//! Excluded-prefix source implementations.

mod env;
mod kubeadm;
mod prefix_source;

pub use env::EnvPrefixSource;
pub use kubeadm::{KUBE_NAME, KUBE_NAMESPACE, KubeadmPrefixSource};
pub use prefix_source::PrefixSource;
