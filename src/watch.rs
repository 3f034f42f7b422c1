//! Capability over the cluster API: open ConfigMap watch sessions and fetch
//! current state.
//!
//! The watch task only ever talks to this trait, which keeps client
//! construction outside the core and lets tests drive the loop with
//! in-memory streams instead of a live cluster.

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::Client;
use kube::api::{Api, WatchParams};
use kube::core::WatchEvent;

use crate::sources::KUBE_NAMESPACE;

/// Stream of raw watch events belonging to one watch session.
///
/// The session is over when the stream ends; transport-level problems show
/// up as `Err` items and do not necessarily end the session.
pub type ConfigMapStream = BoxStream<'static, kube::Result<WatchEvent<ConfigMap>>>;

/// Handle for watching and fetching the cluster's ConfigMaps.
#[async_trait]
pub trait ConfigMapWatch: Send + Sync + 'static {
    /// Open a new watch session. May block on network I/O and may fail;
    /// the caller decides whether to retry.
    async fn watch(&self) -> kube::Result<ConfigMapStream>;

    /// Fetch the named ConfigMap directly, independent of any watch
    /// session. Used for reconciliation right after a watch opens.
    async fn get(&self, name: &str) -> kube::Result<ConfigMap>;
}

/// [`ConfigMapWatch`] implementation over the real Kubernetes API,
/// scoped to the `kube-system` namespace.
///
/// Uses the session-per-call `Api::watch` rather than the relisting
/// `kube::runtime::watcher`, because the reconnect and reconcile behavior
/// belongs to the watch task, not to the client layer.
pub struct KubeConfigMaps {
    api: Api<ConfigMap>,
}

impl KubeConfigMaps {
    /// Build the handle from an already-constructed client.
    pub fn new(client: Client) -> Self {
        Self {
            api: Api::namespaced(client, KUBE_NAMESPACE),
        }
    }
}

#[async_trait]
impl ConfigMapWatch for KubeConfigMaps {
    async fn watch(&self) -> kube::Result<ConfigMapStream> {
        // resourceVersion "0" asks the server for a watch from any recent
        // state; the reconcile fetch right after covers whatever the
        // stream does not replay.
        let events = self.api.watch(&WatchParams::default(), "0").await?;
        Ok(events.boxed())
    }

    async fn get(&self, name: &str) -> kube::Result<ConfigMap> {
        self.api.get(name).await
    }
}
