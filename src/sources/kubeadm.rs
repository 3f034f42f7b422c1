//! Watched excluded-prefix source backed by the kubeadm ConfigMap.

use std::sync::Arc;

use futures::StreamExt;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::core::WatchEvent;
use kube::{Client, ResourceExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use super::PrefixSource;
use crate::config::{self, CLUSTER_CONFIGURATION_KEY};
use crate::error::Result;
use crate::snapshot::PrefixSnapshot;
use crate::watch::{ConfigMapWatch, KubeConfigMaps};

/// Namespace holding the kubeadm ConfigMap.
pub const KUBE_NAMESPACE: &str = "kube-system";
/// Name of the kubeadm ConfigMap.
pub const KUBE_NAME: &str = "kubeadm-config";

/// Excluded-prefix source that mirrors the pod and service subnets from the
/// `kubeadm-config` ConfigMap.
///
/// Construction spawns a background task and returns immediately. The task
/// keeps a watch open against the ConfigMap for as long as the cancellation
/// token is live, reopening the session on any failure with no backoff. On
/// every accepted change (the initial reconcile included) it replaces the
/// snapshot first and then sends exactly one `()` on the notification
/// channel; the send blocks until the receiver takes it, so the receiver
/// paces the task.
///
/// Unlike [`EnvPrefixSource`](super::EnvPrefixSource), entries from this
/// source are not CIDR-validated: the cluster's own subnet strings are
/// passed through as received.
pub struct KubeadmPrefixSource {
    prefixes: Arc<PrefixSnapshot>,
}

impl PrefixSource for KubeadmPrefixSource {
    fn prefixes(&self) -> Vec<String> {
        self.prefixes.load()
    }
}

impl KubeadmPrefixSource {
    /// Create the source over any [`ConfigMapWatch`] capability and start
    /// its background watch task.
    pub fn new<A>(api: A, cancel: CancellationToken, notify: mpsc::Sender<()>) -> Self
    where
        A: ConfigMapWatch,
    {
        let prefixes = Arc::new(PrefixSnapshot::new());
        let task = WatchTask {
            api,
            prefixes: Arc::clone(&prefixes),
            cancel,
            notify,
        };
        tokio::spawn(task.run());
        Self { prefixes }
    }

    /// Create the source over the real cluster API.
    pub fn from_client(client: Client, cancel: CancellationToken, notify: mpsc::Sender<()>) -> Self {
        Self::new(KubeConfigMaps::new(client), cancel, notify)
    }
}

/// State owned by the background watch task. The snapshot is the only thing
/// shared with the source handle.
struct WatchTask<A> {
    api: A,
    prefixes: Arc<PrefixSnapshot>,
    cancel: CancellationToken,
    notify: mpsc::Sender<()>,
}

impl<A: ConfigMapWatch> WatchTask<A> {
    async fn run(self) {
        while !self.cancel.is_cancelled() {
            self.watch_config_map().await;
        }
    }

    /// One watch session: open, reconcile, then drain events until the
    /// session dies or the task is cancelled.
    async fn watch_config_map(&self) {
        info!("Watching kubeadm ConfigMap");

        let mut events = match self.api.watch().await {
            Ok(events) => events,
            Err(err) => {
                error!("Error creating ConfigMap watch: {err}");
                return;
            }
        };

        // Check current state after the watch exists, or an update landing
        // between the two could be missed.
        self.check_current_config_map().await;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    warn!("kubeadm ConfigMap watch is canceled");
                    return;
                }
                event = events.next() => {
                    let Some(event) = event else {
                        warn!("kubeadm ConfigMap watch is closed");
                        return;
                    };

                    trace!("kubeadm ConfigMap event received: {event:?}");

                    let Ok(event) = event else {
                        // transport error item, skip
                        continue;
                    };

                    match &event {
                        WatchEvent::Bookmark(_) | WatchEvent::Error(_) => continue,
                        WatchEvent::Deleted(config_map) => {
                            if config_map.name_any() != KUBE_NAME {
                                continue;
                            }
                            self.prefixes.store(Vec::new());
                            self.send_notification().await;
                            info!("kubeadm ConfigMap deleted");
                        }
                        WatchEvent::Added(config_map) | WatchEvent::Modified(config_map) => {
                            if config_map.name_any() != KUBE_NAME {
                                continue;
                            }
                            if let Err(err) = self.set_prefixes_from_config_map(config_map).await {
                                error!("{err}");
                            }
                        }
                    }
                }
            }
        }
    }

    /// Reconciliation fetch: apply the ConfigMap's current state exactly as
    /// if it had been streamed.
    async fn check_current_config_map(&self) {
        let config_map = match self.api.get(KUBE_NAME).await {
            Ok(config_map) => config_map,
            Err(err) => {
                error!("Error getting kubeadm ConfigMap: {err}");
                return;
            }
        };

        if let Err(err) = self.set_prefixes_from_config_map(&config_map).await {
            error!("Error setting prefixes from kubeadm ConfigMap: {err}");
        }
    }

    /// Decode the embedded cluster configuration and publish the pod-subnet
    /// fragments followed by the service-subnet fragments.
    ///
    /// On decode failure the prior snapshot stays in place and nothing is
    /// notified.
    async fn set_prefixes_from_config_map(&self, config_map: &ConfigMap) -> Result<()> {
        let raw = config_map
            .data
            .as_ref()
            .and_then(|data| data.get(CLUSTER_CONFIGURATION_KEY))
            .map(String::as_str)
            .unwrap_or_default();
        let cluster_configuration = config::decode_cluster_configuration(raw)?;

        let pod_subnet = &cluster_configuration.networking.pod_subnet;
        let service_subnet = &cluster_configuration.networking.service_subnet;

        // Empty is tolerated, not fatal: whatever fragments exist still go out.
        if pod_subnet.is_empty() {
            error!("ClusterConfiguration.networking.podSubnet is empty");
        }
        if service_subnet.is_empty() {
            error!("ClusterConfiguration.networking.serviceSubnet is empty");
        }

        let mut prefixes = config::split_subnet_list(pod_subnet);
        prefixes.extend(config::split_subnet_list(service_subnet));

        self.prefixes.store(prefixes.clone());
        self.send_notification().await;
        info!("Prefixes sent from kubeadm source: {prefixes:?}");

        Ok(())
    }

    async fn send_notification(&self) {
        if self.notify.send(()).await.is_err() {
            debug!("prefix change notification receiver dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watch::ConfigMapStream;
    use async_trait::async_trait;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use kube::core::ErrorResponse;
    use std::collections::BTreeMap;

    /// Api stub whose watch never opens; enough to build a task and drive
    /// the apply path directly.
    struct NoApi;

    #[async_trait]
    impl ConfigMapWatch for NoApi {
        async fn watch(&self) -> kube::Result<ConfigMapStream> {
            Err(kube::Error::Api(ErrorResponse {
                status: "Failure".into(),
                message: "watch unavailable".into(),
                reason: "ServiceUnavailable".into(),
                code: 503,
            }))
        }

        async fn get(&self, _name: &str) -> kube::Result<ConfigMap> {
            Err(kube::Error::Api(ErrorResponse {
                status: "Failure".into(),
                message: "not found".into(),
                reason: "NotFound".into(),
                code: 404,
            }))
        }
    }

    fn task(notify: mpsc::Sender<()>) -> WatchTask<NoApi> {
        WatchTask {
            api: NoApi,
            prefixes: Arc::new(PrefixSnapshot::new()),
            cancel: CancellationToken::new(),
            notify,
        }
    }

    fn config_map(cluster_configuration: &str) -> ConfigMap {
        let mut data = BTreeMap::new();
        data.insert(
            CLUSTER_CONFIGURATION_KEY.to_string(),
            cluster_configuration.to_string(),
        );
        ConfigMap {
            metadata: ObjectMeta {
                name: Some(KUBE_NAME.to_string()),
                namespace: Some(KUBE_NAMESPACE.to_string()),
                ..Default::default()
            },
            data: Some(data),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_apply_stores_pod_then_service_subnets() {
        let (tx, mut rx) = mpsc::channel(1);
        let task = task(tx);
        let cm = config_map(
            "networking:\n  podSubnet: 10.0.0.0/16\n  serviceSubnet: \"10.1.0.0/16,fd00::/64\"\n",
        );

        task.set_prefixes_from_config_map(&cm).await.unwrap();

        assert_eq!(
            task.prefixes.load(),
            vec!["10.0.0.0/16", "10.1.0.0/16", "fd00::/64"]
        );
        rx.recv().await.unwrap();
        assert!(rx.try_recv().is_err(), "expected exactly one notification");
    }

    #[tokio::test]
    async fn test_apply_decode_failure_keeps_prior_snapshot_and_stays_quiet() {
        let (tx, mut rx) = mpsc::channel(1);
        let task = task(tx);
        task.prefixes.store(vec!["10.0.0.0/16".into()]);

        let cm = config_map("networking: [broken");
        assert!(task.set_prefixes_from_config_map(&cm).await.is_err());

        assert_eq!(task.prefixes.load(), vec!["10.0.0.0/16"]);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_apply_empty_document_keeps_prior_snapshot_and_stays_quiet() {
        let (tx, mut rx) = mpsc::channel(1);
        let task = task(tx);
        task.prefixes.store(vec!["10.0.0.0/16".into()]);

        let cm = config_map("");
        assert!(task.set_prefixes_from_config_map(&cm).await.is_err());

        assert_eq!(task.prefixes.load(), vec!["10.0.0.0/16"]);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_apply_missing_document_key_is_decode_failure() {
        let (tx, mut rx) = mpsc::channel(1);
        let task = task(tx);

        let cm = ConfigMap {
            metadata: ObjectMeta {
                name: Some(KUBE_NAME.to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(task.set_prefixes_from_config_map(&cm).await.is_err());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_apply_tolerates_empty_subnet_fields() {
        let (tx, mut rx) = mpsc::channel(1);
        let task = task(tx);

        let cm = config_map("networking:\n  podSubnet: 10.0.0.0/16\n");
        task.set_prefixes_from_config_map(&cm).await.unwrap();

        assert_eq!(task.prefixes.load(), vec!["10.0.0.0/16"]);
        rx.recv().await.unwrap();
    }

    #[tokio::test]
    async fn test_reconcile_fetch_failure_leaves_snapshot_untouched() {
        let (tx, mut rx) = mpsc::channel(1);
        let task = task(tx);
        task.prefixes.store(vec!["10.0.0.0/16".into()]);

        task.check_current_config_map().await;

        assert_eq!(task.prefixes.load(), vec!["10.0.0.0/16"]);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_notification_survives_dropped_receiver() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let task = task(tx);

        let cm = config_map("networking:\n  podSubnet: 10.0.0.0/16\n  serviceSubnet: 10.96.0.0/12\n");
        task.set_prefixes_from_config_map(&cm).await.unwrap();
        assert_eq!(task.prefixes.load(), vec!["10.0.0.0/16", "10.96.0.0/12"]);
    }
}
