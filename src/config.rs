//! The cluster network configuration document embedded in kubeadm's
//! ConfigMap, and the helpers that turn it into a prefix list.

use crate::error::{PrefixError, Result};
use serde::Deserialize;

/// Key under which kubeadm stores the cluster configuration document in its
/// ConfigMap data.
pub const CLUSTER_CONFIGURATION_KEY: &str = "ClusterConfiguration";

/// Subset of the kubeadm `ClusterConfiguration` document this crate cares
/// about. Unknown fields are ignored; missing fields default to empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClusterConfiguration {
    /// Cluster-wide networking settings.
    pub networking: Networking,
}

/// The `networking` section of a kubeadm cluster configuration.
///
/// On dual-stack clusters each subnet field holds a comma-separated pair,
/// e.g. `"10.244.0.0/16,fd00:10:244::/56"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Networking {
    /// CIDR range(s) pods are addressed from.
    pub pod_subnet: String,
    /// CIDR range(s) services are addressed from.
    pub service_subnet: String,
    /// Cluster DNS domain; carried for completeness, unused here.
    pub dns_domain: String,
}

/// Decode a cluster configuration document that may be YAML or JSON.
///
/// kubeadm itself writes YAML, but tooling that rewrites the ConfigMap may
/// serialize JSON; sniff the first significant byte the way the Kubernetes
/// YAML-or-JSON decoder does. Empty input is a decode error.
pub fn decode_cluster_configuration(raw: &str) -> Result<ClusterConfiguration> {
    let trimmed = raw.trim();
    // serde_yaml reads an empty or null document as a fully defaulted
    // struct; a missing ClusterConfiguration key must stay a decode
    // failure, never an accepted empty change.
    if trimmed.is_empty() || trimmed == "null" || trimmed == "~" {
        return Err(PrefixError::EmptyDocument);
    }
    if trimmed.starts_with('{') {
        Ok(serde_json::from_str(raw)?)
    } else {
        Ok(serde_yaml::from_str(raw)?)
    }
}

/// Split a subnet field into its comma-separated CIDR values, trimming
/// whitespace and dropping empty fragments.
///
/// No CIDR validation happens here: the watched source passes the cluster's
/// own subnet strings through as-is.
pub fn split_subnet_list(subnet: &str) -> Vec<String> {
    subnet
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_owned)
        .collect()
}
