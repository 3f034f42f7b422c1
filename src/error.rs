//! Error types for excluded-prefixes.

/// Result type alias for excluded-prefixes operations.
pub type Result<T> = std::result::Result<T, PrefixError>;

/// Errors that can occur while collecting excluded prefixes.
///
/// After construction no source ever surfaces one of these to its caller:
/// the watch task contains every failure internally (log, retry or skip).
/// The type exists for the decode and cluster-API seams, and for code that
/// talks to [`KubeConfigMaps`](crate::watch::KubeConfigMaps) directly.
#[derive(Debug, thiserror::Error)]
pub enum PrefixError {
    /// The cluster configuration document is missing or empty.
    #[error("cluster configuration document is empty")]
    EmptyDocument,

    /// Failed to decode a YAML-encoded cluster configuration document.
    #[error("failed to decode cluster configuration as YAML: {0}")]
    DecodeYaml(#[from] serde_yaml::Error),

    /// Failed to decode a JSON-encoded cluster configuration document.
    #[error("failed to decode cluster configuration as JSON: {0}")]
    DecodeJson(#[from] serde_json::Error),

    /// A call against the Kubernetes API failed.
    #[error("kubernetes api error: {0}")]
    Kube(#[from] kube::Error),
}
