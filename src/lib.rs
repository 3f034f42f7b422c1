//! # excluded-prefixes
//!
//! Sources of CIDR prefixes that must be excluded from a cluster's
//! allocation pool.
//!
//! ## Overview
//!
//! A cluster networking control plane hands out address blocks from a pool,
//! and some blocks must never be handed out: the pod and service subnets the
//! cluster itself uses, plus anything the operator lists explicitly. This
//! crate provides the two prefix sources an aggregator unions together:
//!
//! - [`EnvPrefixSource`](sources::EnvPrefixSource): a fixed,
//!   operator-supplied list, CIDR-validated once at construction.
//! - [`KubeadmPrefixSource`](sources::KubeadmPrefixSource): a live view of
//!   the `kubeadm-config` ConfigMap in `kube-system`, kept current by a
//!   background watch task that survives disconnects and signals every
//!   accepted change over a channel.
//!
//! Both implement the [`PrefixSource`](sources::PrefixSource) trait so the
//! aggregator can treat them uniformly: on every notification it re-reads
//! `prefixes()` from all known sources and recomputes the union.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use excluded_prefixes::prelude::*;
//! use tokio::sync::mpsc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> excluded_prefixes::error::Result<()> {
//! let client = kube::Client::try_default().await?;
//! let cancel = CancellationToken::new();
//! let (notify_tx, mut notify_rx) = mpsc::channel(1);
//!
//! let env_source = EnvPrefixSource::new(["10.96.0.0/12", "not-a-cidr"]);
//! let kubeadm_source = KubeadmPrefixSource::from_client(client, cancel.clone(), notify_tx);
//!
//! let sources: Vec<&dyn PrefixSource> = vec![&env_source, &kubeadm_source];
//! while notify_rx.recv().await.is_some() {
//!     let excluded: Vec<String> = sources.iter().flat_map(|s| s.prefixes()).collect();
//!     println!("excluded prefixes: {excluded:?}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Guarantees
//!
//! - **Tear-free reads**: the watched snapshot is an atomically swapped
//!   immutable list (`arc-swap`); readers always see some fully written
//!   value.
//! - **Store before notify**: the snapshot is replaced before the
//!   corresponding notification is sent.
//! - **No missed startup update**: after opening a watch the task fetches
//!   the ConfigMap directly, closing the race between watch creation and
//!   the first streamed event.
//! - **Self-healing**: watch-open failures and server-side stream closes
//!   are retried for as long as the cancellation token is live; no error
//!   ever surfaces to the caller after construction.

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod snapshot;
pub mod sources;
pub mod watch;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::error::{PrefixError, Result};
    pub use crate::sources::{EnvPrefixSource, KubeadmPrefixSource, PrefixSource};
    pub use crate::watch::{ConfigMapWatch, KubeConfigMaps};
}
