//! Deploy and destroy command handlers.

use anyhow::{Context, Result};
use clap::Subcommand;
use kube_rbac_proxy::{Deployer, KubeRbacProxy, MANAGED_RESOURCE_NAME};
use managedresources::KubeManagedResources;
use tracing::instrument;

use crate::connection::ClusterConnection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
	/// Create or update the shoot-node-logging managed resource
	Deploy,

	/// Delete the shoot-node-logging managed resource and its secret
	Destroy,
}

/// Run `command` against the cluster behind `connection`.
#[instrument(skip(connection), fields(cluster = %connection.cluster_identifier()))]
pub async fn run(command: Command, connection: &ClusterConnection, namespace: &str) -> Result<()> {
	let managed_resources = KubeManagedResources::new(connection.client().clone());
	let deployer = KubeRbacProxy::new(Some(managed_resources), namespace)
		.context("creating kube-rbac-proxy deployer")?;

	match command {
		Command::Deploy => deployer.deploy().await.with_context(|| {
			format!("deploying managed resource {}/{MANAGED_RESOURCE_NAME}", deployer.namespace())
		}),
		Command::Destroy => deployer.destroy().await.with_context(|| {
			format!("destroying managed resource {}/{MANAGED_RESOURCE_NAME}", deployer.namespace())
		}),
	}
}
