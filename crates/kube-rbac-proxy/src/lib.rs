//! Deployer for the `shoot-node-logging` managed resource.
//!
//! Deprecated: this component only exists to hand the kube-rbac-proxy and
//! valitail RBAC objects over to "ignore" mode, so the resource manager stops
//! reconciling them. It is scheduled for removal together with the
//! `shoot-node-logging` managed resource.

pub mod component;

use std::collections::BTreeMap;

use k8s_openapi::{
	api::rbac::v1::{ClusterRole, ClusterRoleBinding},
	apimachinery::pkg::apis::meta::v1::ObjectMeta,
};
use managedresources::{
	registry::RegistryObject, ManagedResourceClient, Registry, RegistryError, ANNOTATION_MODE,
	LABEL_VALUE_GARDENER, MODE_IGNORE,
};
use thiserror::Error;
use tracing::instrument;

pub use component::Deployer;

/// Name of the managed resource holding the RBAC objects.
pub const MANAGED_RESOURCE_NAME: &str = "shoot-node-logging";

pub const KUBE_RBAC_PROXY_CLUSTER_ROLE_BINDING: &str = "gardener.cloud:logging:kube-rbac-proxy";
pub const VALITAIL_CLUSTER_ROLE: &str = "gardener.cloud:logging:valitail";
pub const VALITAIL_CLUSTER_ROLE_BINDING: &str = "gardener.cloud:logging:valitail";

/// Invalid arguments passed to [`KubeRbacProxy::new`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum NewError {
	#[error("client cannot be nil")]
	MissingClient,

	#[error("namespace cannot be empty")]
	EmptyNamespace,
}

/// Errors returned by [`KubeRbacProxy`] operations, passed through unchanged
/// from the layer that produced them.
#[derive(Debug, Error)]
pub enum DeployError<E> {
	#[error(transparent)]
	Registry(#[from] RegistryError),

	#[error(transparent)]
	ManagedResource(E),
}

/// Deploys the `shoot-node-logging` managed resource into a namespace.
pub struct KubeRbacProxy<C> {
	/// Client to create the managed resource with.
	client: C,
	/// Namespace of the managed resource.
	namespace: String,
}

impl<C> std::fmt::Debug for KubeRbacProxy<C> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("KubeRbacProxy")
			.field("namespace", &self.namespace)
			.finish_non_exhaustive()
	}
}

impl<C> KubeRbacProxy<C>
where
	C: ManagedResourceClient + Sync,
{
	pub fn new(client: Option<C>, namespace: impl Into<String>) -> Result<Self, NewError> {
		let client = client.ok_or(NewError::MissingClient)?;
		let namespace = namespace.into();
		if namespace.is_empty() {
			return Err(NewError::EmptyNamespace);
		}

		Ok(Self { client, namespace })
	}

	/// Namespace the managed resource is deployed to.
	pub fn namespace(&self) -> &str {
		&self.namespace
	}
}

fn ignored_meta(name: &str) -> ObjectMeta {
	ObjectMeta {
		name: Some(name.to_string()),
		annotations: Some(BTreeMap::from([(
			ANNOTATION_MODE.to_string(),
			MODE_IGNORE.to_string(),
		)])),
		..Default::default()
	}
}

/// Serialize the RBAC objects carried by the managed resource.
pub fn serialized_resources() -> Result<BTreeMap<String, Vec<u8>>, RegistryError> {
	let kube_rbac_proxy_cluster_role_binding = ClusterRoleBinding {
		metadata: ignored_meta(KUBE_RBAC_PROXY_CLUSTER_ROLE_BINDING),
		..Default::default()
	};
	let valitail_cluster_role = ClusterRole {
		metadata: ignored_meta(VALITAIL_CLUSTER_ROLE),
		..Default::default()
	};
	let valitail_cluster_role_binding = ClusterRoleBinding {
		metadata: ignored_meta(VALITAIL_CLUSTER_ROLE_BINDING),
		..Default::default()
	};

	let objects: [&dyn RegistryObject; 3] = [
		&kube_rbac_proxy_cluster_role_binding,
		&valitail_cluster_role,
		&valitail_cluster_role_binding,
	];
	Registry::new().add_all_and_serialize(&objects)
}

impl<C> Deployer for KubeRbacProxy<C>
where
	C: ManagedResourceClient + Sync,
{
	type Error = DeployError<C::Error>;

	#[instrument(skip(self), fields(namespace = %self.namespace))]
	async fn deploy(&self) -> Result<(), Self::Error> {
		let resources = serialized_resources()?;

		self.client
			.create_for_shoot(
				&self.namespace,
				MANAGED_RESOURCE_NAME,
				LABEL_VALUE_GARDENER,
				false,
				resources,
			)
			.await
			.map_err(DeployError::ManagedResource)?;

		tracing::info!(name = MANAGED_RESOURCE_NAME, "deployed managed resource");
		Ok(())
	}

	#[instrument(skip(self), fields(namespace = %self.namespace))]
	async fn destroy(&self) -> Result<(), Self::Error> {
		self.client
			.delete_for_shoot(&self.namespace, MANAGED_RESOURCE_NAME)
			.await
			.map_err(DeployError::ManagedResource)?;

		tracing::info!(name = MANAGED_RESOURCE_NAME, "destroyed managed resource");
		Ok(())
	}
}
