//! Creating and deleting managed resources in a cluster.

use std::{collections::BTreeMap, future::Future};

use k8s_openapi::{api::core::v1::Secret, ByteString};
use kube::{
	api::{Api, DeleteParams, ObjectMeta, Patch, PatchParams},
	Client, Resource,
};
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use crate::{
	resource::{ManagedResource, ManagedResourceSpec, SecretReference},
	secret_name, LABEL_KEY_ORIGIN, LABEL_SHOOT_NO_CLEANUP,
};

/// Field manager used for server-side apply.
pub const FIELD_MANAGER: &str = "shoot-node-logging";

/// Errors returned by [`KubeManagedResources`].
#[derive(Debug, Error)]
pub enum Error {
	#[error("applying {kind} {namespace}/{name}")]
	Apply {
		kind: String,
		namespace: String,
		name: String,
		#[source]
		source: Box<kube::Error>,
	},

	#[error("deleting {kind} {namespace}/{name}")]
	Delete {
		kind: String,
		namespace: String,
		name: String,
		#[source]
		source: Box<kube::Error>,
	},
}

/// Create and delete managed resources targeting a shoot cluster.
///
/// Every method is a single round-trip from the caller's point of view; no
/// retries and no waiting for the resource manager to act on the result.
pub trait ManagedResourceClient {
	type Error: std::error::Error + Send + Sync + 'static;

	/// Store `data` in the managed resource's Secret and create or update the
	/// managed resource `name` in `namespace` pointing at it.
	fn create_for_shoot(
		&self,
		namespace: &str,
		name: &str,
		origin: &str,
		keep_objects: bool,
		data: BTreeMap<String, Vec<u8>>,
	) -> impl Future<Output = Result<(), Self::Error>> + Send;

	/// Delete the managed resource `name` in `namespace` and its Secret.
	fn delete_for_shoot(
		&self,
		namespace: &str,
		name: &str,
	) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Build the Secret holding a managed resource's bundle.
pub fn secret_for_data(namespace: &str, name: &str, data: BTreeMap<String, Vec<u8>>) -> Secret {
	Secret {
		metadata: ObjectMeta {
			name: Some(secret_name(name)),
			namespace: Some(namespace.to_string()),
			..Default::default()
		},
		type_: Some("Opaque".to_string()),
		data: Some(
			data.into_iter()
				.map(|(key, value)| (key, ByteString(value)))
				.collect(),
		),
		..Default::default()
	}
}

/// Build a managed resource for the shoot, referencing the Secret built by
/// [`secret_for_data`] for the same `name`.
pub fn managed_resource_for_shoot(
	namespace: &str,
	name: &str,
	origin: &str,
	keep_objects: bool,
) -> ManagedResource {
	let mut managed_resource = ManagedResource::new(
		name,
		ManagedResourceSpec {
			secret_refs: vec![SecretReference::new(secret_name(name))],
			inject_labels: BTreeMap::from([(
				LABEL_SHOOT_NO_CLEANUP.to_string(),
				"true".to_string(),
			)]),
			keep_objects: Some(keep_objects),
			..Default::default()
		},
	);
	managed_resource.metadata.namespace = Some(namespace.to_string());
	managed_resource.metadata.labels = Some(BTreeMap::from([(
		LABEL_KEY_ORIGIN.to_string(),
		origin.to_string(),
	)]));
	managed_resource
}

/// [`ManagedResourceClient`] talking to the Kubernetes API.
#[derive(Clone)]
pub struct KubeManagedResources {
	client: Client,
}

impl KubeManagedResources {
	pub fn new(client: Client) -> Self {
		Self { client }
	}

	async fn apply<K>(&self, namespace: &str, object: &K) -> Result<(), Error>
	where
		K: Resource<DynamicType = (), Scope = k8s_openapi::NamespaceResourceScope>
			+ Clone
			+ Serialize
			+ serde::de::DeserializeOwned
			+ std::fmt::Debug,
	{
		let name = object.meta().name.clone().unwrap_or_default();
		let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
		let params = PatchParams::apply(FIELD_MANAGER).force();

		api.patch(&name, &params, &Patch::Apply(object))
			.await
			.map_err(|e| Error::Apply {
				kind: K::kind(&()).to_string(),
				namespace: namespace.to_string(),
				name: name.clone(),
				source: Box::new(e),
			})?;

		tracing::debug!(kind = %K::kind(&()), namespace = %namespace, name = %name, "applied");
		Ok(())
	}

	async fn delete_ignoring_not_found<K>(&self, namespace: &str, name: &str) -> Result<(), Error>
	where
		K: Resource<DynamicType = (), Scope = k8s_openapi::NamespaceResourceScope>
			+ Clone
			+ serde::de::DeserializeOwned
			+ std::fmt::Debug,
	{
		let api: Api<K> = Api::namespaced(self.client.clone(), namespace);

		match api.delete(name, &DeleteParams::default()).await {
			Ok(_) => {
				tracing::debug!(kind = %K::kind(&()), namespace = %namespace, name = %name, "deleted");
				Ok(())
			}
			Err(kube::Error::Api(ref err)) if err.code == 404 => {
				tracing::debug!(kind = %K::kind(&()), namespace = %namespace, name = %name, "already gone");
				Ok(())
			}
			Err(e) => Err(Error::Delete {
				kind: K::kind(&()).to_string(),
				namespace: namespace.to_string(),
				name: name.to_string(),
				source: Box::new(e),
			}),
		}
	}
}

impl ManagedResourceClient for KubeManagedResources {
	type Error = Error;

	#[instrument(skip(self, data), fields(entries = data.len()))]
	async fn create_for_shoot(
		&self,
		namespace: &str,
		name: &str,
		origin: &str,
		keep_objects: bool,
		data: BTreeMap<String, Vec<u8>>,
	) -> Result<(), Error> {
		let secret = secret_for_data(namespace, name, data);
		self.apply(namespace, &secret).await?;

		let managed_resource = managed_resource_for_shoot(namespace, name, origin, keep_objects);
		self.apply(namespace, &managed_resource).await
	}

	#[instrument(skip(self))]
	async fn delete_for_shoot(&self, namespace: &str, name: &str) -> Result<(), Error> {
		self.delete_ignoring_not_found::<ManagedResource>(namespace, name)
			.await?;
		self.delete_ignoring_not_found::<Secret>(namespace, &secret_name(name))
			.await
	}
}
