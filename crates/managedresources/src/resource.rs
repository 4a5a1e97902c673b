//! The `resources.gardener.cloud/v1alpha1` ManagedResource type.

use std::collections::BTreeMap;

use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// Desired state of a managed resource.
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[kube(
	group = "resources.gardener.cloud",
	version = "v1alpha1",
	kind = "ManagedResource",
	namespaced,
	schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct ManagedResourceSpec {
	/// Resource class responsible for this resource. Unset targets the shoot.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub class: Option<String>,

	/// Secrets holding the bundled objects.
	pub secret_refs: Vec<SecretReference>,

	/// Labels added to every bundled object.
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub inject_labels: BTreeMap<String, String>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub force_overwrite_labels: Option<bool>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub force_overwrite_annotations: Option<bool>,

	/// Keep the bundled objects in the target cluster when the managed
	/// resource is deleted.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub keep_objects: Option<bool>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub delete_persistent_volume_claims: Option<bool>,
}

/// Reference to a Secret in the managed resource's namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SecretReference {
	pub name: String,
}

impl SecretReference {
	pub fn new(name: impl Into<String>) -> Self {
		Self { name: name.into() }
	}
}
