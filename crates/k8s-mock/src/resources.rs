//! API paths of the resource types the mock server knows about.

/// A resource type served by the mock server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownResource {
	pub api_version: &'static str,
	pub kind: &'static str,
	/// Plural name used in the URL.
	pub plural: &'static str,
	pub namespaced: bool,
}

pub const KNOWN_RESOURCES: &[KnownResource] = &[
	KnownResource {
		api_version: "v1",
		kind: "Namespace",
		plural: "namespaces",
		namespaced: false,
	},
	KnownResource {
		api_version: "v1",
		kind: "ConfigMap",
		plural: "configmaps",
		namespaced: true,
	},
	KnownResource {
		api_version: "v1",
		kind: "Secret",
		plural: "secrets",
		namespaced: true,
	},
	KnownResource {
		api_version: "rbac.authorization.k8s.io/v1",
		kind: "ClusterRole",
		plural: "clusterroles",
		namespaced: false,
	},
	KnownResource {
		api_version: "rbac.authorization.k8s.io/v1",
		kind: "ClusterRoleBinding",
		plural: "clusterrolebindings",
		namespaced: false,
	},
	KnownResource {
		api_version: "resources.gardener.cloud/v1alpha1",
		kind: "ManagedResource",
		plural: "managedresources",
		namespaced: true,
	},
];

impl KnownResource {
	/// Look up a resource type by `apiVersion` and `kind`.
	pub fn find(api_version: &str, kind: &str) -> Option<&'static KnownResource> {
		KNOWN_RESOURCES
			.iter()
			.find(|r| r.api_version == api_version && r.kind == kind)
	}

	/// Collection path for this resource type.
	///
	/// `namespace` is ignored for cluster-scoped types and defaults to
	/// `default` for namespaced ones.
	pub fn collection_path(&self, namespace: Option<&str>) -> String {
		let prefix = if self.api_version.contains('/') {
			format!("/apis/{}", self.api_version)
		} else {
			format!("/api/{}", self.api_version)
		};

		if self.namespaced {
			format!(
				"{}/namespaces/{}/{}",
				prefix,
				namespace.unwrap_or("default"),
				self.plural
			)
		} else {
			format!("{}/{}", prefix, self.plural)
		}
	}

	/// Path of the object `name` of this resource type.
	pub fn object_path(&self, namespace: Option<&str>, name: &str) -> String {
		format!("{}/{}", self.collection_path(namespace), name)
	}
}
