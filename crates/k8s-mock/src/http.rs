//! HTTP-based mock Kubernetes server using wiremock.
//!
//! This provides a real HTTP server that can be used with actual kubeconfig-based
//! connections, so code under test goes through the same kube client stack as
//! against a real cluster.

use std::{
	collections::HashMap,
	sync::{Arc, RwLock},
};

use bon::Builder;
use kube::config::{
	AuthInfo, Cluster, Context, Kubeconfig, NamedAuthInfo, NamedCluster, NamedContext,
};
use tracing::{debug, trace};
use wiremock::{
	matchers::{method, path, path_regex},
	Mock, MockServer, Request, ResponseTemplate,
};

use super::{
	helpers::{merge_json, split_object_path, status},
	resources::KnownResource,
};

/// Type alias for the shared mutable resources map, keyed by
/// (collection path, object name).
pub type SharedResources = Arc<RwLock<HashMap<(String, String), serde_json::Value>>>;

/// A request that the server answers with an error instead of serving it.
#[derive(Debug, Clone)]
pub struct MockFailure {
	pub method: String,
	pub path: String,
	pub status: u16,
}

impl MockFailure {
	pub fn new(method: &str, path: impl Into<String>, status: u16) -> Self {
		Self {
			method: method.to_string(),
			path: path.into(),
			status,
		}
	}
}

/// A request received by the mock server.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
	pub method: String,
	pub path: String,
	pub body: Option<serde_json::Value>,
}

/// A mock Kubernetes server exposed over HTTP.
#[derive(Builder)]
pub struct HttpMockK8sServer {
	/// Objects present when the server starts. The server derives API paths
	/// from apiVersion/kind; objects of unknown types are ignored.
	#[builder(default)]
	resources: Vec<serde_json::Value>,
	/// Requests answered with an error status.
	#[builder(default)]
	failures: Vec<MockFailure>,
}

/// A running HTTP mock server instance.
pub struct RunningHttpMockK8sServer {
	server: MockServer,
	resources: SharedResources,
}

impl HttpMockK8sServer {
	/// Start the mock server with all configured resources.
	pub async fn start(self) -> RunningHttpMockK8sServer {
		let server = MockServer::start().await;

		debug!(uri = %server.uri(), "Started mock K8s server");

		let mut resources: HashMap<(String, String), serde_json::Value> = HashMap::new();
		for manifest in self.resources {
			if let Some(key) = key_for_manifest(&manifest) {
				trace!(collection = %key.0, name = %key.1, "Registered resource");
				resources.insert(key, manifest);
			}
		}
		let shared_resources = Arc::new(RwLock::new(resources));

		mount_failures(&server, &self.failures).await;
		mount_version(&server).await;
		mount_resources(&server, &shared_resources).await;

		RunningHttpMockK8sServer {
			server,
			resources: shared_resources,
		}
	}
}

/// Derive the (collection path, name) key for a manifest.
fn key_for_manifest(manifest: &serde_json::Value) -> Option<(String, String)> {
	let api_version = manifest.get("apiVersion")?.as_str()?;
	let kind = manifest.get("kind")?.as_str()?;
	let name = manifest.pointer("/metadata/name")?.as_str()?.to_string();
	let namespace = manifest
		.pointer("/metadata/namespace")
		.and_then(|n| n.as_str());

	let resource = KnownResource::find(api_version, kind)?;
	Some((resource.collection_path(namespace), name))
}

impl RunningHttpMockK8sServer {
	/// Get the server's URI (e.g., "http://127.0.0.1:12345").
	pub fn uri(&self) -> String {
		self.server.uri()
	}

	/// Create a Kubeconfig pointing to this mock server.
	pub fn kubeconfig(&self) -> Kubeconfig {
		self.kubeconfig_with_context("mock-context")
	}

	/// Create a Kubeconfig pointing to this mock server with a custom context name.
	pub fn kubeconfig_with_context(&self, context_name: &str) -> Kubeconfig {
		let cluster_name = "mock-cluster";
		let user_name = "mock-user";

		Kubeconfig {
			clusters: vec![NamedCluster {
				name: cluster_name.to_string(),
				cluster: Some(Cluster {
					server: Some(self.uri()),
					insecure_skip_tls_verify: Some(true),
					..Default::default()
				}),
			}],
			contexts: vec![NamedContext {
				name: context_name.to_string(),
				context: Some(Context {
					cluster: cluster_name.to_string(),
					user: Some(user_name.to_string()),
					namespace: Some("default".to_string()),
					..Default::default()
				}),
			}],
			auth_infos: vec![NamedAuthInfo {
				name: user_name.to_string(),
				auth_info: Some(AuthInfo::default()),
			}],
			current_context: Some(context_name.to_string()),
			..Default::default()
		}
	}

	/// Current state of the object at `object_path`, if present.
	pub fn object(&self, object_path: &str) -> Option<serde_json::Value> {
		let key = split_object_path(object_path);
		self.resources
			.read()
			.ok()
			.and_then(|resources| resources.get(&key).cloned())
	}

	/// Requests received so far against resource endpoints (`/api`, `/apis`),
	/// in arrival order. Discovery and version requests are left out.
	pub async fn resource_requests(&self) -> Vec<RecordedRequest> {
		self.server
			.received_requests()
			.await
			.unwrap_or_default()
			.into_iter()
			.filter(|req| {
				let path = req.url.path();
				path.starts_with("/api/") || path.starts_with("/apis/")
			})
			.map(|req| RecordedRequest {
				method: req.method.to_string(),
				path: req.url.path().to_string(),
				body: serde_json::from_slice(&req.body).ok(),
			})
			.collect()
	}
}

async fn mount_failures(server: &MockServer, failures: &[MockFailure]) {
	for failure in failures {
		Mock::given(method(failure.method.as_str()))
			.and(path(failure.path.as_str()))
			.respond_with(
				ResponseTemplate::new(failure.status).set_body_json(status(
					failure.status,
					"InternalError",
					"injected failure",
				)),
			)
			.with_priority(1)
			.mount(server)
			.await;
	}
}

async fn mount_version(server: &MockServer) {
	Mock::given(method("GET"))
		.and(path("/version"))
		.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
			"major": "1",
			"minor": "31",
			"gitVersion": "v1.31.0",
			"gitCommit": "fake",
			"gitTreeState": "clean",
			"buildDate": "2024-08-13T00:00:00Z",
			"goVersion": "go1.22.5",
			"compiler": "gc",
			"platform": "linux/amd64"
		})))
		.mount(server)
		.await;
}

async fn mount_resources(server: &MockServer, resources: &SharedResources) {
	let patch_resources = Arc::clone(resources);
	let get_resources = Arc::clone(resources);
	let delete_resources = Arc::clone(resources);

	// PATCH endpoints - merge request body into the existing object, creating
	// it when absent (server-side apply semantics are enough for the tests)
	Mock::given(method("PATCH"))
		.and(path_regex(r"^/api(s)?/.*"))
		.respond_with(move |req: &Request| {
			let is_dry_run = req.url.query().unwrap_or("").contains("dryRun");
			let key = split_object_path(req.url.path());

			let patch: serde_json::Value =
				serde_json::from_slice(&req.body).unwrap_or(serde_json::Value::Null);

			let Ok(mut resources) = patch_resources.write() else {
				return ResponseTemplate::new(500).set_body_json(status(
					500,
					"InternalError",
					"resource store poisoned",
				));
			};
			let merged = match resources.get(&key) {
				Some(existing) => merge_json(existing.clone(), patch),
				None => patch,
			};

			if !is_dry_run {
				resources.insert(key, merged.clone());
			}

			ResponseTemplate::new(200).set_body_json(merged)
		})
		.mount(server)
		.await;

	Mock::given(method("GET"))
		.and(path_regex(r"^/api(s)?/.*"))
		.respond_with(move |req: &Request| {
			let key = split_object_path(req.url.path());
			let Ok(resources) = get_resources.read() else {
				return ResponseTemplate::new(500).set_body_json(status(
					500,
					"InternalError",
					"resource store poisoned",
				));
			};

			match resources.get(&key) {
				Some(object) => ResponseTemplate::new(200).set_body_json(object.clone()),
				None => ResponseTemplate::new(404).set_body_json(status(
					404,
					"NotFound",
					&format!("{} not found", key.1),
				)),
			}
		})
		.mount(server)
		.await;

	// DELETE endpoints - remove the object and echo it back
	Mock::given(method("DELETE"))
		.and(path_regex(r"^/api(s)?/.*"))
		.respond_with(move |req: &Request| {
			let key = split_object_path(req.url.path());
			let Ok(mut resources) = delete_resources.write() else {
				return ResponseTemplate::new(500).set_body_json(status(
					500,
					"InternalError",
					"resource store poisoned",
				));
			};

			match resources.remove(&key) {
				Some(object) => ResponseTemplate::new(200).set_body_json(object),
				None => ResponseTemplate::new(404).set_body_json(status(
					404,
					"NotFound",
					&format!("{} not found", key.1),
				)),
			}
		})
		.mount(server)
		.await;
}
