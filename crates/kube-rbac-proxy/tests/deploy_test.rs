//! End-to-end tests of the deployer against a mock Kubernetes API server.

use assert_matches::assert_matches;
use k8s_mock::{HttpMockK8sServer, MockFailure, RunningHttpMockK8sServer};
use kube::{
	config::{KubeConfigOptions, Kubeconfig},
	Client, Config,
};
use kube_rbac_proxy::{DeployError, Deployer, KubeRbacProxy};
use managedresources::KubeManagedResources;

const NAMESPACE: &str = "shoot--foo--bar";
const SECRET_PATH: &str =
	"/api/v1/namespaces/shoot--foo--bar/secrets/managedresource-shoot-node-logging";
const MANAGED_RESOURCE_PATH: &str =
	"/apis/resources.gardener.cloud/v1alpha1/namespaces/shoot--foo--bar/managedresources/shoot-node-logging";

async fn client_for(kubeconfig: Kubeconfig) -> Client {
	let config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
		.await
		.expect("kubeconfig should be valid");
	Client::try_from(config).expect("client should build")
}

async fn deployer_for(server: &RunningHttpMockK8sServer) -> KubeRbacProxy<KubeManagedResources> {
	let client = client_for(server.kubeconfig()).await;
	KubeRbacProxy::new(Some(KubeManagedResources::new(client)), NAMESPACE)
		.expect("valid arguments")
}

fn methods_and_paths(requests: &[k8s_mock::RecordedRequest]) -> Vec<(&str, &str)> {
	requests
		.iter()
		.map(|r| (r.method.as_str(), r.path.as_str()))
		.collect()
}

#[tokio::test]
async fn test_deploy_writes_secret_and_managed_resource() {
	let server = HttpMockK8sServer::builder().build().start().await;
	let deployer = deployer_for(&server).await;

	deployer.deploy().await.expect("deploy should succeed");

	let requests = server.resource_requests().await;
	assert_eq!(
		methods_and_paths(&requests),
		vec![("PATCH", SECRET_PATH), ("PATCH", MANAGED_RESOURCE_PATH)]
	);

	let secret = server.object(SECRET_PATH).expect("secret should exist");
	let mut keys: Vec<_> = secret["data"]
		.as_object()
		.expect("secret should carry data")
		.keys()
		.cloned()
		.collect();
	keys.sort();
	assert_eq!(
		keys,
		vec![
			"clusterrole____gardener.cloud_logging_valitail.yaml",
			"clusterrolebinding____gardener.cloud_logging_kube-rbac-proxy.yaml",
			"clusterrolebinding____gardener.cloud_logging_valitail.yaml",
		]
	);

	let managed_resource = server
		.object(MANAGED_RESOURCE_PATH)
		.expect("managed resource should exist");
	assert_eq!(managed_resource["metadata"]["labels"]["origin"], "gardener");
	assert_eq!(
		managed_resource["spec"]["secretRefs"],
		serde_json::json!([{"name": "managedresource-shoot-node-logging"}])
	);
	assert_eq!(managed_resource["spec"]["keepObjects"], false);
}

#[tokio::test]
async fn test_deploy_twice_is_idempotent() {
	let server = HttpMockK8sServer::builder().build().start().await;
	let deployer = deployer_for(&server).await;

	deployer.deploy().await.expect("first deploy should succeed");
	let first = server.object(SECRET_PATH);
	deployer.deploy().await.expect("second deploy should succeed");

	assert_eq!(server.object(SECRET_PATH), first);
}

#[tokio::test]
async fn test_destroy_removes_both_objects() {
	let server = HttpMockK8sServer::builder().build().start().await;
	let deployer = deployer_for(&server).await;
	deployer.deploy().await.expect("deploy should succeed");

	deployer.destroy().await.expect("destroy should succeed");

	assert_eq!(server.object(SECRET_PATH), None);
	assert_eq!(server.object(MANAGED_RESOURCE_PATH), None);

	let requests = server.resource_requests().await;
	assert_eq!(
		methods_and_paths(&requests[2..]),
		vec![("DELETE", MANAGED_RESOURCE_PATH), ("DELETE", SECRET_PATH)]
	);
}

#[tokio::test]
async fn test_destroy_without_deploy_succeeds() {
	let server = HttpMockK8sServer::builder().build().start().await;
	let deployer = deployer_for(&server).await;

	deployer
		.destroy()
		.await
		.expect("destroying missing objects should succeed");
}

#[tokio::test]
async fn test_deploy_failure_is_passed_through() {
	let server = HttpMockK8sServer::builder()
		.failures(vec![MockFailure::new("PATCH", SECRET_PATH, 500)])
		.build()
		.start()
		.await;
	let deployer = deployer_for(&server).await;

	let result = deployer.deploy().await;

	assert_matches!(
		result,
		Err(DeployError::ManagedResource(managedresources::Error::Apply { ref kind, ref name, .. }))
			if kind == "Secret" && name == "managedresource-shoot-node-logging"
	);
	assert_eq!(server.object(MANAGED_RESOURCE_PATH), None);
}

#[tokio::test]
async fn test_deploy_managed_resource_failure_is_passed_through() {
	let server = HttpMockK8sServer::builder()
		.failures(vec![MockFailure::new("PATCH", MANAGED_RESOURCE_PATH, 500)])
		.build()
		.start()
		.await;
	let deployer = deployer_for(&server).await;

	let result = deployer.deploy().await;

	assert_matches!(
		result,
		Err(DeployError::ManagedResource(managedresources::Error::Apply { ref kind, ref name, .. }))
			if kind == "ManagedResource" && name == "shoot-node-logging"
	);
	assert_eq!(server.resource_requests().await.len(), 2);
}
