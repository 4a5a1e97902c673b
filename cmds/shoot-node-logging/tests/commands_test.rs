//! Integration tests for cluster connection and commands using the HTTP mock server.

use assert_matches::assert_matches;
use k8s_mock::{HttpMockK8sServer, MockFailure};
use shoot_node_logging::{
	commands::{self, Command},
	config::Settings,
	connection::{ClusterConnection, ConnectionError},
};

const MANAGED_RESOURCE_PATH: &str =
	"/apis/resources.gardener.cloud/v1alpha1/namespaces/garden/managedresources/shoot-node-logging";

#[tokio::test]
async fn test_connect_with_api_server() {
	let server = HttpMockK8sServer::builder().build().start().await;

	let settings = Settings {
		api_server: Some(server.uri()),
		..Settings::default()
	};

	let conn = ClusterConnection::from_kubeconfig(&settings, server.kubeconfig())
		.await
		.expect("connection should succeed");

	assert_eq!(conn.server_version().git_version, "v1.31.0");
	assert_eq!(
		conn.cluster_identifier(),
		format!("{}  (context:mock-context)", server.uri())
	);
}

#[tokio::test]
async fn test_connect_with_context() {
	let server = HttpMockK8sServer::builder().build().start().await;

	let settings = Settings {
		context: Some("other".to_string()),
		..Settings::default()
	};

	let conn = ClusterConnection::from_kubeconfig(&settings, server.kubeconfig_with_context("other"))
		.await
		.expect("connection should succeed");

	assert_eq!(conn.cluster_identifier(), "context:other");
}

#[tokio::test]
async fn test_connect_with_current_context() {
	let server = HttpMockK8sServer::builder().build().start().await;

	let conn = ClusterConnection::from_kubeconfig(&Settings::default(), server.kubeconfig())
		.await
		.expect("connection should succeed");

	assert_eq!(conn.cluster_identifier(), "context:mock-context");
}

#[tokio::test]
async fn test_cli_api_server_overrides_file_context() {
	let server = HttpMockK8sServer::builder().build().start().await;

	let mut settings = Settings {
		context: Some("file-context".to_string()),
		..Settings::default()
	};
	settings.merge_from(Settings {
		api_server: Some(server.uri()),
		..Settings::default()
	});

	let conn = ClusterConnection::from_kubeconfig(&settings, server.kubeconfig())
		.await
		.expect("connection should succeed");

	assert_eq!(
		conn.cluster_identifier(),
		format!("{}  (context:mock-context)", server.uri())
	);
}

#[tokio::test]
async fn test_connect_context_not_found() {
	let server = HttpMockK8sServer::builder().build().start().await;

	let settings = Settings {
		context: Some("nonexistent-context".to_string()),
		..Settings::default()
	};

	let result = ClusterConnection::from_kubeconfig(&settings, server.kubeconfig()).await;
	assert_matches!(
		result,
		Err(ConnectionError::ContextNotFound(context)) if context == "nonexistent-context"
	);
}

#[tokio::test]
async fn test_deploy_then_destroy() {
	let server = HttpMockK8sServer::builder().build().start().await;
	let conn = ClusterConnection::from_kubeconfig(&Settings::default(), server.kubeconfig())
		.await
		.expect("connection should succeed");

	commands::run(Command::Deploy, &conn, "garden")
		.await
		.expect("deploy should succeed");
	assert!(server.object(MANAGED_RESOURCE_PATH).is_some());

	commands::run(Command::Destroy, &conn, "garden")
		.await
		.expect("destroy should succeed");
	assert_eq!(server.object(MANAGED_RESOURCE_PATH), None);
}

#[tokio::test]
async fn test_empty_namespace_rejected() {
	let server = HttpMockK8sServer::builder().build().start().await;
	let conn = ClusterConnection::from_kubeconfig(&Settings::default(), server.kubeconfig())
		.await
		.expect("connection should succeed");

	let err = commands::run(Command::Deploy, &conn, "")
		.await
		.expect_err("empty namespace should fail");

	assert_eq!(
		format!("{err:#}"),
		"creating kube-rbac-proxy deployer: namespace cannot be empty"
	);
	assert!(server.resource_requests().await.is_empty());
}

#[tokio::test]
async fn test_deploy_failure_names_managed_resource() {
	let server = HttpMockK8sServer::builder()
		.failures(vec![MockFailure::new("PATCH", MANAGED_RESOURCE_PATH, 500)])
		.build()
		.start()
		.await;
	let conn = ClusterConnection::from_kubeconfig(&Settings::default(), server.kubeconfig())
		.await
		.expect("connection should succeed");

	let err = commands::run(Command::Deploy, &conn, "garden")
		.await
		.expect_err("deploy should fail");

	assert_eq!(
		err.to_string(),
		"deploying managed resource garden/shoot-node-logging"
	);
}
