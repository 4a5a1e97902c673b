//! Kubernetes cluster connection management.

use std::time::Duration;

use k8s_openapi::apimachinery::pkg::version::Info;
use kube::{
	config::{InferConfigError, KubeConfigOptions, Kubeconfig, KubeconfigError},
	Client, Config,
};
use thiserror::Error;
use tracing::instrument;

use crate::config::Settings;

/// Default timeout for Kubernetes API requests.
const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur when connecting to a Kubernetes cluster.
#[derive(Debug, Error)]
pub enum ConnectionError {
	#[error(
		"no cluster that matches the apiServer `{0}` was found. Please check your $KUBECONFIG"
	)]
	ClusterNotFound(String),

	#[error("no context using cluster `{0}` was found. Please check your $KUBECONFIG")]
	ContextNotFoundForCluster(String),

	#[error("no context named `{0}` was found. Please check your $KUBECONFIG")]
	ContextNotFound(String),

	#[error(transparent)]
	Kubeconfig(#[from] KubeconfigError),

	#[error(transparent)]
	InferConfig(#[from] InferConfigError),

	#[error(transparent)]
	Kube(#[from] kube::Error),
}

/// Represents a connection to a Kubernetes cluster.
#[derive(Clone)]
pub struct ClusterConnection {
	client: Client,
	server_version: Info,
	/// Human-readable identifier for the cluster (context name or API server URL).
	cluster_identifier: String,
}

impl std::fmt::Debug for ClusterConnection {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ClusterConnection")
			.field("cluster_identifier", &self.cluster_identifier)
			.field("server_version", &self.server_version)
			.finish_non_exhaustive()
	}
}

impl ClusterConnection {
	/// Connect using the kubeconfig and cluster selection in `settings`.
	///
	/// Without any selection and without an explicit kubeconfig file, the
	/// configuration is inferred (`$KUBECONFIG`, `~/.kube/config` or the
	/// in-cluster service account).
	#[instrument(skip_all)]
	pub async fn from_settings(settings: &Settings) -> Result<Self, ConnectionError> {
		if let Some(path) = &settings.kubeconfig {
			let kubeconfig = Kubeconfig::read_from(path)?;
			return Self::from_kubeconfig(settings, kubeconfig).await;
		}

		if settings.context.is_some() || settings.api_server.is_some() {
			let kubeconfig = Kubeconfig::read()?;
			return Self::from_kubeconfig(settings, kubeconfig).await;
		}

		let config = Config::infer().await?;
		let identifier = config.cluster_url.to_string();
		Self::connect(config, identifier).await
	}

	/// Connect using the cluster selection in `settings` and a provided kubeconfig.
	///
	/// - `api_server`: searches kubeconfig for a cluster with matching server URL,
	///   then uses a context that references that cluster; `context` is ignored
	/// - `context`: uses the named context
	/// - neither: uses the kubeconfig's current context
	#[instrument(skip_all)]
	pub async fn from_kubeconfig(
		settings: &Settings,
		kubeconfig: Kubeconfig,
	) -> Result<Self, ConnectionError> {
		let (context, identifier) = match (&settings.api_server, &settings.context) {
			(Some(api_server), _) => {
				let context_name = find_context_for_api_server(&kubeconfig, api_server)?;
				tracing::debug!(
					context = %context_name,
					api_server = %api_server,
					"found context for apiServer"
				);
				let identifier = format!("{}  (context:{})", api_server, context_name);
				(Some(context_name), identifier)
			}
			(None, Some(context_name)) => {
				if !kubeconfig.contexts.iter().any(|c| &c.name == context_name) {
					return Err(ConnectionError::ContextNotFound(context_name.clone()));
				}
				(
					Some(context_name.clone()),
					format!("context:{}", context_name),
				)
			}
			(None, None) => {
				let current = kubeconfig.current_context.clone().unwrap_or_default();
				(None, format!("context:{}", current))
			}
		};

		let config = Config::from_custom_kubeconfig(
			kubeconfig,
			&KubeConfigOptions {
				context,
				..Default::default()
			},
		)
		.await?;

		Self::connect(config, identifier).await
	}

	async fn connect(mut config: Config, cluster_identifier: String) -> Result<Self, ConnectionError> {
		config.read_timeout = Some(DEFAULT_API_TIMEOUT);
		let client = Client::try_from(config)?;

		let server_version = client.apiserver_version().await?;
		tracing::info!(
			cluster = %cluster_identifier,
			version = %server_version.git_version,
			"connected to cluster"
		);

		Ok(Self {
			client,
			server_version,
			cluster_identifier,
		})
	}

	/// Get a reference to the underlying kube client.
	pub fn client(&self) -> &Client {
		&self.client
	}

	/// Get the server version.
	pub fn server_version(&self) -> &Info {
		&self.server_version
	}

	/// Get the cluster identifier (context name or API server URL).
	pub fn cluster_identifier(&self) -> &str {
		&self.cluster_identifier
	}
}

/// Find a kubeconfig context that uses a cluster with the given API server URL.
fn find_context_for_api_server(
	kubeconfig: &Kubeconfig,
	api_server: &str,
) -> Result<String, ConnectionError> {
	let matching_cluster = kubeconfig
		.clusters
		.iter()
		.find(|c| {
			c.cluster
				.as_ref()
				.is_some_and(|cluster| cluster.server.as_deref() == Some(api_server))
		})
		.ok_or_else(|| ConnectionError::ClusterNotFound(api_server.to_string()))?;

	let cluster_name = &matching_cluster.name;

	let matching_context = kubeconfig
		.contexts
		.iter()
		.find(|c| {
			c.context
				.as_ref()
				.is_some_and(|ctx| ctx.cluster.as_str() == cluster_name)
		})
		.ok_or_else(|| ConnectionError::ContextNotFoundForCluster(cluster_name.clone()))?;

	Ok(matching_context.name.clone())
}
