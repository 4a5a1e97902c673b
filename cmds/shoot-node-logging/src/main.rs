use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser};
use shoot_node_logging::{
	commands::{self, Command},
	config::Settings,
	connection::ClusterConnection,
	telemetry,
};
use tracing::Level;

#[derive(Parser)]
#[command(name = "shoot-node-logging")]
#[command(about = "Manage the deprecated shoot-node-logging managed resource", long_about = None)]
#[command(version)]
struct Cli {
	#[command(flatten)]
	global: GlobalArgs,

	#[command(subcommand)]
	command: Command,
}

#[derive(Args)]
struct GlobalArgs {
	/// YAML file with namespace/kubeconfig/context/apiServer settings
	#[arg(long, global = true)]
	config: Option<PathBuf>,

	/// Namespace of the managed resource
	#[arg(short = 'n', long, global = true)]
	namespace: Option<String>,

	/// Path to the kubeconfig file
	#[arg(long, global = true)]
	kubeconfig: Option<PathBuf>,

	/// Kubeconfig context to use
	#[arg(long, global = true)]
	context: Option<String>,

	/// Use the kubeconfig context whose cluster has this API server URL
	#[arg(long, global = true)]
	api_server: Option<String>,

	/// Log level (trace, debug, info, warn, error). Defaults to $RUST_LOG, then info
	#[arg(long, global = true)]
	log_level: Option<Level>,
}

impl GlobalArgs {
	fn settings(&self) -> Result<Settings> {
		let mut settings = match &self.config {
			Some(path) => Settings::load_from_file(path)?,
			None => Settings::default(),
		};

		settings.merge_from(Settings {
			namespace: self.namespace.clone(),
			kubeconfig: self.kubeconfig.clone(),
			context: self.context.clone(),
			api_server: self.api_server.clone(),
		});

		Ok(settings)
	}
}

fn main() -> Result<()> {
	let cli = Cli::parse();

	telemetry::init(cli.global.log_level)?;

	let settings = cli.global.settings()?;
	let namespace = settings.require_namespace()?.to_string();

	let runtime = tokio::runtime::Builder::new_multi_thread()
		.enable_all()
		.build()
		.context("creating tokio runtime")?;

	runtime.block_on(async {
		let connection = ClusterConnection::from_settings(&settings)
			.await
			.context("connecting to cluster")?;
		commands::run(cli.command, &connection, &namespace).await
	})
}
