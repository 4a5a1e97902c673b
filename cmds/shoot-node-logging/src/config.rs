//! Configuration file support.
//!
//! Every setting can come from a YAML file passed with `--config` or from the
//! command line; command line values win.

use std::{
	fs,
	path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Settings for a deploy or destroy run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Settings {
	/// Namespace the managed resource lives in.
	#[serde(default)]
	pub namespace: Option<String>,

	/// Kubeconfig file to read instead of the default lookup.
	#[serde(default)]
	pub kubeconfig: Option<PathBuf>,

	/// Kubeconfig context to use.
	#[serde(default)]
	pub context: Option<String>,

	/// API server URL; the context is looked up from the kubeconfig cluster
	/// with this server.
	#[serde(default)]
	pub api_server: Option<String>,
}

impl Settings {
	/// Load settings from a YAML file.
	pub fn load_from_file(path: &Path) -> Result<Self> {
		let content = fs::read_to_string(path)
			.with_context(|| format!("failed to read config file: {}", path.display()))?;
		let settings: Settings = serde_yaml::from_str(&content)
			.with_context(|| format!("failed to parse config file: {}", path.display()))?;
		Ok(settings)
	}

	/// Override fields of `self` with the ones set in `overrides`.
	pub fn merge_from(&mut self, overrides: Settings) {
		if overrides.namespace.is_some() {
			self.namespace = overrides.namespace;
		}
		if overrides.kubeconfig.is_some() {
			self.kubeconfig = overrides.kubeconfig;
		}
		if overrides.context.is_some() {
			self.context = overrides.context;
		}
		if overrides.api_server.is_some() {
			self.api_server = overrides.api_server;
		}
	}

	/// The namespace, which must be set somewhere.
	pub fn require_namespace(&self) -> Result<&str> {
		self.namespace
			.as_deref()
			.filter(|ns| !ns.is_empty())
			.context("namespace is required (--namespace or `namespace` in the config file)")
	}
}
