//! Serialization of typed objects into a managed resource bundle.
//!
//! The bundle is a map from file name to YAML document, which is what ends up
//! in the `data` of the managed resource's Secret.

use std::collections::BTreeMap;

use kube::Resource;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while filling a [`Registry`].
#[derive(Debug, Error)]
pub enum RegistryError {
	#[error("{kind} has no metadata.name")]
	MissingName { kind: String },

	#[error("duplicate filename in registry: {0:?}")]
	DuplicateFilename(String),

	#[error("serializing {file_name}")]
	Serialization {
		file_name: String,
		#[source]
		source: serde_yaml::Error,
	},
}

/// An object that can be stored in a [`Registry`].
///
/// Implemented for every typed Kubernetes resource, so heterogeneous objects
/// can be passed together as `&dyn RegistryObject`.
pub trait RegistryObject {
	/// File name under which the object is stored in the bundle.
	fn file_name(&self) -> Result<String, RegistryError>;

	/// YAML serialization of the object, including `apiVersion` and `kind`.
	fn to_yaml(&self) -> Result<Vec<u8>, serde_yaml::Error>;
}

impl<K> RegistryObject for K
where
	K: Resource<DynamicType = ()> + Serialize,
{
	fn file_name(&self) -> Result<String, RegistryError> {
		let kind = K::kind(&());
		let meta = self.meta();
		let name = meta
			.name
			.as_deref()
			.filter(|name| !name.is_empty())
			.ok_or_else(|| RegistryError::MissingName {
				kind: kind.to_string(),
			})?;
		let namespace = meta.namespace.as_deref().unwrap_or_default();

		Ok(format!(
			"{}__{}__{}.yaml",
			kind.to_lowercase(),
			namespace,
			name.replace(':', "_")
		))
	}

	fn to_yaml(&self) -> Result<Vec<u8>, serde_yaml::Error> {
		serde_yaml::to_string(self).map(String::into_bytes)
	}
}

/// Collects serialized objects keyed by their bundle file name.
#[derive(Debug, Default, Clone)]
pub struct Registry {
	entries: BTreeMap<String, Vec<u8>>,
}

impl Registry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Serialize `object` and add it to the registry.
	pub fn add(&mut self, object: &dyn RegistryObject) -> Result<&mut Self, RegistryError> {
		let file_name = object.file_name()?;
		if self.entries.contains_key(&file_name) {
			return Err(RegistryError::DuplicateFilename(file_name));
		}

		let yaml = object
			.to_yaml()
			.map_err(|source| RegistryError::Serialization {
				file_name: file_name.clone(),
				source,
			})?;

		tracing::trace!(file_name = %file_name, "added object to registry");
		self.entries.insert(file_name, yaml);
		Ok(self)
	}

	/// Add every object in order, then return the bundle.
	pub fn add_all_and_serialize(
		&mut self,
		objects: &[&dyn RegistryObject],
	) -> Result<BTreeMap<String, Vec<u8>>, RegistryError> {
		for object in objects {
			self.add(*object)?;
		}
		tracing::debug!(objects = self.len(), "serialized registry");
		Ok(self.serialize())
	}

	/// The bundle built so far.
	pub fn serialize(&self) -> BTreeMap<String, Vec<u8>> {
		self.entries.clone()
	}

	/// Number of objects added so far.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Whether no object has been added yet.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}
