//! Helpers for bundling Kubernetes objects into `ManagedResource`s.
//!
//! A managed resource is a named bundle of serialized objects stored in a
//! Secret and referenced by a `resources.gardener.cloud/v1alpha1`
//! `ManagedResource`. Applying and garbage-collecting the bundled objects is
//! the job of an external resource manager; this crate only builds bundles
//! and creates or deletes the two records that carry them.

pub mod client;
pub mod registry;
pub mod resource;

pub use client::{Error, KubeManagedResources, ManagedResourceClient};
pub use registry::{Registry, RegistryError};
pub use resource::{ManagedResource, ManagedResourceSpec, SecretReference};

/// Label recording who created a managed resource.
pub const LABEL_KEY_ORIGIN: &str = "origin";

/// Origin value used for managed resources deployed by gardener components.
pub const LABEL_VALUE_GARDENER: &str = "gardener";

/// Annotation controlling how the resource manager treats a bundled object.
pub const ANNOTATION_MODE: &str = "resources.gardener.cloud/mode";

/// Mode telling the resource manager to leave the object alone.
pub const MODE_IGNORE: &str = "Ignore";

/// Label injected into every object of a shoot managed resource so shoot
/// deletion does not clean it up.
pub const LABEL_SHOOT_NO_CLEANUP: &str = "shoot.gardener.cloud/no-cleanup";

/// Prefix of the Secret holding a managed resource's bundle.
pub const SECRET_NAME_PREFIX: &str = "managedresource-";

/// Name of the Secret backing the managed resource `name`.
pub fn secret_name(name: &str) -> String {
	format!("{SECRET_NAME_PREFIX}{name}")
}
