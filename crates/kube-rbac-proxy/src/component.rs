//! Lifecycle seam shared by deployable components.

use std::future::Future;

/// A component that can be deployed into and removed from a cluster.
pub trait Deployer {
	type Error: std::error::Error + Send + Sync + 'static;

	/// Create or update everything the component owns.
	fn deploy(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;

	/// Remove everything the component owns.
	fn destroy(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
