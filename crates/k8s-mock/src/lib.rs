//! Mock Kubernetes API server for testing.
//!
//! Provides an HTTP server that can be used with kubeconfig-based connections
//! and records every request it receives.

mod helpers;
pub mod http;
pub mod resources;

pub use http::{HttpMockK8sServer, MockFailure, RecordedRequest, RunningHttpMockK8sServer};
pub use resources::{KnownResource, KNOWN_RESOURCES};
