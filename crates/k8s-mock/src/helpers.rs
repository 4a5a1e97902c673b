//! Helper functions for mock Kubernetes testing.

/// Deep merge two JSON values (patch into base).
pub fn merge_json(base: serde_json::Value, patch: serde_json::Value) -> serde_json::Value {
	match (base, patch) {
		(serde_json::Value::Object(mut base_map), serde_json::Value::Object(patch_map)) => {
			for (key, patch_value) in patch_map {
				let base_value = base_map.remove(&key).unwrap_or(serde_json::Value::Null);
				base_map.insert(key, merge_json(base_value, patch_value));
			}
			serde_json::Value::Object(base_map)
		}
		(_, patch) => patch,
	}
}

/// Split an object path into (collection path, object name).
///
/// `/api/v1/namespaces/default/secrets/token` becomes
/// (`/api/v1/namespaces/default/secrets`, `token`).
pub fn split_object_path(path: &str) -> (String, String) {
	let path = path.trim_end_matches('/');
	match path.rsplit_once('/') {
		Some((collection, name)) => (collection.to_string(), name.to_string()),
		None => (path.to_string(), String::new()),
	}
}

/// A `Status` body as returned by the API server.
pub fn status(code: u16, reason: &str, message: &str) -> serde_json::Value {
	serde_json::json!({
		"kind": "Status",
		"apiVersion": "v1",
		"metadata": {},
		"status": if code < 400 { "Success" } else { "Failure" },
		"message": message,
		"reason": reason,
		"code": code
	})
}
