//! Settings keys the core reads through the store.
//!
//! The settings table is the only configuration surface shared with the
//! outside: provider credentials and the developer-feedback endpoint.

/// Endpoint for fire-and-forget developer telemetry.
pub const DEVELOPER_ENDPOINT: &str = "developer_endpoint";

/// Reported software version, used in telemetry payloads.
pub const VERSION: &str = "version";

/// Stable identifier for this installation.
pub const INSTANCE_ID: &str = "instance_id";

/// Sender id default when `instance_id` is unset.
pub const DEFAULT_SENDER: &str = "aria";

/// Settings key holding the credential for a named provider.
pub fn api_key(provider: &str) -> String {
    format!("api_key_{provider}")
}
