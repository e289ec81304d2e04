//! Common utilities for replica-set document generation
//!
//! Shared constants and host handling used by the member and settings
//! builders and by the reconciliation engine.

/// Port assumed when a member host omits one
pub const DEFAULT_PORT: u16 = 27017;

/// Default election priority of a member
pub const DEFAULT_PRIORITY: f64 = 1.0;

/// Default number of election votes of a member
pub const DEFAULT_VOTES: i32 = 1;

/// Default heartbeat timeout in seconds
pub const DEFAULT_HEARTBEAT_SECS: i64 = 10;

/// Normalize a member host so it always carries a port
///
/// `example.com` becomes `example.com:27017`; `example.com:9999` is unchanged.
/// Surrounding whitespace is dropped.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim();
    if host.contains(':') {
        host.to_string()
    } else {
        format!("{}:{}", host, DEFAULT_PORT)
    }
}

/// Split a normalized host into name and port, if the port is numeric
pub fn split_host_port(host: &str) -> Option<(&str, u16)> {
    let (name, port) = host.rsplit_once(':')?;
    let port = port.parse().ok()?;
    Some((name, port))
}
