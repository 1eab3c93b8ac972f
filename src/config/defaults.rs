//! Default values for configuration options.
//!
//! Centralized constants to avoid magic numbers scattered across the codebase.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Default address the webhook server listens on.
pub const BIND: SocketAddr = SocketAddr::new(std::net::IpAddr::V4(Ipv4Addr::LOCALHOST), 3000);

/// Default media type for outbound request bodies.
pub const CONTENT_TYPE: &str = "application/json";

/// Default outbound connect and read timeout in seconds.
pub const TIMEOUT_SECS: u64 = 30;

/// Default output path of the `init` command.
pub const CONFIG_FILE: &str = "hookgate.toml";

/// Default outbound timeout as Duration.
#[must_use]
pub const fn timeout() -> Duration {
    Duration::from_secs(TIMEOUT_SECS)
}
