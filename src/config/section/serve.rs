//! `[serve]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"     # Network interface (127.0.0.1 = localhost only)
//! port = 3001                 # HTTP port number
//! workers = 4                 # Request handler threads
//! max_body_bytes = 10485760   # Largest accepted request body
//! ```
//!
//! Use `interface = "0.0.0.0"` to make the editor reachable from the LAN.

use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Editor backend server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    pub interface: IpAddr,

    /// HTTP port number.
    pub port: u16,

    /// Number of request handler threads.
    pub workers: usize,

    /// Largest request body accepted, in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 3001,
            workers: 4,
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

impl ServeConfig {
    pub const WORKERS: FieldPath = FieldPath::new("serve.workers");
    pub const MAX_BODY_BYTES: FieldPath = FieldPath::new("serve.max_body_bytes");

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.workers == 0 {
            diag.error(Self::WORKERS, "must be at least 1");
        }
        if self.max_body_bytes == 0 {
            diag.error(Self::MAX_BODY_BYTES, "must be greater than 0");
        }
    }
}
