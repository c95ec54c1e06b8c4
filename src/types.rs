//! Shared types for the transport layer.

use serde::{Deserialize, Serialize};

// ─── Connection config ───────────────────────────────────────────────

/// Configuration for a single host connection, independent of backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Backend selector: "ftp" or "zosmf".
    #[serde(default = "default_protocol")]
    pub protocol: String,
    /// TCP connect timeout in seconds.
    #[serde(default = "default_timeout")]
    pub connect_timeout_sec: u64,
    /// Per-command / per-request timeout in seconds. Data-channel reads
    /// run under twice this value.
    #[serde(default = "default_timeout")]
    pub command_timeout_sec: u64,
    /// Accept self-signed certificates on the z/OSMF endpoint.
    #[serde(default = "default_true")]
    pub accept_invalid_certs: bool,
}

fn default_protocol() -> String {
    "ftp".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_true() -> bool {
    true
}

impl ConnectionConfig {
    pub fn new(host: &str, port: u16, username: &str, password: &str, protocol: &str) -> Self {
        Self {
            host: host.to_string(),
            port,
            username: username.to_string(),
            password: password.to_string(),
            protocol: protocol.to_string(),
            connect_timeout_sec: default_timeout(),
            command_timeout_sec: default_timeout(),
            accept_invalid_certs: true,
        }
    }
}

// ─── Partitioned dataset members ─────────────────────────────────────

/// One entry in a partitioned dataset directory listing.
///
/// Always derived from a listing line or a JSON record; a row that cannot
/// be interpreted yields the zero value (empty `name`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub name: String,
    /// Version counter from the VV.MM token.
    pub vv: u32,
    /// Modification counter from the VV.MM token.
    pub mm: u32,
    /// Creation date, as formatted by the host.
    pub created: String,
    /// Last-changed date, optionally followed by a time.
    pub changed: String,
    /// Current record count.
    pub size: u32,
    /// Initial record count.
    pub init: u32,
    /// Modified record count.
    #[serde(rename = "mod")]
    pub mod_records: u32,
    /// Last editor.
    pub user: String,
}

// ─── Jobs ────────────────────────────────────────────────────────────

/// Status of one job known to the job-entry subsystem.
///
/// `status` and `ret_code` are free text from the host (INPUT / ACTIVE /
/// OUTPUT and "CC 0000" / "ABEND S0C7" in practice); unknown values pass
/// through untouched. `ret_code` is empty while the job has not completed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    pub job_id: String,
    pub job_name: String,
    pub owner: String,
    pub status: String,
    pub ret_code: String,
    pub class: String,
}
