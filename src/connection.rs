//! The capability contract both backends implement, plus the protocol
//! factory.
//!
//! Callers obtain a boxed [`Connection`] by protocol name and never see
//! which wire format serves them. Each implementation owns its own
//! transport resources; nothing is shared between variants.

use crate::error::{ZmError, ZmResult};
use crate::ftp::FtpConnection;
use crate::types::{ConnectionConfig, JobStatus, Member};
use crate::zosmf::ZosmfConnection;
use async_trait::async_trait;

/// Dataset, file, and job operations against one host.
///
/// Every operation either returns a fully valid result or an error
/// attributable to the operation and its target — never a
/// half-populated result.
#[async_trait]
pub trait Connection: Send {
    async fn connect(&mut self) -> ZmResult<()>;
    async fn close(&mut self) -> ZmResult<()>;

    // Datasets
    async fn list_datasets(&mut self, pattern: &str) -> ZmResult<Vec<String>>;
    async fn list_members(&mut self, dataset: &str) -> ZmResult<Vec<Member>>;
    async fn read_member(&mut self, dataset: &str, member: &str) -> ZmResult<Vec<u8>>;
    async fn write_member(&mut self, dataset: &str, member: &str, content: &[u8])
        -> ZmResult<()>;

    // Filesystem paths
    async fn read_file(&mut self, path: &str) -> ZmResult<Vec<u8>>;
    async fn write_file(&mut self, path: &str, content: &[u8]) -> ZmResult<()>;

    // Jobs
    /// Submit job-control text; returns the host-assigned job id.
    async fn submit_jcl(&mut self, jcl: &[u8]) -> ZmResult<String>;
    async fn job_status(&mut self, jobid: &str) -> ZmResult<JobStatus>;
    async fn job_output(&mut self, jobid: &str) -> ZmResult<Vec<u8>>;
    /// List jobs for `owner`; an empty owner scopes to the configured
    /// username.
    async fn list_jobs(&mut self, owner: &str) -> ZmResult<Vec<JobStatus>>;
}

/// Select a backend by the configured protocol name.
pub fn new_connection(config: ConnectionConfig) -> ZmResult<Box<dyn Connection>> {
    match config.protocol.as_str() {
        "zosmf" => Ok(Box::new(ZosmfConnection::new(config))),
        "ftp" => Ok(Box::new(FtpConnection::new(config))),
        other => Err(ZmError::invalid_config(format!(
            "unsupported protocol: {}",
            other
        ))),
    }
}
