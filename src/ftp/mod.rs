//! Legacy FTP backend.
//!
//! Architecture:
//! - `codec` — low-level command/reply codec (CRLF framing, multi-line
//!   replies, per-command timeouts)
//! - `data` — passive-mode address codec and data-channel helpers
//! - `client` — stateful session for dataset and file transfers
//! - `jes` — ephemeral JES-mode control client for job queries
//!
//! Dataset and file operations run over one long-lived session in text
//! transfer mode. Job listing and output retrieval each open their own
//! JES-mode session. Job submission and per-job status lookup cannot be
//! expressed over this protocol and fail with `NotImplemented`.

pub mod client;
pub mod codec;
pub mod data;
pub mod jes;

use crate::connection::Connection;
use crate::error::{ZmError, ZmResult};
use crate::parser;
use crate::types::{ConnectionConfig, JobStatus, Member};
use async_trait::async_trait;
use client::FtpClient;
use jes::JesClient;

/// The FTP-backed implementation of [`Connection`].
pub struct FtpConnection {
    config: ConnectionConfig,
    client: Option<FtpClient>,
}

impl FtpConnection {
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            client: None,
        }
    }

    fn client(&mut self) -> ZmResult<&mut FtpClient> {
        self.client
            .as_mut()
            .ok_or_else(|| ZmError::disconnected("not connected"))
    }

    /// Datasets are addressed in their fully qualified, quoted form.
    fn quoted(dataset: &str) -> String {
        format!("'{}'", dataset.trim_matches('\''))
    }

    async fn jes_session(&self, owner: &str) -> ZmResult<JesClient> {
        let owner = if owner.is_empty() {
            self.config.username.as_str()
        } else {
            owner
        };
        let mut jes = JesClient::open(&self.config).await?;
        jes.set_owner(owner).await?;
        Ok(jes)
    }
}

#[async_trait]
impl Connection for FtpConnection {
    async fn connect(&mut self) -> ZmResult<()> {
        let client = FtpClient::connect(&self.config).await?;
        self.client = Some(client);
        Ok(())
    }

    async fn close(&mut self) -> ZmResult<()> {
        if let Some(mut client) = self.client.take() {
            client.quit().await;
        }
        Ok(())
    }

    // ─── Datasets ────────────────────────────────────────────────

    async fn list_datasets(&mut self, pattern: &str) -> ZmResult<Vec<String>> {
        let query = format!("'{}.*'", pattern.trim_matches('\''));
        self.client()?
            .name_list(&query)
            .await
            .map_err(|e| e.context(format!("failed to list datasets {}", query)))
    }

    async fn list_members(&mut self, dataset: &str) -> ZmResult<Vec<Member>> {
        let dsn = Self::quoted(dataset);
        let client = self.client()?;
        client
            .cwd(&dsn)
            .await
            .map_err(|e| e.context(format!("failed to access dataset {}", dsn)))?;
        let body = client
            .list()
            .await
            .map_err(|e| e.context(format!("failed to list members of {}", dsn)))?;
        Ok(parser::parse_member_listing(&body))
    }

    async fn read_member(&mut self, dataset: &str, member: &str) -> ZmResult<Vec<u8>> {
        let target = format!("'{}({})'", dataset.trim_matches('\''), member);
        self.client()?
            .retrieve(&target)
            .await
            .map_err(|e| e.context(format!("failed to read {}", target)))
    }

    async fn write_member(&mut self, dataset: &str, member: &str, content: &[u8]) -> ZmResult<()> {
        let target = format!("'{}({})'", dataset.trim_matches('\''), member);
        self.client()?
            .store(&target, content)
            .await
            .map_err(|e| e.context(format!("failed to write {}", target)))
    }

    // ─── Files ───────────────────────────────────────────────────

    async fn read_file(&mut self, path: &str) -> ZmResult<Vec<u8>> {
        self.client()?
            .retrieve(path)
            .await
            .map_err(|e| e.context(format!("failed to read {}", path)))
    }

    async fn write_file(&mut self, path: &str, content: &[u8]) -> ZmResult<()> {
        self.client()?
            .store(path, content)
            .await
            .map_err(|e| e.context(format!("failed to write {}", path)))
    }

    // ─── Jobs ────────────────────────────────────────────────────

    async fn submit_jcl(&mut self, _jcl: &[u8]) -> ZmResult<String> {
        Err(ZmError::not_implemented(
            "job submission is not supported over FTP; use the zosmf protocol",
        ))
    }

    async fn job_status(&mut self, _jobid: &str) -> ZmResult<JobStatus> {
        Err(ZmError::not_implemented(
            "job status lookup is not supported over FTP; use the zosmf protocol",
        ))
    }

    async fn job_output(&mut self, jobid: &str) -> ZmResult<Vec<u8>> {
        let mut jes = self.jes_session("").await?;
        let result = jes
            .job_output(jobid)
            .await
            .map_err(|e| e.context(format!("failed to read output of job {}", jobid)));
        jes.close().await;
        result
    }

    async fn list_jobs(&mut self, owner: &str) -> ZmResult<Vec<JobStatus>> {
        let mut jes = self.jes_session(owner).await?;
        let result = jes
            .list_jobs()
            .await
            .map_err(|e| e.context("failed to list jobs"));
        jes.close().await;
        result
    }
}
