//! Ephemeral JES-mode control client.
//!
//! The host's FTP server doubles as a job-entry-subsystem gateway once
//! `SITE FILETYPE=JES` is accepted: `LIST` then returns the job queue
//! and `RETR <jobid>` the combined spool output. A general-purpose
//! transfer session cannot be switched back and forth safely, so every
//! job query opens its own session and tears it down afterward —
//! repeated handshakes are cheap at this tool's call volume and no
//! stale owner filter can leak between queries.
//!
//! Lifecycle: dial → banner → `USER`/`PASS` → `SITE FILETYPE=JES` →
//! `SITE JESOWNER=<owner>` + `SITE JESJOBNAME=*` → one query → `QUIT`.
//! Any command failure is terminal for the session.

use crate::error::{ZmError, ZmResult};
use crate::ftp::client;
use crate::ftp::codec::FtpCodec;
use crate::ftp::data;
use crate::parser;
use crate::types::{ConnectionConfig, JobStatus};
use std::time::Duration;
use uuid::Uuid;

pub struct JesClient {
    codec: FtpCodec,
    cmd_timeout: Duration,
    session: String,
}

impl JesClient {
    /// Open a fresh session and switch it into JES query mode.
    pub async fn open(config: &ConnectionConfig) -> ZmResult<Self> {
        let session = format!("jes-{}", &Uuid::new_v4().to_string()[..8]);
        let mut codec = client::dial(config, &session).await?;
        client::login(&mut codec, config).await?;
        codec.run("SITE FILETYPE=JES").await?;
        log::debug!("[{}] JES mode entered on {}", session, config.host);

        Ok(Self {
            codec,
            cmd_timeout: Duration::from_secs(config.command_timeout_sec),
            session,
        })
    }

    /// Scope subsequent queries to one owner and disable job-name
    /// filtering.
    pub async fn set_owner(&mut self, owner: &str) -> ZmResult<()> {
        self.codec.run(&format!("SITE JESOWNER={}", owner)).await?;
        self.codec.run("SITE JESJOBNAME=*").await?;
        Ok(())
    }

    /// Retrieve the job queue for the scoped owner.
    pub async fn list_jobs(&mut self) -> ZmResult<Vec<JobStatus>> {
        let lines = self.retr_data("LIST", None).await?;
        Ok(parser::parse_job_lines(&lines))
    }

    /// Retrieve a job's combined spool output.
    pub async fn job_output(&mut self, jobid: &str) -> ZmResult<Vec<u8>> {
        self.codec.run("TYPE A").await?;
        let lines = self.retr_data("RETR", Some(jobid)).await?;
        Ok(lines.join("\n").into_bytes())
    }

    /// Close the session. Best effort — the query already completed.
    pub async fn close(mut self) {
        let _ = self.codec.execute("QUIT").await;
    }

    /// Drive one command over the data channel:
    /// negotiate PASV, dial, issue the command, require the positive-
    /// preliminary (`125`/`150`) reply, drain the data connection, read
    /// the final control reply.
    async fn retr_data(&mut self, cmd: &str, arg: Option<&str>) -> ZmResult<Vec<String>> {
        let pasv = self.codec.run("PASV").await?;
        let addr = data::parse_pasv_reply(&pasv.text())?;
        let data_conn = data::open_data_connection(&addr, self.cmd_timeout).await?;

        let full_cmd = match arg {
            Some(a) => format!("{} {}", cmd, a),
            None => cmd.to_string(),
        };
        let reply = self.codec.execute(&full_cmd).await?;
        if !reply.is_preliminary() {
            return Err(ZmError::command_rejected(
                reply.code,
                format!("{} failed: {}", cmd, reply.text()),
            )
            .with_session(&self.session));
        }

        let lines = data::read_data_lines(data_conn, self.codec.data_deadline()).await?;

        // Some servers drop the control connection instead of sending a
        // completion reply when a job has no spool. Only treat that as
        // an error when nothing at all came over the data channel.
        if let Err(e) = self.codec.read_reply().await {
            if lines.is_empty() {
                return Err(ZmError::not_found(format!("no output available: {}", e.message))
                    .with_session(&self.session));
            }
        }

        Ok(lines)
    }
}
