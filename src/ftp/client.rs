//! Stateful FTP session — owns the control connection and drives the
//! dataset and file operations.
//!
//! Lifecycle: dial → banner → `USER`/`PASS` → ready. Text transfers set
//! `TYPE A` first so the host converts its native encoding on the wire.

use crate::error::{ZmError, ZmResult};
use crate::ftp::codec::{FtpCodec, FtpReply};
use crate::ftp::data;
use crate::types::ConnectionConfig;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use uuid::Uuid;

/// A connected FTP session against the host.
pub struct FtpClient {
    pub id: String,
    codec: FtpCodec,
    cmd_timeout: Duration,
}

impl FtpClient {
    /// Dial the control connection, read the banner, and authenticate.
    pub async fn connect(config: &ConnectionConfig) -> ZmResult<Self> {
        if config.host.is_empty() {
            return Err(ZmError::invalid_config("host must not be empty"));
        }

        let session = Uuid::new_v4().to_string()[..8].to_string();
        let cmd_timeout = Duration::from_secs(config.command_timeout_sec);
        let mut codec = dial(config, &session).await?;

        login(&mut codec, config).await.map_err(|e| {
            ZmError::auth_failed(format!("login failed: {}", e.message)).with_session(&session)
        })?;
        log::debug!("[{}] logged in to {}:{}", session, config.host, config.port);

        Ok(Self {
            id: session,
            codec,
            cmd_timeout,
        })
    }

    // ─── Control commands ────────────────────────────────────────

    /// Select text transfer mode so the host translates its encoding.
    pub async fn set_text_mode(&mut self) -> ZmResult<()> {
        self.codec.run("TYPE A").await?;
        Ok(())
    }

    /// Change into a dataset or directory.
    pub async fn cwd(&mut self, path: &str) -> ZmResult<()> {
        self.codec.run(&format!("CWD {}", path)).await?;
        Ok(())
    }

    /// Gracefully close the session. QUIT failures are ignored — the
    /// socket is going away either way.
    pub async fn quit(&mut self) {
        let _ = self.codec.execute("QUIT").await;
    }

    // ─── Data-channel operations ─────────────────────────────────

    /// Negotiate a passive-mode data connection.
    async fn open_data_channel(&mut self) -> ZmResult<TcpStream> {
        let reply = self.codec.run("PASV").await?;
        let addr = data::parse_pasv_reply(&reply.text())?;
        data::open_data_connection(&addr, self.cmd_timeout).await
    }

    /// Issue a retrieval-style command and require the positive-
    /// preliminary "transfer starting" reply (125/150).
    async fn start_transfer(&mut self, cmd: &str) -> ZmResult<FtpReply> {
        let reply = self.codec.execute(cmd).await?;
        if !reply.is_preliminary() {
            return Err(ZmError::from_reply(reply.code, &reply.text()).with_session(&self.id));
        }
        Ok(reply)
    }

    /// Read the completion reply that follows a data transfer.
    async fn finish_transfer(&mut self) -> ZmResult<()> {
        let done = self.codec.read_reply().await?;
        if !done.is_success() {
            return Err(ZmError::from_reply(done.code, &done.text()).with_session(&self.id));
        }
        Ok(())
    }

    /// `NLST <arg>` — name-only listing, one entry per line.
    pub async fn name_list(&mut self, arg: &str) -> ZmResult<Vec<String>> {
        let ds = self.open_data_channel().await?;
        self.start_transfer(&format!("NLST {}", arg)).await?;
        let lines = data::read_data_lines(ds, self.codec.data_deadline()).await?;
        self.finish_transfer().await?;
        Ok(lines
            .into_iter()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect())
    }

    /// `LIST` — full listing of the current directory, raw text.
    pub async fn list(&mut self) -> ZmResult<String> {
        let ds = self.open_data_channel().await?;
        self.start_transfer("LIST").await?;
        let lines = data::read_data_lines(ds, self.codec.data_deadline()).await?;
        self.finish_transfer().await?;
        Ok(lines.join("\n"))
    }

    /// `RETR <path>` — fetch remote content as bytes.
    pub async fn retrieve(&mut self, path: &str) -> ZmResult<Vec<u8>> {
        self.set_text_mode().await?;
        let ds = self.open_data_channel().await?;
        self.start_transfer(&format!("RETR {}", path)).await?;
        let body = data::read_data_to_end(ds, self.codec.data_deadline()).await?;
        self.finish_transfer().await?;
        Ok(body)
    }

    /// `STOR <path>` — write content to a remote path.
    pub async fn store(&mut self, path: &str, content: &[u8]) -> ZmResult<()> {
        self.set_text_mode().await?;
        let ds = self.open_data_channel().await?;
        self.start_transfer(&format!("STOR {}", path)).await?;
        data::write_data(ds, content, self.codec.data_deadline()).await?;
        self.finish_transfer().await
    }
}

// ─── Shared session plumbing ─────────────────────────────────────────

/// Dial the control connection and read the welcome banner.
pub(crate) async fn dial(config: &ConnectionConfig, session: &str) -> ZmResult<FtpCodec> {
    let addr = format!("{}:{}", config.host, config.port);
    let dial_timeout = Duration::from_secs(config.connect_timeout_sec);

    let tcp = timeout(dial_timeout, TcpStream::connect(&addr))
        .await
        .map_err(|_| ZmError::timeout(format!("connect to {} timed out", addr)))?
        .map_err(|e| ZmError::connection_failed(format!("connect to {}: {}", addr, e)))?;
    tcp.set_nodelay(true).ok();

    let mut codec = FtpCodec::new(
        tcp,
        Duration::from_secs(config.command_timeout_sec),
        session,
    );

    let banner = codec.read_reply().await?;
    if !banner.is_success() {
        return Err(ZmError::connection_failed(format!(
            "server refused session: {}",
            banner.text()
        )));
    }
    Ok(codec)
}

/// `USER`/`PASS` exchange. A 331 intermediate reply asks for the
/// password; anything else successful means no password was needed.
pub(crate) async fn login(codec: &mut FtpCodec, config: &ConnectionConfig) -> ZmResult<()> {
    let user_reply = codec.run(&format!("USER {}", config.username)).await?;
    if user_reply.code == 331 {
        codec.run(&format!("PASS {}", config.password)).await?;
    }
    Ok(())
}
