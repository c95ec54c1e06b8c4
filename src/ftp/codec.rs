//! Low-level command/reply codec for the legacy control connection.
//!
//! Handles:
//! - Sending commands terminated with `\r\n`
//! - Reading single-line and multi-line replies (RFC 959 framing: a
//!   first line `NNN-...` opens a multi-line reply that ends at a line
//!   beginning `NNN<space>`)
//! - Parsing the 3-digit reply code
//!
//! Every send and every line read runs under the configured command
//! timeout, renewed per operation, so a hung server cannot block the
//! caller indefinitely.

use crate::error::{ZmError, ZmResult};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// A single control-channel reply (may be multi-line).
#[derive(Debug, Clone)]
pub struct FtpReply {
    pub code: u16,
    pub lines: Vec<String>,
}

impl FtpReply {
    /// Full reply text (all lines joined).
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Whether the reply code indicates success (1xx-3xx).
    pub fn is_success(&self) -> bool {
        self.code < 400
    }

    /// Whether this is a positive-preliminary reply (1xx).
    pub fn is_preliminary(&self) -> bool {
        (100..200).contains(&self.code)
    }
}

/// The command/reply codec operating on split halves of the control
/// connection.
pub struct FtpCodec {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    cmd_timeout: Duration,
    session: String,
}

impl FtpCodec {
    pub fn new(stream: TcpStream, cmd_timeout: Duration, session: &str) -> Self {
        let (rd, wr) = stream.into_split();
        Self {
            reader: BufReader::new(rd),
            writer: wr,
            cmd_timeout,
            session: session.to_string(),
        }
    }

    /// Deadline applied to data-channel reads: twice the command timeout.
    pub fn data_deadline(&self) -> Duration {
        self.cmd_timeout * 2
    }

    /// Send a raw command (without trailing CRLF — we add it).
    pub async fn send_command(&mut self, cmd: &str) -> ZmResult<()> {
        let line = format!("{}\r\n", cmd);
        timeout(self.cmd_timeout, self.writer.write_all(line.as_bytes()))
            .await
            .map_err(|_| {
                ZmError::timeout(format!("send '{}' timed out", command_name(cmd)))
                    .with_session(&self.session)
            })??;
        log::trace!("[{}] >>> {}", self.session, mask_secret(cmd));
        Ok(())
    }

    /// Read a single line from the control channel.
    async fn read_line_raw(&mut self) -> ZmResult<String> {
        let mut buf = String::new();
        let n = timeout(self.cmd_timeout, self.reader.read_line(&mut buf))
            .await
            .map_err(|_| {
                ZmError::timeout("control reply timed out").with_session(&self.session)
            })??;
        if n == 0 {
            return Err(ZmError::disconnected("server closed control connection")
                .with_session(&self.session));
        }
        Ok(buf)
    }

    /// Read a complete reply.
    ///
    /// Multi-line replies look like:
    /// ```text
    /// 220-Welcome
    /// 220-Line 2
    /// 220 Ready
    /// ```
    pub async fn read_reply(&mut self) -> ZmResult<FtpReply> {
        let first = self.read_line_raw().await?;
        let first_trimmed = first.trim_end_matches(|c| c == '\r' || c == '\n');

        if first_trimmed.len() < 3 {
            return Err(ZmError::protocol_error(format!(
                "reply too short: '{}'",
                first_trimmed
            ))
            .with_session(&self.session));
        }

        let code = parse_code(first_trimmed)?;
        let mut lines = vec![first_trimmed.to_string()];

        // "NNN-" means more lines follow until "NNN " is seen.
        let is_multi = first_trimmed.len() >= 4 && first_trimmed.as_bytes()[3] == b'-';
        if is_multi {
            let terminator = format!("{} ", code);
            loop {
                let next = self.read_line_raw().await?;
                let next_trimmed = next.trim_end_matches(|c| c == '\r' || c == '\n');
                lines.push(next_trimmed.to_string());
                if next_trimmed.starts_with(&terminator) {
                    break;
                }
            }
        }

        let reply = FtpReply { code, lines };
        log::trace!(
            "[{}] <<< {} {}",
            self.session,
            reply.code,
            reply.lines.last().map(String::as_str).unwrap_or("")
        );
        Ok(reply)
    }

    /// Send a command and return its reply, whatever the code.
    pub async fn execute(&mut self, cmd: &str) -> ZmResult<FtpReply> {
        self.send_command(cmd).await?;
        self.read_reply().await
    }

    /// Send a command; a 4xx/5xx reply is surfaced as an error carrying
    /// the full reply text.
    pub async fn run(&mut self, cmd: &str) -> ZmResult<FtpReply> {
        let reply = self.execute(cmd).await?;
        if !reply.is_success() {
            return Err(
                ZmError::from_reply(reply.code, &reply.text()).with_session(&self.session)
            );
        }
        Ok(reply)
    }
}

/// Parse the 3-digit reply code from the start of a line.
fn parse_code(line: &str) -> ZmResult<u16> {
    // `get` rather than a slice: the length guard counts bytes, so a
    // multi-byte character straddling index 3 must not panic here.
    line.get(..3)
        .and_then(|prefix| prefix.parse::<u16>().ok())
        .ok_or_else(|| ZmError::protocol_error(format!("invalid reply code in: '{}'", line)))
}

/// The command verb, for error messages.
fn command_name(cmd: &str) -> &str {
    cmd.split_whitespace().next().unwrap_or(cmd)
}

/// Never let credentials reach the log.
fn mask_secret(cmd: &str) -> &str {
    if cmd.starts_with("PASS ") {
        "PASS ****"
    } else {
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_code_classes() {
        let prelim = FtpReply {
            code: 125,
            lines: vec!["125 List started".into()],
        };
        assert!(prelim.is_preliminary());
        assert!(prelim.is_success());

        let err = FtpReply {
            code: 550,
            lines: vec!["550 No such dataset".into()],
        };
        assert!(!err.is_success());
        assert!(!err.is_preliminary());
    }

    #[test]
    fn reply_code_parses_from_line_start() {
        assert_eq!(parse_code("220 Ready").unwrap(), 220);
        assert_eq!(parse_code("550-No such dataset").unwrap(), 550);
    }

    #[test]
    fn garbage_reply_code_is_a_protocol_error() {
        assert!(parse_code("abc Ready").is_err());
        // Multi-byte character straddling the code boundary must error,
        // not panic.
        assert!(parse_code("a\u{20ac}x").is_err());
        assert!(parse_code("\u{20ac}\u{20ac}\u{20ac}").is_err());
    }

    #[test]
    fn masks_password_only() {
        assert_eq!(mask_secret("PASS hunter2"), "PASS ****");
        assert_eq!(mask_secret("USER fred"), "USER fred");
    }
}
