//! Transport-specific error type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Categorised transport error, shared by both backends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZmError {
    pub kind: ZmErrorKind,
    pub message: String,
    /// FTP reply code or HTTP status that triggered the error, if any.
    pub code: Option<u16>,
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ZmErrorKind {
    /// TCP dial / DNS resolution failure.
    ConnectionFailed,
    /// Wrong username/password.
    AuthFailed,
    /// Server returned a 4xx/5xx reply for a command.
    CommandRejected,
    /// Data channel could not be established (PASV failed).
    DataChannelFailed,
    /// Server sent an un-parseable reply.
    ProtocolError,
    /// HTTP request failed or returned a non-success status.
    HttpError,
    /// An I/O error on the local side.
    IoError,
    /// Operation timed out.
    Timeout,
    /// Session is disconnected / was never opened.
    Disconnected,
    /// Dataset, member, job, or path does not exist on the host.
    NotFound,
    /// The active backend cannot express this operation.
    NotImplemented,
    /// Config / parameter validation error.
    InvalidConfig,
    /// Catch-all.
    Unknown,
}

pub type ZmResult<T> = Result<T, ZmError>;

// ── Construction helpers ─────────────────────────────────────────────

impl ZmError {
    pub fn new(kind: ZmErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
            code: None,
            session_id: None,
        }
    }

    pub fn with_code(mut self, code: u16) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_session(mut self, id: impl Into<String>) -> Self {
        self.session_id = Some(id.into());
        self
    }

    /// Prefix the message with the failing operation and its target.
    pub fn context(mut self, ctx: impl AsRef<str>) -> Self {
        self.message = format!("{}: {}", ctx.as_ref(), self.message);
        self
    }

    // ── Convenience constructors ─────────────────────────────────

    pub fn connection_failed(msg: impl Into<String>) -> Self {
        Self::new(ZmErrorKind::ConnectionFailed, msg)
    }

    pub fn auth_failed(msg: impl Into<String>) -> Self {
        Self::new(ZmErrorKind::AuthFailed, msg)
    }

    pub fn command_rejected(code: u16, msg: impl Into<String>) -> Self {
        Self::new(ZmErrorKind::CommandRejected, msg).with_code(code)
    }

    pub fn data_channel(msg: impl Into<String>) -> Self {
        Self::new(ZmErrorKind::DataChannelFailed, msg)
    }

    pub fn protocol_error(msg: impl Into<String>) -> Self {
        Self::new(ZmErrorKind::ProtocolError, msg)
    }

    pub fn http_error(status: u16, msg: impl Into<String>) -> Self {
        Self::new(ZmErrorKind::HttpError, msg).with_code(status)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(ZmErrorKind::IoError, msg)
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::new(ZmErrorKind::Timeout, msg)
    }

    pub fn disconnected(msg: impl Into<String>) -> Self {
        Self::new(ZmErrorKind::Disconnected, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ZmErrorKind::NotFound, msg)
    }

    pub fn not_implemented(msg: impl Into<String>) -> Self {
        Self::new(ZmErrorKind::NotImplemented, msg)
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::new(ZmErrorKind::InvalidConfig, msg)
    }

    /// Classify an FTP reply code into the most appropriate error kind.
    pub fn from_reply(code: u16, text: &str) -> Self {
        let kind = match code {
            421 => ZmErrorKind::Disconnected,
            425 | 426 => ZmErrorKind::DataChannelFailed,
            430 | 530 => ZmErrorKind::AuthFailed,
            450 | 550 => {
                let lower = text.to_lowercase();
                if lower.contains("not found") || lower.contains("no such") {
                    ZmErrorKind::NotFound
                } else {
                    ZmErrorKind::CommandRejected
                }
            }
            500..=504 => ZmErrorKind::CommandRejected,
            _ if code >= 400 => ZmErrorKind::CommandRejected,
            _ => ZmErrorKind::Unknown,
        };
        Self {
            kind,
            message: text.to_string(),
            code: Some(code),
            session_id: None,
        }
    }
}

impl fmt::Display for ZmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(code) = self.code {
            write!(f, "[{:?} {}] {}", self.kind, code, self.message)
        } else {
            write!(f, "[{:?}] {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for ZmError {}

impl From<std::io::Error> for ZmError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::TimedOut {
            Self::timeout(format!("I/O timeout: {}", e))
        } else {
            Self::io_error(e.to_string())
        }
    }
}

impl From<reqwest::Error> for ZmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::timeout(e.to_string())
        } else if e.is_connect() {
            Self::connection_failed(e.to_string())
        } else {
            Self::new(ZmErrorKind::HttpError, e.to_string())
        }
    }
}

impl From<ZmError> for String {
    fn from(e: ZmError) -> String {
        e.message
    }
}
