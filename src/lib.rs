//! # zmlink — z/OS transport layer
//!
//! Command-line tooling talks to a z/OS host through one of two
//! mutually incompatible backends, both hidden behind the [`Connection`]
//! trait:
//!
//! - **FTP** — a hand-rolled client for the host's line-oriented
//!   control/data-channel protocol, including the JES extension
//!   commands (`SITE FILETYPE=JES`) that turn an FTP session into a
//!   job-entry-subsystem query channel.
//! - **z/OSMF** — the JSON/REST interface over HTTPS, with concurrent
//!   spool-file retrieval for job output.
//!
//! Architecture:
//! - `types` — shared data structures and connection config
//! - `error` — categorised error type
//! - `parser` — PDS member and JES job listing parsers
//! - `connection` — the `Connection` capability trait + protocol factory
//! - `ftp` — legacy backend (codec, data channel, client, JES client)
//! - `zosmf` — REST backend
//! - `config` — profile file loading/saving

pub mod config;
pub mod connection;
pub mod error;
pub mod ftp;
pub mod parser;
pub mod types;
pub mod zosmf;

pub use config::{Config, Profile};
pub use connection::{new_connection, Connection};
pub use error::{ZmError, ZmErrorKind, ZmResult};
pub use ftp::FtpConnection;
pub use types::{ConnectionConfig, JobStatus, Member};
pub use zosmf::ZosmfConnection;
