//! Passive-mode address codec and data-channel helpers.
//!
//! The server publishes a six-octet tuple `(h1,h2,h3,h4,p1,p2)` in its
//! PASV reply; the client dials `h1.h2.h3.h4:p1*256+p2` for the bulk
//! transfer. Only passive mode is implemented — the hosts this crate
//! talks to sit behind firewalls that drop inbound connections.

use crate::error::{ZmError, ZmResult};
use regex::Regex;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Decode a PASV reply of the form `227 ... (h1,h2,h3,h4,p1,p2)` into a
/// dial-able `host:port` string.
pub fn parse_pasv_reply(text: &str) -> ZmResult<String> {
    let re = Regex::new(r"\((\d+),(\d+),(\d+),(\d+),(\d+),(\d+)\)").unwrap();
    let caps = re
        .captures(text)
        .ok_or_else(|| ZmError::protocol_error(format!("invalid PASV reply: {}", text)))?;

    let host = format!("{}.{}.{}.{}", &caps[1], &caps[2], &caps[3], &caps[4]);
    let p1: u32 = caps[5]
        .parse()
        .map_err(|_| ZmError::protocol_error(format!("invalid PASV port: {}", text)))?;
    let p2: u32 = caps[6]
        .parse()
        .map_err(|_| ZmError::protocol_error(format!("invalid PASV port: {}", text)))?;

    Ok(format!("{}:{}", host, p1 * 256 + p2))
}

/// Dial the data connection published by a PASV reply.
pub async fn open_data_connection(addr: &str, dial_timeout: Duration) -> ZmResult<TcpStream> {
    timeout(dial_timeout, TcpStream::connect(addr))
        .await
        .map_err(|_| ZmError::data_channel(format!("data connect to {} timed out", addr)))?
        .map_err(|e| ZmError::data_channel(format!("data connect to {}: {}", addr, e)))
}

/// Read all lines from a data connection until the server closes it.
///
/// The whole read runs under one deadline; a stalled data channel fails
/// rather than hanging the caller.
pub async fn read_data_lines(stream: TcpStream, deadline: Duration) -> ZmResult<Vec<String>> {
    let drain = async {
        let mut reader = BufReader::new(stream);
        let mut lines = Vec::with_capacity(256);
        let mut buf = String::new();
        loop {
            buf.clear();
            let n = reader.read_line(&mut buf).await?;
            if n == 0 {
                break;
            }
            lines.push(buf.trim_end_matches(|c| c == '\r' || c == '\n').to_string());
        }
        Ok::<Vec<String>, ZmError>(lines)
    };
    timeout(deadline, drain)
        .await
        .map_err(|_| ZmError::timeout("data channel read timed out"))?
}

/// Read an entire data connection to bytes until the server closes it.
pub async fn read_data_to_end(stream: TcpStream, deadline: Duration) -> ZmResult<Vec<u8>> {
    let drain = async {
        let mut stream = stream;
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await?;
        Ok::<Vec<u8>, ZmError>(buf)
    };
    timeout(deadline, drain)
        .await
        .map_err(|_| ZmError::timeout("data channel read timed out"))?
}

/// Write a payload to the data connection and shut it down so the server
/// sees EOF.
pub async fn write_data(stream: TcpStream, content: &[u8], deadline: Duration) -> ZmResult<()> {
    let push = async {
        let mut stream = stream;
        stream.write_all(content).await?;
        stream.flush().await?;
        stream.shutdown().await?;
        Ok::<(), ZmError>(())
    };
    timeout(deadline, push)
        .await
        .map_err(|_| ZmError::timeout("data channel write timed out"))?
}
