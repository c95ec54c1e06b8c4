//! End-to-end tests for the legacy FTP/JES backend against a scripted
//! in-process host: real TCP control and data connections, canned
//! replies, passive-mode negotiation included.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use zmlink::connection::Connection;
use zmlink::{ConnectionConfig, FtpConnection, ZmErrorKind};

// ─── Scripted host ───────────────────────────────────────────────────

#[derive(Clone, Default)]
struct HostFixture {
    datasets: Vec<String>,
    members_listing: String,
    jobs_listing: String,
    /// jobid → spool text served for `RETR <jobid>` in JES mode.
    spool: HashMap<String, String>,
    /// remote path → content served for `RETR <path>`.
    file_content: HashMap<String, String>,
    /// Captures `STOR` payloads, keyed by remote path.
    stored: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    /// Reply 530 to `SITE FILETYPE=JES`.
    reject_jes: bool,
}

async fn spawn_host(fixture: HostFixture) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let (stream, _) = match listener.accept().await {
                Ok(s) => s,
                Err(_) => return,
            };
            tokio::spawn(handle_session(stream, fixture.clone()));
        }
    });
    addr
}

async fn handle_session(stream: TcpStream, fx: HostFixture) {
    let (rd, mut wr) = stream.into_split();
    let mut reader = BufReader::new(rd);

    // Multi-line banner exercises the reply framing.
    wr.write_all(b"220-Scripted z/OS FTP host\r\n220 Ready\r\n")
        .await
        .unwrap();

    let mut pending_data: Option<JoinHandle<TcpStream>> = None;
    let mut jes_mode = false;
    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line).await.unwrap_or(0) == 0 {
            return;
        }
        let cmd = line.trim_end().to_string();
        let verb = cmd.split_whitespace().next().unwrap_or("");
        let arg = cmd.splitn(2, ' ').nth(1).unwrap_or("").to_string();

        match verb {
            "USER" => reply(&mut wr, "331 Password required").await,
            "PASS" => reply(&mut wr, "230 User logged in").await,
            "TYPE" => reply(&mut wr, "200 Type set").await,
            "CWD" => reply(&mut wr, "250 Directory changed").await,
            "SITE" => {
                if arg.starts_with("FILETYPE=JES") {
                    if fx.reject_jes {
                        reply(&mut wr, "530 Not authorized for JES").await;
                    } else {
                        jes_mode = true;
                        reply(&mut wr, "200 SITE command accepted").await;
                    }
                } else {
                    reply(&mut wr, "200 SITE command accepted").await;
                }
            }
            "PASV" => {
                let data_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
                let port = data_listener.local_addr().unwrap().port();
                pending_data =
                    Some(tokio::spawn(
                        async move { data_listener.accept().await.unwrap().0 },
                    ));
                reply(
                    &mut wr,
                    &format!(
                        "227 Entering Passive Mode (127,0,0,1,{},{})",
                        port / 256,
                        port % 256
                    ),
                )
                .await;
            }
            "NLST" => {
                let payload = fx
                    .datasets
                    .iter()
                    .map(|d| format!("{}\r\n", d))
                    .collect::<String>();
                serve_data(&mut wr, &mut pending_data, &payload).await;
            }
            "LIST" => {
                let payload = if jes_mode {
                    fx.jobs_listing.clone()
                } else {
                    fx.members_listing.clone()
                };
                serve_data(&mut wr, &mut pending_data, &payload).await;
            }
            "RETR" => {
                if jes_mode {
                    match fx.spool.get(&arg) {
                        Some(text) => serve_data(&mut wr, &mut pending_data, text).await,
                        None => {
                            // No spool: open and immediately drop the data
                            // connection, then drop the control connection
                            // without a completion reply.
                            reply(&mut wr, "125 Data transfer starting").await;
                            let ds = pending_data.take().unwrap().await.unwrap();
                            drop(ds);
                            return;
                        }
                    }
                } else {
                    let payload = fx.file_content.get(&arg).cloned().unwrap_or_default();
                    serve_data(&mut wr, &mut pending_data, &payload).await;
                }
            }
            "STOR" => {
                reply(&mut wr, "125 Data transfer starting").await;
                let mut ds = pending_data.take().unwrap().await.unwrap();
                let mut buf = Vec::new();
                ds.read_to_end(&mut buf).await.unwrap();
                drop(ds);
                fx.stored.lock().unwrap().insert(arg, buf);
                reply(&mut wr, "250 Transfer completed").await;
            }
            "QUIT" => {
                reply(&mut wr, "221 Goodbye").await;
                return;
            }
            _ => reply(&mut wr, "502 Command not implemented").await,
        }
    }
}

async fn reply(wr: &mut OwnedWriteHalf, text: &str) {
    wr.write_all(format!("{}\r\n", text).as_bytes())
        .await
        .unwrap();
}

async fn serve_data(
    wr: &mut OwnedWriteHalf,
    pending: &mut Option<JoinHandle<TcpStream>>,
    payload: &str,
) {
    reply(wr, "125 Data transfer starting").await;
    let mut ds = pending.take().expect("PASV before transfer").await.unwrap();
    ds.write_all(payload.as_bytes()).await.unwrap();
    ds.shutdown().await.unwrap();
    drop(ds);
    reply(wr, "250 Transfer completed").await;
}

fn config_for(addr: SocketAddr) -> ConnectionConfig {
    let mut cfg = ConnectionConfig::new(&addr.ip().to_string(), addr.port(), "FALZONE", "secret", "ftp");
    cfg.connect_timeout_sec = 5;
    cfg.command_timeout_sec = 5;
    cfg
}

// ─── Job queries (ephemeral JES sessions) ────────────────────────────

#[tokio::test]
async fn lists_jobs_through_a_jes_session() {
    let fixture = HostFixture {
        jobs_listing: "JOBNAME  JOBID    OWNER    STATUS CLASS\r\n\
                       MYJOB    JOB12345 FALZONE  OUTPUT A    RC=0000\r\n\
                       TESTJOB  JOB00001 FALZONE  ACTIVE B\r\n"
            .to_string(),
        ..HostFixture::default()
    };
    let addr = spawn_host(fixture).await;

    let mut conn = FtpConnection::new(config_for(addr));
    let jobs = conn.list_jobs("").await.unwrap();

    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].job_name, "MYJOB");
    assert_eq!(jobs[0].job_id, "JOB12345");
    assert_eq!(jobs[0].ret_code, "CC 0000");
    assert_eq!(jobs[1].status, "ACTIVE");
}

#[tokio::test]
async fn retrieves_job_output_through_a_jes_session() {
    let mut spool = HashMap::new();
    spool.insert(
        "JOB12345".to_string(),
        "1 J E S 2  J O B  L O G\r\nIEF142I MYJOB STEP1 - COMPLETED\r\n".to_string(),
    );
    let addr = spawn_host(HostFixture {
        spool,
        ..HostFixture::default()
    })
    .await;

    let mut conn = FtpConnection::new(config_for(addr));
    let output = conn.job_output("JOB12345").await.unwrap();

    assert_eq!(
        String::from_utf8(output).unwrap(),
        "1 J E S 2  J O B  L O G\nIEF142I MYJOB STEP1 - COMPLETED"
    );
}

#[tokio::test]
async fn missing_spool_reports_no_output_available() {
    let addr = spawn_host(HostFixture::default()).await;

    let mut conn = FtpConnection::new(config_for(addr));
    let err = conn.job_output("JOB99999").await.unwrap_err();

    assert_eq!(err.kind, ZmErrorKind::NotFound);
    assert!(err.message.contains("no output available"));
}

#[tokio::test]
async fn jes_mode_rejection_is_terminal() {
    let addr = spawn_host(HostFixture {
        reject_jes: true,
        ..HostFixture::default()
    })
    .await;

    let mut conn = FtpConnection::new(config_for(addr));
    let err = conn.list_jobs("").await.unwrap_err();

    assert_eq!(err.kind, ZmErrorKind::AuthFailed);
    assert!(err.message.contains("Not authorized"));
}

// ─── Dataset and file operations ─────────────────────────────────────

#[tokio::test]
async fn lists_members_directly_over_the_data_channel() {
    let fixture = HostFixture {
        members_listing: " Name     VV.MM   Created       Changed      Size  Init   Mod   Id\r\n\
                           PROG1     01.00 2024/01/01 2024/01/15 09:00    10    10     0 USER1\r\n\
                           PROG2     01.05 2024/02/01 2024/03/15 10:00    20    15     5 USER2\r\n"
            .to_string(),
        ..HostFixture::default()
    };
    let addr = spawn_host(fixture).await;

    let mut conn = FtpConnection::new(config_for(addr));
    conn.connect().await.unwrap();
    let members = conn.list_members("TEST.PDS").await.unwrap();
    conn.close().await.unwrap();

    assert_eq!(members.len(), 2);
    assert_eq!(members[0].name, "PROG1");
    assert_eq!(members[1].name, "PROG2");
    assert_eq!(members[1].vv, 1);
    assert_eq!(members[1].mm, 5);
    assert_eq!(members[1].changed, "2024/03/15 10:00");
}

#[tokio::test]
async fn lists_datasets_by_name() {
    let fixture = HostFixture {
        datasets: vec![
            "FALZONE.SOURCE.COBOL".to_string(),
            "FALZONE.JCL.CNTL".to_string(),
        ],
        ..HostFixture::default()
    };
    let addr = spawn_host(fixture).await;

    let mut conn = FtpConnection::new(config_for(addr));
    conn.connect().await.unwrap();
    let datasets = conn.list_datasets("FALZONE").await.unwrap();

    assert_eq!(datasets, vec!["FALZONE.SOURCE.COBOL", "FALZONE.JCL.CNTL"]);
}

#[tokio::test]
async fn reads_and_writes_members() {
    let mut file_content = HashMap::new();
    file_content.insert(
        "'TEST.PDS(PROG1)'".to_string(),
        "       IDENTIFICATION DIVISION.\r\n".to_string(),
    );
    let stored = Arc::new(Mutex::new(HashMap::new()));
    let fixture = HostFixture {
        file_content,
        stored: stored.clone(),
        ..HostFixture::default()
    };
    let addr = spawn_host(fixture).await;

    let mut conn = FtpConnection::new(config_for(addr));
    conn.connect().await.unwrap();

    let body = conn.read_member("TEST.PDS", "PROG1").await.unwrap();
    assert_eq!(
        String::from_utf8(body).unwrap(),
        "       IDENTIFICATION DIVISION.\r\n"
    );

    conn.write_member("TEST.PDS", "NEWMEM", b"//NEWJOB JOB\n")
        .await
        .unwrap();
    let stored = stored.lock().unwrap();
    assert_eq!(
        stored.get("'TEST.PDS(NEWMEM)'").map(Vec::as_slice),
        Some(b"//NEWJOB JOB\n".as_slice())
    );
}

#[tokio::test]
async fn operations_before_connect_fail_cleanly() {
    let addr = spawn_host(HostFixture::default()).await;

    let mut conn = FtpConnection::new(config_for(addr));
    let err = conn.list_datasets("FALZONE").await.unwrap_err();
    assert_eq!(err.kind, ZmErrorKind::Disconnected);
}

#[tokio::test]
async fn submission_is_a_capability_gap() {
    let addr = spawn_host(HostFixture::default()).await;

    let mut conn = FtpConnection::new(config_for(addr));
    conn.connect().await.unwrap();

    let err = conn.submit_jcl(b"//JOB1 JOB\n").await.unwrap_err();
    assert_eq!(err.kind, ZmErrorKind::NotImplemented);

    let err = conn.job_status("JOB12345").await.unwrap_err();
    assert_eq!(err.kind, ZmErrorKind::NotImplemented);
}
