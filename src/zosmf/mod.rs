//! z/OSMF REST backend.
//!
//! One HTTPS call per logical operation, basic auth plus the CSRF-bypass
//! header on every request, `X-IBM-Data-Type: text` on text payloads.
//! Error responses are normalized by extracting the JSON `message` (and
//! first `messageText` detail) or falling back to the raw body, always
//! annotated with the HTTP status.
//!
//! Job output is the one concurrent operation: spool files are fetched
//! with one future per file and assembled in descriptor order, never
//! completion order.

pub mod types;

use crate::connection::Connection;
use crate::error::{ZmError, ZmResult};
use crate::types::{ConnectionConfig, JobStatus, Member};
use async_trait::async_trait;
use futures::future;
use reqwest::Method;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use types::*;
use url::form_urlencoded;

/// How much of an error body is worth carrying in a message.
const ERROR_BODY_LIMIT: usize = 1024;

/// The z/OSMF-backed implementation of [`Connection`].
pub struct ZosmfConnection {
    config: ConnectionConfig,
    base_url: String,
    client: Option<reqwest::Client>,
}

impl ZosmfConnection {
    pub fn new(config: ConnectionConfig) -> Self {
        let base_url = format!("https://{}:{}", config.host, config.port);
        Self {
            config,
            base_url,
            client: None,
        }
    }

    // ─── Request plumbing ────────────────────────────────────────

    fn request(&self, method: Method, path: &str) -> ZmResult<reqwest::RequestBuilder> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| ZmError::disconnected("not connected"))?;
        log::trace!(">>> {} {}{}", method, self.base_url, path);
        Ok(client
            .request(method, format!("{}{}", self.base_url, path))
            .basic_auth(&self.config.username, Some(&self.config.password))
            .header("X-CSRF-ZOSMF-HEADER", "*"))
    }

    /// GET a JSON resource, expecting 200.
    async fn get_json<T: DeserializeOwned>(&self, path: &str, action: &str) -> ZmResult<T> {
        let resp = self.request(Method::GET, path)?.send().await?;
        if resp.status().as_u16() != 200 {
            return Err(api_error(action, resp).await);
        }
        resp.json::<T>()
            .await
            .map_err(|e| ZmError::protocol_error(format!("{}: bad response body: {}", action, e)))
    }

    /// GET a text resource, expecting 200.
    async fn get_text(&self, path: &str, action: &str) -> ZmResult<String> {
        let resp = self
            .request(Method::GET, path)?
            .header("X-IBM-Data-Type", "text")
            .send()
            .await?;
        if resp.status().as_u16() != 200 {
            return Err(api_error(action, resp).await);
        }
        Ok(resp.text().await?)
    }

    /// PUT a text payload, expecting 201 or 204.
    async fn put_text(&self, path: &str, content: &[u8], action: &str) -> ZmResult<()> {
        let resp = self
            .request(Method::PUT, path)?
            .header("X-IBM-Data-Type", "text")
            .header("Content-Type", "text/plain")
            .body(content.to_vec())
            .send()
            .await?;
        match resp.status().as_u16() {
            201 | 204 => Ok(()),
            _ => Err(api_error(action, resp).await),
        }
    }
}

#[async_trait]
impl Connection for ZosmfConnection {
    async fn connect(&mut self) -> ZmResult<()> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.config.command_timeout_sec))
            .connect_timeout(Duration::from_secs(self.config.connect_timeout_sec))
            .pool_idle_timeout(Duration::from_secs(90));
        if self.config.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let client = builder
            .build()
            .map_err(|e| ZmError::connection_failed(format!("HTTP client setup: {}", e)))?;
        self.client = Some(client);
        Ok(())
    }

    async fn close(&mut self) -> ZmResult<()> {
        // Dropping the client releases any pooled connections.
        self.client = None;
        Ok(())
    }

    // ─── Datasets ────────────────────────────────────────────────

    async fn list_datasets(&mut self, pattern: &str) -> ZmResult<Vec<String>> {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("dslevel", pattern)
            .finish();
        let result: DatasetListResponse = self
            .get_json(
                &format!("/zosmf/restfiles/ds?{}", query),
                "failed to list datasets",
            )
            .await?;
        Ok(result.items.into_iter().map(|i| i.dsname).collect())
    }

    async fn list_members(&mut self, dataset: &str) -> ZmResult<Vec<Member>> {
        let dsn = dataset.trim_matches('\'').to_string();
        let result: MemberListResponse = self
            .get_json(
                &format!("/zosmf/restfiles/ds/{}/member", dsn),
                &format!("failed to list members of {}", dsn),
            )
            .await?;
        Ok(result.items.into_iter().map(member_from_item).collect())
    }

    async fn read_member(&mut self, dataset: &str, member: &str) -> ZmResult<Vec<u8>> {
        let dsn = dataset.trim_matches('\'');
        let path = format!("/zosmf/restfiles/ds/{}({})", dsn, member);
        let action = format!("failed to read {}({})", dsn, member);
        Ok(self.get_text(&path, &action).await?.into_bytes())
    }

    async fn write_member(&mut self, dataset: &str, member: &str, content: &[u8]) -> ZmResult<()> {
        let dsn = dataset.trim_matches('\'');
        let path = format!("/zosmf/restfiles/ds/{}({})", dsn, member);
        let action = format!("failed to write {}({})", dsn, member);
        self.put_text(&path, content, &action).await
    }

    // ─── Files ───────────────────────────────────────────────────

    async fn read_file(&mut self, path: &str) -> ZmResult<Vec<u8>> {
        let uss_path = format!("/zosmf/restfiles/fs{}", path);
        let action = format!("failed to read {}", path);
        Ok(self.get_text(&uss_path, &action).await?.into_bytes())
    }

    async fn write_file(&mut self, path: &str, content: &[u8]) -> ZmResult<()> {
        let uss_path = format!("/zosmf/restfiles/fs{}", path);
        let action = format!("failed to write {}", path);
        self.put_text(&uss_path, content, &action).await
    }

    // ─── Jobs ────────────────────────────────────────────────────

    async fn submit_jcl(&mut self, jcl: &[u8]) -> ZmResult<String> {
        let resp = self
            .request(Method::PUT, "/zosmf/restjobs/jobs")?
            .header("Content-Type", "text/plain")
            .body(jcl.to_vec())
            .send()
            .await?;
        if resp.status().as_u16() != 201 {
            return Err(api_error("failed to submit JCL", resp).await);
        }
        let result: SubmitResponse = resp.json().await.map_err(|e| {
            ZmError::protocol_error(format!("failed to parse submit response: {}", e))
        })?;
        Ok(result.jobid)
    }

    async fn job_status(&mut self, jobid: &str) -> ZmResult<JobStatus> {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("owner", "*")
            .append_pair("jobid", jobid)
            .finish();
        let items: Vec<JobItem> = self
            .get_json(
                &format!("/zosmf/restjobs/jobs?{}", query),
                "failed to get job status",
            )
            .await?;
        let item = items
            .into_iter()
            .next()
            .ok_or_else(|| ZmError::not_found(format!("job {} not found", jobid)))?;
        Ok(job_from_item(item))
    }

    async fn job_output(&mut self, jobid: &str) -> ZmResult<Vec<u8>> {
        let status = self.job_status(jobid).await?;

        let files: Vec<JobFile> = self
            .get_json(
                &format!("/zosmf/restjobs/jobs/{}/{}/files", status.job_name, jobid),
                "failed to list job files",
            )
            .await?;
        if files.is_empty() {
            return Ok(Vec::new());
        }

        // One future per spool file; results come back in descriptor
        // order no matter which fetch finishes first.
        let conn = &*self;
        let fetches: Vec<_> = files
            .iter()
            .map(|file| {
                let path = format!(
                    "/zosmf/restjobs/jobs/{}/{}/files/{}/records",
                    status.job_name, jobid, file.id
                );
                let dd = file.ddname.clone();
                async move {
                    conn.get_text(&path, &format!("failed to read DD {}", dd))
                        .await
                }
            })
            .collect();
        let bodies = gather_in_order(fetches).await;

        Ok(assemble_spool_output(&files, bodies)?.into_bytes())
    }

    async fn list_jobs(&mut self, owner: &str) -> ZmResult<Vec<JobStatus>> {
        let owner = if owner.is_empty() {
            self.config.username.as_str()
        } else {
            owner
        };
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("owner", owner)
            .append_pair("prefix", "*")
            .finish();
        let items: Vec<JobItem> = self
            .get_json(
                &format!("/zosmf/restjobs/jobs?{}", query),
                "failed to list jobs",
            )
            .await?;
        Ok(items.into_iter().map(job_from_item).collect())
    }
}

// ─── Record mapping ──────────────────────────────────────────────────

fn member_from_item(item: MemberItem) -> Member {
    let changed = if item.mtime.is_empty() {
        item.m4date
    } else {
        format!("{} {}", item.m4date, item.mtime)
    };
    Member {
        name: item.member,
        vv: item.vers,
        mm: item.r#mod,
        created: item.c4date,
        changed,
        size: item.cnorc,
        init: item.inorc,
        mod_records: item.mnorc,
        user: item.user,
    }
}

fn job_from_item(item: JobItem) -> JobStatus {
    JobStatus {
        job_id: item.jobid,
        job_name: item.jobname,
        owner: item.owner,
        status: item.status.unwrap_or_default(),
        ret_code: item.retcode.unwrap_or_default(),
        class: item.class.unwrap_or_default(),
    }
}

// ─── Scatter-gather ──────────────────────────────────────────────────

/// Run every future concurrently and hand the results back in input
/// order — the join barrier waits for all of them, so a failed fetch
/// never cancels its in-flight siblings.
async fn gather_in_order<F, T>(fetches: Vec<F>) -> Vec<T>
where
    F: Future<Output = T>,
{
    future::join_all(fetches).await
}

/// Stitch fetched spool bodies into one blob, separator-first per file,
/// in descriptor order. The first recorded failure fails the whole
/// aggregate.
fn assemble_spool_output(files: &[JobFile], bodies: Vec<ZmResult<String>>) -> ZmResult<String> {
    let mut output = String::new();
    for (file, body) in files.iter().zip(bodies) {
        let body = body?;
        if !output.is_empty() {
            output.push('\n');
        }
        output.push_str(&format!(
            "--- DD: {} (Step: {}) ---\n",
            file.ddname, file.stepname
        ));
        output.push_str(&body);
    }
    Ok(output)
}

// ─── Error normalization ─────────────────────────────────────────────

/// Convert a non-success response into an error carrying the decoded
/// z/OSMF message and the HTTP status.
async fn api_error(action: &str, resp: reqwest::Response) -> ZmError {
    let status = resp.status().as_u16();
    let mut body = resp.text().await.unwrap_or_default();
    if body.len() > ERROR_BODY_LIMIT {
        let cut = (0..=ERROR_BODY_LIMIT)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        body.truncate(cut);
    }
    normalize_api_error(action, status, &body)
}

fn normalize_api_error(action: &str, status: u16, body: &str) -> ZmError {
    if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) {
        if !parsed.message.is_empty() {
            let mut msg = parsed.message;
            if let Some(detail) = parsed.details.first() {
                if !detail.message_text.is_empty() {
                    msg = format!("{}: {}", msg, detail.message_text);
                }
            }
            return ZmError::http_error(status, format!("{}: {}", action, msg));
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        ZmError::http_error(status, action.to_string())
    } else {
        ZmError::http_error(status, format!("{}: {}", action, trimmed))
    }
}
