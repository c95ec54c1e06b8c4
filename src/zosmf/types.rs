//! JSON payload shapes for the z/OSMF REST interface.

use serde::Deserialize;

// ─── Files ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DatasetListResponse {
    #[serde(default)]
    pub items: Vec<DatasetItem>,
}

#[derive(Debug, Deserialize)]
pub struct DatasetItem {
    #[serde(default)]
    pub dsname: String,
}

#[derive(Debug, Deserialize)]
pub struct MemberListResponse {
    #[serde(default)]
    pub items: Vec<MemberItem>,
}

/// One member record as z/OSMF reports it. Statistics are absent for
/// members without ISPF stats, so everything defaults.
#[derive(Debug, Default, Deserialize)]
pub struct MemberItem {
    #[serde(default)]
    pub member: String,
    #[serde(default)]
    pub vers: u32,
    #[serde(default)]
    pub r#mod: u32,
    #[serde(default)]
    pub c4date: String,
    #[serde(default)]
    pub m4date: String,
    #[serde(default)]
    pub mtime: String,
    #[serde(default)]
    pub cnorc: u32,
    #[serde(default)]
    pub inorc: u32,
    #[serde(default)]
    pub mnorc: u32,
    #[serde(default)]
    pub user: String,
}

// ─── Jobs ────────────────────────────────────────────────────────────

/// One job record from `/restjobs/jobs`. `retcode` is JSON null while
/// the job is still running.
#[derive(Debug, Default, Deserialize)]
pub struct JobItem {
    #[serde(default)]
    pub jobid: String,
    #[serde(default)]
    pub jobname: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub retcode: Option<String>,
    #[serde(default)]
    pub class: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    #[serde(default)]
    pub jobid: String,
}

/// One spool file descriptor from `/restjobs/jobs/<name>/<id>/files`.
#[derive(Debug, Clone, Deserialize)]
pub struct JobFile {
    pub id: i64,
    #[serde(default)]
    pub ddname: String,
    #[serde(default)]
    pub stepname: String,
}

// ─── Errors ──────────────────────────────────────────────────────────

/// The error envelope z/OSMF wraps failures in.
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub details: Vec<ApiErrorDetail>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default, rename = "messageText")]
    pub message_text: String,
}
