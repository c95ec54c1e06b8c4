//! Listing parsers for the two host formats:
//! 1. **PDS directory lines** (fixed-column, whitespace-tokenised):
//!    `NAME VV.MM CREATED CHANGED-DATE CHANGED-TIME SIZE INIT MOD USER`
//! 2. **JES job lines**:
//!    `JOBNAME JOBID OWNER STATUS [CLASS] [RC=xxxx|ABEND=xxxx]`
//!
//! Both parsers degrade gracefully: a row with too few tokens or a field
//! that fails to parse yields the zero value instead of an error, and
//! callers filter zero-value records by their empty name/id.

use crate::types::{JobStatus, Member};

// ─── PDS member lines ────────────────────────────────────────────────

/// Parse a single PDS directory line.
///
/// Example: `HSISAPIE  01.82 2024/04/16 2025/12/10 20:18     5    27     0 FALZONE`
///
/// Fewer than 8 whitespace tokens produce `Member::default()`.
pub fn parse_member_line(line: &str) -> Member {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 8 {
        return Member::default();
    }

    let mut m = Member {
        name: fields[0].to_string(),
        ..Member::default()
    };

    // VV.MM — either half that fails to parse stays at zero.
    let vvmm: Vec<&str> = fields[1].split('.').collect();
    if vvmm.len() == 2 {
        m.vv = vvmm[0].parse().unwrap_or(0);
        m.mm = vvmm[1].parse().unwrap_or(0);
    }

    m.created = fields[2].to_string();
    m.changed = format!("{} {}", fields[3], fields[4]);
    m.size = fields[5].parse().unwrap_or(0);
    m.init = fields[6].parse().unwrap_or(0);
    m.mod_records = fields[7].parse().unwrap_or(0);
    if fields.len() >= 9 {
        m.user = fields[8].to_string();
    }

    m
}

/// Parse a full member listing body, dropping the column-header row and
/// blank lines.
pub fn parse_member_listing(body: &str) -> Vec<Member> {
    body.lines()
        .filter(|l| !(l.contains("Name") && l.contains("VV.MM")))
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .map(parse_member_line)
        .filter(|m| !m.name.is_empty())
        .collect()
}

/// Recover a member listing from a protocol transcript.
///
/// Takes everything strictly between a `125 List started` line and a
/// `250 List completed` line, minus the header row, and applies
/// [`parse_member_line`]. This exists to salvage listings out of session
/// traces; the FTP backend lists directly over its own data channel.
pub fn parse_member_listing_from_transcript(transcript: &str) -> Vec<Member> {
    let mut members = Vec::new();
    let mut in_list = false;

    for line in transcript.lines() {
        if line.contains("125 List started") {
            in_list = true;
            continue;
        }
        if line.contains("250 List completed") {
            break;
        }
        if !in_list {
            continue;
        }
        if line.contains("Name") && line.contains("VV.MM") {
            continue;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let member = parse_member_line(line);
        if !member.name.is_empty() {
            members.push(member);
        }
    }

    members
}

// ─── JES job lines ───────────────────────────────────────────────────

/// Parse a single JES job line.
///
/// Example: `MYJOB    JOB12345 FALZONE  OUTPUT A    RC=0000`
///
/// Fewer than 4 whitespace tokens produce `JobStatus::default()`.
pub fn parse_job_line(line: &str) -> JobStatus {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 4 {
        return JobStatus::default();
    }

    let mut job = JobStatus {
        job_name: fields[0].to_string(),
        job_id: fields[1].to_string(),
        owner: fields[2].to_string(),
        status: fields[3].to_string(),
        ..JobStatus::default()
    };

    if fields.len() >= 5 {
        job.class = fields[4].to_string();
    }

    for field in &fields {
        if let Some(rc) = field.strip_prefix("RC=") {
            job.ret_code = format!("CC {}", rc);
        } else if let Some(abend) = field.strip_prefix("ABEND=") {
            job.ret_code = format!("ABEND {}", abend);
        }
    }

    job
}

/// Parse a batch of JES job lines, dropping the header row (detected by
/// the co-occurrence of the JOBNAME and JOBID column names) and blank
/// lines. Relative order of the remaining entries is preserved.
pub fn parse_job_lines(lines: &[String]) -> Vec<JobStatus> {
    let mut jobs = Vec::with_capacity(lines.len());
    for line in lines {
        if line.contains("JOBNAME") && line.contains("JOBID") {
            continue;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let job = parse_job_line(line);
        if !job.job_id.is_empty() {
            jobs.push(job);
        }
    }
    jobs
}
