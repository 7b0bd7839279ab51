//! Session state — the single source of truth for one workflow run.
//!
//! Owned exclusively by the workflow controller; every other module sees it
//! as an immutable snapshot. A session lives for one process run and is never
//! persisted.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::plan::OptimizationPlan;

/// Opaque job-posting handle minted by the backend once a URL validates.
/// The backend currently issues integers but that is not contract; the
/// client never inspects the structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub Value);

/// Opaque uploaded-resume handle minted by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResumeId(pub Value);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        display_opaque(&self.0, f)
    }
}

impl fmt::Display for ResumeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        display_opaque(&self.0, f)
    }
}

fn display_opaque(value: &Value, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match value {
        Value::String(s) => f.write_str(s),
        other => write!(f, "{other}"),
    }
}

/// Workflow step. Transitions are defined in `workflow::transitions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Idle,
    Analyzing,
    Valid,
    Invalid,
    Uploading,
    Uploaded,
    Previewing,
    Reviewing,
    Generating,
    Generated,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub status: WorkflowStatus,
    pub job_url: String,
    pub job_id: Option<JobId>,
    pub resume_id: Option<ResumeId>,
    /// Original filename of the uploaded resume, echoed by the backend.
    pub resume_filename: Option<String>,
    /// Optional Gemini/OpenAI key forwarded to the backend. Never persisted.
    pub api_key: Option<String>,
    pub plan: Option<OptimizationPlan>,
    /// Absolute download URL of the generated document.
    pub download_link: Option<String>,
    /// Free-text feedback line shown to the user after every transition.
    pub status_message: String,
    /// Gates input while a network operation for the current step is in
    /// flight. Advisory single-flight, set and cleared only by `apply`.
    pub is_busy: bool,
}

impl Session {
    pub fn new() -> Self {
        Session {
            status: WorkflowStatus::Idle,
            job_url: String::new(),
            job_id: None,
            resume_id: None,
            resume_filename: None,
            api_key: None,
            plan: None,
            download_link: None,
            status_message: String::new(),
            is_busy: false,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
