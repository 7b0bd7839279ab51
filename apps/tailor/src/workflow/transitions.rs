//! Pure workflow transitions: `apply(session, event) -> session`.
//!
//! The whole step machine lives here with no I/O, so every path is testable
//! without a server. Guard rule: an event that does not fit the current
//! status returns the session unchanged. `is_busy` is set only by the
//! `*Started` events and cleared only by their terminal counterparts, which
//! makes "never stuck busy" a structural property rather than a cleanup
//! convention.

use crate::models::plan::OptimizationPlan;
use crate::models::session::{JobId, ResumeId, Session, WorkflowStatus};

/// Prompt shown ~1.5s after a URL validates, nudging the user to the next
/// step. Fired by the controller's cancellable timer.
pub const UPLOAD_PROMPT: &str =
    "The job description has been analyzed. Upload a resume to generate a tailored one.";

pub const ANALYZING_MESSAGE: &str = "Analyzing URL...";
pub const UPLOADING_MESSAGE: &str = "Uploading resume...";
pub const PREVIEWING_MESSAGE: &str = "Preparing optimization preview...";
pub const REVIEWING_MESSAGE: &str =
    "Review the suggested changes, then approve to generate the final document.";
pub const GENERATING_MESSAGE: &str = "Generating resume with Copilot...";

#[derive(Debug, Clone)]
pub enum Event {
    UrlSubmitted {
        url: String,
    },
    UrlAccepted {
        job_id: JobId,
        message: String,
    },
    UrlRejected {
        message: String,
    },
    /// The delayed upload prompt came due. Stale firings (status has moved
    /// past `Valid`) are no-ops.
    PromptDue,
    UploadStarted,
    UploadCompleted {
        resume_id: ResumeId,
        filename: Option<String>,
        message: String,
    },
    UploadFailed {
        message: String,
    },
    PreviewStarted,
    PreviewReady {
        plan: OptimizationPlan,
    },
    PreviewFailed {
        message: String,
    },
    /// `plan` carries the user-edited copy when the editor supplied one.
    GenerationStarted {
        plan: Option<OptimizationPlan>,
    },
    GenerationCompleted {
        download_link: String,
        message: String,
    },
    GenerationFailed {
        message: String,
    },
    ApiKeySet {
        api_key: Option<String>,
    },
    Reset,
}

pub fn apply(session: Session, event: Event) -> Session {
    use WorkflowStatus::*;

    let mut next = session;
    match (next.status, event) {
        (Idle | Invalid, Event::UrlSubmitted { url }) if !next.is_busy => {
            next.status = Analyzing;
            next.is_busy = true;
            next.job_url = url;
            next.status_message = ANALYZING_MESSAGE.to_string();
        }
        (Analyzing, Event::UrlAccepted { job_id, message }) => {
            next.status = Valid;
            next.is_busy = false;
            next.job_id = Some(job_id);
            next.status_message = message;
        }
        (Analyzing, Event::UrlRejected { message }) => {
            next.status = Invalid;
            next.is_busy = false;
            next.status_message = message;
        }
        (Valid, Event::PromptDue) if !next.is_busy => {
            next.status_message = UPLOAD_PROMPT.to_string();
        }
        (Valid, Event::UploadStarted) if !next.is_busy => {
            next.status = Uploading;
            next.is_busy = true;
            next.status_message = UPLOADING_MESSAGE.to_string();
        }
        (
            Uploading,
            Event::UploadCompleted {
                resume_id,
                filename,
                message,
            },
        ) => {
            next.status = Uploaded;
            next.is_busy = false;
            next.resume_id = Some(resume_id);
            next.resume_filename = filename;
            next.status_message = message;
        }
        (Uploading, Event::UploadFailed { message }) => {
            // Revert: the validated URL is still good, the resume is not.
            next.status = Valid;
            next.is_busy = false;
            next.status_message = message;
        }
        (Uploaded, Event::PreviewStarted)
            if !next.is_busy && next.job_id.is_some() && next.resume_id.is_some() =>
        {
            next.status = Previewing;
            next.is_busy = true;
            next.status_message = PREVIEWING_MESSAGE.to_string();
        }
        (Previewing, Event::PreviewReady { plan }) => {
            next.status = Reviewing;
            next.is_busy = false;
            next.plan = Some(plan);
            next.status_message = REVIEWING_MESSAGE.to_string();
        }
        (Previewing, Event::PreviewFailed { message }) => {
            next.status = Uploaded;
            next.is_busy = false;
            next.status_message = message;
        }
        (Reviewing, Event::GenerationStarted { plan })
            if !next.is_busy && next.job_id.is_some() && next.resume_id.is_some() =>
        {
            next.status = Generating;
            next.is_busy = true;
            if plan.is_some() {
                next.plan = plan;
            }
            next.status_message = GENERATING_MESSAGE.to_string();
        }
        (
            Generating,
            Event::GenerationCompleted {
                download_link,
                message,
            },
        ) => {
            next.status = Generated;
            next.is_busy = false;
            next.download_link = Some(download_link);
            next.status_message = message;
        }
        (Generating, Event::GenerationFailed { message }) => {
            next.status = Reviewing;
            next.is_busy = false;
            next.status_message = message;
        }
        (_, Event::ApiKeySet { api_key }) if !next.is_busy => {
            next.api_key = api_key;
        }
        // Reset wipes everything, api_key and plan included: equivalent to
        // starting a fresh session.
        (_, Event::Reset) if !next.is_busy => {
            next = Session::new();
        }
        // Anything else is a stale or out-of-order event.
        _ => {}
    }
    next
}
