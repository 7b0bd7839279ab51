//! Workflow Controller — orchestrates the four-step run: validate URL,
//! upload resume, review the optimization plan, generate the document.
//!
//! The controller owns the `Session` and is the only writer. All state
//! changes go through `transitions::apply`, so each operation here is just:
//! guard, dispatch a `*Started` event, one gateway call, dispatch exactly one
//! terminal event on each branch. A guard that fails is an idempotent no-op
//! returning the unchanged snapshot.

pub mod transitions;

use std::path::Path;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, warn};

use crate::api::ResumeGateway;
use crate::models::plan::OptimizationPlan;
use crate::models::session::{Session, WorkflowStatus};
use self::transitions::{apply, Event};

/// Delay before the post-validation upload prompt, matching the pacing the
/// backend team tuned for the web client.
const UPLOAD_PROMPT_DELAY: Duration = Duration::from_millis(1500);

pub struct WorkflowController {
    gateway: Arc<dyn ResumeGateway>,
    session: Arc<Mutex<Session>>,
    /// Pending upload-prompt timer. Aborted on every subsequent event so a
    /// stale prompt can never clobber a later message.
    prompt_timer: Mutex<Option<JoinHandle<()>>>,
}

impl WorkflowController {
    pub fn new(gateway: Arc<dyn ResumeGateway>) -> Self {
        WorkflowController {
            gateway,
            session: Arc::new(Mutex::new(Session::new())),
            prompt_timer: Mutex::new(None),
        }
    }

    /// Snapshot of the current session.
    pub async fn session(&self) -> Session {
        self.session.lock().await.clone()
    }

    async fn dispatch(&self, event: Event) -> Session {
        self.cancel_prompt_timer().await;
        let mut guard = self.session.lock().await;
        *guard = apply(guard.clone(), event);
        guard.clone()
    }

    async fn cancel_prompt_timer(&self) {
        if let Some(handle) = self.prompt_timer.lock().await.take() {
            handle.abort();
        }
    }

    async fn schedule_upload_prompt(&self) {
        let session = Arc::clone(&self.session);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(UPLOAD_PROMPT_DELAY).await;
            let mut guard = session.lock().await;
            // `apply` ignores the prompt unless the session still sits at
            // `Valid`, so a firing that raced the abort stays harmless.
            *guard = apply(guard.clone(), Event::PromptDue);
        });
        *self.prompt_timer.lock().await = Some(handle);
    }

    /// Step 1: validate the job-posting URL. Ends at `Valid` or `Invalid`;
    /// validation failures are results, never errors.
    pub async fn submit_url(&self, url: &str) -> Session {
        let url = url.trim();
        if url.is_empty() {
            return self.session().await;
        }
        let current = self.session().await;
        if current.is_busy
            || !matches!(
                current.status,
                WorkflowStatus::Idle | WorkflowStatus::Invalid
            )
        {
            return current;
        }

        self.dispatch(Event::UrlSubmitted {
            url: url.to_string(),
        })
        .await;

        let outcome = self.gateway.validate_url(url).await;
        match outcome.job_id {
            Some(job_id) if outcome.valid => {
                let message = match outcome.description_preview {
                    Some(preview) => format!("{} (job post: {preview})", outcome.message),
                    None => outcome.message,
                };
                let next = self.dispatch(Event::UrlAccepted { job_id, message }).await;
                self.schedule_upload_prompt().await;
                next
            }
            _ => {
                self.dispatch(Event::UrlRejected {
                    message: outcome.message,
                })
                .await
            }
        }
    }

    /// Step 2: upload the resume document. Failure reverts to `Valid`.
    pub async fn submit_resume(&self, path: &Path) -> Session {
        let current = self.session().await;
        if current.is_busy || current.status != WorkflowStatus::Valid {
            return current;
        }

        self.dispatch(Event::UploadStarted).await;

        match self.gateway.upload_resume(path).await {
            Ok(receipt) => {
                self.dispatch(Event::UploadCompleted {
                    resume_id: receipt.resume_id,
                    filename: receipt.filename,
                    message: receipt.message,
                })
                .await
            }
            Err(e) => {
                warn!("resume upload failed: {e}");
                self.dispatch(Event::UploadFailed {
                    message: format!("Error uploading resume: {e}"),
                })
                .await
            }
        }
    }

    /// Step 3: fetch the optimization plan for review. Requires both ids;
    /// failure reverts to `Uploaded`.
    pub async fn request_preview(&self) -> Session {
        let current = self.session().await;
        if current.is_busy
            || current.status != WorkflowStatus::Uploaded
            || current.job_id.is_none()
            || current.resume_id.is_none()
        {
            return current;
        }

        let snapshot = self.dispatch(Event::PreviewStarted).await;
        let (Some(job_id), Some(resume_id)) = (snapshot.job_id.clone(), snapshot.resume_id.clone())
        else {
            return snapshot;
        };

        match self
            .gateway
            .preview_optimization(&resume_id, &job_id, snapshot.api_key.as_deref())
            .await
        {
            Ok(plan) => {
                debug!(
                    "optimization plan ready with {} entries",
                    plan.experience_entries.len()
                );
                self.dispatch(Event::PreviewReady { plan }).await
            }
            Err(e) => {
                warn!("optimization preview failed: {e}");
                self.dispatch(Event::PreviewFailed {
                    message: e.to_string(),
                })
                .await
            }
        }
    }

    /// Step 4: generate the final document. `edited` overrides the stored
    /// plan when the user changed anything in review. Failure reverts to
    /// `Reviewing` so the user can re-approve.
    pub async fn approve_and_generate(&self, edited: Option<OptimizationPlan>) -> Session {
        let current = self.session().await;
        if current.is_busy
            || current.status != WorkflowStatus::Reviewing
            || current.job_id.is_none()
            || current.resume_id.is_none()
        {
            return current;
        }

        let snapshot = self
            .dispatch(Event::GenerationStarted { plan: edited })
            .await;
        let (Some(job_id), Some(resume_id)) = (snapshot.job_id.clone(), snapshot.resume_id.clone())
        else {
            return snapshot;
        };

        match self
            .gateway
            .generate_resume(
                &resume_id,
                &job_id,
                snapshot.api_key.as_deref(),
                snapshot.plan.as_ref(),
            )
            .await
        {
            Ok(receipt) => {
                let download_link = self.gateway.resolve_download_url(&receipt.download_url);
                self.dispatch(Event::GenerationCompleted {
                    download_link,
                    message: receipt.message,
                })
                .await
            }
            Err(e) => {
                warn!("resume generation failed: {e}");
                self.dispatch(Event::GenerationFailed {
                    message: e.to_string(),
                })
                .await
            }
        }
    }

    pub async fn set_api_key(&self, api_key: Option<String>) -> Session {
        self.dispatch(Event::ApiKeySet { api_key }).await
    }

    /// "Start Over": returns the session to its initial state. Clears
    /// everything, the API key and plan included.
    pub async fn reset(&self) -> Session {
        self.dispatch(Event::Reset).await
    }
}
