//! Terminal front-end: walks the four workflow steps in order, printing the
//! session's status message after each transition. Review is interactive by
//! default; `--yes` approves the suggested plan as-is, and the
//! `--plan-out`/`--plan-in` pair supports editing the plan in any editor
//! between two runs.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::config::Config;
use crate::editor::{render_review, PlanDraft};
use crate::models::plan::OptimizationPlan;
use crate::models::session::WorkflowStatus;
use crate::preview::PreviewRenderer;
use crate::workflow::WorkflowController;

#[derive(Debug, Parser)]
#[command(name = "tailor", version, about = "Tailor a resume to a job posting")]
pub struct Cli {
    /// Job posting URL (LinkedIn/Monster)
    #[arg(long)]
    pub job_url: String,

    /// Path to the resume file (.pdf, .docx or .txt)
    #[arg(long)]
    pub resume: PathBuf,

    /// Gemini/OpenAI API key forwarded to the backend (overrides TAILOR_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Backend base URL (overrides TAILOR_API_BASE)
    #[arg(long)]
    pub api_base: Option<String>,

    /// Approve the suggested plan without interactive review
    #[arg(long)]
    pub yes: bool,

    /// Write the suggested plan as JSON to FILE and exit without generating
    #[arg(long, value_name = "FILE")]
    pub plan_out: Option<PathBuf>,

    /// Read an edited plan (from a previous --plan-out) before review
    #[arg(long, value_name = "FILE")]
    pub plan_in: Option<PathBuf>,

    /// After generating, render an HTML preview of the document to FILE
    #[arg(long, value_name = "FILE")]
    pub preview: Option<PathBuf>,
}

pub async fn run(cli: Cli, config: Config) -> Result<()> {
    let base = cli.api_base.as_deref().unwrap_or(&config.api_base);
    let gateway = Arc::new(ApiClient::new(base).context("failed to build API client")?);
    let controller = WorkflowController::new(gateway);

    let api_key = cli.api_key.clone().or_else(|| config.api_key.clone());
    if api_key.is_some() {
        controller.set_api_key(api_key).await;
    }

    // Step 1: job URL.
    let session = controller.submit_url(&cli.job_url).await;
    println!("{}", session.status_message);
    if session.status != WorkflowStatus::Valid {
        bail!("job URL was not accepted");
    }

    // Step 2: resume upload.
    let session = controller.submit_resume(&cli.resume).await;
    println!("{}", session.status_message);
    if session.status != WorkflowStatus::Uploaded {
        bail!("resume upload failed");
    }

    // Step 3: optimization preview.
    let session = controller.request_preview().await;
    if session.status != WorkflowStatus::Reviewing {
        bail!("optimization preview failed: {}", session.status_message);
    }
    let plan = session
        .plan
        .clone()
        .context("reviewing without a plan; this is a bug")?;
    let mut draft = PlanDraft::from_plan(&plan);

    if let Some(path) = &cli.plan_out {
        let json = serde_json::to_string_pretty(&draft.confirm(&plan))?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write plan to {}", path.display()))?;
        println!(
            "Suggested plan written to {}. Edit it, then re-run with --plan-in.",
            path.display()
        );
        return Ok(());
    }

    if let Some(path) = &cli.plan_in {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read plan from {}", path.display()))?;
        let edited: OptimizationPlan =
            serde_json::from_str(&text).context("edited plan is not valid JSON")?;
        draft = draft.merge_edited(&edited)?;
        info!("applied edited plan from {}", path.display());
    }

    if !cli.yes {
        println!();
        print!("{}", render_review(&plan, &draft));
        println!();
        if !confirm("Generate the final resume with these changes? [Y/n] ")? {
            controller.reset().await;
            println!("Plan discarded. Run again to start over.");
            return Ok(());
        }
    }

    // Step 4: generation.
    let approved = draft.confirm(&plan);
    let session = controller.approve_and_generate(Some(approved)).await;
    println!("{}", session.status_message);
    if session.status != WorkflowStatus::Generated {
        bail!("resume generation failed");
    }
    let link = session
        .download_link
        .context("generated without a download link; this is a bug")?;
    println!("Download your tailored resume: {link}");

    if let Some(path) = &cli.preview {
        let mut renderer = PreviewRenderer::new();
        match renderer.render(&link).await {
            Ok(html) => {
                std::fs::write(path, html)
                    .with_context(|| format!("failed to write preview to {}", path.display()))?;
                println!("Preview written to {}", path.display());
            }
            // Preview is best-effort; the download link above still stands.
            Err(e) => {
                warn!("document preview failed: {e}");
                println!("Failed to load preview.");
            }
        }
    }

    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt}");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    let answer = answer.trim().to_ascii_lowercase();
    Ok(answer.is_empty() || answer == "y" || answer == "yes")
}
