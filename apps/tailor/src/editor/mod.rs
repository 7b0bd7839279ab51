//! Optimization Plan Editor — pure transformation layer over the plan.
//!
//! The immutable plan from the backend stays untouched for diff display; all
//! edits go into a `PlanDraft` working copy. Every mutation returns a new
//! draft with copy-on-write at the mutated path and `Arc` structural sharing
//! everywhere else, so original and edited content stay independently
//! inspectable no matter how many edits happen. Confirming rebuilds a full
//! `OptimizationPlan`; cancelling is simply dropping the draft.

use std::fmt::Write as _;
use std::sync::Arc;

use thiserror::Error;

use crate::models::plan::{ExperienceEntry, OptimizationPlan, SummaryPair};

/// Shown in place of an empty original bullet list. Some resumes parse with
/// no detected bullets for an entry, and an empty list reads like a bug.
pub const NO_BULLETS_PLACEHOLDER: &str = "(No bullet points detected)";

#[derive(Debug, Error, PartialEq)]
pub enum EditError {
    #[error("experience entry {0} does not exist")]
    EntryOutOfRange(usize),

    #[error("bullet {bullet} does not exist in experience entry {entry}")]
    BulletOutOfRange { entry: usize, bullet: usize },

    #[error("edited plan does not match the original layout: {0}")]
    ShapeMismatch(String),
}

/// Editable working copy of an optimization plan. Entry count and ordering
/// are fixed at construction and map 1:1 by index onto the original plan.
#[derive(Debug, Clone)]
pub struct PlanDraft {
    company_name: String,
    summary_optimized: String,
    entries: Vec<Arc<Vec<String>>>,
}

impl PlanDraft {
    pub fn from_plan(plan: &OptimizationPlan) -> Self {
        PlanDraft {
            company_name: plan.company_name.clone(),
            summary_optimized: plan.summary.optimized.clone(),
            entries: plan
                .experience_entries
                .iter()
                .map(|e| Arc::new(e.optimized_bullets.clone()))
                .collect(),
        }
    }

    pub fn company_name(&self) -> &str {
        &self.company_name
    }

    pub fn summary_optimized(&self) -> &str {
        &self.summary_optimized
    }

    pub fn bullets(&self, entry: usize) -> Option<&[String]> {
        self.entries.get(entry).map(|b| b.as_slice())
    }

    pub fn set_company_name(&self, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.company_name = value.into();
        next
    }

    pub fn set_summary_optimized(&self, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.summary_optimized = value.into();
        next
    }

    /// Replaces one optimized bullet. Only the touched entry's bullet list is
    /// cloned; all other entries stay shared with the source draft.
    pub fn set_bullet(
        &self,
        entry: usize,
        bullet: usize,
        value: impl Into<String>,
    ) -> Result<Self, EditError> {
        let bullets = self
            .entries
            .get(entry)
            .ok_or(EditError::EntryOutOfRange(entry))?;
        if bullet >= bullets.len() {
            return Err(EditError::BulletOutOfRange { entry, bullet });
        }
        let mut edited = (**bullets).clone();
        edited[bullet] = value.into();

        let mut next = self.clone();
        next.entries[entry] = Arc::new(edited);
        Ok(next)
    }

    /// Folds a wholesale-edited plan (for example one round-tripped through a
    /// JSON file) into this draft. The edited plan must keep the original
    /// entry count, ordering and per-entry bullet counts.
    pub fn merge_edited(&self, edited: &OptimizationPlan) -> Result<Self, EditError> {
        if edited.experience_entries.len() != self.entries.len() {
            return Err(EditError::ShapeMismatch(format!(
                "expected {} experience entries, found {}",
                self.entries.len(),
                edited.experience_entries.len()
            )));
        }

        let mut draft = self
            .set_company_name(&edited.company_name)
            .set_summary_optimized(&edited.summary.optimized);

        for (i, entry) in edited.experience_entries.iter().enumerate() {
            if entry.optimized_bullets.len() != self.entries[i].len() {
                return Err(EditError::ShapeMismatch(format!(
                    "entry {} expected {} bullets, found {}",
                    i,
                    self.entries[i].len(),
                    entry.optimized_bullets.len()
                )));
            }
            for (j, bullet) in entry.optimized_bullets.iter().enumerate() {
                if bullet != &self.entries[i][j] {
                    draft = draft.set_bullet(i, j, bullet)?;
                }
            }
        }
        Ok(draft)
    }

    /// Confirms the edits: rebuilds a complete plan against the original,
    /// keeping the read-only fields (headers, original bullets, original
    /// summary) exactly as the backend sent them.
    pub fn confirm(&self, original: &OptimizationPlan) -> OptimizationPlan {
        OptimizationPlan {
            company_name: self.company_name.clone(),
            summary: SummaryPair {
                original: original.summary.original.clone(),
                optimized: self.summary_optimized.clone(),
            },
            experience_entries: original
                .experience_entries
                .iter()
                .zip(self.entries.iter())
                .map(|(entry, bullets)| ExperienceEntry {
                    header: entry.header.clone(),
                    bullets: entry.bullets.clone(),
                    optimized_bullets: (**bullets).clone(),
                })
                .collect(),
        }
    }
}

/// Renders original and edited content side by side per entry, the view the
/// user reviews before approving generation.
pub fn render_review(original: &OptimizationPlan, draft: &PlanDraft) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Target company (used for filename): {}", draft.company_name());
    let _ = writeln!(out);
    let _ = writeln!(out, "Professional summary");
    let _ = writeln!(out, "  original : {}", original.summary.original);
    let _ = writeln!(out, "  optimized: {}", draft.summary_optimized());

    for (i, entry) in original.experience_entries.iter().enumerate() {
        let _ = writeln!(out);
        let _ = writeln!(out, "[{}] {}", i + 1, entry.header);
        let _ = writeln!(out, "  original:");
        if entry.bullets.is_empty() {
            let _ = writeln!(out, "    {NO_BULLETS_PLACEHOLDER}");
        } else {
            for bullet in &entry.bullets {
                let _ = writeln!(out, "    - {bullet}");
            }
        }
        let _ = writeln!(out, "  optimized (editable):");
        for (j, bullet) in draft.bullets(i).unwrap_or(&[]).iter().enumerate() {
            let _ = writeln!(out, "    {}.{} {bullet}", i + 1, j + 1);
        }
    }
    out
}
