//! The optimization plan — the backend's structured suggestion set for
//! rewriting a resume against one job posting.
//!
//! The plan is returned verbatim by `POST /preview-optimization` and, after
//! user review, sent back as `approved_plan` in `POST /generate-resume`.
//! Entry ordering is meaningful: original and optimized content map 1:1 by
//! index, so nothing here may reorder `experience_entries`.

use serde::{Deserialize, Serialize};

/// Professional summary before and after optimization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryPair {
    pub original: String,
    pub optimized: String,
}

/// One work-experience section of the resume.
///
/// `bullets` is the parsed original content (read-only in the review UI);
/// `optimized_bullets` is the AI rewrite the user may edit. Older resumes
/// sometimes parse with no detected bullets at all, hence the default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    pub header: String,
    #[serde(default)]
    pub bullets: Vec<String>,
    #[serde(default)]
    pub optimized_bullets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationPlan {
    /// Target company, extracted from the job description. Editable because
    /// extraction is unreliable; used by the backend for the output filename.
    #[serde(default)]
    pub company_name: String,
    pub summary: SummaryPair,
    #[serde(default)]
    pub experience_entries: Vec<ExperienceEntry>,
}
