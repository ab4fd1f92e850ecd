use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for job postings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for candidates, unique within the owning job's queue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(pub String);

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Seniority band requested by a job posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    Junior,
    Mid,
    Senior,
    Lead,
}

impl ExperienceLevel {
    pub const fn label(self) -> &'static str {
        match self {
            ExperienceLevel::Junior => "Junior",
            ExperienceLevel::Mid => "Mid",
            ExperienceLevel::Senior => "Senior",
            ExperienceLevel::Lead => "Lead",
        }
    }

    /// Case-insensitive parse of the four accepted levels.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "junior" => Some(Self::Junior),
            "mid" | "mid-level" => Some(Self::Mid),
            "senior" => Some(Self::Senior),
            "lead" => Some(Self::Lead),
            _ => None,
        }
    }
}

/// Hiring company attached to a posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

/// A validated hiring requisition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub title: String,
    pub description: String,
    pub required_skills: Vec<String>,
    pub experience_level: ExperienceLevel,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<CompanyProfile>,
    pub created_at: DateTime<Utc>,
}

/// Skills as submitted by a client: either `"React, Node.js"` or `["React", "Node.js"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SkillsInput {
    Csv(String),
    List(Vec<String>),
}

impl Default for SkillsInput {
    fn default() -> Self {
        SkillsInput::List(Vec::new())
    }
}

/// Unvalidated create-job payload.
///
/// Every field defaults so that a missing value surfaces as a validation
/// error naming the field rather than a generic deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required_skills: SkillsInput,
    #[serde(default)]
    pub experience_level: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub company_website: Option<String>,
}

/// Facts about a sourced person as returned by the sourcing agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub name: String,
    pub current_role: String,
    pub current_company: String,
    pub years_experience: u8,
    pub location: String,
    pub skills: Vec<String>,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_url: Option<String>,
}

impl CandidateProfile {
    /// Key used to detect the same person across sourcing batches.
    ///
    /// Prefers the profile URL, then the email, then name and company. Returns
    /// `None` when the profile carries nothing usable as an identity.
    pub fn identity_key(&self) -> Option<String> {
        let non_blank = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_ascii_lowercase)
        };

        if let Some(url) = non_blank(&self.profile_url) {
            return Some(format!("url:{}", url.trim_end_matches('/')));
        }
        if let Some(email) = non_blank(&self.email) {
            return Some(format!("email:{email}"));
        }

        let name = self.name.trim();
        if name.is_empty() {
            return None;
        }
        Some(format!(
            "name:{}|{}",
            name.to_ascii_lowercase(),
            self.current_company.trim().to_ascii_lowercase()
        ))
    }
}

/// Candidate record owned by exactly one job. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub job_id: JobId,
    #[serde(flatten)]
    pub profile: CandidateProfile,
}

/// Scored assessment of a candidate against a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub score: u8,
    pub highlights: Vec<String>,
    pub reasoning: String,
    pub rank_position: u32,
}

impl Match {
    pub const MAX_SCORE: u8 = 100;

    pub fn has_valid_score(&self) -> bool {
        self.score <= Self::MAX_SCORE
    }
}

/// One element of a sourcing batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcedCandidate {
    pub profile: CandidateProfile,
    pub assessment: Match,
}

/// Review lifecycle of a candidate within a job queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Pending,
    Viewed,
    Accepted,
    Rejected,
    Contacted,
}

impl ReviewStatus {
    pub const ALL: [ReviewStatus; 5] = [
        ReviewStatus::Pending,
        ReviewStatus::Viewed,
        ReviewStatus::Accepted,
        ReviewStatus::Rejected,
        ReviewStatus::Contacted,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Viewed => "viewed",
            ReviewStatus::Accepted => "accepted",
            ReviewStatus::Rejected => "rejected",
            ReviewStatus::Contacted => "contacted",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(raw.trim()))
    }

    /// Edges of the review state machine reachable through an explicit transition.
    ///
    /// `pending -> viewed` is not listed: only `next_pending` performs it.
    pub const fn permits(self, to: ReviewStatus) -> bool {
        matches!(
            (self, to),
            (ReviewStatus::Viewed, ReviewStatus::Accepted)
                | (ReviewStatus::Viewed, ReviewStatus::Rejected)
                | (ReviewStatus::Accepted, ReviewStatus::Contacted)
        )
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Correlation token minted by the pitch writer and echoed on send.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PitchRef(pub String);

impl PitchRef {
    pub fn generate() -> Self {
        PitchRef(format!("pitch-{}", uuid::Uuid::new_v4()))
    }
}

impl fmt::Display for PitchRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Drafted outreach email for an accepted candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pitch {
    pub subject: String,
    pub body: String,
    pub reference: PitchRef,
}

/// Read model of a queue entry handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateView {
    pub candidate: Candidate,
    #[serde(rename = "match")]
    pub assessment: Match,
    pub status: ReviewStatus,
}
