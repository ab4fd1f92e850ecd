//! Contracts for the external agents the review engine calls.
//!
//! Every call is fallible and slow; callers wrap them in timeouts and never
//! hold a queue or session lock while awaiting one.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::domain::{Candidate, Job, Match, Pitch, PitchRef, SourcedCandidate};

/// Failure reported by (or on behalf of) an external agent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AgentError {
    #[error("agent provider failure: {0}")]
    Provider(String),
    #[error("agent call timed out after {0:?}")]
    Timeout(Duration),
    #[error("agent returned an unusable response: {0}")]
    InvalidResponse(String),
}

/// Generates candidates and scores them against the job (sourcing + matching).
#[async_trait]
pub trait SourcingAgent: Send + Sync {
    /// All-or-nothing: either the full batch or an error.
    async fn generate(
        &self,
        job: &Job,
        batch_size: usize,
    ) -> Result<Vec<SourcedCandidate>, AgentError>;
}

/// Drafts a personalized outreach email for an accepted candidate.
#[async_trait]
pub trait PitchWriter: Send + Sync {
    async fn draft(
        &self,
        job: &Job,
        candidate: &Candidate,
        assessment: &Match,
    ) -> Result<Pitch, AgentError>;
}

/// Payload handed to the outreach agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutreachRequest {
    pub reference: PitchRef,
    pub candidate_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    pub subject: String,
    pub body: String,
}

/// Acknowledgement returned by the outreach agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutreachReceipt {
    pub reference: PitchRef,
    pub detail: String,
}

/// Delivers an outreach email.
#[async_trait]
pub trait OutreachSender: Send + Sync {
    async fn send(&self, request: &OutreachRequest) -> Result<OutreachReceipt, AgentError>;
}

/// Await `call`, converting an elapsed deadline into [`AgentError::Timeout`].
pub(crate) async fn with_deadline<T, F>(limit: Duration, call: F) -> Result<T, AgentError>
where
    F: std::future::Future<Output = Result<T, AgentError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(AgentError::Timeout(limit)),
    }
}
