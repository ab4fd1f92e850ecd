//! Candidate review and outreach orchestration.
//!
//! A job owns an append-only queue of sourced candidates. Reviewers pull
//! candidates one at a time, accept or reject them, and accepted candidates get
//! a drafted pitch that can be edited and sent. Sourcing, pitch drafting and
//! delivery are delegated to agents behind the traits in [`agents`].

pub mod agents;
pub mod demo;
pub mod domain;
pub mod jobs;
pub mod outreach;
pub mod queue;
pub mod review;
pub mod router;
pub mod service;
pub mod sourcing;
pub mod stats;

#[cfg(test)]
mod tests;

pub use agents::{
    AgentError, OutreachReceipt, OutreachRequest, OutreachSender, PitchWriter, SourcingAgent,
};
pub use demo::{DemoSourcingAgent, LoggingOutreachSender, TemplatePitchWriter};
pub use domain::{
    Candidate, CandidateId, CandidateProfile, CandidateView, CompanyProfile, ExperienceLevel, Job,
    JobDraft, JobId, Match, Pitch, PitchRef, ReviewStatus, SkillsInput, SourcedCandidate,
};
pub use jobs::{normalize_skills, JobStore, ValidationError};
pub use outreach::{OutreachError, OutreachState, OutreachView};
pub use queue::{
    AppendReport, CandidateQueue, QueueError, SourcingRunSummary, SourcingStatus,
    SourcingStatusView,
};
pub use review::{AcceptOutcome, ReviewSession, ReviewStep, SessionSnapshot};
pub use router::recruiting_router;
pub use service::{ErrorKind, RecruitingError, RecruitingService};
pub use sourcing::{SourcingCoordinator, SourcingOutcome, SourcingTicket};
pub use stats::PipelineStats;
