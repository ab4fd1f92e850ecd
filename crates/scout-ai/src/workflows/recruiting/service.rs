use std::sync::Arc;

use tracing::{info, warn};

use crate::config::RecruitingConfig;

use super::agents::{AgentError, OutreachSender, PitchWriter, SourcingAgent};
use super::domain::{CandidateId, CandidateView, Job, JobDraft, JobId, PitchRef, ReviewStatus};
use super::jobs::{JobStore, ValidationError};
use super::outreach::{OutreachError, OutreachView};
use super::queue::{QueueError, SourcingStatusView};
use super::review::{AcceptOutcome, ReviewSession, ReviewStep, SessionSnapshot};
use super::sourcing::{SourcingCoordinator, SourcingTicket};
use super::stats::PipelineStats;

/// Error raised by the recruiting service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecruitingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("job {0} not found")]
    JobNotFound(JobId),
    #[error("no pitch drafted for candidate {0}")]
    PitchNotFound(CandidateId),
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error(transparent)]
    Outreach(#[from] OutreachError),
    #[error(transparent)]
    Agent(#[from] AgentError),
}

/// Coarse classification used to pick an HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    InvalidTransition,
    AlreadyInProgress,
    Agent,
}

impl RecruitingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RecruitingError::Validation(_) => ErrorKind::Validation,
            RecruitingError::JobNotFound(_) | RecruitingError::PitchNotFound(_) => {
                ErrorKind::NotFound
            }
            RecruitingError::Queue(QueueError::CandidateNotFound(_)) => ErrorKind::NotFound,
            RecruitingError::Queue(QueueError::InvalidTransition { .. })
            | RecruitingError::Queue(QueueError::DecisionInFlight(_)) => {
                ErrorKind::InvalidTransition
            }
            RecruitingError::Queue(QueueError::AlreadyInProgress(_)) => {
                ErrorKind::AlreadyInProgress
            }
            RecruitingError::Outreach(OutreachError::BlankField(_)) => ErrorKind::Validation,
            RecruitingError::Outreach(_) => ErrorKind::InvalidTransition,
            RecruitingError::Agent(_) => ErrorKind::Agent,
        }
    }
}

/// Facade composing the job store, per-job review sessions and the agents.
pub struct RecruitingService<S, P, O> {
    jobs: JobStore,
    sourcing: SourcingCoordinator<S>,
    pitch_writer: Arc<P>,
    outreach: Arc<O>,
    config: RecruitingConfig,
}

impl<S, P, O> RecruitingService<S, P, O>
where
    S: SourcingAgent + 'static,
    P: PitchWriter + 'static,
    O: OutreachSender + 'static,
{
    pub fn new(
        sourcing: Arc<S>,
        pitch_writer: Arc<P>,
        outreach: Arc<O>,
        config: RecruitingConfig,
    ) -> Self {
        Self {
            jobs: JobStore::new(),
            sourcing: SourcingCoordinator::new(sourcing, config.sourcing_timeout),
            pitch_writer,
            outreach,
            config,
        }
    }

    pub fn config(&self) -> &RecruitingConfig {
        &self.config
    }

    /// Validate and store a job with an empty queue. Does not start sourcing.
    pub fn create_job(&self, draft: JobDraft) -> Result<Arc<Job>, RecruitingError> {
        let job = self.jobs.create_job(draft)?;
        info!(job_id = %job.id, title = %job.title, skills = job.required_skills.len(), "job created");
        Ok(job)
    }

    /// Create a job and, when configured, kick off its first sourcing run
    /// with the initial batch size.
    pub fn open_job(
        &self,
        draft: JobDraft,
    ) -> Result<(Arc<Job>, Option<SourcingTicket>), RecruitingError> {
        let job = self.create_job(draft)?;
        if !self.config.source_on_create {
            return Ok((job, None));
        }
        let ticket = self.start_sourcing(&job.id, self.config.batch_size)?;
        Ok((job, Some(ticket)))
    }

    pub fn get_job(&self, job_id: &JobId) -> Result<Arc<Job>, RecruitingError> {
        self.jobs
            .get_job(job_id)
            .ok_or_else(|| RecruitingError::JobNotFound(job_id.clone()))
    }

    pub fn list_jobs(&self) -> Vec<Arc<Job>> {
        self.jobs.list_jobs()
    }

    pub fn session(&self, job_id: &JobId) -> Result<Arc<ReviewSession>, RecruitingError> {
        self.jobs
            .session(job_id)
            .ok_or_else(|| RecruitingError::JobNotFound(job_id.clone()))
    }

    pub fn advance(&self, job_id: &JobId) -> Result<ReviewStep, RecruitingError> {
        Ok(self.session(job_id)?.advance())
    }

    pub async fn accept(
        &self,
        job_id: &JobId,
        candidate_id: &CandidateId,
    ) -> Result<AcceptOutcome, RecruitingError> {
        let session = self.session(job_id)?;
        session
            .accept(
                candidate_id,
                self.pitch_writer.as_ref(),
                self.config.pitch_timeout,
            )
            .await
    }

    pub fn reject(
        &self,
        job_id: &JobId,
        candidate_id: &CandidateId,
    ) -> Result<ReviewStep, RecruitingError> {
        self.session(job_id)?.reject(candidate_id)
    }

    pub fn snapshot(&self, job_id: &JobId) -> Result<SessionSnapshot, RecruitingError> {
        Ok(self.session(job_id)?.snapshot())
    }

    pub fn stats(&self, job_id: &JobId) -> Result<PipelineStats, RecruitingError> {
        Ok(self.session(job_id)?.queue().stats())
    }

    pub fn list_by_status(
        &self,
        job_id: &JobId,
        status: ReviewStatus,
    ) -> Result<Vec<CandidateView>, RecruitingError> {
        Ok(self.session(job_id)?.queue().list_by_status(status))
    }

    /// Start a follow-up background sourcing run; at most one per job at a time.
    pub fn source_more(&self, job_id: &JobId) -> Result<SourcingTicket, RecruitingError> {
        self.start_sourcing(job_id, self.config.follow_up_batch_size)
    }

    fn start_sourcing(
        &self,
        job_id: &JobId,
        batch_size: usize,
    ) -> Result<SourcingTicket, RecruitingError> {
        let session = self.session(job_id)?;
        match self.sourcing.source_more(
            Arc::clone(session.job()),
            Arc::clone(session.queue()),
            batch_size,
        ) {
            Ok(ticket) => Ok(ticket),
            Err(err) => {
                warn!(%job_id, error = %err, "sourcing request refused");
                Err(err.into())
            }
        }
    }

    pub fn sourcing_status(&self, job_id: &JobId) -> Result<SourcingStatusView, RecruitingError> {
        Ok(self.session(job_id)?.queue().sourcing_status())
    }

    pub fn pitch(
        &self,
        job_id: &JobId,
        candidate_id: &CandidateId,
    ) -> Result<OutreachView, RecruitingError> {
        self.session(job_id)?.outreach(candidate_id)
    }

    pub fn edit_pitch(
        &self,
        job_id: &JobId,
        candidate_id: &CandidateId,
        subject: String,
        body: String,
    ) -> Result<OutreachView, RecruitingError> {
        self.session(job_id)?.edit_pitch(candidate_id, subject, body)
    }

    pub async fn send_pitch(
        &self,
        job_id: &JobId,
        candidate_id: &CandidateId,
        reference: &PitchRef,
    ) -> Result<OutreachView, RecruitingError> {
        let session = self.session(job_id)?;
        session
            .send_pitch(
                candidate_id,
                reference,
                self.outreach.as_ref(),
                self.config.outreach_timeout,
            )
            .await
    }

    pub fn dismiss_pitch(
        &self,
        job_id: &JobId,
        candidate_id: &CandidateId,
    ) -> Result<OutreachView, RecruitingError> {
        self.session(job_id)?.dismiss_pitch(candidate_id)
    }
}
