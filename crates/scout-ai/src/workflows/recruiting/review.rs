use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use super::agents::{with_deadline, AgentError, OutreachReceipt, OutreachSender, PitchWriter};
use super::domain::{CandidateId, CandidateView, Job, Pitch, PitchRef, ReviewStatus};
use super::outreach::{OutreachSession, OutreachView};
use super::queue::CandidateQueue;
use super::service::RecruitingError;

/// Result of asking for the next candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewStep {
    Ready(CandidateView),
    Empty,
}

impl ReviewStep {
    pub fn candidate(&self) -> Option<&CandidateView> {
        match self {
            ReviewStep::Ready(view) => Some(view),
            ReviewStep::Empty => None,
        }
    }
}

/// Accepted candidate together with the freshly drafted pitch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AcceptOutcome {
    pub candidate: CandidateView,
    pub pitch: Pitch,
}

/// What the reviewer is currently looking at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub candidate: Option<CandidateView>,
    pub pitch: Option<OutreachView>,
}

#[derive(Debug, Default)]
struct SessionState {
    current: Option<CandidateId>,
    latest_pitch: Option<CandidateId>,
    outreach: HashMap<CandidateId, OutreachSession>,
}

/// Reviewer-facing state machine for one job.
///
/// The session lock and the queue lock are never held at the same time, and
/// neither is held while an agent call is awaited.
#[derive(Debug)]
pub struct ReviewSession {
    job: Arc<Job>,
    queue: Arc<CandidateQueue>,
    state: Mutex<SessionState>,
}

impl ReviewSession {
    pub fn new(job: Arc<Job>, queue: Arc<CandidateQueue>) -> Self {
        Self {
            job,
            queue,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn job(&self) -> &Arc<Job> {
        &self.job
    }

    pub fn queue(&self) -> &Arc<CandidateQueue> {
        &self.queue
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Surface the next pending candidate (now `viewed`), or `Empty`.
    pub fn advance(&self) -> ReviewStep {
        match self.queue.next_pending() {
            Some(view) => {
                self.lock().current = Some(view.candidate.id.clone());
                ReviewStep::Ready(view)
            }
            None => ReviewStep::Empty,
        }
    }

    /// `viewed -> accepted`, committed only once the pitch writer succeeded.
    ///
    /// On failure or timeout the candidate stays `viewed` and may be accepted again.
    pub async fn accept<P>(
        &self,
        candidate_id: &CandidateId,
        writer: &P,
        limit: Duration,
    ) -> Result<AcceptOutcome, RecruitingError>
    where
        P: PitchWriter + ?Sized,
    {
        let reservation =
            self.queue
                .reserve(candidate_id, &[ReviewStatus::Viewed], ReviewStatus::Accepted)?;

        let drafted = {
            let view = reservation.view();
            with_deadline(
                limit,
                writer.draft(&self.job, &view.candidate, &view.assessment),
            )
            .await
        };
        let pitch = drafted.and_then(|pitch| {
            if pitch.subject.trim().is_empty() || pitch.body.trim().is_empty() {
                Err(AgentError::InvalidResponse(
                    "pitch subject and body must not be blank".to_string(),
                ))
            } else {
                Ok(pitch)
            }
        });
        let pitch = match pitch {
            Ok(pitch) => pitch,
            Err(err) => {
                warn!(job_id = %self.job.id, %candidate_id, error = %err, "pitch drafting failed");
                return Err(err.into());
            }
        };

        let candidate = reservation.commit()?;
        {
            let mut state = self.lock();
            if state.current.as_ref() == Some(candidate_id) {
                state.current = None;
            }
            state.outreach.insert(
                candidate_id.clone(),
                OutreachSession::new(&candidate.candidate, pitch.clone()),
            );
            state.latest_pitch = Some(candidate_id.clone());
        }

        info!(job_id = %self.job.id, %candidate_id, reference = %pitch.reference, "candidate accepted");
        Ok(AcceptOutcome { candidate, pitch })
    }

    /// `viewed -> rejected`, then hand out the next candidate.
    pub fn reject(&self, candidate_id: &CandidateId) -> Result<ReviewStep, RecruitingError> {
        self.queue
            .transition(candidate_id, &[ReviewStatus::Viewed], ReviewStatus::Rejected)?;
        {
            let mut state = self.lock();
            if state.current.as_ref() == Some(candidate_id) {
                state.current = None;
            }
        }
        info!(job_id = %self.job.id, %candidate_id, "candidate rejected");
        Ok(self.advance())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let (current, pitch) = {
            let state = self.lock();
            let pitch = state
                .latest_pitch
                .as_ref()
                .and_then(|id| state.outreach.get(id))
                .map(OutreachSession::view);
            (state.current.clone(), pitch)
        };

        SessionSnapshot {
            candidate: current.and_then(|id| self.queue.entry(&id).ok()),
            pitch,
        }
    }

    pub fn outreach(&self, candidate_id: &CandidateId) -> Result<OutreachView, RecruitingError> {
        self.lock()
            .outreach
            .get(candidate_id)
            .map(OutreachSession::view)
            .ok_or_else(|| RecruitingError::PitchNotFound(candidate_id.clone()))
    }

    pub fn edit_pitch(
        &self,
        candidate_id: &CandidateId,
        subject: String,
        body: String,
    ) -> Result<OutreachView, RecruitingError> {
        let mut state = self.lock();
        let session = state
            .outreach
            .get_mut(candidate_id)
            .ok_or_else(|| RecruitingError::PitchNotFound(candidate_id.clone()))?;
        session.edit(subject, body)?;
        Ok(session.view())
    }

    /// `editing -> sending -> sent`; the candidate becomes `contacted` only after delivery.
    ///
    /// A failed delivery puts the pitch back into `editing`. Nothing is retried.
    pub async fn send_pitch<O>(
        &self,
        candidate_id: &CandidateId,
        reference: &PitchRef,
        sender: &O,
        limit: Duration,
    ) -> Result<OutreachView, RecruitingError>
    where
        O: OutreachSender + ?Sized,
    {
        let request = {
            let mut state = self.lock();
            let session = state
                .outreach
                .get_mut(candidate_id)
                .ok_or_else(|| RecruitingError::PitchNotFound(candidate_id.clone()))?;
            session.begin_send(reference)?
        };

        let pending = PendingSend {
            session: self,
            candidate_id,
            settled: false,
        };

        let receipt = match with_deadline(limit, sender.send(&request)).await {
            Ok(receipt) => receipt,
            Err(err) => {
                warn!(job_id = %self.job.id, %candidate_id, error = %err, "outreach send failed");
                pending.fail(err.to_string());
                return Err(err.into());
            }
        };

        if let Err(err) = self.queue.transition(
            candidate_id,
            &[ReviewStatus::Accepted],
            ReviewStatus::Contacted,
        ) {
            pending.fail(err.to_string());
            return Err(err.into());
        }

        info!(job_id = %self.job.id, %candidate_id, reference = %reference, "outreach sent");
        pending
            .succeed(receipt)
            .ok_or_else(|| RecruitingError::PitchNotFound(candidate_id.clone()))
    }

    /// Drop the pitch without sending; the candidate stays `accepted`.
    pub fn dismiss_pitch(&self, candidate_id: &CandidateId) -> Result<OutreachView, RecruitingError> {
        let mut state = self.lock();
        let session = state
            .outreach
            .get_mut(candidate_id)
            .ok_or_else(|| RecruitingError::PitchNotFound(candidate_id.clone()))?;
        session.dismiss()?;
        let view = session.view();

        state.outreach.remove(candidate_id);
        if state.latest_pitch.as_ref() == Some(candidate_id) {
            state.latest_pitch = None;
        }
        info!(job_id = %self.job.id, %candidate_id, "pitch dismissed");
        Ok(view)
    }
}

/// Returns the pitch to `editing` if the send future is dropped mid-flight.
struct PendingSend<'a> {
    session: &'a ReviewSession,
    candidate_id: &'a CandidateId,
    settled: bool,
}

impl PendingSend<'_> {
    fn fail(mut self, error: String) {
        self.settled = true;
        if let Some(session) = self.session.lock().outreach.get_mut(self.candidate_id) {
            session.mark_failed(error);
        }
    }

    fn succeed(mut self, receipt: OutreachReceipt) -> Option<OutreachView> {
        self.settled = true;
        let mut state = self.session.lock();
        let session = state.outreach.get_mut(self.candidate_id)?;
        session.mark_sent(receipt);
        Some(session.view())
    }
}

impl Drop for PendingSend<'_> {
    fn drop(&mut self) {
        if !self.settled {
            if let Some(session) = self.session.lock().outreach.get_mut(self.candidate_id) {
                session.mark_failed("send interrupted before completion".to_string());
            }
        }
    }
}
