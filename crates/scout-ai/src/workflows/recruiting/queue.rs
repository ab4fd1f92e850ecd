use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use super::domain::{
    Candidate, CandidateId, CandidateView, JobId, Match, ReviewStatus, SourcedCandidate,
};
use super::stats::PipelineStats;

/// Errors raised by queue operations. None of them mutate state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("candidate {0} not found")]
    CandidateNotFound(CandidateId),
    #[error("candidate {candidate_id} cannot move from {from} to {to}")]
    InvalidTransition {
        candidate_id: CandidateId,
        from: ReviewStatus,
        to: ReviewStatus,
    },
    #[error("candidate {0} already has a decision in flight")]
    DecisionInFlight(CandidateId),
    #[error("sourcing already in progress for job {0}")]
    AlreadyInProgress(JobId),
}

/// Outcome of appending a sourcing batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppendReport {
    pub appended: Vec<CandidateId>,
    pub duplicates: usize,
    pub invalid: usize,
}

/// Coarse state of the job's sourcing pipeline, suitable for polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourcingStatus {
    Idle,
    InProgress,
    Completed,
    Failed,
}

/// Summary of the most recently finished sourcing run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourcingRunSummary {
    pub batch_size: usize,
    pub appended: usize,
    pub duplicates: usize,
    pub invalid: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourcingStatusView {
    pub status: SourcingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_run: Option<SourcingRunSummary>,
}

#[derive(Debug, Clone, Copy)]
struct InFlightRun {
    batch_size: usize,
    started_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct SourcingState {
    in_flight: Option<InFlightRun>,
    last_run: Option<SourcingRunSummary>,
}

#[derive(Debug)]
struct QueueEntry {
    candidate: Candidate,
    assessment: Match,
    status: ReviewStatus,
    reserved: bool,
}

impl QueueEntry {
    fn view(&self) -> CandidateView {
        CandidateView {
            candidate: self.candidate.clone(),
            assessment: self.assessment.clone(),
            status: self.status,
        }
    }
}

#[derive(Debug, Default)]
struct QueueState {
    entries: Vec<QueueEntry>,
    index: HashMap<CandidateId, usize>,
    identities: HashSet<String>,
    sequence: u64,
    // Every entry before this position has left `pending`.
    first_pending: usize,
    stats: PipelineStats,
    sourcing: SourcingState,
}

impl QueueState {
    fn append(&mut self, job_id: &JobId, batch: Vec<SourcedCandidate>) -> AppendReport {
        let mut report = AppendReport::default();

        for SourcedCandidate {
            profile,
            assessment,
        } in batch
        {
            let Some(identity) = profile.identity_key() else {
                warn!(%job_id, "dropping sourced candidate without identity");
                report.invalid += 1;
                continue;
            };
            if !assessment.has_valid_score() {
                warn!(%job_id, score = assessment.score, "dropping sourced candidate with out-of-range score");
                report.invalid += 1;
                continue;
            }
            if !self.identities.insert(identity) {
                debug!(%job_id, name = %profile.name, "dropping duplicate sourced candidate");
                report.duplicates += 1;
                continue;
            }

            self.sequence += 1;
            let id = CandidateId(format!("cand-{:04}", self.sequence));
            self.index.insert(id.clone(), self.entries.len());
            self.entries.push(QueueEntry {
                candidate: Candidate {
                    id: id.clone(),
                    job_id: job_id.clone(),
                    profile,
                },
                assessment,
                status: ReviewStatus::Pending,
                reserved: false,
            });
            self.stats.record(ReviewStatus::Pending);
            report.appended.push(id);
        }

        report
    }

    fn position(&self, id: &CandidateId) -> Result<usize, QueueError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| QueueError::CandidateNotFound(id.clone()))
    }

    fn check(
        &self,
        id: &CandidateId,
        allowed_from: &[ReviewStatus],
        to: ReviewStatus,
    ) -> Result<usize, QueueError> {
        let position = self.position(id)?;
        let entry = &self.entries[position];
        if entry.reserved {
            return Err(QueueError::DecisionInFlight(id.clone()));
        }
        if !allowed_from.contains(&entry.status) || !entry.status.permits(to) {
            return Err(QueueError::InvalidTransition {
                candidate_id: id.clone(),
                from: entry.status,
                to,
            });
        }
        Ok(position)
    }

    fn apply(&mut self, position: usize, to: ReviewStatus) -> CandidateView {
        let entry = &mut self.entries[position];
        let from = entry.status;
        entry.status = to;
        self.stats.shift(from, to);
        entry.view()
    }

    fn recount(&self) -> PipelineStats {
        PipelineStats::recount(self.entries.iter().map(|entry| entry.status))
    }
}

/// Ordered review queue for one job.
///
/// `append`, `next_pending`, `transition` and reservations all run under one
/// mutex. No method holds the lock across an external call.
#[derive(Debug)]
pub struct CandidateQueue {
    job_id: JobId,
    state: Mutex<QueueState>,
}

impl CandidateQueue {
    pub fn new(job_id: JobId) -> Self {
        Self {
            job_id,
            state: Mutex::new(QueueState::default()),
        }
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a batch as `pending`, dropping duplicates and malformed entries.
    pub fn append(&self, batch: Vec<SourcedCandidate>) -> AppendReport {
        self.lock().append(&self.job_id, batch)
    }

    /// Hand out the oldest pending entry, flipping it to `viewed`.
    pub fn next_pending(&self) -> Option<CandidateView> {
        let mut state = self.lock();
        let start = state.first_pending;
        let found = state.entries[start..]
            .iter()
            .position(|entry| entry.status == ReviewStatus::Pending)
            .map(|offset| start + offset);

        match found {
            Some(position) => {
                state.first_pending = position + 1;
                let view = state.apply(position, ReviewStatus::Viewed);
                Some(view)
            }
            None => {
                state.first_pending = state.entries.len();
                None
            }
        }
    }

    /// Apply a status change if the current status is in `allowed_from` and the edge exists.
    pub fn transition(
        &self,
        id: &CandidateId,
        allowed_from: &[ReviewStatus],
        to: ReviewStatus,
    ) -> Result<CandidateView, QueueError> {
        let mut state = self.lock();
        let position = state.check(id, allowed_from, to)?;
        Ok(state.apply(position, to))
    }

    /// Claim an entry for a transition that depends on an external call.
    ///
    /// The observable status is unchanged until [`Reservation::commit`]; other
    /// transitions and reservations on the entry fail with
    /// [`QueueError::DecisionInFlight`] meanwhile. Dropping the reservation
    /// releases the entry.
    pub fn reserve(
        self: &Arc<Self>,
        id: &CandidateId,
        allowed_from: &[ReviewStatus],
        to: ReviewStatus,
    ) -> Result<Reservation, QueueError> {
        let mut state = self.lock();
        let position = state.check(id, allowed_from, to)?;
        let entry = &mut state.entries[position];
        entry.reserved = true;

        Ok(Reservation {
            queue: Arc::clone(self),
            view: entry.view(),
            target: to,
            settled: false,
        })
    }

    pub fn entry(&self, id: &CandidateId) -> Result<CandidateView, QueueError> {
        let state = self.lock();
        let position = state.position(id)?;
        Ok(state.entries[position].view())
    }

    pub fn list_by_status(&self, status: ReviewStatus) -> Vec<CandidateView> {
        self.lock()
            .entries
            .iter()
            .filter(|entry| entry.status == status)
            .map(QueueEntry::view)
            .collect()
    }

    pub fn stats(&self) -> PipelineStats {
        let state = self.lock();
        debug_assert_eq!(state.stats, state.recount());
        state.stats
    }

    /// Count every entry from scratch instead of using the maintained tallies.
    pub fn recount(&self) -> PipelineStats {
        self.lock().recount()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn sourcing_status(&self) -> SourcingStatusView {
        let state = self.lock();
        let sourcing = &state.sourcing;
        let status = match (&sourcing.in_flight, &sourcing.last_run) {
            (Some(_), _) => SourcingStatus::InProgress,
            (None, Some(run)) if run.error.is_some() => SourcingStatus::Failed,
            (None, Some(_)) => SourcingStatus::Completed,
            (None, None) => SourcingStatus::Idle,
        };

        SourcingStatusView {
            status,
            started_at: sourcing.in_flight.map(|run| run.started_at),
            last_run: sourcing.last_run.clone(),
        }
    }

    /// Set the in-flight flag, failing if a run is already outstanding.
    pub(crate) fn begin_sourcing(&self, batch_size: usize) -> Result<(), QueueError> {
        let mut state = self.lock();
        if state.sourcing.in_flight.is_some() {
            return Err(QueueError::AlreadyInProgress(self.job_id.clone()));
        }
        state.sourcing.in_flight = Some(InFlightRun {
            batch_size,
            started_at: Utc::now(),
        });
        Ok(())
    }

    /// Append the batch and clear the in-flight flag in one critical section.
    pub(crate) fn complete_sourcing(&self, batch: Vec<SourcedCandidate>) -> AppendReport {
        let mut state = self.lock();
        let report = state.append(&self.job_id, batch);
        let run = state.sourcing.in_flight.take();
        state.sourcing.last_run = Some(SourcingRunSummary {
            batch_size: run.map_or(0, |run| run.batch_size),
            appended: report.appended.len(),
            duplicates: report.duplicates,
            invalid: report.invalid,
            error: None,
            started_at: run.map_or_else(Utc::now, |run| run.started_at),
            finished_at: Utc::now(),
        });
        report
    }

    /// Clear the in-flight flag without touching the entries.
    pub(crate) fn fail_sourcing(&self, error: String) {
        let mut state = self.lock();
        let run = state.sourcing.in_flight.take();
        state.sourcing.last_run = Some(SourcingRunSummary {
            batch_size: run.map_or(0, |run| run.batch_size),
            appended: 0,
            duplicates: 0,
            invalid: 0,
            error: Some(error),
            started_at: run.map_or_else(Utc::now, |run| run.started_at),
            finished_at: Utc::now(),
        });
    }

    fn settle(&self, id: &CandidateId, commit_to: Option<ReviewStatus>) -> Option<CandidateView> {
        let mut state = self.lock();
        let position = state.position(id).ok()?;
        state.entries[position].reserved = false;
        commit_to.map(|to| state.apply(position, to))
    }
}

/// Exclusive claim on a queue entry while an external call is outstanding.
#[derive(Debug)]
pub struct Reservation {
    queue: Arc<CandidateQueue>,
    view: CandidateView,
    target: ReviewStatus,
    settled: bool,
}

impl Reservation {
    /// Snapshot of the entry taken when the reservation was made.
    pub fn view(&self) -> &CandidateView {
        &self.view
    }

    /// Apply the reserved transition and release the entry.
    pub fn commit(mut self) -> Result<CandidateView, QueueError> {
        self.settled = true;
        let id = self.view.candidate.id.clone();
        self.queue
            .settle(&id, Some(self.target))
            .ok_or(QueueError::CandidateNotFound(id))
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        if !self.settled {
            debug!(
                candidate_id = %self.view.candidate.id,
                target = %self.target,
                "releasing reservation without transition"
            );
            self.queue.settle(&self.view.candidate.id, None);
        }
    }
}
