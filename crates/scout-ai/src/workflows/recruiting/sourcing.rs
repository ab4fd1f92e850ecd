use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::agents::{with_deadline, AgentError, SourcingAgent};
use super::domain::{Job, JobId, SourcedCandidate};
use super::queue::{AppendReport, CandidateQueue, QueueError};

/// How a background sourcing run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourcingOutcome {
    Completed(AppendReport),
    Failed(AgentError),
}

/// Handle to a started sourcing run. Dropping it does not cancel the run.
#[derive(Debug)]
pub struct SourcingTicket {
    pub job_id: JobId,
    pub batch_size: usize,
    handle: JoinHandle<SourcingOutcome>,
}

impl SourcingTicket {
    /// Wait for the run to finish.
    pub async fn wait(self) -> SourcingOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(err) => SourcingOutcome::Failed(AgentError::Provider(format!(
                "sourcing task aborted: {err}"
            ))),
        }
    }
}

/// Starts sourcing runs, at most one in flight per job.
#[derive(Debug)]
pub struct SourcingCoordinator<S> {
    agent: Arc<S>,
    timeout: Duration,
}

impl<S> SourcingCoordinator<S>
where
    S: SourcingAgent + 'static,
{
    pub fn new(agent: Arc<S>, timeout: Duration) -> Self {
        Self { agent, timeout }
    }

    /// Claim the job's in-flight flag and run the agent on a spawned task.
    ///
    /// Must be called from within a tokio runtime. Returns
    /// [`QueueError::AlreadyInProgress`] without contacting the agent when a
    /// run is already outstanding.
    pub fn source_more(
        &self,
        job: Arc<Job>,
        queue: Arc<CandidateQueue>,
        batch_size: usize,
    ) -> Result<SourcingTicket, QueueError> {
        queue.begin_sourcing(batch_size)?;
        let in_flight = InFlight {
            queue,
            settled: false,
        };

        let job_id = job.id.clone();
        let handle = tokio::spawn(run(
            Arc::clone(&self.agent),
            job,
            in_flight,
            batch_size,
            self.timeout,
        ));

        Ok(SourcingTicket {
            job_id,
            batch_size,
            handle,
        })
    }
}

async fn run<S>(
    agent: Arc<S>,
    job: Arc<Job>,
    in_flight: InFlight,
    batch_size: usize,
    limit: Duration,
) -> SourcingOutcome
where
    S: SourcingAgent + ?Sized,
{
    info!(job_id = %job.id, batch_size, "sourcing run started");

    match with_deadline(limit, agent.generate(&job, batch_size)).await {
        Ok(batch) => {
            let report = in_flight.complete(batch);
            info!(
                job_id = %job.id,
                appended = report.appended.len(),
                duplicates = report.duplicates,
                invalid = report.invalid,
                "sourcing run completed"
            );
            SourcingOutcome::Completed(report)
        }
        Err(err) => {
            warn!(job_id = %job.id, error = %err, "sourcing run failed");
            in_flight.fail(err.to_string());
            SourcingOutcome::Failed(err)
        }
    }
}

/// Clears the job's in-flight flag however the run ends, including task abort.
struct InFlight {
    queue: Arc<CandidateQueue>,
    settled: bool,
}

impl InFlight {
    fn complete(mut self, batch: Vec<SourcedCandidate>) -> AppendReport {
        self.settled = true;
        self.queue.complete_sourcing(batch)
    }

    fn fail(mut self, error: String) {
        self.settled = true;
        self.queue.fail_sourcing(error);
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.settled {
            self.queue
                .fail_sourcing("sourcing run aborted before completion".to_string());
        }
    }
}
