use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;
use tokio::sync::Notify;

use crate::config::RecruitingConfig;
use crate::workflows::recruiting::agents::{
    AgentError, OutreachReceipt, OutreachRequest, OutreachSender, PitchWriter, SourcingAgent,
};
use crate::workflows::recruiting::domain::{
    Candidate, CandidateProfile, Job, JobDraft, JobId, Match, Pitch, PitchRef, SkillsInput,
    SourcedCandidate,
};
use crate::workflows::recruiting::queue::CandidateQueue;
use crate::workflows::recruiting::{recruiting_router, RecruitingService};

pub(super) type TestService = RecruitingService<ScriptedSourcing, CountingPitchWriter, RecordingSender>;

pub(super) fn profile(name: &str, company: &str) -> CandidateProfile {
    CandidateProfile {
        name: name.to_string(),
        current_role: "Software Engineer".to_string(),
        current_company: company.to_string(),
        years_experience: 6,
        location: "Remote".to_string(),
        skills: vec!["React".to_string(), "AWS".to_string()],
        summary: format!("{name} ships web products."),
        email: Some(format!(
            "{}@example.com",
            name.to_ascii_lowercase().replace(' ', ".")
        )),
        profile_url: None,
    }
}

pub(super) fn sourced(name: &str, score: u8) -> SourcedCandidate {
    SourcedCandidate {
        profile: profile(name, "Northwind Labs"),
        assessment: Match {
            score,
            highlights: vec![format!("{name} covers the stack")],
            reasoning: "Strong overlap with required skills.".to_string(),
            rank_position: 0,
        },
    }
}

pub(super) fn queue_with(names: &[&str]) -> Arc<CandidateQueue> {
    let queue = Arc::new(CandidateQueue::new(JobId("job-0001".to_string())));
    let batch = names
        .iter()
        .enumerate()
        .map(|(rank, name)| sourced(name, 90 - rank as u8))
        .collect();
    queue.append(batch);
    queue
}

pub(super) fn draft() -> JobDraft {
    JobDraft {
        title: "Senior Full-Stack Engineer".to_string(),
        description: "Build the reviewer console.".to_string(),
        required_skills: SkillsInput::Csv("React, Node.js, AWS".to_string()),
        experience_level: "Senior".to_string(),
        location: "Remote".to_string(),
        company_name: Some("Northwind Labs".to_string()),
        company_website: Some("https://northwind.example".to_string()),
    }
}

pub(super) fn test_config() -> RecruitingConfig {
    RecruitingConfig {
        batch_size: 3,
        follow_up_batch_size: 3,
        source_on_create: false,
        sourcing_timeout: Duration::from_secs(5),
        pitch_timeout: Duration::from_secs(5),
        outreach_timeout: Duration::from_secs(5),
    }
}

pub(super) struct Harness {
    pub(super) service: Arc<TestService>,
    pub(super) sourcing: Arc<ScriptedSourcing>,
    pub(super) writer: Arc<CountingPitchWriter>,
    pub(super) sender: Arc<RecordingSender>,
}

pub(super) fn harness(config: RecruitingConfig) -> Harness {
    let sourcing = Arc::new(ScriptedSourcing::default());
    let writer = Arc::new(CountingPitchWriter::default());
    let sender = Arc::new(RecordingSender::default());
    let service = Arc::new(RecruitingService::new(
        sourcing.clone(),
        writer.clone(),
        sender.clone(),
        config,
    ));
    Harness {
        service,
        sourcing,
        writer,
        sender,
    }
}

/// Create a job and wait for one sourcing run of `config.batch_size` candidates.
pub(super) async fn sourced_job(harness: &Harness) -> JobId {
    let job = harness.service.create_job(draft()).expect("valid job");
    harness
        .service
        .source_more(&job.id)
        .expect("sourcing starts")
        .wait()
        .await;
    job.id.clone()
}

/// Sourcing agent that numbers its candidates and can be held, delayed or failed.
#[derive(Default)]
pub(super) struct ScriptedSourcing {
    calls: AtomicUsize,
    issued: AtomicUsize,
    fail: AtomicBool,
    delay: Mutex<Option<Duration>>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl ScriptedSourcing {
    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(super) fn fail_with_provider_error(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub(super) fn delay_by(&self, delay: Duration) {
        *self.delay.lock().expect("delay mutex poisoned") = Some(delay);
    }

    /// Hold every call until the returned notify fires.
    pub(super) fn hold(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().expect("gate mutex poisoned") = Some(gate.clone());
        gate
    }
}

#[async_trait]
impl SourcingAgent for ScriptedSourcing {
    async fn generate(
        &self,
        _job: &Job,
        batch_size: usize,
    ) -> Result<Vec<SourcedCandidate>, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.gate.lock().expect("gate mutex poisoned").clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let delay = *self.delay.lock().expect("delay mutex poisoned");
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(AgentError::Provider("sourcing quota exhausted".to_string()));
        }

        Ok((0..batch_size)
            .map(|rank| {
                let serial = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
                let mut entry = sourced(&format!("Candidate {serial}"), 95 - rank as u8);
                entry.assessment.rank_position = rank as u32 + 1;
                entry
            })
            .collect())
    }
}

/// Pitch writer that counts calls and can fail or stall.
#[derive(Default)]
pub(super) struct CountingPitchWriter {
    calls: AtomicUsize,
    fail: AtomicBool,
    blank: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl CountingPitchWriter {
    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(super) fn fail_with_provider_error(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub(super) fn return_blank_pitches(&self, blank: bool) {
        self.blank.store(blank, Ordering::SeqCst);
    }

    pub(super) fn delay_by(&self, delay: Duration) {
        *self.delay.lock().expect("delay mutex poisoned") = Some(delay);
    }
}

#[async_trait]
impl PitchWriter for CountingPitchWriter {
    async fn draft(
        &self,
        job: &Job,
        candidate: &Candidate,
        _assessment: &Match,
    ) -> Result<Pitch, AgentError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        let delay = *self.delay.lock().expect("delay mutex poisoned");
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(AgentError::Provider("pitch model unavailable".to_string()));
        }
        if self.blank.load(Ordering::SeqCst) {
            return Ok(Pitch {
                subject: String::new(),
                body: " ".to_string(),
                reference: PitchRef(format!("pitch-{call}")),
            });
        }

        Ok(Pitch {
            subject: format!("{} role", job.title),
            body: format!("Hi {}, let's talk.", candidate.profile.name),
            reference: PitchRef(format!("pitch-{call}")),
        })
    }
}

/// Outreach sender that records requests; can be told to fail the next sends.
#[derive(Default)]
pub(super) struct RecordingSender {
    sent: Mutex<Vec<OutreachRequest>>,
    attempts: AtomicUsize,
    failures_left: AtomicUsize,
}

impl RecordingSender {
    pub(super) fn sent(&self) -> Vec<OutreachRequest> {
        self.sent.lock().expect("sent mutex poisoned").clone()
    }

    pub(super) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub(super) fn fail_next(&self, count: usize) {
        self.failures_left.store(count, Ordering::SeqCst);
    }
}

#[async_trait]
impl OutreachSender for RecordingSender {
    async fn send(&self, request: &OutreachRequest) -> Result<OutreachReceipt, AgentError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(AgentError::Provider("smtp relay refused".to_string()));
        }

        self.sent
            .lock()
            .expect("sent mutex poisoned")
            .push(request.clone());
        Ok(OutreachReceipt {
            reference: request.reference.clone(),
            detail: "delivered".to_string(),
        })
    }
}

pub(super) fn router_for(harness: &Harness) -> axum::Router {
    recruiting_router(harness.service.clone())
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
