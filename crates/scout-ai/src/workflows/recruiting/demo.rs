//! Deterministic stand-ins for the external agents, used by the CLI demo and
//! local runs without provider credentials.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use super::agents::{
    AgentError, OutreachReceipt, OutreachRequest, OutreachSender, PitchWriter, SourcingAgent,
};
use super::domain::{
    Candidate, CandidateProfile, ExperienceLevel, Job, Match, Pitch, PitchRef, SourcedCandidate,
};

const FIRST_NAMES: [&str; 10] = [
    "Avery", "Jordan", "Priya", "Mateo", "Chen", "Amara", "Noah", "Sofia", "Kenji", "Leila",
];
const LAST_NAMES: [&str; 10] = [
    "Nguyen", "Okafor", "Schmidt", "Patel", "Garcia", "Kowalski", "Haddad", "Silva", "Tanaka",
    "Brennan",
];
const COMPANIES: [&str; 6] = [
    "Northwind Labs",
    "Bluefin Analytics",
    "Cobalt Systems",
    "Harbor Health",
    "Lumen Retail",
    "Quarry Logistics",
];
const CITIES: [&str; 5] = ["Austin, TX", "Denver, CO", "Remote", "Chicago, IL", "Seattle, WA"];
const ADJACENT_SKILLS: [&str; 6] = ["Docker", "GraphQL", "Terraform", "Python", "Kafka", "Go"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FitTier {
    Strong,
    Medium,
    Weak,
}

impl FitTier {
    // 40% strong, 40% medium, 20% weak.
    fn for_slot(slot: usize) -> Self {
        match slot % 5 {
            0 | 1 => FitTier::Strong,
            2 | 3 => FitTier::Medium,
            _ => FitTier::Weak,
        }
    }
}

fn experience_band(level: ExperienceLevel) -> (u8, u8) {
    match level {
        ExperienceLevel::Junior => (0, 2),
        ExperienceLevel::Mid => (3, 5),
        ExperienceLevel::Senior => (6, 9),
        ExperienceLevel::Lead => (10, 15),
    }
}

/// Synthesizes a ranked candidate pool from the job's own requirements.
#[derive(Debug, Default)]
pub struct DemoSourcingAgent {
    latency: Duration,
    issued: AtomicU64,
}

impl DemoSourcingAgent {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            issued: AtomicU64::new(0),
        }
    }

    fn profile(&self, job: &Job, serial: u64, tier: FitTier) -> CandidateProfile {
        let first = FIRST_NAMES[(serial as usize) % FIRST_NAMES.len()];
        let last = LAST_NAMES[(serial as usize / FIRST_NAMES.len()) % LAST_NAMES.len()];
        let company = COMPANIES[(serial as usize) % COMPANIES.len()];
        let (low, high) = experience_band(job.experience_level);

        let required = &job.required_skills;
        let (mut skills, years, location): (Vec<String>, u8, String) = match tier {
            FitTier::Strong => (required.clone(), high, job.location.clone()),
            FitTier::Medium => (
                required.iter().take(required.len().div_ceil(2)).cloned().collect(),
                low,
                CITIES[(serial as usize) % CITIES.len()].to_string(),
            ),
            FitTier::Weak => (
                required.iter().take(1).cloned().collect(),
                low.saturating_sub(2),
                CITIES[(serial as usize + 2) % CITIES.len()].to_string(),
            ),
        };
        skills.push(ADJACENT_SKILLS[(serial as usize) % ADJACENT_SKILLS.len()].to_string());

        let role = match tier {
            FitTier::Strong => job.title.clone(),
            FitTier::Medium => format!("{} Engineer", job.experience_level.label()),
            FitTier::Weak => "Technical Support Specialist".to_string(),
        };

        CandidateProfile {
            name: format!("{first} {last}"),
            current_role: role.clone(),
            current_company: company.to_string(),
            years_experience: years,
            location,
            skills,
            summary: format!("{role} at {company} with {years} years of hands-on delivery."),
            email: Some(format!(
                "{}.{}.{serial}@example.com",
                first.to_ascii_lowercase(),
                last.to_ascii_lowercase()
            )),
            profile_url: None,
        }
    }

    fn assess(job: &Job, profile: &CandidateProfile) -> Match {
        let required = job.required_skills.len().max(1);
        let covered = job
            .required_skills
            .iter()
            .filter(|skill| {
                profile
                    .skills
                    .iter()
                    .any(|owned| owned.eq_ignore_ascii_case(skill))
            })
            .count();
        let (low, high) = experience_band(job.experience_level);
        let in_band = (low..=high).contains(&profile.years_experience);
        let same_location = profile.location.eq_ignore_ascii_case(&job.location);

        let skill_points = (covered * 70 / required) as u8;
        let experience_points = if in_band { 20 } else { 5 };
        let location_points = if same_location { 10 } else { 4 };
        let score = (skill_points + experience_points + location_points).min(Match::MAX_SCORE);

        Match {
            score,
            highlights: vec![
                format!("Covers {covered}/{required} required skills"),
                format!(
                    "{} years of experience ({} band {}-{})",
                    profile.years_experience,
                    job.experience_level.label(),
                    low,
                    high
                ),
                format!("Based in {}", profile.location),
            ],
            reasoning: format!(
                "{} matches {covered} of {required} required skills and is {} the {} experience band.",
                profile.name,
                if in_band { "within" } else { "outside" },
                job.experience_level.label()
            ),
            rank_position: 0,
        }
    }
}

#[async_trait]
impl SourcingAgent for DemoSourcingAgent {
    async fn generate(
        &self,
        job: &Job,
        batch_size: usize,
    ) -> Result<Vec<SourcedCandidate>, AgentError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let mut batch: Vec<SourcedCandidate> = (0..batch_size)
            .map(|slot| {
                let serial = self.issued.fetch_add(1, Ordering::Relaxed);
                let profile = self.profile(job, serial, FitTier::for_slot(slot));
                let assessment = Self::assess(job, &profile);
                SourcedCandidate {
                    profile,
                    assessment,
                }
            })
            .collect();

        batch.sort_by(|left, right| right.assessment.score.cmp(&left.assessment.score));
        for (rank, sourced) in batch.iter_mut().enumerate() {
            sourced.assessment.rank_position = rank as u32 + 1;
        }

        Ok(batch)
    }
}

/// Fills a fixed email template from the candidate's profile and match highlights.
#[derive(Debug, Default)]
pub struct TemplatePitchWriter;

#[async_trait]
impl PitchWriter for TemplatePitchWriter {
    async fn draft(
        &self,
        job: &Job,
        candidate: &Candidate,
        assessment: &Match,
    ) -> Result<Pitch, AgentError> {
        let company = job
            .company
            .as_ref()
            .map(|company| company.name.as_str())
            .unwrap_or("our team");
        let first_name = candidate
            .profile
            .name
            .split_whitespace()
            .next()
            .unwrap_or(candidate.profile.name.as_str());
        let highlight = assessment
            .highlights
            .first()
            .map(String::as_str)
            .unwrap_or("your background");

        let body = format!(
            "Hi {first_name},\n\n\
             Your work as {role} at {current} caught our attention. {highlight}, which is exactly \
             what the {title} role at {company} needs.\n\n\
             The position is based in {location} and focuses on {skills}.\n\n\
             Would you be open to a 20 minute call this week?\n",
            role = candidate.profile.current_role,
            current = candidate.profile.current_company,
            title = job.title,
            location = job.location,
            skills = job.required_skills.join(", "),
        );

        Ok(Pitch {
            subject: format!("{} opportunity at {company}", job.title),
            body,
            reference: PitchRef::generate(),
        })
    }
}

/// Logs the email instead of delivering it.
#[derive(Debug, Default)]
pub struct LoggingOutreachSender;

#[async_trait]
impl OutreachSender for LoggingOutreachSender {
    async fn send(&self, request: &OutreachRequest) -> Result<OutreachReceipt, AgentError> {
        info!(
            reference = %request.reference,
            recipient = request.recipient.as_deref().unwrap_or("<none>"),
            subject = %request.subject,
            "outreach email logged (demo mode)"
        );
        Ok(OutreachReceipt {
            reference: request.reference.clone(),
            detail: "email logged (demo mode)".to_string(),
        })
    }
}
