use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::Utc;

use super::domain::{CompanyProfile, ExperienceLevel, Job, JobDraft, JobId, SkillsInput};
use super::queue::CandidateQueue;
use super::review::ReviewSession;

/// User-correctable problems with a create-job payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("experience_level must be one of Junior, Mid, Senior, Lead (found '{0}')")]
    UnknownExperienceLevel(String),
    #[error("company_website must start with http:// or https:// (found '{0}')")]
    InvalidWebsite(String),
}

/// Split, trim, and de-duplicate skills while preserving their order.
pub fn normalize_skills(input: &SkillsInput) -> Vec<String> {
    let raw: Vec<&str> = match input {
        SkillsInput::Csv(value) => value.split(',').collect(),
        SkillsInput::List(values) => values
            .iter()
            .flat_map(|value| value.split(','))
            .collect(),
    };

    let mut skills: Vec<String> = Vec::with_capacity(raw.len());
    for skill in raw.into_iter().map(str::trim).filter(|skill| !skill.is_empty()) {
        if !skills.iter().any(|existing| existing == skill) {
            skills.push(skill.to_string());
        }
    }
    skills
}

fn required(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(trimmed.to_string())
    }
}

fn company_from(draft: &JobDraft) -> Result<Option<CompanyProfile>, ValidationError> {
    let website = match draft.company_website.as_deref().map(str::trim) {
        Some(site) if site.is_empty() => None,
        Some(site) if site.starts_with("http://") || site.starts_with("https://") => {
            Some(site.to_string())
        }
        Some(site) => return Err(ValidationError::InvalidWebsite(site.to_string())),
        None => None,
    };

    let name = draft
        .company_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());

    match (name, website) {
        (Some(name), website) => Ok(Some(CompanyProfile {
            name: name.to_string(),
            website,
        })),
        (None, Some(_)) => Err(ValidationError::MissingField("company_name")),
        (None, None) => Ok(None),
    }
}

/// In-memory registry of job postings. Each job is stored together with its
/// review session, which owns the job's candidate queue.
#[derive(Debug, Default)]
pub struct JobStore {
    jobs: RwLock<HashMap<JobId, Arc<ReviewSession>>>,
    sequence: AtomicU64,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the draft, then publish the job with its session and empty
    /// queue in a single insert.
    pub fn create_job(&self, draft: JobDraft) -> Result<Arc<Job>, ValidationError> {
        let title = required(&draft.title, "title")?;
        let description = required(&draft.description, "description")?;
        let required_skills = normalize_skills(&draft.required_skills);
        if required_skills.is_empty() {
            return Err(ValidationError::MissingField("required_skills"));
        }
        let level = required(&draft.experience_level, "experience_level")?;
        let experience_level = ExperienceLevel::parse(&level)
            .ok_or(ValidationError::UnknownExperienceLevel(level))?;
        let location = required(&draft.location, "location")?;
        let company = company_from(&draft)?;

        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let id = JobId(format!("job-{sequence:04}"));
        let job = Arc::new(Job {
            id: id.clone(),
            title,
            description,
            required_skills,
            experience_level,
            location,
            company,
            created_at: Utc::now(),
        });

        let queue = Arc::new(CandidateQueue::new(id.clone()));
        let session = Arc::new(ReviewSession::new(Arc::clone(&job), queue));
        self.jobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, session);

        Ok(job)
    }

    pub fn get_job(&self, id: &JobId) -> Option<Arc<Job>> {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .map(|session| Arc::clone(session.job()))
    }

    pub fn session(&self, id: &JobId) -> Option<Arc<ReviewSession>> {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Jobs ordered by identifier, i.e. creation order.
    pub fn list_jobs(&self) -> Vec<Arc<Job>> {
        let mut jobs: Vec<Arc<Job>> = self
            .jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|session| Arc::clone(session.job()))
            .collect();
        jobs.sort_by(|left, right| left.id.cmp(&right.id));
        jobs
    }
}
