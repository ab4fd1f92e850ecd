use chrono::{DateTime, Utc};
use serde::Serialize;

use super::agents::{OutreachReceipt, OutreachRequest};
use super::domain::{Candidate, CandidateId, Pitch, PitchRef};

/// Lifecycle of a drafted pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutreachState {
    Editing,
    Sending,
    Sent,
    Dismissed,
}

impl OutreachState {
    pub const fn label(self) -> &'static str {
        match self {
            OutreachState::Editing => "editing",
            OutreachState::Sending => "sending",
            OutreachState::Sent => "sent",
            OutreachState::Dismissed => "dismissed",
        }
    }
}

impl std::fmt::Display for OutreachState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OutreachError {
    #[error("pitch for candidate {candidate_id} is {state} and cannot be {action}")]
    NotEditing {
        candidate_id: CandidateId,
        state: OutreachState,
        action: &'static str,
    },
    #[error("reference {found} does not match the pitch for candidate {candidate_id}")]
    ReferenceMismatch {
        candidate_id: CandidateId,
        found: PitchRef,
    },
    #[error("pitch {0} must not be blank")]
    BlankField(&'static str),
}

/// Editable pitch owned by an accepted candidate.
#[derive(Debug, Clone)]
pub struct OutreachSession {
    candidate_id: CandidateId,
    candidate_name: String,
    recipient: Option<String>,
    pitch: Pitch,
    state: OutreachState,
    last_error: Option<String>,
    receipt: Option<OutreachReceipt>,
    sent_at: Option<DateTime<Utc>>,
}

/// Serializable snapshot of an outreach session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutreachView {
    pub candidate_id: CandidateId,
    pub state: OutreachState,
    pub pitch: Pitch,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
}

impl OutreachSession {
    pub fn new(candidate: &Candidate, pitch: Pitch) -> Self {
        Self {
            candidate_id: candidate.id.clone(),
            candidate_name: candidate.profile.name.clone(),
            recipient: candidate.profile.email.clone(),
            pitch,
            state: OutreachState::Editing,
            last_error: None,
            receipt: None,
            sent_at: None,
        }
    }

    pub fn candidate_id(&self) -> &CandidateId {
        &self.candidate_id
    }

    pub fn state(&self) -> OutreachState {
        self.state
    }

    pub fn pitch(&self) -> &Pitch {
        &self.pitch
    }

    fn ensure_editing(&self, action: &'static str) -> Result<(), OutreachError> {
        if self.state == OutreachState::Editing {
            Ok(())
        } else {
            Err(OutreachError::NotEditing {
                candidate_id: self.candidate_id.clone(),
                state: self.state,
                action,
            })
        }
    }

    /// Replace subject and body. Local only.
    pub fn edit(&mut self, subject: String, body: String) -> Result<&Pitch, OutreachError> {
        self.ensure_editing("edited")?;
        if subject.trim().is_empty() {
            return Err(OutreachError::BlankField("subject"));
        }
        if body.trim().is_empty() {
            return Err(OutreachError::BlankField("body"));
        }
        self.pitch.subject = subject;
        self.pitch.body = body;
        Ok(&self.pitch)
    }

    /// `editing -> sending`, returning the request to hand to the outreach agent.
    pub fn begin_send(&mut self, reference: &PitchRef) -> Result<OutreachRequest, OutreachError> {
        self.ensure_editing("sent")?;
        if reference != &self.pitch.reference {
            return Err(OutreachError::ReferenceMismatch {
                candidate_id: self.candidate_id.clone(),
                found: reference.clone(),
            });
        }

        self.state = OutreachState::Sending;
        Ok(OutreachRequest {
            reference: self.pitch.reference.clone(),
            candidate_name: self.candidate_name.clone(),
            recipient: self.recipient.clone(),
            subject: self.pitch.subject.clone(),
            body: self.pitch.body.clone(),
        })
    }

    /// `sending -> sent`.
    pub fn mark_sent(&mut self, receipt: OutreachReceipt) {
        self.state = OutreachState::Sent;
        self.last_error = None;
        self.receipt = Some(receipt);
        self.sent_at = Some(Utc::now());
    }

    /// `sending -> editing`, keeping the failure for the reviewer.
    pub fn mark_failed(&mut self, error: String) {
        if self.state == OutreachState::Sending {
            self.state = OutreachState::Editing;
        }
        self.last_error = Some(error);
    }

    pub fn dismiss(&mut self) -> Result<(), OutreachError> {
        self.ensure_editing("dismissed")?;
        self.state = OutreachState::Dismissed;
        Ok(())
    }

    pub fn view(&self) -> OutreachView {
        OutreachView {
            candidate_id: self.candidate_id.clone(),
            state: self.state,
            pitch: self.pitch.clone(),
            last_error: self.last_error.clone(),
            delivery: self.receipt.as_ref().map(|receipt| receipt.detail.clone()),
            sent_at: self.sent_at,
        }
    }
}
