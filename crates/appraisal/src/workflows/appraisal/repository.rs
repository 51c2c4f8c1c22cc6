use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::domain::{Cadre, FacultyInputs, FacultyKey, FormKind, ReviewContext};
use super::interaction::InteractionRecord;
use super::scoring::Scorecard;
use super::status::{AppraisalStatus, StatusChange};
use super::verification::VerificationLedger;

/// Everything stored for one faculty member's appraisal cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppraisalRecord {
    pub key: FacultyKey,
    pub status: AppraisalStatus,
    pub inputs: FacultyInputs,
    /// Draft while pending, frozen from submission onwards.
    pub scorecard: Option<Scorecard>,
    #[serde(default)]
    pub verification: BTreeMap<FormKind, VerificationLedger>,
    #[serde(default)]
    pub interaction: InteractionRecord,
    #[serde(default)]
    pub history: Vec<StatusChange>,
}

impl AppraisalRecord {
    pub fn new(key: FacultyKey, inputs: FacultyInputs) -> Self {
        Self {
            key,
            status: AppraisalStatus::Pending,
            inputs,
            scorecard: None,
            verification: BTreeMap::new(),
            interaction: InteractionRecord::default(),
            history: Vec::new(),
        }
    }

    pub fn cadre(&self) -> Cadre {
        self.inputs.cadre
    }

    pub(crate) fn transition(&mut self, ctx: &ReviewContext, to: AppraisalStatus) {
        self.history.push(StatusChange {
            from: self.status,
            to,
            actor_id: ctx.actor_id.clone(),
            role: ctx.role,
            at: Utc::now(),
        });
        self.status = to;
    }

    pub fn verification_complete(&self) -> bool {
        !self.verification.is_empty()
            && self
                .verification
                .values()
                .all(VerificationLedger::is_complete)
    }

    pub fn pending_sections(&self) -> usize {
        self.verification
            .values()
            .map(|ledger| ledger.verified_total().pending_sections.len())
            .sum()
    }

    pub fn status_view(&self) -> AppraisalStatusView {
        AppraisalStatusView {
            key: self.key.clone(),
            cadre: self.cadre(),
            status: self.status.label(),
            self_reported_total: self
                .scorecard
                .as_ref()
                .map(|scorecard| scorecard.self_reported_total),
            verification_complete: self.verification_complete(),
        }
    }
}

/// Storage abstraction over the external per-faculty document store.
pub trait AppraisalRepository: Send + Sync {
    fn insert(&self, record: AppraisalRecord) -> Result<AppraisalRecord, RepositoryError>;
    /// Applies `change` to each of the distinct `keys` while holding the store's
    /// write lock. Changes land on copies; nothing is written unless every
    /// change succeeds. A missing key fails with `NotFound`.
    fn modify<E, F>(&self, keys: &[FacultyKey], change: F) -> Result<(), E>
    where
        F: FnMut(&mut AppraisalRecord) -> Result<(), E>,
        E: From<RepositoryError>;
    fn fetch(&self, key: &FacultyKey) -> Result<Option<AppraisalRecord>, RepositoryError>;
    fn list_department(&self, department: &str) -> Result<Vec<AppraisalRecord>, RepositoryError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Compact status exposed after mutations.
#[derive(Debug, Clone, Serialize)]
pub struct AppraisalStatusView {
    pub key: FacultyKey,
    pub cadre: Cadre,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub self_reported_total: Option<f64>,
    pub verification_complete: bool,
}
