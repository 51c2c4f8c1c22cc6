//! One-way status ratchet for an appraisal record.
//!
//! Each phase has exactly one successor and exactly one role allowed to move the
//! record there. Phases double as single-writer locks: faculty write raw inputs,
//! verifiers write verified scores, reviewers write interaction marks, never two
//! of them at once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::ActorRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AppraisalStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "verification_pending")]
    VerificationPending,
    #[serde(rename = "authority_verification_pending")]
    AuthorityVerificationPending,
    #[serde(rename = "Portfolio_Mark_pending")]
    PortfolioMarkPending,
    #[serde(rename = "Interaction_pending")]
    InteractionPending,
    #[serde(rename = "done")]
    Done,
    #[serde(rename = "SentToDirector")]
    SentToDirector,
}

/// `(from, to, role allowed to move it)`; the only transitions that exist.
const TRANSITIONS: [(AppraisalStatus, AppraisalStatus, ActorRole); 6] = [
    (
        AppraisalStatus::Pending,
        AppraisalStatus::VerificationPending,
        ActorRole::Faculty,
    ),
    (
        AppraisalStatus::VerificationPending,
        AppraisalStatus::AuthorityVerificationPending,
        ActorRole::Verifier,
    ),
    (
        AppraisalStatus::AuthorityVerificationPending,
        AppraisalStatus::PortfolioMarkPending,
        ActorRole::Hod,
    ),
    (
        AppraisalStatus::PortfolioMarkPending,
        AppraisalStatus::InteractionPending,
        ActorRole::Hod,
    ),
    (
        AppraisalStatus::InteractionPending,
        AppraisalStatus::Done,
        ActorRole::Hod,
    ),
    (
        AppraisalStatus::Done,
        AppraisalStatus::SentToDirector,
        ActorRole::Hod,
    ),
];

impl AppraisalStatus {
    pub const fn label(self) -> &'static str {
        match self {
            AppraisalStatus::Pending => "pending",
            AppraisalStatus::VerificationPending => "verification_pending",
            AppraisalStatus::AuthorityVerificationPending => "authority_verification_pending",
            AppraisalStatus::PortfolioMarkPending => "Portfolio_Mark_pending",
            AppraisalStatus::InteractionPending => "Interaction_pending",
            AppraisalStatus::Done => "done",
            AppraisalStatus::SentToDirector => "SentToDirector",
        }
    }

    /// Successor and the role that may move the record there.
    pub fn next(self) -> Option<(AppraisalStatus, ActorRole)> {
        TRANSITIONS
            .iter()
            .find(|(from, _, _)| *from == self)
            .map(|(_, to, role)| (*to, *role))
    }

    pub fn advance(self, role: ActorRole) -> Result<AppraisalStatus, StatusError> {
        match self.next() {
            None => Err(StatusError::Terminal(self)),
            Some((to, required)) if required == role => Ok(to),
            Some((to, required)) => Err(StatusError::WrongRole {
                from: self,
                to,
                required,
                actual: role,
            }),
        }
    }

    pub fn accepts_raw_inputs(self) -> bool {
        self == AppraisalStatus::Pending
    }

    pub fn accepts_verified_scores(self, role: ActorRole) -> bool {
        matches!(
            (self, role),
            (AppraisalStatus::VerificationPending, ActorRole::Verifier)
                | (AppraisalStatus::AuthorityVerificationPending, ActorRole::Hod)
        )
    }

    pub fn accepts_interaction_marks(self) -> bool {
        self == AppraisalStatus::InteractionPending
    }

    /// Whether the self-reported scorecard has been frozen by submission.
    pub fn is_submitted(self) -> bool {
        self > AppraisalStatus::Pending
    }
}

/// Audit entry appended on every transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub from: AppraisalStatus,
    pub to: AppraisalStatus,
    pub actor_id: String,
    pub role: ActorRole,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StatusError {
    #[error("status {} is final", .0.label())]
    Terminal(AppraisalStatus),
    #[error("moving {} to {} requires role {}, not {}", .from.label(), .to.label(), .required.label(), .actual.label())]
    WrongRole {
        from: AppraisalStatus,
        to: AppraisalStatus,
        required: ActorRole,
        actual: ActorRole,
    },
    #[error("status {} does not accept this change from role {}", .status.label(), .role.label())]
    Locked {
        status: AppraisalStatus,
        role: ActorRole,
    },
    #[error("verification incomplete: {pending} section(s) still pending")]
    VerificationIncomplete { pending: usize },
}
