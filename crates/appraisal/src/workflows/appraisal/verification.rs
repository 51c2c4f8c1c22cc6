//! Self-reported versus verified section scores.
//!
//! Every section starts `Unverified`. A verifier moves it to `Verified`; there is
//! no way back short of the faculty member resubmitting, which replaces the
//! ledger wholesale. Totals only ever sum genuinely verified sections and say
//! which ones are still pending.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::domain::{ActorRole, Cadre, FormKind, ReviewContext};
use super::rubric::{ConfigurationError, FormRubric};
use super::scoring::{apply_cadre_rules, FormScorecard};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum VerificationState {
    Unverified,
    Verified {
        score: f64,
        verified_by: String,
        verified_at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionVerification {
    pub index: u8,
    pub key: String,
    pub self_reported: f64,
    /// Section cap from the rubric; `None` for uncapped sections.
    pub structural_max: Option<f64>,
    pub state: VerificationState,
}

impl SectionVerification {
    pub fn verified_score(&self) -> Option<f64> {
        match &self.state {
            VerificationState::Verified { score, .. } => Some(*score),
            VerificationState::Unverified => None,
        }
    }

    /// Largest verified score the section accepts. An uncapped section always
    /// admits its own self-reported value.
    pub fn verified_max(&self, uncapped_ceiling: f64) -> f64 {
        self.structural_max
            .unwrap_or_else(|| uncapped_ceiling.max(self.self_reported))
    }

    fn check_score(&self, value: f64, uncapped_ceiling: f64) -> Result<(), VerificationError> {
        if !value.is_finite() || value < 0.0 {
            return Err(VerificationError::InvalidScore {
                section: self.key.clone(),
                value,
            });
        }

        let max = self.verified_max(uncapped_ceiling);
        if value > max {
            return Err(VerificationError::CapConflict {
                section: self.key.clone(),
                value,
                max,
            });
        }
        Ok(())
    }
}

/// Verified sum over the sections that have a verified value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedTotal {
    pub total: f64,
    pub verified_sections: usize,
    pub pending_sections: Vec<String>,
}

impl VerifiedTotal {
    pub fn is_complete(&self) -> bool {
        self.pending_sections.is_empty()
    }
}

/// Verified total for a form after the cadre rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedFormTotal {
    pub form: FormKind,
    pub verified: VerifiedTotal,
    pub rescaled_total: f64,
    pub capped_total: f64,
    pub complete: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationLedger {
    pub form: FormKind,
    pub cadre: Cadre,
    sections: Vec<SectionVerification>,
}

impl VerificationLedger {
    /// Opens a ledger over a frozen self-reported scorecard.
    pub fn from_scorecard(
        scorecard: &FormScorecard,
        rubric: &FormRubric,
    ) -> Result<Self, ConfigurationError> {
        let sections = scorecard
            .sections
            .iter()
            .map(|section| {
                let rule = rubric.section(&section.key)?;
                Ok(SectionVerification {
                    index: section.index,
                    key: section.key.clone(),
                    self_reported: section.capped_score,
                    structural_max: rule.cap.limit(),
                    state: VerificationState::Unverified,
                })
            })
            .collect::<Result<Vec<_>, ConfigurationError>>()?;

        Ok(Self {
            form: scorecard.form,
            cadre: scorecard.cadre,
            sections,
        })
    }

    pub fn sections(&self) -> &[SectionVerification] {
        &self.sections
    }

    pub fn section(&self, key: &str) -> Option<&SectionVerification> {
        self.sections.iter().find(|section| section.key == key)
    }

    /// Records a verifier's score for one section.
    ///
    /// `uncapped_ceiling` bounds sections that have no structural maximum,
    /// raised to the self-reported value where that is higher.
    pub fn set_verified_score(
        &mut self,
        ctx: &ReviewContext,
        key: &str,
        value: f64,
        uncapped_ceiling: f64,
    ) -> Result<(), VerificationError> {
        if !matches!(ctx.role, ActorRole::Verifier | ActorRole::Hod) {
            return Err(VerificationError::NotVerifier(ctx.role));
        }

        let form = self.form;
        let section = self
            .sections
            .iter_mut()
            .find(|section| section.key == key)
            .ok_or_else(|| VerificationError::UnknownSection(key.to_string()))?;

        section.check_score(value, uncapped_ceiling)?;

        if let VerificationState::Verified {
            score, verified_by, ..
        } = &section.state
        {
            warn!(
                form = form.label(),
                section = key,
                previous = *score,
                previous_verifier = %verified_by,
                verifier = %ctx.actor_id,
                "overwriting verified score (last write wins)"
            );
        }

        section.state = VerificationState::Verified {
            score: value,
            verified_by: ctx.actor_id.clone(),
            verified_at: Utc::now(),
        };

        info!(
            form = form.label(),
            section = key,
            score = value,
            self_reported = section.self_reported,
            verifier = %ctx.actor_id,
            "section verified"
        );

        Ok(())
    }

    /// Restores a stored verified value. Skips the role check only; stored
    /// values face the same bounds as freshly entered ones.
    pub(crate) fn restore_verified(
        &mut self,
        key: &str,
        score: f64,
        verified_by: &str,
        uncapped_ceiling: f64,
    ) -> Result<(), VerificationError> {
        let section = self
            .sections
            .iter_mut()
            .find(|section| section.key == key)
            .ok_or_else(|| VerificationError::UnknownSection(key.to_string()))?;
        section.check_score(score, uncapped_ceiling)?;
        section.state = VerificationState::Verified {
            score,
            verified_by: verified_by.to_string(),
            verified_at: Utc::now(),
        };
        Ok(())
    }

    pub fn verified_total(&self) -> VerifiedTotal {
        let mut total = 0.0;
        let mut verified_sections = 0;
        let mut pending_sections = Vec::new();

        for section in &self.sections {
            match section.verified_score() {
                Some(score) => {
                    total += score;
                    verified_sections += 1;
                }
                None => pending_sections.push(section.key.clone()),
            }
        }

        VerifiedTotal {
            total,
            verified_sections,
            pending_sections,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.sections
            .iter()
            .all(|section| section.verified_score().is_some())
    }

    /// Runs the verified total through the same cadre rules as the self-reported path.
    pub fn reconcile(&self, rubric: &FormRubric) -> Result<VerifiedFormTotal, ConfigurationError> {
        let verified = self.verified_total();
        let outcome = apply_cadre_rules(rubric, self.cadre, verified.total)?;
        let complete = verified.is_complete();

        Ok(VerifiedFormTotal {
            form: self.form,
            verified,
            rescaled_total: outcome.rescaled_total,
            capped_total: outcome.capped_total,
            complete,
        })
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VerificationError {
    #[error("role {} may not enter verified scores", .0.label())]
    NotVerifier(ActorRole),
    #[error("no verifiable section '{0}'")]
    UnknownSection(String),
    #[error("verified score {value} for section '{section}' is not a non-negative number")]
    InvalidScore { section: String, value: f64 },
    #[error("verified score {value} for section '{section}' exceeds its maximum of {max}")]
    CapConflict {
        section: String,
        value: f64,
        max: f64,
    },
}
