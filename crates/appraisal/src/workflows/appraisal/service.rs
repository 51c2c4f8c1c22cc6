use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{ActorRole, Cadre, FacultyInputs, FacultyKey, FormKind, ReviewContext};
use super::interaction::{
    FinalMark, FinalMarkConfig, InteractionAverage, InteractionError, InteractionRecord,
    InteractionRow, InteractionSheet,
};
use super::report::DepartmentReport;
use super::repository::{AppraisalRecord, AppraisalRepository, RepositoryError};
use super::rubric::{ConfigurationError, Rubric};
use super::scoring::{InputPolicy, Scorecard, ScoringEngine, ScoringError};
use super::status::{AppraisalStatus, StatusError};
use super::verification::{VerificationError, VerificationLedger, VerifiedFormTotal};

/// Tunables for scoring and reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppraisalSettings {
    pub input_policy: InputPolicy,
    pub final_mark: FinalMarkConfig,
    /// Upper bound for verified scores in sections without a cap.
    pub verified_score_ceiling: f64,
}

impl Default for AppraisalSettings {
    fn default() -> Self {
        Self {
            input_policy: InputPolicy::Clamp,
            final_mark: FinalMarkConfig::default(),
            verified_score_ceiling: 1000.0,
        }
    }
}

/// Service composing the scoring engine, verification ledgers and repository.
pub struct AppraisalService<R> {
    repository: Arc<R>,
    engine: Arc<ScoringEngine>,
    settings: AppraisalSettings,
}

impl<R> AppraisalService<R>
where
    R: AppraisalRepository + 'static,
{
    pub fn new(repository: Arc<R>, settings: AppraisalSettings) -> Self {
        Self::with_rubric(repository, Rubric::standard(), settings)
    }

    pub fn with_rubric(repository: Arc<R>, rubric: Rubric, settings: AppraisalSettings) -> Self {
        let engine = Arc::new(ScoringEngine::new(rubric, settings.input_policy));
        Self {
            repository,
            engine,
            settings,
        }
    }

    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    pub fn settings(&self) -> &AppraisalSettings {
        &self.settings
    }

    /// Scores inputs without touching storage.
    pub fn preview(&self, inputs: &FacultyInputs) -> Result<Scorecard, AppraisalServiceError> {
        Ok(self.engine.score(inputs)?)
    }

    /// Creates or replaces the faculty member's raw inputs while the form is open.
    pub fn save_inputs(
        &self,
        ctx: &ReviewContext,
        key: &FacultyKey,
        inputs: FacultyInputs,
    ) -> Result<AppraisalRecord, AppraisalServiceError> {
        authorize(ctx, key)?;
        if ctx.role != ActorRole::Faculty {
            return Err(forbidden(ctx, key));
        }

        let scorecard = self.engine.score(&inputs)?;

        if self.repository.fetch(key)?.is_none() {
            let mut record = AppraisalRecord::new(key.clone(), inputs);
            record.scorecard = Some(scorecard);
            let stored = self.repository.insert(record)?;
            info!(faculty = %key, "appraisal opened");
            return Ok(stored);
        }

        self.modify_record(key, |record| {
            if !record.status.accepts_raw_inputs() {
                return Err(StatusError::Locked {
                    status: record.status,
                    role: ctx.role,
                }
                .into());
            }
            record.inputs = inputs;
            record.scorecard = Some(scorecard);
            Ok(record.clone())
        })
    }

    /// Faculty submission: freezes the self-reported scorecard and opens verification.
    pub fn submit(
        &self,
        ctx: &ReviewContext,
        key: &FacultyKey,
    ) -> Result<AppraisalRecord, AppraisalServiceError> {
        let record = self.get(key)?;
        if record.status != AppraisalStatus::Pending {
            return Err(StatusError::Locked {
                status: record.status,
                role: ctx.role,
            }
            .into());
        }
        self.advance(ctx, key)
    }

    /// Moves the record one step along the status ratchet.
    pub fn advance(
        &self,
        ctx: &ReviewContext,
        key: &FacultyKey,
    ) -> Result<AppraisalRecord, AppraisalServiceError> {
        authorize(ctx, key)?;
        let (from, record) = self.modify_record(key, |record| {
            let from = record.status;
            let next = from.advance(ctx.role)?;

            match from {
                AppraisalStatus::Pending => self.freeze(record)?,
                AppraisalStatus::AuthorityVerificationPending
                    if !record.verification_complete() =>
                {
                    return Err(StatusError::VerificationIncomplete {
                        pending: record.pending_sections(),
                    }
                    .into());
                }
                _ => {}
            }

            record.transition(ctx, next);
            Ok((from, record.clone()))
        })?;

        info!(
            faculty = %key,
            from = from.label(),
            to = record.status.label(),
            actor = %ctx.actor_id,
            "appraisal status advanced"
        );

        Ok(record)
    }

    fn freeze(&self, record: &mut AppraisalRecord) -> Result<(), AppraisalServiceError> {
        let scorecard = self.engine.score(&record.inputs)?;
        let mut ledgers = BTreeMap::new();
        for (form, form_scorecard) in &scorecard.forms {
            let rubric = self.engine.rubric().form(*form)?;
            ledgers.insert(
                *form,
                VerificationLedger::from_scorecard(form_scorecard, rubric)?,
            );
        }

        info!(
            faculty = %record.key,
            self_reported_total = scorecard.self_reported_total,
            "self-reported scorecard frozen"
        );

        record.scorecard = Some(scorecard);
        record.verification = ledgers;
        Ok(())
    }

    pub fn verify_section(
        &self,
        ctx: &ReviewContext,
        key: &FacultyKey,
        form: FormKind,
        section: &str,
        score: f64,
    ) -> Result<VerifiedFormTotal, AppraisalServiceError> {
        authorize(ctx, key)?;
        let rubric = self.engine.rubric().form(form)?;

        self.modify_record(key, |record| {
            if !record.status.accepts_verified_scores(ctx.role) {
                return Err(StatusError::Locked {
                    status: record.status,
                    role: ctx.role,
                }
                .into());
            }

            let ledger = record
                .verification
                .get_mut(&form)
                .ok_or(ConfigurationError::MissingForm(form))?;
            ledger.set_verified_score(ctx, section, score, self.settings.verified_score_ceiling)?;
            Ok(ledger.reconcile(rubric)?)
        })
    }

    pub fn record_interaction(
        &self,
        ctx: &ReviewContext,
        key: &FacultyKey,
        score: f64,
    ) -> Result<InteractionAverage, AppraisalServiceError> {
        authorize(ctx, key)?;
        let average = self.modify_record(key, |record| {
            if !record.status.accepts_interaction_marks() {
                return Err(StatusError::Locked {
                    status: record.status,
                    role: ctx.role,
                }
                .into());
            }

            record.interaction.record(
                ctx.role,
                score,
                self.settings.final_mark.interaction_ceiling,
            )?;
            Ok(record.interaction.average())
        })?;

        info!(
            faculty = %key,
            reviewer = ctx.role.label(),
            score,
            average = average.value,
            "interaction mark recorded"
        );

        Ok(average)
    }

    /// Applies an uploaded interaction spreadsheet on behalf of the HOD.
    ///
    /// Every row is checked before anything is written, and all affected
    /// records are written together or not at all.
    pub fn import_interactions(
        &self,
        ctx: &ReviewContext,
        sheet: &InteractionSheet,
    ) -> Result<usize, AppraisalServiceError> {
        if ctx.role != ActorRole::Hod {
            return Err(AppraisalServiceError::ImportForbidden {
                actor: ctx.actor_id.clone(),
                role: ctx.role,
            });
        }

        let mut rows: BTreeMap<FacultyKey, Vec<&InteractionRow>> = BTreeMap::new();
        for row in &sheet.rows {
            authorize(ctx, &row.key)?;
            rows.entry(row.key.clone()).or_default().push(row);
        }

        let keys: Vec<FacultyKey> = rows.keys().cloned().collect();
        let ceiling = self.settings.final_mark.interaction_ceiling;
        self.repository
            .modify::<AppraisalServiceError, _>(&keys, |record| {
                if !record.status.accepts_interaction_marks() {
                    return Err(StatusError::Locked {
                        status: record.status,
                        role: ctx.role,
                    }
                    .into());
                }
                for row in rows.get(&record.key).into_iter().flatten() {
                    record.interaction.record(row.role, row.marks, ceiling)?;
                }
                Ok(())
            })?;

        info!(rows = sheet.rows.len(), actor = %ctx.actor_id, "interaction sheet imported");
        Ok(sheet.rows.len())
    }

    pub fn get(&self, key: &FacultyKey) -> Result<AppraisalRecord, AppraisalServiceError> {
        let record = self
            .repository
            .fetch(key)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    /// Runs `change` against the stored record atomically and returns its output.
    fn modify_record<T>(
        &self,
        key: &FacultyKey,
        change: impl FnOnce(&mut AppraisalRecord) -> Result<T, AppraisalServiceError>,
    ) -> Result<T, AppraisalServiceError> {
        let mut change = Some(change);
        let mut output = None;
        self.repository
            .modify::<AppraisalServiceError, _>(std::slice::from_ref(key), |record| {
                if let Some(change) = change.take() {
                    output = Some(change(record)?);
                }
                Ok(())
            })?;
        output.ok_or_else(|| RepositoryError::NotFound.into())
    }

    pub fn summary(&self, key: &FacultyKey) -> Result<AppraisalSummary, AppraisalServiceError> {
        let record = self.get(key)?;
        Ok(self.summarize(&record)?)
    }

    pub fn department_report(
        &self,
        department: &str,
    ) -> Result<DepartmentReport, AppraisalServiceError> {
        let mut records = self.repository.list_department(department)?;
        records.sort_by(|a, b| a.key.cmp(&b.key));

        let summaries = records
            .iter()
            .map(|record| self.summarize(record))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DepartmentReport::from_summaries(department, &summaries))
    }

    fn summarize(&self, record: &AppraisalRecord) -> Result<AppraisalSummary, ConfigurationError> {
        let mut verified = Vec::with_capacity(record.verification.len());
        for (form, ledger) in &record.verification {
            let rubric = self.engine.rubric().form(*form)?;
            verified.push(ledger.reconcile(rubric)?);
        }

        let verified_total: f64 = verified.iter().map(|form| form.capped_total).sum();
        let verification_complete = record.verification_complete();

        let final_mark = if record.status >= AppraisalStatus::InteractionPending {
            let scale = self
                .settings
                .final_mark
                .scale_for(self.engine.rubric(), record.cadre())?;
            Some(FinalMark::compute(
                verified_total,
                verification_complete,
                &record.interaction,
                &scale,
            ))
        } else {
            None
        };

        Ok(AppraisalSummary {
            key: record.key.clone(),
            cadre: record.cadre(),
            status: record.status,
            self_reported_total: record
                .scorecard
                .as_ref()
                .map(|scorecard| scorecard.self_reported_total),
            verified,
            verified_total,
            verification_complete,
            interaction: record.interaction,
            final_mark,
        })
    }
}

fn authorize(ctx: &ReviewContext, key: &FacultyKey) -> Result<(), AppraisalServiceError> {
    if ctx.may_access(key) {
        Ok(())
    } else {
        Err(forbidden(ctx, key))
    }
}

fn forbidden(ctx: &ReviewContext, key: &FacultyKey) -> AppraisalServiceError {
    AppraisalServiceError::Forbidden {
        actor: ctx.actor_id.clone(),
        role: ctx.role,
        key: key.clone(),
    }
}

/// Self-reported, verified and final figures for one faculty member.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppraisalSummary {
    pub key: FacultyKey,
    pub cadre: Cadre,
    pub status: AppraisalStatus,
    pub self_reported_total: Option<f64>,
    pub verified: Vec<VerifiedFormTotal>,
    /// Sum of the cadre-capped verified form totals; partial while incomplete.
    pub verified_total: f64,
    pub verification_complete: bool,
    pub interaction: InteractionRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_mark: Option<FinalMark>,
}

#[derive(Debug, thiserror::Error)]
pub enum AppraisalServiceError {
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Verification(#[from] VerificationError),
    #[error(transparent)]
    Interaction(#[from] InteractionError),
    #[error(transparent)]
    Status(#[from] StatusError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("{actor} ({role:?}) may not act on appraisal {key}")]
    Forbidden {
        actor: String,
        role: ActorRole,
        key: FacultyKey,
    },
    #[error("{actor} ({role:?}) may not import interaction sheets")]
    ImportForbidden { actor: String, role: ActorRole },
}
