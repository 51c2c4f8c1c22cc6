//! Faculty self-appraisal: scoring, verification reconciliation and final marks.
//!
//! Raw inputs flow one way: category scores, section totals, cadre-capped form
//! totals on the self-reported path, and in parallel verified section totals on
//! the verified path. The final mark consumes the verified total and the
//! interaction average.

pub mod document;
pub mod domain;
pub mod interaction;
pub mod report;
pub mod repository;
pub mod router;
pub mod rubric;
pub mod scoring;
pub mod service;
pub mod status;
pub mod verification;

#[cfg(test)]
mod tests;

pub use document::{decode_form, encode_form, DecodedForm, DocumentError};
pub use domain::{
    ActorRole, Cadre, FacultyInputs, FacultyKey, FormInputs, FormKind, RawEntry, ReviewContext,
};
pub use interaction::{
    FinalMark, FinalMarkConfig, FinalMarkScale, InteractionAverage, InteractionError,
    InteractionImportError, InteractionRecord, InteractionRow, InteractionSheet,
};
pub use report::{DepartmentReport, DepartmentReportRow, ReportError};
pub use repository::{AppraisalRecord, AppraisalRepository, AppraisalStatusView, RepositoryError};
pub use router::appraisal_router;
pub use rubric::{Cap, ConfigurationError, Rubric};
pub use scoring::{
    FormScorecard, InputAdjustment, InputIssue, InputPolicy, Scorecard, ScoringEngine,
    ScoringError, SectionScore,
};
pub use service::{AppraisalService, AppraisalServiceError, AppraisalSettings, AppraisalSummary};
pub use status::{AppraisalStatus, StatusChange, StatusError};
pub use verification::{
    VerificationError, VerificationLedger, VerificationState, VerifiedFormTotal, VerifiedTotal,
};
