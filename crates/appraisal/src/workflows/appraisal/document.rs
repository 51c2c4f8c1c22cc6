//! Codec for the positional per-form document kept by the external store:
//!
//! ```json
//! { "1": { "journal_sci": { "count": 3 }, "marks": 300, "verified_marks": 280 },
//!   "2": { ... },
//!   "total_marks": 210 }
//! ```
//!
//! `verified_marks` is absent, never zero, while a section is unverified.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::domain::{FormInputs, RawEntry};
use super::rubric::{ConfigurationError, FormRubric};
use super::scoring::FormScorecard;
use super::verification::{VerificationError, VerificationLedger};

const MARKS: &str = "marks";
const VERIFIED_MARKS: &str = "verified_marks";
const TOTAL_MARKS: &str = "total_marks";
const RESTORED_VERIFIER: &str = "document-store";

pub fn encode_form(
    rubric: &FormRubric,
    inputs: &FormInputs,
    scorecard: &FormScorecard,
    ledger: Option<&VerificationLedger>,
) -> Result<Value, DocumentError> {
    let mut document = Map::new();

    for section in &scorecard.sections {
        let rule = rubric.section(&section.key)?;
        let mut fields = Map::new();

        for category in &rule.categories {
            if let Some(entry) = inputs.get(category.key) {
                let value = serde_json::to_value(entry)
                    .map_err(|err| DocumentError::Malformed(err.to_string()))?;
                fields.insert(category.key.to_string(), value);
            }
        }

        fields.insert(MARKS.to_string(), Value::from(section.capped_score));
        if let Some(score) = ledger
            .and_then(|ledger| ledger.section(&section.key))
            .and_then(|verification| verification.verified_score())
        {
            fields.insert(VERIFIED_MARKS.to_string(), Value::from(score));
        }

        document.insert(section.index.to_string(), Value::Object(fields));
    }

    document.insert(TOTAL_MARKS.to_string(), Value::from(scorecard.capped_total));
    Ok(Value::Object(document))
}

/// Contents recovered from a stored document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedForm {
    pub inputs: FormInputs,
    pub marks: BTreeMap<String, f64>,
    pub verified: BTreeMap<String, f64>,
    pub total_marks: Option<f64>,
}

impl DecodedForm {
    /// Replays stored verified marks onto a freshly opened ledger.
    ///
    /// Stored marks are bounded like fresh ones. On error the ledger is left untouched.
    pub fn restore_into(
        &self,
        ledger: &mut VerificationLedger,
        uncapped_ceiling: f64,
    ) -> Result<(), VerificationError> {
        let mut staged = ledger.clone();
        for (section, score) in &self.verified {
            staged.restore_verified(section, *score, RESTORED_VERIFIER, uncapped_ceiling)?;
        }
        *ledger = staged;
        Ok(())
    }
}

pub fn decode_form(rubric: &FormRubric, document: &Value) -> Result<DecodedForm, DocumentError> {
    let object = document
        .as_object()
        .ok_or_else(|| DocumentError::Malformed("document is not an object".to_string()))?;

    let mut decoded = DecodedForm::default();

    for (key, value) in object {
        if key == TOTAL_MARKS {
            decoded.total_marks = number(value, || "total marks".to_string())?;
            continue;
        }

        let index: u8 = key
            .parse()
            .map_err(|_| DocumentError::Malformed(format!("unexpected key '{key}'")))?;
        let section = rubric.section_by_index(index)?;
        let fields = value.as_object().ok_or_else(|| {
            DocumentError::Malformed(format!("section {index} is not an object"))
        })?;

        for (field, field_value) in fields {
            match field.as_str() {
                MARKS => {
                    if let Some(marks) =
                        number(field_value, || format!("section {index} marks"))?
                    {
                        decoded.marks.insert(section.key.to_string(), marks);
                    }
                }
                VERIFIED_MARKS => {
                    if let Some(score) =
                        number(field_value, || format!("section {index} verified marks"))?
                    {
                        decoded.verified.insert(section.key.to_string(), score);
                    }
                }
                category => {
                    if !section.categories.iter().any(|rule| rule.key == category) {
                        return Err(ConfigurationError::UnknownCategory {
                            form: rubric.form,
                            key: category.to_string(),
                        }
                        .into());
                    }
                    let entry = decode_entry(field_value)?;
                    decoded.inputs.insert(category.to_string(), entry);
                }
            }
        }
    }

    Ok(decoded)
}

/// `null` reads as absent; anything else must be a JSON number.
fn number(value: &Value, what: impl FnOnce() -> String) -> Result<Option<f64>, DocumentError> {
    match value {
        Value::Null => Ok(None),
        other => other
            .as_f64()
            .map(Some)
            .ok_or_else(|| DocumentError::Malformed(format!("{} is not numeric", what()))),
    }
}

/// Accepts both the entry object and a bare scalar written by older clients.
fn decode_entry(value: &Value) -> Result<RawEntry, DocumentError> {
    match value {
        Value::Object(_) => serde_json::from_value(value.clone())
            .map_err(|err| DocumentError::Malformed(err.to_string())),
        scalar => Ok(RawEntry::count(scalar.clone())),
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DocumentError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("malformed form document: {0}")]
    Malformed(String),
}
