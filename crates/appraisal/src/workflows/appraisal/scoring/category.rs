use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::super::domain::{Cadre, RawEntry};
use super::super::rubric::{CategoryRule, UnitKind, WeightRule};
use super::ScoringError;

/// What to do with raw values that are not usable as-is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputPolicy {
    /// Replace the value (zero, or the floor for fractional counts) and record it.
    #[default]
    Clamp,
    /// Fail the computation with an input validation error.
    Reject,
}

impl FromStr for InputPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "clamp" => Ok(InputPolicy::Clamp),
            "reject" => Ok(InputPolicy::Reject),
            other => Err(format!("unknown input policy '{other}'")),
        }
    }
}

/// Reason a raw value was not taken at face value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputIssue {
    Negative { value: f64 },
    NonNumeric { raw: String },
    Fractional { value: f64 },
    Ineligible { cadre: Cadre },
}

impl fmt::Display for InputIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputIssue::Negative { value } => write!(f, "negative value {value}"),
            InputIssue::NonNumeric { raw } => write!(f, "non-numeric value {raw}"),
            InputIssue::Fractional { value } => write!(f, "fractional count {value}"),
            InputIssue::Ineligible { cadre } => write!(f, "category not open to {cadre}"),
        }
    }
}

/// Record of a clamped input, kept on the scorecard for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputAdjustment {
    pub category: String,
    pub issue: InputIssue,
    pub applied: f64,
}

struct SanitizedValue {
    value: f64,
    issue: Option<InputIssue>,
}

impl SanitizedValue {
    fn clean(value: f64) -> Self {
        Self { value, issue: None }
    }
}

fn read_raw(rule: &CategoryRule, entry: Option<&RawEntry>) -> SanitizedValue {
    match entry.and_then(RawEntry::raw_value) {
        None | Some(Value::Null) => SanitizedValue::clean(0.0),
        Some(Value::Number(number)) => match number.as_f64() {
            Some(value) => check_range(rule, value),
            None => SanitizedValue {
                value: 0.0,
                issue: Some(InputIssue::NonNumeric {
                    raw: number.to_string(),
                }),
            },
        },
        Some(Value::String(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return SanitizedValue::clean(0.0);
            }
            match trimmed.parse::<f64>() {
                Ok(value) if value.is_finite() => check_range(rule, value),
                _ => SanitizedValue {
                    value: 0.0,
                    issue: Some(InputIssue::NonNumeric {
                        raw: trimmed.to_string(),
                    }),
                },
            }
        }
        Some(other) => SanitizedValue {
            value: 0.0,
            issue: Some(InputIssue::NonNumeric {
                raw: other.to_string(),
            }),
        },
    }
}

fn check_range(rule: &CategoryRule, value: f64) -> SanitizedValue {
    if value < 0.0 {
        return SanitizedValue {
            value: 0.0,
            issue: Some(InputIssue::Negative { value }),
        };
    }

    if rule.unit == UnitKind::Count && value.fract() != 0.0 {
        return SanitizedValue {
            value: value.floor(),
            issue: Some(InputIssue::Fractional { value }),
        };
    }

    SanitizedValue::clean(value)
}

/// Validates a raw entry under `policy` and returns the value to score.
pub(crate) fn resolve_input(
    rule: &CategoryRule,
    entry: Option<&RawEntry>,
    cadre: Cadre,
    policy: InputPolicy,
) -> Result<(f64, Option<InputAdjustment>), ScoringError> {
    let SanitizedValue { value, issue } = read_raw(rule, entry);

    if let Some(issue) = issue {
        return match policy {
            InputPolicy::Reject => Err(ScoringError::InputValidation {
                category: rule.key.to_string(),
                issue,
            }),
            InputPolicy::Clamp => {
                warn!(category = rule.key, %issue, applied = value, "clamped raw input");
                let adjustment = InputAdjustment {
                    category: rule.key.to_string(),
                    issue,
                    applied: value,
                };
                Ok((eligible_value(rule, cadre, value).0, Some(adjustment)))
            }
        };
    }

    Ok(eligible_value(rule, cadre, value))
}

fn eligible_value(rule: &CategoryRule, cadre: Cadre, value: f64) -> (f64, Option<InputAdjustment>) {
    if value > 0.0 && !rule.eligibility.admits(cadre) {
        debug!(category = rule.key, %cadre, "ignoring entry for ineligible cadre");
        return (
            0.0,
            Some(InputAdjustment {
                category: rule.key.to_string(),
                issue: InputIssue::Ineligible { cadre },
                applied: 0.0,
            }),
        );
    }
    (value, None)
}

/// Marks earned by `value` units under `rule`, after the category cap.
///
/// Anything that is not a finite positive number scores zero.
pub fn score_category(rule: &CategoryRule, value: f64) -> f64 {
    let value = if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    };

    let raw = match rule.weight {
        WeightRule::PerUnit { weight } => value * weight,
        WeightRule::PerDivisor { divisor, weight } => (value / divisor).floor() * weight,
    };

    rule.cap.apply(raw)
}
