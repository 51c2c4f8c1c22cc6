use serde::{Deserialize, Serialize};

use super::super::domain::Cadre;
use super::super::rubric::{ConfigurationError, FormRubric};

/// Result of running a form total through the cadre tables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CadreOutcome {
    pub multiplier: f64,
    pub rescaled_total: f64,
    pub cap: Option<f64>,
    pub capped_total: f64,
}

/// Rescales (Teaching only) and then caps a pre-cap form total for `cadre`.
///
/// A cadre missing from either table is a configuration error.
pub fn apply_cadre_rules(
    rubric: &FormRubric,
    cadre: Cadre,
    total: f64,
) -> Result<CadreOutcome, ConfigurationError> {
    let multiplier = rubric.multiplier(cadre)?;
    let cap = rubric.cadre_cap(cadre)?;

    let rescaled_total = total * multiplier;
    let capped_total = cap.apply(rescaled_total);

    Ok(CadreOutcome {
        multiplier,
        rescaled_total,
        cap: cap.limit(),
        capped_total,
    })
}
