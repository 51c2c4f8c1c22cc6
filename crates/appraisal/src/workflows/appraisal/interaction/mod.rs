//! Interaction marks from the HOD, Dean and External reviewer, and the final mark.

mod import;

pub use import::{InteractionImportError, InteractionRow, InteractionSheet};

use serde::{Deserialize, Serialize};

use super::domain::{ActorRole, Cadre};
use super::rubric::{ConfigurationError, Rubric};

/// One optional mark per reviewer role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hod: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dean: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external: Option<f64>,
}

impl InteractionRecord {
    pub fn record(
        &mut self,
        role: ActorRole,
        value: f64,
        ceiling: f64,
    ) -> Result<(), InteractionError> {
        if !value.is_finite() || value < 0.0 || value > ceiling {
            return Err(InteractionError::OutOfRange { value, ceiling });
        }

        let slot = match role {
            ActorRole::Hod => &mut self.hod,
            ActorRole::Dean => &mut self.dean,
            ActorRole::External => &mut self.external,
            other => return Err(InteractionError::NotAReviewer(other)),
        };
        *slot = Some(value);
        Ok(())
    }

    pub fn get(&self, role: ActorRole) -> Option<f64> {
        match role {
            ActorRole::Hod => self.hod,
            ActorRole::Dean => self.dean,
            ActorRole::External => self.external,
            _ => None,
        }
    }

    /// Mean over the reviewers who actually scored. Absent reviewers are not zeros.
    pub fn average(&self) -> InteractionAverage {
        let present: Vec<f64> = [self.hod, self.dean, self.external]
            .into_iter()
            .flatten()
            .collect();

        let value = if present.is_empty() {
            0.0
        } else {
            present.iter().sum::<f64>() / present.len() as f64
        };

        InteractionAverage {
            value,
            reviewers: present.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InteractionAverage {
    pub value: f64,
    pub reviewers: usize,
}

/// Scale factors for the final mark.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinalMarkConfig {
    /// Fixed verified-total ceiling. `None` uses the sum of the cadre's form caps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_appraisal_ceiling: Option<f64>,
    pub self_appraisal_budget: f64,
    pub interaction_ceiling: f64,
    pub interaction_budget: f64,
}

impl Default for FinalMarkConfig {
    fn default() -> Self {
        Self {
            self_appraisal_ceiling: None,
            self_appraisal_budget: 85.0,
            interaction_ceiling: 100.0,
            interaction_budget: 15.0,
        }
    }
}

impl FinalMarkConfig {
    pub fn with_self_appraisal_ceiling(mut self, ceiling: f64) -> Self {
        self.self_appraisal_ceiling = Some(ceiling);
        self
    }

    /// Resolves the scale for one faculty member's cadre.
    pub fn scale_for(
        &self,
        rubric: &Rubric,
        cadre: Cadre,
    ) -> Result<FinalMarkScale, ConfigurationError> {
        let self_appraisal_ceiling = match self.self_appraisal_ceiling {
            Some(ceiling) => ceiling,
            None => rubric.self_appraisal_ceiling(cadre)?,
        };
        FinalMarkScale::new(
            self_appraisal_ceiling,
            self.self_appraisal_budget,
            self.interaction_ceiling,
            self.interaction_budget,
        )
    }
}

/// Validated scale factors. Every factor is a positive finite number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FinalMarkScale {
    self_appraisal_ceiling: f64,
    self_appraisal_budget: f64,
    interaction_ceiling: f64,
    interaction_budget: f64,
}

impl FinalMarkScale {
    pub fn new(
        self_appraisal_ceiling: f64,
        self_appraisal_budget: f64,
        interaction_ceiling: f64,
        interaction_budget: f64,
    ) -> Result<Self, ConfigurationError> {
        for (name, value) in [
            ("self_appraisal_ceiling", self_appraisal_ceiling),
            ("self_appraisal_budget", self_appraisal_budget),
            ("interaction_ceiling", interaction_ceiling),
            ("interaction_budget", interaction_budget),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigurationError::InvalidScale { name, value });
            }
        }

        Ok(Self {
            self_appraisal_ceiling,
            self_appraisal_budget,
            interaction_ceiling,
            interaction_budget,
        })
    }

    pub fn self_appraisal_ceiling(&self) -> f64 {
        self.self_appraisal_ceiling
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinalMark {
    pub self_appraisal_component: f64,
    pub interaction_component: f64,
    pub interaction_average: f64,
    pub reviewers: usize,
    pub value: f64,
    /// False while any verifiable section is still pending.
    pub verification_complete: bool,
}

impl FinalMark {
    pub fn compute(
        verified_total: f64,
        verification_complete: bool,
        interaction: &InteractionRecord,
        scale: &FinalMarkScale,
    ) -> Self {
        let average = interaction.average();

        let self_appraisal_component = scaled(
            verified_total,
            scale.self_appraisal_ceiling,
            scale.self_appraisal_budget,
        );
        let interaction_component = scaled(
            average.value,
            scale.interaction_ceiling,
            scale.interaction_budget,
        );

        Self {
            self_appraisal_component,
            interaction_component,
            interaction_average: average.value,
            reviewers: average.reviewers,
            value: self_appraisal_component + interaction_component,
            verification_complete,
        }
    }
}

fn scaled(value: f64, ceiling: f64, budget: f64) -> f64 {
    (value / ceiling * budget).clamp(0.0, budget)
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InteractionError {
    #[error("role {} does not give interaction marks", .0.label())]
    NotAReviewer(ActorRole),
    #[error("interaction mark {value} outside 0..={ceiling}")]
    OutOfRange { value: f64, ceiling: f64 },
}
