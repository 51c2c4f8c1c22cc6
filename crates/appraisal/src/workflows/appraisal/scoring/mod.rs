mod cadre;
mod category;
mod section;

pub use cadre::{apply_cadre_rules, CadreOutcome};
pub use category::{score_category, InputAdjustment, InputIssue, InputPolicy};
pub use section::{aggregate_section, CategoryScore, SectionScore};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::{Cadre, FacultyInputs, FormInputs, FormKind};
use super::rubric::{ConfigurationError, Rubric};

/// Stateless scorer applying the rubric to raw faculty inputs.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    rubric: Rubric,
    policy: InputPolicy,
}

impl ScoringEngine {
    pub fn new(rubric: Rubric, policy: InputPolicy) -> Self {
        Self { rubric, policy }
    }

    pub fn standard() -> Self {
        Self::new(Rubric::standard(), InputPolicy::default())
    }

    pub fn rubric(&self) -> &Rubric {
        &self.rubric
    }

    pub fn policy(&self) -> InputPolicy {
        self.policy
    }

    pub fn score_form(
        &self,
        form: FormKind,
        cadre: Cadre,
        inputs: &FormInputs,
    ) -> Result<FormScorecard, ScoringError> {
        let rubric = self.rubric.form(form)?;

        for key in inputs.keys() {
            rubric.category(key)?;
        }

        let mut sections = Vec::with_capacity(rubric.sections.len());
        let mut adjustments = Vec::new();

        for section in &rubric.sections {
            let mut categories = Vec::with_capacity(section.categories.len());
            for rule in &section.categories {
                let (value, adjustment) =
                    category::resolve_input(rule, inputs.get(rule.key), cadre, self.policy)?;
                adjustments.extend(adjustment);
                categories.push(CategoryScore {
                    key: rule.key.to_string(),
                    value,
                    score: score_category(rule, value),
                });
            }
            sections.push(aggregate_section(section, categories));
        }

        let pre_cap_total: f64 = sections.iter().map(|section| section.capped_score).sum();
        let outcome = apply_cadre_rules(rubric, cadre, pre_cap_total)?;

        debug!(
            form = form.label(),
            %cadre,
            pre_cap_total,
            capped_total = outcome.capped_total,
            "scored form"
        );

        Ok(FormScorecard {
            form,
            cadre,
            sections,
            pre_cap_total,
            rescaled_total: outcome.rescaled_total,
            capped_total: outcome.capped_total,
            adjustments,
        })
    }

    /// Scores every form in the rubric; forms without inputs score zero.
    pub fn score(&self, inputs: &FacultyInputs) -> Result<Scorecard, ScoringError> {
        let empty = FormInputs::new();
        let mut forms = BTreeMap::new();

        for rubric in self.rubric.forms() {
            let form_inputs = inputs.forms.get(&rubric.form).unwrap_or(&empty);
            let scorecard = self.score_form(rubric.form, inputs.cadre, form_inputs)?;
            forms.insert(rubric.form, scorecard);
        }

        let self_reported_total = forms.values().map(|form| form.capped_total).sum();

        Ok(Scorecard {
            cadre: inputs.cadre,
            forms,
            self_reported_total,
        })
    }
}

/// Self-reported scores for one form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormScorecard {
    pub form: FormKind,
    pub cadre: Cadre,
    pub sections: Vec<SectionScore>,
    /// Sum of capped section scores.
    pub pre_cap_total: f64,
    pub rescaled_total: f64,
    pub capped_total: f64,
    #[serde(default)]
    pub adjustments: Vec<InputAdjustment>,
}

impl FormScorecard {
    pub fn section(&self, key: &str) -> Option<&SectionScore> {
        self.sections.iter().find(|section| section.key == key)
    }
}

/// Self-reported scores across every form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scorecard {
    pub cadre: Cadre,
    pub forms: BTreeMap<FormKind, FormScorecard>,
    pub self_reported_total: f64,
}

impl Scorecard {
    pub fn form(&self, form: FormKind) -> Option<&FormScorecard> {
        self.forms.get(&form)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    #[error("invalid input for category '{category}': {issue}")]
    InputValidation { category: String, issue: InputIssue },
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}
