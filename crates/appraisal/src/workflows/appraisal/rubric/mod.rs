//! Weight and cap tables for the appraisal forms.
//!
//! The rubric is plain data: every formula the scorer applies is driven by a
//! [`CategoryRule`], every ceiling by a [`Cap`]. Missing table entries are
//! configuration errors, never silent zeroes.

mod research;
mod self_development;
mod teaching;

use std::collections::BTreeMap;

use serde::Serialize;

use super::domain::{Cadre, FormKind};

/// Upper bound for a section or a cadre. `Unlimited` is infinite, never zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cap {
    Limit(f64),
    Unlimited,
}

impl Cap {
    pub fn apply(self, value: f64) -> f64 {
        match self {
            Cap::Limit(limit) => value.min(limit),
            Cap::Unlimited => value,
        }
    }

    pub fn limit(self) -> Option<f64> {
        match self {
            Cap::Limit(limit) => Some(limit),
            Cap::Unlimited => None,
        }
    }
}

/// Whether a raw value is a count of items or a currency amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Count,
    Amount,
}

/// How raw units turn into marks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightRule {
    /// `count * weight`
    PerUnit { weight: f64 },
    /// `floor(value / divisor) * weight`; partial units earn nothing.
    PerDivisor { divisor: f64, weight: f64 },
}

/// Which cadres may earn marks in a category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Eligibility {
    All,
    Only(&'static [Cadre]),
}

impl Eligibility {
    pub fn admits(self, cadre: Cadre) -> bool {
        match self {
            Eligibility::All => true,
            Eligibility::Only(cadres) => cadres.contains(&cadre),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRule {
    pub key: &'static str,
    pub label: &'static str,
    pub unit: UnitKind,
    pub weight: WeightRule,
    pub cap: Cap,
    pub eligibility: Eligibility,
}

impl CategoryRule {
    pub(crate) fn per_unit(key: &'static str, label: &'static str, weight: f64) -> Self {
        Self {
            key,
            label,
            unit: UnitKind::Count,
            weight: WeightRule::PerUnit { weight },
            cap: Cap::Unlimited,
            eligibility: Eligibility::All,
        }
    }

    pub(crate) fn per_divisor(
        key: &'static str,
        label: &'static str,
        unit: UnitKind,
        divisor: f64,
        weight: f64,
    ) -> Self {
        Self {
            key,
            label,
            unit,
            weight: WeightRule::PerDivisor { divisor, weight },
            cap: Cap::Unlimited,
            eligibility: Eligibility::All,
        }
    }

    pub(crate) fn capped(mut self, cap: f64) -> Self {
        self.cap = Cap::Limit(cap);
        self
    }

    pub(crate) fn only(mut self, cadres: &'static [Cadre]) -> Self {
        self.eligibility = Eligibility::Only(cadres);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionRule {
    /// Positional index used by the document store (1-based).
    pub index: u8,
    pub key: &'static str,
    pub label: &'static str,
    pub cap: Cap,
    pub categories: Vec<CategoryRule>,
}

impl SectionRule {
    pub(crate) fn new(
        index: u8,
        key: &'static str,
        label: &'static str,
        cap: Cap,
        categories: Vec<CategoryRule>,
    ) -> Self {
        Self {
            index,
            key,
            label,
            cap,
            categories,
        }
    }
}

/// Sections and cadre tables for one form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormRubric {
    pub form: FormKind,
    pub sections: Vec<SectionRule>,
    pub cadre_caps: BTreeMap<Cadre, Cap>,
    /// Teaching only: linear rescale applied to the summed sections before the cap.
    pub cadre_multipliers: Option<BTreeMap<Cadre, f64>>,
}

impl FormRubric {
    pub fn section(&self, key: &str) -> Result<&SectionRule, ConfigurationError> {
        self.sections
            .iter()
            .find(|section| section.key == key)
            .ok_or_else(|| ConfigurationError::UnknownSection {
                form: self.form,
                key: key.to_string(),
            })
    }

    pub fn section_by_index(&self, index: u8) -> Result<&SectionRule, ConfigurationError> {
        self.sections
            .iter()
            .find(|section| section.index == index)
            .ok_or(ConfigurationError::UnknownSectionIndex {
                form: self.form,
                index,
            })
    }

    /// Looks up a category and the section that owns it.
    pub fn category(
        &self,
        key: &str,
    ) -> Result<(&SectionRule, &CategoryRule), ConfigurationError> {
        self.sections
            .iter()
            .find_map(|section| {
                section
                    .categories
                    .iter()
                    .find(|category| category.key == key)
                    .map(|category| (section, category))
            })
            .ok_or_else(|| ConfigurationError::UnknownCategory {
                form: self.form,
                key: key.to_string(),
            })
    }

    pub fn cadre_cap(&self, cadre: Cadre) -> Result<Cap, ConfigurationError> {
        self.cadre_caps
            .get(&cadre)
            .copied()
            .ok_or(ConfigurationError::MissingCadreCap {
                form: self.form,
                cadre,
            })
    }

    /// `1.0` for forms without a rescale table.
    pub fn multiplier(&self, cadre: Cadre) -> Result<f64, ConfigurationError> {
        match &self.cadre_multipliers {
            None => Ok(1.0),
            Some(table) => table
                .get(&cadre)
                .copied()
                .ok_or(ConfigurationError::MissingMultiplier {
                    form: self.form,
                    cadre,
                }),
        }
    }
}

/// The full institutional rubric across all forms.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rubric {
    forms: BTreeMap<FormKind, FormRubric>,
}

impl Rubric {
    pub fn new(forms: impl IntoIterator<Item = FormRubric>) -> Self {
        Self {
            forms: forms.into_iter().map(|form| (form.form, form)).collect(),
        }
    }

    pub fn standard() -> Self {
        Self::new([
            teaching::form_rubric(),
            research::form_rubric(),
            self_development::form_rubric(),
        ])
    }

    pub fn form(&self, form: FormKind) -> Result<&FormRubric, ConfigurationError> {
        self.forms
            .get(&form)
            .ok_or(ConfigurationError::MissingForm(form))
    }

    pub fn forms(&self) -> impl Iterator<Item = &FormRubric> {
        self.forms.values()
    }

    /// Highest verified total a cadre can reach: the sum of its form caps.
    pub fn self_appraisal_ceiling(&self, cadre: Cadre) -> Result<f64, ConfigurationError> {
        let mut ceiling = 0.0;
        for form in self.forms.values() {
            ceiling += form
                .cadre_cap(cadre)?
                .limit()
                .ok_or(ConfigurationError::UnboundedCadreCap {
                    form: form.form,
                    cadre,
                })?;
        }
        Ok(ceiling)
    }
}

/// Broken or incomplete rubric tables. Always fatal to the computation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("unknown cadre '{0}'")]
    UnknownCadre(String),
    #[error("unknown appraisal form '{0}'")]
    UnknownForm(String),
    #[error("no rubric configured for form {0}")]
    MissingForm(FormKind),
    #[error("form {form} has no cap configured for cadre {cadre}")]
    MissingCadreCap { form: FormKind, cadre: Cadre },
    #[error("form {form} has no rescale multiplier configured for cadre {cadre}")]
    MissingMultiplier { form: FormKind, cadre: Cadre },
    #[error("form {form} has no weight table entry for category '{key}'")]
    UnknownCategory { form: FormKind, key: String },
    #[error("form {form} has no section '{key}'")]
    UnknownSection { form: FormKind, key: String },
    #[error("form {form} has no section at index {index}")]
    UnknownSectionIndex { form: FormKind, index: u8 },
    #[error("form {form} has no finite cap for cadre {cadre}; set a self-appraisal ceiling")]
    UnboundedCadreCap { form: FormKind, cadre: Cadre },
    #[error("final mark factor {name} must be a positive number, got {value}")]
    InvalidScale { name: &'static str, value: f64 },
}
