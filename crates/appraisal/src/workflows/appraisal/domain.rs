use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::rubric::ConfigurationError;

/// Storage address of one faculty member's appraisal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FacultyKey {
    pub department: String,
    pub faculty_id: String,
}

impl FacultyKey {
    pub fn new(department: impl Into<String>, faculty_id: impl Into<String>) -> Self {
        Self {
            department: department.into(),
            faculty_id: faculty_id.into(),
        }
    }
}

impl fmt::Display for FacultyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.department, self.faculty_id)
    }
}

/// Faculty rank. Selects score ceilings, teaching rescale factors and bonus eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Cadre {
    #[serde(alias = "professor")]
    Professor,
    #[serde(rename = "Associate Professor", alias = "associate_professor")]
    AssociateProfessor,
    #[serde(rename = "Assistant Professor", alias = "assistant_professor")]
    AssistantProfessor,
    #[serde(alias = "other")]
    Other,
}

impl Cadre {
    pub const fn label(self) -> &'static str {
        match self {
            Cadre::Professor => "Professor",
            Cadre::AssociateProfessor => "Associate Professor",
            Cadre::AssistantProfessor => "Assistant Professor",
            Cadre::Other => "Other",
        }
    }
}

impl fmt::Display for Cadre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Cadre {
    type Err = ConfigurationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value
            .trim()
            .to_ascii_lowercase()
            .replace(['_', '-'], " ");
        match normalized.as_str() {
            "professor" | "prof" => Ok(Cadre::Professor),
            "associate professor" | "assoc prof" => Ok(Cadre::AssociateProfessor),
            "assistant professor" | "asst prof" => Ok(Cadre::AssistantProfessor),
            "other" => Ok(Cadre::Other),
            _ => Err(ConfigurationError::UnknownCadre(value.trim().to_string())),
        }
    }
}

/// The three appraisal forms, stored under their historical letters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormKind {
    Teaching,
    Research,
    SelfDevelopment,
}

impl FormKind {
    pub const ALL: [FormKind; 3] = [
        FormKind::Teaching,
        FormKind::Research,
        FormKind::SelfDevelopment,
    ];

    pub const fn letter(self) -> char {
        match self {
            FormKind::Teaching => 'A',
            FormKind::Research => 'B',
            FormKind::SelfDevelopment => 'C',
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            FormKind::Teaching => "Teaching",
            FormKind::Research => "Research",
            FormKind::SelfDevelopment => "Self-Development",
        }
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.letter())
    }
}

impl FromStr for FormKind {
    type Err = ConfigurationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "a" | "teaching" => Ok(FormKind::Teaching),
            "b" | "research" => Ok(FormKind::Research),
            "c" | "self_development" | "self-development" => Ok(FormKind::SelfDevelopment),
            other => Err(ConfigurationError::UnknownForm(other.to_string())),
        }
    }
}

/// Roles that act on an appraisal record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Faculty,
    Verifier,
    Hod,
    Dean,
    External,
    Director,
}

impl ActorRole {
    pub const fn label(self) -> &'static str {
        match self {
            ActorRole::Faculty => "faculty",
            ActorRole::Verifier => "verifier",
            ActorRole::Hod => "hod",
            ActorRole::Dean => "dean",
            ActorRole::External => "external",
            ActorRole::Director => "director",
        }
    }

    /// Roles whose scope spans every department.
    pub const fn institution_wide(self) -> bool {
        matches!(self, ActorRole::Dean | ActorRole::External | ActorRole::Director)
    }
}

impl FromStr for ActorRole {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "faculty" => Ok(ActorRole::Faculty),
            "verifier" => Ok(ActorRole::Verifier),
            "hod" => Ok(ActorRole::Hod),
            "dean" => Ok(ActorRole::Dean),
            "external" => Ok(ActorRole::External),
            "director" => Ok(ActorRole::Director),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// Who is acting, passed explicitly into every mutating operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewContext {
    pub actor_id: String,
    pub role: ActorRole,
    pub department: String,
}

impl ReviewContext {
    pub fn new(
        actor_id: impl Into<String>,
        role: ActorRole,
        department: impl Into<String>,
    ) -> Self {
        Self {
            actor_id: actor_id.into(),
            role,
            department: department.into(),
        }
    }

    /// Faculty may act on their own record, reviewers on their department.
    pub fn may_access(&self, key: &FacultyKey) -> bool {
        match self.role {
            ActorRole::Faculty => {
                self.actor_id == key.faculty_id && self.department == key.department
            }
            role if role.institution_wide() => true,
            _ => self.department == key.department,
        }
    }
}

/// One raw line item as posted by the form: `{"count": n}` or `{"amount": n}`.
///
/// Values are kept as untyped JSON so that validation can see what was actually
/// submitted (strings from HTML inputs, negatives, garbage) before scoring.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Value>,
    #[serde(
        default,
        rename = "proofLink",
        alias = "proof_link",
        skip_serializing_if = "Option::is_none"
    )]
    pub proof_link: Option<String>,
}

impl RawEntry {
    pub fn count(count: impl Into<Value>) -> Self {
        Self {
            count: Some(count.into()),
            ..Self::default()
        }
    }

    pub fn amount(amount: impl Into<Value>) -> Self {
        Self {
            amount: Some(amount.into()),
            ..Self::default()
        }
    }

    pub fn with_proof(mut self, link: impl Into<String>) -> Self {
        self.proof_link = Some(link.into());
        self
    }

    pub(crate) fn raw_value(&self) -> Option<&Value> {
        self.count.as_ref().or(self.amount.as_ref())
    }
}

/// Category key to raw entry for a single form.
pub type FormInputs = BTreeMap<String, RawEntry>;

/// Everything a faculty member has entered across the forms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacultyInputs {
    pub cadre: Cadre,
    #[serde(default)]
    pub forms: BTreeMap<FormKind, FormInputs>,
}

impl FacultyInputs {
    pub fn new(cadre: Cadre) -> Self {
        Self {
            cadre,
            forms: BTreeMap::new(),
        }
    }

    pub fn with_entry(mut self, form: FormKind, key: &str, entry: RawEntry) -> Self {
        self.forms
            .entry(form)
            .or_default()
            .insert(key.to_string(), entry);
        self
    }
}
