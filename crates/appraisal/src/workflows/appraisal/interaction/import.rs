use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use super::super::domain::{ActorRole, FacultyKey};

/// A parsed interaction spreadsheet (`department,faculty_id,role,marks`).
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionSheet {
    pub rows: Vec<InteractionRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InteractionRow {
    pub key: FacultyKey,
    pub role: ActorRole,
    pub marks: f64,
}

impl InteractionSheet {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, InteractionImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Rows with a blank mark are skipped; the reviewer has not scored yet.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, InteractionImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut rows = Vec::new();

        for (line, record) in csv_reader.deserialize::<SheetRow>().enumerate() {
            let row = record?;
            let Some(marks) = row.marks else {
                continue;
            };
            let role = row
                .role
                .parse::<ActorRole>()
                .ok()
                .filter(|role| matches!(role, ActorRole::Hod | ActorRole::Dean | ActorRole::External))
                .ok_or_else(|| InteractionImportError::InvalidRole {
                    line: line + 2,
                    role: row.role.clone(),
                })?;

            rows.push(InteractionRow {
                key: FacultyKey::new(row.department, row.faculty_id),
                role,
                marks,
            });
        }

        Ok(Self { rows })
    }
}

#[derive(Debug, Deserialize)]
struct SheetRow {
    department: String,
    faculty_id: String,
    role: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    marks: Option<f64>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<f64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

#[derive(Debug)]
pub enum InteractionImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidRole { line: usize, role: String },
}

impl std::fmt::Display for InteractionImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InteractionImportError::Io(err) => write!(f, "failed to read interaction sheet: {}", err),
            InteractionImportError::Csv(err) => write!(f, "invalid interaction CSV data: {}", err),
            InteractionImportError::InvalidRole { line, role } => write!(
                f,
                "line {}: '{}' is not an interaction reviewer (hod, dean, external)",
                line, role
            ),
        }
    }
}

impl std::error::Error for InteractionImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InteractionImportError::Io(err) => Some(err),
            InteractionImportError::Csv(err) => Some(err),
            InteractionImportError::InvalidRole { .. } => None,
        }
    }
}

impl From<std::io::Error> for InteractionImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for InteractionImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}
