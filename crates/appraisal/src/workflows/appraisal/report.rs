use std::io::Write;

use serde::Serialize;

use super::service::AppraisalSummary;

const CSV_HEADERS: [&str; 9] = [
    "department",
    "faculty_id",
    "cadre",
    "status",
    "self_reported_total",
    "verified_total",
    "verification_complete",
    "interaction_average",
    "final_mark",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentReportRow {
    pub department: String,
    pub faculty_id: String,
    pub cadre: &'static str,
    pub status: &'static str,
    pub self_reported_total: Option<f64>,
    pub verified_total: Option<f64>,
    pub verification_complete: bool,
    pub interaction_average: Option<f64>,
    pub final_mark: Option<f64>,
}

/// Per-department roll-up for the Director.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentReport {
    pub department: String,
    pub rows: Vec<DepartmentReportRow>,
}

impl DepartmentReport {
    pub fn from_summaries(department: &str, summaries: &[AppraisalSummary]) -> Self {
        let rows = summaries
            .iter()
            .map(|summary| {
                let submitted = summary.status.is_submitted();
                DepartmentReportRow {
                    department: summary.key.department.clone(),
                    faculty_id: summary.key.faculty_id.clone(),
                    cadre: summary.cadre.label(),
                    status: summary.status.label(),
                    self_reported_total: summary.self_reported_total,
                    verified_total: submitted.then_some(summary.verified_total),
                    verification_complete: summary.verification_complete,
                    interaction_average: summary
                        .final_mark
                        .map(|mark| mark.interaction_average),
                    final_mark: summary.final_mark.map(|mark| mark.value),
                }
            })
            .collect();

        Self {
            department: department.to_string(),
            rows,
        }
    }

    /// Writes a header row followed by one row per faculty member.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), ReportError> {
        let mut csv_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        csv_writer.write_record(CSV_HEADERS)?;
        for row in &self.rows {
            csv_writer.serialize(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn to_csv_string(&self) -> Result<String, ReportError> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to write report: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
    #[error("report is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}
