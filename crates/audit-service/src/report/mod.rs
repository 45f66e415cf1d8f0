//! Audit log reports
//!
//! Reports are rendered in-process: a paginated PDF 1.4 document or a
//! SpreadsheetML 2003 workbook that spreadsheet applications open as XLS.

mod pdf;
mod spreadsheet;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::dto::AuditLogEntry;
use crate::render::format_timestamp;

pub use pdf::render_pdf;
pub use spreadsheet::render_spreadsheet;

/// Column headers shared by both formats
pub const REPORT_COLUMNS: [&str; 6] = ["User", "Date", "Event", "Model", "Record", "Changes"];

/// Output format of a report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Pdf,
    Xls,
}

impl ReportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Xls => "application/vnd.ms-excel",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Xls => "xls",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "xls" => Ok(Self::Xls),
            other => Err(format!("unknown report format: {other}")),
        }
    }
}

/// One printed line of the audit log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub user: String,
    pub date: String,
    pub event: String,
    pub model: String,
    pub record: String,
    pub changes: String,
}

impl ReportRow {
    pub fn cells(&self) -> [&str; 6] {
        [
            &self.user,
            &self.date,
            &self.event,
            &self.model,
            &self.record,
            &self.changes,
        ]
    }
}

impl From<&AuditLogEntry> for ReportRow {
    fn from(entry: &AuditLogEntry) -> Self {
        Self {
            user: entry.user_name.clone(),
            date: entry.date_display.clone(),
            event: entry.event_label.clone(),
            model: entry.model_label.clone(),
            record: entry.record_name.clone(),
            changes: entry.changes.clone(),
        }
    }
}

/// Rendered report document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReport {
    pub format: ReportFormat,
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl RenderedReport {
    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }
}

/// Render audit log entries
pub fn render_report(
    format: ReportFormat,
    entries: &[AuditLogEntry],
    generated_at: DateTime<Utc>,
    offset: FixedOffset,
) -> RenderedReport {
    let rows: Vec<ReportRow> = entries.iter().map(ReportRow::from).collect();
    let title = format!("Audit Log ({})", format_timestamp(generated_at, offset));

    let bytes = match format {
        ReportFormat::Pdf => render_pdf(&title, &rows),
        ReportFormat::Xls => render_spreadsheet(&title, &rows).into_bytes(),
    };

    RenderedReport {
        format,
        filename: format!(
            "audit-log-{}.{}",
            generated_at.with_timezone(&offset).format("%Y%m%d-%H%M%S"),
            format.extension()
        ),
        bytes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audit_core::entities::EventType;
    use audit_core::value_objects::EventKey;
    use chrono::TimeZone;

    pub(super) fn sample_rows() -> Vec<ReportRow> {
        vec![
            ReportRow {
                user: "Alice".to_string(),
                date: "2024-05-01 10:00:00".to_string(),
                event: "Modify".to_string(),
                model: "Task".to_string(),
                record: "Ship (it)".to_string(),
                changes: "Priority: High → Low\nName: a → b".to_string(),
            },
            ReportRow {
                user: "Bob".to_string(),
                date: "2024-05-01 09:00:00".to_string(),
                event: "Create".to_string(),
                model: "Task".to_string(),
                record: "Fix <bug> & more".to_string(),
                changes: String::new(),
            },
        ]
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("PDF".parse::<ReportFormat>().unwrap(), ReportFormat::Pdf);
        assert_eq!("xls".parse::<ReportFormat>().unwrap(), ReportFormat::Xls);
        assert!("docx".parse::<ReportFormat>().is_err());
        assert_eq!(ReportFormat::Xls.content_type(), "application/vnd.ms-excel");
    }

    #[test]
    fn test_render_report_names_file() {
        let generated_at = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let entry = AuditLogEntry {
            key: EventKey::new("project.task", 1, EventType::Create, 1),
            event_type: EventType::Create,
            event_label: "Create".to_string(),
            user_id: Some(1),
            user_name: "Alice".to_string(),
            date: generated_at,
            date_display: "2024-05-01 08:00:00".to_string(),
            model: "project.task".to_string(),
            model_label: "Task".to_string(),
            record_id: 1,
            record_name: "Ship it".to_string(),
            history: true,
            changes: String::new(),
        };

        let report = render_report(
            ReportFormat::Xls,
            &[entry],
            generated_at,
            FixedOffset::east_opt(3600).unwrap(),
        );
        assert_eq!(report.filename, "audit-log-20240501-090000.xls");
        assert_eq!(report.content_type(), "application/vnd.ms-excel");
        let body = String::from_utf8(report.bytes).unwrap();
        assert!(body.contains("Audit Log (2024-05-01 09:00:00)"));
        assert!(body.contains("Ship it"));
    }
}
