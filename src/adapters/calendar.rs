//! File-backed calendar source.
//!
//! Reads a `CalendarConfig` from YAML (`.yaml`/`.yml`) or JSON (`.json`)
//! and builds the `BusinessCalendar` from it.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::domain::calendar::{BusinessCalendar, CalendarConfig};
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::CalendarSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CalendarFormat {
    Yaml,
    Json,
}

/// Loads the business calendar from a file on disk.
#[derive(Debug, Clone)]
pub struct FileCalendarLoader {
    path: PathBuf,
    search_horizon_days: Option<u32>,
}

impl FileCalendarLoader {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            search_horizon_days: None,
        }
    }

    /// Overrides the file's search horizon; `AppConfig::calendar_loader` passes
    /// `engine.calendar_search_days`.
    pub fn with_search_horizon(mut self, days: u32) -> Self {
        self.search_horizon_days = Some(days);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn format(&self) -> Result<CalendarFormat, DomainError> {
        let extension = self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match extension.as_deref() {
            Some("yaml") | Some("yml") => Ok(CalendarFormat::Yaml),
            Some("json") => Ok(CalendarFormat::Json),
            _ => Err(DomainError::new(
                ErrorCode::InvalidFormat,
                format!(
                    "Calendar file {} must end in .yaml, .yml or .json",
                    self.path.display()
                ),
            )
            .with_detail("path", self.path.display().to_string())),
        }
    }

    fn parse(&self, contents: &str) -> Result<CalendarConfig, DomainError> {
        let parse_error = |e: String| {
            DomainError::new(
                ErrorCode::InvalidFormat,
                format!("Malformed calendar file: {}", e),
            )
            .with_detail("path", self.path.display().to_string())
        };
        match self.format()? {
            CalendarFormat::Yaml => {
                serde_yaml::from_str(contents).map_err(|e| parse_error(e.to_string()))
            }
            CalendarFormat::Json => {
                serde_json::from_str(contents).map_err(|e| parse_error(e.to_string()))
            }
        }
    }
}

#[async_trait]
impl CalendarSource for FileCalendarLoader {
    async fn load_calendar(&self) -> Result<BusinessCalendar, DomainError> {
        self.format()?;
        let contents = fs::read_to_string(&self.path).await.map_err(|e| {
            DomainError::new(
                ErrorCode::InternalError,
                format!("Cannot read calendar file {}: {}", self.path.display(), e),
            )
            .with_detail("path", self.path.display().to_string())
        })?;

        let mut config = self.parse(&contents)?;
        if let Some(days) = self.search_horizon_days {
            config.search_horizon_days = Some(days);
        }
        let calendar = config.to_calendar()?;
        tracing::debug!(
            path = %self.path.display(),
            holidays = config.holidays.len(),
            working_days = config.working_hours.len(),
            "loaded business calendar"
        );
        Ok(calendar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Timestamp;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    fn file_with(suffix: &str, contents: &str) -> NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    const YAML: &str = r#"
working_hours:
  monday: { start: "07:00", end: "15:00" }
  tuesday: { start: "07:00", end: "15:00" }
holidays: ["2024-01-16"]
"#;

    #[tokio::test]
    async fn loads_yaml_calendar() {
        let file = file_with(".yaml", YAML);
        let calendar = FileCalendarLoader::new(file.path())
            .load_calendar()
            .await
            .unwrap();

        // Monday 2024-01-15
        assert!(calendar.is_working_time(&Timestamp::parse("2024-01-15T08:00:00Z").unwrap()));
        assert!(!calendar.is_working_time(&Timestamp::parse("2024-01-15T16:00:00Z").unwrap()));
        // Tuesday is a holiday
        assert!(!calendar.is_working_time(&Timestamp::parse("2024-01-16T08:00:00Z").unwrap()));
    }

    #[tokio::test]
    async fn loads_json_calendar_with_horizon_override() {
        let json = r#"{"working_hours":{"0":{"start":"08:00","end":"16:00"}},"holidays":[]}"#;
        let file = file_with(".json", json);
        let calendar = FileCalendarLoader::new(file.path())
            .with_search_horizon(30)
            .load_calendar()
            .await
            .unwrap();
        assert_eq!(calendar.search_horizon_days(), 30);
        assert!(calendar.is_working_time(&Timestamp::parse("2024-01-15T08:00:00Z").unwrap()));
    }

    #[tokio::test]
    async fn unknown_extension_is_rejected() {
        let file = file_with(".toml", YAML);
        let err = FileCalendarLoader::new(file.path())
            .load_calendar()
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFormat);
    }

    #[tokio::test]
    async fn malformed_contents_are_reported() {
        let file = file_with(".yaml", "working_hours: [not, a, map]");
        let err = FileCalendarLoader::new(file.path())
            .load_calendar()
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFormat);
        assert!(err.detail("path").is_some());
    }

    #[tokio::test]
    async fn invalid_hours_fail_validation() {
        let file = file_with(".yaml", "working_hours:\n  monday: { start: \"25:00\", end: \"26:00\" }\n");
        let err = FileCalendarLoader::new(file.path())
            .load_calendar()
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn missing_file_is_an_internal_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileCalendarLoader::new(dir.path().join("missing.yaml"))
            .load_calendar()
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InternalError);
    }
}
