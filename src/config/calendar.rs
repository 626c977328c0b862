//! Calendar source configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

/// Where the business calendar comes from. Without a path the standard
/// Monday to Friday 08:00-17:00 calendar is used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CalendarSettings {
    pub path: Option<PathBuf>,
}

impl CalendarSettings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let supported = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| matches!(e.to_ascii_lowercase().as_str(), "yaml" | "yml" | "json"))
            .unwrap_or(false);
        if !supported {
            return Err(ValidationError::InvalidCalendarPath(
                path.display().to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_and_json_paths_are_accepted() {
        for path in ["shop.yaml", "shop.YML", "calendar.json"] {
            let settings = CalendarSettings {
                path: Some(PathBuf::from(path)),
            };
            assert!(settings.validate().is_ok(), "{}", path);
        }
        assert!(CalendarSettings::default().validate().is_ok());
    }

    #[test]
    fn other_extensions_are_rejected() {
        let settings = CalendarSettings {
            path: Some(PathBuf::from("calendar.toml")),
        };
        assert!(matches!(
            settings.validate(),
            Err(ValidationError::InvalidCalendarPath(_))
        ));
    }
}
