//! Moving gardens in and out of the app: the JSON backup format (which
//! imports back), plus one-way HTML and print exports.

mod html;
mod json;

pub(crate) use html::{render_html, render_print_html};
pub(crate) use json::{export_json, parse_import, run_import};

use crate::api::ApiError;
use strum::{Display, EnumIter, EnumString};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Display, EnumString, EnumIter)]
pub(crate) enum ImportMode {
    /// Delete every existing garden first.
    #[strum(serialize = "replace")]
    Replace,
    #[default]
    #[strum(serialize = "append")]
    Append,
}

impl ImportMode {
    pub fn label(self) -> &'static str {
        match self {
            ImportMode::Replace => "Replace existing gardens",
            ImportMode::Append => "Add to existing gardens",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub(crate) enum ExportFormat {
    #[strum(serialize = "json")]
    Json,
    #[strum(serialize = "html")]
    Html,
    #[strum(serialize = "print")]
    Print,
}

impl ExportFormat {
    pub fn mime(self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Html | ExportFormat::Print => "text/html;charset=utf-8",
        }
    }

    pub fn file_name(self, stem: &str, date: &str) -> String {
        let ext = match self {
            ExportFormat::Json => "json",
            ExportFormat::Html | ExportFormat::Print => "html",
        };
        format!("{stem}-{date}.{ext}")
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum ImportError {
    #[error("Invalid import file: {0}")]
    Malformed(String),
    #[error("Could not read import file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Api(#[from] ApiError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_import_mode_strings() {
        assert_eq!(ImportMode::from_str("replace").ok(), Some(ImportMode::Replace));
        assert_eq!(ImportMode::Append.to_string(), "append");
        assert!(ImportMode::from_str("merge").is_err());
        assert_eq!(ImportMode::iter().count(), 2);
    }

    #[test]
    fn test_export_file_names() {
        assert_eq!(
            ExportFormat::Json.file_name("not-bahcesi", "2024-05-01"),
            "not-bahcesi-2024-05-01.json"
        );
        assert_eq!(ExportFormat::Print.file_name("work", "d"), "work-d.html");
        assert_eq!(ExportFormat::Html.to_string(), "html");
    }

    #[test]
    fn test_import_error_messages() {
        let e = ImportError::Malformed("missing `gardens`".to_string());
        assert_eq!(e.to_string(), "Invalid import file: missing `gardens`");
    }
}
