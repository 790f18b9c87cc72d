//! Helpful error types for CLI commands
//!
//! Every error includes:
//! - What went wrong
//! - Context about the situation
//! - Suggestions for how to fix it

use serde_json::json;
use std::fmt;
use std::path::Path;

/// An error with helpful context and suggestions
#[derive(Debug)]
pub struct HelpfulError {
    /// The main error message
    pub message: String,
    /// Additional context about what was happening
    pub context: Option<String>,
    /// Suggestions for how to fix the error
    pub suggestions: Vec<String>,
}

impl HelpfulError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_suggestions(mut self, suggestions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.suggestions.extend(suggestions.into_iter().map(|s| s.into()));
        self
    }

    // === Common error constructors ===

    /// Input file does not exist
    pub fn file_not_found(path: &Path) -> Self {
        Self::new(format!("File not found: {}", path.display()))
            .with_context("The contribution file does not exist")
            .with_suggestions([
                format!("TRY: Check if the file exists: ls -la {}", path.display()),
                format!(
                    "TRY: Look for similar files: ls {}",
                    path.parent()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| ".".to_string())
                ),
            ])
    }

    /// File exists but cannot be read or decoded
    pub fn cannot_read_file(path: &Path, reason: &str) -> Self {
        Self::new(format!("Cannot read file: {}", path.display()))
            .with_context(reason.to_string())
            .with_suggestions([
                format!("TRY: Check file permissions: ls -la {}", path.display()),
                "TRY: Contribution text files must be UTF-8 encoded".to_string(),
            ])
    }

    /// No data model definitions could be loaded
    pub fn data_models_not_found(dir: &Path, reason: &str) -> Self {
        Self::new(format!("No data models loaded from: {}", dir.display()))
            .with_context(reason.to_string())
            .with_suggestions([
                "TRY: Point at a directory of <version>.json files: --models DIR".to_string(),
                "TRY: Set data_models_dir in config.toml (see: magic config)".to_string(),
            ])
    }

    /// A version tag that no loaded data model carries
    pub fn unknown_version(tag: &str, known: &[String]) -> Self {
        Self::new(format!("Unknown data model version: '{}'", tag))
            .with_context(format!("Available versions: {}", known.join(", ")))
            .with_suggestion("TRY: List the loaded versions: magic versions")
    }
}

impl fmt::Display for HelpfulError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR: {}", self.message)?;

        if let Some(ctx) = &self.context {
            writeln!(f, "CONTEXT: {}", ctx)?;
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            for suggestion in &self.suggestions {
                writeln!(f, "  {}", suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for HelpfulError {}

/// JSON body for a failed command run with `--json`.
pub fn json_error(err: &anyhow::Error) -> serde_json::Value {
    match err.downcast_ref::<HelpfulError>() {
        Some(helpful) => json!({
            "error": {
                "message": helpful.message,
                "context": helpful.context,
                "suggestions": helpful.suggestions,
            }
        }),
        None => json!({
            "error": {
                "message": format!("{:#}", err),
                "context": null,
                "suggestions": [],
            }
        }),
    }
}

pub fn print_json_error(err: &anyhow::Error) {
    match serde_json::to_string_pretty(&json_error(err)) {
        Ok(body) => println!("{}", body),
        Err(_) => eprintln!("{:?}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_helpful_error_display() {
        let err = HelpfulError::new("Something went wrong")
            .with_context("While upgrading")
            .with_suggestion("Try again");

        let display = format!("{}", err);
        assert!(display.contains("ERROR: Something went wrong"));
        assert!(display.contains("CONTEXT: While upgrading"));
        assert!(display.contains("Try again"));
    }

    #[test]
    fn test_file_not_found() {
        let path = PathBuf::from("/nonexistent/upload.txt");
        let display = format!("{}", HelpfulError::file_not_found(&path));

        assert!(display.contains("/nonexistent/upload.txt"));
        assert!(display.contains("TRY:"));
    }

    #[test]
    fn test_unknown_version_lists_known() {
        let err = HelpfulError::unknown_version("9.9", &["2.5".to_string(), "3.0".to_string()]);
        let display = format!("{}", err);

        assert!(display.contains("'9.9'"));
        assert!(display.contains("2.5, 3.0"));
    }

    #[test]
    fn test_json_error_keeps_suggestions() {
        let err = anyhow::Error::new(HelpfulError::file_not_found(&PathBuf::from("missing.txt")));
        let value = json_error(&err);

        assert_eq!(value["error"]["message"], "File not found: missing.txt");
        assert_eq!(value["error"]["suggestions"].as_array().map(Vec::len), Some(2));

        let plain = json_error(&anyhow::anyhow!("boom"));
        assert_eq!(plain["error"]["message"], "boom");
        assert!(plain["error"]["context"].is_null());
    }
}
