//! Helpful error types for CLI commands
//!
//! Every error includes what went wrong, optional context, and suggestions.

use blueprint_schema::{CommitError, Rejection, ServiceError};
use std::fmt;
use std::path::Path;

/// An error with helpful context and suggestions
#[derive(Debug)]
pub struct HelpfulError {
    pub message: String,
    pub context: Option<String>,
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

    /// Plan file does not exist
    pub fn plan_not_found(path: &Path) -> Self {
        Self::new(format!("Plan file not found: {}", path.display()))
            .with_context("The edit command needs a TOML plan with [[add]], [[delete]], or [[rename]] entries")
            .with_suggestion(format!("TRY: Check the path: ls -la {}", path.display()))
    }

    /// Failure talking to the persistence service
    pub fn service_error(base_url: &str, err: &ServiceError) -> Self {
        match err {
            ServiceError::NotFound(event) => Self::new(format!("Schema not found: {}", event))
                .with_context(format!("The service at {} has no schema for this event", base_url))
                .with_suggestion("TRY: Check the event name for typos"),
            ServiceError::Transport(_) => Self::new(format!("Cannot reach schema service: {}", err))
                .with_context(format!("API URL: {}", base_url))
                .with_suggestions([
                    "TRY: Check the service is running".to_string(),
                    "TRY: Show the resolved URL: blueprint config".to_string(),
                    "TRY: Override the URL with BLUEPRINT_API_URL".to_string(),
                ]),
            ServiceError::Rejected { status, .. } => Self::new(err.to_string())
                .with_context(format!("The service answered HTTP {}", status)),
            ServiceError::InvalidResponse(_) => Self::new(err.to_string())
                .with_context(format!("API URL: {}", base_url)),
        }
    }

    /// Commit refused locally or remotely
    pub fn commit_error(event: &str, err: &CommitError) -> Self {
        match err {
            CommitError::Rejected(rejection) => Self::rejected(event, rejection),
            CommitError::Remote(_) => Self::new(err.to_string())
                .with_context(format!("Nothing was changed locally for event '{}'", event))
                .with_suggestion(format!(
                    "TRY: Check the current schema before retrying: blueprint show {}",
                    event
                )),
            _ => Self::new(err.to_string()),
        }
    }

    fn rejected(event: &str, rejection: &Rejection) -> Self {
        let error = Self::new(rejection.to_string())
            .with_context(format!("Validation refused the change set for event '{}'", event));
        match rejection {
            Rejection::NothingToDo => error.with_suggestion("TRY: Add entries to the plan file"),
            Rejection::DeleteTimeColumn | Rejection::RenameTimeColumn => {
                error.with_suggestion("TRY: Remove the entry for the time column from the plan")
            }
            _ => match rejection.offending_name() {
                Some(name) => error.with_suggestion(format!("TRY: Fix the plan entries that mention '{}'", name)),
                None => error,
            },
        }
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_helpful_error_display() {
        let err = HelpfulError::new("Something went wrong")
            .with_context("While committing")
            .with_suggestion("Try again");

        let display = format!("{}", err);
        assert!(display.contains("ERROR: Something went wrong"));
        assert!(display.contains("CONTEXT: While committing"));
        assert!(display.contains("Try again"));
    }

    #[test]
    fn test_plan_not_found() {
        let err = HelpfulError::plan_not_found(&PathBuf::from("/nonexistent/plan.toml"));
        let display = format!("{}", err);
        assert!(display.contains("/nonexistent/plan.toml"));
        assert!(display.contains("TRY:"));
    }

    #[test]
    fn test_rejection_names_offender() {
        let err = CommitError::Rejected(Rejection::DuplicateName {
            name: "city".to_string(),
        });
        let display = HelpfulError::commit_error("login", &err).to_string();
        assert!(display.contains("Duplicate name. Offending name: city"));
        assert!(display.contains("'city'"));
    }

    #[test]
    fn test_remote_failure_message() {
        let err = CommitError::Remote(ServiceError::Rejected {
            status: 500,
            message: "table is locked".to_string(),
        });
        let display = HelpfulError::commit_error("login", &err).to_string();
        assert!(display.contains("Commit failed: table is locked"));
        assert!(display.contains("blueprint show login"));
    }
}
