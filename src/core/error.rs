//! Error handling for sitegen
//!
//! Two layers of errors exist:
//! - [`crate::templating::TemplateError`] - fatal problems inside a template,
//!   always naming the template (and line) at fault
//! - [`SitegenError`] - application-level failures: configuration, data
//!   files, output, and build summaries
//!
//! Application code passes errors around as [`anyhow::Error`] with
//! `.with_context(...)`. At the CLI boundary [`user_friendly_error`] walks the
//! error chain, finds the most specific typed error, and wraps it in an
//! [`ErrorContext`] with details and a suggestion for the user.
//!
//! # Examples
//!
//! ```rust,no_run
//! use sitegen::core::{SitegenError, user_friendly_error};
//!
//! let error = SitegenError::ConfigNotFound {
//!     path: "site.toml".to_string(),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display(); // Shows colored error with suggestions
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

use crate::templating::TemplateError;

/// Application-level errors.
#[derive(Error, Debug)]
pub enum SitegenError {
    /// The site configuration file does not exist
    #[error("Site configuration not found: {path}")]
    ConfigNotFound {
        path: String,
    },

    /// The site configuration file is not valid TOML or has the wrong shape
    #[error("Invalid site configuration in {file}")]
    ConfigParseError {
        file: String,
        reason: String,
    },

    /// The site configuration parsed but is inconsistent
    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
    },

    /// A page data file could not be read or has the wrong shape
    #[error("Invalid data file {path}: {reason}")]
    DataFileError {
        path: String,
        reason: String,
    },

    /// A `--var` argument is not of the form `name=value`
    #[error("Invalid variable '{spec}': expected name=value")]
    InvalidVariable {
        spec: String,
    },

    /// One or more pages failed to build
    #[error("{failed} of {total} pages failed to build")]
    BuildFailed {
        failed: usize,
        total: usize,
    },

    /// `sitegen check` found templates with nesting errors
    #[error("{failed} of {total} templates have errors")]
    CheckFailed {
        failed: usize,
        total: usize,
    },

    #[error("File system error: {operation} on {path}")]
    FileSystemError {
        operation: String,
        path: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("{message}")]
    Other {
        message: String,
    },
}

impl Clone for SitegenError {
    fn clone(&self) -> Self {
        match self {
            Self::ConfigNotFound {
                path,
            } => Self::ConfigNotFound {
                path: path.clone(),
            },
            Self::ConfigParseError {
                file,
                reason,
            } => Self::ConfigParseError {
                file: file.clone(),
                reason: reason.clone(),
            },
            Self::ConfigError {
                message,
            } => Self::ConfigError {
                message: message.clone(),
            },
            Self::DataFileError {
                path,
                reason,
            } => Self::DataFileError {
                path: path.clone(),
                reason: reason.clone(),
            },
            Self::InvalidVariable {
                spec,
            } => Self::InvalidVariable {
                spec: spec.clone(),
            },
            Self::BuildFailed {
                failed,
                total,
            } => Self::BuildFailed {
                failed: *failed,
                total: *total,
            },
            Self::CheckFailed {
                failed,
                total,
            } => Self::CheckFailed {
                failed: *failed,
                total: *total,
            },
            Self::FileSystemError {
                operation,
                path,
            } => Self::FileSystemError {
                operation: operation.clone(),
                path: path.clone(),
            },
            // io and toml errors are not Clone; keep their message
            Self::IoError(e) => Self::Other {
                message: format!("IO error: {e}"),
            },
            Self::TomlError(e) => Self::Other {
                message: format!("TOML parsing error: {e}"),
            },
            Self::Other {
                message,
            } => Self::Other {
                message: message.clone(),
            },
        }
    }
}

/// An error with user-facing details and a suggestion.
#[derive(Debug)]
pub struct ErrorContext {
    pub error: SitegenError,
    pub suggestion: Option<String>,
    pub details: Option<String>,
}

impl ErrorContext {
    #[must_use]
    pub const fn new(error: SitegenError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print to stderr: red error, yellow details, green suggestion.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] for display.
///
/// The chain is searched for a [`SitegenError`] or [`TemplateError`] first,
/// then for I/O errors; anything else keeps its message with a generic
/// suggestion.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    for cause in error.chain() {
        if let Some(sitegen_error) = cause.downcast_ref::<SitegenError>() {
            return create_error_context(sitegen_error);
        }

        if let Some(template_error) = cause.downcast_ref::<TemplateError>() {
            return template_error_context(template_error, &error);
        }
    }

    if let Some(io_error) = error.chain().find_map(|e| e.downcast_ref::<std::io::Error>()) {
        let message = format!("{error:#}");
        return match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => ErrorContext::new(SitegenError::Other {
                message,
            })
            .with_suggestion("Check file permissions and try running with appropriate privileges"),
            std::io::ErrorKind::NotFound => ErrorContext::new(SitegenError::Other {
                message,
            })
            .with_suggestion("Check that the path exists"),
            _ => ErrorContext::new(SitegenError::Other {
                message,
            })
            .with_suggestion("Check file permissions and disk space"),
        };
    }

    ErrorContext::new(SitegenError::Other {
        message: format!("{error:#}"),
    })
    .with_suggestion("Check the error message above for more details")
}

fn template_error_context(template_error: &TemplateError, error: &anyhow::Error) -> ErrorContext {
    // The outermost message says which page failed; the template report
    // says where.
    let message = match template_error.template() {
        Some(template) => format!("{error} (template '{template}')"),
        None => error.to_string(),
    };
    ErrorContext::new(SitegenError::Other {
        message,
    })
    .with_details(template_error.format_with_context().trim_end().to_string())
    .with_suggestion("Fix the template and run the build again; no output was replaced")
}

/// Attach details and a suggestion to a [`SitegenError`].
pub fn create_error_context(error: &SitegenError) -> ErrorContext {
    let context = ErrorContext::new(error.clone());
    match error {
        SitegenError::ConfigNotFound {
            path,
        } => context
            .with_suggestion("Run from the site directory or pass --config <path>")
            .with_details(format!("No site configuration at '{path}'")),
        SitegenError::ConfigParseError {
            file,
            reason,
        } => context
            .with_suggestion(format!("Check the syntax in '{file}' - TOML format must be valid"))
            .with_details(reason.clone()),
        SitegenError::ConfigError {
            ..
        } => context.with_suggestion("Check the values in your site configuration"),
        SitegenError::DataFileError {
            ..
        } => context.with_suggestion("Data files must contain a JSON, YAML or TOML mapping at the top level"),
        SitegenError::InvalidVariable {
            ..
        } => context.with_suggestion("Pass variables as --var name=value"),
        SitegenError::BuildFailed {
            ..
        } => context.with_suggestion("See the errors above for the pages that failed"),
        SitegenError::CheckFailed {
            ..
        } => context.with_suggestion("Fix the templates listed above; unclosed blocks need a bare %}}"),
        SitegenError::FileSystemError {
            operation,
            path,
        } => context
            .with_suggestion("Check that the path exists and you have the necessary permissions")
            .with_details(format!("Failed to {operation} at path: {path}")),
        SitegenError::IoError(_) | SitegenError::TomlError(_) | SitegenError::Other {
            ..
        } => context,
    }
}
