//! Template error and diagnostic types.
//!
//! Fatal problems are [`TemplateError`]s and abort the whole render.
//! Recoverable problems are [`Diagnostic`]s: they are logged, recorded on the
//! render stream, and rendering carries on.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use super::block::BlockKind;

/// Where in which template an error happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorLocation {
    /// Template being interpreted when the error occurred
    pub template: String,
    /// 1-based line within that template, if known
    pub line: Option<usize>,
    /// Include chain from the top-level template down to `template`
    pub include_chain: Vec<String>,
}

impl ErrorLocation {
    pub fn new(template: impl Into<String>, line: Option<usize>) -> Self {
        Self {
            template: template.into(),
            line,
            include_chain: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_chain(mut self, chain: Vec<String>) -> Self {
        self.include_chain = chain;
        self
    }
}

impl fmt::Display for ErrorLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "'{}' line {}", self.template, line),
            None => write!(f, "'{}'", self.template),
        }
    }
}

/// Fatal template errors.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template '{name}' not found")]
    TemplateNotFound {
        name: String,
        /// Paths the loader tried, in order
        searched: Vec<PathBuf>,
        /// Include site, when the missing template was included
        location: Option<Box<ErrorLocation>>,
    },

    #[error("Invalid template name '{name}': {reason}")]
    InvalidTemplateName {
        name: String,
        reason: &'static str,
    },

    #[error("Failed to read template '{name}' from {}", .path.display())]
    Io {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed include overrides for '{target}' in {location}: {message}")]
    MalformedOverrides {
        target: String,
        message: String,
        location: Box<ErrorLocation>,
    },

    #[error("Loop container '{variable}' in {location} is a {found}, not a sequence or mapping")]
    NotIterable {
        variable: String,
        found: &'static str,
        location: Box<ErrorLocation>,
    },

    #[error(
        "Element {index} of '{container}' in {location} cannot be destructured into ({bindings}): {reason}"
    )]
    DestructureMismatch {
        container: String,
        index: usize,
        bindings: String,
        reason: String,
        location: Box<ErrorLocation>,
    },

    #[error("Element {index} of '{container}' in {location} has no field '{field}'")]
    MissingElementField {
        container: String,
        index: usize,
        field: String,
        location: Box<ErrorLocation>,
    },

    #[error("Unclosed {kind} block opened at {location}")]
    UnclosedBlock {
        kind: BlockKind,
        location: Box<ErrorLocation>,
    },

    #[error("Stray block close at {location}")]
    StrayClose {
        location: Box<ErrorLocation>,
    },

    #[error("Close at {location} does not match the {expected} block opened at line {opened_at}")]
    MismatchedClose {
        expected: BlockKind,
        opened_at: usize,
        location: Box<ErrorLocation>,
    },

    #[error("Variable substitution in {location} did not settle after {passes} passes")]
    SubstitutionLoop {
        passes: usize,
        location: Box<ErrorLocation>,
    },

    #[error("Circular include: {}", .chain.join(" -> "))]
    CircularInclude {
        chain: Vec<String>,
    },

    #[error("Required {kind} variable '{variable}' is not defined in {location}")]
    AbsentValue {
        variable: String,
        kind: BlockKind,
        location: Box<ErrorLocation>,
    },
}

impl TemplateError {
    /// Name of the template the error should be reported against.
    #[must_use]
    pub fn template(&self) -> Option<&str> {
        match self {
            Self::TemplateNotFound {
                location: Some(location),
                ..
            } => Some(&location.template),
            Self::TemplateNotFound {
                name,
                ..
            }
            | Self::InvalidTemplateName {
                name,
                ..
            }
            | Self::Io {
                name,
                ..
            } => Some(name),
            Self::MalformedOverrides {
                location,
                ..
            }
            | Self::NotIterable {
                location,
                ..
            }
            | Self::DestructureMismatch {
                location,
                ..
            }
            | Self::MissingElementField {
                location,
                ..
            }
            | Self::UnclosedBlock {
                location,
                ..
            }
            | Self::StrayClose {
                location,
            }
            | Self::MismatchedClose {
                location,
                ..
            }
            | Self::SubstitutionLoop {
                location,
                ..
            }
            | Self::AbsentValue {
                location,
                ..
            } => Some(&location.template),
            Self::CircularInclude {
                chain,
            } => chain.first().map(String::as_str),
        }
    }

    fn location(&self) -> Option<&ErrorLocation> {
        match self {
            Self::TemplateNotFound {
                location,
                ..
            } => location.as_deref(),
            Self::MalformedOverrides {
                location,
                ..
            }
            | Self::NotIterable {
                location,
                ..
            }
            | Self::DestructureMismatch {
                location,
                ..
            }
            | Self::MissingElementField {
                location,
                ..
            }
            | Self::UnclosedBlock {
                location,
                ..
            }
            | Self::StrayClose {
                location,
            }
            | Self::MismatchedClose {
                location,
                ..
            }
            | Self::SubstitutionLoop {
                location,
                ..
            }
            | Self::AbsentValue {
                location,
                ..
            } => Some(&**location),
            _ => None,
        }
    }

    /// Generate a multi-line, user-facing report with the include chain and
    /// a suggestion for fixing the template.
    pub fn format_with_context(&self) -> String {
        let mut msg = String::new();
        msg.push_str(&format!("ERROR: {self}\n"));

        if let Some(location) = self.location() {
            if location.include_chain.len() > 1 {
                msg.push_str("\nInclude chain:\n");
                for (i, name) in location.include_chain.iter().enumerate() {
                    let indent = "  ".repeat(i);
                    let arrow = if i > 0 {
                        "└─ "
                    } else {
                        ""
                    };
                    msg.push_str(&format!("{indent}{arrow}{name}\n"));
                }
            }
        }

        if let Self::TemplateNotFound {
            searched,
            ..
        } = self
        {
            if !searched.is_empty() {
                msg.push_str("\nSearched:\n");
                for path in searched {
                    msg.push_str(&format!("  {}\n", path.display()));
                }
            }
        }

        msg.push_str(&format!("\nSUGGESTION: {}\n", self.suggestion()));
        msg
    }

    fn suggestion(&self) -> &'static str {
        match self {
            Self::TemplateNotFound {
                ..
            }
            | Self::Io {
                ..
            } => "Check the template name and that the file exists in the templates directory",
            Self::InvalidTemplateName {
                ..
            } => "Refer to templates by name relative to the templates directory",
            Self::MalformedOverrides {
                ..
            } => "Include overrides must be a JSON object, e.g. {\"title\": \"Home\"}",
            Self::NotIterable {
                ..
            }
            | Self::DestructureMismatch {
                ..
            }
            | Self::MissingElementField {
                ..
            } => "Check the shape of the data bound to the loop container",
            Self::UnclosedBlock {
                ..
            }
            | Self::StrayClose {
                ..
            }
            | Self::MismatchedClose {
                ..
            } => "Every '{{%for' and '{{%if' needs a bare '%}}' line; includes close with '#}}'",
            Self::SubstitutionLoop {
                ..
            } => "A variable's value refers back to itself; break the reference cycle",
            Self::CircularInclude {
                ..
            } => "Move the shared content into a separate template included by both",
            Self::AbsentValue {
                ..
            } => "Define the variable, or disable strict mode to skip absent blocks",
        }
    }
}

/// What kind of recoverable problem a [`Diagnostic`] reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// `{{$name}}` did not resolve; the reference was removed
    UnresolvedVariable {
        name: String,
        suggestions: Vec<String>,
    },
    /// Directive-looking text matched none of the known forms
    UnrecognizedDirective {
        text: String,
    },
}

/// A recoverable problem found while rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub template: String,
    pub line: usize,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::UnresolvedVariable {
                name,
                suggestions,
            } => {
                write!(f, "'{}' line {}: unresolved variable '{}'", self.template, self.line, name)?;
                if !suggestions.is_empty() {
                    write!(f, " (did you mean {}?)", suggestions.join(", "))?;
                }
                Ok(())
            }
            DiagnosticKind::UnrecognizedDirective {
                text,
            } => write!(
                f,
                "'{}' line {}: unrecognized directive near '{}', passed through as text",
                self.template, self.line, text
            ),
        }
    }
}
