//! Document rendering.
//!
//! A [`Renderer`] wraps an interpreter's output with a fixed prologue and
//! epilogue (a [`DocumentFrame`]) and hands the result to the atomic writer.
//! The epilogue is only produced when the template rendered completely.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};

use super::context::Context;
use super::error::{Diagnostic, TemplateError};
use super::interpreter::{Interpreter, RenderStream};
use crate::utils::fs::atomic_write_lines;

/// The kinds of document a page can be rendered as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// HTML5: `<!DOCTYPE html>` prologue
    #[default]
    Html,
    /// XML (RSS, sitemaps): XML declaration prologue
    Xml,
    /// Template output only
    None,
}

impl DocumentKind {
    #[must_use]
    pub fn frame(self) -> DocumentFrame {
        match self {
            Self::Html => DocumentFrame::new(["<!DOCTYPE html>"], [] as [&str; 0]),
            Self::Xml => {
                DocumentFrame::new([r#"<?xml version="1.0" encoding="UTF-8"?>"#], [] as [&str; 0])
            }
            Self::None => DocumentFrame::default(),
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Html => "html",
            Self::Xml => "xml",
            Self::None => "none",
        })
    }
}

impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "html" => Ok(Self::Html),
            "xml" => Ok(Self::Xml),
            "none" => Ok(Self::None),
            other => Err(format!("unknown document kind '{other}' (expected html, xml or none)")),
        }
    }
}

/// Fixed lines emitted before and after a rendered template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentFrame {
    prologue: Vec<String>,
    epilogue: Vec<String>,
}

impl DocumentFrame {
    pub fn new<P, E>(prologue: P, epilogue: E) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        E: IntoIterator,
        E::Item: Into<String>,
    {
        Self {
            prologue: prologue.into_iter().map(Into::into).collect(),
            epilogue: epilogue.into_iter().map(Into::into).collect(),
        }
    }

    pub fn prologue(&self) -> &[String] {
        &self.prologue
    }

    pub fn epilogue(&self) -> &[String] {
        &self.epilogue
    }
}

/// What a completed render produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSummary {
    /// Lines written, including the frame
    pub lines: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// Renders framed documents.
#[derive(Debug, Clone)]
pub struct Renderer {
    interpreter: Interpreter,
}

impl Renderer {
    pub fn new(interpreter: Interpreter) -> Self {
        Self {
            interpreter,
        }
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    /// Lazily render `name` inside `frame`.
    pub fn render(&self, name: &str, context: Context, frame: &DocumentFrame) -> DocumentStream {
        DocumentStream {
            prologue: frame.prologue.clone().into_iter(),
            body: self.interpreter.render(name, context),
            epilogue: frame.epilogue.clone().into_iter(),
            body_done: false,
            failed: false,
        }
    }

    /// Render `name` inside `frame` and atomically replace `path` with it.
    ///
    /// On any error `path` keeps its previous content.
    pub fn render_to_file(
        &self,
        name: &str,
        context: Context,
        frame: &DocumentFrame,
        path: &Path,
    ) -> Result<RenderSummary> {
        let mut stream = self.render(name, context, frame);
        let lines = atomic_write_lines(path, stream.by_ref())
            .with_context(|| format!("Failed to render '{}' to {}", name, path.display()))?;

        let diagnostics = stream.take_diagnostics();
        tracing::info!(
            "Rendered '{}' to {} ({} lines, {} diagnostics)",
            name,
            path.display(),
            lines,
            diagnostics.len()
        );
        Ok(RenderSummary {
            lines,
            diagnostics,
        })
    }
}

/// A [`RenderStream`] with its document frame.
#[derive(Debug)]
pub struct DocumentStream {
    prologue: std::vec::IntoIter<String>,
    body: RenderStream,
    epilogue: std::vec::IntoIter<String>,
    body_done: bool,
    failed: bool,
}

impl DocumentStream {
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.body.diagnostics()
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.body.take_diagnostics()
    }
}

impl Iterator for DocumentStream {
    type Item = Result<String, TemplateError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        if let Some(line) = self.prologue.next() {
            return Some(Ok(line));
        }
        if !self.body_done {
            match self.body.next() {
                Some(Ok(line)) => return Some(Ok(line)),
                Some(Err(err)) => {
                    self.failed = true;
                    return Some(Err(err));
                }
                None => self.body_done = true,
            }
        }
        self.epilogue.next().map(Ok)
    }
}

impl std::iter::FusedIterator for DocumentStream {}
