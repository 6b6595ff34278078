//! `sitegen render`: render one template with variables from the command
//! line and an optional data file.

use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Args;
use colored::Colorize;

use super::CliConfig;
use crate::core::SitegenError;
use crate::site::load_data_values;
use crate::templating::{
    AbsentPolicy, Context, DocumentKind, FileSystemLoader, Interpreter, Renderer, Value,
};

#[derive(Args, Debug)]
pub struct RenderCommand {
    /// Template name, relative to the templates directory
    #[arg(value_name = "TEMPLATE")]
    pub template: String,

    /// Directory templates are loaded from
    #[arg(short, long, value_name = "DIR", default_value = "_templates")]
    pub templates: PathBuf,

    /// Extension tried after the bare template name
    #[arg(long, value_name = "EXT", default_value = "html")]
    pub extension: String,

    /// Bind a variable (repeatable); overrides the data file
    #[arg(long = "var", value_name = "NAME=VALUE")]
    pub vars: Vec<String>,

    /// JSON, YAML or TOML file whose top-level mapping is bound into the context
    #[arg(short, long, value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Document frame: html, xml or none
    #[arg(long, value_name = "KIND", default_value = "html")]
    pub document: DocumentKind,

    /// Write here atomically instead of printing to stdout
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Treat absent loop containers and conditions as errors
    #[arg(long)]
    pub strict: bool,
}

/// Split a `name=value` argument.
pub fn parse_var(spec: &str) -> Result<(String, String), SitegenError> {
    match spec.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(SitegenError::InvalidVariable {
            spec: spec.to_string(),
        }),
    }
}

impl RenderCommand {
    fn context(&self) -> Result<Context> {
        let mut context = Context::new();
        if let Some(data) = &self.data {
            context.extend(load_data_values(data)?);
        }
        for spec in &self.vars {
            let (name, value) = parse_var(spec)?;
            context.insert(name, Value::from(value));
        }
        Ok(context)
    }

    fn renderer(&self) -> Renderer {
        let loader = FileSystemLoader::new(&self.templates).with_extensions([self.extension.as_str()]);
        let policy = if self.strict {
            AbsentPolicy::Strict
        } else {
            AbsentPolicy::Lenient
        };
        Renderer::new(Interpreter::new(Arc::new(loader)).with_absent_policy(policy))
    }

    pub async fn execute(self, cli: CliConfig) -> Result<()> {
        let context = self.context()?;
        let renderer = self.renderer();
        let frame = self.document.frame();

        if let Some(output) = &self.output {
            let summary = renderer.render_to_file(&self.template, context, &frame, output)?;
            if !cli.quiet {
                println!(
                    "{} Rendered '{}' to {} ({} lines)",
                    "✓".green(),
                    self.template,
                    output.display(),
                    summary.lines
                );
            }
            return Ok(());
        }

        // Nothing reaches stdout unless the whole template rendered.
        let lines: Vec<String> = renderer
            .render(&self.template, context, &frame)
            .collect::<Result<_, _>>()
            .with_context(|| format!("Failed to render '{}'", self.template))?;

        let mut stdout = std::io::stdout().lock();
        for line in &lines {
            writeln!(stdout, "{line}")?;
        }
        stdout.flush()?;
        Ok(())
    }
}
