//! `sitegen check`: report block-nesting errors and unrecognized directives
//! in every template, without rendering anything.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use walkdir::WalkDir;

use super::CliConfig;
use crate::core::SitegenError;
use crate::templating::{Diagnostic, TemplateError, check_template};
use crate::utils::fs::read_text_file;

#[derive(Args, Debug)]
pub struct CheckCommand {
    /// Directory holding the templates
    #[arg(short, long, value_name = "DIR", default_value = "_templates")]
    pub templates: PathBuf,
}

/// Outcome of checking one template file.
#[derive(Debug)]
pub struct CheckedTemplate {
    pub name: String,
    pub result: Result<Vec<Diagnostic>, TemplateError>,
}

/// Check every file under `dir`, in file-name order.
pub fn check_directory(dir: &Path) -> Result<Vec<CheckedTemplate>> {
    if !dir.is_dir() {
        return Err(SitegenError::FileSystemError {
            operation: "read templates directory".to_string(),
            path: dir.display().to_string(),
        }
        .into());
    }

    let mut checked = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(dir).unwrap_or(entry.path());
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let lines: Vec<String> = read_text_file(entry.path())?.lines().map(String::from).collect();

        tracing::debug!("Checking {}", name);
        let result = check_template(&name, &lines);
        checked.push(CheckedTemplate {
            name,
            result,
        });
    }
    Ok(checked)
}

impl CheckCommand {
    pub async fn execute(self, cli: CliConfig) -> Result<()> {
        let templates = self.templates;
        let checked = tokio::task::spawn_blocking(move || check_directory(&templates)).await??;

        let mut failed = 0;
        let mut warnings = 0;
        for template in &checked {
            match &template.result {
                Ok(diagnostics) => {
                    for diagnostic in diagnostics {
                        println!("{} {}", "⚠".yellow(), diagnostic);
                    }
                    warnings += diagnostics.len();
                }
                Err(error) => {
                    failed += 1;
                    println!("{} {}", "✗".red(), error);
                    print!("{}", error.format_with_context());
                }
            }
        }

        if failed > 0 {
            return Err(SitegenError::CheckFailed {
                failed,
                total: checked.len(),
            }
            .into());
        }

        if !cli.quiet {
            println!(
                "{} Checked {} templates ({} warnings)",
                "✓".green(),
                checked.len(),
                warnings
            );
        }
        Ok(())
    }
}
