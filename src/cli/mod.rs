//! Command-line interface for sitegen.
//!
//! # Commands
//!
//! - `build` - render every page listed in `site.toml`
//! - `render` - render a single template to stdout or a file
//! - `check` - check every template for nesting errors without rendering
//!
//! # Global Options
//!
//! - `--verbose` / `-v` - debug logging
//! - `--quiet` / `-q` - errors only, no summary output
//!
//! `RUST_LOG` overrides both when set. Logs go to stderr so that
//! `sitegen render` output on stdout stays clean.
//!
//! # Example
//!
//! ```bash
//! sitegen build --config site.toml --jobs 8
//! sitegen render post --var title=Hello --data data/post.yaml --output web/post.html
//! sitegen check --templates _templates
//! ```

mod build;
mod check;
mod render;

#[cfg(test)]
mod tests;

pub use build::BuildCommand;
pub use check::CheckCommand;
pub use render::{RenderCommand, parse_var};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Settings shared by all commands, derived from the global flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CliConfig {
    /// Log level used when `RUST_LOG` is not set
    pub log_level: Level,

    /// Suppress progress and summary output
    pub quiet: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_level: Level::INFO,
            quiet: false,
        }
    }
}

impl CliConfig {
    /// Install the global tracing subscriber, writing to stderr.
    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.log_level.to_string()));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "sitegen",
    about = "Static site generator with a small line-oriented template language",
    version,
    long_about = "sitegen renders plain-text templates with variables, loops, conditionals \
                  and includes into the pages of a static site."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only report errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render every page of the site
    Build(BuildCommand),

    /// Render a single template
    Render(RenderCommand),

    /// Check templates for nesting errors without rendering
    Check(CheckCommand),
}

impl Cli {
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Level::DEBUG
        } else if self.quiet {
            Level::ERROR
        } else {
            Level::INFO
        };

        CliConfig {
            log_level,
            quiet: self.quiet,
        }
    }

    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        config.init_logging();
        self.execute_with_config(config).await
    }

    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        match self.command {
            Commands::Build(cmd) => cmd.execute(config).await,
            Commands::Render(cmd) => cmd.execute(config).await,
            Commands::Check(cmd) => cmd.execute(config).await,
        }
    }
}
