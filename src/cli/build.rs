//! `sitegen build`: render every page listed in the site configuration.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::CliConfig;
use crate::config::{DEFAULT_CONFIG_FILE, SiteConfig};
use crate::constants::default_jobs;
use crate::core::{SitegenError, user_friendly_error};
use crate::site::SiteBuilder;

#[derive(Args, Debug)]
pub struct BuildCommand {
    /// Site configuration file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Treat absent loop containers and conditions as errors
    #[arg(long)]
    pub strict: bool,

    /// Pages rendered at once (default: 2 x CPU cores)
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,
}

impl BuildCommand {
    pub async fn execute(self, cli: CliConfig) -> Result<()> {
        let mut config = SiteConfig::load_from(&self.config).await?;
        if self.strict {
            config.strict = true;
        }

        let output_dir = config.output_path();
        let report = SiteBuilder::new(config).build(self.jobs.unwrap_or_else(default_jobs)).await;

        let failed = report.failures.len();
        let total = report.total();
        let diagnostics = report.diagnostic_count();
        for failure in report.failures {
            user_friendly_error(failure.error).display();
        }

        if failed > 0 {
            return Err(SitegenError::BuildFailed {
                failed,
                total,
            }
            .into());
        }

        if !cli.quiet {
            let mut summary = format!("Built {} pages into {}", total, output_dir.display());
            if diagnostics > 0 {
                summary.push_str(&format!(" ({diagnostics} warnings)"));
            }
            println!("{} {}", "✓".green(), summary);
        }
        Ok(())
    }
}
