//! Argument parsing and configuration tests for the CLI.

use crate::cli::{Cli, CliConfig, parse_var};
use crate::core::SitegenError;
use clap::Parser;
use tracing::Level;

#[test]
fn test_cli_parsing() {
    // --help causes a special error
    assert!(Cli::try_parse_from(["sitegen", "--help"]).is_err());
    assert!(Cli::try_parse_from(["sitegen"]).is_err());

    assert!(Cli::try_parse_from(["sitegen", "build"]).is_ok());
    assert!(Cli::try_parse_from(["sitegen", "check", "--templates", "tpl"]).is_ok());
    assert!(Cli::try_parse_from(["sitegen", "render", "index"]).is_ok());
}

#[test]
fn test_cli_verbose_flag() {
    let cli = Cli::try_parse_from(["sitegen", "--verbose", "build"]).unwrap();
    assert!(cli.verbose);
    assert_eq!(cli.build_config().log_level, Level::DEBUG);
}

#[test]
fn test_cli_quiet_flag() {
    let cli = Cli::try_parse_from(["sitegen", "build", "-q"]).unwrap();
    assert!(cli.quiet);
    assert_eq!(
        cli.build_config(),
        CliConfig {
            log_level: Level::ERROR,
            quiet: true,
        }
    );
}

#[test]
fn test_cli_verbose_conflicts_with_quiet() {
    assert!(Cli::try_parse_from(["sitegen", "-v", "-q", "build"]).is_err());
}

#[test]
fn test_default_config() {
    let cli = Cli::try_parse_from(["sitegen", "build"]).unwrap();
    assert_eq!(cli.build_config(), CliConfig::default());
}

#[test]
fn test_render_arguments() {
    let cli = Cli::try_parse_from([
        "sitegen",
        "render",
        "post",
        "--var",
        "title=Hello",
        "--var",
        "draft=",
        "--document",
        "xml",
        "--output",
        "out.xml",
    ]);
    assert!(cli.is_ok());

    assert!(Cli::try_parse_from(["sitegen", "render", "post", "--document", "pdf"]).is_err());
}

#[test]
fn test_parse_var() {
    assert_eq!(parse_var("title=Hello").unwrap(), ("title".to_string(), "Hello".to_string()));
    assert_eq!(parse_var("eq=a=b").unwrap(), ("eq".to_string(), "a=b".to_string()));
    assert_eq!(parse_var("empty=").unwrap(), ("empty".to_string(), String::new()));

    for bad in ["title", "=value", ""] {
        assert!(matches!(parse_var(bad), Err(SitegenError::InvalidVariable { .. })), "{bad}");
    }
}
