//! Test utilities for sitegen
//!
//! Helpers for writing tests: one-time logging setup and [`TestSite`], a
//! temporary site directory with templates, data files and configuration.
//!
//! # Example
//!
//! ```rust,no_run
//! use sitegen::test_utils::TestSite;
//!
//! let site = TestSite::new().unwrap();
//! site.add_template("index.html", "Hello {{$name}}").unwrap();
//! site.write_config("[[pages]]\ntemplate = \"index\"\noutput = \"index.html\"\n").unwrap();
//! ```

pub mod environment;

pub use environment::TestSite;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has any effect. With `Some(level)` that level is
/// used; with `None` logging is enabled only when `RUST_LOG` is set.
///
/// ```bash
/// RUST_LOG=sitegen=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}
