//! Utilities shared across the crate.
//!
//! # Modules
//!
//! - [`fs`] - File system operations with atomic writes and data file readers
//!
//! # Example
//!
//! ```rust,no_run
//! use sitegen::utils::atomic_write_lines;
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let lines = ["User-agent: *", "Allow: /"].map(|l| Ok::<_, std::io::Error>(l.to_string()));
//! atomic_write_lines(Path::new("web/robots.txt"), lines)?;
//! # Ok(())
//! # }
//! ```

pub mod fs;

pub use fs::{atomic_write_lines, ensure_dir};
