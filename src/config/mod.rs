//! Configuration management for sitegen
//!
//! A site is described by a single `site.toml` next to its templates. It
//! names the template and output directories, the base variables every page
//! starts from, and the list of pages to build.
//!
//! # Modules
//!
//! - `site` - [`SiteConfig`] and [`PageConfig`], loading and validation
//!
//! # Example
//!
//! ```toml
//! templates_dir = "_templates"
//! output_dir = "web"
//! public_url = "https://example.org"
//! strict = false
//!
//! [defaults]
//! site_name = "Example"
//!
//! [[pages]]
//! template = "post"
//! output = "posts/hello/index.html"
//! data = "data/hello.yaml"
//! ```
//!
//! Relative paths resolve against the directory holding `site.toml`.

pub mod site;

pub use site::{DEFAULT_CONFIG_FILE, PageConfig, SiteConfig};
