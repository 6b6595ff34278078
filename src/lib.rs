//! sitegen - a static site generator with a line-oriented template language
//!
//! Templates are plain text. Each line either passes through unchanged or
//! carries one directive: a `{{$variable}}` reference, a
//! `{{#include name#}}`, or a `{{%for ...:` / `{{%if ...:` block closed by
//! a bare `%}}`. Pages are rendered lazily, one line at a time, and written
//! atomically so a failed render never replaces a page that was already
//! published.
//!
//! # Modules
//!
//! - [`templating`] - the template language: scanner, interpreter, includes
//!   and the framed document renderer
//! - [`config`] - `site.toml` loading and validation
//! - [`site`] - page contexts and parallel site builds
//! - [`core`] - application errors and user-facing error reporting
//! - [`utils`] - atomic writes and data file readers
//! - [`cli`] - the `sitegen` command line
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use sitegen::templating::{Context, Interpreter, MemoryLoader};
//!
//! let loader = MemoryLoader::new()
//!     .with_template("header", "<h1>{{$title}}</h1>")
//!     .with_template("page", "{{#include header#}}\n{{%if draft:\n<p>Draft</p>\n%}}");
//!
//! let mut context = Context::new();
//! context.insert("title", "Hello");
//! context.insert("draft", false);
//!
//! let lines = Interpreter::new(Arc::new(loader)).render_to_vec("page", context).unwrap();
//! assert_eq!(lines, ["<h1>Hello</h1>"]);
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod site;
pub mod templating;
pub mod utils;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
