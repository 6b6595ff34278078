//! Line-oriented template language.
//!
//! Templates are plain text processed one line at a time. Lines without a
//! directive pass through unchanged; everything else is one of:
//!
//! | Form | Meaning |
//! |---|---|
//! | `{{$name}}` | variable reference (`{{$post.title}}` for nested fields) |
//! | `{{#include name#}}` | include another template |
//! | `{{#include name: {"k": "v"} #}}` | include with JSON overrides |
//! | `{{%for v in container: ... %}}` | loop; `v1,v2` destructures elements |
//! | `{{%if name: ... %}}` | conditional |
//!
//! Blocks close with a bare `%}}` and nest freely. A multi-line include
//! collects its JSON overrides until a line containing `#}}`.
//!
//! A line expands at most one include. Text after an opener's `:` is the
//! first line of the block body, so `{{%if flag: {{#include badge#}} %}}`
//! includes `badge` only when `flag` is truthy.
//!
//! # Architecture
//!
//! - [`scanner`] classifies lines into [`Directive`]s
//! - [`block`] collects block bodies and resolves loop destructuring
//! - [`substitution`] expands `{{$name}}` references
//! - [`include`] resolves includes and their scoped overrides
//! - [`interpreter`] drives all of the above as a lazy [`RenderStream`]
//! - [`renderer`] frames a stream as a document and writes it atomically
//!
//! Values live in a layered [`Context`]: loops, conditionals and includes
//! with overrides each push a child layer, so nothing bound inside a block
//! is visible after it.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use sitegen::templating::{Context, Interpreter, MemoryLoader};
//!
//! let loader = MemoryLoader::new()
//!     .with_template("page", "{{%for tag in tags:\n<li>{{$tag}}</li>\n%}}");
//! let mut context = Context::new();
//! context.insert("tags", vec!["rust", "web"]);
//!
//! let lines = Interpreter::new(Arc::new(loader)).render_to_vec("page", context).unwrap();
//! assert_eq!(lines, ["<li>rust</li>", "<li>web</li>"]);
//! ```

pub mod block;
mod cache;
pub mod context;
pub mod error;
pub mod include;
pub mod interpreter;
pub mod loader;
pub mod renderer;
pub mod scanner;
pub mod substitution;
pub mod value;


pub use block::{Block, BlockKind, Destructure};
pub use context::Context;
pub use error::{Diagnostic, DiagnosticKind, ErrorLocation, TemplateError};
pub use include::MAX_INCLUDE_DEPTH;
pub use interpreter::{AbsentPolicy, Interpreter, RenderOptions, RenderStream, check_template};
pub use loader::{FileSystemLoader, MemoryLoader, TemplateLoader, validate_name};
pub use renderer::{DocumentFrame, DocumentKind, DocumentStream, RenderSummary, Renderer};
pub use scanner::{Directive, scan};
pub use substitution::MAX_SUBSTITUTION_PASSES;
pub use value::{OpaqueValue, Value};
