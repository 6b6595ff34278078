//! Block collection and loop binding.
//!
//! Multi-line constructs are handled in two steps. [`collect_block`] gathers
//! the raw lines between an opener and its matching close, tracking nesting
//! with an explicit stack of `(kind, opening line)` so that a close is always
//! matched against the innermost open block. The interpreter then expands the
//! collected [`Block`] once: loops through a [`LoopExpansion`] that hands out
//! one child scope per element, conditionals and includes directly.

use std::fmt;
use std::sync::Arc;

use super::context::Context;
use super::error::{ErrorLocation, TemplateError};
use super::scanner::{self, Directive, INCLUDE_CLOSE_MARKER};
use super::value::Value;

/// The constructs that span several lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Loop,
    Conditional,
    Include,
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Loop => "loop",
            Self::Conditional => "conditional",
            Self::Include => "include",
        })
    }
}

/// Identifies the template (and include chain) a run of lines came from.
#[derive(Debug, Clone)]
pub(crate) struct Origin {
    pub(crate) template: Arc<str>,
    pub(crate) chain: Arc<[String]>,
}

impl Origin {
    pub(crate) fn root(template: &str) -> Self {
        Self {
            template: Arc::from(template),
            chain: Arc::from(vec![template.to_string()]),
        }
    }

    /// The origin of a template included from this one.
    pub(crate) fn include(&self, template: &str) -> Self {
        let mut chain = self.chain.to_vec();
        chain.push(template.to_string());
        Self {
            template: Arc::from(template),
            chain: Arc::from(chain),
        }
    }

    pub(crate) fn at(&self, line: usize) -> Box<ErrorLocation> {
        Box::new(ErrorLocation::new(self.template.as_ref(), Some(line)).with_chain(self.chain.to_vec()))
    }
}

/// A fully collected block body, not yet interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    /// 1-based line of the opener
    pub opened_at: usize,
    /// Raw lines between the opener and the matching close
    pub body: Vec<String>,
    /// For includes: override data before `#}}` on the closing line, and the
    /// text after it
    pub tail: Option<(String, String)>,
}

#[derive(Debug, Clone, Copy)]
struct OpenBlock {
    kind: BlockKind,
    line: usize,
}

/// Collect the body of a block opened just before `lines[start]`.
///
/// `first_line` is the 1-based template line number of `lines[0]`. Returns
/// the block and the index of the first line after its close.
pub(crate) fn collect_block(
    lines: &[String],
    start: usize,
    kind: BlockKind,
    opened_at: usize,
    first_line: usize,
    origin: &Origin,
) -> Result<(Block, usize), TemplateError> {
    let mut stack = vec![OpenBlock {
        kind,
        line: opened_at,
    }];
    let mut body = Vec::new();

    for (idx, line) in lines.iter().enumerate().skip(start) {
        let line_no = first_line + idx;
        let Some(&top) = stack.last() else {
            break;
        };

        if top.kind == BlockKind::Include {
            // Include bodies are override data; only the close marker counts.
            if is_bare(line, scanner::BLOCK_CLOSE_MARKER) {
                return Err(TemplateError::MismatchedClose {
                    expected: BlockKind::Include,
                    opened_at: top.line,
                    location: origin.at(line_no),
                });
            }
            if let Some((data, suffix)) = scanner::split_include_close(line) {
                stack.pop();
                if stack.is_empty() {
                    let block = Block {
                        kind,
                        opened_at,
                        body,
                        tail: Some((data.to_string(), suffix.to_string())),
                    };
                    return Ok((block, idx + 1));
                }
            }
            body.push(line.clone());
            continue;
        }

        if is_bare(line, INCLUDE_CLOSE_MARKER) {
            return Err(TemplateError::MismatchedClose {
                expected: top.kind,
                opened_at: top.line,
                location: origin.at(line_no),
            });
        }

        let directive = scanner::scan(line).directive;
        if directive == Directive::BlockClose {
            stack.pop();
            if stack.is_empty() {
                let block = Block {
                    kind,
                    opened_at,
                    body,
                    tail: None,
                };
                return Ok((block, idx + 1));
            }
        } else if let Some(nested) = directive.opens_block() {
            stack.push(OpenBlock {
                kind: nested,
                line: line_no,
            });
        }
        body.push(line.clone());
    }

    let innermost = stack.last().copied().unwrap_or(OpenBlock {
        kind,
        line: opened_at,
    });
    Err(TemplateError::UnclosedBlock {
        kind: innermost.kind,
        location: origin.at(innermost.line),
    })
}

fn is_bare(line: &str, marker: &str) -> bool {
    line.trim() == marker
}

/// How a loop binds each element, decided once per loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destructure {
    /// One binding name: the whole element
    Whole(String),
    /// Several names, sequence elements: by position
    Positional(Vec<String>),
    /// Several names, mapping elements: by field name
    Named(Vec<String>),
}

impl Destructure {
    /// Choose the binding mode from the declared names and the first element.
    pub(crate) fn resolve(
        bindings: &[&str],
        elements: &[Value],
        container: &str,
        location: impl Fn() -> Box<ErrorLocation>,
    ) -> Result<Self, TemplateError> {
        let names: Vec<String> = bindings.iter().map(|b| (*b).to_string()).collect();
        if names.len() == 1 {
            return Ok(Self::Whole(names.into_iter().next().unwrap_or_default()));
        }

        match elements.first() {
            None | Some(Value::Seq(_)) => Ok(Self::Positional(names)),
            Some(Value::Map(_)) => Ok(Self::Named(names)),
            Some(other) => Err(TemplateError::DestructureMismatch {
                container: container.to_string(),
                index: 0,
                bindings: names.join(", "),
                reason: format!("a {} has no parts", other.kind()),
                location: location(),
            }),
        }
    }

    fn names(&self) -> String {
        match self {
            Self::Whole(name) => name.clone(),
            Self::Positional(names) | Self::Named(names) => names.join(", "),
        }
    }

    /// Bind `element` into `scope` according to this mode.
    pub(crate) fn bind(
        &self,
        element: Value,
        index: usize,
        container: &str,
        scope: &mut Context,
        location: impl Fn() -> Box<ErrorLocation>,
    ) -> Result<(), TemplateError> {
        let mismatch = |reason: String| TemplateError::DestructureMismatch {
            container: container.to_string(),
            index,
            bindings: self.names(),
            reason,
            location: location(),
        };

        match (self, element) {
            (Self::Whole(name), element) => {
                scope.insert(name.clone(), element);
                Ok(())
            }
            (Self::Positional(names), Value::Seq(items)) => {
                if items.len() != names.len() {
                    return Err(mismatch(format!(
                        "expected {} values, found {}",
                        names.len(),
                        items.len()
                    )));
                }
                scope.extend(names.iter().cloned().zip(items));
                Ok(())
            }
            (Self::Named(names), Value::Map(mut fields)) => {
                for name in names {
                    let value = fields.remove(name).ok_or_else(|| {
                        TemplateError::MissingElementField {
                            container: container.to_string(),
                            index,
                            field: name.clone(),
                            location: location(),
                        }
                    })?;
                    scope.insert(name.clone(), value);
                }
                Ok(())
            }
            (Self::Positional(_), other) => {
                Err(mismatch(format!("expected a sequence, found a {}", other.kind())))
            }
            (Self::Named(_), other) => {
                Err(mismatch(format!("expected a mapping, found a {}", other.kind())))
            }
        }
    }
}

/// An in-progress loop: hands out one child scope per element.
#[derive(Debug)]
pub(crate) struct LoopExpansion {
    pub(crate) container: String,
    pub(crate) destructure: Destructure,
    pub(crate) elements: std::vec::IntoIter<Value>,
    pub(crate) index: usize,
    pub(crate) parent: Arc<Context>,
    pub(crate) body: Arc<[String]>,
    pub(crate) first_line: usize,
    pub(crate) opened_at: usize,
    pub(crate) origin: Origin,
}

impl LoopExpansion {
    /// Scope for the next iteration, or `None` when the loop is done.
    pub(crate) fn next_scope(&mut self) -> Option<Result<Context, TemplateError>> {
        let element = self.elements.next()?;
        let index = self.index;
        self.index += 1;

        let mut scope = Context::child(&self.parent);
        let origin = &self.origin;
        let opened_at = self.opened_at;
        Some(
            self.destructure
                .bind(element, index, &self.container, &mut scope, || origin.at(opened_at))
                .map(|()| scope),
        )
    }
}
