//! The template interpreter.
//!
//! [`Interpreter::render`] returns a [`RenderStream`]: a lazy, forward-only
//! iterator of fully resolved output lines. Nested loops, conditionals and
//! includes are tracked on an explicit frame stack instead of the call
//! stack, so deep nesting costs heap, not stack. Each pull interprets just
//! enough template lines to produce the next output line.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use sitegen::templating::{Context, Interpreter, MemoryLoader, Value};
//!
//! let loader = MemoryLoader::new()
//!     .with_template("list", "{{%for x in items:\n- {{$x}}\n%}}");
//! let interpreter = Interpreter::new(Arc::new(loader));
//!
//! let mut ctx = Context::new();
//! ctx.insert("items", Value::from(vec!["a", "b"]));
//!
//! let lines = interpreter.render_to_vec("list", ctx).unwrap();
//! assert_eq!(lines, vec!["- a", "- b"]);
//! ```

use std::collections::VecDeque;
use std::mem;
use std::sync::Arc;

use super::block::{self, BlockKind, Destructure, LoopExpansion, Origin};
use super::context::Context;
use super::error::{Diagnostic, DiagnosticKind, TemplateError};
use super::include::{self, IncludeSite, MAX_INCLUDE_DEPTH};
use super::loader::TemplateLoader;
use super::scanner::{self, Directive, INCLUDE_CLOSE_MARKER};
use super::substitution::substitute;

/// What to do when a loop container or condition is not defined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AbsentPolicy {
    /// Skip the loop and treat the condition as false, silently.
    #[default]
    Lenient,
    /// Abort the render with [`TemplateError::AbsentValue`].
    Strict,
}

/// Interpreter settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub absent_policy: AbsentPolicy,
    pub max_include_depth: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            absent_policy: AbsentPolicy::default(),
            max_include_depth: MAX_INCLUDE_DEPTH,
        }
    }
}

/// Renders templates from a loader.
///
/// Cheap to clone and safe to share between threads; every render owns
/// its own context tree.
#[derive(Clone)]
pub struct Interpreter {
    loader: Arc<dyn TemplateLoader>,
    options: RenderOptions,
}

impl Interpreter {
    pub fn new(loader: Arc<dyn TemplateLoader>) -> Self {
        Self {
            loader,
            options: RenderOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_absent_policy(mut self, policy: AbsentPolicy) -> Self {
        self.options.absent_policy = policy;
        self
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Start rendering `name` under `context`.
    ///
    /// Nothing is loaded until the stream is first polled. Rendering again
    /// means calling `render` again; a stream cannot be rewound.
    pub fn render(&self, name: &str, context: Context) -> RenderStream {
        RenderStream {
            loader: Arc::clone(&self.loader),
            options: self.options,
            root: Some((name.to_string(), context)),
            stack: Vec::new(),
            ready: VecDeque::new(),
            held: None,
            pending_prefix: String::new(),
            produced: 0,
            diagnostics: Vec::new(),
            finished: false,
        }
    }

    /// Render `name` completely, collecting the output lines.
    ///
    /// # Errors
    ///
    /// Returns the first fatal [`TemplateError`] hit while rendering.
    pub fn render_to_vec(&self, name: &str, context: Context) -> Result<Vec<String>, TemplateError> {
        self.render(name, context).collect()
    }

    /// Validate the block structure of `name` without rendering it.
    ///
    /// Includes are not followed. Returns the non-fatal diagnostics found.
    ///
    /// # Errors
    ///
    /// Returns load errors and nesting errors.
    pub fn check(&self, name: &str) -> Result<Vec<Diagnostic>, TemplateError> {
        let lines = self.loader.load(name)?;
        check_template(name, &lines)
    }
}

impl std::fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter").field("options", &self.options).finish_non_exhaustive()
    }
}

/// Template lines being interpreted in one scope.
#[derive(Debug)]
struct LinesFrame {
    lines: Arc<[String]>,
    pos: usize,
    /// Template line number of `lines[0]`
    first_line: usize,
    ctx: Arc<Context>,
    origin: Origin,
}

/// Bookkeeping for the text around an include directive.
#[derive(Debug)]
struct Splice {
    /// Suffix text; the first piece joins the last included line
    suffix: Vec<String>,
    produced_at_push: usize,
    prefix_len_at_push: usize,
}

#[derive(Debug)]
enum Frame {
    Lines(LinesFrame),
    Loop(LoopExpansion),
    Splice(Splice),
}

enum Step {
    Start(String, Context),
    Line(Arc<[String]>, usize, usize, Arc<Context>, Origin),
    Enter(LinesFrame),
    Pop,
    FinishSplice(Splice),
    Fail(TemplateError),
    Done,
}

/// Lazily rendered output of one template.
///
/// Yields `Ok(line)` for each output line. After the first `Err` the stream
/// is exhausted; lines already yielded must be discarded by the caller if
/// the render as a whole is to be all-or-nothing.
pub struct RenderStream {
    loader: Arc<dyn TemplateLoader>,
    options: RenderOptions,
    root: Option<(String, Context)>,
    stack: Vec<Frame>,
    ready: VecDeque<String>,
    /// Most recent output line, held back so an include suffix can join it
    held: Option<String>,
    /// Include prefixes waiting for the next output line
    pending_prefix: String,
    produced: usize,
    diagnostics: Vec<Diagnostic>,
    finished: bool,
}

impl RenderStream {
    /// Non-fatal problems found so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        mem::take(&mut self.diagnostics)
    }

    fn step(&mut self) -> Result<(), TemplateError> {
        match self.next_step() {
            Step::Start(name, context) => {
                tracing::debug!("Rendering template '{}'", name);
                let lines = self.loader.load(&name)?;
                self.stack.push(Frame::Lines(LinesFrame {
                    lines,
                    pos: 0,
                    first_line: 1,
                    ctx: Arc::new(context),
                    origin: Origin::root(&name),
                }));
                Ok(())
            }
            Step::Line(lines, idx, first_line, ctx, origin) => {
                self.interpret_line(&lines, idx, first_line, &ctx, &origin)
            }
            Step::Enter(frame) => {
                self.stack.push(Frame::Lines(frame));
                Ok(())
            }
            Step::Pop => {
                self.stack.pop();
                Ok(())
            }
            Step::FinishSplice(splice) => {
                self.finish_splice(splice);
                Ok(())
            }
            Step::Fail(err) => Err(err),
            Step::Done => {
                if let Some(line) = self.held.take() {
                    self.ready.push_back(line);
                }
                self.finished = true;
                Ok(())
            }
        }
    }

    fn next_step(&mut self) -> Step {
        if let Some((name, context)) = self.root.take() {
            return Step::Start(name, context);
        }
        if matches!(self.stack.last(), Some(Frame::Splice(_))) {
            if let Some(Frame::Splice(splice)) = self.stack.pop() {
                return Step::FinishSplice(splice);
            }
        }

        match self.stack.last_mut() {
            None => Step::Done,
            Some(Frame::Lines(frame)) => {
                if frame.pos >= frame.lines.len() {
                    return Step::Pop;
                }
                let idx = frame.pos;
                frame.pos += 1;
                Step::Line(
                    Arc::clone(&frame.lines),
                    idx,
                    frame.first_line,
                    Arc::clone(&frame.ctx),
                    frame.origin.clone(),
                )
            }
            Some(Frame::Loop(expansion)) => match expansion.next_scope() {
                None => Step::Pop,
                Some(Ok(scope)) => Step::Enter(LinesFrame {
                    lines: Arc::clone(&expansion.body),
                    pos: 0,
                    first_line: expansion.first_line,
                    ctx: Arc::new(scope),
                    origin: expansion.origin.clone(),
                }),
                Some(Err(err)) => Step::Fail(err),
            },
            Some(Frame::Splice(_)) => Step::Pop,
        }
    }

    fn interpret_line(
        &mut self,
        lines: &Arc<[String]>,
        idx: usize,
        first_line: usize,
        ctx: &Arc<Context>,
        origin: &Origin,
    ) -> Result<(), TemplateError> {
        let line_no = first_line + idx;
        let line = &lines[idx];

        if line.trim() == INCLUDE_CLOSE_MARKER {
            return Err(TemplateError::StrayClose {
                location: origin.at(line_no),
            });
        }

        let scanned = scanner::scan(line);
        if let Some(text) = scanned.unrecognized {
            self.diagnose(
                DiagnosticKind::UnrecognizedDirective {
                    text,
                },
                origin,
                line_no,
            );
        }

        match scanned.directive {
            Directive::Plain(text) => {
                self.emit(text.to_string());
                Ok(())
            }
            Directive::VariableRef(text) => {
                for out in substitute(text, ctx, origin, line_no, &mut self.diagnostics)? {
                    self.emit(out);
                }
                Ok(())
            }
            Directive::BlockClose => Err(TemplateError::StrayClose {
                location: origin.at(line_no),
            }),
            Directive::Include {
                prefix,
                name,
                overrides,
                suffix,
            } => {
                let site = IncludeSite {
                    name,
                    data: overrides.map(str::to_string),
                    line: line_no,
                };
                self.enter_include(&site, prefix, suffix, ctx, origin)
            }
            Directive::IncludeOpen {
                prefix,
                name,
                data,
            } => {
                let (block, next) =
                    block::collect_block(lines, idx + 1, BlockKind::Include, line_no, first_line, origin)?;
                self.resume_at(next);
                let (tail_data, suffix) = block.tail.unwrap_or_default();
                let site = IncludeSite {
                    name,
                    data: Some(include::join_data(data, &block.body, &tail_data)),
                    line: line_no,
                };
                self.enter_include(&site, prefix, &suffix, ctx, origin)
            }
            Directive::LoopOpen {
                bindings,
                container,
                trailing,
            } => {
                let (body, body_first_line) =
                    self.block_body(BlockKind::Loop, trailing, lines, idx, first_line, origin)?;

                let Some(value) = ctx.lookup(container) else {
                    return self.absent(container, BlockKind::Loop, origin, line_no);
                };
                let Some(elements) = value.iter_elements() else {
                    return Err(TemplateError::NotIterable {
                        variable: container.to_string(),
                        found: value.kind(),
                        location: origin.at(line_no),
                    });
                };
                let destructure =
                    Destructure::resolve(&bindings, &elements, container, || origin.at(line_no))?;

                tracing::debug!(
                    "Expanding loop over '{}' ({} elements) at {}",
                    container,
                    elements.len(),
                    origin.at(line_no)
                );
                self.stack.push(Frame::Loop(LoopExpansion {
                    container: container.to_string(),
                    destructure,
                    elements: elements.into_iter(),
                    index: 0,
                    parent: Arc::clone(ctx),
                    body,
                    first_line: body_first_line,
                    opened_at: line_no,
                    origin: origin.clone(),
                }));
                Ok(())
            }
            Directive::ConditionalOpen {
                condition,
                trailing,
            } => {
                let (body, body_first_line) =
                    self.block_body(BlockKind::Conditional, trailing, lines, idx, first_line, origin)?;

                let Some(value) = ctx.lookup(condition) else {
                    return self.absent(condition, BlockKind::Conditional, origin, line_no);
                };
                if value.is_truthy() {
                    self.stack.push(Frame::Lines(LinesFrame {
                        lines: body,
                        pos: 0,
                        first_line: body_first_line,
                        ctx: Arc::new(Context::child(ctx)),
                        origin: origin.clone(),
                    }));
                }
                Ok(())
            }
        }
    }

    /// Body of a loop or conditional opened on `lines[idx]`, and the template
    /// line number of its first line.
    fn block_body(
        &mut self,
        kind: BlockKind,
        trailing: &str,
        lines: &Arc<[String]>,
        idx: usize,
        first_line: usize,
        origin: &Origin,
    ) -> Result<(Arc<[String]>, usize), TemplateError> {
        let line_no = first_line + idx;

        if let Some(inline) = scanner::inline_body(trailing) {
            let body = if inline.is_empty() {
                Vec::new()
            } else {
                vec![inline.to_string()]
            };
            return Ok((Arc::from(body), line_no));
        }

        let (block, next) = block::collect_block(lines, idx + 1, kind, line_no, first_line, origin)?;
        self.resume_at(next);

        let trailing = trailing.trim();
        if trailing.is_empty() {
            Ok((Arc::from(block.body), line_no + 1))
        } else {
            let mut body = Vec::with_capacity(block.body.len() + 1);
            body.push(trailing.to_string());
            body.extend(block.body);
            Ok((Arc::from(body), line_no))
        }
    }

    fn absent(
        &self,
        name: &str,
        kind: BlockKind,
        origin: &Origin,
        line_no: usize,
    ) -> Result<(), TemplateError> {
        match self.options.absent_policy {
            AbsentPolicy::Lenient => {
                tracing::debug!(
                    "Skipping {} block at {}: '{}' is not defined",
                    kind,
                    origin.at(line_no),
                    name
                );
                Ok(())
            }
            AbsentPolicy::Strict => Err(TemplateError::AbsentValue {
                variable: name.to_string(),
                kind,
                location: origin.at(line_no),
            }),
        }
    }

    fn enter_include(
        &mut self,
        site: &IncludeSite<'_>,
        prefix: &str,
        suffix: &str,
        ctx: &Arc<Context>,
        origin: &Origin,
    ) -> Result<(), TemplateError> {
        let resolved = include::resolve(
            self.loader.as_ref(),
            site,
            ctx,
            origin,
            self.options.max_include_depth,
        )?;

        let mut prefix_lines = self.surrounding_text(prefix, ctx, origin, site.line)?;
        let suffix = self.surrounding_text(suffix, ctx, origin, site.line)?;
        let prefix = prefix_lines.pop().unwrap_or_default();
        for line in prefix_lines {
            self.emit(line);
        }

        self.stack.push(Frame::Splice(Splice {
            suffix,
            produced_at_push: self.produced,
            prefix_len_at_push: self.pending_prefix.len(),
        }));
        self.pending_prefix.push_str(&prefix);
        self.stack.push(Frame::Lines(LinesFrame {
            lines: resolved.lines,
            pos: 0,
            first_line: 1,
            ctx: resolved.context,
            origin: resolved.origin,
        }));
        Ok(())
    }

    /// Substitute the text around an include directive.
    fn surrounding_text(
        &mut self,
        text: &str,
        ctx: &Context,
        origin: &Origin,
        line_no: usize,
    ) -> Result<Vec<String>, TemplateError> {
        if text.is_empty() {
            return Ok(Vec::new());
        }
        substitute(text, ctx, origin, line_no, &mut self.diagnostics)
    }

    fn finish_splice(&mut self, splice: Splice) {
        let mut suffix = splice.suffix.into_iter();

        if self.produced > splice.produced_at_push {
            if let (Some(last), Some(first)) = (self.held.as_mut(), suffix.next()) {
                last.push_str(&first);
            }
        } else {
            // The include produced nothing: keep the surrounding text on a
            // line of its own unless it is blank.
            let mut text = self.pending_prefix.split_off(splice.prefix_len_at_push);
            text.push_str(&suffix.next().unwrap_or_default());
            if !text.trim().is_empty() {
                self.emit(text);
            }
        }

        for line in suffix {
            self.emit(line);
        }
    }

    fn resume_at(&mut self, next: usize) {
        if let Some(Frame::Lines(frame)) = self.stack.last_mut() {
            frame.pos = next;
        }
    }

    fn emit(&mut self, line: String) {
        let line = if self.pending_prefix.is_empty() {
            line
        } else {
            let mut prefixed = mem::take(&mut self.pending_prefix);
            prefixed.push_str(&line);
            prefixed
        };
        if let Some(previous) = self.held.replace(line) {
            self.ready.push_back(previous);
        }
        self.produced += 1;
    }

    fn diagnose(&mut self, kind: DiagnosticKind, origin: &Origin, line_no: usize) {
        let diagnostic = Diagnostic {
            kind,
            template: origin.template.to_string(),
            line: line_no,
        };
        tracing::warn!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }
}

impl Iterator for RenderStream {
    type Item = Result<String, TemplateError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(line) = self.ready.pop_front() {
                return Some(Ok(line));
            }
            if self.finished {
                return None;
            }
            if let Err(err) = self.step() {
                self.finished = true;
                self.stack.clear();
                self.ready.clear();
                self.held = None;
                return Some(Err(err));
            }
        }
    }
}

impl std::iter::FusedIterator for RenderStream {}

impl std::fmt::Debug for RenderStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderStream")
            .field("depth", &self.stack.len())
            .field("produced", &self.produced)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

/// Check the block structure of a template's lines without rendering.
///
/// Loop and conditional bodies are checked recursively; include data is
/// not. Unrecognized directives are returned as diagnostics.
///
/// # Errors
///
/// Returns the first nesting error found.
pub fn check_template(name: &str, lines: &[String]) -> Result<Vec<Diagnostic>, TemplateError> {
    let mut diagnostics = Vec::new();
    check_lines(lines, 1, &Origin::root(name), &mut diagnostics)?;
    Ok(diagnostics)
}

fn check_lines(
    lines: &[String],
    first_line: usize,
    origin: &Origin,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<(), TemplateError> {
    let mut idx = 0;
    while idx < lines.len() {
        let line_no = first_line + idx;
        let line = &lines[idx];
        idx += 1;

        if line.trim() == INCLUDE_CLOSE_MARKER {
            return Err(TemplateError::StrayClose {
                location: origin.at(line_no),
            });
        }

        let scanned = scanner::scan(line);
        if let Some(text) = scanned.unrecognized {
            diagnostics.push(Diagnostic {
                kind: DiagnosticKind::UnrecognizedDirective {
                    text,
                },
                template: origin.template.to_string(),
                line: line_no,
            });
        }
        if scanned.directive == Directive::BlockClose {
            return Err(TemplateError::StrayClose {
                location: origin.at(line_no),
            });
        }

        let trailing = match &scanned.directive {
            Directive::LoopOpen {
                trailing,
                ..
            }
            | Directive::ConditionalOpen {
                trailing,
                ..
            } => Some(*trailing),
            _ => None,
        };

        if let Some(kind) = scanned.directive.opens_block() {
            let (block, next) =
                block::collect_block(lines, idx, kind, line_no, first_line, origin)?;
            if kind != BlockKind::Include {
                match trailing.map(str::trim).filter(|t| !t.is_empty()) {
                    Some(first) => {
                        let mut body = Vec::with_capacity(block.body.len() + 1);
                        body.push(first.to_string());
                        body.extend(block.body);
                        check_lines(&body, line_no, origin, diagnostics)?;
                    }
                    None => check_lines(&block.body, line_no + 1, origin, diagnostics)?,
                }
            }
            idx = next;
        } else if let Some(inline) = trailing.and_then(scanner::inline_body) {
            if !inline.is_empty() {
                check_lines(&[inline.to_string()], line_no, origin, diagnostics)?;
            }
        }
    }
    Ok(())
}
