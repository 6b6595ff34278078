//! `{{$name}}` substitution.
//!
//! References on a line are replaced with the textual form of their values,
//! repeatedly, until none remain. Values may themselves contain references,
//! so the number of passes is bounded. A value spanning several lines splits
//! the line, and each resulting line is substituted on its own against the
//! same context.

use regex::Captures;
use strsim::levenshtein;

use super::block::Origin;
use super::context::Context;
use super::error::{Diagnostic, DiagnosticKind, TemplateError};
use super::scanner::VARIABLE;

/// Passes over one line before substitution is considered self-referential.
pub const MAX_SUBSTITUTION_PASSES: usize = 16;

/// Maximum Levenshtein distance, as a percentage of the name length, for a
/// bound name to be suggested in place of an unresolved one.
const SIMILARITY_THRESHOLD_PERCENT: usize = 50;

/// Substitute every reference on `line`, returning one or more output lines.
///
/// Unresolved names are removed (surrounding text is kept) and recorded in
/// `diagnostics`.
pub(crate) fn substitute(
    line: &str,
    ctx: &Context,
    origin: &Origin,
    line_no: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Vec<String>, TemplateError> {
    let mut out = Vec::new();
    substitute_into(line.to_string(), 0, ctx, origin, line_no, diagnostics, &mut out)?;
    Ok(out)
}

fn substitute_into(
    mut current: String,
    mut passes: usize,
    ctx: &Context,
    origin: &Origin,
    line_no: usize,
    diagnostics: &mut Vec<Diagnostic>,
    out: &mut Vec<String>,
) -> Result<(), TemplateError> {
    while VARIABLE.is_match(&current) {
        if passes >= MAX_SUBSTITUTION_PASSES {
            return Err(TemplateError::SubstitutionLoop {
                passes,
                location: origin.at(line_no),
            });
        }
        passes += 1;

        let replaced = VARIABLE
            .replace_all(&current, |caps: &Captures<'_>| {
                let name = &caps["name"];
                match ctx.lookup(name) {
                    Some(value) => value.to_string(),
                    None => {
                        let diagnostic = unresolved(name, ctx, origin, line_no);
                        tracing::warn!("{}", diagnostic);
                        diagnostics.push(diagnostic);
                        String::new()
                    }
                }
            })
            .into_owned();

        if replaced.contains('\n') {
            for piece in replaced.lines() {
                substitute_into(piece.to_string(), passes, ctx, origin, line_no, diagnostics, out)?;
            }
            return Ok(());
        }
        current = replaced;
    }

    out.push(current);
    Ok(())
}

fn unresolved(name: &str, ctx: &Context, origin: &Origin, line_no: usize) -> Diagnostic {
    Diagnostic {
        kind: DiagnosticKind::UnresolvedVariable {
            name: name.to_string(),
            suggestions: find_similar_names(name, &ctx.visible_names()),
        },
        template: origin.template.to_string(),
        line: line_no,
    }
}

/// Closest bound names to `target`, at most three.
fn find_similar_names(target: &str, available: &[String]) -> Vec<String> {
    let mut scored: Vec<_> =
        available.iter().map(|name| (name.clone(), levenshtein(target, name))).collect();

    scored.sort_by_key(|(_, dist)| *dist);

    scored
        .into_iter()
        .filter(|(_, dist)| *dist <= target.len() * SIMILARITY_THRESHOLD_PERCENT / 100)
        .take(3)
        .map(|(name, _)| name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templating::value::Value;

    fn run(line: &str, ctx: &Context) -> (Result<Vec<String>, TemplateError>, Vec<Diagnostic>) {
        let origin = Origin::root("page");
        let mut diagnostics = Vec::new();
        let result = substitute(line, ctx, &origin, 7, &mut diagnostics);
        (result, diagnostics)
    }

    #[test]
    fn test_multiple_references() {
        let mut ctx = Context::new();
        ctx.insert("first", "Ada");
        ctx.insert("last", "Lovelace");
        let (result, diagnostics) = run("<b>{{$first}} {{$last}}</b>", &ctx);
        assert_eq!(result.unwrap(), vec!["<b>Ada Lovelace</b>"]);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_nested_reference_in_value() {
        let mut ctx = Context::new();
        ctx.insert("greeting", "Hello {{$name}}");
        ctx.insert("name", "World");
        let (result, _) = run("{{$greeting}}!", &ctx);
        assert_eq!(result.unwrap(), vec!["Hello World!"]);
    }

    #[test]
    fn test_unresolved_reference_is_stripped_with_suggestion() {
        let mut ctx = Context::new();
        ctx.insert("title", "Post");
        let (result, diagnostics) = run("Hello {{$titel}}!", &ctx);
        assert_eq!(result.unwrap(), vec!["Hello !"]);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].line, 7);
        assert_eq!(
            diagnostics[0].kind,
            DiagnosticKind::UnresolvedVariable {
                name: "titel".to_string(),
                suggestions: vec!["title".to_string()],
            }
        );
    }

    #[test]
    fn test_multi_line_value_splits_and_resubstitutes() {
        let mut ctx = Context::new();
        ctx.insert("body", "<p>{{$a}}</p>\n<p>{{$b}}</p>");
        ctx.insert("a", "one");
        ctx.insert("b", "two");
        let (result, _) = run("  {{$body}}", &ctx);
        assert_eq!(result.unwrap(), vec!["  <p>one</p>", "<p>two</p>"]);
    }

    #[test]
    fn test_self_reference_is_an_error() {
        let mut ctx = Context::new();
        ctx.insert("loop", "x{{$loop}}");
        let (result, _) = run("{{$loop}}", &ctx);
        assert!(matches!(
            result,
            Err(TemplateError::SubstitutionLoop {
                passes: MAX_SUBSTITUTION_PASSES,
                ..
            })
        ));
    }

    #[test]
    fn test_values_use_their_textual_form() {
        let mut ctx = Context::new();
        ctx.insert("count", 3_i64);
        ctx.insert("tags", Value::from(vec!["rust", "web"]));
        let (result, _) = run("{{$count}} tags: {{$tags}}", &ctx);
        assert_eq!(result.unwrap(), vec!["3 tags: rust, web"]);
    }

    #[test]
    fn test_find_similar_names() {
        let names = vec!["title".to_string(), "tags".to_string(), "summary".to_string()];
        assert_eq!(find_similar_names("titl", &names), vec!["title"]);
        assert!(find_similar_names("zzzzzz", &names).is_empty());
    }
}
