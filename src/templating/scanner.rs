//! Directive scanner: classifies one line of template text.
//!
//! The template language is line oriented. Each line is one of:
//!
//! | Form | Directive |
//! |---|---|
//! | `{{#include name#}}` (optionally `name: {json}`) | [`Directive::Include`] |
//! | `{{#include name: {json...` without `#}}` | [`Directive::IncludeOpen`] |
//! | `{{%for a, b in items:` | [`Directive::LoopOpen`] |
//! | `{{%if flag:` | [`Directive::ConditionalOpen`] |
//! | a bare `%}}` | [`Directive::BlockClose`] |
//! | text containing `{{$name}}` | [`Directive::VariableRef`] |
//! | anything else | [`Directive::Plain`] |
//!
//! Directive-looking text that matches none of these forms is reported back
//! in [`Scanned::unrecognized`] and the line is treated as text.

use std::sync::LazyLock;

use regex::Regex;

use super::block::BlockKind;

static INCLUDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{#include\s+(?P<name>[\w./-]+)\s*(?::(?P<data>.*?))?\s*#\}\}")
        .expect("include pattern is valid")
});

static INCLUDE_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{#include\s+(?P<name>[\w./-]+)\s*:(?P<data>.*)$")
        .expect("include-open pattern is valid")
});

static LOOP_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*\{\{%for\s+(?P<bindings>[\w-]+(?:\s*,\s*[\w-]+)*)\s+in\s+(?P<container>[\w.-]+)\s*:(?P<trailing>.*)$",
    )
    .expect("loop pattern is valid")
});

static CONDITIONAL_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\{\{%if\s+(?P<condition>[\w.-]+)\s*:(?P<trailing>.*)$")
        .expect("conditional pattern is valid")
});

static BLOCK_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*%\}\}\s*$").expect("close pattern is valid"));

/// A well-formed `{{$name}}` reference.
pub(crate) static VARIABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\$(?P<name>[\w.-]+)\}\}").expect("variable pattern is valid")
});

static DIRECTIVE_LIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{[$#%]\S{0,24}").expect("directive-like pattern is valid"));

/// The close marker of loops and conditionals.
pub const BLOCK_CLOSE_MARKER: &str = "%}}";

/// The close marker of includes.
pub const INCLUDE_CLOSE_MARKER: &str = "#}}";

/// One classified line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive<'a> {
    /// Text with no directives
    Plain(&'a str),
    /// Text containing one or more `{{$name}}` references
    VariableRef(&'a str),
    /// An include whose open and close markers are both on this line
    Include {
        prefix: &'a str,
        name: &'a str,
        overrides: Option<&'a str>,
        suffix: &'a str,
    },
    /// The first line of a multi-line include; `data` is the override
    /// fragment following the `:`
    IncludeOpen {
        prefix: &'a str,
        name: &'a str,
        data: &'a str,
    },
    /// `{{%for a, b in container:`; `trailing` is whatever follows the `:`
    LoopOpen {
        bindings: Vec<&'a str>,
        container: &'a str,
        trailing: &'a str,
    },
    /// `{{%if condition:`; `trailing` is whatever follows the `:`
    ConditionalOpen {
        condition: &'a str,
        trailing: &'a str,
    },
    /// A bare `%}}`
    BlockClose,
}

impl Directive<'_> {
    /// The kind of block this line leaves open, if any.
    ///
    /// Loops and conditionals whose trailing text already ends in `%}}` are
    /// closed on the same line and open nothing.
    #[must_use]
    pub fn opens_block(&self) -> Option<BlockKind> {
        match self {
            Self::IncludeOpen {
                ..
            } => Some(BlockKind::Include),
            Self::LoopOpen {
                trailing,
                ..
            } if inline_body(trailing).is_none() => Some(BlockKind::Loop),
            Self::ConditionalOpen {
                trailing,
                ..
            } if inline_body(trailing).is_none() => Some(BlockKind::Conditional),
            _ => None,
        }
    }
}

/// Result of scanning a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scanned<'a> {
    pub directive: Directive<'a>,
    /// Directive-looking text that matched no known form
    pub unrecognized: Option<String>,
}

/// Classify a single line of template text.
///
/// Block openers are tried first, so an include in an opener's trailing
/// text belongs to the block body. Then come includes, the bare close
/// marker and variable references; anything else is text.
#[must_use]
pub fn scan(line: &str) -> Scanned<'_> {
    let directive = classify(line);
    let unrecognized = find_unrecognized(line, &directive);
    Scanned {
        directive,
        unrecognized,
    }
}

fn classify(line: &str) -> Directive<'_> {
    if let Some(caps) = LOOP_OPEN.captures(line) {
        let bindings = caps
            .name("bindings")
            .map_or("", |m| m.as_str())
            .split(',')
            .map(str::trim)
            .collect();
        return Directive::LoopOpen {
            bindings,
            container: caps.name("container").map_or("", |m| m.as_str()),
            trailing: caps.name("trailing").map_or("", |m| m.as_str()),
        };
    }

    if let Some(caps) = CONDITIONAL_OPEN.captures(line) {
        return Directive::ConditionalOpen {
            condition: caps.name("condition").map_or("", |m| m.as_str()),
            trailing: caps.name("trailing").map_or("", |m| m.as_str()),
        };
    }

    if let Some(caps) = INCLUDE.captures(line) {
        let whole = caps.get(0).expect("group 0 always matches");
        return Directive::Include {
            prefix: &line[..whole.start()],
            name: caps.name("name").map_or("", |m| m.as_str()),
            overrides: caps.name("data").map(|m| m.as_str().trim()).filter(|d| !d.is_empty()),
            suffix: &line[whole.end()..],
        };
    }

    if let Some(caps) = INCLUDE_OPEN.captures(line) {
        let whole = caps.get(0).expect("group 0 always matches");
        return Directive::IncludeOpen {
            prefix: &line[..whole.start()],
            name: caps.name("name").map_or("", |m| m.as_str()),
            data: caps.name("data").map_or("", |m| m.as_str()),
        };
    }

    if BLOCK_CLOSE.is_match(line) {
        return Directive::BlockClose;
    }

    if VARIABLE.is_match(line) {
        return Directive::VariableRef(line);
    }

    Directive::Plain(line)
}

/// Report directive-looking text the classifier did not consume.
fn find_unrecognized(line: &str, directive: &Directive<'_>) -> Option<String> {
    let residue = match directive {
        Directive::Include {
            prefix,
            suffix,
            ..
        } => format!("{prefix} {suffix}"),
        Directive::IncludeOpen {
            prefix,
            ..
        } => (*prefix).to_string(),
        // trailing text is scanned again as the first body line
        Directive::LoopOpen {
            ..
        }
        | Directive::ConditionalOpen {
            ..
        }
        | Directive::BlockClose => return None,
        Directive::VariableRef(_) | Directive::Plain(_) => line.to_string(),
    };

    let residue = VARIABLE.replace_all(&residue, "");
    DIRECTIVE_LIKE.find(&residue).map(|m| m.as_str().to_string())
}

/// Split the body out of an opener closed on its own line.
///
/// `{{%if flag: <b>new</b> %}}` has trailing text `" <b>new</b> %}}"`, whose
/// inline body is `"<b>new</b>"`.
#[must_use]
pub fn inline_body(trailing: &str) -> Option<&str> {
    trailing.trim_end().strip_suffix(BLOCK_CLOSE_MARKER).map(str::trim)
}

/// Split a line that ends a multi-line include into its data and suffix.
///
/// Returns `None` when the line does not contain the include close marker.
#[must_use]
pub fn split_include_close(line: &str) -> Option<(&str, &str)> {
    line.find(INCLUDE_CLOSE_MARKER)
        .map(|pos| (&line[..pos], &line[pos + INCLUDE_CLOSE_MARKER.len()..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text() {
        let scanned = scan("<p>Hello</p>");
        assert_eq!(scanned.directive, Directive::Plain("<p>Hello</p>"));
        assert!(scanned.unrecognized.is_none());
    }

    #[test]
    fn test_variable_reference() {
        assert_eq!(scan("Hello {{$name}}!").directive, Directive::VariableRef("Hello {{$name}}!"));
        assert_eq!(scan("{{$a}}{{$b.c}}").directive, Directive::VariableRef("{{$a}}{{$b.c}}"));
    }

    #[test]
    fn test_single_line_include() {
        assert_eq!(
            scan("  {{#include header#}}").directive,
            Directive::Include {
                prefix: "  ",
                name: "header",
                overrides: None,
                suffix: "",
            }
        );
        assert_eq!(
            scan(r#"<li>{{#include partials/card: {"title": "x"} #}}</li>"#).directive,
            Directive::Include {
                prefix: "<li>",
                name: "partials/card",
                overrides: Some(r#"{"title": "x"}"#),
                suffix: "</li>",
            }
        );
    }

    #[test]
    fn test_multi_line_include_open() {
        assert_eq!(
            scan(r#"{{#include card: {"title":"#).directive,
            Directive::IncludeOpen {
                prefix: "",
                name: "card",
                data: r#" {"title":"#,
            }
        );
    }

    #[test]
    fn test_loop_open() {
        let scanned = scan("{{%for tag in tags:");
        assert_eq!(
            scanned.directive,
            Directive::LoopOpen {
                bindings: vec!["tag"],
                container: "tags",
                trailing: "",
            }
        );
        assert_eq!(scanned.directive.opens_block(), Some(BlockKind::Loop));

        assert_eq!(
            scan("  {{%for title, url in links:").directive,
            Directive::LoopOpen {
                bindings: vec!["title", "url"],
                container: "links",
                trailing: "",
            }
        );
    }

    #[test]
    fn test_conditional_open_and_inline() {
        let open = scan("{{%if next_post_url:").directive;
        assert_eq!(open.opens_block(), Some(BlockKind::Conditional));

        let inline = scan("{{%if draft: <em>draft</em> %}}").directive;
        assert_eq!(inline.opens_block(), None);
        if let Directive::ConditionalOpen {
            trailing,
            ..
        } = inline
        {
            assert_eq!(inline_body(trailing), Some("<em>draft</em>"));
        } else {
            panic!("expected a conditional");
        }
    }

    #[test]
    fn test_opener_with_trailing_include() {
        let scanned = scan("{{%if show: {{#include badge#}} %}}");
        assert_eq!(
            scanned.directive,
            Directive::ConditionalOpen {
                condition: "show",
                trailing: " {{#include badge#}} %}}",
            }
        );
        assert!(scanned.unrecognized.is_none());

        let scanned = scan("{{%for p in posts: {{#include item#}}");
        assert_eq!(scanned.directive.opens_block(), Some(BlockKind::Loop));
        assert!(scanned.unrecognized.is_none());
    }

    #[test]
    fn test_block_close() {
        assert_eq!(scan("%}}").directive, Directive::BlockClose);
        assert_eq!(scan("   %}}  ").directive, Directive::BlockClose);
        assert_eq!(scan("text %}}").directive, Directive::Plain("text %}}"));
    }

    #[test]
    fn test_unrecognized_directive_passes_through() {
        let scanned = scan("before {{%while x: after");
        assert_eq!(scanned.directive, Directive::Plain("before {{%while x: after"));
        assert_eq!(scanned.unrecognized.as_deref(), Some("{{%while"));

        let scanned = scan("{{$ok}} and {{#bogus}}");
        assert_eq!(scanned.directive, Directive::VariableRef("{{$ok}} and {{#bogus}}"));
        assert!(scanned.unrecognized.is_some());

        assert!(scan("{{$fine}}").unrecognized.is_none());
    }

    #[test]
    fn test_split_include_close() {
        assert_eq!(split_include_close(r#"  "b": 2} #}}</div>"#), Some((r#"  "b": 2} "#, "</div>")));
        assert_eq!(split_include_close(r#""a": 1,"#), None);
    }
}
