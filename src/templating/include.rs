//! Include resolution.
//!
//! An include names another template and optionally carries override data:
//! a JSON object whose entries are bound in a child of the includer's
//! context. Without data the included template sees the includer's context
//! unchanged.

use std::sync::Arc;

use super::block::Origin;
use super::context::Context;
use super::error::{ErrorLocation, TemplateError};
use super::loader::TemplateLoader;
use super::value::Value;

/// Deepest include chain allowed before rendering is aborted.
pub const MAX_INCLUDE_DEPTH: usize = 32;

/// An include directive as found in the including template.
#[derive(Debug)]
pub(crate) struct IncludeSite<'a> {
    pub(crate) name: &'a str,
    /// Override data with the directive markers removed
    pub(crate) data: Option<String>,
    /// 1-based line of the directive in the including template
    pub(crate) line: usize,
}

/// A loaded include, ready to be interpreted.
#[derive(Debug)]
pub(crate) struct ResolvedInclude {
    pub(crate) lines: Arc<[String]>,
    pub(crate) context: Arc<Context>,
    pub(crate) origin: Origin,
}

/// Load the template named at `site` and build the scope it renders in.
pub(crate) fn resolve(
    loader: &dyn TemplateLoader,
    site: &IncludeSite<'_>,
    ctx: &Arc<Context>,
    origin: &Origin,
    max_depth: usize,
) -> Result<ResolvedInclude, TemplateError> {
    if origin.chain.iter().any(|name| name == site.name) || origin.chain.len() >= max_depth {
        let mut chain = origin.chain.to_vec();
        chain.push(site.name.to_string());
        return Err(TemplateError::CircularInclude {
            chain,
        });
    }

    let lines = loader.load(site.name).map_err(|err| match err {
        TemplateError::TemplateNotFound {
            name,
            searched,
            location: None,
        } => TemplateError::TemplateNotFound {
            name,
            searched,
            location: Some(origin.at(site.line)),
        },
        other => other,
    })?;

    let context = match site.data.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        None => Arc::clone(ctx),
        Some(data) => {
            let overrides = parse_overrides(data, site.name, || origin.at(site.line))?;
            let mut scope = Context::child(ctx);
            scope.extend(overrides);
            Arc::new(scope)
        }
    };

    tracing::debug!("Including '{}' from {}", site.name, origin.at(site.line));
    Ok(ResolvedInclude {
        lines,
        context,
        origin: origin.include(site.name),
    })
}

/// Parse include override data into bindings.
pub(crate) fn parse_overrides(
    data: &str,
    target: &str,
    location: impl Fn() -> Box<ErrorLocation>,
) -> Result<Vec<(String, Value)>, TemplateError> {
    let malformed = |message: String| TemplateError::MalformedOverrides {
        target: target.to_string(),
        message,
        location: location(),
    };

    match serde_json::from_str::<serde_json::Value>(data) {
        Ok(serde_json::Value::Object(map)) => {
            Ok(map.into_iter().map(|(name, value)| (name, Value::from(value))).collect())
        }
        Ok(other) => Err(malformed(format!("expected a JSON object, found {}", json_kind(&other)))),
        Err(e) => Err(malformed(e.to_string())),
    }
}

/// Join the data fragments of a multi-line include.
pub(crate) fn join_data(opener: &str, body: &[String], closer: &str) -> String {
    let mut data = String::from(opener);
    for line in body {
        data.push('\n');
        data.push_str(line);
    }
    data.push('\n');
    data.push_str(closer);
    data
}

const fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templating::loader::MemoryLoader;

    fn site<'a>(name: &'a str, data: Option<&'a str>) -> IncludeSite<'a> {
        IncludeSite {
            name,
            data: data.map(str::to_string),
            line: 3,
        }
    }

    #[test]
    fn test_include_without_data_shares_context() {
        let loader = MemoryLoader::new().with_template("footer", "<footer>");
        let mut base = Context::new();
        base.insert("year", "2024");
        let ctx = Arc::new(base);

        let resolved =
            resolve(&loader, &site("footer", None), &ctx, &Origin::root("page"), MAX_INCLUDE_DEPTH)
                .unwrap();
        assert!(Arc::ptr_eq(&resolved.context, &ctx));
        assert_eq!(resolved.origin.chain.as_ref(), ["page", "footer"]);
    }

    #[test]
    fn test_overrides_shadow_without_touching_parent() {
        let loader = MemoryLoader::new().with_template("card", "{{$title}}");
        let mut base = Context::new();
        base.insert("title", "Parent");
        base.insert("lang", "en");
        let ctx = Arc::new(base);

        let resolved = resolve(
            &loader,
            &site("card", Some(r#"{"title": "Child", "tags": ["a"]}"#)),
            &ctx,
            &Origin::root("page"),
            MAX_INCLUDE_DEPTH,
        )
        .unwrap();
        assert_eq!(resolved.context.lookup("title"), Some(&Value::from("Child")));
        assert_eq!(resolved.context.lookup("lang"), Some(&Value::from("en")));
        assert_eq!(ctx.lookup("title"), Some(&Value::from("Parent")));
        assert!(ctx.lookup("tags").is_none());
    }

    #[test]
    fn test_malformed_overrides() {
        let origin = Origin::root("page");
        let err = parse_overrides("[1, 2]", "card", || origin.at(4)).unwrap_err();
        assert!(err.to_string().contains("expected a JSON object, found an array"));

        let err = parse_overrides("{\"a\": ", "card", || origin.at(4)).unwrap_err();
        assert!(matches!(err, TemplateError::MalformedOverrides { .. }));
        assert_eq!(err.template(), Some("page"));
    }

    #[test]
    fn test_missing_include_reports_include_site() {
        let loader = MemoryLoader::new();
        let ctx = Arc::new(Context::new());
        let err = resolve(&loader, &site("nope", None), &ctx, &Origin::root("page"), 8)
            .unwrap_err();
        match err {
            TemplateError::TemplateNotFound {
                name,
                location: Some(location),
                ..
            } => {
                assert_eq!(name, "nope");
                assert_eq!(location.line, Some(3));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_cycles_and_depth() {
        let loader = MemoryLoader::new().with_template("a", "x");
        let ctx = Arc::new(Context::new());
        let origin = Origin::root("a").include("b");

        let err = resolve(&loader, &site("a", None), &ctx, &origin, MAX_INCLUDE_DEPTH).unwrap_err();
        assert_eq!(err.to_string(), "Circular include: a -> b -> a");

        let err = resolve(&loader, &site("a", None), &ctx, &Origin::root("page"), 1).unwrap_err();
        assert!(matches!(err, TemplateError::CircularInclude { .. }));
    }

    #[test]
    fn test_join_data() {
        let body = vec!["\"a\": 1,".to_string()];
        assert_eq!(join_data(" {", &body, "\"b\": 2} "), " {\n\"a\": 1,\n\"b\": 2} ");
    }
}
