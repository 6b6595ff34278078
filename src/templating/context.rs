//! Render contexts and their copy-on-descend scoping.
//!
//! A [`Context`] maps names to [`Value`]s. Entering a loop iteration,
//! conditional body or include with overrides creates a child context whose
//! own bindings shadow the parent's. The parent is shared, not copied, but a
//! child can only ever write into its own layer, so nothing bound in a child
//! is visible to the parent or to sibling scopes.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use super::value::Value;

/// A layered, immutable-from-children scope.
#[derive(Debug, Clone, Default)]
pub struct Context {
    bindings: HashMap<String, Value>,
    parent: Option<Arc<Context>>,
}

impl Context {
    /// Create an empty top-level context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a top-level context seeded with a copy of `base`.
    ///
    /// Site-wide defaults live in an immutable map; every render starts from
    /// its own copy so pages never observe each other's bindings.
    #[must_use]
    pub fn from_base(base: &BTreeMap<String, Value>) -> Self {
        Self {
            bindings: base.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            parent: None,
        }
    }

    /// Create a child scope of `parent` with no bindings of its own.
    #[must_use]
    pub fn child(parent: &Arc<Context>) -> Self {
        Self {
            bindings: HashMap::new(),
            parent: Some(Arc::clone(parent)),
        }
    }

    /// Bind `name` in this scope, shadowing any binding in an outer scope.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.bindings.insert(name.into(), value.into());
    }

    /// Bind every entry of `values` in this scope.
    pub fn extend<I, K>(&mut self, values: I)
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        for (name, value) in values {
            self.bindings.insert(name.into(), value);
        }
    }

    /// Resolve `name`, innermost scope first.
    ///
    /// A name bound literally (including one containing dots) wins. Otherwise
    /// a dotted name such as `post.title` resolves `post` and then walks
    /// nested mappings.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        if let Some(value) = self.lookup_exact(name) {
            return Some(value);
        }

        let mut parts = name.split('.');
        let head = parts.next()?;
        if head.len() == name.len() {
            return None;
        }
        parts.try_fold(self.lookup_exact(head)?, |value, field| value.get(field))
    }

    fn lookup_exact(&self, name: &str) -> Option<&Value> {
        let mut scope = Some(self);
        while let Some(ctx) = scope {
            if let Some(value) = ctx.bindings.get(name) {
                return Some(value);
            }
            scope = ctx.parent.as_deref();
        }
        None
    }

    /// Every name visible from this scope, sorted.
    ///
    /// Used to suggest alternatives when a reference does not resolve.
    #[must_use]
    pub fn visible_names(&self) -> Vec<String> {
        let mut names = BTreeSet::new();
        let mut scope = Some(self);
        while let Some(ctx) = scope {
            names.extend(ctx.bindings.keys().cloned());
            scope = ctx.parent.as_deref();
        }
        names.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_shadows_without_touching_parent() {
        let mut root = Context::new();
        root.insert("title", "Home");
        root.insert("lang", "en");
        let root = Arc::new(root);

        let mut child = Context::child(&root);
        child.insert("title", "Post");

        assert_eq!(child.lookup("title"), Some(&Value::from("Post")));
        assert_eq!(child.lookup("lang"), Some(&Value::from("en")));
        assert_eq!(root.lookup("title"), Some(&Value::from("Home")));
    }

    #[test]
    fn test_siblings_are_independent() {
        let root = Arc::new(Context::new());
        let mut first = Context::child(&root);
        first.insert("x", "1");
        let second = Context::child(&root);

        assert!(second.lookup("x").is_none());
        assert!(root.lookup("x").is_none());
    }

    #[test]
    fn test_dotted_lookup_walks_mappings() {
        let mut ctx = Context::new();
        ctx.insert("post", Value::from(serde_json::json!({"meta": {"title": "Hi"}})));
        ctx.insert("a.b", "literal");

        assert_eq!(ctx.lookup("post.meta.title"), Some(&Value::from("Hi")));
        assert_eq!(ctx.lookup("a.b"), Some(&Value::from("literal")));
        assert!(ctx.lookup("post.missing").is_none());
        assert!(ctx.lookup("missing").is_none());
    }

    #[test]
    fn test_from_base_copies() {
        let mut base = BTreeMap::new();
        base.insert("site".to_string(), Value::from("Example"));
        let mut ctx = Context::from_base(&base);
        ctx.insert("site", "Changed");

        assert_eq!(base["site"], Value::from("Example"));
        assert_eq!(ctx.visible_names(), vec!["site".to_string()]);
    }
}
