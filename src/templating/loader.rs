//! Template loading by name.
//!
//! Templates are referred to by logical name (`post`, `partials/card`), never
//! by filesystem path. A [`TemplateLoader`] turns a name into the template's
//! lines. [`FileSystemLoader`] resolves names under a templates directory;
//! [`MemoryLoader`] serves templates registered in code.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use super::cache::TemplateCache;
use super::error::TemplateError;

/// Resolves template names to their lines.
///
/// Implementations must be shareable across threads: pages are rendered in
/// parallel against one loader.
pub trait TemplateLoader: Send + Sync {
    /// Load the named template.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::TemplateNotFound`] for unknown names and
    /// [`TemplateError::InvalidTemplateName`] for names that look like paths
    /// escaping the template root.
    fn load(&self, name: &str) -> Result<Arc<[String]>, TemplateError>;
}

/// Reject names that are not plain relative template names.
pub fn validate_name(name: &str) -> Result<(), TemplateError> {
    let invalid = |reason| {
        Err(TemplateError::InvalidTemplateName {
            name: name.to_string(),
            reason,
        })
    };

    if name.trim().is_empty() {
        return invalid("name is empty");
    }
    if name.contains('\\') {
        return invalid("use '/' to separate directories");
    }

    if name.starts_with('/') || Path::new(name).is_absolute() {
        return invalid("absolute paths are not allowed");
    }
    // split by hand: Path::components() drops interior '.' segments
    for segment in name.split('/') {
        match segment {
            "" => return invalid("empty path segments are not allowed"),
            "." | ".." => return invalid("'.' and '..' components are not allowed"),
            _ => {}
        }
    }
    Ok(())
}

fn split_lines(text: &str) -> Arc<[String]> {
    text.lines().map(str::to_string).collect::<Vec<_>>().into()
}

/// Loads templates from files under a root directory.
///
/// A name is tried as given and then with each configured extension, so
/// `post` finds `post.html`. Loaded templates are cached for the lifetime of
/// the loader.
#[derive(Debug)]
pub struct FileSystemLoader {
    root: PathBuf,
    extensions: Vec<String>,
    cache: Mutex<TemplateCache>,
}

impl FileSystemLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: vec!["html".to_string()],
            cache: Mutex::new(TemplateCache::new()),
        }
    }

    /// Replace the extensions tried after the bare name.
    #[must_use]
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.into().trim_start_matches('.').to_string())
            .filter(|e| !e.is_empty())
            .collect();
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Candidate files for `name`, in lookup order.
    #[must_use]
    pub fn candidates(&self, name: &str) -> Vec<PathBuf> {
        let base = self.root.join(name);
        let mut paths = vec![base.clone()];
        for ext in &self.extensions {
            paths.push(PathBuf::from(format!("{}.{}", base.display(), ext)));
        }
        paths
    }

    /// Cache `(hits, misses)`, logged at the end of a build.
    pub fn cache_stats(&self) -> (usize, usize) {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).stats()
    }

    pub fn cache_hit_rate(&self) -> f64 {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).hit_rate()
    }

    /// Drop every cached template, e.g. after templates changed on disk.
    pub fn clear_cache(&self) {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl TemplateLoader for FileSystemLoader {
    fn load(&self, name: &str) -> Result<Arc<[String]>, TemplateError> {
        validate_name(name)?;

        if let Some(lines) = self.cache.lock().unwrap_or_else(PoisonError::into_inner).get(name) {
            return Ok(lines);
        }

        let candidates = self.candidates(name);
        let Some(path) = candidates.iter().find(|p| p.is_file()) else {
            return Err(TemplateError::TemplateNotFound {
                name: name.to_string(),
                searched: candidates,
                location: None,
            });
        };

        let text = std::fs::read_to_string(path).map_err(|source| TemplateError::Io {
            name: name.to_string(),
            path: path.clone(),
            source,
        })?;
        tracing::debug!("Loaded template '{}' from {}", name, path.display());

        let lines = split_lines(&text);
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), Arc::clone(&lines));
        Ok(lines)
    }
}

/// Templates held in memory, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    templates: HashMap<String, Arc<[String]>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `text` under `name`, replacing any previous template.
    pub fn insert(&mut self, name: impl Into<String>, text: &str) {
        self.templates.insert(name.into(), split_lines(text));
    }

    #[must_use]
    pub fn with_template(mut self, name: impl Into<String>, text: &str) -> Self {
        self.insert(name, text);
        self
    }
}

impl TemplateLoader for MemoryLoader {
    fn load(&self, name: &str) -> Result<Arc<[String]>, TemplateError> {
        validate_name(name)?;
        self.templates.get(name).cloned().ok_or_else(|| TemplateError::TemplateNotFound {
            name: name.to_string(),
            searched: Vec::new(),
            location: None,
        })
    }
}
