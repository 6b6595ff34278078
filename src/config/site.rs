//! Site configuration (`site.toml`).

use std::collections::{BTreeMap, HashSet};
use std::path::{Component, Path, PathBuf};

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::core::SitegenError;
use crate::templating::{DocumentKind, Value, validate_name};

/// File name looked up when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "site.toml";

fn default_templates_dir() -> PathBuf {
    PathBuf::from("_templates")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("web")
}

fn default_static_subdir() -> String {
    "static".to_string()
}

fn default_template_extension() -> String {
    "html".to_string()
}

/// The whole site: where templates live, where output goes, and the pages
/// to build.
///
/// Relative paths are resolved against the directory containing the
/// configuration file.
///
/// # Examples
///
/// ```toml
/// public_url = "https://example.org"
///
/// [defaults]
/// site_name = "Example"
///
/// [[pages]]
/// template = "index"
/// output = "index.html"
/// [pages.vars]
/// title = "Home"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_templates_dir")]
    pub templates_dir: PathBuf,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Absolute URL the output directory is published at
    #[serde(default)]
    pub public_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,

    /// Directory under the output root holding static assets
    #[serde(default = "default_static_subdir")]
    pub static_subdir: String,

    /// Extension tried after the bare template name
    #[serde(default = "default_template_extension")]
    pub template_extension: String,

    /// Absent loop containers and conditions are errors instead of empty
    #[serde(default)]
    pub strict: bool,

    #[serde(default)]
    pub default_page_summary: String,

    /// Base variables every page starts from
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub defaults: BTreeMap<String, serde_json::Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pages: Vec<PageConfig>,

    #[serde(skip)]
    root: PathBuf,
}

/// One output file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageConfig {
    pub template: String,

    /// Path relative to the output directory
    pub output: PathBuf,

    #[serde(default)]
    pub document: DocumentKind,

    /// JSON, YAML or TOML mapping merged into the page context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub vars: BTreeMap<String, serde_json::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            templates_dir: default_templates_dir(),
            output_dir: default_output_dir(),
            public_url: String::new(),
            site_name: None,
            static_subdir: default_static_subdir(),
            template_extension: default_template_extension(),
            strict: false,
            default_page_summary: String::new(),
            defaults: BTreeMap::new(),
            pages: Vec::new(),
            root: PathBuf::from("."),
        }
    }
}

impl SiteConfig {
    /// Load and validate the configuration at `path`.
    ///
    /// # Errors
    ///
    /// - [`SitegenError::ConfigNotFound`] if `path` does not exist
    /// - [`SitegenError::ConfigParseError`] if it is not valid TOML for this shape
    /// - [`SitegenError::ConfigError`] if it fails [`validate`](Self::validate)
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SitegenError::ConfigNotFound {
                    path: path.display().to_string(),
                }
                .into());
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read site config from {}", path.display())
                });
            }
        };

        let root = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let config = Self::from_toml_str(&content, root).map_err(|e| match e {
            SitegenError::TomlError(e) => SitegenError::ConfigParseError {
                file: path.display().to_string(),
                reason: e.to_string(),
            },
            other => other,
        })?;

        tracing::debug!("Loaded site config from {} ({} pages)", path.display(), config.pages.len());
        Ok(config)
    }

    /// Parse and validate configuration text whose relative paths are based
    /// at `root`.
    pub fn from_toml_str(content: &str, root: impl Into<PathBuf>) -> Result<Self, SitegenError> {
        let mut config: Self = toml::from_str(content)?;
        config.root = root.into();
        config.validate()?;
        Ok(config)
    }

    /// Check that every page names a valid template and a distinct output
    /// path inside the output directory.
    pub fn validate(&self) -> Result<(), SitegenError> {
        let mut seen = HashSet::new();

        for page in &self.pages {
            if let Err(e) = validate_name(&page.template) {
                return Err(config_error(format!("page '{}': {e}", page.output.display())));
            }

            let escapes = page.output.as_os_str().is_empty()
                || page.output.components().any(|c| !matches!(c, Component::Normal(_)));
            if escapes {
                return Err(config_error(format!(
                    "page output '{}' must be a relative path inside the output directory",
                    page.output.display()
                )));
            }

            if !seen.insert(&page.output) {
                return Err(config_error(format!(
                    "more than one page writes '{}'",
                    page.output.display()
                )));
            }
        }

        Ok(())
    }

    /// Directory the configuration was loaded from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn templates_path(&self) -> PathBuf {
        self.root.join(&self.templates_dir)
    }

    pub fn output_path(&self) -> PathBuf {
        self.root.join(&self.output_dir)
    }

    /// Destination file of `page`.
    pub fn page_output_path(&self, page: &PageConfig) -> PathBuf {
        self.output_path().join(&page.output)
    }

    pub fn page_data_path(&self, page: &PageConfig) -> Option<PathBuf> {
        page.data.as_ref().map(|data| self.root.join(data))
    }

    /// The immutable base every page context is copied from: `defaults`,
    /// then `site_name` and `public_url`.
    pub fn base_values(&self) -> BTreeMap<String, Value> {
        let mut values: BTreeMap<String, Value> =
            self.defaults.iter().map(|(k, v)| (k.clone(), Value::from(v.clone()))).collect();

        if let Some(site_name) = &self.site_name {
            values.insert("site_name".to_string(), Value::from(site_name.as_str()));
        }
        if !self.public_url.is_empty() {
            values.insert("public_url".to_string(), Value::from(self.public_url.as_str()));
        }

        values
    }
}

fn config_error(message: String) -> SitegenError {
    SitegenError::ConfigError {
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SITE: &str = r#"
public_url = "https://example.org"
site_name = "Example"
default_page_summary = "A site"

[defaults]
author = "Ann"
nav = ["home", "about"]

[[pages]]
template = "index"
output = "index.html"

[[pages]]
template = "feed"
output = "feed.xml"
document = "xml"
data = "data/feed.yaml"
summary = "Latest posts"
[pages.vars]
title = "Feed"
"#;

    #[test]
    fn test_parse_defaults() {
        let config = SiteConfig::from_toml_str("", "/site").unwrap();
        assert_eq!(config.templates_path(), Path::new("/site/_templates"));
        assert_eq!(config.output_path(), Path::new("/site/web"));
        assert_eq!(config.static_subdir, "static");
        assert_eq!(config.template_extension, "html");
        assert!(!config.strict);
        assert!(config.pages.is_empty());
    }

    #[test]
    fn test_parse_pages() {
        let config = SiteConfig::from_toml_str(SITE, "/site").unwrap();
        assert_eq!(config.pages.len(), 2);

        let index = &config.pages[0];
        assert_eq!(index.document, DocumentKind::Html);
        assert_eq!(config.page_output_path(index), Path::new("/site/web/index.html"));
        assert_eq!(config.page_data_path(index), None);

        let feed = &config.pages[1];
        assert_eq!(feed.document, DocumentKind::Xml);
        assert_eq!(config.page_data_path(feed), Some(PathBuf::from("/site/data/feed.yaml")));
        assert_eq!(feed.vars["title"], serde_json::json!("Feed"));
    }

    #[test]
    fn test_base_values() {
        let config = SiteConfig::from_toml_str(SITE, ".").unwrap();
        let base = config.base_values();

        assert_eq!(base["author"].to_string(), "Ann");
        assert_eq!(base["site_name"].to_string(), "Example");
        assert_eq!(base["public_url"].to_string(), "https://example.org");
        assert_eq!(base["nav"].iter_elements().map(|v| v.len()), Some(2));
    }

    #[test]
    fn test_rejects_escaping_output() {
        for output in ["../index.html", "/tmp/index.html", "a/../../b.html", ""] {
            let text = format!("[[pages]]\ntemplate = \"index\"\noutput = \"{output}\"\n");
            let err = SiteConfig::from_toml_str(&text, ".").unwrap_err();
            assert!(matches!(err, SitegenError::ConfigError { .. }), "{output}: {err}");
        }
    }

    #[test]
    fn test_rejects_duplicate_outputs() {
        let text = "[[pages]]\ntemplate = \"a\"\noutput = \"x.html\"\n\
                    [[pages]]\ntemplate = \"b\"\noutput = \"x.html\"\n";
        let err = SiteConfig::from_toml_str(text, ".").unwrap_err();
        assert!(err.to_string().contains("more than one page"));
    }

    #[test]
    fn test_rejects_invalid_template_name() {
        let text = "[[pages]]\ntemplate = \"../secret\"\noutput = \"x.html\"\n";
        let err = SiteConfig::from_toml_str(text, ".").unwrap_err();
        assert!(matches!(err, SitegenError::ConfigError { .. }));
    }

    #[tokio::test]
    async fn test_load_from() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("site.toml");
        std::fs::write(&path, SITE).unwrap();

        let config = SiteConfig::load_from(&path).await.unwrap();
        assert_eq!(config.root(), temp.path());
        assert_eq!(config.pages.len(), 2);
    }

    #[tokio::test]
    async fn test_load_from_missing() {
        let temp = TempDir::new().unwrap();
        let err = SiteConfig::load_from(&temp.path().join("site.toml")).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SitegenError>(),
            Some(SitegenError::ConfigNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_load_from_invalid_toml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("site.toml");
        std::fs::write(&path, "pages = 3").unwrap();

        let err = SiteConfig::load_from(&path).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SitegenError>(),
            Some(SitegenError::ConfigParseError { .. })
        ));
    }
}
