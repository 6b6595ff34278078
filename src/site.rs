//! Building a whole site from its configuration.
//!
//! [`SiteBuilder`] turns each [`PageConfig`] into a render context, renders
//! its template inside the page's document frame and atomically replaces
//! the output file. Pages render in parallel on the blocking thread pool.
//! The first failure stops the build: pages already rendering finish, no
//! further page is started, and the failing page keeps its previous output.
//!
//! # Page context
//!
//! Each page starts from a copy of the site's base values and then layers,
//! later entries winning:
//!
//! - `rootdir` - `"../"` once per directory level of the output path
//! - `static_root` - `rootdir` followed by the static subdirectory
//! - `canonical_url` - `public_url` joined with the output path, without a
//!   trailing `/index.html`
//! - `page_summary` - the page summary, or the site default
//! - `build_date` - RFC 2822 timestamp of the build
//! - values from the page's data file
//! - the page's inline `vars`

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context as _, Result};
use futures::stream::{self, StreamExt};

use crate::config::{PageConfig, SiteConfig};
use crate::core::SitegenError;
use crate::templating::{
    AbsentPolicy, Context, Diagnostic, FileSystemLoader, Interpreter, Renderer, TemplateLoader,
    Value,
};
use crate::utils::fs::read_data_file;

/// Result of building one page.
#[derive(Debug, Clone)]
pub struct PageReport {
    pub output: PathBuf,
    pub lines: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// A page that failed to build.
#[derive(Debug)]
pub struct PageFailure {
    pub output: PathBuf,
    pub error: anyhow::Error,
}

/// Outcome of [`SiteBuilder::build`].
#[derive(Debug, Default)]
pub struct BuildReport {
    pub built: Vec<PageReport>,
    pub failures: Vec<PageFailure>,
    /// Pages never started because an earlier page failed
    pub skipped: Vec<PathBuf>,
}

impl BuildReport {
    pub fn total(&self) -> usize {
        self.built.len() + self.failures.len() + self.skipped.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn diagnostic_count(&self) -> usize {
        self.built.iter().map(|page| page.diagnostics.len()).sum()
    }
}

/// Renders the pages of a [`SiteConfig`].
#[derive(Debug, Clone)]
pub struct SiteBuilder {
    config: Arc<SiteConfig>,
    loader: Arc<FileSystemLoader>,
    renderer: Renderer,
    base: Arc<BTreeMap<String, Value>>,
    build_date: String,
}

impl SiteBuilder {
    pub fn new(config: SiteConfig) -> Self {
        let loader = Arc::new(
            FileSystemLoader::new(config.templates_path())
                .with_extensions([config.template_extension.as_str()]),
        );
        let policy = if config.strict {
            AbsentPolicy::Strict
        } else {
            AbsentPolicy::Lenient
        };
        let shared: Arc<dyn TemplateLoader> = loader.clone();
        let renderer = Renderer::new(Interpreter::new(shared).with_absent_policy(policy));

        Self {
            base: Arc::new(config.base_values()),
            config: Arc::new(config),
            loader,
            renderer,
            build_date: chrono::Utc::now().to_rfc2822(),
        }
    }

    /// Use a fixed `build_date` instead of the current time.
    #[must_use]
    pub fn with_build_date(mut self, build_date: impl Into<String>) -> Self {
        self.build_date = build_date.into();
        self
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Build the context `page` renders with.
    pub fn page_context(&self, page: &PageConfig) -> Result<Context> {
        let mut context = Context::from_base(&self.base);

        let rootdir = root_dir(&page.output);
        context.insert("static_root", format!("{rootdir}{}", self.config.static_subdir));
        context.insert("rootdir", rootdir);
        context.insert("canonical_url", canonical_url(&self.config.public_url, &page.output));
        context.insert(
            "page_summary",
            page.summary.as_deref().unwrap_or(&self.config.default_page_summary),
        );
        context.insert("build_date", self.build_date.as_str());

        if let Some(path) = self.config.page_data_path(page) {
            context.extend(load_data_values(&path)?);
        }
        context.extend(page.vars.iter().map(|(k, v)| (k.clone(), Value::from(v.clone()))));

        Ok(context)
    }

    /// Render one page and replace its output file.
    pub fn build_page(&self, page: &PageConfig) -> Result<PageReport> {
        let output = self.config.page_output_path(page);
        let context = self
            .page_context(page)
            .with_context(|| format!("Failed to prepare context for {}", page.output.display()))?;

        let summary = self
            .renderer
            .render_to_file(&page.template, context, &page.document.frame(), &output)
            .with_context(|| format!("Failed to build {}", page.output.display()))?;

        Ok(PageReport {
            output,
            lines: summary.lines,
            diagnostics: summary.diagnostics,
        })
    }

    /// Build every page, rendering up to `jobs` at once.
    ///
    /// Stops starting new pages as soon as one fails.
    pub async fn build(&self, jobs: usize) -> BuildReport {
        let total = self.config.pages.len();
        tracing::info!("Building {} pages into {}", total, self.config.output_path().display());

        let failed = Arc::new(AtomicBool::new(false));
        let results: Vec<(PathBuf, Option<Result<PageReport>>)> = stream::iter(0..total)
            .map(|index| {
                let builder = self.clone();
                let failed = Arc::clone(&failed);
                async move {
                    let output = builder.config.page_output_path(&builder.config.pages[index]);
                    if failed.load(Ordering::SeqCst) {
                        return (output, None);
                    }
                    let result = tokio::task::spawn_blocking(move || {
                        builder.build_page(&builder.config.pages[index])
                    })
                    .await
                    .context("Page render task panicked")
                    .and_then(|result| result);
                    if result.is_err() {
                        failed.store(true, Ordering::SeqCst);
                    }
                    (output, Some(result))
                }
            })
            .buffer_unordered(jobs.max(1))
            .collect()
            .await;

        let mut report = BuildReport::default();
        for (output, result) in results {
            match result {
                Some(Ok(page)) => report.built.push(page),
                Some(Err(error)) => {
                    tracing::debug!("Page {} failed: {:#}", output.display(), error);
                    report.failures.push(PageFailure {
                        output,
                        error,
                    });
                }
                None => report.skipped.push(output),
            }
        }
        if !report.skipped.is_empty() {
            tracing::warn!("Skipped {} pages after a failure", report.skipped.len());
        }
        report.built.sort_by(|a, b| a.output.cmp(&b.output));
        report.failures.sort_by(|a, b| a.output.cmp(&b.output));
        report.skipped.sort();

        let (hits, misses) = self.loader.cache_stats();
        tracing::debug!(
            "Template cache: {} hits, {} misses ({:.1}% hit rate)",
            hits,
            misses,
            self.loader.cache_hit_rate()
        );
        tracing::info!(
            "Built {} of {} pages ({} diagnostics)",
            report.built.len(),
            report.total(),
            report.diagnostic_count()
        );

        report
    }
}

/// Read a data file whose top level must be a mapping.
pub fn load_data_values(path: &Path) -> Result<BTreeMap<String, Value>> {
    let data_error = |reason: String| SitegenError::DataFileError {
        path: path.display().to_string(),
        reason,
    };

    let data: serde_json::Value =
        read_data_file(path).map_err(|e| data_error(format!("{e:#}")))?;
    match data {
        serde_json::Value::Object(map) => {
            Ok(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
        }
        other => Err(data_error(format!(
            "expected a mapping at the top level, found {}",
            Value::from(other).kind()
        ))
        .into()),
    }
}

fn root_dir(output: &Path) -> String {
    let levels = output.parent().map_or(0, |parent| parent.components().count());
    "../".repeat(levels)
}

fn canonical_url(public_url: &str, output: &Path) -> String {
    let relative = output
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");

    let url = if public_url.is_empty() {
        relative
    } else {
        format!("{}/{}", public_url.trim_end_matches('/'), relative)
    };

    match url.strip_suffix("/index.html") {
        Some(stripped) => stripped.to_string(),
        None => url,
    }
}
