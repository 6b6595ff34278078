//! Test site setup and management
//!
//! A [`TestSite`] is a throwaway site directory with `_templates/`, data
//! files and a `site.toml`, for library and integration tests.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A site directory that is deleted when dropped
pub struct TestSite {
    pub temp_dir: TempDir,
    pub root: PathBuf,
    pub templates_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl TestSite {
    /// Create an empty site with a `_templates` directory
    pub fn new() -> Result<Self> {
        super::init_test_logging(None);

        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().join("site");
        let templates_dir = root.join("_templates");
        let output_dir = root.join("web");

        fs::create_dir_all(&templates_dir)?;

        Ok(Self {
            temp_dir,
            root,
            templates_dir,
            output_dir,
        })
    }

    /// Write `_templates/<name>` (no extension is added)
    pub fn add_template(&self, name: &str, text: &str) -> Result<PathBuf> {
        let path = self.templates_dir.join(name);
        self.write(&path, text)?;
        Ok(path)
    }

    /// Write a file relative to the site root
    pub fn add_file(&self, relative: &str, content: &str) -> Result<PathBuf> {
        let path = self.root.join(relative);
        self.write(&path, content)?;
        Ok(path)
    }

    /// Write `site.toml`
    pub fn write_config(&self, toml: &str) -> Result<PathBuf> {
        self.add_file("site.toml", toml.trim_start())
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join("site.toml")
    }

    /// Read a file relative to the output directory
    pub fn read_output(&self, relative: &str) -> Result<String> {
        let path = self.output_dir.join(relative);
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read output file: {}", path.display()))
    }

    pub fn output_exists(&self, relative: &str) -> bool {
        self.output_dir.join(relative).exists()
    }

    fn write(&self, path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
    }
}
