//! Reading structured data files.
//!
//! Page data files are JSON, YAML or TOML, chosen by extension.

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::Path;

/// Reads a UTF-8 text file.
pub fn read_text_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))
}

/// Reads and deserializes a JSON file.
pub fn read_json_file<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let content = read_text_file(path)?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON from file: {}", path.display()))
}

/// Reads and deserializes a TOML file.
pub fn read_toml_file<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let content = read_text_file(path)?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML from file: {}", path.display()))
}

/// Reads and deserializes a YAML file.
pub fn read_yaml_file<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let content = read_text_file(path)?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse YAML from file: {}", path.display()))
}

/// Reads a data file as JSON, YAML or TOML depending on its extension.
///
/// `.json` is parsed as JSON, `.yaml` and `.yml` as YAML, `.toml` as TOML.
pub fn read_data_file<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
        Some("json") => read_json_file(path),
        Some("yaml" | "yml") => read_yaml_file(path),
        Some("toml") => read_toml_file(path),
        _ => bail!(
            "Unsupported data file: {} (expected a .json, .yaml, .yml or .toml extension)",
            path.display()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, Deserialize, PartialEq)]
    struct TestData {
        name: String,
        value: i32,
    }

    fn expected() -> TestData {
        TestData {
            name: "test".to_string(),
            value: 42,
        }
    }

    #[test]
    fn test_read_json_and_yaml_data_files() {
        let temp = tempdir().unwrap();
        let json = temp.path().join("data.json");
        let yaml = temp.path().join("data.YML");
        std::fs::write(&json, r#"{"name": "test", "value": 42}"#).unwrap();
        std::fs::write(&yaml, "name: test\nvalue: 42\n").unwrap();

        assert_eq!(read_data_file::<TestData>(&json).unwrap(), expected());
        assert_eq!(read_data_file::<TestData>(&yaml).unwrap(), expected());
    }

    #[test]
    fn test_read_toml_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("test.toml");
        std::fs::write(&path, "name = \"test\"\nvalue = 42\n").unwrap();

        assert_eq!(read_toml_file::<TestData>(&path).unwrap(), expected());
        assert_eq!(read_data_file::<TestData>(&path).unwrap(), expected());
    }

    #[test]
    fn test_unsupported_data_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("data.csv");
        std::fs::write(&path, "name,value").unwrap();

        let err = read_data_file::<TestData>(&path).unwrap_err();
        assert!(err.to_string().contains("Unsupported data file"));
    }

    #[test]
    fn test_read_nonexistent_file() {
        let result = read_text_file(Path::new("/nonexistent/file.txt"));
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_errors() {
        let temp = tempdir().unwrap();

        let json = temp.path().join("invalid.json");
        std::fs::write(&json, "not valid json").unwrap();
        assert!(read_json_file::<TestData>(&json).is_err());

        let toml = temp.path().join("invalid.toml");
        std::fs::write(&toml, "not = valid = toml").unwrap();
        assert!(read_toml_file::<TestData>(&toml).is_err());

        let yaml = temp.path().join("invalid.yaml");
        std::fs::write(&yaml, "not: valid: yaml: [").unwrap();
        assert!(read_yaml_file::<TestData>(&yaml).is_err());
    }
}
