use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::error::InputError;
use crate::types::ComponentRecord;

/// Supplies component records produced by an extraction collaborator.
pub trait ComponentSource: Send + Sync {
    /// Human-readable origin, used in logs.
    fn name(&self) -> &str;

    fn load(&self) -> Result<Vec<ComponentRecord>, InputError>;
}

/// Parse a JSON array of component records.
pub fn parse_records(json: &str) -> Result<Vec<ComponentRecord>, InputError> {
    Ok(serde_json::from_str(json)?)
}

/// Read and parse a JSON record file, with the path in the error chain.
pub fn read_records(path: &Path) -> Result<Vec<ComponentRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read component records '{}'", path.display()))?;
    parse_records(&content)
        .with_context(|| format!("invalid component records in '{}'", path.display()))
}

/// Records held in memory as JSON text.
pub struct JsonRecords {
    json: String,
}

impl JsonRecords {
    pub fn new(json: impl Into<String>) -> Self {
        Self { json: json.into() }
    }
}

impl ComponentSource for JsonRecords {
    fn name(&self) -> &str {
        "inline json"
    }

    fn load(&self) -> Result<Vec<ComponentRecord>, InputError> {
        parse_records(&self.json)
    }
}

/// Records read from a JSON file on each load.
pub struct JsonFileSource {
    path: PathBuf,
    name: String,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self { path, name }
    }
}

impl ComponentSource for JsonFileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> Result<Vec<ComponentRecord>, InputError> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| InputError::Io {
            path: self.name.clone(),
            source,
        })?;
        parse_records(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const RECORD: &str = r#"[{
        "component_id": "billing",
        "display_name": "Billing",
        "file_path": "src/billing.rs",
        "loc": 120,
        "exported_symbols": ["charge"],
        "private_symbols": ["round"],
        "raw_dependency_references": ["src/ledger.rs", {"target": "Ledger", "kind": "call", "symbols": ["post"]}],
        "declares_abstraction": false,
        "uses_dependency_injection": true
    }]"#;

    #[test]
    fn test_parse_records() {
        let records = parse_records(RECORD).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].raw_dependency_references.len(), 2);
        assert!(records[0].uses_dependency_injection);
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let json = r#"[{"component_id": "a", "display_name": "A", "file_path": "a.rs"}]"#;
        let err = parse_records(json).unwrap_err();
        assert!(matches!(err, InputError::Malformed(_)));
        assert!(err.to_string().contains("missing field"));
    }

    #[test]
    fn test_json_file_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(RECORD.as_bytes()).unwrap();

        let source = JsonFileSource::new(file.path());
        assert_eq!(source.load().unwrap().len(), 1);
        assert_eq!(read_records(file.path()).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = JsonFileSource::new(dir.path().join("absent.json"));
        assert!(matches!(source.load(), Err(InputError::Io { .. })));
        let err = read_records(&dir.path().join("absent.json")).unwrap_err();
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn test_inline_source() {
        let source = JsonRecords::new("[]");
        assert!(source.load().unwrap().is_empty());
        assert_eq!(source.name(), "inline json");
    }
}
