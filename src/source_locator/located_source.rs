use super::error::LocatorError;
use super::file_helper::{is_readable_file, normalize_path, read_file};
use serde::Serialize;
use std::path::Path;

/// Where a located source came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SourceOrigin {
    /// Project file or in-memory string.
    Plain,
    /// Stub for a built-in symbol.
    Internal { extension_name: String },
    /// Code evaluated at run time.
    Evaled,
    /// Fragment of a file holding an anonymous class or closure.
    Anonymous,
}

/// Source text plus the metadata needed to report on it. Immutable.
#[derive(Debug, Clone, Serialize)]
pub struct LocatedSource {
    #[serde(skip)]
    source: Vec<u8>,
    name: Option<String>,
    filename: Option<String>,
    origin: SourceOrigin,
}

impl LocatedSource {
    /// A `filename`, when given, must name a readable file right now.
    pub fn new(
        source: impl Into<Vec<u8>>,
        name: Option<&str>,
        filename: Option<&Path>,
    ) -> Result<Self, LocatorError> {
        let filename = match filename {
            Some(path) => {
                if !is_readable_file(path) {
                    return Err(LocatorError::InvalidFileLocation(normalize_path(path)));
                }
                Some(normalize_path(path))
            }
            None => None,
        };
        Ok(Self {
            source: source.into(),
            name: name.map(str::to_string),
            filename,
            origin: SourceOrigin::Plain,
        })
    }

    /// Reads `path` and records it as the file name.
    pub fn from_file(path: &Path) -> Result<Self, LocatorError> {
        let source = read_file(path)?;
        Self::new(source, None, Some(path))
    }

    pub fn from_string(source: impl Into<Vec<u8>>) -> Self {
        Self {
            source: source.into(),
            name: None,
            filename: None,
            origin: SourceOrigin::Plain,
        }
    }

    pub fn internal(source: impl Into<Vec<u8>>, name: &str, extension_name: &str) -> Self {
        Self {
            source: source.into(),
            name: Some(name.to_string()),
            filename: None,
            origin: SourceOrigin::Internal {
                extension_name: extension_name.to_string(),
            },
        }
    }

    pub fn evaled(source: impl Into<Vec<u8>>, name: Option<&str>) -> Self {
        Self {
            source: source.into(),
            name: name.map(str::to_string),
            filename: None,
            origin: SourceOrigin::Evaled,
        }
    }

    /// Source of an anonymous class or closure reflected from `filename`.
    /// The file is not required to still exist.
    pub fn anonymous(source: impl Into<Vec<u8>>, filename: Option<&Path>) -> Self {
        Self {
            source: source.into(),
            name: None,
            filename: filename.map(normalize_path),
            origin: SourceOrigin::Anonymous,
        }
    }

    pub fn source(&self) -> &[u8] {
        &self.source
    }

    pub fn source_text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.source)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn origin(&self) -> &SourceOrigin {
        &self.origin
    }

    pub fn is_internal(&self) -> bool {
        matches!(self.origin, SourceOrigin::Internal { .. })
    }

    pub fn is_evaled(&self) -> bool {
        self.origin == SourceOrigin::Evaled
    }

    pub fn extension_name(&self) -> Option<&str> {
        match &self.origin {
            SourceOrigin::Internal { extension_name } => Some(extension_name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_rejected_at_construction() {
        let err = LocatedSource::new("<?php", None, Some(Path::new("/no/such/file.php")))
            .unwrap_err();
        assert!(matches!(err, LocatorError::InvalidFileLocation(path) if path == "/no/such/file.php"));
    }

    #[test]
    fn internal_sources_carry_extension() {
        let source = LocatedSource::internal("<?php class stdClass {}", "stdClass", "Core");
        assert!(source.is_internal());
        assert!(!source.is_evaled());
        assert_eq!(source.extension_name(), Some("Core"));
        assert_eq!(source.file_name(), None);
    }
}
