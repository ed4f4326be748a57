use super::ast::AstLocator;
use super::declaration::LocatedDeclaration;
use super::error::LocatorError;
use super::file_helper::{is_readable_file, normalize_path};
use super::located_source::LocatedSource;
use super::SourceLocator;
use crate::identifier::{Identifier, IdentifierKind};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// One file on disk. The file is read again on every call so that edits
/// made between lookups are observed.
pub struct SingleFileSourceLocator {
    path: PathBuf,
    ast_locator: AstLocator,
}

impl SingleFileSourceLocator {
    pub fn new(path: impl Into<PathBuf>, ast_locator: AstLocator) -> Result<Self, LocatorError> {
        let path = path.into();
        if !is_readable_file(&path) {
            return Err(LocatorError::InvalidFileLocation(normalize_path(&path)));
        }
        Ok(Self { path, ast_locator })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn located_source(&self) -> Result<Rc<LocatedSource>, LocatorError> {
        Ok(Rc::new(LocatedSource::from_file(&self.path)?))
    }
}

impl SourceLocator for SingleFileSourceLocator {
    fn locate(&self, identifier: &Identifier) -> Result<Option<LocatedDeclaration>, LocatorError> {
        self.ast_locator
            .find_declaration(self.located_source()?, identifier)
    }

    fn locate_all_of_kind(
        &self,
        kind: IdentifierKind,
    ) -> Result<Vec<LocatedDeclaration>, LocatorError> {
        self.ast_locator
            .find_declarations_of_kind(self.located_source()?, kind)
    }
}
