use super::ast::AstLocator;
use super::declaration::LocatedDeclaration;
use super::error::LocatorError;
use super::located_source::LocatedSource;
use super::SourceLocator;
use crate::identifier::{Identifier, IdentifierKind};
use std::path::PathBuf;
use std::rc::Rc;

/// An ordered list of files, searched front to back.
pub struct FileIteratorSourceLocator {
    files: Vec<PathBuf>,
    ast_locator: AstLocator,
}

impl FileIteratorSourceLocator {
    pub fn new(files: impl IntoIterator<Item = PathBuf>, ast_locator: AstLocator) -> Self {
        Self {
            files: files.into_iter().collect(),
            ast_locator,
        }
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

impl SourceLocator for FileIteratorSourceLocator {
    fn locate(&self, identifier: &Identifier) -> Result<Option<LocatedDeclaration>, LocatorError> {
        for file in &self.files {
            let source = Rc::new(LocatedSource::from_file(file)?);
            if let Some(found) = self.ast_locator.find_declaration(source, identifier)? {
                tracing::debug!(file = %file.display(), identifier = %identifier, "located");
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    fn locate_all_of_kind(
        &self,
        kind: IdentifierKind,
    ) -> Result<Vec<LocatedDeclaration>, LocatorError> {
        let mut all = Vec::new();
        for file in &self.files {
            let source = Rc::new(LocatedSource::from_file(file)?);
            all.extend(self.ast_locator.find_declarations_of_kind(source, kind)?);
        }
        Ok(all)
    }
}
