//! Closures and arrow functions have no name to look up, so they are found
//! by the line they start on.

use super::ast::AstLocator;
use super::declaration::LocatedDeclaration;
use super::error::LocatorError;
use super::file_helper::read_file;
use super::located_source::LocatedSource;
use super::SourceLocator;
use crate::identifier::{Identifier, IdentifierKind};
use std::path::Path;
use std::rc::Rc;

/// Serves the one closure starting on a given line. Answers only the
/// closure name and the function wildcard.
pub struct ClosureSourceLocator {
    source: Rc<LocatedSource>,
    line: usize,
    ast_locator: AstLocator,
}

impl ClosureSourceLocator {
    pub fn in_file(path: &Path, line: usize, ast_locator: AstLocator) -> Result<Self, LocatorError> {
        let source = read_file(path)?;
        Ok(Self {
            source: Rc::new(LocatedSource::anonymous(source, Some(path))),
            line,
            ast_locator,
        })
    }

    pub fn in_string(
        source: impl Into<Vec<u8>>,
        line: usize,
        ast_locator: AstLocator,
    ) -> Result<Self, LocatorError> {
        let source = source.into();
        if source.is_empty() {
            return Err(LocatorError::EmptySourceCode);
        }
        Ok(Self {
            source: Rc::new(LocatedSource::anonymous(source, None)),
            line,
            ast_locator,
        })
    }

    pub fn line(&self) -> usize {
        self.line
    }
}

impl SourceLocator for ClosureSourceLocator {
    fn locate(&self, identifier: &Identifier) -> Result<Option<LocatedDeclaration>, LocatorError> {
        if !identifier.is_function() || !(identifier.is_closure() || identifier.is_wildcard()) {
            return Ok(None);
        }
        self.ast_locator.find_closure(self.source.clone(), self.line)
    }

    fn locate_all_of_kind(
        &self,
        kind: IdentifierKind,
    ) -> Result<Vec<LocatedDeclaration>, LocatorError> {
        if kind != IdentifierKind::Function {
            return Ok(Vec::new());
        }
        Ok(self
            .locate(&Identifier::wildcard(kind))?
            .into_iter()
            .collect())
    }
}
