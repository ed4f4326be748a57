use super::ast::AstLocator;
use super::declaration::LocatedDeclaration;
use super::error::LocatorError;
use super::located_source::LocatedSource;
use super::SourceLocator;
use crate::identifier::{Identifier, IdentifierKind, normalize_name};
use indexmap::{IndexMap, IndexSet};
use std::path::PathBuf;
use std::rc::Rc;

/// Explicit class name to file mapping. Only classes are served.
pub struct ClassMapSourceLocator {
    entries: IndexMap<String, PathBuf>,
    ast_locator: AstLocator,
}

impl ClassMapSourceLocator {
    pub fn new(
        entries: impl IntoIterator<Item = (String, PathBuf)>,
        ast_locator: AstLocator,
    ) -> Self {
        let entries = entries
            .into_iter()
            .map(|(name, path)| (normalize_name(IdentifierKind::Class, &name), path))
            .collect();
        Self {
            entries,
            ast_locator,
        }
    }
}

impl SourceLocator for ClassMapSourceLocator {
    fn locate(&self, identifier: &Identifier) -> Result<Option<LocatedDeclaration>, LocatorError> {
        if !identifier.is_class() {
            return Ok(None);
        }
        let Some(path) = self
            .entries
            .get(&normalize_name(IdentifierKind::Class, identifier.name()))
        else {
            return Ok(None);
        };
        let source = Rc::new(LocatedSource::from_file(path)?);
        self.ast_locator.find_declaration(source, identifier)
    }

    fn locate_all_of_kind(
        &self,
        kind: IdentifierKind,
    ) -> Result<Vec<LocatedDeclaration>, LocatorError> {
        if kind != IdentifierKind::Class {
            return Ok(Vec::new());
        }
        let files: IndexSet<&PathBuf> = self.entries.values().collect();
        let mut all = Vec::new();
        for path in files {
            let source = Rc::new(LocatedSource::from_file(path)?);
            all.extend(self.ast_locator.find_declarations_of_kind(source, kind)?);
        }
        Ok(all)
    }
}
