use super::ast::AstLocator;
use super::declaration::LocatedDeclaration;
use super::error::LocatorError;
use super::file_helper::{normalize_path, php_files_in};
use super::file_iterator::FileIteratorSourceLocator;
use super::SourceLocator;
use crate::identifier::{Identifier, IdentifierKind};
use std::path::PathBuf;

/// Recursive scan of `.php` files below a list of directories.
///
/// Directories are searched in the order given and files inside each one
/// in lexicographic path order. When a symbol is declared in more than one
/// file the first file in that order wins. The tree is rescanned on every
/// call.
pub struct DirectoriesSourceLocator {
    directories: Vec<PathBuf>,
    ast_locator: AstLocator,
}

impl DirectoriesSourceLocator {
    pub fn new(
        directories: impl IntoIterator<Item = PathBuf>,
        ast_locator: AstLocator,
    ) -> Result<Self, LocatorError> {
        let directories: Vec<PathBuf> = directories.into_iter().collect();
        if let Some(bad) = directories.iter().find(|dir| !dir.is_dir()) {
            return Err(LocatorError::InvalidDirectory(normalize_path(bad)));
        }
        Ok(Self {
            directories,
            ast_locator,
        })
    }

    fn files(&self) -> FileIteratorSourceLocator {
        let files = self
            .directories
            .iter()
            .flat_map(|dir| php_files_in(dir))
            .collect::<Vec<_>>();
        tracing::trace!(files = files.len(), "scanned directories");
        FileIteratorSourceLocator::new(files, self.ast_locator.clone())
    }
}

impl SourceLocator for DirectoriesSourceLocator {
    fn locate(&self, identifier: &Identifier) -> Result<Option<LocatedDeclaration>, LocatorError> {
        self.files().locate(identifier)
    }

    fn locate_all_of_kind(
        &self,
        kind: IdentifierKind,
    ) -> Result<Vec<LocatedDeclaration>, LocatorError> {
        self.files().locate_all_of_kind(kind)
    }
}
