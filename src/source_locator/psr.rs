//! PSR-0 and PSR-4 autoloading conventions.
//!
//! A miss in a candidate file is not an error: autoloaders are allowed to
//! come up empty, so the locator quietly moves on to the next candidate.

use super::ast::AstLocator;
use super::declaration::LocatedDeclaration;
use super::directories::DirectoriesSourceLocator;
use super::error::{ComposerError, LocatorError};
use super::file_helper::{is_readable_file, normalize_separators};
use super::located_source::LocatedSource;
use super::SourceLocator;
use crate::identifier::{Identifier, IdentifierKind};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Turns a class name into the files that could declare it.
pub trait PsrAutoloaderMapping {
    /// Candidate files in mapping declaration order. They need not exist.
    fn resolve_possible_file_paths(&self, identifier: &Identifier) -> Vec<PathBuf>;

    /// Every directory the mapping points at.
    fn directories(&self) -> Vec<PathBuf>;
}

type PrefixMap = Vec<(String, Vec<PathBuf>)>;

fn build_prefix_map(
    mappings: impl IntoIterator<Item = (String, Vec<PathBuf>)>,
    normalize_prefix: fn(&str) -> String,
) -> Result<PrefixMap, ComposerError> {
    let mut map: PrefixMap = Vec::new();
    for (prefix, paths) in mappings {
        if paths.is_empty() {
            return Err(ComposerError::InvalidAutoloadMapping {
                prefix,
                path: String::new(),
            });
        }
        let prefix = normalize_prefix(&prefix);
        let paths = paths.into_iter().map(|path| trim_trailing_separator(&path)).collect();
        map.push((prefix, paths));
    }
    Ok(map)
}

fn trim_trailing_separator(path: &Path) -> PathBuf {
    let text = normalize_separators(&path.to_string_lossy());
    match text.trim_end_matches('/') {
        "" => PathBuf::from("/"),
        trimmed => PathBuf::from(trimmed),
    }
}

fn all_directories(map: &PrefixMap) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();
    for (_, paths) in map {
        for path in paths {
            if !dirs.contains(path) {
                dirs.push(path.clone());
            }
        }
    }
    dirs
}

/// `App\` => `src/` turns `App\Http\Kernel` into `src/Http/Kernel.php`.
#[derive(Debug, Clone)]
pub struct Psr4Mapping {
    prefixes: PrefixMap,
}

impl Psr4Mapping {
    pub fn new(
        mappings: impl IntoIterator<Item = (String, Vec<PathBuf>)>,
    ) -> Result<Self, ComposerError> {
        let prefixes = build_prefix_map(mappings, |prefix| {
            let trimmed = prefix.trim_matches('\\');
            if trimmed.is_empty() {
                String::new()
            } else {
                format!("{trimmed}\\")
            }
        })?;
        Ok(Self { prefixes })
    }
}

impl PsrAutoloaderMapping for Psr4Mapping {
    fn resolve_possible_file_paths(&self, identifier: &Identifier) -> Vec<PathBuf> {
        if !identifier.is_class() || identifier.is_wildcard() {
            return Vec::new();
        }
        let name = identifier.name();
        let mut candidates = Vec::new();
        for (prefix, paths) in &self.prefixes {
            let Some(rest) = name.strip_prefix(prefix.as_str()) else {
                continue;
            };
            let relative = format!("{}.php", rest.replace('\\', "/"));
            candidates.extend(paths.iter().map(|dir| dir.join(&relative)));
        }
        candidates
    }

    fn directories(&self) -> Vec<PathBuf> {
        all_directories(&self.prefixes)
    }
}

/// Legacy mapping: the prefix stays part of the path and `_` in the class
/// part becomes a directory separator, so `Twig_Loader_Array` under `lib/`
/// is `lib/Twig/Loader/Array.php`.
#[derive(Debug, Clone)]
pub struct Psr0Mapping {
    prefixes: PrefixMap,
}

impl Psr0Mapping {
    pub fn new(
        mappings: impl IntoIterator<Item = (String, Vec<PathBuf>)>,
    ) -> Result<Self, ComposerError> {
        let prefixes = build_prefix_map(mappings, |prefix| {
            prefix.trim_start_matches('\\').to_string()
        })?;
        Ok(Self { prefixes })
    }

    fn relative_path(name: &str) -> String {
        let (namespace, class) = match name.rfind('\\') {
            Some(pos) => (&name[..=pos], &name[pos + 1..]),
            None => ("", name),
        };
        format!(
            "{}{}.php",
            namespace.replace('\\', "/"),
            class.replace('_', "/")
        )
    }
}

impl PsrAutoloaderMapping for Psr0Mapping {
    fn resolve_possible_file_paths(&self, identifier: &Identifier) -> Vec<PathBuf> {
        if !identifier.is_class() || identifier.is_wildcard() {
            return Vec::new();
        }
        let name = identifier.name();
        let relative = Self::relative_path(name);
        let mut candidates = Vec::new();
        for (prefix, paths) in &self.prefixes {
            if !name.starts_with(prefix.as_str()) {
                continue;
            }
            candidates.extend(paths.iter().map(|dir| dir.join(&relative)));
        }
        candidates
    }

    fn directories(&self) -> Vec<PathBuf> {
        all_directories(&self.prefixes)
    }
}

pub struct PsrAutoloaderLocator {
    mapping: Box<dyn PsrAutoloaderMapping>,
    ast_locator: AstLocator,
}

impl PsrAutoloaderLocator {
    pub fn new(mapping: Box<dyn PsrAutoloaderMapping>, ast_locator: AstLocator) -> Self {
        Self {
            mapping,
            ast_locator,
        }
    }
}

impl SourceLocator for PsrAutoloaderLocator {
    fn locate(&self, identifier: &Identifier) -> Result<Option<LocatedDeclaration>, LocatorError> {
        for candidate in self.mapping.resolve_possible_file_paths(identifier) {
            if !is_readable_file(&candidate) {
                continue;
            }
            let source = Rc::new(LocatedSource::from_file(&candidate)?);
            match self.ast_locator.find_declaration(source, identifier)? {
                Some(found) => return Ok(Some(found)),
                None => tracing::debug!(
                    file = %candidate.display(),
                    identifier = %identifier,
                    "candidate file does not declare the class"
                ),
            }
        }
        Ok(None)
    }

    fn locate_all_of_kind(
        &self,
        kind: IdentifierKind,
    ) -> Result<Vec<LocatedDeclaration>, LocatorError> {
        let existing: Vec<PathBuf> = self
            .mapping
            .directories()
            .into_iter()
            .filter(|dir| dir.is_dir())
            .collect();
        DirectoriesSourceLocator::new(existing, self.ast_locator.clone())?.locate_all_of_kind(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(name: &str) -> Identifier {
        Identifier::class(name).unwrap()
    }

    #[test]
    fn psr4_substitutes_prefix() {
        let mapping = Psr4Mapping::new([
            ("App\\".to_string(), vec![PathBuf::from("/p/src/")]),
            ("App\\Tests".to_string(), vec![PathBuf::from("/p/tests")]),
        ])
        .unwrap();
        assert_eq!(
            mapping.resolve_possible_file_paths(&class("App\\Http\\Kernel")),
            vec![PathBuf::from("/p/src/Http/Kernel.php")]
        );
        assert_eq!(
            mapping.resolve_possible_file_paths(&class("App\\Tests\\FooTest")),
            vec![
                PathBuf::from("/p/src/Tests/FooTest.php"),
                PathBuf::from("/p/tests/FooTest.php"),
            ]
        );
        assert!(
            mapping
                .resolve_possible_file_paths(&class("Other\\Thing"))
                .is_empty()
        );
        assert!(
            mapping
                .resolve_possible_file_paths(&Identifier::function("App\\f").unwrap())
                .is_empty()
        );
    }

    #[test]
    fn psr0_turns_underscores_in_class_part_into_directories() {
        let mapping = Psr0Mapping::new([
            ("Twig_".to_string(), vec![PathBuf::from("/lib")]),
            ("Acme\\".to_string(), vec![PathBuf::from("/src")]),
        ])
        .unwrap();
        assert_eq!(
            mapping.resolve_possible_file_paths(&class("Twig_Loader_Array")),
            vec![PathBuf::from("/lib/Twig/Loader/Array.php")]
        );
        assert_eq!(
            mapping.resolve_possible_file_paths(&class("Acme\\Some_Name\\Log_Writer")),
            vec![PathBuf::from("/src/Acme/Some_Name/Log/Writer.php")]
        );
    }

    #[test]
    fn empty_path_list_is_invalid() {
        let err = Psr4Mapping::new([("App\\".to_string(), vec![])]).unwrap_err();
        assert!(matches!(err, ComposerError::InvalidAutoloadMapping { .. }));
    }
}
