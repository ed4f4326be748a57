//! Locators derived from a project's `composer.json`.

use super::aggregate::AggregateSourceLocator;
use super::ast::AstLocator;
use super::declaration::LocatedDeclaration;
use super::directories::DirectoriesSourceLocator;
use super::error::{ComposerError, LocatorError};
use super::file_helper::{normalize_path, read_file};
use super::file_iterator::FileIteratorSourceLocator;
use super::psr::{Psr0Mapping, Psr4Mapping, PsrAutoloaderLocator};
use super::SourceLocator;
use crate::identifier::{Identifier, IdentifierKind};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Debug, Default, Deserialize)]
struct Manifest {
    #[serde(default)]
    autoload: Autoload,
    #[serde(rename = "autoload-dev", default)]
    autoload_dev: Autoload,
}

#[derive(Debug, Default, Deserialize)]
struct Autoload {
    #[serde(rename = "psr-4", default)]
    psr4: IndexMap<String, PathList>,
    #[serde(rename = "psr-0", default)]
    psr0: IndexMap<String, PathList>,
    #[serde(default)]
    classmap: Vec<String>,
    #[serde(default)]
    files: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PathList {
    One(String),
    Many(Vec<String>),
}

impl PathList {
    fn resolve(&self, project: &Path) -> Vec<PathBuf> {
        let paths: Vec<&String> = match self {
            PathList::One(path) => vec![path],
            PathList::Many(paths) => paths.iter().collect(),
        };
        paths.into_iter().map(|path| project.join(path)).collect()
    }
}

/// Everything a project's `autoload` and `autoload-dev` sections declare,
/// searched in the order PSR-4, PSR-0, class map, files.
pub struct ComposerSourceLocator {
    project_directory: PathBuf,
    inner: AggregateSourceLocator,
}

impl ComposerSourceLocator {
    pub fn from_project(
        project_directory: impl Into<PathBuf>,
        ast_locator: AstLocator,
    ) -> Result<Self, LocatorError> {
        let project_directory = project_directory.into();
        if !project_directory.is_dir() {
            return Err(ComposerError::InvalidProjectDirectory(normalize_path(
                &project_directory,
            ))
            .into());
        }

        let manifest_path = project_directory.join("composer.json");
        if !manifest_path.is_file() {
            return Err(
                ComposerError::MissingComposerJson(normalize_path(&project_directory)).into(),
            );
        }
        let bytes = read_file(&manifest_path)?;
        let manifest: Manifest =
            serde_json::from_slice(&bytes).map_err(|err| ComposerError::FailedToParseJson {
                path: normalize_path(&manifest_path),
                message: err.to_string(),
            })?;

        let inner = build(&project_directory, manifest, &ast_locator)?;
        tracing::debug!(
            project = %project_directory.display(),
            locators = inner.len(),
            "composer autoload configuration loaded"
        );
        Ok(Self {
            project_directory,
            inner,
        })
    }

    pub fn project_directory(&self) -> &Path {
        &self.project_directory
    }
}

fn build(
    project: &Path,
    manifest: Manifest,
    ast_locator: &AstLocator,
) -> Result<AggregateSourceLocator, LocatorError> {
    let sections = [manifest.autoload, manifest.autoload_dev];

    let psr4: Vec<(String, Vec<PathBuf>)> = sections
        .iter()
        .flat_map(|section| section.psr4.iter())
        .map(|(prefix, paths)| (prefix.clone(), paths.resolve(project)))
        .collect();
    let psr0: Vec<(String, Vec<PathBuf>)> = sections
        .iter()
        .flat_map(|section| section.psr0.iter())
        .map(|(prefix, paths)| (prefix.clone(), paths.resolve(project)))
        .collect();

    let mut class_map_dirs = Vec::new();
    let mut loose_files = Vec::new();
    for path in sections.iter().flat_map(|section| section.classmap.iter()) {
        let path = project.join(path);
        if path.is_dir() {
            class_map_dirs.push(path);
        } else if path.is_file() {
            loose_files.push(path);
        } else {
            tracing::warn!(path = %path.display(), "classmap entry does not exist");
        }
    }
    for path in sections.iter().flat_map(|section| section.files.iter()) {
        let path = project.join(path);
        if path.is_file() {
            loose_files.push(path);
        } else {
            tracing::warn!(path = %path.display(), "autoload file does not exist");
        }
    }

    let mut aggregate = AggregateSourceLocator::default();
    if !psr4.is_empty() {
        aggregate.push(Rc::new(PsrAutoloaderLocator::new(
            Box::new(Psr4Mapping::new(psr4)?),
            ast_locator.clone(),
        )));
    }
    if !psr0.is_empty() {
        aggregate.push(Rc::new(PsrAutoloaderLocator::new(
            Box::new(Psr0Mapping::new(psr0)?),
            ast_locator.clone(),
        )));
    }
    if !class_map_dirs.is_empty() {
        aggregate.push(Rc::new(DirectoriesSourceLocator::new(
            class_map_dirs,
            ast_locator.clone(),
        )?));
    }
    if !loose_files.is_empty() {
        aggregate.push(Rc::new(FileIteratorSourceLocator::new(
            loose_files,
            ast_locator.clone(),
        )));
    }
    Ok(aggregate)
}

impl SourceLocator for ComposerSourceLocator {
    fn locate(&self, identifier: &Identifier) -> Result<Option<LocatedDeclaration>, LocatorError> {
        self.inner.locate(identifier)
    }

    fn locate_all_of_kind(
        &self,
        kind: IdentifierKind,
    ) -> Result<Vec<LocatedDeclaration>, LocatorError> {
        self.inner.locate_all_of_kind(kind)
    }
}
