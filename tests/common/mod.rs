//! Shared fixtures for the reflection tests
//!
//! Builds reflectors over in-memory sources or temporary project trees,
//! and wraps locators and parsers to count how often they are asked.

#![allow(dead_code)]

use php_reflect::Configuration;
use php_reflect::core::value::Value;
use php_reflect::identifier::{Identifier, IdentifierKind};
use php_reflect::parser::ast::Program;
use php_reflect::parser::cache::{NativeParser, ParseFailure, PhpParser};
use php_reflect::reflector::Reflector;
use php_reflect::source_locator::{LocatedDeclaration, LocatorError, SourceLocator};
use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::TempDir;

/// Reflector over one PHP source string plus the built-in stubs.
pub fn reflector_for(code: &str) -> Reflector {
    let config = Configuration::default();
    let source = config
        .string_source(code)
        .expect("source string is not empty");
    config.reflector_for(vec![source])
}

/// Reflector over one PHP source string without any stubs.
pub fn bare_reflector_for(code: &str) -> Reflector {
    let config = Configuration::default();
    let source = config
        .string_source(code)
        .expect("source string is not empty");
    config.reflector(source)
}

/// Value of the constant `name` declared in `code`.
pub fn constant_value(code: &str, name: &str) -> Value {
    let reflector = reflector_for(code);
    let constant = reflector
        .reflect_constant(name)
        .unwrap_or_else(|err| panic!("constant {name}: {err}"));
    constant
        .value()
        .unwrap_or_else(|err| panic!("value of {name}: {err}"))
}

/// Writes `files` (relative path, contents) below a fresh temporary
/// directory.
pub fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().expect("create temp dir");
    for (relative, contents) in files {
        write_file(dir.path(), relative, contents);
    }
    dir
}

pub fn write_file(root: &Path, relative: &str, contents: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create fixture directories");
    }
    fs::write(&path, contents).expect("write fixture file");
    path
}

/// Forward slashes, the way reflection reports file names.
pub fn normalized(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Locator that records how often it is asked.
pub struct CountingLocator {
    inner: Rc<dyn SourceLocator>,
    pub locate_calls: Cell<usize>,
}

impl CountingLocator {
    pub fn new(inner: Rc<dyn SourceLocator>) -> Self {
        Self {
            inner,
            locate_calls: Cell::new(0),
        }
    }
}

impl SourceLocator for CountingLocator {
    fn locate(&self, identifier: &Identifier) -> Result<Option<LocatedDeclaration>, LocatorError> {
        self.locate_calls.set(self.locate_calls.get() + 1);
        self.inner.locate(identifier)
    }

    fn locate_all_of_kind(
        &self,
        kind: IdentifierKind,
    ) -> Result<Vec<LocatedDeclaration>, LocatorError> {
        self.inner.locate_all_of_kind(kind)
    }
}

/// Parser that records how often it actually parses.
#[derive(Default)]
pub struct CountingParser {
    pub calls: Cell<usize>,
}

impl PhpParser for CountingParser {
    fn parse(&self, source: &[u8]) -> Result<Rc<Program>, ParseFailure> {
        self.calls.set(self.calls.get() + 1);
        NativeParser.parse(source)
    }
}

pub fn string(value: &str) -> Value {
    Value::from(value)
}
