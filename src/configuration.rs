//! Composition root: the one place a default reflection stack is built.
//!
//! # Example
//!
//! ```ignore
//! let config = Configuration::default();
//! let reflector = config.reflector_for(vec![
//!     config.directories(["src".into()])?,
//! ]);
//! let class = reflector.reflect_class("App\\Kernel")?;
//! ```

use crate::parser::cache::{MemoizingParser, PhpParser};
use crate::reflector::Reflector;
use crate::runtime::constants::{ConstantTable, DefinedConstants};
use crate::runtime::object_factory::{NoObjects, ObjectFactory};
use crate::source_locator::aggregate::AggregateSourceLocator;
use crate::source_locator::ast::AstLocator;
use crate::source_locator::class_map::ClassMapSourceLocator;
use crate::source_locator::closure::ClosureSourceLocator;
use crate::source_locator::composer::ComposerSourceLocator;
use crate::source_locator::directories::DirectoriesSourceLocator;
use crate::source_locator::internal::InternalSourceLocator;
use crate::source_locator::memoizing::MemoizingSourceLocator;
use crate::source_locator::psr::{Psr4Mapping, PsrAutoloaderLocator};
use crate::source_locator::single_file::SingleFileSourceLocator;
use crate::source_locator::string_source::StringSourceLocator;
use crate::source_locator::{LocatorError, SourceLocator};
use crate::stubber::{BuiltinStubber, SourceStubber};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Collaborators shared by every locator and reflector built from it.
#[derive(Clone)]
pub struct Configuration {
    parser: Rc<MemoizingParser>,
    stubber: Rc<dyn SourceStubber>,
    constants: Rc<dyn DefinedConstants>,
    objects: Rc<dyn ObjectFactory>,
}

impl Configuration {
    pub fn new(
        parser: Rc<MemoizingParser>,
        stubber: Rc<dyn SourceStubber>,
        constants: Rc<dyn DefinedConstants>,
        objects: Rc<dyn ObjectFactory>,
    ) -> Self {
        Self {
            parser,
            stubber,
            constants,
            objects,
        }
    }

    /// Replace the source stubber
    pub fn with_stubber(mut self, stubber: Rc<dyn SourceStubber>) -> Self {
        self.stubber = stubber;
        self
    }

    /// Replace the table of constants defined by the running process
    pub fn with_constants(mut self, constants: Rc<dyn DefinedConstants>) -> Self {
        self.constants = constants;
        self
    }

    /// Replace the factory used for `new` in constant expressions
    pub fn with_object_factory(mut self, objects: Rc<dyn ObjectFactory>) -> Self {
        self.objects = objects;
        self
    }

    pub fn parser(&self) -> &Rc<MemoizingParser> {
        &self.parser
    }

    pub fn stubber(&self) -> &Rc<dyn SourceStubber> {
        &self.stubber
    }

    pub fn ast_locator(&self) -> AstLocator {
        let parser: Rc<dyn PhpParser> = self.parser.clone();
        AstLocator::new(parser)
    }

    pub fn internal_locator(&self) -> Rc<dyn SourceLocator> {
        Rc::new(InternalSourceLocator::new(
            self.stubber.clone(),
            self.ast_locator(),
        ))
    }

    pub fn single_file(&self, path: impl Into<PathBuf>) -> Result<Rc<dyn SourceLocator>, LocatorError> {
        Ok(Rc::new(SingleFileSourceLocator::new(path, self.ast_locator())?))
    }

    pub fn string_source(&self, source: impl Into<Vec<u8>>) -> Result<Rc<dyn SourceLocator>, LocatorError> {
        Ok(Rc::new(StringSourceLocator::new(source, self.ast_locator())?))
    }

    pub fn directories(
        &self,
        directories: impl IntoIterator<Item = PathBuf>,
    ) -> Result<Rc<dyn SourceLocator>, LocatorError> {
        Ok(Rc::new(DirectoriesSourceLocator::new(
            directories,
            self.ast_locator(),
        )?))
    }

    pub fn composer_project(&self, directory: impl Into<PathBuf>) -> Result<Rc<dyn SourceLocator>, LocatorError> {
        Ok(Rc::new(ComposerSourceLocator::from_project(
            directory,
            self.ast_locator(),
        )?))
    }

    pub fn psr4(
        &self,
        mappings: impl IntoIterator<Item = (String, Vec<PathBuf>)>,
    ) -> Result<Rc<dyn SourceLocator>, LocatorError> {
        let mapping = Psr4Mapping::new(mappings)?;
        Ok(Rc::new(PsrAutoloaderLocator::new(
            Box::new(mapping),
            self.ast_locator(),
        )))
    }

    pub fn class_map(
        &self,
        entries: impl IntoIterator<Item = (String, PathBuf)>,
    ) -> Rc<dyn SourceLocator> {
        Rc::new(ClassMapSourceLocator::new(entries, self.ast_locator()))
    }

    /// The closure or arrow function starting on `line` of a file.
    pub fn closure_in_file(
        &self,
        path: impl AsRef<Path>,
        line: usize,
    ) -> Result<Rc<dyn SourceLocator>, LocatorError> {
        Ok(Rc::new(ClosureSourceLocator::in_file(
            path.as_ref(),
            line,
            self.ast_locator(),
        )?))
    }

    pub fn closure_in_string(
        &self,
        source: impl Into<Vec<u8>>,
        line: usize,
    ) -> Result<Rc<dyn SourceLocator>, LocatorError> {
        Ok(Rc::new(ClosureSourceLocator::in_string(
            source,
            line,
            self.ast_locator(),
        )?))
    }

    /// The given locators in order, then the built-in stubs, all behind a
    /// memoizing layer.
    pub fn default_locator(&self, locators: Vec<Rc<dyn SourceLocator>>) -> Rc<dyn SourceLocator> {
        let mut aggregate = AggregateSourceLocator::new(locators);
        aggregate.push(self.internal_locator());
        tracing::debug!(locators = aggregate.len(), "built default source locator");
        Rc::new(MemoizingSourceLocator::new(Rc::new(aggregate)))
    }

    pub fn reflector(&self, locator: Rc<dyn SourceLocator>) -> Reflector {
        Reflector::new(locator, self.constants.clone(), self.objects.clone())
    }

    /// Reflector over `locators` plus the built-in stubs.
    pub fn reflector_for(&self, locators: Vec<Rc<dyn SourceLocator>>) -> Reflector {
        self.reflector(self.default_locator(locators))
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new(
            Rc::new(MemoizingParser::default()),
            Rc::new(BuiltinStubber::new()),
            Rc::new(ConstantTable::with_core_constants()),
            Rc::new(NoObjects),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value::Value;

    #[test]
    fn default_stack_reflects_source_and_stubs() {
        let config = Configuration::default();
        let source = config
            .string_source("<?php class Failure extends \\RuntimeException { const CODE = E_USER_ERROR; }")
            .unwrap();
        let reflector = config.reflector_for(vec![source]);

        let class = reflector.reflect_class("Failure").unwrap();
        assert!(class.is_subclass_of("Throwable").unwrap());
        assert_eq!(
            class.constant("CODE").unwrap().unwrap().value().unwrap(),
            Value::Int(256)
        );
        assert!(reflector.reflect_class("RuntimeException").unwrap().is_internal());
    }

    #[test]
    fn locators_share_one_parser_cache() {
        let config = Configuration::default();
        let first = config.string_source("<?php function a() {}").unwrap();
        let second = config.string_source("<?php function a() {}").unwrap();
        let reflector = config.reflector(Rc::new(AggregateSourceLocator::new(vec![first, second])));

        reflector.reflect_function("a").unwrap();
        reflector.reflect_all_functions().unwrap();
        assert_eq!(config.parser().cached_trees(), 1);
    }
}
