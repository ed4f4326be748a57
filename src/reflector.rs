//! Entry point for reflecting symbols by name.

use crate::compiler::error::CompileError;
use crate::identifier::{CLOSURE_NAME, Identifier, IdentifierKind, InvalidIdentifierName};
use crate::reflection::{ReflectionClass, ReflectionConstant, ReflectionFunction};
use crate::runtime::constants::DefinedConstants;
use crate::runtime::object_factory::ObjectFactory;
use crate::source_locator::{LocatedDeclaration, LocatorError, SourceLocator};
use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReflectionError {
    #[error("{kind} \"{name}\" could not be found in the located source")]
    IdentifierNotFound { kind: IdentifierKind, name: String },

    #[error(transparent)]
    InvalidIdentifierName(#[from] InvalidIdentifierName),

    #[error(transparent)]
    Locator(#[from] LocatorError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("Invalid arrow function body node (first 50 characters: {0})")]
    InvalidArrowFunctionBodyNode(String),
}

impl ReflectionError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ReflectionError::IdentifierNotFound { .. })
    }
}

struct ReflectorInner {
    locator: Rc<dyn SourceLocator>,
    constants: Rc<dyn DefinedConstants>,
    objects: Rc<dyn ObjectFactory>,
    /// `(lookup key, display name)` of every constant being resolved.
    resolving: RefCell<Vec<(String, String)>>,
}

/// Cheap to clone; every reflection object holds one.
#[derive(Clone)]
pub struct Reflector {
    inner: Rc<ReflectorInner>,
}

impl std::fmt::Debug for Reflector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reflector")
            .field("resolving", &self.inner.resolving.borrow())
            .finish_non_exhaustive()
    }
}

impl Reflector {
    pub fn new(
        locator: Rc<dyn SourceLocator>,
        constants: Rc<dyn DefinedConstants>,
        objects: Rc<dyn ObjectFactory>,
    ) -> Self {
        Self {
            inner: Rc::new(ReflectorInner {
                locator,
                constants,
                objects,
                resolving: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn locator(&self) -> &Rc<dyn SourceLocator> {
        &self.inner.locator
    }

    pub fn defined_constants(&self) -> &dyn DefinedConstants {
        self.inner.constants.as_ref()
    }

    pub fn object_factory(&self) -> &dyn ObjectFactory {
        self.inner.objects.as_ref()
    }

    pub fn reflect_class(&self, name: &str) -> Result<ReflectionClass, ReflectionError> {
        let located = self.locate(Identifier::class(name)?)?;
        ReflectionClass::from_located(self.clone(), located)
    }

    pub fn reflect_function(&self, name: &str) -> Result<ReflectionFunction, ReflectionError> {
        let located = self.locate(Identifier::function(name)?)?;
        ReflectionFunction::from_located(self.clone(), located)
    }

    /// The closure served by the locator, see
    /// [`ClosureSourceLocator`](crate::source_locator::closure::ClosureSourceLocator).
    pub fn reflect_closure(&self) -> Result<ReflectionFunction, ReflectionError> {
        self.reflect_function(CLOSURE_NAME)
    }

    pub fn reflect_constant(&self, name: &str) -> Result<ReflectionConstant, ReflectionError> {
        let located = self.locate(Identifier::constant(name)?)?;
        ReflectionConstant::from_located(self.clone(), located)
    }

    pub fn reflect_all_classes(&self) -> Result<Vec<ReflectionClass>, ReflectionError> {
        self.locate_all(IdentifierKind::Class)?
            .into_iter()
            .map(|located| ReflectionClass::from_located(self.clone(), located))
            .collect()
    }

    pub fn reflect_all_functions(&self) -> Result<Vec<ReflectionFunction>, ReflectionError> {
        self.locate_all(IdentifierKind::Function)?
            .into_iter()
            .map(|located| ReflectionFunction::from_located(self.clone(), located))
            .collect()
    }

    pub fn reflect_all_constants(&self) -> Result<Vec<ReflectionConstant>, ReflectionError> {
        self.locate_all(IdentifierKind::Constant)?
            .into_iter()
            .map(|located| ReflectionConstant::from_located(self.clone(), located))
            .collect()
    }

    fn locate(&self, identifier: Identifier) -> Result<LocatedDeclaration, ReflectionError> {
        match self.inner.locator.locate(&identifier)? {
            Some(located) => {
                tracing::debug!(identifier = %identifier, "reflected");
                Ok(located)
            }
            None => Err(ReflectionError::IdentifierNotFound {
                kind: identifier.kind(),
                name: identifier.name().to_string(),
            }),
        }
    }

    fn locate_all(&self, kind: IdentifierKind) -> Result<Vec<LocatedDeclaration>, ReflectionError> {
        let all = self.inner.locator.locate_all_of_kind(kind)?;
        Ok(all
            .into_iter()
            .filter(|located| located.kind() == kind)
            .collect())
    }

    /// Marks `key` as being resolved until the guard drops. Entering a key
    /// that is already being resolved is a cycle, reported with the
    /// display names of its members.
    pub(crate) fn enter_resolution(
        &self,
        key: String,
        display: String,
    ) -> Result<ResolutionGuard, CompileError> {
        let mut resolving = self.inner.resolving.borrow_mut();
        if let Some(start) = resolving.iter().position(|(entry, _)| entry == &key) {
            let mut chain: Vec<String> = resolving[start..]
                .iter()
                .map(|(_, name)| name.clone())
                .collect();
            chain.push(display);
            return Err(CompileError::CyclicConstantReference { chain });
        }
        resolving.push((key, display));
        Ok(ResolutionGuard {
            reflector: self.clone(),
        })
    }
}

pub(crate) struct ResolutionGuard {
    reflector: Reflector,
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        self.reflector.inner.resolving.borrow_mut().pop();
    }
}
