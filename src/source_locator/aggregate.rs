use super::declaration::LocatedDeclaration;
use super::error::LocatorError;
use super::SourceLocator;
use crate::identifier::{Identifier, IdentifierKind};
use std::rc::Rc;

/// Ordered children. The first child that finds an identifier answers;
/// enumeration concatenates every child without removing duplicates.
#[derive(Clone, Default)]
pub struct AggregateSourceLocator {
    locators: Vec<Rc<dyn SourceLocator>>,
}

impl AggregateSourceLocator {
    pub fn new(locators: Vec<Rc<dyn SourceLocator>>) -> Self {
        Self { locators }
    }

    pub fn push(&mut self, locator: Rc<dyn SourceLocator>) {
        self.locators.push(locator);
    }

    pub fn len(&self) -> usize {
        self.locators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locators.is_empty()
    }
}

impl SourceLocator for AggregateSourceLocator {
    fn locate(&self, identifier: &Identifier) -> Result<Option<LocatedDeclaration>, LocatorError> {
        for locator in &self.locators {
            if let Some(found) = locator.locate(identifier)? {
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
        for locator in &self.locators {
            all.extend(locator.locate_all_of_kind(kind)?);
        }
        Ok(all)
    }
}
