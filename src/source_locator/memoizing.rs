use super::declaration::LocatedDeclaration;
use super::error::LocatorError;
use super::SourceLocator;
use crate::identifier::{Identifier, IdentifierKind};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Remembers every `locate` outcome, misses included, for the lifetime of
/// the wrapper. Errors are not remembered. Enumeration always delegates.
pub struct MemoizingSourceLocator {
    inner: Rc<dyn SourceLocator>,
    cache: RefCell<HashMap<(IdentifierKind, String), Option<LocatedDeclaration>>>,
}

impl MemoizingSourceLocator {
    pub fn new(inner: Rc<dyn SourceLocator>) -> Self {
        Self {
            inner,
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn cached_lookups(&self) -> usize {
        self.cache.borrow().len()
    }
}

impl SourceLocator for MemoizingSourceLocator {
    fn locate(&self, identifier: &Identifier) -> Result<Option<LocatedDeclaration>, LocatorError> {
        let key = identifier.cache_key();
        if let Some(cached) = self.cache.borrow().get(&key) {
            return Ok(cached.clone());
        }

        let found = self.inner.locate(identifier)?;
        self.cache.borrow_mut().insert(key, found.clone());
        Ok(found)
    }

    fn locate_all_of_kind(
        &self,
        kind: IdentifierKind,
    ) -> Result<Vec<LocatedDeclaration>, LocatorError> {
        self.inner.locate_all_of_kind(kind)
    }
}
