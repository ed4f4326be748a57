use super::ast::AstLocator;
use super::declaration::LocatedDeclaration;
use super::error::LocatorError;
use super::located_source::LocatedSource;
use super::SourceLocator;
use crate::identifier::{Identifier, IdentifierKind};
use std::cell::RefCell;
use std::rc::Rc;

/// Code the host evaluated at run time, registered as it is evaluated.
#[derive(Debug, Default)]
pub struct EvaledCodeRegistry {
    sources: RefCell<Vec<Rc<LocatedSource>>>,
}

impl EvaledCodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records evaluated code. `label` names it in diagnostics.
    pub fn register(&self, code: impl Into<Vec<u8>>, label: Option<&str>) {
        let mut code = code.into();
        if !code.starts_with(b"<?") {
            code.splice(0..0, b"<?php ".iter().copied());
        }
        self.sources
            .borrow_mut()
            .push(Rc::new(LocatedSource::evaled(code, label)));
    }

    pub fn len(&self) -> usize {
        self.sources.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.borrow().is_empty()
    }

    fn snapshot(&self) -> Vec<Rc<LocatedSource>> {
        self.sources.borrow().clone()
    }
}

/// Serves symbols declared by evaluated code, oldest registration first.
pub struct EvaledCodeSourceLocator {
    registry: Rc<EvaledCodeRegistry>,
    ast_locator: AstLocator,
}

impl EvaledCodeSourceLocator {
    pub fn new(registry: Rc<EvaledCodeRegistry>, ast_locator: AstLocator) -> Self {
        Self {
            registry,
            ast_locator,
        }
    }
}

impl SourceLocator for EvaledCodeSourceLocator {
    fn locate(&self, identifier: &Identifier) -> Result<Option<LocatedDeclaration>, LocatorError> {
        for source in self.registry.snapshot() {
            if let Some(found) = self.ast_locator.find_declaration(source, identifier)? {
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
        for source in self.registry.snapshot() {
            all.extend(self.ast_locator.find_declarations_of_kind(source, kind)?);
        }
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::cache::NativeParser;

    #[test]
    fn evaluated_declarations_are_marked_evaled() {
        let registry = Rc::new(EvaledCodeRegistry::new());
        registry.register("class Runtime { const X = 1; }", Some("eval()'d code"));
        let locator =
            EvaledCodeSourceLocator::new(registry.clone(), AstLocator::new(Rc::new(NativeParser)));

        let found = locator
            .locate(&Identifier::class("runtime").unwrap())
            .unwrap()
            .unwrap();
        assert!(found.source.is_evaled());
        assert_eq!(found.name(), "Runtime");
        assert!(
            locator
                .locate(&Identifier::class("Missing").unwrap())
                .unwrap()
                .is_none()
        );
    }
}
