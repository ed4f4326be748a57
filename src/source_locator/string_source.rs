use super::ast::AstLocator;
use super::declaration::LocatedDeclaration;
use super::error::LocatorError;
use super::located_source::LocatedSource;
use super::SourceLocator;
use crate::identifier::{Identifier, IdentifierKind};
use std::rc::Rc;

/// A fixed in-memory source text.
pub struct StringSourceLocator {
    source: Rc<LocatedSource>,
    ast_locator: AstLocator,
}

impl StringSourceLocator {
    pub fn new(source: impl Into<Vec<u8>>, ast_locator: AstLocator) -> Result<Self, LocatorError> {
        let source = source.into();
        if source.is_empty() {
            return Err(LocatorError::EmptySourceCode);
        }
        Ok(Self {
            source: Rc::new(LocatedSource::from_string(source)),
            ast_locator,
        })
    }
}

impl SourceLocator for StringSourceLocator {
    fn locate(&self, identifier: &Identifier) -> Result<Option<LocatedDeclaration>, LocatorError> {
        self.ast_locator
            .find_declaration(self.source.clone(), identifier)
    }

    fn locate_all_of_kind(
        &self,
        kind: IdentifierKind,
    ) -> Result<Vec<LocatedDeclaration>, LocatorError> {
        self.ast_locator
            .find_declarations_of_kind(self.source.clone(), kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::cache::NativeParser;

    #[test]
    fn empty_text_is_rejected() {
        let result = StringSourceLocator::new("", AstLocator::new(Rc::new(NativeParser)));
        assert!(matches!(result, Err(LocatorError::EmptySourceCode)));
    }
}
