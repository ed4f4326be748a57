use super::ast::AstLocator;
use super::declaration::LocatedDeclaration;
use super::error::LocatorError;
use super::located_source::LocatedSource;
use super::SourceLocator;
use crate::identifier::{Identifier, IdentifierKind};
use crate::stubber::{SourceStubber, StubData};
use std::rc::Rc;

/// Built-in symbols, served from stubs instead of project files.
pub struct InternalSourceLocator {
    stubber: Rc<dyn SourceStubber>,
    ast_locator: AstLocator,
}

impl InternalSourceLocator {
    pub fn new(stubber: Rc<dyn SourceStubber>, ast_locator: AstLocator) -> Self {
        Self {
            stubber,
            ast_locator,
        }
    }

    fn stub_for(&self, identifier: &Identifier) -> Option<StubData> {
        let name = identifier.name();
        match identifier.kind() {
            IdentifierKind::Class => self.stubber.generate_class_stub(name),
            IdentifierKind::Function => self.stubber.generate_function_stub(name),
            IdentifierKind::Constant => self.stubber.generate_constant_stub(name),
        }
    }
}

impl SourceLocator for InternalSourceLocator {
    fn locate(&self, identifier: &Identifier) -> Result<Option<LocatedDeclaration>, LocatorError> {
        if identifier.is_wildcard() {
            return Ok(None);
        }
        let Some(stub) = self.stub_for(identifier) else {
            return Ok(None);
        };
        let source = Rc::new(LocatedSource::internal(
            stub.stub,
            identifier.name(),
            &stub.extension_name,
        ));
        self.ast_locator.find_declaration(source, identifier)
    }

    fn locate_all_of_kind(
        &self,
        kind: IdentifierKind,
    ) -> Result<Vec<LocatedDeclaration>, LocatorError> {
        let mut all = Vec::new();
        for name in self.stubber.names_of_kind(kind) {
            let Ok(identifier) = Identifier::new(&name, kind) else {
                continue;
            };
            if let Some(found) = self.locate(&identifier)? {
                all.push(found);
            }
        }
        Ok(all)
    }
}
