use super::doc_comment_text;
use crate::compiler::{CompiledValue, ContextSubject, compile_in};
use crate::core::value::Value;
use crate::identifier::IdentifierKind;
use crate::parser::ast::{ExprId, Program};
use crate::reflector::{ReflectionError, Reflector};
use crate::source_locator::{ConstantDeclaration, Declaration, LocatedDeclaration, LocatedSource};
use std::fmt;
use std::rc::Rc;

/// Constant declared with `const` at the top level or with `define()`.
#[derive(Clone)]
pub struct ReflectionConstant {
    reflector: Reflector,
    located: LocatedDeclaration,
    decl: ConstantDeclaration,
}

impl fmt::Debug for ReflectionConstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReflectionConstant({})", self.decl.name)
    }
}

impl ReflectionConstant {
    pub fn from_located(
        reflector: Reflector,
        located: LocatedDeclaration,
    ) -> Result<Self, ReflectionError> {
        let Declaration::Constant(decl) = &located.declaration else {
            return Err(ReflectionError::IdentifierNotFound {
                kind: IdentifierKind::Constant,
                name: located.name(),
            });
        };
        let decl = decl.clone();
        Ok(Self {
            reflector,
            located,
            decl,
        })
    }

    pub fn reflector(&self) -> &Reflector {
        &self.reflector
    }

    pub fn declaration(&self) -> &ConstantDeclaration {
        &self.decl
    }

    pub fn located_source(&self) -> &Rc<LocatedSource> {
        &self.located.source
    }

    pub fn program(&self) -> &Rc<Program> {
        &self.located.program
    }

    pub fn name(&self) -> &str {
        &self.decl.name
    }

    pub fn short_name(&self) -> &str {
        self.decl.short_name()
    }

    pub fn namespace_name(&self) -> &str {
        self.decl.namespace()
    }

    pub fn in_namespace(&self) -> bool {
        !self.namespace_name().is_empty()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.located.source.file_name()
    }

    pub fn is_internal(&self) -> bool {
        self.located.source.is_internal()
    }

    pub fn extension_name(&self) -> Option<&str> {
        self.located.source.extension_name()
    }

    pub fn is_defined_by_define(&self) -> bool {
        self.decl.via_define
    }

    pub fn start_line(&self) -> usize {
        self.program().line_index.start_line(self.decl.span)
    }

    pub fn end_line(&self) -> usize {
        self.program().line_index.end_line(self.decl.span)
    }

    pub fn doc_comment(&self) -> Option<String> {
        doc_comment_text(self.decl.doc_comment, self.located.source.source())
    }

    pub fn value_expression(&self) -> &ExprId {
        &self.decl.value
    }

    pub fn compiled_value(&self) -> Result<CompiledValue, ReflectionError> {
        let _guard = self
            .reflector
            .enter_resolution(self.decl.name.clone(), self.decl.name.clone())?;
        Ok(compile_in(
            &self.decl.value,
            &self.reflector,
            ContextSubject::Constant(self.clone()),
        )?)
    }

    pub fn value(&self) -> Result<Value, ReflectionError> {
        Ok(self.compiled_value()?.value)
    }
}
