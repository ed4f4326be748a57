use super::class::ReflectionClass;
use super::doc_comment_text;
use crate::compiler::{CompiledValue, ContextSubject, compile_in};
use crate::core::value::Value;
use crate::parser::ast::{ClassConst, ExprId, Modifiers, Type, Visibility};
use crate::parser::span::Span;
use crate::reflector::ReflectionError;
use std::fmt;

#[derive(Clone)]
pub struct ReflectionClassConstant {
    class: ReflectionClass,
    name: String,
    modifiers: Modifiers,
    ty: Option<Type>,
    value: ExprId,
    doc_comment: Option<Span>,
    span: Span,
    in_interface: bool,
}

impl fmt::Debug for ReflectionClassConstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReflectionClassConstant({}::{})", self.class.name(), self.name)
    }
}

impl ReflectionClassConstant {
    pub(crate) fn new(
        class: ReflectionClass,
        constant: &ClassConst,
        modifiers: Modifiers,
        ty: Option<Type>,
        doc_comment: Option<Span>,
        in_interface: bool,
    ) -> Self {
        Self {
            class,
            name: constant.name.clone(),
            modifiers,
            ty,
            value: constant.value.clone(),
            doc_comment,
            span: constant.span,
            in_interface,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declaring_class(&self) -> &ReflectionClass {
        &self.class
    }

    pub fn visibility(&self) -> Visibility {
        self.modifiers.visibility()
    }

    pub fn is_public(&self) -> bool {
        self.visibility() == Visibility::Public
    }

    pub fn is_protected(&self) -> bool {
        self.visibility() == Visibility::Protected
    }

    pub fn is_private(&self) -> bool {
        self.visibility() == Visibility::Private
    }

    pub fn is_final(&self) -> bool {
        self.modifiers.contains(Modifiers::FINAL)
    }

    pub fn is_interface_constant(&self) -> bool {
        self.in_interface
    }

    pub fn type_declaration(&self) -> Option<&Type> {
        self.ty.as_ref()
    }

    pub fn value_expression(&self) -> &ExprId {
        &self.value
    }

    /// Evaluates the value expression. Not cached: every call compiles
    /// again.
    pub fn compiled_value(&self) -> Result<CompiledValue, ReflectionError> {
        let reflector = self.class.reflector();
        let class_name = self.class.name();
        let _guard = reflector.enter_resolution(
            format!("{}::{}", class_name.to_ascii_lowercase(), self.name),
            format!("{}::{}", class_name, self.name),
        )?;
        Ok(compile_in(
            &self.value,
            reflector,
            ContextSubject::ClassConstant(self.clone()),
        )?)
    }

    pub fn value(&self) -> Result<Value, ReflectionError> {
        Ok(self.compiled_value()?.value)
    }

    pub fn doc_comment(&self) -> Option<String> {
        doc_comment_text(self.doc_comment, self.class.located_source().source())
    }

    pub fn start_line(&self) -> usize {
        self.class.program().line_index.start_line(self.span)
    }

    pub fn end_line(&self) -> usize {
        self.class.program().line_index.end_line(self.span)
    }
}
