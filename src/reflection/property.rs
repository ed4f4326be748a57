use super::class::ReflectionClass;
use super::doc_comment_text;
use crate::compiler::{ContextSubject, compile_in};
use crate::core::value::Value;
use crate::parser::ast::{ExprId, Modifiers, Param, PropertyEntry, Type, Visibility};
use crate::parser::span::Span;
use crate::reflector::ReflectionError;
use std::fmt;

#[derive(Clone)]
pub struct ReflectionProperty {
    class: ReflectionClass,
    bound: Option<ReflectionClass>,
    name: String,
    modifiers: Modifiers,
    ty: Option<Type>,
    default: Option<ExprId>,
    promoted: bool,
    doc_comment: Option<Span>,
    span: Span,
}

impl fmt::Debug for ReflectionProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReflectionProperty({}::${})", self.declaring_class().name(), self.name)
    }
}

impl ReflectionProperty {
    pub(crate) fn declared(
        class: ReflectionClass,
        entry: &PropertyEntry,
        modifiers: Modifiers,
        ty: Option<Type>,
        doc_comment: Option<Span>,
    ) -> Self {
        Self {
            class,
            bound: None,
            name: entry.name.clone(),
            modifiers,
            ty,
            default: entry.default.clone(),
            promoted: false,
            doc_comment,
            span: entry.span,
        }
    }

    /// Property introduced by a constructor parameter. Its default belongs
    /// to the parameter, not the property.
    pub(crate) fn promoted(class: ReflectionClass, param: &Param) -> Self {
        Self {
            class,
            bound: None,
            name: param.name.clone(),
            modifiers: param.modifiers,
            ty: param.ty.clone(),
            default: None,
            promoted: true,
            doc_comment: None,
            span: param.span,
        }
    }

    /// The same property as seen from a class that uses its trait.
    pub(crate) fn with_class(mut self, class: ReflectionClass) -> Self {
        self.bound = Some(class);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declaring_class(&self) -> &ReflectionClass {
        self.bound.as_ref().unwrap_or(&self.class)
    }

    /// The class-like whose body contains the declaration.
    pub fn lexical_class(&self) -> &ReflectionClass {
        &self.class
    }

    pub fn visibility(&self) -> Visibility {
        self.modifiers.visibility()
    }

    pub fn is_public(&self) -> bool {
        self.visibility() == Visibility::Public
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.contains(Modifiers::STATIC)
    }

    pub fn is_readonly(&self) -> bool {
        self.modifiers.contains(Modifiers::READONLY) || self.declaring_class().is_readonly()
    }

    pub fn is_promoted(&self) -> bool {
        self.promoted
    }

    pub fn type_declaration(&self) -> Option<&Type> {
        self.ty.as_ref()
    }

    /// Untyped properties default to null implicitly; typed ones without an
    /// initializer start uninitialized.
    pub fn has_default_value(&self) -> bool {
        !self.promoted && (self.default.is_some() || self.ty.is_none())
    }

    pub fn default_value_expression(&self) -> Option<&ExprId> {
        self.default.as_ref()
    }

    pub fn default_value(&self) -> Result<Value, ReflectionError> {
        let Some(expr) = &self.default else {
            return Ok(Value::Null);
        };
        let compiled = compile_in(
            expr,
            self.class.reflector(),
            ContextSubject::Property(self.clone()),
        )?;
        Ok(compiled.value)
    }

    pub fn doc_comment(&self) -> Option<String> {
        doc_comment_text(self.doc_comment, self.class.located_source().source())
    }

    pub fn start_line(&self) -> usize {
        self.class.program().line_index.start_line(self.span)
    }
}
