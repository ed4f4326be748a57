use super::class::ReflectionClass;
use super::doc_comment_text;
use crate::compiler::{ContextSubject, compile_in};
use crate::core::value::{ObjectHandle, Value};
use crate::parser::ast::ExprId;
use crate::parser::span::Span;
use crate::reflector::ReflectionError;
use std::fmt;

#[derive(Clone)]
pub struct ReflectionEnumCase {
    enum_class: ReflectionClass,
    name: String,
    value: Option<ExprId>,
    doc_comment: Option<Span>,
    span: Span,
}

impl fmt::Debug for ReflectionEnumCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReflectionEnumCase({}::{})", self.enum_class.name(), self.name)
    }
}

impl ReflectionEnumCase {
    pub(crate) fn new(
        enum_class: ReflectionClass,
        name: String,
        value: Option<ExprId>,
        doc_comment: Option<Span>,
        span: Span,
    ) -> Self {
        Self {
            enum_class,
            name,
            value,
            doc_comment,
            span,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn enum_class(&self) -> &ReflectionClass {
        &self.enum_class
    }

    pub fn value_expression(&self) -> Option<&ExprId> {
        self.value.as_ref()
    }

    /// Scalar value of a backed case; `None` for pure cases.
    pub fn backing_value(&self) -> Result<Option<Value>, ReflectionError> {
        let Some(expr) = &self.value else {
            return Ok(None);
        };
        let reflector = self.enum_class.reflector();
        let enum_name = self.enum_class.name();
        let _guard = reflector.enter_resolution(
            format!("{}::{}", enum_name.to_ascii_lowercase(), self.name),
            format!("{}::{}", enum_name, self.name),
        )?;
        let compiled = compile_in(expr, reflector, ContextSubject::EnumCase(self.clone()))?;
        Ok(Some(compiled.value))
    }

    /// The case object itself.
    pub fn value(&self) -> Result<Value, ReflectionError> {
        Ok(Value::Object(ObjectHandle::EnumCase {
            class: self.enum_class.name(),
            case: self.name.clone(),
            value: self.backing_value()?.map(Box::new),
        }))
    }

    pub fn doc_comment(&self) -> Option<String> {
        doc_comment_text(self.doc_comment, self.enum_class.located_source().source())
    }

    pub fn start_line(&self) -> usize {
        self.enum_class.program().line_index.start_line(self.span)
    }
}
