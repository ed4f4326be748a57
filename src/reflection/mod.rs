//! Read-only views over declarations, in the shape of PHP's reflection API.

pub mod class;
pub mod class_constant;
pub mod constant;
pub mod enum_case;
pub mod function;
pub mod parameter;
pub mod property;

pub use class::ReflectionClass;
pub use class_constant::ReflectionClassConstant;
pub use constant::ReflectionConstant;
pub use enum_case::ReflectionEnumCase;
pub use function::{FunctionReflection, ReflectionFunction, ReflectionMethod};
pub use parameter::ReflectionParameter;
pub use property::ReflectionProperty;

use crate::parser::span::Span;

pub(crate) fn source_text(span: Span, source: &[u8]) -> String {
    String::from_utf8_lossy(span.as_str(source)).into_owned()
}

pub(crate) fn doc_comment_text(span: Option<Span>, source: &[u8]) -> Option<String> {
    span.map(|span| source_text(span, source))
}
