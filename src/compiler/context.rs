//! Lexical scope a constant expression is compiled in.

use crate::parser::ast::Program;
use crate::parser::line_index::LineIndex;
use crate::parser::span::Span;
use crate::reflection::{
    FunctionReflection, ReflectionClass, ReflectionClassConstant, ReflectionConstant,
    ReflectionEnumCase, ReflectionFunction, ReflectionMethod, ReflectionParameter,
    ReflectionProperty,
};
use crate::reflector::Reflector;
use crate::source_locator::LocatedSource;
use std::rc::Rc;

/// The declaration whose expression is being compiled.
#[derive(Debug, Clone)]
pub enum ContextSubject {
    Class(ReflectionClass),
    ClassConstant(ReflectionClassConstant),
    Constant(ReflectionConstant),
    EnumCase(ReflectionEnumCase),
    Function(ReflectionFunction),
    Method(ReflectionMethod),
    Parameter(ReflectionParameter),
    Property(ReflectionProperty),
}

impl ContextSubject {
    pub fn class(&self) -> Option<&ReflectionClass> {
        match self {
            ContextSubject::Class(class) => Some(class),
            ContextSubject::ClassConstant(constant) => Some(constant.declaring_class()),
            ContextSubject::Constant(_) => None,
            ContextSubject::EnumCase(case) => Some(case.enum_class()),
            ContextSubject::Function(_) => None,
            ContextSubject::Method(method) => Some(method.declaring_class()),
            ContextSubject::Parameter(param) => param.declaring_class(),
            ContextSubject::Property(property) => Some(property.declaring_class()),
        }
    }

    /// Class-like whose body holds the subject. Differs from `class()` for
    /// members imported from a trait.
    pub fn lexical_class(&self) -> Option<&ReflectionClass> {
        match self {
            ContextSubject::Method(method) => Some(method.lexical_class()),
            ContextSubject::Property(property) => Some(property.lexical_class()),
            ContextSubject::Parameter(param) => param.declaring_function().lexical_class(),
            ContextSubject::Class(_)
            | ContextSubject::ClassConstant(_)
            | ContextSubject::Constant(_)
            | ContextSubject::EnumCase(_)
            | ContextSubject::Function(_) => self.class(),
        }
    }

    pub fn function(&self) -> Option<FunctionReflection> {
        match self {
            ContextSubject::Function(function) => Some(function.clone().into()),
            ContextSubject::Method(method) => Some(method.clone().into()),
            ContextSubject::Parameter(param) => Some(param.declaring_function().clone()),
            ContextSubject::Class(_)
            | ContextSubject::ClassConstant(_)
            | ContextSubject::Constant(_)
            | ContextSubject::EnumCase(_)
            | ContextSubject::Property(_) => None,
        }
    }

    /// Constants are not nested in anything: their namespace is the one
    /// they were declared in.
    pub fn namespace(&self) -> &str {
        match self {
            ContextSubject::Constant(constant) => &constant.declaration().site_namespace,
            ContextSubject::Function(function) => function.namespace_name(),
            ContextSubject::Parameter(param) => param.declaring_function().namespace_name(),
            ContextSubject::Class(_)
            | ContextSubject::ClassConstant(_)
            | ContextSubject::EnumCase(_)
            | ContextSubject::Method(_)
            | ContextSubject::Property(_) => {
                self.lexical_class().map_or("", ReflectionClass::namespace_name)
            }
        }
    }

    pub fn located_source(&self) -> &Rc<LocatedSource> {
        match self {
            ContextSubject::Constant(constant) => constant.located_source(),
            ContextSubject::Function(function) => function.located_source(),
            ContextSubject::Parameter(param) => param.declaring_function().located_source(),
            ContextSubject::Class(class) => class.located_source(),
            ContextSubject::ClassConstant(constant) => constant.declaring_class().located_source(),
            ContextSubject::EnumCase(case) => case.enum_class().located_source(),
            ContextSubject::Method(method) => method.lexical_class().located_source(),
            ContextSubject::Property(property) => property.lexical_class().located_source(),
        }
    }

    pub fn program(&self) -> &Rc<Program> {
        match self {
            ContextSubject::Constant(constant) => constant.program(),
            ContextSubject::Function(function) => function.program(),
            ContextSubject::Parameter(param) => param.declaring_function().program(),
            ContextSubject::Class(class) => class.program(),
            ContextSubject::ClassConstant(constant) => constant.declaring_class().program(),
            ContextSubject::EnumCase(case) => case.enum_class().program(),
            ContextSubject::Method(method) => method.lexical_class().program(),
            ContextSubject::Property(property) => property.lexical_class().program(),
        }
    }
}

#[derive(Debug, Clone)]
enum Scope {
    Subject(ContextSubject),
    /// Free-standing expression, compiled in the global namespace.
    Global(LineIndex),
}

#[derive(Debug, Clone)]
pub struct CompilerContext {
    reflector: Reflector,
    scope: Scope,
}

impl CompilerContext {
    pub fn new(reflector: Reflector, subject: ContextSubject) -> Self {
        Self {
            reflector,
            scope: Scope::Subject(subject),
        }
    }

    /// Context for an expression that belongs to no declaration. Line
    /// numbers count from the start of `source`.
    pub fn global(reflector: Reflector, source: &[u8]) -> Self {
        Self {
            reflector,
            scope: Scope::Global(LineIndex::new(source)),
        }
    }

    pub fn reflector(&self) -> &Reflector {
        &self.reflector
    }

    pub fn subject(&self) -> Option<&ContextSubject> {
        match &self.scope {
            Scope::Subject(subject) => Some(subject),
            Scope::Global(_) => None,
        }
    }

    pub fn namespace(&self) -> &str {
        self.subject().map_or("", ContextSubject::namespace)
    }

    pub fn class(&self) -> Option<&ReflectionClass> {
        self.subject().and_then(ContextSubject::class)
    }

    pub fn lexical_class(&self) -> Option<&ReflectionClass> {
        self.subject().and_then(ContextSubject::lexical_class)
    }

    pub fn function(&self) -> Option<FunctionReflection> {
        self.subject().and_then(ContextSubject::function)
    }

    /// Normalized path of the file the subject was declared in.
    pub fn file_name(&self) -> Option<&str> {
        self.subject()
            .and_then(|subject| subject.located_source().file_name())
    }

    pub fn property_name(&self) -> Option<&str> {
        match self.subject() {
            Some(ContextSubject::Property(property)) => Some(property.name()),
            _ => None,
        }
    }

    pub fn line_of(&self, span: Span) -> usize {
        match &self.scope {
            Scope::Subject(subject) => subject.program().line_index.start_line(span),
            Scope::Global(lines) => lines.start_line(span),
        }
    }

    /// `method Foo::bar()`, `function baz()`, `class Foo`, `namespace X`
    /// or `global namespace`.
    pub fn describe(&self) -> String {
        if let Some(function) = self.function() {
            return match function.class() {
                Some(class) => format!("method {}::{}()", class.name(), function.name()),
                None => format!("function {}()", function.name()),
            };
        }
        if let Some(class) = self.class() {
            return format!("class {}", class.name());
        }
        match self.namespace() {
            "" => "global namespace".to_string(),
            namespace => format!("namespace {namespace}"),
        }
    }

    /// Descriptor plus file and line, for diagnostics.
    pub fn location(&self, span: Span) -> String {
        let line = self.line_of(span);
        match self.file_name() {
            Some(file) => format!("{} in file {} (line {})", self.describe(), file, line),
            None => format!("{} (line {})", self.describe(), line),
        }
    }
}
