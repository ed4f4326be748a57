use super::class::ReflectionClass;
use super::parameter::ReflectionParameter;
use super::{doc_comment_text, source_text};
use crate::identifier::{CLOSURE_NAME, IdentifierKind};
use crate::parser::ast::{ClassKind, ExprId, FunctionBody, FunctionDecl, Modifiers, Program, Type, Visibility};
use crate::reflector::{ReflectionError, Reflector};
use crate::source_locator::{Declaration, LocatedDeclaration, LocatedSource};
use std::fmt;
use std::rc::Rc;

/// Free function.
#[derive(Clone)]
pub struct ReflectionFunction {
    reflector: Reflector,
    located: LocatedDeclaration,
    decl: Rc<FunctionDecl>,
}

impl fmt::Debug for ReflectionFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReflectionFunction({})", self.name())
    }
}

impl ReflectionFunction {
    pub fn from_located(
        reflector: Reflector,
        located: LocatedDeclaration,
    ) -> Result<Self, ReflectionError> {
        let Declaration::Function(decl) = &located.declaration else {
            return Err(ReflectionError::IdentifierNotFound {
                kind: IdentifierKind::Function,
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

    pub fn declaration(&self) -> &Rc<FunctionDecl> {
        &self.decl
    }

    pub fn located_source(&self) -> &Rc<LocatedSource> {
        &self.located.source
    }

    pub fn program(&self) -> &Rc<Program> {
        &self.located.program
    }

    /// Fully qualified name.
    pub fn name(&self) -> &str {
        &self.decl.name.namespaced
    }

    pub fn short_name(&self) -> &str {
        &self.decl.name.short
    }

    pub fn namespace_name(&self) -> &str {
        &self.decl.name.namespace
    }

    pub fn file_name(&self) -> Option<&str> {
        self.located.source.file_name()
    }

    pub fn is_internal(&self) -> bool {
        self.located.source.is_internal()
    }

    pub fn is_closure(&self) -> bool {
        self.decl.name.short == CLOSURE_NAME
    }

    pub fn parameters(&self) -> Vec<ReflectionParameter> {
        FunctionReflection::Function(self.clone()).parameters()
    }

    pub fn parameter(&self, name: &str) -> Option<ReflectionParameter> {
        self.parameters()
            .into_iter()
            .find(|param| param.name() == name)
    }

    /// Expression of an arrow function body.
    pub fn arrow_body(&self) -> Result<&ExprId, ReflectionError> {
        match &self.decl.body {
            FunctionBody::Expr(expr) => Ok(expr),
            _ => {
                let text = source_text(self.decl.span, self.located.source.source());
                Err(ReflectionError::InvalidArrowFunctionBodyNode(
                    text.chars().take(50).collect(),
                ))
            }
        }
    }
}

/// Method of a class, interface, trait or enum.
///
/// A method imported from a trait keeps the trait as its lexical class
/// (source, namespace, `__TRAIT__`) and is bound to the using class
/// (`self`, `static`, `__CLASS__`).
#[derive(Clone)]
pub struct ReflectionMethod {
    class: ReflectionClass,
    bound: Option<ReflectionClass>,
    decl: Rc<FunctionDecl>,
}

impl fmt::Debug for ReflectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReflectionMethod({}::{})", self.declaring_class().name(), self.name())
    }
}

impl ReflectionMethod {
    pub(crate) fn new(class: ReflectionClass, decl: Rc<FunctionDecl>) -> Self {
        Self {
            class,
            bound: None,
            decl,
        }
    }

    /// The same method as seen from a class that uses its trait.
    pub(crate) fn with_class(mut self, class: ReflectionClass) -> Self {
        self.bound = Some(class);
        self
    }

    pub fn declaration(&self) -> &Rc<FunctionDecl> {
        &self.decl
    }

    pub fn name(&self) -> &str {
        &self.decl.name.short
    }

    pub fn declaring_class(&self) -> &ReflectionClass {
        self.bound.as_ref().unwrap_or(&self.class)
    }

    /// The class-like whose body contains the declaration.
    pub fn lexical_class(&self) -> &ReflectionClass {
        &self.class
    }

    pub fn visibility(&self) -> Visibility {
        self.decl.modifiers.visibility()
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

    pub fn is_static(&self) -> bool {
        self.decl.modifiers.contains(Modifiers::STATIC)
    }

    pub fn is_final(&self) -> bool {
        self.decl.modifiers.contains(Modifiers::FINAL)
    }

    /// Interface methods are implicitly abstract.
    pub fn is_abstract(&self) -> bool {
        self.decl.modifiers.contains(Modifiers::ABSTRACT)
            || self.class.kind() == ClassKind::Interface
    }

    pub fn is_constructor(&self) -> bool {
        self.name().eq_ignore_ascii_case("__construct")
    }

    pub fn parameters(&self) -> Vec<ReflectionParameter> {
        FunctionReflection::Method(self.clone()).parameters()
    }

    pub fn parameter(&self, name: &str) -> Option<ReflectionParameter> {
        self.parameters()
            .into_iter()
            .find(|param| param.name() == name)
    }
}

/// A function or a method: whatever a parameter can belong to.
#[derive(Debug, Clone)]
pub enum FunctionReflection {
    Function(ReflectionFunction),
    Method(ReflectionMethod),
}

impl FunctionReflection {
    pub fn declaration(&self) -> &Rc<FunctionDecl> {
        match self {
            FunctionReflection::Function(function) => &function.decl,
            FunctionReflection::Method(method) => &method.decl,
        }
    }

    pub fn reflector(&self) -> &Reflector {
        match self {
            FunctionReflection::Function(function) => &function.reflector,
            FunctionReflection::Method(method) => method.class.reflector(),
        }
    }

    pub fn class(&self) -> Option<&ReflectionClass> {
        match self {
            FunctionReflection::Function(_) => None,
            FunctionReflection::Method(method) => Some(method.declaring_class()),
        }
    }

    pub fn lexical_class(&self) -> Option<&ReflectionClass> {
        match self {
            FunctionReflection::Function(_) => None,
            FunctionReflection::Method(method) => Some(method.lexical_class()),
        }
    }

    pub fn located_source(&self) -> &Rc<LocatedSource> {
        match self {
            FunctionReflection::Function(function) => function.located_source(),
            FunctionReflection::Method(method) => method.class.located_source(),
        }
    }

    pub fn program(&self) -> &Rc<Program> {
        match self {
            FunctionReflection::Function(function) => function.program(),
            FunctionReflection::Method(method) => method.class.program(),
        }
    }

    /// Fully qualified for functions, the bare method name for methods.
    pub fn name(&self) -> &str {
        match self {
            FunctionReflection::Function(function) => function.name(),
            FunctionReflection::Method(method) => method.name(),
        }
    }

    pub fn short_name(&self) -> &str {
        &self.declaration().name.short
    }

    pub fn namespace_name(&self) -> &str {
        match self {
            FunctionReflection::Function(function) => function.namespace_name(),
            FunctionReflection::Method(method) => method.class.namespace_name(),
        }
    }

    pub fn file_name(&self) -> Option<&str> {
        self.located_source().file_name()
    }

    pub fn start_line(&self) -> usize {
        self.program().line_index.start_line(self.declaration().span)
    }

    pub fn end_line(&self) -> usize {
        self.program().line_index.end_line(self.declaration().span)
    }

    pub fn doc_comment(&self) -> Option<String> {
        doc_comment_text(self.declaration().doc_comment, self.located_source().source())
    }

    pub fn return_type(&self) -> Option<&Type> {
        self.declaration().return_type.as_ref()
    }

    pub fn returns_reference(&self) -> bool {
        self.declaration().by_ref
    }

    pub fn is_variadic(&self) -> bool {
        self.declaration().params.iter().any(|param| param.variadic)
    }

    /// Text of the body without its braces; `None` when there is no body.
    pub fn body_source(&self) -> Option<String> {
        let source = self.located_source().source();
        match &self.declaration().body {
            FunctionBody::None => None,
            FunctionBody::Skipped(span) => {
                let text = source_text(*span, source);
                let inner = text
                    .strip_prefix('{')
                    .and_then(|rest| rest.strip_suffix('}'))
                    .unwrap_or(&text);
                Some(inner.to_string())
            }
            FunctionBody::Expr(expr) => Some(source_text(expr.span(), source)),
        }
    }

    pub fn parameters(&self) -> Vec<ReflectionParameter> {
        (0..self.declaration().params.len())
            .map(|position| ReflectionParameter::new(self.clone(), position))
            .collect()
    }

    pub fn number_of_parameters(&self) -> usize {
        self.declaration().params.len()
    }

    /// Parameters before the last one that has no default and is not
    /// variadic, plus that one.
    pub fn number_of_required_parameters(&self) -> usize {
        self.declaration()
            .params
            .iter()
            .rposition(|param| param.default.is_none() && !param.variadic)
            .map_or(0, |last| last + 1)
    }

    pub fn is_closure(&self) -> bool {
        self.short_name() == CLOSURE_NAME
    }
}

impl From<ReflectionFunction> for FunctionReflection {
    fn from(function: ReflectionFunction) -> Self {
        FunctionReflection::Function(function)
    }
}

impl From<ReflectionMethod> for FunctionReflection {
    fn from(method: ReflectionMethod) -> Self {
        FunctionReflection::Method(method)
    }
}
