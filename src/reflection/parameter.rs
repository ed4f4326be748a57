use super::class::ReflectionClass;
use super::function::FunctionReflection;
use crate::compiler::{CompiledValue, ContextSubject, compile_in};
use crate::core::value::Value;
use crate::parser::ast::{Expr, ExprId, MemberName, Param, SpecialClassName, Type};
use crate::reflector::ReflectionError;
use std::fmt;

#[derive(Clone)]
pub struct ReflectionParameter {
    function: FunctionReflection,
    position: usize,
}

impl fmt::Debug for ReflectionParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ReflectionParameter(${} of {})",
            self.name(),
            self.function.name()
        )
    }
}

impl ReflectionParameter {
    pub(crate) fn new(function: FunctionReflection, position: usize) -> Self {
        Self { function, position }
    }

    fn param(&self) -> &Param {
        &self.function.declaration().params[self.position]
    }

    pub fn name(&self) -> &str {
        &self.param().name
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn declaring_function(&self) -> &FunctionReflection {
        &self.function
    }

    pub fn declaring_class(&self) -> Option<&ReflectionClass> {
        self.function.class()
    }

    pub fn type_declaration(&self) -> Option<&Type> {
        self.param().ty.as_ref()
    }

    pub fn has_type(&self) -> bool {
        self.param().ty.is_some()
    }

    /// Untyped parameters, nullable types and a literal `null` default all
    /// accept null.
    pub fn allows_null(&self) -> bool {
        let param = self.param();
        match &param.ty {
            None => true,
            Some(ty) => {
                ty.allows_null() || matches!(param.default.as_deref(), Some(Expr::Null { .. }))
            }
        }
    }

    pub fn is_passed_by_reference(&self) -> bool {
        self.param().by_ref
    }

    pub fn is_variadic(&self) -> bool {
        self.param().variadic
    }

    pub fn is_promoted(&self) -> bool {
        self.param().is_promoted()
    }

    pub fn is_optional(&self) -> bool {
        self.position >= self.function.number_of_required_parameters()
    }

    pub fn is_default_value_available(&self) -> bool {
        self.param().default.is_some()
    }

    pub fn default_value_expression(&self) -> Option<&ExprId> {
        self.param().default.as_ref()
    }

    fn compile_default(&self) -> Result<Option<CompiledValue>, ReflectionError> {
        let Some(expr) = &self.param().default else {
            return Ok(None);
        };
        let compiled = compile_in(
            expr,
            self.function.reflector(),
            ContextSubject::Parameter(self.clone()),
        )?;
        Ok(Some(compiled))
    }

    /// Null when there is no default.
    pub fn default_value(&self) -> Result<Value, ReflectionError> {
        Ok(self
            .compile_default()?
            .map_or(Value::Null, |compiled| compiled.value))
    }

    /// Whether the default is a reference to a constant rather than a
    /// literal.
    pub fn is_default_value_constant(&self) -> bool {
        match self.param().default.as_deref() {
            Some(Expr::ConstFetch { .. }) => true,
            Some(Expr::ClassConstFetch { constant, .. }) => !matches!(
                constant,
                MemberName::Identifier(name, _) if name.eq_ignore_ascii_case("class")
            ),
            _ => false,
        }
    }

    /// Name of the constant the default refers to, as resolved by the
    /// compiler.
    pub fn default_value_constant_name(&self) -> Result<Option<String>, ReflectionError> {
        if !self.is_default_value_constant() {
            return Ok(None);
        }
        Ok(self
            .compile_default()?
            .and_then(|compiled| compiled.constant_name))
    }

    /// Class named by the parameter type, `self` and `parent` resolved.
    pub fn class_name(&self) -> Option<String> {
        let Some(Type::Name(name)) = self.param().ty.as_ref().map(strip_nullable) else {
            return None;
        };
        match name.special() {
            Some(SpecialClassName::Parent) => self.declaring_class()?.parent_class_name(),
            Some(_) => self.declaring_class().map(ReflectionClass::name),
            None => Some(name.resolved.clone()),
        }
    }
}

fn strip_nullable(ty: &Type) -> &Type {
    match ty {
        Type::Nullable(inner) => inner,
        other => other,
    }
}
