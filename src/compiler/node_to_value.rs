//! Evaluates constant expressions to values without running any code.
//!
//! The accepted grammar is what PHP allows in constant initializers,
//! property and parameter defaults: literals, arrays, operators, constant
//! and class constant references, enum cases, `new`, and magic constants.
//! Everything else is rejected with [`CompileError::UnableToCompileNode`].

use super::context::CompilerContext;
use super::error::CompileError;
use crate::core::operators::{self, BitOp, OperatorError};
use crate::core::value::{ArrayKey, ObjectHandle, PhpArray, Value};
use crate::parser::ast::{
    Arg, ArrayItem, BinaryOp, ClassRef, Expr, MagicConstKind, MemberName, Name, SpecialClassName,
    UnaryOp,
};
use crate::parser::span::Span;
use crate::reflection::ReflectionClass;
use crate::reflector::ReflectionError;
use crate::runtime::object_factory::Argument;
use crate::source_locator::file_helper::dir_name;
use std::path::Path;
use std::rc::Rc;

/// Result of compiling an expression.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledValue {
    pub value: Value,
    /// Fully qualified name of the constant the expression refers to, when
    /// it is a bare constant or class constant reference.
    pub constant_name: Option<String>,
}

impl CompiledValue {
    fn plain(value: Value) -> Self {
        Self {
            value,
            constant_name: None,
        }
    }
}

pub struct NodeToValueCompiler {
    context: CompilerContext,
}

impl NodeToValueCompiler {
    pub fn new(context: CompilerContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &CompilerContext {
        &self.context
    }

    pub fn compile(&self, expr: &Expr) -> Result<CompiledValue, CompileError> {
        match expr {
            Expr::ConstFetch { name, span } => {
                let (value, resolved) = self.constant(name, *span)?;
                Ok(CompiledValue {
                    value,
                    constant_name: Some(resolved),
                })
            }
            Expr::ClassConstFetch {
                class,
                constant,
                span,
            } => {
                let (value, constant_name) = self.class_constant(class, constant, *span)?;
                Ok(CompiledValue {
                    value,
                    constant_name,
                })
            }
            _ => self.eval(expr).map(CompiledValue::plain),
        }
    }

    fn unable(&self, span: Span, message: impl std::fmt::Display) -> CompileError {
        CompileError::unable(format!("{message} in {}", self.context.location(span)))
    }

    fn unsupported(&self, expr: &Expr) -> CompileError {
        CompileError::unable(format!(
            "Unable to compile expression in {}: unrecognized node type {}",
            self.context.location(expr.span()),
            expr.kind_name()
        ))
    }

    fn operator(&self, span: Span, result: Result<Value, OperatorError>) -> Result<Value, CompileError> {
        result.map_err(|err| self.unable(span, err))
    }

    fn eval(&self, expr: &Expr) -> Result<Value, CompileError> {
        match expr {
            Expr::Null { .. } => Ok(Value::Null),
            Expr::Boolean { value, .. } => Ok(Value::Bool(*value)),
            Expr::Integer { value, .. } => Ok(Value::Int(*value)),
            Expr::Float { value, .. } => Ok(Value::Float(*value)),
            Expr::String { value, .. } => Ok(Value::string(value.clone())),
            Expr::Array { items, span } => self.array(items, *span),
            Expr::Binary {
                left,
                op,
                right,
                span,
            } => self.binary(left, *op, right, *span),
            Expr::Unary { op, expr: operand, span } => self.unary(*op, operand, *span, expr),
            Expr::Ternary {
                condition,
                if_true,
                if_false,
                ..
            } => {
                let condition = self.eval(condition)?;
                if condition.to_bool() {
                    match if_true {
                        Some(if_true) => self.eval(if_true),
                        None => Ok(condition),
                    }
                } else {
                    self.eval(if_false)
                }
            }
            Expr::ConstFetch { name, span } => Ok(self.constant(name, *span)?.0),
            Expr::ClassConstFetch {
                class,
                constant,
                span,
            } => Ok(self.class_constant(class, constant, *span)?.0),
            Expr::New { class, args, span } => self.new_object(class, args, *span),
            Expr::MagicConst { kind, span } => self.magic_constant(*kind, *span),
            Expr::Call { func, args, span } => self.call(func, args, *span, expr),
            Expr::ArrayDimFetch { array, dim, span } => {
                let Some(dim) = dim else {
                    return Err(self.unable(*span, "Cannot use [] for reading"));
                };
                let container = self.eval(array)?;
                let offset = self.eval(dim)?;
                self.offset(container, &offset, *span, false)
                    .map(|value| value.unwrap_or(Value::Null))
            }
            Expr::PropertyFetch {
                target,
                property,
                nullsafe,
                span,
            } => {
                let target = self.eval(target)?;
                if *nullsafe && matches!(target, Value::Null) {
                    return Ok(Value::Null);
                }
                self.enum_property(&target, property, *span, expr)
            }
            _ => Err(self.unsupported(expr)),
        }
    }

    fn array(&self, items: &[ArrayItem], span: Span) -> Result<Value, CompileError> {
        let mut array = PhpArray::new();
        for item in items {
            if item.by_ref {
                return Err(self.unable(item.span, "Cannot take a reference in a constant expression"));
            }
            let value = self.eval(&item.value)?;
            if item.unpack {
                let Value::Array(spread) = value else {
                    return Err(self.unable(item.span, "Only arrays can be unpacked"));
                };
                for (key, value) in spread.iter() {
                    match key {
                        ArrayKey::Int(_) => {
                            if !array.push(value.clone()) {
                                return Err(self.unable(span, "Cannot add element to the array as the next element is already occupied"));
                            }
                        }
                        ArrayKey::Str(_) => array.insert(key.clone(), value.clone()),
                    }
                }
                continue;
            }
            match &item.key {
                Some(key) => {
                    let key = self.eval(key)?;
                    let Some(key) = ArrayKey::from_value(&key) else {
                        return Err(self.unable(item.span, format!("Illegal offset type {}", key.type_name())));
                    };
                    array.insert(key, value);
                }
                None => {
                    if !array.push(value) {
                        return Err(self.unable(span, "Cannot add element to the array as the next element is already occupied"));
                    }
                }
            }
        }
        Ok(Value::Array(Rc::new(array)))
    }

    /// `&&`, `||` and `??` evaluate their right operand only when needed;
    /// every other operator evaluates both.
    fn binary(&self, left: &Expr, op: BinaryOp, right: &Expr, span: Span) -> Result<Value, CompileError> {
        let both = || -> Result<(Value, Value), CompileError> { Ok((self.eval(left)?, self.eval(right)?)) };
        let arithmetic = |apply: fn(&Value, &Value) -> Result<Value, OperatorError>| -> Result<Value, CompileError> {
            let (l, r) = both()?;
            self.operator(span, apply(&l, &r))
        };
        let compare = |apply: fn(&Value, &Value) -> bool| -> Result<Value, CompileError> {
            let (l, r) = both()?;
            Ok(Value::Bool(apply(&l, &r)))
        };
        match op {
            BinaryOp::And | BinaryOp::LogicalAnd => {
                Ok(Value::Bool(self.eval(left)?.to_bool() && self.eval(right)?.to_bool()))
            }
            BinaryOp::Or | BinaryOp::LogicalOr => {
                Ok(Value::Bool(self.eval(left)?.to_bool() || self.eval(right)?.to_bool()))
            }
            BinaryOp::Coalesce => match self.eval_quiet(left)? {
                Some(Value::Null) | None => self.eval(right),
                Some(value) => Ok(value),
            },
            BinaryOp::Plus => arithmetic(operators::add),
            BinaryOp::Minus => arithmetic(operators::sub),
            BinaryOp::Mul => arithmetic(operators::mul),
            BinaryOp::Div => arithmetic(operators::div),
            BinaryOp::Mod => arithmetic(operators::modulo),
            BinaryOp::Pow => arithmetic(operators::pow),
            BinaryOp::Concat => arithmetic(operators::concat),
            BinaryOp::BitAnd => arithmetic(|l, r| operators::bitwise(BitOp::And, l, r)),
            BinaryOp::BitOr => arithmetic(|l, r| operators::bitwise(BitOp::Or, l, r)),
            BinaryOp::BitXor => arithmetic(|l, r| operators::bitwise(BitOp::Xor, l, r)),
            BinaryOp::ShiftLeft => arithmetic(operators::shift_left),
            BinaryOp::ShiftRight => arithmetic(operators::shift_right),
            BinaryOp::EqEq => compare(operators::loose_equals),
            BinaryOp::NotEq => compare(|l, r| !operators::loose_equals(l, r)),
            BinaryOp::EqEqEq => compare(operators::is_identical),
            BinaryOp::NotEqEq => compare(|l, r| !operators::is_identical(l, r)),
            BinaryOp::Lt => compare(operators::less_than),
            BinaryOp::LtEq => compare(operators::less_or_equal),
            BinaryOp::Gt => compare(|l, r| operators::less_than(r, l)),
            BinaryOp::GtEq => compare(|l, r| operators::less_or_equal(r, l)),
            BinaryOp::LogicalXor => compare(|l, r| l.to_bool() ^ r.to_bool()),
            BinaryOp::Spaceship => {
                let (l, r) = both()?;
                Ok(Value::Int(operators::spaceship(&l, &r)))
            }
        }
    }

    /// Left operand of `??`: missing array keys and string offsets are
    /// `None` instead of a warning.
    fn eval_quiet(&self, expr: &Expr) -> Result<Option<Value>, CompileError> {
        match expr {
            Expr::ArrayDimFetch {
                array,
                dim: Some(dim),
                span,
            } => {
                let Some(container) = self.eval_quiet(array)? else {
                    return Ok(None);
                };
                let offset = self.eval(dim)?;
                self.offset(container, &offset, *span, true)
            }
            _ => self.eval(expr).map(Some),
        }
    }

    fn offset(
        &self,
        container: Value,
        offset: &Value,
        span: Span,
        quiet: bool,
    ) -> Result<Option<Value>, CompileError> {
        match container {
            Value::Array(array) => {
                let Some(key) = ArrayKey::from_value(offset) else {
                    return Err(self.unable(span, format!("Cannot access offset of type {} on array", offset.type_name())));
                };
                let found = array.get(&key).cloned();
                if found.is_none() && !quiet {
                    tracing::warn!(key = %key, "undefined array key in constant expression");
                }
                Ok(found)
            }
            Value::String(bytes) => {
                let index = match offset {
                    Value::Int(i) => *i,
                    Value::String(_) | Value::Float(_) | Value::Bool(_) => offset.to_int(),
                    _ => {
                        return Err(self.unable(span, format!("Cannot access offset of type {} on string", offset.type_name())));
                    }
                };
                let len = bytes.len() as i64;
                let position = if index < 0 { len + index } else { index };
                if (0..len).contains(&position) {
                    Ok(Some(Value::string(vec![bytes[position as usize]])))
                } else {
                    if !quiet {
                        tracing::warn!(offset = index, "uninitialized string offset in constant expression");
                    }
                    Ok(if quiet { None } else { Some(Value::string(Vec::new())) })
                }
            }
            Value::Null | Value::Bool(_) | Value::Int(_) | Value::Float(_) => {
                if !quiet {
                    tracing::warn!(
                        container = container.type_name(),
                        "reading an offset of a scalar in constant expression"
                    );
                }
                Ok(None)
            }
            Value::Object(handle) => Err(self.unable(
                span,
                format!("Cannot use object of type {} as array", handle.class_name()),
            )),
        }
    }

    fn unary(&self, op: UnaryOp, operand: &Expr, span: Span, expr: &Expr) -> Result<Value, CompileError> {
        match op {
            UnaryOp::Plus => {
                let value = self.eval(operand)?;
                self.operator(span, operators::identity(&value))
            }
            UnaryOp::Minus => {
                let value = self.eval(operand)?;
                self.operator(span, operators::negate(&value))
            }
            UnaryOp::Not => Ok(Value::Bool(!self.eval(operand)?.to_bool())),
            UnaryOp::BitNot => {
                let value = self.eval(operand)?;
                self.operator(span, operators::bitwise_not(&value))
            }
            UnaryOp::PreInc
            | UnaryOp::PreDec
            | UnaryOp::ErrorSuppress
            | UnaryOp::Reference => Err(self.unsupported(expr)),
        }
    }

    /// Resolves a constant name: the namespaced candidate first, then the
    /// global one. The process table wins over declarations in source.
    fn constant(&self, name: &Name, span: Span) -> Result<(Value, String), CompileError> {
        let candidates = std::iter::once(&name.resolved).chain(name.fallback.as_ref());
        for candidate in candidates {
            if let Some(value) = self.context.reflector().defined_constants().get(candidate) {
                tracing::trace!(constant = %candidate, "constant defined by the process");
                return Ok((value, candidate.clone()));
            }
            match self.context.reflector().reflect_constant(candidate) {
                Ok(constant) => {
                    let value = constant.value()?;
                    return Ok((value, constant.name().to_string()));
                }
                Err(ReflectionError::IdentifierNotFound { .. }) => continue,
                Err(err) => return Err(err.into()),
            }
        }
        let attempted = name.fallback.clone().unwrap_or_else(|| name.resolved.clone());
        Err(CompileError::UnableToCompileNode {
            message: format!(
                "Could not locate constant \"{attempted}\" while evaluating expression in {}",
                self.context.location(span)
            ),
            constant_name: Some(attempted),
            class_name: None,
        })
    }

    fn context_class(&self, special: SpecialClassName, span: Span) -> Result<&ReflectionClass, CompileError> {
        self.context.class().ok_or_else(|| {
            self.unable(
                span,
                format!("Cannot use \"{}\" when no class scope is active", special.as_str()),
            )
        })
    }

    /// Class name with `self`, `static` and `parent` resolved against the
    /// enclosing class.
    fn class_name(&self, name: &Name, span: Span) -> Result<String, CompileError> {
        match name.special() {
            None => Ok(name.resolved.clone()),
            Some(special @ (SpecialClassName::Self_ | SpecialClassName::Static)) => {
                Ok(self.context_class(special, span)?.name())
            }
            Some(SpecialClassName::Parent) => {
                let class = self.context_class(SpecialClassName::Parent, span)?;
                class.parent_class_name().ok_or_else(|| {
                    self.unable(
                        span,
                        format!("Cannot use \"parent\" when class {} has no parent", class.name()),
                    )
                })
            }
        }
    }

    fn class_ref_name(&self, class: &ClassRef, span: Span) -> Result<String, CompileError> {
        match class {
            ClassRef::Name(name) => self.class_name(name, span),
            ClassRef::Expr(expr) => Err(self.unsupported(expr)),
            ClassRef::Anonymous(_) => Err(self.unable(span, "Cannot instantiate an anonymous class")),
        }
    }

    /// The enclosing class itself when the name refers to it, so its
    /// constants are read from the declaration being compiled.
    fn reflect_class(&self, name: &str) -> Result<ReflectionClass, CompileError> {
        if let Some(class) = self.context.class()
            && class.name().eq_ignore_ascii_case(name)
        {
            return Ok(class.clone());
        }
        Ok(self.context.reflector().reflect_class(name)?)
    }

    fn class_constant(
        &self,
        class: &ClassRef,
        constant: &MemberName,
        span: Span,
    ) -> Result<(Value, Option<String>), CompileError> {
        let class_name = self.class_ref_name(class, span)?;
        let constant = match constant {
            MemberName::Identifier(constant, _) => constant,
            MemberName::Expr(expr) => return Err(self.unsupported(expr)),
        };
        if constant.eq_ignore_ascii_case("class") {
            return Ok((Value::from(class_name), None));
        }

        let class = self.reflect_class(&class_name)?;
        let full_name = format!("{}::{}", class.name(), constant);

        if class.is_enum()
            && let Some(case) = class.case(constant)
        {
            if let Some(value) = self.context.reflector().defined_constants().get(&full_name) {
                return Ok((value, Some(full_name)));
            }
            return Ok((case.value()?, Some(full_name)));
        }

        match class.constant(constant)? {
            Some(reflection) => Ok((reflection.value()?, Some(full_name))),
            None => Err(CompileError::UnableToCompileNode {
                message: format!(
                    "Could not locate constant {full_name} while evaluating expression in {}",
                    self.context.location(span)
                ),
                constant_name: Some(full_name),
                class_name: Some(class.name()),
            }),
        }
    }

    fn arguments(&self, args: &[Arg]) -> Result<Vec<Argument>, CompileError> {
        args.iter()
            .map(|arg| {
                if arg.unpack {
                    return Err(self.unable(arg.span, "Cannot unpack arguments in a constant expression"));
                }
                Ok(Argument {
                    name: arg.name.clone(),
                    value: self.eval(&arg.value)?,
                })
            })
            .collect()
    }

    /// `new` needs a class that can be instantiated in this process, not
    /// only one reflection knows about.
    fn new_object(&self, class: &ClassRef, args: &[Arg], span: Span) -> Result<Value, CompileError> {
        let class = self.class_ref_name(class, span)?;
        let factory = self.context.reflector().object_factory();
        if !factory.is_loadable(&class) {
            return Err(CompileError::UnableToCompileNode {
                message: format!(
                    "Class \"{class}\" is not loaded and cannot be instantiated in {}",
                    self.context.location(span)
                ),
                constant_name: None,
                class_name: Some(class),
            });
        }
        let args = self.arguments(args)?;
        tracing::debug!(class = %class, args = args.len(), "instantiating object for constant expression");
        let handle = factory
            .instantiate(&class, &args)
            .map_err(|reason| self.unable(span, format!("Could not instantiate {class}: {reason}")))?;
        Ok(Value::Object(handle))
    }

    /// Only `constant('NAME')` of a name the process has defined.
    fn call(&self, func: &Expr, args: &[Arg], span: Span, expr: &Expr) -> Result<Value, CompileError> {
        let Expr::Name { name, .. } = func else {
            return Err(self.unsupported(expr));
        };
        let is_constant_fn = std::iter::once(&name.resolved)
            .chain(name.fallback.as_ref())
            .any(|candidate| candidate.eq_ignore_ascii_case("constant"));
        let [arg] = args else {
            return Err(self.unsupported(expr));
        };
        if !is_constant_fn || arg.unpack || arg.name.is_some() {
            return Err(self.unsupported(expr));
        }
        let requested = self.eval(&arg.value)?;
        let Some(requested) = requested.as_bytes() else {
            return Err(self.unable(span, "constant() expects a string"));
        };
        let text = String::from_utf8_lossy(requested);
        let requested = text.strip_prefix('\\').unwrap_or(text.as_ref());
        self.context
            .reflector()
            .defined_constants()
            .get(requested)
            .ok_or_else(|| {
                self.unable(span, format!("Constant \"{requested}\" is not defined"))
            })
    }

    fn enum_property(
        &self,
        target: &Value,
        property: &MemberName,
        span: Span,
        expr: &Expr,
    ) -> Result<Value, CompileError> {
        let MemberName::Identifier(property, _) = property else {
            return Err(self.unsupported(expr));
        };
        let Value::Object(ObjectHandle::EnumCase { class, case, value }) = target else {
            return Err(self.unsupported(expr));
        };
        match property.as_str() {
            "name" => Ok(Value::from(case.as_str())),
            "value" => value.as_deref().cloned().ok_or_else(|| {
                self.unable(span, format!("Undefined property: {class}::$value"))
            }),
            other => Err(self.unable(span, format!("Undefined property: {class}::${other}"))),
        }
    }

    fn magic_constant(&self, kind: MagicConstKind, span: Span) -> Result<Value, CompileError> {
        let context = &self.context;
        let value = match kind {
            MagicConstKind::File => Value::from(self.existing_file(span)?),
            MagicConstKind::Dir => Value::from(dir_name(&self.existing_file(span)?)),
            MagicConstKind::Line => Value::Int(context.line_of(span) as i64),
            MagicConstKind::Namespace => Value::from(context.namespace()),
            MagicConstKind::Class => Value::from(context.class().map(ReflectionClass::name).unwrap_or_default()),
            MagicConstKind::Method => {
                let function = context.function();
                Value::from(match (context.lexical_class(), function) {
                    (Some(class), Some(function)) => format!("{}::{}", class.name(), function.name()),
                    (None, Some(function)) => function.name().to_string(),
                    (_, None) => String::new(),
                })
            }
            MagicConstKind::Function => {
                Value::from(context.function().map(|function| function.name().to_string()).unwrap_or_default())
            }
            MagicConstKind::Trait => Value::from(
                context
                    .lexical_class()
                    .filter(|class| class.is_trait())
                    .map(ReflectionClass::name)
                    .unwrap_or_default(),
            ),
            MagicConstKind::Property => Value::from(context.property_name().unwrap_or_default()),
        };
        Ok(value)
    }

    /// `__FILE__` and `__DIR__` need a file that still exists.
    fn existing_file(&self, span: Span) -> Result<String, CompileError> {
        let Some(file) = self.context.file_name() else {
            return Err(CompileError::unable(format!(
                "No file name for {} (line {})",
                self.context.describe(),
                self.context.line_of(span)
            )));
        };
        if !Path::new(file).is_file() {
            return Err(self.unable(span, format!("File \"{file}\" does not exist")));
        }
        Ok(file.to_string())
    }
}
