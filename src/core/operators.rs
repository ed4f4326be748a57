//! Operator semantics for constant expressions
//!
//! Implements the PHP 8 rules for arithmetic, bitwise, string and
//! comparison operators on [`Value`]s. Every operation returns a
//! `Result`: where the engine would throw (`DivisionByZeroError`,
//! `ArithmeticError`, `TypeError`) an [`OperatorError`] is produced and the
//! expression does not compile.
//!
//! ## Type juggling
//!
//! - Numeric strings are converted to int or float
//! - Leading-numeric strings (`"5 apples"`) are accepted
//! - Non-numeric strings, arrays and objects are rejected for arithmetic
//! - `int` overflow promotes to `float`
//!
//! ## References
//!
//! - Zend: `$PHP_SRC_PATH/Zend/zend_operators.c`
//! - PHP Manual: https://www.php.net/manual/en/language.operators.php

use crate::core::value::{Number, NumericPrefix, PhpArray, Value, parse_numeric_prefix};
use std::cmp::Ordering;
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OperatorError {
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Modulo by zero")]
    ModuloByZero,
    #[error("Bit shift by negative number")]
    NegativeShift,
    #[error("Unsupported operand types: {left} {op} {right}")]
    UnsupportedOperands {
        op: &'static str,
        left: String,
        right: String,
    },
    #[error("Cannot perform bitwise not on {0}")]
    BitwiseNot(String),
    #[error("Object of class {0} could not be converted to string")]
    StringConversion(String),
}

#[derive(Debug, Clone, Copy)]
enum ArithOp {
    Add,
    Sub,
    Mul,
}

impl ArithOp {
    fn symbol(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
        }
    }

    fn apply_int(self, a: i64, b: i64) -> Option<i64> {
        match self {
            ArithOp::Add => a.checked_add(b),
            ArithOp::Sub => a.checked_sub(b),
            ArithOp::Mul => a.checked_mul(b),
        }
    }

    fn apply_float(self, a: f64, b: f64) -> f64 {
        match self {
            ArithOp::Add => a + b,
            ArithOp::Sub => a - b,
            ArithOp::Mul => a * b,
        }
    }
}

fn unsupported(op: &'static str, left: &Value, right: &Value) -> OperatorError {
    OperatorError::UnsupportedOperands {
        op,
        left: left.operand_type_name(),
        right: right.operand_type_name(),
    }
}

/// Numeric view of an operand.
/// Reference: $PHP_SRC_PATH/Zend/zend_operators.c - zendi_try_convert_scalar_to_number
fn to_number(value: &Value) -> Option<Number> {
    match value {
        Value::Null => Some(Number::Int(0)),
        Value::Bool(b) => Some(Number::Int(*b as i64)),
        Value::Int(i) => Some(Number::Int(*i)),
        Value::Float(f) => Some(Number::Float(*f)),
        Value::String(s) => match parse_numeric_prefix(s) {
            NumericPrefix::Numeric(n) => Some(n),
            NumericPrefix::Leading(n) => {
                tracing::warn!("A non-numeric value encountered");
                Some(n)
            }
            NumericPrefix::None => None,
        },
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn operands(op: &'static str, left: &Value, right: &Value) -> Result<(Number, Number), OperatorError> {
    match (to_number(left), to_number(right)) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(unsupported(op, left, right)),
    }
}

fn arithmetic(op: ArithOp, left: &Value, right: &Value) -> Result<Value, OperatorError> {
    let (a, b) = operands(op.symbol(), left, right)?;
    Ok(match (a, b) {
        (Number::Int(x), Number::Int(y)) => match op.apply_int(x, y) {
            Some(result) => Value::Int(result),
            None => Value::Float(op.apply_float(x as f64, y as f64)),
        },
        _ => Value::Float(op.apply_float(a.to_float(), b.to_float())),
    })
}

/// `+`, including array union.
/// Reference: $PHP_SRC_PATH/Zend/zend_operators.c - add_function
pub fn add(left: &Value, right: &Value) -> Result<Value, OperatorError> {
    if let (Value::Array(a), Value::Array(b)) = (left, right) {
        let mut result = (**a).clone();
        for (key, value) in b.iter() {
            if !result.map.contains_key(key) {
                result.insert(key.clone(), value.clone());
            }
        }
        return Ok(Value::Array(Rc::new(result)));
    }
    arithmetic(ArithOp::Add, left, right)
}

pub fn sub(left: &Value, right: &Value) -> Result<Value, OperatorError> {
    arithmetic(ArithOp::Sub, left, right)
}

pub fn mul(left: &Value, right: &Value) -> Result<Value, OperatorError> {
    arithmetic(ArithOp::Mul, left, right)
}

/// Reference: $PHP_SRC_PATH/Zend/zend_operators.c - div_function_base
pub fn div(left: &Value, right: &Value) -> Result<Value, OperatorError> {
    let (a, b) = operands("/", left, right)?;
    if b.to_float() == 0.0 {
        return Err(OperatorError::DivisionByZero);
    }
    Ok(match (a, b) {
        (Number::Int(x), Number::Int(y)) if x.checked_rem(y) == Some(0) => {
            Value::Int(x / y)
        }
        _ => Value::Float(a.to_float() / b.to_float()),
    })
}

/// Both operands are converted to int first.
/// Reference: $PHP_SRC_PATH/Zend/zend_operators.c - mod_function
pub fn modulo(left: &Value, right: &Value) -> Result<Value, OperatorError> {
    let (a, b) = operands("%", left, right)?;
    let x = a.into_value().to_int();
    let y = b.into_value().to_int();
    if y == 0 {
        return Err(OperatorError::ModuloByZero);
    }
    // PHP_INT_MIN % -1 overflows in C, PHP returns 0
    if y == -1 {
        return Ok(Value::Int(0));
    }
    Ok(Value::Int(x % y))
}

/// Reference: $PHP_SRC_PATH/Zend/zend_operators.c - pow_function_base
pub fn pow(left: &Value, right: &Value) -> Result<Value, OperatorError> {
    let (a, b) = operands("**", left, right)?;
    if let (Number::Int(base), Number::Int(exp)) = (a, b)
        && exp >= 0
    {
        let mut result: i64 = 1;
        let mut overflow = false;
        for _ in 0..exp.min(64) {
            match result.checked_mul(base) {
                Some(next) => result = next,
                None => {
                    overflow = true;
                    break;
                }
            }
        }
        // |base| <= 1 is the only way past 64 iterations without overflow
        if exp > 64 && !overflow {
            result = match base {
                0 => 0,
                1 => 1,
                -1 if exp % 2 == 0 => 1,
                -1 => -1,
                _ => {
                    overflow = true;
                    result
                }
            };
        }
        if !overflow {
            return Ok(Value::Int(result));
        }
        return Ok(Value::Float((base as f64).powf(exp as f64)));
    }
    Ok(Value::Float(a.to_float().powf(b.to_float())))
}

/// Unary minus compiles to a multiplication by -1.
pub fn negate(value: &Value) -> Result<Value, OperatorError> {
    mul(value, &Value::Int(-1))
}

pub fn identity(value: &Value) -> Result<Value, OperatorError> {
    mul(value, &Value::Int(1))
}

#[derive(Debug, Clone, Copy)]
pub enum BitOp {
    And,
    Or,
    Xor,
}

impl BitOp {
    fn symbol(self) -> &'static str {
        match self {
            BitOp::And => "&",
            BitOp::Or => "|",
            BitOp::Xor => "^",
        }
    }
}

fn to_bit_operand(value: &Value) -> Option<i64> {
    match value {
        Value::Float(f) => Some(crate::core::value::float_to_int(*f)),
        other => match to_number(other)? {
            Number::Int(i) => Some(i),
            Number::Float(f) => Some(crate::core::value::float_to_int(f)),
        },
    }
}

/// String operands on both sides work byte-wise. `&` truncates to the
/// shorter string, `|` keeps the longer tail.
/// Reference: $PHP_SRC_PATH/Zend/zend_operators.c - bitwise_or_function
pub fn bitwise(op: BitOp, left: &Value, right: &Value) -> Result<Value, OperatorError> {
    if let (Value::String(a), Value::String(b)) = (left, right) {
        let bytes: Vec<u8> = match op {
            BitOp::And => a.iter().zip(b.iter()).map(|(x, y)| x & y).collect(),
            BitOp::Xor => a.iter().zip(b.iter()).map(|(x, y)| x ^ y).collect(),
            BitOp::Or => {
                let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
                long.iter()
                    .enumerate()
                    .map(|(i, x)| x | short.get(i).copied().unwrap_or(0))
                    .collect()
            }
        };
        return Ok(Value::string(bytes));
    }

    let (Some(x), Some(y)) = (to_bit_operand(left), to_bit_operand(right)) else {
        return Err(unsupported(op.symbol(), left, right));
    };
    Ok(Value::Int(match op {
        BitOp::And => x & y,
        BitOp::Or => x | y,
        BitOp::Xor => x ^ y,
    }))
}

/// Reference: $PHP_SRC_PATH/Zend/zend_operators.c - bitwise_not_function
pub fn bitwise_not(value: &Value) -> Result<Value, OperatorError> {
    match value {
        Value::Int(i) => Ok(Value::Int(!i)),
        Value::Float(f) => Ok(Value::Int(!crate::core::value::float_to_int(*f))),
        Value::String(s) => Ok(Value::string(s.iter().map(|b| !b).collect::<Vec<u8>>())),
        other => Err(OperatorError::BitwiseNot(other.operand_type_name())),
    }
}

/// Reference: $PHP_SRC_PATH/Zend/zend_operators.c - shift_left_function
pub fn shift_left(left: &Value, right: &Value) -> Result<Value, OperatorError> {
    let (Some(x), Some(y)) = (to_bit_operand(left), to_bit_operand(right)) else {
        return Err(unsupported("<<", left, right));
    };
    match y {
        y if y < 0 => Err(OperatorError::NegativeShift),
        y if y >= 64 => Ok(Value::Int(0)),
        y => Ok(Value::Int(x.wrapping_shl(y as u32))),
    }
}

pub fn shift_right(left: &Value, right: &Value) -> Result<Value, OperatorError> {
    let (Some(x), Some(y)) = (to_bit_operand(left), to_bit_operand(right)) else {
        return Err(unsupported(">>", left, right));
    };
    match y {
        y if y < 0 => Err(OperatorError::NegativeShift),
        y if y >= 64 => Ok(Value::Int(if x < 0 { -1 } else { 0 })),
        y => Ok(Value::Int(x >> y)),
    }
}

/// Reference: $PHP_SRC_PATH/Zend/zend_operators.c - concat_function
pub fn concat(left: &Value, right: &Value) -> Result<Value, OperatorError> {
    let mut bytes = string_operand(left)?;
    bytes.extend(string_operand(right)?);
    Ok(Value::string(bytes))
}

fn string_operand(value: &Value) -> Result<Vec<u8>, OperatorError> {
    if matches!(value, Value::Array(_)) {
        tracing::warn!("Array to string conversion");
    }
    value
        .to_php_string()
        .ok_or_else(|| OperatorError::StringConversion(value.operand_type_name()))
}

/// `===`
/// Reference: $PHP_SRC_PATH/Zend/zend_operators.c - zend_is_identical
pub fn is_identical(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len()
                && a.iter()
                    .zip(b.iter())
                    .all(|((ka, va), (kb, vb))| ka == kb && is_identical(va, vb))
        }
        (Value::Object(a), Value::Object(b)) => a.same_instance(b),
        _ => left == right,
    }
}

/// `==`
pub fn loose_equals(left: &Value, right: &Value) -> bool {
    compare(left, right) == Some(Ordering::Equal)
}

fn numeric_string(bytes: &[u8]) -> Option<Number> {
    match parse_numeric_prefix(bytes) {
        NumericPrefix::Numeric(n) => Some(n),
        _ => None,
    }
}

fn compare_numbers(a: Number, b: Number) -> Option<Ordering> {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => Some(x.cmp(&y)),
        _ => a.to_float().partial_cmp(&b.to_float()),
    }
}

fn compare_bools(a: bool, b: bool) -> Option<Ordering> {
    Some(a.cmp(&b))
}

/// PHP 8 comparison. `None` means uncomparable: `==` is false and `<=>`
/// reports 1.
/// Reference: $PHP_SRC_PATH/Zend/zend_operators.c - zend_compare
pub fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Bool(a), _) => compare_bools(*a, right.to_bool()),
        (_, Value::Bool(b)) => compare_bools(left.to_bool(), *b),

        // null <=> string compares against ""
        (Value::Null, Value::String(s)) => Some((b"" as &[u8]).cmp(s.as_slice())),
        (Value::String(s), Value::Null) => Some(s.as_slice().cmp(b"")),
        (Value::Null, _) => compare_bools(false, right.to_bool()),
        (_, Value::Null) => compare_bools(left.to_bool(), false),

        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            left.to_float().partial_cmp(&right.to_float())
        }

        (Value::String(a), Value::String(b)) => {
            match (numeric_string(a), numeric_string(b)) {
                (Some(x), Some(y)) => compare_numbers(x, y),
                _ => Some(a.as_slice().cmp(b.as_slice())),
            }
        }

        // number vs string: numeric compare only for numeric strings,
        // otherwise the number is compared as a string
        (Value::Int(_) | Value::Float(_), Value::String(s)) => match numeric_string(s) {
            Some(n) => compare_numbers(number_of(left), n),
            None => Some(
                left.to_php_string()
                    .unwrap_or_default()
                    .as_slice()
                    .cmp(s.as_slice()),
            ),
        },
        (Value::String(s), Value::Int(_) | Value::Float(_)) => match numeric_string(s) {
            Some(n) => compare_numbers(n, number_of(right)),
            None => Some(
                s.as_slice()
                    .cmp(right.to_php_string().unwrap_or_default().as_slice()),
            ),
        },

        (Value::Array(a), Value::Array(b)) => compare_arrays(a, b),
        (Value::Array(_), _) => Some(Ordering::Greater),
        (_, Value::Array(_)) => Some(Ordering::Less),

        (Value::Object(a), Value::Object(b)) => {
            if a.same_instance(b) {
                Some(Ordering::Equal)
            } else {
                None
            }
        }
        (Value::Object(_), _) | (_, Value::Object(_)) => None,
    }
}

fn number_of(value: &Value) -> Number {
    match value {
        Value::Float(f) => Number::Float(*f),
        other => Number::Int(other.to_int()),
    }
}

/// Reference: $PHP_SRC_PATH/Zend/zend_hash.c - zend_hash_compare
fn compare_arrays(a: &PhpArray, b: &PhpArray) -> Option<Ordering> {
    match a.len().cmp(&b.len()) {
        Ordering::Equal => {}
        other => return Some(other),
    }
    for (key, value) in a.iter() {
        let other = b.get(key)?;
        match compare(value, other)? {
            Ordering::Equal => {}
            ordering => return Some(ordering),
        }
    }
    Some(Ordering::Equal)
}

/// `<=>`
pub fn spaceship(left: &Value, right: &Value) -> i64 {
    match compare(left, right) {
        Some(Ordering::Less) => -1,
        Some(Ordering::Equal) => 0,
        Some(Ordering::Greater) | None => 1,
    }
}

pub fn less_than(left: &Value, right: &Value) -> bool {
    compare(left, right) == Some(Ordering::Less)
}

pub fn less_or_equal(left: &Value, right: &Value) -> bool {
    matches!(compare(left, right), Some(Ordering::Less | Ordering::Equal))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Value {
        Value::from(text)
    }

    #[test]
    fn integer_overflow_promotes_to_float() {
        assert_eq!(
            add(&Value::Int(i64::MAX), &Value::Int(1)).unwrap(),
            Value::Float(i64::MAX as f64 + 1.0)
        );
        assert_eq!(
            mul(&Value::Int(i64::MIN), &Value::Int(-1)).unwrap(),
            Value::Float(9.223_372_036_854_775_808e18)
        );
        assert_eq!(pow(&Value::Int(2), &Value::Int(62)).unwrap(), Value::Int(1 << 62));
        assert!(matches!(
            pow(&Value::Int(2), &Value::Int(64)).unwrap(),
            Value::Float(_)
        ));
    }

    #[test]
    fn division_results() {
        assert_eq!(div(&Value::Int(6), &Value::Int(3)).unwrap(), Value::Int(2));
        assert_eq!(div(&Value::Int(7), &Value::Int(2)).unwrap(), Value::Float(3.5));
        assert_eq!(
            div(&Value::Int(1), &Value::Int(0)),
            Err(OperatorError::DivisionByZero)
        );
        assert_eq!(
            modulo(&Value::Int(1), &Value::Float(0.5)),
            Err(OperatorError::ModuloByZero)
        );
        assert_eq!(modulo(&Value::Int(-7), &Value::Int(3)).unwrap(), Value::Int(-1));
        assert_eq!(pow(&Value::Int(2), &Value::Int(-1)).unwrap(), Value::Float(0.5));
    }

    #[test]
    fn numeric_strings_take_part_in_arithmetic() {
        assert_eq!(add(&s("1.5"), &Value::Int(1)).unwrap(), Value::Float(2.5));
        assert_eq!(mul(&s(" 3"), &s("4")).unwrap(), Value::Int(12));
        assert!(matches!(
            add(&s("abc"), &Value::Int(1)),
            Err(OperatorError::UnsupportedOperands { .. })
        ));
    }

    #[test]
    fn array_union_keeps_left_keys() {
        let left: PhpArray = [Value::Int(1), Value::Int(2)].into_iter().collect();
        let right: PhpArray = [Value::Int(9), Value::Int(9), Value::Int(3)]
            .into_iter()
            .collect();
        let Value::Array(result) = add(&Value::from(left), &Value::from(right)).unwrap() else {
            panic!("expected array");
        };
        let values: Vec<_> = result.map.values().cloned().collect();
        assert_eq!(values, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    }

    #[test]
    fn shifts_and_bitwise() {
        assert_eq!(
            shift_left(&Value::Int(1), &Value::Int(-1)),
            Err(OperatorError::NegativeShift)
        );
        assert_eq!(shift_left(&Value::Int(1), &Value::Int(64)).unwrap(), Value::Int(0));
        assert_eq!(shift_right(&Value::Int(-8), &Value::Int(65)).unwrap(), Value::Int(-1));
        assert_eq!(
            bitwise(BitOp::And, &s("12"), &s("10")).unwrap(),
            s("10")
        );
        assert_eq!(
            bitwise(BitOp::Or, &Value::Int(15), &Value::Int(240)).unwrap(),
            Value::Int(255)
        );
        assert_eq!(bitwise_not(&Value::Int(0)).unwrap(), Value::Int(-1));
    }

    #[test]
    fn php8_loose_comparison() {
        assert!(loose_equals(&Value::Int(0), &s("0")));
        assert!(!loose_equals(&Value::Int(0), &s("a")));
        assert!(loose_equals(&s("1"), &s("01")));
        assert!(loose_equals(&s("10"), &s("1e1")));
        assert!(loose_equals(&Value::Int(100), &s("1e2")));
        assert!(!loose_equals(&s("abc"), &Value::Int(0)));
        assert!(loose_equals(&Value::Null, &s("")));
        assert!(!loose_equals(&Value::Null, &s("0")));
        assert!(loose_equals(&Value::Null, &Value::Bool(false)));
        assert!(loose_equals(&s("abc"), &Value::Bool(true)));
        assert!(loose_equals(&s("1"), &s("1 ")));
        assert!(!is_identical(&Value::Int(1), &Value::Float(1.0)));
        assert!(loose_equals(&Value::Int(1), &Value::Float(1.0)));
    }

    #[test]
    fn spaceship_orders_values() {
        assert_eq!(spaceship(&Value::Int(1), &Value::Int(4)), -1);
        assert_eq!(spaceship(&s("b"), &s("a")), 1);
        assert_eq!(spaceship(&Value::Float(2.0), &Value::Int(2)), 0);
        let small: PhpArray = [Value::Int(1)].into_iter().collect();
        let large: PhpArray = [Value::Int(1), Value::Int(2)].into_iter().collect();
        assert_eq!(spaceship(&Value::from(small), &Value::from(large)), -1);
    }

    #[test]
    fn concat_formats_operands() {
        assert_eq!(
            concat(&s("v"), &Value::Float(1.5)).unwrap(),
            s("v1.5")
        );
        assert_eq!(concat(&Value::Bool(true), &Value::Null).unwrap(), s("1"));
    }
}
