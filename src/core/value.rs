use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// Array key after PHP key coercion.
/// Reference: $PHP_SRC_PATH/Zend/zend_hash.h - zend_hash_key
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub enum ArrayKey {
    Int(i64),
    Str(Rc<Vec<u8>>),
}

impl ArrayKey {
    /// Coerces a value used as an array key. Arrays and objects are illegal
    /// offsets and yield `None`.
    /// Reference: $PHP_SRC_PATH/Zend/zend_execute.c - zend_fetch_dimension_address_inner
    pub fn from_value(value: &Value) -> Option<ArrayKey> {
        match value {
            Value::Null => Some(ArrayKey::Str(Rc::new(Vec::new()))),
            Value::Bool(b) => Some(ArrayKey::Int(*b as i64)),
            Value::Int(i) => Some(ArrayKey::Int(*i)),
            Value::Float(f) => Some(ArrayKey::Int(float_to_int(*f))),
            Value::String(s) => Some(ArrayKey::from_bytes(s)),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Canonical decimal integer strings become integer keys, `"08"` and
    /// `"-0"` stay strings.
    /// Reference: $PHP_SRC_PATH/Zend/zend_hash.c - _zend_handle_numeric_str_ex
    pub fn from_bytes(bytes: &[u8]) -> ArrayKey {
        if is_canonical_int(bytes)
            && let Ok(text) = std::str::from_utf8(bytes)
            && let Ok(i) = text.parse::<i64>()
        {
            return ArrayKey::Int(i);
        }
        ArrayKey::Str(Rc::new(bytes.to_vec()))
    }

    pub fn to_value(&self) -> Value {
        match self {
            ArrayKey::Int(i) => Value::Int(*i),
            ArrayKey::Str(s) => Value::String(s.clone()),
        }
    }
}

fn is_canonical_int(bytes: &[u8]) -> bool {
    let digits = bytes.strip_prefix(b"-").unwrap_or(bytes);
    match digits {
        [] => false,
        [b'0'] => bytes.len() == 1,
        [first, rest @ ..] => {
            (b'1'..=b'9').contains(first) && rest.iter().all(u8::is_ascii_digit)
        }
    }
}

impl fmt::Display for ArrayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayKey::Int(i) => write!(f, "{i}"),
            ArrayKey::Str(s) => f.write_str(&String::from_utf8_lossy(s)),
        }
    }
}

/// Ordered PHP array with the cached next free integer key.
/// Reference: $PHP_SRC_PATH/Zend/zend_hash.h - HashTable::nNextFreeElement
#[derive(Debug, Clone, Default)]
pub struct PhpArray {
    pub map: IndexMap<ArrayKey, Value>,
    pub next_free: i64,
}

impl PhpArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn get(&self, key: &ArrayKey) -> Option<&Value> {
        self.map.get(key)
    }

    /// Insert or overwrite, keeping the position of an existing key.
    /// Reference: $PHP_SRC_PATH/Zend/zend_hash.c - _zend_hash_index_add_or_update_i
    pub fn insert(&mut self, key: ArrayKey, value: Value) {
        if let ArrayKey::Int(i) = key
            && i >= self.next_free
        {
            self.next_free = i.saturating_add(1);
        }
        self.map.insert(key, value);
    }

    /// Append with the next integer key. Fails once the key space is used up.
    pub fn push(&mut self, value: Value) -> bool {
        if self.next_free == i64::MAX && self.map.contains_key(&ArrayKey::Int(i64::MAX)) {
            return false;
        }
        let key = ArrayKey::Int(self.next_free);
        self.next_free = self.next_free.saturating_add(1);
        self.map.insert(key, value);
        true
    }

    /// True when keys are exactly `0..len` in order.
    pub fn is_list(&self) -> bool {
        self.map
            .keys()
            .enumerate()
            .all(|(i, key)| matches!(key, ArrayKey::Int(k) if *k == i as i64))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ArrayKey, &Value)> {
        self.map.iter()
    }
}

impl PartialEq for PhpArray {
    fn eq(&self, other: &Self) -> bool {
        // next_free is cached metadata
        self.map == other.map
    }
}

impl FromIterator<Value> for PhpArray {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        let mut array = PhpArray::new();
        for value in iter {
            array.push(value);
        }
        array
    }
}

/// Object produced by a constant expression.
#[derive(Clone)]
pub enum ObjectHandle {
    /// Enum case, compared by identity of `class::case`.
    EnumCase {
        class: String,
        case: String,
        value: Option<Box<Value>>,
    },
    /// Instance created by the host object factory.
    Host { class: String, payload: Rc<dyn Any> },
}

impl ObjectHandle {
    pub fn class_name(&self) -> &str {
        match self {
            ObjectHandle::EnumCase { class, .. } | ObjectHandle::Host { class, .. } => class,
        }
    }

    pub fn same_instance(&self, other: &ObjectHandle) -> bool {
        match (self, other) {
            (
                ObjectHandle::EnumCase { class: a, case: x, .. },
                ObjectHandle::EnumCase { class: b, case: y, .. },
            ) => a.eq_ignore_ascii_case(b) && x == y,
            (ObjectHandle::Host { payload: a, .. }, ObjectHandle::Host { payload: b, .. }) => {
                Rc::ptr_eq(a, b)
            }
            _ => false,
        }
    }
}

impl fmt::Debug for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectHandle::EnumCase { class, case, value } => f
                .debug_struct("EnumCase")
                .field("class", class)
                .field("case", case)
                .field("value", value)
                .finish(),
            ObjectHandle::Host { class, .. } => {
                f.debug_struct("Host").field("class", class).finish_non_exhaustive()
            }
        }
    }
}

impl PartialEq for ObjectHandle {
    fn eq(&self, other: &Self) -> bool {
        self.same_instance(other)
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(Rc<Vec<u8>>), // PHP strings are byte arrays
    Array(Rc<PhpArray>),
    Object(ObjectHandle),
}

/// Structural equality, used by tests and by `===` on scalars.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Rc::new(s.as_bytes().to_vec()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Rc::new(s.into_bytes()))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<PhpArray> for Value {
    fn from(array: PhpArray) -> Self {
        Value::Array(Rc::new(array))
    }
}

/// Number extracted from a value for arithmetic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn to_float(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Number::Int(i) => Value::Int(i),
            Number::Float(f) => Value::Float(f),
        }
    }
}

/// How much of a string is numeric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericPrefix {
    /// Whole string is numeric (surrounding whitespace allowed).
    Numeric(Number),
    /// Leading numeric part followed by garbage, e.g. `"5 apples"`.
    Leading(Number),
    None,
}

/// Reference: $PHP_SRC_PATH/Zend/zend_operators.c - _is_numeric_string_ex
pub fn parse_numeric_prefix(bytes: &[u8]) -> NumericPrefix {
    let is_ws = |b: &u8| matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0b' | b'\x0c');
    let start = bytes.iter().take_while(|b| is_ws(b)).count();
    let mut pos = start;

    if matches!(bytes.get(pos), Some(b'+' | b'-')) {
        pos += 1;
    }
    let int_digits = bytes[pos..].iter().take_while(|b| b.is_ascii_digit()).count();
    pos += int_digits;

    let mut is_float = false;
    let mut frac_digits = 0;
    if bytes.get(pos) == Some(&b'.') {
        frac_digits = bytes[pos + 1..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if int_digits > 0 || frac_digits > 0 {
            is_float = true;
            pos += 1 + frac_digits;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return NumericPrefix::None;
    }

    if matches!(bytes.get(pos), Some(b'e' | b'E')) {
        let mut exp_pos = pos + 1;
        if matches!(bytes.get(exp_pos), Some(b'+' | b'-')) {
            exp_pos += 1;
        }
        let exp_digits = bytes[exp_pos.min(bytes.len())..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if exp_digits > 0 {
            is_float = true;
            pos = exp_pos + exp_digits;
        }
    }

    let text = String::from_utf8_lossy(&bytes[start..pos]);
    let number = if is_float {
        Number::Float(text.parse().unwrap_or(0.0))
    } else {
        match text.parse::<i64>() {
            Ok(i) => Number::Int(i),
            Err(_) => Number::Float(text.parse().unwrap_or(0.0)),
        }
    };

    let trailing = &bytes[pos..];
    if trailing.iter().all(is_ws) {
        NumericPrefix::Numeric(number)
    } else {
        NumericPrefix::Leading(number)
    }
}

/// Float to int conversion; out-of-range and non-finite values become 0
/// as on 64-bit PHP 8.
/// Reference: $PHP_SRC_PATH/Zend/zend_operators.h - zend_dval_to_lval
pub fn float_to_int(f: f64) -> i64 {
    if !f.is_finite() || f >= 9.223_372_036_854_775_808e18 || f < -9.223_372_036_854_775_808e18 {
        0
    } else {
        f as i64
    }
}

/// Formats a float the way `(string)` does with `precision=14`.
/// Reference: $PHP_SRC_PATH/main/snprintf.c - php_gcvt
pub fn float_to_string(f: f64) -> String {
    const PRECISION: i32 = 14;

    if f.is_nan() {
        return "NAN".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "INF" } else { "-INF" }.to_string();
    }
    if f == 0.0 {
        return if f.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let formatted = format!("{:.*e}", (PRECISION - 1) as usize, f.abs());
    let (mantissa, exponent) = formatted.split_once('e').unwrap_or((&formatted, "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let digits = digits.trim_end_matches('0');
    let sign = if f < 0.0 { "-" } else { "" };

    if exponent < -4 || exponent >= PRECISION {
        let (first, rest) = digits.split_at(1);
        let rest = if rest.is_empty() { "0" } else { rest };
        let exp_sign = if exponent < 0 { '-' } else { '+' };
        return format!("{sign}{first}.{rest}E{exp_sign}{}", exponent.abs());
    }

    let mut out = String::from(sign);
    if exponent < 0 {
        out.push_str("0.");
        for _ in 0..(-exponent - 1) {
            out.push('0');
        }
        out.push_str(digits);
    } else {
        let int_len = exponent as usize + 1;
        if digits.len() <= int_len {
            out.push_str(digits);
            for _ in digits.len()..int_len {
                out.push('0');
            }
        } else {
            out.push_str(&digits[..int_len]);
            out.push('.');
            out.push_str(&digits[int_len..]);
        }
    }
    out
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Type name as used in operator error messages, objects use their class.
    pub fn operand_type_name(&self) -> String {
        match self {
            Value::Object(handle) => handle.class_name().to_string(),
            other => other.type_name().to_string(),
        }
    }

    pub fn string(bytes: impl Into<Vec<u8>>) -> Value {
        Value::String(Rc::new(bytes.into()))
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Reference: $PHP_SRC_PATH/Zend/zend_operators.c - zend_is_true
    pub fn to_bool(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !(s.is_empty() || s.as_slice() == b"0"),
            Value::Array(arr) => !arr.is_empty(),
            Value::Object(_) => true,
        }
    }

    /// Reference: $PHP_SRC_PATH/Zend/zend_operators.c - zendi_smart_str / zval_get_string
    ///
    /// Objects have no string form here; callers report the conversion error.
    pub fn to_php_string(&self) -> Option<Vec<u8>> {
        match self {
            Value::Null => Some(Vec::new()),
            Value::Bool(true) => Some(b"1".to_vec()),
            Value::Bool(false) => Some(Vec::new()),
            Value::Int(i) => Some(i.to_string().into_bytes()),
            Value::Float(f) => Some(float_to_string(*f).into_bytes()),
            Value::String(s) => Some(s.to_vec()),
            Value::Array(_) => Some(b"Array".to_vec()),
            Value::Object(_) => None,
        }
    }

    /// Reference: $PHP_SRC_PATH/Zend/zend_operators.c - zval_get_long
    pub fn to_int(&self) -> i64 {
        match self {
            Value::Null => 0,
            Value::Bool(b) => *b as i64,
            Value::Int(i) => *i,
            Value::Float(f) => float_to_int(*f),
            Value::String(s) => match parse_numeric_prefix(s) {
                NumericPrefix::Numeric(Number::Int(i)) | NumericPrefix::Leading(Number::Int(i)) => i,
                NumericPrefix::Numeric(Number::Float(f))
                | NumericPrefix::Leading(Number::Float(f)) => float_to_int(f),
                NumericPrefix::None => 0,
            },
            Value::Array(arr) => !arr.is_empty() as i64,
            Value::Object(_) => 1,
        }
    }

    /// Reference: $PHP_SRC_PATH/Zend/zend_operators.c - zval_get_double
    pub fn to_float(&self) -> f64 {
        match self {
            Value::Float(f) => *f,
            Value::String(s) => match parse_numeric_prefix(s) {
                NumericPrefix::Numeric(n) | NumericPrefix::Leading(n) => n.to_float(),
                NumericPrefix::None => 0.0,
            },
            other => other.to_int() as f64,
        }
    }

    /// Human readable rendering used by the command line front end.
    pub fn render(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => float_to_string(*f),
            Value::String(s) => format!("'{}'", String::from_utf8_lossy(s)),
            Value::Array(arr) => {
                let items: Vec<String> = arr
                    .iter()
                    .map(|(k, v)| match k {
                        ArrayKey::Int(i) => format!("{i} => {}", v.render()),
                        ArrayKey::Str(_) => format!("'{k}' => {}", v.render()),
                    })
                    .collect();
                format!("[{}]", items.join(", "))
            }
            Value::Object(ObjectHandle::EnumCase { class, case, .. }) => format!("{class}::{case}"),
            Value::Object(ObjectHandle::Host { class, .. }) => format!("object({class})"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(&String::from_utf8_lossy(s)),
            Value::Array(arr) if arr.is_list() => {
                let mut seq = serializer.serialize_seq(Some(arr.len()))?;
                for value in arr.map.values() {
                    seq.serialize_element(value)?;
                }
                seq.end()
            }
            Value::Array(arr) => {
                let mut map = serializer.serialize_map(Some(arr.len()))?;
                for (key, value) in arr.iter() {
                    map.serialize_entry(&key.to_string(), value)?;
                }
                map.end()
            }
            Value::Object(_) => serializer.serialize_str(&self.render()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_string_keys_become_integers() {
        assert_eq!(ArrayKey::from_bytes(b"42"), ArrayKey::Int(42));
        assert_eq!(ArrayKey::from_bytes(b"-7"), ArrayKey::Int(-7));
        assert!(matches!(ArrayKey::from_bytes(b"08"), ArrayKey::Str(_)));
        assert!(matches!(ArrayKey::from_bytes(b"-0"), ArrayKey::Str(_)));
        assert!(matches!(ArrayKey::from_bytes(b"1.5"), ArrayKey::Str(_)));
        assert!(matches!(
            ArrayKey::from_bytes(b"9223372036854775808"),
            ArrayKey::Str(_)
        ));
        assert_eq!(ArrayKey::from_value(&Value::Float(2.9)), Some(ArrayKey::Int(2)));
        assert_eq!(ArrayKey::from_value(&Value::Bool(true)), Some(ArrayKey::Int(1)));
        assert_eq!(
            ArrayKey::from_value(&Value::Null),
            Some(ArrayKey::Str(Rc::new(Vec::new())))
        );
    }

    #[test]
    fn push_continues_after_largest_integer_key() {
        let mut array = PhpArray::new();
        array.insert(ArrayKey::Int(5), Value::Int(1));
        array.push(Value::Int(2));
        array.insert(ArrayKey::Int(-3), Value::Int(3));
        array.push(Value::Int(4));
        let keys: Vec<_> = array.map.keys().cloned().collect();
        assert_eq!(
            keys,
            vec![
                ArrayKey::Int(5),
                ArrayKey::Int(6),
                ArrayKey::Int(-3),
                ArrayKey::Int(7)
            ]
        );
    }

    #[test]
    fn formats_floats_like_php() {
        assert_eq!(float_to_string(1.0), "1");
        assert_eq!(float_to_string(0.1 + 0.2), "0.3");
        assert_eq!(float_to_string(-2.5), "-2.5");
        assert_eq!(float_to_string(1e15), "1.0E+15");
        assert_eq!(float_to_string(1.5e-7), "1.5E-7");
        assert_eq!(float_to_string(0.0001), "0.0001");
        assert_eq!(float_to_string(123456.789), "123456.789");
        assert_eq!(float_to_string(f64::INFINITY), "INF");
    }

    #[test]
    fn parses_numeric_prefixes() {
        assert_eq!(
            parse_numeric_prefix(b" 12 "),
            NumericPrefix::Numeric(Number::Int(12))
        );
        assert_eq!(
            parse_numeric_prefix(b"1e3"),
            NumericPrefix::Numeric(Number::Float(1000.0))
        );
        assert_eq!(
            parse_numeric_prefix(b"5 apples"),
            NumericPrefix::Leading(Number::Int(5))
        );
        assert_eq!(parse_numeric_prefix(b"abc"), NumericPrefix::None);
        assert_eq!(parse_numeric_prefix(b"."), NumericPrefix::None);
    }
}
