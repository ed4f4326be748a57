use crate::core::value::Value;
use indexmap::IndexMap;
use std::cell::RefCell;

/// Constants defined in the live process, consulted before any declaration
/// found in source.
pub trait DefinedConstants {
    fn get(&self, name: &str) -> Option<Value>;

    fn is_defined(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// Constant table owned by the host.
///
/// Names are stored as given. A lookup matches the exact name first, then
/// retries with the namespace part compared case-insensitively.
#[derive(Debug, Default)]
pub struct ConstantTable {
    constants: RefCell<IndexMap<String, Value>>,
}

impl ConstantTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table preloaded with the core constants every PHP process defines.
    pub fn with_core_constants() -> Self {
        let table = Self::new();
        table.register_core_constants();
        table
    }

    /// Registers core PHP constants:
    /// - PHP version info (PHP_VERSION, PHP_VERSION_ID, etc.)
    /// - System constants (PHP_OS, PHP_OS_FAMILY, PHP_EOL)
    /// - Integer and float limits
    /// - Path separators (DIRECTORY_SEPARATOR, PATH_SEPARATOR)
    /// - Error reporting levels (E_ERROR, E_WARNING, etc.)
    /// - Math constants (M_PI, M_E, ...)
    fn register_core_constants(&self) {
        const PHP_VERSION_STR: &str = "8.3.0";
        const PHP_VERSION_ID_VALUE: i64 = 80300;

        self.insert("PHP_VERSION", Value::from(PHP_VERSION_STR));
        self.insert("PHP_VERSION_ID", Value::Int(PHP_VERSION_ID_VALUE));
        self.insert("PHP_MAJOR_VERSION", Value::Int(8));
        self.insert("PHP_MINOR_VERSION", Value::Int(3));
        self.insert("PHP_RELEASE_VERSION", Value::Int(0));
        self.insert("PHP_EXTRA_VERSION", Value::from(""));

        let (os, family) = if cfg!(windows) {
            ("WINNT", "Windows")
        } else if cfg!(target_os = "macos") {
            ("Darwin", "Darwin")
        } else {
            ("Linux", "Linux")
        };
        self.insert("PHP_OS", Value::from(os));
        self.insert("PHP_OS_FAMILY", Value::from(family));
        self.insert("PHP_SAPI", Value::from("cli"));
        self.insert("PHP_EOL", Value::from(if cfg!(windows) { "\r\n" } else { "\n" }));

        self.insert("PHP_INT_MAX", Value::Int(i64::MAX));
        self.insert("PHP_INT_MIN", Value::Int(i64::MIN));
        self.insert("PHP_INT_SIZE", Value::Int(8));
        self.insert("PHP_FLOAT_EPSILON", Value::Float(f64::EPSILON));
        self.insert("PHP_FLOAT_MAX", Value::Float(f64::MAX));
        self.insert("PHP_FLOAT_MIN", Value::Float(f64::MIN_POSITIVE));
        self.insert("PHP_FLOAT_DIG", Value::Int(15));
        self.insert("NAN", Value::Float(f64::NAN));
        self.insert("INF", Value::Float(f64::INFINITY));

        self.insert(
            "DIRECTORY_SEPARATOR",
            Value::from(std::path::MAIN_SEPARATOR.to_string()),
        );
        self.insert("PATH_SEPARATOR", Value::from(if cfg!(windows) { ";" } else { ":" }));

        for (name, level) in [
            ("E_ERROR", 1),
            ("E_WARNING", 2),
            ("E_PARSE", 4),
            ("E_NOTICE", 8),
            ("E_CORE_ERROR", 16),
            ("E_CORE_WARNING", 32),
            ("E_COMPILE_ERROR", 64),
            ("E_COMPILE_WARNING", 128),
            ("E_USER_ERROR", 256),
            ("E_USER_WARNING", 512),
            ("E_USER_NOTICE", 1024),
            ("E_STRICT", 2048),
            ("E_RECOVERABLE_ERROR", 4096),
            ("E_DEPRECATED", 8192),
            ("E_USER_DEPRECATED", 16384),
            ("E_ALL", 32767),
        ] {
            self.insert(name, Value::Int(level));
        }

        for (name, value) in [
            ("M_PI", std::f64::consts::PI),
            ("M_E", std::f64::consts::E),
            ("M_LN2", std::f64::consts::LN_2),
            ("M_LN10", std::f64::consts::LN_10),
            ("M_SQRT2", std::f64::consts::SQRT_2),
            ("M_PI_2", std::f64::consts::FRAC_PI_2),
            ("M_PI_4", std::f64::consts::FRAC_PI_4),
        ] {
            self.insert(name, Value::Float(value));
        }

        self.insert("SORT_REGULAR", Value::Int(0));
        self.insert("SORT_NUMERIC", Value::Int(1));
        self.insert("SORT_STRING", Value::Int(2));
        self.insert("COUNT_RECURSIVE", Value::Int(1));
        self.insert("JSON_THROW_ON_ERROR", Value::Int(4_194_304));
        self.insert("JSON_PRETTY_PRINT", Value::Int(128));
        self.insert("JSON_UNESCAPED_SLASHES", Value::Int(64));
        self.insert("JSON_UNESCAPED_UNICODE", Value::Int(256));
    }

    fn insert(&self, name: &str, value: Value) {
        self.constants.borrow_mut().insert(name.to_string(), value);
    }

    /// `define()` semantics: an existing constant is never overwritten.
    pub fn define(&self, name: &str, value: Value) -> bool {
        let name = name.strip_prefix('\\').unwrap_or(name);
        if self.is_defined(name) {
            tracing::warn!(constant = name, "Constant already defined");
            return false;
        }
        self.insert(name, value);
        true
    }

    pub fn len(&self) -> usize {
        self.constants.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.constants.borrow().is_empty()
    }
}

impl DefinedConstants for ConstantTable {
    fn get(&self, name: &str) -> Option<Value> {
        let name = name.strip_prefix('\\').unwrap_or(name);
        let constants = self.constants.borrow();
        if let Some(value) = constants.get(name) {
            return Some(value.clone());
        }

        let (namespace, short) = name.rsplit_once('\\')?;
        constants
            .iter()
            .find(|(candidate, _)| match candidate.rsplit_once('\\') {
                Some((ns, s)) => s == short && ns.eq_ignore_ascii_case(namespace),
                None => false,
            })
            .map(|(_, value)| value.clone())
    }
}

/// Process with nothing defined at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDefinedConstants;

impl DefinedConstants for NoDefinedConstants {
    fn get(&self, _name: &str) -> Option<Value> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_constants_are_present() {
        let table = ConstantTable::with_core_constants();
        assert_eq!(table.get("PHP_INT_MAX"), Some(Value::Int(i64::MAX)));
        assert_eq!(table.get("\\E_ALL"), Some(Value::Int(32767)));
        assert!(table.get("php_int_max").is_none());
    }

    #[test]
    fn define_does_not_overwrite() {
        let table = ConstantTable::new();
        assert!(table.define("App\\Config\\DEBUG", Value::Bool(true)));
        assert!(!table.define("App\\Config\\DEBUG", Value::Bool(false)));
        assert_eq!(table.get("app\\config\\DEBUG"), Some(Value::Bool(true)));
        assert!(table.get("App\\Config\\debug").is_none());
    }
}
