//! Stubs embedded in the binary.
//!
//! Each stub file declares the symbols of one extension. Lookups hand back
//! the whole file; the AST locator picks the requested declaration out of
//! it.

use super::{SourceStubber, StubData};
use crate::identifier::{IdentifierKind, normalize_name};
use std::collections::HashMap;

/// `(extension name, source)`.
static STUB_FILES: &[(&str, &str)] = &[
    ("Core", include_str!("stubs/Core.php")),
    ("SPL", include_str!("stubs/SPL.php")),
    ("json", include_str!("stubs/json.php")),
    ("standard", include_str!("stubs/standard.php")),
];

const CORE: usize = 0;
const SPL: usize = 1;
const JSON: usize = 2;
const STANDARD: usize = 3;

static STUB_CLASS_MAP: &[(&str, usize)] = &[
    ("Traversable", CORE),
    ("Iterator", CORE),
    ("IteratorAggregate", CORE),
    ("ArrayAccess", CORE),
    ("Countable", CORE),
    ("Stringable", CORE),
    ("Throwable", CORE),
    ("UnitEnum", CORE),
    ("BackedEnum", CORE),
    ("stdClass", CORE),
    ("Closure", CORE),
    ("Attribute", CORE),
    ("Exception", CORE),
    ("ErrorException", CORE),
    ("Error", CORE),
    ("TypeError", CORE),
    ("ValueError", CORE),
    ("ArithmeticError", CORE),
    ("DivisionByZeroError", CORE),
    ("ArgumentCountError", CORE),
    ("UnhandledMatchError", CORE),
    ("LogicException", SPL),
    ("BadFunctionCallException", SPL),
    ("BadMethodCallException", SPL),
    ("DomainException", SPL),
    ("InvalidArgumentException", SPL),
    ("LengthException", SPL),
    ("OutOfRangeException", SPL),
    ("RuntimeException", SPL),
    ("OutOfBoundsException", SPL),
    ("OverflowException", SPL),
    ("RangeException", SPL),
    ("UnderflowException", SPL),
    ("UnexpectedValueException", SPL),
    ("ArrayIterator", SPL),
    ("SeekableIterator", SPL),
    ("JsonSerializable", JSON),
    ("JsonException", JSON),
];

static STUB_FUNCTION_MAP: &[(&str, usize)] = &[
    ("strlen", CORE),
    ("define", CORE),
    ("defined", CORE),
    ("constant", CORE),
    ("function_exists", CORE),
    ("class_exists", CORE),
    ("interface_exists", CORE),
    ("enum_exists", CORE),
    ("get_class", CORE),
    ("spl_object_id", SPL),
    ("spl_autoload_register", SPL),
    ("json_encode", JSON),
    ("json_decode", JSON),
    ("json_last_error", JSON),
    ("json_last_error_msg", JSON),
    ("count", STANDARD),
    ("in_array", STANDARD),
    ("array_keys", STANDARD),
    ("array_values", STANDARD),
    ("array_map", STANDARD),
    ("array_filter", STANDARD),
    ("array_merge", STANDARD),
    ("implode", STANDARD),
    ("explode", STANDARD),
    ("sprintf", STANDARD),
    ("str_contains", STANDARD),
    ("str_starts_with", STANDARD),
    ("str_replace", STANDARD),
    ("strtolower", STANDARD),
    ("strtoupper", STANDARD),
    ("trim", STANDARD),
    ("var_dump", STANDARD),
    ("print_r", STANDARD),
    ("sort", STANDARD),
    ("usort", STANDARD),
    ("dirname", STANDARD),
    ("file_exists", STANDARD),
    ("is_array", STANDARD),
    ("is_string", STANDARD),
    ("is_int", STANDARD),
];

static STUB_CONSTANT_MAP: &[(&str, usize)] = &[
    ("E_ERROR", CORE),
    ("E_WARNING", CORE),
    ("E_PARSE", CORE),
    ("E_NOTICE", CORE),
    ("E_USER_ERROR", CORE),
    ("E_USER_WARNING", CORE),
    ("E_USER_NOTICE", CORE),
    ("E_DEPRECATED", CORE),
    ("E_USER_DEPRECATED", CORE),
    ("E_ALL", CORE),
    ("PHP_INT_SIZE", CORE),
    ("PHP_INT_MAX", CORE),
    ("PHP_INT_MIN", CORE),
    ("PHP_EOL", CORE),
    ("PHP_VERSION", CORE),
    ("PHP_MAJOR_VERSION", CORE),
    ("PHP_MINOR_VERSION", CORE),
    ("DIRECTORY_SEPARATOR", CORE),
    ("PATH_SEPARATOR", CORE),
    ("JSON_HEX_TAG", JSON),
    ("JSON_HEX_AMP", JSON),
    ("JSON_HEX_APOS", JSON),
    ("JSON_HEX_QUOT", JSON),
    ("JSON_FORCE_OBJECT", JSON),
    ("JSON_NUMERIC_CHECK", JSON),
    ("JSON_UNESCAPED_SLASHES", JSON),
    ("JSON_PRETTY_PRINT", JSON),
    ("JSON_UNESCAPED_UNICODE", JSON),
    ("JSON_PRESERVE_ZERO_FRACTION", JSON),
    ("JSON_OBJECT_AS_ARRAY", JSON),
    ("JSON_BIGINT_AS_STRING", JSON),
    ("JSON_THROW_ON_ERROR", JSON),
    ("JSON_ERROR_NONE", JSON),
    ("COUNT_NORMAL", STANDARD),
    ("COUNT_RECURSIVE", STANDARD),
    ("SORT_REGULAR", STANDARD),
    ("SORT_NUMERIC", STANDARD),
    ("SORT_STRING", STANDARD),
    ("M_PI", STANDARD),
    ("M_E", STANDARD),
    ("PHP_ROUND_HALF_UP", STANDARD),
    ("PHP_ROUND_HALF_DOWN", STANDARD),
];

/// Core interfaces, classes, functions and constants.
pub struct BuiltinStubber {
    classes: HashMap<String, usize>,
    functions: HashMap<String, usize>,
    constants: HashMap<String, usize>,
}

fn build_index(kind: IdentifierKind, map: &[(&str, usize)]) -> HashMap<String, usize> {
    map.iter()
        .map(|&(name, file)| (normalize_name(kind, name), file))
        .collect()
}

impl BuiltinStubber {
    pub fn new() -> Self {
        Self {
            classes: build_index(IdentifierKind::Class, STUB_CLASS_MAP),
            functions: build_index(IdentifierKind::Function, STUB_FUNCTION_MAP),
            constants: build_index(IdentifierKind::Constant, STUB_CONSTANT_MAP),
        }
    }

    fn stub(&self, kind: IdentifierKind, name: &str) -> Option<StubData> {
        let index = match kind {
            IdentifierKind::Class => &self.classes,
            IdentifierKind::Function => &self.functions,
            IdentifierKind::Constant => &self.constants,
        };
        let &file = index.get(&normalize_name(kind, name))?;
        let (extension_name, source) = STUB_FILES[file];
        Some(StubData {
            stub: source.to_string(),
            extension_name: extension_name.to_string(),
        })
    }
}

impl Default for BuiltinStubber {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceStubber for BuiltinStubber {
    fn generate_class_stub(&self, name: &str) -> Option<StubData> {
        self.stub(IdentifierKind::Class, name)
    }

    fn generate_function_stub(&self, name: &str) -> Option<StubData> {
        self.stub(IdentifierKind::Function, name)
    }

    fn generate_constant_stub(&self, name: &str) -> Option<StubData> {
        self.stub(IdentifierKind::Constant, name)
    }

    fn names_of_kind(&self, kind: IdentifierKind) -> Vec<String> {
        let map = match kind {
            IdentifierKind::Class => STUB_CLASS_MAP,
            IdentifierKind::Function => STUB_FUNCTION_MAP,
            IdentifierKind::Constant => STUB_CONSTANT_MAP,
        };
        map.iter().map(|(name, _)| name.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parser::parse;

    #[test]
    fn every_stub_file_parses() {
        for (extension, source) in STUB_FILES {
            let program = parse(source.as_bytes());
            assert!(
                program.errors.is_empty(),
                "{extension}: {}",
                program.errors[0].to_human_readable(source.as_bytes())
            );
        }
    }

    #[test]
    fn class_lookup_is_case_insensitive() {
        let stubber = BuiltinStubber::new();
        let stub = stubber.generate_class_stub("STDCLASS").unwrap();
        assert_eq!(stub.extension_name, "Core");
        assert!(stub.stub.contains("class stdClass"));
        assert_eq!(
            stubber.generate_class_stub("JsonSerializable").unwrap().extension_name,
            "json"
        );
        assert!(stubber.generate_class_stub("NoSuchClass").is_none());
        assert!(stubber.generate_constant_stub("php_eol").is_none());
        assert!(stubber.generate_constant_stub("PHP_EOL").is_some());
    }
}
