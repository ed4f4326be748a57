use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Name used to request every declaration of a kind.
pub const WILDCARD: &str = "*";
/// Name of every closure.
pub const CLOSURE_NAME: &str = "{closure}";
/// Prefix of synthetic anonymous class names.
pub const ANONYMOUS_CLASS_PREFIX: &str = "class@anonymous";

lazy_static! {
    static ref VALID_NAME: Regex = Regex::new(
        r"^[A-Za-z_\x{80}-\x{10FFFF}][A-Za-z0-9_\x{80}-\x{10FFFF}]*(\\[A-Za-z_\x{80}-\x{10FFFF}][A-Za-z0-9_\x{80}-\x{10FFFF}]*)*$"
    )
    .expect("identifier pattern is valid");
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid identifier name \"{name}\"")]
pub struct InvalidIdentifierName {
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IdentifierKind {
    Class,
    Function,
    Constant,
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IdentifierKind::Class => "Class",
            IdentifierKind::Function => "Function",
            IdentifierKind::Constant => "Constant",
        })
    }
}

/// Kind and validated name of a symbol to locate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    name: String,
    kind: IdentifierKind,
}

impl Identifier {
    /// Strips one leading `\` and validates the rest.
    pub fn new(name: &str, kind: IdentifierKind) -> Result<Self, InvalidIdentifierName> {
        if name == WILDCARD || name == CLOSURE_NAME || name.starts_with(ANONYMOUS_CLASS_PREFIX) {
            return Ok(Self {
                name: name.to_string(),
                kind,
            });
        }

        let stripped = name.strip_prefix('\\').unwrap_or(name);
        if !VALID_NAME.is_match(stripped) {
            return Err(InvalidIdentifierName {
                name: name.to_string(),
            });
        }

        Ok(Self {
            name: stripped.to_string(),
            kind,
        })
    }

    pub fn class(name: &str) -> Result<Self, InvalidIdentifierName> {
        Self::new(name, IdentifierKind::Class)
    }

    pub fn function(name: &str) -> Result<Self, InvalidIdentifierName> {
        Self::new(name, IdentifierKind::Function)
    }

    pub fn constant(name: &str) -> Result<Self, InvalidIdentifierName> {
        Self::new(name, IdentifierKind::Constant)
    }

    pub fn wildcard(kind: IdentifierKind) -> Self {
        Self {
            name: WILDCARD.to_string(),
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> IdentifierKind {
        self.kind
    }

    pub fn is_class(&self) -> bool {
        self.kind == IdentifierKind::Class
    }

    pub fn is_function(&self) -> bool {
        self.kind == IdentifierKind::Function
    }

    pub fn is_constant(&self) -> bool {
        self.kind == IdentifierKind::Constant
    }

    pub fn is_wildcard(&self) -> bool {
        self.name == WILDCARD
    }

    pub fn is_closure(&self) -> bool {
        self.name == CLOSURE_NAME
    }

    pub fn is_anonymous_class(&self) -> bool {
        self.name.starts_with(ANONYMOUS_CLASS_PREFIX)
    }

    /// Whether a declared name is the symbol this identifier asks for.
    pub fn matches(&self, declared: &str) -> bool {
        if self.is_wildcard() {
            return true;
        }
        names_match(self.kind, &self.name, declared)
    }

    /// Key under which lookups of this identifier are memoized. Two
    /// identifiers share a key exactly when they name the same symbol.
    pub fn cache_key(&self) -> (IdentifierKind, String) {
        (self.kind, normalize_name(self.kind, &self.name))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} \"{}\"", self.kind, self.name)
    }
}

/// Classes and functions compare case-insensitively. Constants compare the
/// namespace case-insensitively and the short name exactly.
pub fn names_match(kind: IdentifierKind, a: &str, b: &str) -> bool {
    let a = a.strip_prefix('\\').unwrap_or(a);
    let b = b.strip_prefix('\\').unwrap_or(b);
    match kind {
        IdentifierKind::Class | IdentifierKind::Function => a.eq_ignore_ascii_case(b),
        IdentifierKind::Constant => {
            let (ns_a, short_a) = split_name(a);
            let (ns_b, short_b) = split_name(b);
            short_a == short_b && ns_a.eq_ignore_ascii_case(ns_b)
        }
    }
}

pub fn normalize_name(kind: IdentifierKind, name: &str) -> String {
    let name = name.strip_prefix('\\').unwrap_or(name);
    match kind {
        IdentifierKind::Class | IdentifierKind::Function => name.to_ascii_lowercase(),
        IdentifierKind::Constant => match name.rsplit_once('\\') {
            Some((ns, short)) => format!("{}\\{short}", ns.to_ascii_lowercase()),
            None => name.to_string(),
        },
    }
}

/// `(namespace, short name)`; the namespace is empty for global names.
pub fn split_name(name: &str) -> (&str, &str) {
    match name.rsplit_once('\\') {
        Some((ns, short)) => (ns, short),
        None => ("", name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_exactly_one_leading_separator() {
        let id = Identifier::class("\\Foo\\Bar").unwrap();
        assert_eq!(id.name(), "Foo\\Bar");
        assert!(Identifier::class("\\\\Foo").is_err());
    }

    #[test]
    fn rejects_invalid_names() {
        for name in ["", "\\", "123", "Foo\\", "Foo\\\\Bar", "1Foo", "Foo-Bar", "Foo\\1Bar", "a b"] {
            assert!(
                Identifier::new(name, IdentifierKind::Class).is_err(),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn accepts_reserved_forms() {
        assert!(Identifier::class("*").unwrap().is_wildcard());
        assert!(Identifier::function("{closure}").unwrap().is_closure());
        assert!(
            Identifier::class("class@anonymous/src/a.php:3")
                .unwrap()
                .is_anonymous_class()
        );
        assert!(Identifier::class("Ünïcode_Näme").is_ok());
    }

    #[test]
    fn constant_names_compare_short_name_exactly() {
        let id = Identifier::constant("App\\FOO").unwrap();
        assert!(id.matches("app\\FOO"));
        assert!(!id.matches("App\\foo"));
        let class = Identifier::class("App\\Foo").unwrap();
        assert!(class.matches("APP\\FOO"));
        assert_eq!(
            Identifier::constant("app\\FOO").unwrap().cache_key(),
            id.cache_key()
        );
    }
}
