//! Source text for symbols that have no project file.

pub mod builtin;

pub use builtin::BuiltinStubber;

use crate::identifier::IdentifierKind;
use indexmap::IndexSet;
use std::rc::Rc;

/// Printable source declaring a symbol, plus the extension it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubData {
    pub stub: String,
    pub extension_name: String,
}

pub trait SourceStubber {
    fn generate_class_stub(&self, name: &str) -> Option<StubData>;

    fn generate_function_stub(&self, name: &str) -> Option<StubData>;

    fn generate_constant_stub(&self, name: &str) -> Option<StubData>;

    /// Every name this stubber can produce a stub for.
    fn names_of_kind(&self, kind: IdentifierKind) -> Vec<String>;
}

/// Asks each stubber in turn; the first answer wins.
#[derive(Clone, Default)]
pub struct AggregateSourceStubber {
    stubbers: Vec<Rc<dyn SourceStubber>>,
}

impl AggregateSourceStubber {
    pub fn new(stubbers: Vec<Rc<dyn SourceStubber>>) -> Self {
        Self { stubbers }
    }

    fn first(&self, generate: impl Fn(&dyn SourceStubber) -> Option<StubData>) -> Option<StubData> {
        self.stubbers
            .iter()
            .find_map(|stubber| generate(stubber.as_ref()))
    }
}

impl SourceStubber for AggregateSourceStubber {
    fn generate_class_stub(&self, name: &str) -> Option<StubData> {
        self.first(|stubber| stubber.generate_class_stub(name))
    }

    fn generate_function_stub(&self, name: &str) -> Option<StubData> {
        self.first(|stubber| stubber.generate_function_stub(name))
    }

    fn generate_constant_stub(&self, name: &str) -> Option<StubData> {
        self.first(|stubber| stubber.generate_constant_stub(name))
    }

    fn names_of_kind(&self, kind: IdentifierKind) -> Vec<String> {
        let names: IndexSet<String> = self
            .stubbers
            .iter()
            .flat_map(|stubber| stubber.names_of_kind(kind))
            .collect();
        names.into_iter().collect()
    }
}
