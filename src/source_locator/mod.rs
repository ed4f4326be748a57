//! Strategies that find the declaration of a symbol.
//!
//! Every locator answers two questions: where is the one declaration of
//! this identifier, and which declarations of this kind can it see. Not
//! finding a symbol is `Ok(None)`; errors are reserved for environment and
//! input problems.

pub mod aggregate;
pub mod ast;
pub mod class_map;
pub mod closure;
pub mod composer;
pub mod declaration;
pub mod directories;
pub mod error;
pub mod evaled;
pub mod file_helper;
pub mod file_iterator;
pub mod internal;
pub mod located_source;
pub mod memoizing;
pub mod psr;
pub mod single_file;
pub mod string_source;

pub use declaration::{ConstantDeclaration, Declaration, LocatedDeclaration};
pub use error::{ComposerError, LocatorError};
pub use located_source::LocatedSource;

use crate::identifier::{Identifier, IdentifierKind};

pub trait SourceLocator {
    fn locate(&self, identifier: &Identifier) -> Result<Option<LocatedDeclaration>, LocatorError>;

    /// Recomputed on every call.
    fn locate_all_of_kind(
        &self,
        kind: IdentifierKind,
    ) -> Result<Vec<LocatedDeclaration>, LocatorError>;
}
