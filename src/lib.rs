//! Static reflection for PHP source code.
//!
//! Declarations are found by [`source_locator`]s, parsed into an AST and
//! exposed through the [`reflection`] objects a [`Reflector`] hands out.
//! Constant expressions (constant values, property and parameter
//! defaults) are evaluated by the [`compiler`] without executing any PHP.

pub mod compiler;
pub mod configuration;
pub mod core;
pub mod identifier;
pub mod parser;
pub mod reflection;
pub mod reflector;
pub mod runtime;
pub mod source_locator;
pub mod stubber;

pub use configuration::Configuration;
pub use identifier::{Identifier, IdentifierKind};
pub use reflector::{ReflectionError, Reflector};
