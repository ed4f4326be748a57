pub mod ast;
pub mod cache;
pub mod lexer;
pub mod line_index;
pub mod parser;
pub mod span;

pub use span::Span;
