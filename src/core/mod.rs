pub mod operators;
pub mod value;
