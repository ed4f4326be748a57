pub mod context;
pub mod error;
pub mod node_to_value;

pub use context::{CompilerContext, ContextSubject};
pub use error::CompileError;
pub use node_to_value::{CompiledValue, NodeToValueCompiler};

use crate::parser::ast::Expr;
use crate::parser::parser::parse_expression;
use crate::reflector::Reflector;

/// Compiles an expression found in the declaration `subject`.
pub fn compile_in(
    expr: &Expr,
    reflector: &Reflector,
    subject: ContextSubject,
) -> Result<CompiledValue, CompileError> {
    NodeToValueCompiler::new(CompilerContext::new(reflector.clone(), subject)).compile(expr)
}

/// Parses and compiles a free-standing expression such as `2 + 2 * 3` in
/// the global namespace.
pub fn compile_expression(source: &str, reflector: &Reflector) -> Result<CompiledValue, CompileError> {
    let expr = parse_expression(source.as_bytes()).map_err(|errors| {
        let reasons: Vec<&str> = errors.iter().map(|err| err.message).collect();
        CompileError::unable(format!(
            "Unable to parse expression \"{source}\": {}",
            reasons.join(", ")
        ))
    })?;
    let context = CompilerContext::global(reflector.clone(), source.as_bytes());
    NodeToValueCompiler::new(context).compile(&expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value::Value;
    use crate::runtime::constants::ConstantTable;
    use crate::runtime::object_factory::NoObjects;
    use crate::source_locator::aggregate::AggregateSourceLocator;
    use std::rc::Rc;

    fn reflector() -> Reflector {
        Reflector::new(
            Rc::new(AggregateSourceLocator::default()),
            Rc::new(ConstantTable::with_core_constants()),
            Rc::new(NoObjects),
        )
    }

    fn eval(source: &str) -> Value {
        match compile_expression(source, &reflector()) {
            Ok(compiled) => compiled.value,
            Err(err) => panic!("{source}: {err}"),
        }
    }

    #[test]
    fn arithmetic_follows_precedence() {
        assert_eq!(eval("2 + 2 * 3"), Value::Int(8));
        assert_eq!(eval("(2 + 2) * 3"), Value::Int(12));
        assert_eq!(eval("4 ** 3"), Value::Int(64));
        assert_eq!(eval("7 / 2"), Value::Float(3.5));
        assert_eq!(eval("6 / 2"), Value::Int(3));
        assert_eq!(eval("-7 % 3"), Value::Int(-1));
        assert_eq!(eval("1 << 3 | 1"), Value::Int(9));
        assert_eq!(eval("PHP_INT_MAX + 1"), Value::Float(9.223_372_036_854_775_808e18));
        assert_eq!(eval("PHP_INT_MIN / -1"), Value::Float(9.223_372_036_854_775_808e18));
        assert_eq!(eval("PHP_INT_MIN % -1"), Value::Int(0));
    }

    #[test]
    fn comparison_and_logic() {
        assert_eq!(eval("1 <=> 4"), Value::Int(-1));
        assert_eq!(eval("true && false"), Value::Bool(false));
        assert_eq!(eval("true xor true"), Value::Bool(false));
        assert_eq!(eval("'1e1' == '10'"), Value::Bool(true));
        assert_eq!(eval("'abc' == 0"), Value::Bool(false));
        assert_eq!(eval("null == false"), Value::Bool(true));
        assert_eq!(eval("1 === 1.0"), Value::Bool(false));
        assert_eq!(eval("5 ?? 4"), Value::Int(5));
        assert_eq!(eval("null ?? 4"), Value::Int(4));
        assert_eq!(eval("0 ?: 'x'"), Value::from("x"));
        assert_eq!(eval("1 ? 'a' : 'b'"), Value::from("a"));
        assert_eq!(eval("false && NOPE"), Value::Bool(false));
        assert_eq!(eval("true or NOPE"), Value::Bool(true));
        assert_eq!(eval("7 ?? NOPE"), Value::Int(7));
    }

    #[test]
    fn logical_operators_short_circuit() {
        // the right side would fail to compile if evaluated
        assert_eq!(eval("false && UNDEFINED_THING"), Value::Bool(false));
        assert_eq!(eval("true || UNDEFINED_THING"), Value::Bool(true));
        assert!(compile_expression("false xor UNDEFINED_THING", &reflector()).is_err());
    }

    #[test]
    fn arrays_and_offsets() {
        let Value::Array(array) = eval("[1, 'a' => 2, 5 => 3, 4, '7' => 5, ...[6, 'a' => 9]]") else {
            panic!("expected array");
        };
        let rendered = Value::Array(array).render();
        assert_eq!(rendered, "[0 => 1, 'a' => 9, 5 => 3, 6 => 4, 7 => 5, 8 => 6]");
        assert_eq!(eval("[1, 2, 3][1]"), Value::Int(2));
        assert_eq!(eval("'abc'[-1]"), Value::from("c"));
        assert_eq!(eval("[1][5] ?? 'none'"), Value::from("none"));
        assert_eq!(eval("'a' . 1 . 2.5"), Value::from("a12.5"));
    }

    #[test]
    fn operator_errors_do_not_compile() {
        for source in ["1 / 0", "1 % 0", "1 << -1", "[] + 1", "~1.5 . [] . ~[]"] {
            let err = compile_expression(source, &reflector()).unwrap_err();
            assert!(matches!(err, CompileError::UnableToCompileNode { .. }), "{source}");
        }
    }

    #[test]
    fn unsupported_nodes_are_rejected() {
        for source in ["$a", "foo()", "$a = 1", "print 1", "fn() => 1"] {
            let err = compile_expression(source, &reflector()).unwrap_err();
            assert!(
                err.to_string().contains("unrecognized node type"),
                "{source}: {err}"
            );
        }
    }

    #[test]
    fn unknown_constant_records_attempted_name() {
        let err = compile_expression("NOPE", &reflector()).unwrap_err();
        assert_eq!(err.constant_name(), Some("NOPE"));
        assert!(err.to_string().contains("global namespace"));
    }

    #[test]
    fn constant_function_reads_process_table() {
        assert_eq!(eval("constant('PHP_EOL')"), Value::from("\n"));
        assert!(compile_expression("constant('NOT_DEFINED_HERE')", &reflector()).is_err());
    }

    #[test]
    fn magic_constants_outside_declarations() {
        assert_eq!(eval("__LINE__"), Value::Int(1));
        assert_eq!(eval("__NAMESPACE__"), Value::from(""));
        assert_eq!(eval("__CLASS__"), Value::from(""));
        let err = compile_expression("__FILE__", &reflector()).unwrap_err();
        assert!(err.to_string().starts_with("No file name for global namespace"));
    }
}
