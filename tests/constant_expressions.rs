mod common;

use common::{bare_reflector_for, constant_value, normalized, project, reflector_for, string};
use php_reflect::Configuration;
use php_reflect::compiler::{CompileError, compile_expression};
use php_reflect::core::value::{ObjectHandle, Value};
use php_reflect::reflector::ReflectionError;
use php_reflect::runtime::constants::ConstantTable;
use php_reflect::runtime::object_factory::{Argument, ObjectRegistry};
use pretty_assertions::assert_eq;
use std::any::Any;
use std::rc::Rc;

fn compile_error(err: ReflectionError) -> CompileError {
    match err {
        ReflectionError::Compile(inner) => inner,
        other => panic!("expected a compile error, got {other:?}"),
    }
}

#[test]
fn class_constants_resolve_in_any_declaration_order() {
    let code = r#"<?php
class Time {
    const HOUR = 60 * self::MINUTE;
    const MINUTE = 60 * self::SECOND;
    const SECOND = 1;
}
class ReversedTime {
    const SECOND = 1;
    const MINUTE = 60 * self::SECOND;
    const HOUR = 60 * self::MINUTE;
}
"#;
    let reflector = reflector_for(code);
    for class in ["Time", "ReversedTime"] {
        let class = reflector.reflect_class(class).unwrap();
        let hour = class.constant("HOUR").unwrap().unwrap();
        assert_eq!(hour.value().unwrap(), Value::Int(3600));
    }
}

#[test]
fn parent_constant_from_subclass_property_default() {
    let code = r#"<?php
class Foo { const BAR = 'baz'; }
class Sub extends Foo { public $inherited = parent::BAR; public $own = self::BAR . '!'; }
"#;
    let class = reflector_for(code).reflect_class("Sub").unwrap();
    let inherited = class.property("inherited").unwrap().unwrap();
    assert_eq!(inherited.default_value().unwrap(), string("baz"));
    let own = class.property("own").unwrap().unwrap();
    assert_eq!(own.default_value().unwrap(), string("baz!"));
}

#[test]
fn class_name_constants() {
    let code = r#"<?php
namespace Zoo;
class Animal {}
class Foo extends Animal {
    public $me = static::class;
    public $parent = parent::class;
    public $other = \Other\Thing::class;
    const SELF_NAME = self::class;
}
"#;
    let class = reflector_for(code).reflect_class("Zoo\\Foo").unwrap();
    let default = |name: &str| class.property(name).unwrap().unwrap().default_value().unwrap();
    assert_eq!(default("me"), string("Zoo\\Foo"));
    assert_eq!(default("parent"), string("Zoo\\Animal"));
    assert_eq!(default("other"), string("Other\\Thing"));
    assert_eq!(
        class.constant("SELF_NAME").unwrap().unwrap().value().unwrap(),
        string("Zoo\\Foo")
    );
}

#[test]
fn parent_without_parent_class_fails() {
    let code = "<?php\nclass Lonely {\n    const X = parent::Y;\n}\n";
    let class = reflector_for(code).reflect_class("Lonely").unwrap();
    let err = compile_error(class.constant("X").unwrap().unwrap().value().unwrap_err());
    assert_eq!(
        err.to_string(),
        "Cannot use \"parent\" when class Lonely has no parent in class Lonely (line 3)"
    );
}

#[test]
fn file_magic_constants_need_a_file() {
    let code = "<?php\n\nfunction where($file = __FILE__, $dir = __DIR__) {}\n";
    let function = reflector_for(code).reflect_function("where").unwrap();
    for param in function.parameters() {
        let err = compile_error(param.default_value().unwrap_err());
        assert_eq!(err.to_string(), "No file name for function where() (line 3)");
    }
}

#[test]
fn file_magic_constants_with_a_real_file() {
    let dir = project(&[(
        "src/paths.php",
        "<?php\nconst HERE = __FILE__;\nconst THERE = __DIR__;\nconst LINE = __LINE__;\n",
    )]);
    let path = dir.path().join("src/paths.php");
    let config = Configuration::default();
    let reflector = config.reflector_for(vec![config.single_file(&path).unwrap()]);

    let value = |name: &str| reflector.reflect_constant(name).unwrap().value().unwrap();
    assert_eq!(value("HERE"), string(&normalized(&path)));
    assert_eq!(value("THERE"), string(&normalized(&dir.path().join("src"))));
    assert_eq!(value("LINE"), Value::Int(4));
}

#[test]
fn method_magic_constants() {
    let code = r#"<?php
namespace Shop;
trait Greets {}
class Cart {
    public function add($where = __METHOD__, $fn = __FUNCTION__, $class = __CLASS__, $ns = __NAMESPACE__) {}
}
"#;
    let class = reflector_for(code).reflect_class("Shop\\Cart").unwrap();
    let method = class.method("add").unwrap().unwrap();
    let defaults: Vec<Value> = method
        .parameters()
        .iter()
        .map(|param| param.default_value().unwrap())
        .collect();
    assert_eq!(
        defaults,
        vec![
            string("Shop\\Cart::add"),
            string("add"),
            string("Shop\\Cart"),
            string("Shop"),
        ]
    );
}

#[test]
fn trait_members_bind_to_the_using_class() {
    let code = r#"<?php
namespace N;
trait T {
    public $tx = self::A;
    public $tc = __CLASS__;
    public $tt = __TRAIT__;
    public function tm($q = static::A, $m = __METHOD__, $k = self::class) {}
}
class U {
    use T;
    const A = 'u';
}
"#;
    let class = reflector_for(code).reflect_class("N\\U").unwrap();
    let property = |name: &str| class.property(name).unwrap().unwrap();

    assert_eq!(property("tx").default_value().unwrap(), string("u"));
    assert_eq!(property("tc").default_value().unwrap(), string("N\\U"));
    assert_eq!(property("tt").default_value().unwrap(), string("N\\T"));
    assert_eq!(property("tx").declaring_class().name(), "N\\U");
    assert_eq!(property("tx").lexical_class().name(), "N\\T");
    assert_eq!(property("tx").start_line(), 4);

    let method = class.method("tm").unwrap().unwrap();
    assert_eq!(method.declaring_class().name(), "N\\U");
    let defaults: Vec<Value> = method
        .parameters()
        .iter()
        .map(|param| param.default_value().unwrap())
        .collect();
    assert_eq!(defaults, vec![string("u"), string("N\\T::tm"), string("N\\U")]);

    let in_trait = reflector_for(code).reflect_class("N\\T").unwrap();
    let err = in_trait.property("tx").unwrap().unwrap().default_value().unwrap_err();
    assert!(err.to_string().contains("N\\T::A"), "{err}");
}

#[test]
fn yield_is_not_a_constant_expression() {
    let reflector = bare_reflector_for("<?php");
    let err = compile_expression("yield 1", &reflector).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("unrecognized node type Expr_Yield"), "{message}");
}

#[test]
fn cyclic_class_constants_are_reported() {
    let code = "<?php class Loop { const A = self::B; const B = self::A; }";
    let class = reflector_for(code).reflect_class("Loop").unwrap();
    let err = compile_error(class.constant("A").unwrap().unwrap().value().unwrap_err());
    match err {
        CompileError::CyclicConstantReference { chain } => {
            assert_eq!(chain, vec!["Loop::A", "Loop::B", "Loop::A"]);
        }
        other => panic!("expected a cycle, got {other}"),
    }
}

#[test]
fn cycles_across_classes_keep_declared_names() {
    let code = "<?php class Pay { const X = Quote::Y; } class Quote { const Y = pay::X; }";
    let class = reflector_for(code).reflect_class("Pay").unwrap();
    let err = compile_error(class.constant("X").unwrap().unwrap().value().unwrap_err());
    assert_eq!(
        err.to_string(),
        "Cyclic constant reference: Pay::X -> Quote::Y -> Pay::X"
    );
}

#[test]
fn cyclic_global_constants_are_reported() {
    let reflector = reflector_for("<?php const PING = PONG; const PONG = PING;");
    let err = compile_error(reflector.reflect_constant("PING").unwrap().value().unwrap_err());
    assert!(matches!(err, CompileError::CyclicConstantReference { .. }));
    assert!(err.to_string().contains("PING -> PONG -> PING"), "{err}");
}

#[test]
fn enum_cases_and_backing_values() {
    let code = r#"<?php
enum Suit: string {
    case Hearts = 'H';
    case Spades = 'S';
    const Wild = self::Spades;
    const Code = self::Hearts->value;
    const Label = self::Hearts->name;
}
enum Pure { case One; }
"#;
    let reflector = reflector_for(code);
    let suit = reflector.reflect_class("Suit").unwrap();

    let wild = suit.constant("Wild").unwrap().unwrap().value().unwrap();
    match &wild {
        Value::Object(ObjectHandle::EnumCase { class, case, value }) => {
            assert_eq!(class, "Suit");
            assert_eq!(case, "Spades");
            assert_eq!(value.as_deref(), Some(&string("S")));
        }
        other => panic!("expected enum case, got {other:?}"),
    }
    assert_eq!(wild.render(), "Suit::Spades");
    assert_eq!(suit.constant("Code").unwrap().unwrap().value().unwrap(), string("H"));
    assert_eq!(suit.constant("Label").unwrap().unwrap().value().unwrap(), string("Hearts"));

    let hearts = suit.case("Hearts").unwrap();
    assert_eq!(hearts.backing_value().unwrap(), Some(string("H")));

    let pure = reflector.reflect_class("Pure").unwrap();
    assert_eq!(pure.case("One").unwrap().backing_value().unwrap(), None);
    assert!(suit.implements_interface("BackedEnum").unwrap());
}

#[test]
fn new_goes_through_the_object_factory() {
    let code = r#"<?php
function pay($amount = new Money(5, currency: 'EUR')) {}
"#;
    let registry = Rc::new(ObjectRegistry::new());
    registry.register(
        "Money",
        Rc::new(|args: &[Argument]| -> Result<Rc<dyn Any>, String> {
            let named: Vec<Option<String>> = args.iter().map(|arg| arg.name.clone()).collect();
            Ok(Rc::new(named))
        }),
    );
    let config = Configuration::default().with_object_factory(registry);
    let reflector = config.reflector_for(vec![config.string_source(code).unwrap()]);

    let param = reflector.reflect_function("pay").unwrap().parameters().remove(0);
    let value = param.default_value().unwrap();
    let Value::Object(ObjectHandle::Host { class, payload }) = &value else {
        panic!("expected host object, got {value:?}");
    };
    assert_eq!(class, "Money");
    let named = payload.downcast_ref::<Vec<Option<String>>>().unwrap();
    assert_eq!(named, &vec![None, Some("currency".to_string())]);

    let unloaded = reflector_for(code).reflect_function("pay").unwrap().parameters().remove(0);
    let err = compile_error(unloaded.default_value().unwrap_err());
    assert_eq!(err.class_name(), Some("Money"));
    assert!(err.to_string().contains("is not loaded"), "{err}");
}

#[test]
fn namespaced_constant_is_preferred_over_global() {
    let code = r#"<?php
namespace App {
    const LIMIT = 'namespaced';
    function limited($limit = LIMIT, $only = ONLY_GLOBAL) {}
}
namespace {
    const LIMIT = 'global';
    const ONLY_GLOBAL = 'fallback';
}
"#;
    let function = reflector_for(code).reflect_function("App\\limited").unwrap();
    let params = function.parameters();
    assert_eq!(params[0].default_value().unwrap(), string("namespaced"));
    assert_eq!(
        params[0].default_value_constant_name().unwrap().as_deref(),
        Some("App\\LIMIT")
    );
    assert_eq!(params[1].default_value().unwrap(), string("fallback"));
    assert_eq!(
        params[1].default_value_constant_name().unwrap().as_deref(),
        Some("ONLY_GLOBAL")
    );
}

#[test]
fn process_constants_win_over_declarations() {
    let table = Rc::new(ConstantTable::new());
    assert!(table.define("LIMIT", Value::Int(99)));
    let config = Configuration::default().with_constants(table);
    let reflector = config
        .reflector_for(vec![config.string_source("<?php const LIMIT = 1; const USES = LIMIT * 2;").unwrap()]);

    assert_eq!(reflector.reflect_constant("USES").unwrap().value().unwrap(), Value::Int(198));
    assert_eq!(reflector.reflect_constant("LIMIT").unwrap().value().unwrap(), Value::Int(1));
}

#[test]
fn core_constants_come_from_the_process_table() {
    assert_eq!(
        constant_value("<?php const LEVEL = E_ALL & ~E_NOTICE;", "LEVEL"),
        Value::Int(32767 & !8)
    );
    assert_eq!(
        constant_value("<?php const BIG = PHP_INT_MAX;", "BIG"),
        Value::Int(i64::MAX)
    );
}

#[test]
fn missing_class_constant_records_names() {
    let reflector = reflector_for("<?php\nclass Foo {}\nconst X = Foo::MISSING;\n");
    let err = compile_error(reflector.reflect_constant("X").unwrap().value().unwrap_err());
    assert_eq!(err.constant_name(), Some("Foo::MISSING"));
    assert_eq!(err.class_name(), Some("Foo"));
    assert_eq!(
        err.to_string(),
        "Could not locate constant Foo::MISSING while evaluating expression in global namespace (line 3)"
    );
}

#[test]
fn missing_global_constant_records_the_global_name() {
    let reflector = reflector_for("<?php\nnamespace App;\nconst X = NOWHERE;\n");
    let err = compile_error(reflector.reflect_constant("App\\X").unwrap().value().unwrap_err());
    assert_eq!(err.constant_name(), Some("NOWHERE"));
    assert_eq!(
        err.to_string(),
        "Could not locate constant \"NOWHERE\" while evaluating expression in namespace App (line 3)"
    );
}

#[test]
fn missing_class_is_not_found() {
    let reflector = reflector_for("<?php const X = Nope::A;");
    let err = compile_error(reflector.reflect_constant("X").unwrap().value().unwrap_err());
    match err {
        CompileError::Reflection(inner) => assert!(inner.is_not_found()),
        other => panic!("expected a not-found error, got {other}"),
    }
}

#[test]
fn interface_constants_are_visible_to_implementors() {
    let code = r#"<?php
interface HasVersion { const VERSION = '1.' . self::MINOR; const MINOR = 2; }
class Release implements HasVersion { const TAG = 'v' . self::VERSION; }
"#;
    let release = reflector_for(code).reflect_class("Release").unwrap();
    assert_eq!(
        release.constant("TAG").unwrap().unwrap().value().unwrap(),
        string("v1.2")
    );
    let names: Vec<String> = release.constants().unwrap().into_keys().collect();
    assert_eq!(names, vec!["TAG", "VERSION", "MINOR"]);
}
