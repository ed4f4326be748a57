mod common;

use common::{project, reflector_for, string};
use php_reflect::Configuration;
use php_reflect::core::value::Value;
use php_reflect::parser::ast::{ClassKind, Visibility};
use php_reflect::reflection::FunctionReflection;
use php_reflect::reflector::ReflectionError;
use php_reflect::source_locator::LocatorError;
use pretty_assertions::assert_eq;

const SHOP: &str = r#"<?php
namespace Shop;

use Countable;

interface Priced
{
    const CURRENCY = 'EUR';

    public function price(): int;
}

trait Labelled
{
    protected string $label = 'item';

    public function label(): string { return $this->label; }
}

/**
 * Something on a shelf.
 */
abstract class Product implements Priced, Countable
{
    use Labelled;

    private const SECRET = 1;
    final public const KIND = 'product';

    public static int $created = 0;
    private $hidden;

    public function __construct(
        protected readonly int $cents = 0,
        public ?string $sku = null,
    ) {}

    abstract public function price(): int;

    public function count(): int { return 1; }

    private function internalOnly() {}
}

final class Book extends Product
{
    public $pages = 100;

    public function price(): int
    {
        return $this->cents;
    }

    public static function make(int $cents, string ...$tags): static
    {
        return new static($cents);
    }
}
"#;

#[test]
fn class_basics() {
    let reflector = reflector_for(SHOP);
    let book = reflector.reflect_class("shop\\book").unwrap();

    assert_eq!(book.name(), "Shop\\Book");
    assert_eq!(book.short_name(), "Book");
    assert_eq!(book.namespace_name(), "Shop");
    assert!(book.in_namespace());
    assert_eq!(book.kind(), ClassKind::Class);
    assert!(book.is_final());
    assert!(!book.is_abstract());
    assert!(!book.is_internal());
    assert_eq!(book.file_name(), None);
    assert_eq!(book.parent_class_name().as_deref(), Some("Shop\\Product"));

    let product = book.parent_class().unwrap().unwrap();
    assert!(product.is_abstract());
    assert_eq!(product.doc_comment().as_deref(), Some("/**\n * Something on a shelf.\n */"));
    assert_eq!(product.start_line(), 23);
    assert_eq!(product.trait_names(), vec!["Shop\\Labelled"]);
}

#[test]
fn interfaces_and_subclassing() {
    let reflector = reflector_for(SHOP);
    let book = reflector.reflect_class("Shop\\Book").unwrap();

    assert_eq!(
        book.interface_names().unwrap(),
        vec!["Shop\\Priced", "Countable"]
    );
    assert!(book.implements_interface("\\countable").unwrap());
    assert!(book.is_subclass_of("Shop\\Product").unwrap());
    assert!(book.is_subclass_of("Shop\\Priced").unwrap());
    assert!(!book.is_subclass_of("Shop\\Book").unwrap());

    let priced = reflector.reflect_class("Shop\\Priced").unwrap();
    assert!(priced.is_interface());
    let countable = reflector.reflect_class("Countable").unwrap();
    assert!(countable.is_internal());
    assert_eq!(countable.extension_name(), Some("Core"));
}

#[test]
fn constants_include_inherited_and_interface_ones() {
    let book = reflector_for(SHOP).reflect_class("Shop\\Book").unwrap();
    let names: Vec<String> = book.constants().unwrap().into_keys().collect();
    assert_eq!(names, vec!["KIND", "CURRENCY"]);

    let kind = book.constant("KIND").unwrap().unwrap();
    assert!(kind.is_final());
    assert!(kind.is_public());
    assert_eq!(kind.declaring_class().name(), "Shop\\Product");
    assert_eq!(kind.value().unwrap(), string("product"));

    let currency = book.constant("CURRENCY").unwrap().unwrap();
    assert!(currency.is_interface_constant());
    assert!(!book.has_constant("SECRET").unwrap());
}

#[test]
fn properties() {
    let reflector = reflector_for(SHOP);
    let book = reflector.reflect_class("Shop\\Book").unwrap();
    let names: Vec<String> = book.properties().unwrap().into_keys().collect();
    assert_eq!(names, vec!["pages", "created", "cents", "sku", "label"]);

    let pages = book.property("pages").unwrap().unwrap();
    assert!(pages.has_default_value());
    assert_eq!(pages.default_value().unwrap(), Value::Int(100));

    let created = book.property("created").unwrap().unwrap();
    assert!(created.is_static());
    assert_eq!(created.type_declaration().map(ToString::to_string).as_deref(), Some("int"));

    let cents = book.property("cents").unwrap().unwrap();
    assert!(cents.is_promoted());
    assert!(cents.is_readonly());
    assert_eq!(cents.visibility(), Visibility::Protected);
    assert!(!cents.has_default_value());

    let product = reflector.reflect_class("Shop\\Product").unwrap();
    let hidden = product.property("hidden").unwrap().unwrap();
    assert!(hidden.has_default_value());
    assert_eq!(hidden.default_value().unwrap(), Value::Null);
}

#[test]
fn methods() {
    let reflector = reflector_for(SHOP);
    let book = reflector.reflect_class("Shop\\Book").unwrap();
    let names: Vec<String> = book.methods().unwrap().into_keys().collect();
    assert_eq!(
        names,
        vec!["price", "make", "__construct", "count", "label"]
    );

    let make = book.method("MAKE").unwrap().unwrap();
    assert!(make.is_static());
    assert!(make.is_public());
    let make = FunctionReflection::from(make);
    assert_eq!(make.return_type().map(ToString::to_string).as_deref(), Some("static"));
    assert!(make.is_variadic());
    assert_eq!(make.number_of_parameters(), 2);
    assert_eq!(make.number_of_required_parameters(), 1);
    assert_eq!(
        make.body_source().map(|body| body.trim().to_string()).as_deref(),
        Some("return new static($cents);")
    );

    let constructor = book.method("__construct").unwrap().unwrap();
    assert!(constructor.is_constructor());
    assert_eq!(constructor.declaring_class().name(), "Shop\\Product");

    let priced = reflector.reflect_class("Shop\\Priced").unwrap();
    let abstract_price = priced.method("price").unwrap().unwrap();
    assert!(abstract_price.is_abstract());
    assert_eq!(FunctionReflection::from(abstract_price).body_source(), None);

    let product = reflector.reflect_class("Shop\\Product").unwrap();
    assert!(product.method("internalOnly").unwrap().unwrap().is_private());
    assert!(!book.has_method("internalOnly").unwrap());
}

#[test]
fn parameters() {
    let code = r#"<?php
namespace Util;

const DEFAULT_LIMIT = 10;

class Base {}

class Paginator extends Base
{
    const PER_PAGE = 20;

    public function page(
        self $source,
        parent $base,
        int &$total,
        $limit = DEFAULT_LIMIT,
        $size = self::PER_PAGE,
        $kind = self::class,
        ?int $offset = null,
        \Countable|array $items = [],
        string ...$rest
    ) {}
}
"#;
    let class = reflector_for(code).reflect_class("Util\\Paginator").unwrap();
    let page = class.method("page").unwrap().unwrap();
    let params = page.parameters();
    assert_eq!(params.len(), 9);

    let source = &params[0];
    assert_eq!(source.name(), "source");
    assert_eq!(source.position(), 0);
    assert!(!source.is_optional());
    assert_eq!(source.class_name().as_deref(), Some("Util\\Paginator"));
    assert_eq!(params[1].class_name().as_deref(), Some("Util\\Base"));

    let total = &params[2];
    assert!(total.is_passed_by_reference());
    assert!(!total.allows_null());
    assert_eq!(total.class_name(), None);

    let limit = &params[3];
    assert!(limit.is_optional());
    assert!(limit.is_default_value_constant());
    assert_eq!(limit.default_value().unwrap(), Value::Int(10));
    assert_eq!(
        limit.default_value_constant_name().unwrap().as_deref(),
        Some("Util\\DEFAULT_LIMIT")
    );

    let size = &params[4];
    assert_eq!(size.default_value().unwrap(), Value::Int(20));
    assert_eq!(
        size.default_value_constant_name().unwrap().as_deref(),
        Some("Util\\Paginator::PER_PAGE")
    );

    let kind = &params[5];
    assert!(!kind.is_default_value_constant());
    assert_eq!(kind.default_value_constant_name().unwrap(), None);
    assert_eq!(kind.default_value().unwrap(), string("Util\\Paginator"));

    let offset = &params[6];
    assert!(offset.allows_null());
    assert_eq!(offset.default_value().unwrap(), Value::Null);

    let items = &params[7];
    assert_eq!(
        items.type_declaration().map(ToString::to_string).as_deref(),
        Some("Countable|array")
    );
    assert_eq!(items.default_value().unwrap().render(), "[]");

    let rest = &params[8];
    assert!(rest.is_variadic());
    assert!(rest.is_optional());
    assert!(!rest.is_default_value_available());
    assert_eq!(rest.declaring_class().map(|class| class.name()).as_deref(), Some("Util\\Paginator"));
}

#[test]
fn promoted_parameters() {
    let reflector = reflector_for(SHOP);
    let product = reflector.reflect_class("Shop\\Product").unwrap();
    let constructor = product.method("__construct").unwrap().unwrap();
    let params = constructor.parameters();
    assert!(params.iter().all(|param| param.is_promoted()));
    assert!(params[1].allows_null());
    assert_eq!(params[0].default_value().unwrap(), Value::Int(0));
}

#[test]
fn functions() {
    let code = r#"<?php
namespace Text;

/** Shout it. */
function &shout(string $text, bool $loud = true): string
{
    return strtoupper($text) . ($loud ? '!' : '');
}
"#;
    let reflector = reflector_for(code);
    let function = reflector.reflect_function("TEXT\\SHOUT").unwrap();
    assert_eq!(function.name(), "Text\\shout");
    assert_eq!(function.short_name(), "shout");
    assert_eq!(function.namespace_name(), "Text");
    assert!(!function.is_closure());
    assert!(function.parameter("loud").is_some());

    let err = function.arrow_body().unwrap_err();
    assert!(matches!(err, ReflectionError::InvalidArrowFunctionBodyNode(_)));

    let function = FunctionReflection::from(function);
    assert_eq!(function.doc_comment().as_deref(), Some("/** Shout it. */"));
    assert!(function.returns_reference());
    assert_eq!((function.start_line(), function.end_line()), (5, 8));
    assert_eq!(function.number_of_required_parameters(), 1);
    assert_eq!(
        function.body_source().map(|body| body.trim().to_string()).as_deref(),
        Some("return strtoupper($text) . ($loud ? '!' : '');")
    );
    assert!(function.class().is_none());
}

#[test]
fn internal_functions_come_from_stubs() {
    let reflector = reflector_for("<?php");
    let function = reflector.reflect_function("in_array").unwrap();
    assert!(function.is_internal());
    assert_eq!(function.file_name(), None);
    assert!(function.parameters().len() >= 2);
}

#[test]
fn closures_by_line() {
    let dir = project(&[(
        "closures.php",
        "<?php\nnamespace App;\n\n$double = fn(int $x = 2) => $x * 2;\n$greet = static function (string $name) use ($double) {\n    return \"hi $name\";\n};\n",
    )]);
    let path = dir.path().join("closures.php");
    let config = Configuration::default();

    let arrow = config
        .reflector_for(vec![config.closure_in_file(&path, 4).unwrap()])
        .reflect_closure()
        .unwrap();
    assert!(arrow.is_closure());
    assert_eq!(arrow.namespace_name(), "App");
    assert_eq!(arrow.file_name().map(str::to_string), Some(common::normalized(&path)));
    assert_eq!(arrow.parameters()[0].default_value().unwrap(), Value::Int(2));
    let body = arrow.arrow_body().unwrap();
    assert_eq!(body.kind_name(), "Expr_BinaryOp");

    let closure = config
        .reflector_for(vec![config.closure_in_file(&path, 5).unwrap()])
        .reflect_closure()
        .unwrap();
    assert_eq!(
        FunctionReflection::from(closure.clone())
            .body_source()
            .map(|body| body.trim().to_string())
            .as_deref(),
        Some("return \"hi $name\";")
    );
    assert!(closure.arrow_body().is_err());

    let nothing = config.reflector_for(vec![config.closure_in_file(&path, 2).unwrap()]);
    assert!(nothing.reflect_closure().unwrap_err().is_not_found());
}

#[test]
fn two_closures_on_one_line_are_ambiguous() {
    let config = Configuration::default();
    let locator = config
        .closure_in_string("<?php $a = fn() => 1; $b = fn() => 2;", 1)
        .unwrap();
    let err = config.reflector(locator).reflect_closure().unwrap_err();
    assert!(matches!(
        err,
        ReflectionError::Locator(LocatorError::TwoClosuresOnSameLine { line: 1, .. })
    ));
}

#[test]
fn constants_declared_both_ways() {
    let code = r#"<?php
namespace Config;

/** Max retries. */
const RETRIES = 3;

define('Config\TIMEOUT', RETRIES * 10);
"#;
    let reflector = reflector_for(code);

    let retries = reflector.reflect_constant("config\\RETRIES").unwrap();
    assert_eq!(retries.name(), "Config\\RETRIES");
    assert_eq!(retries.short_name(), "RETRIES");
    assert_eq!(retries.namespace_name(), "Config");
    assert!(!retries.is_defined_by_define());
    assert_eq!(retries.doc_comment().as_deref(), Some("/** Max retries. */"));
    assert_eq!(retries.start_line(), 5);

    let timeout = reflector.reflect_constant("Config\\TIMEOUT").unwrap();
    assert!(timeout.is_defined_by_define());
    assert_eq!(timeout.value().unwrap(), Value::Int(30));
    assert_eq!(timeout.start_line(), 7);

    // short names of constants are case-sensitive
    assert!(reflector.reflect_constant("Config\\timeout").unwrap_err().is_not_found());

    let all: Vec<String> = reflector
        .reflect_all_constants()
        .unwrap()
        .iter()
        .filter(|constant| !constant.is_internal())
        .map(|constant| constant.name().to_string())
        .collect();
    assert_eq!(all, vec!["Config\\RETRIES", "Config\\TIMEOUT"]);
}

#[test]
fn enums() {
    let code = "<?php\nenum Status: int implements JsonSerializable {\n    case Active = 1;\n    case Off = 0;\n    public function jsonSerialize(): mixed { return $this->value; }\n}\n";
    let status = reflector_for(code).reflect_class("Status").unwrap();
    assert!(status.is_enum());
    assert!(status.is_final());
    assert_eq!(status.backing_type().as_deref(), Some("int"));
    let cases: Vec<String> = status.cases().iter().map(|case| case.name().to_string()).collect();
    assert_eq!(cases, vec!["Active", "Off"]);
    assert_eq!(
        status.interface_names().unwrap(),
        vec!["JsonSerializable", "UnitEnum", "BackedEnum"]
    );
    assert_eq!(status.case("Off").unwrap().start_line(), 4);
}

#[test]
fn anonymous_classes_are_named_by_file_and_line() {
    let dir = project(&[("anon.php", "<?php\n\n$handler = new class {\n    const ID = 7;\n};\n")]);
    let path = dir.path().join("anon.php");
    let config = Configuration::default();
    let reflector = config.reflector_for(vec![config.single_file(&path).unwrap()]);

    let name = format!("class@anonymous{}:3", common::normalized(&path));
    let class = reflector.reflect_class(&name).unwrap();
    assert!(class.is_anonymous());
    assert_eq!(class.constant("ID").unwrap().unwrap().value().unwrap(), Value::Int(7));
}
