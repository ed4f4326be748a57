mod common;

use common::{CountingLocator, normalized, project, write_file};
use php_reflect::Configuration;
use php_reflect::identifier::{Identifier, IdentifierKind};
use php_reflect::source_locator::aggregate::AggregateSourceLocator;
use php_reflect::source_locator::evaled::{EvaledCodeRegistry, EvaledCodeSourceLocator};
use php_reflect::source_locator::memoizing::MemoizingSourceLocator;
use php_reflect::source_locator::psr::{Psr0Mapping, Psr4Mapping, PsrAutoloaderMapping};
use php_reflect::source_locator::single_file::SingleFileSourceLocator;
use php_reflect::source_locator::{ComposerError, LocatorError, SourceLocator};
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use std::rc::Rc;

fn class(name: &str) -> Identifier {
    Identifier::class(name).unwrap()
}

fn located_names(locator: &dyn SourceLocator, kind: IdentifierKind) -> Vec<String> {
    locator
        .locate_all_of_kind(kind)
        .unwrap()
        .iter()
        .map(|found| found.name())
        .collect()
}

#[test]
fn missing_identifiers_are_not_found_everywhere() {
    let config = Configuration::default();
    let dir = project(&[("src/A.php", "<?php class A {}")]);
    let locators = vec![
        config.string_source("<?php class Present {}").unwrap(),
        config.directories([dir.path().join("src")]).unwrap(),
        config
            .psr4([("App\\".to_string(), vec![dir.path().join("src")])])
            .unwrap(),
        config.internal_locator(),
    ];
    for locator in &locators {
        for kind in [
            IdentifierKind::Class,
            IdentifierKind::Function,
            IdentifierKind::Constant,
        ] {
            let missing = Identifier::new("Does\\Not\\Exist", kind).unwrap();
            assert!(locator.locate(&missing).unwrap().is_none());
        }
    }

    let reflector = config.reflector_for(locators);
    let err = reflector.reflect_class("Does\\Not\\Exist").unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(
        err.to_string(),
        "Class \"Does\\Not\\Exist\" could not be found in the located source"
    );
}

#[test]
fn aggregate_returns_first_child_match() {
    let config = Configuration::default();
    let first = config
        .string_source("<?php class Shared { const FROM = 'first'; }")
        .unwrap();
    let second = config
        .string_source("<?php class Shared { const FROM = 'second'; }")
        .unwrap();

    for _ in 0..3 {
        let aggregate = AggregateSourceLocator::new(vec![first.clone(), second.clone()]);
        let found = aggregate.locate(&class("Shared")).unwrap().unwrap();
        assert!(found.source.source_text().contains("'first'"));
    }

    let reversed = AggregateSourceLocator::new(vec![second, first]);
    let found = reversed.locate(&class("shared")).unwrap().unwrap();
    assert!(found.source.source_text().contains("'second'"));
    assert_eq!(located_names(&reversed, IdentifierKind::Class), vec!["Shared", "Shared"]);
}

#[test]
fn memoizing_locator_asks_inner_once_per_identifier() {
    let config = Configuration::default();
    let counting = Rc::new(CountingLocator::new(
        config.string_source("<?php function helper() {}").unwrap(),
    ));
    let memoizing = MemoizingSourceLocator::new(counting.clone());

    let helper = Identifier::function("helper").unwrap();
    assert!(memoizing.locate(&helper).unwrap().is_some());
    assert!(memoizing.locate(&Identifier::function("\\HELPER").unwrap()).unwrap().is_some());
    assert_eq!(counting.locate_calls.get(), 1);

    // misses are remembered too
    let missing = Identifier::function("missing").unwrap();
    assert!(memoizing.locate(&missing).unwrap().is_none());
    assert!(memoizing.locate(&missing).unwrap().is_none());
    assert_eq!(counting.locate_calls.get(), 2);
    assert_eq!(memoizing.cached_lookups(), 2);
}

#[test]
fn single_file_reports_normalized_file_name() {
    let dir = project(&[("lib/helpers.php", "<?php\nfunction greet() {}\n")]);
    let path = dir.path().join("lib/helpers.php");
    let config = Configuration::default();
    let reflector = config.reflector_for(vec![config.single_file(&path).unwrap()]);

    let function = reflector.reflect_function("greet").unwrap();
    assert_eq!(function.file_name(), Some(normalized(&path).as_str()));

    let err = config.single_file(dir.path().join("nope.php")).err().unwrap();
    assert!(matches!(err, LocatorError::InvalidFileLocation(_)));
}

#[test]
fn single_file_sees_edits_between_lookups() {
    let dir = project(&[("live.php", "<?php class Before {}")]);
    let path = dir.path().join("live.php");
    let locator =
        SingleFileSourceLocator::new(&path, Configuration::default().ast_locator()).unwrap();
    assert!(locator.locate(&class("Before")).unwrap().is_some());
    assert!(locator.locate(&class("After")).unwrap().is_none());

    write_file(dir.path(), "live.php", "<?php class After {}");
    assert!(locator.locate(&class("After")).unwrap().is_some());
    assert!(locator.locate(&class("Before")).unwrap().is_none());
    assert_eq!(located_names(&locator, IdentifierKind::Class), vec!["After"]);
}

#[test]
fn empty_string_source_is_rejected() {
    let err = Configuration::default().string_source("").err().unwrap();
    assert!(matches!(err, LocatorError::EmptySourceCode));
}

#[test]
fn parse_failures_name_the_file() {
    let dir = project(&[("Broken.php", "<?php class Broken {")]);
    let config = Configuration::default();
    let locator = config.single_file(dir.path().join("Broken.php")).unwrap();
    let err = locator.locate(&class("Broken")).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("Broken.php"), "{message}");
    assert!(matches!(err, LocatorError::ParseToAstFailure { .. }));
}

#[test]
fn directory_scan_order_is_lexicographic() {
    let dir = project(&[
        ("b/Dup.php", "<?php class Dup { const WHERE = 'b'; }"),
        ("a/Dup.php", "<?php class Dup { const WHERE = 'a'; }"),
        ("a/nested/Other.php", "<?php class Other {}"),
        ("a/readme.txt", "<?php class Ignored {}"),
    ]);
    let config = Configuration::default();
    let locator = config.directories([dir.path().to_path_buf()]).unwrap();

    let found = locator.locate(&class("Dup")).unwrap().unwrap();
    assert!(found.source.source_text().contains("'a'"));
    assert_eq!(
        located_names(locator.as_ref(), IdentifierKind::Class),
        vec!["Dup", "Other", "Dup"]
    );
}

#[test]
fn directories_must_exist() {
    let dir = project(&[("file.php", "<?php")]);
    let config = Configuration::default();
    let err = config.directories([dir.path().join("file.php")]).err().unwrap();
    assert!(matches!(err, LocatorError::InvalidDirectory(_)));
}

#[test]
fn psr4_candidate_paths() {
    let mapping = Psr4Mapping::new([
        ("App\\".to_string(), vec![PathBuf::from("/p/src/"), PathBuf::from("/p/lib")]),
        ("App\\Http\\".to_string(), vec![PathBuf::from("/p/http")]),
    ])
    .unwrap();

    let paths: Vec<String> = mapping
        .resolve_possible_file_paths(&class("App\\Http\\Kernel"))
        .iter()
        .map(|path| normalized(path))
        .collect();
    assert_eq!(
        paths,
        vec!["/p/src/Http/Kernel.php", "/p/lib/Http/Kernel.php", "/p/http/Kernel.php"]
    );
    assert!(
        mapping
            .resolve_possible_file_paths(&class("Vendor\\Thing"))
            .is_empty()
    );
}

#[test]
fn psr0_turns_underscores_in_class_names_into_directories() {
    let mapping = Psr0Mapping::new([("Legacy_".to_string(), vec![PathBuf::from("/p/lib")])]).unwrap();
    let paths: Vec<String> = mapping
        .resolve_possible_file_paths(&class("Legacy_Db_Adapter"))
        .iter()
        .map(|path| normalized(path))
        .collect();
    assert_eq!(paths, vec!["/p/lib/Legacy/Db/Adapter.php"]);
}

#[test]
fn psr4_locator_moves_on_when_file_declares_something_else() {
    let dir = project(&[
        ("src/Kernel.php", "<?php namespace App; class NotTheKernel {}"),
        ("src/Model.php", "<?php namespace App; class Model {}"),
    ]);
    let config = Configuration::default();
    let locator = config
        .psr4([("App\\".to_string(), vec![dir.path().join("src")])])
        .unwrap();

    assert!(locator.locate(&class("App\\Kernel")).unwrap().is_none());
    assert!(locator.locate(&class("App\\Model")).unwrap().is_some());
    let mut all = located_names(locator.as_ref(), IdentifierKind::Class);
    all.sort();
    assert_eq!(all, vec!["App\\Model", "App\\NotTheKernel"]);
}

#[test]
fn class_map_serves_only_mapped_classes() {
    let dir = project(&[
        ("legacy/one.php", "<?php class Alpha {} class Beta {} function gamma() {}"),
        ("legacy/two.php", "<?php class Delta {}"),
    ]);
    let config = Configuration::default();
    let locator = config.class_map([
        ("\\Alpha".to_string(), dir.path().join("legacy/one.php")),
        ("Beta".to_string(), dir.path().join("legacy/one.php")),
    ]);

    assert!(locator.locate(&class("alpha")).unwrap().is_some());
    assert!(locator.locate(&class("Delta")).unwrap().is_none());
    assert!(
        locator
            .locate(&Identifier::function("gamma").unwrap())
            .unwrap()
            .is_none()
    );
    assert_eq!(
        located_names(locator.as_ref(), IdentifierKind::Class),
        vec!["Alpha", "Beta"]
    );
}

#[test]
fn empty_psr_mapping_is_invalid() {
    let err = Psr4Mapping::new([("App\\".to_string(), Vec::new())]).unwrap_err();
    assert!(matches!(err, ComposerError::InvalidAutoloadMapping { .. }));
}

#[test]
fn composer_project_combines_all_autoload_sections() {
    let dir = project(&[
        (
            "composer.json",
            r#"{
                "autoload": {
                    "psr-4": { "App\\": "src/" },
                    "psr-0": { "Legacy_": ["legacy/"] },
                    "classmap": ["classes/"],
                    "files": ["bootstrap.php"]
                },
                "autoload-dev": {
                    "psr-4": { "Tests\\": ["tests/"] }
                }
            }"#,
        ),
        ("src/Service.php", "<?php namespace App; class Service {}"),
        ("legacy/Legacy/Mailer.php", "<?php class Legacy_Mailer {}"),
        ("classes/deep/Mapped.php", "<?php class Mapped {}"),
        ("bootstrap.php", "<?php const BOOTED = true; function boot() {}"),
        ("tests/ServiceTest.php", "<?php namespace Tests; class ServiceTest {}"),
    ]);
    let config = Configuration::default();
    let reflector = config.reflector_for(vec![config.composer_project(dir.path()).unwrap()]);

    for name in ["App\\Service", "Legacy_Mailer", "Mapped", "Tests\\ServiceTest"] {
        assert_eq!(reflector.reflect_class(name).unwrap().name(), name);
    }
    assert!(reflector.reflect_function("boot").is_ok());
    assert_eq!(
        reflector.reflect_constant("BOOTED").unwrap().value().unwrap(),
        php_reflect::core::value::Value::Bool(true)
    );
}

#[test]
fn composer_setup_errors() {
    let config = Configuration::default();
    let missing_dir = config.composer_project("/definitely/not/here").err().unwrap();
    assert!(matches!(
        missing_dir,
        LocatorError::Composer(ComposerError::InvalidProjectDirectory(_))
    ));

    let empty = project(&[("README.md", "hi")]);
    let err = config.composer_project(empty.path()).err().unwrap();
    assert!(matches!(err, LocatorError::Composer(ComposerError::MissingComposerJson(_))));

    let broken = project(&[("composer.json", "{ not json")]);
    let err = config.composer_project(broken.path()).err().unwrap();
    assert!(matches!(err, LocatorError::Composer(ComposerError::FailedToParseJson { .. })));
}

#[test]
fn evaled_code_is_located_without_a_file() {
    let config = Configuration::default();
    let registry = Rc::new(EvaledCodeRegistry::new());
    registry.register("class FromEval { const X = __LINE__; }", Some("eval()'d code"));
    let locator: Rc<dyn SourceLocator> =
        Rc::new(EvaledCodeSourceLocator::new(registry, config.ast_locator()));
    let reflector = config.reflector_for(vec![locator]);

    let class = reflector.reflect_class("FromEval").unwrap();
    assert!(class.located_source().is_evaled());
    assert_eq!(class.file_name(), None);
}

#[test]
fn internal_locator_serves_builtin_stubs() {
    let config = Configuration::default();
    let locator = config.internal_locator();

    let found = locator.locate(&class("\\ArrayAccess")).unwrap().unwrap();
    assert!(found.source.is_internal());
    assert_eq!(found.source.extension_name(), Some("Core"));

    let in_array = locator
        .locate(&Identifier::function("in_array").unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(in_array.source.extension_name(), Some("standard"));
}

#[test]
fn locate_all_sees_define_calls_and_skips_non_constant_defines() {
    let dir = project(&[(
        "consts.php",
        "<?php\nnamespace Conf;\nconst A = 1;\ndefine('Conf\\B', 2);\nif (true) { define('C', 3); }\n",
    )]);
    let path = dir.path().join("consts.php");
    let config = Configuration::default();
    let locator = config.single_file(&path).unwrap();
    assert_eq!(
        located_names(locator.as_ref(), IdentifierKind::Constant),
        vec!["Conf\\A", "Conf\\B", "C"]
    );
}
