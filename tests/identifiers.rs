use php_reflect::identifier::{Identifier, IdentifierKind};

#[test]
fn strips_exactly_one_leading_separator() {
    for kind in [
        IdentifierKind::Class,
        IdentifierKind::Function,
        IdentifierKind::Constant,
    ] {
        assert_eq!(Identifier::new("Foo", kind).unwrap().name(), "Foo");
        assert_eq!(Identifier::new("\\Foo", kind).unwrap().name(), "Foo");
        assert_eq!(
            Identifier::new("\\App\\Models\\User", kind).unwrap().name(),
            "App\\Models\\User"
        );
        assert!(Identifier::new("\\\\Foo", kind).is_err());
    }
}

#[test]
fn rejects_invalid_names() {
    for name in ["", "\\", "123", "Foo-Bar", "Foo\\", "a b", "Foo\\\\Bar", "$x"] {
        let err = Identifier::class(name).unwrap_err();
        assert_eq!(err.name, name);
    }
}

#[test]
fn accepts_underscores_digits_and_multibyte() {
    for name in ["_private", "Foo_2", "Ünïcode", "A\\B_c\\D9"] {
        assert!(Identifier::function(name).is_ok(), "{name}");
    }
}

#[test]
fn class_names_match_case_insensitively_constants_do_not() {
    let class = Identifier::class("App\\User").unwrap();
    assert!(class.matches("app\\user"));

    let constant = Identifier::constant("App\\VERSION").unwrap();
    assert!(constant.matches("app\\VERSION"));
    assert!(!constant.matches("App\\version"));
}

#[test]
fn special_names_skip_validation() {
    assert!(Identifier::wildcard(IdentifierKind::Class).is_wildcard());
    assert!(Identifier::function("{closure}").unwrap().is_closure());
    assert!(
        Identifier::class("class@anonymous/tmp/a.php:3")
            .unwrap()
            .is_anonymous_class()
    );
}
