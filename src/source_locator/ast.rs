use super::declaration::{
    ConstantDeclaration, Declaration, LocatedDeclaration, is_define_call,
    parse_anonymous_class_name,
};
use super::error::LocatorError;
use super::located_source::LocatedSource;
use crate::identifier::{Identifier, IdentifierKind, normalize_name};
use crate::parser::ast::{FunctionDecl, Program, Stmt, StmtId};
use crate::parser::cache::PhpParser;
use indexmap::IndexMap;
use std::rc::Rc;

/// Finds declarations inside one located source.
#[derive(Clone)]
pub struct AstLocator {
    parser: Rc<dyn PhpParser>,
}

impl AstLocator {
    pub fn new(parser: Rc<dyn PhpParser>) -> Self {
        Self { parser }
    }

    pub fn parser(&self) -> &Rc<dyn PhpParser> {
        &self.parser
    }

    /// First declaration in `source` that `identifier` names.
    pub fn find_declaration(
        &self,
        source: Rc<LocatedSource>,
        identifier: &Identifier,
    ) -> Result<Option<LocatedDeclaration>, LocatorError> {
        if identifier.is_anonymous_class() {
            return self.find_anonymous_class(source, identifier);
        }
        if identifier.is_closure() {
            return Ok(None);
        }

        let found = self
            .find_declarations_of_kind(source, identifier.kind())?
            .into_iter()
            .find(|located| identifier.matches(&located.name()));
        Ok(found)
    }

    /// Every declaration of `kind` in `source`, deduplicated by name. The
    /// first declaration of a name wins.
    pub fn find_declarations_of_kind(
        &self,
        source: Rc<LocatedSource>,
        kind: IdentifierKind,
    ) -> Result<Vec<LocatedDeclaration>, LocatorError> {
        let Some(program) = self.parse(&source)? else {
            return Ok(Vec::new());
        };

        let mut declarations = Vec::new();
        collect(&program.statements, source.source(), "", kind, &mut declarations);

        let mut unique: IndexMap<String, LocatedDeclaration> = IndexMap::new();
        for declaration in declarations {
            let located = LocatedDeclaration {
                source: source.clone(),
                program: program.clone(),
                declaration,
            };
            unique
                .entry(normalize_name(kind, &located.name()))
                .or_insert(located);
        }

        tracing::trace!(
            file = source.file_name().unwrap_or("<string>"),
            kind = %kind,
            count = unique.len(),
            "collected declarations"
        );
        Ok(unique.into_values().collect())
    }

    fn find_anonymous_class(
        &self,
        source: Rc<LocatedSource>,
        identifier: &Identifier,
    ) -> Result<Option<LocatedDeclaration>, LocatorError> {
        let Some((file, line)) = parse_anonymous_class_name(identifier.name()) else {
            return Ok(None);
        };
        if !file.is_empty() && source.file_name().is_some_and(|name| name != file) {
            return Ok(None);
        }
        let Some(program) = self.parse(&source)? else {
            return Ok(None);
        };

        let found = program
            .anonymous_classes
            .iter()
            .find(|decl| program.line_index.start_line(decl.span) == line)
            .cloned();
        Ok(found.map(|decl| LocatedDeclaration {
            source: source.clone(),
            program: program.clone(),
            declaration: Declaration::Class(decl),
        }))
    }

    /// The closure or arrow function starting on `line`.
    pub fn find_closure(
        &self,
        source: Rc<LocatedSource>,
        line: usize,
    ) -> Result<Option<LocatedDeclaration>, LocatorError> {
        let Some(program) = self.parse(&source)? else {
            return Ok(None);
        };
        let on_line: Vec<Rc<FunctionDecl>> = program
            .closures
            .iter()
            .filter(|decl| program.line_index.start_line(decl.span) == line)
            .cloned()
            .collect();
        match on_line.as_slice() {
            [] => Ok(None),
            [decl] => Ok(Some(LocatedDeclaration {
                source: source.clone(),
                program: program.clone(),
                declaration: Declaration::Function(decl.clone()),
            })),
            _ => Err(LocatorError::TwoClosuresOnSameLine {
                context: source.file_name().unwrap_or("<string>").to_string(),
                line,
            }),
        }
    }

    /// `None` for a source with no code at all.
    fn parse(&self, source: &LocatedSource) -> Result<Option<Rc<Program>>, LocatorError> {
        if source.source().iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        let program = self.parser.parse(source.source()).map_err(|failure| {
            LocatorError::parse_failure(
                source.file_name(),
                source.source(),
                failure.describe(source.source(), source.file_name()),
            )
        })?;
        Ok(Some(program))
    }
}

/// Walks namespaces, blocks and conditional branches.
fn collect(
    statements: &[StmtId],
    source: &[u8],
    namespace: &str,
    kind: IdentifierKind,
    out: &mut Vec<Declaration>,
) {
    for stmt in statements {
        match &**stmt {
            Stmt::Namespace {
                name, statements, ..
            } => collect(statements, source, name.as_deref().unwrap_or(""), kind, out),
            Stmt::Block { statements, .. } => collect(statements, source, namespace, kind, out),
            Stmt::If {
                then_block,
                else_ifs,
                else_block,
                ..
            } => {
                collect(then_block, source, namespace, kind, out);
                for branch in else_ifs {
                    collect(&branch.statements, source, namespace, kind, out);
                }
                if let Some(else_block) = else_block {
                    collect(else_block, source, namespace, kind, out);
                }
            }
            Stmt::Class(decl) if kind == IdentifierKind::Class && decl.name.is_some() => {
                out.push(Declaration::Class(decl.clone()))
            }
            Stmt::Function(decl) if kind == IdentifierKind::Function => {
                out.push(Declaration::Function(decl.clone()))
            }
            Stmt::Const {
                consts,
                doc_comment,
                ..
            } if kind == IdentifierKind::Constant => {
                for decl in consts {
                    out.push(Declaration::Constant(ConstantDeclaration::from_const(
                        decl,
                        *doc_comment,
                    )));
                }
            }
            Stmt::Expression { expr, .. }
                if kind == IdentifierKind::Constant && is_define_call(expr) =>
            {
                match ConstantDeclaration::from_define_call(expr, source, namespace) {
                    Ok(decl) => out.push(Declaration::Constant(decl)),
                    Err(err) => tracing::debug!(error = %err, "skipping define() call"),
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::cache::NativeParser;

    fn locator() -> AstLocator {
        AstLocator::new(Rc::new(NativeParser))
    }

    fn source(text: &str) -> Rc<LocatedSource> {
        Rc::new(LocatedSource::from_string(text))
    }

    #[test]
    fn flattens_namespaces_and_conditionals() {
        let code = r#"<?php
namespace App {
    class Foo {}
    if (!function_exists('App\helper')) {
        function helper() {}
    }
}
namespace {
    const TOP = 1;
    define('DEFINED', 2);
    define('BROKEN');
}
"#;
        let locator = locator();
        let classes = locator
            .find_declarations_of_kind(source(code), IdentifierKind::Class)
            .unwrap();
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].name(), "App\\Foo");

        let functions = locator
            .find_declarations_of_kind(source(code), IdentifierKind::Function)
            .unwrap();
        assert_eq!(functions[0].name(), "App\\helper");

        let constants: Vec<String> = locator
            .find_declarations_of_kind(source(code), IdentifierKind::Constant)
            .unwrap()
            .iter()
            .map(LocatedDeclaration::name)
            .collect();
        assert_eq!(constants, vec!["TOP", "DEFINED"]);
    }

    #[test]
    fn lookup_is_case_insensitive_and_first_wins() {
        let code = "<?php if (PHP_OS) { class Dup { const A = 1; } } else { class dup {} }";
        let found = locator()
            .find_declaration(source(code), &Identifier::class("DUP").unwrap())
            .unwrap()
            .unwrap();
        let Declaration::Class(decl) = &found.declaration else {
            panic!("expected class");
        };
        assert_eq!(found.name(), "Dup");
        assert_eq!(decl.members.len(), 1);
    }

    #[test]
    fn empty_source_has_no_declarations() {
        let found = locator()
            .find_declarations_of_kind(source(""), IdentifierKind::Class)
            .unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn parse_failure_reports_snippet() {
        let err = locator()
            .find_declaration(
                source("<?php class { broken"),
                &Identifier::class("Foo").unwrap(),
            )
            .unwrap_err();
        match err {
            LocatorError::ParseToAstFailure { context, .. } => {
                assert_eq!(context, "first 20 characters: <?php class { broken");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn closures_match_by_start_line() {
        let code = "<?php\n$a = function () {};\n$b = fn($x) => $x; $c = fn() => 1;\n";
        let found = locator().find_closure(source(code), 2).unwrap().unwrap();
        assert_eq!(found.name(), "{closure}");
        assert!(locator().find_closure(source(code), 1).unwrap().is_none());
        assert!(matches!(
            locator().find_closure(source(code), 3),
            Err(LocatorError::TwoClosuresOnSameLine { line: 3, .. })
        ));
    }

    #[test]
    fn anonymous_classes_match_by_line() {
        let code = "<?php\n$a = 1;\n$x = new class {\n    const C = 3;\n};\n";
        let found = locator()
            .find_declaration(
                source(code),
                &Identifier::class("class@anonymous:3").unwrap(),
            )
            .unwrap()
            .unwrap();
        assert_eq!(found.name(), "class@anonymous:3");
    }
}
