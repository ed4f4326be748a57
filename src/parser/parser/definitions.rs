use super::{NameRole, Parser};
use crate::identifier::CLOSURE_NAME;
use crate::parser::ast::{
    AttributeGroup, ClassConst, ClassDecl, ClassKind, ClassMember, ClosureUse, DeclName,
    FunctionBody, FunctionDecl, Modifiers, Name, Param, PropertyEntry,
};
use crate::parser::lexer::token::TokenKind;
use crate::parser::span::Span;
use std::rc::Rc;

impl<'src> Parser<'src> {
    fn parse_modifiers(&mut self) -> Modifiers {
        let mut modifiers = Modifiers::default();
        loop {
            let flag = match self.kind() {
                TokenKind::Public => Modifiers::PUBLIC,
                TokenKind::Protected => Modifiers::PROTECTED,
                TokenKind::Private => Modifiers::PRIVATE,
                TokenKind::Static => Modifiers::STATIC,
                TokenKind::Abstract => Modifiers::ABSTRACT,
                TokenKind::Final => Modifiers::FINAL,
                TokenKind::Readonly => Modifiers::READONLY,
                TokenKind::Var => Modifiers::VAR | Modifiers::PUBLIC,
                _ => break,
            };
            // `static::` / `static fn` start an expression, not a member
            if flag == Modifiers::STATIC
                && matches!(self.peek(1), TokenKind::DoubleColon | TokenKind::OpenParen)
            {
                break;
            }
            modifiers.insert(flag);
            self.bump();

            // asymmetric visibility: `private(set)`
            if matches!(
                flag,
                Modifiers::PUBLIC | Modifiers::PROTECTED | Modifiers::PRIVATE
            ) && self.at(TokenKind::OpenParen)
                && self.peek(1) == TokenKind::Identifier
                && self.peek(2) == TokenKind::CloseParen
            {
                self.bump();
                self.bump();
                self.bump();
            }
        }
        modifiers
    }

    fn parse_name_list(&mut self) -> Vec<Name> {
        let mut names = Vec::new();
        loop {
            match self.parse_name(NameRole::Class) {
                Some(name) => names.push(name),
                None => break,
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        names
    }

    /// Class, interface, trait or enum declaration; the cursor is on its
    /// modifiers or keyword.
    pub(super) fn parse_class_decl(
        &mut self,
        attributes: Vec<AttributeGroup>,
        doc_comment: Option<Span>,
        start: usize,
    ) -> Rc<ClassDecl> {
        let modifiers = self.parse_modifiers();
        let kind = match self.kind() {
            TokenKind::Interface => ClassKind::Interface,
            TokenKind::Trait => ClassKind::Trait,
            TokenKind::Enum => ClassKind::Enum,
            _ => ClassKind::Class,
        };
        self.bump();

        let name = self
            .expect_identifier("Expected class name")
            .map(|(short, span)| DeclName::new(&short, self.namespace(), span));

        let backing_type = if kind == ClassKind::Enum && self.eat(TokenKind::Colon) {
            self.parse_type()
        } else {
            None
        };

        self.finish_class_decl(kind, name, modifiers, backing_type, attributes, doc_comment, start)
    }

    #[allow(clippy::too_many_arguments)]
    fn finish_class_decl(
        &mut self,
        kind: ClassKind,
        name: Option<DeclName>,
        modifiers: Modifiers,
        backing_type: Option<crate::parser::ast::Type>,
        attributes: Vec<AttributeGroup>,
        doc_comment: Option<Span>,
        start: usize,
    ) -> Rc<ClassDecl> {
        let extends = if self.eat(TokenKind::Extends) {
            let names = self.parse_name_list();
            if kind != ClassKind::Interface && names.len() > 1 {
                let span = names[1].span;
                self.error(span, "Classes may only extend a single class");
            }
            names
        } else {
            Vec::new()
        };

        let implements = if self.eat(TokenKind::Implements) {
            self.parse_name_list()
        } else {
            Vec::new()
        };

        let members = self.parse_class_body();

        Rc::new(ClassDecl {
            kind,
            name,
            modifiers,
            extends,
            implements,
            backing_type,
            members,
            attributes,
            doc_comment,
            namespace: self.namespace().to_string(),
            span: Span::new(start, self.prev_end()),
        })
    }

    /// `class (args) extends X implements Y { ... }` after `new`.
    pub(super) fn parse_anonymous_class(
        &mut self,
        attributes: Vec<AttributeGroup>,
        start: usize,
    ) -> (Rc<ClassDecl>, Vec<crate::parser::ast::Arg>) {
        let modifiers = self.parse_modifiers();
        self.expect(TokenKind::Class, "Expected 'class'");
        let args = if self.at(TokenKind::OpenParen) {
            self.parse_call_arguments()
        } else {
            Vec::new()
        };
        let class = self.finish_class_decl(
            ClassKind::Class,
            None,
            modifiers,
            None,
            attributes,
            None,
            start,
        );
        self.anonymous_classes.push(class.clone());
        (class, args)
    }

    fn parse_class_body(&mut self) -> Vec<ClassMember> {
        let mut members = Vec::new();
        if !self.expect(TokenKind::OpenBrace, "Expected '{' to open class body") {
            return members;
        }

        while !self.at(TokenKind::CloseBrace) && !self.at(TokenKind::Eof) {
            let before = self.pos;
            if let Some(member) = self.parse_class_member() {
                members.push(member);
            }
            if self.pos == before {
                let span = self.current().span;
                self.error(span, "Unexpected token in class body");
                self.bump();
            }
        }
        self.expect(TokenKind::CloseBrace, "Expected '}' to close class body");
        members
    }

    fn parse_class_member(&mut self) -> Option<ClassMember> {
        let doc_comment = self.doc_comment();
        let start = self.current().span.start;
        let attributes = self.parse_attributes();
        let doc_comment = doc_comment.or(self.doc_comment());

        match self.kind() {
            TokenKind::SemiColon => {
                self.bump();
                return None;
            }
            TokenKind::Use => {
                self.bump();
                let traits = self.parse_name_list();
                if self.at(TokenKind::OpenBrace) {
                    // adaptation rules are not needed for reflection
                    self.skip_balanced();
                } else {
                    self.expect_semicolon();
                }
                return Some(ClassMember::TraitUse {
                    traits,
                    span: Span::new(start, self.prev_end()),
                });
            }
            TokenKind::Case => {
                self.bump();
                let (name, _) = self.expect_identifier("Expected enum case name")?;
                let value = if self.eat(TokenKind::Eq) {
                    Some(self.parse_expr(0))
                } else {
                    None
                };
                self.expect_semicolon();
                return Some(ClassMember::Case {
                    attributes,
                    name,
                    value,
                    doc_comment,
                    span: Span::new(start, self.prev_end()),
                });
            }
            _ => {}
        }

        let modifiers = self.parse_modifiers();
        match self.kind() {
            TokenKind::Const => {
                self.bump();
                let ty = if self.peek(1) == TokenKind::Eq {
                    None
                } else {
                    self.parse_type()
                };
                let mut consts = Vec::new();
                loop {
                    let entry_start = self.current().span.start;
                    let Some((name, _)) = self.expect_identifier("Expected constant name") else {
                        break;
                    };
                    self.expect(TokenKind::Eq, "Expected '=' in constant declaration");
                    let value = self.parse_expr(0);
                    consts.push(ClassConst {
                        name,
                        value,
                        span: Span::new(entry_start, self.prev_end()),
                    });
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect_semicolon();
                Some(ClassMember::Const {
                    attributes,
                    modifiers,
                    ty,
                    consts,
                    doc_comment,
                    span: Span::new(start, self.prev_end()),
                })
            }
            TokenKind::Function => {
                let method = self.parse_function_like(
                    modifiers,
                    attributes,
                    doc_comment,
                    start,
                    FunctionShape::Method,
                );
                Some(ClassMember::Method(method))
            }
            _ => {
                if modifiers.is_empty() && !self.at(TokenKind::Variable) {
                    let span = self.current().span;
                    self.error(span, "Expected class member declaration");
                    self.skip_to_statement_end();
                    return None;
                }

                let ty = if self.at(TokenKind::Variable) {
                    None
                } else {
                    self.parse_type()
                };

                let mut entries = Vec::new();
                let mut has_hooks = false;
                loop {
                    let token = self.current();
                    if !self.expect(TokenKind::Variable, "Expected property name") {
                        break;
                    }
                    let default = if self.eat(TokenKind::Eq) {
                        Some(self.parse_expr(0))
                    } else {
                        None
                    };
                    let hooks = if self.at(TokenKind::OpenBrace) {
                        has_hooks = true;
                        Some(self.skip_balanced())
                    } else {
                        None
                    };
                    entries.push(PropertyEntry {
                        name: variable_name(&self.string_of(token)),
                        default,
                        hooks,
                        span: Span::new(token.span.start, self.prev_end()),
                    });
                    if has_hooks || !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
                if !has_hooks {
                    self.expect_semicolon();
                }

                Some(ClassMember::Property {
                    attributes,
                    modifiers,
                    ty,
                    entries,
                    doc_comment,
                    span: Span::new(start, self.prev_end()),
                })
            }
        }
    }

    pub(super) fn parse_function_decl(
        &mut self,
        attributes: Vec<AttributeGroup>,
        doc_comment: Option<Span>,
        start: usize,
    ) -> Rc<FunctionDecl> {
        self.parse_function_like(
            Modifiers::default(),
            attributes,
            doc_comment,
            start,
            FunctionShape::Function,
        )
    }

    /// Named function or method, cursor on `function`.
    fn parse_function_like(
        &mut self,
        modifiers: Modifiers,
        attributes: Vec<AttributeGroup>,
        doc_comment: Option<Span>,
        start: usize,
        shape: FunctionShape,
    ) -> Rc<FunctionDecl> {
        self.bump(); // function
        let by_ref = self.eat(TokenKind::Ampersand);
        let (short, name_span) = self
            .expect_identifier("Expected function name")
            .unwrap_or_default();
        let name = match shape {
            FunctionShape::Function => DeclName::new(&short, self.namespace(), name_span),
            FunctionShape::Method => DeclName::new(&short, "", name_span),
        };

        let params = self.parse_parameter_list();
        let return_type = self.parse_return_type();
        let body = if self.at(TokenKind::OpenBrace) {
            FunctionBody::Skipped(self.skip_balanced())
        } else {
            if shape == FunctionShape::Function {
                let span = self.current().span;
                self.error(span, "Expected function body");
            }
            self.expect_semicolon();
            FunctionBody::None
        };

        Rc::new(FunctionDecl {
            name,
            modifiers,
            by_ref,
            params,
            return_type,
            body,
            uses: Vec::new(),
            attributes,
            doc_comment,
            span: Span::new(start, self.prev_end()),
        })
    }

    /// `function (...) use (...) { ... }`, cursor on `function`.
    pub(super) fn parse_closure_decl(
        &mut self,
        attributes: Vec<AttributeGroup>,
        modifiers: Modifiers,
        start: usize,
    ) -> Rc<FunctionDecl> {
        let keyword = self.current().span;
        self.bump();
        let by_ref = self.eat(TokenKind::Ampersand);
        let params = self.parse_parameter_list();
        let uses = self.parse_closure_uses();
        let return_type = self.parse_return_type();
        let body = if self.at(TokenKind::OpenBrace) {
            FunctionBody::Skipped(self.skip_balanced())
        } else {
            let span = self.current().span;
            self.error(span, "Expected closure body");
            FunctionBody::None
        };

        let decl = Rc::new(FunctionDecl {
            name: DeclName::new(CLOSURE_NAME, self.namespace(), keyword),
            modifiers,
            by_ref,
            params,
            return_type,
            body,
            uses,
            attributes,
            doc_comment: None,
            span: Span::new(start, self.prev_end()),
        });
        self.closures.push(decl.clone());
        decl
    }

    /// `fn (...) => expr`, cursor on `fn`.
    pub(super) fn parse_arrow_function_decl(
        &mut self,
        attributes: Vec<AttributeGroup>,
        modifiers: Modifiers,
        start: usize,
    ) -> Rc<FunctionDecl> {
        let keyword = self.current().span;
        self.bump();
        let by_ref = self.eat(TokenKind::Ampersand);
        let params = self.parse_parameter_list();
        let return_type = self.parse_return_type();
        self.expect(TokenKind::DoubleArrow, "Expected '=>' in arrow function");
        let expr = self.parse_expr(0);

        let decl = Rc::new(FunctionDecl {
            name: DeclName::new(CLOSURE_NAME, self.namespace(), keyword),
            modifiers,
            by_ref,
            params,
            return_type,
            body: FunctionBody::Expr(expr),
            uses: Vec::new(),
            attributes,
            doc_comment: None,
            span: Span::new(start, self.prev_end()),
        });
        self.closures.push(decl.clone());
        decl
    }

    fn parse_closure_uses(&mut self) -> Vec<ClosureUse> {
        let mut uses = Vec::new();
        if !self.eat(TokenKind::Use) {
            return uses;
        }
        self.expect(TokenKind::OpenParen, "Expected '(' after 'use'");
        while !self.at(TokenKind::CloseParen) && !self.at(TokenKind::Eof) {
            let start = self.current().span.start;
            let by_ref = self.eat(TokenKind::Ampersand);
            let token = self.current();
            if !self.expect(TokenKind::Variable, "Expected variable in closure use list") {
                break;
            }
            uses.push(ClosureUse {
                name: variable_name(&self.string_of(token)),
                by_ref,
                span: Span::new(start, token.span.end),
            });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::CloseParen, "Expected ')' after closure use list");
        uses
    }

    pub(super) fn parse_parameter_list(&mut self) -> Vec<Param> {
        let mut params = Vec::new();
        if !self.expect(TokenKind::OpenParen, "Expected '(' to open parameter list") {
            return params;
        }

        while !self.at(TokenKind::CloseParen) && !self.at(TokenKind::Eof) {
            let start = self.current().span.start;
            let attributes = self.parse_attributes();
            let modifiers = self.parse_modifiers();
            let ty = if matches!(
                self.kind(),
                TokenKind::Variable | TokenKind::Ampersand | TokenKind::Ellipsis
            ) {
                None
            } else {
                self.parse_type()
            };
            let by_ref = self.eat(TokenKind::Ampersand);
            let variadic = self.eat(TokenKind::Ellipsis);

            let token = self.current();
            if !self.expect(TokenKind::Variable, "Expected parameter name") {
                break;
            }
            let default = if self.eat(TokenKind::Eq) {
                Some(self.parse_expr(0))
            } else {
                None
            };
            if self.at(TokenKind::OpenBrace) {
                // hooks on a promoted property
                self.skip_balanced();
            }

            params.push(Param {
                name: variable_name(&self.string_of(token)),
                ty,
                default,
                by_ref,
                variadic,
                modifiers,
                attributes,
                span: Span::new(start, self.prev_end()),
            });

            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::CloseParen, "Expected ')' to close parameter list");
        params
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FunctionShape {
    Function,
    Method,
}

fn variable_name(text: &str) -> String {
    text.strip_prefix('$').unwrap_or(text).to_string()
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::{ClassKind, ClassMember, FunctionBody, Modifiers, Stmt, Visibility};
    use crate::parser::parser::parse;

    #[test]
    fn parses_class_members() {
        let source = b"<?php
        /** Doc */
        #[Entity]
        final class Point extends Shape implements \\JsonSerializable {
            use Helpers, More { more as protected; }
            public const ORIGIN = 0, UNIT = 1;
            final protected const string NAME = 'point';
            private static ?int $count = 0, $other;
            public readonly float $x;
            var $legacy = [1, 2];

            public function __construct(private int $a = 1, int &...$rest) { if ($a) { return; } }
            abstract protected function area(): float;
            public static function &make(): static { return new static(); }
        }";
        let program = parse(source);
        assert!(program.errors.is_empty(), "{:?}", program.errors);

        let Stmt::Class(class) = &*program.statements[0] else {
            panic!("expected class");
        };
        assert_eq!(class.kind, ClassKind::Class);
        assert!(class.modifiers.contains(Modifiers::FINAL));
        assert!(class.doc_comment.is_some());
        assert_eq!(class.attributes.len(), 1);
        assert_eq!(class.extends[0].resolved, "Shape");

        let mut methods = Vec::new();
        let mut properties = Vec::new();
        let mut constants = Vec::new();
        for member in &class.members {
            match member {
                ClassMember::Method(m) => methods.push(m.clone()),
                ClassMember::Property { entries, modifiers, .. } => {
                    for entry in entries {
                        properties.push((entry.name.clone(), modifiers.visibility()));
                    }
                }
                ClassMember::Const { consts, .. } => {
                    constants.extend(consts.iter().map(|c| c.name.clone()))
                }
                _ => {}
            }
        }

        assert_eq!(constants, vec!["ORIGIN", "UNIT", "NAME"]);
        assert_eq!(
            properties,
            vec![
                ("count".to_string(), Visibility::Private),
                ("other".to_string(), Visibility::Private),
                ("x".to_string(), Visibility::Public),
                ("legacy".to_string(), Visibility::Public),
            ]
        );
        assert_eq!(methods.len(), 3);
        assert!(methods[0].params[0].is_promoted());
        assert!(methods[0].params[1].variadic && methods[0].params[1].by_ref);
        assert!(matches!(methods[0].body, FunctionBody::Skipped(_)));
        assert!(matches!(methods[1].body, FunctionBody::None));
        assert!(methods[2].by_ref);
    }

    #[test]
    fn parses_enums_with_backing_type() {
        let program = parse(
            b"<?php enum Suit: string implements HasLabel {
                case Hearts = 'H';
                case Spades = 'S';
                const Wild = self::Spades;
                public function label(): string { return ucfirst($this->name); }
            }",
        );
        assert!(program.errors.is_empty(), "{:?}", program.errors);
        let Stmt::Class(class) = &*program.statements[0] else {
            panic!("expected enum");
        };
        assert_eq!(class.kind, ClassKind::Enum);
        assert_eq!(class.backing_type.as_ref().map(|t| t.to_string()).as_deref(), Some("string"));
        let cases = class
            .members
            .iter()
            .filter(|m| matches!(m, ClassMember::Case { .. }))
            .count();
        assert_eq!(cases, 2);
    }
}
