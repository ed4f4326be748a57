use crate::parser::ast::{
    ClassDecl, ExprId, FunctionDecl, Name, NameKind, ParseError, Program, UseKind,
};
use crate::parser::lexer::{
    Lexer,
    token::{Token, TokenKind},
};
use crate::parser::line_index::LineIndex;
use crate::parser::span::Span;
use std::collections::HashMap;
use std::rc::Rc;

mod attributes;
mod definitions;
mod expr;
mod stmt;
mod types;

/// Parses a complete PHP file.
pub fn parse(source: &[u8]) -> Program {
    Parser::new(source).parse_program()
}

/// Parses a single expression written without an opening tag, e.g. `2 + 2 * 3`.
pub fn parse_expression(source: &[u8]) -> Result<ExprId, Vec<ParseError>> {
    let mut parser = Parser::with_lexer(source, Lexer::new_scripting(source));
    let expr = parser.parse_expr(0);
    if !parser.at(TokenKind::Eof) && !parser.at(TokenKind::SemiColon) {
        let span = parser.current().span;
        parser.error(span, "Unexpected trailing input after expression");
    }
    if parser.errors.is_empty() {
        Ok(expr)
    } else {
        Err(parser.errors)
    }
}

/// Namespace and import tables in effect at the current parse position.
#[derive(Debug, Default, Clone)]
struct NameScope {
    namespace: String,
    classes: HashMap<String, String>,
    functions: HashMap<String, String>,
    constants: HashMap<String, String>,
}

impl NameScope {
    fn enter_namespace(&mut self, namespace: Option<String>) {
        *self = NameScope {
            namespace: namespace.unwrap_or_default(),
            ..NameScope::default()
        };
    }

    fn import(&mut self, kind: UseKind, name: String, alias: &str) {
        match kind {
            UseKind::Normal => self.classes.insert(alias.to_ascii_lowercase(), name),
            UseKind::Function => self.functions.insert(alias.to_ascii_lowercase(), name),
            UseKind::Const => self.constants.insert(alias.to_string(), name),
        };
    }

    fn prefixed(&self, name: &str) -> String {
        if self.namespace.is_empty() {
            name.to_string()
        } else {
            format!("{}\\{}", self.namespace, name)
        }
    }

    /// `Foo\Bar` where `Foo` may be an imported alias.
    fn resolve_qualified(&self, original: &str) -> String {
        let (first, rest) = original.split_once('\\').unwrap_or((original, ""));
        match self.classes.get(&first.to_ascii_lowercase()) {
            Some(imported) if rest.is_empty() => imported.clone(),
            Some(imported) => format!("{imported}\\{rest}"),
            None => self.prefixed(original),
        }
    }

    fn resolve_class(&self, original: &str, kind: NameKind) -> String {
        match kind {
            NameKind::FullyQualified => original.to_string(),
            NameKind::Relative => self.prefixed(original),
            NameKind::Qualified => self.resolve_qualified(original),
            NameKind::Unqualified => {
                let lowered = original.to_ascii_lowercase();
                if matches!(lowered.as_str(), "self" | "static" | "parent") {
                    return lowered;
                }
                match self.classes.get(&lowered) {
                    Some(imported) => imported.clone(),
                    None => self.prefixed(original),
                }
            }
        }
    }

    fn resolve_function(&self, original: &str, kind: NameKind) -> (String, Option<String>) {
        match kind {
            NameKind::Unqualified => {
                if let Some(imported) = self.functions.get(&original.to_ascii_lowercase()) {
                    return (imported.clone(), None);
                }
                self.with_global_fallback(original)
            }
            _ => (self.resolve_class(original, kind), None),
        }
    }

    fn resolve_constant(&self, original: &str, kind: NameKind) -> (String, Option<String>) {
        match kind {
            NameKind::Unqualified => {
                if let Some(imported) = self.constants.get(original) {
                    return (imported.clone(), None);
                }
                self.with_global_fallback(original)
            }
            _ => (self.resolve_class(original, kind), None),
        }
    }

    fn with_global_fallback(&self, original: &str) -> (String, Option<String>) {
        if self.namespace.is_empty() {
            (original.to_string(), None)
        } else {
            (self.prefixed(original), Some(original.to_string()))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum NameRole {
    Class,
    Function,
    Constant,
}

pub struct Parser<'src> {
    pub(super) source: &'src [u8],
    tokens: Vec<Token>,
    doc_comments: Vec<Option<Span>>,
    pos: usize,
    eof: Token,
    pub(super) errors: Vec<ParseError>,
    scope: NameScope,
    pub(super) anonymous_classes: Vec<Rc<ClassDecl>>,
    pub(super) closures: Vec<Rc<FunctionDecl>>,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src [u8]) -> Self {
        Self::with_lexer(source, Lexer::new(source))
    }

    fn with_lexer(source: &'src [u8], lexer: Lexer<'src>) -> Self {
        let mut tokens = Vec::new();
        let mut doc_comments = Vec::new();
        let mut errors = Vec::new();
        let mut pending_doc = None;

        for token in lexer {
            match token.kind {
                TokenKind::DocComment => pending_doc = Some(token.span),
                TokenKind::Comment => {}
                TokenKind::Error => errors.push(ParseError {
                    span: token.span,
                    message: "Unexpected character or unterminated literal",
                }),
                _ => {
                    tokens.push(token);
                    doc_comments.push(pending_doc.take());
                }
            }
        }

        Self {
            source,
            tokens,
            doc_comments,
            pos: 0,
            eof: Token {
                kind: TokenKind::Eof,
                span: Span::new(source.len(), source.len()),
            },
            errors,
            scope: NameScope::default(),
            anonymous_classes: Vec::new(),
            closures: Vec::new(),
        }
    }

    pub fn parse_program(mut self) -> Program {
        let mut statements = Vec::new();

        while !self.at(TokenKind::Eof) {
            let before = self.pos;
            if let Some(stmt) = self.parse_top_stmt() {
                statements.push(stmt);
            }
            if self.pos == before {
                let span = self.current().span;
                self.error(span, "Unexpected token");
                self.bump();
            }
        }

        // nested declarations finish before the ones enclosing them
        self.anonymous_classes.sort_by_key(|decl| decl.span.start);
        self.closures.sort_by_key(|decl| decl.span.start);

        let span = Span::new(0, self.source.len());
        Program {
            statements,
            anonymous_classes: self.anonymous_classes,
            closures: self.closures,
            errors: self.errors,
            line_index: LineIndex::new(self.source),
            span,
        }
    }

    pub(super) fn current(&self) -> Token {
        self.tokens.get(self.pos).copied().unwrap_or(self.eof)
    }

    pub(super) fn kind(&self) -> TokenKind {
        self.current().kind
    }

    pub(super) fn peek(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    pub(super) fn bump(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    pub(super) fn at(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    pub(super) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub(super) fn expect(&mut self, kind: TokenKind, message: &'static str) -> bool {
        if self.eat(kind) {
            true
        } else {
            let span = self.current().span;
            self.error(span, message);
            false
        }
    }

    pub(super) fn error(&mut self, span: Span, message: &'static str) {
        self.errors.push(ParseError { span, message });
    }

    pub(super) fn text(&self, token: Token) -> &'src [u8] {
        token.span.as_str(self.source)
    }

    pub(super) fn string_of(&self, token: Token) -> String {
        String::from_utf8_lossy(self.text(token)).into_owned()
    }

    /// Doc comment directly preceding the current token.
    pub(super) fn doc_comment(&self) -> Option<Span> {
        self.doc_comments.get(self.pos).copied().flatten()
    }

    /// End offset of the last consumed token.
    pub(super) fn prev_end(&self) -> usize {
        match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some(token) => token.span.end,
            None => 0,
        }
    }

    pub(super) fn at_word(&self, word: &str) -> bool {
        self.at(TokenKind::Identifier) && self.text(self.current()).eq_ignore_ascii_case(word.as_bytes())
    }

    pub(super) fn is_identifier_like(kind: TokenKind) -> bool {
        kind == TokenKind::Identifier || kind.is_semi_reserved()
    }

    /// Identifier, or a keyword where PHP allows member names to be keywords.
    pub(super) fn expect_identifier(&mut self, message: &'static str) -> Option<(String, Span)> {
        let token = self.current();
        if Self::is_identifier_like(token.kind) {
            self.bump();
            Some((self.string_of(token), token.span))
        } else {
            self.error(token.span, message);
            None
        }
    }

    pub(super) fn expect_semicolon(&mut self) {
        match self.kind() {
            TokenKind::SemiColon => self.bump(),
            // `?>` and end of file terminate a statement implicitly
            TokenKind::CloseTag | TokenKind::Eof => {}
            _ => {
                let span = self.current().span;
                self.error(span, "Missing semicolon");
                self.skip_to_statement_end();
            }
        }
    }

    pub(super) fn at_name_start(&self) -> bool {
        match self.kind() {
            TokenKind::Identifier | TokenKind::NsSeparator | TokenKind::Enum => true,
            TokenKind::Namespace => self.peek(1) == TokenKind::NsSeparator,
            _ => false,
        }
    }

    /// Reads a possibly qualified name as written.
    pub(super) fn parse_raw_name(&mut self) -> Option<(String, NameKind, Span)> {
        let start = self.current().span.start;
        let mut kind = NameKind::Unqualified;

        if self.eat(TokenKind::NsSeparator) {
            kind = NameKind::FullyQualified;
        } else if self.at(TokenKind::Namespace) && self.peek(1) == TokenKind::NsSeparator {
            self.bump();
            self.bump();
            kind = NameKind::Relative;
        }

        let mut text = String::new();
        loop {
            let token = self.current();
            if !Self::is_identifier_like(token.kind) {
                break;
            }
            text.push_str(&self.string_of(token));
            self.bump();

            if self.at(TokenKind::NsSeparator) && Self::is_identifier_like(self.peek(1)) {
                self.bump();
                text.push('\\');
                if kind == NameKind::Unqualified {
                    kind = NameKind::Qualified;
                }
            } else {
                break;
            }
        }

        if text.is_empty() {
            let span = self.current().span;
            self.error(span, "Expected name");
            return None;
        }

        Some((text, kind, Span::new(start, self.prev_end())))
    }

    pub(super) fn resolve_name(
        &self,
        original: String,
        kind: NameKind,
        span: Span,
        role: NameRole,
    ) -> Name {
        let (resolved, fallback) = match role {
            NameRole::Class => (self.scope.resolve_class(&original, kind), None),
            NameRole::Function => self.scope.resolve_function(&original, kind),
            NameRole::Constant => self.scope.resolve_constant(&original, kind),
        };
        Name {
            original,
            kind,
            resolved,
            fallback,
            span,
        }
    }

    pub(super) fn parse_name(&mut self, role: NameRole) -> Option<Name> {
        let (original, kind, span) = self.parse_raw_name()?;
        Some(self.resolve_name(original, kind, span, role))
    }

    pub(super) fn namespace(&self) -> &str {
        &self.scope.namespace
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::{Expr, Stmt};

    #[test]
    fn resolves_imported_and_namespaced_names() {
        let program = parse(
            b"<?php
            namespace App\\Models;
            use Vendor\\Base as Model;
            use function Vendor\\helper;
            class User extends Model implements \\Countable, Contracts\\HasName {}
            const X = helper();",
        );
        assert!(program.errors.is_empty(), "{:?}", program.errors);

        let Stmt::Namespace { statements, .. } = &*program.statements[0] else {
            panic!("expected namespace");
        };
        let class = statements
            .iter()
            .find_map(|s| match &**s {
                Stmt::Class(decl) => Some(decl.clone()),
                _ => None,
            })
            .expect("class");
        assert_eq!(class.name.as_ref().map(|n| n.namespaced.as_str()), Some("App\\Models\\User"));
        assert_eq!(class.extends[0].resolved, "Vendor\\Base");
        assert_eq!(class.implements[0].resolved, "Countable");
        assert_eq!(class.implements[1].resolved, "App\\Models\\Contracts\\HasName");

        let Some(Stmt::Const { consts, .. }) = statements.last().map(|s| &**s) else {
            panic!("expected const");
        };
        let Expr::Call { func, .. } = &*consts[0].value else {
            panic!("expected call");
        };
        let Expr::Name { name, .. } = &**func else {
            panic!("expected name");
        };
        assert_eq!(name.resolved, "Vendor\\helper");
        assert_eq!(name.fallback, None);
    }

    #[test]
    fn unqualified_constant_gets_global_fallback() {
        let program = parse(b"<?php namespace Foo; const A = PHP_EOL;");
        let Stmt::Namespace { statements, .. } = &*program.statements[0] else {
            panic!("expected namespace");
        };
        let Stmt::Const { consts, .. } = &*statements[0] else {
            panic!("expected const");
        };
        let Expr::ConstFetch { name, .. } = &*consts[0].value else {
            panic!("expected const fetch");
        };
        assert_eq!(name.resolved, "Foo\\PHP_EOL");
        assert_eq!(name.fallback.as_deref(), Some("PHP_EOL"));
    }

    #[test]
    fn reports_syntax_errors() {
        let program = parse(b"<?php class { }");
        assert!(program.has_errors());
    }
}
