use super::Parser;
use crate::parser::ast::{ConstDecl, DeclName, ElseIf, Stmt, StmtId, UseItem, UseKind};
use crate::parser::lexer::token::TokenKind;
use crate::parser::span::Span;
use std::rc::Rc;

impl<'src> Parser<'src> {
    /// Parses one statement at file or block level. Declarations are parsed
    /// in full, everything else is skipped.
    pub(super) fn parse_top_stmt(&mut self) -> Option<StmtId> {
        let token = self.current();
        match token.kind {
            TokenKind::OpenTag | TokenKind::CloseTag | TokenKind::SemiColon => {
                self.bump();
                None
            }
            TokenKind::InlineHtml => {
                self.bump();
                Some(Rc::new(Stmt::InlineHtml { span: token.span }))
            }
            TokenKind::Namespace if self.peek(1) != TokenKind::NsSeparator => {
                Some(self.parse_namespace())
            }
            TokenKind::Use => Some(self.parse_use()),
            TokenKind::Const => Some(self.parse_const_stmt()),
            TokenKind::If => Some(self.parse_if()),
            TokenKind::OpenBrace => {
                self.bump();
                let statements = self.parse_statements_until(&[TokenKind::CloseBrace]);
                self.expect(TokenKind::CloseBrace, "Expected '}'");
                Some(Rc::new(Stmt::Block {
                    statements,
                    span: Span::new(token.span.start, self.prev_end()),
                }))
            }
            TokenKind::HaltCompiler => {
                self.bump();
                self.expect(TokenKind::OpenParen, "Expected '(' after __halt_compiler");
                self.expect(TokenKind::CloseParen, "Expected ')' after __halt_compiler");
                self.expect_semicolon();
                Some(Rc::new(Stmt::HaltCompiler {
                    span: Span::new(token.span.start, self.prev_end()),
                }))
            }
            TokenKind::Attribute
            | TokenKind::Function
            | TokenKind::Abstract
            | TokenKind::Final
            | TokenKind::Readonly
            | TokenKind::Class
            | TokenKind::Interface
            | TokenKind::Trait
            | TokenKind::Enum => match self.parse_declaration() {
                Some(stmt) => Some(stmt),
                None => Some(self.skip_statement()),
            },
            TokenKind::Identifier if self.at_define_call(0) => Some(self.parse_expression_stmt()),
            TokenKind::NsSeparator if self.at_define_call(1) => Some(self.parse_expression_stmt()),
            _ => Some(self.skip_statement()),
        }
    }

    fn at_define_call(&self, offset: usize) -> bool {
        let Some(token) = self.tokens.get(self.pos + offset) else {
            return false;
        };
        token.kind == TokenKind::Identifier
            && self.text(*token).eq_ignore_ascii_case(b"define")
            && self.peek(offset + 1) == TokenKind::OpenParen
    }

    /// Class-like or function declaration at the cursor, possibly preceded by
    /// attributes and modifiers. Returns `None` when the tokens start an
    /// expression instead (closures, `enum(...)` calls).
    fn parse_declaration(&mut self) -> Option<StmtId> {
        let checkpoint = self.pos;
        let errors = self.errors.len();
        let doc_comment = self.doc_comment();
        let start = self.current().span.start;
        let attributes = self.parse_attributes();
        let doc_comment = doc_comment.or(self.doc_comment());

        let mut look = 0;
        while matches!(
            self.peek(look),
            TokenKind::Abstract | TokenKind::Final | TokenKind::Readonly
        ) {
            look += 1;
        }

        let stmt = match self.peek(look) {
            TokenKind::Class | TokenKind::Interface | TokenKind::Trait
                if Self::is_identifier_like(self.peek(look + 1)) =>
            {
                Stmt::Class(self.parse_class_decl(attributes, doc_comment, start))
            }
            TokenKind::Enum
                if self.peek(look + 1) == TokenKind::Identifier
                    || self.peek(look + 1).is_semi_reserved() =>
            {
                Stmt::Class(self.parse_class_decl(attributes, doc_comment, start))
            }
            TokenKind::Function
                if look == 0
                    && (Self::is_identifier_like(self.peek(1))
                        || (self.peek(1) == TokenKind::Ampersand
                            && Self::is_identifier_like(self.peek(2)))) =>
            {
                Stmt::Function(self.parse_function_decl(attributes, doc_comment, start))
            }
            _ => {
                self.pos = checkpoint;
                self.errors.truncate(errors);
                return None;
            }
        };
        Some(Rc::new(stmt))
    }

    pub(super) fn parse_statements_until(&mut self, terminators: &[TokenKind]) -> Vec<StmtId> {
        let mut statements = Vec::new();
        while !self.at(TokenKind::Eof) && !terminators.contains(&self.kind()) {
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
        statements
    }

    fn parse_namespace(&mut self) -> StmtId {
        let start = self.current().span.start;
        self.bump();

        let name = if self.at(TokenKind::OpenBrace) {
            None
        } else {
            self.parse_raw_name().map(|(name, _, _)| name)
        };
        self.scope.enter_namespace(name.clone());

        let (statements, braced) = if self.eat(TokenKind::OpenBrace) {
            let statements = self.parse_statements_until(&[TokenKind::CloseBrace]);
            self.expect(TokenKind::CloseBrace, "Expected '}' to close namespace");
            (statements, true)
        } else {
            self.expect_semicolon();
            let mut statements = Vec::new();
            while !self.at(TokenKind::Eof)
                && !(self.at(TokenKind::Namespace) && self.peek(1) != TokenKind::NsSeparator)
            {
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
            (statements, false)
        };

        if braced {
            self.scope.enter_namespace(None);
        }

        Rc::new(Stmt::Namespace {
            name,
            statements,
            braced,
            span: Span::new(start, self.prev_end()),
        })
    }

    fn parse_use_kind(&mut self) -> Option<UseKind> {
        if self.eat(TokenKind::Function) {
            Some(UseKind::Function)
        } else if self.eat(TokenKind::Const) {
            Some(UseKind::Const)
        } else {
            None
        }
    }

    fn parse_use(&mut self) -> StmtId {
        let start = self.current().span.start;
        self.bump();
        let kind = self.parse_use_kind().unwrap_or(UseKind::Normal);
        let mut uses = Vec::new();

        loop {
            let item_start = self.current().span.start;
            let Some((prefix, _, _)) = self.parse_raw_name() else {
                break;
            };

            if self.at(TokenKind::NsSeparator) && self.peek(1) == TokenKind::OpenBrace {
                self.bump();
                self.bump();
                while !self.at(TokenKind::CloseBrace) && !self.at(TokenKind::Eof) {
                    let member_start = self.current().span.start;
                    let member_kind = self.parse_use_kind().unwrap_or(kind);
                    let Some((name, _, _)) = self.parse_raw_name() else {
                        break;
                    };
                    let full = format!("{prefix}\\{name}");
                    let item = self.finish_use_item(full, member_kind, member_start);
                    uses.push(item);
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(TokenKind::CloseBrace, "Expected '}' to close group use");
            } else {
                let item = self.finish_use_item(prefix, kind, item_start);
                uses.push(item);
            }

            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect_semicolon();

        Rc::new(Stmt::Use {
            kind,
            uses,
            span: Span::new(start, self.prev_end()),
        })
    }

    fn finish_use_item(&mut self, name: String, kind: UseKind, start: usize) -> UseItem {
        let alias = if self.eat(TokenKind::As) {
            self.expect_identifier("Expected alias after 'as'")
                .map(|(alias, _)| alias)
        } else {
            None
        };
        let alias =
            alias.unwrap_or_else(|| name.rsplit('\\').next().unwrap_or(&name).to_string());
        self.scope.import(kind, name.clone(), &alias);
        UseItem {
            name,
            alias,
            kind,
            span: Span::new(start, self.prev_end()),
        }
    }

    fn parse_const_stmt(&mut self) -> StmtId {
        let doc_comment = self.doc_comment();
        let start = self.current().span.start;
        self.bump();

        let mut consts = Vec::new();
        loop {
            let entry_start = self.current().span.start;
            let Some((short, span)) = self.expect_identifier("Expected constant name") else {
                break;
            };
            self.expect(TokenKind::Eq, "Expected '=' in constant declaration");
            let value = self.parse_expr(0);
            consts.push(ConstDecl {
                name: DeclName::new(&short, self.namespace(), span),
                value,
                span: Span::new(entry_start, self.prev_end()),
            });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect_semicolon();

        Rc::new(Stmt::Const {
            consts,
            doc_comment,
            span: Span::new(start, self.prev_end()),
        })
    }

    fn parse_if(&mut self) -> StmtId {
        let start = self.current().span.start;
        self.bump();
        let condition = self.parse_parenthesized_condition();

        let mut else_ifs = Vec::new();
        let mut else_block = None;

        let then_block = if self.eat(TokenKind::Colon) {
            let then_block = self.parse_statements_until(&[
                TokenKind::ElseIf,
                TokenKind::Else,
                TokenKind::EndIf,
            ]);
            while self.at(TokenKind::ElseIf) {
                let branch_start = self.current().span.start;
                self.bump();
                let condition = self.parse_parenthesized_condition();
                self.expect(TokenKind::Colon, "Expected ':' after elseif condition");
                let statements = self.parse_statements_until(&[
                    TokenKind::ElseIf,
                    TokenKind::Else,
                    TokenKind::EndIf,
                ]);
                else_ifs.push(ElseIf {
                    condition,
                    statements,
                    span: Span::new(branch_start, self.prev_end()),
                });
            }
            if self.eat(TokenKind::Else) {
                self.expect(TokenKind::Colon, "Expected ':' after else");
                else_block = Some(self.parse_statements_until(&[TokenKind::EndIf]));
            }
            self.expect(TokenKind::EndIf, "Expected 'endif'");
            self.expect_semicolon();
            then_block
        } else {
            let then_block = self.parse_embedded_statement();
            while self.at(TokenKind::ElseIf) {
                let branch_start = self.current().span.start;
                self.bump();
                let condition = self.parse_parenthesized_condition();
                let statements = self.parse_embedded_statement();
                else_ifs.push(ElseIf {
                    condition,
                    statements,
                    span: Span::new(branch_start, self.prev_end()),
                });
            }
            if self.eat(TokenKind::Else) {
                else_block = Some(self.parse_embedded_statement());
            }
            then_block
        };

        Rc::new(Stmt::If {
            condition,
            then_block,
            else_ifs,
            else_block,
            span: Span::new(start, self.prev_end()),
        })
    }

    fn parse_parenthesized_condition(&mut self) -> crate::parser::ast::ExprId {
        self.expect(TokenKind::OpenParen, "Expected '(' before condition");
        let condition = self.parse_expr(0);
        self.expect(TokenKind::CloseParen, "Expected ')' after condition");
        condition
    }

    fn parse_embedded_statement(&mut self) -> Vec<StmtId> {
        if self.eat(TokenKind::OpenBrace) {
            let statements = self.parse_statements_until(&[TokenKind::CloseBrace]);
            self.expect(TokenKind::CloseBrace, "Expected '}'");
            statements
        } else {
            self.parse_top_stmt().into_iter().collect()
        }
    }

    fn parse_expression_stmt(&mut self) -> StmtId {
        let start = self.current().span.start;
        let expr = self.parse_expr(0);
        self.expect_semicolon();
        Rc::new(Stmt::Expression {
            expr,
            span: Span::new(start, self.prev_end()),
        })
    }

    /// Consumes one statement that cannot declare anything.
    pub(super) fn skip_statement(&mut self) -> StmtId {
        let start = self.current().span.start;
        match self.kind() {
            TokenKind::OpenBrace => {
                self.skip_balanced();
            }
            // goto label
            TokenKind::Identifier if self.peek(1) == TokenKind::Colon => {
                self.bump();
                self.bump();
            }
            TokenKind::If => self.skip_if(),
            TokenKind::While
            | TokenKind::For
            | TokenKind::Foreach
            | TokenKind::Switch
            | TokenKind::Declare => {
                let keyword = self.kind();
                self.bump();
                if self.at(TokenKind::OpenParen) {
                    self.skip_balanced();
                }
                if self.eat(TokenKind::Colon) {
                    let end_word = match keyword {
                        TokenKind::While => "endwhile",
                        TokenKind::For => "endfor",
                        TokenKind::Foreach => "endforeach",
                        TokenKind::Switch => "endswitch",
                        _ => "enddeclare",
                    };
                    while !self.at(TokenKind::Eof) && !self.at_word(end_word) {
                        self.skip_alternative_body_statement();
                    }
                    self.bump();
                    self.expect_semicolon();
                } else if !self.eat(TokenKind::SemiColon) && !self.at(TokenKind::Eof) {
                    self.skip_statement();
                }
            }
            TokenKind::Do => {
                self.bump();
                self.skip_statement();
                if self.eat(TokenKind::While) && self.at(TokenKind::OpenParen) {
                    self.skip_balanced();
                }
                self.expect_semicolon();
            }
            TokenKind::Try => {
                self.bump();
                if self.at(TokenKind::OpenBrace) {
                    self.skip_balanced();
                }
                while self.eat(TokenKind::Catch) {
                    if self.at(TokenKind::OpenParen) {
                        self.skip_balanced();
                    }
                    if self.at(TokenKind::OpenBrace) {
                        self.skip_balanced();
                    }
                }
                if self.eat(TokenKind::Finally) && self.at(TokenKind::OpenBrace) {
                    self.skip_balanced();
                }
            }
            _ => self.skip_to_statement_end(),
        }
        Rc::new(Stmt::Skipped {
            span: Span::new(start, self.prev_end()),
        })
    }

    fn skip_alternative_body_statement(&mut self) {
        let before = self.pos;
        // `case 1:` / `default:` labels of an alternative switch
        if matches!(self.kind(), TokenKind::Case | TokenKind::Default) {
            while !matches!(
                self.kind(),
                TokenKind::Colon | TokenKind::SemiColon | TokenKind::Eof
            ) {
                self.bump();
            }
            self.bump();
        } else {
            self.skip_statement();
        }
        if self.pos == before {
            self.bump();
        }
    }

    fn skip_if(&mut self) {
        self.bump();
        if self.at(TokenKind::OpenParen) {
            self.skip_balanced();
        }
        if self.eat(TokenKind::Colon) {
            loop {
                while !matches!(
                    self.kind(),
                    TokenKind::ElseIf | TokenKind::Else | TokenKind::EndIf | TokenKind::Eof
                ) {
                    self.skip_alternative_body_statement();
                }
                match self.kind() {
                    TokenKind::ElseIf => {
                        self.bump();
                        if self.at(TokenKind::OpenParen) {
                            self.skip_balanced();
                        }
                        self.eat(TokenKind::Colon);
                    }
                    TokenKind::Else => {
                        self.bump();
                        self.eat(TokenKind::Colon);
                    }
                    TokenKind::EndIf => {
                        self.bump();
                        self.expect_semicolon();
                        break;
                    }
                    _ => break,
                }
            }
            return;
        }

        if !self.at(TokenKind::Eof) {
            self.skip_statement();
        }
        loop {
            match self.kind() {
                TokenKind::ElseIf => {
                    self.bump();
                    if self.at(TokenKind::OpenParen) {
                        self.skip_balanced();
                    }
                    self.skip_statement();
                }
                TokenKind::Else => {
                    self.bump();
                    self.skip_statement();
                    break;
                }
                _ => break,
            }
        }
    }

    fn at_anonymous_class(&self) -> bool {
        let mut look = 1;
        while matches!(
            self.peek(look),
            TokenKind::Final | TokenKind::Abstract | TokenKind::Readonly
        ) {
            look += 1;
        }
        self.at(TokenKind::New)
            && matches!(self.peek(look), TokenKind::Class | TokenKind::Attribute)
    }

    /// `function (`, `fn (` or their by-reference forms, maybe `static`.
    fn at_closure(&self) -> bool {
        let look = usize::from(self.at(TokenKind::Static));
        if !matches!(self.peek(look), TokenKind::Function | TokenKind::Fn) {
            return false;
        }
        match self.peek(look + 1) {
            TokenKind::OpenParen => true,
            TokenKind::Ampersand => matches!(self.peek(look + 2), TokenKind::OpenParen),
            _ => false,
        }
    }

    /// Skips to the `;` ending the current statement. A `}` closing the
    /// enclosing block is left in place.
    pub(super) fn skip_to_statement_end(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.kind() {
                TokenKind::Eof => break,
                TokenKind::SemiColon if depth == 0 => {
                    self.bump();
                    break;
                }
                TokenKind::CloseTag if depth == 0 => break,
                TokenKind::CloseBrace | TokenKind::CloseParen | TokenKind::CloseBracket
                    if depth == 0 =>
                {
                    break;
                }
                TokenKind::OpenParen
                | TokenKind::OpenBracket
                | TokenKind::OpenBrace
                | TokenKind::Attribute => {
                    depth += 1;
                    self.bump();
                }
                TokenKind::CloseBrace | TokenKind::CloseParen | TokenKind::CloseBracket => {
                    depth -= 1;
                    self.bump();
                }
                TokenKind::New if self.at_anonymous_class() => {
                    self.parse_expr(0);
                }
                TokenKind::Function | TokenKind::Fn | TokenKind::Static if self.at_closure() => {
                    self.parse_expr(0);
                }
                _ => self.bump(),
            }
        }
    }

    /// Skips a bracketed region starting at an opening `(`, `[`, `{` or `#[`,
    /// returning its span. Anonymous classes inside are still collected.
    pub(super) fn skip_balanced(&mut self) -> Span {
        let start = self.current().span.start;
        let mut depth = 0usize;
        loop {
            match self.kind() {
                TokenKind::OpenParen
                | TokenKind::OpenBracket
                | TokenKind::OpenBrace
                | TokenKind::Attribute => {
                    depth += 1;
                    self.bump();
                }
                TokenKind::CloseParen | TokenKind::CloseBracket | TokenKind::CloseBrace => {
                    self.bump();
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        break;
                    }
                }
                TokenKind::New if depth > 0 && self.at_anonymous_class() => {
                    self.parse_expr(0);
                }
                TokenKind::Function | TokenKind::Fn | TokenKind::Static
                    if depth > 0 && self.at_closure() =>
                {
                    self.parse_expr(0);
                }
                TokenKind::Eof => {
                    let span = self.current().span;
                    self.error(span, "Unclosed bracket");
                    break;
                }
                _ => {
                    self.bump();
                    if depth == 0 {
                        break;
                    }
                }
            }
        }
        Span::new(start, self.prev_end())
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::Stmt;
    use crate::parser::parser::parse;

    #[test]
    fn skips_control_flow_and_keeps_declarations() {
        let program = parse(
            b"<?php
            foreach ($items as $item): echo $item; endforeach;
            while (true) { if ($x) { break; } }
            try { risky(); } catch (Exception $e) { } finally { }
            switch ($x) { case 1: foo(); break; default: bar(); }
            function after() {}
            ",
        );
        assert!(program.errors.is_empty(), "{:?}", program.errors);
        assert!(program
            .statements
            .iter()
            .any(|s| matches!(&**s, Stmt::Function(f) if f.name.short == "after")));
    }

    #[test]
    fn conditional_declarations_are_parsed() {
        let program = parse(
            b"<?php
            if (!function_exists('polyfill')) {
                function polyfill() {}
            } elseif (PHP_VERSION_ID > 80000) {
                define('MODERN', true);
            } else {
                class Fallback {}
            }",
        );
        assert!(program.errors.is_empty(), "{:?}", program.errors);
        let Stmt::If {
            then_block,
            else_ifs,
            else_block,
            ..
        } = &*program.statements[0]
        else {
            panic!("expected if");
        };
        assert!(matches!(&*then_block[0], Stmt::Function(_)));
        assert!(matches!(&*else_ifs[0].statements[0], Stmt::Expression { .. }));
        assert!(matches!(
            else_block.as_deref().map(|b| &*b[0]),
            Some(Stmt::Class(_))
        ));
    }

    #[test]
    fn anonymous_classes_inside_skipped_code_are_collected() {
        let program = parse(
            b"<?php
            function make() {
                return new class(1) extends Base {
                    const X = 1;
                };
            }
            $y = new class {};",
        );
        assert!(program.errors.is_empty(), "{:?}", program.errors);
        assert_eq!(program.anonymous_classes.len(), 2);
    }

    #[test]
    fn closures_are_collected_in_source_order() {
        let program = parse(
            b"<?php
            $double = fn($x) => $x * 2;
            function run() {
                return array_map(static function ($item) {
                    return fn() => $item;
                }, []);
            }",
        );
        assert!(program.errors.is_empty(), "{:?}", program.errors);
        let lines: Vec<usize> = program
            .closures
            .iter()
            .map(|decl| program.line_index.start_line(decl.span))
            .collect();
        assert_eq!(lines, vec![2, 4, 5]);
    }

    #[test]
    fn goto_labels_do_not_swallow_declarations() {
        let program = parse(
            b"<?php
            start: class B {}
            goto start;
            done:
            function after() {}",
        );
        assert!(program.errors.is_empty(), "{:?}", program.errors);
        assert!(program
            .statements
            .iter()
            .any(|s| matches!(&**s, Stmt::Class(c) if c.name.as_ref().is_some_and(|n| n.short == "B"))));
        assert!(program
            .statements
            .iter()
            .any(|s| matches!(&**s, Stmt::Function(f) if f.name.short == "after")));
    }

    #[test]
    fn halt_compiler_stops_parsing() {
        let program = parse(b"<?php class A {} __halt_compiler(); garbage { ( ");
        assert!(program.errors.is_empty(), "{:?}", program.errors);
        assert_eq!(program.statements.len(), 2);
    }
}
