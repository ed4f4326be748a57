pub mod literal;
pub mod token;

use crate::parser::span::Span;
use memchr::{memchr, memchr3};
use token::{Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexerState {
    Initial,
    Scripting,
    /// After `__halt_compiler`: the `(`, `)` and `;` that follow are still
    /// lexed, everything after them is raw data.
    HaltCompiler,
    Done,
}

fn keyword_lookup(lowered: &[u8]) -> TokenKind {
    match lowered {
        b"or" => TokenKind::LogicalOr,
        b"and" => TokenKind::LogicalAnd,
        b"xor" => TokenKind::LogicalXor,
        b"bool" => TokenKind::TypeBool,
        b"int" => TokenKind::TypeInt,
        b"float" => TokenKind::TypeFloat,
        b"string" => TokenKind::TypeString,
        b"mixed" => TokenKind::TypeMixed,
        b"never" => TokenKind::TypeNever,
        b"null" => TokenKind::TypeNull,
        b"false" => TokenKind::TypeFalse,
        b"true" => TokenKind::TypeTrue,
        b"void" => TokenKind::TypeVoid,
        b"object" => TokenKind::TypeObject,
        b"iterable" => TokenKind::TypeIterable,
        b"callable" => TokenKind::TypeCallable,
        b"exit" => TokenKind::Exit,
        b"die" => TokenKind::Die,
        b"function" => TokenKind::Function,
        b"fn" => TokenKind::Fn,
        b"const" => TokenKind::Const,
        b"return" => TokenKind::Return,
        b"yield" => TokenKind::Yield,
        b"try" => TokenKind::Try,
        b"catch" => TokenKind::Catch,
        b"finally" => TokenKind::Finally,
        b"throw" => TokenKind::Throw,
        b"if" => TokenKind::If,
        b"elseif" => TokenKind::ElseIf,
        b"endif" => TokenKind::EndIf,
        b"else" => TokenKind::Else,
        b"insteadof" => TokenKind::Insteadof,
        b"while" => TokenKind::While,
        b"do" => TokenKind::Do,
        b"for" => TokenKind::For,
        b"foreach" => TokenKind::Foreach,
        b"declare" => TokenKind::Declare,
        b"instanceof" => TokenKind::InstanceOf,
        b"as" => TokenKind::As,
        b"switch" => TokenKind::Switch,
        b"case" => TokenKind::Case,
        b"default" => TokenKind::Default,
        b"break" => TokenKind::Break,
        b"continue" => TokenKind::Continue,
        b"goto" => TokenKind::Goto,
        b"echo" => TokenKind::Echo,
        b"print" => TokenKind::Print,
        b"enum" => TokenKind::Enum,
        b"class" => TokenKind::Class,
        b"interface" => TokenKind::Interface,
        b"trait" => TokenKind::Trait,
        b"extends" => TokenKind::Extends,
        b"implements" => TokenKind::Implements,
        b"new" => TokenKind::New,
        b"clone" => TokenKind::Clone,
        b"var" => TokenKind::Var,
        b"public" => TokenKind::Public,
        b"protected" => TokenKind::Protected,
        b"private" => TokenKind::Private,
        b"final" => TokenKind::Final,
        b"abstract" => TokenKind::Abstract,
        b"static" => TokenKind::Static,
        b"readonly" => TokenKind::Readonly,
        b"namespace" => TokenKind::Namespace,
        b"use" => TokenKind::Use,
        b"global" => TokenKind::Global,
        b"isset" => TokenKind::Isset,
        b"empty" => TokenKind::Empty,
        b"unset" => TokenKind::Unset,
        b"array" => TokenKind::Array,
        b"list" => TokenKind::List,
        b"match" => TokenKind::Match,
        b"include" => TokenKind::Include,
        b"include_once" => TokenKind::IncludeOnce,
        b"require" => TokenKind::Require,
        b"require_once" => TokenKind::RequireOnce,
        b"eval" => TokenKind::Eval,
        b"__halt_compiler" => TokenKind::HaltCompiler,
        b"__class__" => TokenKind::ClassC,
        b"__trait__" => TokenKind::TraitC,
        b"__function__" => TokenKind::FuncC,
        b"__method__" => TokenKind::MethodC,
        b"__line__" => TokenKind::Line,
        b"__file__" => TokenKind::File,
        b"__dir__" => TokenKind::Dir,
        b"__namespace__" => TokenKind::NsC,
        b"__property__" => TokenKind::PropertyC,
        _ => TokenKind::Identifier,
    }
}

fn cast_lookup(lowered: &[u8]) -> Option<TokenKind> {
    match lowered {
        b"int" | b"integer" => Some(TokenKind::IntCast),
        b"bool" | b"boolean" => Some(TokenKind::BoolCast),
        b"float" | b"double" | b"real" => Some(TokenKind::FloatCast),
        b"string" | b"binary" => Some(TokenKind::StringCast),
        b"array" => Some(TokenKind::ArrayCast),
        b"object" => Some(TokenKind::ObjectCast),
        b"unset" => Some(TokenKind::UnsetCast),
        b"void" => Some(TokenKind::VoidCast),
        _ => None,
    }
}

fn is_label_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_' || c >= 0x80
}

fn is_label_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c >= 0x80
}

#[derive(Debug, Clone)]
pub struct Lexer<'src> {
    input: &'src [u8],
    cursor: usize,
    state: LexerState,
    halt_tokens_left: u8,
}

impl<'src> Lexer<'src> {
    pub fn new(input: &'src [u8]) -> Self {
        let mut cursor = 0;
        if input.starts_with(b"#!") {
            cursor = memchr(b'\n', input).map(|pos| pos + 1).unwrap_or(input.len());
        }

        Self {
            input,
            cursor,
            state: LexerState::Initial,
            halt_tokens_left: 0,
        }
    }

    /// A lexer that starts directly in PHP mode, for standalone expressions.
    pub fn new_scripting(input: &'src [u8]) -> Self {
        Self {
            input,
            cursor: 0,
            state: LexerState::Scripting,
            halt_tokens_left: 0,
        }
    }

    pub fn slice(&self, span: Span) -> &'src [u8] {
        span.as_str(self.input)
    }

    pub fn source(&self) -> &'src [u8] {
        self.input
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.cursor).copied()
    }

    fn peek_at(&self, n: usize) -> Option<u8> {
        self.input.get(self.cursor + n).copied()
    }

    fn advance(&mut self) {
        self.cursor += 1;
    }

    fn advance_n(&mut self, n: usize) {
        self.cursor = (self.cursor + n).min(self.input.len());
    }

    fn starts_with(&self, s: &[u8]) -> bool {
        self.input[self.cursor..].starts_with(s)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_ascii_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self) {
        while let Some(c) = self.peek() {
            if is_label_char(c) {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_digits(&mut self, accept: impl Fn(u8) -> bool) {
        while let Some(c) = self.peek() {
            if accept(c) || c == b'_' {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_number(&mut self) -> TokenKind {
        if self.peek() == Some(b'0') {
            match self.peek_at(1) {
                Some(b'x' | b'X') => {
                    self.advance_n(2);
                    self.read_digits(|c| c.is_ascii_hexdigit());
                    return TokenKind::LNumber;
                }
                Some(b'b' | b'B') => {
                    self.advance_n(2);
                    self.read_digits(|c| c == b'0' || c == b'1');
                    return TokenKind::LNumber;
                }
                Some(b'o' | b'O') => {
                    self.advance_n(2);
                    self.read_digits(|c| (b'0'..=b'7').contains(&c));
                    return TokenKind::LNumber;
                }
                _ => {}
            }
        }

        let mut is_float = false;
        self.read_digits(|c| c.is_ascii_digit());
        if self.peek() == Some(b'.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            self.advance();
            self.read_digits(|c| c.is_ascii_digit());
        } else if self.peek() == Some(b'.') && self.peek_at(1) != Some(b'.') {
            // `1.` is a float, `1..2` is not
            is_float = true;
            self.advance();
        }

        if matches!(self.peek(), Some(b'e' | b'E')) {
            let sign = matches!(self.peek_at(1), Some(b'+' | b'-'));
            let digit_at = if sign { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                self.advance_n(digit_at);
                self.read_digits(|c| c.is_ascii_digit());
            }
        }

        if is_float {
            TokenKind::DNumber
        } else {
            TokenKind::LNumber
        }
    }

    fn consume_single_line_comment(&mut self) -> TokenKind {
        while self.cursor < self.input.len() {
            let remaining = &self.input[self.cursor..];
            match memchr3(b'\n', b'\r', b'?', remaining) {
                Some(pos) => {
                    self.cursor += pos;
                    if self.input[self.cursor] == b'?' {
                        if self.peek_at(1) == Some(b'>') {
                            break;
                        }
                        self.advance();
                    } else {
                        break;
                    }
                }
                None => {
                    self.cursor = self.input.len();
                    break;
                }
            }
        }
        TokenKind::Comment
    }

    fn consume_multi_line_comment(&mut self) -> TokenKind {
        let is_doc = self.peek() == Some(b'*') && self.peek_at(1) != Some(b'/');
        if is_doc {
            self.advance();
        }

        while self.cursor < self.input.len() {
            match memchr(b'*', &self.input[self.cursor..]) {
                Some(pos) => {
                    self.cursor += pos + 1;
                    if self.peek() == Some(b'/') {
                        self.advance();
                        return if is_doc {
                            TokenKind::DocComment
                        } else {
                            TokenKind::Comment
                        };
                    }
                }
                None => {
                    self.cursor = self.input.len();
                    break;
                }
            }
        }

        TokenKind::Error
    }

    fn read_single_quoted(&mut self) -> TokenKind {
        while let Some(c) = self.peek() {
            self.advance();
            match c {
                b'\\' => {
                    if self.peek().is_some() {
                        self.advance();
                    }
                }
                b'\'' => return TokenKind::ConstantString,
                _ => {}
            }
        }
        TokenKind::Error
    }

    /// Reads a `"` or `` ` `` delimited string whose opening quote has been
    /// consumed. Returns whether interpolation was seen, or `None` when the
    /// string is unterminated.
    fn read_double_quoted(&mut self, quote: u8) -> Option<bool> {
        let mut interpolated = false;
        while let Some(c) = self.peek() {
            if c == quote {
                self.advance();
                return Some(interpolated);
            }
            match c {
                b'\\' => {
                    self.advance_n(2);
                }
                b'$' => {
                    self.advance();
                    match self.peek() {
                        Some(b'{') => {
                            interpolated = true;
                            self.advance();
                            self.skip_embedded_code()?;
                        }
                        Some(next) if is_label_start(next) => interpolated = true,
                        _ => {}
                    }
                }
                b'{' if self.peek_at(1) == Some(b'$') => {
                    interpolated = true;
                    self.advance();
                    self.skip_embedded_code()?;
                }
                _ => self.advance(),
            }
        }
        None
    }

    /// Skips the code inside `{$ ... }` / `${ ... }`, the opening brace already consumed.
    fn skip_embedded_code(&mut self) -> Option<()> {
        let mut depth = 1usize;
        while let Some(c) = self.peek() {
            match c {
                b'{' => {
                    depth += 1;
                    self.advance();
                }
                b'}' => {
                    self.advance();
                    depth -= 1;
                    if depth == 0 {
                        return Some(());
                    }
                }
                b'\'' => {
                    self.advance();
                    if self.read_single_quoted() == TokenKind::Error {
                        return None;
                    }
                }
                b'"' => {
                    self.advance();
                    self.read_double_quoted(b'"')?;
                }
                _ => self.advance(),
            }
        }
        None
    }

    /// Lexes a complete heredoc/nowdoc, `<<<` already consumed. On a malformed
    /// header the cursor is restored and `None` is returned.
    fn read_heredoc(&mut self) -> Option<TokenKind> {
        let header_start = self.cursor;
        while matches!(self.peek(), Some(b' ' | b'\t')) {
            self.advance();
        }

        let quote = match self.peek() {
            Some(q @ (b'\'' | b'"')) => {
                self.advance();
                Some(q)
            }
            _ => None,
        };

        let label_start = self.cursor;
        if !self.peek().is_some_and(is_label_start) {
            self.cursor = header_start;
            return None;
        }
        self.read_identifier();
        let label = &self.input[label_start..self.cursor];

        if let Some(q) = quote {
            if self.peek() != Some(q) {
                self.cursor = header_start;
                return None;
            }
            self.advance();
        }

        match self.peek() {
            Some(b'\n') => self.advance(),
            Some(b'\r') => {
                self.advance();
                if self.peek() == Some(b'\n') {
                    self.advance();
                }
            }
            _ => {
                self.cursor = header_start;
                return None;
            }
        }

        let is_nowdoc = quote == Some(b'\'');
        let body_start = self.cursor;
        loop {
            let line_start = self.cursor;
            let mut pos = line_start;
            while matches!(self.input.get(pos), Some(b' ' | b'\t')) {
                pos += 1;
            }
            if self.input[pos..].starts_with(label)
                && !self.input.get(pos + label.len()).is_some_and(|c| is_label_char(*c))
            {
                let interpolated =
                    !is_nowdoc && literal::has_interpolation(&self.input[body_start..line_start]);
                self.cursor = pos + label.len();
                return Some(if interpolated {
                    TokenKind::InterpolatedString
                } else {
                    TokenKind::ConstantString
                });
            }

            match memchr(b'\n', &self.input[line_start..]) {
                Some(nl) => self.cursor = line_start + nl + 1,
                None => {
                    self.cursor = self.input.len();
                    return Some(TokenKind::Error);
                }
            }
        }
    }

    /// Recognizes `(int)`, `( string )` and friends at the cursor, which sits on `(`.
    fn try_cast(&mut self) -> Option<TokenKind> {
        let mut look = self.cursor + 1;
        while matches!(self.input.get(look), Some(b' ' | b'\t')) {
            look += 1;
        }
        let word_start = look;
        while self.input.get(look).is_some_and(|c| c.is_ascii_alphabetic()) {
            look += 1;
        }
        if look == word_start {
            return None;
        }
        let lowered = self.input[word_start..look].to_ascii_lowercase();
        while matches!(self.input.get(look), Some(b' ' | b'\t')) {
            look += 1;
        }
        if self.input.get(look) != Some(&b')') {
            return None;
        }
        let kind = cast_lookup(&lowered)?;
        self.cursor = look + 1;
        Some(kind)
    }

    fn next_in_initial(&mut self) -> Option<Token> {
        let start = self.cursor;
        loop {
            match memchr(b'<', &self.input[self.cursor..]) {
                Some(pos) => self.cursor += pos,
                None => {
                    self.cursor = self.input.len();
                    self.state = LexerState::Done;
                    return (self.cursor > start).then(|| Token {
                        kind: TokenKind::InlineHtml,
                        span: Span::new(start, self.cursor),
                    });
                }
            }

            let tag = if self.starts_with(b"<?php")
                && !self.input.get(self.cursor + 5).is_some_and(|c| is_label_char(*c))
            {
                Some((TokenKind::OpenTag, 5))
            } else if self.starts_with(b"<?=") {
                Some((TokenKind::OpenTagEcho, 3))
            } else if self.starts_with(b"<?") && !self.starts_with(b"<?xml") {
                Some((TokenKind::OpenTag, 2))
            } else {
                None
            };

            let Some((kind, len)) = tag else {
                self.advance();
                continue;
            };

            if self.cursor > start {
                return Some(Token {
                    kind: TokenKind::InlineHtml,
                    span: Span::new(start, self.cursor),
                });
            }

            let tag_start = self.cursor;
            self.advance_n(len);
            if kind == TokenKind::OpenTag {
                match self.peek() {
                    Some(b'\r') => {
                        self.advance();
                        if self.peek() == Some(b'\n') {
                            self.advance();
                        }
                    }
                    Some(c) if c.is_ascii_whitespace() => self.advance(),
                    _ => {}
                }
            }
            self.state = LexerState::Scripting;
            return Some(Token {
                kind,
                span: Span::new(tag_start, self.cursor),
            });
        }
    }

    fn next_in_halt_compiler(&mut self) -> Option<Token> {
        if self.halt_tokens_left == 0 {
            self.state = LexerState::Done;
            return None;
        }
        self.skip_whitespace();
        let start = self.cursor;
        let kind = match self.peek() {
            Some(b'(') => TokenKind::OpenParen,
            Some(b')') => TokenKind::CloseParen,
            Some(b';') => TokenKind::SemiColon,
            _ => {
                self.state = LexerState::Done;
                return None;
            }
        };
        self.advance();
        self.halt_tokens_left -= 1;
        if kind == TokenKind::SemiColon {
            self.state = LexerState::Done;
        }
        Some(Token {
            kind,
            span: Span::new(start, self.cursor),
        })
    }

    fn next_in_scripting(&mut self) -> Option<Token> {
        self.skip_whitespace();
        let start = self.cursor;
        let c = self.peek()?;

        let kind = match c {
            b'$' => {
                if self.peek_at(1).is_some_and(is_label_start) {
                    self.advance();
                    self.read_identifier();
                    TokenKind::Variable
                } else {
                    self.advance();
                    TokenKind::Dollar
                }
            }
            b'b' | b'B' if matches!(self.peek_at(1), Some(b'\'' | b'"')) => {
                self.advance();
                return self.next_in_scripting().map(|token| Token {
                    kind: token.kind,
                    span: Span::new(start, token.span.end),
                });
            }
            c if is_label_start(c) => {
                self.read_identifier();
                let lowered = self.input[start..self.cursor].to_ascii_lowercase();
                let kind = keyword_lookup(&lowered);
                if kind == TokenKind::HaltCompiler {
                    self.state = LexerState::HaltCompiler;
                    self.halt_tokens_left = 3;
                }
                kind
            }
            b'0'..=b'9' => self.read_number(),
            b'.' if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => self.read_number(),
            b'\\' => {
                self.advance();
                TokenKind::NsSeparator
            }
            b'\'' => {
                self.advance();
                self.read_single_quoted()
            }
            b'"' => {
                self.advance();
                match self.read_double_quoted(b'"') {
                    Some(true) => TokenKind::InterpolatedString,
                    Some(false) => TokenKind::ConstantString,
                    None => TokenKind::Error,
                }
            }
            b'`' => {
                self.advance();
                match self.read_double_quoted(b'`') {
                    Some(_) => TokenKind::ShellExec,
                    None => TokenKind::Error,
                }
            }
            b'#' => {
                if self.peek_at(1) == Some(b'[') {
                    self.advance_n(2);
                    TokenKind::Attribute
                } else {
                    self.advance();
                    self.consume_single_line_comment()
                }
            }
            b'/' => match self.peek_at(1) {
                Some(b'/') => {
                    self.advance_n(2);
                    self.consume_single_line_comment()
                }
                Some(b'*') => {
                    self.advance_n(2);
                    self.consume_multi_line_comment()
                }
                Some(b'=') => {
                    self.advance_n(2);
                    TokenKind::DivEq
                }
                _ => {
                    self.advance();
                    TokenKind::Slash
                }
            },
            b'?' => {
                if self.starts_with(b"?>") {
                    self.advance_n(2);
                    if self.peek() == Some(b'\n') {
                        self.advance();
                    } else if self.starts_with(b"\r\n") {
                        self.advance_n(2);
                    }
                    self.state = LexerState::Initial;
                    TokenKind::CloseTag
                } else if self.starts_with(b"??=") {
                    self.advance_n(3);
                    TokenKind::CoalesceEq
                } else if self.starts_with(b"??") {
                    self.advance_n(2);
                    TokenKind::Coalesce
                } else if self.starts_with(b"?->") {
                    self.advance_n(3);
                    TokenKind::NullSafeArrow
                } else {
                    self.advance();
                    TokenKind::Question
                }
            }
            b'(' => match self.try_cast() {
                Some(kind) => kind,
                None => {
                    self.advance();
                    TokenKind::OpenParen
                }
            },
            b'<' if self.starts_with(b"<<<") => {
                self.advance_n(3);
                match self.read_heredoc() {
                    Some(kind) => kind,
                    None => {
                        self.cursor = start;
                        self.operator()
                    }
                }
            }
            _ => self.operator(),
        };

        Some(Token {
            kind,
            span: Span::new(start, self.cursor),
        })
    }

    /// Longest-match operator and punctuation scanning.
    fn operator(&mut self) -> TokenKind {
        const OPERATORS: &[(&[u8], TokenKind)] = &[
            (b"<=>", TokenKind::Spaceship),
            (b"===", TokenKind::EqEqEq),
            (b"!==", TokenKind::BangEqEq),
            (b"**=", TokenKind::PowEq),
            (b"<<=", TokenKind::SlEq),
            (b">>=", TokenKind::SrEq),
            (b"...", TokenKind::Ellipsis),
            (b"->", TokenKind::Arrow),
            (b"=>", TokenKind::DoubleArrow),
            (b"::", TokenKind::DoubleColon),
            (b"++", TokenKind::Inc),
            (b"--", TokenKind::Dec),
            (b"**", TokenKind::Pow),
            (b"+=", TokenKind::PlusEq),
            (b"-=", TokenKind::MinusEq),
            (b"*=", TokenKind::MulEq),
            (b"%=", TokenKind::ModEq),
            (b".=", TokenKind::ConcatEq),
            (b"&=", TokenKind::AndEq),
            (b"|=", TokenKind::OrEq),
            (b"^=", TokenKind::XorEq),
            (b"==", TokenKind::EqEq),
            (b"!=", TokenKind::BangEq),
            (b"<>", TokenKind::BangEq),
            (b"<=", TokenKind::LtEq),
            (b">=", TokenKind::GtEq),
            (b"<<", TokenKind::Sl),
            (b">>", TokenKind::Sr),
            (b"&&", TokenKind::AmpersandAmpersand),
            (b"||", TokenKind::PipePipe),
            (b"+", TokenKind::Plus),
            (b"-", TokenKind::Minus),
            (b"*", TokenKind::Asterisk),
            (b"%", TokenKind::Percent),
            (b".", TokenKind::Dot),
            (b"=", TokenKind::Eq),
            (b"!", TokenKind::Bang),
            (b"<", TokenKind::Lt),
            (b">", TokenKind::Gt),
            (b"&", TokenKind::Ampersand),
            (b"|", TokenKind::Pipe),
            (b"^", TokenKind::Caret),
            (b"~", TokenKind::BitNot),
            (b"@", TokenKind::At),
            (b";", TokenKind::SemiColon),
            (b":", TokenKind::Colon),
            (b",", TokenKind::Comma),
            (b"{", TokenKind::OpenBrace),
            (b"}", TokenKind::CloseBrace),
            (b")", TokenKind::CloseParen),
            (b"[", TokenKind::OpenBracket),
            (b"]", TokenKind::CloseBracket),
        ];

        for (text, kind) in OPERATORS {
            if self.starts_with(text) {
                self.advance_n(text.len());
                return *kind;
            }
        }

        self.advance();
        TokenKind::Error
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        match self.state {
            LexerState::Initial => self.next_in_initial(),
            LexerState::Scripting => self.next_in_scripting(),
            LexerState::HaltCompiler => self.next_in_halt_compiler(),
            LexerState::Done => None,
        }
    }
}
