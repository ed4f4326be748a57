use super::{NameRole, Parser};
use crate::parser::ast::{
    Arg, ArrayItem, AssignOp, BinaryOp, CastKind, ClassRef, Expr, ExprId, IncludeKind,
    MagicConstKind, MatchArm, MemberName, Modifiers, UnaryOp,
};
use crate::parser::lexer::literal::{self, NumberLiteral};
use crate::parser::lexer::token::TokenKind;
use crate::parser::span::Span;
use std::rc::Rc;

impl<'src> Parser<'src> {
    pub(super) fn parse_call_arguments(&mut self) -> Vec<Arg> {
        let mut args = Vec::new();
        if !self.eat(TokenKind::OpenParen) {
            return args;
        }

        let mut has_named = false;
        while !self.at(TokenKind::CloseParen) && !self.at(TokenKind::Eof) {
            let start = self.current().span.start;
            let mut name = None;
            let mut unpack = false;

            // Named argument: identifier-like token followed by :
            if Self::is_identifier_like(self.kind()) && self.peek(1) == TokenKind::Colon {
                name = Some(self.string_of(self.current()));
                self.bump();
                self.bump();
                has_named = true;
            } else if self.at(TokenKind::Ellipsis) {
                if self.peek(1) == TokenKind::CloseParen {
                    let span = self.current().span;
                    self.bump();
                    args.push(Arg {
                        name: None,
                        value: Rc::new(Expr::VariadicPlaceholder { span }),
                        unpack: false,
                        span,
                    });
                    continue;
                }
                unpack = true;
                self.bump();
            } else if has_named {
                let span = self.current().span;
                self.error(span, "Cannot use positional argument after named argument");
            }

            let value = self.parse_expr(0);
            args.push(Arg {
                name,
                value,
                unpack,
                span: Span::new(start, self.prev_end()),
            });

            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::CloseParen, "Expected ')' to close argument list");
        args
    }

    fn is_assignable(expr: &Expr) -> bool {
        matches!(
            expr,
            Expr::Variable { .. }
                | Expr::IndirectVariable { .. }
                | Expr::ArrayDimFetch { .. }
                | Expr::PropertyFetch {
                    nullsafe: false,
                    ..
                }
                | Expr::StaticPropertyFetch { .. }
                | Expr::List { .. }
                | Expr::Array { .. }
        )
    }

    pub(super) fn parse_expr(&mut self, min_bp: u8) -> ExprId {
        let mut left = self.parse_nud();
        let mut just_parsed_ternary = false;
        let mut just_parsed_elvis = false;

        loop {
            let op = match self.kind() {
                TokenKind::Plus => BinaryOp::Plus,
                TokenKind::Minus => BinaryOp::Minus,
                TokenKind::Asterisk => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                TokenKind::Dot => BinaryOp::Concat,
                TokenKind::EqEq => BinaryOp::EqEq,
                TokenKind::EqEqEq => BinaryOp::EqEqEq,
                TokenKind::BangEq => BinaryOp::NotEq,
                TokenKind::BangEqEq => BinaryOp::NotEqEq,
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::LtEq => BinaryOp::LtEq,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::GtEq => BinaryOp::GtEq,
                TokenKind::AmpersandAmpersand => BinaryOp::And,
                TokenKind::PipePipe => BinaryOp::Or,
                TokenKind::Ampersand => BinaryOp::BitAnd,
                TokenKind::Pipe => BinaryOp::BitOr,
                TokenKind::Caret => BinaryOp::BitXor,
                TokenKind::LogicalAnd => BinaryOp::LogicalAnd,
                TokenKind::LogicalOr => BinaryOp::LogicalOr,
                TokenKind::LogicalXor => BinaryOp::LogicalXor,
                TokenKind::Coalesce => BinaryOp::Coalesce,
                TokenKind::Spaceship => BinaryOp::Spaceship,
                TokenKind::Pow => BinaryOp::Pow,
                TokenKind::Sl => BinaryOp::ShiftLeft,
                TokenKind::Sr => BinaryOp::ShiftRight,
                TokenKind::InstanceOf => {
                    let l_bp = 170;
                    if l_bp < min_bp {
                        break;
                    }
                    self.bump();
                    let class = if self.at_name_start() {
                        match self.parse_name(NameRole::Class) {
                            Some(name) => ClassRef::Name(name),
                            None => break,
                        }
                    } else if self.at(TokenKind::Static) {
                        let name = self.special_static_name();
                        ClassRef::Name(name)
                    } else {
                        ClassRef::Expr(self.parse_expr(l_bp + 1))
                    };
                    let span = Span::new(left.span().start, self.prev_end());
                    left = Rc::new(Expr::Instanceof {
                        expr: left,
                        class,
                        span,
                    });
                    just_parsed_ternary = false;
                    continue;
                }
                TokenKind::Question => {
                    let l_bp = 40;
                    if l_bp < min_bp {
                        break;
                    }

                    let current_is_elvis = self.peek(1) == TokenKind::Colon;
                    if just_parsed_ternary && (!just_parsed_elvis || !current_is_elvis) {
                        let span = self.current().span;
                        self.error(
                            span,
                            "Unparenthesized `a ? b : c ? d : e` is not supported. Use either `(a ? b : c) ? d : e` or `a ? b : (c ? d : e)`",
                        );
                    }

                    self.bump();
                    let if_true = if self.at(TokenKind::Colon) {
                        None
                    } else {
                        Some(self.parse_expr(0))
                    };
                    self.expect(TokenKind::Colon, "Expected ':' in ternary expression");

                    // l_bp + 1 keeps the else branch left-associative so nesting is detected
                    let if_false = self.parse_expr(l_bp + 1);
                    let span = Span::new(left.span().start, if_false.span().end);
                    left = Rc::new(Expr::Ternary {
                        condition: left,
                        if_true,
                        if_false,
                        span,
                    });
                    just_parsed_ternary = true;
                    just_parsed_elvis = current_is_elvis;
                    continue;
                }
                TokenKind::PlusEq
                | TokenKind::MinusEq
                | TokenKind::MulEq
                | TokenKind::DivEq
                | TokenKind::ModEq
                | TokenKind::ConcatEq
                | TokenKind::AndEq
                | TokenKind::OrEq
                | TokenKind::XorEq
                | TokenKind::SlEq
                | TokenKind::SrEq
                | TokenKind::PowEq
                | TokenKind::CoalesceEq => {
                    let op = match self.kind() {
                        TokenKind::PlusEq => AssignOp::Plus,
                        TokenKind::MinusEq => AssignOp::Minus,
                        TokenKind::MulEq => AssignOp::Mul,
                        TokenKind::DivEq => AssignOp::Div,
                        TokenKind::ModEq => AssignOp::Mod,
                        TokenKind::ConcatEq => AssignOp::Concat,
                        TokenKind::AndEq => AssignOp::BitAnd,
                        TokenKind::OrEq => AssignOp::BitOr,
                        TokenKind::XorEq => AssignOp::BitXor,
                        TokenKind::SlEq => AssignOp::ShiftLeft,
                        TokenKind::SrEq => AssignOp::ShiftRight,
                        TokenKind::PowEq => AssignOp::Pow,
                        _ => AssignOp::Coalesce,
                    };
                    // an assignable left side always takes the assignment,
                    // so `!$a = f()` and `$a + $b = 1` parse like PHP does
                    if !Self::is_assignable(&left) {
                        if 35 < min_bp {
                            break;
                        }
                        self.error(left.span(), "Assignments can only happen to writable values");
                    }
                    self.bump();
                    let right = self.parse_expr(34);
                    let span = Span::new(left.span().start, right.span().end);
                    left = Rc::new(Expr::AssignOp {
                        var: left,
                        op,
                        expr: right,
                        span,
                    });
                    just_parsed_ternary = false;
                    continue;
                }
                TokenKind::Eq => {
                    if !Self::is_assignable(&left) {
                        if 35 < min_bp {
                            break;
                        }
                        self.error(left.span(), "Assignments can only happen to writable values");
                    }
                    self.bump();

                    // $a =& $b
                    if self.eat(TokenKind::Ampersand) {
                        let right = self.parse_expr(34);
                        let span = Span::new(left.span().start, right.span().end);
                        left = Rc::new(Expr::AssignRef {
                            var: left,
                            expr: right,
                            span,
                        });
                        continue;
                    }

                    let right = self.parse_expr(34);
                    let span = Span::new(left.span().start, right.span().end);
                    left = Rc::new(Expr::Assign {
                        var: left,
                        expr: right,
                        span,
                    });
                    just_parsed_ternary = false;
                    continue;
                }
                TokenKind::OpenBracket => {
                    if 210 < min_bp {
                        break;
                    }
                    self.bump();
                    let dim = if self.at(TokenKind::CloseBracket) {
                        None
                    } else {
                        Some(self.parse_expr(0))
                    };
                    self.expect(TokenKind::CloseBracket, "Expected ']'");
                    let span = Span::new(left.span().start, self.prev_end());
                    left = Rc::new(Expr::ArrayDimFetch {
                        array: left,
                        dim,
                        span,
                    });
                    just_parsed_ternary = false;
                    continue;
                }
                TokenKind::Arrow | TokenKind::NullSafeArrow => {
                    if 210 < min_bp {
                        break;
                    }
                    let nullsafe = self.at(TokenKind::NullSafeArrow);
                    self.bump();
                    let member = self.parse_member_name();
                    if self.at(TokenKind::OpenParen) {
                        let args = self.parse_call_arguments();
                        let span = Span::new(left.span().start, self.prev_end());
                        left = Rc::new(Expr::MethodCall {
                            target: left,
                            method: member,
                            args,
                            nullsafe,
                            span,
                        });
                    } else {
                        let span = Span::new(left.span().start, self.prev_end());
                        left = Rc::new(Expr::PropertyFetch {
                            target: left,
                            property: member,
                            nullsafe,
                            span,
                        });
                    }
                    just_parsed_ternary = false;
                    continue;
                }
                TokenKind::DoubleColon => {
                    if 210 < min_bp {
                        break;
                    }
                    self.bump();
                    left = self.parse_static_member(left);
                    just_parsed_ternary = false;
                    continue;
                }
                TokenKind::OpenParen => {
                    if 190 < min_bp {
                        break;
                    }
                    let args = self.parse_call_arguments();
                    let span = Span::new(left.span().start, self.prev_end());
                    left = Rc::new(Expr::Call {
                        func: left,
                        args,
                        span,
                    });
                    just_parsed_ternary = false;
                    continue;
                }
                TokenKind::Inc | TokenKind::Dec => {
                    if 180 < min_bp {
                        break;
                    }
                    let is_inc = self.at(TokenKind::Inc);
                    self.bump();
                    let span = Span::new(left.span().start, self.prev_end());
                    left = Rc::new(if is_inc {
                        Expr::PostInc { var: left, span }
                    } else {
                        Expr::PostDec { var: left, span }
                    });
                    just_parsed_ternary = false;
                    continue;
                }
                _ => break,
            };

            let (l_bp, r_bp) = infix_binding_power(op);
            if l_bp < min_bp {
                break;
            }

            self.bump();
            let right = self.parse_expr(r_bp);
            let span = Span::new(left.span().start, right.span().end);
            left = Rc::new(Expr::Binary {
                left,
                op,
                right,
                span,
            });
            just_parsed_ternary = false;
        }

        left
    }

    /// Member after `->` or `?->`.
    fn parse_member_name(&mut self) -> MemberName {
        let token = self.current();
        if Self::is_identifier_like(token.kind) {
            self.bump();
            MemberName::Identifier(self.string_of(token), token.span)
        } else if self.eat(TokenKind::OpenBrace) {
            let expr = self.parse_expr(0);
            self.expect(TokenKind::CloseBrace, "Expected '}'");
            MemberName::Expr(expr)
        } else if matches!(token.kind, TokenKind::Variable | TokenKind::Dollar) {
            MemberName::Expr(self.parse_variable())
        } else {
            self.error(token.span, "Expected member name");
            MemberName::Expr(Rc::new(Expr::Error { span: token.span }))
        }
    }

    /// Everything after `::`.
    fn parse_static_member(&mut self, left: ExprId) -> ExprId {
        let start = left.span().start;
        let class = match &*left {
            Expr::Name { name, .. } => ClassRef::Name(name.clone()),
            _ => ClassRef::Expr(left.clone()),
        };

        if matches!(self.kind(), TokenKind::Variable | TokenKind::Dollar) {
            let property = self.parse_variable();
            if self.at(TokenKind::OpenParen) {
                let args = self.parse_call_arguments();
                return Rc::new(Expr::StaticCall {
                    class,
                    method: MemberName::Expr(property),
                    args,
                    span: Span::new(start, self.prev_end()),
                });
            }
            return Rc::new(Expr::StaticPropertyFetch {
                class,
                property,
                span: Span::new(start, self.prev_end()),
            });
        }

        let token = self.current();
        let member = if Self::is_identifier_like(token.kind) {
            self.bump();
            MemberName::Identifier(self.string_of(token), token.span)
        } else if self.eat(TokenKind::OpenBrace) {
            let expr = self.parse_expr(0);
            self.expect(TokenKind::CloseBrace, "Expected '}'");
            MemberName::Expr(expr)
        } else {
            self.error(token.span, "Expected member name after '::'");
            MemberName::Expr(Rc::new(Expr::Error { span: token.span }))
        };

        if self.at(TokenKind::OpenParen) {
            let args = self.parse_call_arguments();
            Rc::new(Expr::StaticCall {
                class,
                method: member,
                args,
                span: Span::new(start, self.prev_end()),
            })
        } else {
            Rc::new(Expr::ClassConstFetch {
                class,
                constant: member,
                span: Span::new(start, self.prev_end()),
            })
        }
    }

    /// `$name`, `$$name` or `${expr}`.
    fn parse_variable(&mut self) -> ExprId {
        let token = self.current();
        match token.kind {
            TokenKind::Variable => {
                self.bump();
                let text = self.string_of(token);
                Rc::new(Expr::Variable {
                    name: text.trim_start_matches('$').to_string(),
                    span: token.span,
                })
            }
            TokenKind::Dollar => {
                self.bump();
                let name = if self.eat(TokenKind::OpenBrace) {
                    let expr = self.parse_expr(0);
                    self.expect(TokenKind::CloseBrace, "Expected '}'");
                    expr
                } else {
                    self.parse_variable()
                };
                Rc::new(Expr::IndirectVariable {
                    name,
                    span: Span::new(token.span.start, self.prev_end()),
                })
            }
            _ => {
                self.error(token.span, "Expected variable");
                self.bump();
                Rc::new(Expr::Error { span: token.span })
            }
        }
    }

    fn special_static_name(&mut self) -> crate::parser::ast::Name {
        let token = self.current();
        self.bump();
        self.resolve_name(
            "static".to_string(),
            crate::parser::ast::NameKind::Unqualified,
            token.span,
            NameRole::Class,
        )
    }

    fn parse_parenthesized_args_expr(&mut self) -> ExprId {
        self.expect(TokenKind::OpenParen, "Expected '('");
        let expr = self.parse_expr(0);
        self.expect(TokenKind::CloseParen, "Expected ')'");
        expr
    }

    fn parse_nud(&mut self) -> ExprId {
        let attributes = if self.at(TokenKind::Attribute) {
            self.parse_attributes()
        } else {
            Vec::new()
        };

        let token = self.current();
        let start = token.span.start;
        match token.kind {
            TokenKind::LNumber => {
                self.bump();
                match literal::parse_int(self.text(token)) {
                    NumberLiteral::Int(value) => Rc::new(Expr::Integer {
                        value,
                        span: token.span,
                    }),
                    NumberLiteral::Float(value) => Rc::new(Expr::Float {
                        value,
                        span: token.span,
                    }),
                }
            }
            TokenKind::DNumber => {
                self.bump();
                Rc::new(Expr::Float {
                    value: literal::parse_float(self.text(token)),
                    span: token.span,
                })
            }
            TokenKind::ConstantString => {
                self.bump();
                Rc::new(Expr::String {
                    value: literal::decode_string(self.text(token)),
                    span: token.span,
                })
            }
            TokenKind::InterpolatedString => {
                self.bump();
                Rc::new(Expr::InterpolatedString { span: token.span })
            }
            TokenKind::ShellExec => {
                self.bump();
                Rc::new(Expr::ShellExec { span: token.span })
            }
            TokenKind::TypeTrue | TokenKind::TypeFalse | TokenKind::TypeNull
                if self.peek(1) != TokenKind::NsSeparator =>
            {
                self.bump();
                match token.kind {
                    TokenKind::TypeNull => Rc::new(Expr::Null { span: token.span }),
                    kind => Rc::new(Expr::Boolean {
                        value: kind == TokenKind::TypeTrue,
                        span: token.span,
                    }),
                }
            }
            TokenKind::Variable | TokenKind::Dollar => self.parse_variable(),
            TokenKind::OpenBracket => {
                self.bump();
                let items = self.parse_array_items(TokenKind::CloseBracket);
                Rc::new(Expr::Array {
                    items,
                    span: Span::new(start, self.prev_end()),
                })
            }
            TokenKind::Array if self.peek(1) == TokenKind::OpenParen => {
                self.bump();
                self.bump();
                let items = self.parse_array_items(TokenKind::CloseParen);
                Rc::new(Expr::Array {
                    items,
                    span: Span::new(start, self.prev_end()),
                })
            }
            TokenKind::List => {
                self.bump();
                self.expect(TokenKind::OpenParen, "Expected '(' after list");
                let mut items = Vec::new();
                while !self.at(TokenKind::CloseParen) && !self.at(TokenKind::Eof) {
                    if self.at(TokenKind::Comma) {
                        items.push(None);
                    } else {
                        items.push(Some(self.parse_array_item()));
                    }
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(TokenKind::CloseParen, "Expected ')' to close list");
                Rc::new(Expr::List {
                    items,
                    span: Span::new(start, self.prev_end()),
                })
            }
            TokenKind::OpenParen => {
                self.bump();
                let expr = self.parse_expr(0);
                self.expect(TokenKind::CloseParen, "Expected ')'");
                expr
            }
            TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Bang
            | TokenKind::BitNot
            | TokenKind::At
            | TokenKind::Inc
            | TokenKind::Dec
            | TokenKind::Ampersand => {
                let op = match token.kind {
                    TokenKind::Plus => UnaryOp::Plus,
                    TokenKind::Minus => UnaryOp::Minus,
                    TokenKind::Bang => UnaryOp::Not,
                    TokenKind::BitNot => UnaryOp::BitNot,
                    TokenKind::At => UnaryOp::ErrorSuppress,
                    TokenKind::Inc => UnaryOp::PreInc,
                    TokenKind::Dec => UnaryOp::PreDec,
                    _ => UnaryOp::Reference,
                };
                self.bump();
                let expr = self.parse_expr(180);
                let span = Span::new(start, expr.span().end);
                Rc::new(Expr::Unary { op, expr, span })
            }
            TokenKind::IntCast
            | TokenKind::BoolCast
            | TokenKind::FloatCast
            | TokenKind::StringCast
            | TokenKind::ArrayCast
            | TokenKind::ObjectCast
            | TokenKind::UnsetCast
            | TokenKind::VoidCast => {
                let kind = match token.kind {
                    TokenKind::IntCast => CastKind::Int,
                    TokenKind::BoolCast => CastKind::Bool,
                    TokenKind::FloatCast => CastKind::Float,
                    TokenKind::StringCast => CastKind::String,
                    TokenKind::ArrayCast => CastKind::Array,
                    TokenKind::ObjectCast => CastKind::Object,
                    TokenKind::UnsetCast => CastKind::Unset,
                    _ => CastKind::Void,
                };
                self.bump();
                let expr = self.parse_expr(180);
                let span = Span::new(start, expr.span().end);
                Rc::new(Expr::Cast { kind, expr, span })
            }
            TokenKind::Dir
            | TokenKind::File
            | TokenKind::Line
            | TokenKind::FuncC
            | TokenKind::ClassC
            | TokenKind::TraitC
            | TokenKind::MethodC
            | TokenKind::NsC
            | TokenKind::PropertyC => {
                self.bump();
                let kind = match token.kind {
                    TokenKind::Dir => MagicConstKind::Dir,
                    TokenKind::File => MagicConstKind::File,
                    TokenKind::Line => MagicConstKind::Line,
                    TokenKind::FuncC => MagicConstKind::Function,
                    TokenKind::ClassC => MagicConstKind::Class,
                    TokenKind::TraitC => MagicConstKind::Trait,
                    TokenKind::MethodC => MagicConstKind::Method,
                    TokenKind::NsC => MagicConstKind::Namespace,
                    _ => MagicConstKind::Property,
                };
                Rc::new(Expr::MagicConst {
                    kind,
                    span: token.span,
                })
            }
            TokenKind::Isset => {
                self.bump();
                self.expect(TokenKind::OpenParen, "Expected '(' after isset");
                let mut vars = Vec::new();
                while !self.at(TokenKind::CloseParen) && !self.at(TokenKind::Eof) {
                    vars.push(self.parse_expr(0));
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(TokenKind::CloseParen, "Expected ')' after isset");
                Rc::new(Expr::Isset {
                    vars,
                    span: Span::new(start, self.prev_end()),
                })
            }
            TokenKind::Empty => {
                self.bump();
                let expr = self.parse_parenthesized_args_expr();
                Rc::new(Expr::Empty {
                    expr,
                    span: Span::new(start, self.prev_end()),
                })
            }
            TokenKind::Eval => {
                self.bump();
                let expr = self.parse_parenthesized_args_expr();
                Rc::new(Expr::Eval {
                    expr,
                    span: Span::new(start, self.prev_end()),
                })
            }
            TokenKind::Exit | TokenKind::Die => {
                self.bump();
                let expr = if self.eat(TokenKind::OpenParen) {
                    let expr = if self.at(TokenKind::CloseParen) {
                        None
                    } else {
                        Some(self.parse_expr(0))
                    };
                    self.expect(TokenKind::CloseParen, "Expected ')'");
                    expr
                } else {
                    None
                };
                Rc::new(Expr::Exit {
                    expr,
                    span: Span::new(start, self.prev_end()),
                })
            }
            TokenKind::Include
            | TokenKind::IncludeOnce
            | TokenKind::Require
            | TokenKind::RequireOnce => {
                let kind = match token.kind {
                    TokenKind::Include => IncludeKind::Include,
                    TokenKind::IncludeOnce => IncludeKind::IncludeOnce,
                    TokenKind::Require => IncludeKind::Require,
                    _ => IncludeKind::RequireOnce,
                };
                self.bump();
                let expr = self.parse_expr(0);
                let span = Span::new(start, expr.span().end);
                Rc::new(Expr::Include { kind, expr, span })
            }
            TokenKind::Print => {
                self.bump();
                let expr = self.parse_expr(31);
                let span = Span::new(start, expr.span().end);
                Rc::new(Expr::Print { expr, span })
            }
            TokenKind::Yield => {
                self.bump();
                if self.at_word("from") {
                    self.bump();
                    let value = self.parse_expr(31);
                    let span = Span::new(start, value.span().end);
                    return Rc::new(Expr::Yield {
                        key: None,
                        value: Some(value),
                        from: true,
                        span,
                    });
                }

                if matches!(
                    self.kind(),
                    TokenKind::SemiColon
                        | TokenKind::CloseTag
                        | TokenKind::Eof
                        | TokenKind::CloseParen
                        | TokenKind::CloseBracket
                        | TokenKind::Comma
                ) {
                    return Rc::new(Expr::Yield {
                        key: None,
                        value: None,
                        from: false,
                        span: token.span,
                    });
                }

                let first = self.parse_expr(31);
                let (key, value) = if self.eat(TokenKind::DoubleArrow) {
                    (Some(first), self.parse_expr(31))
                } else {
                    (None, first)
                };
                let span = Span::new(start, value.span().end);
                Rc::new(Expr::Yield {
                    key,
                    value: Some(value),
                    from: false,
                    span,
                })
            }
            TokenKind::Throw => {
                self.bump();
                let expr = self.parse_expr(0);
                let span = Span::new(start, expr.span().end);
                Rc::new(Expr::Throw { expr, span })
            }
            TokenKind::Function => {
                let start = attributes.first().map_or(start, |a| a.span.start);
                let decl = self.parse_closure_decl(attributes, Modifiers::default(), start);
                let span = decl.span;
                Rc::new(Expr::Closure {
                    decl,
                    is_static: false,
                    span,
                })
            }
            TokenKind::Fn => {
                let start = attributes.first().map_or(start, |a| a.span.start);
                let decl = self.parse_arrow_function_decl(attributes, Modifiers::default(), start);
                let span = decl.span;
                Rc::new(Expr::ArrowFunction {
                    decl,
                    is_static: false,
                    span,
                })
            }
            TokenKind::Static => match self.peek(1) {
                TokenKind::Function | TokenKind::Fn => {
                    let start = attributes.first().map_or(start, |a| a.span.start);
                    self.bump();
                    let mut modifiers = Modifiers::default();
                    modifiers.insert(Modifiers::STATIC);
                    if self.at(TokenKind::Function) {
                        let decl = self.parse_closure_decl(attributes, modifiers, start);
                        let span = decl.span;
                        Rc::new(Expr::Closure {
                            decl,
                            is_static: true,
                            span,
                        })
                    } else {
                        let decl = self.parse_arrow_function_decl(attributes, modifiers, start);
                        let span = decl.span;
                        Rc::new(Expr::ArrowFunction {
                            decl,
                            is_static: true,
                            span,
                        })
                    }
                }
                _ => {
                    let name = self.special_static_name();
                    Rc::new(Expr::Name {
                        span: name.span,
                        name,
                    })
                }
            },
            TokenKind::New => self.parse_new(),
            TokenKind::Clone => {
                self.bump();
                let expr = self.parse_expr(200);
                let span = Span::new(start, expr.span().end);
                Rc::new(Expr::Clone { expr, span })
            }
            TokenKind::Match => self.parse_match(),
            kind if self.at_name_start()
                || (kind.is_type_keyword() && kind != TokenKind::TypeNull) =>
            {
                self.parse_name_expr()
            }
            _ => {
                self.error(token.span, "Syntax error, unexpected token");
                self.bump();
                Rc::new(Expr::Error { span: token.span })
            }
        }
    }

    /// A bare name: callee, class operand of `::`, or constant.
    fn parse_name_expr(&mut self) -> ExprId {
        let Some((original, kind, span)) = self.parse_raw_name() else {
            let span = self.current().span;
            self.bump();
            return Rc::new(Expr::Error { span });
        };

        match self.kind() {
            TokenKind::OpenParen => {
                let name = self.resolve_name(original, kind, span, NameRole::Function);
                Rc::new(Expr::Name { name, span })
            }
            TokenKind::DoubleColon => {
                let name = self.resolve_name(original, kind, span, NameRole::Class);
                Rc::new(Expr::Name { name, span })
            }
            _ => {
                if kind == crate::parser::ast::NameKind::FullyQualified {
                    match original.to_ascii_lowercase().as_str() {
                        "true" => return Rc::new(Expr::Boolean { value: true, span }),
                        "false" => return Rc::new(Expr::Boolean { value: false, span }),
                        "null" => return Rc::new(Expr::Null { span }),
                        _ => {}
                    }
                }
                let name = self.resolve_name(original, kind, span, NameRole::Constant);
                Rc::new(Expr::ConstFetch { name, span })
            }
        }
    }

    fn parse_new(&mut self) -> ExprId {
        let start = self.current().span.start;
        self.bump(); // new

        let attributes = self.parse_attributes();
        if matches!(
            self.kind(),
            TokenKind::Class | TokenKind::Final | TokenKind::Abstract | TokenKind::Readonly
        ) {
            let (class, args) = self.parse_anonymous_class(attributes, start);
            return Rc::new(Expr::New {
                class: ClassRef::Anonymous(class),
                args,
                span: Span::new(start, self.prev_end()),
            });
        }
        if !attributes.is_empty() {
            let span = Span::new(start, self.prev_end());
            self.error(span, "Attributes are only allowed on anonymous classes in new expression");
        }

        let class = if self.at(TokenKind::Static) {
            ClassRef::Name(self.special_static_name())
        } else if self.at_name_start() {
            match self.parse_name(NameRole::Class) {
                Some(name) => ClassRef::Name(name),
                None => return Rc::new(Expr::Error {
                    span: Span::new(start, self.prev_end()),
                }),
            }
        } else {
            ClassRef::Expr(self.parse_expr(200))
        };

        let args = if self.at(TokenKind::OpenParen) {
            self.parse_call_arguments()
        } else {
            Vec::new()
        };

        Rc::new(Expr::New {
            class,
            args,
            span: Span::new(start, self.prev_end()),
        })
    }

    fn parse_match(&mut self) -> ExprId {
        let start = self.current().span.start;
        self.bump();
        let condition = self.parse_parenthesized_args_expr();
        self.expect(TokenKind::OpenBrace, "Expected '{' after match condition");

        let mut arms = Vec::new();
        while !self.at(TokenKind::CloseBrace) && !self.at(TokenKind::Eof) {
            let arm_start = self.current().span.start;
            let conditions = if self.at(TokenKind::Default) {
                self.bump();
                self.eat(TokenKind::Comma);
                None
            } else {
                let mut conditions = Vec::new();
                while !self.at(TokenKind::DoubleArrow) && !self.at(TokenKind::Eof) {
                    conditions.push(self.parse_expr(0));
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
                Some(conditions)
            };
            self.expect(TokenKind::DoubleArrow, "Expected '=>' in match arm");
            let body = self.parse_expr(0);
            arms.push(MatchArm {
                conditions,
                body,
                span: Span::new(arm_start, self.prev_end()),
            });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::CloseBrace, "Expected '}' to close match");

        Rc::new(Expr::Match {
            condition,
            arms,
            span: Span::new(start, self.prev_end()),
        })
    }

    fn parse_array_items(&mut self, close: TokenKind) -> Vec<ArrayItem> {
        let mut items = Vec::new();
        while !self.at(close) && !self.at(TokenKind::Eof) {
            // empty slots only occur in destructuring: `[, $b] = $pair`
            if !self.at(TokenKind::Comma) {
                items.push(self.parse_array_item());
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(close, "Expected end of array literal");
        items
    }

    fn parse_array_item(&mut self) -> ArrayItem {
        let start = self.current().span.start;
        if self.eat(TokenKind::Ellipsis) {
            let value = self.parse_expr(0);
            return ArrayItem {
                key: None,
                value,
                by_ref: false,
                unpack: true,
                span: Span::new(start, self.prev_end()),
            };
        }

        let by_ref = self.eat(TokenKind::Ampersand);
        let first = self.parse_expr(0);
        if !by_ref && self.eat(TokenKind::DoubleArrow) {
            let by_ref = self.eat(TokenKind::Ampersand);
            let value = self.parse_expr(0);
            return ArrayItem {
                key: Some(first),
                value,
                by_ref,
                unpack: false,
                span: Span::new(start, self.prev_end()),
            };
        }

        ArrayItem {
            key: None,
            value: first,
            by_ref,
            unpack: false,
            span: Span::new(start, self.prev_end()),
        }
    }
}

fn infix_binding_power(op: BinaryOp) -> (u8, u8) {
    match op {
        BinaryOp::LogicalOr => (10, 11),
        BinaryOp::LogicalXor => (20, 21),
        BinaryOp::LogicalAnd => (30, 31),

        BinaryOp::Coalesce => (51, 50), // right associative

        BinaryOp::Or => (60, 61),  // ||
        BinaryOp::And => (70, 71), // &&

        BinaryOp::BitOr => (80, 81),
        BinaryOp::BitXor => (90, 91),
        BinaryOp::BitAnd => (100, 101),

        BinaryOp::EqEq
        | BinaryOp::NotEq
        | BinaryOp::EqEqEq
        | BinaryOp::NotEqEq
        | BinaryOp::Spaceship => (110, 111),
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => (120, 121),

        BinaryOp::ShiftLeft | BinaryOp::ShiftRight => (130, 131),

        BinaryOp::Plus | BinaryOp::Minus | BinaryOp::Concat => (140, 141),
        BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => (150, 151),

        BinaryOp::Pow => (191, 190), // right associative
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::{BinaryOp, ClassRef, Expr, MemberName, UnaryOp};
    use crate::parser::parser::parse_expression;

    fn expr(source: &str) -> std::rc::Rc<Expr> {
        parse_expression(source.as_bytes()).unwrap_or_else(|e| panic!("{source}: {e:?}"))
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let parsed = expr("2 + 2 * 3");
        let Expr::Binary { op, right, .. } = &*parsed else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinaryOp::Plus);
        assert!(matches!(&**right, Expr::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn pow_is_right_associative_and_beats_unary_minus() {
        let parsed = expr("-2 ** 3 ** 2");
        let Expr::Unary { op: UnaryOp::Minus, expr: inner, .. } = &*parsed else {
            panic!("expected unary minus");
        };
        let Expr::Binary { op: BinaryOp::Pow, right, .. } = &**inner else {
            panic!("expected pow");
        };
        assert!(matches!(&**right, Expr::Binary { op: BinaryOp::Pow, .. }));
    }

    #[test]
    fn class_constant_fetches_resolve_special_names() {
        let parsed = expr("static::class");
        let Expr::ClassConstFetch { class: ClassRef::Name(name), constant, .. } = &*parsed else {
            panic!("expected class constant fetch");
        };
        assert_eq!(name.resolved, "static");
        assert!(matches!(constant, MemberName::Identifier(c, _) if c == "class"));
    }

    #[test]
    fn nested_ternary_without_parentheses_is_rejected() {
        assert!(parse_expression(b"1 ? 2 : 3 ? 4 : 5").is_err());
        assert!(parse_expression(b"1 ?: 2 ?: 3").is_ok());
    }

    #[test]
    fn parses_assorted_expressions() {
        for source in [
            "[1, 'a' => [2, 3], ...$rest]",
            "array(1, 2,)",
            "new Foo(1, named: 2)",
            "new class {}",
            "fn($x) => $x * 2",
            "static function () use (&$y): int { return 1; }",
            "match($x) { 1, 2 => 'a', default => 'b' }",
            "$a?->b()->c[0]::D",
            "yield $k => $v",
            "(int) '12' . PHP_EOL",
            "!$a = foo()",
            "list(, $b) = $pair",
            "$x instanceof \\Foo\\Bar",
            "print 'x'",
            "Foo::$bar",
            "strlen(...)",
            "<<<EOT\n  hi\n  EOT",
        ] {
            expr(source);
        }
    }
}
