use super::{NameRole, Parser};
use crate::parser::ast::Type;
use crate::parser::lexer::token::TokenKind;

impl<'src> Parser<'src> {
    fn parse_type_atomic(&mut self) -> Option<Type> {
        let token = self.current();
        if self.eat(TokenKind::Question) {
            let ty = self.parse_type_atomic()?;
            Some(Type::Nullable(Box::new(ty)))
        } else if self.eat(TokenKind::OpenParen) {
            let ty = self.parse_type();
            self.expect(TokenKind::CloseParen, "Expected ')' in type");
            ty
        } else if token.kind.is_type_keyword()
            || matches!(token.kind, TokenKind::Array | TokenKind::Static)
        {
            self.bump();
            Some(Type::Simple(self.string_of(token).to_ascii_lowercase()))
        } else if self.at_name_start() || Self::is_identifier_like(token.kind) {
            self.parse_name(NameRole::Class).map(Type::Name)
        } else {
            None
        }
    }

    /// `&` continues an intersection only when a type follows, so `A &$x`
    /// stays a by-reference parameter.
    fn at_intersection_ampersand(&self) -> bool {
        self.at(TokenKind::Ampersand)
            && !matches!(
                self.peek(1),
                TokenKind::Variable | TokenKind::Ellipsis | TokenKind::Eq
            )
    }

    fn parse_type_intersection(&mut self) -> Option<Type> {
        let first = self.parse_type_atomic()?;
        if !self.at_intersection_ampersand() {
            return Some(first);
        }

        let mut types = vec![first];
        while self.at_intersection_ampersand() {
            self.bump();
            match self.parse_type_atomic() {
                Some(ty) => types.push(ty),
                None => break,
            }
        }
        Some(Type::Intersection(types))
    }

    pub(super) fn parse_type(&mut self) -> Option<Type> {
        let first = self.parse_type_intersection()?;
        if !self.at(TokenKind::Pipe) {
            return Some(first);
        }

        let mut types = vec![first];
        while self.eat(TokenKind::Pipe) {
            match self.parse_type_intersection() {
                Some(ty) => types.push(ty),
                None => {
                    let span = self.current().span;
                    self.error(span, "Expected type after '|'");
                    break;
                }
            }
        }
        Some(Type::Union(types))
    }

    pub(super) fn parse_return_type(&mut self) -> Option<Type> {
        if !self.eat(TokenKind::Colon) {
            return None;
        }
        let ty = self.parse_type();
        if ty.is_none() {
            let span = self.current().span;
            self.error(span, "Expected return type");
        }
        ty
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::{ClassMember, Stmt};
    use crate::parser::parser::parse;

    fn method_types(source: &[u8]) -> Vec<String> {
        let program = parse(source);
        assert!(program.errors.is_empty(), "{:?}", program.errors);
        let Stmt::Class(class) = &*program.statements[0] else {
            panic!("expected class");
        };
        class
            .members
            .iter()
            .filter_map(|m| match m {
                ClassMember::Method(method) => method.return_type.as_ref().map(|t| t.to_string()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn renders_union_intersection_and_nullable_types() {
        let types = method_types(
            b"<?php class T {
                function a(): ?int {}
                function b(): int|string|null {}
                function c(): (\\A&\\B)|null {}
                function d(): static {}
                function e(): self {}
            }",
        );
        assert_eq!(types, vec!["?int", "int|string|null", "(A&B)|null", "static", "self"]);
    }
}
