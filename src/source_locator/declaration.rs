use super::error::LocatorError;
use super::located_source::LocatedSource;
use crate::identifier::{ANONYMOUS_CLASS_PREFIX, Identifier, IdentifierKind, split_name};
use crate::parser::ast::{ClassDecl, ConstDecl, Expr, ExprId, FunctionDecl, Program};
use crate::parser::span::Span;
use std::rc::Rc;

/// Top-level constant, from a `const` statement or a `define()` call.
#[derive(Debug, Clone)]
pub struct ConstantDeclaration {
    /// Fully qualified name as declared.
    pub name: String,
    pub value: ExprId,
    pub doc_comment: Option<Span>,
    pub span: Span,
    pub via_define: bool,
    /// Namespace the declaration appears in, which for `define()` can
    /// differ from the namespace of the declared name.
    pub site_namespace: String,
}

impl ConstantDeclaration {
    pub fn from_const(decl: &ConstDecl, doc_comment: Option<Span>) -> Self {
        Self {
            name: decl.name.namespaced.clone(),
            value: decl.value.clone(),
            doc_comment,
            span: decl.span,
            via_define: false,
            site_namespace: decl.name.namespace.clone(),
        }
    }

    /// `define('NAME', value)` with an optional third argument. Anything
    /// else is an [`LocatorError::InvalidConstantNode`].
    pub fn from_define_call(
        expr: &Expr,
        source: &[u8],
        site_namespace: &str,
    ) -> Result<Self, LocatorError> {
        let invalid = || {
            let span = expr.span();
            let text = String::from_utf8_lossy(span.as_str(source));
            LocatorError::InvalidConstantNode(text.chars().take(50).collect())
        };

        let Expr::Call { func, args, span } = expr else {
            return Err(invalid());
        };
        if !is_define_callee(func) {
            return Err(invalid());
        }
        if !(2..=3).contains(&args.len()) || args.iter().any(|arg| arg.unpack || arg.name.is_some()) {
            return Err(invalid());
        }
        let Expr::String { value: name, .. } = &*args[0].value else {
            return Err(invalid());
        };
        let name = String::from_utf8_lossy(name);
        let Ok(identifier) = Identifier::constant(&name) else {
            return Err(invalid());
        };

        Ok(Self {
            name: identifier.name().to_string(),
            value: args[1].value.clone(),
            doc_comment: None,
            span: *span,
            via_define: true,
            site_namespace: site_namespace.to_string(),
        })
    }

    pub fn short_name(&self) -> &str {
        split_name(&self.name).1
    }

    pub fn namespace(&self) -> &str {
        split_name(&self.name).0
    }
}

fn is_define_callee(func: &Expr) -> bool {
    let Expr::Name { name, .. } = func else {
        return false;
    };
    let global = name.fallback.as_deref().unwrap_or(&name.resolved);
    global.eq_ignore_ascii_case("define")
}

/// Whether a statement expression is a call to `define`.
pub fn is_define_call(expr: &Expr) -> bool {
    matches!(expr, Expr::Call { func, .. } if is_define_callee(func))
}

#[derive(Debug, Clone)]
pub enum Declaration {
    Class(Rc<ClassDecl>),
    Function(Rc<FunctionDecl>),
    Constant(ConstantDeclaration),
}

impl Declaration {
    pub fn kind(&self) -> IdentifierKind {
        match self {
            Declaration::Class(_) => IdentifierKind::Class,
            Declaration::Function(_) => IdentifierKind::Function,
            Declaration::Constant(_) => IdentifierKind::Constant,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Declaration::Class(decl) => decl.span,
            Declaration::Function(decl) => decl.span,
            Declaration::Constant(decl) => decl.span,
        }
    }
}

/// Declaration together with the source and tree it was found in.
#[derive(Debug, Clone)]
pub struct LocatedDeclaration {
    pub source: Rc<LocatedSource>,
    pub program: Rc<Program>,
    pub declaration: Declaration,
}

impl LocatedDeclaration {
    /// Declared name; anonymous classes get their synthetic name.
    pub fn name(&self) -> String {
        match &self.declaration {
            Declaration::Class(decl) => match &decl.name {
                Some(name) => name.namespaced.clone(),
                None => anonymous_class_name(
                    self.source.file_name(),
                    self.program.line_index.start_line(decl.span),
                ),
            },
            Declaration::Function(decl) => decl.name.namespaced.clone(),
            Declaration::Constant(decl) => decl.name.clone(),
        }
    }

    pub fn kind(&self) -> IdentifierKind {
        self.declaration.kind()
    }
}

/// `class@anonymous<file>:<line>`
pub fn anonymous_class_name(file: Option<&str>, line: usize) -> String {
    format!("{ANONYMOUS_CLASS_PREFIX}{}:{line}", file.unwrap_or(""))
}

/// Splits a synthetic anonymous class name into file and line.
pub fn parse_anonymous_class_name(name: &str) -> Option<(&str, usize)> {
    let rest = name.strip_prefix(ANONYMOUS_CLASS_PREFIX)?;
    let (file, line) = rest.rsplit_once(':')?;
    Some((file, line.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::Stmt;
    use crate::parser::parser::parse;

    fn first_expr(source: &[u8]) -> ExprId {
        let program = parse(source);
        assert!(program.errors.is_empty(), "{:?}", program.errors);
        match &*program.statements[0] {
            Stmt::Expression { expr, .. } => expr.clone(),
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    #[test]
    fn reads_define_calls() {
        let source = b"<?php define('App\\\\LIMIT', 10);";
        let expr = first_expr(source);
        let decl = ConstantDeclaration::from_define_call(&expr, source, "").unwrap();
        assert_eq!(decl.name, "App\\LIMIT");
        assert_eq!(decl.short_name(), "LIMIT");
        assert_eq!(decl.namespace(), "App");
        assert!(decl.via_define);
    }

    #[test]
    fn rejects_malformed_define_calls() {
        for source in [
            &b"<?php define('ONLY_NAME');"[..],
            b"<?php define($name, 1);",
            b"<?php define('1BAD', 1);",
        ] {
            let expr = first_expr(source);
            assert!(matches!(
                ConstantDeclaration::from_define_call(&expr, source, ""),
                Err(LocatorError::InvalidConstantNode(_))
            ));
        }
    }

    #[test]
    fn anonymous_class_names_round_trip() {
        let name = anonymous_class_name(Some("/src/a.php"), 7);
        assert_eq!(name, "class@anonymous/src/a.php:7");
        assert_eq!(parse_anonymous_class_name(&name), Some(("/src/a.php", 7)));
    }
}
