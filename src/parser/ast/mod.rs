use crate::parser::line_index::LineIndex;
use crate::parser::span::{LineInfo, Span};
use serde::Serialize;
use std::fmt;
use std::rc::Rc;

pub type ExprId = Rc<Expr>;
pub type StmtId = Rc<Stmt>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParseError {
    pub span: Span,
    pub message: &'static str,
}

impl ParseError {
    pub fn to_human_readable(&self, source: &[u8]) -> String {
        self.to_human_readable_with_path(source, None)
    }

    pub fn to_human_readable_with_path(&self, source: &[u8], path: Option<&str>) -> String {
        let Some(LineInfo {
            line,
            column,
            line_text,
        }) = self.span.line_info(source)
        else {
            return format!("error: {}", self.message);
        };

        let line_str = String::from_utf8_lossy(line_text);
        let gutter_width = line.to_string().len();
        let padding = std::cmp::min(line_text.len(), column.saturating_sub(1));
        let highlight_len = std::cmp::max(
            1,
            std::cmp::min(self.span.len(), line_text.len().saturating_sub(padding)),
        );

        let location = match path {
            Some(path) => format!("{path}:{line}:{column}"),
            None => format!("line {line}, column {column}"),
        };

        format!(
            "error: {}\n --> {}\n{gutter}|\n{line_no:>width$} | {line_src}\n{gutter}| {pad}{marker}",
            self.message,
            location,
            gutter = " ".repeat(gutter_width + 1),
            line_no = line,
            width = gutter_width,
            line_src = line_str,
            pad = " ".repeat(padding),
            marker = "^".repeat(highlight_len),
        )
    }
}

/// A parsed source file. Declarations are fully parsed; function bodies and
/// statements that cannot declare anything are kept as spans only.
#[derive(Debug, Serialize)]
pub struct Program {
    pub statements: Vec<StmtId>,
    /// Anonymous classes found anywhere in the file, in source order.
    pub anonymous_classes: Vec<Rc<ClassDecl>>,
    /// Closures and arrow functions, in source order.
    pub closures: Vec<Rc<FunctionDecl>>,
    pub errors: Vec<ParseError>,
    #[serde(skip)]
    pub line_index: LineIndex,
    pub span: Span,
}

impl Program {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Debug, Serialize)]
pub enum Stmt {
    Namespace {
        name: Option<String>,
        statements: Vec<StmtId>,
        braced: bool,
        span: Span,
    },
    Use {
        kind: UseKind,
        uses: Vec<UseItem>,
        span: Span,
    },
    Class(Rc<ClassDecl>),
    Function(Rc<FunctionDecl>),
    Const {
        consts: Vec<ConstDecl>,
        doc_comment: Option<Span>,
        span: Span,
    },
    If {
        condition: ExprId,
        then_block: Vec<StmtId>,
        else_ifs: Vec<ElseIf>,
        else_block: Option<Vec<StmtId>>,
        span: Span,
    },
    Block {
        statements: Vec<StmtId>,
        span: Span,
    },
    Expression {
        expr: ExprId,
        span: Span,
    },
    InlineHtml {
        span: Span,
    },
    HaltCompiler {
        span: Span,
    },
    /// Any statement that cannot introduce a declaration.
    Skipped {
        span: Span,
    },
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Namespace { span, .. } => *span,
            Stmt::Use { span, .. } => *span,
            Stmt::Class(decl) => decl.span,
            Stmt::Function(decl) => decl.span,
            Stmt::Const { span, .. } => *span,
            Stmt::If { span, .. } => *span,
            Stmt::Block { span, .. } => *span,
            Stmt::Expression { span, .. } => *span,
            Stmt::InlineHtml { span } => *span,
            Stmt::HaltCompiler { span } => *span,
            Stmt::Skipped { span } => *span,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ElseIf {
    pub condition: ExprId,
    pub statements: Vec<StmtId>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UseKind {
    Normal,
    Function,
    Const,
}

#[derive(Debug, Clone, Serialize)]
pub struct UseItem {
    /// Fully qualified imported name, without a leading separator.
    pub name: String,
    pub alias: String,
    pub kind: UseKind,
    pub span: Span,
}

/// Name of a declaration together with the namespace it was declared in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeclName {
    pub short: String,
    /// `Namespace\Short`, or just the short name in the global namespace.
    pub namespaced: String,
    pub namespace: String,
    pub span: Span,
}

impl DeclName {
    pub fn new(short: &str, namespace: &str, span: Span) -> Self {
        let namespaced = if namespace.is_empty() {
            short.to_string()
        } else {
            format!("{namespace}\\{short}")
        };
        Self {
            short: short.to_string(),
            namespaced,
            namespace: namespace.to_string(),
            span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NameKind {
    Unqualified,
    Qualified,
    FullyQualified,
    /// `namespace\Foo`
    Relative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpecialClassName {
    Self_,
    Static,
    Parent,
}

impl SpecialClassName {
    pub fn as_str(self) -> &'static str {
        match self {
            SpecialClassName::Self_ => "self",
            SpecialClassName::Static => "static",
            SpecialClassName::Parent => "parent",
        }
    }
}

/// A name reference with namespace resolution already applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Name {
    /// The name as written, without a leading separator.
    pub original: String,
    pub kind: NameKind,
    /// Resolved fully qualified name without a leading separator. For
    /// unqualified functions and constants this is the namespaced candidate.
    pub resolved: String,
    /// Global candidate for unqualified function and constant names.
    pub fallback: Option<String>,
    pub span: Span,
}

impl Name {
    pub fn special(&self) -> Option<SpecialClassName> {
        if self.kind != NameKind::Unqualified {
            return None;
        }
        match self.original.to_ascii_lowercase().as_str() {
            "self" => Some(SpecialClassName::Self_),
            "static" => Some(SpecialClassName::Static),
            "parent" => Some(SpecialClassName::Parent),
            _ => None,
        }
    }

    pub fn is_unqualified(&self) -> bool {
        self.kind == NameKind::Unqualified
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.resolved)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Modifiers(u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

impl Modifiers {
    pub const PUBLIC: u16 = 1;
    pub const PROTECTED: u16 = 1 << 1;
    pub const PRIVATE: u16 = 1 << 2;
    pub const STATIC: u16 = 1 << 3;
    pub const ABSTRACT: u16 = 1 << 4;
    pub const FINAL: u16 = 1 << 5;
    pub const READONLY: u16 = 1 << 6;
    /// `var` on a property.
    pub const VAR: u16 = 1 << 7;

    pub fn contains(self, flag: u16) -> bool {
        self.0 & flag != 0
    }

    pub fn insert(&mut self, flag: u16) {
        self.0 |= flag;
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn visibility(self) -> Visibility {
        if self.contains(Self::PRIVATE) {
            Visibility::Private
        } else if self.contains(Self::PROTECTED) {
            Visibility::Protected
        } else {
            Visibility::Public
        }
    }

    pub fn has_visibility(self) -> bool {
        self.0 & (Self::PUBLIC | Self::PROTECTED | Self::PRIVATE) != 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Type {
    /// Built-in type keyword, lowercased (`int`, `?`-less).
    Simple(String),
    Name(Name),
    Nullable(Box<Type>),
    Union(Vec<Type>),
    Intersection(Vec<Type>),
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Simple(name) => f.write_str(name),
            Type::Name(name) => match name.special() {
                Some(special) => f.write_str(special.as_str()),
                None => f.write_str(&name.resolved),
            },
            Type::Nullable(inner) => write!(f, "?{inner}"),
            Type::Union(types) => {
                for (i, ty) in types.iter().enumerate() {
                    if i > 0 {
                        f.write_str("|")?;
                    }
                    match ty {
                        Type::Intersection(_) => write!(f, "({ty})")?,
                        _ => write!(f, "{ty}")?,
                    }
                }
                Ok(())
            }
            Type::Intersection(types) => {
                for (i, ty) in types.iter().enumerate() {
                    if i > 0 {
                        f.write_str("&")?;
                    }
                    write!(f, "{ty}")?;
                }
                Ok(())
            }
        }
    }
}

impl Type {
    pub fn allows_null(&self) -> bool {
        match self {
            Type::Simple(name) => matches!(name.as_str(), "null" | "mixed"),
            Type::Name(_) => false,
            Type::Nullable(_) => true,
            Type::Union(types) => types.iter().any(Type::allows_null),
            Type::Intersection(_) => false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Attribute {
    pub name: Name,
    pub args: Vec<Arg>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttributeGroup {
    pub attributes: Vec<Attribute>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ClassKind {
    Class,
    Interface,
    Trait,
    Enum,
}

#[derive(Debug, Serialize)]
pub struct ClassDecl {
    pub kind: ClassKind,
    /// `None` for anonymous classes.
    pub name: Option<DeclName>,
    pub modifiers: Modifiers,
    /// Parent class for classes, parent interfaces for interfaces.
    pub extends: Vec<Name>,
    pub implements: Vec<Name>,
    pub backing_type: Option<Type>,
    pub members: Vec<ClassMember>,
    pub attributes: Vec<AttributeGroup>,
    pub doc_comment: Option<Span>,
    /// Namespace the declaration appears in, also for anonymous classes.
    pub namespace: String,
    pub span: Span,
}

#[derive(Debug, Serialize)]
pub enum ClassMember {
    Property {
        attributes: Vec<AttributeGroup>,
        modifiers: Modifiers,
        ty: Option<Type>,
        entries: Vec<PropertyEntry>,
        doc_comment: Option<Span>,
        span: Span,
    },
    Method(Rc<FunctionDecl>),
    Const {
        attributes: Vec<AttributeGroup>,
        modifiers: Modifiers,
        ty: Option<Type>,
        consts: Vec<ClassConst>,
        doc_comment: Option<Span>,
        span: Span,
    },
    TraitUse {
        traits: Vec<Name>,
        span: Span,
    },
    Case {
        attributes: Vec<AttributeGroup>,
        name: String,
        value: Option<ExprId>,
        doc_comment: Option<Span>,
        span: Span,
    },
}

#[derive(Debug, Serialize)]
pub struct PropertyEntry {
    pub name: String,
    pub default: Option<ExprId>,
    /// Property hooks are skipped and kept as a span.
    pub hooks: Option<Span>,
    pub span: Span,
}

#[derive(Debug, Serialize)]
pub struct ClassConst {
    pub name: String,
    pub value: ExprId,
    pub span: Span,
}

#[derive(Debug, Serialize)]
pub struct ConstDecl {
    pub name: DeclName,
    pub value: ExprId,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub enum FunctionBody {
    /// Abstract and interface methods.
    None,
    /// Braced body, not parsed.
    Skipped(Span),
    /// Arrow function expression.
    Expr(ExprId),
}

/// Functions, methods, closures and arrow functions.
#[derive(Debug, Serialize)]
pub struct FunctionDecl {
    /// Short name for methods, `{closure}` for closures.
    pub name: DeclName,
    pub modifiers: Modifiers,
    pub by_ref: bool,
    pub params: Vec<Param>,
    pub return_type: Option<Type>,
    pub body: FunctionBody,
    /// Variables imported by a closure's `use` clause.
    pub uses: Vec<ClosureUse>,
    pub attributes: Vec<AttributeGroup>,
    pub doc_comment: Option<Span>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClosureUse {
    pub name: String,
    pub by_ref: bool,
    pub span: Span,
}

#[derive(Debug, Serialize)]
pub struct Param {
    pub name: String,
    pub ty: Option<Type>,
    pub default: Option<ExprId>,
    pub by_ref: bool,
    pub variadic: bool,
    /// Visibility/readonly modifiers of a promoted constructor parameter.
    pub modifiers: Modifiers,
    pub attributes: Vec<AttributeGroup>,
    pub span: Span,
}

impl Param {
    pub fn is_promoted(&self) -> bool {
        !self.modifiers.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Arg {
    pub name: Option<String>,
    pub value: ExprId,
    pub unpack: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArrayItem {
    pub key: Option<ExprId>,
    pub value: ExprId,
    pub by_ref: bool,
    pub unpack: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchArm {
    /// `None` for the `default` arm.
    pub conditions: Option<Vec<ExprId>>,
    pub body: ExprId,
    pub span: Span,
}

/// Class operand of `new`, `::` and `instanceof`.
#[derive(Debug, Clone, Serialize)]
pub enum ClassRef {
    Name(Name),
    Expr(ExprId),
    Anonymous(Rc<ClassDecl>),
}

/// Member name after `->` or `::`.
#[derive(Debug, Clone, Serialize)]
pub enum MemberName {
    Identifier(String, Span),
    Expr(ExprId),
}

#[derive(Debug, Serialize)]
pub enum Expr {
    Assign {
        var: ExprId,
        expr: ExprId,
        span: Span,
    },
    AssignRef {
        var: ExprId,
        expr: ExprId,
        span: Span,
    },
    AssignOp {
        var: ExprId,
        op: AssignOp,
        expr: ExprId,
        span: Span,
    },
    Binary {
        left: ExprId,
        op: BinaryOp,
        right: ExprId,
        span: Span,
    },
    Instanceof {
        expr: ExprId,
        class: ClassRef,
        span: Span,
    },
    Unary {
        op: UnaryOp,
        expr: ExprId,
        span: Span,
    },
    Cast {
        kind: CastKind,
        expr: ExprId,
        span: Span,
    },
    /// Call by name (`foo()`), `func` is an [`Expr::Name`].
    Call {
        func: ExprId,
        args: Vec<Arg>,
        span: Span,
    },
    Array {
        items: Vec<ArrayItem>,
        span: Span,
    },
    List {
        items: Vec<Option<ArrayItem>>,
        span: Span,
    },
    ArrayDimFetch {
        array: ExprId,
        dim: Option<ExprId>,
        span: Span,
    },
    PropertyFetch {
        target: ExprId,
        property: MemberName,
        nullsafe: bool,
        span: Span,
    },
    MethodCall {
        target: ExprId,
        method: MemberName,
        args: Vec<Arg>,
        nullsafe: bool,
        span: Span,
    },
    StaticCall {
        class: ClassRef,
        method: MemberName,
        args: Vec<Arg>,
        span: Span,
    },
    StaticPropertyFetch {
        class: ClassRef,
        property: ExprId,
        span: Span,
    },
    /// `Foo::BAR`, and `Foo::class` with `constant` equal to `class`.
    ClassConstFetch {
        class: ClassRef,
        constant: MemberName,
        span: Span,
    },
    /// Bare name used as a constant.
    ConstFetch {
        name: Name,
        span: Span,
    },
    /// Bare name in callee position.
    Name {
        name: Name,
        span: Span,
    },
    New {
        class: ClassRef,
        args: Vec<Arg>,
        span: Span,
    },
    Variable {
        name: String,
        span: Span,
    },
    IndirectVariable {
        name: ExprId,
        span: Span,
    },
    Integer {
        value: i64,
        span: Span,
    },
    Float {
        value: f64,
        span: Span,
    },
    Boolean {
        value: bool,
        span: Span,
    },
    Null {
        span: Span,
    },
    String {
        value: Vec<u8>,
        span: Span,
    },
    /// Double-quoted string or heredoc with interpolated parts, kept raw.
    InterpolatedString {
        span: Span,
    },
    ShellExec {
        span: Span,
    },
    Include {
        kind: IncludeKind,
        expr: ExprId,
        span: Span,
    },
    MagicConst {
        kind: MagicConstKind,
        span: Span,
    },
    PostInc {
        var: ExprId,
        span: Span,
    },
    PostDec {
        var: ExprId,
        span: Span,
    },
    Ternary {
        condition: ExprId,
        if_true: Option<ExprId>,
        if_false: ExprId,
        span: Span,
    },
    Match {
        condition: ExprId,
        arms: Vec<MatchArm>,
        span: Span,
    },
    Print {
        expr: ExprId,
        span: Span,
    },
    Yield {
        key: Option<ExprId>,
        value: Option<ExprId>,
        from: bool,
        span: Span,
    },
    Throw {
        expr: ExprId,
        span: Span,
    },
    Empty {
        expr: ExprId,
        span: Span,
    },
    Isset {
        vars: Vec<ExprId>,
        span: Span,
    },
    Eval {
        expr: ExprId,
        span: Span,
    },
    Exit {
        expr: Option<ExprId>,
        span: Span,
    },
    Clone {
        expr: ExprId,
        span: Span,
    },
    Closure {
        decl: Rc<FunctionDecl>,
        is_static: bool,
        span: Span,
    },
    ArrowFunction {
        decl: Rc<FunctionDecl>,
        is_static: bool,
        span: Span,
    },
    /// `foo(...)` first-class callable syntax argument.
    VariadicPlaceholder {
        span: Span,
    },
    Error {
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Assign { span, .. }
            | Expr::AssignRef { span, .. }
            | Expr::AssignOp { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Instanceof { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Cast { span, .. }
            | Expr::Call { span, .. }
            | Expr::Array { span, .. }
            | Expr::List { span, .. }
            | Expr::ArrayDimFetch { span, .. }
            | Expr::PropertyFetch { span, .. }
            | Expr::MethodCall { span, .. }
            | Expr::StaticCall { span, .. }
            | Expr::StaticPropertyFetch { span, .. }
            | Expr::ClassConstFetch { span, .. }
            | Expr::ConstFetch { span, .. }
            | Expr::Name { span, .. }
            | Expr::New { span, .. }
            | Expr::Variable { span, .. }
            | Expr::IndirectVariable { span, .. }
            | Expr::Integer { span, .. }
            | Expr::Float { span, .. }
            | Expr::Boolean { span, .. }
            | Expr::Null { span }
            | Expr::String { span, .. }
            | Expr::InterpolatedString { span }
            | Expr::ShellExec { span }
            | Expr::Include { span, .. }
            | Expr::MagicConst { span, .. }
            | Expr::PostInc { span, .. }
            | Expr::PostDec { span, .. }
            | Expr::Ternary { span, .. }
            | Expr::Match { span, .. }
            | Expr::Print { span, .. }
            | Expr::Yield { span, .. }
            | Expr::Throw { span, .. }
            | Expr::Empty { span, .. }
            | Expr::Isset { span, .. }
            | Expr::Eval { span, .. }
            | Expr::Exit { span, .. }
            | Expr::Clone { span, .. }
            | Expr::Closure { span, .. }
            | Expr::ArrowFunction { span, .. }
            | Expr::VariadicPlaceholder { span }
            | Expr::Error { span } => *span,
        }
    }

    /// Node type tag used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Assign { .. } => "Expr_Assign",
            Expr::AssignRef { .. } => "Expr_AssignRef",
            Expr::AssignOp { .. } => "Expr_AssignOp",
            Expr::Binary { .. } => "Expr_BinaryOp",
            Expr::Instanceof { .. } => "Expr_Instanceof",
            Expr::Unary { .. } => "Expr_UnaryOp",
            Expr::Cast { .. } => "Expr_Cast",
            Expr::Call { .. } => "Expr_FuncCall",
            Expr::Array { .. } => "Expr_Array",
            Expr::List { .. } => "Expr_List",
            Expr::ArrayDimFetch { .. } => "Expr_ArrayDimFetch",
            Expr::PropertyFetch { nullsafe: false, .. } => "Expr_PropertyFetch",
            Expr::PropertyFetch { nullsafe: true, .. } => "Expr_NullsafePropertyFetch",
            Expr::MethodCall { nullsafe: false, .. } => "Expr_MethodCall",
            Expr::MethodCall { nullsafe: true, .. } => "Expr_NullsafeMethodCall",
            Expr::StaticCall { .. } => "Expr_StaticCall",
            Expr::StaticPropertyFetch { .. } => "Expr_StaticPropertyFetch",
            Expr::ClassConstFetch { .. } => "Expr_ClassConstFetch",
            Expr::ConstFetch { .. } => "Expr_ConstFetch",
            Expr::Name { .. } => "Name",
            Expr::New { .. } => "Expr_New",
            Expr::Variable { .. } | Expr::IndirectVariable { .. } => "Expr_Variable",
            Expr::Integer { .. } => "Scalar_Int",
            Expr::Float { .. } => "Scalar_Float",
            Expr::Boolean { .. } | Expr::Null { .. } => "Expr_ConstFetch",
            Expr::String { .. } => "Scalar_String",
            Expr::InterpolatedString { .. } => "Scalar_InterpolatedString",
            Expr::ShellExec { .. } => "Expr_ShellExec",
            Expr::Include { .. } => "Expr_Include",
            Expr::MagicConst { .. } => "Scalar_MagicConst",
            Expr::PostInc { .. } => "Expr_PostInc",
            Expr::PostDec { .. } => "Expr_PostDec",
            Expr::Ternary { .. } => "Expr_Ternary",
            Expr::Match { .. } => "Expr_Match",
            Expr::Print { .. } => "Expr_Print",
            Expr::Yield { from: false, .. } => "Expr_Yield",
            Expr::Yield { from: true, .. } => "Expr_YieldFrom",
            Expr::Throw { .. } => "Expr_Throw",
            Expr::Empty { .. } => "Expr_Empty",
            Expr::Isset { .. } => "Expr_Isset",
            Expr::Eval { .. } => "Expr_Eval",
            Expr::Exit { .. } => "Expr_Exit",
            Expr::Clone { .. } => "Expr_Clone",
            Expr::Closure { .. } => "Expr_Closure",
            Expr::ArrowFunction { .. } => "Expr_ArrowFunction",
            Expr::VariadicPlaceholder { .. } => "VariadicPlaceholder",
            Expr::Error { .. } => "Expr_Error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
    BitNot,
    PreInc,
    PreDec,
    ErrorSuppress,
    Reference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    Plus,
    Minus,
    Mul,
    Div,
    Mod,
    Concat, // .
    EqEq,
    EqEqEq,
    NotEq,
    NotEqEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Coalesce,
    Spaceship,
    Pow,
    ShiftLeft,
    ShiftRight,
    LogicalAnd,
    LogicalOr,
    LogicalXor,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Plus => "+",
            BinaryOp::Minus => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Concat => ".",
            BinaryOp::EqEq => "==",
            BinaryOp::EqEqEq => "===",
            BinaryOp::NotEq => "!=",
            BinaryOp::NotEqEq => "!==",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Coalesce => "??",
            BinaryOp::Spaceship => "<=>",
            BinaryOp::Pow => "**",
            BinaryOp::ShiftLeft => "<<",
            BinaryOp::ShiftRight => ">>",
            BinaryOp::LogicalAnd => "and",
            BinaryOp::LogicalOr => "or",
            BinaryOp::LogicalXor => "xor",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssignOp {
    Plus,       // +=
    Minus,      // -=
    Mul,        // *=
    Div,        // /=
    Mod,        // %=
    Concat,     // .=
    BitAnd,     // &=
    BitOr,      // |=
    BitXor,     // ^=
    ShiftLeft,  // <<=
    ShiftRight, // >>=
    Pow,        // **=
    Coalesce,   // ??=
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CastKind {
    Int,
    Bool,
    Float,
    String,
    Array,
    Object,
    Unset,
    Void,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IncludeKind {
    Include,
    IncludeOnce,
    Require,
    RequireOnce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MagicConstKind {
    Dir,
    File,
    Line,
    Function,
    Class,
    Trait,
    Method,
    Namespace,
    Property,
}
