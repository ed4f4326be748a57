use crate::parser::span::Span;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn text<'a>(&self, source: &'a [u8]) -> &'a [u8] {
        self.span.as_str(source)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Copy, Serialize)]
pub enum TokenKind {
    // Keywords
    Function,
    Fn,
    Class,
    Interface,
    Trait,
    Enum,
    Extends,
    Implements,
    If,
    Else,
    ElseIf,
    EndIf,
    Return,
    Echo,
    Print,
    While,
    Do,
    For,
    Foreach,
    As,
    Switch,
    Case,
    Default,
    Break,
    Continue,
    Goto,
    Insteadof,
    Try,
    Catch,
    Finally,
    Throw,
    Public,
    Protected,
    Private,
    Static,
    Abstract,
    Final,
    Readonly,
    Var,
    Namespace,
    Use,
    Global,
    New,
    Clone,
    InstanceOf,
    Array,
    List,
    Const,
    Include,
    IncludeOnce,
    Require,
    RequireOnce,
    Eval,
    Exit,
    Die,
    Empty,
    Isset,
    Unset,
    Yield,
    Declare,
    Match,
    HaltCompiler,
    Attribute, // #[

    // Magic constants
    Line,
    File,
    Dir,
    ClassC,
    TraitC,
    MethodC,
    FuncC,
    NsC,
    PropertyC,

    // Reserved type names
    TypeBool,
    TypeInt,
    TypeFloat,
    TypeString,
    TypeObject,
    TypeVoid,
    TypeIterable,
    TypeCallable,
    TypeMixed,
    TypeNever,
    TypeNull,
    TypeFalse,
    TypeTrue,

    // Casts
    IntCast,
    FloatCast,
    StringCast,
    ArrayCast,
    ObjectCast,
    BoolCast,
    UnsetCast,
    VoidCast,

    // Identifiers & literals
    Identifier,
    LNumber,
    DNumber,
    /// Quoted string, nowdoc or heredoc without interpolation.
    ConstantString,
    /// Double-quoted string or heredoc containing `$var` / `{$expr}` parts.
    InterpolatedString,
    /// Backtick shell command.
    ShellExec,
    Variable,
    InlineHtml,
    Dollar,
    NsSeparator,

    // Comments
    Comment,
    DocComment,

    // Symbols
    Arrow,         // ->
    NullSafeArrow, // ?->
    DoubleArrow,   // =>
    DoubleColon,   // ::
    Ellipsis,      // ...

    Plus,
    Minus,
    Asterisk,
    Slash,
    Percent,
    Dot,
    Pow,
    Inc,
    Dec,

    Eq,
    PlusEq,
    MinusEq,
    MulEq,
    DivEq,
    ModEq,
    ConcatEq,
    PowEq,
    AndEq,
    OrEq,
    XorEq,
    SlEq,
    SrEq,
    CoalesceEq,

    EqEq,
    EqEqEq,
    Bang,
    BangEq,
    BangEqEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Spaceship,

    Ampersand,
    Pipe,
    Caret,
    BitNot,
    Sl,
    Sr,

    AmpersandAmpersand,
    PipePipe,
    LogicalAnd,
    LogicalOr,
    LogicalXor,
    Question,
    Coalesce,
    At,

    SemiColon,
    Colon,
    Comma,
    OpenBrace,
    CloseBrace,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,

    OpenTag,
    OpenTagEcho,
    CloseTag,

    Eof,
    Error,
}

impl TokenKind {
    /// Keywords that may still be used as member, constant or label names.
    pub fn is_semi_reserved(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Function
                | Fn
                | Class
                | Interface
                | Trait
                | Enum
                | Extends
                | Implements
                | If
                | Else
                | ElseIf
                | EndIf
                | Return
                | Echo
                | Print
                | While
                | Do
                | For
                | Foreach
                | As
                | Switch
                | Case
                | Default
                | Break
                | Continue
                | Goto
                | Insteadof
                | Try
                | Catch
                | Finally
                | Throw
                | Public
                | Protected
                | Private
                | Static
                | Abstract
                | Final
                | Readonly
                | Var
                | Namespace
                | Use
                | Global
                | New
                | Clone
                | InstanceOf
                | Array
                | List
                | Const
                | Include
                | IncludeOnce
                | Require
                | RequireOnce
                | Eval
                | Exit
                | Die
                | Empty
                | Isset
                | Unset
                | Yield
                | Declare
                | Match
                | HaltCompiler
                | Line
                | File
                | Dir
                | ClassC
                | TraitC
                | MethodC
                | FuncC
                | NsC
                | PropertyC
                | LogicalAnd
                | LogicalOr
                | LogicalXor
                | TypeBool
                | TypeInt
                | TypeFloat
                | TypeString
                | TypeObject
                | TypeVoid
                | TypeIterable
                | TypeCallable
                | TypeMixed
                | TypeNever
                | TypeNull
                | TypeFalse
                | TypeTrue
        )
    }

    /// Reserved type keywords that are otherwise plain names (`int`, `mixed`, ...).
    pub fn is_type_keyword(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            TypeBool
                | TypeInt
                | TypeFloat
                | TypeString
                | TypeObject
                | TypeVoid
                | TypeIterable
                | TypeCallable
                | TypeMixed
                | TypeNever
                | TypeNull
                | TypeFalse
                | TypeTrue
        )
    }
}
