//! Abstract syntax tree for the supported C subset.
//!
//! All nodes are allocated in a single `bumpalo::Bump` arena owned by the
//! compilation session; references between nodes (`&'a Expression<'a>` and
//! friends) borrow that arena and never outlive it. The arena is dropped
//! wholesale when compilation ends.
//!
//! Every node carries a [`Span`] anchoring it to the source text for
//! diagnostics.

use std::fmt;

use crate::types::IntegerSize;

/// A source position, 1-based in both line and column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pos {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A `(start, end)` pair of source positions identifying the text of a
/// token or AST node. Both ends are inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    pub start: Pos,
    pub end: Pos,
}

impl Span {
    pub fn new(start: Pos, end: Pos) -> Self {
        Span { start, end }
    }

    /// Span of a single position.
    pub fn at(pos: Pos) -> Self {
        Span {
            start: pos,
            end: pos,
        }
    }

    /// The smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Self {
        Span {
            start: self.start,
            end: other.end,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// An identifier occurrence, borrowing its name from the source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identifier<'a> {
    pub name: &'a str,
    pub span: Span,
}

/// An integer literal together with the flags derived from its `u`/`l`
/// suffixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegerLiteral {
    pub value: u64,
    pub is_long: bool,
    pub is_signed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOpKind {
    Negation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOpKind {
    Add,
    Sub,
    Mul,
    Div,
}

impl fmt::Display for BinaryOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOpKind::Add => "+",
            BinaryOpKind::Sub => "-",
            BinaryOpKind::Mul => "*",
            BinaryOpKind::Div => "/",
        };
        f.write_str(symbol)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Expression<'a> {
    pub kind: ExpressionKind<'a>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy)]
pub enum ExpressionKind<'a> {
    Identifier(Identifier<'a>),
    Constant(IntegerLiteral),
    Assignment {
        assignee: Identifier<'a>,
        value: &'a Expression<'a>,
    },
    Call {
        callee: Identifier<'a>,
        arguments: &'a [Expression<'a>],
    },
    UnaryOp {
        op: UnaryOpKind,
        operand: &'a Expression<'a>,
    },
    BinaryOp {
        op: BinaryOpKind,
        left: &'a Expression<'a>,
        right: &'a Expression<'a>,
    },
}

/// A type as written in the source. Only integer types exist so far; the
/// semantic type system reserves kinds for the rest of the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeExprKind {
    Integer { size: IntegerSize, is_signed: bool },
}

#[derive(Debug, Clone, Copy)]
pub struct Statement<'a> {
    pub kind: StatementKind<'a>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy)]
pub enum StatementKind<'a> {
    Expression(Expression<'a>),
    VariableDeclaration {
        name: Identifier<'a>,
        ty: TypeExpr,
        initializer: Option<&'a Expression<'a>>,
    },
    Return(Option<&'a Expression<'a>>),
}

/// An ordered sequence of statements between braces.
#[derive(Debug, Clone, Copy)]
pub struct Block<'a> {
    pub statements: &'a [Statement<'a>],
    pub span: Span,
}

/// One function parameter. The name is optional; `int f(int)` is a valid
/// signature.
#[derive(Debug, Clone, Copy)]
pub struct Parameter<'a> {
    pub name: Option<Identifier<'a>>,
    pub ty: TypeExpr,
    pub span: Span,
}

#[derive(Debug, Clone, Copy)]
pub struct Signature<'a> {
    pub name: Identifier<'a>,
    pub return_type: TypeExpr,
    pub parameters: &'a [Parameter<'a>],
    pub span: Span,
}

#[derive(Debug, Clone, Copy)]
pub struct FunctionDefinition<'a> {
    pub signature: Signature<'a>,
    pub body: Block<'a>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy)]
pub struct TopLevelItem<'a> {
    pub kind: TopLevelItemKind<'a>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy)]
pub enum TopLevelItemKind<'a> {
    FunctionDefinition(FunctionDefinition<'a>),
}

/// The root of a parsed translation unit.
#[derive(Debug, Clone, Copy)]
pub struct Root<'a> {
    pub items: &'a [TopLevelItem<'a>],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_display_single_position() {
        let span = Span::at(Pos { line: 3, column: 7 });
        assert_eq!(span.to_string(), "3:7");
    }

    #[test]
    fn test_span_display_range() {
        let span = Span::new(Pos { line: 1, column: 1 }, Pos { line: 2, column: 5 });
        assert_eq!(span.to_string(), "1:1-2:5");
    }

    #[test]
    fn test_span_join_covers_both() {
        let a = Span::at(Pos { line: 1, column: 2 });
        let b = Span::at(Pos { line: 4, column: 9 });
        let joined = a.to(b);
        assert_eq!(joined.start, a.start);
        assert_eq!(joined.end, b.end);
    }

    #[test]
    fn test_binary_op_display() {
        assert_eq!(BinaryOpKind::Add.to_string(), "+");
        assert_eq!(BinaryOpKind::Div.to_string(), "/");
    }
}
