//! Syntactic analysis: token sequence to AST.
//!
//! Recursive descent with speculative backtracking. The parser keeps an
//! explicit stack of token positions: entering a production pushes the
//! current position, success pops it and adopts the inner position,
//! failure pops and reverts. The contract is that a failed production
//! leaves no visible state change, so alternatives can be tried in order.
//!
//! When several alternatives fail, their errors are combined with
//! [`ParseError::Join`] so the final message lists every failed
//! expectation.

use std::fmt;

use bumpalo::Bump;

use crate::ast::{
    Block, Expression, ExpressionKind, FunctionDefinition, Identifier, IntegerLiteral, Parameter,
    Root, Signature, Span, Statement, StatementKind, TopLevelItem, TopLevelItemKind, TypeExpr,
    TypeExprKind,
};
use crate::ast::BinaryOpKind;
use crate::lexer::{Token, TokenKind, TokenTag};
use crate::types::IntegerSize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A mandatory token was missing.
    ExpectedToken {
        span: Span,
        expected: TokenTag,
        got: TokenTag,
    },
    /// A run of type keywords did not form a valid integer type.
    InvalidIntegerType { span: Span },
    /// Both sides of an alternative failed.
    Join(Box<ParseError>, Box<ParseError>),
}

impl ParseError {
    pub fn join(left: ParseError, right: ParseError) -> ParseError {
        ParseError::Join(Box::new(left), Box::new(right))
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::ExpectedToken {
                span,
                expected,
                got,
            } => {
                write!(f, "({}) expected {}, got {}", span, expected, got)
            }
            ParseError::InvalidIntegerType { span } => {
                write!(f, "({}) invalid integer type", span)
            }
            ParseError::Join(left, right) => write!(f, "{} OR {}", left, right),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse a token sequence into an AST allocated in `arena`.
pub fn parse<'a>(tokens: Vec<Token<'a>>, arena: &'a Bump) -> Result<Root<'a>, ParseError> {
    Parser::new(tokens, arena).parse_root()
}

struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    /// Backtracking stack; the top entry is the current token position.
    positions: Vec<usize>,
    /// Most recently consumed token, used for span ends and error anchors.
    last_token: Token<'a>,
    arena: &'a Bump,
}

impl<'a> Parser<'a> {
    fn new(tokens: Vec<Token<'a>>, arena: &'a Bump) -> Self {
        Parser {
            tokens,
            positions: vec![0],
            last_token: Token {
                kind: TokenKind::Unknown,
                span: Span::default(),
            },
            arena,
        }
    }

    // ------------------------
    //   backtracking machinery
    // ------------------------

    fn current_position(&self) -> usize {
        self.positions[self.positions.len() - 1]
    }

    fn token_at(&self, index: usize) -> Token<'a> {
        self.tokens.get(index).copied().unwrap_or(Token {
            kind: TokenKind::Unknown,
            span: Span::default(),
        })
    }

    fn peek(&self) -> Token<'a> {
        self.token_at(self.current_position())
    }

    fn advance(&mut self) -> Token<'a> {
        let token = self.peek();
        self.last_token = token;
        let top = self.positions.len() - 1;
        self.positions[top] += 1;
        token
    }

    fn push_position(&mut self) {
        self.positions.push(self.current_position());
    }

    /// Accept the speculative position and return the span of the tokens
    /// the production consumed.
    fn commit(&mut self) -> Span {
        let Some(inner) = self.positions.pop() else {
            unreachable!("parser position stack underflow");
        };
        let top = self.positions.len() - 1;
        let start = self.token_at(self.positions[top]).span.start;
        let end = self.last_token.span.end;
        self.positions[top] = inner;
        Span::new(start, end)
    }

    /// Discard the speculative position, restoring the pre-production state.
    fn revert(&mut self) {
        if self.positions.pop().is_none() {
            unreachable!("parser position stack underflow");
        }
    }

    /// Run a production speculatively; on failure the token position is
    /// restored.
    fn attempt<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        self.push_position();
        match parse(self) {
            Ok(value) => {
                self.commit();
                Ok(value)
            }
            Err(error) => {
                self.revert();
                Err(error)
            }
        }
    }

    /// Like [`Parser::attempt`], additionally returning the span of the
    /// consumed tokens.
    fn spanned<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<(T, Span), ParseError> {
        self.push_position();
        match parse(self) {
            Ok(value) => {
                let span = self.commit();
                Ok((value, span))
            }
            Err(error) => {
                self.revert();
                Err(error)
            }
        }
    }

    /// Consume the next token if it has the given tag.
    fn accept(&mut self, tag: TokenTag) -> bool {
        if self.peek().kind.tag() == tag {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expected(&self, expected: TokenTag) -> ParseError {
        let got = self.peek();
        ParseError::ExpectedToken {
            span: got.span,
            expected,
            got: got.kind.tag(),
        }
    }

    fn expect(&mut self, tag: TokenTag) -> Result<Token<'a>, ParseError> {
        if self.peek().kind.tag() == tag {
            Ok(self.advance())
        } else {
            Err(self.expected(tag))
        }
    }

    fn expect_identifier(&mut self) -> Result<Identifier<'a>, ParseError> {
        let token = self.peek();
        if let TokenKind::Identifier(name) = token.kind {
            self.advance();
            Ok(Identifier {
                name,
                span: token.span,
            })
        } else {
            Err(self.expected(TokenTag::Identifier))
        }
    }

    fn expect_integer(&mut self) -> Result<(IntegerLiteral, Span), ParseError> {
        let token = self.peek();
        if let TokenKind::Integer {
            value,
            is_long,
            is_signed,
        } = token.kind
        {
            self.advance();
            Ok((
                IntegerLiteral {
                    value,
                    is_long,
                    is_signed,
                },
                token.span,
            ))
        } else {
            Err(self.expected(TokenTag::Integer))
        }
    }

    // ---------------------
    //   parsing functions
    // ---------------------

    // root = top_level_item* EOF
    fn parse_root(&mut self) -> Result<Root<'a>, ParseError> {
        let mut items = Vec::new();

        while !self.accept(TokenTag::Eof) {
            items.push(self.parse_top_level_item()?);
        }

        let items: &'a [TopLevelItem<'a>] = self.arena.alloc_slice_fill_iter(items);
        Ok(Root { items })
    }

    // top_level_item = function_definition
    fn parse_top_level_item(&mut self) -> Result<TopLevelItem<'a>, ParseError> {
        let function = self.parse_function_definition()?;
        Ok(TopLevelItem {
            span: function.span,
            kind: TopLevelItemKind::FunctionDefinition(function),
        })
    }

    // function_definition = function_signature block
    fn parse_function_definition(&mut self) -> Result<FunctionDefinition<'a>, ParseError> {
        let ((signature, body), span) = self.spanned(|p| {
            let signature = p.parse_function_signature()?;
            let body = p.parse_block()?;
            Ok((signature, body))
        })?;

        Ok(FunctionDefinition {
            signature,
            body,
            span,
        })
    }

    // function_signature = type identifier `(` parameter_list? `)`
    fn parse_function_signature(&mut self) -> Result<Signature<'a>, ParseError> {
        let ((name, return_type, parameters), span) = self.spanned(|p| {
            let return_type = p.parse_type()?;
            let name = p.parse_identifier()?;

            p.expect(TokenTag::LeftParen)?;

            let mut parameters = Vec::new();
            if !p.accept(TokenTag::RightParen) {
                loop {
                    parameters.push(p.parse_parameter()?);
                    if !p.accept(TokenTag::Comma) {
                        break;
                    }
                }
                p.expect(TokenTag::RightParen)?;
            }

            let parameters: &'a [Parameter<'a>] = p.arena.alloc_slice_fill_iter(parameters);
            Ok((name, return_type, parameters))
        })?;

        Ok(Signature {
            name,
            return_type,
            parameters,
            span,
        })
    }

    // parameter = type identifier?
    fn parse_parameter(&mut self) -> Result<Parameter<'a>, ParseError> {
        let ((ty, name), span) = self.spanned(|p| {
            let ty = p.parse_type()?;
            let name = p.expect_identifier().ok();
            Ok((ty, name))
        })?;

        Ok(Parameter { name, ty, span })
    }

    // block = `{` statement* `}`
    fn parse_block(&mut self) -> Result<Block<'a>, ParseError> {
        let (statements, span) = self.spanned(|p| {
            p.expect(TokenTag::LeftBrace)?;

            let mut statements = Vec::new();
            while !p.accept(TokenTag::RightBrace) {
                statements.push(p.parse_statement()?);
            }

            let statements: &'a [Statement<'a>] = p.arena.alloc_slice_fill_iter(statements);
            Ok(statements)
        })?;

        Ok(Block { statements, span })
    }

    // statement = return | variable_declaration | expression `;`
    fn parse_statement(&mut self) -> Result<Statement<'a>, ParseError> {
        let return_error = match self.parse_return() {
            Ok(statement) => return Ok(statement),
            Err(error) => error,
        };

        let declaration_error = match self.parse_variable_declaration() {
            Ok(statement) => return Ok(statement),
            Err(error) => error,
        };

        let expression_error = match self.parse_expression_statement() {
            Ok(statement) => return Ok(statement),
            Err(error) => error,
        };

        Err(ParseError::join(
            ParseError::join(return_error, declaration_error),
            expression_error,
        ))
    }

    // return = `return` expression? `;`
    fn parse_return(&mut self) -> Result<Statement<'a>, ParseError> {
        let (kind, span) = self.spanned(|p| {
            p.expect(TokenTag::KeywordReturn)?;

            if p.accept(TokenTag::Semicolon) {
                return Ok(StatementKind::Return(None));
            }

            let expression = p.parse_expression()?;
            p.expect(TokenTag::Semicolon)?;

            Ok(StatementKind::Return(Some(
                &*p.arena.alloc(expression),
            )))
        })?;

        Ok(Statement { kind, span })
    }

    // variable_declaration = type identifier (`=` expression)? `;`
    fn parse_variable_declaration(&mut self) -> Result<Statement<'a>, ParseError> {
        let (kind, span) = self.spanned(|p| {
            let ty = p.parse_type()?;
            let name = p.parse_identifier()?;

            let initializer = if p.accept(TokenTag::Equals) {
                let expression = p.parse_expression()?;
                Some(&*p.arena.alloc(expression))
            } else {
                None
            };

            p.expect(TokenTag::Semicolon)?;

            Ok(StatementKind::VariableDeclaration {
                name,
                ty,
                initializer,
            })
        })?;

        Ok(Statement { kind, span })
    }

    fn parse_expression_statement(&mut self) -> Result<Statement<'a>, ParseError> {
        let (kind, span) = self.spanned(|p| {
            let expression = p.parse_expression()?;
            p.expect(TokenTag::Semicolon)?;
            Ok(StatementKind::Expression(expression))
        })?;

        Ok(Statement { kind, span })
    }

    // expression = assignment | additive
    fn parse_expression(&mut self) -> Result<Expression<'a>, ParseError> {
        let assignment_error = match self.parse_assignment() {
            Ok(expression) => return Ok(expression),
            Err(error) => error,
        };

        let additive_error = match self.parse_additive_expression() {
            Ok(expression) => return Ok(expression),
            Err(error) => error,
        };

        Err(ParseError::join(assignment_error, additive_error))
    }

    // assignment = identifier `=` expression
    fn parse_assignment(&mut self) -> Result<Expression<'a>, ParseError> {
        let (kind, span) = self.spanned(|p| {
            let assignee = p.parse_identifier()?;
            p.expect(TokenTag::Equals)?;
            let value = p.parse_expression()?;

            Ok(ExpressionKind::Assignment {
                assignee,
                value: &*p.arena.alloc(value),
            })
        })?;

        Ok(Expression { kind, span })
    }

    /// Left-associative binary operator chain: operators of equal
    /// precedence group left, so the chain is folded iteratively.
    fn parse_binary_operation(
        &mut self,
        operators: &[(TokenTag, BinaryOpKind)],
        next_precedence: fn(&mut Self) -> Result<Expression<'a>, ParseError>,
    ) -> Result<Expression<'a>, ParseError> {
        let mut left = next_precedence(self)?;

        'chain: loop {
            for &(tag, op) in operators {
                if self.accept(tag) {
                    let right = next_precedence(self)?;
                    let span = left.span.to(right.span);

                    left = Expression {
                        kind: ExpressionKind::BinaryOp {
                            op,
                            left: &*self.arena.alloc(left),
                            right: &*self.arena.alloc(right),
                        },
                        span,
                    };

                    continue 'chain;
                }
            }
            break;
        }

        Ok(left)
    }

    // additive = multiplicative ((`+`|`-`) multiplicative)*
    fn parse_additive_expression(&mut self) -> Result<Expression<'a>, ParseError> {
        self.attempt(|p| {
            p.parse_binary_operation(
                &[
                    (TokenTag::Plus, BinaryOpKind::Add),
                    (TokenTag::Minus, BinaryOpKind::Sub),
                ],
                Self::parse_multiplicative_expression,
            )
        })
    }

    // multiplicative = primary ((`*`|`/`) primary)*
    fn parse_multiplicative_expression(&mut self) -> Result<Expression<'a>, ParseError> {
        self.attempt(|p| {
            p.parse_binary_operation(
                &[
                    (TokenTag::Asterisk, BinaryOpKind::Mul),
                    (TokenTag::Slash, BinaryOpKind::Div),
                ],
                Self::parse_primary_expression,
            )
        })
    }

    // primary = call | identifier | constant | `(` expression `)`
    fn parse_primary_expression(&mut self) -> Result<Expression<'a>, ParseError> {
        // `call` before `identifier`: a call begins with one
        let call_error = match self.parse_call() {
            Ok(expression) => return Ok(expression),
            Err(error) => error,
        };

        let identifier_error = match self.parse_identifier_expression() {
            Ok(expression) => return Ok(expression),
            Err(error) => error,
        };

        let constant_error = match self.parse_constant() {
            Ok(expression) => return Ok(expression),
            Err(error) => error,
        };

        let bracketed_error = match self.parse_bracketed_expression() {
            Ok(expression) => return Ok(expression),
            Err(error) => error,
        };

        Err(ParseError::join(
            ParseError::join(
                ParseError::join(call_error, identifier_error),
                constant_error,
            ),
            bracketed_error,
        ))
    }

    // call = identifier `(` (expression (`,` expression)*)? `)`
    fn parse_call(&mut self) -> Result<Expression<'a>, ParseError> {
        let (kind, span) = self.spanned(|p| {
            let callee = p.parse_identifier()?;

            p.expect(TokenTag::LeftParen)?;

            let mut arguments = Vec::new();
            if !p.accept(TokenTag::RightParen) {
                loop {
                    arguments.push(p.parse_expression()?);
                    if !p.accept(TokenTag::Comma) {
                        break;
                    }
                }
                p.expect(TokenTag::RightParen)?;
            }

            let arguments: &'a [Expression<'a>] = p.arena.alloc_slice_fill_iter(arguments);
            Ok(ExpressionKind::Call { callee, arguments })
        })?;

        Ok(Expression { kind, span })
    }

    fn parse_identifier_expression(&mut self) -> Result<Expression<'a>, ParseError> {
        let identifier = self.expect_identifier()?;
        Ok(Expression {
            kind: ExpressionKind::Identifier(identifier),
            span: identifier.span,
        })
    }

    fn parse_constant(&mut self) -> Result<Expression<'a>, ParseError> {
        let (literal, span) = self.expect_integer()?;
        Ok(Expression {
            kind: ExpressionKind::Constant(literal),
            span,
        })
    }

    // bracketed_expression = `(` expression `)`
    fn parse_bracketed_expression(&mut self) -> Result<Expression<'a>, ParseError> {
        let (mut expression, span) = self.spanned(|p| {
            p.expect(TokenTag::LeftParen)?;
            let expression = p.parse_expression()?;
            p.expect(TokenTag::RightParen)?;
            Ok(expression)
        })?;

        // the node covers the parentheses
        expression.span = span;
        Ok(expression)
    }

    fn parse_identifier(&mut self) -> Result<Identifier<'a>, ParseError> {
        self.expect_identifier()
    }

    // type = integer_type
    fn parse_type(&mut self) -> Result<TypeExpr, ParseError> {
        let (kind, span) = self.spanned(Self::parse_integer_type_kind)?;
        Ok(TypeExpr { kind, span })
    }

    // integer_type = (int|long|short|char|signed|unsigned)+
    //
    // Flags are accumulated over the keyword run, then contradictions are
    // rejected: `char` with any of `int`/`long`/`short`, `long` with
    // `short`, `signed` with `unsigned`. `char` without an explicit
    // qualifier is unsigned; everything else is signed unless `unsigned`
    // is present.
    fn parse_integer_type_kind(&mut self) -> Result<TypeExprKind, ParseError> {
        let mut is_ok = false;
        let mut is_int = false;
        let mut is_char = false;
        let mut is_short = false;
        let mut is_long = false;
        let mut is_signed = false;
        let mut is_unsigned = false;

        loop {
            if self.accept(TokenTag::KeywordInt) {
                if is_int {
                    is_ok = false;
                    break;
                }
                is_ok = true;
                is_int = true;
            } else if self.accept(TokenTag::KeywordLong) {
                is_ok = true;
                is_long = true;
            } else if self.accept(TokenTag::KeywordShort) {
                is_ok = true;
                is_short = true;
            } else if self.accept(TokenTag::KeywordChar) {
                is_ok = true;
                is_char = true;
            } else if self.accept(TokenTag::KeywordSigned) {
                is_ok = true;
                is_signed = true;
            } else if self.accept(TokenTag::KeywordUnsigned) {
                is_ok = true;
                is_unsigned = true;
            } else {
                break;
            }
        }

        // reject contradictions
        if is_char && (is_int || is_long || is_short) {
            is_ok = false;
        }
        if is_long && is_short {
            is_ok = false;
        }
        if is_signed && is_unsigned {
            is_ok = false;
        }

        if !is_ok {
            return Err(ParseError::InvalidIntegerType {
                span: self.last_token.span,
            });
        }

        let size = if is_char {
            IntegerSize::S8
        } else if is_short {
            IntegerSize::S16
        } else if is_long {
            IntegerSize::S64
        } else {
            IntegerSize::S32
        };
        let is_signed = if is_char { is_signed } else { !is_unsigned };

        Ok(TypeExprKind::Integer { size, is_signed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Pos;
    use crate::lexer::tokenize;

    fn parse_source<'a>(source: &'a str, arena: &'a Bump) -> Result<Root<'a>, ParseError> {
        parse(tokenize(source), arena)
    }

    fn single_function<'a>(root: &Root<'a>) -> &'a FunctionDefinition<'a> {
        assert_eq!(root.items.len(), 1);
        let TopLevelItemKind::FunctionDefinition(ref function) = root.items[0].kind;
        function
    }

    fn parse_statement_kind<'a>(source: &'a str, arena: &'a Bump) -> StatementKind<'a> {
        let root = parse_source(source, arena).unwrap();
        let function = single_function(&root);
        assert_eq!(function.body.statements.len(), 1);
        function.body.statements[0].kind
    }

    #[test]
    fn test_parse_minimal_program() {
        let arena = Bump::new();
        let root = parse_source("int main() { return 0; }", &arena).unwrap();
        let function = single_function(&root);

        assert_eq!(function.signature.name.name, "main");
        assert!(function.signature.parameters.is_empty());
        assert_eq!(
            function.signature.return_type.kind,
            TypeExprKind::Integer {
                size: IntegerSize::S32,
                is_signed: true
            }
        );
        assert_eq!(function.body.statements.len(), 1);
        assert!(matches!(
            function.body.statements[0].kind,
            StatementKind::Return(Some(_))
        ));
    }

    #[test]
    fn test_parse_empty_source() {
        let arena = Bump::new();
        let root = parse_source("", &arena).unwrap();
        assert!(root.items.is_empty());
    }

    #[test]
    fn test_node_spans_cover_tokens() {
        let arena = Bump::new();
        let root = parse_source("int main() { return 0; }", &arena).unwrap();
        let function = single_function(&root);

        assert_eq!(function.span.start, Pos { line: 1, column: 1 });
        assert_eq!(function.span.end, Pos { line: 1, column: 24 });
        assert_eq!(
            function.signature.span.end,
            Pos {
                line: 1,
                column: 10
            }
        );
        let statement = &function.body.statements[0];
        assert_eq!(
            statement.span.start,
            Pos {
                line: 1,
                column: 14
            }
        );
        assert_eq!(
            statement.span.end,
            Pos {
                line: 1,
                column: 22
            }
        );
    }

    #[test]
    fn test_parameters_with_and_without_names() {
        let arena = Bump::new();
        let root = parse_source("int f(int a, long, unsigned char c) {}", &arena).unwrap();
        let function = single_function(&root);
        let parameters = function.signature.parameters;

        assert_eq!(parameters.len(), 3);
        assert_eq!(parameters[0].name.map(|n| n.name), Some("a"));
        assert_eq!(parameters[1].name, None);
        assert_eq!(
            parameters[1].ty.kind,
            TypeExprKind::Integer {
                size: IntegerSize::S64,
                is_signed: true
            }
        );
        assert_eq!(parameters[2].name.map(|n| n.name), Some("c"));
        assert_eq!(
            parameters[2].ty.kind,
            TypeExprKind::Integer {
                size: IntegerSize::S8,
                is_signed: false
            }
        );
    }

    #[test]
    fn test_variable_declaration_with_initializer() {
        let arena = Bump::new();
        let kind = parse_statement_kind("int main() { long x = 5; }", &arena);

        let StatementKind::VariableDeclaration {
            name,
            ty,
            initializer,
        } = kind
        else {
            panic!("expected variable declaration, got {:?}", kind);
        };
        assert_eq!(name.name, "x");
        assert_eq!(
            ty.kind,
            TypeExprKind::Integer {
                size: IntegerSize::S64,
                is_signed: true
            }
        );
        assert!(matches!(
            initializer,
            Some(Expression {
                kind: ExpressionKind::Constant(IntegerLiteral { value: 5, .. }),
                ..
            })
        ));
    }

    #[test]
    fn test_assignment_is_an_expression() {
        let arena = Bump::new();
        let kind = parse_statement_kind("int main() { x = 1; }", &arena);

        let StatementKind::Expression(expression) = kind else {
            panic!("expected expression statement, got {:?}", kind);
        };
        assert!(matches!(
            expression.kind,
            ExpressionKind::Assignment { assignee, .. } if assignee.name == "x"
        ));
    }

    #[test]
    fn test_call_tried_before_identifier() {
        let arena = Bump::new();

        let kind = parse_statement_kind("int main() { f(1, x); }", &arena);
        let StatementKind::Expression(expression) = kind else {
            panic!("expected expression statement");
        };
        let ExpressionKind::Call { callee, arguments } = expression.kind else {
            panic!("expected call, got {:?}", expression.kind);
        };
        assert_eq!(callee.name, "f");
        assert_eq!(arguments.len(), 2);

        let kind = parse_statement_kind("int main() { f; }", &arena);
        let StatementKind::Expression(expression) = kind else {
            panic!("expected expression statement");
        };
        assert!(matches!(expression.kind, ExpressionKind::Identifier(_)));
    }

    #[test]
    fn test_binary_operators_group_left() {
        let arena = Bump::new();
        let kind = parse_statement_kind("int main() { a - b - c; }", &arena);

        let StatementKind::Expression(expression) = kind else {
            panic!("expected expression statement");
        };
        // ((a - b) - c)
        let ExpressionKind::BinaryOp { op, left, right } = expression.kind else {
            panic!("expected binary op");
        };
        assert_eq!(op, BinaryOpKind::Sub);
        assert!(matches!(
            right.kind,
            ExpressionKind::Identifier(Identifier { name: "c", .. })
        ));
        let ExpressionKind::BinaryOp {
            op: inner_op,
            left: inner_left,
            ..
        } = left.kind
        else {
            panic!("expected nested binary op, got {:?}", left.kind);
        };
        assert_eq!(inner_op, BinaryOpKind::Sub);
        assert!(matches!(
            inner_left.kind,
            ExpressionKind::Identifier(Identifier { name: "a", .. })
        ));
    }

    #[test]
    fn test_multiplication_binds_tighter_than_addition() {
        let arena = Bump::new();
        let kind = parse_statement_kind("int main() { a + b * c; }", &arena);

        let StatementKind::Expression(expression) = kind else {
            panic!("expected expression statement");
        };
        let ExpressionKind::BinaryOp { op, right, .. } = expression.kind else {
            panic!("expected binary op");
        };
        assert_eq!(op, BinaryOpKind::Add);
        assert!(matches!(
            right.kind,
            ExpressionKind::BinaryOp {
                op: BinaryOpKind::Mul,
                ..
            }
        ));
    }

    #[test]
    fn test_parentheses_override_precedence() {
        let arena = Bump::new();
        let kind = parse_statement_kind("int main() { (a + b) * c; }", &arena);

        let StatementKind::Expression(expression) = kind else {
            panic!("expected expression statement");
        };
        let ExpressionKind::BinaryOp { op, left, .. } = expression.kind else {
            panic!("expected binary op");
        };
        assert_eq!(op, BinaryOpKind::Mul);
        assert!(matches!(
            left.kind,
            ExpressionKind::BinaryOp {
                op: BinaryOpKind::Add,
                ..
            }
        ));
    }

    #[test]
    fn test_return_without_expression() {
        let arena = Bump::new();
        let kind = parse_statement_kind("int main() { return; }", &arena);
        assert!(matches!(kind, StatementKind::Return(None)));
    }

    #[test]
    fn test_contradictory_type_keywords() {
        let arena = Bump::new();

        for source in [
            "char int main() {}",
            "long short main() {}",
            "signed unsigned main() {}",
            "int int main() {}",
        ] {
            let error = parse_source(source, &arena).unwrap_err();
            fn contains_invalid_integer_type(error: &ParseError) -> bool {
                match error {
                    ParseError::InvalidIntegerType { .. } => true,
                    ParseError::Join(left, right) => {
                        contains_invalid_integer_type(left) || contains_invalid_integer_type(right)
                    }
                    ParseError::ExpectedToken { .. } => false,
                }
            }
            assert!(
                contains_invalid_integer_type(&error),
                "source {:?} produced {:?}",
                source,
                error
            );
        }
    }

    #[test]
    fn test_missing_semicolon_reports_expectation() {
        let arena = Bump::new();
        let error = parse_source("int main() { return 0 }", &arena).unwrap_err();
        let message = error.to_string();
        assert!(message.contains("`;`"), "message was: {}", message);
    }

    #[test]
    fn test_failed_alternatives_are_joined() {
        let arena = Bump::new();
        // `5 = 1;` is not a statement: every alternative fails
        let error = parse_source("int main() { = }", &arena).unwrap_err();
        assert!(matches!(error, ParseError::Join(..)));
        let message = error.to_string();
        assert!(message.contains(" OR "), "message was: {}", message);
    }

    #[test]
    fn test_unary_minus_is_not_in_the_grammar() {
        let arena = Bump::new();
        assert!(parse_source("int main() { return -1; }", &arena).is_err());
    }

    #[test]
    fn test_error_position_points_at_offending_token() {
        let arena = Bump::new();
        let error = parse_source("int main() { int 5; }", &arena).unwrap_err();
        // all alternatives fail; at minimum the variable declaration
        // expects an identifier where `5` sits
        fn find_expected_identifier(error: &ParseError) -> Option<Span> {
            match error {
                ParseError::ExpectedToken {
                    span,
                    expected: TokenTag::Identifier,
                    ..
                } => Some(*span),
                ParseError::Join(left, right) => {
                    find_expected_identifier(left).or_else(|| find_expected_identifier(right))
                }
                _ => None,
            }
        }
        let span = find_expected_identifier(&error).expect("no identifier expectation reported");
        assert_eq!(
            span.start,
            Pos {
                line: 1,
                column: 18
            }
        );
    }

    #[test]
    fn test_nested_calls_and_expressions() {
        let arena = Bump::new();
        let kind = parse_statement_kind("int main() { f(g(1), 2 + 3 * 4); }", &arena);
        let StatementKind::Expression(expression) = kind else {
            panic!("expected expression statement");
        };
        let ExpressionKind::Call { arguments, .. } = expression.kind else {
            panic!("expected call");
        };
        assert_eq!(arguments.len(), 2);
        assert!(matches!(arguments[0].kind, ExpressionKind::Call { .. }));
        assert!(matches!(
            arguments[1].kind,
            ExpressionKind::BinaryOp {
                op: BinaryOpKind::Add,
                ..
            }
        ));
    }
}
