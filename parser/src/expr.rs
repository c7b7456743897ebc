use ast::{Builtin, ComparisonOperator, Expression, FactorOperator, TermOperator, UnaryOperator};

use crate::{
    program::Parser,
    token::{Operator, TokenKind},
    ParseError, ParseErrorKind,
};

#[derive(Clone, Copy)]
enum BinaryOp {
    Logical(Operator),
    Comparison(ComparisonOperator),
    Term(TermOperator),
    Factor(FactorOperator),
}

impl BinaryOp {
    fn from_operator(op: Operator) -> Option<(u8, BinaryOp)> {
        Some(match op {
            Operator::And | Operator::Or => (1, BinaryOp::Logical(op)),
            Operator::Equal => (2, BinaryOp::Comparison(ComparisonOperator::Equal)),
            Operator::NotEqual => (2, BinaryOp::Comparison(ComparisonOperator::NotEqual)),
            Operator::Less => (2, BinaryOp::Comparison(ComparisonOperator::LessThan)),
            Operator::LessEqual => (2, BinaryOp::Comparison(ComparisonOperator::LessThanOrEqual)),
            Operator::Greater => (2, BinaryOp::Comparison(ComparisonOperator::GreaterThan)),
            Operator::GreaterEqual => {
                (2, BinaryOp::Comparison(ComparisonOperator::GreaterThanOrEqual))
            }
            Operator::Plus => (3, BinaryOp::Term(TermOperator::Plus)),
            Operator::Minus => (3, BinaryOp::Term(TermOperator::Minus)),
            Operator::Star => (4, BinaryOp::Factor(FactorOperator::Multiply)),
            Operator::Slash => (4, BinaryOp::Factor(FactorOperator::Divide)),
            Operator::Percent => (4, BinaryOp::Factor(FactorOperator::Modulo)),
            _ => return None,
        })
    }

    fn build(self, lhs: Expression, rhs: Expression) -> Expression {
        let (lhs, rhs) = (Box::new(lhs), Box::new(rhs));
        match self {
            BinaryOp::Logical(Operator::Or) => Expression::Or(lhs, rhs),
            BinaryOp::Logical(_) => Expression::And(lhs, rhs),
            BinaryOp::Comparison(op) => Expression::Comparison(lhs, op, rhs),
            BinaryOp::Term(op) => Expression::Term(lhs, op, rhs),
            BinaryOp::Factor(op) => Expression::Factor(lhs, op, rhs),
        }
    }
}

impl Parser {
    pub(crate) fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        self.parse_binary(1)
    }

    /// Precedence climbing. Every level folds left, so a relational chain
    /// `a < b < c` compares the boolean result of `a < b` with `c`.
    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expression, ParseError> {
        let mut lhs = self.parse_unary()?;
        while let Some((precedence, op)) = self.peek_binary_operator() {
            if precedence < min_precedence {
                break;
            }
            self.cursor.advance();
            let rhs = self.parse_binary(precedence + 1)?;
            lhs = op.build(lhs, rhs);
        }
        Ok(lhs)
    }

    fn peek_binary_operator(&self) -> Option<(u8, BinaryOp)> {
        if !self.cursor.on_same_line() {
            return None;
        }
        match self.cursor.peek().kind {
            TokenKind::Operator(op) => BinaryOp::from_operator(op),
            _ => None,
        }
    }

    fn parse_unary(&mut self) -> Result<Expression, ParseError> {
        if self.cursor.eat_operator(Operator::Minus) {
            let operand = self.parse_unary()?;
            return Ok(Expression::Unary(UnaryOperator::Negate, Box::new(operand)));
        }
        let primary = self.parse_primary()?;
        self.parse_postfix(primary)
    }

    pub(crate) fn parse_primary(&mut self) -> Result<Expression, ParseError> {
        let token = self.cursor.peek().clone();
        let expr = match token.kind {
            TokenKind::Integer(value) => Expression::IntegerLiteral {
                value,
                raw: token.text,
            },
            TokenKind::Double(value) => Expression::DoubleLiteral {
                value,
                raw: token.text,
            },
            TokenKind::String(text) => Expression::StringLiteral(text),
            TokenKind::Bool(value) => Expression::BooleanLiteral(value),
            TokenKind::Type(_) | TokenKind::Option(_) => Expression::Constant(token.text),
            TokenKind::Operator(Operator::LParen) => {
                self.cursor.advance();
                let inner = self.parse_expression()?;
                self.cursor.expect_operator(Operator::RParen, "')'")?;
                return Ok(inner);
            }
            TokenKind::Identifier => {
                self.cursor.advance();
                if self.cursor.on_same_line() && self.cursor.check_operator(Operator::LParen) {
                    return self.parse_call(&token.text, token.span);
                }
                return Ok(split_hyphenated(&token.text));
            }
            _ => return Err(self.cursor.unexpected("expression")),
        };
        self.cursor.advance();
        Ok(expr)
    }

    fn parse_call(&mut self, name: &str, span: ast::Span) -> Result<Expression, ParseError> {
        let builtin = Builtin::lookup(name).ok_or_else(|| {
            ParseError::new(ParseErrorKind::UnknownFunction(name.to_string()), span)
        })?;
        self.cursor.expect_operator(Operator::LParen, "'('")?;
        let mut args = Vec::new();
        if !self.cursor.check_operator(Operator::RParen) {
            loop {
                args.push(self.parse_expression()?);
                if !self.cursor.eat_operator(Operator::Comma) {
                    break;
                }
            }
        }
        let close = self.cursor.expect_operator(Operator::RParen, "')' or ','")?;
        if !builtin.arity().accepts(args.len()) {
            return Err(ParseError::new(
                ParseErrorKind::WrongArgumentCount {
                    name: name.to_string(),
                    expected: builtin.arity().to_string(),
                    found: args.len(),
                },
                span.to(close),
            ));
        }
        Ok(Expression::Call(builtin, args))
    }

    /// `[index]`, `.member` and `:key` chains behind a primary.
    fn parse_postfix(&mut self, mut expr: Expression) -> Result<Expression, ParseError> {
        while self.cursor.on_same_line() {
            if self.cursor.eat_operator(Operator::LBracket) {
                let index = self.parse_expression()?;
                self.cursor.expect_operator(Operator::RBracket, "']'")?;
                expr = Expression::Index(Box::new(expr), Box::new(index));
            } else if self.cursor.eat_operator(Operator::Dot) {
                let (_, member) = self.cursor.expect_identifier("member name")?;
                expr = Expression::Member(Box::new(expr), member);
            } else if self.cursor.eat_operator(Operator::Colon) {
                let key = self.parse_primary()?;
                expr = Expression::Key(Box::new(expr), Box::new(key));
            } else {
                break;
            }
        }
        Ok(expr)
    }
}

/// `WIDTH-OFFSET` scans as one identifier because the hyphen is followed by a
/// letter. Without a `.` in the word it is read back as a subtraction of its
/// parts. A hyphenated name meant literally (a file name without extension)
/// is misread by this rule; the string path renders such a subtraction back
/// as text when its operands are not numbers.
pub(crate) fn split_hyphenated(word: &str) -> Expression {
    if !word.contains('-') || word.contains('.') {
        return Expression::Variable(word.to_string());
    }
    let mut parts = word.split('-').map(|part| match part.parse::<i64>() {
        Ok(value) => Expression::IntegerLiteral {
            value,
            raw: part.to_string(),
        },
        Err(_) => Expression::Variable(part.to_string()),
    });
    let first = parts
        .next()
        .unwrap_or_else(|| Expression::Variable(word.to_string()));
    parts.fold(first, |lhs, rhs| {
        Expression::Term(Box::new(lhs), TermOperator::Minus, Box::new(rhs))
    })
}
