use ast::{NodeId, Span, Spanned};

use crate::{
    token::{Keyword, Operator, Token, TokenKind},
    ParseError, ParseErrorKind,
};

/// Position in a token stream that always ends with an `Eof` token.
pub(crate) struct TokenCursor {
    tokens: Vec<Token>,
    pos: usize,
    next_id: u32,
}

impl TokenCursor {
    pub(crate) fn new(mut tokens: Vec<Token>, first_id: u32) -> Self {
        if tokens.last().map_or(true, |t| t.kind != TokenKind::Eof) {
            let end = tokens.last().map(|t| t.span).unwrap_or_default();
            tokens.push(Token {
                kind: TokenKind::Eof,
                text: String::new(),
                span: Span::new(end.end, end.end, end.line, end.col),
            });
        }
        Self {
            tokens,
            pos: 0,
            next_id: first_id,
        }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    pub(crate) fn peek_nth(&self, n: usize) -> &Token {
        &self.tokens[(self.pos + n).min(self.tokens.len() - 1)]
    }

    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.pos.saturating_sub(1).min(self.tokens.len() - 1)]
    }

    pub(crate) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn at_eof(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    /// True when the next token sits on the line of the last consumed token.
    /// Optional command tails only extend over their own line.
    pub(crate) fn on_same_line(&self) -> bool {
        let next = self.peek();
        self.pos > 0
            && !matches!(next.kind, TokenKind::Eof | TokenKind::RowEnd)
            && next.span.line == self.previous().span.line
    }

    pub(crate) fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    pub(crate) fn check_operator(&self, op: Operator) -> bool {
        self.peek().is_operator(op)
    }

    pub(crate) fn eat_operator(&mut self, op: Operator) -> bool {
        if self.check_operator(op) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn check_keyword(&self, keyword: Keyword) -> bool {
        self.peek().is_keyword(keyword)
    }

    pub(crate) fn expect_operator(
        &mut self,
        op: Operator,
        expected: &str,
    ) -> Result<Span, ParseError> {
        if self.check_operator(op) {
            Ok(self.advance().span)
        } else {
            Err(self.unexpected(expected))
        }
    }

    pub(crate) fn expect_keyword(&mut self, keyword: Keyword) -> Result<Span, ParseError> {
        if self.check_keyword(keyword) {
            Ok(self.advance().span)
        } else {
            Err(self.unexpected(keyword.name()))
        }
    }

    pub(crate) fn expect_identifier(
        &mut self,
        expected: &str,
    ) -> Result<Spanned<String>, ParseError> {
        if self.peek().kind == TokenKind::Identifier {
            let token = self.advance();
            Ok((token.span, token.text))
        } else {
            Err(self.unexpected(expected))
        }
    }

    pub(crate) fn unexpected(&self, expected: &str) -> ParseError {
        let token = self.peek();
        ParseError::new(
            ParseErrorKind::Unexpected {
                expected: expected.to_string(),
                found: token.describe(),
            },
            token.span,
        )
    }
}
