use ast::Span;
use pest::Parser;
use tracing::warn;

use crate::{
    token::{classify_word, Keyword, Operator, Token, TokenKind},
    LexError,
};

#[derive(pest_derive::Parser)]
#[grammar = "lexer.pest"]
struct Scanner;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Normal,
    Table,
}

/// Line-oriented tokenizer. `BEGIN_TABLE` switches the lines after it to
/// table mode, where each line becomes a run of raw fields closed by a
/// row-end token, until a line starting with `END_TABLE`.
pub struct Lexer<'s> {
    source: &'s str,
    mode: Mode,
    tokens: Vec<Token>,
}

impl<'s> Lexer<'s> {
    pub fn new(source: &'s str) -> Self {
        Self {
            source,
            mode: Mode::Normal,
            tokens: Vec::new(),
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut offset = 0;
        let mut line_number = 1;
        for raw_line in self.source.split_inclusive('\n') {
            let line = raw_line.strip_suffix('\n').unwrap_or(raw_line);
            match self.mode {
                Mode::Normal => self.normal_line(line, offset, line_number)?,
                Mode::Table => self.table_line(line, offset, line_number)?,
            }
            offset += raw_line.len();
            line_number += 1;
        }
        let end = self.source.len();
        self.tokens.push(Token {
            kind: TokenKind::Eof,
            text: String::new(),
            span: Span::new(end, end, line_number, 1),
        });
        Ok(self.tokens)
    }

    fn normal_line(&mut self, line: &str, offset: usize, line_number: u32) -> Result<(), LexError> {
        let first = self.tokens.len();
        scan_line(line, offset, line_number, &mut self.tokens)?;
        if self.tokens[first..]
            .iter()
            .any(|t| t.is_keyword(Keyword::BeginTable))
        {
            self.mode = Mode::Table;
        }
        Ok(())
    }

    fn table_line(&mut self, line: &str, offset: usize, line_number: u32) -> Result<(), LexError> {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('!') {
            return Ok(());
        }
        let first_word = trimmed
            .split(|c: char| c.is_whitespace())
            .next()
            .unwrap_or_default();
        if first_word == Keyword::EndTable.name() {
            self.mode = Mode::Normal;
            return scan_line(line, offset, line_number, &mut self.tokens);
        }

        let rule = if line.contains('\t') {
            Rule::tab_row
        } else {
            Rule::ws_row
        };
        let pairs = Scanner::parse(rule, line).map_err(|e| LexError::Scanner {
            message: e.variant.message().to_string(),
            span: Span::new(offset, offset + line.len(), line_number, 1),
        })?;
        for pair in pairs {
            if !matches!(pair.as_rule(), Rule::tab_field | Rule::ws_field) {
                continue;
            }
            let span = pair.as_span();
            let leading = span.as_str().len() - span.as_str().trim_start().len();
            let text = span.as_str().trim();
            let start = span.start() + leading;
            self.tokens.push(Token {
                kind: TokenKind::Field,
                text: text.to_string(),
                span: Span::new(
                    offset + start,
                    offset + start + text.len(),
                    line_number,
                    column(line, start),
                ),
            });
        }
        self.tokens.push(Token {
            kind: TokenKind::RowEnd,
            text: String::new(),
            span: Span::new(
                offset + line.len(),
                offset + line.len(),
                line_number,
                column(line, line.len()),
            ),
        });
        Ok(())
    }
}

/// Tokenizes `text` in normal mode as if it were a single line starting at
/// `origin`. Used for table cells, which arrive as raw fields.
pub fn scan_fragment(text: &str, origin: Span) -> Result<Vec<Token>, LexError> {
    let mut tokens = Vec::new();
    scan_line(text, origin.start, origin.line, &mut tokens)?;
    for token in &mut tokens {
        token.span.col += origin.col - 1;
    }
    let end = origin.start + text.len();
    tokens.push(Token {
        kind: TokenKind::Eof,
        text: String::new(),
        span: Span::new(end, end, origin.line, origin.col + text.chars().count() as u32),
    });
    Ok(tokens)
}

fn column(line: &str, byte: usize) -> u32 {
    line.get(..byte).map_or(0, |s| s.chars().count()) as u32 + 1
}

fn scan_line(
    line: &str,
    offset: usize,
    line_number: u32,
    tokens: &mut Vec<Token>,
) -> Result<(), LexError> {
    let pairs = Scanner::parse(Rule::line, line).map_err(|e| LexError::Scanner {
        message: e.variant.message().to_string(),
        span: Span::new(offset, offset + line.len(), line_number, 1),
    })?;

    for pair in pairs {
        let text = pair.as_str();
        let span = Span::new(
            offset + pair.as_span().start(),
            offset + pair.as_span().end(),
            line_number,
            column(line, pair.as_span().start()),
        );
        let kind = match pair.as_rule() {
            Rule::number => number_kind(text, span)?,
            Rule::word => classify_word(text),
            Rule::string => TokenKind::String(unescape(&text[1..text.len() - 1], span)),
            Rule::operator => match Operator::from_symbol(text) {
                Some(op) => TokenKind::Operator(op),
                None => {
                    return Err(LexError::UnexpectedCharacter {
                        ch: text.chars().next().unwrap_or('?'),
                        span,
                    })
                }
            },
            Rule::unterminated => return Err(LexError::UnterminatedString { span }),
            Rule::unknown => {
                return Err(LexError::UnexpectedCharacter {
                    ch: text.chars().next().unwrap_or('?'),
                    span,
                })
            }
            _ => continue,
        };
        tokens.push(Token {
            kind,
            text: text.to_string(),
            span,
        });
    }
    Ok(())
}

fn number_kind(text: &str, span: Span) -> Result<TokenKind, LexError> {
    let out_of_range = || LexError::NumberOutOfRange {
        text: text.to_string(),
        span,
    };
    if text.contains('.') {
        text.parse::<f64>()
            .map(TokenKind::Double)
            .map_err(|_| out_of_range())
    } else {
        text.parse::<i64>()
            .map(TokenKind::Integer)
            .map_err(|_| out_of_range())
    }
}

fn unescape(body: &str, span: Span) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('a') => out.push('\u{07}'),
            Some('b') => out.push('\u{08}'),
            Some('f') => out.push('\u{0c}'),
            Some('v') => out.push('\u{0b}'),
            Some('\'') => out.push('\''),
            Some('?') => out.push('?'),
            Some(other) => {
                warn!(
                    line = span.line,
                    col = span.col,
                    "unknown escape sequence '\\{other}' kept as written"
                );
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::token::TypeName;
    use ast::{OptionKind, ScalarType};

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn texts(source: &str) -> Vec<String> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .filter(|t| t.kind != TokenKind::Eof)
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn hyphen_joins_only_before_letters() {
        assert_eq!(texts("file-name"), vec!["file-name"]);
        assert_eq!(texts("ELEVY-10"), vec!["ELEVY", "-", "10"]);
        assert_eq!(texts("a-_b c-"), vec!["a-_b", "c", "-"]);
    }

    #[test]
    fn minus_is_never_part_of_a_number() {
        assert_eq!(
            kinds("-5 2.5"),
            vec![
                TokenKind::Operator(Operator::Minus),
                TokenKind::Integer(5),
                TokenKind::Double(2.5),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn comments_run_to_end_of_line() {
        assert_eq!(texts("x = 1 ! trailing\ny"), vec!["x", "=", "1", "y"]);
        assert_eq!(texts("a != b"), vec!["a", "!=", "b"]);
    }

    #[test]
    fn word_classes() {
        assert_eq!(
            kinds("USER_INPUT_PARAM DOUBLE w REQUIRED TRUE AND"),
            vec![
                TokenKind::Keyword(Keyword::UserInputParam),
                TokenKind::Type(TypeName::Scalar(ScalarType::Double)),
                TokenKind::Identifier,
                TokenKind::Option(OptionKind::Required),
                TokenKind::Bool(true),
                TokenKind::Operator(Operator::And),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn string_escapes() {
        let tokens = Lexer::new(r#""a\tb\"c\qd""#).tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::String("a\tb\"c\\qd".to_string()));
    }

    #[test]
    fn unterminated_string_reports_position() {
        let error = Lexer::new("x = 1\ny = \"open\n").tokenize().unwrap_err();
        assert!(matches!(error, LexError::UnterminatedString { .. }));
        assert_eq!(error.span().line, 2);
        assert_eq!(error.span().col, 5);
    }

    #[test]
    fn unexpected_character_is_fatal() {
        let error = Lexer::new("x = 1 # 2").tokenize().unwrap_err();
        assert!(matches!(error, LexError::UnexpectedCharacter { ch: '#', .. }));
    }

    #[test]
    fn tracks_lines_and_columns() {
        let tokens = Lexer::new("IF x\n  y = 2\nEND_IF").tokenize().unwrap();
        let y = &tokens[2];
        assert_eq!(y.text, "y");
        assert_eq!((y.span.line, y.span.col), (2, 3));
    }

    #[test]
    fn table_mode_splits_fields_until_end_table() {
        let source = "BEGIN_TABLE sizes\nname\tlen\tok\n\"small part\"\t10\n! note\n\nEND_TABLE\nx = 1";
        let tokens = Lexer::new(source).tokenize().unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Keyword(Keyword::BeginTable),
                TokenKind::Identifier,
                TokenKind::Field,
                TokenKind::Field,
                TokenKind::Field,
                TokenKind::RowEnd,
                TokenKind::Field,
                TokenKind::Field,
                TokenKind::RowEnd,
                TokenKind::Keyword(Keyword::EndTable),
                TokenKind::Identifier,
                TokenKind::Operator(Operator::Assign),
                TokenKind::Integer(1),
                TokenKind::Eof,
            ]
        );
        assert_eq!(tokens[6].text, "\"small part\"");
    }

    #[test]
    fn whitespace_rows_keep_quoted_fields_whole() {
        let tokens = Lexer::new("BEGIN_TABLE t\na   \"b c\"  d\nEND_TABLE")
            .tokenize()
            .unwrap();
        let fields: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Field)
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(fields, vec!["a", "\"b c\"", "d"]);
    }
}
