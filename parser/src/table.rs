use ast::{Column, Expression, Row, ScalarType, Table};
use tracing::trace;

use crate::{
    lexer::scan_fragment,
    program::Parser,
    token::{Keyword, Token, TokenKind},
    ParseError, ParseErrorKind,
};

impl Parser {
    /// Everything after `BEGIN_TABLE` up to and including `END_TABLE`.
    ///
    /// Row-level problems are recorded and the row dropped, so one bad row
    /// does not discard the whole table.
    pub(crate) fn parse_table(&mut self) -> Result<Table, ParseError> {
        let name = self.cursor.expect_identifier("table name")?;
        let title = if self.cursor.on_same_line()
            && !matches!(self.cursor.peek().kind, TokenKind::Option(_))
        {
            Some(self.parse_expression()?)
        } else {
            None
        };
        let options = self.parse_options()?;
        self.expect_line_end()?;

        let header = self.take_row()?.ok_or_else(|| self.missing_row("header"))?;
        let columns_named: Vec<String> = header.iter().map(|t| t.text.clone()).collect();
        let type_row = self.take_row()?.ok_or_else(|| self.missing_row("type"))?;
        if type_row.len() != columns_named.len() {
            return Err(ParseError::new(
                ParseErrorKind::TypeRowMismatch {
                    expected: columns_named.len(),
                    found: type_row.len(),
                },
                type_row.first().map_or(self.cursor.previous().span, |t| t.span),
            ));
        }
        let mut columns = Vec::with_capacity(columns_named.len());
        for (name, field) in columns_named.into_iter().zip(&type_row) {
            let ty = ScalarType::from_name(&field.text).ok_or_else(|| {
                ParseError::new(ParseErrorKind::UnknownType(field.text.clone()), field.span)
            })?;
            columns.push(Column { name, ty });
        }

        let mut rows = Vec::new();
        while let Some(fields) = self.take_row()? {
            match self.parse_row(&columns, &fields) {
                Ok(row) => rows.push(row),
                Err(error) => self.errors.push(error),
            }
        }
        self.cursor.expect_keyword(Keyword::EndTable)?;
        self.expect_line_end()?;
        trace!(table = %name.1, columns = columns.len(), rows = rows.len(), "parsed table");
        Ok(Table {
            name,
            title,
            options,
            columns,
            rows,
        })
    }

    /// The fields of the next table row, or `None` once `END_TABLE` is next.
    fn take_row(&mut self) -> Result<Option<Vec<Token>>, ParseError> {
        match self.cursor.peek().kind {
            TokenKind::Keyword(Keyword::EndTable) => return Ok(None),
            TokenKind::Field | TokenKind::RowEnd => {}
            _ => {
                return Err(ParseError::new(
                    ParseErrorKind::MissingClosing(Keyword::EndTable.name()),
                    self.cursor.peek().span,
                ))
            }
        }
        let mut fields = Vec::new();
        while self.cursor.peek().kind == TokenKind::Field {
            fields.push(self.cursor.advance());
        }
        if self.cursor.peek().kind == TokenKind::RowEnd {
            self.cursor.advance();
        }
        Ok(Some(fields))
    }

    fn missing_row(&self, which: &'static str) -> ParseError {
        ParseError::new(ParseErrorKind::MissingTableRow(which), self.cursor.peek().span)
    }

    fn parse_row(&mut self, columns: &[Column], fields: &[Token]) -> Result<Row, ParseError> {
        let span = match (fields.first(), fields.last()) {
            (Some(first), Some(last)) => first.span.to(last.span),
            _ => self.cursor.previous().span,
        };
        if fields.len() > columns.len() {
            return Err(ParseError::new(
                ParseErrorKind::TooManyColumns {
                    expected: columns.len(),
                    found: fields.len(),
                },
                span,
            ));
        }
        let mut cells = Vec::with_capacity(columns.len());
        for (column, field) in columns.iter().zip(fields) {
            cells.push(parse_cell(field, column.ty)?);
        }
        cells.resize(columns.len(), None);
        Ok(Row { span, cells })
    }
}

/// An empty field leaves the cell unset. STRING cells that do not read as an
/// expression are kept as their raw text.
fn parse_cell(field: &Token, ty: ScalarType) -> Result<Option<Expression>, ParseError> {
    if field.text.is_empty() {
        return Ok(None);
    }
    let parsed = scan_fragment(&field.text, field.span)
        .map_err(|e| {
            ParseError::new(
                ParseErrorKind::Unexpected {
                    expected: "table cell".to_string(),
                    found: e.to_string(),
                },
                e.span(),
            )
        })
        .and_then(|tokens| {
            let mut cell = Parser::new(tokens);
            let expr = cell.parse_expression()?;
            if cell.cursor.at_eof() {
                Ok(expr)
            } else {
                Err(cell.cursor.unexpected("end of table cell"))
            }
        });
    match parsed {
        Ok(expr) => Ok(Some(expr)),
        Err(_) if ty == ScalarType::String => {
            Ok(Some(Expression::StringLiteral(field.text.clone())))
        }
        Err(error) => Err(error),
    }
}
