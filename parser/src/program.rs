use ast::{Block, Command, Program, Section};
use tracing::debug;

use crate::{
    cursor::TokenCursor,
    token::{Keyword, Operator, Token, TokenKind},
    ParseError, ParseErrorKind,
};

pub(crate) struct Parser {
    pub(crate) cursor: TokenCursor,
    pub(crate) errors: Vec<ParseError>,
}

impl Parser {
    pub(crate) fn new(tokens: Vec<Token>) -> Self {
        Self {
            cursor: TokenCursor::new(tokens, 1),
            errors: Vec::new(),
        }
    }

    pub(crate) fn parse_program(&mut self) -> Program {
        let mut program = Program::default();
        while !self.cursor.at_eof() {
            let token = self.cursor.peek().clone();
            match token.kind {
                TokenKind::Keyword(Keyword::BeginAsmDescr) => {
                    if let Some(block) = self.parse_section(Section::Asm, Keyword::EndAsmDescr) {
                        program.asm.extend(block.commands);
                    }
                }
                TokenKind::Keyword(Keyword::BeginGuiDescr) => {
                    let block = self.parse_section(Section::Gui, Keyword::EndGuiDescr);
                    Self::store_section(
                        &mut self.errors,
                        &mut program.gui,
                        block,
                        &token,
                        "BEGIN_GUI_DESCR",
                    );
                }
                TokenKind::Keyword(Keyword::BeginTabDescr) => {
                    let block = self.parse_section(Section::Tab, Keyword::EndTabDescr);
                    Self::store_section(
                        &mut self.errors,
                        &mut program.tab,
                        block,
                        &token,
                        "BEGIN_TAB_DESCR",
                    );
                }
                _ => {
                    let start = self.cursor.position();
                    match self.parse_command() {
                        Ok(command) => program.asm.push(command),
                        Err(error) => self.recover(error, start),
                    }
                }
            }
        }
        program
    }

    fn store_section(
        errors: &mut Vec<ParseError>,
        slot: &mut Option<Block>,
        block: Option<Block>,
        opener: &Token,
        name: &'static str,
    ) {
        let Some(block) = block else { return };
        if slot.is_some() {
            errors.push(ParseError::new(
                ParseErrorKind::DuplicateSection(name),
                opener.span,
            ));
        } else {
            *slot = Some(block);
        }
    }

    fn parse_section(&mut self, section: Section, closing: Keyword) -> Option<Block> {
        let opener = self.cursor.advance();
        if let Err(error) = self.expect_line_end() {
            self.errors.push(error);
        }
        match self.parse_body(&[closing]) {
            Ok(commands) => {
                self.cursor.advance();
                debug!(%section, commands = commands.len(), "parsed section");
                Some(Block {
                    section,
                    span: opener.span.to(self.cursor.previous().span),
                    commands,
                })
            }
            Err(error) => {
                self.errors.push(error);
                None
            }
        }
    }

    /// Parses commands until one of `terminators` is next, leaving it
    /// unconsumed. Failing commands are recorded and skipped. Running into
    /// a section boundary or the end of input means the terminator is missing.
    pub(crate) fn parse_body(
        &mut self,
        terminators: &[Keyword],
    ) -> Result<Vec<Command>, ParseError> {
        let mut body = Vec::new();
        loop {
            let token = self.cursor.peek();
            match token.kind {
                TokenKind::Keyword(keyword) if terminators.contains(&keyword) => return Ok(body),
                TokenKind::Keyword(keyword) if keyword.is_section_delimiter() => {
                    return Err(self.missing(terminators))
                }
                TokenKind::Eof => return Err(self.missing(terminators)),
                _ => {}
            }
            let start = self.cursor.position();
            match self.parse_command() {
                Ok(command) => body.push(command),
                Err(error) => self.recover(error, start),
            }
        }
    }

    fn missing(&self, terminators: &[Keyword]) -> ParseError {
        let closing = terminators.last().map_or("keyword", |k| k.name());
        ParseError::new(ParseErrorKind::MissingClosing(closing), self.cursor.peek().span)
    }

    pub(crate) fn recover(&mut self, error: ParseError, start: usize) {
        debug!(%error, line = error.span.line, "skipping malformed command");
        self.errors.push(error);
        if self.cursor.position() == start {
            self.cursor.advance();
        }
        while !self.at_sync_point() {
            self.cursor.advance();
        }
    }

    /// A keyword, or an identifier opening a line with `=` behind it.
    fn at_sync_point(&self) -> bool {
        let token = self.cursor.peek();
        match token.kind {
            TokenKind::Eof | TokenKind::Keyword(_) => true,
            TokenKind::Identifier => {
                token.span.line != self.cursor.previous().span.line
                    && self.cursor.peek_nth(1).is_operator(Operator::Assign)
            }
            _ => false,
        }
    }

    pub(crate) fn expect_line_end(&self) -> Result<(), ParseError> {
        if !self.cursor.on_same_line() {
            return Ok(());
        }
        let token = self.cursor.peek();
        let kind = match token.kind {
            TokenKind::Identifier => ParseErrorKind::UnknownOption(token.text.clone()),
            _ => ParseErrorKind::Unexpected {
                expected: "end of line".to_string(),
                found: token.describe(),
            },
        };
        Err(ParseError::new(kind, token.span))
    }
}
