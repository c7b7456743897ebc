use ast::{
    Accessor, Assignment, Branch, CatchError, Command, CommandKind, Config, GlobalPicture, If,
    InvalidateParam, MeasureDistance, MeasureLength, OptionArity, OptionValue, Options,
    ParamWidget, Print, RadiobuttonParam, ScalarType, ScriptOption, SearchModelRef, SelectMode,
    SubPicture, Target, UserSelect,
};

use crate::{
    program::Parser,
    token::{Keyword, Operator, TokenKind, TypeName},
    ParseError, ParseErrorKind,
};

type CommandParser = fn(&mut Parser) -> Result<CommandKind, ParseError>;

/// Leading keyword to sub-parser. The keyword itself is consumed before the
/// sub-parser runs.
const COMMANDS: &[(Keyword, CommandParser)] = &[
    (Keyword::DeclareVariable, |p| {
        Ok(CommandKind::DeclareVariable(p.parse_declaration()?))
    }),
    (Keyword::If, Parser::parse_if),
    (Keyword::ShowParam, |p| {
        let widget = p.parse_param_widget(&[
            ScalarType::Integer,
            ScalarType::Double,
            ScalarType::String,
            ScalarType::Bool,
        ])?;
        Ok(CommandKind::ShowParam(widget))
    }),
    (Keyword::CheckboxParam, |p| {
        let widget = p.parse_param_widget(&[ScalarType::Integer, ScalarType::Bool])?;
        Ok(CommandKind::CheckboxParam(widget))
    }),
    (Keyword::UserInputParam, |p| {
        let widget = p.parse_param_widget(&[
            ScalarType::Integer,
            ScalarType::Double,
            ScalarType::String,
        ])?;
        Ok(CommandKind::UserInputParam(widget))
    }),
    (Keyword::RadiobuttonParam, Parser::parse_radiobutton),
    (Keyword::UserSelect, |p| p.parse_user_select(SelectMode::Single)),
    (Keyword::UserSelectOptional, |p| {
        p.parse_user_select(SelectMode::Optional)
    }),
    (Keyword::UserSelectMultiple, |p| {
        p.parse_user_select(SelectMode::Multiple)
    }),
    (Keyword::UserSelectMultipleOptional, |p| {
        p.parse_user_select(SelectMode::MultipleOptional)
    }),
    (Keyword::GlobalPicture, |p| {
        let file = p.parse_expression()?;
        p.expect_line_end()?;
        Ok(CommandKind::GlobalPicture(GlobalPicture { file }))
    }),
    (Keyword::SubPicture, |p| {
        let file = p.parse_expression()?;
        let x = p.parse_expression()?;
        let y = p.parse_expression()?;
        p.expect_line_end()?;
        Ok(CommandKind::SubPicture(SubPicture { file, x, y }))
    }),
    (Keyword::BeginTable, |p| Ok(CommandKind::Table(p.parse_table()?))),
    (Keyword::InvalidateParam, |p| {
        let name = p.cursor.expect_identifier("parameter name")?;
        p.expect_line_end()?;
        Ok(CommandKind::InvalidateParam(InvalidateParam { name }))
    }),
    (Keyword::MeasureDistance, |p| {
        let from = p.parse_expression()?;
        let to = p.parse_expression()?;
        let result = p.cursor.expect_identifier("result variable")?;
        p.expect_line_end()?;
        Ok(CommandKind::MeasureDistance(MeasureDistance { from, to, result }))
    }),
    (Keyword::MeasureLength, |p| {
        let target = p.parse_expression()?;
        let result = p.cursor.expect_identifier("result variable")?;
        p.expect_line_end()?;
        Ok(CommandKind::MeasureLength(MeasureLength { target, result }))
    }),
    (Keyword::SearchMdlRef, |p| {
        Ok(CommandKind::SearchModelRef(p.parse_search()?))
    }),
    (Keyword::SearchMdlRefs, |p| {
        Ok(CommandKind::SearchModelRefs(p.parse_search()?))
    }),
    (Keyword::BeginCatchError, Parser::parse_catch_error),
    (Keyword::ConfigElem, |p| {
        let options = p.parse_options()?;
        p.expect_line_end()?;
        Ok(CommandKind::Config(Config { options }))
    }),
    (Keyword::Print, |p| {
        let value = p.parse_expression()?;
        p.expect_line_end()?;
        Ok(CommandKind::Print(Print { value }))
    }),
];

fn command_parser(keyword: Keyword) -> Option<CommandParser> {
    COMMANDS
        .iter()
        .find(|(k, _)| *k == keyword)
        .map(|(_, parser)| *parser)
}

impl Parser {
    pub(crate) fn parse_command(&mut self) -> Result<Command, ParseError> {
        let start = self.cursor.peek().clone();
        let id = self.cursor.next_id();
        let kind = match start.kind {
            TokenKind::Keyword(keyword) => match command_parser(keyword) {
                Some(parse) => {
                    self.cursor.advance();
                    parse(self)?
                }
                None => return Err(self.cursor.unexpected("a command")),
            },
            TokenKind::Identifier => self.parse_assignment()?,
            _ => return Err(self.cursor.unexpected("a command")),
        };
        Ok(Command {
            id,
            span: start.span.to(self.cursor.previous().span),
            kind,
        })
    }

    fn parse_assignment(&mut self) -> Result<CommandKind, ParseError> {
        let (span, word) = self.cursor.expect_identifier("variable name")?;
        // `s.m` scans as a single word.
        let mut members = word.split('.');
        let root = (span, members.next().unwrap_or_default().to_string());
        let mut path: Vec<Accessor> = members
            .map(|member| Accessor::Member(member.to_string()))
            .collect();
        while self.cursor.on_same_line() {
            if self.cursor.eat_operator(Operator::LBracket) {
                path.push(Accessor::Index(self.parse_expression()?));
                self.cursor.expect_operator(Operator::RBracket, "']'")?;
            } else if self.cursor.eat_operator(Operator::Dot) {
                let (_, member) = self.cursor.expect_identifier("member name")?;
                path.push(Accessor::Member(member));
            } else if self.cursor.eat_operator(Operator::Colon) {
                path.push(Accessor::Key(self.parse_primary()?));
            } else {
                break;
            }
        }
        self.cursor.expect_operator(Operator::Assign, "'='")?;
        let value = self.parse_expression()?;
        self.expect_line_end()?;
        Ok(CommandKind::Assignment(Assignment {
            target: Target { root, path },
            value,
        }))
    }

    fn parse_if(&mut self) -> Result<CommandKind, ParseError> {
        let mut branches = Vec::new();
        let mut else_body = None;
        loop {
            let condition = self.parse_expression()?;
            self.expect_line_end()?;
            let body = self.parse_body(&[Keyword::ElseIf, Keyword::Else, Keyword::EndIf])?;
            branches.push(Branch { condition, body });
            if !self.cursor.check_keyword(Keyword::ElseIf) {
                break;
            }
            self.cursor.advance();
        }
        if self.cursor.check_keyword(Keyword::Else) {
            self.cursor.advance();
            self.expect_line_end()?;
            else_body = Some(self.parse_body(&[Keyword::EndIf])?);
        }
        self.cursor.expect_keyword(Keyword::EndIf)?;
        self.expect_line_end()?;
        Ok(CommandKind::If(If {
            branches,
            else_body,
        }))
    }

    fn parse_param_widget(&mut self, allowed: &[ScalarType]) -> Result<ParamWidget, ParseError> {
        let (_, ty) = self.expect_scalar_type(allowed)?;
        let name = self.cursor.expect_identifier("parameter name")?;
        let options = self.parse_options()?;
        self.expect_line_end()?;
        Ok(ParamWidget { ty, name, options })
    }

    fn parse_radiobutton(&mut self) -> Result<CommandKind, ParseError> {
        let (_, ty) = self.expect_scalar_type(&[ScalarType::Integer, ScalarType::String])?;
        let name = self.cursor.expect_identifier("parameter name")?;
        let mut choices = Vec::new();
        while self.cursor.on_same_line()
            && !matches!(self.cursor.peek().kind, TokenKind::Option(_))
        {
            choices.push(self.parse_expression()?);
        }
        if choices.is_empty() {
            return Err(self.cursor.unexpected("at least one choice"));
        }
        let options = self.parse_options()?;
        self.expect_line_end()?;
        Ok(CommandKind::RadiobuttonParam(RadiobuttonParam {
            ty,
            name,
            choices,
            options,
        }))
    }

    fn parse_user_select(&mut self, mode: SelectMode) -> Result<CommandKind, ParseError> {
        let mut kinds = Vec::new();
        while let TokenKind::Type(TypeName::Ref(kind)) = self.cursor.peek().kind {
            self.cursor.advance();
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        if kinds.is_empty() {
            return Err(match self.cursor.peek().kind {
                TokenKind::Identifier | TokenKind::Type(_) => {
                    let token = self.cursor.peek();
                    ParseError::new(ParseErrorKind::UnknownType(token.text.clone()), token.span)
                }
                _ => self.cursor.unexpected("reference type"),
            });
        }
        let name = self.cursor.expect_identifier("selection name")?;
        let options = self.parse_options()?;
        self.expect_line_end()?;
        Ok(CommandKind::UserSelect(UserSelect {
            mode,
            kinds,
            name,
            options,
        }))
    }

    fn parse_search(&mut self) -> Result<SearchModelRef, ParseError> {
        let kind = match self.expect_type_name()? {
            TypeName::Ref(kind) => kind,
            _ => {
                let token = self.cursor.previous();
                return Err(ParseError::new(
                    ParseErrorKind::UnknownType(token.text.clone()),
                    token.span,
                ));
            }
        };
        let pattern = self.parse_expression()?;
        let result = self.cursor.expect_identifier("result variable")?;
        self.expect_line_end()?;
        Ok(SearchModelRef {
            kind,
            pattern,
            result,
        })
    }

    fn parse_catch_error(&mut self) -> Result<CommandKind, ParseError> {
        let status = if self.cursor.on_same_line() {
            Some(self.cursor.expect_identifier("status variable")?)
        } else {
            None
        };
        self.expect_line_end()?;
        let body = self.parse_body(&[Keyword::EndCatchError])?;
        self.cursor.expect_keyword(Keyword::EndCatchError)?;
        self.expect_line_end()?;
        Ok(CommandKind::CatchError(CatchError { status, body }))
    }

    /// Option words on the rest of the current line, each with the argument
    /// its arity asks for.
    pub(crate) fn parse_options(&mut self) -> Result<Options, ParseError> {
        let mut options = Vec::new();
        while self.cursor.on_same_line() {
            let TokenKind::Option(kind) = self.cursor.peek().kind else {
                break;
            };
            let span = self.cursor.advance().span;
            let value = match kind.arity() {
                OptionArity::Flag => OptionValue::Flag,
                OptionArity::Integer => OptionValue::Integer(self.parse_integer_argument()?),
                OptionArity::Expression => OptionValue::Expression(self.parse_expression()?),
                OptionArity::Point => {
                    let x = self.parse_expression()?;
                    let y = self.parse_expression()?;
                    OptionValue::Point(x, y)
                }
            };
            options.push(ScriptOption {
                kind,
                value,
                span: span.to(self.cursor.previous().span),
            });
        }
        Ok(Options(options))
    }

    pub(crate) fn parse_integer_argument(&mut self) -> Result<i64, ParseError> {
        let negative = self.cursor.on_same_line() && self.cursor.eat_operator(Operator::Minus);
        let token = self.cursor.peek().clone();
        match token.kind {
            TokenKind::Integer(value) if self.cursor.on_same_line() => {
                self.cursor.advance();
                Ok(if negative { -value } else { value })
            }
            _ => Err(ParseError::new(
                ParseErrorKind::MalformedNumber(token.describe()),
                token.span,
            )),
        }
    }
}
