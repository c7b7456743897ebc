use ast::{ScriptError, Span};

#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum LexError {
    #[error("unterminated string literal")]
    UnterminatedString { span: Span },

    #[error("unexpected character '{ch}'")]
    UnexpectedCharacter { ch: char, span: Span },

    #[error("numeric literal '{text}' is out of range")]
    NumberOutOfRange { text: String, span: Span },

    #[error("scanner failure: {message}")]
    Scanner { message: String, span: Span },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnterminatedString { span }
            | LexError::UnexpectedCharacter { span, .. }
            | LexError::NumberOutOfRange { span, .. }
            | LexError::Scanner { span, .. } => *span,
        }
    }

    pub fn to_script_error(&self) -> ScriptError {
        ScriptError::lexical(self.span(), self)
    }
}

#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum ParseErrorKind {
    #[error("expected {expected}, found {found}")]
    Unexpected { expected: String, found: String },

    #[error("unknown option '{0}'")]
    UnknownOption(String),

    #[error("unknown type '{0}'")]
    UnknownType(String),

    #[error("'{found}' is not allowed here, expected one of: {allowed}")]
    TypeNotAllowed { found: String, allowed: String },

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("function '{name}' takes {expected} argument(s), got {found}")]
    WrongArgumentCount {
        name: String,
        expected: String,
        found: usize,
    },

    #[error("malformed numeric literal: expected an integer, found {0}")]
    MalformedNumber(String),

    #[error("missing closing {0}")]
    MissingClosing(&'static str),

    #[error("table row has {found} columns but the header declares {expected}")]
    TooManyColumns { expected: usize, found: usize },

    #[error("table type row has {found} entries but the header declares {expected} columns")]
    TypeRowMismatch { expected: usize, found: usize },

    #[error("table is missing its {0} row")]
    MissingTableRow(&'static str),

    #[error("section {0} may appear only once")]
    DuplicateSection(&'static str),
}

#[derive(thiserror::Error, Clone, Debug, PartialEq)]
#[error("{kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn to_script_error(&self) -> ScriptError {
        ScriptError::syntax(self.span, &self.kind)
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ParserError {
    #[error("Lexical error at {}: {0}", .0.span())]
    Lex(#[from] LexError),

    #[error("Parse errors:\n\n{}", .0.iter().map(|e| format!("{}: {e}", e.span)).collect::<Vec<_>>().join("\n"))]
    Source(Vec<ParseError>),
}

impl ParserError {
    pub fn script_errors(&self) -> Vec<ScriptError> {
        match self {
            ParserError::Lex(e) => vec![e.to_script_error()],
            ParserError::Source(errors) => errors.iter().map(ParseError::to_script_error).collect(),
        }
    }
}
