use std::fmt::{self, Display, Formatter};
use std::io;

use ariadne::{Label, Report, ReportKind, Source};
use yansi::Color;

use crate::Span;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScriptErrorKind {
    Lexical,
    Syntax,
    Runtime,
}

impl Display for ScriptErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScriptErrorKind::Lexical => write!(f, "Lexical Error"),
            ScriptErrorKind::Syntax => write!(f, "Syntax Error"),
            ScriptErrorKind::Runtime => write!(f, "Runtime Error"),
        }
    }
}

/// A positioned diagnostic that can be rendered against the script source.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
#[error("{kind} at {span}: {message}")]
pub struct ScriptError {
    pub kind: ScriptErrorKind,
    pub span: Span,
    pub message: String,
}

impl ScriptError {
    fn new(kind: ScriptErrorKind, span: Span, message: String) -> Self {
        Self {
            kind,
            span,
            message,
        }
    }

    pub fn lexical<M: ToString>(span: Span, message: M) -> Self {
        Self::new(ScriptErrorKind::Lexical, span, message.to_string())
    }

    pub fn syntax<M: ToString>(span: Span, message: M) -> Self {
        Self::new(ScriptErrorKind::Syntax, span, message.to_string())
    }

    pub fn runtime<M: ToString>(span: Span, message: M) -> Self {
        Self::new(ScriptErrorKind::Runtime, span, message.to_string())
    }

    fn build_report(&self, text: &str) -> Report<'static> {
        // ariadne counts characters, spans count bytes.
        let to_char = |byte: usize| text.get(..byte).map_or(0, |s| s.chars().count());
        let start = to_char(self.span.start);
        let end = to_char(self.span.end).max(start + 1);
        Report::build(ReportKind::Error, (), start)
            .with_message(self.kind.to_string())
            .with_label(
                Label::new(start..end)
                    .with_message(&self.message)
                    .with_color(Color::Red),
            )
            .finish()
    }
}

pub struct ScriptErrorPrinter {
    text: String,
    source: Source,
}

impl ScriptErrorPrinter {
    pub fn new(input: &str) -> Self {
        Self {
            text: input.to_string(),
            source: Source::from(input),
        }
    }

    pub fn eprint(&mut self, error: &ScriptError) -> io::Result<()> {
        error.build_report(&self.text).eprint(&mut self.source)
    }

    pub fn format(&mut self, error: &ScriptError) -> String {
        let mut buffer = Vec::new();
        match error
            .build_report(&self.text)
            .write(&mut self.source, &mut buffer)
        {
            Ok(()) => String::from_utf8_lossy(&buffer).into_owned(),
            Err(_) => error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_position() {
        let error = ScriptError::syntax(Span::new(4, 7, 2, 3), "unknown option 'FOO'");
        assert_eq!(
            error.to_string(),
            "Syntax Error at 2:3: unknown option 'FOO'"
        );
    }

    #[test]
    fn formatted_report_mentions_message() {
        let source = "IF x\nFOO\nEND_IF\n";
        let error = ScriptError::syntax(Span::new(5, 8, 2, 1), "unexpected word");
        let rendered = ScriptErrorPrinter::new(source).format(&error);
        assert!(rendered.contains("unexpected word"));
        assert!(rendered.contains("Syntax Error"));
    }
}
