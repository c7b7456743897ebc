use std::fmt::{self, Display, Formatter};

mod builtins;
mod display;
mod error;
mod nodes;
mod vocab;

pub use builtins::*;
pub use error::*;
pub use nodes::*;
pub use vocab::*;

/// Byte range into the script source together with the 1-based line and
/// column of its first character.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub col: u32,
}

impl Span {
    pub fn new(start: usize, end: usize, line: u32, col: u32) -> Self {
        Self {
            start,
            end,
            line,
            col,
        }
    }

    /// Span covering `self` up to the end of `other`.
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start,
            end: other.end.max(self.end),
            line: self.line,
            col: self.col,
        }
    }
}

impl Display for Span {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

pub type Spanned<T> = (Span, T);

/// Identity stamped on every command at parse time. Ids are allocated in
/// source order and never reused within one parse, so they serve as stable
/// correlation keys between the engine and the widgets it drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
