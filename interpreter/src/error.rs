use ast::{NodeId, RefKind, ScriptError, Span};

#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum RuntimeError {
    #[error("variable '{0}' is not declared")]
    UndefinedVariable(String),

    #[error("cannot store {found} in {expected}")]
    TypeMismatch { expected: String, found: &'static str },

    #[error("operator '{op}' cannot be applied to {lhs} and {rhs}")]
    InvalidOperands {
        op: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },

    #[error("cannot negate {0}")]
    InvalidNegation(&'static str),

    #[error("condition evaluated to {0}, expected a number or bool")]
    NotACondition(&'static str),

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow in '{0}'")]
    Overflow(&'static str),

    #[error("index {index} is out of bounds for an array of length {len}")]
    IndexOutOfBounds { index: i64, len: usize },

    #[error("{0} cannot be indexed")]
    NotIndexable(&'static str),

    #[error("{target} has no member '{member}'")]
    NoSuchMember { target: &'static str, member: String },

    #[error("map has no key '{0}'")]
    NoSuchKey(String),

    #[error("argument {position} of '{function}' must be {expected}")]
    BadArgument {
        function: &'static str,
        position: usize,
        expected: &'static str,
    },

    #[error("'{function}' is undefined for {value}")]
    Domain { function: &'static str, value: f64 },

    #[error("'{0}' is not a scalar and cannot be invalidated")]
    InvalidateNonScalar(String),

    #[error("'{0}' does not hold a selected reference")]
    MissingReference(String),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Bind(#[from] BindError),
}

/// A command that failed during a pass. Its effects were discarded and the
/// pass carried on with the next command.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
#[error("{error}")]
pub struct CommandFailure {
    pub id: NodeId,
    pub span: Span,
    pub error: RuntimeError,
}

impl CommandFailure {
    pub fn to_script_error(&self) -> ScriptError {
        ScriptError::runtime(self.span, &self.error)
    }
}

#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum BindError {
    #[error("widget {0} could not be created: {1}")]
    Rejected(NodeId, String),

    #[error("picture '{0}' could not be loaded")]
    Picture(String),
}

#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum SelectionError {
    #[error("selection was cancelled")]
    Cancelled,

    #[error("no selection provider is available")]
    Unavailable,

    #[error("measurement between the given references failed")]
    Measure,

    #[error("reference of kind {found} is not one of: {allowed}")]
    WrongKind { found: RefKind, allowed: String },
}

#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum SessionError {
    #[error("no input parameter or variable named '{0}'")]
    UnknownParameter(String),

    #[error("no selection named '{0}'")]
    UnknownSelection(String),

    #[error("no table named '{0}'")]
    UnknownTable(String),

    #[error("table '{table}' has no row {row}")]
    NoSuchRow { table: String, row: usize },

    #[error("required fields are not satisfied: {}", .0.join(", "))]
    Incomplete(Vec<String>),

    #[error("'{name}': {error}")]
    Input { name: String, error: RuntimeError },

    #[error(transparent)]
    Selection(#[from] SelectionError),
}
