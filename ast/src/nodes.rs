use crate::{Builtin, NodeId, OptionKind, RefKind, ScalarType, Section, SelectMode, Span, Spanned};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Program {
    pub asm: Vec<Command>,
    pub gui: Option<Block>,
    pub tab: Option<Block>,
}

impl Program {
    pub fn section(&self, section: Section) -> Option<&[Command]> {
        match section {
            Section::Asm => Some(&self.asm),
            Section::Gui => self.gui.as_ref().map(|b| b.commands.as_slice()),
            Section::Tab => self.tab.as_ref().map(|b| b.commands.as_slice()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub section: Section,
    pub span: Span,
    pub commands: Vec<Command>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Command {
    pub id: NodeId,
    pub span: Span,
    pub kind: CommandKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum CommandKind {
    DeclareVariable(Declaration),
    Assignment(Assignment),
    If(If),
    ShowParam(ParamWidget),
    CheckboxParam(ParamWidget),
    UserInputParam(ParamWidget),
    RadiobuttonParam(RadiobuttonParam),
    UserSelect(UserSelect),
    GlobalPicture(GlobalPicture),
    SubPicture(SubPicture),
    Table(Table),
    InvalidateParam(InvalidateParam),
    MeasureDistance(MeasureDistance),
    MeasureLength(MeasureLength),
    SearchModelRef(SearchModelRef),
    SearchModelRefs(SearchModelRef),
    CatchError(CatchError),
    Config(Config),
    Print(Print),
}

impl CommandKind {
    /// Commands that produce a widget through the UI binder.
    pub fn is_widget(&self) -> bool {
        matches!(
            self,
            CommandKind::ShowParam(_)
                | CommandKind::CheckboxParam(_)
                | CommandKind::UserInputParam(_)
                | CommandKind::RadiobuttonParam(_)
                | CommandKind::UserSelect(_)
                | CommandKind::GlobalPicture(_)
                | CommandKind::Table(_)
        )
    }
}

/// Shape of a declared variable. The recursive kinds describe their nested
/// types with the same grammar as a top-level declaration.
#[derive(Clone, Debug, PartialEq)]
pub enum TypeSpec {
    Scalar(ScalarType),
    Reference(Option<RefKind>),
    File,
    Array(Box<TypeSpec>),
    Map(Box<TypeSpec>),
    Struct(Vec<Declaration>),
    Generic(Box<TypeSpec>),
}

impl TypeSpec {
    pub fn is_scalar(&self) -> bool {
        matches!(self, TypeSpec::Scalar(_))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Declaration {
    pub name: Spanned<String>,
    pub ty: TypeSpec,
    pub default: Option<Expression>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Accessor {
    Index(Expression),
    Member(String),
    Key(Expression),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Target {
    pub root: Spanned<String>,
    pub path: Vec<Accessor>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Assignment {
    pub target: Target,
    pub value: Expression,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Branch {
    pub condition: Expression,
    pub body: Vec<Command>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct If {
    pub branches: Vec<Branch>,
    pub else_body: Option<Vec<Command>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScriptOption {
    pub kind: OptionKind,
    pub value: OptionValue,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub enum OptionValue {
    Flag,
    Integer(i64),
    Expression(Expression),
    Point(Expression, Expression),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Options(pub Vec<ScriptOption>);

impl Options {
    pub fn get(&self, kind: OptionKind) -> Option<&ScriptOption> {
        self.0.iter().find(|o| o.kind == kind)
    }

    pub fn has(&self, kind: OptionKind) -> bool {
        self.get(kind).is_some()
    }

    pub fn integer(&self, kind: OptionKind) -> Option<i64> {
        match self.get(kind)?.value {
            OptionValue::Integer(n) => Some(n),
            _ => None,
        }
    }

    pub fn expression(&self, kind: OptionKind) -> Option<&Expression> {
        match &self.get(kind)?.value {
            OptionValue::Expression(e) => Some(e),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScriptOption> {
        self.0.iter()
    }
}

/// Shared shape of `SHOW_PARAM`, `CHECKBOX_PARAM` and `USER_INPUT_PARAM`.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamWidget {
    pub ty: ScalarType,
    pub name: Spanned<String>,
    pub options: Options,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RadiobuttonParam {
    pub ty: ScalarType,
    pub name: Spanned<String>,
    pub choices: Vec<Expression>,
    pub options: Options,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UserSelect {
    pub mode: SelectMode,
    pub kinds: Vec<RefKind>,
    pub name: Spanned<String>,
    pub options: Options,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GlobalPicture {
    pub file: Expression,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SubPicture {
    pub file: Expression,
    pub x: Expression,
    pub y: Expression,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    pub name: String,
    pub ty: ScalarType,
}

/// One data row. `cells` always has one slot per column; slots past the
/// fields present in the source are `None`.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    pub span: Span,
    pub cells: Vec<Option<Expression>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    pub name: Spanned<String>,
    pub title: Option<Expression>,
    pub options: Options,
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InvalidateParam {
    pub name: Spanned<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MeasureDistance {
    pub from: Expression,
    pub to: Expression,
    pub result: Spanned<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MeasureLength {
    pub target: Expression,
    pub result: Spanned<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SearchModelRef {
    pub kind: RefKind,
    pub pattern: Expression,
    pub result: Spanned<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CatchError {
    pub status: Option<Spanned<String>>,
    pub body: Vec<Command>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub options: Options,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Print {
    pub value: Expression,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComparisonOperator {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TermOperator {
    Plus,
    Minus,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FactorOperator {
    Multiply,
    Divide,
    Modulo,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expression {
    Or(Box<Expression>, Box<Expression>),
    And(Box<Expression>, Box<Expression>),
    Comparison(Box<Expression>, ComparisonOperator, Box<Expression>),
    Term(Box<Expression>, TermOperator, Box<Expression>),
    Factor(Box<Expression>, FactorOperator, Box<Expression>),
    Unary(UnaryOperator, Box<Expression>),
    Call(Builtin, Vec<Expression>),
    Index(Box<Expression>, Box<Expression>),
    Member(Box<Expression>, String),
    Key(Box<Expression>, Box<Expression>),
    Variable(String),
    Constant(String),
    IntegerLiteral { value: i64, raw: String },
    DoubleLiteral { value: f64, raw: String },
    StringLiteral(String),
    BooleanLiteral(bool),
}

impl Expression {
    pub fn integer(value: i64) -> Self {
        Expression::IntegerLiteral {
            value,
            raw: value.to_string(),
        }
    }

    pub fn double(value: f64) -> Self {
        Expression::DoubleLiteral {
            value,
            raw: value.to_string(),
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Expression::IntegerLiteral { .. }
                | Expression::DoubleLiteral { .. }
                | Expression::StringLiteral(_)
                | Expression::BooleanLiteral(_)
        )
    }
}
