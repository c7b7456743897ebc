use std::fmt::{self, Display, Formatter};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    Between(usize, usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == n,
            Arity::Between(lo, hi) => (lo..=hi).contains(&count),
            Arity::AtLeast(n) => count >= n,
        }
    }
}

impl Display for Arity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{n}"),
            Arity::Between(lo, hi) => write!(f, "{lo} to {hi}"),
            Arity::AtLeast(n) => write!(f, "at least {n}"),
        }
    }
}

/// Functions callable from script expressions. Names are bound to a variant
/// while parsing, so an unknown function never reaches the evaluator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Builtin {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Atan2,
    Sqrt,
    Abs,
    Pow,
    Log,
    Log10,
    Exp,
    Floor,
    Ceil,
    Round,
    Min,
    Max,
    Strlen,
    Strcmp,
    Strfind,
    Substr,
    ToUpper,
    ToLower,
    Str2Int,
    Str2Double,
    Int2Str,
    Double2Str,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

const TABLE: &[(&str, Builtin, Arity)] = &[
    ("sin", Builtin::Sin, Arity::Exact(1)),
    ("cos", Builtin::Cos, Arity::Exact(1)),
    ("tan", Builtin::Tan, Arity::Exact(1)),
    ("asin", Builtin::Asin, Arity::Exact(1)),
    ("acos", Builtin::Acos, Arity::Exact(1)),
    ("atan", Builtin::Atan, Arity::Exact(1)),
    ("atan2", Builtin::Atan2, Arity::Exact(2)),
    ("sqrt", Builtin::Sqrt, Arity::Exact(1)),
    ("abs", Builtin::Abs, Arity::Exact(1)),
    ("pow", Builtin::Pow, Arity::Exact(2)),
    ("log", Builtin::Log, Arity::Exact(1)),
    ("log10", Builtin::Log10, Arity::Exact(1)),
    ("exp", Builtin::Exp, Arity::Exact(1)),
    ("floor", Builtin::Floor, Arity::Exact(1)),
    ("ceil", Builtin::Ceil, Arity::Exact(1)),
    ("round", Builtin::Round, Arity::Between(1, 2)),
    ("min", Builtin::Min, Arity::AtLeast(2)),
    ("max", Builtin::Max, Arity::AtLeast(2)),
    ("strlen", Builtin::Strlen, Arity::Exact(1)),
    ("strcmp", Builtin::Strcmp, Arity::Exact(2)),
    ("strfind", Builtin::Strfind, Arity::Exact(2)),
    ("substr", Builtin::Substr, Arity::Between(2, 3)),
    ("toupper", Builtin::ToUpper, Arity::Exact(1)),
    ("tolower", Builtin::ToLower, Arity::Exact(1)),
    ("str2int", Builtin::Str2Int, Arity::Exact(1)),
    ("str2double", Builtin::Str2Double, Arity::Exact(1)),
    ("int2str", Builtin::Int2Str, Arity::Exact(1)),
    ("double2str", Builtin::Double2Str, Arity::Between(1, 2)),
    ("eq", Builtin::Eq, Arity::Exact(2)),
    ("ne", Builtin::Ne, Arity::Exact(2)),
    ("lt", Builtin::Lt, Arity::Exact(2)),
    ("le", Builtin::Le, Arity::Exact(2)),
    ("gt", Builtin::Gt, Arity::Exact(2)),
    ("ge", Builtin::Ge, Arity::Exact(2)),
];

impl Builtin {
    pub fn lookup(name: &str) -> Option<Builtin> {
        TABLE
            .iter()
            .find(|(n, _, _)| *n == name)
            .map(|(_, builtin, _)| *builtin)
    }

    fn entry(self) -> &'static (&'static str, Builtin, Arity) {
        // Every variant has exactly one row in TABLE.
        TABLE
            .iter()
            .find(|(_, builtin, _)| *builtin == self)
            .unwrap_or(&TABLE[0])
    }

    pub fn name(self) -> &'static str {
        self.entry().0
    }

    pub fn arity(self) -> Arity {
        self.entry().2
    }

    /// Builtins whose arguments are strings; their operands are evaluated on
    /// the string path.
    pub fn takes_strings(self) -> bool {
        matches!(
            self,
            Builtin::Strlen
                | Builtin::Strcmp
                | Builtin::Strfind
                | Builtin::Substr
                | Builtin::ToUpper
                | Builtin::ToLower
                | Builtin::Str2Int
                | Builtin::Str2Double
        )
    }
}

impl Display for Builtin {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
