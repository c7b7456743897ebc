use std::cmp::Ordering;

use ast::{ComparisonOperator, Expression, FactorOperator, TermOperator, UnaryOperator};

use crate::{builtins, AngleUnit, RuntimeError, SymbolTable, Variable};

/// What an expression is evaluated against.
#[derive(Clone, Copy)]
pub struct Env<'a> {
    pub symbols: &'a SymbolTable,
    pub angle: AngleUnit,
}

impl<'a> Env<'a> {
    pub fn new(symbols: &'a SymbolTable, angle: AngleUnit) -> Self {
        Self { symbols, angle }
    }

    /// Looks `name` up as a variable, falling back to a `root.member` path
    /// when no variable carries the dotted name itself.
    pub fn lookup(&self, name: &str) -> Option<Variable> {
        if let Some(value) = self.symbols.get(name) {
            return Some(value.clone());
        }
        let mut parts = name.split('.');
        let mut value = self.symbols.get(parts.next()?)?;
        for member in parts {
            match value {
                Variable::Struct(fields) => value = fields.get(member)?,
                _ => return None,
            }
        }
        Some(value.clone())
    }
}

pub trait Interpretable {
    type Value;
    fn run(&self, env: &Env) -> Result<Self::Value, RuntimeError>;
}

impl Interpretable for Expression {
    type Value = Variable;

    fn run(&self, env: &Env) -> Result<Self::Value, RuntimeError> {
        match self {
            Expression::Or(left, right) => {
                if left.run(env)?.truthy()? {
                    return Ok(Variable::Bool(true));
                }
                Ok(Variable::Bool(right.run(env)?.truthy()?))
            }
            Expression::And(left, right) => {
                if !left.run(env)?.truthy()? {
                    return Ok(Variable::Bool(false));
                }
                Ok(Variable::Bool(right.run(env)?.truthy()?))
            }
            Expression::Comparison(left, op, right) => {
                let left = left.run(env)?;
                let right = right.run(env)?;
                compare(*op, &left, &right).map(Variable::Bool)
            }
            Expression::Term(left, op, right) => {
                let left = left.run(env)?;
                let right = right.run(env)?;
                match op {
                    TermOperator::Plus => {
                        arithmetic("+", left, right, i64::checked_add, |l, r| Ok(l + r))
                    }
                    TermOperator::Minus => {
                        arithmetic("-", left, right, i64::checked_sub, |l, r| Ok(l - r))
                    }
                }
            }
            Expression::Factor(left, op, right) => {
                let left = left.run(env)?;
                let right = right.run(env)?;
                match op {
                    FactorOperator::Multiply => {
                        arithmetic("*", left, right, i64::checked_mul, |l, r| Ok(l * r))
                    }
                    FactorOperator::Divide => {
                        if right.as_f64() == Some(0.0) {
                            return Err(RuntimeError::DivisionByZero);
                        }
                        arithmetic("/", left, right, i64::checked_div, |l, r| Ok(l / r))
                    }
                    FactorOperator::Modulo => {
                        if right.as_f64() == Some(0.0) {
                            return Err(RuntimeError::DivisionByZero);
                        }
                        arithmetic("%", left, right, i64::checked_rem, |l, r| Ok(l % r))
                    }
                }
            }
            Expression::Unary(UnaryOperator::Negate, operand) => match operand.run(env)? {
                Variable::Double(d) => Ok(Variable::Double(-d)),
                other => match other.as_i64() {
                    Some(i) => i
                        .checked_neg()
                        .map(Variable::Integer)
                        .ok_or(RuntimeError::Overflow("-")),
                    None => Err(RuntimeError::InvalidNegation(other.kind_name())),
                },
            },
            Expression::Call(builtin, args) => builtins::call(*builtin, args, env),
            Expression::Index(target, index) => {
                let target = target.run(env)?;
                match target {
                    Variable::Array(items) => {
                        let index = index_value(&index.run(env)?)?;
                        usize::try_from(index)
                            .ok()
                            .and_then(|i| items.get(i).cloned())
                            .ok_or(RuntimeError::IndexOutOfBounds {
                                index,
                                len: items.len(),
                            })
                    }
                    Variable::Map(entries) => {
                        let key = render(index, env)?;
                        entries.get(&key).cloned().ok_or(RuntimeError::NoSuchKey(key))
                    }
                    other => Err(RuntimeError::NotIndexable(other.kind_name())),
                }
            }
            Expression::Member(target, member) => match target.run(env)? {
                Variable::Struct(fields) => {
                    fields
                        .get(member)
                        .cloned()
                        .ok_or_else(|| RuntimeError::NoSuchMember {
                            target: "STRUCT",
                            member: member.clone(),
                        })
                }
                other => Err(RuntimeError::NoSuchMember {
                    target: other.kind_name(),
                    member: member.clone(),
                }),
            },
            Expression::Key(target, key) => match target.run(env)? {
                Variable::Map(entries) => {
                    let key = render(key, env)?;
                    entries.get(&key).cloned().ok_or(RuntimeError::NoSuchKey(key))
                }
                other => Err(RuntimeError::NotIndexable(other.kind_name())),
            },
            Expression::Variable(name) => env
                .lookup(name)
                .map(Variable::thaw)
                .ok_or_else(|| RuntimeError::UndefinedVariable(name.clone())),
            Expression::Constant(word) => Ok(Variable::String(word.clone())),
            Expression::IntegerLiteral { value, .. } => Ok(Variable::Integer(*value)),
            Expression::DoubleLiteral { value, .. } => Ok(Variable::Double(*value)),
            Expression::StringLiteral(text) => Ok(Variable::String(text.clone())),
            Expression::BooleanLiteral(b) => Ok(Variable::Bool(*b)),
        }
    }
}

/// Text rendering of `expr` for string slots, file names, `PRINT` and other
/// places that expect text.
///
/// Names that are not variables and numeric literals stand for their own
/// source text. `+` concatenates unless both sides are numbers, and a
/// subtraction that cannot be computed is rendered back as `left-right`,
/// which restores hyphenated names the parser split apart.
pub fn render(expr: &Expression, env: &Env) -> Result<String, RuntimeError> {
    match expr {
        Expression::StringLiteral(text) | Expression::Constant(text) => Ok(text.clone()),
        Expression::IntegerLiteral { raw, .. } | Expression::DoubleLiteral { raw, .. } => {
            Ok(raw.clone())
        }
        Expression::Variable(name) => Ok(match env.lookup(name) {
            Some(value) => value.to_string(),
            None => name.clone(),
        }),
        Expression::Term(left, op, right) => match expr.run(env) {
            Ok(value) => Ok(value.to_string()),
            Err(_) => {
                let (left, right) = (render(left, env)?, render(right, env)?);
                Ok(match op {
                    TermOperator::Plus => left + &right,
                    TermOperator::Minus => format!("{left}-{right}"),
                })
            }
        },
        other => Ok(other.run(env)?.to_string()),
    }
}

pub(crate) fn index_value(index: &Variable) -> Result<i64, RuntimeError> {
    match index {
        Variable::Double(d) => Ok(d.trunc() as i64),
        other => other.as_i64().ok_or(RuntimeError::InvalidOperands {
            op: "[]",
            lhs: "ARRAY",
            rhs: other.kind_name(),
        }),
    }
}

/// Integer arithmetic when both sides are integers or bools, floating point
/// as soon as either side is a double.
fn arithmetic(
    op: &'static str,
    left: Variable,
    right: Variable,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> Result<f64, RuntimeError>,
) -> Result<Variable, RuntimeError> {
    if let (Some(l), Some(r)) = (left.as_i64(), right.as_i64()) {
        return int_op(l, r)
            .map(Variable::Integer)
            .ok_or(RuntimeError::Overflow(op));
    }
    match (left.as_f64(), right.as_f64()) {
        (Some(l), Some(r)) => float_op(l, r).map(Variable::Double),
        _ => Err(RuntimeError::InvalidOperands {
            op,
            lhs: left.kind_name(),
            rhs: right.kind_name(),
        }),
    }
}

pub(crate) fn compare(
    op: ComparisonOperator,
    left: &Variable,
    right: &Variable,
) -> Result<bool, RuntimeError> {
    let ordering = match (left, right) {
        (Variable::String(l), Variable::String(r))
            if matches!(op, ComparisonOperator::Equal | ComparisonOperator::NotEqual) =>
        {
            Some(l.cmp(r))
        }
        _ => match (left.as_i64(), right.as_i64()) {
            (Some(l), Some(r)) => Some(l.cmp(&r)),
            _ => match (left.as_f64(), right.as_f64()) {
                (Some(l), Some(r)) => l.partial_cmp(&r),
                _ => {
                    return Err(RuntimeError::InvalidOperands {
                        op: op.symbol(),
                        lhs: left.kind_name(),
                        rhs: right.kind_name(),
                    })
                }
            },
        },
    };
    // NaN compares unequal to everything.
    let Some(ordering) = ordering else {
        return Ok(op == ComparisonOperator::NotEqual);
    };
    Ok(match op {
        ComparisonOperator::Equal => ordering == Ordering::Equal,
        ComparisonOperator::NotEqual => ordering != Ordering::Equal,
        ComparisonOperator::LessThan => ordering == Ordering::Less,
        ComparisonOperator::LessThanOrEqual => ordering != Ordering::Greater,
        ComparisonOperator::GreaterThan => ordering == Ordering::Greater,
        ComparisonOperator::GreaterThanOrEqual => ordering != Ordering::Less,
    })
}

#[cfg(test)]
mod tests {
    use ast::{ScalarType, TypeSpec};
    use pretty_assertions::assert_eq;

    use super::*;

    fn table() -> SymbolTable {
        let mut symbols = SymbolTable::seeded();
        let scalar = |ty| TypeSpec::Scalar(ty);
        symbols
            .declare("n", scalar(ScalarType::Integer), Some(Variable::Integer(8)))
            .unwrap();
        symbols
            .declare("w", scalar(ScalarType::Double), Some(Variable::Double(2.5)))
            .unwrap();
        symbols
            .declare("name", scalar(ScalarType::String), Some(Variable::String("bolt".into())))
            .unwrap();
        symbols
            .declare("on", scalar(ScalarType::Bool), Some(Variable::Bool(true)))
            .unwrap();
        symbols
    }

    fn eval(source: &str) -> Result<Variable, RuntimeError> {
        let symbols = table();
        let expr = parser::parse_expression(source).unwrap();
        expr.run(&Env::new(&symbols, AngleUnit::Degrees))
    }

    fn text(source: &str) -> String {
        let symbols = table();
        let expr = parser::parse_expression(source).unwrap();
        render(&expr, &Env::new(&symbols, AngleUnit::Degrees)).unwrap()
    }

    #[test]
    fn arithmetic_follows_precedence() {
        assert_eq!(eval("2 + 3 * 4"), Ok(Variable::Integer(14)));
        assert_eq!(eval("(2 + 3) * 4"), Ok(Variable::Integer(20)));
        assert_eq!(eval("1 < 2 AND 3 > 2"), Ok(Variable::Bool(true)));
        assert_eq!(eval("7 / 2"), Ok(Variable::Integer(3)));
        assert_eq!(eval("-7 % 3"), Ok(Variable::Integer(-1)));
        assert_eq!(eval("n / 2.0 + w"), Ok(Variable::Double(6.5)));
        assert_eq!(eval("on + 1"), Ok(Variable::Integer(2)));
    }

    #[test]
    fn division_by_zero_is_an_error() {
        assert_eq!(eval("1 / 0"), Err(RuntimeError::DivisionByZero));
        assert_eq!(eval("1.5 % 0.0"), Err(RuntimeError::DivisionByZero));
    }

    #[test]
    fn comparisons() {
        assert_eq!(eval("name == \"bolt\""), Ok(Variable::Bool(true)));
        assert_eq!(eval("name <> \"nut\""), Ok(Variable::Bool(true)));
        assert_eq!(eval("1 < 2 < 3"), Ok(Variable::Bool(true)));
        assert_eq!(eval("3 > 2 > 1"), Ok(Variable::Bool(false)));
        assert_eq!(
            eval("name < \"z\""),
            Err(RuntimeError::InvalidOperands {
                op: "<",
                lhs: "STRING",
                rhs: "STRING",
            })
        );
    }

    #[test]
    fn logic_short_circuits() {
        assert_eq!(eval("on OR missing"), Ok(Variable::Bool(true)));
        assert_eq!(eval("0 AND missing"), Ok(Variable::Bool(false)));
        assert_eq!(
            eval("1 AND missing"),
            Err(RuntimeError::UndefinedVariable("missing".into()))
        );
    }

    #[test]
    fn string_operands_are_rejected_by_arithmetic() {
        assert_eq!(
            eval("name + 1"),
            Err(RuntimeError::InvalidOperands {
                op: "+",
                lhs: "STRING",
                rhs: "INTEGER",
            })
        );
    }

    #[test]
    fn string_path() {
        assert_eq!(text("name + \"_\" + n + \".prt\""), "bolt_8.prt");
        assert_eq!(text("\"M\" + (n + 2)"), "M10");
        assert_eq!(text("top-level"), "top-level");
        assert_eq!(text("n-2"), "6");
        assert_eq!(text("w"), "2.5");
        assert_eq!(text("1.50"), "1.50");
        assert_eq!(text("PLANE"), "PLANE");
        assert_eq!(text("n > 2"), "TRUE");
    }

    #[test]
    fn dotted_names_reach_struct_members() {
        let mut symbols = SymbolTable::new();
        let spec = TypeSpec::Struct(vec![ast::Declaration {
            name: (ast::Span::default(), "len".into()),
            ty: TypeSpec::Scalar(ScalarType::Integer),
            default: None,
        }]);
        symbols.declare("s", spec, None).unwrap();
        let env = Env::new(&symbols, AngleUnit::Degrees);
        assert_eq!(env.lookup("s.len"), Some(Variable::Integer(0)));
        assert_eq!(env.lookup("s.width"), None);
    }
}
