use std::fmt::{self, Display, Formatter};

use crate::{ComparisonOperator, Expression, FactorOperator, TermOperator, UnaryOperator};

impl ComparisonOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            ComparisonOperator::Equal => "==",
            ComparisonOperator::NotEqual => "<>",
            ComparisonOperator::LessThan => "<",
            ComparisonOperator::LessThanOrEqual => "<=",
            ComparisonOperator::GreaterThan => ">",
            ComparisonOperator::GreaterThanOrEqual => ">=",
        }
    }
}

impl TermOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            TermOperator::Plus => "+",
            TermOperator::Minus => "-",
        }
    }
}

impl FactorOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            FactorOperator::Multiply => "*",
            FactorOperator::Divide => "/",
            FactorOperator::Modulo => "%",
        }
    }
}

/// Prefix rendering, e.g. `(+ 2 (* 3 4))`. Literals keep their source text.
impl Display for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Or(l, r) => write!(f, "(OR {l} {r})"),
            Expression::And(l, r) => write!(f, "(AND {l} {r})"),
            Expression::Comparison(l, op, r) => write!(f, "({} {l} {r})", op.symbol()),
            Expression::Term(l, op, r) => write!(f, "({} {l} {r})", op.symbol()),
            Expression::Factor(l, op, r) => write!(f, "({} {l} {r})", op.symbol()),
            Expression::Unary(UnaryOperator::Negate, e) => write!(f, "(neg {e})"),
            Expression::Call(builtin, args) => {
                write!(f, "({builtin}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                write!(f, ")")
            }
            Expression::Index(t, i) => write!(f, "([] {t} {i})"),
            Expression::Member(t, m) => write!(f, "(. {t} {m})"),
            Expression::Key(t, k) => write!(f, "(: {t} {k})"),
            Expression::Variable(name) => write!(f, "{name}"),
            Expression::Constant(word) => write!(f, "'{word}"),
            Expression::IntegerLiteral { raw, .. } => write!(f, "{raw}"),
            Expression::DoubleLiteral { raw, .. } => write!(f, "{raw}"),
            Expression::StringLiteral(s) => write!(f, "{s:?}"),
            Expression::BooleanLiteral(true) => write!(f, "TRUE"),
            Expression::BooleanLiteral(false) => write!(f, "FALSE"),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn renders_nested_prefix_form() {
        let expr = Expression::Term(
            Box::new(Expression::integer(2)),
            TermOperator::Plus,
            Box::new(Expression::Factor(
                Box::new(Expression::Variable("w".into())),
                FactorOperator::Multiply,
                Box::new(Expression::StringLiteral("x".into())),
            )),
        );
        assert_eq!(expr.to_string(), r#"(+ 2 (* w "x"))"#);
    }
}
