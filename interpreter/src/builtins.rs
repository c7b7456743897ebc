use std::cmp::Ordering;

use ast::{Builtin, ComparisonOperator, Expression};

use crate::{
    eval::{compare, render, Env, Interpretable},
    RuntimeError, Variable,
};

/// Calls `builtin`. Argument counts were checked by the parser.
pub(crate) fn call(
    builtin: Builtin,
    args: &[Expression],
    env: &Env,
) -> Result<Variable, RuntimeError> {
    let args = Args {
        function: builtin.name(),
        args,
        env,
    };
    if builtin.takes_strings() {
        return call_string(builtin, &args);
    }
    let angle = env.angle;
    Ok(match builtin {
        Builtin::Sin => Variable::Double(angle.to_radians(args.number(0)?).sin()),
        Builtin::Cos => Variable::Double(angle.to_radians(args.number(0)?).cos()),
        Builtin::Tan => Variable::Double(angle.to_radians(args.number(0)?).tan()),
        Builtin::Asin => {
            let x = args.within(0, -1.0, 1.0)?;
            Variable::Double(angle.from_radians(x.asin()))
        }
        Builtin::Acos => {
            let x = args.within(0, -1.0, 1.0)?;
            Variable::Double(angle.from_radians(x.acos()))
        }
        Builtin::Atan => Variable::Double(angle.from_radians(args.number(0)?.atan())),
        Builtin::Atan2 => {
            let (y, x) = (args.number(0)?, args.number(1)?);
            Variable::Double(angle.from_radians(y.atan2(x)))
        }
        Builtin::Sqrt => Variable::Double(args.within(0, 0.0, f64::INFINITY)?.sqrt()),
        Builtin::Abs => match args.value(0)? {
            Variable::Double(d) => Variable::Double(d.abs()),
            other => Variable::Integer(
                args.integer_of(0, &other)?
                    .checked_abs()
                    .ok_or(RuntimeError::Overflow("abs"))?,
            ),
        },
        Builtin::Pow => Variable::Double(args.number(0)?.powf(args.number(1)?)),
        Builtin::Log => Variable::Double(args.positive(0)?.ln()),
        Builtin::Log10 => Variable::Double(args.positive(0)?.log10()),
        Builtin::Exp => Variable::Double(args.number(0)?.exp()),
        Builtin::Floor => Variable::Integer(args.number(0)?.floor() as i64),
        Builtin::Ceil => Variable::Integer(args.number(0)?.ceil() as i64),
        Builtin::Round => {
            let x = args.number(0)?;
            if args.len() == 1 {
                Variable::Integer(x.round() as i64)
            } else {
                let scale = 10f64.powi(args.integer(1)?.clamp(0, 15) as i32);
                Variable::Double((x * scale).round() / scale)
            }
        }
        Builtin::Min | Builtin::Max => {
            let values = (0..args.len())
                .map(|i| args.numeric_value(i))
                .collect::<Result<Vec<_>, _>>()?;
            let pick_min = builtin == Builtin::Min;
            match values.iter().map(Variable::as_i64).collect::<Option<Vec<_>>>() {
                Some(ints) => {
                    let best = if pick_min {
                        ints.into_iter().min()
                    } else {
                        ints.into_iter().max()
                    };
                    Variable::Integer(best.unwrap_or_default())
                }
                None => {
                    let floats = values.iter().filter_map(Variable::as_f64);
                    Variable::Double(if pick_min {
                        floats.fold(f64::INFINITY, f64::min)
                    } else {
                        floats.fold(f64::NEG_INFINITY, f64::max)
                    })
                }
            }
        }
        Builtin::Int2Str => Variable::String(args.integer(0)?.to_string()),
        Builtin::Double2Str => {
            let x = args.number(0)?;
            if args.len() == 2 {
                let places = args.integer(1)?.clamp(0, 15) as usize;
                Variable::String(format!("{x:.places$}"))
            } else {
                Variable::String(x.to_string())
            }
        }
        Builtin::Eq => args.compare(ComparisonOperator::Equal)?,
        Builtin::Ne => args.compare(ComparisonOperator::NotEqual)?,
        Builtin::Lt => args.compare(ComparisonOperator::LessThan)?,
        Builtin::Le => args.compare(ComparisonOperator::LessThanOrEqual)?,
        Builtin::Gt => args.compare(ComparisonOperator::GreaterThan)?,
        Builtin::Ge => args.compare(ComparisonOperator::GreaterThanOrEqual)?,
        _ => return call_string(builtin, &args),
    })
}

/// Builtins that read their text arguments through the string path.
fn call_string(builtin: Builtin, args: &Args) -> Result<Variable, RuntimeError> {
    Ok(match builtin {
        Builtin::Strlen => Variable::Integer(args.text(0)?.chars().count() as i64),
        Builtin::Strcmp => Variable::Integer(match args.text(0)?.cmp(&args.text(1)?) {
            Ordering::Less => -1,
            Ordering::Equal => 0,
            Ordering::Greater => 1,
        }),
        Builtin::Strfind => {
            let (haystack, needle) = (args.text(0)?, args.text(1)?);
            Variable::Integer(match haystack.find(&needle) {
                Some(byte) => haystack[..byte].chars().count() as i64,
                None => -1,
            })
        }
        Builtin::Substr => {
            let text = args.text(0)?;
            let start = usize::try_from(args.integer(1)?)
                .map_err(|_| args.bad(1, "a non-negative integer"))?;
            let chars = text.chars().skip(start);
            Variable::String(if args.len() == 3 {
                let len = usize::try_from(args.integer(2)?)
                    .map_err(|_| args.bad(2, "a non-negative integer"))?;
                chars.take(len).collect()
            } else {
                chars.collect()
            })
        }
        Builtin::ToUpper => Variable::String(args.text(0)?.to_uppercase()),
        Builtin::ToLower => Variable::String(args.text(0)?.to_lowercase()),
        Builtin::Str2Int => {
            let text = args.text(0)?;
            Variable::Integer(
                text.trim()
                    .parse()
                    .map_err(|_| args.bad(0, "an integer in text form"))?,
            )
        }
        Builtin::Str2Double => {
            let text = args.text(0)?;
            Variable::Double(
                text.trim()
                    .parse()
                    .map_err(|_| args.bad(0, "a number in text form"))?,
            )
        }
        _ => return Err(args.bad(0, "text")),
    })
}

struct Args<'e, 'a> {
    function: &'static str,
    args: &'e [Expression],
    env: &'e Env<'a>,
}

impl Args<'_, '_> {
    fn len(&self) -> usize {
        self.args.len()
    }

    fn bad(&self, position: usize, expected: &'static str) -> RuntimeError {
        RuntimeError::BadArgument {
            function: self.function,
            position: position + 1,
            expected,
        }
    }

    fn value(&self, i: usize) -> Result<Variable, RuntimeError> {
        match self.args.get(i) {
            Some(arg) => arg.run(self.env),
            None => Err(self.bad(i, "present")),
        }
    }

    fn text(&self, i: usize) -> Result<String, RuntimeError> {
        match self.args.get(i) {
            Some(arg) => render(arg, self.env),
            None => Err(self.bad(i, "present")),
        }
    }

    fn number(&self, i: usize) -> Result<f64, RuntimeError> {
        self.value(i)?.as_f64().ok_or_else(|| self.bad(i, "a number"))
    }

    fn numeric_value(&self, i: usize) -> Result<Variable, RuntimeError> {
        let value = self.value(i)?;
        if value.is_numeric() {
            Ok(value)
        } else {
            Err(self.bad(i, "a number"))
        }
    }

    fn integer(&self, i: usize) -> Result<i64, RuntimeError> {
        let value = self.value(i)?;
        self.integer_of(i, &value)
    }

    fn integer_of(&self, i: usize, value: &Variable) -> Result<i64, RuntimeError> {
        match value {
            Variable::Double(d) => Ok(d.trunc() as i64),
            other => other.as_i64().ok_or_else(|| self.bad(i, "an integer")),
        }
    }

    fn within(&self, i: usize, low: f64, high: f64) -> Result<f64, RuntimeError> {
        let x = self.number(i)?;
        if x < low || x > high {
            return Err(RuntimeError::Domain {
                function: self.function,
                value: x,
            });
        }
        Ok(x)
    }

    fn positive(&self, i: usize) -> Result<f64, RuntimeError> {
        let x = self.number(i)?;
        if x <= 0.0 {
            return Err(RuntimeError::Domain {
                function: self.function,
                value: x,
            });
        }
        Ok(x)
    }

    fn compare(&self, op: ComparisonOperator) -> Result<Variable, RuntimeError> {
        compare(op, &self.value(0)?, &self.value(1)?).map(Variable::Bool)
    }
}

#[cfg(test)]
mod tests {
    use ast::{ScalarType, TypeSpec};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{AngleUnit, SymbolTable};

    fn eval_in(source: &str, angle: AngleUnit) -> Result<Variable, RuntimeError> {
        let mut symbols = SymbolTable::seeded();
        symbols
            .declare(
                "part",
                TypeSpec::Scalar(ScalarType::String),
                Some(Variable::String("Bracket".into())),
            )
            .unwrap();
        let expr = parser::parse_expression(source).unwrap();
        expr.run(&Env::new(&symbols, angle))
    }

    fn eval(source: &str) -> Result<Variable, RuntimeError> {
        eval_in(source, AngleUnit::Degrees)
    }

    fn approx(source: &str, angle: AngleUnit) -> f64 {
        match eval_in(source, angle) {
            Ok(Variable::Double(d)) => (d * 1e9).round() / 1e9,
            other => panic!("expected a double from {source}, got {other:?}"),
        }
    }

    #[test]
    fn trigonometry_uses_the_configured_unit() {
        assert_eq!(approx("sin(30)", AngleUnit::Degrees), 0.5);
        assert_eq!(approx("atan2(1, 1)", AngleUnit::Degrees), 45.0);
        assert_eq!(approx("cos(PI)", AngleUnit::Radians), -1.0);
        assert_eq!(
            eval("asin(2)"),
            Err(RuntimeError::Domain {
                function: "asin",
                value: 2.0,
            })
        );
    }

    #[test]
    fn numeric_helpers() {
        assert_eq!(eval("abs(-4)"), Ok(Variable::Integer(4)));
        assert_eq!(eval("abs(-4.5)"), Ok(Variable::Double(4.5)));
        assert_eq!(eval("floor(2.7)"), Ok(Variable::Integer(2)));
        assert_eq!(eval("ceil(2.1)"), Ok(Variable::Integer(3)));
        assert_eq!(eval("round(2.5)"), Ok(Variable::Integer(3)));
        assert_eq!(eval("round(3.14159, 2)"), Ok(Variable::Double(3.14)));
        assert_eq!(eval("min(3, 1, 2)"), Ok(Variable::Integer(1)));
        assert_eq!(eval("max(3, 4.5)"), Ok(Variable::Double(4.5)));
        assert_eq!(eval("max(3.0, 2)"), Ok(Variable::Double(3.0)));
        assert_eq!(eval("sqrt(16)"), Ok(Variable::Double(4.0)));
        assert!(eval("log(0)").is_err());
    }

    #[test]
    fn string_helpers() {
        assert_eq!(eval("strlen(part)"), Ok(Variable::Integer(7)));
        assert_eq!(eval("toupper(part)"), Ok(Variable::String("BRACKET".into())));
        assert_eq!(eval("strfind(part, \"ck\")"), Ok(Variable::Integer(3)));
        assert_eq!(eval("strfind(part, \"x\")"), Ok(Variable::Integer(-1)));
        assert_eq!(eval("substr(part, 2, 3)"), Ok(Variable::String("ack".into())));
        assert_eq!(eval("substr(part, 4)"), Ok(Variable::String("ket".into())));
        assert_eq!(eval("strcmp(part, \"Bolt\")"), Ok(Variable::Integer(1)));
        assert_eq!(eval("str2int(\" 42 \")"), Ok(Variable::Integer(42)));
        assert_eq!(eval("str2double(\"2.5\")"), Ok(Variable::Double(2.5)));
        assert_eq!(
            eval("str2int(part)"),
            Err(RuntimeError::BadArgument {
                function: "str2int",
                position: 1,
                expected: "an integer in text form",
            })
        );
        assert_eq!(eval("int2str(7.9)"), Ok(Variable::String("7".into())));
        assert_eq!(eval("double2str(2.0 / 3, 3)"), Ok(Variable::String("0.667".into())));
    }

    #[test]
    fn relational_helpers() {
        assert_eq!(eval("eq(part, \"Bracket\")"), Ok(Variable::Bool(true)));
        assert_eq!(eval("lt(1, 2.5)"), Ok(Variable::Bool(true)));
        assert_eq!(eval("ge(1, 2)"), Ok(Variable::Bool(false)));
    }
}
