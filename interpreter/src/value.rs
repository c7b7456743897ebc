use std::fmt::{self, Display, Formatter};

use ast::{Expression, RefKind, ScalarType, TypeSpec};
use indexmap::{IndexMap, IndexSet};

use crate::RuntimeError;

/// Opaque handle to a model reference. Handles are issued by the selection
/// provider and handed back to it for disposal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RefHandle {
    pub id: u64,
    pub kind: RefKind,
}

impl Display for RefHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileHandle {
    pub path: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Variable {
    Integer(i64),
    Double(f64),
    String(String),
    Bool(bool),
    Array(Vec<Variable>),
    Map(IndexMap<String, Variable>),
    Struct(IndexMap<String, Variable>),
    Reference(Option<RefHandle>),
    File(FileHandle),
    /// A literal baked from a live value at snapshot time.
    Frozen(Box<Expression>),
}

impl Variable {
    pub fn zero(spec: &TypeSpec) -> Variable {
        match spec {
            TypeSpec::Scalar(scalar) => Variable::zero_scalar(*scalar),
            TypeSpec::Reference(_) => Variable::Reference(None),
            TypeSpec::File => Variable::File(FileHandle::default()),
            TypeSpec::Array(_) => Variable::Array(Vec::new()),
            TypeSpec::Map(_) => Variable::Map(IndexMap::new()),
            TypeSpec::Struct(members) => Variable::Struct(
                members
                    .iter()
                    .map(|m| (m.name.1.clone(), Variable::zero(&m.ty)))
                    .collect(),
            ),
            TypeSpec::Generic(inner) => Variable::zero(inner),
        }
    }

    pub fn zero_scalar(scalar: ScalarType) -> Variable {
        match scalar {
            ScalarType::Integer => Variable::Integer(0),
            ScalarType::Double => Variable::Double(0.0),
            ScalarType::String => Variable::String(String::new()),
            ScalarType::Bool => Variable::Bool(false),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Variable::Integer(_) => "INTEGER",
            Variable::Double(_) => "DOUBLE",
            Variable::String(_) => "STRING",
            Variable::Bool(_) => "BOOL",
            Variable::Array(_) => "ARRAY",
            Variable::Map(_) => "MAP",
            Variable::Struct(_) => "STRUCT",
            Variable::Reference(_) => "REFERENCE",
            Variable::File(_) => "FILE_DESCRIPTOR",
            Variable::Frozen(_) => "frozen value",
        }
    }

    /// Numeric view of integers, doubles and bools.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Variable::Integer(i) => Some(*i as f64),
            Variable::Double(d) => Some(*d),
            Variable::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Integer view of integers and bools.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Variable::Integer(i) => Some(*i),
            Variable::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.as_f64().is_some()
    }

    pub fn truthy(&self) -> Result<bool, RuntimeError> {
        match self {
            Variable::Bool(b) => Ok(*b),
            Variable::Integer(i) => Ok(*i != 0),
            Variable::Double(d) => Ok(*d != 0.0),
            Variable::Frozen(_) => self.clone().thaw().truthy(),
            other => Err(RuntimeError::NotACondition(other.kind_name())),
        }
    }

    /// Converts `self` for storage in a slot declared as `spec`.
    pub fn coerce_to(self, spec: &TypeSpec) -> Result<Variable, RuntimeError> {
        let value = self.thaw();
        let mismatch = |value: &Variable| RuntimeError::TypeMismatch {
            expected: spec_name(spec),
            found: value.kind_name(),
        };
        match spec {
            TypeSpec::Scalar(scalar) => value.coerce_scalar(*scalar),
            TypeSpec::Generic(_) => Ok(value),
            TypeSpec::Reference(_) => match value {
                Variable::Reference(_) => Ok(value),
                other => Err(mismatch(&other)),
            },
            TypeSpec::File => match value {
                Variable::File(_) => Ok(value),
                Variable::String(path) => Ok(Variable::File(FileHandle { path })),
                other => Err(mismatch(&other)),
            },
            TypeSpec::Array(inner) => match value {
                Variable::Array(items) => items
                    .into_iter()
                    .map(|item| item.coerce_to(inner))
                    .collect::<Result<_, _>>()
                    .map(Variable::Array),
                other => Err(mismatch(&other)),
            },
            TypeSpec::Map(inner) => match value {
                Variable::Map(entries) => entries
                    .into_iter()
                    .map(|(k, v)| Ok((k, v.coerce_to(inner)?)))
                    .collect::<Result<_, _>>()
                    .map(Variable::Map),
                other => Err(mismatch(&other)),
            },
            TypeSpec::Struct(members) => match value {
                Variable::Struct(mut fields)
                    if fields.len() == members.len()
                        && members.iter().all(|m| fields.contains_key(&m.name.1)) =>
                {
                    let mut out = IndexMap::with_capacity(members.len());
                    for member in members {
                        let field = fields
                            .shift_remove(&member.name.1)
                            .unwrap_or_else(|| Variable::zero(&member.ty));
                        out.insert(member.name.1.clone(), field.coerce_to(&member.ty)?);
                    }
                    Ok(Variable::Struct(out))
                }
                other => Err(mismatch(&other)),
            },
        }
    }

    /// Converts `self` to the kind `current` already has. Used for element
    /// targets, whose declared type is the element they replace.
    pub fn coerce_like(self, current: &Variable) -> Result<Variable, RuntimeError> {
        let value = self.thaw();
        let same_kind = std::mem::discriminant(&value) == std::mem::discriminant(current);
        match current {
            Variable::Integer(_) => value.coerce_scalar(ScalarType::Integer),
            Variable::Double(_) => value.coerce_scalar(ScalarType::Double),
            Variable::String(_) => value.coerce_scalar(ScalarType::String),
            Variable::Bool(_) => value.coerce_scalar(ScalarType::Bool),
            Variable::Frozen(_) => Ok(value),
            _ if same_kind => Ok(value),
            _ => Err(RuntimeError::TypeMismatch {
                expected: current.kind_name().to_string(),
                found: value.kind_name(),
            }),
        }
    }

    fn coerce_scalar(self, scalar: ScalarType) -> Result<Variable, RuntimeError> {
        Ok(match (scalar, self) {
            (ScalarType::Integer, Variable::Integer(i)) => Variable::Integer(i),
            (ScalarType::Integer, Variable::Double(d)) => Variable::Integer(d.trunc() as i64),
            (ScalarType::Integer, Variable::Bool(b)) => Variable::Integer(i64::from(b)),
            (ScalarType::Double, Variable::Double(d)) => Variable::Double(d),
            (ScalarType::Double, Variable::Integer(i)) => Variable::Double(i as f64),
            (ScalarType::Double, Variable::Bool(b)) => Variable::Double(if b { 1.0 } else { 0.0 }),
            (ScalarType::Bool, Variable::Bool(b)) => Variable::Bool(b),
            (ScalarType::Bool, Variable::Integer(i)) => Variable::Bool(i != 0),
            (ScalarType::Bool, Variable::Double(d)) => Variable::Bool(d != 0.0),
            (ScalarType::String, Variable::String(s)) => Variable::String(s),
            (scalar, other) => {
                return Err(RuntimeError::TypeMismatch {
                    expected: scalar.name().to_string(),
                    found: other.kind_name(),
                })
            }
        })
    }

    /// Reads text typed by a user into a value for a slot declared as `spec`.
    pub fn from_text(text: &str, spec: &TypeSpec) -> Result<Variable, RuntimeError> {
        let scalar = match spec {
            TypeSpec::Scalar(scalar) => *scalar,
            TypeSpec::Generic(inner) => return Variable::from_text(text, inner),
            _ => {
                return Err(RuntimeError::TypeMismatch {
                    expected: spec_name(spec),
                    found: "STRING",
                })
            }
        };
        let trimmed = text.trim();
        let value = match scalar {
            ScalarType::Integer => trimmed.parse().ok().map(Variable::Integer),
            ScalarType::Double => trimmed.parse().ok().map(Variable::Double),
            ScalarType::Bool => match trimmed.to_ascii_uppercase().as_str() {
                "TRUE" | "1" => Some(Variable::Bool(true)),
                "FALSE" | "0" => Some(Variable::Bool(false)),
                _ => None,
            },
            ScalarType::String => Some(Variable::String(text.to_string())),
        };
        value.ok_or_else(|| RuntimeError::TypeMismatch {
            expected: scalar.name().to_string(),
            found: "STRING",
        })
    }

    /// Bakes the current value into a literal node.
    pub fn freeze(&self) -> Variable {
        let literal = match self {
            Variable::Integer(i) => Expression::integer(*i),
            Variable::Double(d) => Expression::double(*d),
            Variable::Bool(b) => Expression::BooleanLiteral(*b),
            Variable::Frozen(_) => return self.clone(),
            other => Expression::StringLiteral(other.to_string()),
        };
        Variable::Frozen(Box::new(literal))
    }

    /// Turns a frozen literal back into a plain value. Other values pass
    /// through.
    pub fn thaw(self) -> Variable {
        let Variable::Frozen(expr) = self else {
            return self;
        };
        match *expr {
            Expression::IntegerLiteral { value, .. } => Variable::Integer(value),
            Expression::DoubleLiteral { value, .. } => Variable::Double(value),
            Expression::BooleanLiteral(b) => Variable::Bool(b),
            Expression::StringLiteral(s) | Expression::Constant(s) => Variable::String(s),
            other => Variable::String(other.to_string()),
        }
    }

    /// Collects every reference handle held by `self`, including nested ones.
    pub fn collect_handles(&self, out: &mut IndexSet<RefHandle>) {
        match self {
            Variable::Reference(Some(handle)) => {
                out.insert(*handle);
            }
            Variable::Array(items) => items.iter().for_each(|i| i.collect_handles(out)),
            Variable::Map(entries) | Variable::Struct(entries) => {
                entries.values().for_each(|v| v.collect_handles(out))
            }
            _ => {}
        }
    }
}

fn spec_name(spec: &TypeSpec) -> String {
    match spec {
        TypeSpec::Scalar(scalar) => scalar.name().to_string(),
        TypeSpec::Reference(Some(kind)) => format!("REFERENCE {kind}"),
        TypeSpec::Reference(None) => "REFERENCE".to_string(),
        TypeSpec::File => "FILE_DESCRIPTOR".to_string(),
        TypeSpec::Array(inner) => format!("ARRAY {}", spec_name(inner)),
        TypeSpec::Map(inner) => format!("MAP {}", spec_name(inner)),
        TypeSpec::Struct(_) => "STRUCT".to_string(),
        TypeSpec::Generic(inner) => format!("GENERIC {}", spec_name(inner)),
    }
}

/// Text form used by the string path and by `PRINT`.
impl Display for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Variable::Integer(i) => write!(f, "{i}"),
            Variable::Double(d) => write!(f, "{d}"),
            Variable::String(s) => f.write_str(s),
            Variable::Bool(true) => f.write_str("TRUE"),
            Variable::Bool(false) => f.write_str("FALSE"),
            Variable::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Variable::Map(entries) | Variable::Struct(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            Variable::Reference(Some(handle)) => write!(f, "{handle}"),
            Variable::Reference(None) => f.write_str("<none>"),
            Variable::File(file) => f.write_str(&file.path),
            Variable::Frozen(expr) => match expr.as_ref() {
                Expression::StringLiteral(s) => f.write_str(s),
                other => write!(f, "{other}"),
            },
        }
    }
}
