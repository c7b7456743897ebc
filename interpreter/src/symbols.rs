use ast::{ScalarType, TypeSpec};
use indexmap::{IndexMap, IndexSet};
use tracing::trace;

use crate::{RefHandle, RuntimeError, Variable};

/// Elements a single write may append past the end of an array.
pub const MAX_ARRAY_GROWTH: usize = 4096;

#[derive(Clone, Debug, PartialEq)]
pub struct Slot {
    pub value: Variable,
    pub ty: TypeSpec,
    pub declaration_count: u32,
    /// False while the slot still holds the zero value it was created with.
    pub initialized: bool,
}

/// Outcome of a declaration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Declared {
    New,
    /// The name had been invalidated and was declared afresh.
    Replaced,
    /// The name was live; the old value stays.
    Kept,
}

/// One step of an element target, with index and key already evaluated.
#[derive(Clone, Debug, PartialEq)]
pub enum Step {
    Index(i64),
    Member(String),
    Key(String),
}

#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    slots: IndexMap<String, Slot>,
    /// Names removed by `INVALIDATE_PARAM`, with the declaration count they had.
    invalidated: IndexMap<String, u32>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table holding the builtin constants `PI` and `E`.
    pub fn seeded() -> Self {
        let mut table = Self::new();
        for (name, value) in [("PI", std::f64::consts::PI), ("E", std::f64::consts::E)] {
            table.slots.insert(
                name.to_string(),
                Slot {
                    value: Variable::Double(value),
                    ty: TypeSpec::Scalar(ScalarType::Double),
                    declaration_count: 1,
                    initialized: true,
                },
            );
        }
        table
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.slots.get(name).map(|slot| &slot.value)
    }

    pub fn slot(&self, name: &str) -> Option<&Slot> {
        self.slots.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    pub fn is_invalidated(&self, name: &str) -> bool {
        self.invalidated.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Slot)> {
        self.slots.iter().map(|(name, slot)| (name.as_str(), slot))
    }

    /// Declares `name` as `ty`, initialised to `value` or the zero of `ty`.
    ///
    /// A live name keeps its slot untouched. An invalidated or unknown name
    /// gets a fresh slot whose declaration count continues from the last one.
    pub fn declare(
        &mut self,
        name: &str,
        ty: TypeSpec,
        value: Option<Variable>,
    ) -> Result<Declared, RuntimeError> {
        if self.slots.contains_key(name) {
            return Ok(Declared::Kept);
        }
        let initialized = value.is_some();
        let value = match value {
            Some(value) => value.coerce_to(&ty)?,
            None => Variable::zero(&ty),
        };
        let previous = self.invalidated.shift_remove(name);
        self.slots.insert(
            name.to_string(),
            Slot {
                value,
                ty,
                declaration_count: previous.unwrap_or(0) + 1,
                initialized,
            },
        );
        trace!(name, "declared");
        Ok(match previous {
            Some(_) => Declared::Replaced,
            None => Declared::New,
        })
    }

    /// Stores `value` into the root slot `name`, coerced by the slot's
    /// declared type.
    pub fn assign(&mut self, name: &str, value: Variable) -> Result<(), RuntimeError> {
        self.assign_path(name, &[], value)
    }

    /// Stores `value` at `path` below the slot `name`. Nothing is written
    /// unless the whole path resolves and the value converts.
    pub fn assign_path(
        &mut self,
        name: &str,
        path: &[Step],
        value: Variable,
    ) -> Result<(), RuntimeError> {
        let slot = self
            .slots
            .get_mut(name)
            .ok_or_else(|| RuntimeError::UndefinedVariable(name.to_string()))?;
        if path.is_empty() {
            slot.value = value.coerce_to(&slot.ty)?;
            slot.initialized = true;
            return Ok(());
        }
        let mut root = slot.value.clone();
        write_path(&mut root, Some(&slot.ty), path, value)?;
        slot.value = root;
        slot.initialized = true;
        Ok(())
    }

    /// Removes a scalar from the table and remembers it as invalidated.
    /// Invalidating a name twice is a no-op.
    pub fn invalidate(&mut self, name: &str) -> Result<(), RuntimeError> {
        let Some(slot) = self.slots.get(name) else {
            if self.invalidated.contains_key(name) {
                return Ok(());
            }
            return Err(RuntimeError::UndefinedVariable(name.to_string()));
        };
        if !slot.ty.is_scalar() {
            return Err(RuntimeError::InvalidateNonScalar(name.to_string()));
        }
        let count = slot.declaration_count;
        self.slots.shift_remove(name);
        self.invalidated.insert(name.to_string(), count);
        Ok(())
    }

    /// Declared type of the element at `path` below `name`, when the
    /// declaration fixes one.
    pub fn element_type(&self, name: &str, path: &[Step]) -> Option<&TypeSpec> {
        let slot = self.slots.get(name)?;
        path.iter()
            .try_fold(&slot.ty, |spec, step| element_spec(Some(spec), step))
    }

    pub fn element(&self, name: &str, path: &[Step]) -> Option<&Variable> {
        let mut value = &self.slots.get(name)?.value;
        for step in path {
            value = match (value, step) {
                (Variable::Array(items), Step::Index(index)) => {
                    items.get(usize::try_from(*index).ok()?)?
                }
                (Variable::Struct(fields), Step::Member(member)) => fields.get(member)?,
                (Variable::Map(entries), Step::Key(key)) => entries.get(key)?,
                _ => return None,
            };
        }
        Some(value)
    }

    /// Every reference handle held anywhere in the table.
    pub fn handles(&self) -> IndexSet<RefHandle> {
        let mut handles = IndexSet::new();
        for slot in self.slots.values() {
            slot.value.collect_handles(&mut handles);
        }
        handles
    }
}

/// Declared type of the element one step below `spec`, where known.
fn element_spec<'t>(spec: Option<&'t TypeSpec>, step: &Step) -> Option<&'t TypeSpec> {
    match (spec?, step) {
        (TypeSpec::Array(inner), Step::Index(_)) | (TypeSpec::Map(inner), Step::Key(_)) => {
            Some(inner)
        }
        (TypeSpec::Struct(members), Step::Member(name)) => members
            .iter()
            .find(|m| &m.name.1 == name)
            .map(|m| &m.ty),
        _ => None,
    }
}

fn write_path(
    target: &mut Variable,
    spec: Option<&TypeSpec>,
    path: &[Step],
    value: Variable,
) -> Result<(), RuntimeError> {
    let Some((step, rest)) = path.split_first() else {
        *target = match spec {
            Some(spec) => value.coerce_to(spec)?,
            None => value.coerce_like(target)?,
        };
        return Ok(());
    };
    let inner_spec = element_spec(spec, step);
    let element = match (target, step) {
        (Variable::Array(items), Step::Index(index)) => {
            let position = usize::try_from(*index).map_err(|_| RuntimeError::IndexOutOfBounds {
                index: *index,
                len: items.len(),
            })?;
            // Writing past the end grows the array with zero elements, at most
            // MAX_ARRAY_GROWTH of them per write.
            if position >= items.len() {
                let spec = inner_spec
                    .filter(|_| position - items.len() < MAX_ARRAY_GROWTH)
                    .ok_or(RuntimeError::IndexOutOfBounds {
                        index: *index,
                        len: items.len(),
                    })?;
                items.resize(position + 1, Variable::zero(spec));
            }
            &mut items[position]
        }
        (Variable::Struct(fields), Step::Member(member)) => {
            fields
                .get_mut(member)
                .ok_or_else(|| RuntimeError::NoSuchMember {
                    target: "STRUCT",
                    member: member.clone(),
                })?
        }
        (Variable::Map(entries), Step::Key(key)) => {
            if !entries.contains_key(key) {
                let fresh = match inner_spec {
                    Some(spec) => Variable::zero(spec),
                    None if rest.is_empty() => value.clone(),
                    None => return Err(RuntimeError::NoSuchKey(key.clone())),
                };
                entries.insert(key.clone(), fresh);
            }
            entries
                .get_mut(key)
                .ok_or_else(|| RuntimeError::NoSuchKey(key.clone()))?
        }
        (other, Step::Member(member)) => {
            return Err(RuntimeError::NoSuchMember {
                target: other.kind_name(),
                member: member.clone(),
            })
        }
        (other, _) => return Err(RuntimeError::NotIndexable(other.kind_name())),
    };
    write_path(element, inner_spec, rest, value)
}

#[cfg(test)]
mod tests {
    use ast::Span;
    use pretty_assertions::assert_eq;

    use super::*;

    fn int() -> TypeSpec {
        TypeSpec::Scalar(ScalarType::Integer)
    }

    #[test]
    fn seeded_constants() {
        let table = SymbolTable::seeded();
        assert_eq!(table.get("PI"), Some(&Variable::Double(std::f64::consts::PI)));
        assert!(table.contains("E"));
        assert!(SymbolTable::new().is_empty());
    }

    #[test]
    fn redeclaration_keeps_live_value() {
        let mut table = SymbolTable::new();
        assert_eq!(
            table.declare("X", int(), Some(Variable::Integer(1))),
            Ok(Declared::New)
        );
        assert_eq!(
            table.declare("X", int(), Some(Variable::Integer(2))),
            Ok(Declared::Kept)
        );
        assert_eq!(table.get("X"), Some(&Variable::Integer(1)));
        assert_eq!(table.slot("X").map(|s| s.declaration_count), Some(1));
    }

    #[test]
    fn invalidated_name_is_declared_afresh() {
        let mut table = SymbolTable::new();
        table.declare("X", int(), Some(Variable::Integer(1))).unwrap();
        table.invalidate("X").unwrap();
        assert!(!table.contains("X"));
        assert!(table.is_invalidated("X"));
        assert_eq!(
            table.declare("X", int(), Some(Variable::Integer(2))),
            Ok(Declared::Replaced)
        );
        assert_eq!(table.get("X"), Some(&Variable::Integer(2)));
        assert_eq!(table.slot("X").map(|s| s.declaration_count), Some(2));
        assert!(!table.is_invalidated("X"));
    }

    #[test]
    fn only_scalars_can_be_invalidated() {
        let mut table = SymbolTable::new();
        table
            .declare("list", TypeSpec::Array(Box::new(int())), None)
            .unwrap();
        assert_eq!(
            table.invalidate("list"),
            Err(RuntimeError::InvalidateNonScalar("list".into()))
        );
        assert_eq!(
            table.invalidate("nothing"),
            Err(RuntimeError::UndefinedVariable("nothing".into()))
        );
    }

    #[test]
    fn element_writes() {
        let mut table = SymbolTable::new();
        let point = TypeSpec::Struct(vec![ast::Declaration {
            name: (Span::default(), "x".into()),
            ty: TypeSpec::Scalar(ScalarType::Double),
            default: None,
        }]);
        table
            .declare("pts", TypeSpec::Array(Box::new(point)), None)
            .unwrap();
        table
            .assign_path(
                "pts",
                &[Step::Index(1), Step::Member("x".into())],
                Variable::Integer(4),
            )
            .unwrap();
        assert_eq!(table.get("pts").unwrap().to_string(), "[{x: 0}, {x: 4}]");

        table
            .declare("lengths", TypeSpec::Map(Box::new(int())), None)
            .unwrap();
        table
            .assign_path("lengths", &[Step::Key("m8".into())], Variable::Double(12.7))
            .unwrap();
        assert_eq!(table.get("lengths").unwrap().to_string(), "{m8: 12}");
    }

    #[test]
    fn failed_writes_leave_the_table_unchanged() {
        let mut table = SymbolTable::new();
        table
            .declare("names", TypeSpec::Array(Box::new(TypeSpec::Scalar(ScalarType::String))), None)
            .unwrap();
        let before = table.get("names").cloned();
        assert!(table
            .assign_path("names", &[Step::Index(2)], Variable::Integer(1))
            .is_err());
        assert_eq!(table.get("names").cloned(), before);
        assert!(table
            .assign_path("names", &[Step::Member("x".into())], Variable::Integer(1))
            .is_err());
        assert_eq!(
            table.assign_path("names", &[Step::Index(i64::MAX)], Variable::String("x".into())),
            Err(RuntimeError::IndexOutOfBounds {
                index: i64::MAX,
                len: 0,
            })
        );
        assert_eq!(table.get("names").cloned(), before);
        assert_eq!(
            table.assign("missing", Variable::Integer(1)),
            Err(RuntimeError::UndefinedVariable("missing".into()))
        );
    }
}
