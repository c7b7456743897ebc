use ast::{Command, CommandKind, Expression, NodeId, RefKind, SelectMode, TypeSpec};
use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::{exec::Interpreter, Env, Interpretable, SymbolTable, Variable};

/// Which body of an `IF` chain is live.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ActiveBranch {
    #[default]
    None,
    Branch(usize),
    Else,
}

/// A `SUB_PICTURE` with its file and position baked at evaluation time.
#[derive(Clone, Debug, PartialEq)]
pub struct FrozenPlacement {
    pub id: NodeId,
    pub file: Variable,
    pub x: Variable,
    pub y: Variable,
}

#[derive(Clone, Debug, PartialEq)]
pub enum WidgetRole {
    /// Always satisfied.
    Display,
    Input {
        min: Option<Expression>,
        max: Option<Expression>,
    },
    Select {
        mode: SelectMode,
        kinds: Vec<RefKind>,
        limit: Option<usize>,
    },
    Table {
        required: bool,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct WidgetState {
    /// Backing variable, or the file name for a picture.
    pub name: String,
    pub ty: TypeSpec,
    pub role: WidgetRole,
    pub enabled: bool,
    /// Last requirement paint; `None` until first painted.
    pub satisfied: Option<bool>,
}

impl WidgetState {
    pub fn is_required(&self) -> bool {
        match &self.role {
            WidgetRole::Display => false,
            WidgetRole::Input { .. } => true,
            WidgetRole::Select { mode, .. } => !mode.is_optional(),
            WidgetRole::Table { required } => *required,
        }
    }
}

/// Everything the engine derives from the symbol table between passes.
#[derive(Clone, Debug, Default)]
pub struct EngineState {
    pub branches: IndexMap<NodeId, ActiveBranch>,
    pub placements: Vec<FrozenPlacement>,
    pub widgets: IndexMap<NodeId, WidgetState>,
    /// Selected row per table name.
    pub selected_rows: IndexMap<String, usize>,
    pub valid: bool,
}

impl EngineState {
    /// Names of the enabled required widgets that are not satisfied.
    pub fn unsatisfied(&self) -> Vec<String> {
        self.widgets
            .values()
            .filter(|w| w.enabled && w.is_required() && w.satisfied == Some(false))
            .map(|w| w.name.clone())
            .collect()
    }

    pub fn widget_named(&self, name: &str) -> Option<(NodeId, &WidgetState)> {
        self.widgets
            .iter()
            .find(|(_, w)| w.name == name)
            .map(|(id, w)| (*id, w))
    }
}

impl Interpreter<'_> {
    /// Recomputes the live branch of every `IF` and pushes enabled state
    /// changes to the binder.
    ///
    /// Everything inside a conditional body is first switched off, then the
    /// live bodies are switched back on top-down, so a widget ends enabled
    /// only when every `IF` above it picked its body. Only widgets whose
    /// state actually changed reach the binder.
    pub(crate) fn regate(&mut self, sections: &[&[Command]]) {
        let mut desired = IndexMap::new();
        for commands in sections {
            self.deactivate(commands, false, &mut desired);
        }
        for commands in sections {
            self.activate(commands, &mut desired);
        }
        let mut changed = 0;
        for (id, enabled) in desired {
            let Some(widget) = self.state.widgets.get_mut(&id) else {
                continue;
            };
            if widget.enabled != enabled {
                widget.enabled = enabled;
                self.binder.set_enabled(id, enabled);
                changed += 1;
            }
        }
        debug!(changed, "gating recomputed");
    }

    fn deactivate(
        &mut self,
        commands: &[Command],
        inside: bool,
        desired: &mut IndexMap<NodeId,
        bool>,
    ) {
        for command in commands {
            match &command.kind {
                CommandKind::If(chain) => {
                    self.state.branches.insert(command.id, ActiveBranch::None);
                    for branch in &chain.branches {
                        self.deactivate(&branch.body, true, desired);
                    }
                    if let Some(body) = &chain.else_body {
                        self.deactivate(body, true, desired);
                    }
                }
                CommandKind::CatchError(catch) => self.deactivate(&catch.body, inside, desired),
                kind if inside && kind.is_widget() => {
                    desired.insert(command.id, false);
                }
                _ => {}
            }
        }
    }

    fn activate(&mut self, commands: &[Command], desired: &mut IndexMap<NodeId, bool>) {
        for command in commands {
            match &command.kind {
                CommandKind::If(chain) => {
                    // A condition that cannot be evaluated selects nothing.
                    let active = self.pick_branch(chain).unwrap_or_else(|error| {
                        debug!(id = %command.id, %error, "condition failed");
                        ActiveBranch::None
                    });
                    self.state.branches.insert(command.id, active);
                    trace!(id = %command.id, ?active, "branch gated");
                    let body = match active {
                        ActiveBranch::Branch(k) => chain.branches.get(k).map(|b| b.body.as_slice()),
                        ActiveBranch::Else => chain.else_body.as_deref(),
                        ActiveBranch::None => None,
                    };
                    if let Some(body) = body {
                        self.activate(body, desired);
                    }
                }
                CommandKind::CatchError(catch) => self.activate(&catch.body, desired),
                kind if kind.is_widget() => {
                    desired.insert(command.id, true);
                }
                _ => {}
            }
        }
    }

    pub(crate) fn publish_placements(&mut self) {
        trace!(count = self.state.placements.len(), "placing sub-pictures");
        self.binder.place_sub_pictures(&self.state.placements);
    }

    /// Re-paints the requirement of every enabled required widget and
    /// returns whether all of them are satisfied.
    pub(crate) fn validate(&mut self) -> bool {
        let env = Env::new(&*self.symbols, self.config.angle_unit);
        let state = &mut *self.state;
        let mut valid = true;
        for (id, widget) in state.widgets.iter_mut() {
            if !widget.enabled || !widget.is_required() {
                continue;
            }
            let met = satisfied(widget, &env, &state.selected_rows);
            if widget.satisfied != Some(met) {
                widget.satisfied = Some(met);
                self.binder.paint_requirement(*id, met);
            }
            valid &= met;
        }
        state.valid = valid;
        debug!(valid, "validity recomputed");
        valid
    }
}

fn satisfied(widget: &WidgetState, env: &Env, selected_rows: &IndexMap<String, usize>) -> bool {
    match &widget.role {
        WidgetRole::Display => true,
        WidgetRole::Input { min, max } => input_satisfied(&widget.name, min, max, env),
        WidgetRole::Select { mode, .. } => {
            mode.is_optional() || holds_reference(env.symbols, &widget.name)
        }
        WidgetRole::Table { required } => !required || selected_rows.contains_key(&widget.name),
    }
}

fn input_satisfied(
    name: &str,
    min: &Option<Expression>,
    max: &Option<Expression>,
    env: &Env,
) -> bool {
    let Some(slot) = env.symbols.slot(name) else {
        return false;
    };
    if !slot.initialized {
        return false;
    }
    match &slot.value {
        Variable::String(text) => !text.is_empty(),
        value => {
            let Some(number) = value.as_f64() else {
                return true;
            };
            let bound = |expr: &Option<Expression>| match expr {
                Some(expr) => expr.run(env).ok().and_then(|v| v.as_f64()).map(Some),
                None => Some(None),
            };
            match (bound(min), bound(max)) {
                (Some(min), Some(max)) => {
                    min.map_or(true, |m| number >= m) && max.map_or(true, |m| number <= m)
                }
                // A bound that cannot be computed is never met.
                _ => false,
            }
        }
    }
}

fn holds_reference(symbols: &SymbolTable, name: &str) -> bool {
    match symbols.get(name) {
        Some(Variable::Reference(handle)) => handle.is_some(),
        Some(Variable::Array(items)) => items
            .iter()
            .any(|item| matches!(item, Variable::Reference(Some(_)))),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{exec::Pass, NullProvider, RecordingBinder, SessionConfig};

    const SCRIPT: &str = "\
BEGIN_GUI_DESCR
DECLARE_VARIABLE INTEGER mode 1
USER_INPUT_PARAM DOUBLE width MIN_VALUE 1 MAX_VALUE 10
IF mode == 1
  USER_INPUT_PARAM STRING label
  IF width > 5
    SHOW_PARAM DOUBLE area
  END_IF
ELSE
  USER_SELECT AXIS axis
END_IF
END_GUI_DESCR
";

    struct Fixture {
        commands: Vec<Command>,
        symbols: SymbolTable,
        binder: RecordingBinder,
        state: EngineState,
        config: SessionConfig,
    }

    impl Fixture {
        fn new() -> Self {
            let program = parser::parse_program(SCRIPT).unwrap();
            let mut fixture = Fixture {
                commands: program.gui.unwrap().commands,
                symbols: SymbolTable::new(),
                binder: RecordingBinder::new(),
                state: EngineState::default(),
                config: SessionConfig::default(),
            };
            fixture.with(Pass::Build, |i, commands| {
                i.run_block(commands, true).unwrap();
            });
            fixture.gate();
            fixture
        }

        fn with(&mut self, pass: Pass, f: impl FnOnce(&mut Interpreter, &[Command])) {
            let mut provider = NullProvider;
            let mut interpreter = Interpreter::new(
                &mut self.symbols,
                &mut self.binder,
                &mut provider,
                &mut self.state,
                &self.config,
                pass,
            );
            f(&mut interpreter, &self.commands);
        }

        fn gate(&mut self) -> bool {
            let mut valid = false;
            self.with(Pass::Rebuild, |i, commands| {
                i.regate(&[commands]);
                valid = i.validate();
            });
            valid
        }

        fn enabled(&self) -> Vec<(String, bool)> {
            self.state
                .widgets
                .values()
                .map(|w| (w.name.clone(), w.enabled))
                .collect()
        }
    }

    #[test]
    fn nested_bodies_follow_their_conditions() {
        let mut fixture = Fixture::new();
        assert_eq!(
            fixture.enabled(),
            vec![
                ("width".to_string(), true),
                ("label".to_string(), true),
                ("area".to_string(), false),
                ("axis".to_string(), false),
            ]
        );

        fixture.symbols.assign("width", Variable::Double(7.0)).unwrap();
        fixture.gate();
        assert_eq!(fixture.enabled()[2], ("area".to_string(), true));

        fixture.symbols.assign("mode", Variable::Integer(2)).unwrap();
        fixture.gate();
        assert_eq!(
            fixture.enabled(),
            vec![
                ("width".to_string(), true),
                ("label".to_string(), false),
                ("area".to_string(), false),
                ("axis".to_string(), true),
            ]
        );
        let branches: Vec<_> = fixture.state.branches.values().copied().collect();
        assert_eq!(branches, vec![ActiveBranch::Else, ActiveBranch::None]);
    }

    #[test]
    fn only_changes_reach_the_binder() {
        let mut fixture = Fixture::new();
        let before = fixture.binder.events.len();
        fixture.gate();
        assert_eq!(fixture.binder.events.len(), before);
    }

    #[test]
    fn requirements_track_inputs() {
        let mut fixture = Fixture::new();
        assert!(!fixture.state.valid);
        assert_eq!(
            fixture.state.unsatisfied(),
            vec!["width".to_string(), "label".to_string()]
        );

        fixture.symbols.assign("width", Variable::Double(12.0)).unwrap();
        fixture.symbols.assign("label", Variable::String("top".into())).unwrap();
        assert!(!fixture.gate());
        assert_eq!(fixture.state.unsatisfied(), vec!["width".to_string()]);

        fixture.symbols.assign("width", Variable::Double(4.0)).unwrap();
        assert!(fixture.gate());
        let width = fixture.state.widget_named("width").map(|(id, _)| id).unwrap();
        assert_eq!(fixture.binder.requirement(width), Some(true));
    }

    #[test]
    fn disabled_widgets_are_not_required() {
        let mut fixture = Fixture::new();
        fixture.symbols.assign("width", Variable::Double(2.0)).unwrap();
        fixture.symbols.assign("mode", Variable::Integer(2)).unwrap();
        assert!(!fixture.gate());
        assert_eq!(fixture.state.unsatisfied(), vec!["axis".to_string()]);
    }
}
