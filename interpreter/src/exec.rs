use ast::{
    Accessor, Assignment, CatchError, Command, CommandKind, Declaration, Expression, If, NodeId,
    OptionKind, ParamWidget, RefKind, ScalarType, SearchModelRef, SelectMode, SubPicture, Table,
    TypeSpec, UserSelect,
};
use indexmap::IndexSet;
use tracing::{debug, info, trace, warn};

use crate::{
    eval::index_value, render, ActiveBranch, CommandFailure, Declared, EngineState, Env,
    FrozenPlacement, Interpretable, LayoutCursor, RefHandle, RuntimeError, SelectionProvider,
    SessionConfig, Step, SymbolTable, UiBinder, Variable, WidgetRole, WidgetState,
};

/// Which walk over the AST is running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Pass {
    /// First walk of the dialog: creates widgets and runs live commands.
    Build,
    /// Refresh of frozen state: declarations, assignments and sub-pictures
    /// of live bodies only.
    Rebuild,
    /// The `ASM` section, run once the dialog is confirmed.
    Confirm,
}

#[derive(Clone, Copy)]
enum ParamRole {
    Show,
    Checkbox,
    Input,
}

pub(crate) struct Interpreter<'s> {
    pub(crate) symbols: &'s mut SymbolTable,
    pub(crate) binder: &'s mut dyn UiBinder,
    pub(crate) provider: &'s mut dyn SelectionProvider,
    pub(crate) state: &'s mut EngineState,
    pub(crate) config: &'s SessionConfig,
    pass: Pass,
    layout: LayoutCursor,
    catch_depth: u32,
    failures: Vec<CommandFailure>,
}

impl<'s> Interpreter<'s> {
    pub(crate) fn new(
        symbols: &'s mut SymbolTable,
        binder: &'s mut dyn UiBinder,
        provider: &'s mut dyn SelectionProvider,
        state: &'s mut EngineState,
        config: &'s SessionConfig,
        pass: Pass,
    ) -> Self {
        Self {
            symbols,
            binder,
            provider,
            state,
            config,
            pass,
            layout: LayoutCursor::default(),
            catch_depth: 0,
            failures: Vec::new(),
        }
    }

    pub(crate) fn env(&self) -> Env<'_> {
        Env::new(&*self.symbols, self.config.angle_unit)
    }

    pub(crate) fn into_failures(self) -> Vec<CommandFailure> {
        self.failures
    }

    /// Runs a whole section. Failures are recorded, never returned.
    pub(crate) fn run_section(&mut self, commands: &[Command]) {
        if let Err(failure) = self.run_block(commands, true) {
            self.failures.push(failure);
        }
    }

    /// Runs `commands` in order. Outside a `CATCH_ERROR` body a failing
    /// command is recorded and skipped; inside one the failure ends the body.
    pub(crate) fn run_block(
        &mut self,
        commands: &[Command],
        live: bool,
    ) -> Result<(), CommandFailure> {
        for command in commands {
            let outcome = match &command.kind {
                CommandKind::If(chain) => self.run_if(command, chain, live),
                CommandKind::CatchError(catch) => self.run_catch(command, catch, live),
                _ => match self.execute(command, live) {
                    Ok(()) => Ok(()),
                    Err(error) => self.fail(command, error),
                },
            };
            outcome?;
        }
        Ok(())
    }

    fn fail(&mut self, command: &Command, error: RuntimeError) -> Result<(), CommandFailure> {
        let failure = CommandFailure {
            id: command.id,
            span: command.span,
            error,
        };
        if self.catch_depth > 0 {
            return Err(failure);
        }
        warn!(id = %command.id, at = %command.span, error = %failure.error, "command failed");
        self.failures.push(failure);
        Ok(())
    }

    /// First branch whose condition holds.
    pub(crate) fn pick_branch(&self, chain: &If) -> Result<ActiveBranch, RuntimeError> {
        let env = self.env();
        for (index, branch) in chain.branches.iter().enumerate() {
            if branch.condition.run(&env)?.truthy()? {
                return Ok(ActiveBranch::Branch(index));
            }
        }
        Ok(match chain.else_body {
            Some(_) => ActiveBranch::Else,
            None => ActiveBranch::None,
        })
    }

    fn run_if(&mut self, command: &Command, chain: &If, live: bool) -> Result<(), CommandFailure> {
        let active = if live {
            match self.pick_branch(chain) {
                Ok(active) => active,
                Err(error) => {
                    self.fail(command, error)?;
                    ActiveBranch::None
                }
            }
        } else {
            ActiveBranch::None
        };
        self.state.branches.insert(command.id, active);
        trace!(id = %command.id, ?active, "branch picked");

        let bodies = chain
            .branches
            .iter()
            .map(|b| b.body.as_slice())
            .chain(chain.else_body.as_deref());
        for (index, body) in bodies.enumerate() {
            let chosen = match active {
                ActiveBranch::Branch(k) => k == index,
                ActiveBranch::Else => index == chain.branches.len(),
                ActiveBranch::None => false,
            };
            // Widgets of every branch exist from the first pass on; later
            // passes only look inside the live one.
            if chosen {
                self.run_block(body, true)?;
            } else if self.pass == Pass::Build {
                self.run_block(body, false)?;
            }
        }
        Ok(())
    }

    fn run_catch(
        &mut self,
        command: &Command,
        catch: &CatchError,
        live: bool,
    ) -> Result<(), CommandFailure> {
        if !live {
            return self.run_block(&catch.body, false);
        }
        self.catch_depth += 1;
        let result = self.run_block(&catch.body, true);
        self.catch_depth -= 1;
        let caught = match result {
            Ok(()) => false,
            Err(failure) => {
                debug!(id = %failure.id, error = %failure.error, "error caught");
                true
            }
        };
        let Some((_, status)) = &catch.status else {
            return Ok(());
        };
        let stored = self.store(
            status,
            TypeSpec::Scalar(ScalarType::Bool),
            Variable::Bool(caught),
        );
        match stored {
            Ok(()) => Ok(()),
            Err(error) => self.fail(command, error),
        }
    }

    fn execute(&mut self, command: &Command, live: bool) -> Result<(), RuntimeError> {
        let id = command.id;
        let build = self.pass == Pass::Build;
        // Provider calls, invalidation and output happen once per live
        // command, never on a refresh.
        let effects = live && self.pass != Pass::Rebuild;
        match &command.kind {
            CommandKind::DeclareVariable(declaration) if live => self.declare(declaration),
            CommandKind::Assignment(assignment) if live => self.assign(assignment),
            CommandKind::SubPicture(picture) if live => self.sub_picture(id, picture),

            CommandKind::ShowParam(param) if build => self.param_widget(id, ParamRole::Show, param),
            CommandKind::CheckboxParam(param) if build => {
                self.param_widget(id, ParamRole::Checkbox, param)
            }
            CommandKind::UserInputParam(param) if build => {
                self.param_widget(id, ParamRole::Input, param)
            }
            CommandKind::RadiobuttonParam(radio) if build => {
                self.ensure_declared(&radio.name.1, TypeSpec::Scalar(radio.ty))?;
                let env = self.env();
                let choices = radio
                    .choices
                    .iter()
                    .map(|choice| render(choice, &env))
                    .collect::<Result<Vec<_>, _>>()?;
                self.register(id, &radio.name.1, TypeSpec::Scalar(radio.ty), WidgetRole::Display);
                let at = self.next_position();
                self.binder
                    .radiobutton_param(id, radio, &choices, &at, &*self.symbols)?;
                Ok(())
            }
            CommandKind::UserSelect(select) if build => self.user_select(id, select),
            CommandKind::GlobalPicture(picture) if build => {
                let file = render(&picture.file, &self.env())?;
                self.register(
                    id,
                    &file,
                    TypeSpec::Scalar(ScalarType::String),
                    WidgetRole::Display,
                );
                let at = self.next_position();
                self.binder.global_picture(id, &file, &at)?;
                Ok(())
            }
            CommandKind::Table(table) if build => self.table(id, table),
            CommandKind::Config(config) if build => {
                if config.options.has(OptionKind::OrientationHorizontal) {
                    self.layout.horizontal = true;
                }
                self.binder.configure(&config.options.0);
                Ok(())
            }

            CommandKind::InvalidateParam(invalidate) if effects => {
                self.symbols.invalidate(&invalidate.name.1)?;
                debug!(name = invalidate.name.1, "invalidated");
                Ok(())
            }
            CommandKind::MeasureDistance(measure) if effects => {
                let from = self.reference(&measure.from)?;
                let to = self.reference(&measure.to)?;
                let distance = self.provider.measure_distance(from, to)?;
                self.store(
                    &measure.result.1,
                    TypeSpec::Scalar(ScalarType::Double),
                    Variable::Double(distance),
                )
            }
            CommandKind::MeasureLength(measure) if effects => {
                let target = self.reference(&measure.target)?;
                let length = self.provider.measure_length(target)?;
                self.store(
                    &measure.result.1,
                    TypeSpec::Scalar(ScalarType::Double),
                    Variable::Double(length),
                )
            }
            CommandKind::SearchModelRef(search) if effects => self.search(search, false),
            CommandKind::SearchModelRefs(search) if effects => self.search(search, true),
            CommandKind::Print(print) if effects => {
                let text = render(&print.value, &self.env())?;
                info!(target: "asmgui::print", "{text}");
                self.binder.message(&text);
                Ok(())
            }

            _ => Ok(()),
        }
    }

    fn declare(&mut self, declaration: &Declaration) -> Result<(), RuntimeError> {
        let name = &declaration.name.1;
        if self.symbols.contains(name) {
            if self.pass == Pass::Rebuild {
                trace!(name, "already declared");
            } else {
                warn!(name, "variable already declared, keeping its value");
            }
            return Ok(());
        }
        let value = self.initial_value(&declaration.ty, declaration.default.as_ref())?;
        if self.symbols.declare(name, declaration.ty.clone(), value)? == Declared::Replaced {
            debug!(name, "declared again after invalidation");
        }
        Ok(())
    }

    fn initial_value(
        &self,
        ty: &TypeSpec,
        default: Option<&Expression>,
    ) -> Result<Option<Variable>, RuntimeError> {
        let env = self.env();
        match (ty, default) {
            (TypeSpec::Scalar(ScalarType::String), Some(default)) => {
                Ok(Some(Variable::String(render(default, &env)?)))
            }
            (_, Some(default)) => default.run(&env).map(Some),
            (TypeSpec::Struct(members), None) => {
                if !members.iter().any(has_default) {
                    return Ok(None);
                }
                let mut fields = indexmap::IndexMap::with_capacity(members.len());
                for member in members {
                    let value = self
                        .initial_value(&member.ty, member.default.as_ref())?
                        .unwrap_or_else(|| Variable::zero(&member.ty));
                    fields.insert(member.name.1.clone(), value);
                }
                Ok(Some(Variable::Struct(fields)))
            }
            _ => Ok(None),
        }
    }

    fn assign(&mut self, assignment: &Assignment) -> Result<(), RuntimeError> {
        let target = &assignment.target;
        let root = &target.root.1;
        if !self.symbols.contains(root) {
            return Err(RuntimeError::UndefinedVariable(root.clone()));
        }
        let env = self.env();
        let mut path = Vec::with_capacity(target.path.len());
        for accessor in &target.path {
            path.push(match accessor {
                Accessor::Index(index) => Step::Index(index_value(&index.run(&env)?)?),
                Accessor::Member(member) => Step::Member(member.clone()),
                Accessor::Key(key) => Step::Key(render(key, &env)?),
            });
        }
        let string_target = match self.symbols.element_type(root, &path) {
            Some(ty) => *ty == TypeSpec::Scalar(ScalarType::String),
            None => matches!(self.symbols.element(root, &path), Some(Variable::String(_))),
        };
        let value = if string_target {
            Variable::String(render(&assignment.value, &env)?)
        } else {
            assignment.value.run(&env)?
        };
        let before = self.symbols.handles();
        self.symbols.assign_path(root, &path, value)?;
        self.release(before);
        Ok(())
    }

    fn sub_picture(&mut self, id: NodeId, picture: &SubPicture) -> Result<(), RuntimeError> {
        let env = self.env();
        let file = render(&picture.file, &env)?;
        let x = picture.x.run(&env)?;
        let y = picture.y.run(&env)?;
        let placement = FrozenPlacement {
            id,
            file: Variable::String(file).freeze(),
            x: x.freeze(),
            y: y.freeze(),
        };
        trace!(%id, file = %placement.file, "sub-picture frozen");
        self.state.placements.push(placement);
        Ok(())
    }

    fn param_widget(
        &mut self,
        id: NodeId,
        role: ParamRole,
        param: &ParamWidget,
    ) -> Result<(), RuntimeError> {
        let name = &param.name.1;
        let ty = TypeSpec::Scalar(param.ty);
        self.ensure_declared(name, ty.clone())?;
        let widget_role = match role {
            ParamRole::Input => WidgetRole::Input {
                min: param.options.expression(OptionKind::MinValue).cloned(),
                max: param.options.expression(OptionKind::MaxValue).cloned(),
            },
            ParamRole::Show | ParamRole::Checkbox => WidgetRole::Display,
        };
        self.register(id, name, ty, widget_role);
        let at = self.next_position();
        match role {
            ParamRole::Show => self.binder.show_param(id, param, &at, &*self.symbols)?,
            ParamRole::Checkbox => self.binder.checkbox_param(id, param, &at, &*self.symbols)?,
            ParamRole::Input => self.binder.user_input_param(id, param, &at, &*self.symbols)?,
        }
        Ok(())
    }

    fn user_select(&mut self, id: NodeId, select: &UserSelect) -> Result<(), RuntimeError> {
        let single_kind = match select.kinds.as_slice() {
            [kind] => Some(*kind),
            _ => None,
        };
        let reference = TypeSpec::Reference(single_kind);
        let (ty, limit) = if select.mode.is_multiple() {
            let limit = select
                .options
                .integer(OptionKind::MaxSel)
                .and_then(|n| usize::try_from(n).ok())
                .or(self.config.selection_limit);
            (TypeSpec::Array(Box::new(reference)), limit)
        } else {
            (reference, Some(1))
        };
        self.ensure_declared(&select.name.1, ty.clone())?;
        self.register(
            id,
            &select.name.1,
            ty,
            WidgetRole::Select {
                mode: select.mode,
                kinds: select.kinds.clone(),
                limit,
            },
        );
        let at = self.next_position();
        self.binder.user_select(id, select, &at, &*self.symbols)?;
        Ok(())
    }

    fn table(&mut self, id: NodeId, table: &Table) -> Result<(), RuntimeError> {
        let name = &table.name.1;
        let ty = TypeSpec::Scalar(ScalarType::String);
        self.ensure_declared(name, ty.clone())?;
        for column in &table.columns {
            self.ensure_declared(&column.name, TypeSpec::Scalar(column.ty))?;
        }
        self.register(
            id,
            name,
            ty,
            WidgetRole::Table {
                required: table.options.has(OptionKind::Required),
            },
        );
        let at = self.next_position();
        self.binder.table(id, table, &at, &*self.symbols)?;
        Ok(())
    }

    fn search(&mut self, search: &SearchModelRef, many: bool) -> Result<(), RuntimeError> {
        let pattern = render(&search.pattern, &self.env())?;
        let limit = if many { None } else { Some(1) };
        let found = self.provider.search(search.kind, &pattern, limit)?;
        debug!(kind = %search.kind, pattern, found = found.len(), "model search");
        let reference = TypeSpec::Reference(Some(search.kind));
        let (ty, value) = if many {
            let items = found.into_iter().map(|h| Variable::Reference(Some(h))).collect();
            (TypeSpec::Array(Box::new(reference)), Variable::Array(items))
        } else {
            (reference, Variable::Reference(found.into_iter().next()))
        };
        self.store(&search.result.1, ty, value)
    }

    /// Writes `value` to `name`, declaring it as `ty` first when needed.
    fn store(&mut self, name: &str, ty: TypeSpec, value: Variable) -> Result<(), RuntimeError> {
        if !self.symbols.contains(name) {
            self.symbols.declare(name, ty, Some(value))?;
            return Ok(());
        }
        let before = self.symbols.handles();
        self.symbols.assign(name, value)?;
        self.release(before);
        Ok(())
    }

    fn release(&mut self, before: IndexSet<RefHandle>) {
        release(&*self.symbols, &mut *self.provider, before);
    }

    fn reference(&self, expr: &Expression) -> Result<RefHandle, RuntimeError> {
        match expr.run(&self.env())?.thaw() {
            Variable::Reference(Some(handle)) => Ok(handle),
            _ => Err(RuntimeError::MissingReference(expr.to_string())),
        }
    }

    fn ensure_declared(&mut self, name: &str, ty: TypeSpec) -> Result<(), RuntimeError> {
        if !self.symbols.contains(name) {
            self.symbols.declare(name, ty, None)?;
        }
        Ok(())
    }

    fn register(&mut self, id: NodeId, name: &str, ty: TypeSpec, role: WidgetRole) {
        self.state.widgets.insert(
            id,
            WidgetState {
                name: name.to_string(),
                ty,
                role,
                enabled: true,
                satisfied: None,
            },
        );
    }

    fn next_position(&mut self) -> LayoutCursor {
        let at = self.layout;
        self.layout.advance();
        at
    }
}

/// Hands back every handle in `before` that the table no longer holds.
pub(crate) fn release(
    symbols: &SymbolTable,
    provider: &mut dyn SelectionProvider,
    before: IndexSet<RefHandle>,
) {
    if before.is_empty() {
        return;
    }
    let after = symbols.handles();
    for handle in before.difference(&after) {
        trace!(%handle, "disposing reference");
        provider.dispose(*handle);
    }
}

fn has_default(declaration: &Declaration) -> bool {
    declaration.default.is_some()
        || matches!(&declaration.ty, TypeSpec::Struct(members) if members.iter().any(has_default))
}

/// Kinds a selection accepts, for error messages.
pub(crate) fn kind_list(kinds: &[RefKind]) -> String {
    kinds
        .iter()
        .map(|k| k.name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Value stored for a selection of `handles`.
pub(crate) fn selection_value(mode: SelectMode, handles: &[RefHandle]) -> Variable {
    if mode.is_multiple() {
        Variable::Array(handles.iter().map(|h| Variable::Reference(Some(*h))).collect())
    } else {
        Variable::Reference(handles.first().copied())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{NullBinder, NullProvider, RecordingBinder};

    fn run(source: &str) -> (SymbolTable, Vec<CommandFailure>, RecordingBinder) {
        let program = parser::parse_program(source).unwrap();
        let mut symbols = SymbolTable::seeded();
        let mut binder = RecordingBinder::new();
        let mut provider = NullProvider;
        let mut state = EngineState::default();
        let config = SessionConfig::default();
        let mut interpreter = Interpreter::new(
            &mut symbols,
            &mut binder,
            &mut provider,
            &mut state,
            &config,
            Pass::Confirm,
        );
        interpreter.run_block(&program.asm, true).unwrap();
        let failures = interpreter.into_failures();
        (symbols, failures, binder)
    }

    fn value(symbols: &SymbolTable, name: &str) -> String {
        symbols.get(name).map(|v| v.to_string()).unwrap_or_default()
    }

    #[test]
    fn declarations_and_assignments() {
        let (symbols, failures, _) = run(concat!(
            "DECLARE_VARIABLE INTEGER count 2\n",
            "DECLARE_VARIABLE DOUBLE width count * 1.5\n",
            "DECLARE_VARIABLE STRING label bolt-m8\n",
            "count = count + 1\n",
            "label = label + \"_x\"\n",
        ));
        assert!(failures.is_empty(), "{failures:?}");
        assert_eq!(value(&symbols, "count"), "3");
        assert_eq!(value(&symbols, "width"), "3");
        assert_eq!(value(&symbols, "label"), "bolt-m8_x");
    }

    #[test]
    fn redeclaration_keeps_the_first_value() {
        let (symbols, _, _) = run(concat!(
            "DECLARE_VARIABLE INTEGER X 1\n",
            "DECLARE_VARIABLE INTEGER X 2\n",
        ));
        assert_eq!(symbols.get("X"), Some(&Variable::Integer(1)));

        let (symbols, _, _) = run(concat!(
            "DECLARE_VARIABLE INTEGER X 1\n",
            "INVALIDATE_PARAM X\n",
            "DECLARE_VARIABLE INTEGER X 2\n",
        ));
        assert_eq!(symbols.get("X"), Some(&Variable::Integer(2)));
    }

    #[test]
    fn failing_commands_are_skipped() {
        let (symbols, failures, _) = run(concat!(
            "DECLARE_VARIABLE INTEGER n 4\n",
            "n = n / 0\n",
            "missing = 3\n",
            "n = n + 1\n",
        ));
        assert_eq!(value(&symbols, "n"), "5");
        let errors: Vec<_> = failures
            .iter()
            .map(|f| (f.span.line, f.error.to_string()))
            .collect();
        assert_eq!(
            errors,
            vec![
                (2, "division by zero".to_string()),
                (3, "variable 'missing' is not declared".to_string()),
            ]
        );
    }

    #[test]
    fn element_assignments() {
        let (symbols, failures, _) = run(concat!(
            "DECLARE_VARIABLE ARRAY sizes INTEGER\n",
            "DECLARE_VARIABLE MAP names STRING\n",
            "DECLARE_VARIABLE STRUCT pos (DOUBLE x, DOUBLE y)\n",
            "sizes[2] = 7\n",
            "names:\"m8\" = bolt\n",
            "pos.y = 2.5\n",
        ));
        assert!(failures.is_empty(), "{failures:?}");
        assert_eq!(value(&symbols, "sizes"), "[0, 0, 7]");
        assert_eq!(value(&symbols, "names"), "{m8: bolt}");
        assert_eq!(value(&symbols, "pos"), "{x: 0, y: 2.5}");
    }

    #[test]
    fn runaway_index_fails_the_command() {
        let (symbols, failures, _) = run(concat!(
            "DECLARE_VARIABLE ARRAY a INTEGER\n",
            "a[9223372036854775807] = 1\n",
            "a[0] = 5\n",
        ));
        assert_eq!(value(&symbols, "a"), "[5]");
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].span.line, 2);
        assert!(matches!(
            failures[0].error,
            RuntimeError::IndexOutOfBounds { len: 0, .. }
        ));
    }

    #[test]
    fn only_the_live_branch_runs() {
        let (symbols, failures, _) = run(concat!(
            "DECLARE_VARIABLE INTEGER mode 2\n",
            "DECLARE_VARIABLE STRING picked\n",
            "IF mode == 1\n",
            "  picked = one\n",
            "ELSE_IF mode == 2\n",
            "  picked = two\n",
            "ELSE\n",
            "  picked = other\n",
            "END_IF\n",
        ));
        assert!(failures.is_empty(), "{failures:?}");
        assert_eq!(value(&symbols, "picked"), "two");
    }

    #[test]
    fn catch_error_stops_at_the_first_failure() {
        let (symbols, failures, _) = run(concat!(
            "DECLARE_VARIABLE INTEGER n 1\n",
            "BEGIN_CATCH_ERROR failed\n",
            "  n = 2\n",
            "  n = n / 0\n",
            "  n = 3\n",
            "END_CATCH_ERROR\n",
            "BEGIN_CATCH_ERROR clean\n",
            "  n = n + 10\n",
            "END_CATCH_ERROR\n",
        ));
        assert!(failures.is_empty(), "{failures:?}");
        assert_eq!(value(&symbols, "n"), "12");
        assert_eq!(symbols.get("failed"), Some(&Variable::Bool(true)));
        assert_eq!(symbols.get("clean"), Some(&Variable::Bool(false)));
    }

    #[test]
    fn print_goes_to_the_binder() {
        let (_, _, binder) = run(concat!(
            "DECLARE_VARIABLE DOUBLE d 2.5\n",
            "PRINT \"d=\" + d\n",
        ));
        assert_eq!(binder.messages(), vec!["d=2.5"]);
    }

    #[test]
    fn measurements_need_a_provider() {
        let (symbols, failures, _) = run(concat!(
            "DECLARE_VARIABLE AXIS a\n",
            "MEASURE_LENGTH a len\n",
        ));
        assert!(!symbols.contains("len"));
        assert_eq!(
            failures.iter().map(|f| f.error.clone()).collect::<Vec<_>>(),
            vec![RuntimeError::MissingReference("a".into())]
        );
    }

    #[test]
    fn build_pass_creates_widgets_in_every_branch() {
        let program = parser::parse_program(concat!(
            "BEGIN_GUI_DESCR\n",
            "DECLARE_VARIABLE BOOL big FALSE\n",
            "IF big\n",
            "  USER_INPUT_PARAM DOUBLE size\n",
            "ELSE\n",
            "  CHECKBOX_PARAM INTEGER small\n",
            "END_IF\n",
            "END_GUI_DESCR\n",
        ))
        .unwrap();
        let mut symbols = SymbolTable::new();
        let mut binder = NullBinder;
        let mut provider = NullProvider;
        let mut state = EngineState::default();
        let config = SessionConfig::default();
        let gui = program.gui.unwrap();
        let mut interpreter = Interpreter::new(
            &mut symbols,
            &mut binder,
            &mut provider,
            &mut state,
            &config,
            Pass::Build,
        );
        interpreter.run_block(&gui.commands, true).unwrap();
        assert!(interpreter.into_failures().is_empty());
        assert!(symbols.contains("size"));
        assert!(symbols.contains("small"));
        assert_eq!(state.widgets.len(), 2);
        assert_eq!(state.branches.values().copied().collect::<Vec<_>>(), vec![ActiveBranch::Else]);
    }
}
