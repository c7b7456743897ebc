use ast::{Command, CommandKind, NodeId, Program, ScalarType, Section, Table, TypeSpec};
use indexmap::IndexMap;
use tracing::{debug, instrument};

use crate::{
    exec::{kind_list, release, selection_value, Interpreter, Pass},
    render, ActiveBranch, CommandFailure, Dispatcher, EngineState, Env, FrozenPlacement,
    Interpretable, RefHandle, RuntimeError, SelectionError, SelectionProvider, SessionConfig,
    SessionError, SymbolTable, Trigger, TriggerHandle, UiBinder, Variable, WidgetRole,
    WidgetState,
};

/// One running script: the parsed program together with the symbol table,
/// the dialog it drives and the provider of model references.
///
/// Every entry point runs to completion before returning. Triggers posted
/// through a [`TriggerHandle`] while a pass is running are dropped, so a
/// binder may post from inside its callbacks without re-entering the engine.
/// Reference handles still held when the session is dropped are handed back
/// to the provider.
pub struct Session<B: UiBinder, P: SelectionProvider> {
    program: Program,
    symbols: SymbolTable,
    binder: B,
    provider: P,
    config: SessionConfig,
    state: EngineState,
    dispatcher: Dispatcher,
    failures: Vec<CommandFailure>,
}

/// The dialog sections, `GUI` before `TAB`.
fn dialog(program: &Program) -> Vec<&[Command]> {
    [Section::Gui, Section::Tab]
        .into_iter()
        .filter_map(|section| program.section(section))
        .collect()
}

fn find_table<'p>(commands: &'p [Command], name: &str) -> Option<&'p Table> {
    commands.iter().find_map(|command| match &command.kind {
        CommandKind::Table(table) if table.name.1 == name => Some(table),
        CommandKind::If(chain) => chain
            .branches
            .iter()
            .map(|b| b.body.as_slice())
            .chain(chain.else_body.as_deref())
            .find_map(|body| find_table(body, name)),
        CommandKind::CatchError(catch) => find_table(&catch.body, name),
        _ => None,
    })
}

impl<B: UiBinder, P: SelectionProvider> Session<B, P> {
    /// Runs the first pass over the dialog: declarations, widget creation,
    /// then gating and validity.
    #[instrument(skip_all)]
    pub fn start(program: Program, binder: B, provider: P, config: SessionConfig) -> Self {
        let symbols = if config.seed_constants {
            SymbolTable::seeded()
        } else {
            SymbolTable::new()
        };
        let mut session = Self {
            program,
            symbols,
            binder,
            provider,
            config,
            state: EngineState::default(),
            dispatcher: Dispatcher::new(),
            failures: Vec::new(),
        };
        session.pass(Pass::Build, |interpreter, program| {
            let sections = dialog(program);
            for commands in &sections {
                interpreter.run_section(commands);
            }
            interpreter.publish_placements();
            interpreter.regate(&sections);
            interpreter.validate();
        });
        debug!(
            widgets = session.state.widgets.len(),
            valid = session.state.valid,
            "session started"
        );
        session
    }

    fn pass<R>(&mut self, pass: Pass, f: impl FnOnce(&mut Interpreter, &Program) -> R) -> R {
        let mut interpreter = Interpreter::new(
            &mut self.symbols,
            &mut self.binder,
            &mut self.provider,
            &mut self.state,
            &self.config,
            pass,
        );
        let result = f(&mut interpreter, &self.program);
        for failure in interpreter.into_failures() {
            // A refresh re-walks the same commands; report each failure once.
            if pass == Pass::Rebuild && self.failures.contains(&failure) {
                continue;
            }
            self.failures.push(failure);
        }
        result
    }

    fn run_trigger(&mut self, trigger: Trigger) {
        debug!(?trigger, "pass started");
        self.pass(Pass::Rebuild, |interpreter, program| {
            let sections = dialog(program);
            if trigger == Trigger::Refresh {
                interpreter.state.placements.clear();
                for commands in &sections {
                    interpreter.run_section(commands);
                }
                interpreter.publish_placements();
            }
            interpreter.regate(&sections);
            interpreter.validate();
        });
    }

    /// Runs every queued trigger. Returns how many passes ran.
    pub fn process_pending(&mut self) -> usize {
        let dispatcher = self.dispatcher.clone();
        dispatcher.drain(|trigger| self.run_trigger(trigger))
    }

    pub fn trigger_handle(&self) -> TriggerHandle {
        self.dispatcher.handle()
    }

    /// Full recompute: frozen placements, gating and validity.
    #[instrument(skip(self))]
    pub fn refresh(&mut self) {
        self.dispatcher.post(Trigger::Refresh);
        self.process_pending();
    }

    /// Gating and validity only; frozen placements keep their values.
    #[instrument(skip(self))]
    pub fn regate(&mut self) {
        self.dispatcher.post(Trigger::Regate);
        self.process_pending();
    }

    /// Stores `value` in `name` without recomputing anything.
    ///
    /// A widget variable that was invalidated is declared again with the
    /// widget's type.
    #[instrument(skip(self))]
    pub fn set_value(&mut self, name: &str, value: Variable) -> Result<(), SessionError> {
        let input_error = |error| SessionError::Input {
            name: name.to_string(),
            error,
        };
        if self.symbols.contains(name) {
            let before = self.symbols.handles();
            self.symbols.assign(name, value).map_err(input_error)?;
            release(&self.symbols, &mut self.provider, before);
        } else {
            let ty = self
                .state
                .widget_named(name)
                .map(|(_, widget)| widget.ty.clone())
                .ok_or_else(|| SessionError::UnknownParameter(name.to_string()))?;
            self.symbols
                .declare(name, ty, Some(value))
                .map_err(input_error)?;
        }
        Ok(())
    }

    /// Stores `value` and runs a full recompute, as a widget edit does.
    pub fn set_input(&mut self, name: &str, value: Variable) -> Result<(), SessionError> {
        self.set_value(name, value)?;
        self.refresh();
        Ok(())
    }

    /// Like [`Session::set_input`], reading `text` by the variable's type.
    pub fn set_input_text(&mut self, name: &str, text: &str) -> Result<(), SessionError> {
        let ty = match self.symbols.slot(name) {
            Some(slot) => slot.ty.clone(),
            None => self
                .state
                .widget_named(name)
                .map(|(_, widget)| widget.ty.clone())
                .ok_or_else(|| SessionError::UnknownParameter(name.to_string()))?,
        };
        let value = Variable::from_text(text, &ty).map_err(|error| SessionError::Input {
            name: name.to_string(),
            error,
        })?;
        self.set_input(name, value)
    }

    fn selection(
        &self,
        name: &str,
    ) -> Result<(ast::SelectMode, Vec<ast::RefKind>, Option<usize>), SessionError> {
        match self.state.widget_named(name) {
            Some((
                _,
                WidgetState {
                    role: WidgetRole::Select { mode, kinds, limit },
                    ..
                },
            )) => Ok((*mode, kinds.clone(), *limit)),
            _ => Err(SessionError::UnknownSelection(name.to_string())),
        }
    }

    /// Hands `handles` to the selection `name`. The session owns them from
    /// here on: handles beyond the selection's limit, or all of them when
    /// one has the wrong kind, are disposed right away.
    #[instrument(skip(self))]
    pub fn select(&mut self, name: &str, mut handles: Vec<RefHandle>) -> Result<(), SessionError> {
        let (mode, kinds, limit) = match self.selection(name) {
            Ok(selection) => selection,
            Err(error) => {
                handles.into_iter().for_each(|h| self.provider.dispose(h));
                return Err(error);
            }
        };
        if let Some(wrong) = handles.iter().find(|h| !kinds.contains(&h.kind)).copied() {
            handles.into_iter().for_each(|h| self.provider.dispose(h));
            return Err(SelectionError::WrongKind {
                found: wrong.kind,
                allowed: kind_list(&kinds),
            }
            .into());
        }
        if let Some(limit) = limit {
            let keep = limit.min(handles.len());
            for extra in handles.split_off(keep) {
                debug!(%extra, "selection limit reached");
                self.provider.dispose(extra);
            }
        }
        self.set_value(name, selection_value(mode, &handles))?;
        self.refresh();
        Ok(())
    }

    /// Asks the provider for references and hands them to `name`.
    pub fn pick(&mut self, name: &str) -> Result<(), SessionError> {
        let (_, kinds, limit) = self.selection(name)?;
        let handles = self.provider.pick(&kinds, limit)?;
        self.select(name, handles)
    }

    pub fn clear_selection(&mut self, name: &str) -> Result<(), SessionError> {
        let (mode, _, _) = self.selection(name)?;
        self.set_value(name, selection_value(mode, &[]))?;
        self.refresh();
        Ok(())
    }

    /// Selects data row `row` of `table`: every set cell is written to its
    /// column variable and the table variable takes the first cell's text.
    /// Unset cells leave their variables alone.
    #[instrument(skip(self))]
    pub fn select_table_row(&mut self, table: &str, row: usize) -> Result<(), SessionError> {
        let definition = dialog(&self.program)
            .into_iter()
            .find_map(|commands| find_table(commands, table))
            .ok_or_else(|| SessionError::UnknownTable(table.to_string()))?;
        let cells = &definition
            .rows
            .get(row)
            .ok_or_else(|| SessionError::NoSuchRow {
                table: table.to_string(),
                row,
            })?
            .cells;

        // Everything is evaluated and converted to the slot it lands in
        // before the first write.
        let env = Env::new(&self.symbols, self.config.angle_unit);
        let symbols = &self.symbols;
        let convert = |name: &str, ty: TypeSpec, value: Result<Variable, RuntimeError>| {
            let ty = symbols.slot(name).map_or(ty, |slot| slot.ty.clone());
            value
                .and_then(|value| value.coerce_to(&ty))
                .map(|value| (ty, value))
                .map_err(|error| SessionError::Input {
                    name: name.to_string(),
                    error,
                })
        };
        let mut writes: IndexMap<String, (TypeSpec, Variable)> = IndexMap::new();
        for (column, cell) in definition.columns.iter().zip(cells) {
            let Some(cell) = cell else { continue };
            let value = match column.ty {
                ScalarType::String => render(cell, &env).map(Variable::String),
                _ => cell.run(&env),
            };
            let value = value.and_then(|value| value.coerce_to(&TypeSpec::Scalar(column.ty)));
            let write = convert(&column.name, TypeSpec::Scalar(column.ty), value)?;
            writes.insert(column.name.clone(), write);
        }
        if let Some(Some(key)) = cells.first() {
            let key = render(key, &env).map(Variable::String);
            let write = convert(table, TypeSpec::Scalar(ScalarType::String), key)?;
            writes.insert(table.to_string(), write);
        }

        for (name, (ty, value)) in writes {
            let written = if self.symbols.contains(&name) {
                self.symbols.assign(&name, value)
            } else {
                self.symbols.declare(&name, ty, Some(value)).map(|_| ())
            };
            written.map_err(|error: RuntimeError| SessionError::Input { name, error })?;
        }
        self.state.selected_rows.insert(table.to_string(), row);
        self.refresh();
        Ok(())
    }

    /// Whether every enabled required widget is satisfied.
    pub fn may_proceed(&self) -> bool {
        self.state.valid
    }

    /// Runs the `ASM` section, provided the dialog is complete.
    #[instrument(skip(self))]
    pub fn confirm(&mut self) -> Result<(), SessionError> {
        self.process_pending();
        if !self.state.valid {
            return Err(SessionError::Incomplete(self.state.unsatisfied()));
        }
        self.pass(Pass::Confirm, |interpreter, program| {
            interpreter.run_section(&program.asm);
            interpreter.validate();
        });
        debug!(failures = self.failures.len(), "script confirmed");
        Ok(())
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn value(&self, name: &str) -> Option<&Variable> {
        self.symbols.get(name)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn binder(&self) -> &B {
        &self.binder
    }

    pub fn binder_mut(&mut self) -> &mut B {
        &mut self.binder
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    pub fn active_branch(&self, id: NodeId) -> ActiveBranch {
        self.state.branches.get(&id).copied().unwrap_or_default()
    }

    pub fn branches(&self) -> &IndexMap<NodeId, ActiveBranch> {
        &self.state.branches
    }

    pub fn placements(&self) -> &[FrozenPlacement] {
        &self.state.placements
    }

    pub fn widgets(&self) -> &IndexMap<NodeId, WidgetState> {
        &self.state.widgets
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Commands that failed in any pass so far.
    pub fn failures(&self) -> &[CommandFailure] {
        &self.failures
    }

    pub fn take_failures(&mut self) -> Vec<CommandFailure> {
        std::mem::take(&mut self.failures)
    }
}

impl<B: UiBinder, P: SelectionProvider> Drop for Session<B, P> {
    fn drop(&mut self) {
        let handles = self.symbols.handles();
        debug!(handles = handles.len(), "releasing session references");
        for handle in handles {
            self.provider.dispose(handle);
        }
    }
}
