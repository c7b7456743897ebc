use ast::{NodeId, ParamWidget, RadiobuttonParam, ScriptOption, Table, UserSelect};
use interpreter::{BindError, FrozenPlacement, LayoutCursor, SymbolTable, UiBinder};

/// Prints what a dialog would show, one line per event.
#[derive(Debug, Default)]
pub struct ConsoleBinder {
    /// Only print widget creation; state changes stay quiet.
    pub quiet: bool,
}

impl ConsoleBinder {
    fn widget(
        &self,
        id: NodeId,
        kind: &str,
        label: &str,
        at: &LayoutCursor,
    ) -> Result<(), BindError> {
        println!("{id} {kind:<18} {label} @ {},{}", at.row, at.column);
        Ok(())
    }
}

fn value_of(symbols: &SymbolTable, name: &str) -> String {
    symbols
        .get(name)
        .map_or_else(|| "<unset>".to_string(), |v| v.to_string())
}

impl UiBinder for ConsoleBinder {
    fn show_param(
        &mut self,
        id: NodeId,
        param: &ParamWidget,
        at: &LayoutCursor,
        symbols: &SymbolTable,
    ) -> Result<(), BindError> {
        let label = format!("{} = {}", param.name.1, value_of(symbols, &param.name.1));
        self.widget(id, "show", &label, at)
    }

    fn checkbox_param(
        &mut self,
        id: NodeId,
        param: &ParamWidget,
        at: &LayoutCursor,
        symbols: &SymbolTable,
    ) -> Result<(), BindError> {
        let label = format!("{} = {}", param.name.1, value_of(symbols, &param.name.1));
        self.widget(id, "checkbox", &label, at)
    }

    fn user_input_param(
        &mut self,
        id: NodeId,
        param: &ParamWidget,
        at: &LayoutCursor,
        symbols: &SymbolTable,
    ) -> Result<(), BindError> {
        let label = format!(
            "{} {} = {}",
            param.ty,
            param.name.1,
            value_of(symbols, &param.name.1)
        );
        self.widget(id, "input", &label, at)
    }

    fn radiobutton_param(
        &mut self,
        id: NodeId,
        param: &RadiobuttonParam,
        choices: &[String],
        at: &LayoutCursor,
        _: &SymbolTable,
    ) -> Result<(), BindError> {
        let label = format!("{} ({})", param.name.1, choices.join(" | "));
        self.widget(id, "radio", &label, at)
    }

    fn user_select(
        &mut self,
        id: NodeId,
        select: &UserSelect,
        at: &LayoutCursor,
        _: &SymbolTable,
    ) -> Result<(), BindError> {
        let kinds: Vec<_> = select.kinds.iter().map(|k| k.name()).collect();
        let label = format!("{} [{}]", select.name.1, kinds.join(" "));
        self.widget(id, "select", &label, at)
    }

    fn global_picture(
        &mut self,
        id: NodeId,
        file: &str,
        at: &LayoutCursor,
    ) -> Result<(), BindError> {
        self.widget(id, "picture", file, at)
    }

    fn table(
        &mut self,
        id: NodeId,
        table: &Table,
        at: &LayoutCursor,
        _: &SymbolTable,
    ) -> Result<(), BindError> {
        let label = format!("{} ({} rows)", table.name.1, table.rows.len());
        self.widget(id, "table", &label, at)
    }

    fn set_enabled(&mut self, id: NodeId, enabled: bool) {
        if !self.quiet {
            println!("{id} {}", if enabled { "enabled" } else { "disabled" });
        }
    }

    fn paint_requirement(&mut self, id: NodeId, satisfied: bool) {
        if !self.quiet {
            println!("{id} {}", if satisfied { "satisfied" } else { "missing" });
        }
    }

    fn place_sub_pictures(&mut self, placements: &[FrozenPlacement]) {
        if self.quiet {
            return;
        }
        for placement in placements {
            println!(
                "{} sub-picture {} @ {},{}",
                placement.id, placement.file, placement.x, placement.y
            );
        }
    }

    fn configure(&mut self, options: &[ScriptOption]) {
        let names: Vec<_> = options.iter().map(|o| o.kind.name()).collect();
        println!("config {}", names.join(" "));
    }

    fn message(&mut self, text: &str) {
        println!("{text}");
    }
}
