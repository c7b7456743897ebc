use ast::{
    NodeId, OptionKind, ParamWidget, RadiobuttonParam, RefKind, ScriptOption, Table, UserSelect,
};

use crate::{BindError, FrozenPlacement, RefHandle, SelectionError, SymbolTable};

/// Grid position handed to the binder for the next widget.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LayoutCursor {
    pub row: u32,
    pub column: u32,
    /// Set by `CONFIG ORIENTATION_HORIZONTAL`: widgets advance along the row.
    pub horizontal: bool,
}

impl LayoutCursor {
    pub fn advance(&mut self) {
        if self.horizontal {
            self.column += 1;
        } else {
            self.row += 1;
        }
    }
}

/// The dialog a session drives. Widget methods are called once per widget
/// command on the first pass; the rest are called whenever state changes.
///
/// Every method has a no-op default so a binder only implements what it
/// renders.
#[allow(unused_variables)]
pub trait UiBinder {
    fn show_param(
        &mut self,
        id: NodeId,
        param: &ParamWidget,
        at: &LayoutCursor,
        symbols: &SymbolTable,
    ) -> Result<(), BindError> {
        Ok(())
    }

    fn checkbox_param(
        &mut self,
        id: NodeId,
        param: &ParamWidget,
        at: &LayoutCursor,
        symbols: &SymbolTable,
    ) -> Result<(), BindError> {
        Ok(())
    }

    fn user_input_param(
        &mut self,
        id: NodeId,
        param: &ParamWidget,
        at: &LayoutCursor,
        symbols: &SymbolTable,
    ) -> Result<(), BindError> {
        Ok(())
    }

    /// `choices` are the rendered labels, in source order.
    fn radiobutton_param(
        &mut self,
        id: NodeId,
        param: &RadiobuttonParam,
        choices: &[String],
        at: &LayoutCursor,
        symbols: &SymbolTable,
    ) -> Result<(), BindError> {
        Ok(())
    }

    fn user_select(
        &mut self,
        id: NodeId,
        select: &UserSelect,
        at: &LayoutCursor,
        symbols: &SymbolTable,
    ) -> Result<(), BindError> {
        Ok(())
    }

    fn global_picture(
        &mut self,
        id: NodeId,
        file: &str,
        at: &LayoutCursor,
    ) -> Result<(), BindError> {
        Ok(())
    }

    fn table(
        &mut self,
        id: NodeId,
        table: &Table,
        at: &LayoutCursor,
        symbols: &SymbolTable,
    ) -> Result<(), BindError> {
        Ok(())
    }

    fn set_enabled(&mut self, id: NodeId, enabled: bool) {}

    fn paint_requirement(&mut self, id: NodeId, satisfied: bool) {}

    /// Replaces every sub-picture on screen with `placements`.
    fn place_sub_pictures(&mut self, placements: &[FrozenPlacement]) {}

    fn configure(&mut self, options: &[ScriptOption]) {}

    fn message(&mut self, text: &str) {}
}

/// Source of model references. Handles it returns belong to the session
/// until passed back through [`SelectionProvider::dispose`].
#[allow(unused_variables)]
pub trait SelectionProvider {
    fn pick(
        &mut self,
        kinds: &[RefKind],
        limit: Option<usize>,
    ) -> Result<Vec<RefHandle>, SelectionError> {
        Err(SelectionError::Unavailable)
    }

    fn dispose(&mut self, handle: RefHandle) {}

    fn measure_distance(&mut self, from: RefHandle, to: RefHandle) -> Result<f64, SelectionError> {
        Err(SelectionError::Unavailable)
    }

    fn measure_length(&mut self, target: RefHandle) -> Result<f64, SelectionError> {
        Err(SelectionError::Unavailable)
    }

    fn search(
        &mut self,
        kind: RefKind,
        pattern: &str,
        limit: Option<usize>,
    ) -> Result<Vec<RefHandle>, SelectionError> {
        Err(SelectionError::Unavailable)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NullBinder;

impl UiBinder for NullBinder {}

#[derive(Clone, Copy, Debug, Default)]
pub struct NullProvider;

impl SelectionProvider for NullProvider {}

#[derive(Clone, Debug, PartialEq)]
pub enum BinderEvent {
    Widget {
        id: NodeId,
        kind: &'static str,
        label: String,
        at: LayoutCursor,
    },
    Enabled(NodeId, bool),
    Requirement(NodeId, bool),
    SubPictures(Vec<FrozenPlacement>),
    Configured(Vec<OptionKind>),
    Message(String),
}

/// Binder that keeps every call as an event, for tests and the headless
/// driver.
#[derive(Clone, Debug, Default)]
pub struct RecordingBinder {
    pub events: Vec<BinderEvent>,
    /// Widgets to refuse with [`BindError::Rejected`].
    pub reject: Vec<NodeId>,
}

impl RecordingBinder {
    pub fn new() -> Self {
        Self::default()
    }

    fn widget(
        &mut self,
        id: NodeId,
        kind: &'static str,
        label: &str,
        at: &LayoutCursor,
    ) -> Result<(), BindError> {
        if self.reject.contains(&id) {
            return Err(BindError::Rejected(id, label.to_string()));
        }
        self.events.push(BinderEvent::Widget {
            id,
            kind,
            label: label.to_string(),
            at: *at,
        });
        Ok(())
    }

    /// Latest enabled state pushed for `id`.
    pub fn enabled(&self, id: NodeId) -> Option<bool> {
        self.events.iter().rev().find_map(|event| match event {
            BinderEvent::Enabled(target, on) if *target == id => Some(*on),
            _ => None,
        })
    }

    /// Latest requirement paint pushed for `id`.
    pub fn requirement(&self, id: NodeId) -> Option<bool> {
        self.events.iter().rev().find_map(|event| match event {
            BinderEvent::Requirement(target, ok) if *target == id => Some(*ok),
            _ => None,
        })
    }

    pub fn placements(&self) -> Option<&[FrozenPlacement]> {
        self.events.iter().rev().find_map(|event| match event {
            BinderEvent::SubPictures(placements) => Some(placements.as_slice()),
            _ => None,
        })
    }

    pub fn messages(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                BinderEvent::Message(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn widgets(&self) -> Vec<(&'static str, &str)> {
        self.events
            .iter()
            .filter_map(|event| match event {
                BinderEvent::Widget { kind, label, .. } => Some((*kind, label.as_str())),
                _ => None,
            })
            .collect()
    }
}

impl UiBinder for RecordingBinder {
    fn show_param(
        &mut self,
        id: NodeId,
        param: &ParamWidget,
        at: &LayoutCursor,
        _: &SymbolTable,
    ) -> Result<(), BindError> {
        self.widget(id, "SHOW_PARAM", &param.name.1, at)
    }

    fn checkbox_param(
        &mut self,
        id: NodeId,
        param: &ParamWidget,
        at: &LayoutCursor,
        _: &SymbolTable,
    ) -> Result<(), BindError> {
        self.widget(id, "CHECKBOX_PARAM", &param.name.1, at)
    }

    fn user_input_param(
        &mut self,
        id: NodeId,
        param: &ParamWidget,
        at: &LayoutCursor,
        _: &SymbolTable,
    ) -> Result<(), BindError> {
        self.widget(id, "USER_INPUT_PARAM", &param.name.1, at)
    }

    fn radiobutton_param(
        &mut self,
        id: NodeId,
        param: &RadiobuttonParam,
        choices: &[String],
        at: &LayoutCursor,
        _: &SymbolTable,
    ) -> Result<(), BindError> {
        let label = format!("{} [{}]", param.name.1, choices.join("|"));
        self.widget(id, "RADIOBUTTON_PARAM", &label, at)
    }

    fn user_select(
        &mut self,
        id: NodeId,
        select: &UserSelect,
        at: &LayoutCursor,
        _: &SymbolTable,
    ) -> Result<(), BindError> {
        self.widget(id, "USER_SELECT", &select.name.1, at)
    }

    fn global_picture(
        &mut self,
        id: NodeId,
        file: &str,
        at: &LayoutCursor,
    ) -> Result<(), BindError> {
        self.widget(id, "GLOBAL_PICTURE", file, at)
    }

    fn table(
        &mut self,
        id: NodeId,
        table: &Table,
        at: &LayoutCursor,
        _: &SymbolTable,
    ) -> Result<(), BindError> {
        self.widget(id, "TABLE", &table.name.1, at)
    }

    fn set_enabled(&mut self, id: NodeId, enabled: bool) {
        self.events.push(BinderEvent::Enabled(id, enabled));
    }

    fn paint_requirement(&mut self, id: NodeId, satisfied: bool) {
        self.events.push(BinderEvent::Requirement(id, satisfied));
    }

    fn place_sub_pictures(&mut self, placements: &[FrozenPlacement]) {
        self.events.push(BinderEvent::SubPictures(placements.to_vec()));
    }

    fn configure(&mut self, options: &[ScriptOption]) {
        self.events
            .push(BinderEvent::Configured(options.iter().map(|o| o.kind).collect()));
    }

    fn message(&mut self, text: &str) {
        self.events.push(BinderEvent::Message(text.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn cursor_follows_orientation() {
        let mut cursor = LayoutCursor::default();
        cursor.advance();
        assert_eq!((cursor.row, cursor.column), (1, 0));
        cursor.horizontal = true;
        cursor.advance();
        cursor.advance();
        assert_eq!((cursor.row, cursor.column), (1, 2));
    }

    #[test]
    fn null_provider_has_nothing_to_offer() {
        let mut provider = NullProvider;
        assert_eq!(
            provider.pick(&[RefKind::Axis], None),
            Err(SelectionError::Unavailable)
        );
        assert_eq!(
            provider.search(RefKind::Part, "*", Some(1)),
            Err(SelectionError::Unavailable)
        );
    }

    #[test]
    fn recording_binder_keeps_the_latest_state() {
        let mut binder = RecordingBinder::new();
        binder.set_enabled(NodeId(3), false);
        binder.paint_requirement(NodeId(3), false);
        binder.set_enabled(NodeId(3), true);
        binder.message("hello");
        assert_eq!(binder.enabled(NodeId(3)), Some(true));
        assert_eq!(binder.requirement(NodeId(3)), Some(false));
        assert_eq!(binder.enabled(NodeId(4)), None);
        assert_eq!(binder.messages(), vec!["hello"]);
        assert_eq!(binder.placements(), None);
    }
}
