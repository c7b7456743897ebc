//! Runtime for parsed asmgui scripts.
//!
//! A [`Session`] owns the symbol table, the dialog it drives through a
//! [`UiBinder`] and the [`SelectionProvider`] handing out model references.
//! The first pass over the `GUI` and `TAB` sections creates the widgets;
//! every later input re-walks the same AST to pick the live `IF` branches,
//! refreeze sub-picture placements and recompute which required fields are
//! still missing. The `ASM` section runs on [`Session::confirm`].

mod binder;
mod builtins;
mod config;
mod dispatch;
mod error;
mod eval;
mod exec;
mod reactive;
mod session;
mod symbols;
mod value;

pub use binder::*;
pub use config::*;
pub use dispatch::*;
pub use error::*;
pub use eval::{render, Env, Interpretable};
pub use reactive::{ActiveBranch, EngineState, FrozenPlacement, WidgetRole, WidgetState};
pub use session::Session;
pub use symbols::*;
pub use value::*;
