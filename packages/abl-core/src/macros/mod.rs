//! Macro and include event tracking.

pub mod event;
pub mod listing;
pub mod tracker;


pub use event::{
    is_in_range, IncludeRef, MacroDef, MacroDefKind, MacroEvent, MacroEventId, MacroEventKind,
    MacroGraph, MacroPosition, NamedMacroRef,
};
pub use listing::{replay_listing, replay_listing_file};
pub use tracker::{EditableCodeSection, MacroTracker, PreprocessorEvents};
