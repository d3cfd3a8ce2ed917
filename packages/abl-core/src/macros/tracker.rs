//! Builds the macro event graph from preprocessor callbacks.

use std::collections::HashMap;

use super::event::{
    IncludeRef, MacroDef, MacroDefKind, MacroEvent, MacroEventId, MacroEventKind, MacroGraph,
    NamedMacroRef,
};

/// Callbacks a preprocessor issues while expanding one compilation unit.
///
/// None of these report failures: unresolvable names are recorded as such
/// and building continues.
pub trait PreprocessorEvents {
    /// `&GLOBAL-DEFINE` or `&SCOPED-DEFINE`.
    fn define(&mut self, line: i32, column: i32, name: &str, value: &str, kind: MacroDefKind);

    /// `&UNDEFINE`.
    fn undefine(&mut self, line: i32, column: i32, name: &str);

    /// Start of an included file.
    fn include(&mut self, line: i32, column: i32, file_index: i32, file_ref_name: &str);

    /// Argument passed to the include reference opened last.
    fn include_argument(&mut self, name: &str, value: &str, undefined: bool);

    /// End of the included file opened last.
    fn include_end(&mut self, end_line: i32, end_column: i32);

    /// Start of a `{&name}` expansion.
    fn macro_ref(&mut self, line: i32, column: i32, name: &str);

    /// End of the expansion opened last.
    fn macro_ref_end(&mut self, end_line: i32, end_column: i32);

    fn prepro_if(&mut self, _line: i32, _column: i32, _value: bool) {}

    fn prepro_else_if(&mut self, _line: i32, _column: i32) {}

    fn prepro_else(&mut self, _line: i32, _column: i32) {}

    fn prepro_end_if(&mut self, _line: i32, _column: i32) {}

    /// `&ANALYZE-SUSPEND` with the rest of the directive text.
    fn analyze_suspend(&mut self, _text: &str, _line: i32) {}

    /// `&ANALYZE-RESUME`.
    fn analyze_resume(&mut self, _line: i32) {}
}

/// Line range of the main file that a visual designer leaves editable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditableCodeSection {
    pub file_index: i32,
    pub start_line: i32,
    pub end_line: i32,
}

/// Scoped defines visible while one include reference is open.
#[derive(Debug)]
struct Scope {
    include: MacroEventId,
    defs: HashMap<String, MacroEventId>,
}

/// Preprocessor listener that records every event into a [`MacroGraph`].
///
/// Scoped defines are visible in the file that declares them and in the
/// files it includes; global defines are visible everywhere and are looked
/// up ignoring case.
#[derive(Debug)]
pub struct MacroTracker {
    graph: MacroGraph,
    /// Innermost scope last
    scopes: Vec<Scope>,
    /// Lowercase name -> definition
    globals: HashMap<String, MacroEventId>,
    current_ref: MacroEventId,
    app_builder_code: bool,
    sections: Vec<EditableCodeSection>,
    open_section: Option<EditableCodeSection>,
}

impl Default for MacroTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl MacroTracker {
    pub fn new() -> Self {
        let graph = MacroGraph::new();
        let root = graph.root();
        Self {
            graph,
            scopes: vec![Scope {
                include: root,
                defs: HashMap::new(),
            }],
            globals: HashMap::new(),
            current_ref: root,
            app_builder_code: false,
            sections: Vec::new(),
            open_section: None,
        }
    }

    pub fn graph(&self) -> &MacroGraph {
        &self.graph
    }

    /// Finishes tracking and returns the graph.
    pub fn into_graph(self) -> MacroGraph {
        self.graph
    }

    /// Whether any `&ANALYZE-SUSPEND` directive was seen.
    pub fn is_app_builder_code(&self) -> bool {
        self.app_builder_code
    }

    pub fn editable_code_sections(&self) -> &[EditableCodeSection] {
        &self.sections
    }

    pub fn is_line_in_editable_section(&self, file_index: i32, line: i32) -> bool {
        self.sections
            .iter()
            .any(|s| s.file_index == file_index && s.start_line <= line && s.end_line >= line)
    }

    fn current_include(&self) -> MacroEventId {
        self.scopes
            .last()
            .map_or(self.graph.root(), |scope| scope.include)
    }

    fn current_file_index(&self) -> i32 {
        self.graph
            .as_include(self.current_include())
            .map_or(0, |inc| inc.file_index)
    }

    fn push_def(&mut self, line: i32, column: i32, def: MacroDef) -> MacroEventId {
        self.graph.push(
            MacroEvent {
                parent: Some(self.current_ref),
                line,
                column,
                kind: MacroEventKind::Def(def),
            },
            true,
        )
    }

    /// Resolves a name: innermost scope, the current include's named
    /// arguments, the enclosing scopes, then the global defines.
    fn find_macro_def(&self, name: &str) -> Option<MacroEventId> {
        let (innermost, outer) = self.scopes.split_last()?;
        if let Some(&id) = innermost.defs.get(name) {
            return Some(id);
        }
        if let Some(id) = self
            .graph
            .as_include(innermost.include)
            .and_then(|inc| inc.lookup_named_arg(name))
        {
            return Some(id);
        }
        if let Some(id) = outer.iter().rev().find_map(|scope| scope.defs.get(name).copied()) {
            return Some(id);
        }
        self.globals.get(&name.to_lowercase()).copied()
    }

    /// Same search order as lookup, removing what was found.
    fn remove_macro_def(&mut self, name: &str) -> Option<MacroEventId> {
        let include = self.current_include();
        let scope_count = self.scopes.len();
        if let Some(scope) = self.scopes.last_mut() {
            if let Some(id) = scope.defs.remove(name) {
                return Some(id);
            }
        }
        if let Some(id) = self
            .graph
            .as_include_mut(include)
            .and_then(|inc| inc.undefine_arg(name))
        {
            return Some(id);
        }
        for scope in self.scopes[..scope_count.saturating_sub(1)].iter_mut().rev() {
            if let Some(id) = scope.defs.remove(name) {
                return Some(id);
            }
        }
        self.globals.remove(&name.to_lowercase())
    }
}

impl PreprocessorEvents for MacroTracker {
    fn define(&mut self, line: i32, column: i32, name: &str, value: &str, kind: MacroDefKind) {
        let id = self.push_def(
            line,
            column,
            MacroDef {
                kind,
                name: name.to_string(),
                value: value.to_string(),
                undefines: None,
                include_ref: None,
                undefined: false,
            },
        );
        match kind {
            MacroDefKind::Global => {
                self.globals.insert(name.to_lowercase(), id);
            }
            MacroDefKind::Scoped => {
                if let Some(scope) = self.scopes.last_mut() {
                    scope.defs.insert(name.to_string(), id);
                }
            }
            _ => {}
        }
    }

    fn undefine(&mut self, line: i32, column: i32, name: &str) {
        let id = self.push_def(
            line,
            column,
            MacroDef {
                kind: MacroDefKind::Undefine,
                name: name.to_string(),
                value: String::new(),
                undefines: None,
                include_ref: None,
                undefined: false,
            },
        );
        let target = self.remove_macro_def(name);
        if let MacroEventKind::Def(def) = &mut self.graph.get_mut(id).kind {
            def.undefines = target;
        }
    }

    fn include(&mut self, line: i32, column: i32, file_index: i32, file_ref_name: &str) {
        let id = self.graph.push(
            MacroEvent {
                parent: Some(self.current_ref),
                line,
                column,
                kind: MacroEventKind::Include(IncludeRef::new(file_index, file_ref_name)),
            },
            true,
        );
        self.scopes.push(Scope {
            include: id,
            defs: HashMap::new(),
        });
        self.current_ref = id;
    }

    fn include_argument(&mut self, name: &str, value: &str, undefined: bool) {
        let include = self.current_include();
        let Some(num_args) = self.graph.as_include(include).map(IncludeRef::num_args) else {
            return;
        };
        let arg_num: usize = name.parse().unwrap_or(0);
        let numbered = arg_num != 0 && arg_num == num_args + 1;
        let event = self.graph.get(include);
        let (parent, line, column) = (event.parent, event.line, event.column);
        let id = self.graph.push(
            MacroEvent {
                parent,
                line,
                column,
                kind: MacroEventKind::Def(MacroDef {
                    kind: if numbered {
                        MacroDefKind::NumberedArg
                    } else {
                        MacroDefKind::NamedArg
                    },
                    name: if numbered { String::new() } else { name.to_string() },
                    value: value.to_string(),
                    undefines: None,
                    include_ref: Some(include),
                    undefined,
                }),
            },
            false,
        );
        if let Some(inc) = self.graph.as_include_mut(include) {
            if numbered {
                inc.add_numbered_arg(id);
            } else {
                inc.uses_named_args = true;
                inc.add_named_arg(name, id);
            }
        }
    }

    fn include_end(&mut self, end_line: i32, end_column: i32) {
        // The root scope stays open
        if self.scopes.len() <= 1 {
            tracing::debug!("Ignoring include end without an open include");
            return;
        }
        self.scopes.pop();
        let closing = self.current_ref;
        if let Some(inc) = self.graph.as_include_mut(closing) {
            inc.end_line = end_line;
            inc.end_column = end_column;
        }
        self.current_ref = self.graph.parent(closing).unwrap_or(self.graph.root());
    }

    fn macro_ref(&mut self, line: i32, column: i32, name: &str) {
        let definition = self.find_macro_def(name);
        let id = self.graph.push(
            MacroEvent {
                parent: Some(self.current_ref),
                line,
                column,
                kind: MacroEventKind::Named(NamedMacroRef::new(definition)),
            },
            true,
        );
        self.current_ref = id;
    }

    fn macro_ref_end(&mut self, end_line: i32, end_column: i32) {
        let closing = self.current_ref;
        if let MacroEventKind::Named(named) = &mut self.graph.get_mut(closing).kind {
            named.end_line = end_line;
            named.end_column = end_column;
            self.current_ref = self.graph.parent(closing).unwrap_or(self.graph.root());
        } else {
            tracing::debug!("Ignoring macro reference end without an open reference");
        }
    }

    fn analyze_suspend(&mut self, text: &str, line: i32) {
        self.app_builder_code = true;
        if self.current_file_index() == 0 && is_editable_section(text) {
            self.open_section = Some(EditableCodeSection {
                file_index: 0,
                start_line: line,
                end_line: line,
            });
        }
    }

    fn analyze_resume(&mut self, line: i32) {
        if let Some(mut section) = self.open_section.take() {
            if section.file_index == self.current_file_index() {
                section.end_line = line;
                self.sections.push(section);
            }
        }
    }
}

/// Code blocks generated by a visual designer are editable; every other
/// suspended section is designer-owned.
fn is_editable_section(text: &str) -> bool {
    text.trim_start()
        .get(..15)
        .is_some_and(|head| head.eq_ignore_ascii_case("_UIB-CODE-BLOCK"))
}
