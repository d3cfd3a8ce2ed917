//! Macro and include event graph.
//!
//! Events live in an arena addressed by [`MacroEventId`]. Reference nodes
//! (include references and named macro references) own ordered child lists;
//! every event keeps a back-link to its parent so that both directions are
//! O(1).

use std::collections::HashMap;

/// Index of an event in a [`MacroGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacroEventId(pub usize);

/// File index, line and column of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MacroPosition {
    pub file_index: i32,
    pub line: i32,
    pub column: i32,
}

/// Kind of a macro definition event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacroDefKind {
    Global,
    Scoped,
    NamedArg,
    NumberedArg,
    Undefine,
}

/// Inclusion of a file, with its arguments.
#[derive(Debug, Clone, Default)]
pub struct IncludeRef {
    pub file_index: i32,
    /// Include reference as written in the source, ex: `inc/common.i`
    pub file_ref_name: String,
    pub end_line: i32,
    pub end_column: i32,
    /// Every argument in arrival order; positional ones are numbered by position
    args: Vec<MacroEventId>,
    /// Named (or out-of-sequence) arguments keyed by lowercase name
    arg_map: HashMap<String, MacroEventId>,
    pub uses_named_args: bool,
    children: Vec<MacroEventId>,
}

impl IncludeRef {
    pub(crate) fn new(file_index: i32, file_ref_name: &str) -> Self {
        Self {
            file_index,
            file_ref_name: file_ref_name.to_string(),
            ..Default::default()
        }
    }

    /// Number of arguments received, named ones included.
    pub fn num_args(&self) -> usize {
        self.args.len()
    }

    /// Returns argument `num` (1-based) in arrival order.
    pub fn arg_number(&self, num: usize) -> Option<MacroEventId> {
        if num == 0 {
            return None;
        }
        self.args.get(num - 1).copied()
    }

    /// Looks up a named argument; only include references that use named
    /// arguments answer.
    pub fn lookup_named_arg(&self, name: &str) -> Option<MacroEventId> {
        if !self.uses_named_args {
            return None;
        }
        self.arg_map.get(&name.to_lowercase()).copied()
    }

    pub fn args(&self) -> &[MacroEventId] {
        &self.args
    }

    pub(crate) fn add_named_arg(&mut self, name: &str, id: MacroEventId) {
        self.args.push(id);
        self.arg_map.insert(name.to_lowercase(), id);
    }

    pub(crate) fn add_numbered_arg(&mut self, id: MacroEventId) {
        self.args.push(id);
    }

    /// Removes a named argument so that later lookups no longer find it.
    pub(crate) fn undefine_arg(&mut self, name: &str) -> Option<MacroEventId> {
        self.arg_map.remove(&name.to_lowercase())
    }
}

/// Expansion of a `{&name}` reference.
#[derive(Debug, Clone, Default)]
pub struct NamedMacroRef {
    /// Definition the reference expanded, `None` when unresolved
    pub definition: Option<MacroEventId>,
    pub end_line: i32,
    pub end_column: i32,
    children: Vec<MacroEventId>,
}

impl NamedMacroRef {
    pub(crate) fn new(definition: Option<MacroEventId>) -> Self {
        Self {
            definition,
            ..Default::default()
        }
    }
}

/// Definition, argument or undefine.
#[derive(Debug, Clone)]
pub struct MacroDef {
    pub kind: MacroDefKind,
    pub name: String,
    pub value: String,
    /// For an undefine, the definition it removed
    pub undefines: Option<MacroEventId>,
    /// For an include argument, the include reference it belongs to
    pub include_ref: Option<MacroEventId>,
    /// For an include argument, whether it was passed without a value
    pub undefined: bool,
}

#[derive(Debug, Clone)]
pub enum MacroEventKind {
    Include(IncludeRef),
    Named(NamedMacroRef),
    Def(MacroDef),
}

/// One node of the graph.
#[derive(Debug, Clone)]
pub struct MacroEvent {
    pub parent: Option<MacroEventId>,
    pub line: i32,
    pub column: i32,
    pub kind: MacroEventKind,
}

impl MacroEvent {
    /// Whether the event is an include or named macro reference.
    pub fn is_ref(&self) -> bool {
        !matches!(self.kind, MacroEventKind::Def(_))
    }
}

/// Arena holding every macro event of one compilation unit.
///
/// Event 0 is the root include reference standing for the main file.
#[derive(Debug, Clone)]
pub struct MacroGraph {
    events: Vec<MacroEvent>,
}

impl Default for MacroGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl MacroGraph {
    /// Creates a graph holding only the root include reference (file index 0).
    pub fn new() -> Self {
        Self {
            events: vec![MacroEvent {
                parent: None,
                line: 0,
                column: 0,
                kind: MacroEventKind::Include(IncludeRef::default()),
            }],
        }
    }

    pub fn root(&self) -> MacroEventId {
        MacroEventId(0)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, id: MacroEventId) -> &MacroEvent {
        &self.events[id.0]
    }

    pub(crate) fn get_mut(&mut self, id: MacroEventId) -> &mut MacroEvent {
        &mut self.events[id.0]
    }

    pub fn parent(&self, id: MacroEventId) -> Option<MacroEventId> {
        self.get(id).parent
    }

    pub fn as_include(&self, id: MacroEventId) -> Option<&IncludeRef> {
        match &self.get(id).kind {
            MacroEventKind::Include(inc) => Some(inc),
            _ => None,
        }
    }

    pub fn as_named_ref(&self, id: MacroEventId) -> Option<&NamedMacroRef> {
        match &self.get(id).kind {
            MacroEventKind::Named(named) => Some(named),
            _ => None,
        }
    }

    pub fn as_def(&self, id: MacroEventId) -> Option<&MacroDef> {
        match &self.get(id).kind {
            MacroEventKind::Def(def) => Some(def),
            _ => None,
        }
    }

    pub(crate) fn as_include_mut(&mut self, id: MacroEventId) -> Option<&mut IncludeRef> {
        match &mut self.get_mut(id).kind {
            MacroEventKind::Include(inc) => Some(inc),
            _ => None,
        }
    }

    /// Child events of a reference node, empty for definitions.
    pub fn children(&self, id: MacroEventId) -> &[MacroEventId] {
        match &self.get(id).kind {
            MacroEventKind::Include(inc) => &inc.children,
            MacroEventKind::Named(named) => &named.children,
            MacroEventKind::Def(_) => &[],
        }
    }

    /// Appends an event. It is linked into its parent's child list when `attach` is set.
    pub(crate) fn push(&mut self, event: MacroEvent, attach: bool) -> MacroEventId {
        let id = MacroEventId(self.events.len());
        let parent = event.parent;
        self.events.push(event);
        if attach {
            if let Some(parent) = parent {
                match &mut self.get_mut(parent).kind {
                    MacroEventKind::Include(inc) => inc.children.push(id),
                    MacroEventKind::Named(named) => named.children.push(id),
                    MacroEventKind::Def(_) => {}
                }
            }
        }
        id
    }

    /// File index the contents of a reference node come from.
    ///
    /// A named macro reference reports the file index of its enclosing reference.
    pub fn file_index_of(&self, id: MacroEventId) -> i32 {
        let mut current = id;
        loop {
            match &self.get(current).kind {
                MacroEventKind::Include(inc) => return inc.file_index,
                _ => match self.parent(current) {
                    Some(parent) => current = parent,
                    None => return 0,
                },
            }
        }
    }

    /// Position of an event within the file of its parent.
    pub fn position(&self, id: MacroEventId) -> MacroPosition {
        let event = self.get(id);
        MacroPosition {
            file_index: event.parent.map_or(0, |p| self.file_index_of(p)),
            line: event.line,
            column: event.column,
        }
    }

    /// Include references for `file_index` found in the subtree of `from`, in pre-order.
    pub fn find_include_references(&self, from: MacroEventId, file_index: i32) -> Vec<MacroEventId> {
        let mut found = Vec::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            if let Some(inc) = self.as_include(id) {
                if inc.file_index == file_index {
                    found.push(id);
                }
            }
            for &child in self.children(id).iter().rev() {
                if self.get(child).is_ref() {
                    stack.push(child);
                }
            }
        }
        found
    }

    /// Events under `from` that depend on something defined outside its subtree.
    ///
    /// Reported are include references, named macro references whose
    /// definition lies outside the subtree (or is unresolved), and undefines
    /// that removed an include argument or a definition from outside the
    /// subtree. References defined inside the subtree are searched for
    /// external references of their own.
    ///
    /// # Arguments
    /// * `from` - Reference node whose subtree is searched
    /// * `begin` - Optional inclusive (line, column) lower bound for top-level events
    /// * `end` - Optional inclusive (line, column) upper bound for top-level events
    pub fn find_external_macro_references(
        &self,
        from: MacroEventId,
        begin: Option<(i32, i32)>,
        end: Option<(i32, i32)>,
    ) -> Vec<MacroEventId> {
        let mut found = Vec::new();
        for &child in self.children(from) {
            let event = self.get(child);
            if is_in_range(event.line, event.column, begin, end) {
                self.collect_external(from, child, &mut found);
            }
        }
        found
    }

    fn collect_external(&self, owner: MacroEventId, id: MacroEventId, found: &mut Vec<MacroEventId>) {
        match &self.get(id).kind {
            MacroEventKind::Include(_) => found.push(id),
            MacroEventKind::Def(def) => {
                if def.kind != MacroDefKind::Undefine {
                    return;
                }
                let Some(target) = def.undefines else {
                    return;
                };
                let target_def = self.as_def(target);
                if target_def.map(|d| d.kind) == Some(MacroDefKind::NamedArg) {
                    found.push(id);
                    return;
                }
                if !self.is_within(owner, self.parent(target)) {
                    found.push(id);
                }
            }
            MacroEventKind::Named(named) => {
                let defined_inside = named
                    .definition
                    .is_some_and(|def| self.is_within(owner, self.parent(def)));
                if !defined_inside {
                    found.push(id);
                    return;
                }
                for &child in &named.children {
                    self.collect_external(owner, child, found);
                }
            }
        }
    }

    /// Whether `node` is `owner` or one of its descendants.
    fn is_within(&self, owner: MacroEventId, node: Option<MacroEventId>) -> bool {
        let mut current = node;
        while let Some(id) = current {
            if id == owner {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Traces a definition back to the file, line and column where its text originates.
    ///
    /// Definitions made inside a macro expansion resolve to the expanded
    /// macro's own definition; include arguments resolve to the include
    /// reference that passed them.
    pub fn definition_position(&self, def_id: MacroEventId) -> MacroPosition {
        let mut current = def_id;
        // Bounded by the number of events: each step moves to an earlier definition
        for _ in 0..self.events.len() {
            let event = self.get(current);
            let Some(def) = self.as_def(current) else {
                break;
            };
            let anchor = match def.include_ref {
                Some(inc) => inc,
                None => current,
            };
            let anchor_event = self.get(anchor);
            let Some(parent) = anchor_event.parent else {
                break;
            };
            match &self.get(parent).kind {
                MacroEventKind::Include(inc) => {
                    return MacroPosition {
                        file_index: inc.file_index,
                        line: anchor_event.line,
                        column: anchor_event.column,
                    }
                }
                MacroEventKind::Named(named) => match named.definition {
                    Some(next) => current = next,
                    None => {
                        return MacroPosition {
                            file_index: self.file_index_of(parent),
                            line: event.line,
                            column: event.column,
                        }
                    }
                },
                MacroEventKind::Def(_) => break,
            }
        }
        self.position(current)
    }

    /// Every reference node in pre-order starting at the root.
    ///
    /// The position of a node in this list is the "source index" recorded on
    /// syntax tree nodes.
    pub fn source_array(&self) -> Vec<MacroEventId> {
        let mut refs = Vec::new();
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            refs.push(id);
            for &child in self.children(id).iter().rev() {
                if self.get(child).is_ref() {
                    stack.push(child);
                }
            }
        }
        refs
    }
}

/// Whether (`line`, `column`) lies within the optional inclusive bounds.
pub fn is_in_range(line: i32, column: i32, begin: Option<(i32, i32)>, end: Option<(i32, i32)>) -> bool {
    if let Some((bl, bc)) = begin {
        if line < bl || (line == bl && column < bc) {
            return false;
        }
    }
    if let Some((el, ec)) = end {
        if line > el || (line == el && column > ec) {
            return false;
        }
    }
    true
}
