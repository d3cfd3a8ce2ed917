//! Shared fixtures: a sample project on disk and a line-oriented unit parser.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::{tempdir, TempDir};

use abl_core::ast::{attr, node_type as nt, Ast, Node};
use abl_core::config::{CacheConfig, ProjectConfig, ProparseSettings};
use abl_core::macros::{MacroDefKind, PreprocessorEvents};
use abl_core::schema::Table;
use abl_core::symbols::{SchemaPriority, TableType};
use abl_core::types::DataType;
use abl_core::unit::{ParsedUnit, RootSymbol, Sharing, SymbolRef, UnitContext, UnitParser};
use abl_core::{ProparseError, Result, Session};

/// Schema description of a small sports database.
pub const SPORTS_DF: &str = "\
SNextCustNum
TCustomer
FCustNum:integer:0
FName:character:0
FCity:character:0
FBalance:decimal:0
ICustNum:PU:ACustNum
TCustomerGroup
FGroupId:integer:0
TOrder
FOrderNum:integer:0
FCustNum:integer:0
FOrderDate:date:0
IOrderNum:PU:AOrderNum
TOrderLine
FOrderNum:integer:0
FLineNum:integer:0
";

/// Temporary project with a `src` propath entry, a `db` schema and a `pubs` cache.
pub struct Project {
    pub dir: TempDir,
    pub session: Arc<Session>,
}

impl Project {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Project whose session also loads a JSON class catalog.
    pub fn with_catalog(catalog: &str) -> Self {
        Self::build(Some(catalog))
    }

    fn build(catalog: Option<&str>) -> Self {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::create_dir_all(dir.path().join("db")).unwrap();
        let schema_file = dir.path().join("db").join("sports.df");
        fs::write(&schema_file, SPORTS_DF).unwrap();
        let mut catalog_files = Vec::new();
        if let Some(json) = catalog {
            let path = dir.path().join("db").join("classes.json");
            fs::write(&path, json).unwrap();
            catalog_files.push(path);
        }

        let config = ProjectConfig {
            settings: ProparseSettings::with_propath(&dir.path().join("src").to_string_lossy()),
            cache: CacheConfig {
                cache_dir: dir.path().join("pubs"),
                ..Default::default()
            },
            schema_files: vec![schema_file],
            catalog_files,
        };
        let session = Arc::new(Session::from_config(&config).unwrap());
        Self { dir, session }
    }

    pub fn src(&self) -> PathBuf {
        self.dir.path().join("src")
    }

    /// Writes `contents` to `src/<name>` and returns the path.
    pub fn write_source(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.src().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

/// Minimal statement reader used to drive the tracker and the resolver.
///
/// Understands one statement per line:
/// - `{file.i}` includes a file found on the propath
/// - `&GLOBAL-DEFINE`, `&SCOPED-DEFINE`, `&UNDEFINE`
/// - `{&name}` anywhere in a line is a macro reference
/// - `USING type` or `USING package.*`
/// - `CLASS name [INHERITS parent]:`
/// - `DEFINE [NEW] [SHARED] VARIABLE name [AS type].`
/// - `DEFINE TEMP-TABLE name.`
/// - `FIND FIRST table.`
pub struct LineParser;

impl UnitParser for LineParser {
    fn parse(&self, ctx: &mut UnitContext) -> Result<ParsedUnit> {
        let path = ctx.path.clone();
        let text = read_source(ctx, &path)?;
        let mut state = ParseState {
            ast: Ast::new(Node::new(nt::PROGRAM_ROOT)),
            file_names: vec![ctx.path.to_string_lossy().into_owned()],
            root_symbols: Vec::new(),
            class_name: None,
            super_class_name: None,
        };
        state.walk(ctx, &text, 0)?;

        let ParseState {
            mut ast,
            file_names,
            root_symbols,
            class_name,
            super_class_name,
        } = state;
        ast.set_file_names(file_names);
        let mut unit = ParsedUnit::new(ast);
        unit.class_name = class_name;
        unit.super_class_name = super_class_name;
        unit.root_symbols = root_symbols;
        Ok(unit)
    }
}

struct ParseState {
    ast: Ast,
    file_names: Vec<String>,
    root_symbols: Vec<RootSymbol>,
    class_name: Option<String>,
    super_class_name: Option<String>,
}

impl ParseState {
    fn walk(&mut self, ctx: &mut UnitContext, text: &str, file_index: usize) -> Result<()> {
        for (idx, raw) in text.lines().enumerate() {
            let line = idx as i32 + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }
            if let Some(name) = include_name(trimmed) {
                self.include(ctx, name, line)?;
                continue;
            }
            report_macro_refs(ctx, raw, line);

            let words: Vec<&str> = trimmed
                .trim_end_matches(['.', ':'])
                .split_whitespace()
                .collect();
            let pos = Pos {
                file_index: file_index as i16,
                line,
            };
            match keyword(&words, 0).as_str() {
                "&GLOBAL-DEFINE" | "&SCOPED-DEFINE" if words.len() >= 2 => {
                    let kind = if keyword(&words, 0) == "&GLOBAL-DEFINE" {
                        MacroDefKind::Global
                    } else {
                        MacroDefKind::Scoped
                    };
                    ctx.tracker.define(line, 1, words[1], &words[2..].join(" "), kind);
                }
                "&UNDEFINE" if words.len() == 2 => ctx.tracker.undefine(line, 1, words[1]),
                "USING" if words.len() >= 2 => ctx.resolver.using_state(words[1]),
                "CLASS" if words.len() >= 2 => self.class(ctx, &words, pos),
                "DEFINE" => self.define(ctx, &words, pos)?,
                "FIND" => self.find(ctx, &words, pos)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn include(&mut self, ctx: &mut UnitContext, name: &str, line: i32) -> Result<()> {
        let path = ctx
            .session
            .find_file(name)
            .ok_or_else(|| parse_error(ctx, format!("include file '{}' not found", name)))?;
        let file_index = self.file_names.len();
        self.file_names.push(path.to_string_lossy().into_owned());
        ctx.tracker.include(line, 1, file_index as i32, name);
        let text = read_source(ctx, &path)?;
        self.walk(ctx, &text, file_index)?;
        ctx.tracker.include_end(line, name.len() as i32 + 3);
        Ok(())
    }

    fn class(&mut self, ctx: &mut UnitContext, words: &[&str], pos: Pos) {
        let name = words[1].to_string();
        ctx.resolver.define_class(&name);
        let root = self.ast.root();
        let class = self.ast.add_child(root, statement(nt::CLASS, pos));
        self.ast.add_child(class, Node::new(nt::TYPE_NAME).with_text(&name).at(pos.file_index, pos.line, 7));
        if keyword(words, 2) == "INHERITS" && words.len() > 3 {
            let parent = ctx.resolver.lookup_class_name(words[3]);
            let parent = if parent.is_empty() { words[3].to_string() } else { parent };
            let mut node = Node::new(nt::TYPE_NAME).with_text(words[3]).at(pos.file_index, pos.line, 20);
            node.qualified_class = Some(parent.clone());
            self.ast.add_child(class, node);
            self.super_class_name = Some(parent);
        }
        self.class_name = Some(name);
    }

    fn define(&mut self, ctx: &mut UnitContext, words: &[&str], pos: Pos) -> Result<()> {
        let mut at = 1;
        let mut sharing = Sharing::Local;
        let mut is_new = false;
        if keyword(words, at) == "NEW" {
            is_new = true;
            at += 1;
        }
        if keyword(words, at) == "SHARED" {
            sharing = if is_new { Sharing::Exported } else { Sharing::Imported };
            at += 1;
        }
        let name = words
            .get(at + 1)
            .copied()
            .ok_or_else(|| parse_error(ctx, format!("line {}: missing name", pos.line)))?;

        match keyword(words, at).as_str() {
            "VARIABLE" => {
                ctx.resolver.def_var(name);
                let root = self.ast.root();
                let mut head = statement(nt::DEFINE, pos);
                head.set_attr(attr::STATE2, nt::VARIABLE);
                let head = self.ast.add_child(root, head);
                self.ast.add_child(head, Node::new(nt::VARIABLE).at(pos.file_index, pos.line, 8));
                self.ast.add_child(head, Node::new(nt::ID).with_text(name).at(pos.file_index, pos.line, 17));
                self.ast.add_child(root, Node::new(nt::PERIOD).at(pos.file_index, pos.line, 40));

                let mut symbol = SymbolRef::new(nt::VARIABLE, name);
                if keyword(words, at + 2) == "AS" {
                    if let Some(dt) = words.get(at + 3).and_then(|w| DataType::from_progress_name(w)) {
                        symbol = symbol.with_data_type(dt);
                    }
                }
                self.root_symbols.push(match sharing {
                    Sharing::Local => RootSymbol::local(symbol),
                    shared => RootSymbol::shared(symbol, shared),
                });
            }
            "TEMP-TABLE" => {
                ctx.resolver.def_table(name, TableType::TempTable);
                let root = self.ast.root();
                let mut head = statement(nt::DEFINE, pos);
                head.set_attr(attr::STATE2, nt::TEMPTABLE);
                let head = self.ast.add_child(root, head);
                self.ast.add_child(head, Node::new(nt::TEMPTABLE).at(pos.file_index, pos.line, 8));
                self.ast.add_child(head, Node::new(nt::ID).with_text(name).at(pos.file_index, pos.line, 19));
            }
            other => {
                return Err(parse_error(
                    ctx,
                    format!("line {}: unsupported DEFINE {}", pos.line, other),
                ))
            }
        }
        Ok(())
    }

    fn find(&mut self, ctx: &mut UnitContext, words: &[&str], pos: Pos) -> Result<()> {
        let name = words
            .get(2)
            .copied()
            .ok_or_else(|| parse_error(ctx, format!("line {}: missing record", pos.line)))?;
        let table = match ctx.resolver.is_table(name, SchemaPriority::ScopeFirst) {
            Some(TableType::DbTable) => ctx
                .session
                .schema()
                .lookup_table(name)
                .cloned()
                .ok_or_else(|| parse_error(ctx, format!("table '{}' vanished", name)))?,
            Some(other) => Arc::new(Table::with_store_type(name, other.store_type())),
            None => {
                return Err(parse_error(
                    ctx,
                    format!("line {}: unknown table '{}'", pos.line, name),
                ))
            }
        };

        let root = self.ast.root();
        let head = self.ast.add_child(root, statement(nt::FIND, pos));
        self.ast.add_child(head, Node::new(nt::FIRST).at(pos.file_index, pos.line, 6));
        self.ast.add_child(head, Node::new(nt::RECORD_NAME).with_text(name).at(pos.file_index, pos.line, 12));
        self.root_symbols
            .push(RootSymbol::local(SymbolRef::new(nt::BUFFER, name)).with_schema(table, None));
        Ok(())
    }
}

#[derive(Clone, Copy)]
struct Pos {
    file_index: i16,
    line: i32,
}

fn statement(node_type: i32, pos: Pos) -> Node {
    let mut node = Node::new(node_type).at(pos.file_index, pos.line, 1);
    node.set_attr(attr::STATEHEAD, attr::TRUE);
    node
}

fn keyword(words: &[&str], at: usize) -> String {
    words.get(at).map(|w| w.to_ascii_uppercase()).unwrap_or_default()
}

fn include_name(line: &str) -> Option<&str> {
    let inner = line.strip_prefix('{')?.strip_suffix('}')?;
    (!inner.starts_with('&')).then_some(inner.trim())
}

fn report_macro_refs(ctx: &mut UnitContext, raw: &str, line: i32) {
    let mut from = 0;
    while let Some(start) = raw[from..].find("{&") {
        let start = from + start;
        let Some(len) = raw[start..].find('}') else {
            return;
        };
        let name = &raw[start + 2..start + len];
        ctx.tracker.macro_ref(line, start as i32 + 1, name);
        ctx.tracker.macro_ref_end(line, (start + len) as i32 + 1);
        from = start + len + 1;
    }
}

fn read_source(ctx: &UnitContext, path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| parse_error(ctx, format!("{}: {}", path.display(), e)))
}

fn parse_error(ctx: &UnitContext, message: String) -> ProparseError {
    ProparseError::Parse {
        unit: ctx.path.display().to_string(),
        message,
    }
}
