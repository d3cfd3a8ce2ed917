//! Parse-unit binary: the on-disk cache of one unit's syntax tree and its
//! symbol and schema footprint.
//!
//! Segments, in file order:
//! 1. layout version
//! 2. file index, `(index, name)` pairs ended by index `-1`
//! 3. header: class name and super class name, empty when absent
//! 4. schema: `db.table` names each followed by field names, every list
//!    ended by an empty name
//! 5. imports and 6. exports: `(kind, name, data type[, class])` ended by
//!    kind `-1`
//! 7. syntax tree, pre-order with `-1` for a missing child or sibling
//! 8. string table referenced from the tree

pub mod codec;
pub mod io_utils;
pub mod string_table;


use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use thiserror::Error;

use crate::ast::{attr, node_type, Ast, Node, NodeId};
use crate::error::{ProparseError, Result};
use crate::session::Session;
use crate::types::DataType;
use crate::unit::{ParsedUnit, SymbolRef, UnitContext, UnitParser};
use codec::{DataReader, DataWriter};
use io_utils::{classify_io_error, retry_io_operation};
use string_table::StringTable;

/// Version of the segment layout. Artifacts of any other version are stale.
pub const LAYOUT_VERSION: i32 = 11;

/// How far an artifact has been read, in segment order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LoadDepth {
    NotLoaded,
    /// Artifact exists and is newer than the source; nothing read
    TimestampChecked,
    FilesLoaded,
    HeaderLoaded,
    SchemaLoaded,
    ImportsLoaded,
    ExportsLoaded,
    /// Tree shape and attributes, without node text
    AstLoaded,
    StringsLoaded,
}

/// Why an artifact could not be used. Every case means "rebuild".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadFailure {
    #[error("artifact does not exist")]
    Missing,

    #[error("source file is newer than the artifact")]
    SourceNewer,

    #[error("layout version {found} is not supported")]
    VersionMismatch { found: i32 },

    #[error("referenced file '{0}' is missing or newer than the artifact")]
    FileChanged(String),

    #[error("artifact unreadable: {0}")]
    Unreadable(String),
}

impl From<ProparseError> for LoadFailure {
    fn from(err: ProparseError) -> Self {
        LoadFailure::Unreadable(err.to_string())
    }
}

/// Schema table recorded in the schema segment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct TableRef {
    /// `db.table` as spelled in the schema
    name: String,
    /// Lowercase field name -> field name
    fields: BTreeMap<String, String>,
}

/// Cache record for one compilation unit.
#[derive(Debug)]
pub struct ParseUnitBinary {
    session: Arc<Session>,
    source: PathBuf,
    artifact: PathBuf,
    blob: Option<Vec<u8>>,
    depth: LoadDepth,
    checked: bool,
    current: bool,
    file_names: Vec<String>,
    class_name: Option<String>,
    super_class_name: Option<String>,
    /// Lowercase `db.table` -> table reference
    tables: BTreeMap<String, TableRef>,
    imports: Vec<SymbolRef>,
    exports: Vec<SymbolRef>,
    ast: Option<Ast>,
}

impl ParseUnitBinary {
    /// Creates the cache record of a source file.
    ///
    /// The artifact lives under the session's cache directory at a path
    /// derived from the canonical source path.
    pub fn new(session: &Arc<Session>, source: impl AsRef<Path>) -> Self {
        let source = source.as_ref();
        let source = fs::canonicalize(source).unwrap_or_else(|_| source.to_path_buf());
        let mut artifact =
            pub_dir_file_name(&session.cache_config().cache_dir, &source.to_string_lossy())
                .into_os_string();
        artifact.push(".pub");
        Self {
            session: session.clone(),
            source,
            artifact: PathBuf::from(artifact),
            blob: None,
            depth: LoadDepth::NotLoaded,
            checked: false,
            current: false,
            file_names: Vec::new(),
            class_name: None,
            super_class_name: None,
            tables: BTreeMap::new(),
            imports: Vec::new(),
            exports: Vec::new(),
            ast: None,
        }
    }

    pub fn source_path(&self) -> &Path {
        &self.source
    }

    pub fn artifact_path(&self) -> &Path {
        &self.artifact
    }

    /// Reads from these bytes instead of the local artifact file.
    ///
    /// File timestamps are not checked for a blob.
    pub fn set_input_blob(&mut self, bytes: Vec<u8>) {
        self.blob = Some(bytes);
    }

    pub fn depth(&self) -> LoadDepth {
        self.depth
    }

    /// Whether a load to at least the header was attempted.
    pub fn is_checked(&self) -> bool {
        self.checked
    }

    /// Whether the last load found the artifact up to date.
    pub fn is_current(&self) -> bool {
        self.current
    }

    /// Modification time of the artifact, `None` if it does not exist.
    pub fn timestamp(&self) -> Option<SystemTime> {
        modified(&self.artifact)
    }

    pub fn file_names(&self) -> &[String] {
        &self.file_names
    }

    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    pub fn super_class_name(&self) -> Option<&str> {
        self.super_class_name.as_deref()
    }

    pub fn imports(&self) -> &[SymbolRef] {
        &self.imports
    }

    pub fn exports(&self) -> &[SymbolRef] {
        &self.exports
    }

    pub fn ast(&self) -> Option<&Ast> {
        self.ast.as_ref()
    }

    /// Adds the lowercase `db.table` name of every referenced schema table.
    pub fn copy_schema_table_lowercase_names_into<C: Extend<String>>(&self, out: &mut C) {
        out.extend(self.tables.keys().cloned());
    }

    /// Adds the lowercase names of the referenced fields of one table.
    ///
    /// `table_name` is `db.table` in any case; an unknown table adds nothing.
    pub fn copy_schema_field_lowercase_names_into<C: Extend<String>>(
        &self,
        out: &mut C,
        table_name: &str,
    ) {
        if let Some(table) = self.tables.get(&table_name.to_lowercase()) {
            out.extend(table.fields.keys().cloned());
        }
    }

    fn refresh(&mut self) {
        self.depth = LoadDepth::NotLoaded;
        self.current = false;
        self.file_names.clear();
        self.class_name = None;
        self.super_class_name = None;
        self.tables.clear();
        self.imports.clear();
        self.exports.clear();
        self.ast = None;
    }

    /// Loads every segment.
    pub fn load(&mut self) -> std::result::Result<(), LoadFailure> {
        self.load_to(LoadDepth::StringsLoaded)
    }

    /// Loads segments up to and including `target`.
    ///
    /// # Returns
    /// `Err` when the artifact is missing, stale, or unreadable; the caller
    /// should build instead.
    pub fn load_to(&mut self, target: LoadDepth) -> std::result::Result<(), LoadFailure> {
        let result = self.try_load(target);
        if let Err(reason) = &result {
            tracing::debug!("Cache miss for {}: {}", self.source.display(), reason);
        }
        result
    }

    fn try_load(&mut self, target: LoadDepth) -> std::result::Result<(), LoadFailure> {
        self.refresh();
        if target >= LoadDepth::HeaderLoaded {
            self.checked = true;
        }
        if let Some(blob) = self.blob.take() {
            let result = self.read_segments(DataReader::new(blob.as_slice()), target, false);
            self.blob = Some(blob);
            return result;
        }
        let Some(artifact_time) = modified(&self.artifact) else {
            return Err(LoadFailure::Missing);
        };
        if modified(&self.source).is_some_and(|source_time| source_time > artifact_time) {
            return Err(LoadFailure::SourceNewer);
        }
        if target <= LoadDepth::TimestampChecked {
            self.depth = LoadDepth::TimestampChecked;
            return Ok(());
        }
        let file = File::open(&self.artifact).map_err(|e| {
            LoadFailure::from(classify_io_error(e, "Failed to open artifact"))
        })?;
        self.read_segments(DataReader::new(BufReader::new(file)), target, true)
    }

    fn read_segments<R: Read>(
        &mut self,
        mut r: DataReader<R>,
        target: LoadDepth,
        check_files: bool,
    ) -> std::result::Result<(), LoadFailure> {
        let version = r.read_i32()?;
        if version != LAYOUT_VERSION {
            return Err(LoadFailure::VersionMismatch { found: version });
        }
        self.read_file_index(&mut r)?;
        if check_files {
            self.check_file_timestamps()?;
        }
        self.current = true;
        self.depth = LoadDepth::FilesLoaded;
        if target <= LoadDepth::FilesLoaded {
            return Ok(());
        }

        self.class_name = non_empty(r.read_utf()?);
        self.super_class_name = non_empty(r.read_utf()?);
        self.depth = LoadDepth::HeaderLoaded;
        if target <= LoadDepth::HeaderLoaded {
            return Ok(());
        }

        self.read_schema(&mut r)?;
        self.depth = LoadDepth::SchemaLoaded;
        if target <= LoadDepth::SchemaLoaded {
            return Ok(());
        }

        self.imports = read_symbols(&mut r)?;
        self.depth = LoadDepth::ImportsLoaded;
        if target <= LoadDepth::ImportsLoaded {
            return Ok(());
        }

        self.exports = read_symbols(&mut r)?;
        self.depth = LoadDepth::ExportsLoaded;
        if target <= LoadDepth::ExportsLoaded {
            return Ok(());
        }

        let mut ast = read_tree(&mut r)?;
        ast.set_file_names(self.file_names.clone());
        self.depth = LoadDepth::AstLoaded;
        if target <= LoadDepth::AstLoaded {
            self.ast = Some(ast);
            return Ok(());
        }

        let count = r.read_i32()?;
        let count = usize::try_from(count)
            .map_err(|_| ProparseError::CorruptArtifact(format!("string count {}", count)))?;
        let strings = (0..count)
            .map(|_| r.read_utf())
            .collect::<Result<Vec<_>>>()?;
        apply_strings(&mut ast, &StringTable::from_strings(strings))?;
        self.ast = Some(ast);
        self.depth = LoadDepth::StringsLoaded;
        Ok(())
    }

    fn read_file_index<R: Read>(&mut self, r: &mut DataReader<R>) -> Result<()> {
        loop {
            let index = r.read_i32()?;
            let name = r.read_utf()?;
            if index == -1 {
                return Ok(());
            }
            self.file_names.push(name);
        }
    }

    /// Every file the unit was built from must still exist and be older
    /// than the artifact.
    fn check_file_timestamps(&self) -> std::result::Result<(), LoadFailure> {
        let artifact_time = modified(&self.artifact).ok_or(LoadFailure::Missing)?;
        for name in self.file_names.iter().filter(|n| !n.is_empty()) {
            let fresh = self
                .session
                .find_file(name)
                .and_then(|path| modified(&path))
                .is_some_and(|time| time <= artifact_time);
            if !fresh {
                return Err(LoadFailure::FileChanged(name.clone()));
            }
        }
        Ok(())
    }

    fn read_schema<R: Read>(&mut self, r: &mut DataReader<R>) -> Result<()> {
        loop {
            let table_name = r.read_utf()?;
            if table_name.is_empty() {
                return Ok(());
            }
            let mut table = TableRef {
                name: table_name.clone(),
                fields: BTreeMap::new(),
            };
            loop {
                let field = r.read_utf()?;
                if field.is_empty() {
                    break;
                }
                table.fields.insert(field.to_lowercase(), field);
            }
            self.tables.insert(table_name.to_lowercase(), table);
        }
    }

    /// Parses the unit and writes a fresh artifact.
    ///
    /// The existing artifact is deleted first, so a failed build never
    /// leaves a stale one behind. After a build every segment is available
    /// without loading.
    pub fn build(&mut self, parser: &dyn UnitParser) -> Result<ParsedUnit> {
        tracing::debug!("Building {}", self.source.display());
        match fs::remove_file(&self.artifact) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(classify_io_error(e, "Failed to delete artifact")),
        }
        self.refresh();
        let mut ctx = UnitContext::new(&self.session, &self.source);
        let unit = parser.parse(&mut ctx)?;
        self.write(&unit)?;
        tracing::debug!(
            "Built {} ({} nodes)",
            self.artifact.display(),
            unit.ast.len()
        );
        Ok(unit)
    }

    /// Writes the artifact for an already parsed unit.
    pub fn write(&mut self, unit: &ParsedUnit) -> Result<()> {
        self.refresh();
        self.file_names = unit.ast.file_names().to_vec();
        self.class_name = unit.class_name.clone();
        self.super_class_name = unit.super_class_name.clone();
        self.tables = schema_tables(unit);
        self.imports = unit.imports().cloned().collect();
        self.exports = unit.exports().cloned().collect();

        let bytes = self.encode(&unit.ast)?;
        let cache = self.session.cache_config();
        retry_io_operation(
            || write_atomically(&self.artifact, &bytes),
            cache.max_retries,
            cache.retry_delay_ms,
            "write_artifact",
        )?;
        self.ast = Some(unit.ast.clone());
        self.current = true;
        self.checked = true;
        self.depth = LoadDepth::StringsLoaded;
        Ok(())
    }

    fn encode(&self, ast: &Ast) -> Result<Vec<u8>> {
        let mut w = DataWriter::new(Vec::new());
        w.write_i32(LAYOUT_VERSION)?;

        for (i, name) in self.file_names.iter().enumerate() {
            w.write_i32(i as i32)?;
            w.write_utf(name)?;
        }
        w.write_i32(-1)?;
        w.write_utf("")?;

        w.write_utf(self.class_name.as_deref().unwrap_or(""))?;
        w.write_utf(self.super_class_name.as_deref().unwrap_or(""))?;

        for table in self.tables.values() {
            w.write_utf(&table.name)?;
            for field in table.fields.values() {
                w.write_utf(field)?;
            }
            w.write_utf("")?;
        }
        w.write_utf("")?;

        write_symbols(&mut w, &self.imports)?;
        write_symbols(&mut w, &self.exports)?;

        let mut strings = StringTable::new();
        write_tree(&mut w, ast, &mut strings)?;

        w.write_i32(strings.len() as i32)?;
        for s in strings.iter() {
            w.write_utf(s)?;
        }
        Ok(w.into_inner())
    }
}

/// Artifact path of a source file, without the `.pub` extension.
///
/// A drive letter colon becomes `_` and leading separators are dropped, so
/// the path always nests under `cache_dir`.
pub fn pub_dir_file_name(cache_dir: &Path, full_path: &str) -> PathBuf {
    let path = full_path.strip_prefix(r"\\?\").unwrap_or(full_path);
    let path = match path.as_bytes() {
        [drive, b':', ..] if drive.is_ascii_alphabetic() => {
            format!("{}_{}", &path[..1], &path[2..])
        }
        _ => path.to_string(),
    };
    cache_dir.join(path.trim_start_matches(['/', '\\']))
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| classify_io_error(e, "Failed to create cache directory"))?;
    }
    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    let temp = PathBuf::from(temp);

    let mut file =
        File::create(&temp).map_err(|e| classify_io_error(e, "Failed to create temp file"))?;
    file.write_all(bytes)
        .map_err(|e| classify_io_error(e, "Failed to write artifact"))?;
    file.sync_all()
        .map_err(|e| classify_io_error(e, "Failed to sync artifact"))?;

    fs::rename(&temp, path).map_err(|e| classify_io_error(e, "Failed to rename artifact"))?;
    Ok(())
}

/// Database tables and fields used by the unit's root symbols.
fn schema_tables(unit: &ParsedUnit) -> BTreeMap<String, TableRef> {
    let mut tables: BTreeMap<String, TableRef> = BTreeMap::new();
    for symbol in unit.root_symbols.iter().filter(|s| s.uses_db_table()) {
        let Some(schema) = &symbol.schema else {
            continue;
        };
        let name = format!("{}.{}", schema.table.database(), schema.table.name());
        let table = tables
            .entry(name.to_lowercase())
            .or_insert_with(|| TableRef {
                name,
                fields: BTreeMap::new(),
            });
        if let Some(field) = &schema.field {
            table.fields.insert(field.to_lowercase(), field.clone());
        }
    }
    tables
}

fn write_symbols<W: Write>(w: &mut DataWriter<W>, symbols: &[SymbolRef]) -> Result<()> {
    for symbol in symbols {
        w.write_i32(symbol.progress_type)?;
        w.write_utf(&symbol.symbol_name)?;
        let data_type = symbol.data_type.map_or(0, DataType::token_type);
        w.write_i32(data_type)?;
        if symbol.data_type == Some(DataType::Class) {
            w.write_utf(symbol.class_name.as_deref().unwrap_or(""))?;
        }
    }
    w.write_i32(-1)?;
    w.write_utf("")
}

fn read_symbols<R: Read>(r: &mut DataReader<R>) -> Result<Vec<SymbolRef>> {
    let mut symbols = Vec::new();
    loop {
        let progress_type = r.read_i32()?;
        let symbol_name = r.read_utf()?;
        if progress_type == -1 {
            return Ok(symbols);
        }
        let code = r.read_i32()?;
        let data_type = match code {
            0 => None,
            _ => Some(DataType::from_token_type(code).ok_or_else(|| {
                ProparseError::CorruptArtifact(format!("unknown data type code {}", code))
            })?),
        };
        let class_name = if data_type == Some(DataType::Class) {
            Some(r.read_utf()?)
        } else {
            None
        };
        symbols.push(SymbolRef {
            progress_type,
            symbol_name,
            data_type,
            class_name,
        });
    }
}

fn write_node<W: Write>(w: &mut DataWriter<W>, node: &Node, strings: &mut StringTable) -> Result<()> {
    w.write_i32(node.subtype)?;
    w.write_i32(node.node_type)?;
    w.write_i16(node.file_index)?;
    w.write_i32(node.line)?;
    w.write_i16(node.column)?;
    w.write_i32(node.source_index)?;

    if let Some(text) = node
        .text
        .as_deref()
        .filter(|t| Some(*t) != node_type::default_text(node.node_type))
    {
        w.write_i32(attr::NODETEXT)?;
        w.write_i32(strings.index_of(text))?;
    }
    if let Some(comments) = &node.comments {
        w.write_i32(attr::NODECOMMENTS)?;
        w.write_i32(strings.index_of(comments))?;
    }
    for (key, value) in node.attrs().filter(|(k, _)| !attr::is_string_key(*k)) {
        w.write_i32(key)?;
        w.write_i32(value)?;
    }
    if let Some(text) = &node.directive_text {
        w.write_i32(attr::PROPARSEDIRECTIVE)?;
        w.write_i32(strings.index_of(text))?;
    }
    if node.node_type == node_type::TYPE_NAME {
        w.write_i32(attr::QUALIFIED_CLASS_INT)?;
        w.write_i32(strings.index_of(node.qualified_class.as_deref().unwrap_or("")))?;
    }
    w.write_i32(-1)?;
    w.write_i32(-1)
}

/// Writes the tree in pre-order: each node, then its first child subtree,
/// then its next sibling subtree, `-1` standing for an absent link.
fn write_tree<W: Write>(w: &mut DataWriter<W>, ast: &Ast, strings: &mut StringTable) -> Result<()> {
    let mut stack = vec![Some(ast.root())];
    while let Some(slot) = stack.pop() {
        match slot {
            None => w.write_i32(-1)?,
            Some(id) => {
                let node = ast.node(id);
                write_node(w, node, strings)?;
                stack.push(node.next_sibling());
                stack.push(node.first_child());
            }
        }
    }
    Ok(())
}

/// Where the next node record read belongs.
enum Slot {
    FirstChild(NodeId),
    NextSibling(Option<NodeId>),
}

fn read_node<R: Read>(r: &mut DataReader<R>, subtype: i32) -> Result<Node> {
    let mut node = Node::new(r.read_i32()?);
    node.subtype = subtype;
    node.file_index = r.read_i16()?;
    node.line = r.read_i32()?;
    node.column = r.read_i16()?;
    node.source_index = r.read_i32()?;
    loop {
        let key = r.read_i32()?;
        let value = r.read_i32()?;
        if key == -1 {
            return Ok(node);
        }
        node.set_attr(key, value);
    }
}

fn read_tree<R: Read>(r: &mut DataReader<R>) -> Result<Ast> {
    let subtype = r.read_i32()?;
    if subtype == -1 {
        return Err(ProparseError::CorruptArtifact("empty syntax tree".to_string()));
    }
    let mut ast = Ast::new(read_node(r, subtype)?);
    let mut stack = vec![Slot::NextSibling(None), Slot::FirstChild(ast.root())];
    while let Some(slot) = stack.pop() {
        let subtype = r.read_i32()?;
        if subtype == -1 {
            continue;
        }
        let parent = match slot {
            Slot::FirstChild(parent) | Slot::NextSibling(Some(parent)) => parent,
            Slot::NextSibling(None) => {
                return Err(ProparseError::CorruptArtifact(
                    "syntax tree root has a sibling".to_string(),
                ))
            }
        };
        let id = ast.add_child(parent, read_node(r, subtype)?);
        stack.push(Slot::NextSibling(Some(parent)));
        stack.push(Slot::FirstChild(id));
    }
    Ok(ast)
}

/// Replaces string index attributes with the strings they refer to.
fn apply_strings(ast: &mut Ast, strings: &StringTable) -> Result<()> {
    // Text, comments and directives are only written when present, so
    // index 0 is an empty string for them and "no class" for the class name
    let lookup = |index: i32| -> Result<String> {
        strings
            .get(index)
            .map(str::to_string)
            .ok_or_else(|| ProparseError::CorruptArtifact(format!("string index {}", index)))
    };
    for i in 0..ast.len() {
        let node = ast.node_mut(NodeId(i));
        if let Some(index) = node.take_attr(attr::NODETEXT) {
            node.text = Some(lookup(index)?);
        }
        if let Some(index) = node.take_attr(attr::NODECOMMENTS) {
            node.comments = Some(lookup(index)?);
        }
        if let Some(index) = node.take_attr(attr::PROPARSEDIRECTIVE) {
            node.directive_text = Some(lookup(index)?);
        }
        if let Some(index) = node.take_attr(attr::QUALIFIED_CLASS_INT) {
            node.qualified_class = Some(lookup(index)?).filter(|c| !c.is_empty());
        }
    }
    Ok(())
}
