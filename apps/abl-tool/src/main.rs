//! Command-line inspection of schemas, parse-unit binaries and
//! preprocessor listings.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use abl_core::ast::node_type;
use abl_core::config::ProjectConfig;
use abl_core::macros::{replay_listing_file, MacroEventKind, MacroGraph, MacroTracker};
use abl_core::persistence::{LoadDepth, ParseUnitBinary};
use abl_core::schema::{FieldName, Schema};
use abl_core::unit::SymbolRef;
use abl_core::Session;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load schema description files and query them
    Schema {
        /// Schema description file, one database each
        #[arg(short, long = "file", required = true)]
        files: Vec<PathBuf>,

        /// Add the dictionary meta tables to every database
        #[arg(long)]
        meta: bool,

        #[command(subcommand)]
        action: SchemaAction,
    },

    /// Parse-unit binary operations
    Pub {
        #[command(subcommand)]
        action: PubAction,
    },

    /// Replay a preprocessor listing and print the macro tree
    Listing {
        /// Listing file
        file: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum SchemaAction {
    /// Resolve a `table` or `db.table` name, abbreviations allowed
    LookupTable { name: String },

    /// Resolve a `field`, `table.field` or `db.table.field` name
    LookupField { name: String },

    /// Print every database, table and field
    Dump,
}

#[derive(Subcommand, Debug)]
enum PubAction {
    /// Print the contents of a unit's cached artifact
    Inspect {
        /// Source file of the unit
        unit: PathBuf,

        /// Project configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Cache directory, overrides the configuration
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// How far to read the artifact
        #[arg(long, value_enum, default_value_t = Depth::Strings)]
        depth: Depth,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Depth {
    Files,
    Header,
    Schema,
    Imports,
    Exports,
    Ast,
    Strings,
}

impl From<Depth> for LoadDepth {
    fn from(depth: Depth) -> Self {
        match depth {
            Depth::Files => LoadDepth::FilesLoaded,
            Depth::Header => LoadDepth::HeaderLoaded,
            Depth::Schema => LoadDepth::SchemaLoaded,
            Depth::Imports => LoadDepth::ImportsLoaded,
            Depth::Exports => LoadDepth::ExportsLoaded,
            Depth::Ast => LoadDepth::AstLoaded,
            Depth::Strings => LoadDepth::StringsLoaded,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Schema {
            files,
            meta,
            action,
        } => run_schema(&files, meta, action),
        Commands::Pub {
            action:
                PubAction::Inspect {
                    unit,
                    config,
                    cache_dir,
                    depth,
                },
        } => inspect_pub(unit, config, cache_dir, depth),
        Commands::Listing { file } => print_listing(file),
    }
}

fn run_schema(files: &[PathBuf], meta: bool, action: SchemaAction) -> Result<()> {
    let schema = Schema::load_files(files, meta).context("Failed to load schema")?;
    tracing::debug!("Loaded {} databases", schema.databases().len());

    match action {
        SchemaAction::LookupTable { name } => match schema.lookup_table(&name) {
            Some(table) => println!("{}.{}", table.database(), table.name()),
            None => bail!("No unique table matches '{}'", name),
        },
        SchemaAction::LookupField { name } => {
            let parsed = FieldName::parse(&name);
            let found = match (&parsed.db, &parsed.table) {
                (Some(db), Some(table)) => schema
                    .lookup_table_in(db, table)
                    .and_then(|t| t.lookup_field(&parsed.field).map(|f| (t, f))),
                (None, Some(table)) => schema
                    .lookup_table(table)
                    .and_then(|t| t.lookup_field(&parsed.field).map(|f| (t, f))),
                _ => schema.lookup_unqualified_field(&parsed.field),
            };
            match found {
                Some((table, field)) => println!(
                    "{}.{}.{} {}{}",
                    table.database(),
                    table.name(),
                    field.name(),
                    field
                        .data_type()
                        .map_or_else(|| "?".to_string(), |dt| dt.to_string()),
                    if field.extent() > 0 {
                        format!(" extent {}", field.extent())
                    } else {
                        String::new()
                    }
                ),
                None => bail!("No field matches '{}'", name),
            }
        }
        SchemaAction::Dump => {
            for db in schema.databases() {
                println!("database {}", db.name());
                for sequence in db.sequences() {
                    println!("  sequence {}", sequence);
                }
                for table in db.tables() {
                    println!("  table {}", table.name());
                    for field in table.fields() {
                        println!(
                            "    {} {}",
                            field.name(),
                            field.data_type().map_or_else(|| "?".to_string(), |dt| dt.to_string())
                        );
                    }
                    for index in table.indexes() {
                        let fields: Vec<_> = index
                            .fields()
                            .iter()
                            .map(|f| format!("{}{}", if f.ascending { "+" } else { "-" }, f.field))
                            .collect();
                        println!(
                            "    index {}{}{} ({})",
                            index.name(),
                            if index.is_primary() { " primary" } else { "" },
                            if index.is_unique() { " unique" } else { "" },
                            fields.join(", ")
                        );
                    }
                }
            }
        }
    }
    Ok(())
}

fn inspect_pub(
    unit: PathBuf,
    config: Option<PathBuf>,
    cache_dir: Option<PathBuf>,
    depth: Depth,
) -> Result<()> {
    let mut project = match &config {
        Some(path) => ProjectConfig::from_file(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => ProjectConfig::default(),
    };
    project.apply_env_overrides()?;
    if let Some(dir) = cache_dir {
        project.cache.cache_dir = dir;
    }
    let session = Arc::new(Session::from_config(&project).context("Failed to open project")?);

    let mut unit_pub = ParseUnitBinary::new(&session, &unit);
    println!("artifact {}", unit_pub.artifact_path().display());
    if let Err(reason) = unit_pub.load_to(depth.into()) {
        bail!("Cannot use artifact: {}", reason);
    }

    for (i, name) in unit_pub.file_names().iter().enumerate() {
        println!("file {} {}", i, name);
    }
    if let Some(class) = unit_pub.class_name() {
        println!("class {}", class);
    }
    if let Some(parent) = unit_pub.super_class_name() {
        println!("inherits {}", parent);
    }
    let mut tables = Vec::new();
    unit_pub.copy_schema_table_lowercase_names_into(&mut tables);
    for table in &tables {
        let mut fields = Vec::new();
        unit_pub.copy_schema_field_lowercase_names_into(&mut fields, table);
        println!("table {} [{}]", table, fields.join(", "));
    }
    for symbol in unit_pub.imports() {
        println!("import {}", describe_symbol(symbol));
    }
    for symbol in unit_pub.exports() {
        println!("export {}", describe_symbol(symbol));
    }
    if let Some(ast) = unit_pub.ast() {
        print!("{}", ast.dump());
    }
    Ok(())
}

fn describe_symbol(symbol: &SymbolRef) -> String {
    let kind = node_type::type_name(symbol.progress_type).unwrap_or("?");
    let mut text = format!("{} {}", kind, symbol.symbol_name);
    if let Some(dt) = symbol.data_type {
        text.push_str(&format!(" as {}", dt));
    }
    if let Some(class) = &symbol.class_name {
        text.push_str(&format!(" ({})", class));
    }
    text
}

fn print_listing(file: PathBuf) -> Result<()> {
    let mut tracker = MacroTracker::new();
    let files = replay_listing_file(&file, &mut tracker)
        .with_context(|| format!("Failed to replay {}", file.display()))?;
    for (index, name) in &files {
        println!("file {} {}", index, name);
    }
    print_macro_tree(tracker.graph());
    if tracker.is_app_builder_code() {
        for section in tracker.editable_code_sections() {
            println!(
                "editable {}:{}-{}",
                section.file_index, section.start_line, section.end_line
            );
        }
    }
    Ok(())
}

/// Pre-order print of every event, indented by nesting depth.
fn print_macro_tree(graph: &MacroGraph) {
    let mut stack = vec![(graph.root(), 0usize)];
    while let Some((id, depth)) = stack.pop() {
        let event = graph.get(id);
        let indent = "  ".repeat(depth);
        match &event.kind {
            MacroEventKind::Include(inc) => println!(
                "{}include {} #{} at {}:{}",
                indent, inc.file_ref_name, inc.file_index, event.line, event.column
            ),
            MacroEventKind::Named(named) => {
                let target = named
                    .definition
                    .and_then(|def| graph.as_def(def))
                    .map_or("<undefined>", |def| def.name.as_str());
                println!(
                    "{}ref {} at {}:{}",
                    indent, target, event.line, event.column
                );
            }
            MacroEventKind::Def(def) => println!(
                "{}{:?} {} = {:?} at {}:{}",
                indent, def.kind, def.name, def.value, event.line, event.column
            ),
        }
        for &child in graph.children(id).iter().rev() {
            stack.push((child, depth + 1));
        }
    }
}
