//! Line-oriented schema description reader.
//!
//! Format, one entry per line:
//! - `S<name>` declares a sequence
//! - `T<name>` starts a table
//! - `F<name>:<type>:<extent>` adds a field to the current table
//! - `I<name>:<attrs>:<A|D><field>:...` adds an index to the current table,
//!   `attrs` containing `U` for unique and `P` for primary
//!
//! Blank lines are ignored. Anything else is a format error.

use std::path::Path;

use super::database::Database;
use super::field::Field;
use super::index::Index;
use super::table::Table;
use crate::error::{ProparseError, Result};
use crate::persistence::io_utils::classify_io_error;
use crate::types::DataType;

/// Reads a schema description file into a database named after the file stem.
pub fn load_file(path: &Path) -> Result<Database> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| classify_io_error(e, &format!("Failed to read schema {}", path.display())))?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut db = Database::new(name);
    parse_description(&mut db, &text)?;
    tracing::debug!(
        "Loaded schema {} with {} tables and {} sequences",
        db.name(),
        db.tables().len(),
        db.sequences().len()
    );
    Ok(db)
}

/// Adds the tables and sequences of a schema description to `db`.
///
/// # Arguments
/// * `db` - Database receiving the definitions
/// * `text` - Description text
///
/// # Returns
/// `Ok(())` once every line was applied; the first malformed line aborts the load.
pub fn parse_description(db: &mut Database, text: &str) -> Result<()> {
    let mut current: Option<Table> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim_end();
        let Some(tag) = line.chars().next() else {
            continue;
        };
        let rest = &line[tag.len_utf8()..];
        match tag {
            'S' => db.add_sequence(rest),
            'T' => {
                if let Some(table) = current.take() {
                    db.add_table(table);
                }
                current = Some(Table::new(rest, db.name()));
            }
            'F' => {
                let table = current
                    .as_mut()
                    .ok_or_else(|| format_error(line_no, "field line without a current table"))?;
                table.add_field(parse_field(line_no, rest)?);
            }
            'I' => {
                let table = current
                    .as_mut()
                    .ok_or_else(|| format_error(line_no, "index line without a current table"))?;
                let index = parse_index(line_no, rest, table)?;
                table.add_index(index);
            }
            _ => return Err(format_error(line_no, &format!("unexpected line '{}'", line))),
        }
    }

    if let Some(table) = current.take() {
        db.add_table(table);
    }
    Ok(())
}

/// Parses `name:type:extent`, splitting on the first and last colon.
fn parse_field(line_no: usize, rest: &str) -> Result<Field> {
    let (first, last) = match (rest.find(':'), rest.rfind(':')) {
        (Some(first), Some(last)) if first < last => (first, last),
        _ => return Err(format_error(line_no, "field line needs name:type:extent")),
    };
    let data_type: DataType = rest[first + 1..last].parse()?;
    let extent = rest[last + 1..]
        .trim()
        .parse::<u32>()
        .map_err(|_| format_error(line_no, &format!("invalid extent '{}'", &rest[last + 1..])))?;
    Ok(Field::new(&rest[..first], Some(data_type), extent))
}

fn parse_index(line_no: usize, rest: &str, table: &Table) -> Result<Index> {
    let parts: Vec<&str> = rest.split(':').map(str::trim).collect();
    if parts.len() < 3 {
        return Err(format_error(line_no, "index line needs name:attributes:fields"));
    }
    let attrs = parts[1];
    let mut index = Index::new(parts[0], attrs.contains('U'), attrs.contains('P'));
    for part in &parts[2..] {
        let mut chars = part.chars();
        let ascending = match chars.next() {
            Some('A') => true,
            Some('D') => false,
            _ => {
                return Err(format_error(
                    line_no,
                    &format!("index field '{}' must start with A or D", part),
                ))
            }
        };
        let field_name = chars.as_str();
        let field = table.lookup_field(field_name).ok_or_else(|| {
            format_error(
                line_no,
                &format!("index field '{}' not found in table '{}'", field_name, table.name()),
            )
        })?;
        index.add_field(field.name(), ascending);
    }
    Ok(index)
}

fn format_error(line: usize, message: &str) -> ProparseError {
    ProparseError::SchemaFormat {
        line,
        message: message.to_string(),
    }
}
