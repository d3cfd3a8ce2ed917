//! Replays a preprocessor listing into [`PreprocessorEvents`].
//!
//! Each listing line reads `<file> <line> <column> <token> <arg> <rest>`,
//! where `rest` runs to the end of the line. Values are escaped with
//! `\n`, `\r` and `\\`.

use std::collections::BTreeMap;
use std::path::Path;

use super::event::MacroDefKind;
use super::tracker::PreprocessorEvents;
use crate::error::{ProparseError, Result};
use crate::persistence::io_utils::classify_io_error;

/// Reads a listing file and replays it.
///
/// # Returns
/// The file index table declared by `fileindex` lines.
pub fn replay_listing_file<E: PreprocessorEvents>(
    path: &Path,
    events: &mut E,
) -> Result<BTreeMap<i32, String>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| classify_io_error(e, &format!("Failed to read listing {}", path.display())))?;
    replay_listing(&path.display().to_string(), &text, events)
}

/// Replays listing text.
///
/// # Arguments
/// * `name` - Listing name used in error messages
/// * `text` - Listing contents
/// * `events` - Receiver of the callbacks
///
/// # Returns
/// The file index table declared by `fileindex` lines. Lines with an
/// unknown token are an error unless they are blank.
pub fn replay_listing<E: PreprocessorEvents>(
    name: &str,
    text: &str,
    events: &mut E,
) -> Result<BTreeMap<i32, String>> {
    let mut file_indexes = BTreeMap::new();
    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let entry = ListingLine::parse(line).ok_or_else(|| listing_error(name, idx + 1, line))?;
        match entry.token {
            "globdef" => events.define(
                entry.line,
                entry.column,
                entry.arg,
                &replace_escapes(entry.rest),
                MacroDefKind::Global,
            ),
            "scopdef" => events.define(
                entry.line,
                entry.column,
                entry.arg,
                &replace_escapes(entry.rest),
                MacroDefKind::Scoped,
            ),
            "undef" => events.undefine(entry.line, entry.column, entry.arg),
            "macroref" => events.macro_ref(entry.line, entry.column, entry.arg),
            "macrorefend" => events.macro_ref_end(entry.line, entry.column),
            "include" => {
                let file_index = entry
                    .arg
                    .parse()
                    .map_err(|_| listing_error(name, idx + 1, line))?;
                events.include(entry.line, entry.column, file_index, entry.rest);
            }
            "incarg" => events.include_argument(entry.arg, &replace_escapes(entry.rest), false),
            "incend" => events.include_end(entry.line, entry.column),
            "ampif" => events.prepro_if(
                entry.line,
                entry.column,
                entry.arg.eq_ignore_ascii_case("true"),
            ),
            "ampelseif" => events.prepro_else_if(entry.line, entry.column),
            "ampelse" => events.prepro_else(entry.line, entry.column),
            "ampendif" => events.prepro_end_if(entry.line, entry.column),
            "fileindex" => {
                let index = entry
                    .arg
                    .parse()
                    .map_err(|_| listing_error(name, idx + 1, line))?;
                file_indexes.insert(index, entry.rest.to_string());
            }
            _ => return Err(listing_error(name, idx + 1, line)),
        }
    }
    Ok(file_indexes)
}

struct ListingLine<'a> {
    line: i32,
    column: i32,
    token: &'a str,
    arg: &'a str,
    rest: &'a str,
}

impl<'a> ListingLine<'a> {
    fn parse(text: &'a str) -> Option<Self> {
        let mut parts = text.splitn(6, char::is_whitespace);
        let _file = parts.next()?;
        let line = parts.next()?.parse().ok()?;
        let column = parts.next()?.parse().ok()?;
        let token = parts.next()?;
        Some(Self {
            line,
            column,
            token,
            arg: parts.next().unwrap_or(""),
            rest: parts.next().unwrap_or(""),
        })
    }
}

fn listing_error(name: &str, line: usize, text: &str) -> ProparseError {
    ProparseError::Parse {
        unit: name.to_string(),
        message: format!("invalid listing line {}: '{}'", line, text),
    }
}

/// Decodes `\n`, `\r` and `\\`; any other backslash is kept as is.
pub fn replace_escapes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('\\') => {
                out.push('\\');
                chars.next();
            }
            Some('n') => {
                out.push('\n');
                chars.next();
            }
            Some('r') => {
                out.push('\r');
                chars.next();
            }
            _ => out.push(c),
        }
    }
    out
}
