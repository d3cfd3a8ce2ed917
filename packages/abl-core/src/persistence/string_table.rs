//! Deduplicated strings referenced by index from syntax nodes.

use std::collections::HashMap;

/// Bidirectional string/index table.
///
/// Index 0 always holds the empty string, so a zero attribute value can
/// mean "no string".
#[derive(Debug, Clone)]
pub struct StringTable {
    strings: Vec<String>,
    index: HashMap<String, i32>,
}

impl Default for StringTable {
    fn default() -> Self {
        Self::new()
    }
}

impl StringTable {
    pub fn new() -> Self {
        let mut table = Self {
            strings: Vec::new(),
            index: HashMap::new(),
        };
        table.index_of("");
        table
    }

    /// Table loaded from an artifact, in stored order.
    pub fn from_strings(strings: Vec<String>) -> Self {
        let index = strings
            .iter()
            .enumerate()
            .map(|(i, s)| (s.clone(), i as i32))
            .collect();
        Self { strings, index }
    }

    /// Returns the index of `s`, adding it if absent.
    pub fn index_of(&mut self, s: &str) -> i32 {
        if let Some(&i) = self.index.get(s) {
            return i;
        }
        let i = self.strings.len() as i32;
        self.strings.push(s.to_string());
        self.index.insert(s.to_string(), i);
        i
    }

    pub fn get(&self, index: i32) -> Option<&str> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.strings.get(i))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.strings.iter().map(String::as_str)
    }
}
