//! Resolution of unqualified class names through `USING` statements.

use std::collections::HashMap;

use super::type_info::TypeInfoProvider;

/// Maps short class names to the qualified names imported by `USING`.
#[derive(Debug, Default, Clone)]
pub struct ClassFinder {
    /// Lowercase short name -> qualified name
    names: HashMap<String, String>,
}

impl ClassFinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the type or package named by a `USING` statement.
    ///
    /// A trailing `.*` imports every class the provider knows in that
    /// package. The first import of a short name wins.
    pub fn add_path(&mut self, provider: &dyn TypeInfoProvider, text: &str) {
        let path = dequote(text);
        if path.is_empty() {
            return;
        }
        if let Some(package) = path.strip_suffix(".*") {
            for class in provider.classes_in_package(package) {
                self.add_qualified_name(&class);
            }
        } else if path.ends_with('*') {
            tracing::debug!("Ignoring malformed package import '{}'", path);
        } else {
            self.add_qualified_name(&path);
        }
    }

    fn add_qualified_name(&mut self, qualified: &str) {
        let short = qualified.rsplit('.').next().unwrap_or(qualified);
        self.names
            .entry(short.to_lowercase())
            .or_insert_with(|| qualified.to_string());
    }

    /// Resolves a class name as written in source.
    ///
    /// # Returns
    /// The qualified name, or an empty string when the name matches no
    /// import and no known type.
    pub fn lookup(&self, provider: &dyn TypeInfoProvider, raw: &str) -> String {
        let name = dequote(raw);
        if name.contains('.') {
            return name;
        }
        if let Some(qualified) = self.names.get(&name.to_lowercase()) {
            return qualified.clone();
        }
        if provider.type_info(&name).is_some() {
            return name;
        }
        String::new()
    }

    /// Relative source path of a qualified class name.
    pub fn class_file_name(qualified: &str) -> String {
        format!("{}.cls", qualified.replace('.', "/"))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Strips quote characters from a class name token.
///
/// A quote directly followed by `:` ends the name, so string attributes
/// such as `"x.Y":U` drop their suffix.
pub fn dequote(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut quotes_seen = 0;
    while let Some(c) = chars.next() {
        if c == '"' || c == '\'' {
            quotes_seen += 1;
            if quotes_seen > 1 && chars.peek() == Some(&':') {
                break;
            }
        } else {
            out.push(c);
        }
    }
    out
}
