//! Class metadata consulted for inherited names.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io::Read;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{ProparseError, Result};

/// Metadata about one class or interface.
pub trait TypeInfo: fmt::Debug + Send + Sync {
    /// Fully qualified type name.
    fn type_name(&self) -> &str;

    /// Fully qualified name of the parent type, if any.
    fn parent_type_name(&self) -> Option<&str>;

    fn has_method(&self, name: &str) -> bool;

    fn has_property(&self, name: &str) -> bool;

    /// Whether the type declares a buffer or temp-table with this name.
    fn has_buffer(&self, name: &str) -> bool;
}

/// Lookup of class metadata by name.
pub trait TypeInfoProvider: Send + Sync {
    /// Case-sensitive lookup by fully qualified name.
    fn type_info(&self, name: &str) -> Option<Arc<dyn TypeInfo>>;

    /// Case-insensitive lookup by fully qualified name.
    fn type_info_ci(&self, name: &str) -> Option<Arc<dyn TypeInfo>>;

    /// Fully qualified names of every known class in a package.
    fn classes_in_package(&self, package: &str) -> Vec<String>;
}

/// Returns `true` if `pred` holds for `start` or any of its ancestors.
///
/// Ancestors are resolved through `provider`; the walk stops at the first
/// unknown parent or when a type repeats.
pub fn any_in_type_chain<F>(
    provider: &dyn TypeInfoProvider,
    start: Option<Arc<dyn TypeInfo>>,
    pred: F,
) -> bool
where
    F: Fn(&dyn TypeInfo) -> bool,
{
    let mut visited = HashSet::new();
    let mut current = start;
    while let Some(info) = current {
        if !visited.insert(info.type_name().to_string()) {
            tracing::warn!("Inheritance cycle through {}", info.type_name());
            return false;
        }
        if pred(info.as_ref()) {
            return true;
        }
        current = info
            .parent_type_name()
            .and_then(|parent| provider.type_info(parent));
    }
    false
}

/// Class metadata as read from a JSON catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassInfo {
    pub name: String,
    #[serde(default, alias = "inherits")]
    pub parent: Option<String>,
    #[serde(default)]
    pub methods: Vec<String>,
    #[serde(default)]
    pub properties: Vec<String>,
    #[serde(default)]
    pub buffers: Vec<String>,
    #[serde(default)]
    pub is_interface: bool,
}

impl ClassInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_method(mut self, name: impl Into<String>) -> Self {
        self.methods.push(name.into());
        self
    }

    pub fn with_property(mut self, name: impl Into<String>) -> Self {
        self.properties.push(name.into());
        self
    }

    pub fn with_buffer(mut self, name: impl Into<String>) -> Self {
        self.buffers.push(name.into());
        self
    }
}

fn contains_ci(names: &[String], name: &str) -> bool {
    names.iter().any(|n| n.eq_ignore_ascii_case(name))
}

impl TypeInfo for ClassInfo {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn parent_type_name(&self) -> Option<&str> {
        self.parent.as_deref().filter(|p| !p.is_empty())
    }

    fn has_method(&self, name: &str) -> bool {
        contains_ci(&self.methods, name)
    }

    fn has_property(&self, name: &str) -> bool {
        contains_ci(&self.properties, name)
    }

    fn has_buffer(&self, name: &str) -> bool {
        contains_ci(&self.buffers, name)
    }
}

#[derive(Default)]
struct TypeIndex {
    by_name: HashMap<String, Arc<dyn TypeInfo>>,
    by_lower: HashMap<String, Arc<dyn TypeInfo>>,
    /// Package name -> qualified class names
    by_package: HashMap<String, Vec<String>>,
}

/// Concurrent cache of class metadata, filled as units are processed.
///
/// All three indexes sit under one lock, so a reader never sees a class in
/// one index and not in another.
#[derive(Default)]
pub struct TypeInfoCache {
    index: RwLock<TypeIndex>,
}

impl fmt::Debug for TypeInfoCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfoCache")
            .field("classes", &self.len())
            .finish()
    }
}

impl TypeInfoCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the metadata of one type.
    pub fn inject(&self, info: Arc<dyn TypeInfo>) {
        let name = info.type_name().to_string();
        let package = package_of(&name).to_string();
        let mut index = self.index.write();
        let replaced = index.by_name.insert(name.clone(), info.clone()).is_some();
        index.by_lower.insert(name.to_lowercase(), info);
        if !replaced {
            index.by_package.entry(package).or_default().push(name);
        }
    }

    /// Injects every class of a JSON catalog (an array of [`ClassInfo`]).
    ///
    /// # Returns
    /// Number of classes injected.
    pub fn inject_catalog<R: Read>(&self, reader: R) -> Result<usize> {
        let classes: Vec<ClassInfo> = serde_json::from_reader(reader)
            .map_err(|e| ProparseError::Config(format!("Invalid class catalog: {}", e)))?;
        let count = classes.len();
        for class in classes {
            self.inject(Arc::new(class));
        }
        tracing::debug!("Injected {} classes from catalog", count);
        Ok(count)
    }

    pub fn len(&self) -> usize {
        self.index.read().by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TypeInfoProvider for TypeInfoCache {
    fn type_info(&self, name: &str) -> Option<Arc<dyn TypeInfo>> {
        self.index.read().by_name.get(name).cloned()
    }

    fn type_info_ci(&self, name: &str) -> Option<Arc<dyn TypeInfo>> {
        self.index.read().by_lower.get(&name.to_lowercase()).cloned()
    }

    fn classes_in_package(&self, package: &str) -> Vec<String> {
        self.index
            .read()
            .by_package
            .get(package)
            .cloned()
            .unwrap_or_default()
    }
}

/// Package part of a qualified class name, empty for unqualified names.
pub fn package_of(qualified: &str) -> &str {
    qualified.rsplit_once('.').map_or("", |(package, _)| package)
}
