//! Project-wide state shared by every compilation unit.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{CacheConfig, ProjectConfig, ProparseSettings};
use crate::error::Result;
use crate::persistence::io_utils::classify_io_error;
use crate::schema::Schema;
use crate::symbols::{ClassFinder, TypeInfo, TypeInfoCache, TypeInfoProvider};

/// Settings, schema and class metadata of one project.
///
/// A session is built once and then shared read-only between units, apart
/// from the type-info cache and the schema aliases which tolerate
/// concurrent updates.
#[derive(Debug)]
pub struct Session {
    settings: ProparseSettings,
    schema: Arc<Schema>,
    types: TypeInfoCache,
    cache: CacheConfig,
}

impl Session {
    pub fn new(settings: ProparseSettings, schema: Schema) -> Self {
        Self {
            settings,
            schema: Arc::new(schema),
            types: TypeInfoCache::new(),
            cache: CacheConfig::default(),
        }
    }

    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// Builds a session from a project configuration.
    ///
    /// Loads every schema file (with the meta tables) and every class
    /// catalog the configuration lists.
    pub fn from_config(config: &ProjectConfig) -> Result<Self> {
        let schema = if config.schema_files.is_empty() {
            Schema::new()
        } else {
            Schema::load_files(&config.schema_files, true)?
        };
        let session = Self::new(config.settings.clone(), schema).with_cache(config.cache.clone());
        for catalog in &config.catalog_files {
            session.inject_classes_from_catalog(catalog)?;
        }
        tracing::debug!(
            "Session ready: {} databases, {} classes",
            session.schema.databases().len(),
            session.types.len()
        );
        Ok(session)
    }

    pub fn settings(&self) -> &ProparseSettings {
        &self.settings
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn types(&self) -> &TypeInfoCache {
        &self.types
    }

    pub fn cache_config(&self) -> &CacheConfig {
        &self.cache
    }

    pub fn inject_type_info(&self, info: Arc<dyn TypeInfo>) {
        self.types.inject(info);
    }

    /// Reads a JSON class catalog into the type-info cache.
    ///
    /// # Returns
    /// Number of classes injected.
    pub fn inject_classes_from_catalog(&self, path: &Path) -> Result<usize> {
        let file = std::fs::File::open(path)
            .map_err(|e| classify_io_error(e, &format!("Failed to open catalog {}", path.display())))?;
        self.types.inject_catalog(std::io::BufReader::new(file))
    }

    /// Locates a source or include file.
    ///
    /// Absolute names, names with a drive letter, and names starting with
    /// `.`, `/` or `\` are checked as given. Anything else is searched
    /// along the propath, first match wins.
    pub fn find_file(&self, name: &str) -> Option<PathBuf> {
        if name.is_empty() {
            return None;
        }
        if is_explicit_path(name) {
            let path = PathBuf::from(name);
            return path.exists().then_some(path);
        }
        self.settings
            .propath
            .iter()
            .map(|dir| dir.join(name))
            .find(|candidate| candidate.exists())
    }

    /// Locates the `.cls` file of a qualified class name on the propath.
    pub fn find_file_for_class_name(&self, class_name: &str) -> Option<PathBuf> {
        self.find_file(&ClassFinder::class_file_name(class_name))
    }
}

fn is_explicit_path(name: &str) -> bool {
    let bytes = name.as_bytes();
    Path::new(name).is_absolute()
        || matches!(bytes.first(), Some(b'.' | b'/' | b'\\'))
        || bytes.get(1) == Some(&b':')
}

impl TypeInfoProvider for Session {
    fn type_info(&self, name: &str) -> Option<Arc<dyn TypeInfo>> {
        self.types.type_info(name)
    }

    fn type_info_ci(&self, name: &str) -> Option<Arc<dyn TypeInfo>> {
        self.types.type_info_ci(name)
    }

    fn classes_in_package(&self, package: &str) -> Vec<String> {
        self.types.classes_in_package(package)
    }
}
