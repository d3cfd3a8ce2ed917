//! Batch driver that loads cached parse units or builds them.
//!
//! Every unit gets its own tracker, resolver and cache record; the session
//! (schema, type metadata, settings) is shared between them.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use abl_core::persistence::ParseUnitBinary;
use abl_core::unit::{UnitContext, UnitParser};
use abl_core::Session;

/// What happened to one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOutcome {
    /// Read from an up-to-date artifact
    Loaded,
    /// Parsed and written to the cache
    Built,
    /// Parsed with the cache disabled
    Parsed,
    /// Parse or write failed
    Failed(String),
}

/// Counters accumulated over every run of a [`BatchRunner`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub loaded: usize,
    pub built: usize,
    pub parsed: usize,
    pub failed: usize,
}

impl BatchStats {
    fn record(&mut self, outcome: &UnitOutcome) {
        match outcome {
            UnitOutcome::Loaded => self.loaded += 1,
            UnitOutcome::Built => self.built += 1,
            UnitOutcome::Parsed => self.parsed += 1,
            UnitOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// Result of one [`BatchRunner::run`].
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// Outcomes in input order
    pub outcomes: Vec<(PathBuf, UnitOutcome)>,
    pub elapsed: Duration,
}

impl BatchReport {
    fn count(&self, pred: impl Fn(&UnitOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }

    pub fn loaded(&self) -> usize {
        self.count(|o| *o == UnitOutcome::Loaded)
    }

    pub fn built(&self) -> usize {
        self.count(|o| *o == UnitOutcome::Built)
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, UnitOutcome::Failed(_)))
    }

    /// Units that failed, with their error messages.
    pub fn failures(&self) -> impl Iterator<Item = (&Path, &str)> + '_ {
        self.outcomes.iter().filter_map(|(path, o)| match o {
            UnitOutcome::Failed(msg) => Some((path.as_path(), msg.as_str())),
            _ => None,
        })
    }
}

/// Processes many compilation units against one session.
pub struct BatchRunner {
    session: Arc<Session>,
    parser: Arc<dyn UnitParser>,
    stats: Mutex<BatchStats>,
}

impl std::fmt::Debug for BatchRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchRunner")
            .field("stats", &*self.stats.lock())
            .finish()
    }
}

impl BatchRunner {
    pub fn new(session: Arc<Session>, parser: Arc<dyn UnitParser>) -> Self {
        Self {
            session,
            parser,
            stats: Mutex::new(BatchStats::default()),
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Counters over every run so far.
    pub fn stats(&self) -> BatchStats {
        *self.stats.lock()
    }

    /// Loads or builds every unit.
    ///
    /// A failing unit is reported in the outcome list and does not stop
    /// the others.
    pub fn run<P: AsRef<Path> + Sync>(&self, paths: &[P]) -> BatchReport {
        let start = Instant::now();

        #[cfg(feature = "parallel")]
        let outcomes = self.run_parallel(paths);
        #[cfg(not(feature = "parallel"))]
        let outcomes = self.run_sequential(paths);

        let report = BatchReport {
            outcomes,
            elapsed: start.elapsed(),
        };
        tracing::debug!(
            "Batch of {} units: {} loaded, {} built, {} failed in {:?}",
            report.outcomes.len(),
            report.loaded(),
            report.built(),
            report.failed(),
            report.elapsed
        );
        report
    }

    /// Process units sequentially
    #[allow(dead_code)]
    fn run_sequential<P: AsRef<Path>>(&self, paths: &[P]) -> Vec<(PathBuf, UnitOutcome)> {
        paths
            .iter()
            .map(|path| self.process(path.as_ref()))
            .collect()
    }

    /// Process units in parallel using Rayon
    #[cfg(feature = "parallel")]
    fn run_parallel<P: AsRef<Path> + Sync>(&self, paths: &[P]) -> Vec<(PathBuf, UnitOutcome)> {
        use rayon::prelude::*;

        // Indexed parallel collect keeps input order
        paths
            .par_iter()
            .map(|path| self.process(path.as_ref()))
            .collect()
    }

    fn process(&self, path: &Path) -> (PathBuf, UnitOutcome) {
        let outcome = if self.session.cache_config().enabled {
            self.load_or_build(path)
        } else {
            self.parse_only(path)
        };
        if let UnitOutcome::Failed(msg) = &outcome {
            tracing::warn!("Unit {} failed: {}", path.display(), msg);
        }
        self.stats.lock().record(&outcome);
        (path.to_path_buf(), outcome)
    }

    fn load_or_build(&self, path: &Path) -> UnitOutcome {
        let mut unit_pub = ParseUnitBinary::new(&self.session, path);
        if unit_pub.load().is_ok() {
            return UnitOutcome::Loaded;
        }
        match unit_pub.build(self.parser.as_ref()) {
            Ok(_) => UnitOutcome::Built,
            Err(e) => UnitOutcome::Failed(e.to_string()),
        }
    }

    fn parse_only(&self, path: &Path) -> UnitOutcome {
        let mut ctx = UnitContext::new(&self.session, path);
        match self.parser.parse(&mut ctx) {
            Ok(_) => UnitOutcome::Parsed,
            Err(e) => UnitOutcome::Failed(e.to_string()),
        }
    }
}
