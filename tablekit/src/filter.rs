//! Fuzzy text filtering over arbitrary row shapes.
//!
//! Filtering matches what the user sees: only columns that are currently
//! visible contribute candidate text, and a row passes when any of its
//! visible values fuzzy-matches the query.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use nucleo_matcher::pattern::{AtomKind, CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Config, Matcher, Utf32Str};

use crate::column::ColumnSpec;

/// Scoring contract for fuzzy matching.
///
/// `None` means no match; `Some(score)` means the needle matched with
/// the given quality (higher is better).
pub trait FuzzyMatcher: Send + Sync {
    fn score(&self, haystack: &str, needle: &str) -> Option<u32>;
}

/// Default matcher backed by nucleo.
pub struct NucleoMatcher {
    inner: Mutex<Matcher>,
}

impl NucleoMatcher {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Matcher::new(Config::DEFAULT)),
        }
    }
}

impl Default for NucleoMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl FuzzyMatcher for NucleoMatcher {
    fn score(&self, haystack: &str, needle: &str) -> Option<u32> {
        let pattern = Pattern::new(
            needle,
            CaseMatching::Ignore,
            Normalization::Smart,
            AtomKind::Fuzzy,
        );
        let mut buf = Vec::new();
        let haystack = Utf32Str::new(haystack, &mut buf);
        let mut matcher = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        pattern.score(haystack, &mut matcher)
    }
}

/// Row-visibility predicate registered with the grid engine.
///
/// Cheap to clone; clones share the wiring latch, so the copy handed to
/// the engine and the one held by the table core agree on readiness.
pub struct FuzzyFilterPredicate<T> {
    columns: Arc<[ColumnSpec<T>]>,
    matcher: Arc<dyn FuzzyMatcher>,
    wired: Arc<AtomicBool>,
    pending_refilter: Arc<AtomicBool>,
}

impl<T> Clone for FuzzyFilterPredicate<T> {
    fn clone(&self) -> Self {
        Self {
            columns: Arc::clone(&self.columns),
            matcher: Arc::clone(&self.matcher),
            wired: Arc::clone(&self.wired),
            pending_refilter: Arc::clone(&self.pending_refilter),
        }
    }
}

impl<T> FuzzyFilterPredicate<T> {
    pub fn new(columns: Vec<ColumnSpec<T>>, matcher: Arc<dyn FuzzyMatcher>) -> Self {
        Self {
            columns: columns.into(),
            matcher,
            wired: Arc::new(AtomicBool::new(false)),
            pending_refilter: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Decide whether a row stays visible under the current query.
    ///
    /// An empty query always passes. Before the engine has finished
    /// wiring its filter pass, everything passes and a re-filter is
    /// flagged for when wiring completes; hiding rows during the startup
    /// race would flash an empty table.
    pub fn matches(&self, row: &T, visible_column_ids: &[String], query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        if !self.wired.load(Ordering::SeqCst) {
            self.pending_refilter.store(true, Ordering::SeqCst);
            return true;
        }

        let needle = query.to_lowercase();
        self.columns
            .iter()
            .filter(|spec| visible_column_ids.iter().any(|id| id == spec.id()))
            .filter_map(|spec| (spec.accessor)(row).searchable_text())
            .any(|text| self.matcher.score(&text.to_lowercase(), &needle).is_some())
    }

    /// Mark the engine's filter pass as wired. Returns `true` when a
    /// re-filter was deferred while unwired and should run now.
    pub fn mark_wired(&self) -> bool {
        self.wired.store(true, Ordering::SeqCst);
        self.pending_refilter.swap(false, Ordering::SeqCst)
    }

    pub fn is_wired(&self) -> bool {
        self.wired.load(Ordering::SeqCst)
    }
}
