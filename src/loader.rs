//! Source ingestion bookkeeping.
//!
//! `LoadState` remembers, across cycles, which entries each reloadable
//! lexicon has already taken in and when each tracked source last changed.
//! It is only touched by load cycles, which the dictionary serializes.

use std::collections::{HashMap, HashSet};
use std::io::BufRead;
use std::time::SystemTime;

use crate::error::Error;
use crate::segment::Segment;
use crate::source::DictSource;

/// The lexicons a dictionary owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lexicon {
    Main,
    StopWord,
    Quantifier,
}

impl Lexicon {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lexicon::Main => "main",
            Lexicon::StopWord => "stopword",
            Lexicon::Quantifier => "quantifier",
        }
    }
}

/// What one source contributed during a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLoad {
    pub id: String,
    pub lexicon: Lexicon,
    /// Entries not seen before, in file order.
    pub added: Vec<String>,
    pub modified: Option<SystemTime>,
}

/// Outcome of one load cycle. Per-source failures land in `errors`; they
/// never abort the cycle.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: Vec<SourceLoad>,
    /// Sources whose timestamp had not advanced.
    pub skipped: Vec<String>,
    pub errors: Vec<Error>,
}

impl LoadReport {
    pub fn added_count(&self) -> usize {
        self.loaded.iter().map(|l| l.added.len()).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Default)]
pub(crate) struct LoadState {
    last_modified: HashMap<String, SystemTime>,
    main_entries: HashSet<String>,
    stop_entries: HashSet<String>,
    /// Set once the first cycle has finished; freshness checks start after.
    initialized: bool,
}

/// Normalizes one source line into an entry, or `None` for blank lines.
pub fn normalize_entry(line: &str) -> Option<String> {
    let word = line.trim_start_matches('\u{feff}').trim();
    if word.is_empty() {
        None
    } else {
        Some(word.to_lowercase())
    }
}

impl LoadState {
    pub(crate) fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub(crate) fn mark_initialized(&mut self) {
        self.initialized = true;
    }

    pub(crate) fn ingested(&self, lexicon: Lexicon) -> usize {
        match lexicon {
            Lexicon::Main => self.main_entries.len(),
            Lexicon::StopWord => self.stop_entries.len(),
            Lexicon::Quantifier => 0,
        }
    }

    fn seen_mut(&mut self, lexicon: Lexicon) -> Option<&mut HashSet<String>> {
        match lexicon {
            Lexicon::Main => Some(&mut self.main_entries),
            Lexicon::StopWord => Some(&mut self.stop_entries),
            Lexicon::Quantifier => None,
        }
    }

    /// Loads a source without freshness tracking. Used for the built-in main
    /// lexicon, which is read once.
    pub(crate) fn load_builtin(
        &mut self,
        source: &dyn DictSource,
        id: &str,
        lexicon: Lexicon,
        segment: &Segment,
        report: &mut LoadReport,
    ) {
        let modified = source.last_modified(id);
        let Some(reader) = open_or_report(source, id, report) else {
            return;
        };
        let seen = self.seen_mut(lexicon);
        let added = ingest(reader, id, segment, seen, report);
        tracing::info!(
            source = id,
            lexicon = lexicon.as_str(),
            added = added.len(),
            "dictionary source loaded"
        );
        report.loaded.push(SourceLoad {
            id: id.to_string(),
            lexicon,
            added,
            modified,
        });
    }

    /// Loads an extension source, skipping it when its timestamp has not
    /// advanced since the previous cycle.
    pub(crate) fn load_tracked(
        &mut self,
        source: &dyn DictSource,
        id: &str,
        lexicon: Lexicon,
        segment: &Segment,
        report: &mut LoadReport,
    ) {
        // Stamped before opening: a source replaced in between is read again
        // next cycle rather than recorded as already seen.
        // Unknown timestamps read as the epoch: loaded once, then left alone.
        let modified = source.last_modified(id).unwrap_or(SystemTime::UNIX_EPOCH);
        let Some(reader) = open_or_report(source, id, report) else {
            return;
        };
        if self.initialized {
            if let Some(&previous) = self.last_modified.get(id) {
                if modified <= previous {
                    tracing::debug!(source = id, "dictionary source unchanged, skipping");
                    report.skipped.push(id.to_string());
                    return;
                }
            }
        }

        let reloading = self.initialized;
        let seen = self.seen_mut(lexicon);
        let added = ingest(reader, id, segment, seen, report);
        self.last_modified.insert(id.to_string(), modified);

        if reloading && !added.is_empty() {
            tracing::info!(
                source = id,
                lexicon = lexicon.as_str(),
                modified = ?modified,
                entries = %added.join(";"),
                "dictionary source updated"
            );
        } else {
            tracing::info!(
                source = id,
                lexicon = lexicon.as_str(),
                added = added.len(),
                "dictionary source loaded"
            );
        }
        report.loaded.push(SourceLoad {
            id: id.to_string(),
            lexicon,
            added,
            modified: Some(modified),
        });
    }
}

fn open_or_report<'s>(
    source: &'s dyn DictSource,
    id: &str,
    report: &mut LoadReport,
) -> Option<crate::source::SourceReader<'s>> {
    match source.open(id) {
        Ok(Some(reader)) => Some(reader),
        Ok(None) => {
            tracing::warn!(source = id, "dictionary source not found, skipping");
            report.errors.push(Error::SourceUnavailable {
                id: id.to_string(),
                source: None,
            });
            None
        }
        Err(e) => {
            tracing::warn!(source = id, error = %e, "dictionary source unavailable, skipping");
            report.errors.push(Error::SourceUnavailable {
                id: id.to_string(),
                source: Some(e),
            });
            None
        }
    }
}

/// Reads `reader` line by line into `segment`. Each line is read before the
/// trie is locked for its insertion, so a slow source never stalls readers.
///
/// With a `seen` set, entries already ingested are neither re-inserted nor
/// reported. Entries read before an I/O error stay in the trie.
pub(crate) fn ingest<R: BufRead>(
    reader: R,
    id: &str,
    segment: &Segment,
    mut seen: Option<&mut HashSet<String>>,
    report: &mut LoadReport,
) -> Vec<String> {
    let mut added = Vec::new();
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(source = id, error = %e, "dictionary source read failed");
                report.errors.push(Error::SourceRead {
                    id: id.to_string(),
                    source: e,
                });
                break;
            }
        };
        let Some(word) = normalize_entry(&line) else {
            continue;
        };
        match seen.as_deref_mut() {
            Some(seen) => {
                if seen.contains(&word) {
                    continue;
                }
                segment.fill(word.chars());
                seen.insert(word.clone());
                added.push(word);
            }
            None => {
                if segment.fill(word.chars()) {
                    added.push(word);
                }
            }
        }
    }
    added
}
