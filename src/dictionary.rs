//! Dictionary manager: owns the main, stop-word and quantifier lexicons.
//!
//! A [`Dictionary`] is an ordinary value held behind an `Arc`; construct one
//! with [`Dictionary::open`] and share it. For hosts that want a single
//! process-wide instance, [`initialize`] and [`instance`] wrap the same
//! constructor with one-time initialization.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::hit::Hit;
use crate::loader::{self, Lexicon, LoadReport, LoadState};
use crate::reload;
use crate::segment::Segment;
use crate::source::DictSource;

pub struct Dictionary {
    config: Config,
    source: Arc<dyn DictSource>,
    main: Segment,
    stop_words: Segment,
    quantifiers: Segment,
    loader: Mutex<LoadState>,
}

impl Dictionary {
    /// Builds all three lexicons and, when `config.reload` is set, starts the
    /// periodic refresh.
    ///
    /// Missing main or extension sources leave their lexicon short; only a
    /// missing quantifier source fails construction.
    pub fn open(config: Config, source: Arc<dyn DictSource>) -> Result<Arc<Self>> {
        config.validate()?;
        let dict = Arc::new(Dictionary {
            config,
            source,
            main: Segment::new(),
            stop_words: Segment::new(),
            quantifiers: Segment::new(),
            loader: Mutex::new(LoadState::default()),
        });

        {
            let mut state = dict.loader.lock();
            let mut report = LoadReport::default();
            dict.load_main(&mut state, &mut report);
            dict.load_stop_words(&mut state, &mut report);
            dict.load_quantifiers()?;
            state.mark_initialized();
            tracing::info!(
                main = state.ingested(Lexicon::Main),
                stop_words = state.ingested(Lexicon::StopWord),
                errors = report.errors.len(),
                "dictionary loaded"
            );
        }

        if let Some(interval) = dict.config.reload {
            dict.schedule_reload(interval.initial_delay(), interval.period())
                .map_err(Error::ReloadThread)?;
        }
        Ok(dict)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn lexicon(&self, lexicon: Lexicon) -> &Segment {
        match lexicon {
            Lexicon::Main => &self.main,
            Lexicon::StopWord => &self.stop_words,
            Lexicon::Quantifier => &self.quantifiers,
        }
    }

    pub fn match_main(&self, buffer: &[char], begin: usize, length: usize) -> Hit {
        self.main.match_at(buffer, begin, length)
    }

    /// Matches the whole buffer against the main lexicon.
    pub fn match_main_all(&self, buffer: &[char]) -> Hit {
        self.main.match_at(buffer, 0, buffer.len())
    }

    /// Extends `prior` by the single character at `index`.
    pub fn resume(&self, buffer: &[char], index: usize, prior: &Hit) -> Hit {
        self.main.match_from(buffer, index, 1, prior)
    }

    pub fn match_quantifier(&self, buffer: &[char], begin: usize, length: usize) -> Hit {
        self.quantifiers.match_at(buffer, begin, length)
    }

    pub fn match_stop_word(&self, buffer: &[char], begin: usize, length: usize) -> Hit {
        self.stop_words.match_at(buffer, begin, length)
    }

    pub fn is_stop_word(&self, buffer: &[char], begin: usize, length: usize) -> bool {
        self.match_stop_word(buffer, begin, length).is_match()
    }

    /// Inserts entries into the main lexicon after trimming and lower-casing.
    pub fn add_words<I, S>(&self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for word in words {
            if let Some(word) = loader::normalize_entry(word.as_ref()) {
                self.main.fill(word.chars());
            }
        }
    }

    /// Soft-deletes entries from the main lexicon.
    pub fn disable_words<I, S>(&self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for word in words {
            if let Some(word) = loader::normalize_entry(word.as_ref()) {
                self.main.disable(word.chars());
            }
        }
    }

    /// Runs one refresh of the main and stop-word extension sources.
    ///
    /// Cycles are serialized; a call made while another cycle runs waits for
    /// it. Per-source problems are returned in the report, never as a failure.
    pub fn reload(&self) -> LoadReport {
        let mut state = self.loader.lock();
        let mut report = LoadReport::default();
        self.load_main(&mut state, &mut report);
        self.load_stop_words(&mut state, &mut report);
        tracing::debug!(
            loaded = report.loaded.len(),
            skipped = report.skipped.len(),
            added = report.added_count(),
            "dictionary reload cycle finished"
        );
        report
    }

    /// Starts a background thread that calls [`reload`](Self::reload) after
    /// `initial_delay` and then every `period`, measured from the end of the
    /// previous cycle. The thread exits once the dictionary is dropped.
    pub fn schedule_reload(
        self: &Arc<Self>,
        initial_delay: Duration,
        period: Duration,
    ) -> std::io::Result<std::thread::JoinHandle<()>> {
        reload::spawn(Arc::downgrade(self), initial_delay, period)
    }

    pub fn ingested_main_count(&self) -> usize {
        self.loader.lock().ingested(Lexicon::Main)
    }

    pub fn ingested_stop_word_count(&self) -> usize {
        self.loader.lock().ingested(Lexicon::StopWord)
    }

    fn load_main(&self, state: &mut LoadState, report: &mut LoadReport) {
        let source = self.source.as_ref();
        if !state.is_initialized() && !self.config.dictionary_disabled {
            state.load_builtin(source, &self.config.main_dictionary, Lexicon::Main, &self.main, report);
        }
        for id in &self.config.ext_dictionaries {
            state.load_tracked(source, id, Lexicon::Main, &self.main, report);
        }
    }

    fn load_stop_words(&self, state: &mut LoadState, report: &mut LoadReport) {
        let source = self.source.as_ref();
        for id in &self.config.ext_stop_word_dictionaries {
            state.load_tracked(source, id, Lexicon::StopWord, &self.stop_words, report);
        }
    }

    fn load_quantifiers(&self) -> Result<()> {
        let id = &self.config.quantifier_dictionary;
        let reader = match self.source.open(id) {
            Ok(Some(reader)) => reader,
            Ok(None) => {
                return Err(Error::MissingRequiredSource {
                    id: id.clone(),
                    source: None,
                })
            }
            Err(e) => {
                tracing::error!(source = %id, error = %e, "quantifier dictionary unavailable");
                return Err(Error::MissingRequiredSource {
                    id: id.clone(),
                    source: Some(e),
                });
            }
        };
        let mut report = LoadReport::default();
        let added = loader::ingest(reader, id, &self.quantifiers, None, &mut report);
        tracing::info!(source = %id, added = added.len(), "quantifier dictionary loaded");
        Ok(())
    }
}

/// Lifecycle of the process-wide instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitState {
    Uninitialized,
    Initializing,
    Ready,
}

const UNINITIALIZED: u8 = 0;
const INITIALIZING: u8 = 1;
const READY: u8 = 2;

static INSTANCE: OnceLock<Arc<Dictionary>> = OnceLock::new();
static INIT_LOCK: Mutex<()> = parking_lot::const_mutex(());
static STATE: AtomicU8 = AtomicU8::new(UNINITIALIZED);

/// Builds the process-wide dictionary on first call.
///
/// Concurrent callers wait for the first construction and receive the same
/// instance; later calls ignore their arguments. A failed construction
/// leaves the state uninitialized so a later call may retry.
pub fn initialize(config: Config, source: Arc<dyn DictSource>) -> Result<Arc<Dictionary>> {
    if let Some(dict) = INSTANCE.get() {
        return Ok(Arc::clone(dict));
    }
    let _guard = INIT_LOCK.lock();
    if let Some(dict) = INSTANCE.get() {
        return Ok(Arc::clone(dict));
    }

    STATE.store(INITIALIZING, Ordering::Release);
    tracing::info!("initializing dictionary");
    match Dictionary::open(config, source) {
        Ok(dict) => {
            let dict = Arc::clone(INSTANCE.get_or_init(|| dict));
            STATE.store(READY, Ordering::Release);
            Ok(dict)
        }
        Err(e) => {
            STATE.store(UNINITIALIZED, Ordering::Release);
            Err(e)
        }
    }
}

/// The process-wide dictionary, or [`Error::Uninitialized`].
pub fn instance() -> Result<Arc<Dictionary>> {
    INSTANCE.get().cloned().ok_or(Error::Uninitialized)
}

pub fn state() -> InitState {
    match STATE.load(Ordering::Acquire) {
        READY => InitState::Ready,
        INITIALIZING => InitState::Initializing,
        _ => InitState::Uninitialized,
    }
}
