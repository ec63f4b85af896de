//! # ikdict
//!
//! Trie lexicons for Chinese word segmentation: a main word dictionary, a
//! stop-word dictionary and a quantifier dictionary, with resumable
//! substring matching and hot reload of extension sources while matching
//! continues on other threads.
//!
//! ```
//! use std::sync::Arc;
//! use ikdict::{Config, Dictionary, HitStatus, MemorySource};
//!
//! let source = Arc::new(MemorySource::with([
//!     ("main2012.dic", "中国\n中国人\n人"),
//!     ("quantifier.dic", "个"),
//! ]));
//! let dict = Dictionary::open(Config::default(), source).unwrap();
//!
//! let text: Vec<char> = "中国人".chars().collect();
//! assert_eq!(dict.match_main(&text, 0, 2).status(), HitStatus::MATCH_PREFIX);
//! assert_eq!(dict.match_main(&text, 0, 3).status(), HitStatus::MATCH_EXACT);
//! ```

pub mod config;
pub mod dictionary;
pub mod error;
pub mod hit;
pub mod loader;
mod reload;
pub mod segment;
pub mod source;

pub use config::{Config, ReloadInterval};
pub use dictionary::{initialize, instance, state, Dictionary, InitState};
pub use error::{Error, Result};
pub use hit::{Hit, HitStatus, NodeRef};
pub use loader::{normalize_entry, Lexicon, LoadReport, SourceLoad};
pub use segment::Segment;
pub use source::{DictSource, FsSource, MemorySource, SourceReader};
