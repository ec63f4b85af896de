//! Options the dictionary manager consumes, readable from a JSON file.
//!
//! ```json
//! {
//!   "main_dictionary": "main2012.dic",
//!   "quantifier_dictionary": "quantifier.dic",
//!   "ext_dictionaries": ["ext.dic"],
//!   "ext_stop_word_dictionaries": ["stopword.dic"],
//!   "dictionary_disabled": false,
//!   "reload": { "initial_delay_minutes": 1, "period_minutes": 10 }
//! }
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_MAIN_DICTIONARY: &str = "main2012.dic";
pub const DEFAULT_QUANTIFIER_DICTIONARY: &str = "quantifier.dic";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Built-in main lexicon; read once, never reloaded.
    pub main_dictionary: String,
    /// Mandatory quantifier lexicon.
    pub quantifier_dictionary: String,
    pub ext_dictionaries: Vec<String>,
    pub ext_stop_word_dictionaries: Vec<String>,
    /// Skip the built-in main lexicon, leaving only extensions.
    pub dictionary_disabled: bool,
    pub reload: Option<ReloadInterval>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            main_dictionary: DEFAULT_MAIN_DICTIONARY.to_string(),
            quantifier_dictionary: DEFAULT_QUANTIFIER_DICTIONARY.to_string(),
            ext_dictionaries: Vec::new(),
            ext_stop_word_dictionaries: Vec::new(),
            dictionary_disabled: false,
            reload: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReloadInterval {
    pub initial_delay_minutes: u64,
    pub period_minutes: u64,
}

impl ReloadInterval {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_minutes.saturating_mul(60))
    }

    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period_minutes.saturating_mul(60))
    }
}

impl Config {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Config = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.quantifier_dictionary.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "quantifier_dictionary must name a source".to_string(),
            ));
        }
        if let Some(reload) = &self.reload {
            if reload.period_minutes == 0 {
                return Err(Error::InvalidConfig(
                    "reload.period_minutes must be at least 1".to_string(),
                ));
            }
        }
        Ok(())
    }
}
