/// Tone patterns: the short/long beep sequences played for each cue.
///
/// Patterns are written in config as strings of symbols, e.g. `"SS"` or `"SLL"`:
///   - `S` = short tone
///   - `L` = long tone
///
/// Symbols are case-insensitive. An empty string is a valid pattern meaning
/// "no cue"; the audio worker ignores it.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single tone in a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToneSymbol {
    Short,
    Long,
}

impl ToneSymbol {
    pub fn as_char(self) -> char {
        match self {
            ToneSymbol::Short => 'S',
            ToneSymbol::Long => 'L',
        }
    }
}

impl TryFrom<char> for ToneSymbol {
    type Error = PatternError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c.to_ascii_uppercase() {
            'S' => Ok(ToneSymbol::Short),
            'L' => Ok(ToneSymbol::Long),
            _ => Err(PatternError::UnknownSymbol(c)),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("unknown tone symbol '{0}' (expected 'S' or 'L')")]
    UnknownSymbol(char),
}

/// Ordered sequence of tone symbols played back-to-back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TonePattern(Vec<ToneSymbol>);

impl TonePattern {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn symbols(&self) -> &[ToneSymbol] {
        &self.0
    }
}

impl FromStr for TonePattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .chars()
            .map(ToneSymbol::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl TryFrom<String> for TonePattern {
    type Error = PatternError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TonePattern> for String {
    fn from(value: TonePattern) -> Self {
        value.to_string()
    }
}

impl fmt::Display for TonePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for symbol in &self.0 {
            write!(f, "{}", symbol.as_char())?;
        }
        Ok(())
    }
}
