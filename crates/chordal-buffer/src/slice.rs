//! Attributed text slices.
//!
//! A `TextSlice` is what a buffer hands out when a range is read and
//! what it accepts when a range is replaced. Besides the characters it
//! carries attribute runs, so restoring a slice restores formatting too.
//!
//! Runs are kept canonical: sorted, non-overlapping, non-empty, and
//! adjacent runs with equal attributes merged. Two slices that describe
//! the same attributed text therefore compare equal.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{BufferError, BufferResult};

/// Attribute map attached to a run of characters (e.g. `"weight" => "bold"`).
pub type Attributes = BTreeMap<String, String>;

/// A run of characters sharing one set of attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeRun {
    /// Offset of the first character, relative to the owner
    pub start: usize,
    /// Number of characters in the run
    pub len: usize,
    /// Attributes applied to every character of the run
    pub attrs: Attributes,
}

impl AttributeRun {
    /// Creates a new run.
    pub fn new(start: usize, len: usize, attrs: Attributes) -> Self {
        Self { start, len, attrs }
    }

    /// Exclusive end offset.
    #[inline]
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Text plus attribute runs.
///
/// ## Learning: Clone vs Copy
///
/// `TextSlice` owns a `String` and a `Vec`, so it is `Clone` but not
/// `Copy`. Edits clone slices when building their inverse.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextSlice {
    text: String,
    runs: Vec<AttributeRun>,
}

impl TextSlice {
    /// Creates an empty slice.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a slice without attributes.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            runs: Vec::new(),
        }
    }

    /// Creates a slice whose characters all share `attrs`.
    pub fn styled(text: impl Into<String>, attrs: Attributes) -> Self {
        let text = text.into();
        let len = text.chars().count();
        Self {
            text,
            runs: normalize_runs(vec![AttributeRun::new(0, len, attrs)]),
        }
    }

    /// Creates a slice from text and explicit runs.
    ///
    /// Runs must lie inside the text and must not overlap.
    pub fn with_runs(text: impl Into<String>, runs: Vec<AttributeRun>) -> BufferResult<Self> {
        let text = text.into();
        let len = text.chars().count();

        let mut sorted = runs;
        sorted.sort_by_key(|run| run.start);
        let mut previous_end = 0;
        for run in &sorted {
            if run.end() > len {
                return Err(BufferError::InvalidAttributeRun {
                    start: run.start,
                    len: run.len,
                    text_len: len,
                });
            }
            if run.start < previous_end {
                return Err(BufferError::OverlappingRuns { at: run.start });
            }
            previous_end = run.end();
        }

        Ok(Self {
            text,
            runs: normalize_runs(sorted),
        })
    }

    /// Returns the characters of the slice.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the attribute runs (canonical form).
    #[inline]
    pub fn runs(&self) -> &[AttributeRun] {
        &self.runs
    }

    /// Returns the number of characters.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    /// Returns true if the slice holds no characters.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Returns the attributes at a character offset, if any apply.
    pub fn attributes_at(&self, offset: usize) -> Option<&Attributes> {
        self.runs
            .iter()
            .find(|run| offset >= run.start && offset < run.end())
            .map(|run| &run.attrs)
    }

    /// Splits the slice into its parts.
    pub(crate) fn into_parts(self) -> (String, Vec<AttributeRun>) {
        (self.text, self.runs)
    }

    /// Builds a slice from parts already known to be canonical.
    pub(crate) fn from_parts(text: String, runs: Vec<AttributeRun>) -> Self {
        Self {
            text,
            runs: normalize_runs(runs),
        }
    }
}

impl From<&str> for TextSlice {
    fn from(text: &str) -> Self {
        Self::plain(text)
    }
}

impl From<String> for TextSlice {
    fn from(text: String) -> Self {
        Self::plain(text)
    }
}

impl From<char> for TextSlice {
    fn from(c: char) -> Self {
        Self::plain(c.to_string())
    }
}

impl std::fmt::Display for TextSlice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Sorts runs, drops empty ones and merges adjacent equal neighbours.
pub(crate) fn normalize_runs(mut runs: Vec<AttributeRun>) -> Vec<AttributeRun> {
    runs.retain(|run| run.len > 0 && !run.attrs.is_empty());
    runs.sort_by_key(|run| run.start);

    let mut merged: Vec<AttributeRun> = Vec::with_capacity(runs.len());
    for run in runs {
        match merged.last_mut() {
            Some(last) if last.end() == run.start && last.attrs == run.attrs => {
                last.len += run.len;
            }
            _ => merged.push(run),
        }
    }
    merged
}
