//! The ordered list of sequence files that make up a run.
//!
//! Grounded on `sequence_files`/`freadlines` in the original C player,
//! which owns the show as a first-class list rather than an inline
//! `Vec<String>` in `main`, including its blank-line/comment-skipping
//! convention.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// How many times the show repeats once every entry has played once.
///
/// Replaces the original's `-1`-means-forever sentinel on `show_loop_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopCount {
    Infinite,
    Finite(u32),
}

impl LoopCount {
    /// Parses a CLI value: `"i"` (case-insensitive) for infinite, otherwise
    /// a positive integer.
    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        if s.eq_ignore_ascii_case("i") {
            return Ok(LoopCount::Infinite);
        }
        match s.parse::<u32>() {
            Ok(0) => Err("loop count must be positive, or \"i\" for infinite".to_string()),
            Ok(n) => Ok(LoopCount::Finite(n)),
            Err(_) => Err(format!("{s:?} is not a positive integer or \"i\"")),
        }
    }
}

/// The ordered, loop-aware list of sequence paths read from a show file.
#[derive(Debug, Clone)]
pub struct Show {
    entries: Vec<PathBuf>,
    loop_count: LoopCount,
    position: usize,
    completed_loops: u32,
}

impl Show {
    /// Reads `path`, one sequence path per line; blank lines and lines
    /// starting with `#` are skipped. Rejects a show with zero surviving
    /// entries (`Error::EmptyShow`).
    pub fn load(path: &Path, loop_count: LoopCount) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let entries: Vec<PathBuf> = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(PathBuf::from)
            .collect();

        if entries.is_empty() {
            return Err(Error::EmptyShow {
                path: path.to_path_buf(),
            });
        }

        Ok(Self {
            entries,
            loop_count,
            position: 0,
            completed_loops: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the next sequence path to play, advancing internal position,
    /// wrapping back to the start while the loop budget allows it, and
    /// returning `None` once the show has fully played out (`player_advance`,
    /// the loop budget runs out).
    pub fn next_sequence(&mut self) -> Option<&Path> {
        if self.position >= self.entries.len() {
            match self.loop_count {
                LoopCount::Infinite => {
                    self.position = 0;
                }
                LoopCount::Finite(n) => {
                    self.completed_loops += 1;
                    if self.completed_loops >= n {
                        return None;
                    }
                    self.position = 0;
                }
            }
        }

        let path = self.entries[self.position].as_path();
        self.position += 1;
        Some(path)
    }
}
