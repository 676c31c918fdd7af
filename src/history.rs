//! Linear undo/redo log over immutable raster snapshots.
//!
//! The cursor is `-1` while the original image is shown and `k` while
//! `entries()[k]` is shown. Recording while the cursor sits before the last
//! entry drops every later entry first, so the log never branches.
//! Navigation only moves the cursor; no edit is ever replayed.

use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

use crate::{
    color::Color,
    raster::Raster,
    replace::{ColorReplacement, Tolerance},
};

/// Cursor value of the untouched original image.
pub const ORIGINAL: isize = -1;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryError {
    #[error("history index {index} out of range (-1..{len})")]
    OutOfRange { index: isize, len: usize },
}

/// Process-wide, strictly increasing edit identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EditId(u64);

static NEXT_EDIT_ID: AtomicU64 = AtomicU64::new(1);

impl EditId {
    fn next() -> Self {
        Self(NEXT_EDIT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EditId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "edit-{}", self.0)
    }
}

/// One recorded replacement and the raster it produced. Immutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOperation {
    id: EditId,
    params: ColorReplacement,
    result: Raster,
    created_at: DateTime<Utc>,
}

impl EditOperation {
    pub fn new(params: ColorReplacement, result: Raster) -> Self {
        Self {
            id: EditId::next(),
            params,
            result,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> EditId {
        self.id
    }

    /// The colour that was matched.
    pub fn source_color(&self) -> Color {
        self.params.target
    }

    /// The colour it was replaced with.
    pub fn target_color(&self) -> Color {
        self.params.replacement
    }

    pub fn tolerance(&self) -> Tolerance {
        self.params.tolerance
    }

    pub fn params(&self) -> &ColorReplacement {
        &self.params
    }

    pub fn result(&self) -> &Raster {
        &self.result
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistoryConfig {
    /// Oldest entries are evicted past this many. `None` keeps everything.
    pub max_entries: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct EditHistory {
    original: Raster,
    entries: Vec<EditOperation>,
    cursor: isize,
    config: HistoryConfig,
}

impl EditHistory {
    pub fn new(original: Raster) -> Self {
        Self::with_config(original, HistoryConfig::default())
    }

    pub fn with_config(original: Raster, config: HistoryConfig) -> Self {
        Self {
            original,
            entries: Vec::new(),
            cursor: ORIGINAL,
            config,
        }
    }

    pub fn config(&self) -> HistoryConfig {
        self.config
    }

    pub fn original(&self) -> &Raster {
        &self.original
    }

    pub fn entries(&self) -> &[EditOperation] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> isize {
        self.cursor
    }

    /// Raster at the cursor.
    pub fn current(&self) -> &Raster {
        self.current_edit()
            .map(EditOperation::result)
            .unwrap_or(&self.original)
    }

    /// Edit at the cursor, `None` while the original is shown.
    pub fn current_edit(&self) -> Option<&EditOperation> {
        usize::try_from(self.cursor)
            .ok()
            .and_then(|i| self.entries.get(i))
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > ORIGINAL
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len() as isize
    }

    /// Append `op` after the cursor, discarding any redo branch, and make it current.
    pub fn record(&mut self, op: EditOperation) {
        let keep = (self.cursor + 1) as usize;
        if keep < self.entries.len() {
            debug!(
                dropped = self.entries.len() - keep,
                cursor = self.cursor,
                "truncating redo branch"
            );
            self.entries.truncate(keep);
        }

        debug!(id = %op.id(), "recording edit");
        self.entries.push(op);

        if let Some(max) = self.config.max_entries {
            let max = max.max(1);
            if self.entries.len() > max {
                let excess = self.entries.len() - max;
                debug!(excess, max, "evicting oldest edits");
                self.entries.drain(..excess);
            }
        }

        self.cursor = self.entries.len() as isize - 1;
    }

    /// Step back one edit. No-op on the original.
    pub fn undo(&mut self) -> &Raster {
        if self.can_undo() {
            self.cursor -= 1;
            debug!(cursor = self.cursor, "undo");
        }
        self.current()
    }

    /// Step forward one edit.
    pub fn redo(&mut self) -> Result<&Raster, HistoryError> {
        self.jump_to(self.cursor + 1)
    }

    /// Move the cursor to `index` (`-1` for the original).
    pub fn jump_to(&mut self, index: isize) -> Result<&Raster, HistoryError> {
        if index < ORIGINAL || index >= self.entries.len() as isize {
            return Err(HistoryError::OutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        self.cursor = index;
        debug!(cursor = index, "jump");
        Ok(self.current())
    }

    /// Forget every edit and start over from `new_original`.
    pub fn reset(&mut self, new_original: Raster) {
        debug!(
            dropped = self.entries.len(),
            width = new_original.width(),
            height = new_original.height(),
            "history reset"
        );
        self.original = new_original;
        self.entries.clear();
        self.cursor = ORIGINAL;
    }
}
