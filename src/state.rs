use std::path::{Path, PathBuf};

use crate::data::loader::load_file;
use crate::data::model::LabeledArray;
use crate::range::{RangeEvent, RangeSynchronizer};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// The array on display. Replaced wholesale by File → Open.
    pub array: LabeledArray,

    /// Visible ranges and selected coordinate.
    pub ranges: RangeSynchronizer,

    /// File the array came from (`None` for the self test).
    pub source: Option<PathBuf>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Edits collected from widgets during the current frame.
    pending: Vec<RangeEvent>,
}

impl AppState {
    pub fn new(array: LabeledArray, source: Option<PathBuf>) -> Self {
        let ranges = RangeSynchronizer::new(&array);
        Self {
            array,
            ranges,
            source,
            status_message: None,
            pending: Vec::new(),
        }
    }

    /// Swap in a newly loaded array; ranges start over.
    pub fn set_array(&mut self, array: LabeledArray, source: Option<PathBuf>) {
        self.ranges = RangeSynchronizer::new(&array);
        self.array = array;
        self.source = source;
        self.status_message = None;
        self.pending.clear();
    }

    /// Queue an edit; applied by [`AppState::apply_pending`].
    pub fn push(&mut self, event: RangeEvent) {
        self.pending.push(event);
    }

    /// Dispatch queued edits in the order they were made.
    /// Returns whether anything changed.
    pub fn apply_pending(&mut self) -> bool {
        if self.pending.is_empty() {
            return false;
        }
        for event in self.pending.drain(..) {
            self.ranges.dispatch(event);
        }
        true
    }

    /// Load another file at runtime. Failures end up in the status bar.
    pub fn open_path(&mut self, path: &Path) {
        match load_file(path) {
            Ok(array) => self.set_array(array, Some(path.to_path_buf())),
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Short description of where the array came from.
    pub fn source_label(&self) -> String {
        match &self.source {
            Some(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            None => "self test".to_string(),
        }
    }
}
