use std::io::Error;
use std::path::PathBuf;

use derive_setters::Setters;
use polars::error::PolarsError;
use ratatui::crossterm::event::KeyEvent;
use thiserror::Error;

pub const HELP_TEXT: &str = "\
Type            search the active field
Tab / BackTab   next / previous search field
Ctrl-F          choose search field
Alt-1 .. Alt-6  pick search field by position
Ctrl-U          clear the query
Up / Down       move selection
PgUp / PgDn     move selection by a page
Ctrl-Home/End   first / last row
Ctrl-Y          copy selected row
F1              this help
Esc             close popup / clear query / quit";

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("IO error: {0}")]
    IoError(#[from] Error),
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Loading failed: {0}")]
    LoadingFailed(String),
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("Permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),
    #[error("Unknown file type: {}", .0.display())]
    UnknownFileType(PathBuf),
    #[error("Could not expand path \"{0}\": {1}")]
    PathExpansion(String, String),
    #[error("Missing column \"{0}\"")]
    MissingColumn(String),
    #[error("Missing value in column \"{column}\" at row {row}")]
    NullValue { column: String, row: usize },
    #[error("Invalid value in column \"{column}\" at row {row}: {value}")]
    InvalidValue {
        column: String,
        row: usize,
        value: String,
    },
    #[error("Duplicate user id {0}")]
    DuplicateId(i64),
}

#[derive(Debug, Clone, Setters)]
pub struct SearchConfig {
    pub event_poll_time: u64,
    pub source_name: String,
    pub query: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            event_poll_time: 100,
            source_name: String::new(),
            query: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Message {
    Quit,
    Exit,
    Enter,
    MoveUp,
    MoveDown,
    MovePageUp,
    MovePageDown,
    MoveBeginning,
    MoveEnd,
    NextFilter,
    PreviousFilter,
    OpenFilterSelect,
    SelectFilter(usize),
    ClearQuery,
    CopyRow,
    Help,
    Resize(usize, usize),
    RawKey(KeyEvent),
}
