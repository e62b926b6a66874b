mod index;
mod parse;

pub use crate::index::{HistoryEntry, HistoryIndex, HistoryStats};
pub use crate::parse::{extract_prefixes, parse_history_line, split_words};
