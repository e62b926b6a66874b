use crate::parse::{extract_prefixes, parse_history_line};
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::path::Path;
use std::time::SystemTime;
use tabd_types::{EngineError, Suggestion, SuggestionKind};
use tracing::debug;

/// Usage record for one command prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub command: String,
    pub count: u32,
    /// Sequence index of the most recent occurrence, dense over parsed lines.
    pub last_used: usize,
}

/// Snapshot of index-level counters for health/status output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryStats {
    pub total_commands: usize,
    pub unique_prefixes: usize,
    pub last_parsed: Option<SystemTime>,
}

/// Frequency index over a shell history file.
///
/// Built wholesale from the file contents and then read-only; callers that
/// need refresh-on-change build a new index and swap it in. Insertion order
/// of the underlying map is first-seen order, which keeps score ties stable
/// across rebuilds of the same file.
#[derive(Debug, Clone, Default)]
pub struct HistoryIndex {
    entries: IndexMap<String, HistoryEntry>,
    total_commands: usize,
    last_parsed: Option<SystemTime>,
}

impl HistoryIndex {
    /// Build an index from a history file on disk.
    ///
    /// zsh metafies multibyte sequences, so the file is decoded lossily
    /// instead of failing on invalid UTF-8.
    pub fn from_file(path: &Path) -> Result<HistoryIndex, EngineError> {
        let raw = std::fs::read(path)?;
        let text = String::from_utf8_lossy(&raw);
        Ok(Self::from_lines(text.lines()))
    }

    /// Build an index from history lines in file order.
    pub fn from_lines<'a, I>(lines: I) -> HistoryIndex
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut entries: IndexMap<String, HistoryEntry> = IndexMap::new();
        let mut line_index = 0usize;

        for line in lines {
            let Some(command) = parse_history_line(line) else {
                continue;
            };

            for prefix in extract_prefixes(&command) {
                let entry = entries.entry(prefix.clone()).or_insert_with(|| HistoryEntry {
                    command: prefix,
                    count: 0,
                    last_used: line_index,
                });
                entry.count += 1;
                entry.last_used = line_index;
            }

            line_index += 1;
        }

        debug!(
            "parsed {} history commands into {} unique prefixes",
            line_index,
            entries.len()
        );

        HistoryIndex {
            entries,
            total_commands: line_index,
            last_parsed: Some(SystemTime::now()),
        }
    }

    /// Frequency/recency blend used to rank matches: capped frequency
    /// weighted 0.7, position of the last use weighted 0.3.
    fn score(&self, entry: &HistoryEntry) -> f64 {
        let frequency = f64::from(entry.count.min(100)) / 100.0;
        let recency = entry.last_used as f64 / self.total_commands.max(1) as f64;
        frequency * 0.7 + recency * 0.3
    }

    /// Suggestions for what the user has typed so far, best first.
    ///
    /// Matching is a case-insensitive prefix test against the stored
    /// prefixes. The suggestion's name is only the part the user has not
    /// finished typing: the tail of the entry starting at the current
    /// (partial) word, or the entry's last word once the user has typed at
    /// least as many words as the entry holds.
    pub fn suggest(&self, input: &str, limit: usize) -> Vec<Suggestion> {
        let input_lower = input.trim().to_lowercase();
        if input_lower.is_empty() {
            return Vec::new();
        }
        let mut input_words: Vec<&str> = input.split_whitespace().collect();
        // Trailing whitespace means the next word is being typed; that
        // empty word positions the completion tail correctly.
        if input.ends_with(char::is_whitespace) {
            input_words.push("");
        }

        let mut matches: Vec<(&HistoryEntry, f64)> = self
            .entries
            .values()
            .filter(|entry| entry.command.to_lowercase().starts_with(&input_lower))
            .map(|entry| (entry, self.score(entry)))
            .collect();

        matches.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        matches.truncate(limit);

        matches
            .into_iter()
            .filter_map(|(entry, _)| completion_for(entry, &input_words))
            .collect()
    }

    /// Additive priority boost for a prefix the user has used before.
    /// Log-scaled so heavy use saturates at +50.
    pub fn boost(&self, prefix: &str) -> i32 {
        match self.entries.get(prefix) {
            Some(entry) => {
                let boost = (f64::from(entry.count) + 1.0).log2() * 5.0;
                boost.min(50.0) as i32
            }
            None => 0,
        }
    }

    pub fn contains(&self, prefix: &str) -> bool {
        self.entries.contains_key(prefix)
    }

    pub fn entry(&self, prefix: &str) -> Option<&HistoryEntry> {
        self.entries.get(prefix)
    }

    pub fn stats(&self) -> HistoryStats {
        HistoryStats {
            total_commands: self.total_commands,
            unique_prefixes: self.entries.len(),
            last_parsed: self.last_parsed,
        }
    }
}

/// Turn a matched entry into the suggestion shown to the user.
fn completion_for(entry: &HistoryEntry, input_words: &[&str]) -> Option<Suggestion> {
    let entry_words: Vec<&str> = entry.command.split_whitespace().collect();

    let name = if input_words.len() >= entry_words.len() {
        (*entry_words.last()?).to_string()
    } else {
        entry_words[input_words.len() - 1..].join(" ")
    };
    if name.is_empty() {
        return None;
    }

    let priority = 150 + entry.count.min(50) as i32;
    Some(
        Suggestion::new(name.clone(), SuggestionKind::History, priority)
            .with_description(format!("{} ({}x)", entry.command, entry.count))
            .with_icon(SuggestionKind::History.icon())
            .with_insert_value(name),
    )
}
