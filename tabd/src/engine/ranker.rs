use indexmap::IndexMap;
use tabd_history::HistoryIndex;
use tabd_types::Suggestion;

/// Hard cap on what one completion request returns.
pub const MAX_SUGGESTIONS: usize = 50;

const HISTORY_LIMIT_FIRST_WORD: usize = 3;
const HISTORY_LIMIT_SECOND_WORD: usize = 2;

/// History repeats for the typed line, gated to the first two words.
///
/// Deeper positions are grammar territory, and anything path-like is
/// left to the filesystem listing.
pub fn history_candidates(index: &HistoryIndex, tokens: &[String]) -> Vec<Suggestion> {
    let Some(partial) = tokens.last() else {
        return Vec::new();
    };
    if partial.contains('/') {
        return Vec::new();
    }

    match tokens.len() {
        1 if !partial.is_empty() => index.suggest(partial, HISTORY_LIMIT_FIRST_WORD),
        2 if !partial.starts_with('-') => index.suggest(
            &format!("{} {}", tokens[0], partial),
            HISTORY_LIMIT_SECOND_WORD,
        ),
        _ => Vec::new(),
    }
}

/// Final assembly: history first, then grammar candidates, icons filled
/// in, priorities boosted by past usage, sorted, deduplicated by name
/// and capped.
///
/// The sort is stable, so equal priorities keep their source order and
/// the first occurrence of a duplicated name is the one that survives.
pub fn merge(
    history: Vec<Suggestion>,
    grammar: Vec<Suggestion>,
    index: &HistoryIndex,
    tokens: &[String],
) -> Vec<Suggestion> {
    let first_word = tokens.first().map(String::as_str).unwrap_or_default();
    let single_word = tokens.len() == 1;

    let mut combined = history;
    combined.extend(grammar);

    for suggestion in &mut combined {
        suggestion.ensure_icon();
        let boost = if single_word {
            index.boost(&suggestion.name)
        } else {
            index.boost(&format!("{first_word} {}", suggestion.name))
        };
        suggestion.priority += boost;
    }

    combined.sort_by(|a, b| b.priority.cmp(&a.priority));

    let mut unique: IndexMap<String, Suggestion> = IndexMap::with_capacity(combined.len());
    for suggestion in combined {
        unique.entry(suggestion.name.clone()).or_insert(suggestion);
    }

    let mut merged: Vec<Suggestion> = unique.into_values().collect();
    merged.truncate(MAX_SUGGESTIONS);
    merged
}
