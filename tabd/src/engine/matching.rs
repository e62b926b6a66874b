use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use tabd_types::Suggestion;

static FUZZY: std::sync::LazyLock<SkimMatcherV2> =
    std::sync::LazyLock::new(SkimMatcherV2::default);

/// Score how well `target` matches the typed `input`.
///
/// Matching is case-insensitive and tiered: exact, then prefix, then
/// word-boundary initials, then substring, then fuzzy subsequence.
/// Tier bases keep any match in a higher tier above every match in a
/// lower one. `None` means no match at all.
pub fn relevance(input: &str, target: &str) -> Option<i32> {
    let input_lower = input.to_lowercase();
    let target_lower = target.to_lowercase();

    if input_lower == target_lower {
        return Some(10_000);
    }

    if target_lower.starts_with(&input_lower) {
        // Short targets edge out long ones sharing the prefix.
        return Some(5_000 + 100 - target.chars().count() as i32);
    }

    if let Some(score) = boundary_score(&input_lower, target) {
        return Some(2_000 + score);
    }

    if let Some(index) = target_lower.find(&input_lower) {
        return Some(1_000 - index as i32);
    }

    FUZZY
        .fuzzy_match(&target_lower, &input_lower)
        .map(|score| (score as i32).clamp(1, 999))
}

/// Match every input character against successive word boundaries of
/// `target`, 10 points each. Boundaries sit at the start, after
/// separator characters and at camelCase transitions.
fn boundary_score(input_lower: &str, target: &str) -> Option<i32> {
    let target_chars: Vec<char> = target.chars().collect();
    let mut boundaries = Vec::new();
    for (i, &ch) in target_chars.iter().enumerate() {
        let at_boundary = i == 0
            || matches!(target_chars[i - 1], '-' | '_' | '.' | '/')
            || (target_chars[i - 1].is_lowercase() && ch.is_uppercase());
        if at_boundary {
            boundaries.push(ch.to_lowercase().next().unwrap_or(ch));
        }
    }

    let mut score = 0;
    let mut remaining = boundaries.into_iter();
    'input: for in_ch in input_lower.chars() {
        for boundary_ch in remaining.by_ref() {
            if boundary_ch == in_ch {
                score += 10;
                continue 'input;
            }
        }
        return None;
    }
    Some(score)
}

/// Filter suggestions against the typed input and order them by match
/// quality, then declared priority, then name.
///
/// An empty input keeps the list untouched, in both membership and
/// order.
pub fn rank_and_filter(mut suggestions: Vec<Suggestion>, input: &str) -> Vec<Suggestion> {
    if input.is_empty() {
        return suggestions;
    }

    let mut scored: Vec<(i32, Suggestion)> = suggestions
        .drain(..)
        .filter_map(|suggestion| {
            relevance(input, &suggestion.name).map(|score| (score, suggestion))
        })
        .filter(|(score, _)| *score > 0)
        .collect();

    scored.sort_by(|a, b| {
        b.0.cmp(&a.0)
            .then_with(|| b.1.priority.cmp(&a.1.priority))
            .then_with(|| a.1.name.cmp(&b.1.name))
    });

    scored.into_iter().map(|(_, suggestion)| suggestion).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rank_names(names: &[&str], input: &str) -> Vec<String> {
        let suggestions = names.iter().map(|n| Suggestion::argument(*n)).collect();
        rank_and_filter(suggestions, input)
            .into_iter()
            .map(|s| s.name)
            .collect()
    }

    #[test]
    fn test_exact_beats_prefix() {
        assert!(relevance("commit", "commit").unwrap() > relevance("commit", "commit-msg").unwrap());
    }

    #[test]
    fn test_prefix_beats_substring() {
        let prefix = relevance("com", "commit").unwrap();
        let substring = relevance("com", "autocomplete").unwrap();
        assert!(prefix > substring);
    }

    #[test]
    fn test_shorter_prefix_target_wins() {
        assert!(relevance("ch", "checkout").unwrap() > relevance("ch", "cherry-pick").unwrap());
    }

    #[test]
    fn test_word_boundary_initials() {
        let score = relevance("gcm", "git-commit-msg").unwrap();
        assert_eq!(score, 2_030);

        let camel = relevance("fb", "fooBar").unwrap();
        assert_eq!(camel, 2_020);
    }

    #[test]
    fn test_substring_scores_by_position() {
        let early = relevance("log", "relogin").unwrap();
        let late = relevance("log", "watchdog-log").unwrap();
        assert!(early > late);
    }

    #[test]
    fn test_fuzzy_subsequence_is_lowest_tier() {
        let fuzzy = relevance("cmt", "commit").unwrap();
        assert!(fuzzy >= 1 && fuzzy <= 999);
        assert!(relevance("zzz", "commit").is_none());
    }

    #[test]
    fn test_case_insensitive_matching() {
        assert_eq!(relevance("MAIN", "main"), Some(10_000));
        assert!(relevance("Ma", "MASTER").is_some());
    }

    #[test]
    fn test_rank_and_filter_orders_tiers() {
        let ranked = rank_names(&["autocomplete", "commit", "com", "zebra"], "com");
        assert_eq!(ranked, vec!["com", "commit", "autocomplete"]);
    }

    #[test]
    fn test_rank_and_filter_empty_input_is_identity() {
        let ranked = rank_names(&["b", "a", "c"], "");
        assert_eq!(ranked, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_ties_break_by_priority_then_name() {
        let suggestions = vec![
            Suggestion::argument("pull").with_priority(10),
            Suggestion::argument("push").with_priority(20),
        ];
        let ranked = rank_and_filter(suggestions, "pu");
        assert_eq!(ranked[0].name, "push");

        let suggestions = vec![
            Suggestion::argument("pushy"),
            Suggestion::argument("pulls"),
        ];
        let ranked = rank_and_filter(suggestions, "pu");
        assert_eq!(ranked[0].name, "pulls");
    }
}
