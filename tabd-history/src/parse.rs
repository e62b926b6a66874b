use regex::Regex;

// Extended zsh history format: ": <timestamp>:<elapsed>;<command>"
static EXTENDED_LINE_REGEX: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"^:\s*\d+:\d+;(.*)$").unwrap());

/// Extract the command from one raw history line.
///
/// Lines in the extended format are unwrapped; lines that start with `:` but
/// do not parse as extended format are treated as corrupt and dropped, as are
/// blank lines and commands shorter than two characters.
pub fn parse_history_line(line: &str) -> Option<String> {
    if line.trim().is_empty() {
        return None;
    }

    let command = if line.starts_with(':') {
        let captures = EXTENDED_LINE_REGEX.captures(line)?;
        captures.get(1)?.as_str()
    } else {
        line
    };

    let command = command.trim();
    if command.chars().count() < 2 {
        return None;
    }
    Some(command.to_string())
}

/// Split a history command into words on unquoted whitespace.
///
/// Quote characters stay in the word so that `git commit -m 'msg here'`
/// yields `'msg here'` as one word. This is deliberately simpler than the
/// interactive-line tokenizer: history prefixes never need escape handling
/// or a trailing empty word.
pub fn split_words(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;
    let mut quote_char = ' ';

    for ch in input.chars() {
        if in_quote {
            if ch == quote_char {
                in_quote = false;
            }
            current.push(ch);
            continue;
        }

        if ch == '"' || ch == '\'' {
            in_quote = true;
            quote_char = ch;
            current.push(ch);
            continue;
        }

        if ch == ' ' || ch == '\t' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        current.push(ch);
    }

    if !current.is_empty() {
        words.push(current);
    }

    words
}

/// Expand a command into the prefixes it should be counted under.
///
/// `git commit -m 'msg'` counts toward `git` and `git commit` but not
/// `git commit -m`: flags end the prefix chain because they never identify
/// a subcommand.
pub fn extract_prefixes(command: &str) -> Vec<String> {
    let words = split_words(command);
    let mut prefixes = Vec::new();

    let Some(first) = words.first() else {
        return prefixes;
    };
    prefixes.push(first.clone());

    if words.len() > 1 && !words[1].starts_with('-') {
        prefixes.push(format!("{} {}", words[0], words[1]));
    }

    if words.len() > 2 && !words[1].starts_with('-') && !words[2].starts_with('-') {
        prefixes.push(format!("{} {} {}", words[0], words[1], words[2]));
    }

    prefixes
}
