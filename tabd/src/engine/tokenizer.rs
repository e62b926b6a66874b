/// Slice a command line down to the cursor position.
///
/// `cursor` counts characters, not bytes. Values past the end of the
/// line clamp to the whole line.
pub fn slice_to_cursor(line: &str, cursor: usize) -> &str {
    match line.char_indices().nth(cursor) {
        Some((idx, _)) => &line[..idx],
        None => line,
    }
}

/// Strip one layer of surrounding quotes from a token.
///
/// Tokens keep their quote characters so insert values can match what
/// the user typed, but path resolution needs the bare text.
pub fn strip_quotes(token: &str) -> &str {
    let mut stripped = token;
    if let Some(rest) = stripped.strip_prefix('"').or_else(|| stripped.strip_prefix('\'')) {
        let quote = stripped.as_bytes()[0] as char;
        stripped = rest.strip_suffix(quote).unwrap_or(rest);
    }
    stripped
}

/// Split a command line prefix into whitespace-separated tokens.
///
/// Quote characters and backslashes are kept in the token text so that
/// suggestions can reproduce exactly what the user typed. A quoted span
/// may contain spaces; a backslash escapes the following character.
///
/// A line ending in unquoted whitespace yields a trailing empty token,
/// which marks "start of a new word" for the resolver. An empty or
/// whitespace-only line yields no tokens at all.
pub fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quote_char = ' ';
    let mut escaped = false;

    for ch in input.chars() {
        if escaped {
            current.push(ch);
            escaped = false;
            continue;
        }

        match ch {
            '\\' => {
                current.push(ch);
                escaped = true;
            }
            '"' | '\'' if !in_quotes => {
                in_quotes = true;
                quote_char = ch;
                current.push(ch);
            }
            ch if in_quotes && ch == quote_char => {
                in_quotes = false;
                current.push(ch);
            }
            ' ' | '\t' if !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            ch => current.push(ch),
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    } else if !tokens.is_empty() {
        // Trailing whitespace means the user started a new word.
        tokens.push(String::new());
    }

    tokens
}
