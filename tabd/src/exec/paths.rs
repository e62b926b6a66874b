use std::fs;
use std::path::{Path, PathBuf};
use tabd_types::Suggestion;
use tracing::debug;

/// List filesystem entries matching a partially typed path.
///
/// The partial splits into a directory to list and a basename prefix to
/// filter by: empty lists the request cwd, a trailing `/` lists that
/// directory, anything else lists the parent and filters
/// case-insensitively. `~` expands to home, absolute paths stand alone,
/// relative ones resolve against `cwd`. Every suggestion's insert value
/// splices the entry into what the user actually typed.
///
/// Listing never fails: unreadable directories or entries just produce
/// fewer suggestions.
pub fn smart_path_suggestions(cwd: &Path, partial: &str, include_files: bool) -> Vec<Suggestion> {
    let unescaped = unescape(partial);

    let (list_dir, filter) = if unescaped.is_empty() {
        (cwd.to_path_buf(), String::new())
    } else if unescaped.ends_with('/') {
        (resolve_path(cwd, &unescaped), String::new())
    } else {
        let resolved = resolve_path(cwd, &unescaped);
        let filter = resolved
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_lowercase();
        let parent = resolved
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("/"));
        (parent, filter)
    };

    // Dotfiles stay out of the way until the user reaches for them.
    let show_hidden = filter.starts_with('.') || unescaped.contains("/.");

    match fs::metadata(&list_dir) {
        Ok(meta) if meta.is_dir() => {}
        _ => return Vec::new(),
    }

    let entries = match fs::read_dir(&list_dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("cannot list {:?}: {}", list_dir, e);
            return Vec::new();
        }
    };

    // Typed directory prefix up to the last slash, kept verbatim so the
    // insert value matches the user's spelling (including `~`).
    let typed_prefix = match unescaped.rfind('/') {
        Some(idx) => &unescaped[..=idx],
        None => "",
    };

    let mut matched: Vec<(String, bool)> = Vec::new();
    for entry in entries.flatten() {
        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(_) => continue,
        };
        if !show_hidden && name.starts_with('.') {
            continue;
        }
        if !filter.is_empty() && !name.to_lowercase().starts_with(&filter) {
            continue;
        }

        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        let is_dir = if file_type.is_symlink() {
            match fs::metadata(entry.path()) {
                Ok(meta) => meta.is_dir(),
                Err(_) => continue,
            }
        } else {
            file_type.is_dir()
        };

        if !include_files && !is_dir {
            continue;
        }
        matched.push((name, is_dir));
    }

    matched.sort();

    matched
        .into_iter()
        .map(|(name, is_dir)| {
            let display = if is_dir { format!("{name}/") } else { name };
            let insert = format!("{typed_prefix}{display}");
            let suggestion = if is_dir {
                Suggestion::folder(&display)
            } else {
                Suggestion::file(&display)
            };
            suggestion.with_insert_value(insert)
        })
        .collect()
}

fn resolve_path(cwd: &Path, input: &str) -> PathBuf {
    let expanded = shellexpand::tilde(input);
    let path = Path::new(expanded.as_ref());
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let relative = expanded.strip_prefix("./").unwrap_or(&expanded);
    cwd.join(relative)
}

/// Strip backslash escapes so `my\ dir` resolves as `my dir`.
fn unescape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some(escaped) => out.push(escaped),
                None => out.push(ch),
            }
        } else {
            out.push(ch);
        }
    }
    out
}
