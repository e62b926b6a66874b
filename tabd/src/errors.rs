use tracing::debug;

/// Display an error in a user-friendly format without stack traces.
///
/// When `log_expected` is true, conditions that are ordinary outcomes of
/// a command (no daemon to talk to) are logged for diagnostics instead
/// of printed, so callers can emit their own status line.
pub fn display_user_error(err: &anyhow::Error, log_expected: bool) {
    // Alternate format renders the whole context chain, so causes such
    // as "daemon already running" stay visible through added context.
    let message = format!("{err:#}");

    if message.contains("already running") {
        eprintln!("tabd: {message}");
        eprintln!("tabd: stop it first with `tabd stop`");
    } else if message.contains("no daemon at") {
        if log_expected {
            debug!("daemon not reachable: {message}");
        } else {
            eprintln!("tabd: {message}");
        }
    } else {
        eprintln!("tabd: {message}");
    }
}
