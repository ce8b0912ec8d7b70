/// Lowercase scheme name without a trailing `://`; empty means `http`.
pub(super) fn normalize_scheme(raw: &str) -> String {
    let scheme = raw.trim().trim_end_matches("://").trim_end_matches(':');
    if scheme.is_empty() {
        "http".to_string()
    } else {
        scheme.to_ascii_lowercase()
    }
}

/// Split `scheme://rest` into its parts. Input without `://` has no scheme.
pub(super) fn split_scheme(raw: &str) -> (Option<&str>, &str) {
    match raw.split_once("://") {
        Some((scheme, rest))
            if !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) =>
        {
            (Some(scheme), rest)
        }
        _ => (None, raw),
    }
}

/// `":port"` from the override, else the default, else empty.
pub(super) fn resolve_port(port_override: &str, default_port: &str) -> Result<String, String> {
    let port = match port_override.trim() {
        "" => default_port.trim(),
        explicit => explicit,
    };
    if port.is_empty() {
        return Ok(String::new());
    }
    port.parse::<u16>()
        .map(|p| format!(":{p}"))
        .map_err(|_| format!("invalid port {port:?}"))
}

/// Whether the part after the scheme carries its own path segment.
pub(super) fn has_explicit_path(rest: &str) -> bool {
    let authority_end = rest.find(['?', '#']).unwrap_or(rest.len());
    rest[..authority_end].contains('/')
}
