/// Build the upstream URL for a proxied request
///
/// Drops `skip_segments` leading path segments (two for
/// `/adapters/<name>` entries, zero for the bare `/mcp` entry), keeps
/// the rest of the path, appends a trailing `/` when the remaining
/// path ends in `/messages`, and carries the query verbatim onto the
/// backend authority.
pub fn rewrite_target(backend: &str, path: &str, query: Option<&str>, skip_segments: usize) -> String {
    let mut remainder = strip_segments(path, skip_segments);
    if remainder.ends_with("/messages") {
        remainder.push('/');
    }

    match query {
        Some(query) => format!("{backend}{remainder}?{query}"),
        None => format!("{backend}{remainder}"),
    }
}

/// Remove the first `n` segments of an absolute path
fn strip_segments(path: &str, n: usize) -> String {
    if n == 0 {
        return path.to_owned();
    }

    let mut remaining = path;
    for _ in 0..n {
        let trimmed = remaining.trim_start_matches('/');
        remaining = match trimmed.find('/') {
            Some(idx) => &trimmed[idx..],
            None => "",
        };
    }

    if remaining.is_empty() {
        "/".to_owned()
    } else {
        remaining.to_owned()
    }
}
