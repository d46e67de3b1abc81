//! Slash-separated path helpers.
//!
//! Reference keys and output paths are always `/`-joined regardless of host
//! platform, so these operate on `str` rather than `std::path`.

/// Lexically clean a slash path: collapse `//`, drop `.` segments and resolve
/// `..` against preceding segments. An empty result becomes `"."`.
pub fn clean(path: &str) -> String {
    if path.is_empty() {
        return ".".to_owned();
    }

    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|last| *last != "..") {
                    parts.pop();
                } else if !rooted {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_owned(),
        (false, false) => joined,
    }
}

/// Join non-empty elements with `/` and clean the result. Returns an empty
/// string when every element is empty.
pub fn join<S: AsRef<str>>(elems: &[S]) -> String {
    let parts: Vec<&str> = elems
        .iter()
        .map(AsRef::as_ref)
        .filter(|elem| !elem.is_empty())
        .collect();
    if parts.is_empty() {
        return String::new();
    }
    clean(&parts.join("/"))
}

/// Split into directory (with trailing slash) and final element.
pub fn split(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(i) => (&path[..=i], &path[i + 1..]),
        None => ("", path),
    }
}

/// Last element of the path; `"."` for an empty path, `"/"` for the root.
pub fn base(path: &str) -> &str {
    if path.is_empty() {
        return ".";
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/";
    }
    split(trimmed).1
}

/// Directory part of the path, cleaned.
pub fn dir(path: &str) -> String {
    clean(split(path).0)
}

/// Strip the extension (from the last `.` of the final element).
pub fn strip_ext(path: &str) -> &str {
    let (dir, file) = split(path);
    match file.rfind('.') {
        Some(i) if i > 0 => &path[..dir.len() + i],
        _ => path,
    }
}

// ============================================================================
// Tests
// ============================================================================
