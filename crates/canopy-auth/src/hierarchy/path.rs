//! Slash-separated folder path handling.

/// Path of the root folder.
pub const ROOT_PATH: &str = "/";

/// Normalize `path` against `working` into its segments.
///
/// Absolute paths ignore `working`. Empty segments and `.` are dropped and
/// `..` removes the previous segment; `..` at the root stays at the root.
pub fn normalize<'a>(path: &'a str, working: &'a str) -> Vec<&'a str> {
    let joined: Box<dyn Iterator<Item = &'a str>> = if path.starts_with('/') {
        Box::new(path.split('/'))
    } else {
        Box::new(working.split('/').chain(path.split('/')))
    };

    let mut segments = Vec::new();
    for segment in joined {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            name => segments.push(name),
        }
    }
    segments
}

/// Render segments as an absolute path.
pub fn join(segments: &[&str]) -> String {
    format!("/{}", segments.join("/"))
}

/// Path of a child given its parent's path.
pub fn child_path(parent: &str, name: &str) -> String {
    if parent == ROOT_PATH {
        format!("/{name}")
    } else {
        format!("{parent}/{name}")
    }
}

/// Split a path into its parent part and final name.
///
/// `"a/b/c"` gives `("a/b", "c")`, `"/c"` gives `("/", "c")` and `"c"`
/// gives `("", "c")`. Trailing slashes are ignored.
pub fn split_last(path: &str) -> (&str, &str) {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) => (ROOT_PATH, &trimmed[1..]),
        Some(idx) => (&trimmed[..idx], &trimmed[idx + 1..]),
        None => ("", trimmed),
    }
}
