use std::path::{is_separator, MAIN_SEPARATOR};

/// Splits `name` into everything before the extension of its last component
/// and the extension itself (dot included). Dot-files have no extension.
pub fn split_extension(name: &str) -> (&str, &str) {
    let file_start = name.rfind(is_separator).map(|i| i + 1).unwrap_or(0);
    match name[file_start..].rfind('.') {
        None | Some(0) => (name, ""),
        Some(dot) => name.split_at(file_start + dot),
    }
}

/// Lexically normalizes a relative or absolute path: repeated separators and
/// `.` elements are dropped and `..` consumes the preceding element. An empty
/// result becomes `.`.
pub fn clean_path(path: &str) -> String {
    let rooted = path.starts_with(is_separator);
    let mut parts: Vec<&str> = Vec::new();

    for part in path.split(is_separator) {
        match part {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if rooted => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let joined = parts.join(&MAIN_SEPARATOR.to_string());
    match (rooted, joined.is_empty()) {
        (true, _) => format!("{MAIN_SEPARATOR}{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}
