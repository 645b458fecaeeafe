/// Normalize text for persistence: drop NUL bytes, collapse every whitespace
/// run (tabs and newlines included) to a single space, and trim.
pub fn clean(value: &str) -> String {
    value
        .split(|c: char| c == '\0')
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
