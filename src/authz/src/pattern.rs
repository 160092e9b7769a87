//! Wildcard pattern matching for subject, resource and action identifiers
//!
//! Supports four pattern types:
//! 1. Absent pattern (`None`): matches anything
//! 2. Universal wildcard: `"*"` matches any value
//! 3. Prefix/suffix wildcard: `"post:*"` matches `"post:456"`, `"*:viewer"` matches `"doc:viewer"`
//! 4. Multiple wildcards: `"org:*:team:*"` matches segments in order
//!
//! Anything without a `*` is compared with case-sensitive string equality.

/// Wildcard character
pub const WILDCARD: &str = "*";

/// Checks if a value matches an optional wildcard pattern
///
/// # Examples
///
/// ```rust
/// use cretoai_policy::pattern::matches;
///
/// assert!(matches(None, "anything"));
/// assert!(matches(Some("*"), "anything"));
/// assert!(matches(Some("post:*"), "post:456"));
/// assert!(matches(Some("*:viewer"), "document:viewer"));
/// assert!(!matches(Some("post:*"), "page:1"));
/// assert!(matches(Some("read"), "read"));
/// ```
pub fn matches(pattern: Option<&str>, value: &str) -> bool {
    match pattern {
        None => true,
        Some(pattern) => matches_pattern(pattern, value),
    }
}

/// Checks if a value matches a wildcard pattern
pub fn matches_pattern(pattern: &str, value: &str) -> bool {
    if pattern == WILDCARD {
        return true;
    }

    if !pattern.contains('*') {
        return pattern == value;
    }

    let parts: Vec<&str> = pattern.split('*').collect();
    let (first, rest) = match parts.split_first() {
        Some(split) => split,
        None => return pattern == value,
    };
    let (last, middle) = match rest.split_last() {
        Some(split) => split,
        None => return pattern == value,
    };

    if value.len() < first.len() + last.len() {
        return false;
    }
    if !value.starts_with(first) || !value.ends_with(last) {
        return false;
    }

    // Middle segments must appear in order between the prefix and the suffix
    let mut remaining = &value[first.len()..value.len() - last.len()];
    for segment in middle {
        if segment.is_empty() {
            continue;
        }
        match remaining.find(segment) {
            Some(pos) => remaining = &remaining[pos + segment.len()..],
            None => return false,
        }
    }

    true
}
