//! Branch name validation following git-style conventions.
//!
//! Valid branch names:
//! - Must be non-empty
//! - Must not contain whitespace, control characters, `~`, `^`, `:`, `?`,
//!   `*`, `[`, `\`
//! - Must not contain `..` or `@{`
//! - Must not start or end with `/` or `.`, or end with `.lock`
//! - Slash-separated components must be non-empty and not start with `.`

use crate::error::{RefError, Result};

/// Characters that are forbidden anywhere in a branch name.
const FORBIDDEN_CHARS: &[char] = &['~', '^', ':', '?', '*', '[', '\\'];

/// Substrings that are forbidden anywhere in a branch name.
const FORBIDDEN_SEQUENCES: &[&str] = &["..", "@{", "//"];

/// Validate a branch name, returning `Ok(())` if valid.
///
/// `:` is rejected so that a name can always be embedded in a
/// `branch:<name>` ref and parsed back unambiguously.
///
/// # Examples
///
/// ```
/// use wf_refs::validate_branch_name;
///
/// assert!(validate_branch_name("main").is_ok());
/// assert!(validate_branch_name("feature/quests").is_ok());
/// assert!(validate_branch_name("").is_err());
/// assert!(validate_branch_name("bad..name").is_err());
/// ```
pub fn validate_branch_name(name: &str) -> Result<()> {
    let reject = |reason: String| {
        Err(RefError::InvalidBranchName {
            name: name.to_string(),
            reason,
        })
    };

    if name.is_empty() {
        return reject("branch name must not be empty".into());
    }
    if let Some(ch) = name
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || FORBIDDEN_CHARS.contains(c))
    {
        return reject(format!("contains forbidden character: {ch:?}"));
    }
    if let Some(seq) = FORBIDDEN_SEQUENCES.iter().find(|seq| name.contains(*seq)) {
        return reject(format!("must not contain {seq:?}"));
    }
    if name.starts_with(['/', '.']) || name.ends_with(['/', '.']) {
        return reject("must not start or end with '/' or '.'".into());
    }
    if name.ends_with(".lock") {
        return reject("must not end with '.lock'".into());
    }
    if let Some(component) = name.split('/').find(|c| c.starts_with('.')) {
        return reject(format!("component must not start with '.': {component:?}"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_simple_and_nested_names() {
        for name in ["main", "my-branch", "v1.0", "feature/quests", "user/ana/fix-123"] {
            assert!(validate_branch_name(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn rejects_empty_name() {
        assert!(validate_branch_name("").is_err());
    }

    #[test]
    fn rejects_whitespace_and_control() {
        for name in ["has space", "has\ttab", "has\nnewline", "bell\u{7}"] {
            assert!(validate_branch_name(name).is_err(), "{name:?} should be rejected");
        }
    }

    #[test]
    fn rejects_forbidden_chars() {
        for name in ["a~b", "a^b", "a:b", "a?b", "a*b", "a[b", "a\\b"] {
            assert!(validate_branch_name(name).is_err(), "{name:?} should be rejected");
        }
    }

    #[test]
    fn rejects_forbidden_sequences() {
        assert!(validate_branch_name("bad..name").is_err());
        assert!(validate_branch_name("ref@{0}").is_err());
        assert!(validate_branch_name("a//b").is_err());
    }

    #[test]
    fn rejects_boundaries() {
        for name in ["/leading", "trailing/", ".hidden", "trailing.", "main.lock"] {
            assert!(validate_branch_name(name).is_err(), "{name:?} should be rejected");
        }
    }

    #[test]
    fn rejects_component_starting_with_dot() {
        let err = validate_branch_name("feature/.hidden").unwrap_err();
        assert!(matches!(err, RefError::InvalidBranchName { .. }));
    }
}
