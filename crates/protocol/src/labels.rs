use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Separator between labels in a materialized topic path.
pub const PATH_SEPARATOR: char = '.';

/// Maximum depth of a topic path. Deeper trees than this are almost always a
/// client bug (e.g. a loop re-appending the same suffix).
pub const MAX_PATH_DEPTH: usize = 32;

static LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid label regex"));

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathSyntaxError {
    #[error("empty path")]
    Empty,

    #[error("empty label at position {0}")]
    EmptyLabel(usize),

    #[error("invalid label '{0}': only [A-Za-z0-9_-] is allowed")]
    InvalidLabel(String),

    #[error("path depth {0} exceeds maximum of {MAX_PATH_DEPTH}")]
    TooDeep(usize),
}

/// Validates a single path label.
pub fn validate_label(label: &str) -> Result<(), PathSyntaxError> {
    if label.is_empty() {
        return Err(PathSyntaxError::EmptyLabel(0));
    }
    if !LABEL_RE.is_match(label) {
        return Err(PathSyntaxError::InvalidLabel(label.to_string()));
    }
    Ok(())
}

/// Validates a dot-delimited materialized path: every label must match
/// `[A-Za-z0-9_-]+` and the overall depth must stay bounded.
pub fn validate_path(path: &str) -> Result<(), PathSyntaxError> {
    if path.is_empty() {
        return Err(PathSyntaxError::Empty);
    }

    let labels: Vec<&str> = path.split(PATH_SEPARATOR).collect();
    if labels.len() > MAX_PATH_DEPTH {
        return Err(PathSyntaxError::TooDeep(labels.len()));
    }

    for (pos, label) in labels.iter().enumerate() {
        if label.is_empty() {
            return Err(PathSyntaxError::EmptyLabel(pos));
        }
        if !LABEL_RE.is_match(label) {
            return Err(PathSyntaxError::InvalidLabel(label.to_string()));
        }
    }

    Ok(())
}

/// True when `candidate` is `ancestor` itself or a strict descendant of it
/// (same labels followed by a separator).
pub fn is_self_or_descendant(candidate: &str, ancestor: &str) -> bool {
    if candidate == ancestor {
        return true;
    }
    if !candidate.starts_with(ancestor) {
        return false;
    }
    candidate.as_bytes().get(ancestor.len()) == Some(&(PATH_SEPARATOR as u8))
}

/// Splices `new_prefix` in place of `old_prefix` on `path`, preserving the
/// suffix. Caller guarantees `is_self_or_descendant(path, old_prefix)`.
pub fn replace_prefix(path: &str, old_prefix: &str, new_prefix: &str) -> String {
    if path == old_prefix {
        return new_prefix.to_string();
    }
    format!("{new_prefix}{}", &path[old_prefix.len()..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn accepts_valid_paths() {
        assert!(validate_path("a").is_ok());
        assert!(validate_path("a.b.c").is_ok());
        assert!(validate_path("Bible-Study.Chapter_1").is_ok());
    }

    #[test]
    fn rejects_bad_syntax() {
        assert_eq!(validate_path(""), Err(PathSyntaxError::Empty));
        assert_eq!(validate_path("a..b"), Err(PathSyntaxError::EmptyLabel(1)));
        assert_eq!(validate_path(".a"), Err(PathSyntaxError::EmptyLabel(0)));
        assert_eq!(
            validate_path("a.b c"),
            Err(PathSyntaxError::InvalidLabel("b c".to_string()))
        );
        assert_eq!(
            validate_path("a.b/c"),
            Err(PathSyntaxError::InvalidLabel("b/c".to_string()))
        );
    }

    #[test]
    fn rejects_excessive_depth() {
        let deep = vec!["x"; MAX_PATH_DEPTH + 1].join(".");
        assert_eq!(
            validate_path(&deep),
            Err(PathSyntaxError::TooDeep(MAX_PATH_DEPTH + 1))
        );
    }

    #[test]
    fn descendant_check_requires_separator_boundary() {
        assert!(is_self_or_descendant("a.b", "a.b"));
        assert!(is_self_or_descendant("a.b.c", "a.b"));
        assert!(!is_self_or_descendant("a.bc", "a.b"));
        assert!(!is_self_or_descendant("a", "a.b"));
    }

    #[test]
    fn prefix_replacement_preserves_suffix() {
        assert_eq!(replace_prefix("a.b", "a.b", "x.y"), "x.y");
        assert_eq!(replace_prefix("a.b.c.d", "a.b", "x"), "x.c.d");
        assert_eq!(
            replace_prefix("Bible-Study.Chapter-1", "Bible-Study", "Bible_Study"),
            "Bible_Study.Chapter-1"
        );
    }
}
