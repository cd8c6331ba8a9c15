//! Unified line diff of a patched file, colored for terminals.

use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::fmt::Write;
use std::path::Path;

/// Render the changes between `original` and `modified` for `file`.
///
/// Returns an empty string when the two are identical.
pub fn render_diff(file: &Path, original: &str, modified: &str) -> String {
    if original == modified {
        return String::new();
    }

    let mut rendered = String::new();
    let _ = writeln!(
        rendered,
        "{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    let _ = writeln!(
        rendered,
        "{}",
        format!("+++ {} (patched)", file.display()).dimmed()
    );

    let diff = TextDiff::from_lines(original, modified);
    for change in diff.iter_all_changes() {
        let line = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        let _ = write!(rendered, "{}", line);
        if change.missing_newline() {
            rendered.push('\n');
        }
    }

    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_diff_identical_is_empty() {
        assert_eq!(render_diff(Path::new("a.tsx"), "same\n", "same\n"), "");
    }

    #[test]
    fn test_render_diff_marks_insertions() {
        colored::control::set_override(false);
        let rendered = render_diff(
            Path::new("src/contexts/AuthContext.tsx"),
            "a\n        console.log('Profile set successfully');\nb\n",
            "a\n        console.log('Profile set successfully');\n        setLoading(false);\nb\n",
        );

        let expected = concat!(
            "--- src/contexts/AuthContext.tsx (original)\n",
            "+++ src/contexts/AuthContext.tsx (patched)\n",
            " a\n",
            "         console.log('Profile set successfully');\n",
            "+        setLoading(false);\n",
            " b\n",
        );
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_render_diff_without_trailing_newline() {
        colored::control::set_override(false);
        let rendered = render_diff(Path::new("a.tsx"), "x", "y");
        assert!(rendered.ends_with("-x\n+y\n"));
    }
}
