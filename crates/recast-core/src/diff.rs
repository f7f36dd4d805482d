//! Diff rendering for changed files

use crate::console::{Color, Console};
use similar::TextDiff;

/// Plain unified diff between original and rewritten text
///
/// Byte-stable output (no color, fixed context) so two runs over identical
/// input produce identical diffs; this is what lands in reports and the JSON
/// output.
pub fn unified_diff(original: &str, modified: &str) -> String {
    TextDiff::from_lines(original, modified)
        .unified_diff()
        .context_radius(3)
        .to_string()
}

/// Console renderer for diffs
pub struct DiffRenderer {
    console: Console,
}

impl DiffRenderer {
    /// Create a new diff renderer
    pub fn new() -> Self {
        Self {
            console: Console::new(),
        }
    }

    /// Create a diff renderer with colors disabled
    pub fn no_colors() -> Self {
        Self {
            console: Console::no_colors(),
        }
    }

    /// Colorize a stored unified diff with line-number gutters
    ///
    /// Takes the byte-stable output of [`unified_diff`] so the rendered text
    /// always matches what reports carry: hunk headers keep their own line,
    /// every other line gets a sign, a gutter, and the line content.
    pub fn render_diff(&self, diff: &str) -> String {
        let mut output = String::new();
        let mut line_num = 0usize;

        for line in diff.lines() {
            if line.starts_with("@@") {
                output.push_str(&self.console.colorize(line, Color::Cyan));
                output.push('\n');
                continue;
            }

            line_num += 1;
            let content = line.get(1..).unwrap_or("");
            match line.as_bytes().first() {
                Some(b'+') => {
                    output.push_str(&self.console.colorize("+ ", Color::Green));
                    output.push_str(&format!("{line_num:>4} │ "));
                    output.push_str(&self.console.colorize(content, Color::Green));
                }
                Some(b'-') => {
                    output.push_str(&self.console.colorize("- ", Color::Red));
                    output.push_str(&format!("{line_num:>4} │ "));
                    output.push_str(&self.console.colorize(content, Color::Red));
                }
                _ => {
                    output.push_str("  ");
                    output.push_str(&format!("{line_num:>4} │ "));
                    output.push_str(content);
                }
            }
            output.push('\n');
        }

        output
    }
}

impl Default for DiffRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unified_diff_marks_changes() {
        let diff = unified_diff("return \"A\";\n", "return A::class;\n");
        assert!(diff.contains("-return \"A\";"));
        assert!(diff.contains("+return A::class;"));
    }

    #[test]
    fn unified_diff_of_identical_text_is_empty() {
        assert!(unified_diff("same\n", "same\n").is_empty());
    }

    #[test]
    fn unified_diff_is_deterministic() {
        let a = unified_diff("x\ny\n", "x\nz\n");
        let b = unified_diff("x\ny\n", "x\nz\n");
        assert_eq!(a, b);
    }

    #[test]
    fn render_diff_shows_both_sides_with_gutters() {
        let renderer = DiffRenderer::no_colors();
        let rendered = renderer.render_diff(&unified_diff("old\n", "new\n"));
        assert!(rendered.contains("-    1 │ old"), "{rendered}");
        assert!(rendered.contains("+    2 │ new"), "{rendered}");
    }

    #[test]
    fn render_diff_keeps_hunk_headers_without_gutters() {
        let renderer = DiffRenderer::no_colors();
        let diff = unified_diff("a\nb\n", "a\nc\n");
        let rendered = renderer.render_diff(&diff);
        let header = rendered.lines().next().unwrap();
        assert!(header.starts_with("@@"), "{rendered}");
        assert!(!header.contains('│'), "{rendered}");
        assert!(rendered.contains("     1 │ a"), "{rendered}");
    }

    #[test]
    fn render_diff_of_empty_diff_is_empty() {
        let renderer = DiffRenderer::no_colors();
        assert!(renderer.render_diff("").is_empty());
    }
}
