//! Cleanup passes for rendered report Markdown.
//!
//! Each pass is a function `&str -> String` applied in sequence. Section
//! bodies come from generative backends, so they may carry their own
//! headings, trailing spaces, and runs of blank lines.

use std::sync::LazyLock;

use regex::Regex;

/// Run the full cleanup pipeline on a rendered document.
pub(crate) fn run_pipeline(md: &str) -> String {
    let mut result = md.to_string();

    result = clean_blank_lines(&result);
    result = normalize_whitespace(&result);
    result = ensure_trailing_newline(&result);

    result
}

// ---------------------------------------------------------------------------
// Body headings
// ---------------------------------------------------------------------------

/// Push headings inside a section body below the section's own `##`.
///
/// `# Foo` and `## Foo` become `### Foo`; deeper headings are kept.
/// Fenced code is left untouched.
pub(crate) fn demote_body_headings(text: &str) -> String {
    static TOP_HEADING_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^#{1,2}\s+(.+)$").expect("valid regex"));

    let mut in_code_block = false;
    let mut lines: Vec<String> = Vec::new();

    for line in text.lines() {
        if line.trim_start().starts_with("```") {
            in_code_block = !in_code_block;
            lines.push(line.to_string());
            continue;
        }

        match TOP_HEADING_RE.captures(line) {
            Some(caps) if !in_code_block => lines.push(format!("### {}", &caps[1])),
            _ => lines.push(line.to_string()),
        }
    }

    lines.join("\n")
}

// ---------------------------------------------------------------------------
// Blank lines
// ---------------------------------------------------------------------------

/// Collapse runs of blank lines into exactly one, outside fenced code.
fn clean_blank_lines(md: &str) -> String {
    let mut in_code_block = false;
    let mut prev_blank = false;
    let mut lines: Vec<&str> = Vec::new();

    for line in md.lines() {
        if line.trim_start().starts_with("```") {
            in_code_block = !in_code_block;
        }
        let blank = !in_code_block && line.trim().is_empty();
        if blank && prev_blank {
            continue;
        }
        lines.push(if blank { "" } else { line });
        prev_blank = blank;
    }

    lines.join("\n")
}

// ---------------------------------------------------------------------------
// Whitespace
// ---------------------------------------------------------------------------

/// Strip trailing whitespace from every line outside fenced code.
fn normalize_whitespace(md: &str) -> String {
    let mut in_code_block = false;
    let mut lines: Vec<&str> = Vec::new();

    for line in md.lines() {
        if line.trim_start().starts_with("```") {
            in_code_block = !in_code_block;
        }
        if in_code_block {
            lines.push(line);
        } else {
            lines.push(line.trim_end());
        }
    }

    lines.join("\n")
}

/// Trim the document and end it with exactly one newline.
fn ensure_trailing_newline(md: &str) -> String {
    format!("{}\n", md.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demotes_top_level_headings() {
        let body = "# Big\ntext\n## Medium\n#### Small";
        assert_eq!(
            demote_body_headings(body),
            "### Big\ntext\n### Medium\n#### Small"
        );
    }

    #[test]
    fn leaves_code_blocks_alone() {
        let body = "```bash\n# comment\n```\n# Heading";
        assert_eq!(
            demote_body_headings(body),
            "```bash\n# comment\n```\n### Heading"
        );
    }

    #[test]
    fn collapses_blank_runs() {
        assert_eq!(clean_blank_lines("a\n\n\n\nb\n \n\t\nc"), "a\n\nb\n\nc");
        assert_eq!(clean_blank_lines("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn keeps_blank_runs_inside_code_blocks() {
        let md = "```\na\n\n\n\nb\n```\n\n\nc";
        assert_eq!(clean_blank_lines(md), "```\na\n\n\n\nb\n```\n\nc");
        assert_eq!(run_pipeline(md), "```\na\n\n\n\nb\n```\n\nc\n");
    }

    #[test]
    fn trims_trailing_whitespace() {
        assert_eq!(normalize_whitespace("a  \nb\t"), "a\nb");
    }

    #[test]
    fn pipeline_ends_with_single_newline() {
        assert_eq!(run_pipeline("\n\n## H\ntext  \n\n\n"), "## H\ntext\n");
    }
}
