//! Pure markdown escaping utilities.
//!
//! These functions handle escaping special Markdown characters, encoding
//! link destinations and calculating fence/tick lengths for code.

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

/// Characters percent-encoded in link paths. `/` stays readable.
const LINK_PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'(')
    .add(b')')
    .add(b'[')
    .add(b']')
    .add(b'|')
    .add(b'\\')
    .add(b'^');

/// Escape special Markdown characters in text that starts a line.
///
/// # Examples
///
/// ```
/// use noteport::markdown::escape_markdown;
///
/// assert_eq!(escape_markdown("*bold*"), "\\*bold\\*");
/// assert_eq!(escape_markdown("[link]"), "\\[link\\]");
/// ```
pub fn escape_markdown(text: &str) -> String {
    escape_markdown_at(text, true)
}

/// Escape special Markdown characters in text.
///
/// Escapes characters that have special meaning in Markdown:
/// - Backslash: `\\`
/// - Emphasis: `*`, `_`
/// - Links: `[`, `]`
/// - Code: `` ` ``
/// - Tables: `|`
/// - HTML: `<`, `>`
/// - Images: `!` (when followed by `[`)
/// - At line start only: `#`, list markers (`- `, `+ `, `1. `) and `---`
///
/// `at_line_start` tells whether `text` begins a line of output.
pub fn escape_markdown_at(text: &str, at_line_start: bool) -> String {
    let mut result = String::with_capacity(text.len() + text.len() / 10);
    let mut chars = text.chars().peekable();
    let mut at_line_start = at_line_start;
    // Digits seen at the start of the current line
    let mut leading_digits = at_line_start;

    while let Some(c) = chars.next() {
        match c {
            '\\' => result.push_str("\\\\"),
            '*' | '_' | '[' | ']' | '`' | '|' | '<' | '>' => {
                result.push('\\');
                result.push(c);
            }
            '#' if at_line_start => {
                result.push('\\');
                result.push(c);
            }
            '-' | '+' if at_line_start && matches!(chars.peek(), Some(' ' | '-') | None) => {
                result.push('\\');
                result.push(c);
            }
            '.' if leading_digits && !at_line_start && matches!(chars.peek(), Some(' ') | None) => {
                result.push('\\');
                result.push(c);
            }
            '!' if chars.peek() == Some(&'[') => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
        leading_digits = (at_line_start || leading_digits) && c.is_ascii_digit();
        at_line_start = c == '\n';
        if at_line_start {
            leading_digits = true;
        }
    }

    result
}

/// Percent-encode a relative link path, keeping `/` separators.
///
/// # Examples
///
/// ```
/// use noteport::markdown::encode_link_path;
///
/// assert_eq!(encode_link_path("_resources/my note.resources/a b.png"),
///            "_resources/my%20note.resources/a%20b.png");
/// ```
pub fn encode_link_path(path: &str) -> String {
    utf8_percent_encode(path, LINK_PATH).to_string()
}

/// Calculate the minimum fence length needed for a code block.
///
/// Returns the smallest number of fence characters (at least 3) that
/// doesn't appear as a run in the content.
///
/// # Examples
///
/// ```
/// use noteport::markdown::calculate_fence_length;
///
/// // Normal content needs 3 backticks
/// assert_eq!(calculate_fence_length("let x = 1;", '`'), 3);
///
/// // Content with 3 backticks needs 4
/// assert_eq!(calculate_fence_length("```rust\ncode\n```", '`'), 4);
/// ```
pub fn calculate_fence_length(content: &str, fence_char: char) -> usize {
    longest_run(content, fence_char).max(2) + 1
}

/// Calculate the minimum backtick count needed for inline code.
///
/// Returns the smallest number of backticks (at least 1) that doesn't
/// appear as a run in the content.
pub fn calculate_inline_code_ticks(content: &str) -> usize {
    longest_run(content, '`') + 1
}

fn longest_run(content: &str, target: char) -> usize {
    let mut max_run = 0;
    let mut current_run = 0;

    for c in content.chars() {
        if c == target {
            current_run += 1;
            max_run = max_run.max(current_run);
        } else {
            current_run = 0;
        }
    }

    max_run
}
