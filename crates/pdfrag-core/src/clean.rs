use once_cell::sync::Lazy;
use regex::Regex;

/// Box and arrow marks used as bullets in the source documents.
pub const DECORATIVE_GLYPHS: &[char] = &[
    '■', '□', '▪', '▫', '◆', '◇', '▲', '△', '▶', '▷', '►', '▼', '▽', '◀', '◁', '◄',
];

static NEWLINE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n+").expect("valid regex"));
static SPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r" +").expect("valid regex"));

/// Normalize extracted PDF text.
///
/// Glyphs are stripped before whitespace is collapsed so that a removed mark
/// never leaves a double space behind; this keeps `clean_text` idempotent.
pub fn clean_text(text: &str) -> String {
    let stripped: String = text.chars().filter(|c| !DECORATIVE_GLYPHS.contains(c)).collect();
    let text = NEWLINE_RUNS.replace_all(&stripped, "\n");
    let text = SPACE_RUNS.replace_all(&text, " ");
    text.trim().to_string()
}
