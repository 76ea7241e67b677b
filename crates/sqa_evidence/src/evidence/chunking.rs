use std::path::Path;

use sqa_core::domain::SourceChunk;
use sqa_core::error::AppError;

/// Evidence file extensions accepted at ingest (compared case-insensitively).
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["md", "txt", "csv"];

/// Reject evidence files whose extension is not in [`ALLOWED_EXTENSIONS`].
pub fn check_extension(path: &Path) -> Result<(), AppError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(AppError::input(
            "SOURCE_EXTENSION_UNSUPPORTED",
            "Unsupported source file type; use .md, .txt or .csv",
        )
        .with_details(format!("path={}", path.display()))),
    }
}

/// Stored name for the `index`-th (1-based) ingested file: `01_policy.md`.
pub fn stored_source_name(index: usize, original_name: &str) -> String {
    format!("{index:02}_{original_name}")
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{0b}' | '\u{0c}' | '\u{1c}' | '\u{1d}' | '\u{1e}' | '\u{85}'
            | '\u{2028}' | '\u{2029}'
    )
}

/// Split on every line boundary (`\r\n`, lone `\r`, `\n` and the Unicode separators).
/// A trailing terminator does not produce an extra empty line.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        if !is_line_break(c) {
            continue;
        }
        lines.push(&text[start..idx]);
        start = idx + c.len_utf8();
        if c == '\r' {
            if let Some(&(next, '\n')) = chars.peek() {
                chars.next();
                start = next + 1;
            }
        }
    }
    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

/// One chunk per non-blank line. Line numbers are 1-based positions in `text`, so blank
/// lines leave gaps in the numbering.
pub fn extract_chunks(source_file: &str, text: &str) -> Vec<SourceChunk> {
    split_lines(text)
        .into_iter()
        .enumerate()
        .filter_map(|(idx, raw)| {
            let line = raw.trim();
            if line.is_empty() {
                return None;
            }
            let line_no = u32::try_from(idx + 1).unwrap_or(u32::MAX);
            Some(SourceChunk {
                source_file: source_file.to_string(),
                line_start: line_no,
                line_end: line_no,
                text: line.to_string(),
            })
        })
        .collect()
}
