//! Work-presence checks over append/strike list files.
//!
//! A list file is a header line followed by item lines. The supervisor never
//! interprets items; it only distinguishes "has work" from "no work".

/// Lines starting with this marker (after trimming) are comments or headings.
pub const COMMENT_MARKER: char = '#';

/// Byte-order mark some editors prepend to UTF-8 files.
const BYTE_ORDER_MARK: char = '\u{FEFF}';

/// Return true if any line carries a pending work item.
///
/// Blank lines and lines whose trimmed form starts with `#` are ignored, so a
/// file holding only its title heading counts as empty. A byte-order mark is
/// trimmed like whitespace.
pub fn has_work_items(contents: &str) -> bool {
    contents.lines().any(|raw| {
        let line = raw.trim_matches(|c: char| c.is_whitespace() || c == BYTE_ORDER_MARK);
        !line.is_empty() && !line.starts_with(COMMENT_MARKER)
    })
}

/// Return the header (first line) of a list file, without its line ending.
pub fn read_first_line(contents: &str) -> &str {
    contents.lines().next().unwrap_or("")
}

/// Canonical header-only form of a list file.
pub fn header_only(contents: &str) -> String {
    let header = read_first_line(contents);
    if header.is_empty() {
        String::new()
    } else {
        format!("{header}\n")
    }
}
