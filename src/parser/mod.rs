//! Line parsers for jj output.
//!
//! Pure functions that recover structured records from single rendered output
//! lines: revision ids from graph-log lines and file-change records from
//! status lines. Lines are parsed on demand when the user acts on them, never
//! per output chunk.

/// Node glyphs that open a commit line in graph log output, in priority order.
///
/// `@` marks the working copy, `◆` an immutable commit, `○` a mutable commit,
/// `×` a conflicted commit. New graph symbols only need an entry here; the
/// matching algorithm is glyph-agnostic.
const NODE_GLYPHS: &[char] = &['@', '◆', '○', '×'];

/// Connector glyphs drawn for parallel branches rendered alongside a node.
const CONNECTOR_GLYPHS: &[char] = &['│', '┃', '├', '┝', '|'];

/// Separator between old and new path on a rename/copy status line.
const RENAME_SEPARATOR: &str = " => ";

/// Revision id extracted from one log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionRecord {
    pub id: String,
}

/// Status letter of a file-change line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeStatus {
    Modified,
    Added,
    Deleted,
    Renamed,
    Copied,
}

impl ChangeStatus {
    fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'M' => Some(ChangeStatus::Modified),
            'A' => Some(ChangeStatus::Added),
            'D' => Some(ChangeStatus::Deleted),
            'R' => Some(ChangeStatus::Renamed),
            'C' => Some(ChangeStatus::Copied),
            _ => None,
        }
    }
}

/// File-change record extracted from one status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChangeRecord {
    pub status: ChangeStatus,
    pub old_path: String,
    pub new_path: String,
    pub is_rename: bool,
}

/// Extract the revision id from a graph-log line.
///
/// A commit line starts with a node glyph, optionally preceded by whitespace
/// and a single connector glyph from a parallel branch. The alphanumeric token
/// after the glyph is the revision id. Continuation lines, descriptions and
/// blank lines yield `None`.
///
/// Conflict markers after the id are not handled yet.
pub fn parse_revision(line: &str) -> Option<RevisionRecord> {
    // Glyphs are multi-byte; scan at char boundaries only.
    let mut chars = line.chars().peekable();

    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }

    // At most one connector from a parallel branch may precede the node.
    if chars.peek().is_some_and(|c| CONNECTOR_GLYPHS.contains(c)) {
        chars.next();
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
    }

    let glyph = *chars.peek()?;
    NODE_GLYPHS.iter().find(|g| **g == glyph)?;
    chars.next();

    let mut saw_whitespace = false;
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        saw_whitespace = true;
        chars.next();
    }
    if !saw_whitespace {
        return None;
    }

    let id: String = chars.take_while(|c| c.is_alphanumeric()).collect();
    if id.is_empty() {
        return None;
    }

    Some(RevisionRecord { id })
}

/// Extract a file-change record from a status line.
///
/// Per-file lines have the shape `<letter> <path>` or, for renames,
/// `<letter> <old> => <new>`. Header, footer and summary lines yield `None`;
/// a miss is a no-op for callers, never a failure.
pub fn parse_file_change(line: &str) -> Option<FileChangeRecord> {
    let mut chars = line.chars();
    let status = ChangeStatus::from_letter(chars.next()?)?;
    if chars.next() != Some(' ') {
        return None;
    }

    let path_part = chars.as_str().trim_end();
    if path_part.is_empty() {
        return None;
    }

    match path_part.split_once(RENAME_SEPARATOR) {
        Some((old_path, new_path)) if !old_path.is_empty() && !new_path.is_empty() => {
            Some(FileChangeRecord {
                status,
                old_path: old_path.to_string(),
                new_path: new_path.to_string(),
                is_rename: true,
            })
        }
        _ => Some(FileChangeRecord {
            status,
            old_path: path_part.to_string(),
            new_path: path_part.to_string(),
            is_rename: false,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revision_after_immutable_glyph() {
        let rec = parse_revision("◆ a1b2c3 some description").unwrap();
        assert_eq!(rec.id, "a1b2c3");
    }

    #[test]
    fn revision_after_connector_prefixed_glyph() {
        let rec = parse_revision("│ ○ f9e8d7").unwrap();
        assert_eq!(rec.id, "f9e8d7");
    }

    #[test]
    fn revision_after_working_copy_glyph() {
        let rec = parse_revision("@  qpvuntsm user@host 2024-01-01").unwrap();
        assert_eq!(rec.id, "qpvuntsm");
    }

    #[test]
    fn revision_after_conflicted_glyph_with_leading_whitespace() {
        let rec = parse_revision("  × c0ffee broken merge").unwrap();
        assert_eq!(rec.id, "c0ffee");
    }

    #[test]
    fn wrapped_description_line_is_absent() {
        assert_eq!(parse_revision("    some wrapped text"), None);
    }

    #[test]
    fn blank_and_connector_only_lines_are_absent() {
        assert_eq!(parse_revision(""), None);
        assert_eq!(parse_revision("│"), None);
        assert_eq!(parse_revision("│  (empty) no description set"), None);
    }

    #[test]
    fn glyph_without_following_whitespace_is_absent() {
        assert_eq!(parse_revision("○abcdef"), None);
    }

    #[test]
    fn glyph_without_id_token_is_absent() {
        assert_eq!(parse_revision("@ "), None);
        assert_eq!(parse_revision("◆"), None);
    }

    #[test]
    fn id_token_stops_at_non_alphanumeric() {
        let rec = parse_revision("○ abc123?? hidden").unwrap();
        assert_eq!(rec.id, "abc123");
    }

    #[test]
    fn modified_file_line() {
        let rec = parse_file_change("M src/app.go").unwrap();
        assert_eq!(rec.status, ChangeStatus::Modified);
        assert_eq!(rec.old_path, "src/app.go");
        assert_eq!(rec.new_path, "src/app.go");
        assert!(!rec.is_rename);
    }

    #[test]
    fn renamed_file_line_splits_paths() {
        let rec = parse_file_change("R old/name.go => new/name.go").unwrap();
        assert_eq!(rec.status, ChangeStatus::Renamed);
        assert_eq!(rec.old_path, "old/name.go");
        assert_eq!(rec.new_path, "new/name.go");
        assert!(rec.is_rename);
    }

    #[test]
    fn added_deleted_and_copied_letters_classify() {
        assert_eq!(
            parse_file_change("A new.txt").unwrap().status,
            ChangeStatus::Added
        );
        assert_eq!(
            parse_file_change("D gone.txt").unwrap().status,
            ChangeStatus::Deleted
        );
        assert_eq!(
            parse_file_change("C a.txt => b.txt").unwrap().status,
            ChangeStatus::Copied
        );
    }

    #[test]
    fn header_and_summary_lines_are_absent() {
        assert_eq!(parse_file_change("Working copy changes:"), None);
        assert_eq!(parse_file_change("Working copy : qpvuntsm 1a2b3c4d"), None);
        assert_eq!(parse_file_change(""), None);
    }

    #[test]
    fn status_letter_without_space_is_absent() {
        assert_eq!(parse_file_change("Mfile.txt"), None);
    }

    #[test]
    fn status_letter_without_path_is_absent() {
        assert_eq!(parse_file_change("M "), None);
    }
}
