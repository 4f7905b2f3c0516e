//! git::rows
//!
//! Line parsers for the tabular plumbing formats.
//!
//! | Command              | Line shape                                        |
//! |----------------------|---------------------------------------------------|
//! | `ls-files --stage`   | `<mode> SP <id> SP <stage> TAB <path>`            |
//! | `ls-tree`            | `<mode> SP <type> SP <id> TAB <name>`             |
//! | `diff-* --raw`       | `:<mode> SP <mode> SP <id> SP <id> SP <X> TAB <path>` |
//! | `ls-files --others`  | `<path>`                                          |
//!
//! Paths that git chose to C-quote are unquoted here, so every caller sees
//! the literal path regardless of the invocation's quoting setting.

use crate::core::types::{FileMode, Oid};

use super::GitError;

/// One row of `ls-files --stage`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRow {
    pub mode: FileMode,
    pub id: Oid,
    /// Merge stage: 0 for a normal entry, 1-3 for conflict sides.
    pub stage: u8,
    pub path: String,
}

/// One row of `ls-tree`.
///
/// The type column is kept verbatim; deciding what an unknown type means is
/// the tree model's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    pub mode: FileMode,
    pub kind: String,
    pub id: Oid,
    pub name: String,
}

/// One row of raw diff output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffRow {
    pub src_mode: FileMode,
    pub dst_mode: FileMode,
    pub src_id: Oid,
    pub dst_id: Oid,
    /// Change letter (`M`, `A`, `D`, `U`, `T`, `R`, `C`).
    pub status: char,
    /// Similarity score for renames and copies.
    pub score: Option<u8>,
    pub path: String,
    /// Destination path for renames and copies.
    pub dst_path: Option<String>,
}

impl DiffRow {
    /// True when mode or content id differs between the two sides.
    ///
    /// A zero destination id means git did not hash the worktree file and
    /// counts as a difference.
    pub fn sides_differ(&self) -> bool {
        self.src_mode != self.dst_mode || self.src_id != self.dst_id || self.dst_id.is_zero()
    }
}

/// Parse `ls-files --stage` output.
pub fn parse_index_rows(text: &str) -> Result<Vec<IndexRow>, GitError> {
    const CONTEXT: &str = "index listing";
    lines(text)
        .map(|line| {
            let (info, path) = split_tab(line, CONTEXT)?;
            let mut fields = info.split_whitespace();
            let (Some(mode), Some(id), Some(stage), None) =
                (fields.next(), fields.next(), fields.next(), fields.next())
            else {
                return Err(GitError::malformed(CONTEXT, format!("bad fields: {line}")));
            };
            let stage = stage
                .parse::<u8>()
                .ok()
                .filter(|s| *s <= 3)
                .ok_or_else(|| GitError::malformed(CONTEXT, format!("bad stage: {line}")))?;
            Ok(IndexRow {
                mode: FileMode::parse(mode)?,
                id: Oid::new(id)?,
                stage,
                path: unquote_path(path),
            })
        })
        .collect()
}

/// Parse `ls-tree` output.
pub fn parse_tree_rows(text: &str) -> Result<Vec<TreeRow>, GitError> {
    const CONTEXT: &str = "tree listing";
    lines(text)
        .map(|line| {
            let (info, name) = split_tab(line, CONTEXT)?;
            let mut fields = info.split_whitespace();
            // `ls-tree -l` adds a size column; it is not needed here
            let (Some(mode), Some(kind), Some(id)) = (fields.next(), fields.next(), fields.next())
            else {
                return Err(GitError::malformed(CONTEXT, format!("bad fields: {line}")));
            };
            Ok(TreeRow {
                mode: FileMode::parse(mode)?,
                kind: kind.to_string(),
                id: Oid::new(id)?,
                name: unquote_path(name),
            })
        })
        .collect()
}

/// Parse `--raw` output of `diff-files` / `diff-index`.
pub fn parse_diff_rows(text: &str) -> Result<Vec<DiffRow>, GitError> {
    const CONTEXT: &str = "raw diff";
    lines(text)
        .map(|line| {
            let body = line
                .strip_prefix(':')
                .ok_or_else(|| GitError::malformed(CONTEXT, format!("missing ':': {line}")))?;
            let (info, paths) = split_tab(body, CONTEXT)?;
            let fields: Vec<&str> = info.split_whitespace().collect();
            let &[src_mode, dst_mode, src_id, dst_id, change] = fields.as_slice() else {
                return Err(GitError::malformed(CONTEXT, format!("bad fields: {line}")));
            };

            let mut letters = change.chars();
            let status = letters
                .next()
                .ok_or_else(|| GitError::malformed(CONTEXT, format!("no status: {line}")))?;
            let score_digits = letters.as_str();
            let score = if score_digits.is_empty() {
                None
            } else {
                Some(score_digits.parse::<u8>().map_err(|_| {
                    GitError::malformed(CONTEXT, format!("bad score: {line}"))
                })?)
            };

            let mut path_fields = paths.splitn(2, '\t');
            let path = path_fields.next().unwrap_or_default();
            let dst_path = path_fields.next().map(unquote_path);

            Ok(DiffRow {
                src_mode: FileMode::parse(src_mode)?,
                dst_mode: FileMode::parse(dst_mode)?,
                src_id: Oid::new(src_id)?,
                dst_id: Oid::new(dst_id)?,
                status,
                score,
                path: unquote_path(path),
                dst_path,
            })
        })
        .collect()
}

/// Parse one-path-per-line output such as `ls-files --others`.
pub fn parse_path_list(text: &str) -> Vec<String> {
    lines(text).map(unquote_path).collect()
}

/// Undo git's C-style quoting of a path.
///
/// Unquoted input is returned unchanged. Octal escapes are decoded as raw
/// bytes, so quoted UTF-8 paths come back intact.
pub fn unquote_path(raw: &str) -> String {
    let Some(inner) = raw
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    else {
        return raw.to_string();
    };

    let mut bytes = Vec::with_capacity(inner.len());
    let mut iter = inner.bytes().peekable();
    while let Some(b) = iter.next() {
        if b != b'\\' {
            bytes.push(b);
            continue;
        }
        match iter.next() {
            Some(b'n') => bytes.push(b'\n'),
            Some(b't') => bytes.push(b'\t'),
            Some(b'r') => bytes.push(b'\r'),
            Some(b'a') => bytes.push(0x07),
            Some(b'b') => bytes.push(0x08),
            Some(b'f') => bytes.push(0x0c),
            Some(b'v') => bytes.push(0x0b),
            Some(d @ b'0'..=b'7') => {
                let mut digits = vec![d];
                while digits.len() < 3 {
                    match iter.peek() {
                        Some(&o @ b'0'..=b'7') => {
                            digits.push(o);
                            iter.next();
                        }
                        _ => break,
                    }
                }
                let value = digits
                    .iter()
                    .fold(0u32, |acc, digit| acc * 8 + u32::from(digit - b'0'));
                // git never escapes above \377; anything larger stays literal
                match u8::try_from(value) {
                    Ok(byte) => bytes.push(byte),
                    Err(_) => {
                        bytes.push(b'\\');
                        bytes.extend_from_slice(&digits);
                    }
                }
            }
            Some(other) => bytes.push(other),
            None => bytes.push(b'\\'),
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

fn lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().filter(|l| !l.is_empty())
}

fn split_tab<'a>(line: &'a str, context: &'static str) -> Result<(&'a str, &'a str), GitError> {
    line.split_once('\t')
        .ok_or_else(|| GitError::malformed(context, format!("missing tab: {line}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: &str = "8ab686eafeb1f44702738c8b0f24f2567c36da6d";
    const B: &str = "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391";
    const Z: &str = "0000000000000000000000000000000000000000";

    #[test]
    fn index_rows() {
        let text = format!("100644 {A} 0\tsrc/lib.rs\n100755 {B} 2\tbin/run.sh\n");
        let rows = parse_index_rows(&text).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].path, "src/lib.rs");
        assert_eq!(rows[0].stage, 0);
        assert_eq!(rows[1].stage, 2);
        assert!(rows[1].mode.is_executable());
    }

    #[test]
    fn index_row_with_space_in_path() {
        let text = format!("100644 {A} 0\tmy notes.txt\n");
        assert_eq!(parse_index_rows(&text).unwrap()[0].path, "my notes.txt");
    }

    #[test]
    fn index_row_bad_stage() {
        let text = format!("100644 {A} 9\tx\n");
        assert!(matches!(
            parse_index_rows(&text),
            Err(GitError::MalformedInput { .. })
        ));
    }

    #[test]
    fn tree_rows() {
        let text = format!(
            "040000 tree {A}\tsrc\n100644 blob {B}\tREADME.md\n160000 commit {A}\tvendor/lib\n"
        );
        let rows = parse_tree_rows(&text).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].kind, "tree");
        assert!(rows[0].mode.is_tree());
        assert_eq!(rows[2].name, "vendor/lib");
    }

    #[test]
    fn tree_rows_long_format() {
        let text = format!("100644 blob {B}      42\tREADME.md\n");
        let rows = parse_tree_rows(&text).unwrap();
        assert_eq!(rows[0].name, "README.md");
    }

    #[test]
    fn tree_row_missing_tab() {
        let text = format!("100644 blob {B} README.md\n");
        assert!(parse_tree_rows(&text).is_err());
    }

    #[test]
    fn diff_rows() {
        let text = format!(":100644 100644 {A} {Z} M\tsrc/lib.rs\n:000000 100644 {Z} {B} A\tnew.txt\n");
        let rows = parse_diff_rows(&text).unwrap();
        assert_eq!(rows[0].status, 'M');
        assert!(rows[0].dst_id.is_zero());
        assert!(rows[0].sides_differ());
        assert_eq!(rows[1].status, 'A');
        assert!(rows[1].src_mode.is_none());
    }

    #[test]
    fn diff_row_rename_with_score() {
        let text = format!(":100644 100644 {A} {A} R087\told.txt\tnew.txt\n");
        let row = &parse_diff_rows(&text).unwrap()[0];
        assert_eq!(row.status, 'R');
        assert_eq!(row.score, Some(87));
        assert_eq!(row.path, "old.txt");
        assert_eq!(row.dst_path.as_deref(), Some("new.txt"));
    }

    #[test]
    fn mode_only_change_differs() {
        let text = format!(":100644 100755 {A} {A} M\trun.sh\n");
        let row = &parse_diff_rows(&text).unwrap()[0];
        assert!(row.sides_differ());
    }

    #[test]
    fn identical_sides_do_not_differ() {
        let text = format!(":100644 100644 {A} {A} M\tsame.txt\n");
        assert!(!parse_diff_rows(&text).unwrap()[0].sides_differ());
    }

    #[test]
    fn diff_row_without_colon() {
        let text = format!("100644 100644 {A} {A} M\tx\n");
        assert!(parse_diff_rows(&text).is_err());
    }

    #[test]
    fn path_list_skips_blank_lines() {
        assert_eq!(parse_path_list("a\n\nb/c\n"), vec!["a", "b/c"]);
        assert!(parse_path_list("").is_empty());
    }

    #[test]
    fn unquote() {
        assert_eq!(unquote_path("plain.txt"), "plain.txt");
        assert_eq!(unquote_path("\"tab\\there\""), "tab\there");
        assert_eq!(unquote_path("\"quo\\\"te\""), "quo\"te");
        assert_eq!(unquote_path("\"caf\\303\\251.txt\""), "café.txt");
    }

    #[test]
    fn unquote_out_of_range_escape_stays_literal() {
        assert_eq!(unquote_path("\"a\\777b\""), "a\\777b");
        assert_eq!(unquote_path("\"\\377\""), "\u{fffd}");
    }
}
