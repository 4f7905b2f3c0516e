//! views::conflict
//!
//! Conflict-marker parsing for files left behind by a failed merge.
//!
//! # Grammar
//!
//! ```text
//! <<<<<<< label     start marker: opens a conflict, switches to "ours"
//! =======           separator: switches to "theirs"
//! >>>>>>> label     end marker: closes the conflict, back to "common"
//! ```
//!
//! Every other line is content and lands in the bucket for the current
//! section and side. A separator or end marker only counts when it arrives
//! in the state that expects it, and a start marker only outside a conflict;
//! elsewhere such lines are ordinary content (a Markdown `=======` underline
//! in common text stays text).
//!
//! # Example
//!
//! ```
//! use plumbview::views::conflict::{parse_conflicts, Side, SideLabels};
//!
//! let text = "a\n<<<<<<< HEAD\nb\n=======\nc\n>>>>>>> br\nd\n";
//! let parsed = parse_conflicts(text, &SideLabels::default());
//!
//! assert_eq!(parsed.conflicts, 1);
//! assert_eq!(parsed.sections.len(), 3);
//! assert_eq!(parsed.sections[1].lines(Side::Ours), Some(&["b".to_string()][..]));
//! assert_eq!(parsed.sections[1].get("theirs"), Some(&["c".to_string()][..]));
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::git::{GitError, Repo};

/// Which side of a conflict a line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Common,
    Ours,
    Theirs,
}

/// Display labels for the three sides.
///
/// The parser always tracks [`Side`] values; labels only change how a
/// section is looked up and printed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SideLabels {
    pub common: String,
    pub ours: String,
    pub theirs: String,
}

impl Default for SideLabels {
    fn default() -> Self {
        Self {
            common: "common".to_string(),
            ours: "ours".to_string(),
            theirs: "theirs".to_string(),
        }
    }
}

impl SideLabels {
    pub fn label(&self, side: Side) -> &str {
        match side {
            Side::Common => &self.common,
            Side::Ours => &self.ours,
            Side::Theirs => &self.theirs,
        }
    }

    /// Map a label back to its side. The first matching side wins when two
    /// labels are equal.
    pub fn side_of(&self, label: &str) -> Option<Side> {
        [Side::Common, Side::Ours, Side::Theirs]
            .into_iter()
            .find(|side| self.label(*side) == label)
    }
}

/// One run of lines between markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictSection {
    index: usize,
    sides: BTreeMap<Side, Vec<String>>,
    labels: SideLabels,
}

impl ConflictSection {
    /// Position of this section in file order.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn lines(&self, side: Side) -> Option<&[String]> {
        self.sides.get(&side).map(Vec::as_slice)
    }

    /// Lines for the side carrying `label`.
    pub fn get(&self, label: &str) -> Option<&[String]> {
        self.lines(self.labels.side_of(label)?)
    }

    /// Populated sides with their labels, in common/ours/theirs order.
    pub fn labeled(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.sides
            .iter()
            .map(|(side, lines)| (self.labels.label(*side), lines.as_slice()))
    }

    /// True for a section between a start and an end marker.
    pub fn is_conflict(&self) -> bool {
        self.sides.contains_key(&Side::Ours) || self.sides.contains_key(&Side::Theirs)
    }
}

/// Result of parsing one file's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictParse {
    pub sections: Vec<ConflictSection>,
    /// Number of start markers seen.
    pub conflicts: usize,
    /// Whether the text ended with a newline.
    pub final_newline: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Start,
    Separator,
    End,
}

impl Marker {
    fn classify(line: &str) -> Option<Self> {
        let line = line.trim_end_matches('\r');
        if is_marker(line, "<<<<<<<") {
            Some(Marker::Start)
        } else if line == "=======" {
            Some(Marker::Separator)
        } else if is_marker(line, ">>>>>>>") {
            Some(Marker::End)
        } else {
            None
        }
    }
}

/// `prefix` alone or followed by a space and a label.
fn is_marker(line: &str, prefix: &str) -> bool {
    match line.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with(' '),
        None => false,
    }
}

/// Split text into common and conflicting sections.
///
/// Sections that end up empty (a file starting with a conflict, or two
/// conflicts back to back) are dropped and the remaining sections are
/// numbered contiguously.
///
/// Lines are split on `\n` only, so a CRLF file keeps the `\r` at the end
/// of each stored line.
pub fn parse_conflicts(text: &str, labels: &SideLabels) -> ConflictParse {
    let mut buckets: BTreeMap<usize, BTreeMap<Side, Vec<String>>> = BTreeMap::new();
    let mut index = 0;
    let mut state = Side::Common;
    let mut conflicts = 0;

    for line in split_lines(text) {
        match (Marker::classify(line), state) {
            (Some(Marker::Start), Side::Common) => {
                conflicts += 1;
                index += 1;
                state = Side::Ours;
            }
            (Some(Marker::Separator), Side::Ours) => state = Side::Theirs,
            (Some(Marker::End), Side::Theirs) => {
                state = Side::Common;
                index += 1;
            }
            _ => buckets
                .entry(index)
                .or_default()
                .entry(state)
                .or_default()
                .push(line.to_string()),
        }
    }

    if state != Side::Common {
        debug!(conflicts, "text ends inside an unterminated conflict");
    }

    let sections = buckets
        .into_values()
        .enumerate()
        .map(|(index, sides)| ConflictSection {
            index,
            sides,
            labels: labels.clone(),
        })
        .collect();

    ConflictParse {
        sections,
        conflicts,
        final_newline: text.ends_with('\n'),
    }
}

/// Split on `\n`, without the empty piece after a final newline.
fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    let body = text.strip_suffix('\n').unwrap_or(text);
    let pieces = if text.is_empty() { None } else { Some(body.split('\n')) };
    pieces.into_iter().flatten()
}

/// A conflicted worktree file bound to the branches being merged.
#[derive(Debug, Clone)]
pub struct FileConflict {
    repo: Repo,
    path: String,
    labels: SideLabels,
    parsed: ConflictParse,
}

impl FileConflict {
    /// Read and parse `path`, labelling the sides with branch names.
    pub fn load(repo: &Repo, path: &str, ours: &str, theirs: &str) -> Result<Self, GitError> {
        let labels = SideLabels {
            ours: ours.to_string(),
            theirs: theirs.to_string(),
            ..SideLabels::default()
        };
        Self::load_with_labels(repo, path, labels)
    }

    pub fn load_with_labels(
        repo: &Repo,
        path: &str,
        labels: SideLabels,
    ) -> Result<Self, GitError> {
        let text = repo.read_file(path)?;
        let parsed = parse_conflicts(&text, &labels);
        debug!(path, conflicts = parsed.conflicts, "parsed conflict markers");
        Ok(Self {
            repo: repo.clone(),
            path: path.to_string(),
            labels,
            parsed,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Name of the branch on the "ours" side.
    pub fn ours(&self) -> &str {
        &self.labels.ours
    }

    /// Name of the branch on the "theirs" side.
    pub fn theirs(&self) -> &str {
        &self.labels.theirs
    }

    pub fn sections(&self) -> &[ConflictSection] {
        &self.parsed.sections
    }

    pub fn conflict_count(&self) -> usize {
        self.parsed.conflicts
    }

    /// Text with every conflict replaced by one side.
    ///
    /// Common lines are kept. A conflict without lines on `side` contributes
    /// nothing. Line endings follow the file: a stored `\r` stays in place
    /// and the final newline is written only if the file had one.
    pub fn take(&self, side: Side) -> String {
        let mut kept: Vec<&str> = Vec::new();
        for section in &self.parsed.sections {
            let lines = if section.is_conflict() {
                section.lines(side)
            } else {
                section.lines(Side::Common)
            };
            kept.extend(lines.unwrap_or_default().iter().map(String::as_str));
        }
        let mut out = kept.join("\n");
        if self.parsed.final_newline && !kept.is_empty() {
            out.push('\n');
        }
        out
    }

    /// Mark the file resolved by staging it.
    ///
    /// This changes the index only; the parsed sections stay as they were.
    pub fn resolve(&self) -> Result<(), GitError> {
        self.repo.stage([self.path.as_str()])
    }

    /// Replace the file content.
    ///
    /// A failed write is not retried and can leave a partially written
    /// file.
    pub fn write_content(&self, content: &str) -> Result<(), GitError> {
        self.repo.write_file(&self.path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::mock::MockGateway;
    use std::rc::Rc;
    use tempfile::TempDir;

    fn parse(text: &str) -> ConflictParse {
        parse_conflicts(text, &SideLabels::default())
    }

    fn strings(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn single_conflict_between_common_lines() {
        let parsed = parse("a\n<<<<<<< HEAD\nb\n=======\nc\n>>>>>>> br\nd\n");

        assert_eq!(parsed.conflicts, 1);
        assert_eq!(parsed.sections.len(), 3);

        let s = &parsed.sections;
        assert_eq!(s[0].lines(Side::Common).unwrap(), strings(&["a"]));
        assert!(s[0].lines(Side::Ours).is_none());
        assert_eq!(s[1].lines(Side::Ours).unwrap(), strings(&["b"]));
        assert_eq!(s[1].lines(Side::Theirs).unwrap(), strings(&["c"]));
        assert!(s[1].lines(Side::Common).is_none());
        assert_eq!(s[2].lines(Side::Common).unwrap(), strings(&["d"]));
        assert_eq!(
            s.iter().map(ConflictSection::index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn no_markers_is_one_common_section() {
        let parsed = parse("x\ny\n");
        assert_eq!(parsed.conflicts, 0);
        assert_eq!(parsed.sections.len(), 1);
        assert!(!parsed.sections[0].is_conflict());
    }

    #[test]
    fn empty_text() {
        let parsed = parse("");
        assert_eq!(parsed.conflicts, 0);
        assert!(parsed.sections.is_empty());
    }

    #[test]
    fn leading_and_adjacent_conflicts() {
        let text = "<<<<<<< a\n1\n=======\n2\n>>>>>>> b\n<<<<<<< a\n3\n=======\n4\n>>>>>>> b\n";
        let parsed = parse(text);
        assert_eq!(parsed.conflicts, 2);
        assert_eq!(parsed.sections.len(), 2);
        assert!(parsed.sections.iter().all(ConflictSection::is_conflict));
        assert_eq!(parsed.sections[1].lines(Side::Theirs).unwrap(), strings(&["4"]));
    }

    #[test]
    fn one_sided_conflict_keeps_only_populated_side() {
        let parsed = parse("<<<<<<< HEAD\n=======\nonly theirs\n>>>>>>> br\n");
        let section = &parsed.sections[0];
        assert!(section.lines(Side::Ours).is_none());
        assert_eq!(section.lines(Side::Theirs).unwrap(), strings(&["only theirs"]));
    }

    #[test]
    fn separator_outside_conflict_is_content() {
        let parsed = parse("Title\n=======\n\ntext\n");
        assert_eq!(parsed.conflicts, 0);
        assert_eq!(
            parsed.sections[0].lines(Side::Common).unwrap(),
            strings(&["Title", "=======", "", "text"])
        );
    }

    #[test]
    fn longer_marker_runs_are_content() {
        let parsed = parse("<<<<<<<< not a marker\n");
        assert_eq!(parsed.conflicts, 0);
        assert_eq!(parsed.sections.len(), 1);
    }

    #[test]
    fn crlf_markers_recognized() {
        let parsed = parse("<<<<<<< HEAD\r\nb\r\n=======\r\nc\r\n>>>>>>> br\r\n");
        assert_eq!(parsed.conflicts, 1);
        assert_eq!(parsed.sections[0].lines(Side::Ours).unwrap(), strings(&["b\r"]));
    }

    #[test]
    fn unterminated_conflict_keeps_lines() {
        let parsed = parse("<<<<<<< HEAD\nb\n=======\nc\n");
        assert_eq!(parsed.conflicts, 1);
        assert_eq!(parsed.sections[0].lines(Side::Theirs).unwrap(), strings(&["c"]));
    }

    #[test]
    fn custom_labels_resolve() {
        let labels = SideLabels {
            common: "base".into(),
            ours: "main".into(),
            theirs: "feature".into(),
        };
        let parsed = parse_conflicts("<<<<<<< HEAD\nb\n=======\nc\n>>>>>>> f\n", &labels);
        let section = &parsed.sections[0];
        assert_eq!(section.get("main").unwrap(), strings(&["b"]));
        assert_eq!(section.get("feature").unwrap(), strings(&["c"]));
        assert!(section.get("ours").is_none());

        let labeled: Vec<_> = section.labeled().map(|(label, _)| label).collect();
        assert_eq!(labeled, vec!["main", "feature"]);
    }

    fn conflicted_repo(content: &str) -> (TempDir, Repo, MockGateway) {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("f.txt"), content).unwrap();
        let mock = MockGateway::new();
        let repo = Repo::new(dir.path(), Rc::new(mock.clone()));
        (dir, repo, mock)
    }

    #[test]
    fn file_conflict_binds_branch_names() {
        let (_dir, repo, _mock) =
            conflicted_repo("x\n<<<<<<< HEAD\nmine\n=======\nyours\n>>>>>>> topic\n");
        let conflict = FileConflict::load(&repo, "f.txt", "main", "topic").unwrap();

        assert_eq!(conflict.ours(), "main");
        assert_eq!(conflict.theirs(), "topic");
        assert_eq!(conflict.conflict_count(), 1);
        assert_eq!(conflict.sections()[1].get("main").unwrap(), strings(&["mine"]));
        assert_eq!(conflict.take(Side::Theirs), "x\nyours\n");
        assert_eq!(conflict.take(Side::Ours), "x\nmine\n");
    }

    #[test]
    fn take_keeps_crlf_endings() {
        let (_dir, repo, _mock) = conflicted_repo(
            "a\r\n<<<<<<< H\r\nb\r\n=======\r\nc\r\n>>>>>>> t\r\nd\r\n",
        );
        let conflict = FileConflict::load(&repo, "f.txt", "main", "t").unwrap();

        assert_eq!(conflict.conflict_count(), 1);
        assert_eq!(conflict.take(Side::Ours), "a\r\nb\r\nd\r\n");
        assert_eq!(conflict.take(Side::Theirs), "a\r\nc\r\nd\r\n");
    }

    #[test]
    fn take_without_final_newline() {
        let (_dir, repo, _mock) =
            conflicted_repo("a\n<<<<<<< H\nb\n=======\nc\n>>>>>>> t\nd");
        let conflict = FileConflict::load(&repo, "f.txt", "main", "t").unwrap();
        assert_eq!(conflict.take(Side::Theirs), "a\nc\nd");
    }

    #[test]
    fn write_then_resolve() {
        let (dir, repo, mock) = conflicted_repo("<<<<<<< HEAD\na\n=======\nb\n>>>>>>> t\n");
        mock.respond(&["add", "--", "f.txt"], "");

        let conflict = FileConflict::load(&repo, "f.txt", "main", "t").unwrap();
        conflict.write_content("a\n").unwrap();
        conflict.resolve().unwrap();

        assert_eq!(std::fs::read_to_string(dir.path().join("f.txt")).unwrap(), "a\n");
        assert_eq!(mock.call_count(&["add", "--", "f.txt"]), 1);
        // the parse is a snapshot of what was read
        assert_eq!(conflict.conflict_count(), 1);
    }

    #[test]
    fn missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let repo = Repo::new(dir.path(), Rc::new(MockGateway::new()));
        assert!(matches!(
            FileConflict::load(&repo, "absent.txt", "a", "b"),
            Err(GitError::Io { .. })
        ));
    }
}
