//! Property-based tests for the parsers and the status reconciliation.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs.

use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use proptest::prelude::*;

use plumbview::core::types::{FileMode, Oid};
use plumbview::git::rows::{unquote_path, DiffRow, IndexRow};
use plumbview::views::blame::parse_blame;
use plumbview::views::conflict::{parse_conflicts, Side, SideLabels};
use plumbview::views::status::{ChangeKind, Listings, Status};

/// Strategy for a text line that can never be mistaken for a marker.
fn plain_line() -> impl Strategy<Value = String> {
    "[a-z0-9 ;(){}]{0,16}"
}

/// A piece of a generated file: plain lines or one conflict.
#[derive(Debug, Clone)]
enum Block {
    Plain(Vec<String>),
    Conflict { ours: Vec<String>, theirs: Vec<String> },
}

fn block() -> impl Strategy<Value = Block> {
    prop_oneof![
        prop::collection::vec(plain_line(), 0..5).prop_map(Block::Plain),
        (
            prop::collection::vec(plain_line(), 0..4),
            prop::collection::vec(plain_line(), 0..4)
        )
            .prop_map(|(ours, theirs)| Block::Conflict { ours, theirs }),
    ]
}

fn render(blocks: &[Block]) -> String {
    let mut out = String::new();
    for block in blocks {
        match block {
            Block::Plain(lines) => {
                for line in lines {
                    out.push_str(line);
                    out.push('\n');
                }
            }
            Block::Conflict { ours, theirs } => {
                out.push_str("<<<<<<< HEAD\n");
                for line in ours {
                    out.push_str(line);
                    out.push('\n');
                }
                out.push_str("=======\n");
                for line in theirs {
                    out.push_str(line);
                    out.push('\n');
                }
                out.push_str(">>>>>>> feature\n");
            }
        }
    }
    out
}

/// Lines a reader would keep when choosing `side` for every conflict.
fn expected_side(blocks: &[Block], side: Side) -> Vec<String> {
    blocks
        .iter()
        .flat_map(|block| match block {
            Block::Plain(lines) => lines.clone(),
            Block::Conflict { ours, theirs } => match side {
                Side::Ours => ours.clone(),
                _ => theirs.clone(),
            },
        })
        .collect()
}

/// Strategy for a small set of relative paths.
fn path_set() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set("[a-e]{1,2}(/[a-e]{1,2})?", 0..12)
}

fn oid(n: usize) -> Oid {
    Oid::new(format!("{:040x}", n + 1)).unwrap()
}

fn blob_mode() -> FileMode {
    FileMode::parse("100644").unwrap()
}

fn index_row(path: &str, n: usize) -> IndexRow {
    IndexRow {
        mode: blob_mode(),
        id: oid(n),
        stage: 0,
        path: path.to_string(),
    }
}

fn diff_row(path: &str, status: char) -> DiffRow {
    DiffRow {
        src_mode: blob_mode(),
        dst_mode: blob_mode(),
        src_id: oid(1),
        dst_id: Oid::zero(),
        status,
        score: None,
        path: path.to_string(),
        dst_path: None,
    }
}

/// C-quote a path the way git does with `core.quotePath` on.
fn c_quote(path: &str) -> String {
    let mut out = String::from("\"");
    for byte in path.bytes() {
        match byte {
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7e => out.push(byte as char),
            _ => out.push_str(&format!("\\{:03o}", byte)),
        }
    }
    out.push('"');
    out
}

proptest! {
    /// Text without markers is a single common section holding every line.
    #[test]
    fn no_markers_means_one_common_section(lines in prop::collection::vec(plain_line(), 0..20)) {
        let text: String = lines.iter().map(|l| format!("{l}\n")).collect();
        let parsed = parse_conflicts(&text, &SideLabels::default());

        prop_assert_eq!(parsed.conflicts, 0);
        if lines.is_empty() {
            prop_assert!(parsed.sections.is_empty());
        } else {
            prop_assert_eq!(parsed.sections.len(), 1);
            prop_assert!(!parsed.sections[0].is_conflict());
            prop_assert_eq!(parsed.sections[0].lines(Side::Common).unwrap(), lines.as_slice());
        }
    }

    /// Every start marker is counted and no content line is lost.
    #[test]
    fn conflicts_counted_and_lines_kept(blocks in prop::collection::vec(block(), 0..8)) {
        let parsed = parse_conflicts(&render(&blocks), &SideLabels::default());

        let expected_conflicts = blocks
            .iter()
            .filter(|b| matches!(b, Block::Conflict { .. }))
            .count();
        prop_assert_eq!(parsed.conflicts, expected_conflicts);

        let content_lines: usize = blocks
            .iter()
            .map(|b| match b {
                Block::Plain(lines) => lines.len(),
                Block::Conflict { ours, theirs } => ours.len() + theirs.len(),
            })
            .sum();
        let parsed_lines: usize = parsed
            .sections
            .iter()
            .flat_map(|s| s.labeled().map(|(_, lines)| lines.len()))
            .sum();
        prop_assert_eq!(parsed_lines, content_lines);
    }

    /// Sections are numbered contiguously in file order and none is empty.
    #[test]
    fn sections_numbered_contiguously(blocks in prop::collection::vec(block(), 0..8)) {
        let parsed = parse_conflicts(&render(&blocks), &SideLabels::default());
        for (position, section) in parsed.sections.iter().enumerate() {
            prop_assert_eq!(section.index(), position);
            prop_assert!(section.labeled().next().is_some());
        }
    }

    /// Picking one side everywhere reproduces that side's file.
    #[test]
    fn choosing_a_side_reproduces_it(blocks in prop::collection::vec(block(), 0..8)) {
        let parsed = parse_conflicts(&render(&blocks), &SideLabels::default());
        for side in [Side::Ours, Side::Theirs] {
            let picked: Vec<String> = parsed
                .sections
                .iter()
                .flat_map(|s| {
                    let lines = if s.is_conflict() { s.lines(side) } else { s.lines(Side::Common) };
                    lines.unwrap_or_default().to_vec()
                })
                .collect();
            prop_assert_eq!(picked, expected_side(&blocks, side));
        }
    }

    /// N content lines give N entries, and one commit is one shared record.
    #[test]
    fn blame_entries_match_lines(
        lines in prop::collection::vec((0usize..4, "[a-zA-Z0-9 \t.;{}]{0,20}"), 0..30)
    ) {
        let mut text = String::new();
        let mut seen = BTreeSet::new();
        for (number, (commit, content)) in lines.iter().enumerate() {
            let id = oid(*commit);
            text.push_str(&format!("{} {} {}\n", id, number + 1, number + 1));
            if seen.insert(*commit) {
                text.push_str(&format!("author dev{commit}\nsummary change {commit}\n"));
            }
            text.push_str(&format!("\t{content}\n"));
        }

        let entries = parse_blame(&text).unwrap();
        prop_assert_eq!(entries.len(), lines.len());

        let mut records = HashMap::new();
        for (entry, (commit, content)) in entries.iter().zip(&lines) {
            prop_assert_eq!(&entry.text, content);
            prop_assert_eq!(&entry.commit.author.name, &format!("dev{commit}"));
            let first = records.entry(*commit).or_insert_with(|| Rc::clone(&entry.commit));
            prop_assert!(Rc::ptr_eq(first, &entry.commit));
        }
    }

    /// Tracked paths are never untracked and overlays only touch tracked paths.
    #[test]
    fn reconcile_invariants(
        tracked in path_set(),
        others in path_set(),
        modified in path_set(),
        unmerged in path_set(),
    ) {
        let index: Vec<IndexRow> = tracked
            .iter()
            .enumerate()
            .map(|(n, path)| index_row(path, n))
            .collect();
        let status = Status::reconcile(Listings {
            index,
            untracked: others.iter().cloned().collect(),
            modified: modified.iter().map(|p| diff_row(p, 'M')).collect(),
            unmerged: unmerged.iter().map(|p| diff_row(p, 'U')).collect(),
            ..Listings::default()
        });

        for record in status.records() {
            if tracked.contains(&record.path) {
                prop_assert!(!record.untracked);
            } else {
                prop_assert!(record.untracked);
                prop_assert!(others.contains(&record.path));
                prop_assert_eq!(record.kind, ChangeKind::Unmodified);
            }
        }

        let conflicted: BTreeSet<String> = status.conflicted().map(|r| r.path.clone()).collect();
        let expected: BTreeSet<String> = tracked.intersection(&unmerged).cloned().collect();
        prop_assert_eq!(conflicted, expected);

        for record in status.changed() {
            prop_assert!(modified.contains(&record.path));
            prop_assert!(!unmerged.contains(&record.path));
        }
        prop_assert_eq!(status.len(), tracked.union(&others).count());
    }

    /// Paths git leaves unquoted pass through untouched.
    #[test]
    fn plain_paths_unchanged(path in "[a-zA-Z0-9_./-]{1,40}") {
        prop_assert_eq!(unquote_path(&path), path);
    }

    /// Quoted paths decode back to the original text, including non-ASCII.
    #[test]
    fn quoted_paths_decode(path in "\\PC{1,20}") {
        prop_assert_eq!(unquote_path(&c_quote(&path)), path);
    }
}
