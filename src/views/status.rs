//! views::status
//!
//! Working-tree status snapshot reconciled from independent plumbing queries.
//!
//! # Queries
//!
//! | Listing   | Command                                              |
//! |-----------|------------------------------------------------------|
//! | index     | `ls-files --stage`                                   |
//! | untracked | `ls-files --others --exclude-standard`               |
//! | modified  | `diff-files --raw --diff-filter=M`                   |
//! | deleted   | `diff-files --raw --diff-filter=D`                   |
//! | unmerged  | `diff-files --raw --diff-filter=U`                   |
//! | added     | `diff-index --cached --raw --no-renames --diff-filter=A HEAD` |
//!
//! # Reconciliation order
//!
//! The order is fixed and decides precedence:
//!
//! 1. Every index row becomes an `Unmodified` record (the base set).
//! 2. Untracked paths are added as path-only records, never replacing a
//!    tracked path.
//! 3. Modified rows set the repo side and mark the record `Modified`.
//! 4. Deleted rows mark the record `Deleted`.
//! 5. Unmerged rows mark the record `Conflicted`, overriding 3 and 4.
//! 6. Added rows mark the record `Added`.
//!
//! The queries run one after another with no atomicity between them; a
//! repository mutated mid-snapshot can produce a mixed view.
//!
//! # Example
//!
//! ```
//! use plumbview::git::rows::{parse_diff_rows, parse_index_rows};
//! use plumbview::views::status::{ChangeKind, Listings, Status};
//!
//! let id = "8ab686eafeb1f44702738c8b0f24f2567c36da6d";
//! let zero = "0000000000000000000000000000000000000000";
//! let listings = Listings {
//!     index: parse_index_rows(&format!("100644 {id} 0\tsrc/lib.rs\n")).unwrap(),
//!     modified: parse_diff_rows(&format!(":100644 100644 {id} {zero} M\tsrc/lib.rs\n")).unwrap(),
//!     ..Default::default()
//! };
//! let status = Status::reconcile(listings);
//! assert_eq!(status.get("src/lib.rs").unwrap().kind, ChangeKind::Modified);
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, warn};

use crate::core::types::{FileMode, Oid};
use crate::git::rows::{parse_diff_rows, parse_index_rows, parse_path_list, DiffRow, IndexRow};
use crate::git::{GitError, Repo, Subcommand};

/// How a path differs from the index and HEAD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Unmodified,
    Modified,
    Added,
    Deleted,
    Conflicted,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ChangeKind::Unmodified => "unmodified",
            ChangeKind::Modified => "modified",
            ChangeKind::Added => "added",
            ChangeKind::Deleted => "deleted",
            ChangeKind::Conflicted => "conflicted",
        };
        f.write_str(s)
    }
}

/// Mode and content id of one side of a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntrySide {
    pub mode: FileMode,
    pub id: Oid,
}

/// Status of a single path.
///
/// Untracked records carry only the path; every side is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusRecord {
    pub path: String,
    pub kind: ChangeKind,
    pub untracked: bool,
    /// Merge stage of the index row the record was built from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<u8>,
    /// What the index holds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<EntrySide>,
    /// What the comparison target holds (worktree or HEAD).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<EntrySide>,
}

impl StatusRecord {
    fn tracked(row: IndexRow) -> Self {
        Self {
            path: row.path,
            kind: ChangeKind::Unmodified,
            untracked: false,
            stage: Some(row.stage),
            index: Some(EntrySide {
                mode: row.mode,
                id: row.id,
            }),
            repo: None,
        }
    }

    fn untracked(path: String) -> Self {
        Self {
            path,
            kind: ChangeKind::Unmodified,
            untracked: true,
            stage: None,
            index: None,
            repo: None,
        }
    }
}

/// Raw query results, already parsed into rows.
///
/// Kept separate from [`Status::snapshot`] so the reconciliation can be
/// exercised without a gateway.
#[derive(Debug, Clone, Default)]
pub struct Listings {
    pub index: Vec<IndexRow>,
    pub untracked: Vec<String>,
    pub modified: Vec<DiffRow>,
    pub deleted: Vec<DiffRow>,
    pub unmerged: Vec<DiffRow>,
    pub added: Vec<DiffRow>,
}

/// Immutable per-path status snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Status {
    records: BTreeMap<String, StatusRecord>,
}

impl Status {
    /// Query `repo` and reconcile the results.
    ///
    /// # Errors
    ///
    /// Any failing query aborts the snapshot, with one exception: the
    /// HEAD comparison fails on a repository without commits, and that
    /// failure is ignored when no branch exists.
    pub fn snapshot(repo: &Repo) -> Result<Self, GitError> {
        let index = parse_index_rows(&repo.run(&repo.invocation(Subcommand::LsFiles).switch("stage"))?)?;

        let untracked = if repo.settings().include_untracked {
            parse_path_list(&repo.run(
                &repo
                    .invocation(Subcommand::LsFiles)
                    .switch("others")
                    .switch("exclude_standard"),
            )?)
        } else {
            Vec::new()
        };

        let worktree_diff = |filter: &str| -> Result<Vec<DiffRow>, GitError> {
            let inv = repo
                .invocation(Subcommand::DiffFiles)
                .switch("raw")
                .value("diff_filter", filter);
            parse_diff_rows(&repo.run(&inv)?)
        };
        let modified = worktree_diff("M")?;
        let deleted = worktree_diff("D")?;
        let unmerged = worktree_diff("U")?;

        let head_diff = repo
            .invocation(Subcommand::DiffIndex)
            .switch("cached")
            .switch("raw")
            .switch("no_renames")
            .value("diff_filter", "A")
            .arg("HEAD");
        let added = match repo.run(&head_diff) {
            Ok(out) => parse_diff_rows(&out)?,
            Err(err) if err.is_command_failure() => {
                if repo.has_branches()? {
                    return Err(err);
                }
                warn!(error = %err, "HEAD comparison failed in a repository without branches; no staged additions reported");
                Vec::new()
            }
            Err(err) => return Err(err),
        };

        let status = Self::reconcile(Listings {
            index,
            untracked,
            modified,
            deleted,
            unmerged,
            added,
        });
        debug!(paths = status.len(), work_dir = %repo.work_dir().display(), "status snapshot taken");
        Ok(status)
    }

    /// Apply the fixed overlay order to already parsed listings.
    pub fn reconcile(listings: Listings) -> Self {
        let mut records: BTreeMap<String, StatusRecord> = BTreeMap::new();

        for row in listings.index {
            records.insert(row.path.clone(), StatusRecord::tracked(row));
        }

        for path in listings.untracked {
            if !records.contains_key(&path) {
                records.insert(path.clone(), StatusRecord::untracked(path));
            }
        }

        for row in listings.modified {
            if !row.sides_differ() {
                debug!(path = %row.path, "ignoring modified row with identical sides");
                continue;
            }
            if let Some(record) = tracked_mut(&mut records, &row.path) {
                record.repo = Some(EntrySide {
                    mode: row.dst_mode,
                    id: row.dst_id,
                });
                record.kind = ChangeKind::Modified;
            }
        }

        for row in listings.deleted {
            if let Some(record) = tracked_mut(&mut records, &row.path) {
                record.kind = ChangeKind::Deleted;
            }
        }

        for row in listings.unmerged {
            if let Some(record) = tracked_mut(&mut records, &row.path) {
                record.kind = ChangeKind::Conflicted;
            }
        }

        for row in listings.added {
            match tracked_mut(&mut records, &row.path) {
                Some(record) => record.kind = ChangeKind::Added,
                None => {
                    let record = StatusRecord {
                        path: row.path.clone(),
                        kind: ChangeKind::Added,
                        untracked: false,
                        stage: None,
                        index: Some(EntrySide {
                            mode: row.dst_mode,
                            id: row.dst_id,
                        }),
                        repo: None,
                    };
                    records.insert(row.path, record);
                }
            }
        }

        Self { records }
    }

    pub fn get(&self, path: &str) -> Option<&StatusRecord> {
        self.records.get(path)
    }

    /// All records in path order.
    pub fn records(&self) -> impl Iterator<Item = &StatusRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Paths modified in the worktree.
    pub fn changed(&self) -> impl Iterator<Item = &StatusRecord> {
        self.of_kind(ChangeKind::Modified)
    }

    pub fn conflicted(&self) -> impl Iterator<Item = &StatusRecord> {
        self.of_kind(ChangeKind::Conflicted)
    }

    /// Paths staged as new relative to HEAD.
    pub fn added(&self) -> impl Iterator<Item = &StatusRecord> {
        self.of_kind(ChangeKind::Added)
    }

    pub fn deleted(&self) -> impl Iterator<Item = &StatusRecord> {
        self.of_kind(ChangeKind::Deleted)
    }

    pub fn untracked(&self) -> impl Iterator<Item = &StatusRecord> {
        self.records.values().filter(|r| r.untracked)
    }

    /// Union of changed and added paths.
    pub fn modified_names(&self) -> BTreeSet<&str> {
        self.changed()
            .chain(self.added())
            .map(|r| r.path.as_str())
            .collect()
    }

    fn of_kind(&self, kind: ChangeKind) -> impl Iterator<Item = &StatusRecord> {
        self.records
            .values()
            .filter(move |r| !r.untracked && r.kind == kind)
    }
}

/// Look up a record that came from the index; untracked records never
/// take overlays.
fn tracked_mut<'a>(
    records: &'a mut BTreeMap<String, StatusRecord>,
    path: &str,
) -> Option<&'a mut StatusRecord> {
    records.get_mut(path).filter(|r| !r.untracked)
}
