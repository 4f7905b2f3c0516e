//! git::repo
//!
//! Repository handle: a working directory bound to a shared gateway.
//!
//! A [`Repo`] is cheap to clone. Nested repositories (submodules) are
//! derived from their parent with [`Repo::submodule_repo`] and share the
//! parent's gateway, so a single mock can answer for a whole forest in
//! tests.
//!
//! Besides issuing invocations, the handle is the filesystem collaborator
//! for worktree files: [`Repo::read_file`] and [`Repo::write_file`] each
//! acquire the file, use it, and release it before returning.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::debug;

use crate::core::types::Oid;
use crate::views::blame::{parse_blame, BlameEntry};
use crate::views::conflict::{FileConflict, SideLabels};
use crate::views::status::Status;
use crate::views::submodule::{list_submodules, SubmoduleNode};
use crate::views::tree::TreeNode;

use super::commands::{Invocation, Subcommand};
use super::gateway::{CliGateway, CommandGateway};
use super::rows::parse_path_list;
use super::GitError;

/// Per-repository invocation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSettings {
    /// Let git C-quote unusual paths. Parsers unquote either way; turning
    /// this off keeps non-ASCII names readable in logs.
    pub quote_paths: bool,
    /// Include untracked files in status snapshots.
    pub include_untracked: bool,
}

impl Default for RepoSettings {
    fn default() -> Self {
        Self {
            quote_paths: false,
            include_untracked: true,
        }
    }
}

/// Pagination for history listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub max_count: Option<usize>,
    pub skip: Option<usize>,
}

/// A repository the gateway can run plumbing commands in.
#[derive(Clone)]
pub struct Repo {
    work_dir: PathBuf,
    gateway: Rc<dyn CommandGateway>,
    settings: RepoSettings,
}

impl std::fmt::Debug for Repo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repo")
            .field("work_dir", &self.work_dir)
            .field("settings", &self.settings)
            .finish()
    }
}

impl Repo {
    /// Bind `work_dir` to `gateway` without checking that it is a repository.
    pub fn new(work_dir: impl Into<PathBuf>, gateway: Rc<dyn CommandGateway>) -> Self {
        Self {
            work_dir: work_dir.into(),
            gateway,
            settings: RepoSettings::default(),
        }
    }

    /// Find the repository containing `path` using the system git.
    ///
    /// `path` may be any directory inside the working tree.
    pub fn discover(path: &Path) -> Result<Self, GitError> {
        Self::discover_with(path, Rc::new(CliGateway::new()))
    }

    /// Find the repository containing `path` through `gateway`.
    pub fn discover_with(path: &Path, gateway: Rc<dyn CommandGateway>) -> Result<Self, GitError> {
        let inv = Invocation::new(Subcommand::RevParse, path).switch("show_toplevel");
        let top = gateway.invoke(&inv)?;
        let top = top.trim();
        if top.is_empty() {
            return Err(GitError::malformed(
                "rev-parse output",
                "empty toplevel (bare repository?)",
            ));
        }
        Ok(Self::new(top, gateway))
    }

    /// Replace the invocation settings.
    pub fn with_settings(mut self, settings: RepoSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn settings(&self) -> &RepoSettings {
        &self.settings
    }

    /// Start an invocation rooted at this repository.
    pub fn invocation(&self, subcommand: Subcommand) -> Invocation {
        Invocation::new(subcommand, &self.work_dir).quote_paths(self.settings.quote_paths)
    }

    /// Run an invocation through the gateway.
    pub fn run(&self, invocation: &Invocation) -> Result<String, GitError> {
        self.gateway.invoke(invocation)
    }

    /// Handle for the nested repository checked out at `rel_path`.
    pub fn submodule_repo(&self, rel_path: &str) -> Repo {
        Repo {
            work_dir: self.work_dir.join(rel_path),
            gateway: Rc::clone(&self.gateway),
            settings: self.settings.clone(),
        }
    }

    /// Check that the work dir is the top of its own repository.
    ///
    /// False for a submodule path that was never initialized: the directory
    /// is missing, or empty and so resolves to the enclosing repository.
    pub fn is_checked_out(&self) -> Result<bool, GitError> {
        let inv = self.invocation(Subcommand::RevParse).switch("show_toplevel");
        match self.run(&inv) {
            Ok(out) => Ok(self.work_dir.as_path() == Path::new(out.trim())),
            Err(GitError::ExternalCommandFailed { .. } | GitError::Spawn { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    // =========================================================================
    // Narrow helper queries
    // =========================================================================

    /// Check whether any local branch exists.
    ///
    /// False on a freshly initialized repository with no commits.
    pub fn has_branches(&self) -> Result<bool, GitError> {
        let out = self.run(
            &self
                .invocation(Subcommand::ForEachRef)
                .value("format", "%(refname)")
                .value("count", 1)
                .arg("refs/heads"),
        )?;
        Ok(!out.trim().is_empty())
    }

    /// Resolve a revision expression to an object id.
    pub fn resolve(&self, rev: &str) -> Result<Oid, GitError> {
        let out = self.run(&self.invocation(Subcommand::RevParse).switch("verify").arg(rev))?;
        Ok(Oid::new(out.trim())?)
    }

    /// Full content of a blob.
    pub fn blob_content(&self, id: &Oid) -> Result<String, GitError> {
        self.run(&self.invocation(Subcommand::CatFile).switch("pretty").arg(id.as_str()))
    }

    /// Size in bytes of an object.
    pub fn object_size(&self, id: &Oid) -> Result<u64, GitError> {
        let out = self.run(&self.invocation(Subcommand::CatFile).switch("size").arg(id.as_str()))?;
        out.trim()
            .parse()
            .map_err(|_| GitError::malformed("cat-file size", out.trim().to_string()))
    }

    /// Stage the given paths (`git add`).
    pub fn stage<I, S>(&self, paths: I) -> Result<(), GitError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.run(&self.invocation(Subcommand::Add).paths(paths))?;
        Ok(())
    }

    /// Commit ids reachable from `rev`, newest first.
    pub fn rev_list(&self, rev: &str, page: Page) -> Result<Vec<Oid>, GitError> {
        let mut inv = self.invocation(Subcommand::RevList);
        if let Some(n) = page.max_count {
            inv = inv.value("max_count", n);
        }
        if let Some(n) = page.skip {
            inv = inv.value("skip", n);
        }
        let out = self.run(&inv.arg(rev))?;
        parse_path_list(&out)
            .into_iter()
            .map(|line| Oid::new(line).map_err(GitError::from))
            .collect()
    }

    // =========================================================================
    // Worktree files
    // =========================================================================

    /// Read a worktree file, relative to the repository root.
    pub fn read_file(&self, rel_path: &str) -> Result<String, GitError> {
        let path = self.work_dir.join(rel_path);
        fs::read_to_string(&path).map_err(|source| GitError::Io { path, source })
    }

    /// Overwrite a worktree file completely.
    ///
    /// The handle is closed on every path out of this function. A failed
    /// write is not retried and may leave partial content behind.
    pub fn write_file(&self, rel_path: &str, content: &str) -> Result<(), GitError> {
        let path = self.work_dir.join(rel_path);
        debug!(path = %path.display(), bytes = content.len(), "overwriting worktree file");
        let mut file = fs::File::create(&path).map_err(|source| GitError::Io {
            path: path.clone(),
            source,
        })?;
        file.write_all(content.as_bytes())
            .map_err(|source| GitError::Io { path, source })
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// Take a status snapshot of the working tree.
    pub fn status(&self) -> Result<Status, GitError> {
        Status::snapshot(self)
    }

    /// Line attribution of `path` as of `rev`.
    pub fn blame(&self, rev: &str, path: &str) -> Result<Vec<BlameEntry>, GitError> {
        self.blame_lines(rev, path, None)
    }

    /// Line attribution restricted to an inclusive 1-based line range.
    pub fn blame_lines(
        &self,
        rev: &str,
        path: &str,
        range: Option<(usize, usize)>,
    ) -> Result<Vec<BlameEntry>, GitError> {
        let mut inv = self.invocation(Subcommand::Blame).switch("porcelain");
        if let Some((start, end)) = range {
            inv = inv.value("line_range", format!("{},{}", start, end));
        }
        let out = self.run(&inv.arg(rev).paths([path]))?;
        parse_blame(&out)
    }

    /// Root tree of a revision.
    pub fn tree(&self, rev: &str) -> TreeNode {
        TreeNode::at_revision(self.clone(), rev, None)
    }

    /// Subtree of a revision at `path`.
    pub fn tree_at(&self, rev: &str, path: &str) -> TreeNode {
        TreeNode::at_revision(self.clone(), rev, Some(path))
    }

    /// One [`FileConflict`] per conflicted path in the current status.
    pub fn conflicts(&self, ours: &str, theirs: &str) -> Result<Vec<FileConflict>, GitError> {
        let status = self.status()?;
        status
            .conflicted()
            .map(|record| FileConflict::load(self, &record.path, ours, theirs))
            .collect()
    }

    /// Parse a conflicted worktree file with explicit side labels.
    pub fn conflict_in(&self, path: &str, labels: &SideLabels) -> Result<FileConflict, GitError> {
        FileConflict::load_with_labels(self, path, labels.clone())
    }

    /// Direct submodules recorded at `commit`.
    pub fn submodules(&self, commit: &str) -> Result<Vec<Rc<SubmoduleNode>>, GitError> {
        list_submodules(self, commit, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::mock::MockGateway;
    use tempfile::TempDir;

    const A: &str = "8ab686eafeb1f44702738c8b0f24f2567c36da6d";

    fn repo(mock: &MockGateway, dir: &str) -> Repo {
        Repo::new(dir, Rc::new(mock.clone()))
    }

    #[test]
    fn discover_uses_toplevel() {
        let mock = MockGateway::new();
        mock.respond(&["rev-parse", "--show-toplevel"], "/work/project\n");
        let repo = Repo::discover_with(Path::new("/work/project/src"), Rc::new(mock)).unwrap();
        assert_eq!(repo.work_dir(), Path::new("/work/project"));
    }

    #[test]
    fn invocations_carry_quote_setting() {
        let mock = MockGateway::new();
        mock.respond(&["for-each-ref", "--format=%(refname)", "--count=1", "refs/heads"], "");
        let r = repo(&mock, "/r");
        assert!(!r.has_branches().unwrap());
        assert!(!mock.calls()[0].quote_paths);
    }

    #[test]
    fn has_branches_true_with_output() {
        let mock = MockGateway::new();
        mock.respond(
            &["for-each-ref", "--format=%(refname)", "--count=1", "refs/heads"],
            "refs/heads/main\n",
        );
        assert!(repo(&mock, "/r").has_branches().unwrap());
    }

    #[test]
    fn object_size_parses() {
        let mock = MockGateway::new();
        mock.respond(&["cat-file", "-s", A], "42\n");
        let id = Oid::new(A).unwrap();
        assert_eq!(repo(&mock, "/r").object_size(&id).unwrap(), 42);
    }

    #[test]
    fn rev_list_pagination() {
        let mock = MockGateway::new();
        mock.respond(
            &["rev-list", "--max-count=2", "--skip=1", "HEAD"],
            format!("{A}\n{A}\n"),
        );
        let page = Page {
            max_count: Some(2),
            skip: Some(1),
        };
        let ids = repo(&mock, "/r").rev_list("HEAD", page).unwrap();
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn submodule_repo_shares_gateway() {
        let mock = MockGateway::new();
        let root = repo(&mock, "/r");
        let sub = root.submodule_repo("libs/core");
        assert_eq!(sub.work_dir(), Path::new("/r/libs/core"));

        let _ = sub.has_branches();
        assert_eq!(mock.calls()[0].cwd, PathBuf::from("/r/libs/core"));
    }

    #[test]
    fn worktree_file_roundtrip() {
        let dir = TempDir::new().unwrap();
        let r = repo(&MockGateway::new(), dir.path().to_str().unwrap());
        r.write_file("a.txt", "first\n").unwrap();
        r.write_file("a.txt", "second\n").unwrap();
        assert_eq!(r.read_file("a.txt").unwrap(), "second\n");
    }

    #[test]
    fn read_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let r = repo(&MockGateway::new(), dir.path().to_str().unwrap());
        assert!(matches!(r.read_file("nope.txt"), Err(GitError::Io { .. })));
    }
}
