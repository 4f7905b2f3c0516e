//! views::submodule
//!
//! The submodule forest recorded at a commit.
//!
//! # Manifest
//!
//! `.gitmodules` is read from the commit's tree, not the worktree, so the
//! forest reflects what the commit records. Each `[submodule "name"]`
//! section must carry a `path`; `url` and `branch` are optional. The
//! gitlink entry at that path pins the submodule's commit.
//!
//! # Traversal
//!
//! [`walk_submodules`] recurses depth-first into every nested repository,
//! reading nested manifests at the pinned commit (or `HEAD` when nothing is
//! pinned). Nested trees are listed from inside the nested checkout, so a
//! submodule that was never initialized is visited as a leaf and logged at
//! warn level. Cycles are not detected.

use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use crate::core::types::Oid;
use crate::git::{GitError, Repo};

use super::tree::TreeEntry;
use super::{Order, Visit};

const MANIFEST: &str = ".gitmodules";

/// One `[submodule "name"]` section of a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub name: String,
    pub path: String,
    pub url: Option<String>,
    pub branch: Option<String>,
}

/// Section being filled while reading a manifest.
struct Section {
    name: String,
    path: Option<String>,
    url: Option<String>,
    branch: Option<String>,
}

impl Section {
    fn finish(self) -> Result<ManifestEntry, GitError> {
        let Some(path) = self.path else {
            return Err(GitError::malformed(
                "submodule manifest",
                format!("submodule {:?} has no path", self.name),
            ));
        };
        Ok(ManifestEntry {
            name: self.name,
            path: path.trim_matches('/').to_string(),
            url: self.url,
            branch: self.branch,
        })
    }
}

/// Parse git-config style `.gitmodules` text.
///
/// Sections other than `submodule` are skipped, as are unknown keys. Keys
/// compare case-insensitively, as git does.
pub fn parse_manifest(text: &str) -> Result<Vec<ManifestEntry>, GitError> {
    const CONTEXT: &str = "submodule manifest";

    let mut entries = Vec::new();
    // None: outside any section; Some(None): inside a non-submodule section
    let mut current: Option<Option<Section>> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(header) = line.strip_prefix('[') {
            let header = header
                .strip_suffix(']')
                .ok_or_else(|| GitError::malformed(CONTEXT, format!("bad section: {line}")))?;
            if let Some(Some(section)) = current.take() {
                entries.push(section.finish()?);
            }
            current = Some(parse_section_header(header).map(|name| Section {
                name,
                path: None,
                url: None,
                branch: None,
            }));
            continue;
        }

        let Some(slot) = current.as_mut() else {
            return Err(GitError::malformed(CONTEXT, format!("key outside section: {line}")));
        };
        let Some(section) = slot.as_mut() else {
            continue;
        };
        let (key, value) = line
            .split_once('=')
            .map(|(k, v)| (k.trim(), unquote(v.trim())))
            .ok_or_else(|| GitError::malformed(CONTEXT, format!("expected key = value: {line}")))?;
        match key.to_ascii_lowercase().as_str() {
            "path" => section.path = Some(value),
            "url" => section.url = Some(value),
            "branch" => section.branch = Some(value),
            _ => {}
        }
    }

    if let Some(Some(section)) = current {
        entries.push(section.finish()?);
    }
    Ok(entries)
}

/// Name of a `submodule "name"` header, `None` for any other section.
fn parse_section_header(header: &str) -> Option<String> {
    let (kind, rest) = header.trim().split_once(char::is_whitespace)?;
    if !kind.eq_ignore_ascii_case("submodule") {
        return None;
    }
    let name = rest.trim().strip_prefix('"')?.strip_suffix('"')?;
    Some(name.to_string())
}

fn unquote(value: &str) -> String {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
        .to_string()
}

/// A submodule bound to the commit its parent records for it.
#[derive(Debug)]
pub struct SubmoduleNode {
    name: String,
    path: String,
    full_path: String,
    url: Option<String>,
    branch: Option<String>,
    commit: Option<Oid>,
    parent_repo: Repo,
    parent: Option<Weak<SubmoduleNode>>,
}

impl SubmoduleNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path relative to the owning repository.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path relative to the root of the forest.
    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    /// Commit pinned by the gitlink, if the path holds one.
    pub fn commit(&self) -> Option<&Oid> {
        self.commit.as_ref()
    }

    /// The repository whose manifest lists this submodule.
    pub fn parent_repo(&self) -> &Repo {
        &self.parent_repo
    }

    /// The enclosing submodule, while it is still alive.
    pub fn parent(&self) -> Option<Rc<SubmoduleNode>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    /// Handle for the submodule's own checkout.
    pub fn module(&self) -> Repo {
        self.parent_repo.submodule_repo(&self.path)
    }

    /// Revision nested manifests are read at.
    fn nested_rev(&self) -> String {
        self.commit
            .as_ref()
            .map(Oid::to_string)
            .unwrap_or_else(|| "HEAD".to_string())
    }
}

/// Direct submodules of `repo` as recorded at `commit`.
///
/// A commit without a manifest has no submodules. `parent` links the
/// returned nodes into an existing forest.
pub fn list_submodules(
    repo: &Repo,
    commit: &str,
    parent: Option<&Rc<SubmoduleNode>>,
) -> Result<Vec<Rc<SubmoduleNode>>, GitError> {
    let root = repo.tree(commit);
    let Some(TreeEntry::Blob(manifest)) = root.lookup(MANIFEST)? else {
        return Ok(Vec::new());
    };
    let entries = parse_manifest(&manifest.content()?)?;
    debug!(
        repo = %repo.work_dir().display(),
        commit,
        count = entries.len(),
        "read submodule manifest"
    );

    entries
        .into_iter()
        .map(|entry| {
            let commit = root
                .lookup(&entry.path)?
                .filter(TreeEntry::is_gitlink)
                .and_then(|gitlink| gitlink.id().cloned());
            let full_path = match parent {
                Some(p) => format!("{}/{}", p.full_path, entry.path),
                None => entry.path.clone(),
            };
            Ok(Rc::new(SubmoduleNode {
                name: entry.name,
                path: entry.path,
                full_path,
                url: entry.url,
                branch: entry.branch,
                commit,
                parent_repo: repo.clone(),
                parent: parent.map(Rc::downgrade),
            }))
        })
        .collect()
}

/// What a submodule visitor sees.
#[derive(Debug)]
pub struct SubmoduleVisit<'a> {
    /// The repository that records this submodule; the root repository for
    /// the root visit.
    pub repo: &'a Repo,
    /// The submodule's own checkout, or the root repository.
    pub module: &'a Repo,
    /// Submodule name; empty for the root.
    pub name: &'a str,
    /// Slash-joined path from the root; empty for the root.
    pub path: &'a str,
    /// `None` for the root.
    pub node: Option<&'a Rc<SubmoduleNode>>,
    /// False when the nested directory is not its own repository, in
    /// which case its nested submodules are not walked.
    pub checked_out: bool,
}

/// Visit every submodule reachable from `commit` in `repo`.
///
/// The root is visited only when `include_root` is set. In pre-order a
/// [`Visit::SkipSubtree`] keeps the walk out of that node's own nested
/// submodules and nothing else; in post-order it has no effect. Visitor
/// errors stop the walk.
pub fn walk_submodules<F>(
    repo: &Repo,
    commit: &str,
    order: Order,
    include_root: bool,
    mut visitor: F,
) -> Result<(), GitError>
where
    F: FnMut(&SubmoduleVisit<'_>) -> Result<Visit, GitError>,
{
    let root = SubmoduleVisit {
        repo,
        module: repo,
        name: "",
        path: "",
        node: None,
        checked_out: true,
    };

    if include_root && order == Order::Pre && visitor(&root)? == Visit::SkipSubtree {
        return Ok(());
    }
    walk_level(repo, commit, None, order, &mut visitor)?;
    if include_root && order == Order::Post {
        visitor(&root)?;
    }
    Ok(())
}

fn walk_level<F>(
    repo: &Repo,
    commit: &str,
    parent: Option<&Rc<SubmoduleNode>>,
    order: Order,
    visitor: &mut F,
) -> Result<(), GitError>
where
    F: FnMut(&SubmoduleVisit<'_>) -> Result<Visit, GitError>,
{
    for node in list_submodules(repo, commit, parent)? {
        let module = node.module();
        let checked_out = module.is_checked_out()?;
        if !checked_out {
            warn!(
                path = node.full_path(),
                "submodule is not checked out; nested submodules not walked"
            );
        }
        let visit = SubmoduleVisit {
            repo,
            module: &module,
            name: node.name(),
            path: node.full_path(),
            node: Some(&node),
            checked_out,
        };
        let nested_rev = node.nested_rev();

        match order {
            Order::Pre => {
                if visitor(&visit)? == Visit::SkipSubtree || !checked_out {
                    continue;
                }
                walk_level(&module, &nested_rev, Some(&node), order, visitor)?;
            }
            Order::Post => {
                if checked_out {
                    walk_level(&module, &nested_rev, Some(&node), order, visitor)?;
                }
                visitor(&visit)?;
            }
        }
    }
    Ok(())
}
