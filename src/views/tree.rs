//! views::tree
//!
//! Tree objects whose children are listed on first access.
//!
//! # Design
//!
//! A [`TreeNode`] starts unbaked: it knows what to list (an object id, a
//! revision, or `rev:path`) but not its children. The first call to
//! [`TreeNode::children`] runs one `ls-tree` and stores the result; later
//! calls reuse it for the node's whole life. Subtrees built from that
//! listing are unbaked in turn, so a lookup only lists the directories it
//! passes through.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use plumbview::git::mock::MockGateway;
//! use plumbview::git::Repo;
//!
//! let mock = MockGateway::new();
//! mock.respond(
//!     &["ls-tree", "HEAD"],
//!     "100644 blob e69de29bb2d1d6434b8b29ae775ad8c2e48c5391\tREADME.md\n",
//! );
//! let repo = Repo::new("/repo", Rc::new(mock.clone()));
//!
//! let root = repo.tree("HEAD");
//! assert!(root.lookup("README.md").unwrap().is_some());
//! assert!(root.lookup("missing").unwrap().is_none());
//! assert_eq!(mock.call_count(&["ls-tree", "HEAD"]), 1);
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::core::types::{FileMode, ObjectKind, Oid};
use crate::git::rows::{parse_tree_rows, TreeRow};
use crate::git::{GitError, Repo, Subcommand};

use super::{Lazy, Order, Visit};

/// Id, mode and location shared by every kind of entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub id: Oid,
    pub mode: FileMode,
    pub kind: ObjectKind,
    pub name: String,
    /// Slash-joined path from the root of the listing.
    pub path: String,
}

/// One child of a tree.
#[derive(Debug, Clone)]
pub enum TreeEntry {
    Tree(Rc<TreeNode>),
    Blob(Rc<BlobEntry>),
    /// An entry without a richer model, such as a submodule gitlink.
    Other(EntryInfo),
}

impl TreeEntry {
    fn from_row(repo: &Repo, parent_path: &str, row: TreeRow) -> Result<Self, GitError> {
        let Some(kind) = ObjectKind::parse(&row.kind) else {
            return Err(GitError::InvalidObjectKind {
                line: format!("{} {} {}\t{}", row.mode, row.kind, row.id, row.name),
                kind: row.kind,
            });
        };
        let info = EntryInfo {
            path: join_path(parent_path, &row.name),
            id: row.id,
            mode: row.mode,
            kind,
            name: row.name,
        };
        Ok(match kind {
            ObjectKind::Tree => TreeEntry::Tree(Rc::new(TreeNode::unbaked(repo.clone(), info))),
            ObjectKind::Blob | ObjectKind::Link => {
                TreeEntry::Blob(Rc::new(BlobEntry::new(repo.clone(), info)))
            }
            ObjectKind::Commit | ObjectKind::Tag => TreeEntry::Other(info),
        })
    }

    pub fn name(&self) -> &str {
        match self {
            TreeEntry::Tree(node) => node.name(),
            TreeEntry::Blob(blob) => &blob.info.name,
            TreeEntry::Other(info) => &info.name,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            TreeEntry::Tree(node) => node.path(),
            TreeEntry::Blob(blob) => &blob.info.path,
            TreeEntry::Other(info) => &info.path,
        }
    }

    pub fn id(&self) -> Option<&Oid> {
        match self {
            TreeEntry::Tree(node) => node.id(),
            TreeEntry::Blob(blob) => Some(&blob.info.id),
            TreeEntry::Other(info) => Some(&info.id),
        }
    }

    pub fn mode(&self) -> FileMode {
        match self {
            TreeEntry::Tree(node) => node.mode(),
            TreeEntry::Blob(blob) => blob.info.mode,
            TreeEntry::Other(info) => info.mode,
        }
    }

    pub fn as_tree(&self) -> Option<&Rc<TreeNode>> {
        match self {
            TreeEntry::Tree(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&Rc<BlobEntry>> {
        match self {
            TreeEntry::Blob(blob) => Some(blob),
            _ => None,
        }
    }

    /// True for a submodule gitlink.
    pub fn is_gitlink(&self) -> bool {
        matches!(self, TreeEntry::Other(info) if info.kind == ObjectKind::Commit)
    }
}

/// A directory in a tree listing.
#[derive(Debug)]
pub struct TreeNode {
    repo: Repo,
    /// Argument handed to `ls-tree`.
    treeish: String,
    id: Option<Oid>,
    mode: FileMode,
    name: String,
    path: String,
    children: RefCell<Lazy<Rc<[TreeEntry]>>>,
}

impl TreeNode {
    /// Node for the tree of `rev`, or of `rev:path` when a path is given.
    ///
    /// Nothing is fetched until children are requested, so a bad revision
    /// surfaces on first access.
    pub fn at_revision(repo: Repo, rev: &str, path: Option<&str>) -> Self {
        let path = path.map(|p| p.trim_matches('/')).unwrap_or_default();
        let treeish = if path.is_empty() {
            rev.to_string()
        } else {
            format!("{rev}:{path}")
        };
        let name = path.rsplit('/').next().unwrap_or_default().to_string();
        Self {
            repo,
            treeish,
            id: None,
            mode: FileMode::tree(),
            name,
            path: path.to_string(),
            children: RefCell::new(Lazy::Unloaded),
        }
    }

    /// Node for a tree object known only by its listing entry.
    pub fn unbaked(repo: Repo, info: EntryInfo) -> Self {
        Self {
            repo,
            treeish: info.id.to_string(),
            id: Some(info.id),
            mode: info.mode,
            name: info.name,
            path: info.path,
            children: RefCell::new(Lazy::Unloaded),
        }
    }

    /// Object id, unknown for nodes bound to a revision.
    pub fn id(&self) -> Option<&Oid> {
        self.id.as_ref()
    }

    pub fn mode(&self) -> FileMode {
        self.mode
    }

    /// Last path component; empty for a revision root.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn repo(&self) -> &Repo {
        &self.repo
    }

    /// True once the children have been listed.
    pub fn is_baked(&self) -> bool {
        self.children.borrow().is_loaded()
    }

    /// Children in listing order, fetched on first call only.
    pub fn children(&self) -> Result<Rc<[TreeEntry]>, GitError> {
        if let Some(children) = self.children.borrow().get() {
            return Ok(Rc::clone(children));
        }

        let out = self
            .repo
            .run(&self.repo.invocation(Subcommand::LsTree).arg(&self.treeish))?;
        let children: Rc<[TreeEntry]> = parse_tree_rows(&out)?
            .into_iter()
            .map(|row| TreeEntry::from_row(&self.repo, &self.path, row))
            .collect::<Result<Vec<_>, _>>()?
            .into();
        debug!(treeish = %self.treeish, count = children.len(), "baked tree node");

        *self.children.borrow_mut() = Lazy::Loaded(Rc::clone(&children));
        Ok(children)
    }

    /// Find the entry at a slash-separated path below this node.
    ///
    /// Names match exactly and case-sensitively. Subtrees along the way are
    /// baked as needed. An empty path, a missing segment, or a path that
    /// runs through a non-tree entry is a miss.
    pub fn lookup(&self, path: &str) -> Result<Option<TreeEntry>, GitError> {
        let mut segments = path.split('/').filter(|s| !s.is_empty()).peekable();
        let mut children = self.children()?;

        while let Some(segment) = segments.next() {
            let Some(entry) = children.iter().find(|e| e.name() == segment).cloned() else {
                return Ok(None);
            };
            if segments.peek().is_none() {
                return Ok(Some(entry));
            }
            match entry {
                TreeEntry::Tree(node) => children = node.children()?,
                _ => return Ok(None),
            }
        }
        Ok(None)
    }

    /// Walk this node and every subtree below it.
    ///
    /// In pre-order a [`Visit::SkipSubtree`] keeps the walk out of that
    /// node's children; in post-order it has no effect. The first visitor
    /// error stops the walk and is returned.
    pub fn traverse<F>(&self, order: Order, mut visitor: F) -> Result<(), GitError>
    where
        F: FnMut(&TreeVisit<'_>) -> Result<Visit, GitError>,
    {
        self.walk(order, &mut visitor)
    }

    fn walk<F>(&self, order: Order, visitor: &mut F) -> Result<(), GitError>
    where
        F: FnMut(&TreeVisit<'_>) -> Result<Visit, GitError>,
    {
        let children = self.children()?;
        let trees: Vec<Rc<TreeNode>> = children.iter().filter_map(TreeEntry::as_tree).cloned().collect();
        let blobs: Vec<Rc<BlobEntry>> = children.iter().filter_map(TreeEntry::as_blob).cloned().collect();
        let visit = TreeVisit {
            name: &self.name,
            path: &self.path,
            trees: &trees,
            blobs: &blobs,
        };

        match order {
            Order::Pre => {
                if visitor(&visit)? == Visit::SkipSubtree {
                    return Ok(());
                }
                for tree in &trees {
                    tree.walk(order, visitor)?;
                }
            }
            Order::Post => {
                for tree in &trees {
                    tree.walk(order, visitor)?;
                }
                visitor(&visit)?;
            }
        }
        Ok(())
    }
}

/// What a traversal visitor sees for one tree.
#[derive(Debug)]
pub struct TreeVisit<'a> {
    pub name: &'a str,
    pub path: &'a str,
    pub trees: &'a [Rc<TreeNode>],
    pub blobs: &'a [Rc<BlobEntry>],
}

/// A file in a tree listing.
#[derive(Debug)]
pub struct BlobEntry {
    repo: Repo,
    info: EntryInfo,
    size: RefCell<Lazy<u64>>,
}

impl BlobEntry {
    fn new(repo: Repo, info: EntryInfo) -> Self {
        Self {
            repo,
            info,
            size: RefCell::new(Lazy::Unloaded),
        }
    }

    pub fn info(&self) -> &EntryInfo {
        &self.info
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn path(&self) -> &str {
        &self.info.path
    }

    pub fn id(&self) -> &Oid {
        &self.info.id
    }

    pub fn is_symlink(&self) -> bool {
        self.info.mode.is_symlink() || self.info.kind == ObjectKind::Link
    }

    pub fn is_executable(&self) -> bool {
        self.info.mode.is_executable()
    }

    /// Size in bytes, fetched once.
    pub fn size(&self) -> Result<u64, GitError> {
        if let Some(size) = self.size.borrow().get() {
            return Ok(*size);
        }
        let size = self.repo.object_size(&self.info.id)?;
        *self.size.borrow_mut() = Lazy::Loaded(size);
        Ok(size)
    }

    /// Full content. Not cached.
    pub fn content(&self) -> Result<String, GitError> {
        self.repo.blob_content(&self.info.id)
    }
}

fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}
