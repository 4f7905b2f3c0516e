//! views
//!
//! Typed views built from plumbing output.
//!
//! # Modules
//!
//! - [`status`]: working-tree status snapshot
//! - [`conflict`]: conflict-marker sections of merged files
//! - [`blame`]: per-line attribution
//! - [`tree`]: lazily loaded tree objects
//! - [`submodule`]: the submodule forest of a commit
//!
//! Every view reaches git only through [`crate::git::Repo`], so all of them
//! can be exercised against [`crate::git::mock::MockGateway`].

pub mod blame;
pub mod conflict;
pub mod status;
pub mod submodule;
pub mod tree;

/// Memo slot for data fetched at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Lazy<T> {
    #[default]
    Unloaded,
    Loaded(T),
}

impl<T> Lazy<T> {
    pub fn get(&self) -> Option<&T> {
        match self {
            Lazy::Unloaded => None,
            Lazy::Loaded(value) => Some(value),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Lazy::Loaded(_))
    }
}

/// When a traversal calls the visitor relative to a node's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Node first, then its children.
    Pre,
    /// Children first, then the node.
    Post,
}

/// Visitor verdict for a traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Continue,
    /// Do not descend below this node. Ignored in post-order, where the
    /// children have already been visited.
    SkipSubtree,
}
