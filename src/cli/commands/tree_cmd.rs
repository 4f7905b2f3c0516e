//! tree command - List a tree at a revision

use super::print_json;
use crate::cli::Context;
use crate::core::types::ObjectKind;
use crate::views::tree::{BlobEntry, TreeEntry};
use crate::views::{Order, Visit};
use anyhow::{Context as _, Result};
use serde::Serialize;

/// One printed row.
#[derive(Debug, Serialize)]
struct Row {
    mode: String,
    kind: ObjectKind,
    id: String,
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<u64>,
}

impl Row {
    fn from_entry(entry: &TreeEntry, long: bool) -> Result<Self> {
        let (kind, size) = match entry {
            TreeEntry::Tree(_) => (ObjectKind::Tree, None),
            TreeEntry::Blob(blob) => (ObjectKind::Blob, blob_size(blob, long)?),
            TreeEntry::Other(info) => (info.kind, None),
        };
        Ok(Self {
            mode: entry.mode().to_string(),
            kind,
            id: entry.id().map(|id| id.to_string()).unwrap_or_default(),
            path: entry.path().to_string(),
            size,
        })
    }
}

fn blob_size(blob: &BlobEntry, long: bool) -> Result<Option<u64>> {
    if !long {
        return Ok(None);
    }
    let size = blob
        .size()
        .with_context(|| format!("Failed to read size of '{}'", blob.path()))?;
    Ok(Some(size))
}

/// List the tree of `rev`, optionally below `path`.
pub fn tree(ctx: &Context, path: Option<&str>, rev: &str, recursive: bool, long: bool) -> Result<()> {
    let session = ctx.open()?;
    let node = match path {
        Some(p) => session.repo.tree_at(rev, p),
        None => session.repo.tree(rev),
    };

    let mut rows = Vec::new();
    if recursive {
        node.traverse(Order::Pre, |visit| {
            for blob in visit.blobs {
                rows.push(TreeEntry::Blob(blob.clone()));
            }
            Ok(Visit::Continue)
        })
        .with_context(|| format!("Failed to walk tree at {}", rev))?;
    } else {
        let children = node
            .children()
            .with_context(|| format!("Failed to list tree at {}", rev))?;
        rows.extend(children.iter().cloned());
    }

    let rows = rows
        .iter()
        .map(|entry| Row::from_entry(entry, long))
        .collect::<Result<Vec<_>>>()?;

    if ctx.json {
        return print_json(&rows);
    }
    for row in &rows {
        let size = match row.size {
            Some(size) => format!(" {:>8}", size),
            None if long => format!(" {:>8}", "-"),
            None => String::new(),
        };
        println!("{} {} {}{}\t{}", row.mode, row.kind, row.id, size, row.path);
    }
    Ok(())
}
