//! submodules command - Walk the submodule forest of a commit

use super::print_json;
use crate::cli::args::OrderArg;
use crate::cli::Context;
use crate::views::submodule::walk_submodules;
use crate::views::{Order, Visit};
use anyhow::{Context as _, Result};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct Row {
    name: String,
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    commit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<String>,
    checked_out: bool,
}

/// Print every submodule reachable from `rev`.
pub fn submodules(
    ctx: &Context,
    rev: &str,
    order: OrderArg,
    include_root: bool,
    shallow: bool,
) -> Result<()> {
    let session = ctx.open()?;
    let order = match order {
        OrderArg::Pre => Order::Pre,
        OrderArg::Post => Order::Post,
    };
    // shallow walks use pre-order so that skipping actually prunes
    let order = if shallow { Order::Pre } else { order };

    let mut rows = Vec::new();
    walk_submodules(&session.repo, rev, order, include_root, |visit| {
        let node = visit.node;
        rows.push(Row {
            name: visit.name.to_string(),
            path: visit.path.to_string(),
            commit: node.and_then(|n| n.commit()).map(|id| id.to_string()),
            url: node.and_then(|n| n.url()).map(str::to_string),
            branch: node.and_then(|n| n.branch()).map(str::to_string),
            checked_out: visit.checked_out,
        });
        Ok(if shallow && node.is_some() {
            Visit::SkipSubtree
        } else {
            Visit::Continue
        })
    })
    .with_context(|| format!("Failed to walk submodules at {}", rev))?;

    if ctx.json {
        return print_json(&rows);
    }
    if rows.is_empty() {
        println!("No submodules.");
    }
    for row in &rows {
        let path = if row.path.is_empty() { "." } else { row.path.as_str() };
        let commit = row.commit.as_deref().map(|c| &c[..c.len().min(12)]).unwrap_or("-");
        let missing = if row.checked_out { "" } else { " [not checked out]" };
        match &row.url {
            Some(url) => println!("{} {} ({}){}", commit, path, url, missing),
            None => println!("{} {}{}", commit, path, missing),
        }
    }
    Ok(())
}
