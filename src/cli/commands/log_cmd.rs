//! log command - List commit ids reachable from a revision

use super::print_json;
use crate::cli::Context;
use crate::git::Page;
use anyhow::{Context as _, Result};

/// Print commit ids newest first.
pub fn log(ctx: &Context, rev: &str, max_count: Option<usize>, skip: Option<usize>) -> Result<()> {
    let session = ctx.open()?;
    let ids = session
        .repo
        .rev_list(rev, Page { max_count, skip })
        .with_context(|| format!("Failed to list history of {}", rev))?;

    if ctx.json {
        return print_json(&ids);
    }
    for id in &ids {
        println!("{}", id);
    }
    Ok(())
}
