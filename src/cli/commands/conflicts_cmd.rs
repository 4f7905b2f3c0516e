//! conflicts command - Show and resolve conflict sections left by a merge

use super::print_json;
use crate::cli::args::SideArg;
use crate::cli::Context;
use crate::views::conflict::{FileConflict, Side};
use anyhow::{bail, Context as _, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// Options of the conflicts command.
#[derive(Debug, Default)]
pub struct ConflictOptions<'a> {
    pub path: Option<&'a str>,
    pub ours: Option<&'a str>,
    pub theirs: Option<&'a str>,
    pub take: Option<SideArg>,
    pub resolve: bool,
}

#[derive(Debug, Serialize)]
struct FileReport<'a> {
    path: &'a str,
    conflicts: usize,
    sections: Vec<SectionReport<'a>>,
}

#[derive(Debug, Serialize)]
struct SectionReport<'a> {
    index: usize,
    sides: BTreeMap<&'a str, &'a [String]>,
}

fn report(file: &FileConflict) -> FileReport<'_> {
    FileReport {
        path: file.path(),
        conflicts: file.conflict_count(),
        sections: file
            .sections()
            .iter()
            .map(|section| SectionReport {
                index: section.index(),
                sides: section.labeled().collect(),
            })
            .collect(),
    }
}

/// Show conflicted files, optionally rewriting and staging them.
pub fn conflicts(ctx: &Context, opts: ConflictOptions<'_>) -> Result<()> {
    let session = ctx.open()?;
    let repo = &session.repo;

    let mut labels = session.config.labels();
    if let Some(ours) = opts.ours {
        labels.ours = ours.to_string();
    }
    if let Some(theirs) = opts.theirs {
        labels.theirs = theirs.to_string();
    }

    let paths: Vec<String> = match opts.path {
        Some(path) => vec![path.to_string()],
        None => repo
            .status()
            .context("Failed to take status snapshot")?
            .conflicted()
            .map(|record| record.path.clone())
            .collect(),
    };
    if (opts.take.is_some() || opts.resolve) && paths.is_empty() {
        bail!("No conflicted files to resolve");
    }

    let files = paths
        .iter()
        .map(|path| {
            repo.conflict_in(path, &labels)
                .with_context(|| format!("Failed to read '{}'", path))
        })
        .collect::<Result<Vec<_>>>()?;

    for file in &files {
        if let Some(side) = opts.take {
            let side = match side {
                SideArg::Ours => Side::Ours,
                SideArg::Theirs => Side::Theirs,
            };
            file.write_content(&file.take(side))
                .with_context(|| format!("Failed to rewrite '{}'", file.path()))?;
        }
        if opts.resolve {
            file.resolve()
                .with_context(|| format!("Failed to stage '{}'", file.path()))?;
        }
    }

    if ctx.json {
        let reports: Vec<_> = files.iter().map(report).collect();
        return print_json(&reports);
    }

    if files.is_empty() {
        println!("No conflicted files.");
    }
    for file in &files {
        let plural = if file.conflict_count() == 1 { "" } else { "s" };
        println!("{}: {} conflict{}", file.path(), file.conflict_count(), plural);
        for section in file.sections().iter().filter(|s| s.is_conflict()) {
            println!("  section {}", section.index());
            for (label, lines) in section.labeled() {
                println!("    {}:", label);
                for line in lines {
                    println!("      | {}", line);
                }
            }
        }
        if opts.take.is_some() {
            println!("  rewritten");
        }
        if opts.resolve {
            println!("  staged");
        }
    }
    Ok(())
}
