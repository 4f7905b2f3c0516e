//! blame command - Show who last changed each line of a file

use super::print_json;
use crate::cli::Context;
use crate::views::blame::BlameEntry;
use anyhow::{Context as _, Result};

/// Print per-line attribution for `path` at `rev`.
pub fn blame(ctx: &Context, path: &str, rev: &str, lines: Option<(usize, usize)>) -> Result<()> {
    let session = ctx.open()?;
    let entries = session
        .repo
        .blame_lines(rev, path, lines)
        .with_context(|| format!("Failed to blame '{}' at {}", path, rev))?;

    if ctx.json {
        return print_json(&entries);
    }

    let first = lines.map(|(start, _)| start).unwrap_or(1);
    let author_width = entries
        .iter()
        .map(|e| e.commit.author.name.chars().count())
        .max()
        .unwrap_or(0);
    for (offset, entry) in entries.iter().enumerate() {
        println!("{}", format_line(entry, first + offset, author_width));
    }
    Ok(())
}

fn format_line(entry: &BlameEntry, line_no: usize, author_width: usize) -> String {
    let commit = &entry.commit;
    let date = commit
        .authored_at()
        .map(|at| at.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "?".repeat(10));
    let marker = if commit.boundary { "^" } else { "" };
    format!(
        "{}{} ({:<width$} {}) {:>4}| {}",
        marker,
        commit.id.short(8),
        commit.author.name,
        date,
        line_no,
        entry.text,
        width = author_width
    )
}
