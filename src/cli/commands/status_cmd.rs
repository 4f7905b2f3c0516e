//! status command - Show how each path differs from the index and HEAD

use super::print_json;
use crate::cli::Context;
use crate::views::status::{ChangeKind, StatusRecord};
use anyhow::{Context as _, Result};

/// One-letter code for a record, `None` for an unmodified tracked path.
fn code(record: &StatusRecord) -> Option<char> {
    if record.untracked {
        return Some('?');
    }
    match record.kind {
        ChangeKind::Unmodified => None,
        ChangeKind::Modified => Some('M'),
        ChangeKind::Added => Some('A'),
        ChangeKind::Deleted => Some('D'),
        ChangeKind::Conflicted => Some('U'),
    }
}

/// Print the status snapshot.
pub fn status(ctx: &Context, all: bool) -> Result<()> {
    let session = ctx.open()?;
    let status = session
        .repo
        .status()
        .context("Failed to take status snapshot")?;

    if ctx.json {
        return print_json(&status);
    }

    let mut printed = 0;
    for record in status.records() {
        let code = match (code(record), all) {
            (Some(c), _) => c,
            (None, true) => ' ',
            (None, false) => continue,
        };
        println!("{} {}", code, record.path);
        printed += 1;
    }
    if printed == 0 {
        println!("Nothing to report, working tree clean.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::rows::parse_index_rows;
    use crate::views::status::{Listings, Status};

    #[test]
    fn codes() {
        let id = "8ab686eafeb1f44702738c8b0f24f2567c36da6d";
        let status = Status::reconcile(Listings {
            index: parse_index_rows(&format!("100644 {id} 0\tkept\n")).unwrap(),
            untracked: vec!["new".to_string()],
            ..Default::default()
        });
        assert_eq!(code(status.get("kept").unwrap()), None);
        assert_eq!(code(status.get("new").unwrap()), Some('?'));
    }
}
