//! views::blame
//!
//! Parser for `git blame --porcelain` output.
//!
//! # Format
//!
//! ```text
//! <id> <orig-line> <final-line> [<group-size>]   header, opens a line
//! author <name>                                   metadata, first
//! author-mail <<email>>                           occurrence of <id>
//! ...                                             only
//! \t<content>                                     closes the line
//! ```
//!
//! Commit metadata is printed the first time an id appears. Later lines
//! from the same commit carry a header and at most a `filename`, so the
//! parser keeps one [`BlameCommit`] per id and shares it between entries.

use std::collections::HashMap;
use std::rc::Rc;

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use serde::Serialize;
use tracing::trace;

use crate::core::types::Oid;
use crate::git::GitError;

const CONTEXT: &str = "blame porcelain";

/// Name and email of an author or committer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub name: String,
    /// Address without the surrounding angle brackets.
    pub email: String,
}

/// Commit a blamed line is attributed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlameCommit {
    pub id: Oid,
    pub author: Actor,
    /// Seconds since the epoch.
    pub author_time: i64,
    /// Offset as printed by git, e.g. `+0200`.
    pub author_tz: String,
    pub committer: Actor,
    pub committer_time: i64,
    pub committer_tz: String,
    pub summary: String,
    /// Parent commit and path the line came from, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<(Oid, String)>,
    /// Set when the commit is a boundary of the blamed range.
    pub boundary: bool,
    /// Path of the file in this commit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl BlameCommit {
    pub fn authored_at(&self) -> Option<DateTime<FixedOffset>> {
        timestamp(self.author_time, &self.author_tz)
    }

    pub fn committed_at(&self) -> Option<DateTime<FixedOffset>> {
        timestamp(self.committer_time, &self.committer_tz)
    }
}

/// One line of the blamed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlameEntry {
    pub commit: Rc<BlameCommit>,
    pub text: String,
}

/// Convert epoch seconds plus a `+HHMM` offset into a timestamp.
fn timestamp(seconds: i64, tz: &str) -> Option<DateTime<FixedOffset>> {
    let offset = parse_tz(tz).or_else(|| FixedOffset::east_opt(0))?;
    Utc.timestamp_opt(seconds, 0)
        .single()
        .map(|utc| utc.with_timezone(&offset))
}

fn parse_tz(tz: &str) -> Option<FixedOffset> {
    let (sign, digits) = match tz.as_bytes().first()? {
        b'+' => (1, &tz[1..]),
        b'-' => (-1, &tz[1..]),
        _ => return None,
    };
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Metadata collected between a header and its content line.
#[derive(Debug, Default)]
struct Pending {
    author: Option<String>,
    author_mail: Option<String>,
    author_time: Option<i64>,
    author_tz: Option<String>,
    committer: Option<String>,
    committer_mail: Option<String>,
    committer_time: Option<i64>,
    committer_tz: Option<String>,
    summary: Option<String>,
    previous: Option<(Oid, String)>,
    boundary: bool,
    filename: Option<String>,
}

impl Pending {
    fn absorb(&mut self, line: &str) -> Result<(), GitError> {
        let (key, value) = line.split_once(' ').unwrap_or((line, ""));
        match key {
            "author" => self.author = Some(value.to_string()),
            "author-mail" => self.author_mail = Some(strip_angles(value)),
            "author-time" => self.author_time = Some(parse_time(key, value)?),
            "author-tz" => self.author_tz = Some(value.to_string()),
            "committer" => self.committer = Some(value.to_string()),
            "committer-mail" => self.committer_mail = Some(strip_angles(value)),
            "committer-time" => self.committer_time = Some(parse_time(key, value)?),
            "committer-tz" => self.committer_tz = Some(value.to_string()),
            "summary" => self.summary = Some(value.to_string()),
            "boundary" => self.boundary = true,
            "filename" => self.filename = Some(value.to_string()),
            "previous" => {
                let (id, path) = value.split_once(' ').ok_or_else(|| {
                    GitError::malformed(CONTEXT, format!("bad previous line: {line}"))
                })?;
                self.previous = Some((Oid::new(id)?, path.to_string()));
            }
            // git adds keys over time; unknown ones are not an error
            _ => {}
        }
        Ok(())
    }

    fn into_commit(self, id: Oid) -> Result<BlameCommit, GitError> {
        let Some(author) = self.author else {
            return Err(GitError::malformed(
                CONTEXT,
                format!("first occurrence of {id} has no author"),
            ));
        };
        Ok(BlameCommit {
            id,
            author: Actor {
                name: author,
                email: self.author_mail.unwrap_or_default(),
            },
            author_time: self.author_time.unwrap_or_default(),
            author_tz: self.author_tz.unwrap_or_else(|| "+0000".to_string()),
            committer: Actor {
                name: self.committer.unwrap_or_default(),
                email: self.committer_mail.unwrap_or_default(),
            },
            committer_time: self.committer_time.unwrap_or_default(),
            committer_tz: self.committer_tz.unwrap_or_else(|| "+0000".to_string()),
            summary: self.summary.unwrap_or_default(),
            previous: self.previous,
            boundary: self.boundary,
            filename: self.filename,
        })
    }
}

fn strip_angles(value: &str) -> String {
    value
        .strip_prefix('<')
        .and_then(|v| v.strip_suffix('>'))
        .unwrap_or(value)
        .to_string()
}

fn parse_time(key: &str, value: &str) -> Result<i64, GitError> {
    value
        .parse()
        .map_err(|_| GitError::malformed(CONTEXT, format!("non-numeric {key}: {value:?}")))
}

/// Parse a header line into its commit id.
///
/// Returns `Ok(None)` when the line is not shaped like a header at all, so
/// the caller can treat it as metadata.
fn parse_header(line: &str) -> Result<Option<Oid>, GitError> {
    let mut fields = line.split(' ');
    let Some(first) = fields.next() else {
        return Ok(None);
    };
    if !Oid::looks_like(first) {
        return Ok(None);
    }
    let numbers: Vec<&str> = fields.collect();
    let well_formed = matches!(numbers.len(), 2 | 3)
        && numbers.iter().all(|n| n.parse::<u64>().is_ok());
    if !well_formed {
        return Err(GitError::malformed(CONTEXT, format!("bad header: {line}")));
    }
    Ok(Some(Oid::new(first)?))
}

enum State {
    AwaitingHeader,
    InGroup { id: Oid, pending: Pending },
}

/// Parse porcelain blame output into one entry per content line.
///
/// Fails without a partial result on a content line with no header, a bad
/// header, a non-numeric time, or a new commit with no author. Empty input
/// yields an empty vector.
pub fn parse_blame(text: &str) -> Result<Vec<BlameEntry>, GitError> {
    let mut commits: HashMap<Oid, Rc<BlameCommit>> = HashMap::new();
    let mut entries = Vec::new();
    let mut state = State::AwaitingHeader;

    // split on '\n' only: a '\r' before it belongs to the content line
    for line in text.split('\n') {
        if let Some(content) = line.strip_prefix('\t') {
            let State::InGroup { id, pending } = std::mem::replace(&mut state, State::AwaitingHeader)
            else {
                return Err(GitError::malformed(
                    CONTEXT,
                    format!("content line without header: {content:?}"),
                ));
            };
            let commit = match commits.get(&id) {
                Some(cached) => Rc::clone(cached),
                None => {
                    let commit = Rc::new(pending.into_commit(id.clone())?);
                    trace!(commit = %id, "cached blame commit");
                    commits.insert(id, Rc::clone(&commit));
                    commit
                }
            };
            entries.push(BlameEntry {
                commit,
                text: content.to_string(),
            });
            continue;
        }

        let line = line.strip_suffix('\r').unwrap_or(line);
        match &mut state {
            State::AwaitingHeader => match parse_header(line)? {
                Some(id) => {
                    state = State::InGroup {
                        id,
                        pending: Pending::default(),
                    }
                }
                None if line.is_empty() => {}
                None => {
                    return Err(GitError::malformed(
                        CONTEXT,
                        format!("expected header, got: {line}"),
                    ))
                }
            },
            State::InGroup { pending, .. } => pending.absorb(line)?,
        }
    }

    Ok(entries)
}
