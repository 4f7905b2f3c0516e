//! git::commands
//!
//! The command table: which plumbing subcommands exist and which option keys
//! each one accepts.
//!
//! # Design
//!
//! Callers describe a call as an [`Invocation`] holding option *keys*
//! (`"diff_filter"`, `"max_count"`, ...) instead of raw flags. Each
//! [`Subcommand`] owns a fixed list of [`FlagRule`]s, and rendering an
//! invocation into argv validates every key against that list. A key the
//! table does not know fails with [`GitError::UnknownOption`]; nothing is
//! dropped or guessed.
//!
//! Flags are emitted in table order, then positional arguments, then the
//! pathspec after `--`. The output is therefore independent of the order in
//! which options were added.
//!
//! # Example
//!
//! ```
//! use plumbview::git::{Invocation, Subcommand};
//!
//! let argv = Invocation::new(Subcommand::DiffFiles, "/repo")
//!     .value("diff_filter", "M")
//!     .switch("raw")
//!     .argv()
//!     .unwrap();
//! assert_eq!(argv, vec!["diff-files", "--raw", "--diff-filter=M"]);
//!
//! let err = Invocation::new(Subcommand::LsFiles, "/repo")
//!     .switch("recursive")
//!     .argv()
//!     .unwrap_err();
//! assert!(err.to_string().contains("unknown option 'recursive'"));
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::GitError;

/// Plumbing subcommands this crate issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subcommand {
    LsFiles,
    LsTree,
    DiffFiles,
    DiffIndex,
    Blame,
    CatFile,
    ForEachRef,
    RevParse,
    RevList,
    Add,
}

/// How one option key turns into command-line flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagRule {
    /// A bare flag, present or absent.
    Switch(&'static str),
    /// A flag carrying a value; `{}` in the template is replaced by it.
    Valued(&'static str),
    /// Path restriction, emitted after `--`.
    Pathspec,
}

impl Subcommand {
    /// The subcommand name as passed to git.
    pub fn name(&self) -> &'static str {
        match self {
            Subcommand::LsFiles => "ls-files",
            Subcommand::LsTree => "ls-tree",
            Subcommand::DiffFiles => "diff-files",
            Subcommand::DiffIndex => "diff-index",
            Subcommand::Blame => "blame",
            Subcommand::CatFile => "cat-file",
            Subcommand::ForEachRef => "for-each-ref",
            Subcommand::RevParse => "rev-parse",
            Subcommand::RevList => "rev-list",
            Subcommand::Add => "add",
        }
    }

    /// The option keys this subcommand accepts, in emission order.
    pub fn rules(&self) -> &'static [(&'static str, FlagRule)] {
        use FlagRule::*;
        match self {
            Subcommand::LsFiles => &[
                ("stage", Switch("--stage")),
                ("cached", Switch("--cached")),
                ("others", Switch("--others")),
                ("unmerged", Switch("--unmerged")),
                ("exclude_standard", Switch("--exclude-standard")),
                ("paths", Pathspec),
            ],
            Subcommand::LsTree => &[
                ("long", Switch("-l")),
                ("recursive", Switch("-r")),
                ("paths", Pathspec),
            ],
            Subcommand::DiffFiles => &[
                ("raw", Switch("--raw")),
                ("diff_filter", Valued("--diff-filter={}")),
                ("paths", Pathspec),
            ],
            Subcommand::DiffIndex => &[
                ("cached", Switch("--cached")),
                ("raw", Switch("--raw")),
                ("no_renames", Switch("--no-renames")),
                ("diff_filter", Valued("--diff-filter={}")),
                ("paths", Pathspec),
            ],
            Subcommand::Blame => &[
                ("porcelain", Switch("-p")),
                ("line_range", Valued("-L{}")),
                ("paths", Pathspec),
            ],
            Subcommand::CatFile => &[
                ("pretty", Switch("-p")),
                ("size", Switch("-s")),
                ("object_type", Switch("-t")),
            ],
            Subcommand::ForEachRef => &[
                ("format", Valued("--format={}")),
                ("count", Valued("--count={}")),
            ],
            Subcommand::RevParse => &[
                ("verify", Switch("--verify")),
                ("quiet", Switch("--quiet")),
                ("show_toplevel", Switch("--show-toplevel")),
            ],
            Subcommand::RevList => &[
                ("max_count", Valued("--max-count={}")),
                ("skip", Valued("--skip={}")),
                ("first_parent", Switch("--first-parent")),
                ("paths", Pathspec),
            ],
            Subcommand::Add => &[("paths", Pathspec)],
        }
    }

    fn rule(&self, key: &str) -> Option<FlagRule> {
        self.rules()
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, rule)| *rule)
    }
}

impl std::fmt::Display for Subcommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Value attached to an option key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Switch,
    Value(String),
    Paths(Vec<String>),
}

/// One fully described plumbing call.
///
/// Besides the subcommand and its options this carries everything that used
/// to be ambient state: the working directory and whether paths in the
/// output should be C-quoted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    subcommand: Subcommand,
    options: BTreeMap<String, OptionValue>,
    args: Vec<String>,
    cwd: PathBuf,
    quote_paths: bool,
}

impl Invocation {
    /// Start an invocation of `subcommand` run from `cwd`.
    ///
    /// Path quoting defaults to git's own default (on).
    pub fn new(subcommand: Subcommand, cwd: impl Into<PathBuf>) -> Self {
        Self {
            subcommand,
            options: BTreeMap::new(),
            args: Vec::new(),
            cwd: cwd.into(),
            quote_paths: true,
        }
    }

    /// Set a switch option.
    pub fn switch(mut self, key: &str) -> Self {
        self.options.insert(key.to_string(), OptionValue::Switch);
        self
    }

    /// Set a valued option.
    pub fn value(mut self, key: &str, value: impl ToString) -> Self {
        self.options
            .insert(key.to_string(), OptionValue::Value(value.to_string()));
        self
    }

    /// Restrict the command to the given paths.
    pub fn paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let paths = paths.into_iter().map(Into::into).collect();
        self.options
            .insert("paths".to_string(), OptionValue::Paths(paths));
        self
    }

    /// Append a positional argument (revision, object id, ...).
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Set whether git may C-quote unusual paths in its output.
    pub fn quote_paths(mut self, quote: bool) -> Self {
        self.quote_paths = quote;
        self
    }

    pub fn subcommand(&self) -> Subcommand {
        self.subcommand
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn quotes_paths(&self) -> bool {
        self.quote_paths
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Raw access to the option map, keyed by option name.
    pub fn options(&self) -> &BTreeMap<String, OptionValue> {
        &self.options
    }

    /// Render the subcommand, flags, arguments and pathspec.
    ///
    /// The result does not include the program name or any global `-c`
    /// settings; those belong to the gateway.
    ///
    /// # Errors
    ///
    /// - [`GitError::UnknownOption`] for a key missing from the table
    /// - [`GitError::InvalidOptionValue`] for a value of the wrong shape
    pub fn argv(&self) -> Result<Vec<String>, GitError> {
        let name = self.subcommand.name();

        for (key, value) in &self.options {
            let rule = self
                .subcommand
                .rule(key)
                .ok_or_else(|| GitError::UnknownOption {
                    subcommand: name,
                    key: key.clone(),
                })?;
            let fits = matches!(
                (rule, value),
                (FlagRule::Switch(_), OptionValue::Switch)
                    | (FlagRule::Valued(_), OptionValue::Value(_))
                    | (FlagRule::Pathspec, OptionValue::Paths(_))
            );
            if !fits {
                return Err(GitError::InvalidOptionValue {
                    subcommand: name,
                    key: key.clone(),
                    message: format!("{:?} does not fit rule {:?}", value, rule),
                });
            }
        }

        let mut argv = vec![name.to_string()];
        let mut pathspec = None;
        for (key, rule) in self.subcommand.rules() {
            let Some(value) = self.options.get(*key) else {
                continue;
            };
            match (rule, value) {
                (FlagRule::Switch(flag), _) => argv.push((*flag).to_string()),
                (FlagRule::Valued(template), OptionValue::Value(v)) => {
                    argv.push(template.replace("{}", v))
                }
                (FlagRule::Pathspec, OptionValue::Paths(paths)) => pathspec = Some(paths),
                _ => {}
            }
        }
        argv.extend(self.args.iter().cloned());
        if let Some(paths) = pathspec {
            argv.push("--".to_string());
            argv.extend(paths.iter().cloned());
        }
        Ok(argv)
    }

    /// Best-effort human-readable rendering for logs and error messages.
    pub fn display(&self) -> String {
        match self.argv() {
            Ok(argv) => format!("git {}", argv.join(" ")),
            Err(_) => format!("git {} <invalid options>", self.subcommand.name()),
        }
    }
}
