//! Architecture enforcement tests.
//!
//! The `git` module is the only place that may start a process, and the
//! library layers report typed errors instead of `anyhow`. These tests scan
//! the source tree so a violation fails in CI rather than in review.
//!
//! # Test Categories
//!
//! 1. **Process Spawning** - Only `src/git/gateway.rs` may spawn git
//! 2. **Error Types** - `views`, `git` and `core` never import `anyhow`
//! 3. **Command Handlers** - Handlers go through `Repo`, not raw invocations

use std::fs;
use std::path::{Path, PathBuf};

/// Files allowed to touch `std::process`.
///
/// - `git/gateway.rs` - The one process doorway
/// - `main.rs` - Exit codes only
const PROCESS_ALLOWED: &[&str] = &["src/git/gateway.rs", "src/main.rs"];

/// Library directories that must not depend on `anyhow`.
const TYPED_ERROR_DIRS: &[&str] = &["src/views", "src/git", "src/core"];

fn rust_files(dir: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir).unwrap_or_else(|_| panic!("Failed to read {}", dir.display())) {
        let path = entry.expect("Failed to read entry").path();
        if path.is_dir() {
            out.extend(rust_files(&path));
        } else if path.extension().map(|e| e == "rs").unwrap_or(false) {
            out.push(path);
        }
    }
    out
}

/// Source text with the `#[cfg(test)]` module cut off.
fn production_code(path: &Path) -> String {
    let content =
        fs::read_to_string(path).unwrap_or_else(|_| panic!("Failed to read {}", path.display()));
    match content.find("#[cfg(test)]") {
        Some(at) => content[..at].to_string(),
        None => content,
    }
}

fn display(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

// =============================================================================
// Process Spawning
// =============================================================================

#[test]
fn only_the_gateway_spawns_processes() {
    let mut violations = Vec::new();

    for path in rust_files(Path::new("src")) {
        let name = display(&path);
        if PROCESS_ALLOWED.contains(&name.as_str()) {
            continue;
        }
        let code = production_code(&path);
        if code.contains("std::process") || code.contains("Command::new(") {
            violations.push(format!("{}: spawns a process outside the gateway", name));
        }
    }

    assert!(
        violations.is_empty(),
        "Architecture violations found:\n  {}",
        violations.join("\n  ")
    );
}

// =============================================================================
// Error Types
// =============================================================================

#[test]
fn library_layers_use_typed_errors() {
    let mut violations = Vec::new();

    for dir in TYPED_ERROR_DIRS {
        for path in rust_files(Path::new(dir)) {
            if production_code(&path).contains("anyhow") {
                violations.push(format!("{}: uses anyhow", display(&path)));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "Architecture violations found:\n  {}",
        violations.join("\n  ")
    );
}

// =============================================================================
// Command Handlers
// =============================================================================

#[test]
fn handlers_do_not_build_invocations() {
    let mut violations = Vec::new();

    for path in rust_files(Path::new("src/cli/commands")) {
        let code = production_code(&path);
        if code.contains("Invocation") || code.contains("Subcommand::") {
            violations.push(format!(
                "{}: builds a git invocation - call a Repo method or a view instead",
                display(&path)
            ));
        }
    }

    assert!(
        violations.is_empty(),
        "Architecture violations found:\n  {}",
        violations.join("\n  ")
    );
}

#[test]
fn every_handler_is_dispatched() {
    let dispatch = fs::read_to_string("src/cli/commands/mod.rs").expect("Failed to read mod.rs");

    for path in rust_files(Path::new("src/cli/commands")) {
        let stem = path.file_stem().unwrap().to_str().unwrap();
        if stem == "mod" {
            continue;
        }
        assert!(
            dispatch.contains(&format!("mod {};", stem)),
            "{} is not declared in commands/mod.rs",
            stem
        );
        assert!(
            dispatch.contains(&format!("{}::", stem)),
            "{} is never dispatched",
            stem
        );
    }
}
