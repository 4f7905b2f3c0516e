//! plumbview - typed views over git plumbing output
//!
//! plumbview runs low-level git commands and turns their machine-readable
//! output into typed, immutable views: a working-tree status snapshot,
//! per-line blame attribution, lazily listed trees, conflict-marker
//! sections, and the submodule forest of a commit.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, formats output)
//! - [`views`] - Status, blame, tree, conflict and submodule views
//! - [`git`] - Single interface for all plumbing invocations
//! - [`core`] - Strong types and configuration
//!
//! # Correctness Invariants
//!
//! 1. Every git invocation goes through a [`git::CommandGateway`]
//! 2. Views are built fresh on each call and never mutated afterwards
//! 3. Parsers fail on malformed input instead of returning partial results
//! 4. Nothing is retried

pub mod cli;
pub mod core;
pub mod git;
pub mod views;
