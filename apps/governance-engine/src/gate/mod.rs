//! Build-time isolation checks.
//!
//! Two independent static checks guard the red line between governance data
//! and alpha computation:
//!
//! 1. [`scan_tree`] walks the syntax tree of every Rust source file under
//!    the designated alpha paths and fails on any import or path reference
//!    naming a governance module, reported as file + line.
//! 2. [`validate_constraints_str`] re-checks raw constraint documents
//!    against the closed action-field allowlist, independently of the typed
//!    loader.
//!
//! Both are pure functions of a source tree or document snapshot: they never
//! mutate state and are safe to run repeatedly and in parallel. They run in
//! CI (and locally via the `gate` subcommand) with zero tolerance for
//! failures; a violation that reaches runtime is a deployment-process
//! failure, not a condition this engine can catch.

mod allowlist;
mod imports;

use std::path::PathBuf;

use thiserror::Error;

pub use allowlist::{validate_constraints_file, validate_constraints_str};
pub use imports::{DEFAULT_FORBIDDEN_MODULES, scan_file, scan_tree};

/// Gate infrastructure errors (distinct from violations: a tree that cannot
/// be read or parsed cannot be verified, which is itself a failure).
#[derive(Debug, Error)]
pub enum GateError {
    /// A file or directory could not be read.
    #[error("failed to read '{path}': {source}")]
    Read {
        /// The unreadable path.
        path: PathBuf,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// A source or config file could not be parsed.
    #[error("failed to parse '{path}': {message}")]
    Parse {
        /// The unparsable path.
        path: PathBuf,
        /// Parser diagnostic.
        message: String,
    },
}

/// One violation location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateViolation {
    /// File the violation was found in.
    pub file: PathBuf,
    /// 1-based line (0 for document-level checks without line info).
    pub line: usize,
    /// 1-based column (0 when not applicable).
    pub column: usize,
    /// What was found.
    pub message: String,
}

impl std::fmt::Display for GateViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.line == 0 {
            write!(f, "{}: {}", self.file.display(), self.message)
        } else {
            write!(
                f,
                "{}:{}:{}: {}",
                self.file.display(),
                self.line,
                self.column,
                self.message
            )
        }
    }
}

/// Outcome of a gate check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GateReport {
    /// Violation locations, in discovery order.
    pub violations: Vec<GateViolation>,
}

impl GateReport {
    /// Whether the check passed with zero violations.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Merge another report into this one.
    pub fn merge(&mut self, other: Self) {
        self.violations.extend(other.violations);
    }
}
