//! Import/reference scanner over alpha source trees.
//!
//! Parses each `.rs` file with the language's own parser and walks the
//! syntax tree: any `use` item or path expression whose segments name a
//! governance module is a violation. Line numbers come from parser span
//! locations, so reports point at the exact reference.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use syn::visit::Visit;

use super::{GateError, GateReport, GateViolation};

/// Module names that must never be referenced from alpha computation code.
pub const DEFAULT_FORBIDDEN_MODULES: [&str; 7] = [
    "governance_engine",
    "hypothesis",
    "hypotheses",
    "constraint",
    "constraints",
    "hypothesis_registry",
    "constraint_registry",
];

/// Scan every `.rs` file under `root` for references to forbidden modules.
///
/// Files are visited in sorted path order so reports are deterministic.
///
/// # Errors
///
/// Returns [`GateError`] when the tree cannot be read or a file cannot be
/// parsed; an unverifiable tree is a failure, not a pass.
pub fn scan_tree(root: &Path, forbidden: &[String]) -> Result<GateReport, GateError> {
    let mut files = Vec::new();
    collect_rust_files(root, &mut files)?;
    files.sort();

    let mut report = GateReport::default();
    for file in files {
        report.violations.extend(scan_file(&file, forbidden)?);
    }
    Ok(report)
}

/// Scan a single source file.
///
/// # Errors
///
/// Returns [`GateError`] when the file cannot be read or parsed.
pub fn scan_file(path: &Path, forbidden: &[String]) -> Result<Vec<GateViolation>, GateError> {
    let source = std::fs::read_to_string(path).map_err(|e| GateError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let ast = syn::parse_file(&source).map_err(|e| GateError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut visitor = ForbiddenRefVisitor {
        forbidden,
        file: path,
        seen: BTreeSet::new(),
        violations: Vec::new(),
    };
    visitor.visit_file(&ast);
    Ok(visitor.violations)
}

fn collect_rust_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), GateError> {
    let entries = std::fs::read_dir(dir).map_err(|e| GateError::Read {
        path: dir.to_path_buf(),
        source: e,
    })?;
    for entry in entries {
        let entry = entry.map_err(|e| GateError::Read {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if path.is_dir() {
            collect_rust_files(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            out.push(path);
        }
    }
    Ok(())
}

struct ForbiddenRefVisitor<'a> {
    forbidden: &'a [String],
    file: &'a Path,
    /// Dedup key: one violation per (line, column).
    seen: BTreeSet<(usize, usize)>,
    violations: Vec<GateViolation>,
}

impl ForbiddenRefVisitor<'_> {
    fn check_ident(&mut self, ident: &syn::Ident, context: &str) {
        let name = ident.to_string();
        if !self.forbidden.iter().any(|f| f == &name) {
            return;
        }
        let start = ident.span().start();
        if !self.seen.insert((start.line, start.column + 1)) {
            return;
        }
        self.violations.push(GateViolation {
            file: self.file.to_path_buf(),
            line: start.line,
            column: start.column + 1,
            message: format!("{context} references governance module `{name}`"),
        });
    }

    fn check_use_tree(&mut self, tree: &syn::UseTree) {
        match tree {
            syn::UseTree::Path(path) => {
                self.check_ident(&path.ident, "import");
                self.check_use_tree(&path.tree);
            }
            syn::UseTree::Name(name) => self.check_ident(&name.ident, "import"),
            syn::UseTree::Rename(rename) => self.check_ident(&rename.ident, "import"),
            syn::UseTree::Glob(_) => {}
            syn::UseTree::Group(group) => {
                for item in &group.items {
                    self.check_use_tree(item);
                }
            }
        }
    }
}

impl<'ast> Visit<'ast> for ForbiddenRefVisitor<'_> {
    fn visit_item_use(&mut self, node: &'ast syn::ItemUse) {
        self.check_use_tree(&node.tree);
    }

    fn visit_path(&mut self, node: &'ast syn::Path) {
        for segment in &node.segments {
            self.check_ident(&segment.ident, "path");
        }
        syn::visit::visit_path(self, node);
    }
}
