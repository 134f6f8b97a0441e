//! Architecture enforcement tests.
//!
//! The library is layered: `core` at the bottom, then `git`, `vendor`,
//! `source`, and finally `cli`/`ui`. A module may only import from layers
//! below it, and only the outer layer writes to stdout or stderr. These
//! tests scan the source tree so violations are caught in CI.

use std::fs;
use std::path::{Path, PathBuf};

/// Layers in dependency order, with the crate modules each may import.
const LAYERS: &[(&str, &[&str])] = &[
    ("core", &["core"]),
    ("git", &["core", "git"]),
    ("vendor", &["core", "git", "vendor"]),
    ("source", &["core", "git", "vendor", "source"]),
];

fn src_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("src")
}

/// All `.rs` files under `dir`, recursively.
fn rust_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).expect("read src dir") {
        let path = entry.expect("dir entry").path();
        if path.is_dir() {
            files.extend(rust_files(&path));
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            files.push(path);
        }
    }
    files
}

/// Non-comment lines of a file, with their line numbers.
fn code_lines(path: &Path) -> Vec<(usize, String)> {
    let content = fs::read_to_string(path).expect("read source file");
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim_start().starts_with("//"))
        .map(|(i, line)| (i + 1, line.to_string()))
        .collect()
}

/// Crate modules referenced via `crate::<module>` on a line.
fn crate_refs(line: &str) -> Vec<&str> {
    line.match_indices("crate::")
        .filter_map(|(i, _)| {
            let rest = &line[i + "crate::".len()..];
            let end = rest
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(rest.len());
            (end > 0).then(|| &rest[..end])
        })
        .collect()
}

#[test]
fn layers_only_import_downward() {
    let mut violations = Vec::new();

    for (layer, allowed) in LAYERS {
        for file in rust_files(&src_dir().join(layer)) {
            for (n, line) in code_lines(&file) {
                for module in crate_refs(&line) {
                    if !allowed.contains(&module) {
                        violations.push(format!(
                            "{}:{}: `{}` imports crate::{}",
                            file.display(),
                            n,
                            layer,
                            module
                        ));
                    }
                }
            }
        }
    }

    assert!(
        violations.is_empty(),
        "layering violations:\n{}",
        violations.join("\n")
    );
}

#[test]
fn library_layers_do_not_print() {
    let mut violations = Vec::new();

    for (layer, _) in LAYERS {
        for file in rust_files(&src_dir().join(layer)) {
            let content = fs::read_to_string(&file).expect("read source file");
            let library = match content.find("#[cfg(test)]") {
                Some(i) => &content[..i],
                None => &content,
            };
            for (n, line) in library.lines().enumerate() {
                if line.trim_start().starts_with("//") {
                    continue;
                }
                if line.contains("println!") || line.contains("eprintln!") {
                    violations.push(format!("{}:{}", file.display(), n + 1));
                }
            }
        }
    }

    assert!(
        violations.is_empty(),
        "library code writes to stdout/stderr; use tracing instead:\n{}",
        violations.join("\n")
    );
}

#[test]
fn crate_refs_parsing() {
    assert_eq!(crate_refs("use crate::core::types::Oid;"), vec!["core"]);
    assert_eq!(
        crate_refs("use crate::git::{GitError, Repository}; crate::vendor::X"),
        vec!["git", "vendor"]
    );
    assert!(crate_refs("let x = 1;").is_empty());
}
