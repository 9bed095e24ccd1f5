//! Structural tests for layer boundaries.
//!
//! Domain code stays pure, services talk to the outside world only through
//! ports, and infra never reaches into the presentation layer.

use std::path::{Path, PathBuf};

fn collect_rs_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                files.extend(collect_rs_files(&path));
            } else if path.extension().and_then(|e| e.to_str()) == Some("rs") {
                files.push(path);
            }
        }
    }
    files
}

fn read_non_comment_lines(path: &Path) -> Vec<String> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    content
        .lines()
        .filter(|l| {
            let trimmed = l.trim();
            !trimmed.starts_with("//") && !trimmed.starts_with("/*") && !trimmed.starts_with('*')
        })
        .map(String::from)
        .collect()
}

fn src(parts: &[&str]) -> PathBuf {
    parts
        .iter()
        .fold(Path::new(env!("CARGO_MANIFEST_DIR")).join("src"), |p, part| {
            p.join(part)
        })
}

/// Lines under `dir` containing any of `forbidden`.
fn violations(dir: &Path, forbidden: &[&str]) -> Vec<String> {
    let mut found = Vec::new();
    for file in collect_rs_files(dir) {
        let rel = file
            .strip_prefix(env!("CARGO_MANIFEST_DIR"))
            .unwrap_or(&file)
            .display()
            .to_string();
        for (i, line) in read_non_comment_lines(&file).iter().enumerate() {
            for needle in forbidden {
                if line.contains(needle) {
                    found.push(format!("{rel}:{}: `{needle}`: {line}", i + 1));
                }
            }
        }
    }
    found
}

#[test]
fn domain_has_no_io_or_outer_layer_imports() {
    let found = violations(
        &src(&["domain"]),
        &[
            "crate::infra",
            "crate::application",
            "crate::commands",
            "crate::output",
            "tokio::",
            "std::fs",
            "std::process",
            "std::net",
        ],
    );
    assert!(found.is_empty(), "domain/ must stay pure:\n{}", found.join("\n"));
}

#[test]
fn services_depend_on_ports_not_adapters() {
    let found = violations(
        &src(&["application"]),
        &[
            "crate::infra",
            "crate::commands",
            "crate::output",
            "SshTransport",
            "TokioCommandRunner",
            "HttpArtifactFetcher",
        ],
    );
    assert!(found.is_empty(), "application/ must use port traits:\n{}", found.join("\n"));
}

#[test]
fn infra_has_no_imports_from_commands_or_output() {
    let found = violations(&src(&["infra"]), &["crate::commands", "crate::output"]);
    assert!(found.is_empty(), "infra/ must not import from commands/ or output/:\n{}", found.join("\n"));
}

#[test]
fn remote_commands_are_built_only_in_layout() {
    let found = violations(
        &src(&["application"]),
        &["\"systemctl", "\"mkdir", "\"rm -", "\"ls "],
    );
    assert!(
        found.is_empty(),
        "remote command lines belong in domain/layout.rs:\n{}",
        found.join("\n")
    );
}
