use std::path::Path;
use std::process::{Command, Output};

fn fixture_path() -> String {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    format!("{manifest_dir}/tests/fixtures/sample-project")
}

fn diagrammer(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_diagrammer"))
        .args(args)
        .output()
        .expect("failed to run diagrammer")
}

fn generate_into(out: &Path) -> Output {
    let out = out.to_string_lossy();
    diagrammer(&["generate", &fixture_path(), "-o", &out, "-l", "ts,py"])
}

/// `(from, to)` for every edge line of the first mermaid block.
fn edges(doc: &str) -> Vec<(String, String)> {
    let block = doc
        .split("```mermaid\n")
        .nth(1)
        .and_then(|rest| rest.split("```").next())
        .unwrap_or("");
    block
        .lines()
        .filter(|l| l.contains("-->") || l.contains("-.->"))
        .filter_map(|l| {
            let parts: Vec<&str> = l.split_whitespace().collect();
            Some((parts.first()?.to_string(), parts.last()?.to_string()))
        })
        .collect()
}

#[test]
fn test_generate_writes_organized_tree() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let output = generate_into(dir.path());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        output.status.success(),
        "generate failed: stdout={stdout}, stderr={stderr}"
    );

    for file in [
        "README.md",
        "manifest.json",
        "diagrams/overview/architecture.md",
        "diagrams/overview/dependencies.md",
        "diagrams/overview/modules.md",
        "diagrams/overview/circular-dependencies.md",
        "diagrams/interactive/architecture-interactive.md",
    ] {
        assert!(dir.path().join(file).exists(), "{file} should be written");
    }

    let readme = std::fs::read_to_string(dir.path().join("README.md")).unwrap();
    assert!(readme.contains("(diagrams/overview/architecture.md)"));
    assert!(readme.contains("- **Languages:** python, typescript"));
    assert!(stdout.contains("Wrote"), "should list written files: {stdout}");
}

#[test]
fn test_app_imports_user_service_once() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let output = generate_into(dir.path());
    assert!(output.status.success());

    let doc =
        std::fs::read_to_string(dir.path().join("diagrams/overview/architecture.md")).unwrap();
    let all = edges(&doc);
    let app_to_service = all
        .iter()
        .filter(|(from, to)| from == "App" && to == "UserService")
        .count();
    assert_eq!(app_to_service, 1, "expected one App -> UserService edge in:\n{doc}");
    assert!(doc.contains("App -->|imports| UserService"));
    assert!(all.iter().all(|(from, to)| from != to), "self-loop in:\n{doc}");
}

#[test]
fn test_no_self_loops_in_any_diagram() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    assert!(generate_into(dir.path()).status.success());

    for entry in walk(&dir.path().join("diagrams")) {
        let doc = std::fs::read_to_string(&entry).unwrap();
        for (from, to) in edges(&doc) {
            assert_ne!(from, to, "self-loop in {}", entry.display());
        }
    }
}

fn walk(dir: &Path) -> Vec<std::path::PathBuf> {
    let mut out = Vec::new();
    for entry in std::fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            out.extend(walk(&path));
        } else {
            out.push(path);
        }
    }
    out
}

#[test]
fn test_analyze_json_python_locality() {
    let output = diagrammer(&["analyze", &fixture_path(), "--format", "json", "-l", "py"]);
    assert!(output.status.success());

    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("analyze should print JSON");
    let deps = value["dependencies"].as_array().unwrap();
    let find = |name: &str| {
        deps.iter()
            .find(|d| d["name"] == name)
            .unwrap_or_else(|| panic!("missing dependency {name}: {deps:?}"))
    };
    assert_eq!(find("os")["from"], "os");
    assert_eq!(find("os")["locality"], "external");
    assert_eq!(find("helper")["from"], ".utils");
    assert_eq!(find("helper")["locality"], "local");

    let components = value["components"].as_array().unwrap();
    assert!(components.iter().any(|c| c["name"] == "Report"));
    assert!(components.iter().all(|c| c["language"] == "python"));
}

#[test]
fn test_analyze_text_summary() {
    let output = diagrammer(&["analyze", &fixture_path(), "-l", "ts"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("Analysis Summary"), "{stdout}");
    assert!(stdout.contains("Languages"), "{stdout}");
    assert!(stdout.contains("typescript"), "{stdout}");
}

#[test]
fn test_init_creates_config() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let output = Command::new(env!("CARGO_BIN_EXE_diagrammer"))
        .args(["init"])
        .current_dir(dir.path())
        .output()
        .expect("failed to run diagrammer init");
    assert!(output.status.success(), "init should succeed");

    let config_path = dir.path().join(".diagrammer.toml");
    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("[project]"));
    assert!(content.contains("[diagram]"));

    let again = Command::new(env!("CARGO_BIN_EXE_diagrammer"))
        .args(["init"])
        .current_dir(dir.path())
        .output()
        .expect("failed to run diagrammer init");
    assert_eq!(again.status.code(), Some(2), "second init without --force");
    assert!(String::from_utf8_lossy(&again.stderr).contains("already exists"));
}

#[test]
fn test_missing_path_exits_with_two() {
    let output = diagrammer(&["analyze", "/definitely/not/here"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).starts_with("Error:"));
}

#[test]
fn test_unreadable_config_exits_with_two() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let bad = dir.path().join("bad.toml");
    std::fs::write(&bad, "[diagram\nmax_nodes = ").unwrap();
    let output = diagrammer(&["analyze", &fixture_path(), "-c", &bad.to_string_lossy()]);
    assert_eq!(output.status.code(), Some(2));
}
