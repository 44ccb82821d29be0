// Integration testing can be done either by calling library functions directly or by invoking your CLI as a subprocess.
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn balangkas() -> Command {
    let mut cmd = Command::cargo_bin("balangkas").unwrap();
    cmd.env("NO_COLOR", "1").env("RUST_LOG", "info");
    cmd
}

#[test]
fn build_creates_default_layout() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("proj");

    balangkas()
        .arg("build")
        .arg(&root)
        .arg("--on-conflict")
        .arg("skip")
        .arg("--foreground")
        .arg("--author")
        .arg("tester")
        .assert()
        .success()
        .stdout(predicate::str::contains("Done! 100%"))
        .stdout(predicate::str::contains("22 created, 0 overwritten, 0 skipped, 0 failed (22/22)"));

    assert_eq!(
        fs::read_to_string(root.join("core/utils/helper.py")).unwrap(),
        "# Contains utility functions\n"
    );
    let record = fs::read_to_string(root.join("logs/LayoutCreation.txt")).unwrap();
    assert!(record.trim_end().ends_with("By: tester"));
}

#[test]
fn rebuild_with_skip_touches_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("proj");

    balangkas()
        .args(["build", "--on-conflict", "skip"])
        .arg(&root)
        .assert()
        .success();
    fs::write(root.join("core/main.py"), "edited").unwrap();

    balangkas()
        .args(["build", "--on-conflict", "skip"])
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("0 created, 0 overwritten, 22 skipped"));

    assert_eq!(fs::read_to_string(root.join("core/main.py")).unwrap(), "edited");
}

#[test]
fn build_with_custom_layout_file() {
    let tmp = tempfile::tempdir().unwrap();
    let layout = tmp.path().join("layout.toml");
    fs::write(
        &layout,
        "directories = [\"src\", \"logs\"]\n\n[files]\n\"src/lib.rs\" = \"// lib\\n\"\n",
    )
    .unwrap();
    let root = tmp.path().join("crate");

    balangkas()
        .arg("build")
        .arg(&root)
        .arg("--layout")
        .arg(&layout)
        .arg("--on-conflict")
        .arg("overwrite")
        .assert()
        .success()
        .stdout(predicate::str::contains("3 created"));

    assert_eq!(fs::read_to_string(root.join("src/lib.rs")).unwrap(), "// lib\n");
}

#[test]
fn blank_root_removes_layout() {
    balangkas()
        .args(["build", ""])
        .assert()
        .success()
        .stderr(predicate::str::contains("Layout removed"));
}

#[test]
fn tree_prints_sorted_entries() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("proj");
    for name in ["b", "a", "c"] {
        fs::create_dir_all(root.join(name)).unwrap();
    }

    balangkas()
        .arg("tree")
        .arg(&root)
        .assert()
        .success()
        .stdout("proj/\n├── a\n├── b\n└── c\n");
}

#[test]
fn tree_reports_missing_root_inline() {
    let tmp = tempfile::tempdir().unwrap();

    balangkas()
        .arg("tree")
        .arg(tmp.path().join("gone"))
        .assert()
        .success()
        .stdout(predicate::str::starts_with("gone/\nError reading directory: "));
}

#[test]
fn layout_previews_desired_set() {
    balangkas()
        .args(["layout", "--name", "demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("demo"))
        .stdout(predicate::str::contains("interface.py"))
        .stdout(predicate::str::contains("13 directories, 9 files"));
}

#[test]
fn add_rejects_target_outside_parent() {
    let tmp = tempfile::tempdir().unwrap();

    balangkas()
        .arg("add")
        .arg(tmp.path())
        .arg("/etc/passwd")
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not within"));
}

#[test]
fn add_creates_directory() {
    let tmp = tempfile::tempdir().unwrap();

    balangkas()
        .arg("add")
        .arg(tmp.path())
        .args(["docs/api", "--dir"])
        .assert()
        .success()
        .stdout(predicate::str::contains("create"));

    assert!(tmp.path().join("docs/api").is_dir());
}

#[test]
fn rename_refuses_existing_destination() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("a.txt"), "a").unwrap();
    fs::write(tmp.path().join("b.txt"), "b").unwrap();

    balangkas()
        .arg("rename")
        .arg(tmp.path().join("a.txt"))
        .arg("b.txt")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    balangkas()
        .arg("rename")
        .arg(tmp.path().join("a.txt"))
        .arg("c.txt")
        .assert()
        .success();

    assert!(tmp.path().join("c.txt").exists());
}
