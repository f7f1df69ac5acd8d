//! End-to-end tests driving the built `cvm` binary, covering the seed
//! scenarios from the top-level design's Testable Properties section.

use assert_cmd::Command;
use predicates::prelude::*;

fn write_source(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn s1_factorial_prints_720() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(
        &dir,
        "fact.c",
        "int main(){ int n; n=6; iput(fact(n)); return 0; } \
         int fact(int x){ if (x<=1) return 1; return x*fact(x-1); }",
    );
    Command::cargo_bin("cvm")
        .unwrap()
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::eq("720\n"));
}

#[test]
fn s2_loop_with_break_prints_five() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(
        &dir,
        "loop.c",
        "int main(){ int i; i=0; while (i<10) { if (i==5) break; i=i+1; } iput(i); return 0; }",
    );
    Command::cargo_bin("cvm")
        .unwrap()
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::eq("5\n"));
}

#[test]
fn s3_nested_scopes_keep_independent_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(
        &dir,
        "scopes.c",
        "int main(){ \
           { int x; x = 11; iput(x); } \
           { int x; x = 22; iput(x); } \
           return 0; \
         }",
    );
    Command::cargo_bin("cvm")
        .unwrap()
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::eq("11\n22\n"));
}

#[test]
fn s4_arithmetic_precedence_is_117() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(&dir, "prec.c", "int main(){ iput(-3+5*(6+2)*(15-3)/5); return 0; }");
    Command::cargo_bin("cvm")
        .unwrap()
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::eq("117\n"));
}

#[test]
fn s5_undefined_symbol_fails_with_no_image() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(&dir, "undef.c", "int main(){ y = 1; return 0; }");
    Command::cargo_bin("cvm")
        .unwrap()
        .arg(&path)
        .assert()
        .failure()
        .stdout(predicate::eq(""))
        .stderr(predicate::str::contains("symbol not defined"));
}

#[test]
fn s6_missing_entry_point_fails_codegen() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(&dir, "noentry.c", "int foo(){ return 0; }");
    Command::cargo_bin("cvm")
        .unwrap()
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no entry point"));
}

#[test]
fn dump_tree_flag_prints_a_tree_without_executing() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(&dir, "dump.c", "int main(){ return 0; }");
    Command::cargo_bin("cvm")
        .unwrap()
        .arg(&path)
        .arg("--dump-tree")
        .arg("--no-run")
        .assert()
        .success()
        .stdout(predicate::eq(""))
        .stderr(predicate::str::contains("MODULE"));
}

#[test]
fn missing_source_file_is_a_nonzero_exit() {
    Command::cargo_bin("cvm")
        .unwrap()
        .arg("/no/such/file.c")
        .assert()
        .failure();
}
