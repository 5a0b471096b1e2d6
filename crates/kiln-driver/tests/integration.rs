//! Integration tests for the `kiln` command-line tool.
//!
//! Each test lays out a small module tree in a temp directory, runs the
//! binary over it, and checks the linked output.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Create a fresh temp directory holding the given files.
fn project(name: &str, files: &[(&str, &str)]) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("kiln_integration_{}", name));
    let _ = fs::remove_dir_all(&dir);
    for (path, contents) in files {
        let full = dir.join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, contents).unwrap();
    }
    dir
}

fn kiln(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_kiln"))
        .args(args)
        .current_dir(dir)
        .env_remove("KILN_LOAD_PATH")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run kiln")
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "kiln failed!\nstderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_build_links_dependencies_first() {
    let dir = project(
        "deps_first",
        &[
            ("app.rb", "require 'foo'\nrequire 'bar'\nputs 'app'\n"),
            ("foo.rb", "puts 'foo'\n"),
            ("bar.rb", "require 'foo'\nputs 'bar'\n"),
        ],
    );

    let out = stdout(&kiln(&dir, &["build", "app"]));
    assert_eq!(
        out,
        concat!(
            "Kiln.define(\"foo\", function() {\nputs 'foo'\n});\n",
            "Kiln.define(\"bar\", function() {\nKiln.require(\"foo\")\nputs 'bar'\n});\n",
            "Kiln.require(\"foo\")\nKiln.require(\"bar\")\nputs 'app'\n",
            "\n",
        )
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_build_skips_prerequired_and_passes_js_through() {
    let dir = project(
        "prereq_js",
        &[
            ("lib/app.rb", "require 'corelib'\nrequire 'shim.js'\nputs 1\n"),
            ("lib/shim.js", "window.shim = true;"),
        ],
    );

    let out = stdout(&kiln(&dir, &["build", "app", "-I", "lib", "-p", "corelib"]));
    assert_eq!(
        out,
        "window.shim = true;\nKiln.require(\"corelib\")\nKiln.require(\"shim.js\")\nputs 1\n\n"
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_build_writes_output_file() {
    let dir = project("output_file", &[("main.rb", "puts 1")]);

    let output = kiln(&dir, &["build", "main", "-o", "out.js"]);
    assert!(output.status.success());
    assert_eq!(fs::read_to_string(dir.join("out.js")).unwrap(), "puts 1");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_deps_lists_modules_in_emit_order() {
    let dir = project(
        "deps_list",
        &[
            ("main.rb", "require 'a'\nrequire 'vendor.js'\n"),
            ("a.rb", "require 'main'\n"),
            ("vendor.js", "var v;"),
        ],
    );

    let out = stdout(&kiln(&dir, &["deps", "main"]));
    assert_eq!(out, "compile\ta\tmain\nasset\tvendor.js\ncompile\tmain\ta, vendor.js\n");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_deps_rejects_runtime_flag() {
    let dir = project("deps_runtime", &[("main.rb", "puts 1\n")]);

    let output = kiln(&dir, &["deps", "main", "--runtime", "Opal"]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_compile_does_not_follow_requires() {
    let dir = project("compile_only", &[("main.rb", "require 'missing'\nputs 1\n")]);

    let out = stdout(&kiln(&dir, &["compile", "main.rb"]));
    assert_eq!(out, "Kiln.require(\"missing\")\nputs 1\n\n");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_missing_module_fails_without_output() {
    let dir = project("missing", &[("main.rb", "require 'nope'\n")]);

    let output = kiln(&dir, &["build", "main"]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("cannot find module 'nope'"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_compile_error_is_reported() {
    let dir = project(
        "compile_error",
        &[("main.rb", "require 'ok'\n"), ("ok.rb", "require dynamic_name\n")],
    );

    let output = kiln(&dir, &["build", "main", "--runtime", "Opal"]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("require expects a string literal"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_load_path_from_environment() {
    let dir = project("env_load_path", &[("src/main.rb", "puts 'env'")]);

    let output = Command::new(env!("CARGO_BIN_EXE_kiln"))
        .args(["build", "main"])
        .current_dir(&dir)
        .env("KILN_LOAD_PATH", dir.join("src"))
        .output()
        .expect("Failed to run kiln");
    assert_eq!(stdout(&output), "puts 'env'\n");

    let _ = fs::remove_dir_all(&dir);
}
