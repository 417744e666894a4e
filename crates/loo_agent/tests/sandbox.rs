use std::fs;

use loo_agent::{Sandbox, TaskError};
use loo_tui::DirEntry;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

fn nested_root() -> (tempfile::TempDir, Sandbox) {
    let outer = tempdir().expect("temp workspace");
    fs::create_dir(outer.path().join("root")).expect("create root");
    let sandbox = Sandbox::new(outer.path().join("root")).expect("sandbox");
    (outer, sandbox)
}

#[test]
fn create_then_read_returns_exact_content() {
    let (_outer, sandbox) = nested_root();
    for (path, content) in [
        ("a.txt", "x"),
        ("deep/nested/dir/file.md", "# title\nbody\n"),
        ("unicode.txt", "héllo wörld"),
        ("empty.txt", ""),
    ] {
        sandbox.create_file(path, content).expect("create");
        assert_eq!(sandbox.read_file(path).expect("read"), content);
    }
}

#[test]
fn create_file_overwrites() {
    let (_outer, sandbox) = nested_root();
    sandbox.create_file("a.txt", "first").expect("create");
    sandbox.create_file("a.txt", "second").expect("overwrite");
    assert_eq!(sandbox.read_file("a.txt").expect("read"), "second");
}

#[test]
fn parent_escapes_are_rejected_without_side_effects() {
    let (outer, sandbox) = nested_root();
    for path in [
        "../escape.txt",
        "sub/../../escape.txt",
        "fresh/dirs/../../../escape.txt",
        "./../root/../escape.txt",
    ] {
        let err = sandbox.create_file(path, "x").expect_err(path);
        assert!(
            matches!(err, TaskError::SandboxViolation { .. }),
            "{path}: {err}"
        );
        let err = sandbox.create_directory(path).expect_err(path);
        assert!(matches!(err, TaskError::SandboxViolation { .. }));
    }

    assert!(!outer.path().join("escape.txt").exists());
    assert!(!sandbox.root().join("sub").exists());
    assert!(!sandbox.root().join("fresh").exists());
}

#[test]
fn parent_segments_inside_the_root_are_fine() {
    let (_outer, sandbox) = nested_root();
    sandbox.create_file("a/b/../c.txt", "x").expect("create");
    assert_eq!(sandbox.read_file("a/c.txt").expect("read"), "x");
}

#[test]
fn absolute_paths_must_stay_inside_the_root() {
    let (outer, sandbox) = nested_root();
    let outside = outer.path().join("outside.txt");
    let err = sandbox
        .create_file(&outside.display().to_string(), "x")
        .expect_err("outside");
    assert!(matches!(err, TaskError::SandboxViolation { .. }));
    assert!(!outside.exists());

    let inside = sandbox.root().join("inside.txt");
    sandbox
        .create_file(&inside.display().to_string(), "ok")
        .expect("inside");
    assert_eq!(sandbox.read_file("inside.txt").expect("read"), "ok");
}

#[cfg(unix)]
#[test]
fn symlink_escapes_are_rejected() {
    let (outer, sandbox) = nested_root();
    fs::create_dir(outer.path().join("elsewhere")).expect("mkdir");
    fs::write(outer.path().join("secret.txt"), "secret").expect("write");
    std::os::unix::fs::symlink(outer.path().join("elsewhere"), sandbox.root().join("link"))
        .expect("symlink dir");
    std::os::unix::fs::symlink(
        outer.path().join("secret.txt"),
        sandbox.root().join("secret"),
    )
    .expect("symlink file");
    std::os::unix::fs::symlink(outer.path().join("missing"), sandbox.root().join("dangling"))
        .expect("dangling symlink");

    assert!(matches!(
        sandbox.create_file("link/x.txt", "x"),
        Err(TaskError::SandboxViolation { .. })
    ));
    assert!(matches!(
        sandbox.read_file("secret"),
        Err(TaskError::SandboxViolation { .. })
    ));
    assert!(matches!(
        sandbox.create_file("dangling", "x"),
        Err(TaskError::SandboxViolation { .. })
    ));
    assert!(!outer.path().join("elsewhere/x.txt").exists());
    assert!(!outer.path().join("missing").exists());
}

#[cfg(unix)]
#[test]
fn symlinks_inside_the_root_are_followed_and_tagged_by_target() {
    let (_outer, sandbox) = nested_root();
    sandbox.create_file("real/file.txt", "data").expect("create");
    std::os::unix::fs::symlink(sandbox.root().join("real"), sandbox.root().join("alias"))
        .expect("symlink");

    assert_eq!(sandbox.read_file("alias/file.txt").expect("read"), "data");
    let entries = sandbox.list_directory(".").expect("list");
    assert_eq!(entries, vec![DirEntry::dir("alias"), DirEntry::dir("real")]);
}

#[test]
fn listing_is_sorted_and_tagged() {
    let (_outer, sandbox) = nested_root();
    sandbox.create_directory("d").expect("mkdir");
    sandbox.create_file("a.txt", "x").expect("create");
    assert_eq!(
        sandbox.list_directory(".").expect("list"),
        vec![DirEntry::file("a.txt"), DirEntry::dir("d")]
    );
}

#[test]
fn create_directory_is_idempotent() {
    let (_outer, sandbox) = nested_root();
    sandbox.create_directory("x/y").expect("first");
    sandbox.create_directory("x/y").expect("second");
    assert!(sandbox.root().join("x/y").is_dir());
}

#[test]
fn missing_paths_are_not_found() {
    let (_outer, sandbox) = nested_root();
    assert!(sandbox.read_file("nope.txt").expect_err("missing").is_not_found());
    assert!(sandbox
        .list_directory("nope")
        .expect_err("missing")
        .is_not_found());

    sandbox.create_file("file.txt", "x").expect("create");
    assert!(sandbox
        .list_directory("file.txt")
        .expect_err("not a dir")
        .is_not_found());
}

#[test]
fn oversized_and_binary_files_are_rejected() {
    let (_outer, sandbox) = nested_root();
    let sandbox = sandbox.with_read_max_bytes(4);
    sandbox.create_file("big.txt", "12345").expect("create");
    let err = sandbox.read_file("big.txt").expect_err("too big");
    assert!(err.to_string().contains("max read size"), "{err}");

    let sandbox = sandbox.with_read_max_bytes(1024);
    fs::write(sandbox.root().join("blob.bin"), [0xff, 0xfe, 0x00]).expect("write");
    let err = sandbox.read_file("blob.bin").expect_err("binary");
    assert!(err.to_string().contains("UTF-8"), "{err}");
}
