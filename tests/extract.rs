use std::fs;

use wgtfile::zip::{CompressionMethod, EntryOptions, ZipWriter};
use wgtfile::{Error, WgtFile};

fn widget() -> Vec<u8> {
    let mut zip = ZipWriter::new();
    zip.add_file("config.xml", b"<widget id=\"acme\"/>", EntryOptions::default())
        .unwrap();
    zip.add_file(
        "index.html",
        b"<html><script src=\"js/main.js\"></script></html>",
        EntryOptions::default().method(CompressionMethod::Deflate),
    )
    .unwrap();
    zip.add_directory("js/").unwrap();
    zip.add_file("js///main.js", b"init();", EntryOptions::default())
        .unwrap();
    zip.add_directory("doc/").unwrap();
    zip.add_directory("doc/images/").unwrap();
    zip.add_file("doc/images/logo.png", &[0x89, b'P', b'N', b'G'], EntryOptions::default())
        .unwrap();
    zip.add_file("doc/guides/intro.md", b"# Intro", EntryOptions::default())
        .unwrap();
    zip.finish().unwrap()
}

fn tempdir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("wgtfile-test-")
        .tempdir()
        .expect("Failed to create temp dir")
}

#[test]
fn extract_whole_package() {
    let wgt = WgtFile::from_bytes(widget()).unwrap();
    let temp = tempdir();
    let root = temp.path().join("acme");

    wgt.extract(&root).unwrap();

    assert_eq!(
        fs::read(root.join("config.xml")).unwrap(),
        b"<widget id=\"acme\"/>"
    );
    assert_eq!(fs::read(root.join("js/main.js")).unwrap(), b"init();");
    assert_eq!(
        fs::read(root.join("doc/images/logo.png")).unwrap(),
        [0x89, b'P', b'N', b'G']
    );
    assert_eq!(fs::read(root.join("doc/guides/intro.md")).unwrap(), b"# Intro");
    assert!(root.join("doc/images").is_dir());
}

#[test]
fn extract_dir_into_existing_tree_keeps_unrelated_files() {
    let wgt = WgtFile::from_bytes(widget()).unwrap();
    let temp = tempdir();
    let root = temp.path();
    fs::create_dir_all(root.join("doc/images")).unwrap();
    fs::write(root.join("doc/images/keep.txt"), b"mine").unwrap();

    wgt.extract_dir("doc", root).unwrap();
    wgt.extract_dir("doc/", root).unwrap();

    assert_eq!(fs::read(root.join("doc/images/keep.txt")).unwrap(), b"mine");
    assert!(root.join("doc/images/logo.png").is_file());
    assert!(root.join("doc/guides/intro.md").is_file());
    assert!(!root.join("config.xml").exists());
}

#[test]
fn extract_file_overwrites_and_returns_path() {
    let wgt = WgtFile::from_bytes(widget()).unwrap();
    let temp = tempdir();
    let root = temp.path();
    fs::create_dir(root.join("js")).unwrap();
    fs::write(root.join("js/main.js"), b"stale content that is longer").unwrap();

    let dest = wgt.extract_file("js/main.js", root).unwrap();

    assert_eq!(dest, root.join("js").join("main.js"));
    assert_eq!(fs::read(&dest).unwrap(), b"init();");
}

#[test]
fn extract_file_needs_at_most_one_missing_parent() {
    let wgt = WgtFile::from_bytes(widget()).unwrap();
    let temp = tempdir();

    let err = wgt
        .extract_file("doc/images/logo.png", temp.path())
        .unwrap_err();
    assert!(matches!(err, Error::Io(_)));
    assert!(!temp.path().join("doc").exists());

    wgt.extract_file("index.html", temp.path().join("site")).unwrap();
    assert!(temp.path().join("site/index.html").is_file());
}

#[test]
fn missing_names_touch_nothing() {
    let wgt = WgtFile::from_bytes(widget()).unwrap();
    let temp = tempdir();
    let root = temp.path().join("out");

    assert!(wgt.extract_dir("styles", &root).unwrap_err().is_not_found());
    assert!(wgt.extract_file("doc/index.md", &root).unwrap_err().is_not_found());
    assert!(!root.exists());
}

#[test]
fn hostile_package_is_rejected_wholesale() {
    for hostile in ["../../invalid1.html", "folder1/../../invalid2.html", "/invalid3.html"] {
        let mut zip = ZipWriter::new();
        zip.add_file("config.xml", b"", EntryOptions::default())
            .unwrap();
        zip.add_file(hostile, b"pwned", EntryOptions::default())
            .unwrap();

        let err = WgtFile::from_bytes(zip.finish().unwrap())
            .err()
            .expect("load should fail");
        assert!(err.is_invalid_path(), "{hostile}: {err}");
    }
}

#[test]
fn open_from_disk() {
    let temp = tempdir();
    let package = temp.path().join("acme.wgt");
    fs::write(&package, widget()).unwrap();

    let wgt = WgtFile::open(&package).unwrap();
    assert_eq!(wgt.template().unwrap(), b"<widget id=\"acme\"/>");
    assert!(wgt.is_dir("doc/images"));
    assert!(!wgt.is_dir("doc/guides"));

    let missing = WgtFile::open(temp.path().join("missing.wgt"));
    assert!(matches!(missing, Err(Error::Io(_))));
}

#[cfg(unix)]
#[test]
fn permissions_follow_the_archive() {
    use std::os::unix::fs::PermissionsExt;

    let mut zip = ZipWriter::new();
    zip.add_file("bin/", b"", EntryOptions::default()).unwrap();
    zip.add_file(
        "bin/run.sh",
        b"#!/bin/sh\necho hi\n",
        EntryOptions::default().unix_mode(0o750),
    )
    .unwrap();
    let wgt = WgtFile::from_bytes(zip.finish().unwrap()).unwrap();
    let temp = tempdir();

    wgt.extract(temp.path()).unwrap();

    let mode = fs::metadata(temp.path().join("bin/run.sh"))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o750);
}

#[cfg(unix)]
#[test]
fn read_only_entries_can_be_extracted_again() {
    use std::os::unix::fs::PermissionsExt;

    let mut zip = ZipWriter::new();
    zip.add_directory("doc/").unwrap();
    zip.add_file(
        "doc/readme.txt",
        b"read me",
        EntryOptions::default().unix_mode(0o444),
    )
    .unwrap();
    let wgt = WgtFile::from_bytes(zip.finish().unwrap()).unwrap();
    let temp = tempdir();
    let root = temp.path().join("out");

    wgt.extract_dir("doc", &root).unwrap();
    wgt.extract_dir("doc", &root).unwrap();
    wgt.extract(&root).unwrap();

    let readme = root.join("doc/readme.txt");
    assert_eq!(fs::read(&readme).unwrap(), b"read me");
    let mode = fs::metadata(&readme).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o644);
}

#[test]
fn rewritten_config_round_trips_through_disk() {
    let wgt = WgtFile::from_bytes(widget()).unwrap();
    let updated = wgt.with_config(b"<widget id=\"acme\" version=\"2\"/>").unwrap();

    let temp = tempdir();
    let package = temp.path().join("acme-2.wgt");
    fs::write(&package, updated).unwrap();

    let reopened = WgtFile::open(&package).unwrap();
    reopened.extract(temp.path().join("out")).unwrap();
    assert_eq!(
        fs::read(temp.path().join("out/config.xml")).unwrap(),
        b"<widget id=\"acme\" version=\"2\"/>"
    );
    assert!(temp.path().join("out/doc/images/logo.png").is_file());
}
