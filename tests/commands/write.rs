//! File and directory creation, truncation, and timestamp tests.

use kvfs::{Error, Reply, Store};

use crate::common::{bulk, err, ok, run};

#[test]
fn echo_then_cat_round_trips() {
    let mut store = Store::new();
    ok(&mut store, &["FS.ECHO", "k", "/notes.txt", "remember this"]);
    assert_eq!(
        ok(&mut store, &["FS.CAT", "k", "/notes.txt"]),
        bulk("remember this")
    );
}

#[test]
fn echo_creates_parent_directories() {
    let mut store = Store::new();
    ok(&mut store, &["FS.ECHO", "k", "/a/b/c/file.txt", "x"]);
    assert_eq!(ok(&mut store, &["FS.TEST", "k", "/a"]), Reply::Int(1));
    assert_eq!(ok(&mut store, &["FS.TEST", "k", "/a/b"]), Reply::Int(1));
    assert_eq!(ok(&mut store, &["FS.TEST", "k", "/a/b/c"]), Reply::Int(1));

    let info = ok(&mut store, &["FS.INFO", "k"]);
    assert_eq!(info.field("files"), Some(&Reply::Int(1)));
    assert_eq!(info.field("directories"), Some(&Reply::Int(4))); // root + a + b + c
}

#[test]
fn echo_overwrites_and_appends() {
    let mut store = Store::new();
    ok(&mut store, &["FS.ECHO", "k", "/f", "one"]);
    ok(&mut store, &["FS.ECHO", "k", "/f", "two"]);
    assert_eq!(ok(&mut store, &["FS.CAT", "k", "/f"]), bulk("two"));

    ok(&mut store, &["FS.ECHO", "k", "/f", " three", "APPEND"]);
    assert_eq!(ok(&mut store, &["FS.CAT", "k", "/f"]), bulk("two three"));

    let info = ok(&mut store, &["FS.INFO", "k"]);
    assert_eq!(info.field("total_data_bytes"), Some(&Reply::Int(9)));
}

#[test]
fn echo_rejects_root_and_non_files() {
    let mut store = Store::new();
    assert_eq!(err(&mut store, &["FS.ECHO", "k", "/", "x"]), Error::WriteRoot);

    ok(&mut store, &["FS.MKDIR", "k", "/dir"]);
    assert_eq!(
        err(&mut store, &["FS.ECHO", "k", "/dir", "x"]),
        Error::NotAFile
    );
}

#[test]
fn echo_rejects_unknown_token() {
    let mut store = Store::new();
    assert_eq!(
        err(&mut store, &["FS.ECHO", "k", "/f", "x", "SIDEWAYS"]),
        Error::Syntax("APPEND")
    );
}

#[test]
fn echo_through_file_in_path_is_a_conflict() {
    let mut store = Store::new();
    ok(&mut store, &["FS.ECHO", "k", "/blocker", "x"]);
    assert_eq!(
        err(&mut store, &["FS.ECHO", "k", "/blocker/inner", "y"]),
        Error::ParentConflict
    );
}

#[test]
fn append_returns_new_size() {
    let mut store = Store::new();
    assert_eq!(
        ok(&mut store, &["FS.APPEND", "k", "/log", "abc"]),
        Reply::Int(3)
    );
    assert_eq!(
        ok(&mut store, &["FS.APPEND", "k", "/log", "defg"]),
        Reply::Int(7)
    );
    assert_eq!(ok(&mut store, &["FS.CAT", "k", "/log"]), bulk("abcdefg"));
}

#[test]
fn append_to_root_is_rejected() {
    let mut store = Store::new();
    assert_eq!(
        err(&mut store, &["FS.APPEND", "k", "/", "x"]),
        Error::AppendRoot
    );
}

#[test]
fn touch_creates_empty_file_and_bumps_times() {
    let mut store = Store::new();
    ok(&mut store, &["FS.TOUCH", "k", "/empty"]);
    assert_eq!(ok(&mut store, &["FS.CAT", "k", "/empty"]), bulk(""));

    let before = ok(&mut store, &["FS.STAT", "k", "/empty"]);
    ok(&mut store, &["FS.UTIMENS", "k", "/empty", "5", "5"]);
    ok(&mut store, &["FS.TOUCH", "k", "/empty"]);
    let after = ok(&mut store, &["FS.STAT", "k", "/empty"]);

    let mtime_after = after.field("mtime").and_then(Reply::as_int).unwrap();
    assert!(mtime_after >= before.field("mtime").and_then(Reply::as_int).unwrap());
    assert_ne!(mtime_after, 5);
}

#[test]
fn mkdir_plain_requires_parent() {
    let mut store = Store::new();
    assert_eq!(
        err(&mut store, &["FS.MKDIR", "k", "/a/b"]),
        Error::NoSuchDirectory
    );
    ok(&mut store, &["FS.MKDIR", "k", "/a"]);
    ok(&mut store, &["FS.MKDIR", "k", "/a/b"]);
    assert_eq!(ok(&mut store, &["FS.TEST", "k", "/a/b"]), Reply::Int(1));
}

#[test]
fn mkdir_parents_is_idempotent() {
    let mut store = Store::new();
    for _ in 0..3 {
        ok(&mut store, &["FS.MKDIR", "k", "/x/y/z", "PARENTS"]);
    }
    let info = ok(&mut store, &["FS.INFO", "k"]);
    assert_eq!(info.field("directories"), Some(&Reply::Int(4)));
    assert_eq!(info.field("total_inodes"), Some(&Reply::Int(4)));
}

#[test]
fn mkdir_existing_without_parents_is_an_error() {
    let mut store = Store::new();
    ok(&mut store, &["FS.MKDIR", "k", "/dir"]);
    assert_eq!(
        err(&mut store, &["FS.MKDIR", "k", "/dir"]),
        Error::AlreadyExists
    );

    ok(&mut store, &["FS.ECHO", "k", "/file", "x"]);
    assert_eq!(
        err(&mut store, &["FS.MKDIR", "k", "/file", "PARENTS"]),
        Error::AlreadyExists
    );
}

#[test]
fn truncate_shrinks_extends_and_clears() {
    let mut store = Store::new();
    ok(&mut store, &["FS.ECHO", "k", "/f", "0123456789"]);

    ok(&mut store, &["FS.TRUNCATE", "k", "/f", "4"]);
    assert_eq!(ok(&mut store, &["FS.CAT", "k", "/f"]), bulk("0123"));

    ok(&mut store, &["FS.TRUNCATE", "k", "/f", "6"]);
    assert_eq!(
        ok(&mut store, &["FS.CAT", "k", "/f"]),
        Reply::bulk(b"0123\0\0".to_vec())
    );

    let info = ok(&mut store, &["FS.INFO", "k"]);
    assert_eq!(info.field("total_data_bytes"), Some(&Reply::Int(6)));

    ok(&mut store, &["FS.TRUNCATE", "k", "/f", "0"]);
    assert_eq!(ok(&mut store, &["FS.CAT", "k", "/f"]), bulk(""));
    let info = ok(&mut store, &["FS.INFO", "k"]);
    assert_eq!(info.field("total_data_bytes"), Some(&Reply::Int(0)));
}

#[test]
fn truncate_validates_arguments() {
    let mut store = Store::new();
    ok(&mut store, &["FS.ECHO", "k", "/f", "data"]);
    assert_eq!(
        err(&mut store, &["FS.TRUNCATE", "k", "/f", "-1"]),
        Error::BadLength
    );
    assert_eq!(
        err(&mut store, &["FS.TRUNCATE", "k", "/missing", "3"]),
        Error::NoSuchFileOrDir
    );

    ok(&mut store, &["FS.MKDIR", "k", "/d"]);
    assert_eq!(
        err(&mut store, &["FS.TRUNCATE", "k", "/d", "3"]),
        Error::NotAFile
    );
}

#[test]
fn utimens_sets_and_skips_fields() {
    let mut store = Store::new();
    ok(&mut store, &["FS.ECHO", "k", "/f", "x"]);

    ok(&mut store, &["FS.UTIMENS", "k", "/f", "1111", "2222"]);
    let stat = ok(&mut store, &["FS.STAT", "k", "/f"]);
    assert_eq!(stat.field("atime"), Some(&Reply::Int(1111)));
    assert_eq!(stat.field("mtime"), Some(&Reply::Int(2222)));

    // -1 leaves a field unchanged.
    ok(&mut store, &["FS.UTIMENS", "k", "/f", "-1", "3333"]);
    let stat = ok(&mut store, &["FS.STAT", "k", "/f"]);
    assert_eq!(stat.field("atime"), Some(&Reply::Int(1111)));
    assert_eq!(stat.field("mtime"), Some(&Reply::Int(3333)));

    assert_eq!(
        err(&mut store, &["FS.UTIMENS", "k", "/f", "soon", "0"]),
        Error::BadAtime
    );
}

#[test]
fn path_normalization_applies_to_arguments() {
    let mut store = Store::new();
    ok(&mut store, &["FS.ECHO", "k", "//a/.//b/../c.txt", "x"]);
    assert_eq!(ok(&mut store, &["FS.TEST", "k", "/a/c.txt"]), Reply::Int(1));
    assert_eq!(ok(&mut store, &["FS.CAT", "k", "/a/c.txt"]), bulk("x"));
}

#[test]
fn depth_cap_rejects_and_leaves_no_alias() {
    let mut store = Store::new();
    ok(&mut store, &["FS.ECHO", "k", "/keep", "x"]);

    let deep = "/d".repeat(257);
    assert_eq!(
        err(&mut store, &["FS.ECHO", "k", &deep, "x"]),
        Error::PathDepth
    );
    assert_eq!(
        err(&mut store, &["FS.TOUCH", "k", &deep]),
        Error::PathDepth
    );

    // Nothing was created for any truncated alias.
    let info = ok(&mut store, &["FS.INFO", "k"]);
    assert_eq!(info.field("total_inodes"), Some(&Reply::Int(2)));

    let truncated = "/d".repeat(256);
    assert_eq!(ok(&mut store, &["FS.TEST", "k", &truncated]), Reply::Int(0));
}

#[test]
fn wrong_arity_is_reported() {
    let mut store = Store::new();
    assert_eq!(
        err(&mut store, &["FS.ECHO", "k", "/f"]),
        Error::WrongArity("fs.echo")
    );
    assert_eq!(err(&mut store, &["FS.CAT", "k"]), Error::WrongArity("fs.cat"));
    assert!(run(&mut store, &["FS.NOPE", "k"]).is_err());
}

#[test]
fn writes_count_as_replicated() {
    let mut store = Store::new();
    ok(&mut store, &["FS.ECHO", "k", "/f", "x"]);
    ok(&mut store, &["FS.TOUCH", "k", "/f"]);
    ok(&mut store, &["FS.CAT", "k", "/f"]); // read, not replicated
    assert_eq!(store.replicated_writes(), 2);

    // Failed writes do not replicate.
    let _ = err(&mut store, &["FS.ECHO", "k", "/", "x"]);
    assert_eq!(store.replicated_writes(), 2);
}
