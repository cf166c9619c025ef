//! Info, stat, existence, ownership, and wrong-type tests.

use kvfs::{Error, Reply, Store};

use crate::common::{bulk, err, ok, sample_store};

#[test]
fn info_reports_counters() {
    let mut store = sample_store();
    let info = ok(&mut store, &["FS.INFO", "k"]);
    assert_eq!(info.field("files"), Some(&Reply::Int(3)));
    assert_eq!(info.field("directories"), Some(&Reply::Int(3))); // /, /docs, /docs/sub
    assert_eq!(info.field("symlinks"), Some(&Reply::Int(1)));
    assert_eq!(info.field("total_data_bytes"), Some(&Reply::Int(32)));
    assert_eq!(info.field("total_inodes"), Some(&Reply::Int(7)));
}

#[test]
fn stat_file_directory_and_missing() {
    let mut store = sample_store();

    let file = ok(&mut store, &["FS.STAT", "k", "/docs/guide.txt"]);
    assert_eq!(file.field("type"), Some(&bulk("file")));
    assert_eq!(file.field("mode"), Some(&bulk("0644")));
    assert_eq!(file.field("size"), Some(&Reply::Int(16)));
    assert_eq!(file.field("uid"), Some(&Reply::Int(0)));
    assert!(file.field("ctime").and_then(Reply::as_int).unwrap() > 0);

    // Directory size is its child count.
    let dir = ok(&mut store, &["FS.STAT", "k", "/docs"]);
    assert_eq!(dir.field("type"), Some(&bulk("dir")));
    assert_eq!(dir.field("mode"), Some(&bulk("0755")));
    assert_eq!(dir.field("size"), Some(&Reply::Int(2)));

    assert_eq!(ok(&mut store, &["FS.STAT", "k", "/ghost"]), Reply::Null);
}

#[test]
fn test_reports_existence() {
    let mut store = sample_store();
    assert_eq!(ok(&mut store, &["FS.TEST", "k", "/readme"]), Reply::Int(1));
    assert_eq!(ok(&mut store, &["FS.TEST", "k", "/nope"]), Reply::Int(0));
    assert_eq!(err(&mut store, &["FS.TEST", "nope", "/x"]), Error::NoSuchKey);
}

#[test]
fn chmod_accepts_strict_octal_only() {
    let mut store = sample_store();
    ok(&mut store, &["FS.CHMOD", "k", "/readme", "0601"]);
    assert_eq!(
        ok(&mut store, &["FS.STAT", "k", "/readme"]).field("mode"),
        Some(&bulk("0601"))
    );

    ok(&mut store, &["FS.CHMOD", "k", "/readme", "7777"]);
    assert_eq!(
        ok(&mut store, &["FS.STAT", "k", "/readme"]).field("mode"),
        Some(&bulk("7777"))
    );

    for bad in ["08", "9", "12345", "rwx", "", "010000"] {
        assert_eq!(
            err(&mut store, &["FS.CHMOD", "k", "/readme", bad]),
            Error::BadMode,
            "mode {bad:?}"
        );
    }

    // The failed parses left the mode untouched.
    assert_eq!(
        ok(&mut store, &["FS.STAT", "k", "/readme"]).field("mode"),
        Some(&bulk("7777"))
    );

    assert_eq!(
        err(&mut store, &["FS.CHMOD", "k", "/ghost", "0644"]),
        Error::NoSuchFileOrDir
    );
}

#[test]
fn chown_sets_and_validates_ids() {
    let mut store = sample_store();
    ok(&mut store, &["FS.CHOWN", "k", "/readme", "1000"]);
    let stat = ok(&mut store, &["FS.STAT", "k", "/readme"]);
    assert_eq!(stat.field("uid"), Some(&Reply::Int(1000)));
    assert_eq!(stat.field("gid"), Some(&Reply::Int(0)));

    ok(&mut store, &["FS.CHOWN", "k", "/readme", "1000", "2000"]);
    let stat = ok(&mut store, &["FS.STAT", "k", "/readme"]);
    assert_eq!(stat.field("gid"), Some(&Reply::Int(2000)));

    assert_eq!(
        err(&mut store, &["FS.CHOWN", "k", "/readme", "-1"]),
        Error::UidOutOfRange
    );
    assert_eq!(
        err(&mut store, &["FS.CHOWN", "k", "/readme", "4294967296"]),
        Error::UidOutOfRange
    );
    assert_eq!(
        err(&mut store, &["FS.CHOWN", "k", "/readme", "abc"]),
        Error::BadUid
    );
    assert_eq!(
        err(&mut store, &["FS.CHOWN", "k", "/readme", "5", "-2"]),
        Error::GidOutOfRange
    );

    // A rejected gid leaves the uid untouched as well: no torn inode.
    let stat = ok(&mut store, &["FS.STAT", "k", "/readme"]);
    assert_eq!(stat.field("uid"), Some(&Reply::Int(1000)));
}

#[test]
fn chmod_chown_do_not_follow_symlinks() {
    let mut store = sample_store();
    ok(&mut store, &["FS.CHMOD", "k", "/link", "0700"]);
    ok(&mut store, &["FS.CHOWN", "k", "/link", "42"]);

    let link = ok(&mut store, &["FS.STAT", "k", "/link"]);
    assert_eq!(link.field("mode"), Some(&bulk("0700")));
    assert_eq!(link.field("uid"), Some(&Reply::Int(42)));

    let target = ok(&mut store, &["FS.STAT", "k", "/readme"]);
    assert_eq!(target.field("mode"), Some(&bulk("0644")));
    assert_eq!(target.field("uid"), Some(&Reply::Int(0)));
}

#[test]
fn wrong_type_key_is_rejected() {
    let mut store = Store::new();
    store.set_raw("s", "plain string value");

    assert_eq!(err(&mut store, &["FS.INFO", "s"]), Error::WrongType);
    assert_eq!(err(&mut store, &["FS.CAT", "s", "/x"]), Error::WrongType);
    assert_eq!(err(&mut store, &["FS.ECHO", "s", "/x", "y"]), Error::WrongType);
    assert_eq!(err(&mut store, &["FS.RM", "s", "/x"]), Error::WrongType);

    // The raw value survives the failed writes.
    assert!(store.has_key(b"s"));
}

#[test]
fn cat_bumps_atime() {
    let mut store = sample_store();
    ok(&mut store, &["FS.UTIMENS", "k", "/readme", "7", "7"]);
    ok(&mut store, &["FS.CAT", "k", "/readme"]);
    let atime = ok(&mut store, &["FS.STAT", "k", "/readme"])
        .field("atime")
        .and_then(Reply::as_int)
        .unwrap();
    assert_ne!(atime, 7);
}

#[test]
fn invalid_utf8_path_is_rejected() {
    let mut store = Store::new();
    let argv = vec![
        bytes::Bytes::from_static(b"FS.TOUCH"),
        bytes::Bytes::from_static(b"k"),
        bytes::Bytes::from_static(b"/\xff\xfe"),
    ];
    assert_eq!(store.dispatch(&argv), Err(Error::InvalidPath));

    let nul = vec![
        bytes::Bytes::from_static(b"FS.TOUCH"),
        bytes::Bytes::from_static(b"k"),
        bytes::Bytes::from_static(b"/a\x00b"),
    ];
    assert_eq!(store.dispatch(&nul), Err(Error::InvalidPath));
}
