//! Snapshot round-trip, digest, and memory reporting tests.

use kvfs::{Reply, Store};

use crate::common::{bulk, ok, sample_store};

fn save(store: &Store) -> Vec<u8> {
    let mut buf = Vec::new();
    store.save_snapshot(&mut buf).expect("save");
    buf
}

#[test]
fn round_trip_preserves_everything() {
    let mut store = sample_store();
    ok(&mut store, &["FS.CHMOD", "k", "/readme", "0601"]);
    ok(&mut store, &["FS.CHOWN", "k", "/readme", "12", "34"]);
    ok(&mut store, &["FS.UTIMENS", "k", "/readme", "1111", "2222"]);

    let before_digest = store.digest(b"k").unwrap();
    let buf = save(&store);

    let mut restored = Store::load_snapshot(&mut buf.as_slice()).expect("load");
    assert_eq!(restored.digest(b"k"), Some(before_digest));

    assert_eq!(
        ok(&mut restored, &["FS.CAT", "k", "/readme"]),
        bulk("hello world\n")
    );
    assert_eq!(
        ok(&mut restored, &["FS.READLINK", "k", "/link"]),
        bulk("/readme")
    );

    let stat = ok(&mut restored, &["FS.STAT", "k", "/readme"]);
    assert_eq!(stat.field("mode"), Some(&bulk("0601")));
    assert_eq!(stat.field("uid"), Some(&Reply::Int(12)));
    assert_eq!(stat.field("gid"), Some(&Reply::Int(34)));
    assert_eq!(stat.field("mtime"), Some(&Reply::Int(2222)));

    // Counters are rebuilt from the stream, not stored.
    let info = ok(&mut restored, &["FS.INFO", "k"]);
    assert_eq!(info.field("files"), Some(&Reply::Int(3)));
    assert_eq!(info.field("directories"), Some(&Reply::Int(3)));
    assert_eq!(info.field("symlinks"), Some(&Reply::Int(1)));
    assert_eq!(info.field("total_data_bytes"), Some(&Reply::Int(32)));
}

#[test]
fn blooms_are_rebuilt_on_load() {
    let store = sample_store();
    let buf = save(&store);
    let mut restored = Store::load_snapshot(&mut buf.as_slice()).expect("load");

    // Pruning still works after restore: only guide.txt contains "beta".
    let hits = ok(&mut restored, &["FS.GREP", "k", "/", "*beta*"]);
    let rows = hits.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].as_array().unwrap()[0], bulk("/docs/guide.txt"));
}

#[test]
fn empty_file_round_trips() {
    let mut store = Store::new();
    ok(&mut store, &["FS.TOUCH", "k", "/empty"]);
    ok(&mut store, &["FS.ECHO", "k", "/full", "data"]);

    let buf = save(&store);
    let mut restored = Store::load_snapshot(&mut buf.as_slice()).expect("load");
    assert_eq!(ok(&mut restored, &["FS.CAT", "k", "/empty"]), bulk(""));
}

#[test]
fn raw_values_round_trip_too() {
    let mut store = Store::new();
    store.set_raw("plain", "host native value");
    ok(&mut store, &["FS.ECHO", "fs", "/f", "x"]);

    let buf = save(&store);
    let restored = Store::load_snapshot(&mut buf.as_slice()).expect("load");
    assert_eq!(restored.key_count(), 2);
    assert!(restored.has_key(b"plain"));
    assert!(restored.has_key(b"fs"));
}

#[test]
fn truncated_stream_fails_cleanly() {
    let store = sample_store();
    let buf = save(&store);

    for cut in [0, 1, buf.len() / 2, buf.len() - 1] {
        let result = Store::load_snapshot(&mut &buf[..cut]);
        assert!(result.is_err(), "cut at {cut} must fail");
    }
}

#[test]
fn unsupported_version_is_rejected() {
    let store = sample_store();
    let mut buf = save(&store);

    // The version byte sits right after the key framing: u64 key count,
    // length-prefixed key bytes, value type tag.
    let version_at = 8 + 8 + 1 + 1;
    assert_eq!(buf[version_at], kvfs::ENCODING_VERSION);
    buf[version_at] = 9;

    assert!(Store::load_snapshot(&mut buf.as_slice()).is_err());
}

#[test]
fn corrupt_type_tag_is_rejected() {
    let mut store = Store::new();
    ok(&mut store, &["FS.ECHO", "k", "/f", "x"]);
    let mut buf = save(&store);

    // Inode type tag: after key framing + version comes the fs payload
    // (u64 inode count, then path string). Flip the first inode's tag.
    let path_len = b"/".len() as u64;
    let tag_at = (8 + 8 + 1 + 1) + 1 + 8 + 8 + path_len as usize;
    buf[tag_at] = 7;

    assert!(Store::load_snapshot(&mut buf.as_slice()).is_err());
}

#[test]
fn digest_is_identical_for_equal_filesystems_built_differently() {
    // Same final state, different operation order and different map
    // insertion order.
    let mut a = Store::new();
    ok(&mut a, &["FS.ECHO", "k", "/one", "1"]);
    ok(&mut a, &["FS.ECHO", "k", "/two", "2"]);

    let mut b = Store::new();
    ok(&mut b, &["FS.ECHO", "k", "/two", "2"]);
    ok(&mut b, &["FS.ECHO", "k", "/one", "1"]);

    // Child-list order differs, which listing observes but digest
    // deliberately does not: the map contents are equal.
    assert_eq!(a.digest(b"k"), b.digest(b"k"));
}

#[test]
fn digest_differs_on_content_change() {
    let mut a = Store::new();
    ok(&mut a, &["FS.ECHO", "k", "/f", "same path"]);
    let d1 = a.digest(b"k").unwrap();

    ok(&mut a, &["FS.ECHO", "k", "/f", "other data"]);
    let d2 = a.digest(b"k").unwrap();
    assert_ne!(d1, d2);
}

#[test]
fn memory_usage_grows_with_content() {
    let mut store = Store::new();
    ok(&mut store, &["FS.ECHO", "k", "/f", "x"]);
    let small = store.memory_usage(b"k").unwrap();

    let big_payload = "x".repeat(100_000);
    ok(&mut store, &["FS.ECHO", "k", "/f", &big_payload]);
    let big = store.memory_usage(b"k").unwrap();

    assert!(big >= small + 99_000, "{big} vs {small}");
    assert!(store.memory_usage(b"missing").is_none());
}

#[test]
fn snapshot_then_mutate_then_restore_diverges() {
    let mut store = sample_store();
    let buf = save(&store);
    let before = store.digest(b"k").unwrap();

    ok(&mut store, &["FS.ECHO", "k", "/readme", "rewritten"]);
    assert_ne!(store.digest(b"k").unwrap(), before);

    let restored = Store::load_snapshot(&mut buf.as_slice()).expect("load");
    assert_eq!(restored.digest(b"k"), Some(before));
}
