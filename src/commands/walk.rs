//! Listing and traversal commands.
//!
//! `FIND` and `GREP` walk depth-first from their start path in child-list
//! order, visiting a node before its children. Traversals run to
//! completion on the dispatch thread; there is no yielding mid-walk.

use bytes::Bytes;

use super::{arg_i64, arg_path, is_token};
use crate::inode::now_ms;
use crate::{path, Error, Fs, Reply, Store};

const DEFAULT_TREE_DEPTH: i64 = 64;

/// Lists a directory, default `/` (`FS.LS key [path] [LONG]`). Follows
/// symlinks on the target and bumps its atime. `LONG` returns
/// `[name, type, mode, size, mtime]` per entry.
///
/// A single extra argument equal (case-insensitively) to `LONG` is read
/// as the flag, so a directory literally named `LONG` must be listed via
/// its full path.
pub(crate) fn ls(store: &mut Store, argv: &[Bytes]) -> Result<Reply, Error> {
    let (path_arg, long) = match argv.len() {
        2 => (None, false),
        3 if is_token(&argv[2], "LONG") => (None, true),
        3 => (Some(&argv[2]), false),
        _ => {
            if !is_token(&argv[3], "LONG") {
                return Err(Error::Syntax("LONG"));
            }
            (Some(&argv[2]), true)
        }
    };
    let path = match path_arg {
        Some(arg) => arg_path(arg)?,
        None => "/".to_string(),
    };

    let fs = store.open_read(&argv[1])?;
    let resolved = fs.resolve(&path)?;

    let children = {
        let Some(inode) = fs.lookup_mut(&resolved) else {
            return Err(Error::NoSuchDirectory);
        };
        let Some(dir) = inode.as_dir() else {
            return Err(Error::NotADirectory);
        };
        let children = dir.children().to_vec();
        inode.atime = now_ms();
        children
    };

    if !long {
        let names = children.into_iter().map(Reply::bulk).collect();
        return Ok(Reply::Array(names));
    }

    let mut rows = Vec::with_capacity(children.len());
    for name in children {
        let child_path = path::join(&resolved, &name).ok();
        let child = child_path.as_deref().and_then(|p| fs.lookup(p));
        rows.push(match child {
            Some(inode) => Reply::Array(vec![
                Reply::bulk(name),
                Reply::bulk(inode.type_str()),
                Reply::bulk(format!("{:04o}", inode.mode)),
                Reply::Int(match inode.as_file() {
                    Some(f) => f.len() as i64,
                    None => 0,
                }),
                Reply::Int(inode.mtime),
            ]),
            // A dangling child-list entry violates the map/child-list
            // invariant; report a placeholder row rather than failing the
            // whole listing.
            None => Reply::Array(vec![
                Reply::bulk(name),
                Reply::bulk("unknown"),
                Reply::bulk("0000"),
                Reply::Int(0),
                Reply::Int(0),
            ]),
        });
    }
    Ok(Reply::Array(rows))
}

/// Nested tree view (`FS.TREE key path [DEPTH n]`). Directories render
/// as `[name/, [children…]]`; files, symlinks, and directories at the
/// depth limit render as bare names with a `/` or `@` suffix.
pub(crate) fn tree(store: &mut Store, argv: &[Bytes]) -> Result<Reply, Error> {
    let max_depth = match argv.len() {
        3 => DEFAULT_TREE_DEPTH,
        5 if is_token(&argv[3], "DEPTH") => match arg_i64(&argv[4]) {
            Some(d) if d >= 0 => d,
            _ => return Err(Error::BadDepth),
        },
        _ => return Err(Error::Syntax("DEPTH <n>")),
    };

    let fs = store.open_read(&argv[1])?;
    let path = arg_path(&argv[2])?;
    if !fs.contains(&path) {
        return Err(Error::NoSuchPath);
    }

    Ok(tree_node(fs, &path, 0, max_depth).unwrap_or(Reply::Null))
}

fn tree_node(fs: &Fs, path: &str, depth: i64, max_depth: i64) -> Option<Reply> {
    let inode = fs.lookup(path)?;
    let base = path::basename(path);

    let Some(dir) = inode.as_dir().filter(|_| depth < max_depth) else {
        let suffix = if inode.is_dir() {
            "/"
        } else if inode.is_symlink() {
            "@"
        } else {
            ""
        };
        return Some(Reply::bulk(format!("{base}{suffix}")));
    };

    // Root renders as "/", never "//".
    let label = if path::is_root(path) {
        "/".to_string()
    } else {
        format!("{base}/")
    };

    let mut children = Vec::with_capacity(dir.child_count());
    for name in dir.children() {
        let Ok(child_path) = path::join(path, name) else {
            continue;
        };
        if let Some(node) = tree_node(fs, &child_path, depth + 1, max_depth) {
            children.push(node);
        }
    }
    Some(Reply::Array(vec![
        Reply::bulk(label),
        Reply::Array(children),
    ]))
}

/// Depth-first glob match over basenames (`FS.FIND key path pattern
/// [TYPE file|dir|symlink]`); replies with full paths.
pub(crate) fn find(store: &mut Store, argv: &[Bytes]) -> Result<Reply, Error> {
    let type_filter = match argv.len() {
        4 => None,
        6 if is_token(&argv[4], "TYPE") => {
            let t = &argv[5];
            if is_token(t, "file") {
                Some(0u8)
            } else if is_token(t, "dir") {
                Some(1u8)
            } else if is_token(t, "symlink") {
                Some(2u8)
            } else {
                return Err(Error::BadTypeFilter);
            }
        }
        _ => return Err(Error::Syntax("TYPE <type>")),
    };

    let fs = store.open_read(&argv[1])?;
    let path = arg_path(&argv[2])?;
    let pattern = &argv[3];

    let mut matches = Vec::new();
    find_walk(fs, &path, pattern, type_filter, &mut matches);
    Ok(Reply::Array(matches))
}

fn find_walk(fs: &Fs, path: &str, pattern: &[u8], type_filter: Option<u8>, out: &mut Vec<Reply>) {
    let Some(inode) = fs.lookup(path) else {
        return;
    };

    let base = path::basename(path);
    if path::glob_match(pattern, base.as_bytes())
        && type_filter.map_or(true, |t| t == inode.kind.tag())
    {
        out.push(Reply::bulk(path.to_string()));
    }

    if let Some(dir) = inode.as_dir() {
        for name in dir.children() {
            if let Ok(child_path) = path::join(path, name) {
                find_walk(fs, &child_path, pattern, type_filter, out);
            }
        }
    }
}

/// Glob-matches file content line by line under `path` (`FS.GREP key
/// path pattern [NOCASE]`); replies with `[path, lineno, line]` triples.
///
/// Each file's trigram bloom is consulted first; a definitive miss skips
/// the scan entirely. Files containing a NUL byte are treated as binary:
/// the pattern's longest literal is searched case-insensitively in the
/// raw bytes and a single `Binary file matches` row is emitted on a hit.
pub(crate) fn grep(store: &mut Store, argv: &[Bytes]) -> Result<Reply, Error> {
    let nocase = match argv.len() {
        4 => false,
        _ if is_token(&argv[4], "NOCASE") => true,
        _ => return Err(Error::Syntax("NOCASE")),
    };

    let fs = store.open_read(&argv[1])?;
    let path = arg_path(&argv[2])?;
    let pattern = &argv[3];

    let mut matches = Vec::new();
    grep_walk(fs, &path, pattern, nocase, &mut matches);
    Ok(Reply::Array(matches))
}

fn grep_walk(fs: &Fs, path: &str, pattern: &[u8], nocase: bool, out: &mut Vec<Reply>) {
    let Some(inode) = fs.lookup(path) else {
        return;
    };

    if let Some(file) = inode.as_file().filter(|f| !f.is_empty()) {
        if file.bloom().may_match(file.data().len(), pattern) {
            grep_file(path, file.data(), pattern, nocase, out);
        }
    }

    if let Some(dir) = inode.as_dir() {
        for name in dir.children() {
            if let Ok(child_path) = path::join(path, name) {
                grep_walk(fs, &child_path, pattern, nocase, out);
            }
        }
    }
}

fn grep_file(path: &str, data: &[u8], pattern: &[u8], nocase: bool, out: &mut Vec<Reply>) {
    if data.contains(&0) {
        // Binary heuristic, same as GNU grep: any NUL byte. Line-oriented
        // glob matching is meaningless here, so look for the pattern's
        // literal anywhere in the raw bytes instead.
        let found = match path::longest_literal(pattern) {
            Some(lit) => data
                .windows(lit.len())
                .any(|win| win.eq_ignore_ascii_case(&lit)),
            // No usable literal to anchor on; assume a match.
            None => true,
        };
        if found {
            out.push(Reply::Array(vec![
                Reply::bulk(path.to_string()),
                Reply::Int(0),
                Reply::bulk("Binary file matches"),
            ]));
        }
        return;
    }

    for (idx, line) in super::content_lines(data).iter().enumerate() {
        let hit = if nocase {
            path::glob_match_nocase(pattern, line)
        } else {
            path::glob_match(pattern, line)
        };
        if hit {
            out.push(Reply::Array(vec![
                Reply::bulk(path.to_string()),
                Reply::Int(idx as i64 + 1),
                Reply::bulk(line.to_vec()),
            ]));
        }
    }
}
