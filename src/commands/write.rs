//! Mutating commands.
//!
//! Every handler here runs under the dispatcher's write discipline: the
//! filesystem is auto-created on a missing key before the handler runs
//! its logic, and the empty-shell check removes the key afterwards if
//! only the root remains (including when the handler failed partway).

use bytes::Bytes;

use super::{arg_i64, arg_path, arg_str, is_token};
use crate::inode::{now_ms, Inode};
use crate::{path, Error, Fs, Reply, Store};

fn optional_token(argv: &[Bytes], at: usize, token: &'static str) -> Result<bool, Error> {
    match argv.get(at) {
        None => Ok(false),
        Some(arg) if is_token(arg, token) => Ok(true),
        Some(_) => Err(Error::Syntax(token)),
    }
}

/// Create a file holding `data` and attach it to its parent directory.
/// Parents are assumed ensured; the path is assumed vacant.
fn create_file(fs: &mut Fs, path: &str, data: &[u8]) {
    let mut inode = Inode::new_file(0);
    if let Some(file) = inode.as_file_mut() {
        file.set(data);
    }
    fs.insert(path.to_string(), inode);
    fs.link_into_parent(path, true);
}

/// Creates or overwrites a file (`FS.ECHO key path content [APPEND]`),
/// auto-creating parent directories.
pub(crate) fn echo(store: &mut Store, argv: &[Bytes]) -> Result<Reply, Error> {
    let append = optional_token(argv, 4, "APPEND")?;
    let path = arg_path(&argv[2])?;
    if path::is_root(&path) {
        return Err(Error::WriteRoot);
    }

    let fs = store.open_write(&argv[1])?;
    fs.ensure_parents(&path)?;

    let data = &argv[3];
    match fs.lookup(&path).map(Inode::is_file) {
        Some(false) => Err(Error::NotAFile),
        Some(true) if append => {
            fs.append_file_content(&path, data)?;
            Ok(Reply::Ok)
        }
        Some(true) => {
            fs.set_file_content(&path, data)?;
            Ok(Reply::Ok)
        }
        None => {
            create_file(fs, &path, data);
            Ok(Reply::Ok)
        }
    }
}

/// Appends to a file, creating it if missing (`FS.APPEND key path
/// content`). Replies with the new size.
pub(crate) fn append(store: &mut Store, argv: &[Bytes]) -> Result<Reply, Error> {
    let path = arg_path(&argv[2])?;
    if path::is_root(&path) {
        return Err(Error::AppendRoot);
    }

    let fs = store.open_write(&argv[1])?;
    fs.ensure_parents(&path)?;

    let data = &argv[3];
    match fs.lookup(&path).map(Inode::is_file) {
        Some(false) => Err(Error::NotAFile),
        Some(true) => {
            let size = fs.append_file_content(&path, data)?;
            Ok(Reply::Int(size as i64))
        }
        None => {
            create_file(fs, &path, data);
            Ok(Reply::Int(data.len() as i64))
        }
    }
}

/// Creates an empty file, or bumps the timestamps of whatever already
/// lives at the path (`FS.TOUCH key path`).
pub(crate) fn touch(store: &mut Store, argv: &[Bytes]) -> Result<Reply, Error> {
    let path = arg_path(&argv[2])?;
    let fs = store.open_write(&argv[1])?;
    fs.ensure_parents(&path)?;

    match fs.lookup_mut(&path) {
        Some(inode) => {
            let now = now_ms();
            inode.mtime = now;
            inode.atime = now;
        }
        None => {
            fs.insert(path.clone(), Inode::new_file(0));
            fs.link_into_parent(&path, true);
        }
    }
    Ok(Reply::Ok)
}

/// Creates a directory (`FS.MKDIR key path [PARENTS]`). With `PARENTS`,
/// intermediate directories are created and an existing directory is
/// accepted (idempotent, `mkdir -p`).
pub(crate) fn mkdir(store: &mut Store, argv: &[Bytes]) -> Result<Reply, Error> {
    let parents = optional_token(argv, 3, "PARENTS")?;
    let path = arg_path(&argv[2])?;
    let fs = store.open_write(&argv[1])?;

    if let Some(existing) = fs.lookup(&path) {
        if existing.is_dir() && parents {
            return Ok(Reply::Ok);
        }
        return Err(Error::AlreadyExists);
    }

    if parents {
        fs.ensure_parents(&path)?;
    } else {
        let parent = path::parent(&path);
        match fs.lookup(parent) {
            Some(inode) if inode.is_dir() => {}
            _ => return Err(Error::NoSuchDirectory),
        }
    }

    fs.insert(path.clone(), Inode::new_dir(0));
    fs.link_into_parent(&path, true);
    Ok(Reply::Ok)
}

/// Deletes a file, symlink, or directory (`FS.RM key path [RECURSIVE]`).
/// Replies 1 when something was deleted, 0 when the path (or the whole
/// key) was already absent.
pub(crate) fn rm(store: &mut Store, argv: &[Bytes]) -> Result<Reply, Error> {
    let recursive = optional_token(argv, 3, "RECURSIVE")?;

    // Deleting from a missing key is a no-op, not an auto-create.
    if !store.has_key(&argv[1]) {
        return Ok(Reply::Int(0));
    }
    let fs = store.open_write(&argv[1])?;
    let path = arg_path(&argv[2])?;

    if path::is_root(&path) {
        return Err(Error::DeleteRoot);
    }
    let Some(inode) = fs.lookup(&path) else {
        return Ok(Reply::Int(0));
    };
    if let Some(dir) = inode.as_dir() {
        if dir.child_count() > 0 && !recursive {
            return Err(Error::DirectoryNotEmpty);
        }
    }

    if recursive {
        fs.delete_recursive(&path);
    } else {
        fs.unlink_from_parent(&path);
        fs.remove(&path);
    }
    Ok(Reply::Int(1))
}

fn parse_mode(arg: &Bytes) -> Result<u16, Error> {
    let s = std::str::from_utf8(arg).map_err(|_| Error::BadMode)?;
    if s.is_empty() || s.len() >= 16 {
        return Err(Error::BadMode);
    }
    let mode = u32::from_str_radix(s, 8).map_err(|_| Error::BadMode)?;
    if mode > 0o7777 {
        return Err(Error::BadMode);
    }
    Ok(mode as u16)
}

/// Sets permission bits (`FS.CHMOD key path mode`). Strict octal parse;
/// does not follow symlinks.
pub(crate) fn chmod(store: &mut Store, argv: &[Bytes]) -> Result<Reply, Error> {
    let path = arg_path(&argv[2])?;
    let fs = store.open_write(&argv[1])?;
    if !fs.contains(&path) {
        return Err(Error::NoSuchFileOrDir);
    }
    let mode = parse_mode(&argv[3])?;
    if let Some(inode) = fs.lookup_mut(&path) {
        inode.mode = mode;
    }
    Ok(Reply::Ok)
}

fn parse_id(arg: &Bytes, bad: Error, out_of_range: Error) -> Result<u32, Error> {
    let value = arg_i64(arg).ok_or(bad)?;
    if value < 0 || value > i64::from(u32::MAX) {
        return Err(out_of_range);
    }
    Ok(value as u32)
}

/// Sets ownership (`FS.CHOWN key path uid [gid]`). Does not follow
/// symlinks.
pub(crate) fn chown(store: &mut Store, argv: &[Bytes]) -> Result<Reply, Error> {
    let path = arg_path(&argv[2])?;
    let fs = store.open_write(&argv[1])?;
    if !fs.contains(&path) {
        return Err(Error::NoSuchFileOrDir);
    }

    let uid = parse_id(&argv[3], Error::BadUid, Error::UidOutOfRange)?;
    let gid = match argv.get(4) {
        Some(arg) => Some(parse_id(arg, Error::BadGid, Error::GidOutOfRange)?),
        None => None,
    };

    if let Some(inode) = fs.lookup_mut(&path) {
        inode.uid = uid;
        if let Some(gid) = gid {
            inode.gid = gid;
        }
    }
    Ok(Reply::Ok)
}

/// Creates a symlink (`FS.LN key target linkpath`). The target is stored
/// exactly as given, absolute or relative, existing or not.
pub(crate) fn ln(store: &mut Store, argv: &[Bytes]) -> Result<Reply, Error> {
    let target = arg_str(&argv[2])?.to_string();
    let linkpath = arg_path(&argv[3])?;
    if path::is_root(&linkpath) {
        return Err(Error::SymlinkAtRoot);
    }

    let fs = store.open_write(&argv[1])?;
    if fs.contains(&linkpath) {
        return Err(Error::AlreadyExists);
    }
    fs.ensure_parents(&linkpath)?;

    fs.insert(linkpath.clone(), Inode::new_symlink(&target, 0));
    fs.link_into_parent(&linkpath, true);
    Ok(Reply::Ok)
}

/// Copies a file, symlink, or (with `RECURSIVE`) a whole directory tree
/// (`FS.CP key src dst [RECURSIVE]`), preserving mode, ownership, and
/// timestamps.
///
/// The copy is best-effort: a failure partway leaves the already-copied
/// part of the destination subtree in place. No other writer can observe
/// the intermediate state under the single-threaded execution model, and
/// the dispatcher's empty-shell check still runs afterwards.
pub(crate) fn cp(store: &mut Store, argv: &[Bytes]) -> Result<Reply, Error> {
    let recursive = optional_token(argv, 4, "RECURSIVE")?;
    let src = arg_path(&argv[2])?;
    let dst = arg_path(&argv[3])?;

    let fs = store.open_write(&argv[1])?;
    let Some(src_inode) = fs.lookup(&src) else {
        return Err(Error::NoSuchFileOrDir);
    };
    if src_inode.is_dir() && !recursive {
        return Err(Error::SourceIsDirectory);
    }
    if fs.contains(&dst) {
        return Err(Error::DestinationExists);
    }
    fs.ensure_parents(&dst)?;

    fs.copy_recursive(&src, &dst)?;
    fs.link_into_parent(&dst, true);
    Ok(Reply::Ok)
}

/// Renames a file, symlink, or directory (`FS.MV key src dst`), carrying
/// every descendant of a directory source along atomically. Refuses to
/// move a directory into its own subtree.
pub(crate) fn mv(store: &mut Store, argv: &[Bytes]) -> Result<Reply, Error> {
    let src = arg_path(&argv[2])?;
    let dst = arg_path(&argv[3])?;
    if path::is_root(&src) {
        return Err(Error::MoveRoot);
    }

    let fs = store.open_write(&argv[1])?;
    let Some(src_inode) = fs.lookup(&src) else {
        return Err(Error::NoSuchFileOrDir);
    };
    if src_inode.is_dir() && path::has_prefix(&dst, &src) {
        return Err(Error::MoveIntoSubtree);
    }
    if fs.contains(&dst) {
        return Err(Error::DestinationExists);
    }
    fs.ensure_parents(&dst)?;

    fs.move_subtree(&src, &dst);
    Ok(Reply::Ok)
}

/// Shrinks, clears, or zero-extends a file (`FS.TRUNCATE key path
/// length`). Follows symlinks.
pub(crate) fn truncate(store: &mut Store, argv: &[Bytes]) -> Result<Reply, Error> {
    let path = arg_path(&argv[2])?;
    let fs = store.open_write(&argv[1])?;
    let resolved = fs.resolve(&path)?;

    let Some(inode) = fs.lookup(&resolved) else {
        return Err(Error::NoSuchFileOrDir);
    };
    if !inode.is_file() {
        return Err(Error::NotAFile);
    }
    let length = match arg_i64(&argv[3]) {
        Some(n) if n >= 0 => n as u64,
        _ => return Err(Error::BadLength),
    };

    fs.truncate_file(&resolved, length)?;
    Ok(Reply::Ok)
}

/// Sets timestamps (`FS.UTIMENS key path atime_ms mtime_ms`); `-1`
/// leaves a field unchanged. Does not follow symlinks.
pub(crate) fn utimens(store: &mut Store, argv: &[Bytes]) -> Result<Reply, Error> {
    let path = arg_path(&argv[2])?;
    let fs = store.open_write(&argv[1])?;
    if !fs.contains(&path) {
        return Err(Error::NoSuchFileOrDir);
    }

    let atime = arg_i64(&argv[3]).ok_or(Error::BadAtime)?;
    let mtime = arg_i64(&argv[4]).ok_or(Error::BadMtime)?;

    if let Some(inode) = fs.lookup_mut(&path) {
        if atime != -1 {
            inode.atime = atime;
        }
        if mtime != -1 {
            inode.mtime = mtime;
        }
    }
    Ok(Reply::Ok)
}

/// Exact substring replacement in file content (`FS.REPLACE key path
/// needle replacement [ALL]`); first occurrence only unless `ALL`.
/// Follows symlinks. Replies with the number of replacements.
pub(crate) fn replace(store: &mut Store, argv: &[Bytes]) -> Result<Reply, Error> {
    let all = optional_token(argv, 5, "ALL")?;
    let path = arg_path(&argv[2])?;
    let fs = store.open_write(&argv[1])?;
    let resolved = fs.resolve(&path)?;

    let Some(inode) = fs.lookup(&resolved) else {
        return Ok(Reply::Null);
    };
    if !inode.is_file() {
        return Err(Error::NotAFile);
    }

    let count = fs.replace_in_file(&resolved, &argv[3], &argv[4], all)?;
    Ok(Reply::Int(count as i64))
}

/// Split content into newline-terminated segments. Each segment keeps
/// its own terminator; the final segment may lack one. Empty content has
/// no segments. The line editors splice these instead of re-joining
/// stripped lines so an existing trailing newline survives the edit.
fn line_segments(data: &[u8]) -> Vec<&[u8]> {
    data.split_inclusive(|&b| b == b'\n').collect()
}

/// Inserts content after line `line` (`FS.INSERT key path line content`).
/// Line 0 inserts before the first line; `-1` or a line past the end
/// appends. A missing path is created like an `FS.ECHO`, parents
/// included. Follows symlinks.
pub(crate) fn insert(store: &mut Store, argv: &[Bytes]) -> Result<Reply, Error> {
    let line = match arg_i64(&argv[3]) {
        Some(n) if n >= -1 => n,
        _ => return Err(Error::BadInsertLine),
    };
    let path = arg_path(&argv[2])?;
    let fs = store.open_write(&argv[1])?;
    let resolved = fs.resolve(&path)?;

    let existing = match fs.lookup(&resolved) {
        Some(inode) => match inode.as_file() {
            Some(file) => Some(file.data().to_vec()),
            None => return Err(Error::NotAFile),
        },
        None => None,
    };
    let Some(data) = existing else {
        fs.ensure_parents(&resolved)?;
        create_file(fs, &resolved, &argv[4]);
        return Ok(Reply::Ok);
    };

    let segments = line_segments(&data);
    let at = if line < 0 {
        segments.len()
    } else {
        (line as usize).min(segments.len())
    };

    let mut out = Vec::with_capacity(data.len() + argv[4].len() + 1);
    for seg in &segments[..at] {
        out.extend_from_slice(seg);
    }
    // Terminate an unterminated predecessor before splicing in.
    if at > 0 && !out.ends_with(b"\n") {
        out.push(b'\n');
    }
    out.extend_from_slice(&argv[4]);
    if at < segments.len() {
        out.push(b'\n');
    }
    for seg in &segments[at..] {
        out.extend_from_slice(seg);
    }

    fs.set_file_content(&resolved, &out)?;
    Ok(Reply::Ok)
}

/// Deletes a 1-based inclusive line range (`FS.DELETELINES key path
/// start end`); `end == -1` deletes to the end of the file. Follows
/// symlinks. Replies with the number of lines removed; a start past the
/// end removes nothing.
pub(crate) fn deletelines(store: &mut Store, argv: &[Bytes]) -> Result<Reply, Error> {
    let start = match arg_i64(&argv[3]) {
        Some(n) if n >= 1 => n as usize,
        _ => return Err(Error::BadLineStart),
    };
    let end = match arg_i64(&argv[4]) {
        Some(-1) => usize::MAX,
        Some(n) if n >= 1 => n as usize,
        _ => return Err(Error::BadLineEnd),
    };
    if end < start {
        return Err(Error::BadLineRange);
    }

    let path = arg_path(&argv[2])?;
    let fs = store.open_write(&argv[1])?;
    let resolved = fs.resolve(&path)?;

    let Some(inode) = fs.lookup(&resolved) else {
        return Ok(Reply::Null);
    };
    let Some(file) = inode.as_file() else {
        return Err(Error::NotAFile);
    };
    let data = file.data().to_vec();

    let segments = line_segments(&data);
    if start > segments.len() {
        return Ok(Reply::Int(0));
    }
    let hi = end.min(segments.len());

    let mut out = Vec::with_capacity(data.len());
    for seg in segments[..start - 1].iter().chain(&segments[hi..]) {
        out.extend_from_slice(seg);
    }

    fs.set_file_content(&resolved, &out)?;
    Ok(Reply::Int((hi - start + 1) as i64))
}
