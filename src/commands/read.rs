//! Point reads and metadata commands.

use bytes::Bytes;

use super::{arg_i64, arg_path, content_lines};
use crate::inode::now_ms;
use crate::{Error, Reply, Store};

/// Filesystem statistics (`FS.INFO key`). O(1).
pub(crate) fn info(store: &mut Store, argv: &[Bytes]) -> Result<Reply, Error> {
    let fs = store.open_read(&argv[1])?;
    Ok(Reply::Map(vec![
        ("files", Reply::Int(fs.file_count() as i64)),
        ("directories", Reply::Int(fs.dir_count() as i64)),
        ("symlinks", Reply::Int(fs.symlink_count() as i64)),
        (
            "total_data_bytes",
            Reply::Int(fs.total_data_bytes() as i64),
        ),
        ("total_inodes", Reply::Int(fs.total_inodes() as i64)),
    ]))
}

/// Inode metadata (`FS.STAT key path`). Does not follow symlinks;
/// replies null for a missing path.
pub(crate) fn stat(store: &mut Store, argv: &[Bytes]) -> Result<Reply, Error> {
    let fs = store.open_read(&argv[1])?;
    let path = arg_path(&argv[2])?;

    let Some(inode) = fs.lookup(&path) else {
        return Ok(Reply::Null);
    };
    Ok(Reply::Map(vec![
        ("type", Reply::bulk(inode.type_str())),
        ("mode", Reply::bulk(format!("{:04o}", inode.mode))),
        ("uid", Reply::Int(i64::from(inode.uid))),
        ("gid", Reply::Int(i64::from(inode.gid))),
        ("size", Reply::Int(inode.stat_size() as i64)),
        ("ctime", Reply::Int(inode.ctime)),
        ("mtime", Reply::Int(inode.mtime)),
        ("atime", Reply::Int(inode.atime)),
    ]))
}

/// Path existence check (`FS.TEST key path`): 1 if the path exists,
/// else 0.
pub(crate) fn test(store: &mut Store, argv: &[Bytes]) -> Result<Reply, Error> {
    let fs = store.open_read(&argv[1])?;
    let path = arg_path(&argv[2])?;
    Ok(Reply::Int(i64::from(fs.contains(&path))))
}

/// Whole-file read (`FS.CAT key path`). Follows symlinks, bumps atime.
pub(crate) fn cat(store: &mut Store, argv: &[Bytes]) -> Result<Reply, Error> {
    let fs = store.open_read(&argv[1])?;
    let path = arg_path(&argv[2])?;
    let resolved = fs.resolve(&path)?;

    let Some(inode) = fs.lookup_mut(&resolved) else {
        return Ok(Reply::Null);
    };
    if !inode.is_file() {
        return Err(Error::NotAFile);
    }
    inode.atime = now_ms();
    let data = inode
        .as_file()
        .map(|f| f.data().to_vec())
        .unwrap_or_default();
    Ok(Reply::bulk(data))
}

/// Returns a symlink's target, unresolved (`FS.READLINK key path`).
pub(crate) fn readlink(store: &mut Store, argv: &[Bytes]) -> Result<Reply, Error> {
    let fs = store.open_read(&argv[1])?;
    let path = arg_path(&argv[2])?;

    let Some(inode) = fs.lookup(&path) else {
        return Ok(Reply::Null);
    };
    match inode.as_symlink() {
        Some(link) => Ok(Reply::bulk(link.target().to_string())),
        None => Err(Error::NotASymlink),
    }
}

/// Shared front half of the line-oriented readers: resolve, type-check,
/// bump atime, and hand back the content.
fn read_file_content(store: &mut Store, argv: &[Bytes]) -> Result<Option<Vec<u8>>, Error> {
    let fs = store.open_read(&argv[1])?;
    let path = arg_path(&argv[2])?;
    let resolved = fs.resolve(&path)?;

    let Some(inode) = fs.lookup_mut(&resolved) else {
        return Ok(None);
    };
    if !inode.is_file() {
        return Err(Error::NotAFile);
    }
    inode.atime = now_ms();
    Ok(inode.as_file().map(|f| f.data().to_vec()))
}

fn line_count_arg(argv: &[Bytes]) -> Result<usize, Error> {
    match argv.get(3) {
        None => Ok(10),
        Some(arg) => match arg_i64(arg) {
            Some(n) if n >= 0 => Ok(n as usize),
            _ => Err(Error::BadLineCount),
        },
    }
}

fn join_lines(lines: &[&[u8]]) -> Reply {
    Reply::bulk(lines.join(&b'\n'))
}

/// First `n` lines of a file, default 10 (`FS.HEAD key path [n]`).
pub(crate) fn head(store: &mut Store, argv: &[Bytes]) -> Result<Reply, Error> {
    let n = line_count_arg(argv)?;
    let Some(data) = read_file_content(store, argv)? else {
        return Ok(Reply::Null);
    };
    let lines = content_lines(&data);
    Ok(join_lines(&lines[..n.min(lines.len())]))
}

/// Last `n` lines of a file, default 10 (`FS.TAIL key path [n]`).
pub(crate) fn tail(store: &mut Store, argv: &[Bytes]) -> Result<Reply, Error> {
    let n = line_count_arg(argv)?;
    let Some(data) = read_file_content(store, argv)? else {
        return Ok(Reply::Null);
    };
    let lines = content_lines(&data);
    let start = lines.len().saturating_sub(n);
    Ok(join_lines(&lines[start..]))
}

/// A 1-based inclusive line range (`FS.LINES key path [start end]`);
/// `end == -1` reads to the end of the file.
pub(crate) fn lines(store: &mut Store, argv: &[Bytes]) -> Result<Reply, Error> {
    if argv.len() == 4 {
        return Err(Error::WrongArity("fs.lines"));
    }

    let range = if argv.len() == 5 {
        let start = match arg_i64(&argv[3]) {
            Some(n) if n >= 1 => n as usize,
            _ => return Err(Error::BadLineStart),
        };
        let end = match arg_i64(&argv[4]) {
            Some(-1) => usize::MAX,
            Some(n) if n >= 1 => n as usize,
            _ => return Err(Error::BadLineEnd),
        };
        Some((start, end))
    } else {
        None
    };

    let Some(data) = read_file_content(store, argv)? else {
        return Ok(Reply::Null);
    };
    let all = content_lines(&data);
    let selected: &[&[u8]] = match range {
        None => &all,
        Some((start, end)) => {
            let hi = end.min(all.len());
            if start > all.len() || hi < start {
                &[]
            } else {
                &all[start - 1..hi]
            }
        }
    };
    Ok(join_lines(selected))
}

/// Line, word, and byte counts (`FS.WC key path`).
pub(crate) fn wc(store: &mut Store, argv: &[Bytes]) -> Result<Reply, Error> {
    let Some(data) = read_file_content(store, argv)? else {
        return Ok(Reply::Null);
    };
    let lines = content_lines(&data).len() as i64;
    let words = data
        .split(|b| b.is_ascii_whitespace())
        .filter(|w| !w.is_empty())
        .count() as i64;
    Ok(Reply::Map(vec![
        ("lines", Reply::Int(lines)),
        ("words", Reply::Int(words)),
        ("chars", Reply::Int(data.len() as i64)),
    ]))
}
