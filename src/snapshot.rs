//! Versioned snapshot codec for a filesystem object.
//!
//! Layout (all integers little-endian, strings length-prefixed with u64):
//!
//! ```text
//! u64 inode_count
//! repeat inode_count times:
//!   string path
//!   u8  type            ; 0 file, 1 dir, 2 symlink
//!   u16 mode
//!   u32 uid ; u32 gid
//!   i64 ctime ; i64 mtime ; i64 atime
//!   payload:
//!     file    : u64 size ; bytes[size]    (byte block omitted when 0)
//!     dir     : u64 child_count ; string[child_count]
//!     symlink : string target
//! ```
//!
//! Inodes are written in map iteration order; a round-trip preserves
//! semantic equality, not byte-equality of the map. Blooms are derived
//! caches and are not persisted; counters, `total_data_bytes`, and every
//! file's bloom are rebuilt while loading. Any I/O or format error aborts
//! the load and drops whatever was built so far.

use std::io::{self, Read, Write};

use crate::inode::{DirNode, FileNode, Inode, InodeKind, SymlinkNode};
use crate::{Fs, TRACING_TARGET};

/// Encoding version of the filesystem payload. The store-level framing
/// records it per key; loading any other version fails.
pub const ENCODING_VERSION: u8 = 0;

fn bad_format(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.to_string())
}

pub(crate) fn write_u8<W: Write>(w: &mut W, v: u8) -> io::Result<()> {
    w.write_all(&[v])
}

pub(crate) fn write_u64<W: Write>(w: &mut W, v: u64) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

fn write_u16<W: Write>(w: &mut W, v: u16) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

fn write_u32<W: Write>(w: &mut W, v: u32) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

fn write_i64<W: Write>(w: &mut W, v: i64) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

pub(crate) fn write_bytes<W: Write>(w: &mut W, data: &[u8]) -> io::Result<()> {
    write_u64(w, data.len() as u64)?;
    w.write_all(data)
}

pub(crate) fn read_u8<R: Read>(r: &mut R) -> io::Result<u8> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

pub(crate) fn read_u64<R: Read>(r: &mut R) -> io::Result<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn read_u16<R: Read>(r: &mut R) -> io::Result<u16> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

fn read_u32<R: Read>(r: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_i64<R: Read>(r: &mut R) -> io::Result<i64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(i64::from_le_bytes(buf))
}

pub(crate) fn read_bytes<R: Read>(r: &mut R) -> io::Result<Vec<u8>> {
    let len = read_u64(r)? as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

fn read_string<R: Read>(r: &mut R) -> io::Result<String> {
    String::from_utf8(read_bytes(r)?).map_err(|_| bad_format("non-utf8 string in snapshot"))
}

/// Serialize a filesystem.
pub fn save_fs<W: Write>(w: &mut W, fs: &Fs) -> io::Result<()> {
    write_u64(w, fs.total_inodes())?;
    for (p, inode) in fs.iter() {
        write_bytes(w, p.as_bytes())?;
        write_u8(w, inode.kind.tag())?;
        write_u16(w, inode.mode)?;
        write_u32(w, inode.uid)?;
        write_u32(w, inode.gid)?;
        write_i64(w, inode.ctime)?;
        write_i64(w, inode.mtime)?;
        write_i64(w, inode.atime)?;
        match &inode.kind {
            InodeKind::File(f) => {
                write_u64(w, f.len())?;
                if !f.is_empty() {
                    w.write_all(f.data())?;
                }
            }
            InodeKind::Dir(d) => {
                write_u64(w, d.child_count() as u64)?;
                for child in d.children() {
                    write_bytes(w, child.as_bytes())?;
                }
            }
            InodeKind::Symlink(l) => {
                write_bytes(w, l.target().as_bytes())?;
            }
        }
    }
    Ok(())
}

/// Deserialize a filesystem written by [`save_fs`].
pub fn load_fs<R: Read>(r: &mut R) -> io::Result<Fs> {
    let count = read_u64(r)?;
    let mut fs = Fs::bare();

    for _ in 0..count {
        let p = read_string(r)?;
        let tag = read_u8(r)?;
        let mode = read_u16(r)?;
        let uid = read_u32(r)?;
        let gid = read_u32(r)?;
        let ctime = read_i64(r)?;
        let mtime = read_i64(r)?;
        let atime = read_i64(r)?;

        let kind = match tag {
            0 => {
                let size = read_u64(r)? as usize;
                let mut file = FileNode::new();
                if size > 0 {
                    let mut data = vec![0u8; size];
                    r.read_exact(&mut data)?;
                    file.set(&data);
                }
                InodeKind::File(file)
            }
            1 => {
                let child_count = read_u64(r)?;
                let mut dir = DirNode::default();
                for _ in 0..child_count {
                    dir.add_child(&read_string(r)?);
                }
                InodeKind::Dir(dir)
            }
            2 => InodeKind::Symlink(SymlinkNode {
                target: read_string(r)?,
            }),
            _ => return Err(bad_format("unknown inode type in snapshot")),
        };

        if !p.starts_with('/') || fs.contains(&p) {
            return Err(bad_format("invalid or duplicate path in snapshot"));
        }

        fs.insert(
            p,
            Inode {
                mode,
                uid,
                gid,
                ctime,
                mtime,
                atime,
                kind,
            },
        );
    }

    if !fs.lookup("/").is_some_and(Inode::is_dir) && fs.total_inodes() > 0 {
        return Err(bad_format("snapshot missing root directory"));
    }

    tracing::debug!(
        target: TRACING_TARGET,
        inodes = fs.total_inodes(),
        data_bytes = fs.total_data_bytes(),
        "loaded filesystem snapshot"
    );
    Ok(fs)
}
