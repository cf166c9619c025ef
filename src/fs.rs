//! The filesystem object: one complete filesystem under one store key.
//!
//! A filesystem is a flat map from normalized absolute paths to inodes
//! plus derived counters maintained incrementally. The map is the single
//! source of truth; directory child-lists are the listing-order view and
//! must stay synchronized with it (see the invariants on [`Fs`]).

use indexmap::IndexMap;

use crate::digest::Digest;
use crate::inode::{now_ms, Inode, InodeKind};
use crate::{path, Error, TRACING_TARGET};

/// Maximum symlink hops before resolution reports a loop.
pub(crate) const MAX_SYMLINK_DEPTH: usize = 40;

/// Approximate per-entry map overhead used by the memory estimate.
const ENTRY_OVERHEAD: usize = 64;

/// A complete filesystem: path→inode map plus aggregate counters.
///
/// Invariants, holding before and after every command:
///
/// 1. `/` is present and is a directory.
/// 2. Every non-root path's parent is present, is a directory, and lists
///    the child's basename exactly once.
/// 3. Every name in a directory's child-list resolves to a present path.
/// 4. The counters equal the per-variant population of the map.
/// 5. `total_data_bytes` equals the sum of file content lengths.
/// 6. Every file's bloom is a function of its current content.
/// 7. No child-list contains duplicates.
#[derive(Debug, Clone)]
pub struct Fs {
    inodes: IndexMap<String, Inode>,
    file_count: u64,
    dir_count: u64,
    symlink_count: u64,
    total_data_bytes: u64,
}

impl Fs {
    /// New filesystem holding only the root directory.
    pub fn new() -> Self {
        let mut fs = Fs::bare();
        fs.insert("/".to_string(), Inode::new_dir(0));
        fs
    }

    /// New filesystem with no inodes at all. Only the snapshot loader may
    /// use this; every other path goes through [`Fs::new`].
    pub(crate) fn bare() -> Self {
        Fs {
            inodes: IndexMap::new(),
            file_count: 0,
            dir_count: 0,
            symlink_count: 0,
            total_data_bytes: 0,
        }
    }

    pub fn file_count(&self) -> u64 {
        self.file_count
    }

    pub fn dir_count(&self) -> u64 {
        self.dir_count
    }

    pub fn symlink_count(&self) -> u64 {
        self.symlink_count
    }

    pub fn total_data_bytes(&self) -> u64 {
        self.total_data_bytes
    }

    pub fn total_inodes(&self) -> u64 {
        self.file_count + self.dir_count + self.symlink_count
    }

    /// Whether only the root (or nothing) remains. An empty shell is
    /// dropped at the store level after every write command.
    pub(crate) fn is_empty_shell(&self) -> bool {
        self.total_inodes() <= 1
    }

    pub fn lookup(&self, path: &str) -> Option<&Inode> {
        self.inodes.get(path)
    }

    pub(crate) fn lookup_mut(&mut self, path: &str) -> Option<&mut Inode> {
        self.inodes.get_mut(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.inodes.contains_key(path)
    }

    /// Iterate over `(path, inode)` pairs in map order. The order is an
    /// implementation detail; only digest/snapshot consumers rely on it
    /// being consistent within one instance.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Inode)> {
        self.inodes.iter().map(|(p, i)| (p.as_str(), i))
    }

    /// Insert an inode, updating the counters for its variant.
    pub(crate) fn insert(&mut self, path: String, inode: Inode) {
        match &inode.kind {
            InodeKind::File(f) => {
                self.file_count += 1;
                self.total_data_bytes += f.len();
            }
            InodeKind::Dir(_) => self.dir_count += 1,
            InodeKind::Symlink(_) => self.symlink_count += 1,
        }
        self.inodes.insert(path, inode);
    }

    /// Remove an inode, updating counters. Ownership transfers to the
    /// caller; dropping it frees the payload.
    pub(crate) fn remove(&mut self, path: &str) -> Option<Inode> {
        let inode = self.inodes.swap_remove(path)?;
        match &inode.kind {
            InodeKind::File(f) => {
                self.file_count -= 1;
                self.total_data_bytes -= f.len();
            }
            InodeKind::Dir(_) => self.dir_count -= 1,
            InodeKind::Symlink(_) => self.symlink_count -= 1,
        }
        Some(inode)
    }

    /// Add `path`'s basename to its parent's child-list. `bump_mtime`
    /// distinguishes explicit attachment (which touches the parent) from
    /// intermediate directories created by [`Fs::ensure_parents`].
    pub(crate) fn link_into_parent(&mut self, path: &str, bump_mtime: bool) {
        let parent = path::parent(path);
        let base = path::basename(path).to_string();
        if let Some(dir) = self.inodes.get_mut(parent).and_then(Inode::as_dir_mut) {
            dir.add_child(&base);
        }
        if bump_mtime {
            if let Some(pnode) = self.inodes.get_mut(parent) {
                if pnode.is_dir() {
                    pnode.mtime = now_ms();
                }
            }
        }
    }

    /// Remove `path`'s basename from its parent's child-list and touch
    /// the parent's mtime.
    pub(crate) fn unlink_from_parent(&mut self, path: &str) {
        if path::is_root(path) {
            return;
        }
        let parent = path::parent(path);
        let base = path::basename(path).to_string();
        if let Some(pnode) = self.inodes.get_mut(parent) {
            if let Some(dir) = pnode.as_dir_mut() {
                if dir.remove_child(&base) {
                    pnode.mtime = now_ms();
                }
            }
        }
    }

    /// Ensure every ancestor of `path` exists as a directory, creating
    /// missing intermediates with default mode. Fails without mutating
    /// when an ancestor exists as a non-directory.
    pub(crate) fn ensure_parents(&mut self, path: &str) -> Result<(), Error> {
        let mut missing: Vec<String> = Vec::new();
        let mut cur = path::parent(path);
        while !path::is_root(cur) {
            match self.inodes.get(cur) {
                Some(inode) if inode.is_dir() => break,
                Some(_) => return Err(Error::ParentConflict),
                None => {
                    missing.push(cur.to_string());
                    cur = path::parent(cur);
                }
            }
        }

        // Create top-down so each new directory's parent already exists.
        for dir_path in missing.into_iter().rev() {
            self.insert(dir_path.clone(), Inode::new_dir(0));
            self.link_into_parent(&dir_path, false);
        }
        Ok(())
    }

    /// Follow symlinks starting at `path` until a non-symlink or missing
    /// path is reached. A missing path is returned as-is so the caller
    /// can distinguish *missing* from *not a symlink*. More than
    /// [`MAX_SYMLINK_DEPTH`] hops is a loop.
    pub fn resolve(&self, path: &str) -> Result<String, Error> {
        let mut current = path.to_string();
        for _ in 0..MAX_SYMLINK_DEPTH {
            let target = match self.inodes.get(&current) {
                Some(inode) => match &inode.kind {
                    InodeKind::Symlink(l) => l.target.clone(),
                    _ => return Ok(current),
                },
                None => return Ok(current),
            };
            current = if target.starts_with('/') {
                path::normalize(&target)?
            } else {
                path::join(path::parent(&current), &target)?
            };
        }
        Err(Error::SymlinkLoop)
    }

    /// Replace a file's content, keeping `total_data_bytes` and the bloom
    /// consistent and bumping mtime.
    pub(crate) fn set_file_content(&mut self, path: &str, data: &[u8]) -> Result<(), Error> {
        let now = now_ms();
        let inode = self.inodes.get_mut(path).ok_or(Error::NoSuchFileOrDir)?;
        let file = inode.as_file_mut().ok_or(Error::NotAFile)?;
        let old = file.len();
        file.set(data);
        inode.mtime = now;
        self.total_data_bytes = self.total_data_bytes - old + data.len() as u64;
        Ok(())
    }

    /// Append to a file's content. Returns the new size.
    pub(crate) fn append_file_content(&mut self, path: &str, data: &[u8]) -> Result<u64, Error> {
        let now = now_ms();
        let inode = self.inodes.get_mut(path).ok_or(Error::NoSuchFileOrDir)?;
        let file = inode.as_file_mut().ok_or(Error::NotAFile)?;
        file.append(data);
        let new_len = file.len();
        inode.mtime = now;
        self.total_data_bytes += data.len() as u64;
        Ok(new_len)
    }

    /// Shrink, clear, or zero-extend a file to `len`.
    pub(crate) fn truncate_file(&mut self, path: &str, len: u64) -> Result<(), Error> {
        let now = now_ms();
        let inode = self.inodes.get_mut(path).ok_or(Error::NoSuchFileOrDir)?;
        let file = inode.as_file_mut().ok_or(Error::NotAFile)?;
        let old = file.len();
        file.set_len(len as usize);
        inode.mtime = now;
        self.total_data_bytes = self.total_data_bytes - old + len;
        Ok(())
    }

    /// Exact substring replacement in a file's content. Replaces the
    /// first occurrence, or every occurrence with `all`. Returns the
    /// replacement count; an empty needle matches nothing.
    pub(crate) fn replace_in_file(
        &mut self,
        path: &str,
        needle: &[u8],
        replacement: &[u8],
        all: bool,
    ) -> Result<u64, Error> {
        let now = now_ms();
        let inode = self.inodes.get_mut(path).ok_or(Error::NoSuchFileOrDir)?;
        let file = inode.as_file_mut().ok_or(Error::NotAFile)?;
        if needle.is_empty() {
            return Ok(0);
        }

        let data = file.data();
        let mut out: Vec<u8> = Vec::with_capacity(data.len());
        let mut count: u64 = 0;
        let mut pos = 0;
        while pos < data.len() {
            let can_replace = all || count == 0;
            if can_replace && data[pos..].starts_with(needle) {
                out.extend_from_slice(replacement);
                pos += needle.len();
                count += 1;
            } else {
                out.push(data[pos]);
                pos += 1;
            }
        }

        if count > 0 {
            let old = file.len();
            file.set(&out);
            inode.mtime = now;
            self.total_data_bytes = self.total_data_bytes - old + out.len() as u64;
        }
        Ok(count)
    }

    /// Depth-first deletion of `path` and everything under it.
    ///
    /// Each directory's child-list is snapshotted before recursing: the
    /// live list mutates as children detach themselves.
    pub(crate) fn delete_recursive(&mut self, path: &str) {
        let children: Option<Vec<String>> = self
            .inodes
            .get(path)
            .and_then(Inode::as_dir)
            .map(|d| d.children().to_vec());

        if let Some(children) = children {
            for child in children {
                if let Ok(child_path) = path::join(path, &child) {
                    self.delete_recursive(&child_path);
                }
            }
        }

        self.unlink_from_parent(path);
        self.remove(path);
    }

    /// Recursively copy `src` to `dst`, preserving mode, ownership, and
    /// all three timestamps on every inode. File copies rebuild their own
    /// bloom; subdirectory child-lists are repopulated in original order.
    pub(crate) fn copy_recursive(&mut self, src: &str, dst: &str) -> Result<(), Error> {
        let src_inode = self.inodes.get(src).ok_or(Error::CopyFailed)?;
        let mut copy = src_inode.clone();

        // For a directory, detach the cloned child list and repopulate it
        // name by name as the children are cloned underneath.
        let children = match &mut copy.kind {
            InodeKind::Dir(dir) => Some(std::mem::take(&mut dir.children)),
            InodeKind::File(_) | InodeKind::Symlink(_) => None,
        };
        self.insert(dst.to_string(), copy);

        let Some(children) = children else {
            return Ok(());
        };
        for child in children {
            let src_child = path::join(src, &child).map_err(|_| Error::CopyFailed)?;
            let dst_child = path::join(dst, &child).map_err(|_| Error::CopyFailed)?;
            if let Some(dir) = self.inodes.get_mut(dst).and_then(Inode::as_dir_mut) {
                dir.add_child(&child);
            }
            self.copy_recursive(&src_child, &dst_child)?;
        }
        Ok(())
    }

    /// Rename `src` to `dst`, carrying every descendant path along.
    ///
    /// Descendant keys are collected into a snapshot vector first so the
    /// map is not mutated while being scanned; inodes move by ownership,
    /// never by clone. Both parents' child-lists and mtimes are updated.
    pub(crate) fn move_subtree(&mut self, src: &str, dst: &str) {
        let is_dir = self.inodes.get(src).is_some_and(Inode::is_dir);

        if is_dir {
            let prefix = format!("{src}/");
            let descendants: Vec<String> = self
                .inodes
                .keys()
                .filter(|k| k.starts_with(&prefix))
                .cloned()
                .collect();

            tracing::trace!(
                target: TRACING_TARGET,
                src,
                dst,
                descendants = descendants.len(),
                "subtree rename"
            );

            for old_path in descendants {
                let new_path = format!("{dst}{}", &old_path[src.len()..]);
                if let Some(inode) = self.inodes.swap_remove(&old_path) {
                    self.inodes.insert(new_path, inode);
                }
            }
        }

        if let Some(inode) = self.inodes.swap_remove(src) {
            self.inodes.insert(dst.to_string(), inode);
        }

        self.unlink_from_parent(src);
        self.link_into_parent(dst, true);
    }

    /// Approximate memory footprint in bytes. A lower bound: map entry
    /// overhead is estimated with a flat constant.
    pub fn memory_usage(&self) -> usize {
        std::mem::size_of::<Fs>()
            + self.total_inodes() as usize * (std::mem::size_of::<Inode>() + ENTRY_OVERHEAD)
            + self.total_data_bytes as usize
    }

    /// Content digest: equal for any two semantically equal filesystems,
    /// regardless of map iteration order.
    pub fn digest(&self) -> u64 {
        let mut digest = Digest::new();
        for (path, inode) in self.iter() {
            digest.add_bytes(path.as_bytes());
            digest.add_u64(u64::from(inode.kind.tag()));
            digest.add_u64(u64::from(inode.mode));
            if let Some(file) = inode.as_file() {
                if !file.is_empty() {
                    digest.add_bytes(file.data());
                }
            }
            digest.end_sequence();
        }
        digest.finish()
    }
}

impl Default for Fs {
    fn default() -> Self {
        Fs::new()
    }
}
