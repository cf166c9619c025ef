//! Inode primitives: the datum behind a single path.
//!
//! An inode is one of three shapes (file, directory, symlink) sharing a
//! common metadata header. Directories hold an insertion-ordered list of
//! child *basenames*; the full child paths live in the filesystem map.
//! Symlinks hold their target exactly as given, absolute or relative.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::bloom::TrigramBloom;

pub(crate) const DEFAULT_FILE_MODE: u16 = 0o644;
pub(crate) const DEFAULT_DIR_MODE: u16 = 0o755;
pub(crate) const DEFAULT_SYMLINK_MODE: u16 = 0o777;

/// Wall-clock milliseconds since the Unix epoch.
pub(crate) fn now_ms() -> i64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_millis() as i64,
        Err(e) => -(e.duration().as_millis() as i64),
    }
}

/// File payload: content bytes plus the derived trigram filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    pub(crate) data: Vec<u8>,
    pub(crate) bloom: TrigramBloom,
}

impl FileNode {
    pub(crate) fn new() -> Self {
        FileNode {
            data: Vec::new(),
            bloom: TrigramBloom::empty(),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn bloom(&self) -> &TrigramBloom {
        &self.bloom
    }

    /// Replace the content and rebuild the bloom.
    pub(crate) fn set(&mut self, data: &[u8]) {
        self.data.clear();
        self.data.extend_from_slice(data);
        self.bloom = TrigramBloom::from_content(&self.data);
    }

    /// Extend the content and rebuild the bloom.
    pub(crate) fn append(&mut self, data: &[u8]) {
        self.data.extend_from_slice(data);
        self.bloom = TrigramBloom::from_content(&self.data);
    }

    /// Shrink, clear, or zero-extend to `len`, rebuilding the bloom.
    pub(crate) fn set_len(&mut self, len: usize) {
        if len == self.data.len() {
            return;
        }
        self.data.resize(len, 0);
        if len == 0 {
            self.data = Vec::new();
            self.bloom = TrigramBloom::empty();
        } else {
            self.bloom = TrigramBloom::from_content(&self.data);
        }
    }
}

/// Directory payload: insertion-ordered child basenames.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirNode {
    pub(crate) children: Vec<String>,
}

impl DirNode {
    pub fn children(&self) -> &[String] {
        &self.children
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn has_child(&self, name: &str) -> bool {
        self.children.iter().any(|c| c == name)
    }

    /// Add a child name; idempotent, order is preserved.
    pub(crate) fn add_child(&mut self, name: &str) {
        if !self.has_child(name) {
            self.children.push(name.to_string());
        }
    }

    /// Remove a child name. Returns whether it removed anything.
    pub(crate) fn remove_child(&mut self, name: &str) -> bool {
        match self.children.iter().position(|c| c == name) {
            Some(idx) => {
                self.children.remove(idx);
                true
            }
            None => false,
        }
    }
}

/// Symlink payload: the target string, stored as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymlinkNode {
    pub(crate) target: String,
}

impl SymlinkNode {
    pub fn target(&self) -> &str {
        &self.target
    }
}

/// The type-specific payload of an inode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InodeKind {
    File(FileNode),
    Dir(DirNode),
    Symlink(SymlinkNode),
}

impl InodeKind {
    /// Stable type tag used by the snapshot codec and digest.
    pub(crate) fn tag(&self) -> u8 {
        match self {
            InodeKind::File(_) => 0,
            InodeKind::Dir(_) => 1,
            InodeKind::Symlink(_) => 2,
        }
    }
}

/// A single inode: shared metadata plus the shape-specific payload.
///
/// `mode`, `uid`, and `gid` are metadata only; nothing in the engine
/// enforces permissions. Timestamps are milliseconds since the epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inode {
    pub mode: u16,
    pub uid: u32,
    pub gid: u32,
    pub ctime: i64,
    pub mtime: i64,
    pub atime: i64,
    pub kind: InodeKind,
}

impl Inode {
    fn new(kind: InodeKind, mode: u16) -> Self {
        let mode = if mode == 0 {
            match kind {
                InodeKind::File(_) => DEFAULT_FILE_MODE,
                InodeKind::Dir(_) => DEFAULT_DIR_MODE,
                InodeKind::Symlink(_) => DEFAULT_SYMLINK_MODE,
            }
        } else {
            mode
        };
        let now = now_ms();
        Inode {
            mode,
            uid: 0,
            gid: 0,
            ctime: now,
            mtime: now,
            atime: now,
            kind,
        }
    }

    /// New empty file. Mode `0` selects the default for the type.
    pub fn new_file(mode: u16) -> Self {
        Inode::new(InodeKind::File(FileNode::new()), mode)
    }

    /// New empty directory. Mode `0` selects the default for the type.
    pub fn new_dir(mode: u16) -> Self {
        Inode::new(InodeKind::Dir(DirNode::default()), mode)
    }

    /// New symlink pointing at `target`, stored verbatim.
    pub fn new_symlink(target: &str, mode: u16) -> Self {
        Inode::new(
            InodeKind::Symlink(SymlinkNode {
                target: target.to_string(),
            }),
            mode,
        )
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, InodeKind::File(_))
    }

    pub fn is_dir(&self) -> bool {
        matches!(self.kind, InodeKind::Dir(_))
    }

    pub fn is_symlink(&self) -> bool {
        matches!(self.kind, InodeKind::Symlink(_))
    }

    pub fn type_str(&self) -> &'static str {
        match self.kind {
            InodeKind::File(_) => "file",
            InodeKind::Dir(_) => "dir",
            InodeKind::Symlink(_) => "symlink",
        }
    }

    pub fn as_file(&self) -> Option<&FileNode> {
        match &self.kind {
            InodeKind::File(f) => Some(f),
            _ => None,
        }
    }

    pub(crate) fn as_file_mut(&mut self) -> Option<&mut FileNode> {
        match &mut self.kind {
            InodeKind::File(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_dir(&self) -> Option<&DirNode> {
        match &self.kind {
            InodeKind::Dir(d) => Some(d),
            _ => None,
        }
    }

    pub(crate) fn as_dir_mut(&mut self) -> Option<&mut DirNode> {
        match &mut self.kind {
            InodeKind::Dir(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_symlink(&self) -> Option<&SymlinkNode> {
        match &self.kind {
            InodeKind::Symlink(l) => Some(l),
            _ => None,
        }
    }

    /// Size as reported by stat: content length for files, child count
    /// for directories, zero for symlinks.
    pub fn stat_size(&self) -> u64 {
        match &self.kind {
            InodeKind::File(f) => f.len(),
            InodeKind::Dir(d) => d.child_count() as u64,
            InodeKind::Symlink(_) => 0,
        }
    }
}
