//! A POSIX-like virtual filesystem as a key-value store datatype.
//!
//! One key holds one complete filesystem: a flat map from normalized
//! absolute paths to inodes, where an inode is a file (inline bytes), a
//! directory (an ordered list of child basenames), or a symbolic link.
//! The surface is a command family modeled after Unix utilities
//! (reading, writing, listing, traversing, searching, copying, moving,
//! linking, and stat'ing), dispatched through a registration table and
//! persisted via a versioned snapshot codec.
//!
//! # Usage
//!
//! ```
//! use kvfs::{Reply, Store};
//!
//! let mut store = Store::new();
//!
//! // The first write materializes the filesystem under the key.
//! store.exec(["FS.ECHO", "app", "/etc/motd", "hello"]).unwrap();
//!
//! let reply = store.exec(["FS.CAT", "app", "/etc/motd"]).unwrap();
//! assert_eq!(reply, Reply::bulk("hello"));
//!
//! // Removing the last entry removes the key itself.
//! store.exec(["FS.RM", "app", "/etc", "RECURSIVE"]).unwrap();
//! assert!(!store.has_key(b"app"));
//! ```
//!
//! # Model
//!
//! - **Flat map, explicit child lists.** Point lookups are one map probe;
//!   directory listings read the directory's ordered child-name list. The
//!   two views are kept synchronized by the mutation paths in [`Fs`].
//! - **Single-threaded, cooperative.** Commands execute to completion on
//!   the dispatch thread; every command is atomic and linearizable in
//!   arrival order. The interior is deliberately not thread-safe; a
//!   multi-threaded host wraps each store in one exclusive lock.
//! - **Derived caches are rebuilt, never persisted.** Each file carries a
//!   trigram bloom filter that prunes content search; snapshots store
//!   only content and the filter is recomputed on load.
//! - **Lifecycle is implicit.** A write command on a missing key creates
//!   the filesystem; removing the last non-root entry deletes the key.

mod bloom;
mod commands;
mod digest;
mod error;
mod fs;
mod inode;
pub mod path;
mod registry;
mod reply;
mod snapshot;
mod store;

pub use bloom::TrigramBloom;
pub use error::Error;
pub use fs::Fs;
pub use inode::{DirNode, FileNode, Inode, InodeKind, SymlinkNode};
pub use registry::{command_table, CommandKind, CommandSpec, DatatypeSpec, DATATYPE};
pub use reply::Reply;
pub use snapshot::{load_fs, save_fs, ENCODING_VERSION};
pub use store::{Store, Value};

const TRACING_TARGET: &str = "kvfs";
