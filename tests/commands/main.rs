//! Tests for the `FS.*` command family.
//!
//! Test modules:
//! - `write`: file and directory creation, truncate, timestamps
//! - `remove`: deletion and key lifecycle (auto-create / auto-delete)
//! - `links`: symlinks, resolution, loop detection
//! - `copy_move`: copy and subtree rename
//! - `walk`: listing, tree view, find, grep
//! - `meta`: info, stat, test, chmod, chown, wrong-type handling
//! - `text`: head, tail, lines, wc, replace
//! - `snapshot`: save/load round-trips, digest, memory reporting
//! - `invariants`: structural invariants under random operation sequences


mod meta;
mod snapshot;
mod write;
