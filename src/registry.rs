//! Datatype and command registration.
//!
//! The host learns about the filesystem datatype and its command family
//! from the descriptors here: one versioned datatype entry whose
//! callbacks live in [`crate::snapshot`] / [`crate::Fs`], and one
//! [`CommandSpec`] per operation with its access kind, arity bounds, and
//! key positions. [`crate::Store`] dispatches exclusively through this
//! table.

use std::io;

use bytes::Bytes;

use crate::commands::{read, walk, write};
use crate::snapshot::{self, ENCODING_VERSION};
use crate::{Error, Fs, Reply, Store};

/// Whether a command mutates the keyspace.
///
/// Write commands auto-create missing keys, run the empty-shell check
/// afterwards, and replicate verbatim on success; read commands do none
/// of that.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Read,
    Write,
}

pub(crate) type Handler = fn(&mut Store, &[Bytes]) -> Result<Reply, Error>;

/// Registration record for one command.
pub struct CommandSpec {
    /// Wire name, e.g. `FS.ECHO`. Matched case-insensitively.
    pub name: &'static str,
    /// Lowercase name used in arity error messages.
    pub(crate) lower: &'static str,
    pub kind: CommandKind,
    /// Declared O(1); informational, mirrored to the host at registration.
    pub fast: bool,
    /// Inclusive arity bounds, counting the command name itself.
    pub min_args: usize,
    pub max_args: usize,
    /// Key positions: first, last, step. Always `(1, 1, 1)` since every
    /// command addresses exactly one key.
    pub first_key: usize,
    pub last_key: usize,
    pub key_step: usize,
    pub(crate) handler: Handler,
}

/// Datatype descriptor: versioned name, encoding version, and the
/// callbacks the host drives. Freeing is Rust's `Drop`; there is no
/// separate callback for it.
pub struct DatatypeSpec {
    pub name: &'static str,
    pub encoding_version: u8,
    /// Snapshot-save callback.
    pub save: fn(&mut dyn io::Write, &Fs) -> io::Result<()>,
    /// Snapshot-load callback; fails on I/O or format errors.
    pub load: fn(&mut dyn io::Read) -> io::Result<Fs>,
    /// Approximate memory accounting.
    pub mem_usage: fn(&Fs) -> usize,
    /// Replication equality digest.
    pub digest: fn(&Fs) -> u64,
}

fn save_cb(mut w: &mut dyn io::Write, fs: &Fs) -> io::Result<()> {
    snapshot::save_fs(&mut w, fs)
}

fn load_cb(mut r: &mut dyn io::Read) -> io::Result<Fs> {
    snapshot::load_fs(&mut r)
}

/// The filesystem datatype registered with the host.
pub const DATATYPE: DatatypeSpec = DatatypeSpec {
    name: "kvfs-fs0",
    encoding_version: ENCODING_VERSION,
    save: save_cb,
    load: load_cb,
    mem_usage: Fs::memory_usage,
    digest: Fs::digest,
};

macro_rules! spec {
    ($name:literal, $lower:literal, $kind:ident, $fast:literal, $min:literal..=$max:literal, $handler:path) => {
        CommandSpec {
            name: $name,
            lower: $lower,
            kind: CommandKind::$kind,
            fast: $fast,
            min_args: $min,
            max_args: $max,
            first_key: 1,
            last_key: 1,
            key_step: 1,
            handler: $handler,
        }
    };
}

static COMMANDS: &[CommandSpec] = &[
    spec!("FS.INFO", "fs.info", Read, true, 2..=2, read::info),
    spec!("FS.ECHO", "fs.echo", Write, false, 4..=5, write::echo),
    spec!("FS.CAT", "fs.cat", Read, false, 3..=3, read::cat),
    spec!("FS.APPEND", "fs.append", Write, false, 4..=4, write::append),
    spec!("FS.RM", "fs.rm", Write, false, 3..=4, write::rm),
    spec!("FS.TOUCH", "fs.touch", Write, false, 3..=3, write::touch),
    spec!("FS.MKDIR", "fs.mkdir", Write, false, 3..=4, write::mkdir),
    spec!("FS.LS", "fs.ls", Read, false, 2..=4, walk::ls),
    spec!("FS.STAT", "fs.stat", Read, true, 3..=3, read::stat),
    spec!("FS.TEST", "fs.test", Read, true, 3..=3, read::test),
    spec!("FS.CHMOD", "fs.chmod", Write, false, 4..=4, write::chmod),
    spec!("FS.CHOWN", "fs.chown", Write, false, 4..=5, write::chown),
    spec!("FS.LN", "fs.ln", Write, false, 4..=4, write::ln),
    spec!("FS.READLINK", "fs.readlink", Read, true, 3..=3, read::readlink),
    spec!("FS.CP", "fs.cp", Write, false, 4..=5, write::cp),
    spec!("FS.MV", "fs.mv", Write, false, 4..=4, write::mv),
    spec!("FS.TREE", "fs.tree", Read, false, 3..=5, walk::tree),
    spec!("FS.FIND", "fs.find", Read, false, 4..=6, walk::find),
    spec!("FS.GREP", "fs.grep", Read, false, 4..=5, walk::grep),
    spec!("FS.TRUNCATE", "fs.truncate", Write, false, 4..=4, write::truncate),
    spec!("FS.UTIMENS", "fs.utimens", Write, false, 5..=5, write::utimens),
    spec!("FS.HEAD", "fs.head", Read, false, 3..=4, read::head),
    spec!("FS.TAIL", "fs.tail", Read, false, 3..=4, read::tail),
    spec!("FS.LINES", "fs.lines", Read, false, 3..=5, read::lines),
    spec!("FS.WC", "fs.wc", Read, false, 3..=3, read::wc),
    spec!("FS.REPLACE", "fs.replace", Write, false, 5..=6, write::replace),
    spec!("FS.INSERT", "fs.insert", Write, false, 5..=5, write::insert),
    spec!(
        "FS.DELETELINES",
        "fs.deletelines",
        Write,
        false,
        5..=5,
        write::deletelines
    ),
];

/// The full command table, in registration order.
pub fn command_table() -> &'static [CommandSpec] {
    COMMANDS
}

/// Look up a command by wire name, case-insensitively.
pub fn lookup(name: &[u8]) -> Option<&'static CommandSpec> {
    COMMANDS
        .iter()
        .find(|spec| name.eq_ignore_ascii_case(spec.name.as_bytes()))
}
