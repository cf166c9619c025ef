//! A minimal host model: the keyspace the datatype plugs into.
//!
//! One key holds one value; for this crate that is a filesystem, plus a
//! plain byte-string type standing in for the host's native values so
//! type mismatches (`WRONGTYPE`) are expressible. The store owns the
//! command lifecycle the spec demands:
//!
//! - a write command on a missing key materializes a filesystem holding
//!   only the root directory;
//! - after every write command, a filesystem reduced to its root (or
//!   less) is removed from the keyspace entirely;
//! - successful writes are counted as replicated, standing in for the
//!   host's verbatim replication hook.
//!
//! Execution is single-threaded and cooperative: `exec` takes `&mut
//! self`, every command runs to completion atomically, and ordering is
//! arrival order. There is no interior locking by design; a
//! multi-threaded host must wrap each store in one exclusive lock.

use std::io::{self, Read, Write};

use bytes::Bytes;
use indexmap::IndexMap;

use crate::registry::{self, CommandKind, DATATYPE};
use crate::snapshot;
use crate::{Error, Fs, Reply, TRACING_TARGET};

/// A value held under one key.
#[derive(Debug, Clone)]
pub enum Value {
    /// A filesystem object (the datatype this crate registers).
    Fs(Fs),
    /// A host-native byte string; commands in the `FS.*` family answer
    /// `WRONGTYPE` when they meet one.
    Raw(Bytes),
}

/// The keyspace plus dispatch entry point.
#[derive(Debug, Default)]
pub struct Store {
    keys: IndexMap<Bytes, Value>,
    replicated_writes: u64,
}

impl Store {
    pub fn new() -> Self {
        Store::default()
    }

    /// Execute one command. `argv[0]` is the command name; the key is at
    /// position 1. Arity is validated against the command table before
    /// the handler runs.
    pub fn exec<I, A>(&mut self, argv: I) -> Result<Reply, Error>
    where
        I: IntoIterator<Item = A>,
        A: Into<Bytes>,
    {
        let argv: Vec<Bytes> = argv.into_iter().map(Into::into).collect();
        self.dispatch(&argv)
    }

    /// [`Store::exec`] over pre-encoded arguments.
    pub fn dispatch(&mut self, argv: &[Bytes]) -> Result<Reply, Error> {
        let name = argv.first().ok_or(Error::UnknownCommand)?;
        let spec = registry::lookup(name).ok_or(Error::UnknownCommand)?;
        if argv.len() < spec.min_args || argv.len() > spec.max_args {
            return Err(Error::WrongArity(spec.lower));
        }

        let result = (spec.handler)(self, argv);

        if spec.kind == CommandKind::Write {
            // The lifecycle check runs even when the handler failed: a
            // write on a missing key may have auto-created an empty
            // shell that must not outlive the command.
            self.drop_if_empty(&argv[spec.first_key]);
            if result.is_ok() {
                self.replicated_writes += 1;
            }
        }
        result
    }

    /// Writes replicated verbatim so far; the host's replication hook.
    pub fn replicated_writes(&self) -> u64 {
        self.replicated_writes
    }

    pub fn has_key(&self, key: &[u8]) -> bool {
        self.keys.contains_key(key)
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    /// Store a host-native byte string under a key, replacing whatever
    /// was there.
    pub fn set_raw(&mut self, key: impl Into<Bytes>, value: impl Into<Bytes>) {
        self.keys.insert(key.into(), Value::Raw(value.into()));
    }

    pub fn value(&self, key: &[u8]) -> Option<&Value> {
        self.keys.get(key)
    }

    /// Open a key for reading. Missing keys are an error; read commands
    /// never materialize state.
    pub(crate) fn open_read(&mut self, key: &[u8]) -> Result<&mut Fs, Error> {
        match self.keys.get_mut(key) {
            Some(Value::Fs(fs)) => Ok(fs),
            Some(Value::Raw(_)) => Err(Error::WrongType),
            None => Err(Error::NoSuchKey),
        }
    }

    /// Open a key for writing, materializing a root-only filesystem on a
    /// missing key.
    pub(crate) fn open_write(&mut self, key: &[u8]) -> Result<&mut Fs, Error> {
        if !self.keys.contains_key(key) {
            tracing::trace!(target: TRACING_TARGET, key = %String::from_utf8_lossy(key), "auto-create filesystem");
            self.keys
                .insert(Bytes::copy_from_slice(key), Value::Fs(Fs::new()));
        }
        match self.keys.get_mut(key) {
            Some(Value::Fs(fs)) => Ok(fs),
            Some(Value::Raw(_)) => Err(Error::WrongType),
            None => Err(Error::NoSuchKey),
        }
    }

    /// Remove the key when its filesystem is an empty shell (at most the
    /// root inode). The counterpart of auto-create: clients never need an
    /// explicit delete for lifecycle.
    fn drop_if_empty(&mut self, key: &[u8]) {
        if let Some(Value::Fs(fs)) = self.keys.get(key) {
            if fs.is_empty_shell() {
                tracing::trace!(target: TRACING_TARGET, key = %String::from_utf8_lossy(key), "drop empty filesystem key");
                self.keys.swap_remove(key);
            }
        }
    }

    /// Approximate memory footprint of one key's value.
    pub fn memory_usage(&self, key: &[u8]) -> Option<usize> {
        match self.keys.get(key)? {
            Value::Fs(fs) => Some((DATATYPE.mem_usage)(fs)),
            Value::Raw(b) => Some(b.len()),
        }
    }

    /// Content digest of one key's filesystem. Equal digests mean
    /// semantically equal filesystems, independent of iteration order.
    pub fn digest(&self, key: &[u8]) -> Option<u64> {
        match self.keys.get(key)? {
            Value::Fs(fs) => Some((DATATYPE.digest)(fs)),
            Value::Raw(_) => None,
        }
    }

    /// Serialize the whole keyspace: per key, the key bytes, a value
    /// type tag, and for filesystems the datatype encoding version
    /// followed by the snapshot payload.
    pub fn save_snapshot<W: Write>(&self, w: &mut W) -> io::Result<()> {
        snapshot::write_u64(w, self.keys.len() as u64)?;
        for (key, value) in &self.keys {
            snapshot::write_bytes(w, key)?;
            match value {
                Value::Fs(fs) => {
                    snapshot::write_u8(w, 0)?;
                    snapshot::write_u8(w, DATATYPE.encoding_version)?;
                    (DATATYPE.save)(w, fs)?;
                }
                Value::Raw(b) => {
                    snapshot::write_u8(w, 1)?;
                    snapshot::write_bytes(w, b)?;
                }
            }
        }
        tracing::debug!(target: TRACING_TARGET, keys = self.keys.len(), "saved snapshot");
        Ok(())
    }

    /// Load a keyspace written by [`Store::save_snapshot`]. Any error
    /// drops everything built so far and surfaces the failure; an
    /// unsupported encoding version is rejected.
    pub fn load_snapshot<R: Read>(r: &mut R) -> io::Result<Store> {
        let count = snapshot::read_u64(r)?;
        let mut store = Store::new();
        for _ in 0..count {
            let key = Bytes::from(snapshot::read_bytes(r)?);
            let value = match snapshot::read_u8(r)? {
                0 => {
                    let version = snapshot::read_u8(r)?;
                    if version != DATATYPE.encoding_version {
                        return Err(io::Error::new(
                            io::ErrorKind::InvalidData,
                            format!("unsupported filesystem encoding version {version}"),
                        ));
                    }
                    Value::Fs((DATATYPE.load)(r)?)
                }
                1 => Value::Raw(Bytes::from(snapshot::read_bytes(r)?)),
                tag => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("unknown value type tag {tag}"),
                    ));
                }
            };
            store.keys.insert(key, value);
        }
        Ok(store)
    }
}
