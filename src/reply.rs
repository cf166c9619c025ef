//! Reply values produced by command handlers.
//!
//! Mirrors the host's wire value shapes (simple string, bulk string,
//! integer, null, array, map) as an owned tree so handlers stay agnostic
//! of the actual transport encoding.

use bytes::Bytes;

/// A command reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The `OK` simple string.
    Ok,
    /// A binary-safe bulk string.
    Bulk(Bytes),
    /// A signed integer.
    Int(i64),
    /// The null reply.
    Null,
    /// A (possibly nested, possibly heterogeneous) array.
    Array(Vec<Reply>),
    /// A field→value map with a fixed key set.
    Map(Vec<(&'static str, Reply)>),
}

impl Reply {
    pub fn bulk(data: impl Into<Bytes>) -> Reply {
        Reply::Bulk(data.into())
    }

    /// Bulk payload, if this is a bulk reply.
    pub fn as_bulk(&self) -> Option<&[u8]> {
        match self {
            Reply::Bulk(b) => Some(b),
            _ => None,
        }
    }

    /// Integer payload, if this is an integer reply.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Reply::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Array elements, if this is an array reply.
    pub fn as_array(&self) -> Option<&[Reply]> {
        match self {
            Reply::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Look up a map field by name.
    pub fn field(&self, name: &str) -> Option<&Reply> {
        match self {
            Reply::Map(fields) => fields.iter().find(|(k, _)| *k == name).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Reply::Null)
    }
}
