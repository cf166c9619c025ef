//! Command handlers for the `FS.*` family.
//!
//! Handlers are plain functions `fn(&mut Store, &[Bytes]) -> Result<Reply,
//! Error>` wired up through the command table in [`crate::registry`]. The
//! dispatcher has already validated arity when a handler runs; everything
//! else (path normalization, option tokens, type checks) happens here.
//!
//! Split by access pattern:
//! - [`read`]: point reads and metadata (`INFO`, `STAT`, `CAT`, …)
//! - [`write`]: mutations (`ECHO`, `RM`, `MV`, …)
//! - [`walk`]: subtree traversals (`LS`, `TREE`, `FIND`, `GREP`)

pub(crate) mod read;
pub(crate) mod walk;
pub(crate) mod write;

use bytes::Bytes;

use crate::{path, Error};

/// Decode an argument that must be textual (paths, symlink targets).
///
/// Paths are UTF-8 without NUL by policy; file *content* stays binary.
pub(crate) fn arg_str(arg: &Bytes) -> Result<&str, Error> {
    let s = std::str::from_utf8(arg).map_err(|_| Error::InvalidPath)?;
    if s.contains('\0') {
        return Err(Error::InvalidPath);
    }
    Ok(s)
}

/// Decode and normalize a path argument.
pub(crate) fn arg_path(arg: &Bytes) -> Result<String, Error> {
    path::normalize(arg_str(arg)?)
}

/// Case-insensitive option-token comparison (`APPEND`, `RECURSIVE`, …).
pub(crate) fn is_token(arg: &[u8], token: &str) -> bool {
    arg.eq_ignore_ascii_case(token.as_bytes())
}

/// Parse a decimal integer argument.
pub(crate) fn arg_i64(arg: &[u8]) -> Option<i64> {
    std::str::from_utf8(arg).ok()?.parse().ok()
}

/// Split content into lines the way the search and text commands see
/// them: `\n`-separated, no trailing-newline phantom line, and an empty
/// file has no lines at all.
pub(crate) fn content_lines(data: &[u8]) -> Vec<&[u8]> {
    if data.is_empty() {
        return Vec::new();
    }
    let body = data.strip_suffix(b"\n").unwrap_or(data);
    body.split(|&b| b == b'\n').collect()
}
