use thiserror::Error;

/// Errors produced by the command family.
///
/// The `Display` output of every variant is a stable public contract:
/// clients (notably network-filesystem bridges) match on substrings of
/// these messages to map them to POSIX errno values. Do not reword them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    // Missing resources.
    #[error("no such filesystem key")]
    NoSuchKey,
    #[error("no such file or directory")]
    NoSuchFileOrDir,
    #[error("no such directory")]
    NoSuchDirectory,
    #[error("no such path")]
    NoSuchPath,

    // Type mismatches.
    #[error("not a file")]
    NotAFile,
    #[error("not a directory")]
    NotADirectory,
    #[error("not a symbolic link")]
    NotASymlink,
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,
    #[error("parent path conflict")]
    ParentConflict,

    // Existence conflicts.
    #[error("path already exists")]
    AlreadyExists,
    #[error("destination already exists")]
    DestinationExists,
    #[error("directory not empty — use RECURSIVE")]
    DirectoryNotEmpty,
    #[error("source is a directory — use RECURSIVE")]
    SourceIsDirectory,

    // Root topology.
    #[error("cannot delete root directory")]
    DeleteRoot,
    #[error("cannot write to root directory")]
    WriteRoot,
    #[error("cannot append to root directory")]
    AppendRoot,
    #[error("cannot create symlink at root")]
    SymlinkAtRoot,
    #[error("cannot move root")]
    MoveRoot,
    #[error("cannot move a directory into its own subtree")]
    MoveIntoSubtree,

    // Argument validation.
    #[error("syntax error — expected {0}")]
    Syntax(&'static str),
    #[error("mode must be an octal value between 0000 and 07777")]
    BadMode,
    #[error("uid must be an integer")]
    BadUid,
    #[error("uid out of range")]
    UidOutOfRange,
    #[error("gid must be an integer")]
    BadGid,
    #[error("gid out of range")]
    GidOutOfRange,
    #[error("atime_ms must be an integer")]
    BadAtime,
    #[error("mtime_ms must be an integer")]
    BadMtime,
    #[error("length must be a non-negative integer")]
    BadLength,
    #[error("DEPTH must be a non-negative integer")]
    BadDepth,
    #[error("TYPE must be file, dir, or symlink")]
    BadTypeFilter,
    #[error("n must be a non-negative integer")]
    BadLineCount,
    #[error("start must be a positive integer")]
    BadLineStart,
    #[error("end must be a positive integer or -1")]
    BadLineEnd,
    #[error("end must not be less than start")]
    BadLineRange,
    #[error("line must be a non-negative integer or -1")]
    BadInsertLine,
    #[error("invalid path")]
    InvalidPath,
    #[error("wrong number of arguments for '{0}' command")]
    WrongArity(&'static str),
    #[error("unknown command")]
    UnknownCommand,

    // Resolution.
    #[error("too many levels of symbolic links")]
    SymlinkLoop,
    #[error("path depth exceeds limit")]
    PathDepth,

    // Subtree copy.
    #[error("copy failed")]
    CopyFailed,
}
