use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(
        "Target folder {0:?} doesn't exist. Create it manually to sync. This avoids bad surprises!"
    )]
    TargetMissing(PathBuf),
    #[error("Cannot copy into the source folder or below it (target {target:?}, source {folder:?})")]
    TargetInsideSource { folder: PathBuf, target: PathBuf },
    #[error("User name required for remote file upload, use --user or user@host:path")]
    RemoteUserMissing,
    #[error("Expecting server:path rsync path, got {0:?}")]
    RemoteSpec(String),
    #[error("File not found {0:?}")]
    FileNotFound(PathBuf),
    #[error("Couldn't determine the current directory: {0}")]
    CurrentDir(#[source] io::Error),
    #[error("Couldn't run {program:?}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("Cannot determine rsync version from {0:?}")]
    UnknownVersion(String),
    #[error("rsync exited with code {0}")]
    ToolFailed(i32),
    #[error("rsync was terminated by a signal")]
    ToolKilled,
    #[error("Couldn't read rsync's statistics: {0}")]
    Statistics(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}
