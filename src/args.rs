use std::path::PathBuf;

use clap::Parser;

use crate::config::DEFAULT_MOVE_THRESHOLD;

/// This rsync wrapper simplifies backing up the current directory tree.
///
/// The target is either a local folder (/path, Drive:\path) or a remote path
/// ([rsync://][user@]host:/path). Without a mode flag, rsyncr updates the target.
#[derive(Parser, Debug)]
#[command(author, version)]
pub struct Args {
    /// where the current directory will be backed up to
    #[arg()]
    pub target: String,

    /// immediately copy only additional files (otherwise add, and update modified)
    #[arg(short, long, conflicts_with_all = ["sync", "del"])]
    pub add: bool,
    /// remove files in target if removed in source, including empty folders
    #[arg(short, long, conflicts_with = "del")]
    pub sync: bool,
    /// only remove files, do not add nor update
    #[arg(short, long)]
    pub del: bool,
    /// don't actually sync, stop after simulation
    #[arg(short = 'n', long)]
    pub simulate: bool,
    /// estimate copy speed
    #[arg(long)]
    pub estimate: bool,
    /// transfer a single local file instead of synchronizing a folder
    #[arg(long, value_name = "FILE")]
    pub file: Option<PathBuf>,
    /// remote user name, unless using user@host notation
    #[arg(short, long)]
    pub user: Option<String>,
    /// do not compute potential directory moves
    #[arg(long, alias = "skip-moves")]
    pub skip_move: bool,

    /// in case of dangerous operation, ask interactively
    #[arg(short = 'i', long)]
    pub ask: bool,
    /// sync even if the target folder name differs
    #[arg(short = 'f', long)]
    pub force_foldername: bool,
    /// sync even if deletions or moved files have been detected
    #[arg(short = 'y', long)]
    pub force: bool,
    /// force writing over existing files
    #[arg(long)]
    pub force_copy: bool,

    /// don't recurse into sub folders, only operate on the current folder
    #[arg(short = '1', long)]
    pub flat: bool,
    /// full file comparison using checksums
    #[arg(short = 'C', long)]
    pub checksum: bool,
    /// compress data during transport, handle many files better
    #[arg(short, long)]
    pub compress: bool,
    /// keep replaced files as backups with a ~~ suffix
    #[arg(long)]
    pub backup: bool,
    /// corrupdetect compatibility: if set, .corruptdetect files are not ignored
    #[arg(long)]
    pub with_checksums: bool,
    /// additional patterns to exclude (and protect from deletion).
    /// patterns ending in / only match directories.
    #[arg(long, value_name = "PATTERN")]
    pub exclude: Vec<String>,
    /// minimum similarity score (0..1) for a deletion/creation pair to count as a move
    #[arg(long, default_value_t = DEFAULT_MOVE_THRESHOLD)]
    pub move_threshold: f64,
    /// show more output
    #[arg(short, long)]
    pub verbose: bool,
}
