use std::{
    fmt,
    path::{Component, Path, PathBuf},
};

use crate::args::Args;

/// Don't display more than this number of potential directory moves per removed entry.
pub const MAX_MOVE_DIRS: usize = 2;
/// Insertions, deletions, replacements and transpositions.
pub const MAX_EDIT_DISTANCE: usize = 5;
pub const DEFAULT_MOVE_THRESHOLD: f64 = 0.5;

/// Files never copied, and never removed from the target. `*~~` are earlier backups.
const FILE_EXCLUDES: &[&str] = &["*~~"];
const CORRUPTDETECT: &str = ".corruptdetect";
const DIR_EXCLUDES: &[&str] = &[
    ".redundir",
    ".imagesubsort_cache",
    ".imagesubsort_trash",
    "$RECYCLE.BIN",
    "System Volume Information",
    "Recovery",
    "catalog Previews.lrdata",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncMode {
    /// Only copy files missing in the target.
    Add,
    /// Add missing files and replace older ones.
    Update,
    /// Mirror: like update, but also remove target files missing in the source.
    Sync,
    /// Only remove target files missing in the source.
    Delete,
}

impl SyncMode {
    /// `true` if the user asked for removals on the target.
    pub fn deletes(self) -> bool {
        matches!(self, Self::Sync | Self::Delete)
    }
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "add",
            Self::Update => "update",
            Self::Sync => "sync",
            Self::Delete => "delete",
        })
    }
}

#[derive(Debug)]
pub struct SyncConfig {
    pub mode: SyncMode,
    pub simulate: bool,
    pub force: bool,
    pub force_foldername: bool,
    /// ignore times, overwrite existing files
    pub force_copy: bool,
    pub ask: bool,
    pub recursive: bool,
    pub compress: bool,
    pub checksum: bool,
    pub backup: bool,
    pub estimate: bool,
    pub skip_move: bool,
    pub verbose: bool,
    pub move_threshold: f64,
    /// single file to transfer, relative to the source folder
    pub file: Option<PathBuf>,
    pub user: Option<String>,
    pub exclusions: Exclusions,
}

impl SyncConfig {
    pub fn from_args(args: &Args) -> Self {
        let mode = if args.add {
            SyncMode::Add
        } else if args.sync {
            SyncMode::Sync
        } else if args.del {
            SyncMode::Delete
        } else {
            SyncMode::Update
        };
        let mut exclusions = Exclusions::defaults(args.with_checksums);
        for pattern in &args.exclude {
            exclusions.push(pattern);
        }
        Self {
            mode,
            simulate: args.simulate,
            force: args.force,
            force_foldername: args.force_foldername,
            force_copy: args.force_copy,
            ask: args.ask,
            recursive: !args.flat,
            compress: args.compress,
            checksum: args.checksum,
            backup: args.backup,
            estimate: args.estimate,
            skip_move: args.skip_move,
            verbose: args.verbose,
            move_threshold: args.move_threshold.clamp(0.0, 1.0),
            file: args.file.clone(),
            user: args.user.clone(),
            exclusions,
        }
    }

    /// The operation as shown to the user, e.g. `SIMULATE SYNC`.
    pub fn operation(&self) -> String {
        let op = match self.mode {
            SyncMode::Update if self.force_copy => "COPY".to_owned(),
            mode => mode.to_string().to_uppercase(),
        };
        if self.simulate {
            format!("SIMULATE {op}")
        } else {
            op
        }
    }
}

/// Patterns passed to rsync as `--exclude` and `--filter=P` (protect) rules.
/// The same patterns filter the itemized output, so protected entries never count as risky.
#[derive(Debug, Default)]
pub struct Exclusions(pub Vec<Pattern>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub glob: String,
    /// pattern ended with `/`, only directories match
    pub dir_only: bool,
}

impl Exclusions {
    pub fn defaults(with_checksums: bool) -> Self {
        let mut o = Self::default();
        for p in FILE_EXCLUDES {
            o.push(p);
        }
        if !with_checksums {
            o.push(CORRUPTDETECT);
        }
        for p in DIR_EXCLUDES {
            o.push(&format!("{p}/"));
        }
        o
    }
    pub fn push(&mut self, pattern: &str) {
        let (glob, dir_only) = match pattern.strip_suffix('/') {
            Some(glob) => (glob, true),
            None => (pattern, false),
        };
        if !glob.is_empty() {
            self.0.push(Pattern {
                glob: glob.to_owned(),
                dir_only,
            });
        }
    }
    /// Like rsync, a pattern without `/` matches the name of the entry or of any parent directory,
    /// a pattern with `/` matches the trailing part of the path.
    pub fn matches(&self, path: &Path, is_dir: bool) -> bool {
        self.0.iter().any(|p| p.matches(path, is_dir))
    }
}

impl Pattern {
    /// The argument to `--exclude` and `--filter=P`.
    pub fn rsync_pattern(&self) -> String {
        if self.dir_only {
            format!("{}/", self.glob)
        } else {
            self.glob.clone()
        }
    }
    fn matches(&self, path: &Path, is_dir: bool) -> bool {
        let names = path
            .components()
            .filter_map(|c| match c {
                Component::Normal(n) => n.to_str(),
                _ => None,
            })
            .collect::<Vec<_>>();
        let anchored = self.glob.contains('/');
        // every proper prefix of the path is a directory
        (1..=names.len()).any(|end| {
            if self.dir_only && end == names.len() && !is_dir {
                return false;
            }
            if anchored {
                let glob = self.glob.trim_start_matches('/');
                let depth = glob.split('/').count();
                end >= depth
                    && (!self.glob.starts_with('/') || end == depth)
                    && glob_match::glob_match(glob, &names[end - depth..end].join("/"))
            } else {
                glob_match::glob_match(&self.glob, names[end - 1])
            }
        })
    }
}
