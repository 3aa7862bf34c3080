use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{
    config::Exclusions,
    itemize::{Action, ChangeEvent, EntryKind},
    moves::{Entry, MoveCandidate, MoveDetector},
};

/// What a sync would do, grouped the way it is shown to the user.
#[derive(Debug, Default)]
pub struct Report {
    pub added: BTreeSet<PathBuf>,
    pub modified: BTreeSet<PathBuf>,
    /// the part of `modified` where only permissions, times or owners change
    pub attributes_only: BTreeSet<PathBuf>,
    /// deletions that don't look like moves
    pub removed: BTreeSet<PathBuf>,
    /// deletions that look like moves, best candidate first per deleted path
    pub moved: Vec<MoveCandidate>,
    /// new top-level directories and every file created below them
    pub new_dirs: BTreeMap<PathBuf, Vec<PathBuf>>,
    /// deleted entries and the new directories they may have been moved to
    pub moved_dirs: BTreeMap<PathBuf, Vec<PathBuf>>,
}

impl Report {
    /// `detect_dir_moves` is off in add mode and with `--skip-move`.
    pub fn new(events: &[ChangeEvent], detector: &MoveDetector, detect_dir_moves: bool) -> Self {
        let mut o = Self::default();

        // files in new directories can be neither moved nor removed, they are reported with their directory
        let mut new_dirs = events
            .iter()
            .filter(|e| e.is_new_dir())
            .map(|e| e.path.as_path())
            .collect::<Vec<_>>();
        new_dirs.sort();
        let mut top_level: Vec<&Path> = Vec::new();
        for dir in new_dirs {
            if !top_level.iter().any(|t| dir.starts_with(t)) {
                top_level.push(dir);
            }
        }
        for dir in &top_level {
            o.new_dirs.insert(dir.to_path_buf(), Vec::new());
        }
        let mut rest = Vec::new();
        for e in events {
            // a deleted target file replaced by a new directory of the same name is still a deletion
            if e.action == Action::Deleted {
                rest.push(e);
                continue;
            }
            match top_level.iter().find(|t| e.path.starts_with(t)) {
                Some(dir) => {
                    if e.path != *dir && e.kind != EntryKind::Dir {
                        if let Some(files) = o.new_dirs.get_mut(*dir) {
                            files.push(e.path.clone());
                        }
                    }
                }
                None => rest.push(e),
            }
        }

        let deleted = rest
            .iter()
            .filter(|e| e.action == Action::Deleted)
            .map(|e| Entry::from(*e))
            .collect::<Vec<_>>();
        let created = rest
            .iter()
            .filter(|e| e.action == Action::New && e.kind != EntryKind::Dir)
            .map(|e| Entry::from(*e))
            .collect::<Vec<_>>();
        o.moved = detector.file_moves(&deleted, &created);
        let move_sources = o.moved.iter().map(|m| m.deleted.as_path()).collect::<BTreeSet<_>>();
        let move_targets = o.moved.iter().map(|m| m.created.as_path()).collect::<BTreeSet<_>>();

        for e in &rest {
            let path = e.path.as_path();
            match e.action {
                Action::Deleted if !move_sources.contains(path) => {
                    o.removed.insert(e.path.clone());
                }
                Action::New if e.kind != EntryKind::Dir && !move_targets.contains(path) => {
                    o.added.insert(e.path.clone());
                }
                Action::Updated if e.kind != EntryKind::Dir && !move_targets.contains(path) => {
                    o.modified.insert(e.path.clone());
                    if !e.transfers_data() {
                        o.attributes_only.insert(e.path.clone());
                    }
                }
                _ => {}
            }
        }

        if detect_dir_moves {
            debug!("Computing potential directory moves");
            for deleted in move_sources.iter().copied().chain(o.removed.iter().map(PathBuf::as_path)) {
                let found = detector.dir_moves(deleted, &top_level);
                if !found.is_empty() {
                    o.moved_dirs.insert(deleted.to_path_buf(), found);
                }
            }
        }
        o
    }

    /// `true` if the sync would not change anything.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.modified.is_empty()
            && self.removed.is_empty()
            && self.moved.is_empty()
            && self.new_dirs.is_empty()
    }

    /// number of distinct deleted paths that look like moves
    pub fn moved_files(&self) -> usize {
        self.moved
            .iter()
            .map(|m| &m.deleted)
            .collect::<BTreeSet<_>>()
            .len()
    }

    pub fn new_dir_files(&self) -> usize {
        self.new_dirs.values().map(Vec::len).sum()
    }

    /// Counts of everything found, one line per non-empty group.
    pub fn summary(&self) -> Vec<String> {
        let mut o = Vec::new();
        if !self.added.is_empty() {
            o.push(format!("{:<5} added files", self.added.len()));
        }
        if !self.modified.is_empty() {
            o.push(format!("{:<5} chngd files", self.modified.len()));
        }
        if !self.removed.is_empty() {
            o.push(format!("{:<5} remvd entries", self.removed.len()));
        }
        if !self.moved.is_empty() {
            o.push(format!("{:<5} moved files (maybe)", self.moved_files()));
        }
        if !self.new_dirs.is_empty() {
            o.push(format!(
                "{:<5} Added dirs (including {} files)",
                self.new_dirs.len(),
                self.new_dir_files()
            ));
        }
        if !self.moved_dirs.is_empty() {
            o.push(format!("{:<5} Moved dirs (maybe)", self.moved_dirs.len()));
        }
        o
    }
}

/// Keeps only events that describe a change and aren't excluded.
pub fn relevant(events: Vec<ChangeEvent>, exclusions: &Exclusions) -> Vec<ChangeEvent> {
    events
        .into_iter()
        .filter(|e| e.action != Action::Unchanged)
        .filter(|e| {
            let excluded = exclusions.matches(&e.path, e.kind == EntryKind::Dir);
            if excluded {
                debug!("ignoring excluded entry {:?}", e.path);
            }
            !excluded
        })
        .collect()
}

/// Sizes of deleted entries (in the target) and new files (in the source),
/// where both are reachable on the local file system.
pub fn attach_sizes(events: &mut [ChangeEvent], source: &Path, target: Option<&Path>) {
    for e in events {
        let root = match e.action {
            Action::Deleted => target,
            Action::New if e.kind != EntryKind::Dir => Some(source),
            _ => None,
        };
        if let Some(root) = root {
            if let Ok(meta) = fs::symlink_metadata(root.join(&e.path)) {
                if meta.is_file() {
                    e.size = Some(meta.len());
                }
            }
        }
    }
}
