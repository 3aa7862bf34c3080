//! Heuristic pairing of deletions and creations.
//!
//! A deleted file and a newly created file with the same name (or the same size and a similar
//! name) are most likely one file that was moved or renamed in the source. This is a hint for
//! the user, nothing more: false positives and misses are expected.

use std::path::{Path, PathBuf};

use crate::{
    config::{DEFAULT_MOVE_THRESHOLD, MAX_EDIT_DISTANCE, MAX_MOVE_DIRS},
    itemize::{ChangeEvent, base_name},
};

#[derive(Clone, Debug, PartialEq)]
pub struct MoveCandidate {
    pub deleted: PathBuf,
    pub created: PathBuf,
    /// 0..=1, higher is more similar
    pub score: f64,
}

/// The parts of a path that the similarity score looks at.
#[derive(Clone, Copy, Debug)]
pub struct Entry<'a> {
    pub path: &'a Path,
    pub size: Option<u64>,
}

impl<'a> From<&'a ChangeEvent> for Entry<'a> {
    fn from(e: &'a ChangeEvent) -> Self {
        Self {
            path: &e.path,
            size: e.size,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct MoveDetector {
    pub max_edit_distance: usize,
    pub max_move_dirs: usize,
    pub threshold: f64,
}

impl Default for MoveDetector {
    fn default() -> Self {
        Self {
            max_edit_distance: MAX_EDIT_DISTANCE,
            max_move_dirs: MAX_MOVE_DIRS,
            threshold: DEFAULT_MOVE_THRESHOLD,
        }
    }
}

impl MoveDetector {
    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            threshold,
            ..Self::default()
        }
    }

    /// `Some` if `created` is likely where `deleted` went.
    pub fn pair(&self, deleted: Entry, created: Entry) -> Option<MoveCandidate> {
        let (a, b) = (base_name(deleted.path), base_name(created.path));
        if distance(&a, &b) >= self.max_edit_distance {
            return None;
        }
        let same_size = matches!((deleted.size, created.size), (Some(x), Some(y)) if x == y);
        if a != b && !same_size {
            return None;
        }
        let score = similarity(deleted, created);
        (score >= self.threshold).then(|| MoveCandidate {
            deleted: deleted.path.to_path_buf(),
            created: created.path.to_path_buf(),
            score,
        })
    }

    /// All file move candidates, best first for each deletion.
    pub fn file_moves(&self, deleted: &[Entry], created: &[Entry]) -> Vec<MoveCandidate> {
        let mut o: Vec<MoveCandidate> = Vec::new();
        for d in deleted {
            let start = o.len();
            o.extend(created.iter().filter_map(|c| self.pair(*d, *c)));
            o[start..].sort_by(|x, y| {
                y.score.total_cmp(&x.score).then_with(|| x.created.cmp(&y.created))
            });
        }
        o
    }

    /// The new directories whose names are closest to the deleted entry, at most `max_move_dirs`.
    /// A new directory at the deleted path itself is a replacement, not a move.
    pub fn dir_moves(&self, deleted: &Path, new_dirs: &[&Path]) -> Vec<PathBuf> {
        let name = base_name(deleted);
        let mut o = new_dirs
            .iter()
            .filter(|d| **d != deleted)
            .map(|d| (distance(&base_name(d), &name), *d))
            .filter(|(dist, _)| *dist < self.max_edit_distance)
            .collect::<Vec<_>>();
        o.sort();
        o.into_iter()
            .take(self.max_move_dirs)
            .map(|(_, d)| d.to_path_buf())
            .collect()
    }
}

/// Name similarity, blended with size similarity if both sizes are known.
/// `similarity(a, b) == similarity(b, a)`.
pub fn similarity(a: Entry, b: Entry) -> f64 {
    let (x, y) = (base_name(a.path), base_name(b.path));
    let longest = x.chars().count().max(y.chars().count());
    let name = if longest == 0 {
        1.0
    } else {
        1.0 - distance(&x, &y) as f64 / longest as f64
    };
    match (a.size, b.size) {
        (Some(s), Some(t)) => {
            let size = if s == t {
                1.0
            } else {
                s.min(t) as f64 / s.max(t) as f64
            };
            0.75 * name + 0.25 * size
        }
        _ => name,
    }
}

/// Optimal string alignment distance: insertions, deletions, substitutions and
/// transpositions of adjacent characters each cost 1.
pub fn distance(a: &str, b: &str) -> usize {
    let a = a.chars().collect::<Vec<_>>();
    let b = b.chars().collect::<Vec<_>>();
    let width = b.len() + 1;
    let mut d = vec![0usize; (a.len() + 1) * width];
    for i in 0..=a.len() {
        d[i * width] = i;
    }
    for j in 0..=b.len() {
        d[j] = j;
    }
    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            let mut v = (d[(i - 1) * width + j] + 1)
                .min(d[i * width + j - 1] + 1)
                .min(d[(i - 1) * width + j - 1] + cost);
            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                v = v.min(d[(i - 2) * width + j - 2] + 1);
            }
            d[i * width + j] = v;
        }
    }
    d[a.len() * width + b.len()]
}
