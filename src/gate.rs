use std::fmt;

use crate::{config::SyncConfig, report::Report};

/// Something about a sync that could destroy data on the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Risk {
    /// target and source folders are named differently
    FolderName,
    /// files will be removed although no removal mode was requested
    Deletions(usize),
    /// deleted files or folders look like they were moved or renamed
    Moves(usize),
}

impl fmt::Display for Risk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FolderName => write!(
                f,
                "source and target folder names differ, use --force-foldername or -f if this is intended"
            ),
            Self::Deletions(n) => write!(f, "{n} entries would be removed from the target"),
            Self::Moves(n) => write!(f, "{n} entries look like they were moved or renamed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Nothing destructive is attempted in simulation mode.
    Simulated,
    Proceed,
    Blocked(Vec<Risk>),
}

/// Decides whether a sync may run.
#[derive(Debug, Clone, Copy)]
pub struct RiskGate {
    pub simulate: bool,
    pub force: bool,
    pub force_foldername: bool,
    /// `--sync` or `--del`: the user asked for removals
    pub deletes: bool,
}

impl RiskGate {
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            simulate: config.simulate,
            force: config.force,
            force_foldername: config.force_foldername,
            deletes: config.mode.deletes(),
        }
    }

    /// Checks that can be done before running rsync at all.
    pub fn preflight(&self, folder_names_differ: bool) -> Verdict {
        self.decide(folder_names_differ, None)
    }

    pub fn evaluate(&self, folder_names_differ: bool, report: &Report) -> Verdict {
        self.decide(folder_names_differ, Some(report))
    }

    fn decide(&self, folder_names_differ: bool, report: Option<&Report>) -> Verdict {
        if self.simulate {
            return Verdict::Simulated;
        }
        let mut risks = Vec::new();
        if folder_names_differ && !self.force_foldername {
            risks.push(Risk::FolderName);
        }
        if let Some(report) = report {
            if !self.force {
                if !report.removed.is_empty() && !self.deletes {
                    risks.push(Risk::Deletions(report.removed.len()));
                }
                let moves = report.moved_files() + report.moved_dirs.len();
                if moves > 0 {
                    risks.push(Risk::Moves(moves));
                }
            }
        }
        if risks.is_empty() {
            Verdict::Proceed
        } else {
            Verdict::Blocked(risks)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::moves::MoveCandidate;

    fn gate() -> RiskGate {
        RiskGate {
            simulate: false,
            force: false,
            force_foldername: false,
            deletes: false,
        }
    }

    fn deletions_only() -> Report {
        let mut r = Report::default();
        r.removed.insert(PathBuf::from("a.txt"));
        r.removed.insert(PathBuf::from("old/"));
        r
    }

    fn with_move() -> Report {
        let mut r = Report::default();
        r.moved.push(MoveCandidate {
            deleted: "a/x.jpg".into(),
            created: "b/x.jpg".into(),
            score: 1.0,
        });
        r
    }

    #[test]
    fn deletions_block_in_default_mode() {
        assert_eq!(
            gate().evaluate(false, &deletions_only()),
            Verdict::Blocked(vec![Risk::Deletions(2)])
        );
        let forced = RiskGate {
            force: true,
            ..gate()
        };
        assert_eq!(forced.evaluate(false, &deletions_only()), Verdict::Proceed);
    }

    #[test]
    fn requested_deletions_pass() {
        let sync = RiskGate {
            deletes: true,
            ..gate()
        };
        assert_eq!(sync.evaluate(false, &deletions_only()), Verdict::Proceed);
    }

    #[test]
    fn moves_need_force_even_when_syncing() {
        let sync = RiskGate {
            deletes: true,
            ..gate()
        };
        assert_eq!(
            sync.evaluate(false, &with_move()),
            Verdict::Blocked(vec![Risk::Moves(1)])
        );
        let forced = RiskGate {
            force: true,
            ..sync
        };
        assert_eq!(forced.evaluate(false, &with_move()), Verdict::Proceed);
    }

    #[test]
    fn folder_names() {
        assert_eq!(gate().preflight(true), Verdict::Blocked(vec![Risk::FolderName]));
        // --force doesn't cover folder names
        let forced = RiskGate {
            force: true,
            ..gate()
        };
        assert_eq!(forced.preflight(true), Verdict::Blocked(vec![Risk::FolderName]));
        let allowed = RiskGate {
            force_foldername: true,
            ..gate()
        };
        assert_eq!(allowed.preflight(true), Verdict::Proceed);
        assert_eq!(gate().preflight(false), Verdict::Proceed);
    }

    #[test]
    fn simulation_never_blocks() {
        let sim = RiskGate {
            simulate: true,
            ..gate()
        };
        assert_eq!(sim.preflight(true), Verdict::Simulated);
        assert_eq!(sim.evaluate(true, &deletions_only()), Verdict::Simulated);
        assert_eq!(sim.evaluate(false, &with_move()), Verdict::Simulated);
    }

    #[test]
    fn empty_report_proceeds() {
        assert_eq!(gate().evaluate(false, &Report::default()), Verdict::Proceed);
    }
}
