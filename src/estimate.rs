use crate::error::Error;

const MEBI: f64 = (1024 * 1024) as f64;

/// Throughput in MiB/s used for the runtime projection.
const MEDIA: &[(&str, f64)] = &[
    ("SSD", 130.0),
    ("HDD", 60.0),
    ("Ethernet", 12.5),
    ("USB 3.0", 0.4),
];

/// The parts of `rsync --stats` the estimate needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub files: u64,
    pub bytes: u64,
}

impl Stats {
    /// Reads `Number of files: 1,234 (reg: ...)` and `Total file size: 5,678 bytes`.
    pub fn parse<S: AsRef<str>>(lines: &[S]) -> Result<Self, Error> {
        let field = |prefix: &str| {
            lines
                .iter()
                .find_map(|l| l.as_ref().strip_prefix(prefix))
                .and_then(|rest| {
                    rest.trim_start()
                        .split([' ', '('])
                        .next()
                        .map(|n| n.replace([',', '.'], ""))
                })
                .and_then(|n| n.parse::<u64>().ok())
                .ok_or_else(|| Error::Statistics(format!("no {prefix:?} line")))
        };
        Ok(Self {
            files: field("Number of files:")?,
            bytes: field("Total file size:")?,
        })
    }

    /// Minutes the transfer takes on each medium.
    pub fn minutes(&self) -> Vec<(&'static str, f64)> {
        MEDIA
            .iter()
            .map(|(name, mib)| (*name, self.bytes as f64 / (60.0 * mib * MEBI)))
            .collect()
    }

    pub fn describe(&self) -> String {
        let times = self
            .minutes()
            .into_iter()
            .map(|(name, m)| format!("{m:.1} ({name})"))
            .collect::<Vec<_>>()
            .join(" ");
        format!(
            "Estimated run time for {} entries in minutes: {times}",
            self.files
        )
    }
}
