use std::{ffi::OsString, fmt};

use crate::{
    config::{SyncConfig, SyncMode},
    error::Error,
    target::{Source, Target},
};

/// Environment variable naming a custom rsync executable.
pub const RSYNC_ENV: &str = "RSYNC";

/// The rsync executable, `$RSYNC` or `rsync` from the `PATH`.
pub fn rsync_program() -> OsString {
    std::env::var_os(RSYNC_ENV)
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| "rsync".into())
}

/// A prepared rsync call. Arguments are passed as-is, never through a shell.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub program: OsString,
    pub args: Vec<String>,
}

impl Invocation {
    fn new(program: OsString) -> Self {
        Self {
            program,
            args: Vec::new(),
        }
    }
    fn arg(&mut self, arg: impl Into<String>) -> &mut Self {
        self.args.push(arg.into());
        self
    }
    fn args<'a>(&mut self, args: impl IntoIterator<Item = &'a str>) -> &mut Self {
        self.args.extend(args.into_iter().map(str::to_owned));
        self
    }
}

/// Shell-like rendering for logs.
impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains([' ', '\'', '"', '$', '*', '?']) {
                write!(f, " '{}'", arg.replace('\'', r"'\''"))?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// The installed rsync, from the first line of `rsync --version`,
/// e.g. `rsync  version 3.2.7  protocol version 31`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ToolVersion {
    pub major: u32,
    pub minor: u32,
    pub protocol: u32,
}

impl ToolVersion {
    pub fn parse(output: &str) -> Result<Self, Error> {
        let line = output.lines().next().unwrap_or("").trim();
        let unknown = || Error::UnknownVersion(line.to_owned());
        if !line.starts_with("rsync") {
            return Err(unknown());
        }
        let protocol = line
            .split_once("protocol version ")
            .and_then(|(_, p)| p.split_whitespace().next())
            .and_then(|p| p.parse().ok())
            .ok_or_else(unknown)?;
        let mut version = line
            .split_once("version ")
            .and_then(|(_, v)| v.split_whitespace().next())
            .ok_or_else(unknown)?
            .split('.')
            .map(str::parse::<u32>);
        match (version.next(), version.next()) {
            (Some(Ok(major)), Some(Ok(minor))) => Ok(Self {
                major,
                minor,
                protocol,
            }),
            _ => Err(unknown()),
        }
    }

    /// `--info=progress2` exists since rsync 3.1 (protocol 31).
    pub fn has_progress2(&self) -> bool {
        self.protocol >= 31 || (self.major, self.minor) >= (3, 1)
    }
}

impl fmt::Display for ToolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.x  protocol {}",
            self.major, self.minor, self.protocol
        )
    }
}

/// Builds rsync calls for one pair of endpoints.
pub struct CommandBuilder<'a> {
    pub program: OsString,
    pub source: &'a Source,
    pub target: &'a Target,
    pub version: ToolVersion,
}

impl CommandBuilder<'_> {
    fn recursive(&self, c: &SyncConfig) -> bool {
        c.recursive && self.source.file.is_none()
    }

    /// The dry run (`simulate`) or the real transfer.
    pub fn sync(&self, c: &SyncConfig, simulate: bool) -> Invocation {
        let mut o = Invocation::new(self.program.clone());
        if simulate {
            o.arg("-n");
        } else if self.version.has_progress2() {
            o.args(["--info=progress2", "-h"]);
        }
        if self.recursive(c) {
            o.arg("-r");
        }
        // --ignore-existing: only additional files, --existing: no new files,
        // -u: only replace older files, -I: ignore times
        o.arg(match c.mode {
            SyncMode::Add => "--ignore-existing",
            SyncMode::Delete => "--existing",
            _ if c.force_copy => "-I",
            _ => "-u",
        });
        if c.mode.deletes() {
            o.args(["--delete-after", "--prune-empty-dirs", "--delete-excluded"]);
        }
        if c.compress {
            o.args(["-S", "-z", "--compress-level=6"]);
        }
        if self.source.file.is_some() {
            o.arg("-P");
        }
        if c.backup {
            o.args(["-b", "--suffix=~~"]);
        }
        if !simulate {
            o.args(["-hh", "--stats"]);
        }
        if c.checksum {
            o.arg("-c");
        }
        o.args(["-i", "-t", "--no-i-r"]);
        // excluded entries are neither copied nor, thanks to the P(rotect) rule, removed
        for pattern in &c.exclusions.0 {
            let p = pattern.rsync_pattern();
            o.arg(format!("--exclude={p}"));
            o.arg(format!("--filter=P {p}"));
        }
        o.arg(self.source.rsync_arg());
        o.arg(self.target.rsync_arg());
        o
    }

    /// A statistics-only dry run for `--estimate`.
    pub fn estimate(&self, c: &SyncConfig) -> Invocation {
        let mut o = Invocation::new(self.program.clone());
        o.args(["-n", "--stats"]);
        if self.recursive(c) {
            o.arg("-r");
        }
        o.arg(match c.mode {
            SyncMode::Add => "--ignore-existing",
            _ if c.force_copy => "-I",
            _ => "-u",
        });
        o.arg(self.source.rsync_arg());
        o.arg(self.target.rsync_arg());
        o
    }
}
