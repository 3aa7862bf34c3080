use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::Error;

/// Where the backup goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Local(PathBuf),
    Remote {
        user: String,
        host: String,
        path: String,
    },
}

impl Target {
    /// Accepted: `/local_path`, `D:\local_path`, `host:path` (with `--user`), `user@host:path`,
    /// each optionally prefixed by `rsync://`.
    pub fn parse(spec: &str, user: Option<&str>) -> Result<Self, Error> {
        let mut user = user.map(str::to_owned);
        let mut remote = false;
        let mut spec = spec;
        if let Some(rest) = spec.strip_prefix("rsync://") {
            spec = rest;
            remote = true;
        }
        if let Some((name, rest)) = spec.split_once('@') {
            user = Some(name.to_owned());
            spec = rest;
            remote = true;
        }
        // ignore a drive letter separator in local windows paths
        remote = remote || spec.get(2..).is_some_and(|s| s.contains(':'));
        if !remote {
            return Ok(Self::Local(PathBuf::from(spec)));
        }
        let user = user.ok_or(Error::RemoteUserMissing)?;
        info!("Using remote account '{user}' for login");
        match spec.split_once(':') {
            Some((host, path)) if !host.is_empty() => Ok(Self::Remote {
                user,
                host: host.to_owned(),
                path: path.to_owned(),
            }),
            _ => Err(Error::RemoteSpec(spec.to_owned())),
        }
    }

    /// Local targets must exist and are made absolute.
    pub fn resolve(self) -> Result<Self, Error> {
        match self {
            Self::Local(path) => {
                if !path.exists() {
                    return Err(Error::TargetMissing(path));
                }
                Ok(Self::Local(path.canonicalize()?))
            }
            remote => Ok(remote),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }

    /// Name of the target folder, used to catch syncs into a differently named folder.
    pub fn folder_name(&self) -> Option<String> {
        match self {
            Self::Local(path) => path.file_name().map(|n| n.to_string_lossy().into_owned()),
            Self::Remote { path, .. } => path
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .filter(|n| !n.is_empty())
                .map(str::to_owned),
        }
    }

    /// The argument passed to rsync, always ending in `/`.
    pub fn rsync_arg(&self) -> String {
        let mut o = match self {
            Self::Local(path) => rsync_path(path),
            Self::Remote { user, host, path } => format!("{user}@{host}:{path}"),
        };
        if !o.ends_with('/') {
            o.push('/');
        }
        o
    }
}

/// The folder being backed up, and optionally a single file inside it.
#[derive(Debug)]
pub struct Source {
    pub dir: PathBuf,
    pub file: Option<String>,
}

impl Source {
    pub fn new(dir: PathBuf, file: Option<&Path>) -> Result<Self, Error> {
        let file = match file {
            None => None,
            Some(file) => {
                if !dir.join(file).is_file() {
                    return Err(Error::FileNotFound(file.to_path_buf()));
                }
                let name = file
                    .to_string_lossy()
                    .replace('\\', "/")
                    .trim_matches('/')
                    .to_owned();
                info!("Running in single file transfer mode for '{name}'");
                Some(name)
            }
        };
        Ok(Self { dir, file })
    }

    pub fn folder_name(&self) -> Option<String> {
        self.dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
    }

    /// The source folder with a trailing `/`, so rsync copies its contents,
    /// followed by the single file name if there is one.
    pub fn rsync_arg(&self) -> String {
        let mut o = rsync_path(&self.dir);
        if !o.ends_with('/') {
            o.push('/');
        }
        if let Some(file) = &self.file {
            o.push_str(file);
        }
        o
    }

    /// The target must not be the source folder itself or lie anywhere below it.
    pub fn check_target(&self, target: &Target) -> Result<(), Error> {
        if let Target::Local(path) = target {
            if path.starts_with(&self.dir) {
                return Err(Error::TargetInsideSource {
                    folder: self.dir.clone(),
                    target: path.clone(),
                });
            }
        }
        Ok(())
    }
}

/// `true` if the folder names differ, ignoring case.
pub fn folder_names_differ(source: &Source, target: &Target) -> bool {
    match (source.folder_name(), target.folder_name()) {
        (Some(s), Some(t)) => s.to_lowercase() != t.to_lowercase(),
        (None, None) => false,
        _ => true,
    }
}

fn rsync_path(path: &Path) -> String {
    let path = path.to_string_lossy();
    if cfg!(windows) {
        cygwinify(&path)
    } else {
        path.into_owned()
    }
}

/// Converts `C:\some\path` into the `/cygdrive/c/some/path` form cygwin builds of rsync expect.
pub fn cygwinify(path: &str) -> String {
    let path = path.strip_prefix(r"\\?\").unwrap_or(path).replace('\\', "/");
    let mut chars = path.chars();
    match (chars.next(), chars.next()) {
        (Some(drive), Some(':')) if drive.is_ascii_alphabetic() => {
            format!(
                "/cygdrive/{}{}",
                drive.to_ascii_lowercase(),
                chars.as_str()
            )
        }
        _ => path,
    }
}
