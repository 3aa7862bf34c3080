//! Classification of rsync's `--itemize-changes` output.
//!
//! Each itemized line is `YXcstpoguax <path>`:
//!
//! - `Y` update type: `<` sent, `>` received, `c` created locally, `h` hard link,
//!   `.` not updated, `*` message (`*deleting   <path>`)
//! - `X` file type: `f` file, `d` directory, `L` symlink, `D` device, `S` special
//! - the rest are attribute columns: `.` unchanged, `+` new item, `?` unknown,
//!   otherwise the letter of the changed attribute.
//!
//! Older rsync versions print fewer attribute columns; newer ones may print more.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// attribute columns after `YX` since rsync 3.1
const ATTRIBUTE_COLUMNS: usize = 9;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateType {
    Sent,
    Received,
    Created,
    HardLink,
    NotUpdated,
    Message,
}

impl UpdateType {
    fn from_char(c: char) -> Option<Self> {
        Some(match c {
            '<' => Self::Sent,
            '>' => Self::Received,
            'c' => Self::Created,
            'h' => Self::HardLink,
            '.' => Self::NotUpdated,
            '*' => Self::Message,
            _ => return None,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
    Device,
    Special,
    /// deletions don't say what was deleted, unless it is a directory
    Unknown,
}

impl EntryKind {
    fn from_char(c: char) -> Option<Self> {
        Some(match c {
            'f' => Self::File,
            'd' => Self::Dir,
            'L' => Self::Symlink,
            'D' => Self::Device,
            'S' => Self::Special,
            _ => return None,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    New,
    Updated,
    Deleted,
    Unchanged,
}

/// The attribute columns of an itemized line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChangeFlags {
    /// every attribute column was `+`
    pub new_item: bool,
    pub checksum: bool,
    pub size: bool,
    pub time: bool,
    /// `T`: time will be set to the transfer time
    pub time_to_transfer: bool,
    pub permissions: bool,
    pub owner: bool,
    pub group: bool,
    pub access_time: bool,
    pub change_time: bool,
    pub acl: bool,
    pub xattr: bool,
}

impl ChangeFlags {
    fn parse(columns: &str) -> Self {
        let mut o = Self::default();
        if !columns.is_empty() && columns.chars().all(|c| c == '+') {
            o.new_item = true;
            return o;
        }
        for (i, c) in columns.chars().enumerate() {
            // letters are positional, but each one is unique, so unknown positions are harmless
            match (i, c) {
                (0, 'c') => o.checksum = true,
                (1, 's') => o.size = true,
                (2, 't') => o.time = true,
                (2, 'T') => o.time_to_transfer = true,
                (3, 'p') => o.permissions = true,
                (4, 'o') => o.owner = true,
                (5, 'g') => o.group = true,
                (6, 'u') => o.access_time = true,
                (6, 'n') => o.change_time = true,
                (6, 'b') => {
                    o.access_time = true;
                    o.change_time = true;
                }
                (7, 'a') => o.acl = true,
                (8, 'x') => o.xattr = true,
                _ => {}
            }
        }
        o
    }

    pub fn any(&self) -> bool {
        self.new_item || self.content() || self.metadata()
    }
    /// data or size changed
    pub fn content(&self) -> bool {
        self.checksum || self.size
    }
    pub fn metadata(&self) -> bool {
        self.time
            || self.time_to_transfer
            || self.permissions
            || self.owner
            || self.group
            || self.access_time
            || self.change_time
            || self.acl
            || self.xattr
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChangeEvent {
    /// relative to the source folder, without a trailing `/`
    pub path: PathBuf,
    pub update: UpdateType,
    pub kind: EntryKind,
    pub flags: ChangeFlags,
    pub action: Action,
    /// filled in from the local file system where possible, rsync doesn't report it
    pub size: Option<u64>,
}

impl ChangeEvent {
    /// a directory created together with all of its contents
    pub fn is_new_dir(&self) -> bool {
        self.kind == EntryKind::Dir && self.action == Action::New
    }

    /// `false` if only attributes like times or permissions are set on the target
    pub fn transfers_data(&self) -> bool {
        self.flags.content() || matches!(self.update, UpdateType::Sent | UpdateType::Received)
    }
}

pub fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ItemizeError {
    #[error("unknown file type {0:?} in {1:?}")]
    UnknownKind(char, String),
    #[error("no path in {0:?}")]
    MissingPath(String),
}

/// Parses one line of rsync output.
///
/// `Ok(None)` for informational lines (file list notes, statistics, messages other than
/// deletions, the root directory). `Err` for lines that look itemized but can't be decoded.
pub fn parse_line(line: &str) -> Result<Option<ChangeEvent>, ItemizeError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (code, rest) = line.split_once(' ').unwrap_or((line, ""));
    let mut chars = code.chars();
    let Some(update) = chars.next().and_then(UpdateType::from_char) else {
        return Ok(None);
    };
    let columns = chars.as_str();
    if update == UpdateType::Message {
        if columns != "deleting" {
            return Ok(None);
        }
        let raw = rest.trim_start_matches(' ');
        if raw.is_empty() {
            return Err(ItemizeError::MissingPath(line.to_owned()));
        }
        let kind = if raw.ends_with('/') {
            EntryKind::Dir
        } else {
            EntryKind::Unknown
        };
        return Ok(event(raw, update, kind, ChangeFlags::default(), Action::Deleted));
    }
    // itemized codes are a single word of 2 or more columns, e.g. `.d..t......`
    if code.len() < 2 || !code.is_ascii() || !is_attribute_columns(&columns[1..]) {
        return Ok(None);
    }
    let kind_char = columns.chars().next().unwrap_or(' ');
    let Some(kind) = EntryKind::from_char(kind_char) else {
        if code.chars().all(|c| c.is_ascii_alphabetic()) {
            // a plain word like "created directory backup"
            return Ok(None);
        }
        return Err(ItemizeError::UnknownKind(kind_char, line.to_owned()));
    };
    // identical entries (-ii) have blank attribute columns
    let rest = if code.len() == 2 {
        let blank = rest.len() - rest.trim_start_matches(' ').len();
        &rest[blank.min(ATTRIBUTE_COLUMNS)..]
    } else {
        rest
    };
    if rest.is_empty() {
        return Err(ItemizeError::MissingPath(line.to_owned()));
    }
    let raw = match kind {
        EntryKind::Symlink => rest.split_once(" -> ").map_or(rest, |(p, _)| p),
        _ if update == UpdateType::HardLink => rest.split_once(" => ").map_or(rest, |(p, _)| p),
        _ => rest,
    };
    let flags = ChangeFlags::parse(&columns[1..]);
    let action = if flags.new_item {
        Action::New
    } else if update == UpdateType::NotUpdated && !flags.any() {
        Action::Unchanged
    } else {
        Action::Updated
    };
    Ok(event(raw, update, kind, flags, action))
}

/// rsync pads attribute columns with `.`, `+`, ` ` and `?`, everything else is a letter.
fn is_attribute_columns(columns: &str) -> bool {
    columns
        .chars()
        .all(|c| c.is_ascii_alphabetic() || matches!(c, '.' | '+' | ' ' | '?'))
}

fn event(
    raw: &str,
    update: UpdateType,
    kind: EntryKind,
    flags: ChangeFlags,
    action: Action,
) -> Option<ChangeEvent> {
    let path = raw.trim_end_matches('/');
    if path.is_empty() || path == "." {
        return None;
    }
    Some(ChangeEvent {
        path: PathBuf::from(path.strip_prefix("./").unwrap_or(path)),
        update,
        kind,
        flags,
        action,
        size: None,
    })
}
