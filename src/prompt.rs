use std::{
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
};

use crate::{config::SyncMode, report::Report};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    /// continue in the current mode
    Continue,
    /// continue, but in another mode
    Switch(SyncMode),
    Abort,
}

/// The `--ask` menu. Listings can be shown any number of times until the user decides.
/// Reaching the end of `input` aborts.
pub fn ask(
    report: &Report,
    mode: SyncMode,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> io::Result<Choice> {
    loop {
        write!(
            out,
            "Options:\n  show (a)dded ({}), (c)hanged ({}), (r)emoved ({}), (m)oved files ({})\n  show (A)dded ({}:{}), (M)oved ({}) folders:files\n  only (add), (sync), (update), (delete)\n  or continue to {mode} via (y)\n  exit via <Enter> or (x)\n  => ",
            report.added.len(),
            report.modified.len(),
            report.removed.len(),
            report.moved_files(),
            report.new_dirs.len(),
            report.new_dir_files(),
            report.moved_dirs.len(),
        )?;
        out.flush()?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(Choice::Abort);
        }
        let selection = line.trim();
        match selection {
            "a" => list(out, "  ", report.added.iter())?,
            "t" => {
                let mut by_type = report.added.iter().collect::<Vec<_>>();
                by_type.sort_by_key(|p| (extension(p), *p));
                list(out, "  ", by_type.into_iter())?
            }
            "c" => {
                for p in &report.modified {
                    let marker = if report.attributes_only.contains(p) { '.' } else { '>' };
                    writeln!(out, "  {marker} {}", p.display())?;
                }
            }
            "r" => list(out, "  ", report.removed.iter())?,
            "m" => {
                for m in &report.moved {
                    writeln!(
                        out,
                        "  {} -> {} ({:.2})",
                        m.deleted.display(),
                        m.created.display(),
                        m.score
                    )?;
                }
            }
            "M" => {
                for (from, to) in &report.moved_dirs {
                    let to = to
                        .iter()
                        .map(|d| d.display().to_string())
                        .collect::<Vec<_>>()
                        .join(", ");
                    writeln!(out, "  {} -> {to}", from.display())?;
                }
            }
            "A" => {
                for (dir, files) in &report.new_dirs {
                    writeln!(out, "DIR {} ({} files)", dir.display(), files.len())?;
                    list(out, "    ", files.iter())?;
                }
            }
            "y" => return Ok(Choice::Continue),
            s if s.starts_with("add") => return Ok(Choice::Switch(SyncMode::Add)),
            s if s.starts_with("sync") => return Ok(Choice::Switch(SyncMode::Sync)),
            s if s.starts_with("up") => return Ok(Choice::Switch(SyncMode::Update)),
            s if s.starts_with("del") || s.starts_with("rem") => {
                return Ok(Choice::Switch(SyncMode::Delete));
            }
            _ => return Ok(Choice::Abort),
        }
    }
}

fn list<'a>(
    out: &mut impl Write,
    indent: &str,
    paths: impl Iterator<Item = &'a PathBuf>,
) -> io::Result<()> {
    for p in paths {
        writeln!(out, "{indent}{}", p.display())?;
    }
    Ok(())
}

fn extension(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}
