use std::{
    ffi::OsStr,
    io::{self, BufRead, BufReader},
    process::{Command, ExitStatus, Stdio},
};

use tracing::debug;

use crate::{
    command::{Invocation, ToolVersion},
    error::Error,
};

fn spawn_error(program: &OsStr, source: io::Error) -> Error {
    Error::Spawn {
        program: program.to_string_lossy().into_owned(),
        source,
    }
}

fn check(status: ExitStatus) -> Result<(), Error> {
    if status.success() {
        Ok(())
    } else {
        Err(status.code().map_or(Error::ToolKilled, Error::ToolFailed))
    }
}

/// Asks the rsync executable for its version.
pub fn version(program: &OsStr) -> Result<ToolVersion, Error> {
    let output = Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .stderr(Stdio::inherit())
        .output()
        .map_err(|e| spawn_error(program, e))?;
    check(output.status)?;
    ToolVersion::parse(&String::from_utf8_lossy(&output.stdout))
}

/// Runs rsync and hands every line of its standard output to `on_line` as it arrives.
/// Standard error goes straight to the user.
pub fn stream(invocation: &Invocation, mut on_line: impl FnMut(&str)) -> Result<(), Error> {
    debug!("running {invocation}");
    let mut child = Command::new(&invocation.program)
        .args(&invocation.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|e| spawn_error(&invocation.program, e))?;
    if let Some(stdout) = child.stdout.take() {
        let mut reader = BufReader::new(stdout);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let read = match reader.read_until(b'\n', &mut buf) {
                Ok(read) => read,
                Err(e) => {
                    // don't leave rsync running without a reader
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(e.into());
                }
            };
            if read == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            on_line(line.trim_end_matches(['\n', '\r']));
        }
    }
    check(child.wait()?)
}

/// Runs rsync and collects its standard output.
pub fn capture(invocation: &Invocation) -> Result<Vec<String>, Error> {
    let mut lines = Vec::new();
    stream(invocation, |line| lines.push(line.to_owned()))?;
    Ok(lines)
}

/// Runs rsync attached to the terminal, so its progress output is shown directly.
pub fn execute(invocation: &Invocation) -> Result<(), Error> {
    debug!("running {invocation}");
    let status = Command::new(&invocation.program)
        .args(&invocation.args)
        .status()
        .map_err(|e| spawn_error(&invocation.program, e))?;
    check(status)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Invocation {
        Invocation {
            program: "sh".into(),
            args: vec!["-c".to_owned(), script.to_owned()],
        }
    }

    #[test]
    fn lines_are_streamed_in_order() {
        let lines = capture(&sh(r"printf '>f+++++++++ a\r\n*deleting   b\nlast'")).unwrap();
        assert_eq!(lines, [">f+++++++++ a", "*deleting   b", "last"]);
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let lines = capture(&sh(r"printf '>f+++++++++ caf\351\n'")).unwrap();
        assert_eq!(lines, [">f+++++++++ caf\u{FFFD}"]);
    }

    #[test]
    fn exit_codes_are_passed_through() {
        assert!(matches!(execute(&sh("exit 23")), Err(Error::ToolFailed(23))));
        assert!(matches!(capture(&sh("echo x; exit 12")), Err(Error::ToolFailed(12))));
        assert!(execute(&sh("exit 0")).is_ok());
    }

    #[test]
    fn missing_program() {
        let inv = Invocation {
            program: "/nonexistent/rsync".into(),
            args: Vec::new(),
        };
        assert!(matches!(execute(&inv), Err(Error::Spawn { .. })));
        assert!(matches!(version(inv.program.as_os_str()), Err(Error::Spawn { .. })));
    }
}
