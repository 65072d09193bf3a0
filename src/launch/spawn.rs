use crate::launch::quote::join_posix;
use std::fmt;
use std::io;
use std::process::{Command, Stdio};

/// A fully planned process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnRequest {
    pub program: String,
    pub args: Vec<String>,
    /// Arguments are already quoted for the Windows command line and must be
    /// passed through untouched.
    pub verbatim: bool,
}

impl SpawnRequest {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            verbatim: false,
        }
    }

    pub fn verbatim(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            verbatim: true,
            ..Self::new(program, args)
        }
    }
}

impl fmt::Display for SpawnRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.verbatim {
            write!(f, "{} {}", self.program, self.args.join(" "))
        } else {
            let mut line = vec![self.program.as_str()];
            line.extend(self.args.iter().map(String::as_str));
            f.write_str(&join_posix(&line))
        }
    }
}

pub trait Spawner {
    /// Starts the process without waiting for it and returns its pid.
    fn spawn(&self, request: &SpawnRequest) -> io::Result<u32>;
}

/// Starts children detached: stdio is nulled, the child gets its own process
/// group and the handle is dropped unwaited.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedSpawner;

impl Spawner for DetachedSpawner {
    fn spawn(&self, request: &SpawnRequest) -> io::Result<u32> {
        let mut command = Command::new(&request.program);
        add_args(&mut command, request);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        detach(&mut command);

        let child = command.spawn()?;
        Ok(child.id())
    }
}

#[cfg(windows)]
fn add_args(command: &mut Command, request: &SpawnRequest) {
    use std::os::windows::process::CommandExt;

    if request.verbatim {
        for arg in &request.args {
            command.raw_arg(arg);
        }
    } else {
        command.args(&request.args);
    }
}

#[cfg(not(windows))]
fn add_args(command: &mut Command, request: &SpawnRequest) {
    command.args(&request.args);
}

#[cfg(windows)]
fn detach(command: &mut Command) {
    use std::os::windows::process::CommandExt;

    const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    // `start` opens the visible window; the intermediate cmd stays hidden.
    command.creation_flags(CREATE_NEW_PROCESS_GROUP | CREATE_NO_WINDOW);
}

#[cfg(unix)]
fn detach(command: &mut Command) {
    use std::os::unix::process::CommandExt;

    command.process_group(0);
}

#[cfg(not(any(unix, windows)))]
fn detach(_command: &mut Command) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_quotes_plain_requests() {
        let request = SpawnRequest::new(
            "xterm",
            vec!["--".into(), "bash".into(), "-c".into(), "ssh -p 22 u@h; exec bash".into()],
        );
        assert_eq!(request.to_string(), "xterm -- bash -c 'ssh -p 22 u@h; exec bash'");
    }

    #[test]
    fn display_keeps_verbatim_arguments() {
        let request =
            SpawnRequest::verbatim("cmd.exe", vec!["/c".into(), "start".into(), r#""""#.into()]);
        assert_eq!(request.to_string(), r#"cmd.exe /c start """#);
    }

    #[cfg(unix)]
    #[test]
    fn detached_spawner_returns_a_pid() {
        let pid = DetachedSpawner
            .spawn(&SpawnRequest::new("true", Vec::new()))
            .expect("spawn true");
        assert!(pid > 0);
    }

    #[test]
    fn detached_spawner_reports_missing_program() {
        let request = SpawnRequest::new("zapcon-definitely-missing-terminal", Vec::new());
        assert!(DetachedSpawner.spawn(&request).is_err());
    }
}
