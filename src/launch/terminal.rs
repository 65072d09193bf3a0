//! Terminal discovery for Windows hosts.
//!
//! Paths here are always Windows paths, handled as strings so the probing
//! order can be exercised on any host.

use log::debug;
use std::env;

const DEFAULT_SYSTEM_ROOT: &str = r"C:\Windows";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Bash,
    GitBash,
    PowerShell,
    Cmd,
    /// Unknown executable, driven like bash.
    Custom,
}

impl Dialect {
    /// Classifies an executable path by its (case-insensitive) file name.
    pub fn classify(path: &str) -> Self {
        let lower = path.to_lowercase().replace('/', "\\");
        if lower.contains("git") && lower.ends_with("bash.exe") {
            Dialect::GitBash
        } else if lower.ends_with("bash.exe") {
            Dialect::Bash
        } else if lower.ends_with("powershell.exe") || lower.ends_with("pwsh.exe") {
            Dialect::PowerShell
        } else if lower.ends_with("cmd.exe") {
            Dialect::Cmd
        } else {
            Dialect::Custom
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalInfo {
    pub path: String,
    pub dialect: Dialect,
}

/// The environment variables terminal discovery reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowsEnv {
    pub program_files: Option<String>,
    pub program_files_x86: Option<String>,
    pub program_w6432: Option<String>,
    pub system_root: Option<String>,
    pub comspec: Option<String>,
}

impl WindowsEnv {
    pub fn from_process() -> Self {
        Self {
            program_files: var("ProgramFiles"),
            program_files_x86: var("ProgramFiles(x86)"),
            program_w6432: var("ProgramW6432"),
            system_root: var("SystemRoot"),
            comspec: var("ComSpec").or_else(|| var("COMSPEC")),
        }
    }

    fn system_root(&self) -> &str {
        self.system_root.as_deref().unwrap_or(DEFAULT_SYSTEM_ROOT)
    }

    /// `ComSpec`, or `cmd.exe` under the system root.
    fn command_interpreter(&self) -> String {
        self.comspec
            .clone()
            .unwrap_or_else(|| join(self.system_root(), r"System32\cmd.exe"))
    }
}

fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

/// Every path worth probing, most preferred first, without duplicates.
pub fn candidates(preferred: Option<&str>, env: &WindowsEnv) -> Vec<String> {
    let mut list: Vec<String> = Vec::new();
    let mut push = |path: String| {
        let normalized = normalize(&path);
        let key = normalized.to_lowercase();
        if !list.iter().any(|existing| existing.to_lowercase() == key) {
            list.push(normalized);
        }
    };

    if let Some(preferred) = preferred.map(str::trim).filter(|path| !path.is_empty()) {
        push(preferred.to_string());
    }

    let program_roots = [
        &env.program_files,
        &env.program_files_x86,
        &env.program_w6432,
    ];
    for root in program_roots.into_iter().flatten() {
        push(join(root, r"Git\bin\bash.exe"));
        push(join(root, r"Git\usr\bin\bash.exe"));
        push(join(root, r"Git\git-bash.exe"));
    }

    let system_root = env.system_root();
    push(join(system_root, r"System32\WindowsPowerShell\v1.0\powershell.exe"));
    push(join(system_root, r"System32\WindowsPowerShell\v1.0\pwsh.exe"));
    push(join(system_root, r"System32\cmd.exe"));
    push(env.command_interpreter());

    list
}

/// Picks the first candidate `exists` accepts, falling back to the command
/// interpreter even when it was not found on disk.
pub fn resolve_terminal(
    preferred: Option<&str>,
    env: &WindowsEnv,
    exists: impl Fn(&str) -> bool,
) -> Option<TerminalInfo> {
    let found = candidates(preferred, env).into_iter().find(|candidate| {
        let present = exists(candidate);
        debug!("terminal candidate {} present={}", candidate, present);
        present
    });

    let path = found.unwrap_or_else(|| env.command_interpreter());
    if path.trim().is_empty() {
        return None;
    }
    let dialect = Dialect::classify(&path);
    Some(TerminalInfo { path, dialect })
}

fn join(base: &str, rest: &str) -> String {
    format!("{}\\{}", base, rest)
}

/// Windows-style normalization: `/` becomes `\`, runs of separators collapse,
/// `.` segments drop and `..` pops the previous segment.
pub fn normalize(path: &str) -> String {
    let unified = path.replace('/', "\\");
    let (prefix, rest) = if let Some(rest) = unified.strip_prefix("\\\\") {
        ("\\\\", rest)
    } else if let Some(rest) = unified.strip_prefix('\\') {
        ("\\", rest)
    } else {
        ("", unified.as_str())
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in rest.split('\\') {
        match segment {
            "" | "." => {}
            ".." => {
                // Never pop a drive designator such as `C:`.
                if segments.last().is_some_and(|last| *last != ".." && !last.ends_with(':')) {
                    segments.pop();
                } else if prefix.is_empty() && segments.iter().all(|kept| *kept == "..") {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }
    format!("{}{}", prefix, segments.join("\\"))
}
