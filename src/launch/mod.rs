//! Opens an interactive SSH session in a new terminal window.
//!
//! A launch is one-shot: validate the profile, (on Windows) stage the key and
//! pick a terminal, render the command line, spawn detached. Any failure
//! ends the attempt; nothing is retried and the spawned session is never
//! supervised.

mod keys;
mod quote;
mod spawn;
mod ssh;
mod terminal;

use crate::config::LaunchConfig;
use crate::model::ServerProfile;
use keys::KeyStager;
use log::{debug, error, info};
use spawn::{DetachedSpawner, SpawnRequest, Spawner};
use std::io;
use std::path::Path;
use terminal::{Dialect, TerminalInfo, WindowsEnv};

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("server profile needs both a host and a user")]
    InvalidProfile,
    #[error("no terminal application could be resolved")]
    TerminalUnresolvable,
    #[error("no terminal application configured for this platform")]
    NoTerminalConfigured,
    #[error("failed to start terminal: {0}")]
    Spawn(#[source] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    OtherPosix,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::OtherPosix
        }
    }
}

type Probe = Box<dyn Fn(&str) -> bool + Send + Sync>;

pub struct Launcher<S = DetachedSpawner> {
    platform: Platform,
    keys: KeyStager,
    windows_env: WindowsEnv,
    probe: Probe,
    spawner: S,
}

impl Launcher<DetachedSpawner> {
    /// Launcher for the running host, staging keys under `keys_dir`.
    pub fn for_host(keys_dir: &Path) -> Self {
        Launcher::new(
            Platform::current(),
            KeyStager::new(keys_dir.to_path_buf()),
            DetachedSpawner,
        )
    }
}

impl<S: Spawner> Launcher<S> {
    pub fn new(platform: Platform, keys: KeyStager, spawner: S) -> Self {
        Self {
            platform,
            keys,
            windows_env: WindowsEnv::from_process(),
            probe: Box::new(|path: &str| Path::new(path).is_file()),
            spawner,
        }
    }

    /// Launches a session, reporting only whether the terminal was started.
    pub fn connect(&self, profile: &ServerProfile, config: &LaunchConfig) -> bool {
        match self.launch(profile, config) {
            Ok(pid) => {
                info!("opened session to {} (pid {})", profile.target(), pid);
                true
            }
            Err(err) => {
                error!("could not connect to {}: {}", profile.label(), err);
                false
            }
        }
    }

    pub fn launch(
        &self,
        profile: &ServerProfile,
        config: &LaunchConfig,
    ) -> Result<u32, LaunchError> {
        let request = self.plan(profile, config)?;
        debug!("spawning {}", request);
        self.spawner.spawn(&request).map_err(LaunchError::Spawn)
    }

    /// Works out what would be spawned without spawning it.
    pub fn plan(
        &self,
        profile: &ServerProfile,
        config: &LaunchConfig,
    ) -> Result<SpawnRequest, LaunchError> {
        match self.platform {
            Platform::Windows => self.plan_windows(profile, config),
            Platform::MacOs => plan_macos(profile),
            Platform::OtherPosix => plan_other_posix(profile, config),
        }
    }

    fn plan_windows(
        &self,
        profile: &ServerProfile,
        config: &LaunchConfig,
    ) -> Result<SpawnRequest, LaunchError> {
        if ssh::build_ssh_args(profile).is_none() {
            return Err(LaunchError::InvalidProfile);
        }

        let mut staged = profile.clone();
        if let Some(key) = profile.key_path() {
            staged.key = Some(self.keys.stage(key));
        }
        let ssh_args = ssh::build_ssh_args(&staged).ok_or(LaunchError::InvalidProfile)?;

        let terminal = terminal::resolve_terminal(
            config.terminal(),
            &self.windows_env,
            |path| (self.probe)(path),
        )
        .ok_or(LaunchError::TerminalUnresolvable)?;
        debug!("using terminal {} ({:?})", terminal.path, terminal.dialect);

        let mut args = vec![
            "/c".to_string(),
            "start".to_string(),
            quote::quote_windows(""),
            quote::quote_windows(&terminal.path),
        ];
        args.extend(windows_terminal_args(&terminal, &staged, &ssh_args));
        // The outer `cmd /c` scans the whole line before `start` sees it.
        let args = args
            .iter()
            .map(|arg| quote::escape_cmd_operators(arg))
            .collect();
        Ok(SpawnRequest::verbatim("cmd.exe", args))
    }
}

/// Command-line fragments handed to the resolved terminal so it runs `ssh`
/// and stays open, already quoted for that terminal.
fn windows_terminal_args(
    terminal: &TerminalInfo,
    profile: &ServerProfile,
    ssh_args: &[String],
) -> Vec<String> {
    match terminal.dialect {
        Dialect::Bash | Dialect::GitBash | Dialect::Custom => login_shell_args(ssh_args)
            .iter()
            .map(|arg| quote::quote_windows(arg))
            .collect(),
        Dialect::PowerShell => {
            let banner = format!("Connecting to {}...", profile.target());
            let command = format!(
                "Write-Host {}; {}",
                quote::quote_powershell(&banner),
                quote::join_powershell(ssh_args)
            );
            vec![
                "-NoExit".to_string(),
                "-Command".to_string(),
                quote::quote_windows(&command),
            ]
        }
        // `cmd /k` drops the first and last quote of its argument and runs
        // what is left, so the inner quotes must stay as they are.
        Dialect::Cmd => vec![
            "/k".to_string(),
            format!(
                "\"title {} && {}\"",
                ssh::session_title(profile),
                quote::join_windows(ssh_args)
            ),
        ],
    }
}

fn login_shell_args(ssh_args: &[String]) -> Vec<String> {
    vec![
        "--login".to_string(),
        "-i".to_string(),
        "-c".to_string(),
        keep_open(ssh_args),
    ]
}

/// `ssh ...; exec bash` so the window survives the session ending.
fn keep_open(ssh_args: &[String]) -> String {
    format!("{}; exec bash", quote::join_posix(ssh_args))
}

fn plan_macos(profile: &ServerProfile) -> Result<SpawnRequest, LaunchError> {
    let ssh_args = ssh::build_ssh_args(profile).ok_or(LaunchError::InvalidProfile)?;
    let command = quote::escape_applescript(&quote::join_posix(&ssh_args));
    Ok(SpawnRequest::new(
        "osascript",
        vec![
            "-e".to_string(),
            format!("tell application \"Terminal\" to do script \"{}\"", command),
        ],
    ))
}

fn plan_other_posix(
    profile: &ServerProfile,
    config: &LaunchConfig,
) -> Result<SpawnRequest, LaunchError> {
    let ssh_args = ssh::build_ssh_args(profile).ok_or(LaunchError::InvalidProfile)?;
    let terminal = config.terminal().ok_or(LaunchError::NoTerminalConfigured)?;
    Ok(SpawnRequest::new(
        terminal,
        vec![
            "--".to_string(),
            "bash".to_string(),
            "-c".to_string(),
            keep_open(&ssh_args),
        ],
    ))
}
