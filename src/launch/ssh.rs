use crate::model::ServerProfile;

pub const SSH_PROGRAM: &str = "ssh";

const MAX_TITLE_CHARS: usize = 60;
const DEFAULT_TITLE: &str = "SSH Session";

/// Builds the `ssh` argument vector for a profile.
///
/// Returns `None` when the profile has no host or no user. The target is
/// `user@host` as one token.
pub fn build_ssh_args(profile: &ServerProfile) -> Option<Vec<String>> {
    if profile.host.is_empty() || profile.user.is_empty() {
        return None;
    }

    let mut args = vec![SSH_PROGRAM.to_string()];
    if let Some(key) = profile.key_path() {
        args.push("-i".to_string());
        args.push(key.to_string());
    }
    args.push("-p".to_string());
    args.push(profile.effective_port().to_string());
    args.push(profile.target());
    Some(args)
}

/// Window title for a session: quotes, line breaks and cmd metacharacters
/// removed, capped at 60 characters.
pub fn session_title(profile: &ServerProfile) -> String {
    sanitize_title(&format!("SSH to {}", profile.target()))
}

fn sanitize_title(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|ch| !matches!(ch, '\r' | '\n' | '"' | '\'' | '&' | '|' | '<' | '>' | '^' | '%'))
        .collect();
    let title: String = cleaned.trim().chars().take(MAX_TITLE_CHARS).collect();
    if title.is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        title
    }
}
