use crate::config::LaunchConfig;
use crate::model::ServerProfile;
use crossterm::style::{Color, Stylize};
use std::io::IsTerminal;

pub fn print_servers(profiles: &[ServerProfile]) {
    if profiles.is_empty() {
        println!("No servers found.");
        return;
    }

    let use_color = std::io::stdout().is_terminal();
    println!(
        "{}\t{}\t{}\t{}\t{}",
        colorize("ID", Color::DarkYellow, use_color),
        colorize("NAME", Color::DarkYellow, use_color),
        colorize("TARGET", Color::DarkYellow, use_color),
        colorize("PORT", Color::DarkYellow, use_color),
        colorize("KEY", Color::DarkYellow, use_color)
    );
    for profile in profiles {
        println!(
            "{}\t{}\t{}\t{}\t{}",
            profile.id,
            colorize(profile.name.as_deref().unwrap_or("-"), Color::DarkCyan, use_color),
            colorize(&profile.target(), Color::DarkGreen, use_color),
            colorize(&profile.effective_port().to_string(), Color::DarkMagenta, use_color),
            colorize(profile.key_path().unwrap_or("-"), Color::DarkBlue, use_color)
        );
    }
}

pub fn print_config(config: &LaunchConfig) {
    println!(
        "terminal: {}",
        config.terminal().unwrap_or("(auto-detect on Windows, none elsewhere)")
    );
}

fn colorize(text: &str, color: Color, enabled: bool) -> String {
    if enabled {
        format!("{}", text.with(color))
    } else {
        text.to_string()
    }
}
