mod output;

use crate::config::{load_launch_config, save_launch_config};
use crate::launch::Launcher;
use crate::model::{PortValue, ServerProfile};
use crate::store::{DataPaths, ProfilePatch, ProfileStore, Selector, resolve_data_paths};
use anyhow::{Result, anyhow, bail};
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use std::io;
use std::path::PathBuf;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_COMMIT_HASH"),
    ")"
);

#[derive(Parser)]
#[command(
    name = "zapcon",
    version,
    long_version = LONG_VERSION,
    about = "Open SSH sessions to saved servers in a new terminal window"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Directory holding servers.json, config.json and staged keys
    #[arg(long, global = true, env = "ZAPCON_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    Add(AddArgs),
    List,
    Update(UpdateArgs),
    Remove(SelectArgs),
    Connect(ConnectArgs),
    Config(ConfigArgs),
    Completions(CompletionsArgs),
}

#[derive(Args)]
struct AddArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    host: String,
    #[arg(long)]
    user: String,
    #[arg(long, default_value_t = 22, value_parser = clap::value_parser!(u16).range(1..))]
    port: u16,
    #[arg(long, value_name = "PATH")]
    key: Option<String>,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct SelectArgs {
    #[arg(long)]
    id: Option<u64>,
    #[arg(long)]
    name: Option<String>,
}

impl SelectArgs {
    fn selector(self) -> Result<Selector> {
        match (self.id, self.name) {
            (Some(id), _) => Ok(Selector::Id(id)),
            (None, Some(name)) => Ok(Selector::Name(name)),
            (None, None) => Err(anyhow!("pass --id or --name")),
        }
    }
}

#[derive(Args)]
struct UpdateArgs {
    #[command(flatten)]
    select: SelectArgs,
    /// New display name; an empty value removes it
    #[arg(long, value_name = "NAME")]
    rename: Option<String>,
    #[arg(long)]
    host: Option<String>,
    #[arg(long)]
    user: Option<String>,
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    port: Option<u16>,
    /// Private key path; an empty value removes it
    #[arg(long, value_name = "PATH")]
    key: Option<String>,
}

#[derive(Args)]
struct ConnectArgs {
    #[command(flatten)]
    select: SelectArgs,
    /// Print the terminal invocation instead of running it
    #[arg(long)]
    dry_run: bool,
}

#[derive(Args)]
struct ConfigArgs {
    /// Terminal executable to open sessions with
    #[arg(long, value_name = "PATH", conflicts_with = "clear_terminal")]
    terminal: Option<String>,
    /// Go back to automatic terminal detection
    #[arg(long)]
    clear_terminal: bool,
}

#[derive(Args)]
struct CompletionsArgs {
    #[arg(value_enum)]
    shell: Shell,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Completions(args) = &cli.command {
        generate_completions(args.shell);
        return Ok(());
    }

    let paths = resolve_data_paths(cli.data_dir)?;
    let store = ProfileStore::new(paths.servers());

    match cli.command {
        Commands::Add(args) => add_server(&store, args),
        Commands::List => list_servers(&store),
        Commands::Update(args) => update_server(&store, args),
        Commands::Remove(args) => remove_server(&store, args),
        Commands::Connect(args) => connect(&store, &paths, args),
        Commands::Config(args) => configure(&paths, args),
        Commands::Completions(_) => unreachable!(),
    }
}

fn add_server(store: &ProfileStore, args: AddArgs) -> Result<()> {
    let profile = ServerProfile {
        id: 0,
        name: args
            .name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty()),
        host: args.host.trim().to_string(),
        user: args.user.trim().to_string(),
        port: Some(PortValue::from(args.port)),
        key: args
            .key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty()),
    };
    if profile.host.is_empty() || profile.user.is_empty() {
        bail!("host and user must not be empty");
    }
    let profile = store.add(profile)?;
    println!("Added server {}: {}", profile.id, profile.label());
    Ok(())
}

fn list_servers(store: &ProfileStore) -> Result<()> {
    let profiles = store.list()?;
    output::print_servers(&profiles);
    Ok(())
}

fn update_server(store: &ProfileStore, args: UpdateArgs) -> Result<()> {
    let trimmed = |value: Option<String>| value.map(|value| value.trim().to_string());
    let patch = ProfilePatch {
        name: trimmed(args.rename),
        host: trimmed(args.host),
        user: trimmed(args.user),
        port: args.port,
        key: trimmed(args.key),
    };
    let profile = store.update(&args.select.selector()?, patch)?;
    println!("Updated server {}: {}", profile.id, profile.label());
    Ok(())
}

fn remove_server(store: &ProfileStore, args: SelectArgs) -> Result<()> {
    let selector = args.selector()?;
    store.remove(&selector)?;
    println!("Removed {}", selector);
    Ok(())
}

fn connect(store: &ProfileStore, paths: &DataPaths, args: ConnectArgs) -> Result<()> {
    let profile = store.get(&args.select.selector()?)?;
    let config = load_launch_config(&paths.config());
    let launcher = Launcher::for_host(&paths.keys());

    if args.dry_run {
        let request = launcher.plan(&profile, &config)?;
        println!("{}", request);
        return Ok(());
    }
    if !launcher.connect(&profile, &config) {
        bail!("could not connect to {}", profile.label());
    }
    println!("Opened a terminal for {}", profile.label());
    Ok(())
}

fn configure(paths: &DataPaths, args: ConfigArgs) -> Result<()> {
    let path = paths.config();
    let mut config = load_launch_config(&path);

    if args.clear_terminal {
        config.terminal_path = None;
        save_launch_config(&path, &config)?;
    } else if let Some(terminal) = args.terminal {
        config.terminal_path = Some(terminal.trim().to_string());
        save_launch_config(&path, &config)?;
    }

    output::print_config(&config);
    Ok(())
}

fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "zapcon", &mut io::stdout());
}
