use std::path::PathBuf;

use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use sporlsync::{cli, config, error};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Store Spotify client id and secret
    Setup,

    /// Authorize with Spotify API
    Auth,

    /// Print a valid access token
    Token,

    /// Show the state of the stored token
    Status,

    /// Forget the stored token
    Logout,

    /// Compare a playlist with the local music folder
    Sync(SyncOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct SyncOptions {
    /// Playlist id, spotify:playlist URI or open.spotify.com link
    #[clap(long)]
    playlist: String,

    /// Music folder (defaults to ~/Music or SPORLSYNC_MUSIC_DIR)
    #[clap(long)]
    dir: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    let auth_config = || match config::AuthConfig::from_env() {
        Ok(c) => c,
        Err(e) => error!("Invalid configuration. Err: {}", e),
    };

    match cli.command {
        Command::Setup => cli::setup().await,
        Command::Auth => cli::auth(auth_config()).await,
        Command::Token => cli::token(auth_config()).await,
        Command::Status => cli::status(auth_config()).await,
        Command::Logout => cli::logout().await,
        Command::Sync(opt) => cli::sync(auth_config(), opt.playlist, opt.dir).await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
