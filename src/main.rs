mod commands;
mod config;
mod export;
mod logging;
mod netease_rs;
mod ports;
mod reconcile;
mod services;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::{Result, eyre::Context};

use crate::{
    config::Config, logging::setup_logging, ports::playlist::PlaylistId, reconcile::MatchMode,
    services::playlist_loader::PlaylistRef,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The config file to use
    #[arg(short, long, env = "PLAYLIST_RECONCILE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Console log level (default: warn)
    #[arg(long, default_value = "warn", global = true, env = "LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// File log level (default: debug)
    #[arg(long, default_value = "debug", global = true)]
    log_file_level: log::LevelFilter,

    /// Path to log file
    #[arg(long, env = "PLAYLIST_RECONCILE_LOG_FILE", global = true)]
    log_file: Option<PathBuf>,

    /// Always fetch from the API, ignoring cached playlists
    #[arg(long, global = true)]
    no_cache: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Download a playlist and save it as playlist_<name>.csv
    Fetch {
        /// Playlist id or share link
        playlist: PlaylistId,
    },
    /// Find tracks that are versions of the same song within one playlist
    Check {
        /// Playlist id, share link or exported CSV file
        playlist: PlaylistRef,

        /// Also write the result to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Tracks present in every playlist (fuzzy mode compares exactly two)
    Intersect {
        /// Playlist ids, share links or exported CSV files
        #[arg(required = true, num_args = 2..)]
        playlists: Vec<PlaylistRef>,

        #[arg(short, long, value_enum, default_value_t = MatchMode::Fuzzy)]
        mode: MatchMode,

        /// Also write the result to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Tracks of the first playlist that are missing from the second
    Diff {
        /// Playlist to keep tracks from
        keep: PlaylistRef,

        /// Playlist whose tracks are removed
        remove: PlaylistRef,

        #[arg(short, long, value_enum, default_value_t = MatchMode::Fuzzy)]
        mode: MatchMode,

        /// Also write the result to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Merge playlists, keeping the first occurrence of each song
    Union {
        /// Playlist ids, share links or exported CSV files
        #[arg(required = true, num_args = 2..)]
        playlists: Vec<PlaylistRef>,

        #[arg(short, long, value_enum, default_value_t = MatchMode::Fuzzy)]
        mode: MatchMode,

        /// Also write the result to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Create a default config file, if it doesn't exist
    CreateDefault,
    /// Print the path to the config file
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    setup_logging(args.log_level, args.log_file.clone(), args.log_file_level)?;

    log::debug!("Playlist reconcile starting");
    log::debug!("Loading configuration");

    let config = {
        if let Some(config) = args.config {
            Config::from_file(&config)
        } else {
            Config::load()
        }
    }
    .with_context(|| "Failed to load playlist-reconcile config")?;

    let no_cache = args.no_cache;
    let source = || commands::build_source(&config, no_cache);

    match args.command {
        Commands::Fetch { playlist } => {
            log::debug!("Starting fetch command for playlist {}", playlist);
            commands::fetch(source()?.as_ref(), &config, &playlist).await?;
        }
        Commands::Check { playlist, output } => {
            log::debug!("Starting check command for {:?}", playlist);
            commands::check(source()?.as_ref(), &playlist, output.as_deref()).await?;
        }
        Commands::Intersect {
            playlists,
            mode,
            output,
        } => {
            log::debug!("Starting {} intersect command for {:?}", mode, playlists);
            commands::intersect(source()?.as_ref(), &playlists, mode, output.as_deref()).await?;
        }
        Commands::Diff {
            keep,
            remove,
            mode,
            output,
        } => {
            log::debug!("Starting {} diff command: {:?} - {:?}", mode, keep, remove);
            commands::diff(source()?.as_ref(), &keep, &remove, mode, output.as_deref()).await?;
        }
        Commands::Union {
            playlists,
            mode,
            output,
        } => {
            log::debug!("Starting {} union command for {:?}", mode, playlists);
            commands::union(source()?.as_ref(), &playlists, mode, output.as_deref()).await?;
        }
        Commands::Config(config_commands) => match config_commands {
            ConfigCommands::CreateDefault => {
                log::debug!("Creating default config");
                let path = Config::create_default()?;
                println!("{}", path.display());
                log::info!("Default config created successfully");
            }
            ConfigCommands::Path => match Config::config_path() {
                Some(path) => println!("{}", path.display()),
                None => println!("No default config path found"),
            },
        },
    }
    log::info!("Command completed successfully");

    Ok(())
}
