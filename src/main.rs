use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use roomboard::telemetry::{self, LogFormat};

mod cmd;

#[derive(Parser)]
#[command(name = "roomboard")]
#[command(version, about = "Collaborative Kanban rooms: session gate and client")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Where the joined identity is persisted (defaults to the user data directory)
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the session gate
    Serve {
        /// Port to serve on (overrides roomboard.toml)
        #[arg(short, long)]
        port: Option<u16>,

        /// Path to the config file
        #[arg(long, default_value = roomboard::config::DEFAULT_CONFIG_FILE)]
        config: PathBuf,

        /// Enable dev mode (bind all interfaces, permissive CORS)
        #[arg(long)]
        dev: bool,
    },
    /// Join a room through the session gate
    Join {
        /// Room URL, `/room/<slug>` path, or bare slug
        room: String,

        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        /// Room key
        #[arg(long)]
        key: String,

        /// Base URL of the session gate
        #[arg(long, default_value = roomboard::client::gate_client::DEFAULT_GATE_URL)]
        gate: String,
    },
    /// Show the persisted identity
    Whoami,
    /// Forget the persisted identity
    Logout,
    /// View, validate, or initialize configuration
    Config {
        /// Path to the config file
        #[arg(long, default_value = roomboard::config::DEFAULT_CONFIG_FILE)]
        path: PathBuf,

        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default roomboard.toml file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };
    telemetry::init(cli.verbose, format);

    match &cli.command {
        Commands::Serve { port, config, dev } => {
            cmd::cmd_serve(config, *port, *dev).await?;
        }
        Commands::Join {
            room,
            name,
            email,
            key,
            gate,
        } => {
            let store = cmd::open_store(cli.store.as_deref())?;
            cmd::cmd_join(&store, room, name, email, key, gate).await?;
        }
        Commands::Whoami => cmd::cmd_whoami(&cmd::open_store(cli.store.as_deref())?)?,
        Commands::Logout => cmd::cmd_logout(&cmd::open_store(cli.store.as_deref())?)?,
        Commands::Config { path, command } => cmd::cmd_config(path, command.clone())?,
    }

    Ok(())
}
