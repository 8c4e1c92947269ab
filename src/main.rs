//! Main entry point for Cadmium.
//!
//! `profile`, `servers` and `channels` print and exit. `chat` resolves a
//! channel address, takes over the terminal and runs the chat view until the
//! user quits, restoring the terminal on both normal exit and panic.

use std::path::PathBuf;

use anyhow::{Context as _, Result, bail};
use clap::{Parser, Subcommand};

use cadmium::api::directory::{self, ChannelAddress, Scope};
use cadmium::api::{Channel, HttpBackend};
use cadmium::config::{self, Config, TOKEN_ENV};
use cadmium::utils::context::Context;
use cadmium::utils::logger;
use cadmium::{App, ChatSession, MessageCache, SystemLinks};

#[derive(Parser, Debug)]
#[command(name = "cadmium", version, about = "Terminal chat client")]
struct Cli {
    /// Path to the config file (default: ~/.cadmium/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log every API request at debug level
    #[arg(long, global = true)]
    debug_api: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the logged-in account's profile
    Profile,
    /// List joined servers
    Servers,
    /// List the channels of a server, or `d` for direct messages
    Channels {
        server: String,
    },
    /// Open a channel, addressed as `server:n` or `d:n`
    Chat {
        address: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging before anything else
    logger::init_logging(&config::data_dir().join("logs"), cli.debug_api);

    let config_path = cli.config.unwrap_or_else(config::default_config_path);
    let config = config::load(&config_path)?.with_token_override(std::env::var(TOKEN_ENV).ok());
    let Some(token) = config.token.clone() else {
        bail!(
            "no token configured: set `token` in {} or export {}",
            config_path.display(),
            TOKEN_ENV
        );
    };
    let backend = HttpBackend::new(config.api_base.clone(), token, config.request_timeout())?;

    match cli.command {
        Command::Profile => show_profile(&backend).await,
        Command::Servers => list_servers(&backend).await,
        Command::Channels { server } => list_channels(&backend, server.parse()?).await,
        Command::Chat { address } => chat(backend, &config, address.parse()?).await,
    }
}

async fn show_profile(backend: &HttpBackend) -> Result<()> {
    let me = backend.current_user().await.context("Failed to fetch account")?;
    let profile = backend.profile(&me.id).await.context("Failed to fetch profile")?;
    println!("{}", profile.summary());
    Ok(())
}

async fn list_servers(backend: &HttpBackend) -> Result<()> {
    let guilds = backend.guilds().await.context("Failed to list servers")?;
    println!("  id  name");
    println!("   d  direct messages");
    for (k, guild) in guilds.iter().enumerate() {
        println!(" {:>3}  {}", k + 1, guild.name);
    }
    Ok(())
}

async fn list_channels(backend: &HttpBackend, scope: Scope) -> Result<()> {
    for (k, channel) in channels_in(backend, scope).await?.iter().enumerate() {
        println!("{}", directory::describe_channel(scope, k + 1, channel));
    }
    Ok(())
}

/// The sorted channel list an address with this scope indexes into.
async fn channels_in(backend: &HttpBackend, scope: Scope) -> Result<Vec<Channel>> {
    match scope {
        Scope::Direct => {
            let channels = backend.direct_channels().await.context("Failed to list direct messages")?;
            Ok(directory::sort_direct_channels(channels))
        }
        Scope::Server(n) => {
            let guilds = backend.guilds().await.context("Failed to list servers")?;
            let guild = guilds.get(n - 1).with_context(|| format!("no server {n}"))?;
            let channels = backend
                .guild_channels(&guild.id)
                .await
                .with_context(|| format!("Failed to list channels of {}", guild.name))?;
            Ok(directory::sort_guild_channels(channels))
        }
    }
}

async fn chat(backend: HttpBackend, config: &Config, address: ChannelAddress) -> Result<()> {
    let channels = channels_in(&backend, address.scope).await?;
    let channel = directory::pick_channel(&channels, address)?.clone();
    tracing::info!(channel = %channel.id, label = %channel.label(), "opening chat");

    let cache = MessageCache::new(config.history_step, config.refresh_frames);
    let session = ChatSession::new(channel, backend, SystemLinks::new(), cache, config.keys.clone());

    let mut terminal = ratatui::init();

    // Context guard ensures cleanup on both normal exit and panic
    let _ctx = Context::with(ratatui::restore);

    let mut app = App::new(session, config.tick());
    app.run(&mut terminal).await
}
