use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nf_app::Config;

mod commands;

#[derive(Parser)]
#[command(name = "nf")]
#[command(version, about = "NewsFeed client: sign in, post, follow people and read your feed", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Backend base URL (overrides NF_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and sign in
    Register { username: String, password: String },

    /// Sign in and remember the token
    Login { username: String, password: String },

    /// Forget the stored token
    Logout,

    /// Show who is signed in
    Whoami,

    /// Publish a post (up to 200 characters)
    Post { text: String },

    /// Follow a user by id
    Follow { user_id: String },

    /// Stop following a user by id
    Unfollow { user_id: String },

    /// Read your feed, newest first
    Feed {
        /// Number of pages to load
        #[arg(short, long, default_value = "1")]
        pages: u32,

        /// Print posts as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }

    let filter = if cli.verbose {
        "nf=debug".to_string()
    } else {
        config.log_filter.clone()
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_new(&filter).unwrap_or_else(|_| "nf=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let app = commands::App::open(config)?;

    let ok = match cli.command {
        Commands::Register { username, password } => app.register(username, password).await,
        Commands::Login { username, password } => app.login(username, password).await,
        Commands::Logout => app.logout(),
        Commands::Whoami => app.whoami(),
        Commands::Post { text } => app.post(text).await,
        Commands::Follow { user_id } => app.follow(user_id, true).await,
        Commands::Unfollow { user_id } => app.follow(user_id, false).await,
        Commands::Feed { pages, json } => app.feed(pages.max(1), json).await?,
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
