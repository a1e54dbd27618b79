use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use film_battle::api::{self, AppState, PageOptions};
use film_battle::config::Config;
use film_battle::db::Database;
use film_battle::notion::NotionClient;
use film_battle::render;
use film_battle::session::{leaderboard, BattleSession};
use film_battle::source::{FileSource, ItemSource, RankSink};

#[derive(Parser)]
#[command(name = "battle")]
#[command(about = "Rank films from a Notion database through pairwise battles")]
struct Cli {
    /// Read films from a JSON file instead of Notion
    #[arg(long, global = true)]
    items: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the battle web UI
    Serve {
        /// Port for the web UI
        #[arg(short, long, default_value = "8501")]
        port: u16,

        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
    /// List the battle eligible films
    Items,
    /// Print the current ranking
    Leaderboard,
    /// Discard the saved session
    Reset,
    /// Run battles in the terminal
    Play,
}

/// Initialize tracing with output to stderr (for terminal play) or stdout
fn init_tracing(use_stderr: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "film_battle=debug,tower_http=debug".into()),
    );

    if use_stderr {
        // Play mode: keep stdout for the prompts
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Item source and optional rank sink for the current configuration.
fn collaborators(
    cli_items: Option<PathBuf>,
    config: &Config,
) -> anyhow::Result<(Arc<dyn ItemSource>, Option<Arc<dyn RankSink>>)> {
    if let Some(path) = cli_items {
        if config.sync_ranks {
            tracing::warn!("Rank sync is disabled when reading films from a file");
        }
        let source: Arc<dyn ItemSource> = Arc::new(FileSource::new(path));
        return Ok((source, None));
    }

    let client = Arc::new(NotionClient::from_config(config).context("Notion is not configured")?);
    let sink: Option<Arc<dyn RankSink>> = if config.sync_ranks {
        Some(client.clone() as Arc<dyn RankSink>)
    } else {
        None
    };
    let source: Arc<dyn ItemSource> = client;
    Ok((source, sink))
}

async fn open_session(cli_items: Option<PathBuf>, config: &Config) -> anyhow::Result<BattleSession> {
    let (source, sink) = collaborators(cli_items, config)?;

    let db = Database::open_configured(config.db_path.clone())?;
    db.migrate()?;

    let mut session = BattleSession::new(source).with_store(db);
    if let Some(sink) = sink {
        session = session.with_sink(sink);
    }
    session.load().await;
    Ok(session)
}

async fn serve(session: BattleSession, config: &Config, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(
        session,
        PageOptions {
            title: config.page_title.clone(),
            debug: config.debug,
        },
    );
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;
    tracing::info!("Film Battle listening on http://{}:{}", host, port);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}

async fn play(mut session: BattleSession) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let view = session.view();
        println!("{}", render::render_status(&view));

        let Some(matchup) = view.matchup else {
            print!("{}", render::render_leaderboard(&view.leaderboard));
            return Ok(());
        };

        println!("Which do you prefer? (1/2, r to reset, q to quit)");
        print!("{}", render::render_matchup(&matchup));

        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };
        match line.trim() {
            "1" => {
                session.choose(true).await?;
            }
            "2" => {
                session.choose(false).await?;
            }
            "r" => session.reset().await,
            "q" => return Ok(()),
            other => println!("Unrecognised choice: {:?}", other),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let use_stderr = matches!(cli.command, Some(Commands::Play));
    init_tracing(use_stderr);

    let config = Config::from_env();

    match cli.command {
        Some(Commands::Serve { port, host }) => {
            let session = open_session(cli.items, &config).await?;
            serve(session, &config, &host, port).await?;
        }
        Some(Commands::Items) => {
            let (source, _) = collaborators(cli.items, &config)?;
            let items = source.fetch_items().await?;
            if items.is_empty() {
                println!("No battle eligible films found.");
            }
            for item in items {
                match item.image {
                    Some(image) => println!("{}  {}  ({})", item.id, item.title, image),
                    None => println!("{}  {}", item.id, item.title),
                }
            }
        }
        Some(Commands::Leaderboard) => {
            let db = Database::open_configured(config.db_path.clone())?;
            db.migrate()?;
            match db.load_latest()? {
                Some(snapshot) => {
                    let entries = leaderboard(snapshot.state.ranked_order());
                    print!("{}", render::render_leaderboard(&entries));
                    println!(
                        "{} battles, {} films still to place",
                        snapshot.state.comparisons(),
                        snapshot.state.remaining()
                    );
                }
                None => println!("No saved session."),
            }
        }
        Some(Commands::Reset) => {
            let db = Database::open_configured(config.db_path.clone())?;
            db.migrate()?;
            let removed = db.clear_snapshots()?;
            println!("Removed {} saved session(s).", removed);
        }
        Some(Commands::Play) => {
            let session = open_session(cli.items, &config).await?;
            play(session).await?;
        }
        None => {
            let session = open_session(cli.items, &config).await?;
            serve(session, &config, "127.0.0.1", 8501).await?;
        }
    }

    Ok(())
}
