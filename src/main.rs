use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use htaccess_editor::{api, app::AppState, config::EditorConfig, db, models::DownloadMethod};

#[derive(Parser)]
#[command(name = "htaccess-editor")]
#[command(about = "Edit the access rules protecting downloadable files")]
struct Cli {
    /// Directory holding the protected downloads
    #[arg(long, global = true)]
    protected_dir: Option<PathBuf>,

    /// Download method: direct or redirect
    #[arg(long, global = true)]
    method: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the editor server
    Serve {
        /// Port for the HTTP server
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
    /// Print the rules shown in the editor
    Show,
    /// Print the rules in effect
    Rules,
    /// Rewrite the protection files
    Regenerate,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG")
            .unwrap_or_else(|_| "htaccess_editor=debug,tower_http=debug".into()),
    );

    // Logs go to stderr so printed rules can be piped
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn serve(state: AppState, port: u16) -> anyhow::Result<()> {
    tracing::info!("Starting htaccess editor on port {}", port);

    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!(
        "htaccess editor listening on http://127.0.0.1:{}{}",
        port,
        api::EDITOR_PATH
    );

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = EditorConfig::from_env()?;
    if let Some(dir) = cli.protected_dir {
        config.protected_dir = dir;
    }
    if let Some(method) = cli.method.as_deref() {
        config.method = DownloadMethod::parse(method);
    }

    let db = db::Database::open_default()?;
    db.migrate()?;

    let state = AppState::wire(&config, Arc::new(db.settings(db::DEFAULT_NAMESPACE)));

    match cli.command {
        Some(Commands::Serve { port }) => serve(state, port).await?,
        Some(Commands::Show) => println!("{}", state.editor.display_content()?),
        Some(Commands::Rules) => println!("{}", state.pipeline.rules(config.method)),
        Some(Commands::Regenerate) => {
            state.editor.regenerate(true)?;
            println!(
                "Protection files written to {}",
                config.protected_dir.display()
            );
        }
        None => serve(state, 3000).await?,
    }

    Ok(())
}
