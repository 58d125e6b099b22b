use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use interview_agent::speech::StdinEntry;
use interview_agent::{
    create_router, AppState, Collaborators, Config, FeedbackFactory, FollowupFactory,
    InterviewSession, SessionConfig, SpeechFactory,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "interview-agent", version, about = "Voice interview agent")]
struct Cli {
    /// Config file (extension optional)
    #[arg(short, long, default_value = "config/interview-agent")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one interview in this terminal
    Run {
        /// Session description (JSON: user, questions, interviewId, ...)
        #[arg(short, long)]
        interview: PathBuf,
    },
    /// Serve the HTTP API for remote clients
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Run { interview } => run_interview(cfg, &interview).await,
        Command::Serve => serve(cfg).await,
    }
}

async fn run_interview(cfg: Config, path: &Path) -> Result<()> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read interview file {}", path.display()))?;
    let mut session_config: SessionConfig =
        serde_json::from_str(&raw).context("Invalid interview file")?;
    let timings = cfg.timings();
    session_config.timings = timings;

    let collaborators = Collaborators {
        synthesizer: SpeechFactory::synthesizer(&cfg.speech)?,
        recognizer: SpeechFactory::recognizer(&cfg.speech)?,
        manual_entry: Arc::new(StdinEntry::new(cfg.manual_entry_timeout())),
        followup: FollowupFactory::create(&cfg.followup, timings.followup_timeout)?,
        finalizer: FeedbackFactory::create(&cfg.feedback)?,
    };

    let session = Arc::new(InterviewSession::new(session_config, collaborators));
    session.start().await?;

    let hangup = {
        let session = Arc::clone(&session);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, disconnecting");
                session.disconnect().await;
            }
        })
    };

    let outcome = session.wait().await?;
    hangup.abort();

    info!("Interview finished with {} turns", outcome.transcript.len());
    println!("{}", outcome.navigation.path());

    Ok(())
}

async fn serve(cfg: Config) -> Result<()> {
    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let state = AppState::from_config(cfg)?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    Ok(())
}
