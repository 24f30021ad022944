mod cli;
mod credential;
mod document_path;
mod error;
mod front_matter;
mod log_capture;
mod page;
mod repository;
mod session;
mod state;
mod tui;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::{path::PathBuf, time::Duration};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use document_path::PostLayout;
use log_capture::LogBuffer;
use page::{Page, PageSource};
use repository::GitHubConfig;
use session::{DEFAULT_COMMIT_MESSAGE, SessionSettings};
use state::AppState;

#[derive(Parser, Debug)]
#[command(
    name = "blog-inline-editor",
    about = "Edit the Markdown source of a published blog post in place"
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// GitHub REST API root
    #[arg(long, global = true, env = "GITHUB_API", default_value = "https://api.github.com")]
    api_base: String,

    /// Owner of the repository holding the posts
    #[arg(long, global = true, env = "REPO_OWNER")]
    owner: Option<String>,

    /// Name of the repository holding the posts
    #[arg(long, global = true, env = "REPO_NAME")]
    repo: Option<String>,

    /// Branch to read from and commit to. Defaults to the repository's default branch.
    #[arg(long, global = true, env = "REPO_BRANCH")]
    branch: Option<String>,

    /// Directory of post sources within the repository
    #[arg(long, global = true, env = "POSTS_DIR", default_value = "_posts")]
    posts_dir: String,

    /// File extension of post sources
    #[arg(long, global = true, env = "POST_EXTENSION", default_value = "md")]
    extension: String,

    /// Credential store file.
    /// Defaults to `blog-inline-editor/store.toml` in the user config directory.
    #[arg(long, global = true, env = "EDITOR_STORE")]
    store: Option<PathBuf>,

    /// Commit message used when none is entered
    #[arg(long, global = true, env = "DEFAULT_COMMIT_MESSAGE", default_value = DEFAULT_COMMIT_MESSAGE)]
    default_message: String,

    /// How long the editor stays open after a successful save
    #[arg(long, global = true, env = "CLOSE_DELAY_MS", default_value = "1500")]
    close_delay_ms: u64,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Store a GitHub personal access token
    Login,
    /// Remove the stored token
    Logout,
    /// Check whether the stored token is accepted
    Status,
    /// Print the repository path of the post shown at PAGE
    Path {
        /// URL or local file of a rendered post page
        page: String,
    },
    /// Open the interactive editor for the post shown at PAGE
    Edit {
        /// URL or local file of a rendered post page
        page: String,
    },
}

impl Args {
    fn github(&self, require_repo: bool) -> anyhow::Result<GitHubConfig> {
        let (owner, repo) = match (&self.owner, &self.repo) {
            (Some(o), Some(r)) => (o.clone(), r.clone()),
            _ if require_repo => {
                anyhow::bail!("--owner and --repo (REPO_OWNER / REPO_NAME) are required")
            }
            _ => Default::default(),
        };
        Ok(GitHubConfig {
            api_base: self.api_base.clone(),
            owner,
            repo,
            branch: self.branch.clone(),
        })
    }

    fn settings(&self) -> SessionSettings {
        SessionSettings {
            layout: PostLayout {
                directory: self.posts_dir.clone(),
                extension: self.extension.clone(),
            },
            default_message: self.default_message.clone(),
            close_delay: Duration::from_millis(self.close_delay_ms),
        }
    }
}

/// Log to stderr, or into a ring buffer while the terminal UI owns the screen.
fn init_tracing(capture: bool) -> Option<LogBuffer> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "blog_inline_editor=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if capture {
        let (layer, buffer) = log_capture::new();
        registry.with(layer).init();
        Some(buffer)
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
        None
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (silently ignored if absent).
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let log_buffer = init_tracing(matches!(args.command, Command::Edit { .. }));

    let require_repo = matches!(args.command, Command::Edit { .. });
    let state = AppState::build(args.github(require_repo)?, args.store.clone(), args.settings())?;
    let mut out = std::io::stdout();

    match args.command {
        Command::Login => cli::login(&state, &mut cli::StdioPrompter, &mut out).await,
        Command::Logout => cli::logout(&state, &mut cli::StdioPrompter, &mut out),
        Command::Status => cli::status(&state, &mut out).await,
        Command::Path { page } => cli::path(&state, &page, &mut out).await,
        Command::Edit { page } => {
            let page = Page::load(PageSource::parse(&page))
                .await
                .with_context(|| format!("Cannot open {page}"))?;
            tracing::info!(page = %page.source, "Starting editor");
            tui::run(tui::TuiConfig {
                state,
                page,
                log_buffer: log_buffer.unwrap_or_default(),
            })
            .await
        }
    }
}
