use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sentifl_client::api::ApiClient;
use sentifl_client::config::Config;
use sentifl_client::music::MusicRequestFlow;
use sentifl_client::navigation::Route;
use sentifl_client::posts::{fetch_all_posts, ContentResolver, PostPager};
use sentifl_client::profile::ProfileUploader;
use sentifl_client::s3::S3Client;
use sentifl_client::session::{Session, SessionStore};
use sentifl_client::users::{SearchDebouncer, UserDirectory};
use sentifl_client::ClientError;

#[derive(Debug, Parser)]
#[command(name = "sentifl", version, about = "Sentifl blogging and music client")]
struct Cli {
    /// Session file (overrides SESSION_PATH).
    #[arg(long, global = true)]
    session: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Store a credential for later commands.
    Login {
        #[arg(long)]
        uid: String,
        #[arg(long)]
        token: String,
        #[arg(long)]
        nickname: Option<String>,
    },
    /// Forget the stored session.
    Logout,
    /// Show the logged-in user's profile summary.
    Whoami,
    /// Search users. Without a query, reads queries from stdin line by line.
    Search { query: Option<String> },
    Follow { uid: String },
    Unfollow { uid: String },
    /// Upload a new profile image.
    UploadProfile { file: PathBuf },
    /// List a user's posts, newest first.
    Posts {
        /// Owner (defaults to the logged-in user).
        #[arg(long)]
        uid: Option<String>,
        /// Zero-based page of the local listing.
        #[arg(long, default_value_t = 0)]
        page: usize,
    },
    /// Make a song from one of your posts.
    Generate { post_id: i64 },
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            error!("Fatal error: {e:#}");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    init_tracing()?;

    let cli = Cli::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let store = SessionStore::new(
        cli.session
            .clone()
            .unwrap_or_else(|| config.session_path.clone()),
    );
    let mut session = store.load().await?;
    info!(path = %store.path().display(), logged_in = session.is_authenticated(), "Session loaded");

    let api = ApiClient::new(&config, &session)?;
    let outcome = execute(cli.command, api, &config, &mut session, &store).await;

    store.save(&session).await?;

    match outcome {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            error!("{e}");
            eprintln!("{}", e.user_message());
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn execute(
    command: Command,
    api: ApiClient,
    config: &Config,
    session: &mut Session,
    store: &SessionStore,
) -> Result<(), ClientError> {
    match command {
        Command::Login {
            uid,
            token,
            nickname,
        } => {
            *session = Session {
                nickname,
                ..Session::authenticated(uid, token)
            };
            println!("Logged in.");
        }
        Command::Logout => {
            session.clear();
            println!("Logged out.");
        }
        Command::Whoami => {
            let summary = UserDirectory::new(api, session)
                .profile_summary(session)
                .await?;
            println!(
                "{} ({})",
                summary.nickname.as_deref().unwrap_or("-"),
                summary.uid
            );
            println!(
                "follow {}  following {}",
                summary.follower_count, summary.following_count
            );
            if let Some(image) = summary.profile_image {
                println!("profile image: {image}");
            }
        }
        Command::Search { query: Some(query) } => {
            let mut directory = UserDirectory::new(api, session);
            directory.search(&query).await?;
            print_users(&directory);
        }
        Command::Search { query: None } => {
            search_interactive(UserDirectory::new(api, session), config).await;
        }
        Command::Follow { uid } => {
            UserDirectory::new(api, session)
                .toggle_follow(&uid, false)
                .await?;
            println!("Following {uid}.");
        }
        Command::Unfollow { uid } => {
            UserDirectory::new(api, session)
                .toggle_follow(&uid, true)
                .await?;
            println!("Unfollowed {uid}.");
        }
        Command::UploadProfile { file } => {
            let s3 = S3Client::from_config(config)
                .map_err(|e| ClientError::Storage(format!("{e:#}")))?
                .ok_or_else(|| ClientError::precondition("Image storage is not configured."))?;
            let uploader = ProfileUploader::new(api, Arc::new(s3), config.s3_prefix.clone());
            let url = uploader.upload(Some(&file), session, store).await?;
            println!("Profile image saved: {url}");
        }
        Command::Posts { uid, page } => {
            let owner = uid
                .or_else(|| session.viewer_uid().map(ToString::to_string))
                .ok_or_else(|| ClientError::precondition("Please log in first."))?;
            list_posts(&api, config, &owner, page).await?;
        }
        Command::Generate { post_id } => {
            // Both uid and credential are needed before the listing is fetched.
            let owner = session
                .viewer_uid()
                .filter(|_| session.token().is_some())
                .ok_or_else(|| ClientError::precondition("Please log in first."))?
                .to_string();
            let aggregated = fetch_all_posts(&api, &owner, config.post_page_size).await?;

            let mut flow = MusicRequestFlow::new(api.http().clone(), &config.music_api_base_url);
            flow.select(&aggregated.posts, post_id)?;
            println!("Making your song...");

            let route = flow.generate(&aggregated.posts, session).await?;
            if let Route::SongResult(ref song) = route {
                println!("{}", song.title);
                println!("emotions: {}, {}", song.emotion1, song.emotion2);
                println!("{}", song.music_url);
            }
            println!("-> {}", route.path());
        }
    }

    Ok(())
}

async fn list_posts(
    api: &ApiClient,
    config: &Config,
    owner: &str,
    page: usize,
) -> Result<(), ClientError> {
    let aggregated = fetch_all_posts(api, owner, config.post_page_size).await?;
    if !aggregated.complete {
        eprintln!("Some posts could not be loaded.");
    }

    let mut pager = PostPager::new(aggregated.posts.len());
    pager.go_to(page);
    let shown = pager.page_items(&aggregated.posts);
    if shown.is_empty() {
        println!("No posts.");
        return Ok(());
    }

    let mut contents = ContentResolver::new();
    contents.resolve(api, shown).await;

    for (index, post) in shown.iter().enumerate() {
        println!(
            "{:>3}. [{}] {}  {}",
            pager.display_number(index),
            post.post_id,
            contents.title_or_placeholder(post.post_id),
            post.created_at()
                .map_or_else(|| post.created_time.clone(), |t| t.format("%Y-%m-%d").to_string()),
        );
    }

    let pages: Vec<String> = pager
        .group_pages()
        .map(|p| {
            if p == pager.page() {
                format!("[{}]", p + 1)
            } else {
                (p + 1).to_string()
            }
        })
        .collect();
    println!(
        "{} {} {}",
        if pager.has_prev_group() { "<" } else { " " },
        pages.join(" "),
        if pager.has_next_group() { ">" } else { " " },
    );
    Ok(())
}

async fn search_interactive(mut directory: UserDirectory, config: &Config) {
    let (tx, mut debouncer) = SearchDebouncer::channel(config.search_debounce);

    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).await.is_err() {
                break;
            }
        }
    });

    while let Some(query) = debouncer.next().await {
        match directory.search(&query).await {
            Ok(_) => print_users(&directory),
            Err(e) => {
                error!(query = %query, "User search failed: {e}");
                eprintln!("{}", e.user_message());
            }
        }
    }
}

fn print_users(directory: &UserDirectory) {
    if directory.results().is_empty() {
        println!("No users found.");
    }
    for user in directory.results() {
        println!(
            "{:<20} {:<20} {}",
            user.uid,
            user.nick_name,
            if user.is_following { "Following" } else { "Follow" }
        );
    }
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sentifl_client=debug"));

    // Check if JSON logging is requested
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    if use_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::MockServer;

    #[tokio::test]
    async fn test_generate_without_credential_sends_nothing() {
        let server = MockServer::start().await;
        let dir = tempfile::TempDir::new().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        let config = Config {
            api_base_url: format!("{}/api/v1", server.uri()),
            music_api_base_url: server.uri(),
            ..Config::for_testing()
        };
        let mut session = Session {
            uid: Some("alice".to_string()),
            ..Session::default()
        };
        let api = ApiClient::new(&config, &session).unwrap();

        let err = execute(Command::Generate { post_id: 1 }, api, &config, &mut session, &store)
            .await
            .unwrap_err();

        assert!(err.is_precondition());
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
