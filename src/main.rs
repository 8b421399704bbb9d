use std::fs::File;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use postfeed::core::FeedController;
use postfeed::core::config::{load_config, resolve};
use postfeed::remote::{ClientError, Post, PostClient, PostStore};
use postfeed::tui;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

#[derive(Parser)]
#[command(name = "postfeed", about = "Browse and edit posts on a remote blog server")]
struct Args {
    /// Server base URL (overrides POSTFEED_BASE_URL and the config file)
    #[arg(long)]
    base_url: Option<String>,

    /// Username to sign in as (password comes from POSTFEED_PASSWORD or config)
    #[arg(short, long)]
    user: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print every post, fetched one page at a time
    List {
        /// Print a JSON array instead of text
        #[arg(long)]
        json: bool,
    },
    /// Create a post
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        body: String,
    },
    /// Replace the title and body of a post
    Edit {
        id: i64,
        #[arg(long)]
        title: String,
        #[arg(long)]
        body: String,
    },
    /// Delete a post
    Delete { id: i64 },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize file logger - writes to postfeed.log in current directory
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();

    if let Ok(log_file) = File::create("postfeed.log") {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let resolved = resolve(&config, args.base_url.as_deref(), args.user.as_deref());
    log::info!("postfeed starting up against {}", resolved.base_url);

    let client = match PostClient::from_config(&resolved) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let result = match args.command {
        None => tui::run(client).map_err(|e| e.to_string()),
        Some(command) => run_command(client, command).await.map_err(|e| e.to_string()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            log::error!("{}", message);
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

async fn run_command(client: Arc<PostClient>, command: Command) -> Result<(), ClientError> {
    match command {
        Command::List { json } => {
            let posts = collect_feed(client).await?;
            if json {
                let out = serde_json::to_string_pretty(&posts)
                    .map_err(|e| ClientError::Malformed(e.to_string()))?;
                println!("{out}");
            } else {
                for post in &posts {
                    print_post(post);
                }
            }
        }
        Command::Create { title, body } => {
            let post = client.create_post(&title, &body).await?;
            print_post(&post);
        }
        Command::Edit { id, title, body } => {
            let post = client.update_post(id, &title, &body).await?;
            print_post(&post);
        }
        Command::Delete { id } => {
            client.delete_post(id).await?;
            println!("Deleted post {id}");
        }
    }
    Ok(())
}

/// Walks one feed generation to the end, page by page.
async fn collect_feed(client: Arc<PostClient>) -> Result<Vec<Post>, ClientError> {
    let feed = FeedController::new(client);
    feed.start_feed();
    let mut posts = Vec::new();
    while let Some(page) = feed.load_next_page().await? {
        log::debug!("Page of {} posts (more: {})", page.posts.len(), page.more);
        posts.extend(page.posts);
        if !page.more {
            break;
        }
    }
    Ok(posts)
}

fn print_post(post: &Post) {
    println!(
        "#{} {} (by {}, {})",
        post.id,
        post.title,
        post.author,
        post.created.to_rfc3339()
    );
    for line in post.body.lines() {
        println!("    {line}");
    }
}
