use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use spacetraveling::config::Config;
use spacetraveling::content::CmsClient;
use spacetraveling::feed::{
    load_all, normalize_detail, normalize_page, FeedAggregator, PostCard, PostHeader,
};
use spacetraveling::util::strip_control_chars;

/// Get the config directory path (~/.config/spacetraveling/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("spacetraveling"))
}

#[derive(Parser, Debug)]
#[command(name = "spacetraveling", about = "Blog posts from a headless CMS")]
struct Args {
    /// Config file (defaults to ~/.config/spacetraveling/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// CMS API root, overrides config file and environment
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List posts, newest page first
    List {
        /// Extra pages to load after the first ("load more")
        #[arg(long, default_value_t = 0)]
        pages: usize,

        /// Load every remaining page
        #[arg(long, conflicts_with = "pages")]
        all: bool,

        /// Upper bound on pages loaded by --all
        #[arg(long, default_value_t = 100, requires = "all")]
        max_pages: usize,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Show one post with its reading time
    Post {
        /// Post UID (the URL slug)
        uid: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => get_config_dir()?.join("config.toml"),
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?
        .with_env_overrides()
        .with_endpoint_override(args.endpoint.clone());

    if config.api_endpoint.trim().is_empty() {
        anyhow::bail!(
            "No CMS endpoint configured. Set api_endpoint in {}, {} or pass --endpoint",
            config_path.display(),
            spacetraveling::config::ENDPOINT_ENV_VAR
        );
    }

    let client = CmsClient::new(reqwest::Client::new(), &config.api_endpoint)
        .context("Invalid CMS endpoint")?
        .with_page_size(config.page_size)
        .with_timeout(config.request_timeout());

    match args.command {
        Command::List {
            pages,
            all,
            max_pages,
            json,
        } => list_posts(&client, &config, pages, all.then_some(max_pages), json).await,
        Command::Post { uid, json } => show_post(&client, &config, &uid, json).await,
    }
}

async fn list_posts(
    client: &CmsClient,
    config: &Config,
    extra_pages: usize,
    all: Option<usize>,
    json: bool,
) -> Result<()> {
    let first = client
        .get_by_type(&config.document_type)
        .await
        .context("Failed to fetch first page of posts")?;
    let feed = FeedAggregator::new(normalize_page(first));

    let state = match all {
        Some(max_pages) => {
            let mut state = feed.snapshot();
            load_all(&mut state, client, max_pages)
                .await
                .context("Failed to load more posts")?;
            state
        }
        None => {
            for _ in 0..extra_pages {
                if !feed.has_more() {
                    break;
                }
                feed.load_next(client)
                    .await
                    .context("Failed to load more posts")?;
            }
            feed.snapshot()
        }
    };

    let has_more = state.has_more();
    let cards: Vec<PostCard> = state
        .into_posts()
        .iter()
        .map(|post| PostCard::from_summary(post, &config.date_placeholder))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&cards)?);
        return Ok(());
    }

    for card in &cards {
        println!("{}", strip_control_chars(&card.title));
        if !card.subtitle.is_empty() {
            println!("  {}", strip_control_chars(&card.subtitle));
        }
        println!(
            "  {} | {} | /post/{}",
            card.published,
            strip_control_chars(&card.author),
            strip_control_chars(&card.uid)
        );
        println!();
    }

    if has_more {
        println!("More posts available (use --pages N or --all)");
    }
    Ok(())
}

async fn show_post(client: &CmsClient, config: &Config, uid: &str, json: bool) -> Result<()> {
    let raw = client
        .get_by_uid(&config.document_type, uid)
        .await
        .with_context(|| format!("Failed to fetch post '{uid}'"))?;
    let post = normalize_detail(raw);
    let header = PostHeader::from_detail(&post, &config.date_placeholder);

    if json {
        let out = serde_json::json!({ "header": header, "post": post });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{}", strip_control_chars(&header.title));
    println!(
        "{} | {} | {}",
        header.published,
        strip_control_chars(&header.author),
        header.reading_time_label()
    );
    if !header.banner_url.is_empty() {
        println!("{}", strip_control_chars(&header.banner_url));
    }

    for block in &post.content {
        println!();
        println!("## {}", strip_control_chars(&block.heading));
        for paragraph in &block.body {
            println!();
            println!("{}", strip_control_chars(&paragraph.text));
        }
    }
    Ok(())
}
