// ============================================================================
// FEEDSYNC COMMAND LINE CLIENT
// ============================================================================

// - Session login/register/logout persisted to disk
// - Feed, trending and profile listings
// - Likes, follows and comments through the optimistic engine
// - Notifications with paging and mark-all-read
// - Debounced search
// - Structured logging

use std::env;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use feedsync::{
    AppState, Config, config,
    dto::TrendingParams,
    search::SearchState,
    views::{FeedSnapshot, PostCard},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "feedsync")]
#[command(about = "Social feed client over the feed REST backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session
    Login { email: String, password: String },

    /// Create an account and store the session
    Register {
        username: String,
        email: String,
        password: String,
    },

    /// Forget the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// List posts
    Feed {
        /// Trending posts instead of the home feed
        #[arg(long)]
        trending: bool,

        /// Time frame for trending posts (24h, 7d, 30d)
        #[arg(long, default_value = "24h")]
        time_frame: String,

        /// Posts of a single user
        #[arg(long, conflicts_with = "trending")]
        user: Option<String>,
    },

    /// Publish a post
    Post {
        content: String,

        /// Image URL
        #[arg(long)]
        image: Option<String>,
    },

    /// Toggle your like on a post
    Like { post_id: String },

    /// Toggle following a user
    Follow { user_id: String },

    /// Show a post and its comments
    Show { post_id: String },

    /// Comment on a post
    Comment { post_id: String, text: String },

    /// List notifications
    Notifications {
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// Mark every notification as read
        #[arg(long)]
        mark_all: bool,
    },

    /// Search posts and users
    Search {
        query: String,

        /// Look up users only
        #[arg(long)]
        users: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(EnvFilter::new(config::log_filter(|key| env::var(key).ok())))
        .compact()
        .init();

    let config = Config::load();
    let cli = Cli::parse();
    info!("Using backend at {}", config.api_url);
    let app = AppState::new(config).context("building HTTP client")?;

    match cli.command {
        Commands::Login { email, password } => {
            let session = app.login(&email, &password).await?;
            println!("Signed in as {}", session.username);
        }
        Commands::Register {
            username,
            email,
            password,
        } => {
            let session = app.register(&username, &email, &password).await?;
            println!("Welcome, {}", session.username);
        }
        Commands::Logout => {
            app.logout();
            println!("Signed out");
        }
        Commands::Whoami => {
            if !app.check_auth().await {
                bail!("Not signed in");
            }
            let profile = app.profile(None);
            profile.load().await?;
            let snapshot = profile.snapshot();
            if let Some(me) = snapshot.profile {
                println!(
                    "{} ({} followers, {} following, {} posts)",
                    me.username,
                    me.followers.len(),
                    me.following.len(),
                    snapshot.feed.posts.len()
                );
            }
        }
        Commands::Feed {
            trending,
            time_frame,
            user,
        } => {
            let feed = match user {
                Some(user_id) => {
                    let profile = app.profile(Some(&user_id));
                    profile.load().await?;
                    print_feed(&profile.snapshot().feed);
                    return Ok(());
                }
                None if trending => app.trending(TrendingParams {
                    time_frame,
                    ..TrendingParams::default()
                }),
                None => app.home(),
            };
            feed.load().await?;
            print_feed(&feed.snapshot());
        }
        Commands::Post { content, image } => {
            let feed = app.home();
            let post = feed.create_post(&content, image).await?;
            println!("Posted {}", post.id);
        }
        Commands::Like { post_id } => {
            let screen = app.post(&post_id);
            screen.load().await?;
            let post = screen.like().await?;
            let liked = app.session.user_id().is_some_and(|me| post.is_liked_by(&me));
            println!(
                "{} ({} likes)",
                if liked { "Liked" } else { "Unliked" },
                post.likes_count()
            );
        }
        Commands::Follow { user_id } => {
            let profile = app.profile(Some(&user_id));
            profile.load().await?;
            let following = profile.follow().await?;
            println!(
                "{} {}",
                if following { "Following" } else { "Unfollowed" },
                user_id
            );
        }
        Commands::Show { post_id } => {
            let screen = app.post(&post_id);
            screen.load().await?;
            let snapshot = screen.snapshot();
            if let Some(card) = &snapshot.post {
                print_card(card);
            }
            for row in snapshot.comments {
                println!(
                    "    {}: {} ({} likes)",
                    row.comment.author.username, row.comment.content, row.likes_count
                );
            }
        }
        Commands::Comment { post_id, text } => {
            let screen = app.post(&post_id);
            screen.load().await?;
            let comment = screen.submit_comment(&text).await?;
            println!("Commented {}", comment.id);
        }
        Commands::Notifications { page, mark_all } => {
            let screen = app.notifications();
            screen.load(page).await?;
            if mark_all {
                screen.mark_all_read().await?;
            }
            let snapshot = screen.snapshot();
            println!(
                "Page {}/{} ({} unread)",
                snapshot.page, snapshot.total_pages, snapshot.unread
            );
            for n in snapshot.notifications {
                println!(
                    "{} {}: {}",
                    if n.read { " " } else { "*" },
                    n.sender.username,
                    n.content
                );
            }
        }
        Commands::Search { query, users: true } => {
            for user in app.api.search_users(query.trim()).await? {
                println!("@{}", user.username);
            }
        }
        Commands::Search { query, .. } => {
            let search = app.search();
            let mut updates = search.subscribe();
            search.set_query(&query);
            let state = updates
                .wait_for(|state| !state.is_loading())
                .await
                .context("search stopped")?
                .clone();
            match state {
                SearchState::Settled { .. } => {
                    let results = search.snapshot().results;
                    for user in results.users {
                        println!("@{}", user.username);
                    }
                    for post in results.posts {
                        println!("{}: {}", post.author.username, post.content);
                    }
                }
                SearchState::Failed { message, .. } => bail!(message),
                _ => {}
            }
        }
    }

    Ok(())
}

fn print_feed(feed: &FeedSnapshot) {
    if feed.posts.is_empty() {
        println!("No posts yet");
    }
    for card in &feed.posts {
        print_card(card);
    }
}

fn print_card(card: &PostCard) {
    let follow = match card.following_author {
        Some(true) => " [following]",
        _ => "",
    };
    println!(
        "{} {}{}: {}  ({} likes, {} comments){}",
        card.post.id,
        card.post.author.username,
        follow,
        card.post.content,
        card.likes_count,
        card.comments_count,
        if card.liked { " *" } else { "" }
    );
}
