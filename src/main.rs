use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;

use skillbridge::alert::{alert_channel, Alert};
use skillbridge::api::{ReactionApi, ReactionType, RestClient};
use skillbridge::cancel::CancelToken;
use skillbridge::comment::{CommentLikeController, LikeState};
use skillbridge::config::{Config, ConfigStore};
use skillbridge::health::probe_server;
use skillbridge::logging::init_tracing;
use skillbridge::reaction::ReactionController;
use skillbridge::session::Session;

#[derive(Parser)]
#[command(name = "skillbridge")]
#[command(about = "Post and comment reactions for SkillBridge", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to the user config dir)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Backend base URL, overriding the config file
    #[arg(long, global = true, value_name = "URL")]
    base_url: Option<String>,

    /// Act as this user id, overriding the config file
    #[arg(long, global = true, value_name = "USER_ID")]
    user: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show reaction counts for a post
    Stats { post_id: String },

    /// Show your own reaction on a post
    Mine { post_id: String },

    /// Toggle a reaction on a post (LIKE, LOVE, HAHA, WOW, SAD, ANGRY)
    React {
        post_id: String,
        reaction: ReactionType,
    },

    /// Toggle your like on a comment
    LikeComment {
        comment_id: String,
        /// Like count currently shown for the comment
        #[arg(long, default_value_t = 0)]
        likes: u64,
        /// Whether you currently like the comment
        #[arg(long)]
        liked: bool,
    },

    /// Check whether the backend is reachable
    Health {
        #[arg(long, default_value_t = 3)]
        attempts: u32,
        #[arg(long, default_value_t = 1000)]
        delay_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("warn");
    let cli = Cli::parse();

    let store = load_config(&cli)?;
    let config = store.get();
    let session = Session::from_config(&config.session);
    let api: Arc<dyn ReactionApi> =
        Arc::new(RestClient::new(&config.api).context("Failed to build API client")?);

    match cli.command {
        Command::Stats { post_id } => {
            let summary = api.fetch_summary(&post_id, &CancelToken::new()).await?;
            println!("{} reactions on post {}", summary.total, post_id);
            for (reaction, count) in &summary.reactions {
                println!("  {} {:<6} {}", reaction.emoji(), reaction.label(), count);
            }
        }

        Command::Mine { post_id } => {
            let Some(user_id) = session.user_id() else {
                bail!("No user configured; pass --user or set [session] user_id");
            };
            match api
                .fetch_user_reaction(&user_id, &post_id, &CancelToken::new())
                .await?
            {
                Some(reaction) => println!("{} {}", reaction.emoji(), reaction.label()),
                None => println!("No reaction"),
            }
        }

        Command::React { post_id, reaction } => {
            let (alerts, mut rx) = alert_channel();
            let controller = ReactionController::new(post_id, session, api, &config, alerts);
            controller.mount();
            controller.settle().await;
            controller.toggle_reaction(reaction);
            controller.settle().await;

            let state = controller.state();
            controller.teardown();
            report_alerts(&mut rx)?;

            match state.current_reaction() {
                Some(current) => println!("Reacted {} {}", current.emoji(), current.label()),
                None => println!("Reaction cleared"),
            }
            println!("{} reactions total", state.reaction.total_count);
        }

        Command::LikeComment {
            comment_id,
            likes,
            liked,
        } => {
            let (alerts, mut rx) = alert_channel();
            let initial = LikeState {
                like_count: likes,
                user_liked: liked,
            };
            let controller =
                CommentLikeController::new(comment_id, initial, session, api, &config, alerts);
            controller.toggle_like();
            controller.settle().await;

            let state = controller.state();
            controller.teardown();
            report_alerts(&mut rx)?;

            let verb = if state.likes.user_liked { "Liked" } else { "Unliked" };
            println!("{} ({} likes)", verb, state.likes.like_count);
        }

        Command::Health { attempts, delay_ms } => {
            let status = probe_server(
                api.as_ref(),
                attempts,
                Duration::from_millis(delay_ms),
                &CancelToken::new(),
            )
            .await;
            if !status.is_running {
                bail!(
                    "Backend at {} unreachable after {} attempts: {}",
                    config.api.base_url,
                    status.attempts,
                    status.last_error.unwrap_or_default()
                );
            }
            println!(
                "Backend at {} is up ({} attempt(s))",
                config.api.base_url, status.attempts
            );
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<ConfigStore> {
    let path = cli.config.clone().unwrap_or_else(Config::config_path);
    let config = Config::load_from(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;

    let store = ConfigStore::new(config, path);
    store.update(|config| {
        if let Some(base_url) = &cli.base_url {
            config.api.base_url = base_url.clone();
        }
        if let Some(user) = &cli.user {
            config.session.user_id = Some(user.clone());
        }
    });
    store.get().validate()?;
    Ok(store)
}

fn report_alerts(rx: &mut mpsc::UnboundedReceiver<Alert>) -> Result<()> {
    let mut last = None;
    while let Ok(alert) = rx.try_recv() {
        eprintln!("{} ({})", alert.message, alert.detail);
        last = Some(alert);
    }
    match last {
        Some(alert) => bail!(alert.message),
        None => Ok(()),
    }
}
