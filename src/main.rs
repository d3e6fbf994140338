//! Cupid binary: `cupid start` runs the bot, `cupid init-db` prepares the
//! database.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use teloxide::prelude::*;
use teloxide::types::ChatId;
use tracing::{info, warn};

use cupid::config::Config;
use cupid::guard::SubmissionGuard;
use cupid::logging;
use cupid::moderation::ModerationLinker;
use cupid::store::Store;
use cupid::telegram::{self, TelegramOutbox};
use cupid::workflow::{Workflow, WorkflowSettings};

/// Telegram bot for sending moderated, optionally anonymous valentines.
#[derive(Debug, Parser)]
#[command(name = "cupid", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the bot until Ctrl+C.
    Start,
    /// Create the database schema and exit.
    InitDb,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; real environment variables win.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    match cli.command {
        Command::Start => start().await,
        Command::InitDb => init_db().await,
    }
}

async fn init_db() -> Result<()> {
    logging::init_cli();

    let url = Config::database_url();
    let store = Store::connect(&url)
        .await
        .with_context(|| format!("failed to open database {url}"))?;
    store.migrate().await.context("failed to apply schema")?;

    info!(url = %url, "database initialised");
    Ok(())
}

async fn start() -> Result<()> {
    let config = Config::from_env().context("failed to load configuration")?;
    let _logging = match &config.log_dir {
        Some(dir) => Some(logging::init_production(dir)?),
        None => {
            logging::init_cli();
            None
        }
    };

    info!(version = env!("CARGO_PKG_VERSION"), ?config, "cupid starting");

    let store = Store::connect(&config.database_url)
        .await
        .with_context(|| format!("failed to open database {}", config.database_url))?;
    store.migrate().await.context("failed to apply schema")?;

    let bot = Bot::new(&config.telegram_token);
    let footer = match telegram::bot_footer(&bot).await {
        Ok(footer) => footer,
        Err(e) => {
            warn!(error = %e, "could not fetch bot username, posting without footer");
            String::new()
        }
    };

    let outbox = TelegramOutbox::new(
        bot.clone(),
        telegram::parse_recipient(&config.channel_id),
        ChatId(config.admin_chat_id),
    );
    let guard = SubmissionGuard::new(store.clone(), config.cooldown());
    let linker = ModerationLinker::new(store.clone(), Arc::new(outbox), footer);
    let workflow = Arc::new(Workflow::new(
        store,
        guard,
        linker,
        WorkflowSettings {
            admin_chat_id: config.admin_chat_id,
            channel_link: config.channel_link.clone(),
        },
    ));

    telegram::run_telegram(bot, workflow).await
}
