#![forbid(unsafe_code)]

mod models;
mod notifier;
mod poll_service;
mod review_api;
mod utils;

use std::{process::exit, time::Duration};

use anyhow::Context;
use notifier::TelegramNotifier;
use poll_service::PollService;
use review_api::ReviewApi;
use serde::Deserialize;
use tokio::{select, signal};
use tracing::{debug, error, info};
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_REVIEW_API_URL: &str = "https://praktikum.yandex.ru";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 5 * 60;
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 5;
const DEFAULT_LOG_FILE: &str = "homework-status-bot.log";

#[derive(Debug, Deserialize)]
struct AppConfig {
    praktikum_token: String,
    telegram_token: String,
    telegram_chat_id: String,
    review_api_url: Option<String>,
    poll_interval_secs: Option<u64>,
    retry_interval_secs: Option<u64>,
    log_file: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(err) = dotenvy::dotenv() {
        eprintln!("Could not load config from .env file: {err}");
    }

    let app_config = match envy::from_env::<AppConfig>() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Could not load app config: {err}");
            exit(255);
        }
    };

    let _log_guard = init_logging(
        app_config.log_file.as_deref().unwrap_or(DEFAULT_LOG_FILE),
    )?;

    debug!("Bot started");

    let api = ReviewApi::new(
        app_config
            .review_api_url
            .as_deref()
            .unwrap_or(DEFAULT_REVIEW_API_URL),
        app_config.praktikum_token,
    );
    let notifier = TelegramNotifier::new(app_config.telegram_token, app_config.telegram_chat_id);

    let poll_service = PollService::new(
        api,
        notifier,
        Duration::from_secs(
            app_config
                .poll_interval_secs
                .unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
        ),
        Duration::from_secs(
            app_config
                .retry_interval_secs
                .unwrap_or(DEFAULT_RETRY_INTERVAL_SECS),
        ),
    );

    select! {
        _ = signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
        },

        _ = poll_service.run() => {
            // The loop has no terminal state; reaching this arm is a bug.
            error!("The poll loop exited unexpectedly");
        },
    };

    Ok(())
}

fn init_logging(log_file: &str) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all("logs").context("Could not create the log directory")?;

    let file_appender = rolling::daily("logs", log_file);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .with(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(
                    "homework_status_bot=debug"
                        .parse()
                        .expect("Hard-coded default directive should be correct"),
                )
                .from_env_lossy(),
        )
        .init();

    Ok(guard)
}
