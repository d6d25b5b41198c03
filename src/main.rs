use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use voxtail::application::{ChannelStateCache, EntryProjector, ListEntry, MessageWindow};
use voxtail::domain::entities::{Channel, MessageId, RelationshipState};
use voxtail::domain::ports::MessageHistoryPort;
use voxtail::infrastructure::{AppConfig, CliArgs, HttpHistoryClient};

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = config.effective_log_path() {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry().with(filter).init();
    }

    Ok(())
}

fn render_entry(entry: &ListEntry) -> String {
    match entry {
        ListEntry::Message { message, tail } => {
            let author = message
                .masquerade()
                .and_then(|m| m.name())
                .map_or_else(|| message.author_id().as_str().to_owned(), str::to_owned);
            if *tail {
                format!("          {}", message.content())
            } else {
                format!("[{author}] {}", message.content())
            }
        }
        ListEntry::DateDivider { date } => format!("---- {date} ----"),
        ListEntry::UnreadDivider => "---- NEW ----".to_owned(),
        ListEntry::BlockedRun { count } => format!("---- {count} blocked message(s) ----"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = CliArgs::parse();
    let channel_id = args.channel.clone();
    let nearby = args.nearby.clone().map(MessageId::from);

    let mut config = AppConfig::load(args.config.as_deref());
    config.merge_with_args(args);

    init_logging(&config)?;

    info!(version = voxtail::VERSION, "Starting voxtail");

    let mut client = HttpHistoryClient::new(
        config.api_base_url.clone(),
        std::time::Duration::from_secs(config.request_timeout_secs),
    )?;
    if let Some(token) = &config.session_token {
        client = client.with_session_token(token);
    }
    let history: Arc<dyn MessageHistoryPort> = Arc::new(client);

    let cache = ChannelStateCache::new();
    let window = MessageWindow::new(Channel::new(channel_id.as_str()), history);

    window.initial_load(nearby, &cache).await;
    if window.failed() {
        return Err(eyre!("failed to load history for channel {channel_id}"));
    }

    let mut projector = EntryProjector::new();
    let entries = projector.project(&window.messages(), None, &RelationshipState::new());

    for entry in &entries {
        println!("{}", render_entry(entry));
    }

    info!(
        count = window.len(),
        at_start = window.at_start(),
        at_end = window.at_end(),
        "History loaded"
    );

    Ok(())
}
