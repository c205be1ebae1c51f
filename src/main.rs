mod config;
mod relay;

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use serde_json::Value;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::prelude::*;

use config::Config;
use relay::{Chat, ChatScope, Event, MatchMaker, PhotoSize, Router, TelegramClient};

type ChatRouter = Router<MatchMaker<TelegramClient>, TelegramClient>;

struct BotState {
    service: Arc<MatchMaker<TelegramClient>>,
    messenger: Arc<TelegramClient>,
    /// One router per chat, locked so a chat's events are handled one at a
    /// time even on a multi-threaded runtime.
    routers: Mutex<HashMap<i64, Arc<Mutex<ChatRouter>>>>,
}

impl BotState {
    fn new(bot: &Bot) -> Self {
        let messenger = Arc::new(TelegramClient::new(bot.clone()));
        let service = Arc::new(MatchMaker::new(messenger.clone()));
        Self {
            service,
            messenger,
            routers: Mutex::new(HashMap::new()),
        }
    }
}

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "randchat.json".to_string());
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let bot = Bot::new(&config.telegram_bot_token);

    // Setup logging
    let log_dir = config.data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).ok();
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("randchat.log"))
        .expect("Failed to open log file");
    let (non_blocking, _guard) = tracing_appender::non_blocking(log_file);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .init();

    info!("🚀 Starting randchat...");
    info!("Loaded config from {config_path}");

    let state = Arc::new(BotState::new(&bot));

    let handler = Update::filter_message().endpoint(handle_new_message);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn handle_new_message(msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let chat_id = msg.chat.id.0;
    let event = telegram_to_event(&msg);

    let router = {
        let mut routers = state.routers.lock().await;
        routers
            .entry(chat_id)
            .or_insert_with(|| {
                Arc::new(Mutex::new(Router::new(
                    chat_id,
                    state.service.clone(),
                    state.messenger.clone(),
                )))
            })
            .clone()
    };

    // One event at a time per chat.
    let router = router.lock().await;
    router.on_message(&event).await;

    Ok(())
}

fn telegram_to_event(msg: &Message) -> Event {
    let scope = if msg.chat.is_private() {
        ChatScope::Private
    } else if msg.chat.is_channel() {
        ChatScope::Channel
    } else if msg.chat.is_supergroup() {
        ChatScope::Supergroup
    } else {
        ChatScope::Group
    };

    // Presence is all classification needs for the kinds the relay rejects.
    let presence = |present: bool| present.then_some(Value::Null);

    Event {
        chat: Chat { id: msg.chat.id.0, scope },
        text: msg.text().map(str::to_owned),
        photo: msg.photo().map(|sizes| {
            sizes
                .iter()
                .map(|size| PhotoSize { file_id: size.file.id.0.clone() })
                .collect()
        }),
        caption: msg.caption().map(str::to_owned),
        reply_to_message: msg
            .reply_to_message()
            .map(|reply| Some(serde_json::json!({ "message_id": reply.id.0 }))),
        video: presence(msg.video().is_some()),
        document: presence(msg.document().is_some()),
        sticker: presence(msg.sticker().is_some()),
        voice: presence(msg.voice().is_some()),
        audio: presence(msg.audio().is_some()),
        video_note: presence(msg.video_note().is_some()),
        location: presence(msg.location().is_some()),
        contact: presence(msg.contact().is_some()),
    }
}
