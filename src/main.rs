//! RegistrationDesk Telegram Bot
//!
//! Main application entry point

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;
use tokio::sync::watch;
use tracing::{error, info, warn};

use RegistrationDesk::{
    api::{self, ApiState},
    config::Settings,
    database::{create_pool, run_migrations, DatabaseService},
    handlers::{handle_callback_query, handle_command, handle_message, Command},
    i18n::I18n,
    services::{mailer_from_config, ServiceFactory, TelegramNotifier},
    state::{ContactSettings, ConversationEngine, ConversationMachine, MemorySessionStore, RedisSessionStore, SessionStore},
    utils::logging,
};

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new().context("Failed to load configuration")?;
    settings.validate()?;

    // Initialize logging; the guard flushes the file writer on drop
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", RegistrationDesk::info());

    // Initialize database connection
    info!("Connecting to database...");
    let db_pool = create_pool(&settings.database)
        .await
        .context("Failed to connect to database")?;
    run_migrations(&db_pool).await?;
    let database_service = DatabaseService::new(db_pool);
    let stores = database_service.stores();

    // Session storage
    let ttl = settings.session.ttl();
    let sessions: Arc<dyn SessionStore> = if settings.redis.url.trim().is_empty() {
        warn!("Redis URL not configured, sessions are kept in memory");
        Arc::new(MemorySessionStore::new())
    } else {
        info!("Connecting to Redis...");
        Arc::new(
            RedisSessionStore::new(settings.redis.clone(), ttl)
                .await
                .context("Failed to connect to Redis")?,
        )
    };

    // Initialize i18n system
    info!("Loading translations...");
    let mut i18n = I18n::new(&settings.i18n);
    i18n.load_translations(Path::new("translations"))
        .await
        .context("Failed to load translations")?;

    let bot = Bot::new(&settings.bot.token);

    // Initialize services
    info!("Initializing services...");
    let mailer = mailer_from_config(&settings.email)?;
    let notifier = Arc::new(TelegramNotifier::new(bot.clone()));
    let services = ServiceFactory::new(stores.clone(), mailer.clone(), notifier);

    let contact = ContactSettings {
        recipients: settings.email.contact_recipients.clone(),
        subject: settings.email.contact_subject.clone(),
    };
    let machine = ConversationMachine::new(stores, mailer, contact);
    let engine = Arc::new(ConversationEngine::new(machine, sessions, ttl));
    let i18n = Arc::new(i18n);

    // Background workers stop when this flips to true
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let dispatcher_task = services.outbox_dispatcher(&settings.outbox).spawn(shutdown_rx.clone());

    let api_task = if settings.api.enabled {
        let api_config = settings.api.clone();
        let state = ApiState { services: services.clone() };
        let shutdown = shutdown_rx.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = api::serve(&api_config, state, shutdown).await {
                error!(error = %e, "Admin API terminated");
            }
        }))
    } else {
        info!("Admin API disabled");
        None
    };

    info!("Setting up bot handlers...");
    let mut dispatcher = Dispatcher::builder(bot.clone(), create_handler())
        .dependencies(dptree::deps![engine, i18n])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd.kind);
        })
        .enable_ctrlc_handler()
        .build();

    info!("RegistrationDesk bot is ready, starting polling...");
    dispatcher.dispatch().await;

    info!("Dispatcher stopped, shutting down background tasks...");
    let _ = shutdown_tx.send(true);
    if let Err(e) = dispatcher_task.await {
        error!(error = %e, "Outbox dispatcher task failed");
    }
    if let Some(task) = api_task {
        if let Err(e) = task.await {
            error!(error = %e, "Admin API task failed");
        }
    }

    info!("RegistrationDesk bot has been shut down.");
    Ok(())
}

/// Create the main update handler
fn create_handler() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    dptree::entry()
        .branch(
            Update::filter_message()
                .branch(dptree::entry().filter_command::<Command>().endpoint(handle_commands))
                .branch(dptree::endpoint(handle_messages)),
        )
        .branch(Update::filter_callback_query().endpoint(handle_callbacks))
}

/// Handle bot commands
async fn handle_commands(
    bot: Bot,
    msg: Message,
    cmd: Command,
    engine: Arc<ConversationEngine>,
    i18n: Arc<I18n>,
) -> HandlerResult {
    if let Err(e) = handle_command(bot, msg, cmd, &engine, &i18n).await {
        error!(error = %e, "Error handling command");
        return Err(e.into());
    }
    Ok(())
}

/// Handle regular messages
async fn handle_messages(bot: Bot, msg: Message, engine: Arc<ConversationEngine>, i18n: Arc<I18n>) -> HandlerResult {
    if let Err(e) = handle_message(bot, msg, &engine, &i18n).await {
        error!(error = %e, "Error handling message");
        return Err(e.into());
    }
    Ok(())
}

/// Handle callback queries
async fn handle_callbacks(
    bot: Bot,
    query: CallbackQuery,
    engine: Arc<ConversationEngine>,
    i18n: Arc<I18n>,
) -> HandlerResult {
    let user_id = query.from.id.0;
    if let Err(e) = handle_callback_query(bot, query, &engine, &i18n).await {
        error!(user_id, error = %e, "Error handling callback query");
        return Err(e.into());
    }
    Ok(())
}
