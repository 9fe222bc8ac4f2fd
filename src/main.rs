//! PayBuddy Telegram Bot
//!
//! Main application entry point

use std::sync::Arc;

use teloxide::dispatching::UpdateHandler;
use teloxide::utils::command::BotCommands as TeloxideBotCommands;
use teloxide::{prelude::*, types::Update};
use tracing::{error, info, warn};

use PayBuddy::{
    api,
    config::Settings,
    database::connection::{create_pool, run_migrations, DatabaseConfig},
    handlers::{callbacks::handle_callback_query, messages::handle_message},
    handlers::commands::{admin, help, ledger, start},
    services::AppContext,
    utils::logging,
};

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new()?;
    settings.validate()?;

    // Initialize logging
    logging::init_logging(&settings.logging)?;

    info!("Starting PayBuddy...");

    if settings.server.webhook_secret.is_none() {
        warn!("Webhook secret not configured - inbound webhook requests are unauthenticated");
    }

    // Initialize database connection
    info!("Connecting to database...");
    let db_config = DatabaseConfig {
        url: settings.database.url.clone(),
        max_connections: settings.database.max_connections,
        min_connections: settings.database.min_connections,
        acquire_timeout: std::time::Duration::from_secs(30),
        idle_timeout: Some(std::time::Duration::from_secs(600)),
        max_lifetime: Some(std::time::Duration::from_secs(1800)),
    };
    let db_pool = create_pool(&db_config).await?;
    run_migrations(&db_pool).await?;

    // Initialize bot and application context
    let bot = Bot::new(&settings.bot.token);
    info!("Building application context...");
    let ctx = AppContext::build(settings.clone(), db_pool, bot.clone()).await?;

    info!("Checking Redis connection...");
    ctx.sessions.test_connection().await?;

    if let Some(panel) = ctx.panel.as_ref() {
        if panel.test_connection().await {
            info!("Panel API connection verified");
        } else {
            warn!("Panel API is configured but unreachable");
        }
    }

    // Start the webhook server
    let app = api::create_router(ctx.clone());
    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Webhook server listening on {}", addr);

    // Start the bot dispatcher
    info!("Setting up bot handlers...");
    let handler = create_handler();
    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![Arc::new(ctx)])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd);
        })
        .enable_ctrlc_handler()
        .build();

    info!("PayBuddy is ready!");

    let server = async move { axum::serve(listener, app).await };

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                error!(error = %e, "Webhook server terminated");
            }
        }
        _ = dispatcher.dispatch() => {}
    }

    info!("PayBuddy has been shut down.");
    Ok(())
}

/// Create the main update handler
fn create_handler() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    use teloxide::dispatching::UpdateFilterExt;

    dptree::entry()
        .branch(
            Update::filter_message()
                .branch(
                    dptree::entry()
                        .filter_command::<BotCommands>()
                        .endpoint(handle_commands),
                )
                .branch(dptree::endpoint(handle_messages)),
        )
        .branch(Update::filter_callback_query().endpoint(handle_callbacks))
}

#[derive(TeloxideBotCommands, Clone)]
#[command(rename_rule = "snake_case", description = "PayBuddy Bot Commands")]
enum BotCommands {
    #[command(description = "Start the bot")]
    Start,
    #[command(description = "Show help information")]
    Help,
    #[command(description = "Sync the admin roster from the panel (operators only)")]
    Sync,
    #[command(description = "Configure an admin's destination (operators only)")]
    SetAdminTopic,
    #[command(description = "List configured admins and their topics")]
    ListAdmins,
    #[command(description = "Clear an admin's destination mapping (operators only)")]
    ClearAdmin(String),
    #[command(description = "Show system statistics")]
    Stats,
    #[command(description = "Show a settlement list and its total")]
    Settlement(String),
    #[command(description = "Check out settlement entries (operators only)")]
    Checkout(String),
    #[command(description = "Set a fallback price for a user (operators only)", parse_with = "split")]
    SetPrice(String, String),
    #[command(description = "Dismiss a user from payment tracking (operators only)")]
    Dismiss(String),
    #[command(description = "Abandon the setup dialog")]
    Cancel,
}

/// Handle bot commands
async fn handle_commands(
    bot: Bot,
    msg: Message,
    cmd: BotCommands,
    ctx: Arc<AppContext>,
) -> HandlerResult {
    let ctx = (*ctx).clone();

    let result = match cmd {
        BotCommands::Start => start::handle_start(bot, msg).await,
        BotCommands::Help => help::handle_help(bot, msg).await,
        BotCommands::Sync => admin::handle_sync(bot, msg, ctx).await,
        BotCommands::SetAdminTopic => admin::handle_set_admin_topic(bot, msg, ctx).await,
        BotCommands::ListAdmins => admin::handle_list_admins(bot, msg, ctx).await,
        BotCommands::ClearAdmin(admin_id) => {
            admin::handle_clear_admin(bot, msg, ctx, admin_id).await
        }
        BotCommands::Stats => admin::handle_stats(bot, msg, ctx).await,
        BotCommands::Settlement(arg) => ledger::handle_settlement(bot, msg, ctx, arg).await,
        BotCommands::Checkout(arg) => ledger::handle_checkout(bot, msg, ctx, arg).await,
        BotCommands::SetPrice(username, price) => {
            ledger::handle_set_price(bot, msg, ctx, username, price).await
        }
        BotCommands::Dismiss(username) => ledger::handle_dismiss(bot, msg, ctx, username).await,
        BotCommands::Cancel => admin::handle_cancel(bot, msg, ctx).await,
    };

    if let Err(e) = result {
        error!(error = %e, "Error handling command");
        return Err(e.into());
    }

    Ok(())
}

/// Handle regular messages (setup dialog input)
async fn handle_messages(bot: Bot, msg: Message, ctx: Arc<AppContext>) -> HandlerResult {
    let ctx = (*ctx).clone();

    if let Err(e) = handle_message(bot, msg, ctx).await {
        error!(error = %e, "Error handling message");
        return Err(e.into());
    }

    Ok(())
}

/// Handle callback queries (interactive ledger actions)
async fn handle_callbacks(query: CallbackQuery, ctx: Arc<AppContext>) -> HandlerResult {
    let ctx = (*ctx).clone();

    if let Err(e) = handle_callback_query(query, ctx).await {
        error!(error = %e, "Error handling callback query");
        return Err(e.into());
    }

    Ok(())
}
