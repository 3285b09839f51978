use anyhow::Context;
use clap::{Parser, Subcommand};
use taskdesk_config::{load as load_config, AppConfig};
use taskdesk_gateway::{create_router, GatewayState};
use taskdesk_runtime::{telemetry, BackendServices};
use tokio::net::TcpListener;
use tracing::info;

#[derive(Parser)]
#[command(name = "taskdesk-server")]
#[command(about = "TaskDesk conversation backend (serves by default)")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP and WebSocket server
    Serve,
    /// Print the conversation list of a participant as JSON
    Conversations {
        /// Manager phone number or employee id
        participant_id: String,
    },
    /// Delete every conversation a participant takes part in
    PurgeParticipant {
        /// Manager phone number or employee id
        participant_id: String,
    },
    /// Open the conversation between an employee and their manager
    Welcome {
        /// Employee id
        employee_id: String,
        /// Opening message, defaults to a short greeting
        #[arg(long)]
        greeting: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing().context("failed to initialise tracing")?;

    let config = load_config().context("failed to load configuration")?;
    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server(&config, services).await,
        Commands::Conversations { participant_id } => {
            list_conversations(&services, &participant_id).await
        }
        Commands::PurgeParticipant { participant_id } => {
            purge_participant(&services, &participant_id).await
        }
        Commands::Welcome {
            employee_id,
            greeting,
        } => welcome(&services, &employee_id, greeting.as_deref()).await,
    }
}

async fn run_server(config: &AppConfig, services: BackendServices) -> anyhow::Result<()> {
    info!("starting TaskDesk backend");

    let state = GatewayState::new(services.coordinator.clone(), services.conversations.clone())
        .with_outbound_buffer(config.chat.outbound_buffer)
        .with_allowed_origin(config.cors.allowed_origin.clone());
    let app = create_router(state);

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(taskdesk_runtime::shutdown_signal())
        .await
        .context("http server error")?;

    services.db_pool.close().await;
    info!("backend shut down");
    Ok(())
}

async fn list_conversations(services: &BackendServices, participant_id: &str) -> anyhow::Result<()> {
    let conversations = services
        .conversations
        .list_conversations(participant_id)
        .await
        .with_context(|| format!("failed to list conversations of {participant_id}"))?;

    let rendered = serde_json::to_string_pretty(&conversations)?;
    println!("{rendered}");
    Ok(())
}

async fn purge_participant(services: &BackendServices, participant_id: &str) -> anyhow::Result<()> {
    let removed = services
        .conversations
        .purge_participant(participant_id)
        .await
        .with_context(|| format!("failed to purge {participant_id}"))?;

    println!("removed {removed} messages involving {participant_id}");
    Ok(())
}

async fn welcome(
    services: &BackendServices,
    employee_id: &str,
    greeting: Option<&str>,
) -> anyhow::Result<()> {
    let message = services
        .conversations
        .welcome_employee(employee_id, greeting)
        .await
        .with_context(|| format!("failed to welcome {employee_id}"))?;

    println!("{} -> {}: {}", message.sender_id, message.recipient_id, message.body);
    Ok(())
}
