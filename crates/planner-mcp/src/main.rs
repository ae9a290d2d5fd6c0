mod dispatch;
mod envelope;
mod server;

use std::sync::Arc;

use planner_core::{InMemoryContextStore, Settings};
use planner_docs::Context7Client;
use planner_suggest::GeminiGenerator;
use rmcp::ServiceExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dispatch::Dispatcher;
use server::{PlannerServer, SERVER_NAME};

/// Logs go to stderr; stdout carries the MCP protocol.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let dispatcher = Dispatcher::new(
        Arc::new(InMemoryContextStore::new()),
        Arc::new(GeminiGenerator::new(&settings)),
        Arc::new(Context7Client::new(settings.context7_url.clone())),
        settings.context7_url.clone(),
    );

    tracing::info!(
        server = SERVER_NAME,
        model = %settings.model,
        context7_url = %settings.context7_url,
        "starting MCP server on stdio"
    );

    let service = PlannerServer::new(dispatcher)
        .serve(rmcp::transport::io::stdio())
        .await
        .inspect_err(|e| tracing::error!(error = %e, "MCP server error"))?;
    service.waiting().await?;
    Ok(())
}
