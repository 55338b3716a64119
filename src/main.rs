//! Ration
//!
//! An MCP server for editing adventure ingredients against a planning service.

use std::sync::Arc;

use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};
use tracing_subscriber::EnvFilter;

use ration::build_info;
use ration::config::Config;
use ration::mcp::RationService;
use ration::remote::{self, HttpPlanningClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (output to stderr to not interfere with MCP stdio)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("ration=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env();
    build_info::print_startup_banner(&config);

    let client = HttpPlanningClient::new(&config)?;

    // Units are fetched once; a failure leaves the built-in table in place
    let units = remote::load_unit_table(&client).await;
    eprintln!("Measurement units: {} ({:?})", units.len(), units.source());

    let service = RationService::new(config.api_base_url.clone(), Arc::new(client), units);

    eprintln!("Starting MCP server on stdio...");
    let transport = (stdin(), stdout());
    let server = service.serve(transport).await?;
    server.waiting().await?;

    Ok(())
}
