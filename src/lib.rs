pub mod cli;
pub mod config;
pub mod error;
pub mod history;
pub mod host;
pub mod models;
pub mod server;
pub mod view;

use cli::Args;
use error::BoxError;
use host::ViewHost;
use log::info;
use server::Server;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), BoxError> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("HTTP Port: {:?}", args.http_port);
    info!("TLS Enabled: {}", args.enable_tls);
    info!("History Store Type: {}", args.history_type);
    info!("Responses Path: {}", args.responses_path.as_deref().unwrap_or("(built-in)"));
    info!(
        "Response Delays (ms): text={} option={} follow-up={}",
        args.user_response_delay_ms,
        args.option_response_delay_ms,
        args.followup_response_delay_ms
    );
    info!("Model Label: {}", args.model_name);
    info!(
        "Drawer Defaults: creativity={} max_tokens={} web_search={} memory_retention={}",
        args.default_creativity,
        args.default_max_tokens,
        args.default_web_search,
        args.default_memory_retention
    );
    info!("-------------------------");

    let host = Arc::new(ViewHost::new(args)?);
    let server = Server::new(host);
    server.run().await?;

    Ok(())
}
