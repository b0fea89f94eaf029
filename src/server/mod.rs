pub mod api;
pub mod websocket;

use crate::error::BoxError;
use crate::host::ViewHost;
use log::{ info, warn };
use std::sync::Arc;

pub struct Server {
    addr: String,
    host: Arc<ViewHost>,
    api_key: Option<String>,
    http_port: Option<u16>,
}

impl Server {
    pub fn new(host: Arc<ViewHost>) -> Self {
        let args = host.args();
        let api_key = args.server_api_key.clone().filter(|k| !k.trim().is_empty());

        if api_key.is_some() {
            info!("Server configured with signed handshake authentication.");
        } else {
            warn!("Server configured WITHOUT authentication. Connections are open.");
        }

        Self {
            addr: args.server_addr.clone(),
            http_port: args.http_port,
            host,
            api_key,
        }
    }

    pub async fn run(&self) -> Result<(), BoxError> {
        if let Some(http_port) = self.http_port {
            api::start_http_server(http_port, self.host.clone()).await?;
        }

        websocket::start_ws_server(&self.addr, self.host.clone(), self.api_key.clone()).await
    }
}
