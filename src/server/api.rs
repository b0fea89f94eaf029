use crate::config::Settings;
use crate::error::BoxError;
use crate::host::ViewHost;
use axum::{ extract::State, response::IntoResponse, routing::get, Json, Router };
use log::{ error, info };
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{ Any, CorsLayer };

#[derive(Clone)]
struct AppState {
    host: Arc<ViewHost>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct OptionsResponse {
    greeting: String,
    options: Vec<String>,
}

#[derive(Serialize)]
struct ConfigResponse {
    settings: Settings,
    user_response_delay_ms: u64,
    option_response_delay_ms: u64,
    followup_response_delay_ms: u64,
}

pub fn router(host: Arc<ViewHost>) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/options", get(options_handler))
        .route("/api/config", get(config_handler))
        .layer(cors)
        .with_state(AppState { host })
}

pub async fn start_http_server(http_port: u16, host: Arc<ViewHost>) -> Result<(), BoxError> {
    let addr = format!("0.0.0.0:{}", http_port).parse::<SocketAddr>()?;
    info!("Starting HTTP API server on: http://{}", addr);

    let args = host.args().clone();
    let app = router(host);

    match (args.enable_tls, &args.tls_cert_path, &args.tls_key_path) {
        (true, Some(cert_path), Some(key_path)) => {
            let tls_config = axum_server::tls_rustls::RustlsConfig
                ::from_pem_file(cert_path, key_path).await?;

            tokio::spawn(async move {
                let result = axum_server
                    ::bind_rustls(addr, tls_config)
                    .serve(app.into_make_service()).await;
                if let Err(e) = result {
                    error!("HTTPS server error: {}", e);
                }
            });
            info!("HTTPS server started with TLS enabled");
        }
        _ => {
            let listener = tokio::net::TcpListener::bind(addr).await?;
            tokio::spawn(async move {
                if let Err(e) = axum::serve(listener, app.into_make_service()).await {
                    error!("HTTP server error: {}", e);
                }
            });
            info!("HTTP server started");
        }
    }

    Ok(())
}

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn options_handler(State(state): State<AppState>) -> impl IntoResponse {
    let catalog = state.host.catalog().await;
    Json(OptionsResponse {
        greeting: catalog.greeting.clone(),
        options: catalog.options.clone(),
    })
}

async fn config_handler(State(state): State<AppState>) -> impl IntoResponse {
    let args = state.host.args();
    Json(ConfigResponse {
        settings: state.host.default_settings(),
        user_response_delay_ms: args.user_response_delay_ms,
        option_response_delay_ms: args.option_response_delay_ms,
        followup_response_delay_ms: args.followup_response_delay_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Args;
    use axum::body::{ to_bytes, Body };
    use axum::http::{ Request, StatusCode };
    use clap::Parser;
    use tower::ServiceExt;

    async fn get_json(path: &str) -> (StatusCode, serde_json::Value) {
        let host = Arc::new(ViewHost::new(Args::try_parse_from(["luminary"]).unwrap()).unwrap());
        let response = router(host)
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap()).await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (status, json) = get_json("/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn options_lists_menu() {
        let (status, json) = get_json("/api/options").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json["options"],
            serde_json::json!(["Tell me a fact", "Give me advice", "Share a quote"])
        );
    }

    #[tokio::test]
    async fn config_reports_defaults() {
        let (_, json) = get_json("/api/config").await;
        assert_eq!(json["settings"]["max_tokens"], 1024);
        assert_eq!(json["settings"]["memory_retention"], true);
        assert_eq!(json["option_response_delay_ms"], 800);
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let (status, _) = get_json("/api/reload-prompts").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
