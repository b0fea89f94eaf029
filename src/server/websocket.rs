use crate::cli::Args;
use crate::error::{ BoxError, LuminaryError };
use crate::host::ViewHost;
use crate::models::websocket::{ ClientMessage, ServerMessage };
use crate::view::ConversationView;

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;

use tokio::io::{ AsyncRead, AsyncWrite };
use tokio::net::TcpListener;

use futures::stream::SplitSink;
use tokio_rustls::TlsAcceptor;
use tokio_tungstenite::tungstenite::handshake::server::{ ErrorResponse, Request, Response };
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{ accept_hdr_async, WebSocketStream };

use rustls::pki_types::{ CertificateDer, PrivateKeyDer };
use rustls::ServerConfig;
use rustls_pemfile::{ certs, pkcs8_private_keys };

use governor::{ DefaultDirectRateLimiter, Quota, RateLimiter };
use lazy_static::lazy_static;

use chrono::Utc;
use hmac::{ Hmac, Mac };
use sha2::Sha256;
use url::form_urlencoded;

use futures::{ SinkExt, StreamExt };
use log::{ debug, error, info, warn };
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

const MAX_MESSAGE_SIZE: usize = 1024 * 1024;
const CONNECTIONS_PER_SECOND: u32 = 10;
const MAX_SIGNATURE_AGE_SECS: i64 = 300;

lazy_static! {
    static ref CONNECTION_LIMITER: DefaultDirectRateLimiter = RateLimiter::direct(
        Quota::per_second(NonZeroU32::new(CONNECTIONS_PER_SECOND).unwrap_or(NonZeroU32::MIN))
    );
}

fn load_tls_config(cert_path: &str, key_path: &str) -> Result<Arc<ServerConfig>, LuminaryError> {
    let cert_file = File::open(cert_path).map_err(|e|
        LuminaryError::Tls(format!("Failed to open TLS certificate file '{}': {}", cert_path, e))
    )?;
    let key_file = File::open(key_path).map_err(|e|
        LuminaryError::Tls(format!("Failed to open TLS key file '{}': {}", key_path, e))
    )?;

    let mut cert_reader = BufReader::new(cert_file);
    let mut key_reader = BufReader::new(key_file);
    let cert_chain: Vec<CertificateDer<'static>> = certs(&mut cert_reader)
        .collect::<Result<_, _>>()
        .map_err(|e| LuminaryError::Tls(format!("Failed to read certificate(s): {}", e)))?;

    let mut keys = pkcs8_private_keys(&mut key_reader);
    let key = match keys.next() {
        Some(Ok(k)) => PrivateKeyDer::Pkcs8(k),
        Some(Err(e)) => {
            return Err(LuminaryError::Tls(format!("Error reading private key: {}", e)));
        }
        None => {
            return Err(LuminaryError::Tls("No PKCS8 private key found in key file".to_string()));
        }
    };

    let config = ServerConfig::builder_with_provider(
        Arc::new(rustls::crypto::ring::default_provider())
    )
        .with_safe_default_protocol_versions()
        .map_err(|e| LuminaryError::Tls(e.to_string()))?
        .with_no_client_auth()
        .with_single_cert(cert_chain, key)
        .map_err(|e| LuminaryError::Tls(e.to_string()))?;
    Ok(Arc::new(config))
}

fn tls_acceptor(args: &Args) -> Result<Option<TlsAcceptor>, LuminaryError> {
    if !args.enable_tls {
        info!("TLS not enabled. Running plain WebSocket (WS) server.");
        return Ok(None);
    }
    match (&args.tls_cert_path, &args.tls_key_path) {
        (Some(cert_path), Some(key_path)) => {
            info!(
                "TLS enabled. Loading certificate from '{}' and key from '{}'",
                cert_path,
                key_path
            );
            let config = load_tls_config(cert_path, key_path)?;
            Ok(Some(TlsAcceptor::from(config)))
        }
        (Some(_), None) | (None, Some(_)) => {
            error!("Both --tls-cert-path and --tls-key-path must be provided to enable TLS.");
            Err(LuminaryError::Tls("Missing TLS certificate or key path".to_string()))
        }
        (None, None) => {
            error!("--enable-tls was set but no certificate/key paths provided.");
            Err(LuminaryError::Tls("TLS enabled without cert/key".to_string()))
        }
    }
}

pub async fn start_ws_server(
    addr: &str,
    host: Arc<ViewHost>,
    api_key: Option<String>
) -> Result<(), BoxError> {
    let tls_acceptor = tls_acceptor(host.args())?;
    let listener = TcpListener::bind(addr).await?;

    let protocol = if tls_acceptor.is_some() { "wss" } else { "ws" };
    info!("{} server listening on: {}", protocol.to_uppercase(), addr);

    loop {
        let (stream, peer) = listener.accept().await?;

        if CONNECTION_LIMITER.check().is_err() {
            warn!("Global connection rate limit exceeded for {}. Dropping connection.", peer);
            continue;
        }

        info!("Incoming connection from: {}", peer);
        let host_clone = Arc::clone(&host);
        let required_api_key = api_key.clone();
        let tls_acceptor_clone = tls_acceptor.clone();

        tokio::spawn(async move {
            let process_result = if let Some(acceptor) = tls_acceptor_clone {
                match acceptor.accept(stream).await {
                    Ok(tls_stream) => {
                        info!("TLS handshake successful for {}", peer);
                        process_connection(peer, tls_stream, host_clone, required_api_key).await
                    }
                    Err(e) => {
                        error!("TLS handshake error for {}: {}", peer, e);
                        Err(Box::new(e) as BoxError)
                    }
                }
            } else {
                process_connection(peer, stream, host_clone, required_api_key).await
            };

            if let Err(e) = process_result {
                error!("Failed to process connection for {}: {}", peer, e);
            }
        });
    }
}

/// Checks `sig` = hex(HMAC-SHA256(secret, ts)) and that `ts` is recent.
pub fn verify_signature(
    secret: &str,
    params: &HashMap<String, String>,
    now: i64
) -> Result<(), &'static str> {
    let ts = params
        .get("ts")
        .or_else(|| params.get("X-Api-Ts"))
        .ok_or("missing ts/sig")?;
    let sig = params
        .get("sig")
        .or_else(|| params.get("X-Api-Sign"))
        .ok_or("missing ts/sig")?;

    let ts_i: i64 = ts.parse().map_err(|_| "bad timestamp")?;
    if (now - ts_i).abs() > MAX_SIGNATURE_AGE_SECS {
        return Err("timestamp out of range");
    }

    let expected = hex::decode(sig).map_err(|_| "bad signature")?;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| "bad signature")?;
    mac.update(ts.as_bytes());
    mac.verify_slice(&expected).map_err(|_| "bad signature")
}

fn unauthorized(reason: &str) -> ErrorResponse {
    let mut res = ErrorResponse::new(Some(reason.to_string()));
    *res.status_mut() = StatusCode::UNAUTHORIZED;
    res
}

async fn process_connection<S>(
    peer: SocketAddr,
    stream: S,
    host: Arc<ViewHost>,
    required_api_key: Option<String>
) -> Result<(), BoxError>
    where S: AsyncRead + AsyncWrite + Unpin + Send + 'static
{
    let auth_callback = |req: &Request, response: Response| -> Result<Response, ErrorResponse> {
        let secret = match &required_api_key {
            Some(k) if !k.is_empty() => k,
            _ => {
                return Ok(response);
            }
        };

        let qs = req.uri().query().unwrap_or("");
        let params: HashMap<String, String> = form_urlencoded
            ::parse(qs.as_bytes())
            .into_owned()
            .collect();
        debug!("Auth params from {}: {:?}", peer, params.keys().collect::<Vec<_>>());

        match verify_signature(secret, &params, Utc::now().timestamp()) {
            Ok(()) => {
                info!("{} authenticated", peer);
                Ok(response)
            }
            Err(reason) => {
                warn!("{}: {}", peer, reason);
                Err(unauthorized(reason))
            }
        }
    };

    match accept_hdr_async(stream, auth_callback).await {
        Ok(ws) => {
            handle_connection(peer, ws, host).await;
            Ok(())
        }
        Err(e) => {
            error!("Handshake failed for {}: {}", peer, e);
            Err(Box::new(e) as _)
        }
    }
}

async fn send_frame<S>(
    tx: &mut SplitSink<WebSocketStream<S>, Message>,
    frame: &ServerMessage
) -> Result<(), BoxError>
    where S: AsyncRead + AsyncWrite + Unpin
{
    let json = serde_json::to_string(frame)?;
    tx.send(Message::Text(json)).await?;
    Ok(())
}

async fn send_render<S>(
    tx: &mut SplitSink<WebSocketStream<S>, Message>,
    view: &ConversationView
) -> Result<(), BoxError>
    where S: AsyncRead + AsyncWrite + Unpin
{
    let frame = ServerMessage::Render {
        view: view.render().await,
        timestamp: Utc::now().timestamp(),
    };
    send_frame(tx, &frame).await
}

/// Serves one client for the lifetime of its socket. The view, and any reply
/// still waiting on a timer, goes away with the connection.
pub async fn handle_connection<S>(peer: SocketAddr, websocket: WebSocketStream<S>, host: Arc<ViewHost>)
    where S: AsyncRead + AsyncWrite + Unpin
{
    info!("New WebSocket connection: {}", peer);

    let (mut tx, mut rx) = websocket.split();
    let session_id = Uuid::new_v4();

    let (view, mut events) = host.open_view().await;
    info!("Assigned session ID {} to {}", session_id, peer);

    if let Err(e) = send_render(&mut tx, &view).await {
        error!("Error sending initial render to {}: {}", peer, e);
        return;
    }

    loop {
        tokio::select! {
            incoming = rx.next() => {
                let message = match incoming {
                    Some(Ok(message)) => message,
                    Some(Err(e)) => {
                        match e {
                            | tokio_tungstenite::tungstenite::Error::ConnectionClosed
                            | tokio_tungstenite::tungstenite::Error::Protocol(_)
                            | tokio_tungstenite::tungstenite::Error::Utf8 => {
                                info!("WebSocket connection closed or protocol error for {}: {}", peer, e);
                            }
                            tokio_tungstenite::tungstenite::Error::Io(ref io_err) if
                                io_err.kind() == std::io::ErrorKind::ConnectionReset
                            => {
                                info!("WebSocket connection reset by peer {}", peer);
                            }
                            _ => {
                                error!("Error receiving message from {}: {}", peer, e);
                            }
                        }
                        break;
                    }
                    None => break,
                };

                if message.len() > MAX_MESSAGE_SIZE {
                    warn!(
                        "Message from {} exceeds size limit ({} > {})",
                        peer,
                        message.len(),
                        MAX_MESSAGE_SIZE
                    );
                    let frame = ServerMessage::Error { message: "Message too large".to_string() };
                    if send_frame(&mut tx, &frame).await.is_err() {
                        error!("Failed to send size limit error to {}", peer);
                    }
                    break;
                }

                match message {
                    Message::Text(text) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_message) => view.apply(client_message).await,
                            Err(e) => {
                                warn!("Failed to parse message from {}: {}", peer, e);
                                let frame = ServerMessage::Error {
                                    message: format!("Failed to parse message: {}", e),
                                };
                                if let Err(e) = send_frame(&mut tx, &frame).await {
                                    error!("Error sending parse error to {}: {}", peer, e);
                                    break;
                                }
                            }
                        }
                    }
                    Message::Close(_) => {
                        info!("Received close frame from {}", peer);
                        break;
                    }
                    Message::Ping(ping_data) => {
                        if tx.send(Message::Pong(ping_data)).await.is_err() {
                            error!("Failed to send pong to {}", peer);
                            break;
                        }
                    }
                    Message::Binary(_) => {
                        warn!("Ignoring binary message from {}", peer);
                    }
                    Message::Pong(_) | Message::Frame(_) => {}
                }
            }
            Some(event) = events.recv() => {
                debug!("View event for {}: {:?}", peer, event);
                if let Err(e) = send_render(&mut tx, &view).await {
                    error!("Error sending render to {}: {}", peer, e);
                    break;
                }
            }
        }
    }
    info!("WebSocket connection closed for {} (Session ID: {})", peer, session_id);
}
